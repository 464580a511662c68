//! InMemoryStore - 開発・テスト用のリストストア
//!
//! # 学習ポイント
//! - tokio Mutex + Notify による blocking pop
//! - `Notified::enable()` で「チェックしてから待つ」間の通知取りこぼしを防ぐ
//! - 単一ロック内での pop + push によるアトミックな移動
//!
//! リストの head は `VecDeque` の front、tail は back です。

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;
use tracing::debug;

use crate::domain::StoreError;
use crate::ports::{ConnectionPool, StoreConnection};

type Lists = HashMap<String, VecDeque<Vec<u8>>>;

struct Shared {
    lists: Mutex<Lists>,
    /// Woken on every write and on close.
    notify: Notify,
    closed: AtomicBool,
    active: AtomicUsize,
}

/// InMemoryStore は Redis のリスト操作を模倣するプロセス内ストア
///
/// # 実装詳細
/// - `HashMap<String, VecDeque<Vec<u8>>>` でリスト名ごとに管理
/// - blocking 系コマンドは `block_timeout` まで待つ（`None` なら無期限）
/// - タイムアウトは empty sentinel（`Ok(None)`）として返す（Redis の BRPOP と同じ）
/// - `close()` 後はすべてのコマンドが [`StoreError::Closed`] で失敗する
///
/// Cloning is cheap and every clone sees the same lists.
///
/// # 使用例
/// ```ignore
/// let store = InMemoryStore::new();
/// let queue = BaseQueue::new(store.clone(), "jobs");
/// queue.push(b"hello").await?;
/// ```
#[derive(Clone)]
pub struct InMemoryStore {
    shared: Arc<Shared>,
    block_timeout: Option<Duration>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                lists: Mutex::new(HashMap::new()),
                notify: Notify::new(),
                closed: AtomicBool::new(false),
                active: AtomicUsize::new(0),
            }),
            block_timeout: None,
        }
    }

    /// Blocking commands give up after `timeout` and report the empty sentinel.
    /// A zero duration means "wait forever", as with Redis.
    pub fn with_block_timeout(mut self, timeout: Duration) -> Self {
        self.block_timeout = (!timeout.is_zero()).then_some(timeout);
        self
    }

    /// Open a new connection handle.
    pub fn connect(&self) -> InMemoryConnection {
        self.shared.active.fetch_add(1, Ordering::SeqCst);
        InMemoryConnection {
            shared: Arc::clone(&self.shared),
            block_timeout: self.block_timeout,
        }
    }

    /// Fail every pending and future command with [`StoreError::Closed`].
    pub fn close(&self) {
        self.shared.closed.store(true, Ordering::SeqCst);
        self.shared.notify.notify_waiters();
        debug!("in-memory store closed");
    }

    /// Connections handed out and not yet dropped.
    pub fn active_connections(&self) -> usize {
        self.shared.active.load(Ordering::SeqCst)
    }

    /// Contents of `list`, head first.
    pub async fn snapshot(&self, list: &str) -> Vec<Vec<u8>> {
        let lists = self.shared.lists.lock().await;
        lists
            .get(list)
            .map(|items| items.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Consistent contents of several lists, taken under one lock.
    pub async fn snapshot_many(&self, names: &[&str]) -> Vec<Vec<Vec<u8>>> {
        let lists = self.shared.lists.lock().await;
        names
            .iter()
            .map(|name| {
                lists
                    .get(*name)
                    .map(|items| items.iter().cloned().collect())
                    .unwrap_or_default()
            })
            .collect()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConnectionPool for InMemoryStore {
    async fn get(&self) -> Result<Box<dyn StoreConnection>, StoreError> {
        Ok(Box::new(self.connect()))
    }
}

/// One connection to an [`InMemoryStore`]. Dropping it releases the slot.
pub struct InMemoryConnection {
    shared: Arc<Shared>,
    block_timeout: Option<Duration>,
}

impl InMemoryConnection {
    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.shared.closed.load(Ordering::SeqCst) {
            return Err(StoreError::Closed);
        }
        Ok(())
    }

    async fn write<T: Send>(
        &self,
        op: impl FnOnce(&mut Lists) -> T + Send,
    ) -> Result<T, StoreError> {
        let out = {
            let mut lists = self.shared.lists.lock().await;
            self.ensure_open()?;
            op(&mut *lists)
        };
        self.shared.notify.notify_waiters();
        Ok(out)
    }

    /// Retry `attempt` under the lock until it yields a value, the block
    /// timeout elapses (`Ok(None)`), or the store is closed.
    async fn wait_for<T: Send>(
        &self,
        mut attempt: impl FnMut(&mut Lists) -> Option<T> + Send,
    ) -> Result<Option<T>, StoreError> {
        let deadline = self.block_timeout.map(|timeout| Instant::now() + timeout);
        loop {
            let notified = self.shared.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut lists = self.shared.lists.lock().await;
                self.ensure_open()?;
                if let Some(found) = attempt(&mut *lists) {
                    drop(lists);
                    // A move also wrote to the destination list.
                    self.shared.notify.notify_waiters();
                    return Ok(Some(found));
                }
            }

            match deadline {
                Some(deadline) => {
                    if tokio::time::timeout_at(deadline, notified).await.is_err() {
                        return Ok(None);
                    }
                }
                None => notified.await,
            }
        }
    }
}

impl Drop for InMemoryConnection {
    fn drop(&mut self) {
        self.shared.active.fetch_sub(1, Ordering::SeqCst);
    }
}

fn pop_tail(lists: &mut Lists, list: &str) -> Option<Vec<u8>> {
    lists.get_mut(list).and_then(VecDeque::pop_back)
}

fn move_tail_to_head(lists: &mut Lists, src: &str, dest: &str) -> Option<Vec<u8>> {
    let payload = pop_tail(lists, src)?;
    lists
        .entry(dest.to_string())
        .or_default()
        .push_front(payload.clone());
    Some(payload)
}

#[async_trait]
impl StoreConnection for InMemoryConnection {
    async fn append_head(&mut self, list: &str, payload: &[u8]) -> Result<(), StoreError> {
        self.write(|lists| {
            lists
                .entry(list.to_string())
                .or_default()
                .push_front(payload.to_vec())
        })
        .await
    }

    async fn append_tail(&mut self, list: &str, payload: &[u8]) -> Result<(), StoreError> {
        self.write(|lists| {
            lists
                .entry(list.to_string())
                .or_default()
                .push_back(payload.to_vec())
        })
        .await
    }

    async fn blocking_pop_tail(&mut self, list: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.wait_for(|lists| pop_tail(lists, list)).await
    }

    async fn blocking_pop_tail_push_head(
        &mut self,
        src: &str,
        dest: &str,
    ) -> Result<Option<Vec<u8>>, StoreError> {
        self.wait_for(|lists| move_tail_to_head(lists, src, dest)).await
    }

    async fn pop_tail_push_head(
        &mut self,
        src: &str,
        dest: &str,
    ) -> Result<Option<Vec<u8>>, StoreError> {
        self.write(|lists| move_tail_to_head(lists, src, dest)).await
    }

    async fn len(&mut self, list: &str) -> Result<usize, StoreError> {
        let lists = self.shared.lists.lock().await;
        self.ensure_open()?;
        Ok(lists.get(list).map_or(0, VecDeque::len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn head_and_tail_ends() {
        let store = InMemoryStore::new();
        let mut cnx = store.connect();
        cnx.append_head("l", b"b").await.unwrap();
        cnx.append_head("l", b"a").await.unwrap();
        cnx.append_tail("l", b"c").await.unwrap();

        assert_eq!(
            store.snapshot("l").await,
            vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]
        );
        assert_eq!(cnx.blocking_pop_tail("l").await.unwrap(), Some(b"c".to_vec()));
        assert_eq!(cnx.len("l").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn push_wakes_blocked_pop() {
        let store = InMemoryStore::new();

        let waiter = tokio::spawn({
            let store = store.clone();
            async move { store.connect().blocking_pop_tail("jobs").await.unwrap() }
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        store.connect().append_head("jobs", b"x").await.unwrap();

        assert_eq!(waiter.await.unwrap(), Some(b"x".to_vec()));
    }

    #[tokio::test]
    async fn block_timeout_reports_sentinel() {
        let store = InMemoryStore::new().with_block_timeout(Duration::from_millis(30));
        let mut cnx = store.connect();
        let start = Instant::now();
        assert_eq!(cnx.blocking_pop_tail("jobs").await.unwrap(), None);
        assert!(start.elapsed() >= Duration::from_millis(30));
        assert_eq!(cnx.blocking_pop_tail_push_head("jobs", "done").await.unwrap(), None);
    }

    #[tokio::test]
    async fn close_fails_pending_pop() {
        let store = InMemoryStore::new();

        let waiter = tokio::spawn({
            let store = store.clone();
            async move { store.connect().blocking_pop_tail("jobs").await }
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        store.close();

        assert!(matches!(waiter.await.unwrap(), Err(StoreError::Closed)));
        assert!(matches!(
            store.connect().append_tail("jobs", b"x").await,
            Err(StoreError::Closed)
        ));
    }

    #[tokio::test]
    async fn move_on_empty_source_is_sentinel_and_leaves_dest() {
        let store = InMemoryStore::new();
        let mut cnx = store.connect();
        cnx.append_head("dest", b"kept").await.unwrap();

        assert_eq!(cnx.pop_tail_push_head("src", "dest").await.unwrap(), None);
        assert_eq!(store.snapshot("dest").await, vec![b"kept".to_vec()]);
    }

    #[tokio::test]
    async fn move_to_same_list_rotates() {
        let store = InMemoryStore::new();
        let mut cnx = store.connect();
        cnx.append_tail("ring", b"1").await.unwrap();
        cnx.append_tail("ring", b"2").await.unwrap();

        cnx.pop_tail_push_head("ring", "ring").await.unwrap();
        assert_eq!(store.snapshot("ring").await, vec![b"2".to_vec(), b"1".to_vec()]);
    }

    #[tokio::test]
    async fn dropping_connection_releases_it() {
        let store = InMemoryStore::new();
        let cnx = store.get().await.unwrap();
        assert_eq!(store.active_connections(), 1);
        drop(cnx);
        assert_eq!(store.active_connections(), 0);
    }
}
