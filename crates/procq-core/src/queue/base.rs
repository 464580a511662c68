//! BaseQueue: a [`Queue`] over a [`ConnectionPool`].

use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::debug;

use super::Queue;
use crate::domain::QueueError;
use crate::ports::ConnectionPool;
use crate::processor::{FIFO, Processor};

/// Delegates every operation to the active [`Processor`].
///
/// # 設計原則
/// - 1 操作ごとにプールから接続を 1 本借り、終了時（エラー時も）に Drop で返す
/// - Processor は `RwLock<Arc<dyn Processor>>` で保持する
///   - 読み取り: Arc を clone するだけ（ロックは await を跨がない）
///   - 書き込み: `set_processor` で差し替え
/// - デフォルトは構築時に FIFO を入れておく（実行時の null チェックはしない）
pub struct BaseQueue<P> {
    pool: P,
    source: String,
    processor: RwLock<Arc<dyn Processor>>,
}

impl<P: ConnectionPool> BaseQueue<P> {
    pub fn new(pool: P, source: impl Into<String>) -> Self {
        Self::with_processor(pool, source, Arc::clone(&FIFO))
    }

    pub fn with_processor(
        pool: P,
        source: impl Into<String>,
        processor: Arc<dyn Processor>,
    ) -> Self {
        Self {
            pool,
            source: source.into(),
            processor: RwLock::new(processor),
        }
    }

    /// Claim the next item into `dest` in one atomic store command, waiting
    /// for one. The item stays visible in `dest` until the caller removes it,
    /// so a crash while handling it does not lose it.
    pub async fn pull_to(&self, dest: &str) -> Result<Option<Vec<u8>>, QueueError> {
        let processor = self.processor();
        let mut cnx = self.pool.get().await?;
        processor.pull_to(cnx.as_mut(), &self.source, dest).await
    }

    /// Move exactly one item from this queue to `dest` without waiting.
    /// Fails with [`QueueError::EmptySource`] when there is nothing to move.
    pub async fn concat(&self, dest: &str) -> Result<(), QueueError> {
        let processor = self.processor();
        let mut cnx = self.pool.get().await?;
        processor.concat(cnx.as_mut(), &self.source, dest).await
    }

    /// Number of pending items.
    pub async fn len(&self) -> Result<usize, QueueError> {
        let mut cnx = self.pool.get().await?;
        Ok(cnx.len(&self.source).await?)
    }

    /// Like [`Queue::pull`], but gives up with [`QueueError::Cancelled`] as
    /// soon as `shutdown` turns `true`. Dropping the pending pull drops its
    /// connection, so nothing is taken from the list.
    pub async fn pull_or_shutdown(
        &self,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<Option<Vec<u8>>, QueueError> {
        loop {
            if *shutdown.borrow_and_update() {
                return Err(QueueError::Cancelled);
            }
            tokio::select! {
                changed = shutdown.changed() => {
                    // Sender gone: nobody can ask for shutdown any more.
                    if changed.is_err() {
                        return self.pull().await;
                    }
                }
                pulled = self.pull() => return pulled,
            }
        }
    }
}

#[async_trait]
impl<P: ConnectionPool> Queue for BaseQueue<P> {
    fn source(&self) -> &str {
        &self.source
    }

    async fn push(&self, payload: &[u8]) -> Result<(), QueueError> {
        let processor = self.processor();
        let mut cnx = self.pool.get().await?;
        processor.push(cnx.as_mut(), &self.source, payload).await
    }

    async fn pull(&self) -> Result<Option<Vec<u8>>, QueueError> {
        let processor = self.processor();
        let mut cnx = self.pool.get().await?;
        processor.pull(cnx.as_mut(), &self.source).await
    }

    fn processor(&self) -> Arc<dyn Processor> {
        // The guarded value is a plain Arc; a poisoned lock still holds a valid one.
        let guard = self.processor.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&*guard)
    }

    fn set_processor(&self, processor: Arc<dyn Processor>) {
        let mut guard = self.processor.write().unwrap_or_else(PoisonError::into_inner);
        debug!(
            source = %self.source,
            from = guard.name(),
            to = processor.name(),
            "processor swapped"
        );
        *guard = processor;
    }
}
