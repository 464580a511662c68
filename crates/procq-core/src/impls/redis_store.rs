//! RedisPool - 本番用のリストストア（feature = "redis"）
//!
//! コマンド対応:
//! - append_head → `LPUSH`, append_tail → `RPUSH`
//! - blocking_pop_tail → `BRPOP`, blocking_pop_tail_push_head → `BRPOPLPUSH`
//! - pop_tail_push_head → `RPOPLPUSH`, len → `LLEN`
//!
//! BRPOP / BRPOPLPUSH の nil 応答（タイムアウト）が empty sentinel です。
//!
//! 秒未満のタイムアウト（例: 1.5s）は Redis 6.0 以降でのみ受け付けられます。
//! 整数秒ならどのバージョンでも動きます。

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use tracing::debug;

use crate::domain::StoreError;
use crate::ports::{ConnectionPool, StoreConnection};

/// Opens one Redis connection per operation.
#[derive(Clone)]
pub struct RedisPool {
    client: redis::Client,
    block_timeout: Duration,
}

impl RedisPool {
    /// `url` is a standard `redis://` connection string. Nothing is dialled
    /// until the first [`get`](ConnectionPool::get).
    pub fn open(url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(url).map_err(connection_error)?;
        Ok(Self {
            client,
            block_timeout: Duration::ZERO,
        })
    }

    /// Timeout for BRPOP / BRPOPLPUSH. Zero (the default) blocks forever.
    pub fn with_block_timeout(mut self, timeout: Duration) -> Self {
        self.block_timeout = timeout;
        self
    }
}

#[async_trait]
impl ConnectionPool for RedisPool {
    async fn get(&self) -> Result<Box<dyn StoreConnection>, StoreError> {
        let conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(connection_error)?;
        debug!("redis connection acquired");
        Ok(Box::new(RedisConnection {
            conn,
            block_timeout: self.block_timeout,
        }))
    }
}

fn connection_error(e: redis::RedisError) -> StoreError {
    StoreError::Connection(e.to_string())
}

fn command_error(command: &'static str) -> impl FnOnce(redis::RedisError) -> StoreError {
    move |e| StoreError::Command {
        command,
        message: e.to_string(),
    }
}

/// Timeout argument for blocking commands: whole seconds as an integer,
/// anything finer as a decimal.
fn timeout_arg(timeout: Duration) -> String {
    if timeout.subsec_nanos() == 0 {
        timeout.as_secs().to_string()
    } else {
        timeout.as_secs_f64().to_string()
    }
}

pub struct RedisConnection {
    conn: MultiplexedConnection,
    block_timeout: Duration,
}

#[async_trait]
impl StoreConnection for RedisConnection {
    async fn append_head(&mut self, list: &str, payload: &[u8]) -> Result<(), StoreError> {
        let _len: i64 = redis::cmd("LPUSH")
            .arg(list)
            .arg(payload)
            .query_async(&mut self.conn)
            .await
            .map_err(command_error("LPUSH"))?;
        Ok(())
    }

    async fn append_tail(&mut self, list: &str, payload: &[u8]) -> Result<(), StoreError> {
        let _len: i64 = redis::cmd("RPUSH")
            .arg(list)
            .arg(payload)
            .query_async(&mut self.conn)
            .await
            .map_err(command_error("RPUSH"))?;
        Ok(())
    }

    async fn blocking_pop_tail(&mut self, list: &str) -> Result<Option<Vec<u8>>, StoreError> {
        // BRPOP replies with [key, value], or nil once the timeout elapses.
        let reply: Option<(String, Vec<u8>)> = redis::cmd("BRPOP")
            .arg(list)
            .arg(timeout_arg(self.block_timeout))
            .query_async(&mut self.conn)
            .await
            .map_err(command_error("BRPOP"))?;
        Ok(reply.map(|(_key, payload)| payload))
    }

    async fn blocking_pop_tail_push_head(
        &mut self,
        src: &str,
        dest: &str,
    ) -> Result<Option<Vec<u8>>, StoreError> {
        let reply: Option<Vec<u8>> = redis::cmd("BRPOPLPUSH")
            .arg(src)
            .arg(dest)
            .arg(timeout_arg(self.block_timeout))
            .query_async(&mut self.conn)
            .await
            .map_err(command_error("BRPOPLPUSH"))?;
        Ok(reply)
    }

    async fn pop_tail_push_head(
        &mut self,
        src: &str,
        dest: &str,
    ) -> Result<Option<Vec<u8>>, StoreError> {
        let reply: Option<Vec<u8>> = redis::cmd("RPOPLPUSH")
            .arg(src)
            .arg(dest)
            .query_async(&mut self.conn)
            .await
            .map_err(command_error("RPOPLPUSH"))?;
        Ok(reply)
    }

    async fn len(&mut self, list: &str) -> Result<usize, StoreError> {
        let len: usize = redis::cmd("LLEN")
            .arg(list)
            .query_async(&mut self.conn)
            .await
            .map_err(command_error("LLEN"))?;
        Ok(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::QueueError;
    use crate::processor::ProcessorKind;
    use crate::queue::{BaseQueue, Queue};

    #[test]
    fn open_rejects_malformed_url() {
        assert!(matches!(
            RedisPool::open("not a url"),
            Err(StoreError::Connection(_))
        ));
    }

    #[test]
    fn open_does_not_dial() {
        assert!(RedisPool::open("redis://127.0.0.1:1/").is_ok());
    }

    #[tokio::test]
    async fn unreachable_server_is_connection_error() {
        let pool = RedisPool::open("redis://127.0.0.1:1/").unwrap();
        assert!(matches!(pool.get().await, Err(StoreError::Connection(_))));
    }

    #[test]
    fn whole_second_timeouts_are_integers() {
        assert_eq!(timeout_arg(Duration::ZERO), "0");
        assert_eq!(timeout_arg(Duration::from_secs(2)), "2");
        assert_eq!(timeout_arg(Duration::from_millis(1500)), "1.5");
    }

    // 以下は実際の Redis サーバーが必要です:
    //   REDIS_URL=redis://127.0.0.1:6379/ cargo test --features redis -- --ignored

    fn redis_url() -> String {
        std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379/".to_string())
    }

    /// Pool with a 1s block timeout and the given keys deleted.
    async fn fresh_pool(keys: &[&str]) -> RedisPool {
        let pool = RedisPool::open(&redis_url())
            .unwrap()
            .with_block_timeout(Duration::from_secs(1));
        let mut conn = pool.client.get_multiplexed_async_connection().await.unwrap();
        let _: i64 = redis::cmd("DEL").arg(keys).query_async(&mut conn).await.unwrap();
        pool
    }

    #[tokio::test]
    #[ignore = "needs a Redis server (REDIS_URL)"]
    async fn fifo_order_on_redis() {
        let key = "procq-test:fifo";
        let pool = fresh_pool(&[key]).await;
        let q = BaseQueue::with_processor(pool, key, ProcessorKind::Fifo.processor());

        q.push(b"p1").await.unwrap();
        q.push(b"p2").await.unwrap();
        assert_eq!(q.pull().await.unwrap(), Some(b"p1".to_vec()));
        assert_eq!(q.pull().await.unwrap(), Some(b"p2".to_vec()));
    }

    #[tokio::test]
    #[ignore = "needs a Redis server (REDIS_URL)"]
    async fn lifo_order_on_redis() {
        let key = "procq-test:lifo";
        let pool = fresh_pool(&[key]).await;
        let q = BaseQueue::with_processor(pool, key, ProcessorKind::Lifo.processor());

        q.push(b"p1").await.unwrap();
        q.push(b"p2").await.unwrap();
        assert_eq!(q.pull().await.unwrap(), Some(b"p2".to_vec()));
        assert_eq!(q.pull().await.unwrap(), Some(b"p1".to_vec()));
    }

    #[tokio::test]
    #[ignore = "needs a Redis server (REDIS_URL)"]
    async fn pull_to_lands_in_named_destination() {
        let (src, dest) = ("procq-test:handoff", "procq-test:handoff:processing");
        let pool = fresh_pool(&[src, dest]).await;
        let q = BaseQueue::new(pool.clone(), src);

        q.push(&[0x00, 0xff, 0x10]).await.unwrap();
        assert_eq!(q.pull_to(dest).await.unwrap(), Some(vec![0x00, 0xff, 0x10]));

        let mut cnx = pool.get().await.unwrap();
        assert_eq!(cnx.len(src).await.unwrap(), 0);
        assert_eq!(cnx.len(dest).await.unwrap(), 1);
        assert_eq!(cnx.blocking_pop_tail(dest).await.unwrap(), Some(vec![0x00, 0xff, 0x10]));
    }

    #[tokio::test]
    #[ignore = "needs a Redis server (REDIS_URL)"]
    async fn block_timeout_is_empty_sentinel() {
        let (src, dest) = ("procq-test:idle", "procq-test:idle:processing");
        let q = BaseQueue::new(fresh_pool(&[src, dest]).await, src);

        assert_eq!(q.pull().await.unwrap(), None);
        assert_eq!(q.pull_to(dest).await.unwrap(), None);
    }

    #[tokio::test]
    #[ignore = "needs a Redis server (REDIS_URL)"]
    async fn concat_on_empty_source_on_redis() {
        let (src, dest) = ("procq-test:drained", "procq-test:retry");
        let pool = fresh_pool(&[src, dest]).await;
        let retry = BaseQueue::new(pool.clone(), dest);
        retry.push(b"old").await.unwrap();

        let err = BaseQueue::new(pool, src).concat(dest).await.unwrap_err();
        assert!(matches!(err, QueueError::EmptySource { .. }));
        assert_eq!(retry.len().await.unwrap(), 1);
    }
}
