//! Processor - キューの順序ポリシーと転送の戦略
//!
//! Processor は状態を持たない strategy object です。source / dest / payload は
//! すべて呼び出しごとに渡されるので、1 つのインスタンスを多数のキュー・スレッドで
//! 共有できます。
//!
//! # 実装
//! - [`Fifo`]: head に積んで tail から取る（先入れ先出し）
//! - [`Lifo`]: tail に積んで tail から取る（後入れ先出し）
//!
//! PullTo / Concat はどちらの実装でも「source の tail → dest の head」の
//! 単一コマンド移動です。アイテムが両方のリストに見える、あるいはどちらにも
//! 見えない瞬間はストアのコマンド原子性によって存在しません。

mod fifo;
mod kind;
mod lifo;

pub use self::fifo::Fifo;
pub use self::kind::ProcessorKind;
pub use self::lifo::Lifo;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use tracing::{debug, warn};

use crate::domain::QueueError;
use crate::ports::StoreConnection;

/// Process-wide shared first-in, first-out processor.
pub static FIFO: Lazy<Arc<dyn Processor>> = Lazy::new(|| Arc::new(Fifo));

/// Process-wide shared last-in, first-out processor.
pub static LIFO: Lazy<Arc<dyn Processor>> = Lazy::new(|| Arc::new(Lifo));

/// Ordering / transfer strategy for a named list.
///
/// # 設計原則
/// - 状態を持たない（`Send + Sync` で共有可能）
/// - ストアのエラーはリトライせずにそのまま返す
/// - Pull / PullTo は empty sentinel を `Ok(None)` に畳み込む
/// - Concat は empty sentinel を [`QueueError::EmptySource`] として返す
#[async_trait]
pub trait Processor: Send + Sync + fmt::Debug {
    /// Short policy name, used in logs and configuration.
    fn name(&self) -> &'static str;

    /// Add `payload` to `src` so that it is retrieved according to this policy.
    async fn push(
        &self,
        cnx: &mut dyn StoreConnection,
        src: &str,
        payload: &[u8],
    ) -> Result<(), QueueError>;

    /// Blocking retrieval of the next item of `src`.
    async fn pull(
        &self,
        cnx: &mut dyn StoreConnection,
        src: &str,
    ) -> Result<Option<Vec<u8>>, QueueError>;

    /// Blocking retrieval of the next item of `src`, atomically parked at the
    /// head of `dest` (reliable hand-off).
    async fn pull_to(
        &self,
        cnx: &mut dyn StoreConnection,
        src: &str,
        dest: &str,
    ) -> Result<Option<Vec<u8>>, QueueError>;

    /// Move exactly one item from `src` to `dest` without waiting.
    async fn concat(
        &self,
        cnx: &mut dyn StoreConnection,
        src: &str,
        dest: &str,
    ) -> Result<(), QueueError>;
}

/// Blocking pop from the tail; the empty sentinel becomes `Ok(None)`.
pub(crate) async fn pull_tail(
    cnx: &mut dyn StoreConnection,
    src: &str,
) -> Result<Option<Vec<u8>>, QueueError> {
    match cnx.blocking_pop_tail(src).await {
        Ok(Some(payload)) => {
            debug!(source = src, bytes = payload.len(), "pulled from tail");
            Ok(Some(payload))
        }
        Ok(None) => {
            debug!(source = src, "pull found no data");
            Ok(None)
        }
        Err(e) => {
            warn!(source = src, error = %e, "pull failed");
            Err(e.into())
        }
    }
}

/// Blocking tail-to-head move; the empty sentinel becomes `Ok(None)`.
pub(crate) async fn pull_tail_to_head(
    cnx: &mut dyn StoreConnection,
    src: &str,
    dest: &str,
) -> Result<Option<Vec<u8>>, QueueError> {
    match cnx.blocking_pop_tail_push_head(src, dest).await {
        Ok(Some(payload)) => {
            debug!(source = src, dest, bytes = payload.len(), "pulled into destination");
            Ok(Some(payload))
        }
        Ok(None) => {
            debug!(source = src, dest, "pull_to found no data");
            Ok(None)
        }
        Err(e) => {
            warn!(source = src, dest, error = %e, "pull_to failed");
            Err(e.into())
        }
    }
}

/// Single-shot tail-to-head move. An empty `src` is an error here.
pub(crate) async fn concat_tail_to_head(
    cnx: &mut dyn StoreConnection,
    src: &str,
    dest: &str,
) -> Result<(), QueueError> {
    match cnx.pop_tail_push_head(src, dest).await {
        Ok(Some(_)) => {
            debug!(source = src, dest, "concatenated one item");
            Ok(())
        }
        Ok(None) => Err(QueueError::empty_source(src)),
        Err(e) => {
            warn!(source = src, dest, error = %e, "concat failed");
            Err(e.into())
        }
    }
}
