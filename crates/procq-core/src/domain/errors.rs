//! Errors - ストア障害とキュー操作エラー
//!
//! # 分類
//! - [`StoreError`]: 下層ストアのコマンドが報告した失敗（接続・プロトコル・タイムアウト）
//! - [`QueueError`]: Processor / Queue の呼び出し元に返すエラー
//!
//! Empty sentinel（「取り出すデータがない」）はエラーではなく `Option::None` で表現します。
//! Pull / PullTo はそれを `Ok(None)` として返し、Concat だけが
//! [`QueueError::EmptySource`] に変換します。

use thiserror::Error;

/// StoreError は下層ストアの失敗
///
/// リトライはしません。呼び出し元にそのまま伝播します。
#[derive(Debug, Error)]
pub enum StoreError {
    /// The connection (or the whole store) was closed while a command was pending.
    #[error("store connection closed")]
    Closed,

    /// The store could not be reached, or the address was malformed.
    #[error("store connection failed: {0}")]
    Connection(String),

    #[error("store command {command} failed: {message}")]
    Command {
        command: &'static str,
        message: String,
    },
}

/// QueueError は Processor / Queue 操作のエラー
#[derive(Debug, Error)]
pub enum QueueError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Concat found nothing to move.
    #[error("source list '{source_name}' is empty")]
    EmptySource { source_name: String },

    /// A blocking pull was abandoned because shutdown was requested.
    #[error("blocking pull cancelled by shutdown")]
    Cancelled,
}

impl QueueError {
    pub fn empty_source(source_name: impl Into<String>) -> Self {
        Self::EmptySource {
            source_name: source_name.into(),
        }
    }

    /// Is this a failure reported by the store itself?
    pub fn is_store(&self) -> bool {
        matches!(self, QueueError::Store(_))
    }
}
