//! StoreConnection port - リスト構造ストアへの 1 本の接続
//!
//! 「head」はリストの左端（LPUSH 側）、「tail」は右端（RPUSH / RPOP 側）です。

use async_trait::async_trait;

use crate::domain::StoreError;

/// One live connection to the shared list store.
///
/// Blocking commands return `Ok(None)` for the store's empty sentinel (e.g. a
/// `BRPOP` whose timeout elapsed). Only genuine failures are `Err`.
///
/// # Thread Safety
/// - `Send` を要求（tokio task 間で移動できる）
/// - `&mut self`: 1 本の接続で同時に 2 つのコマンドは流さない
#[async_trait]
pub trait StoreConnection: Send {
    /// Insert `payload` at the head of `list` (`LPUSH`).
    async fn append_head(&mut self, list: &str, payload: &[u8]) -> Result<(), StoreError>;

    /// Insert `payload` at the tail of `list` (`RPUSH`).
    async fn append_tail(&mut self, list: &str, payload: &[u8]) -> Result<(), StoreError>;

    /// Remove and return the tail of `list`, waiting for an item (`BRPOP`).
    async fn blocking_pop_tail(&mut self, list: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Atomically move the tail of `src` onto the head of `dest`, waiting for
    /// an item (`BRPOPLPUSH`). Returns the moved payload.
    async fn blocking_pop_tail_push_head(
        &mut self,
        src: &str,
        dest: &str,
    ) -> Result<Option<Vec<u8>>, StoreError>;

    /// Non-blocking variant of [`blocking_pop_tail_push_head`](Self::blocking_pop_tail_push_head)
    /// (`RPOPLPUSH`). `Ok(None)` when `src` is empty.
    async fn pop_tail_push_head(
        &mut self,
        src: &str,
        dest: &str,
    ) -> Result<Option<Vec<u8>>, StoreError>;

    /// Number of items currently in `list` (`LLEN`).
    async fn len(&mut self, list: &str) -> Result<usize, StoreError>;
}
