//! ConnectionPool port - 接続の貸し出し
//!
//! プールの管理そのもの（上限・ヘルスチェックなど）はこのクレートの範囲外です。

use async_trait::async_trait;

use crate::domain::StoreError;
use crate::ports::StoreConnection;

/// Hands out store connections for the duration of one operation.
///
/// The returned box is the scoped handle: dropping it releases the connection,
/// whether the operation succeeded or not.
#[async_trait]
pub trait ConnectionPool: Send + Sync {
    async fn get(&self) -> Result<Box<dyn StoreConnection>, StoreError>;
}
