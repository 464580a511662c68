//! Impls - ストアアダプタの実装
//!
//! # 含まれる実装
//! - **InMemoryStore**: 開発・テスト用（プロセス内）
//! - **RedisPool**: 本番用（feature = "redis"）

pub mod inmem_store;
#[cfg(feature = "redis")]
pub mod redis_store;

// 主要な型を再エクスポート
pub use self::inmem_store::{InMemoryConnection, InMemoryStore};
#[cfg(feature = "redis")]
pub use self::redis_store::{RedisConnection, RedisPool};
