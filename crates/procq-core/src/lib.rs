//! procq-core
//!
//! Named, ordered queues over a shared list store, with a swappable ordering
//! strategy.
//!
//! # モジュール構成
//! - **domain**: エラー型（StoreError, QueueError）
//! - **ports**: 抽象化レイヤー（StoreConnection, ConnectionPool）
//! - **processor**: 順序ポリシー（Processor trait, FIFO, LIFO）
//! - **queue**: Queue trait と BaseQueue
//! - **impls**: ストア実装（InMemoryStore、feature = "redis" で RedisPool）
//! - **config**: TOML 設定

pub mod config;
pub mod domain;
pub mod impls;
pub mod ports;
pub mod processor;
pub mod queue;

pub use config::{Config, ConfigError};
pub use domain::{QueueError, StoreError};
pub use processor::{FIFO, LIFO, Processor, ProcessorKind};
pub use queue::{BaseQueue, Queue};
