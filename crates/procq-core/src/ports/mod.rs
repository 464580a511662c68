//! Ports - 抽象化レイヤー
//!
//! このモジュールは Hexagonal Architecture の「ポート」を定義します。
//! Processor と Queue は共有リストストア（Redis など）をこの trait 越しにだけ触ります。
//!
//! # 設計原則
//! - アトミックな移動（pop + push）はストア側の単一コマンドに任せる
//! - 接続は 1 操作ごとに借りて、Drop で返す

pub mod pool;
pub mod store;

pub use self::pool::ConnectionPool;
pub use self::store::StoreConnection;
