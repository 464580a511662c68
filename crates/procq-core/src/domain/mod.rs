//! Domain model: error taxonomy shared by ports, processors and queues.

pub mod errors;

pub use self::errors::{QueueError, StoreError};
