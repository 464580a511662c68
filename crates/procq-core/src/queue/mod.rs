//! Queue module: the named-queue port and its pool-backed implementation.

mod base;

pub use base::BaseQueue;

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::QueueError;
use crate::processor::Processor;

/// Queue port (interface).
///
/// Design intent:
/// - The queue owns its name and the active [`Processor`]; the processor does
///   all of the actual list manipulation.
/// - The processor can be swapped at runtime. A call already in flight keeps
///   the processor it started with.
#[async_trait]
pub trait Queue: Send + Sync {
    /// Name of the underlying list.
    fn source(&self) -> &str;

    /// Enqueue `payload`. On error the payload is not in the store.
    async fn push(&self, payload: &[u8]) -> Result<(), QueueError>;

    /// Dequeue the next payload, waiting for one. `Ok(None)` is the store's
    /// empty sentinel (e.g. a blocking timeout), not a failure.
    async fn pull(&self) -> Result<Option<Vec<u8>>, QueueError>;

    /// Current strategy.
    fn processor(&self) -> Arc<dyn Processor>;

    /// Atomically replace the strategy.
    fn set_processor(&self, processor: Arc<dyn Processor>);
}
