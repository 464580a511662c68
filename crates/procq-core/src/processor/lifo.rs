//! Last in, first out.

use async_trait::async_trait;
use tracing::{debug, warn};

use super::{Processor, concat_tail_to_head, pull_tail, pull_tail_to_head};
use crate::domain::QueueError;
use crate::ports::StoreConnection;

/// Pushes on the tail and pulls from the tail, so the most recently pushed
/// item is the next one out.
///
/// PullTo and Concat still read the tail of `src` and park the item on the
/// head of `dest`, exactly like [`Fifo`](super::Fifo).
#[derive(Debug, Clone, Copy, Default)]
pub struct Lifo;

#[async_trait]
impl Processor for Lifo {
    fn name(&self) -> &'static str {
        "lifo"
    }

    async fn push(
        &self,
        cnx: &mut dyn StoreConnection,
        src: &str,
        payload: &[u8],
    ) -> Result<(), QueueError> {
        cnx.append_tail(src, payload).await.map_err(|e| {
            warn!(source = src, error = %e, "lifo push failed");
            QueueError::from(e)
        })?;
        debug!(source = src, bytes = payload.len(), "pushed to tail");
        Ok(())
    }

    async fn pull(
        &self,
        cnx: &mut dyn StoreConnection,
        src: &str,
    ) -> Result<Option<Vec<u8>>, QueueError> {
        pull_tail(cnx, src).await
    }

    async fn pull_to(
        &self,
        cnx: &mut dyn StoreConnection,
        src: &str,
        dest: &str,
    ) -> Result<Option<Vec<u8>>, QueueError> {
        pull_tail_to_head(cnx, src, dest).await
    }

    async fn concat(
        &self,
        cnx: &mut dyn StoreConnection,
        src: &str,
        dest: &str,
    ) -> Result<(), QueueError> {
        concat_tail_to_head(cnx, src, dest).await
    }
}
