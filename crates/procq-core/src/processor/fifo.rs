//! First in, first out.

use async_trait::async_trait;
use tracing::{debug, warn};

use super::{Processor, concat_tail_to_head, pull_tail, pull_tail_to_head};
use crate::domain::QueueError;
use crate::ports::StoreConnection;

/// Pushes on the head and pulls from the tail, so the oldest pending item is
/// always the next one out.
#[derive(Debug, Clone, Copy, Default)]
pub struct Fifo;

#[async_trait]
impl Processor for Fifo {
    fn name(&self) -> &'static str {
        "fifo"
    }

    async fn push(
        &self,
        cnx: &mut dyn StoreConnection,
        src: &str,
        payload: &[u8],
    ) -> Result<(), QueueError> {
        cnx.append_head(src, payload).await.map_err(|e| {
            warn!(source = src, error = %e, "fifo push failed");
            QueueError::from(e)
        })?;
        debug!(source = src, bytes = payload.len(), "pushed to head");
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::testing::{Command, RecordingConnection, Reply};

    #[tokio::test]
    async fn push_appends_to_head() {
        let mut cnx = RecordingConnection::default();
        Fifo.push(&mut cnx, "jobs", &[0x01]).await.unwrap();
        assert_eq!(cnx.commands, vec![Command::AppendHead("jobs".into(), vec![0x01])]);
    }

    #[tokio::test]
    async fn pull_pops_from_tail() {
        let mut cnx = RecordingConnection::with_replies([Reply::Item(vec![0x01])]);
        let pulled = Fifo.pull(&mut cnx, "jobs").await.unwrap();
        assert_eq!(pulled, Some(vec![0x01]));
        assert_eq!(cnx.commands, vec![Command::BlockingPopTail("jobs".into())]);
    }
}
