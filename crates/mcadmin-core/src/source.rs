//! Where the API gets its snapshots from.
//!
//! Request handlers depend on [`SnapshotSource`] rather than on a concrete
//! authority handle, so the simulation type stays out of the HTTP layer
//! and tests can substitute canned or failing sources.

use futures::future::BoxFuture;
use mcadmin_types::SnapshotBatch;
use tracing::debug;

use crate::bridge::{AuthorityHandle, BridgeError};
use crate::collector::collect_batch;
use crate::registry::ParticipantRegistry;

/// Produces a fresh snapshot batch of every online participant.
pub trait SnapshotSource: Send + Sync {
    /// Collect one batch.
    ///
    /// # Errors
    ///
    /// Returns a [`BridgeError`] when the collection could not be run or
    /// did not finish within its wait budget.
    fn snapshot(&self) -> BoxFuture<'_, Result<SnapshotBatch, BridgeError>>;
}

impl<W> SnapshotSource for AuthorityHandle<W>
where
    W: ParticipantRegistry + 'static,
{
    fn snapshot(&self) -> BoxFuture<'_, Result<SnapshotBatch, BridgeError>> {
        Box::pin(async move {
            let batch = self
                .run_on_authority_thread(|world: &W| collect_batch(world))
                .await?;
            debug!(
                count = batch.count,
                tick = self.current_tick(),
                "Snapshot batch collected"
            );
            Ok(batch)
        })
    }
}
