use std::future::Future;
use std::time::Duration;

use akania_core::error::{AkaniaError, Result};

mod batch;
mod controller;
mod discovery;

pub use batch::{parse_batch_input, run_batch, BatchEntry, BatchReport};
pub use controller::{
    resolve_attempts, ExtractionOutcome, PipelineOptions, ProfilePipeline, Resolution,
};
pub use discovery::{dedup_preserving_order, rank_by_name, DiscoveryEngine, DiscoveryOptions};

/// Runs a fallible external call under `limit`; expiry becomes
/// [`AkaniaError::Timeout`].
pub(crate) async fn timed<T, F>(limit: Duration, op: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, op).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!("External call timed out after {}s", limit.as_secs());
            Err(AkaniaError::Timeout(limit.as_secs()))
        }
    }
}
