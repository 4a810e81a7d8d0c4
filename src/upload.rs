//! Upload stage: writes criticality scores back to the inventory as a single
//! create-or-update synchronization job.

use std::time::Duration;

use thiserror::Error;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::inventory::{InventoryApi, InventoryError, StartParams, SyncPayload, UploadItem};
use crate::scoring::ScoredRecord;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("nothing to upload")]
    EmptyPayload,

    #[error("synchronization job timed out after {0}s")]
    Timeout(u64),

    #[error("synchronization job failed: {0}")]
    Sync(#[from] InventoryError),
}

/// What the inventory reported for a finished upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSummary {
    pub job_id: String,
    pub status: String,
    pub entity_count: usize,
}

/// Projects records onto the id and score, the only fields written back.
pub fn build_payload(records: &[ScoredRecord]) -> SyncPayload {
    SyncPayload {
        entities: records
            .iter()
            .map(|record| UploadItem {
                id: record.id.clone(),
                criticality_score: record.criticality_score,
            })
            .collect(),
    }
}

/// Submits all records in one batch job and waits for it to finalize.
///
/// The start/upload/finalize sequence is abandoned when `deadline` passes.
/// A job that was already started stays open on the server until the
/// inventory expires it; nothing is finalized or retried from here.
pub async fn upload<C: InventoryApi>(
    client: &C,
    records: &[ScoredRecord],
    deadline: Duration,
) -> Result<UploadSummary, UploadError> {
    if records.is_empty() {
        return Err(UploadError::EmptyPayload);
    }

    let payload = build_payload(records);
    let params = StartParams::create_or_update();
    info!(entities = payload.entities.len(), "ingesting criticality data");

    let report = match timeout(deadline, client.process_sync_job(&params, &payload)).await {
        Ok(result) => result?,
        Err(_) => {
            warn!(
                timeout_secs = deadline.as_secs(),
                entities = payload.entities.len(),
                "synchronization job abandoned at deadline, it may be left open"
            );
            return Err(UploadError::Timeout(deadline.as_secs()));
        }
    };

    Ok(UploadSummary {
        job_id: report.job_id,
        status: report.status,
        entity_count: payload.entities.len(),
    })
}
