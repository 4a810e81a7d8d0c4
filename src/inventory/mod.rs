pub mod client;
pub mod error;
#[cfg(test)]
pub mod mock;
pub mod types;

use std::future::Future;

use serde_json::Value;

pub use client::JupiterOneClient;
pub use error::InventoryError;
pub use types::{StartParams, SyncJobReport, SyncPayload, UploadItem};

/// The two inventory operations this tool depends on.
///
/// `query` returns the untyped query result; `process_sync_job` runs a whole
/// start/upload/finalize ingestion job for one payload.
pub trait InventoryApi: Send + Sync {
    fn query(&self, query: &str) -> impl Future<Output = Result<Value, InventoryError>> + Send;

    fn process_sync_job(
        &self,
        params: &StartParams,
        payload: &SyncPayload,
    ) -> impl Future<Output = Result<SyncJobReport, InventoryError>> + Send;
}
