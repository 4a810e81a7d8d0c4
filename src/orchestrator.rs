use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::config::CriticalityConfig;
use crate::error::CriticalityError;
use crate::inventory::InventoryApi;
use crate::pool::{flatten, run_pool};
use crate::scoring::{ScoredRecord, weights_are_valid};
use crate::upload::{UploadSummary, upload};
use crate::worker::WorkerSettings;

/// How a run that did not error came to an end.
#[derive(Debug)]
pub enum RunOutcome {
    /// Every asset type came back empty; nothing was uploaded.
    NoData,
    /// Scores were computed and the upload was skipped on request.
    DryRun { records: Vec<ScoredRecord> },
    /// Scores were computed and written back.
    Uploaded {
        records: Vec<ScoredRecord>,
        summary: UploadSummary,
    },
}

/// Drives one scoring run: validate, fan out, aggregate, upload.
pub struct CriticalityRun<C> {
    client: Arc<C>,
    config: CriticalityConfig,
    dry_run: bool,
}

impl<C> CriticalityRun<C>
where
    C: InventoryApi + 'static,
{
    pub fn new(client: Arc<C>, config: CriticalityConfig) -> Self {
        Self {
            client,
            config,
            dry_run: false,
        }
    }

    /// Skip the upload stage and only report scores.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub async fn execute(&self) -> Result<RunOutcome, CriticalityError> {
        self.execute_at(Utc::now()).await
    }

    /// Runs with ages measured against `now`.
    pub async fn execute_at(&self, now: DateTime<Utc>) -> Result<RunOutcome, CriticalityError> {
        let weights = match self.config.weights {
            Some(weights) if weights_are_valid(Some(&weights)) => weights,
            other => return Err(CriticalityError::InvalidWeights(other)),
        };

        info!(assets = self.config.assets.len(), "number of assets");
        let settings = WorkerSettings {
            weights,
            query_timeout: self.config.query_timeout(),
            now,
        };
        let batches = run_pool(Arc::clone(&self.client), &self.config.assets, settings).await?;
        let records = flatten(batches);

        if records.is_empty() {
            info!("no criticality data was found");
            return Ok(RunOutcome::NoData);
        }

        if self.dry_run {
            info!(records = records.len(), "dry run, skipping upload");
            return Ok(RunOutcome::DryRun { records });
        }

        let summary = upload(
            self.client.as_ref(),
            &records,
            self.config.upload_timeout(),
        )
        .await?;
        info!(
            job_id = %summary.job_id,
            status = %summary.status,
            entities = summary.entity_count,
            "criticality data ingested"
        );

        Ok(RunOutcome::Uploaded { records, summary })
    }
}
