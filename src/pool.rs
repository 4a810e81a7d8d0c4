//! Fixed-size worker pool fanning asset types out to fetch-and-score workers.
//!
//! One worker task is spawned per asset type. Jobs go through a bounded queue
//! sized to the job count and closed right after enqueueing, so the producer
//! never waits. Each worker sends exactly one [`AssetBatch`] per job, and the
//! pool performs exactly one receive per job. If a worker dies before
//! sending, the results channel closes early and the pool reports
//! [`CriticalityError::MissingResults`] instead of blocking forever.

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::error::{CriticalityError, MAX_ASSET_TYPES};
use crate::inventory::InventoryApi;
use crate::scoring::ScoredRecord;
use crate::worker::{AssetBatch, WorkerSettings, fetch_and_score};

type JobQueue = Arc<Mutex<mpsc::Receiver<String>>>;

/// Rejects empty lists and lists longer than [`MAX_ASSET_TYPES`].
pub fn validate_asset_types(asset_types: &[String]) -> Result<(), CriticalityError> {
    match asset_types.len() {
        0 => Err(CriticalityError::NoAssetTypes),
        n if n > MAX_ASSET_TYPES => Err(CriticalityError::TooManyAssetTypes(n)),
        _ => Ok(()),
    }
}

/// Runs one worker per asset type and gathers one batch per asset type.
///
/// Batches arrive in completion order, not input order.
pub async fn run_pool<C>(
    client: Arc<C>,
    asset_types: &[String],
    settings: WorkerSettings,
) -> Result<Vec<AssetBatch>, CriticalityError>
where
    C: InventoryApi + 'static,
{
    validate_asset_types(asset_types)?;

    let job_count = asset_types.len();
    let (job_tx, job_rx) = mpsc::channel::<String>(job_count);
    let job_rx: JobQueue = Arc::new(Mutex::new(job_rx));
    let (result_tx, mut result_rx) = mpsc::channel::<AssetBatch>(job_count);
    let settings = Arc::new(settings);

    let mut workers = JoinSet::new();
    for worker_id in 1..=job_count {
        workers.spawn(worker_loop(
            worker_id,
            Arc::clone(&client),
            Arc::clone(&job_rx),
            result_tx.clone(),
            Arc::clone(&settings),
        ));
    }
    // Only workers hold result senders from here on.
    drop(result_tx);

    for asset_type in asset_types {
        if job_tx.send(asset_type.clone()).await.is_err() {
            warn!(asset_type = %asset_type, "job queue closed before all jobs were enqueued");
            break;
        }
    }
    drop(job_tx);

    let mut batches = Vec::with_capacity(job_count);
    for _ in 0..job_count {
        match result_rx.recv().await {
            Some(batch) => {
                debug!(
                    asset_type = %batch.asset_type,
                    records = batch.records.len(),
                    "batch received"
                );
                batches.push(batch);
            }
            None => break,
        }
    }

    while let Some(joined) = workers.join_next().await {
        if let Err(e) = joined {
            warn!(error = %e, "worker task ended abnormally");
        }
    }

    if batches.len() != job_count {
        return Err(CriticalityError::MissingResults {
            expected: job_count,
            received: batches.len(),
        });
    }
    Ok(batches)
}

async fn worker_loop<C: InventoryApi>(
    worker_id: usize,
    client: Arc<C>,
    jobs: JobQueue,
    results: mpsc::Sender<AssetBatch>,
    settings: Arc<WorkerSettings>,
) {
    loop {
        let next = jobs.lock().await.recv().await;
        let Some(asset_type) = next else {
            break;
        };
        debug!(worker_id, asset_type = %asset_type, "worker picked up job");

        let batch = fetch_and_score(client.as_ref(), &asset_type, &settings).await;
        if results.send(batch).await.is_err() {
            warn!(worker_id, "results channel closed, dropping batch");
            break;
        }
    }
    debug!(worker_id, "worker exiting");
}

/// Joins per-asset-type batches into a single list.
pub fn flatten(batches: Vec<AssetBatch>) -> Vec<ScoredRecord> {
    batches.into_iter().flat_map(|batch| batch.records).collect()
}
