//! Fetch-and-score worker: one query per asset type, one batch of scored
//! records out.
//!
//! Failures never escape a worker. A failed or malformed query degrades to an
//! empty batch for that asset type, and bad rows are skipped one by one.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::inventory::InventoryApi;
use crate::scoring::{ScoredRecord, Weights, score_row};

/// Inputs shared by every worker in a run.
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    pub weights: Weights,
    pub query_timeout: Duration,
    /// Reference instant for age computation, fixed once per run.
    pub now: DateTime<Utc>,
}

/// Scored records for a single asset type.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetBatch {
    pub asset_type: String,
    pub records: Vec<ScoredRecord>,
}

impl AssetBatch {
    fn empty(asset_type: &str) -> Self {
        Self {
            asset_type: asset_type.to_string(),
            records: Vec::new(),
        }
    }
}

/// Graph query returning id, name, class, creation time and relationship
/// count for every asset of `asset_type`.
pub fn build_query(asset_type: &str) -> String {
    format!(
        "FIND {asset_type} AS asset
THAT RELATES TO AS relationships *
RETURN
  asset._id,
  asset.displayName,
  asset._class,
  asset._createdOn,
  count(relationships) AS deps"
    )
}

/// Queries one asset type and scores every usable row.
pub async fn fetch_and_score<C: InventoryApi>(
    client: &C,
    asset_type: &str,
    settings: &WorkerSettings,
) -> AssetBatch {
    info!(asset_type, "acquiring data");

    let query = build_query(asset_type);
    let raw = match timeout(settings.query_timeout, client.query(&query)).await {
        Ok(Ok(raw)) => raw,
        Ok(Err(e)) => {
            warn!(asset_type, error = %e, "error when retrieving results");
            return AssetBatch::empty(asset_type);
        }
        Err(_) => {
            warn!(
                asset_type,
                timeout_secs = settings.query_timeout.as_secs(),
                "query timed out"
            );
            return AssetBatch::empty(asset_type);
        }
    };

    let Some(rows) = extract_rows(&raw, asset_type) else {
        return AssetBatch::empty(asset_type);
    };
    info!(asset_type, data_points = rows.len(), "query returned data points");

    let mut records = Vec::with_capacity(rows.len());
    let mut dropped = 0usize;
    for row in rows {
        match score_row(row, &settings.weights, settings.now) {
            Ok(record) => records.push(record),
            Err(reason) => {
                dropped += 1;
                debug!(asset_type, %reason, "row dropped");
            }
        }
    }

    info!(asset_type, scored = records.len(), dropped, "done acquiring data");
    AssetBatch {
        asset_type: asset_type.to_string(),
        records,
    }
}

// Expects `{"data": [row, ...]}`.
fn extract_rows<'a>(raw: &'a Value, asset_type: &str) -> Option<&'a Vec<Value>> {
    let Some(map) = raw.as_object() else {
        warn!(asset_type, "query result is not an object");
        return None;
    };
    let rows = map.get("data").and_then(Value::as_array);
    if rows.is_none() {
        warn!(asset_type, "query result has no data array");
    }
    rows
}
