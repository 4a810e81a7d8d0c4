//! In-memory [`InventoryApi`] for tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::Value;

use super::{InventoryApi, InventoryError, StartParams, SyncJobReport, SyncPayload};

/// Canned behaviour for one asset type's query.
#[derive(Debug, Clone)]
pub enum MockQuery {
    Respond(Value),
    Fail(String),
    Hang,
    Panic,
}

#[derive(Debug)]
pub struct MockInventory {
    queries: HashMap<String, MockQuery>,
    sync_failure: Option<String>,
    sync_hangs: bool,
    pub query_calls: AtomicUsize,
    pub sync_calls: AtomicUsize,
    pub uploads: Mutex<Vec<(StartParams, SyncPayload)>>,
}

impl MockInventory {
    pub fn new() -> Self {
        Self {
            queries: HashMap::new(),
            sync_failure: None,
            sync_hangs: false,
            query_calls: AtomicUsize::new(0),
            sync_calls: AtomicUsize::new(0),
            uploads: Mutex::new(Vec::new()),
        }
    }

    pub fn with_query(mut self, asset_type: &str, behaviour: MockQuery) -> Self {
        self.queries.insert(asset_type.to_string(), behaviour);
        self
    }

    /// Shorthand for a successful query answering with `{"type": "table", "data": rows}`.
    pub fn with_rows(self, asset_type: &str, rows: Value) -> Self {
        self.with_query(
            asset_type,
            MockQuery::Respond(serde_json::json!({"type": "table", "data": rows})),
        )
    }

    pub fn failing_sync(mut self, message: &str) -> Self {
        self.sync_failure = Some(message.to_string());
        self
    }

    /// The sync job is recorded, then never completes.
    pub fn hanging_sync(mut self) -> Self {
        self.sync_hangs = true;
        self
    }

    pub fn query_count(&self) -> usize {
        self.query_calls.load(Ordering::SeqCst)
    }

    pub fn sync_count(&self) -> usize {
        self.sync_calls.load(Ordering::SeqCst)
    }
}

// Queries look like "FIND <AssetType> AS asset ...".
fn asset_type_of(query: &str) -> &str {
    query.split_whitespace().nth(1).unwrap_or_default()
}

impl InventoryApi for MockInventory {
    async fn query(&self, query: &str) -> Result<Value, InventoryError> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);
        match self.queries.get(asset_type_of(query)) {
            Some(MockQuery::Respond(value)) => Ok(value.clone()),
            Some(MockQuery::Fail(message)) => Err(InventoryError::ApiError {
                status: 500,
                message: message.clone(),
            }),
            Some(MockQuery::Hang) => std::future::pending().await,
            Some(MockQuery::Panic) => panic!("mock inventory asked to panic"),
            None => Ok(serde_json::json!({"type": "table", "data": []})),
        }
    }

    async fn process_sync_job(
        &self,
        params: &StartParams,
        payload: &SyncPayload,
    ) -> Result<SyncJobReport, InventoryError> {
        self.sync_calls.fetch_add(1, Ordering::SeqCst);
        self.uploads
            .lock()
            .unwrap()
            .push((params.clone(), payload.clone()));
        if self.sync_hangs {
            return std::future::pending().await;
        }
        match &self.sync_failure {
            Some(message) => Err(InventoryError::ApiError {
                status: 503,
                message: message.clone(),
            }),
            None => Ok(SyncJobReport {
                job_id: "mock-job".into(),
                status: "FINALIZE_PENDING".into(),
            }),
        }
    }
}
