//! Wire types for the inventory GraphQL query endpoint and the
//! synchronization (bulk ingestion) API.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// GraphQL document used for graph queries. Deferred responses are disabled
/// so results come back inline.
pub const QUERY_DOCUMENT: &str = "query J1QL($query: String!, $variables: JSON, $cursor: String) {
  queryV1(query: $query, variables: $variables, cursor: $cursor, deferredResponse: DISABLED) {
    type
    data
    cursor
  }
}";

/// Body of a GraphQL POST.
#[derive(Debug, Clone, Serialize)]
pub struct GraphQlRequest<'a> {
    pub query: &'static str,
    pub variables: QueryVariables<'a>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryVariables<'a> {
    pub query: &'a str,
}

/// Envelope of a GraphQL response. `data` is kept untyped; callers decide
/// what shape they expect.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlResponse {
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlError {
    pub message: String,
}

/// How the synchronization job treats entities already in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncMode {
    CreateOrUpdate,
}

/// Parameters for starting a synchronization job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartParams {
    pub source: String,
    pub sync_mode: SyncMode,
}

impl StartParams {
    /// Create-or-update job tagged with the `api` source.
    pub fn create_or_update() -> Self {
        Self {
            source: "api".to_string(),
            sync_mode: SyncMode::CreateOrUpdate,
        }
    }
}

/// A single entity update: the identifier and the score written back to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadItem {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "criticalityScore")]
    pub criticality_score: i64,
}

/// Batch of entities uploaded to a synchronization job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncPayload {
    pub entities: Vec<UploadItem>,
}

/// Job descriptor returned by the synchronization API.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncJob {
    pub id: String,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncJobEnvelope {
    pub job: SyncJob,
}

/// Outcome of a completed start/upload/finalize sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncJobReport {
    pub job_id: String,
    pub status: String,
}
