use std::time::Duration;

use reqwest::{Client, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use super::InventoryApi;
use super::error::InventoryError;
use super::types::{
    GraphQlRequest, GraphQlResponse, QUERY_DOCUMENT, QueryVariables, StartParams, SyncJobEnvelope,
    SyncJobReport, SyncPayload,
};
use crate::config::Credentials;

const SYNC_JOBS_PATH: &str = "/persister/synchronization/jobs";

/// HTTP client for the JupiterOne graph and synchronization APIs.
pub struct JupiterOneClient {
    account_id: String,
    api_key: String,
    client: Client,
    graphql_url: String,
    api_base_url: String,
}

impl JupiterOneClient {
    /// Builds a client whose endpoints are derived from the credentials' region.
    pub fn new(credentials: &Credentials) -> Result<Self, InventoryError> {
        let graphql_url = format!("https://graphql.{}.jupiterone.io", credentials.region);
        let api_base_url = format!("https://api.{}.jupiterone.io", credentials.region);
        Self::with_base_urls(credentials, graphql_url, api_base_url)
    }

    /// Create a client pointing at custom endpoints (useful for testing).
    pub fn with_base_urls(
        credentials: &Credentials,
        graphql_url: String,
        api_base_url: String,
    ) -> Result<Self, InventoryError> {
        for url in [&graphql_url, &api_base_url] {
            Url::parse(url)
                .map_err(|e| InventoryError::InvalidConfig(format!("{url}: {e}")))?;
        }

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| InventoryError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            account_id: credentials.account_id.clone(),
            api_key: credentials.api_key.clone(),
            client,
            graphql_url,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn post_json<B, T>(&self, url: &str, body: &B) -> Result<T, InventoryError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .header("JupiterOne-Account", &self.account_id)
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(InventoryError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.json::<T>().await?;
        Ok(body)
    }

    fn sync_job_url(&self, job_id: &str, action: &str) -> String {
        format!("{}{SYNC_JOBS_PATH}/{job_id}/{action}", self.api_base_url)
    }
}

impl InventoryApi for JupiterOneClient {
    async fn query(&self, query: &str) -> Result<Value, InventoryError> {
        let request = GraphQlRequest {
            query: QUERY_DOCUMENT,
            variables: QueryVariables { query },
        };
        let response: GraphQlResponse = self.post_json(&self.graphql_url, &request).await?;

        if !response.errors.is_empty() {
            let messages: Vec<String> = response.errors.into_iter().map(|e| e.message).collect();
            return Err(InventoryError::Query(messages.join("; ")));
        }

        response
            .data
            .and_then(|data| match data {
                Value::Object(mut fields) => fields.remove("queryV1"),
                _ => None,
            })
            .ok_or_else(|| InventoryError::UnexpectedResponse("missing queryV1 field".into()))
    }

    async fn process_sync_job(
        &self,
        params: &StartParams,
        payload: &SyncPayload,
    ) -> Result<SyncJobReport, InventoryError> {
        let start_url = format!("{}{SYNC_JOBS_PATH}", self.api_base_url);
        let started: SyncJobEnvelope = self.post_json(&start_url, params).await?;
        let job_id = started.job.id;
        debug!(job_id = %job_id, status = %started.job.status, "synchronization job started");

        let _: Value = self
            .post_json(&self.sync_job_url(&job_id, "upload"), payload)
            .await?;
        debug!(job_id = %job_id, entities = payload.entities.len(), "entities uploaded");

        let finalized: SyncJobEnvelope = self
            .post_json(&self.sync_job_url(&job_id, "finalize"), &serde_json::json!({}))
            .await?;

        Ok(SyncJobReport {
            job_id,
            status: finalized.job.status,
        })
    }
}
