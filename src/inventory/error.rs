//! Error types for the graph inventory client.
//!
//! [`InventoryError`] covers HTTP status failures, GraphQL-level errors and
//! network failures, plus responses whose shape we cannot use.

use thiserror::Error;

/// Errors that can occur while talking to the inventory API.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// The API answered with a non-success HTTP status.
    #[error("API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The GraphQL endpoint answered 200 but reported errors in the body.
    #[error("query rejected: {0}")]
    Query(String),

    /// The response decoded, but not into the shape we expected.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// The client could not be constructed from the given credentials.
    #[error("invalid client configuration: {0}")]
    InvalidConfig(String),

    /// Underlying network failure (DNS, connection refused, TLS).
    #[error("network error: {0}")]
    NetworkError(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_display() {
        let err = InventoryError::ApiError {
            status: 401,
            message: "Unauthorized".into(),
        };
        assert_eq!(err.to_string(), "API error (status 401): Unauthorized");
    }

    #[test]
    fn query_display() {
        assert_eq!(
            InventoryError::Query("unknown class".into()).to_string(),
            "query rejected: unknown class"
        );
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<InventoryError>();
    }
}
