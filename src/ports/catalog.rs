use std::time::Duration;

use crate::services::highlights::types::CandidateTrack;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Failed to send http request: {0}")]
    FailedToSendRequest(reqwest::Error),
    #[error("Catalog responded with status {status}: {reason}")]
    UnexpectedStatus { status: u16, reason: String },
    #[error("Failed to parse response: {0}")]
    FailedToParseResponse(reqwest::Error),
    #[error("Search did not finish within {0:?}")]
    Timeout(Duration),
    #[error("Search cancelled")]
    Cancelled,
    #[error("Catalog unavailable: {0}")]
    Unavailable(String),
}

impl CatalogError {
    /// Errors worth retrying against the same endpoint: rate limiting, server
    /// errors and requests that timed out on the wire.
    pub fn is_transient(&self) -> bool {
        match self {
            CatalogError::FailedToSendRequest(error) => error.is_timeout() || error.is_connect(),
            CatalogError::UnexpectedStatus { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Port for the external track catalog.
///
/// Implementations live in `services::spotify::client` (production) or test mocks.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogSearch: Send + Sync {
    /// Ranked track search; index 0 is the most relevant result. May be empty.
    async fn search_tracks(&self, query: &str) -> Result<Vec<CandidateTrack>, CatalogError>;
}
