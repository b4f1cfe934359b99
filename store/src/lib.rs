//! Remote persistence for wizard steps.
//!
//! [`RemoteStepStore`] is the seam between the step controller and the
//! server. [`HttpStepStore`] speaks the stock-movement REST API; tests and
//! embedders can supply their own implementation.

mod http;

pub use http::HttpStepStore;

use async_trait::async_trait;
use stockflow_protocol::LineItem;
use stockflow_protocol::StepContext;
use stockflow_protocol::UserRef;
use thiserror::Error;

/// Failure of a remote call.
///
/// Every variant means the server state is unknown to the caller; the
/// controller treats them alike and keeps its last known-good items.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Request could not be sent or no response arrived.
    #[error("network error: {0}")]
    Network(String),

    /// Server answered with a non-success status.
    #[error("server error: HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Response body did not match the expected envelope.
    #[error("parse error: {0}")]
    Decode(String),

    /// Endpoint URL could not be built from the configured base.
    #[error("invalid url: {0}")]
    Url(String),
}

impl StoreError {
    /// True for failures of the transport itself (no usable response).
    pub fn is_network_failure(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Http { .. })
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            StoreError::Decode(err.to_string())
        } else {
            StoreError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Decode(err.to_string())
    }
}

/// Fetch/save adapter for one wizard step.
#[async_trait]
pub trait RemoteStepStore: Send + Sync {
    /// Current line items of the step, in server order.
    async fn fetch(&self, ctx: &StepContext) -> Result<Vec<LineItem>, StoreError>;

    /// Persist the full item collection and return the server's canonical
    /// copy.
    ///
    /// Returns `Ok(None)` without contacting the server when `items` is
    /// empty.
    async fn save(
        &self,
        ctx: &StepContext,
        items: Vec<LineItem>,
    ) -> Result<Option<Vec<LineItem>>, StoreError>;

    /// Move the owning stock movement to `status`.
    async fn transition_status(&self, ctx: &StepContext, status: &str) -> Result<(), StoreError>;

    /// Users whose name matches `query`, offered as recipients.
    async fn search_users(&self, query: &str) -> Result<Vec<UserRef>, StoreError>;
}
