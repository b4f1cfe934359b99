//! `reqwest` implementation of [`RemoteStepStore`].
//!
//! Endpoints, relative to the configured API base:
//! - `GET  stockMovements/{id}?stepNumber={n}`
//! - `POST stockMovements/{id}` (flattened `{id, stepNumber, packPageItems}`)
//! - `POST stockMovements/{id}/status` (`{status}`)
//! - `GET  persons?name={query}`

use crate::RemoteStepStore;
use crate::StoreError;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;
use stockflow_protocol::LineItem;
use stockflow_protocol::StepContext;
use stockflow_protocol::StepState;
use stockflow_protocol::UserRef;
use stockflow_protocol::envelope::SaveStepRequest;
use stockflow_protocol::envelope::StatusTransitionRequest;
use stockflow_protocol::envelope::StepEnvelope;
use stockflow_protocol::envelope::UsersEnvelope;
use stockflow_protocol::flatten::flatten_request;
use url::Url;

const STOCK_MOVEMENTS: &str = "stockMovements";
const STATUS: &str = "status";
const PERSONS: &str = "persons";

/// Step store backed by the stock-movement HTTP API.
#[derive(Debug, Clone)]
pub struct HttpStepStore {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpStepStore {
    /// Create with a default client.
    pub fn new(base_url: &str) -> Result<Self, StoreError> {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Create with a per-request timeout.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Network(e.to_string()))?;
        Self::with_client(client, base_url)
    }

    /// Create with a caller-configured client (auth headers, proxies, ...).
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Result<Self, StoreError> {
        let base_url = Url::parse(base_url).map_err(|e| StoreError::Url(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(StoreError::Url(format!("{base_url}: not a base url")));
        }
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Append path segments to the base url, tolerating a trailing slash.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, StoreError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| StoreError::Url(format!("{}: not a base url", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, StoreError> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(StoreError::Http {
                status: status.as_u16(),
                body,
            });
        }
        Ok(serde_json::from_str(&body)?)
    }

    async fn expect_success(response: reqwest::Response) -> Result<(), StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(StoreError::Http {
            status: status.as_u16(),
            body,
        })
    }

    fn canonical_items(envelope: StepEnvelope) -> Result<Vec<LineItem>, StoreError> {
        let items = envelope.into_items();
        StepState::check_unique_ids(&items)
            .map_err(|id| StoreError::Decode(format!("duplicate line item id {id}")))?;
        Ok(items)
    }
}

#[async_trait]
impl RemoteStepStore for HttpStepStore {
    async fn fetch(&self, ctx: &StepContext) -> Result<Vec<LineItem>, StoreError> {
        let url = self.endpoint(&[STOCK_MOVEMENTS, &ctx.stock_movement_id])?;
        tracing::debug!(%url, step = ctx.step_number, "fetching step items");

        let response = self
            .client
            .get(url)
            .query(&[("stepNumber", ctx.step_number.to_string())])
            .send()
            .await?;
        let envelope: StepEnvelope = Self::read_json(response).await?;
        Self::canonical_items(envelope)
    }

    async fn save(
        &self,
        ctx: &StepContext,
        items: Vec<LineItem>,
    ) -> Result<Option<Vec<LineItem>>, StoreError> {
        if items.is_empty() {
            tracing::debug!("no line items to save, skipping request");
            return Ok(None);
        }

        let url = self.endpoint(&[STOCK_MOVEMENTS, &ctx.stock_movement_id])?;
        let count = items.len();
        let request = SaveStepRequest::new(&ctx.stock_movement_id, ctx.step_number, items);
        let body = flatten_request(serde_json::to_value(&request)?);
        tracing::debug!(%url, count, "saving step items");

        let response = self.client.post(url).json(&body).send().await?;
        let envelope: StepEnvelope = Self::read_json(response).await?;
        Self::canonical_items(envelope).map(Some)
    }

    async fn transition_status(&self, ctx: &StepContext, status: &str) -> Result<(), StoreError> {
        let url = self.endpoint(&[STOCK_MOVEMENTS, &ctx.stock_movement_id, STATUS])?;
        tracing::debug!(%url, status, "transitioning stock movement");

        let request = StatusTransitionRequest {
            status: status.to_string(),
        };
        let response = self.client.post(url).json(&request).send().await?;
        Self::expect_success(response).await
    }

    async fn search_users(&self, query: &str) -> Result<Vec<UserRef>, StoreError> {
        let url = self.endpoint(&[PERSONS])?;
        let response = self
            .client
            .get(url)
            .query(&[("name", query)])
            .send()
            .await?;
        let envelope: UsersEnvelope = Self::read_json(response).await?;
        Ok(envelope.data)
    }
}
