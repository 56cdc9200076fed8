//! HTTP access to the events API.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use shared::{
    domain::{EventList, FormPayload},
    protocol::{EVENTS_ROUTE, SUBSCRIBE_ROUTE},
};
use tracing::debug;

use crate::error::ClientError;

/// Prefix prepended to every endpoint path. Empty means same-origin relative
/// paths, which only resolve where the transport has a document origin.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiConfig {
    base_url: String,
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
        }
    }

    pub fn same_origin() -> Self {
        Self::default()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoint(&self, route: &str) -> String {
        format!("{}{route}", self.base_url)
    }
}

/// Transport seam for the view controller.
///
/// POST operations report the response status only; their bodies are never
/// read. Futures are not required to be `Send` so the browser fetch backend
/// can implement this.
#[async_trait(?Send)]
pub trait EventsApi {
    async fn list_events(&self) -> Result<EventList, ClientError>;
    async fn create_event(&self, payload: &FormPayload) -> Result<StatusCode, ClientError>;
    async fn subscribe(&self, payload: &FormPayload) -> Result<StatusCode, ClientError>;
}

#[derive(Debug, Clone)]
pub struct HttpEventsApi {
    http: Client,
    config: ApiConfig,
}

impl HttpEventsApi {
    pub fn new(config: ApiConfig) -> Self {
        Self {
            http: Client::new(),
            config,
        }
    }

    async fn post_form(&self, route: &str, payload: &FormPayload) -> Result<StatusCode, ClientError> {
        let url = self.config.endpoint(route);
        // `.json` sets `Content-Type: application/json`.
        let res = self
            .http
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(|source| ClientError::Transport {
                url: url.clone(),
                source,
            })?;
        let status = res.status();
        debug!(%url, %status, fields = payload.len(), "form submitted");
        Ok(status)
    }
}

#[async_trait(?Send)]
impl EventsApi for HttpEventsApi {
    async fn list_events(&self) -> Result<EventList, ClientError> {
        let url = self.config.endpoint(EVENTS_ROUTE);
        let res = match self.http.get(&url).send().await {
            Ok(res) => res,
            Err(source) => return Err(ClientError::Transport { url, source }),
        };
        let status = res.status();
        if !status.is_success() {
            return Err(ClientError::Status { url, status });
        }
        let body = match res.bytes().await {
            Ok(body) => body,
            Err(source) => return Err(ClientError::Transport { url, source }),
        };
        let list = match EventList::from_json_slice(&body) {
            Ok(list) => list,
            Err(source) => return Err(ClientError::Decode { url, source }),
        };
        debug!(%url, count = list.events.len(), "events fetched");
        Ok(list)
    }

    async fn create_event(&self, payload: &FormPayload) -> Result<StatusCode, ClientError> {
        self.post_form(EVENTS_ROUTE, payload).await
    }

    async fn subscribe(&self, payload: &FormPayload) -> Result<StatusCode, ClientError> {
        self.post_form(SUBSCRIBE_ROUTE, payload).await
    }
}
