//! HTTP client for the business-scoped Shopify integration endpoints.

use std::fmt;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use shared::{
    domain::{BusinessId, ConfigDraft, IntegrationSummary},
    protocol::{
        config_route_segments, test_route_segments, ConfigRecord, Envelope, SaveConfigRequest,
    },
};
use tracing::{debug, info, warn};
use url::Url;

pub mod error;

pub use error::ClientError;
pub use reqwest::StatusCode;

pub type Result<T> = std::result::Result<T, ClientError>;

const MAX_ERROR_BODY_CHARS: usize = 256;

/// Normalized reply of one remote call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteOutcome<T> {
    Accepted { data: T, message: Option<String> },
    Rejected { error: Option<String> },
}

impl<T> RemoteOutcome<T> {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> RemoteOutcome<U> {
        match self {
            Self::Accepted { data, message } => RemoteOutcome::Accepted {
                data: f(data),
                message,
            },
            Self::Rejected { error } => RemoteOutcome::Rejected { error },
        }
    }
}

impl<T> RemoteOutcome<Option<T>> {
    fn from_envelope(envelope: Option<Envelope<T>>) -> Self {
        match envelope {
            Some(envelope) if envelope.success => Self::Accepted {
                data: envelope.data,
                message: envelope.message,
            },
            Some(envelope) => Self::Rejected {
                error: envelope.error,
            },
            None => Self::Rejected { error: None },
        }
    }
}

/// The four operations the settings form needs. Every call is sent once and
/// awaited; nothing is retried here.
#[async_trait]
pub trait IntegrationApi: Send + Sync {
    async fn get_config(
        &self,
        business_id: &BusinessId,
    ) -> Result<RemoteOutcome<Option<IntegrationSummary>>>;
    async fn save_config(
        &self,
        business_id: &BusinessId,
        draft: &ConfigDraft,
    ) -> Result<RemoteOutcome<Option<IntegrationSummary>>>;
    async fn delete_config(&self, business_id: &BusinessId) -> Result<RemoteOutcome<()>>;
    async fn test_connection(&self, business_id: &BusinessId) -> Result<RemoteOutcome<()>>;
}

#[derive(Clone)]
pub struct IntegrationClient {
    http: Client,
    base_url: Url,
    api_token: Option<SecretString>,
}

impl fmt::Debug for IntegrationClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntegrationClient")
            .field("base_url", &self.base_url.as_str())
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .finish_non_exhaustive()
    }
}

impl IntegrationClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let parsed = Url::parse(base_url.trim()).map_err(|source| ClientError::InvalidBaseUrl {
            url: base_url.to_string(),
            source,
        })?;
        if parsed.cannot_be_a_base() {
            return Err(ClientError::OpaqueBaseUrl(base_url.to_string()));
        }
        Ok(Self {
            http: Client::new(),
            base_url: parsed,
            api_token: None,
        })
    }

    pub fn with_api_token(mut self, api_token: SecretString) -> Self {
        self.api_token = Some(api_token);
        self
    }

    fn endpoint(&self, segments: [&str; 3]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ClientError::OpaqueBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.api_token {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    /// Sends a request and decodes the JSON envelope. `Ok(None)` means the
    /// server answered 404 without an envelope.
    async fn send_envelope<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        builder: RequestBuilder,
    ) -> Result<Option<Envelope<T>>> {
        let response = builder
            .send()
            .await
            .map_err(|source| ClientError::Transport { operation, source })?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| ClientError::Transport { operation, source })?;

        if body.trim().is_empty() {
            return if status == StatusCode::NOT_FOUND {
                Ok(None)
            } else if status.is_success() {
                Ok(Some(Envelope::ok(None)))
            } else {
                Err(ClientError::Status {
                    operation,
                    status,
                    body,
                })
            };
        }

        match serde_json::from_str::<Envelope<T>>(&body) {
            Ok(envelope) => {
                if !status.is_success() {
                    debug!(operation, %status, "structured reply with error status");
                }
                Ok(Some(envelope))
            }
            Err(_) if status == StatusCode::NOT_FOUND => Ok(None),
            Err(source) if status.is_success() => Err(ClientError::Decode { operation, source }),
            Err(_) => Err(ClientError::Status {
                operation,
                status,
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            }),
        }
    }
}

#[async_trait]
impl IntegrationApi for IntegrationClient {
    async fn get_config(
        &self,
        business_id: &BusinessId,
    ) -> Result<RemoteOutcome<Option<IntegrationSummary>>> {
        let url = self.endpoint(config_route_segments(business_id))?;
        debug!(business_id = %business_id, "fetching shopify config");
        let envelope = self
            .send_envelope::<ConfigRecord>("get_config", self.request(Method::GET, url))
            .await?;
        let outcome = RemoteOutcome::from_envelope(envelope)
            .map(|record| record.map(ConfigRecord::into_summary));
        if let RemoteOutcome::Accepted { data: None, .. } | RemoteOutcome::Rejected { .. } = &outcome
        {
            debug!(business_id = %business_id, "no shopify config on file");
        }
        Ok(outcome)
    }

    async fn save_config(
        &self,
        business_id: &BusinessId,
        draft: &ConfigDraft,
    ) -> Result<RemoteOutcome<Option<IntegrationSummary>>> {
        let url = self.endpoint(config_route_segments(business_id))?;
        let body = SaveConfigRequest::from_draft(draft);
        debug!(business_id = %business_id, request = ?body, "saving shopify config");
        let envelope = self
            .send_envelope::<ConfigRecord>(
                "save_config",
                self.request(Method::POST, url).json(&body),
            )
            .await?;
        let outcome = RemoteOutcome::from_envelope(envelope)
            .map(|record| record.map(ConfigRecord::into_summary));
        match &outcome {
            RemoteOutcome::Accepted { .. } => {
                info!(business_id = %business_id, store_url = %body.store_url, "shopify config saved")
            }
            RemoteOutcome::Rejected { error } => {
                warn!(business_id = %business_id, error = ?error, "shopify config save rejected")
            }
        }
        Ok(outcome)
    }

    async fn delete_config(&self, business_id: &BusinessId) -> Result<RemoteOutcome<()>> {
        let url = self.endpoint(config_route_segments(business_id))?;
        let envelope = self
            .send_envelope::<serde_json::Value>("delete_config", self.request(Method::DELETE, url))
            .await?;
        let outcome = RemoteOutcome::from_envelope(envelope).map(|_| ());
        match &outcome {
            RemoteOutcome::Accepted { .. } => {
                info!(business_id = %business_id, "shopify config deleted")
            }
            RemoteOutcome::Rejected { error } => {
                warn!(business_id = %business_id, error = ?error, "shopify config delete rejected")
            }
        }
        Ok(outcome)
    }

    async fn test_connection(&self, business_id: &BusinessId) -> Result<RemoteOutcome<()>> {
        let url = self.endpoint(test_route_segments(business_id))?;
        let envelope = self
            .send_envelope::<serde_json::Value>("test_connection", self.request(Method::GET, url))
            .await?;
        let outcome = RemoteOutcome::from_envelope(envelope).map(|_| ());
        info!(
            business_id = %business_id,
            accepted = outcome.is_accepted(),
            "shopify connection test finished"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
