use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use secrecy::ExposeSecret;
use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::{
    BusinessId, ConfigDraft, ConfigId, IntegrationSummary, DEFAULT_API_VERSION,
};

pub fn config_route_segments(business_id: &BusinessId) -> [&str; 3] {
    ["shopify", "config", business_id.as_str()]
}

pub fn test_route_segments(business_id: &BusinessId) -> [&str; 3] {
    ["shopify", "test", business_id.as_str()]
}

/// Response body shared by all four endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    pub fn ok(data: Option<T>) -> Self {
        Self {
            success: true,
            data,
            error: None,
            message: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

fn default_active() -> bool {
    true
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

fn api_version_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .map(|version| version.trim().to_string())
        .filter(|version| !version.is_empty())
        .unwrap_or_else(default_api_version))
}

fn active_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(true))
}

fn lenient_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_timestamp))
}

/// Parses RFC 3339 as well as database-style timestamps. A timestamp without
/// an offset is taken as UTC; anything unrecognized yields `None`.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M:%S%.f%#z"] {
        if let Ok(parsed) = DateTime::parse_from_str(raw, format) {
            return Some(parsed.with_timezone(&Utc));
        }
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    None
}

/// Persisted integration row as returned by the config endpoints.
#[derive(Clone, Serialize, Deserialize)]
pub struct ConfigRecord {
    #[serde(default)]
    pub id: Option<ConfigId>,
    pub business_id: BusinessId,
    pub store_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default = "default_api_version", deserialize_with = "api_version_or_default")]
    pub api_version: String,
    #[serde(default = "default_active", deserialize_with = "active_or_default")]
    pub is_active: bool,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl fmt::Debug for ConfigRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigRecord")
            .field("id", &self.id)
            .field("business_id", &self.business_id)
            .field("store_url", &self.store_url)
            .field("access_token", &self.access_token.as_ref().map(|_| "[REDACTED]"))
            .field("api_version", &self.api_version)
            .field("is_active", &self.is_active)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

impl ConfigRecord {
    /// Drops the token; only the summary leaves the client.
    pub fn into_summary(self) -> IntegrationSummary {
        IntegrationSummary {
            config_id: self.id,
            store_url: self.store_url,
            api_version: self.api_version,
            is_active: self.is_active,
            updated_at: self.updated_at,
        }
    }
}

/// Body of `POST /shopify/config/{business_id}`.
#[derive(Clone, Serialize, Deserialize)]
pub struct SaveConfigRequest {
    pub store_url: String,
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
}

impl SaveConfigRequest {
    pub fn from_draft(draft: &ConfigDraft) -> Self {
        let api_version = draft.api_version.trim();
        Self {
            store_url: draft.normalized_store_url(),
            access_token: draft.access_token.expose_secret().trim().to_string(),
            api_version: (!api_version.is_empty()).then(|| api_version.to_string()),
        }
    }
}

impl fmt::Debug for SaveConfigRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = if self.access_token.is_empty() {
            "<unchanged>"
        } else {
            "[REDACTED]"
        };
        f.debug_struct("SaveConfigRequest")
            .field("store_url", &self.store_url)
            .field("access_token", &token)
            .field("api_version", &self.api_version)
            .finish()
    }
}
