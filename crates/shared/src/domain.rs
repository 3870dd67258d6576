use std::fmt;

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::DraftError;

/// API version offered to the user when none has been saved.
pub const DEFAULT_API_VERSION: &str = "2024-01";

/// Fixed display value for a token that is stored server-side.
pub const TOKEN_MASK: &str = "\u{2022}\u{2022}\u{2022}\u{2022}\u{2022}\u{2022}\u{2022}\u{2022}\u{2022}\u{2022}\u{2022}\u{2022}\u{2022}\u{2022}\u{2022}\u{2022}";

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                Ok(match RawId::deserialize(deserializer)? {
                    RawId::Text(text) => Self(text),
                    RawId::Number(number) => Self(number.to_string()),
                })
            }
        }
    };
}

id_newtype!(BusinessId);
id_newtype!(ConfigId);

/// What the form knows about the persisted integration. The access token is
/// deliberately absent: once saved it only ever shows up as [`TOKEN_MASK`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrationSummary {
    pub config_id: Option<ConfigId>,
    pub store_url: String,
    pub api_version: String,
    pub is_active: bool,
    pub updated_at: Option<DateTime<Utc>>,
}

impl IntegrationSummary {
    pub fn token_display(&self) -> &'static str {
        TOKEN_MASK
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum IntegrationStatus {
    #[default]
    NotIntegrated,
    Integrated(IntegrationSummary),
}

impl IntegrationStatus {
    pub fn is_integrated(&self) -> bool {
        matches!(self, Self::Integrated(_))
    }

    pub fn summary(&self) -> Option<&IntegrationSummary> {
        match self {
            Self::Integrated(summary) => Some(summary),
            Self::NotIntegrated => None,
        }
    }
}

/// Editable copy of the three form fields.
#[derive(Debug, Clone)]
pub struct ConfigDraft {
    pub store_url: String,
    pub access_token: SecretString,
    pub api_version: String,
}

impl Default for ConfigDraft {
    fn default() -> Self {
        Self {
            store_url: String::new(),
            access_token: blank_token(),
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }
}

impl ConfigDraft {
    /// Draft mirroring a persisted integration, with the token left blank.
    pub fn from_summary(summary: &IntegrationSummary) -> Self {
        let api_version = if summary.api_version.trim().is_empty() {
            DEFAULT_API_VERSION.to_string()
        } else {
            summary.api_version.clone()
        };
        Self {
            store_url: summary.store_url.clone(),
            access_token: blank_token(),
            api_version,
        }
    }

    pub fn has_token(&self) -> bool {
        !self.access_token.expose_secret().trim().is_empty()
    }

    pub fn clear_token(&mut self) {
        self.access_token = blank_token();
    }

    /// Store host without scheme or trailing slash.
    pub fn normalized_store_url(&self) -> String {
        let trimmed = self.store_url.trim();
        let without_scheme = trimmed
            .strip_prefix("https://")
            .or_else(|| trimmed.strip_prefix("http://"))
            .unwrap_or(trimmed);
        without_scheme.trim_end_matches('/').to_string()
    }

    /// A blank token is only acceptable when a token is already on file.
    pub fn validate(&self, is_integrated: bool) -> Result<(), DraftError> {
        if self.normalized_store_url().is_empty() {
            return Err(DraftError::MissingStoreUrl);
        }
        if !is_integrated && !self.has_token() {
            return Err(DraftError::MissingAccessToken);
        }
        Ok(())
    }
}

fn blank_token() -> SecretString {
    SecretString::from(String::new())
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
