use std::{
    collections::HashMap,
    fs, io,
    num::ParseIntError,
    path::{Path, PathBuf},
    time::Duration,
};

use secrecy::SecretString;
use shared::domain::BusinessId;
use thiserror::Error;
use url::Url;

pub const DEFAULT_CONFIG_FILE: &str = "shopify-settings.toml";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read config file '{}'", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config file '{}'", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("config key '{key}' must be a string or integer")]
    UnsupportedValue { key: String },
    #[error("invalid api base url '{value}'")]
    InvalidBaseUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },
    #[error("invalid success delay '{value}'")]
    InvalidDelay {
        value: String,
        #[source]
        source: ParseIntError,
    },
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub api_base_url: String,
    pub api_token: Option<SecretString>,
    pub business_id: Option<BusinessId>,
    pub success_delay: Duration,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8080".into(),
            api_token: None,
            business_id: None,
            success_delay: Duration::from_millis(1500),
            log_filter: "info".into(),
        }
    }
}

impl Settings {
    /// Applies one `key = value` pair, where keys match the TOML file and the
    /// lowercased suffix of the environment variables.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        match key {
            "api_base_url" => self.api_base_url = value.trim().to_string(),
            "api_token" => {
                let token = value.trim();
                self.api_token = if token.is_empty() {
                    None
                } else {
                    Some(SecretString::from(token.to_string()))
                };
            }
            "business_id" => {
                let id = value.trim();
                self.business_id = (!id.is_empty()).then(|| BusinessId::new(id));
            }
            "success_delay_ms" => {
                let millis = value
                    .trim()
                    .parse::<u64>()
                    .map_err(|source| SettingsError::InvalidDelay {
                        value: value.to_string(),
                        source,
                    })?;
                self.success_delay = Duration::from_millis(millis);
            }
            "log_filter" => self.log_filter = value.trim().to_string(),
            other => tracing::debug!(key = other, "ignoring unknown settings key"),
        }
        Ok(())
    }

    pub fn apply_file(&mut self, path: &Path, raw: &str) -> Result<(), SettingsError> {
        let file_cfg = toml::from_str::<HashMap<String, toml::Value>>(raw).map_err(|source| {
            SettingsError::Parse {
                path: path.to_path_buf(),
                source,
            }
        })?;
        for (key, value) in &file_cfg {
            let text = match value {
                toml::Value::String(text) => text.clone(),
                toml::Value::Integer(number) => number.to_string(),
                _ => return Err(SettingsError::UnsupportedValue { key: key.clone() }),
            };
            self.set(key, &text)?;
        }
        Ok(())
    }

    /// `SHOPIFY_SETTINGS_<KEY>` is read first, then `APP__<KEY>` wins.
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), SettingsError> {
        for key in KEYS {
            let upper = key.to_ascii_uppercase();
            for var in [format!("SHOPIFY_SETTINGS_{upper}"), format!("APP__{upper}")] {
                if let Some(value) = lookup(&var) {
                    self.set(key, &value)?;
                }
            }
        }
        Ok(())
    }

    /// Rejects a base URL that cannot be parsed before any client is built.
    pub fn validate(&self) -> Result<(), SettingsError> {
        Url::parse(&self.api_base_url).map_err(|source| SettingsError::InvalidBaseUrl {
            value: self.api_base_url.clone(),
            source,
        })?;
        Ok(())
    }
}

const KEYS: [&str; 5] = [
    "api_base_url",
    "api_token",
    "business_id",
    "success_delay_ms",
    "log_filter",
];

/// Defaults, then the config file, then the environment. An explicit path
/// must exist; the default file is optional.
pub fn load_settings(config_path: Option<&Path>) -> Result<Settings, SettingsError> {
    let mut settings = Settings::default();

    let (path, required) = match config_path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };
    match fs::read_to_string(&path) {
        Ok(raw) => settings.apply_file(&path, &raw)?,
        Err(err) if !required && err.kind() == io::ErrorKind::NotFound => {}
        Err(source) => return Err(SettingsError::Read { path, source }),
    }

    settings.apply_env(|var| std::env::var(var).ok())?;
    Ok(settings)
}

#[cfg(test)]
#[path = "tests/settings_tests.rs"]
mod tests;
