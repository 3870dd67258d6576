//! Error modeling for faults raised while the form talks to the integration API.
//!
//! A `UiError` is only ever logged. The text shown to the user is a fixed
//! fallback chosen by the reducer, so internal details never reach the form.

use client_core::{ClientError, StatusCode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Auth,
    Transport,
    Validation,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    FetchStatus,
    SaveConfig,
    DeleteConfig,
    TestConnection,
}

impl UiErrorContext {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BackendStartup => "backend_startup",
            Self::FetchStatus => "fetch_status",
            Self::SaveConfig => "save_config",
            Self::DeleteConfig => "delete_config",
            Self::TestConnection => "test_connection",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_client_error(context: UiErrorContext, err: &ClientError) -> Self {
        let message = err.to_string();
        let category = match err.status() {
            Some(StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) => UiErrorCategory::Auth,
            Some(StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY) => {
                UiErrorCategory::Validation
            }
            _ if err.is_connectivity() => UiErrorCategory::Transport,
            _ => classify(&message),
        };
        Self {
            category,
            context,
            message,
        }
    }

    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            category: classify(&message),
            context,
            message,
        }
    }

    pub fn requires_reauth(&self) -> bool {
        self.category == UiErrorCategory::Auth
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

fn classify(message: &str) -> UiErrorCategory {
    let lower = message.to_ascii_lowercase();
    if lower.contains("401")
        || lower.contains("403")
        || lower.contains("unauthorized")
        || lower.contains("forbidden")
        || lower.contains("invalid token")
    {
        UiErrorCategory::Auth
    } else if lower.contains("invalid") || lower.contains("missing") || lower.contains("malformed")
    {
        UiErrorCategory::Validation
    } else if lower.contains("timeout")
        || lower.contains("timed out")
        || lower.contains("connection")
        || lower.contains("network")
        || lower.contains("dns")
        || lower.contains("unavailable")
        || lower.contains("request failed")
    {
        UiErrorCategory::Transport
    } else {
        UiErrorCategory::Unknown
    }
}
