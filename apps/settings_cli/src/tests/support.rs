use std::sync::Mutex;

use async_trait::async_trait;
use client_core::{IntegrationApi, RemoteOutcome};
use secrecy::ExposeSecret;
use shared::domain::{BusinessId, ConfigDraft, IntegrationSummary, DEFAULT_API_VERSION};

/// In-memory integration API that records every call it receives.
#[derive(Default)]
pub struct ScriptedApi {
    stored: Mutex<Option<IntegrationSummary>>,
    calls: Mutex<Vec<&'static str>>,
    saved_tokens: Mutex<Vec<String>>,
}

impl ScriptedApi {
    pub fn with_store(store_url: &str) -> Self {
        let api = Self::default();
        *api.stored.lock().expect("lock") = Some(IntegrationSummary {
            config_id: None,
            store_url: store_url.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            is_active: true,
            updated_at: None,
        });
        api
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().expect("lock").clone()
    }

    pub fn stored(&self) -> Option<IntegrationSummary> {
        self.stored.lock().expect("lock").clone()
    }

    pub fn saved_tokens(&self) -> Vec<String> {
        self.saved_tokens.lock().expect("lock").clone()
    }

    fn record(&self, operation: &'static str) {
        self.calls.lock().expect("lock").push(operation);
    }
}

#[async_trait]
impl IntegrationApi for ScriptedApi {
    async fn get_config(
        &self,
        _business_id: &BusinessId,
    ) -> client_core::Result<RemoteOutcome<Option<IntegrationSummary>>> {
        self.record("get_config");
        Ok(RemoteOutcome::Accepted {
            data: self.stored(),
            message: None,
        })
    }

    async fn save_config(
        &self,
        _business_id: &BusinessId,
        draft: &ConfigDraft,
    ) -> client_core::Result<RemoteOutcome<Option<IntegrationSummary>>> {
        self.record("save_config");
        self.saved_tokens
            .lock()
            .expect("lock")
            .push(draft.access_token.expose_secret().to_string());
        let summary = IntegrationSummary {
            config_id: None,
            store_url: draft.normalized_store_url(),
            api_version: draft.api_version.clone(),
            is_active: true,
            updated_at: None,
        };
        *self.stored.lock().expect("lock") = Some(summary.clone());
        Ok(RemoteOutcome::Accepted {
            data: Some(summary),
            message: None,
        })
    }

    async fn delete_config(
        &self,
        _business_id: &BusinessId,
    ) -> client_core::Result<RemoteOutcome<()>> {
        self.record("delete_config");
        *self.stored.lock().expect("lock") = None;
        Ok(RemoteOutcome::Accepted {
            data: (),
            message: None,
        })
    }

    async fn test_connection(
        &self,
        _business_id: &BusinessId,
    ) -> client_core::Result<RemoteOutcome<()>> {
        self.record("test_connection");
        Ok(RemoteOutcome::Accepted {
            data: (),
            message: None,
        })
    }
}
