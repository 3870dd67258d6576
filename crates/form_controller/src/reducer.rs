//! Pure state transitions for the Shopify settings form.
//!
//! `reduce` never performs I/O. It mutates the form record and returns the
//! effects the caller must run; remote results come back as completion
//! actions tagged with the business they were issued for.

use client_core::RemoteOutcome;
use secrecy::SecretString;
use shared::domain::{BusinessId, ConfigDraft, IntegrationStatus, IntegrationSummary};

use crate::events::UiError;

pub const FETCH_STATUS_FAILED: &str = "Failed to fetch integration status";
pub const SAVE_FAILED: &str = "Failed to save configuration";
pub const DISCONNECT_FAILED: &str = "Failed to disconnect";
pub const CONNECTION_TEST_FAILED: &str = "Connection test failed";
pub const UNEXPECTED_ERROR: &str = "An unexpected error occurred";
pub const SAVE_SUCCEEDED: &str = "Shopify configuration saved successfully";
pub const DISCONNECT_SUCCEEDED: &str = "Shopify store disconnected successfully";
pub const CONNECTION_TEST_SUCCEEDED: &str = "Connection successful";

/// Result of one remote call as seen by the reducer.
pub type Completion<T> = Result<RemoteOutcome<T>, UiError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftField {
    StoreUrl,
    AccessToken,
    ApiVersion,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Error(String),
    Success(String),
}

impl Notice {
    pub fn text(&self) -> &str {
        match self {
            Self::Error(text) | Self::Success(text) => text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormPhase {
    Idle,
    Loading,
    Saving,
    Deleting,
}

#[derive(Debug)]
pub enum FormAction {
    Mount(BusinessId),
    Edit {
        field: DraftField,
        value: String,
    },
    SubmitSave,
    TestConnection,
    RequestDelete,
    ConfirmDelete,
    DeclineDelete,
    Cancel,
    StatusLoaded {
        business_id: BusinessId,
        result: Completion<Option<IntegrationSummary>>,
    },
    SaveFinished {
        business_id: BusinessId,
        result: Completion<Option<IntegrationSummary>>,
    },
    TestFinished {
        business_id: BusinessId,
        result: Completion<()>,
    },
    DeleteFinished {
        business_id: BusinessId,
        result: Completion<()>,
    },
}

#[derive(Debug, Clone)]
pub enum Effect {
    FetchStatus(BusinessId),
    SaveConfig {
        business_id: BusinessId,
        draft: ConfigDraft,
    },
    DeleteConfig(BusinessId),
    TestConnection(BusinessId),
    ScheduleSuccessCallback,
    NotifyCancel,
}

#[derive(Debug, Clone, Default)]
pub struct FormState {
    pub business_id: Option<BusinessId>,
    pub status: IntegrationStatus,
    pub draft: ConfigDraft,
    pub loading: bool,
    pub saving: bool,
    pub deleting: bool,
    pub notice: Option<Notice>,
    pub confirming_delete: bool,
}

impl FormState {
    pub fn phase(&self) -> FormPhase {
        if self.deleting {
            FormPhase::Deleting
        } else if self.saving {
            FormPhase::Saving
        } else if self.loading {
            FormPhase::Loading
        } else {
            FormPhase::Idle
        }
    }

    pub fn is_busy(&self) -> bool {
        self.phase() != FormPhase::Idle
    }

    pub fn is_integrated(&self) -> bool {
        self.status.is_integrated()
    }

    /// Masked token for display; `None` when nothing is stored.
    pub fn token_display(&self) -> Option<&'static str> {
        self.status.summary().map(IntegrationSummary::token_display)
    }

    pub fn error(&self) -> Option<&str> {
        match &self.notice {
            Some(Notice::Error(text)) => Some(text),
            _ => None,
        }
    }

    pub fn success(&self) -> Option<&str> {
        match &self.notice {
            Some(Notice::Success(text)) => Some(text),
            _ => None,
        }
    }

    fn can_edit(&self) -> bool {
        !self.saving && !self.deleting
    }

    fn is_current(&self, business_id: &BusinessId) -> bool {
        self.business_id.as_ref() == Some(business_id)
    }

    fn clear_stale_error(&mut self) {
        if matches!(self.notice, Some(Notice::Error(_))) {
            self.notice = None;
        }
    }
}

fn server_text(text: Option<String>, fallback: &str) -> String {
    text.filter(|text| !text.trim().is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

pub fn reduce(state: &mut FormState, action: FormAction) -> Vec<Effect> {
    match action {
        FormAction::Mount(business_id) => {
            if !state.is_current(&business_id) {
                state.status = IntegrationStatus::NotIntegrated;
                state.notice = None;
                state.saving = false;
                state.deleting = false;
                state.confirming_delete = false;
            }
            state.business_id = Some(business_id.clone());
            state.draft = ConfigDraft::default();
            state.loading = true;
            vec![Effect::FetchStatus(business_id)]
        }
        FormAction::Edit { field, value } => {
            if state.can_edit() {
                match field {
                    DraftField::StoreUrl => state.draft.store_url = value,
                    DraftField::AccessToken => state.draft.access_token = SecretString::from(value),
                    DraftField::ApiVersion => state.draft.api_version = value,
                }
            }
            Vec::new()
        }
        FormAction::SubmitSave => {
            if !state.can_edit() {
                return Vec::new();
            }
            let Some(business_id) = state.business_id.clone() else {
                return Vec::new();
            };
            state.notice = None;
            if let Err(err) = state.draft.validate(state.is_integrated()) {
                state.notice = Some(Notice::Error(err.to_string()));
                return Vec::new();
            }
            state.saving = true;
            state.confirming_delete = false;
            vec![Effect::SaveConfig {
                business_id,
                draft: state.draft.clone(),
            }]
        }
        FormAction::TestConnection => {
            if state.loading || !state.is_integrated() {
                return Vec::new();
            }
            let Some(business_id) = state.business_id.clone() else {
                return Vec::new();
            };
            state.loading = true;
            state.notice = None;
            vec![Effect::TestConnection(business_id)]
        }
        FormAction::RequestDelete => {
            if state.can_edit() && state.is_integrated() {
                state.confirming_delete = true;
            }
            Vec::new()
        }
        FormAction::DeclineDelete => {
            state.confirming_delete = false;
            Vec::new()
        }
        FormAction::ConfirmDelete => {
            if !state.confirming_delete || !state.can_edit() {
                return Vec::new();
            }
            state.confirming_delete = false;
            let Some(business_id) = state.business_id.clone() else {
                return Vec::new();
            };
            state.deleting = true;
            state.notice = None;
            vec![Effect::DeleteConfig(business_id)]
        }
        FormAction::Cancel => vec![Effect::NotifyCancel],
        FormAction::StatusLoaded {
            business_id,
            result,
        } => {
            if !state.is_current(&business_id) {
                return Vec::new();
            }
            state.loading = false;
            match result {
                Ok(RemoteOutcome::Accepted {
                    data: Some(summary),
                    ..
                }) => {
                    state.draft = ConfigDraft::from_summary(&summary);
                    state.status = IntegrationStatus::Integrated(summary);
                    state.clear_stale_error();
                }
                Ok(RemoteOutcome::Accepted { data: None, .. } | RemoteOutcome::Rejected { .. }) => {
                    state.status = IntegrationStatus::NotIntegrated;
                    state.confirming_delete = false;
                    state.clear_stale_error();
                }
                Err(_) => {
                    state.status = IntegrationStatus::NotIntegrated;
                    state.confirming_delete = false;
                    state.notice = Some(Notice::Error(FETCH_STATUS_FAILED.to_string()));
                }
            }
            Vec::new()
        }
        FormAction::SaveFinished {
            business_id,
            result,
        } => {
            if !state.is_current(&business_id) {
                return Vec::new();
            }
            state.saving = false;
            match result {
                Ok(RemoteOutcome::Accepted { .. }) => {
                    state.notice = Some(Notice::Success(SAVE_SUCCEEDED.to_string()));
                    state.draft.clear_token();
                    state.loading = true;
                    vec![
                        Effect::ScheduleSuccessCallback,
                        Effect::FetchStatus(business_id),
                    ]
                }
                Ok(RemoteOutcome::Rejected { error }) => {
                    state.notice = Some(Notice::Error(server_text(error, SAVE_FAILED)));
                    Vec::new()
                }
                Err(_) => {
                    state.notice = Some(Notice::Error(UNEXPECTED_ERROR.to_string()));
                    Vec::new()
                }
            }
        }
        FormAction::TestFinished {
            business_id,
            result,
        } => {
            if !state.is_current(&business_id) {
                return Vec::new();
            }
            state.loading = false;
            state.notice = Some(match result {
                Ok(RemoteOutcome::Accepted { message, .. }) => {
                    Notice::Success(server_text(message, CONNECTION_TEST_SUCCEEDED))
                }
                Ok(RemoteOutcome::Rejected { error }) => {
                    Notice::Error(server_text(error, CONNECTION_TEST_FAILED))
                }
                Err(_) => Notice::Error(CONNECTION_TEST_FAILED.to_string()),
            });
            Vec::new()
        }
        FormAction::DeleteFinished {
            business_id,
            result,
        } => {
            if !state.is_current(&business_id) {
                return Vec::new();
            }
            state.deleting = false;
            match result {
                Ok(RemoteOutcome::Accepted { .. }) => {
                    state.status = IntegrationStatus::NotIntegrated;
                    state.draft = ConfigDraft::default();
                    state.notice = Some(Notice::Success(DISCONNECT_SUCCEEDED.to_string()));
                    vec![Effect::ScheduleSuccessCallback]
                }
                Ok(RemoteOutcome::Rejected { error }) => {
                    state.notice = Some(Notice::Error(server_text(error, DISCONNECT_FAILED)));
                    Vec::new()
                }
                Err(_) => {
                    state.notice = Some(Notice::Error(UNEXPECTED_ERROR.to_string()));
                    Vec::new()
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/reducer_tests.rs"]
mod tests;
