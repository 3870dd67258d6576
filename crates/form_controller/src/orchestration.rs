//! Runs reducer effects against the integration API.
//!
//! The controller is driven through `&mut self`, so at most one remote call is
//! in flight per form and completions are applied in request order.

use std::{collections::VecDeque, fmt, sync::Arc, time::Duration};

use client_core::{ClientError, IntegrationApi};
use shared::domain::BusinessId;
use tracing::{debug, warn};

use crate::{
    events::{UiError, UiErrorContext},
    reducer::{reduce, DraftField, Effect, FormAction, FormState},
    scheduler::{Callback, SuccessScheduler},
};

pub const DEFAULT_SUCCESS_DELAY: Duration = Duration::from_millis(1500);

pub type StateObserver = Arc<dyn Fn(&FormState) + Send + Sync>;

/// Collaborators supplied by the hosting context.
#[derive(Clone, Default)]
pub struct FormHooks {
    /// Invoked once per successful save or delete, after the success delay.
    pub on_success: Option<Callback>,
    /// Invoked synchronously when the user cancels the form.
    pub on_cancel: Option<Callback>,
    /// Invoked after every state transition, for rendering.
    pub on_change: Option<StateObserver>,
}

impl fmt::Debug for FormHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormHooks")
            .field("on_success", &self.on_success.is_some())
            .field("on_cancel", &self.on_cancel.is_some())
            .field("on_change", &self.on_change.is_some())
            .finish()
    }
}

pub struct IntegrationFormController {
    api: Arc<dyn IntegrationApi>,
    state: FormState,
    hooks: FormHooks,
    scheduler: SuccessScheduler,
}

impl IntegrationFormController {
    pub fn new(api: Arc<dyn IntegrationApi>, hooks: FormHooks) -> Self {
        Self {
            api,
            state: FormState::default(),
            hooks,
            scheduler: SuccessScheduler::new(DEFAULT_SUCCESS_DELAY),
        }
    }

    pub fn with_success_delay(mut self, delay: Duration) -> Self {
        self.scheduler = SuccessScheduler::new(delay);
        self
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn pending_callbacks(&self) -> usize {
        self.scheduler.pending()
    }

    /// Cancels success callbacks that have not fired yet.
    pub fn teardown(&mut self) {
        self.scheduler.cancel_all();
    }

    pub async fn mount(&mut self, business_id: BusinessId) {
        self.dispatch(FormAction::Mount(business_id)).await;
    }

    pub async fn edit(&mut self, field: DraftField, value: impl Into<String>) {
        self.dispatch(FormAction::Edit {
            field,
            value: value.into(),
        })
        .await;
    }

    pub async fn save(&mut self) {
        self.dispatch(FormAction::SubmitSave).await;
    }

    pub async fn test_connection(&mut self) {
        self.dispatch(FormAction::TestConnection).await;
    }

    pub async fn request_delete(&mut self) {
        self.dispatch(FormAction::RequestDelete).await;
    }

    pub async fn confirm_delete(&mut self) {
        self.dispatch(FormAction::ConfirmDelete).await;
    }

    pub async fn decline_delete(&mut self) {
        self.dispatch(FormAction::DeclineDelete).await;
    }

    pub async fn cancel(&mut self) {
        self.dispatch(FormAction::Cancel).await;
    }

    /// Applies an action and runs every effect it produces, including the
    /// follow-up effects of completions, before returning.
    pub async fn dispatch(&mut self, action: FormAction) {
        let mut queue: VecDeque<Effect> = self.apply(action).into();
        while let Some(effect) = queue.pop_front() {
            if let Some(completion) = self.run_effect(effect).await {
                queue.extend(self.apply(completion));
            }
        }
    }

    fn apply(&mut self, action: FormAction) -> Vec<Effect> {
        let effects = reduce(&mut self.state, action);
        if let Some(on_change) = &self.hooks.on_change {
            on_change(&self.state);
        }
        effects
    }

    async fn run_effect(&mut self, effect: Effect) -> Option<FormAction> {
        match effect {
            Effect::FetchStatus(business_id) => {
                let result = self
                    .api
                    .get_config(&business_id)
                    .await
                    .map_err(|err| log_fault(UiErrorContext::FetchStatus, &business_id, &err));
                Some(FormAction::StatusLoaded {
                    business_id,
                    result,
                })
            }
            Effect::SaveConfig { business_id, draft } => {
                let result = self
                    .api
                    .save_config(&business_id, &draft)
                    .await
                    .map_err(|err| log_fault(UiErrorContext::SaveConfig, &business_id, &err));
                Some(FormAction::SaveFinished {
                    business_id,
                    result,
                })
            }
            Effect::DeleteConfig(business_id) => {
                let result = self
                    .api
                    .delete_config(&business_id)
                    .await
                    .map_err(|err| log_fault(UiErrorContext::DeleteConfig, &business_id, &err));
                Some(FormAction::DeleteFinished {
                    business_id,
                    result,
                })
            }
            Effect::TestConnection(business_id) => {
                let result = self
                    .api
                    .test_connection(&business_id)
                    .await
                    .map_err(|err| log_fault(UiErrorContext::TestConnection, &business_id, &err));
                Some(FormAction::TestFinished {
                    business_id,
                    result,
                })
            }
            Effect::ScheduleSuccessCallback => {
                if let Some(on_success) = &self.hooks.on_success {
                    self.scheduler.schedule(Arc::clone(on_success));
                }
                None
            }
            Effect::NotifyCancel => {
                match &self.hooks.on_cancel {
                    Some(on_cancel) => on_cancel(),
                    None => debug!("form cancelled without a cancel hook"),
                }
                None
            }
        }
    }
}

fn log_fault(context: UiErrorContext, business_id: &BusinessId, err: &ClientError) -> UiError {
    let ui_error = UiError::from_client_error(context, err);
    warn!(
        business_id = %business_id,
        context = context.as_str(),
        category = ?ui_error.category(),
        error = %err,
        "integration request failed"
    );
    if ui_error.requires_reauth() {
        warn!(
            business_id = %business_id,
            "integration API refused the configured credentials"
        );
    }
    ui_error
}

#[cfg(test)]
#[path = "tests/orchestration_tests.rs"]
mod tests;
