//! Controller layer for the Shopify settings form: error modeling, pure state
//! transitions, deferred success callbacks and command orchestration.

pub mod events;
pub mod orchestration;
pub mod reducer;
pub mod scheduler;

pub use events::{UiError, UiErrorCategory, UiErrorContext};
pub use orchestration::{FormHooks, IntegrationFormController, DEFAULT_SUCCESS_DELAY};
pub use reducer::{reduce, DraftField, Effect, FormAction, FormPhase, FormState, Notice};
pub use scheduler::{Callback, ScheduledTask, SuccessScheduler};
