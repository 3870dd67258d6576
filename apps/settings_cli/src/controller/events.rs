//! Events sent from the backend worker to the terminal thread.

use form_controller::{FormState, UiError};

#[derive(Debug)]
pub enum UiEvent {
    Error(UiError),
    /// Emitted on every state transition.
    Rendered(FormState),
    /// Emitted once per command, after all of its effects have run.
    Settled(FormState),
    Succeeded,
    Cancelled,
}
