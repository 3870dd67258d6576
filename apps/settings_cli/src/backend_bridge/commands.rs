//! Form commands queued from the terminal thread to the backend worker.

use form_controller::DraftField;
use shared::domain::BusinessId;

#[derive(Debug)]
pub enum FormCommand {
    Mount { business_id: BusinessId },
    Edit { field: DraftField, value: String },
    Save,
    TestConnection,
    RequestDelete,
    ConfirmDelete,
    DeclineDelete,
    Cancel,
    Shutdown,
}

impl FormCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Mount { .. } => "mount",
            Self::Edit { .. } => "edit",
            Self::Save => "save",
            Self::TestConnection => "test_connection",
            Self::RequestDelete => "request_delete",
            Self::ConfirmDelete => "confirm_delete",
            Self::DeclineDelete => "decline_delete",
            Self::Cancel => "cancel",
            Self::Shutdown => "shutdown",
        }
    }
}
