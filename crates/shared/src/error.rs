use thiserror::Error;

/// Local validation failures raised before a draft is submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DraftError {
    #[error("Store URL is required")]
    MissingStoreUrl,
    #[error("Access token is required")]
    MissingAccessToken,
}
