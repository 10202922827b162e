use thiserror::Error;

/// Failures reported by a [`StateStore`](crate::StateStore) or while encoding
/// state for it.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The host store refused or failed the operation.
    #[error("state store unavailable: {0}")]
    Backend(String),

    /// State could not be encoded for writing.
    #[error("could not encode state: {0}")]
    Serialization(String),

    /// Stored bytes do not decode to engine state.
    #[error("stored state unreadable: {0}")]
    Corruption(String),
}
