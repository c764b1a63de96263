/// Failures surfaced by the content domain.
///
/// `NotFound` and `Forbidden` are classified eagerly at the entry point of
/// every public operation. Anything raised once projection has started is
/// `Internal` or `Storage` and aborts the whole request.
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("Not found.")]
    NotFound,

    #[error("Forbidden.")]
    Forbidden,

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl DomainError {
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}
