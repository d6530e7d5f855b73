use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}

/// Failures raised by repositories.
///
/// Services absorb these: an unreadable user mapping or failure ledger is
/// treated as empty, and a failed ledger write is logged and dropped. They are
/// only surfaced by operator-facing calls such as health checks.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage unreadable: {0}")]
    Unreadable(String),

    #[error("Malformed data: {0}")]
    Malformed(String),

    #[error("Write failed: {0}")]
    Write(String),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Token generation failed: {0}")]
    TokenGeneration(String),
}

impl Error {
    pub fn is_storage_error(&self) -> bool {
        matches!(self, Error::Storage(_))
    }

    pub fn is_session_error(&self) -> bool {
        matches!(self, Error::Session(_))
    }
}
