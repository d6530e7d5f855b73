//! Repository implementations for JSON file storage

pub mod failure_ledger;
pub mod user;

pub use failure_ledger::JsonFailureLedgerRepository;
pub use user::JsonUserRepository;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use portcullis_core::{
    Error,
    error::StorageError,
    repositories::{
        FailureLedgerRepository, FailureLedgerRepositoryProvider, MemorySessionRepository,
        RepositoryProvider, SessionRepositoryProvider, UserRepository, UserRepositoryProvider,
    },
};

use crate::file::{ensure_parent, write_atomic};

/// Repository provider backed by two JSON files.
///
/// Users and the failure ledger live on disk; sessions are held in process
/// memory and do not survive a restart.
pub struct JsonRepositoryProvider {
    user: JsonUserRepository,
    failure_ledger: JsonFailureLedgerRepository,
    session: MemorySessionRepository,
}

impl JsonRepositoryProvider {
    pub fn new(users_path: impl Into<PathBuf>, ledger_path: impl Into<PathBuf>) -> Self {
        Self {
            user: JsonUserRepository::new(users_path),
            failure_ledger: JsonFailureLedgerRepository::new(ledger_path),
            session: MemorySessionRepository::new(),
        }
    }

    pub fn users_path(&self) -> &Path {
        self.user.path()
    }

    pub fn ledger_path(&self) -> &Path {
        self.failure_ledger.path()
    }
}

impl UserRepositoryProvider for JsonRepositoryProvider {
    type UserRepo = JsonUserRepository;

    fn user(&self) -> &Self::UserRepo {
        &self.user
    }
}

impl FailureLedgerRepositoryProvider for JsonRepositoryProvider {
    type FailureLedgerRepo = JsonFailureLedgerRepository;

    fn failure_ledger(&self) -> &Self::FailureLedgerRepo {
        &self.failure_ledger
    }
}

impl SessionRepositoryProvider for JsonRepositoryProvider {
    type SessionRepo = MemorySessionRepository;

    fn session(&self) -> &Self::SessionRepo {
        &self.session
    }
}

#[async_trait]
impl RepositoryProvider for JsonRepositoryProvider {
    /// Create an empty ledger file if none exists yet.
    async fn initialize(&self) -> Result<(), Error> {
        let path = self.ledger_path();
        let exists = tokio::fs::try_exists(path)
            .await
            .map_err(|e| StorageError::Unreadable(format!("{}: {e}", path.display())))?;
        if exists {
            return Ok(());
        }

        ensure_parent(path).await?;
        write_atomic(path, "{}").await?;
        tracing::info!(path = %path.display(), "Created empty failure ledger");
        Ok(())
    }

    async fn health_check(&self) -> Result<(), Error> {
        self.user.load_all().await?;
        self.failure_ledger.load().await?;
        Ok(())
    }
}
