//! JSON file implementation of the failure ledger repository.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use portcullis_core::{
    Error, FailureLedger, FailureRecord, error::StorageError,
    repositories::FailureLedgerRepository,
};

use crate::file::{read_object, write_atomic};

/// Failure ledger stored as one pretty-printed JSON object.
pub struct JsonFailureLedgerRepository {
    path: PathBuf,
}

impl JsonFailureLedgerRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl FailureLedgerRepository for JsonFailureLedgerRepository {
    async fn load(&self) -> Result<FailureLedger, Error> {
        let Some(entries) = read_object(&self.path).await? else {
            return Ok(FailureLedger::new());
        };

        let mut ledger = FailureLedger::new();
        for (identifier, value) in entries {
            match serde_json::from_value::<FailureRecord>(value) {
                Ok(record) => {
                    ledger.insert(identifier, record);
                }
                Err(e) => {
                    tracing::warn!(
                        identifier = %identifier,
                        path = %self.path.display(),
                        error = %e,
                        "Dropping malformed failure record"
                    );
                }
            }
        }

        Ok(ledger)
    }

    async fn save(&self, ledger: &FailureLedger) -> Result<(), Error> {
        let contents = serde_json::to_string_pretty(ledger)
            .map_err(|e| StorageError::Write(e.to_string()))?;

        write_atomic(&self.path, &contents).await.inspect_err(|e| {
            tracing::error!(path = %self.path.display(), error = %e, "Failed to write failure ledger");
        })
    }
}
