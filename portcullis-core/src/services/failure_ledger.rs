//! Per-identifier failure tracking with exponential lockout.
//!
//! Each identifier (normally the client's remote address) accumulates a
//! failure count. Once the count reaches the configured threshold the
//! identifier is locked, and every further failure doubles the lock:
//!
//! | Failure | Lock (defaults) |
//! | ------- | --------------- |
//! | 1st, 2nd | none           |
//! | 3rd     | 1 minute        |
//! | 4th     | 2 minutes       |
//! | 5th     | 4 minutes       |
//!
//! A successful login resets the identifier entirely.
//!
//! # Example
//!
//! ```rust,ignore
//! use portcullis_core::{LockoutConfig, services::FailureLedgerService};
//!
//! let ledger = FailureLedgerService::new(repository, LockoutConfig::default());
//!
//! if ledger.is_locked("203.0.113.7").await {
//!     // refuse without checking the password
//! }
//!
//! let status = ledger.register_failure("203.0.113.7").await;
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::{
    LockoutConfig,
    ledger::{FailureLedger, LockoutStatus, lock_expiry},
    repositories::FailureLedgerRepository,
};

/// Service for tracking failed logins and computing lockout state.
///
/// Storage errors never reach the caller. An unreadable ledger counts as
/// empty and a failed write is logged and dropped, so a broken ledger degrades
/// to "nothing is locked" rather than "nobody can log in".
///
/// # Thread Safety
///
/// Mutations run load-modify-save under an async write gate, so concurrent
/// requests in one process never lose an increment. Separate processes sharing
/// one ledger still race, and the last write wins.
pub struct FailureLedgerService<R: FailureLedgerRepository> {
    repository: Arc<R>,
    config: LockoutConfig,
    write_gate: Mutex<()>,
}

impl<R: FailureLedgerRepository> FailureLedgerService<R> {
    pub fn new(repository: Arc<R>, config: LockoutConfig) -> Self {
        Self {
            repository,
            config,
            write_gate: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &LockoutConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub async fn is_locked(&self, identifier: &str) -> bool {
        self.is_locked_at(identifier, Utc::now()).await
    }

    pub async fn is_locked_at(&self, identifier: &str, now: DateTime<Utc>) -> bool {
        self.lockout_status_at(identifier, now).await.is_locked
    }

    /// Current lockout state of `identifier`.
    ///
    /// If protection is disabled, this always reports an unlocked identifier
    /// with no failures.
    pub async fn lockout_status(&self, identifier: &str) -> LockoutStatus {
        self.lockout_status_at(identifier, Utc::now()).await
    }

    pub async fn lockout_status_at(&self, identifier: &str, now: DateTime<Utc>) -> LockoutStatus {
        if !self.config.enabled {
            return LockoutStatus::unlocked(identifier, 0);
        }

        let ledger = self.load().await;
        self.status_from(&ledger, identifier, now)
    }

    /// Record one failed attempt and return the resulting status.
    ///
    /// If protection is disabled, this is a no-op that returns an unlocked
    /// status.
    pub async fn register_failure(&self, identifier: &str) -> LockoutStatus {
        self.register_failure_at(identifier, Utc::now()).await
    }

    pub async fn register_failure_at(&self, identifier: &str, now: DateTime<Utc>) -> LockoutStatus {
        if !self.config.enabled {
            return LockoutStatus::unlocked(identifier, 0);
        }

        let _gate = self.write_gate.lock().await;
        let mut ledger = self.load().await;

        let record = ledger.entry(identifier.to_string()).or_default();
        record.count = record.count.saturating_add(1);
        if record.count >= self.config.max_failed_attempts {
            let delay = self.config.backoff_for(record.count);
            record.locked_until = Some(lock_expiry(now, delay));
        }

        let status = self.status_from(&ledger, identifier, now);
        if status.is_locked {
            tracing::warn!(
                identifier = %identifier,
                failed_attempts = status.failed_attempts,
                locked_until = ?status.locked_until,
                "Identifier locked after repeated failed logins"
            );
        } else {
            tracing::debug!(
                identifier = %identifier,
                failed_attempts = status.failed_attempts,
                "Failed login recorded"
            );
        }

        self.save(&ledger).await;
        status
    }

    /// Forget every failure recorded for `identifier`.
    ///
    /// Called after a successful login. Storage is left untouched when there
    /// is nothing to remove.
    pub async fn reset(&self, identifier: &str) {
        self.remove(identifier).await;
    }

    /// Operator unlock. Clears the record and reports whether it was locked.
    pub async fn unlock(&self, identifier: &str) -> bool {
        let was_locked = self
            .remove(identifier)
            .await
            .is_some_and(|status| status.is_locked);

        if was_locked {
            tracing::info!(identifier = %identifier, "Identifier unlocked");
        }
        was_locked
    }

    async fn remove(&self, identifier: &str) -> Option<LockoutStatus> {
        let _gate = self.write_gate.lock().await;
        let mut ledger = self.load().await;

        if !ledger.contains_key(identifier) {
            return None;
        }
        let status = self.status_from(&ledger, identifier, Utc::now());
        ledger.remove(identifier);
        self.save(&ledger).await;
        Some(status)
    }

    fn status_from(
        &self,
        ledger: &FailureLedger,
        identifier: &str,
        now: DateTime<Utc>,
    ) -> LockoutStatus {
        let Some(record) = ledger.get(identifier) else {
            return LockoutStatus::unlocked(identifier, 0);
        };

        if !record.is_locked_at(self.config.max_failed_attempts, now) {
            return LockoutStatus::unlocked(identifier, record.count);
        }

        LockoutStatus {
            identifier: identifier.to_string(),
            failed_attempts: record.count,
            is_locked: true,
            locked_until: record.locked_until,
        }
    }

    async fn load(&self) -> FailureLedger {
        match self.repository.load().await {
            Ok(ledger) => ledger,
            Err(e) => {
                tracing::warn!(error = %e, "Failure ledger unreadable, treating as empty");
                FailureLedger::new()
            }
        }
    }

    async fn save(&self, ledger: &FailureLedger) {
        if let Err(e) = self.repository.save(ledger).await {
            tracing::error!(error = %e, "Failed to persist failure ledger");
        }
    }
}
