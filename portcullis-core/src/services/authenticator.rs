//! Credential checking against the user mapping and the failure ledger.
//!
//! A login attempt ends in exactly one of three outcomes:
//!
//! - [`LoginOutcome::Locked`]: the identifier is locked. Nothing is verified
//!   and nothing is recorded.
//! - [`LoginOutcome::Invalid`]: unknown user or wrong password. One failure is
//!   recorded against the identifier. The two causes are not distinguished.
//! - [`LoginOutcome::Authenticated`]: the identifier's failures are cleared
//!   and the caller may establish a session.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    password::PasswordVerifier,
    repositories::{FailureLedgerRepository, UserRepository},
    services::{FailureLedgerService, UserStore},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LoginOutcome {
    Locked { locked_until: DateTime<Utc> },
    Invalid,
    Authenticated { username: String, role: String },
}

impl LoginOutcome {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, LoginOutcome::Authenticated { .. })
    }

    /// Seconds until a locked identifier may try again.
    pub fn retry_after_seconds_at(&self, now: DateTime<Utc>) -> Option<i64> {
        match self {
            LoginOutcome::Locked { locked_until } => {
                Some((*locked_until - now).num_seconds().max(0))
            }
            _ => None,
        }
    }
}

pub struct Authenticator<U: UserRepository, L: FailureLedgerRepository> {
    users: Arc<UserStore<U>>,
    ledger: Arc<FailureLedgerService<L>>,
    verifier: Arc<dyn PasswordVerifier>,
}

impl<U: UserRepository, L: FailureLedgerRepository> Authenticator<U, L> {
    pub fn new(
        users: Arc<UserStore<U>>,
        ledger: Arc<FailureLedgerService<L>>,
        verifier: Arc<dyn PasswordVerifier>,
    ) -> Self {
        Self {
            users,
            ledger,
            verifier,
        }
    }

    pub async fn login(&self, identifier: &str, username: &str, password: &str) -> LoginOutcome {
        self.login_at(identifier, username, password, Utc::now())
            .await
    }

    /// Attempt a login as of `now`.
    ///
    /// Surrounding whitespace is stripped from `username` only; the password
    /// is compared exactly as given.
    pub async fn login_at(
        &self,
        identifier: &str,
        username: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> LoginOutcome {
        let username = username.trim();

        let status = self.ledger.lockout_status_at(identifier, now).await;
        if let Some(locked_until) = status.locked_until.filter(|_| status.is_locked) {
            tracing::info!(
                identifier = %identifier,
                %locked_until,
                "Login refused for locked identifier"
            );
            return LoginOutcome::Locked { locked_until };
        }

        let user = self.users.get(username).await;
        let verified = match &user {
            Some(record) => self.verifier.verify(password, &record.password_hash),
            None => {
                // Unknown users still pay for one verification.
                if let Some(decoy) = self.verifier.decoy_hash() {
                    self.verifier.verify(password, decoy);
                }
                false
            }
        };

        match user {
            Some(record) if verified => {
                self.ledger.reset(identifier).await;
                tracing::info!(
                    identifier = %identifier,
                    username = %record.username,
                    role = %record.role,
                    "Login succeeded"
                );
                LoginOutcome::Authenticated {
                    username: record.username,
                    role: record.role,
                }
            }
            _ => {
                self.ledger.register_failure_at(identifier, now).await;
                tracing::info!(identifier = %identifier, "Login failed");
                LoginOutcome::Invalid
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        LockoutConfig,
        repositories::{MemoryFailureLedgerRepository, MemoryUserRepository},
        user::StoredUser,
    };
    use chrono::Duration;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Treats a stored hash of `plain:<pw>` as matching `<pw>`.
    #[derive(Default)]
    struct PlainVerifier {
        calls: AtomicUsize,
    }

    impl PasswordVerifier for PlainVerifier {
        fn verify(&self, password: &str, stored_hash: &str) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            stored_hash.strip_prefix("plain:") == Some(password)
        }

        fn decoy_hash(&self) -> Option<&str> {
            Some("decoy:")
        }
    }

    struct Harness {
        authenticator: Authenticator<MemoryUserRepository, MemoryFailureLedgerRepository>,
        ledger: Arc<FailureLedgerService<MemoryFailureLedgerRepository>>,
        verifier: Arc<PlainVerifier>,
    }

    fn harness() -> Harness {
        let users = Arc::new(UserStore::new(Arc::new(MemoryUserRepository::with_users([
            (
                "admin",
                StoredUser::Record {
                    password_hash: "plain:admin123".to_string(),
                    role: "admin".to_string(),
                },
            ),
            ("olduser", StoredUser::Legacy("plain:hunter2".to_string())),
        ]))));
        let ledger = Arc::new(FailureLedgerService::new(
            Arc::new(MemoryFailureLedgerRepository::new()),
            LockoutConfig::default(),
        ));
        let verifier = Arc::new(PlainVerifier::default());

        Harness {
            authenticator: Authenticator::new(users, ledger.clone(), verifier.clone()),
            ledger,
            verifier,
        }
    }

    #[tokio::test]
    async fn test_success_returns_user_and_role() {
        let h = harness();
        let outcome = h.authenticator.login("10.0.0.1", "admin", "admin123").await;

        assert_eq!(
            outcome,
            LoginOutcome::Authenticated {
                username: "admin".to_string(),
                role: "admin".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_username_is_trimmed_but_password_is_not() {
        let h = harness();

        let outcome = h
            .authenticator
            .login("10.0.0.1", "  admin\t", "admin123")
            .await;
        assert!(outcome.is_authenticated());

        let outcome = h
            .authenticator
            .login("10.0.0.1", "admin", " admin123 ")
            .await;
        assert_eq!(outcome, LoginOutcome::Invalid);
    }

    #[tokio::test]
    async fn test_legacy_record_authenticates_as_viewer() {
        let h = harness();
        let outcome = h.authenticator.login("10.0.0.1", "olduser", "hunter2").await;

        assert_eq!(
            outcome,
            LoginOutcome::Authenticated {
                username: "olduser".to_string(),
                role: "viewer".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_unknown_user_and_wrong_password_look_the_same() {
        let h = harness();

        let unknown = h.authenticator.login("10.0.0.1", "mallory", "x").await;
        let wrong = h.authenticator.login("10.0.0.2", "admin", "x").await;

        assert_eq!(unknown, LoginOutcome::Invalid);
        assert_eq!(wrong, LoginOutcome::Invalid);
        assert_eq!(h.ledger.lockout_status("10.0.0.1").await.failed_attempts, 1);
        assert_eq!(h.ledger.lockout_status("10.0.0.2").await.failed_attempts, 1);
        assert_eq!(h.verifier.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_success_resets_failures() {
        let h = harness();

        for _ in 0..2 {
            h.authenticator.login("10.0.0.1", "admin", "nope").await;
        }
        assert_eq!(h.ledger.lockout_status("10.0.0.1").await.failed_attempts, 2);

        let outcome = h.authenticator.login("10.0.0.1", "admin", "admin123").await;
        assert!(outcome.is_authenticated());
        assert_eq!(h.ledger.lockout_status("10.0.0.1").await.failed_attempts, 0);
    }

    #[tokio::test]
    async fn test_locked_identifier_is_refused_without_verification() {
        let h = harness();
        let now = Utc::now();

        for _ in 0..3 {
            h.authenticator
                .login_at("10.0.0.1", "admin", "nope", now)
                .await;
        }
        let calls_before = h.verifier.calls.load(Ordering::SeqCst);

        let outcome = h
            .authenticator
            .login_at("10.0.0.1", "admin", "admin123", now)
            .await;

        assert_eq!(
            outcome,
            LoginOutcome::Locked {
                locked_until: now + Duration::minutes(1),
            }
        );
        assert_eq!(outcome.retry_after_seconds_at(now), Some(60));
        assert_eq!(h.verifier.calls.load(Ordering::SeqCst), calls_before);
        assert_eq!(h.ledger.lockout_status_at("10.0.0.1", now).await.failed_attempts, 3);
    }

    #[tokio::test]
    async fn test_lock_expiry_allows_login_again() {
        let h = harness();
        let now = Utc::now();

        for _ in 0..3 {
            h.authenticator
                .login_at("10.0.0.1", "admin", "nope", now)
                .await;
        }

        let later = now + Duration::minutes(1) + Duration::seconds(1);
        let outcome = h
            .authenticator
            .login_at("10.0.0.1", "admin", "admin123", later)
            .await;

        assert!(outcome.is_authenticated());
        assert_eq!(h.ledger.lockout_status_at("10.0.0.1", later).await.failed_attempts, 0);
    }

    #[tokio::test]
    async fn test_lock_is_per_identifier() {
        let h = harness();

        for _ in 0..3 {
            h.authenticator.login("10.0.0.1", "admin", "nope").await;
        }

        let outcome = h.authenticator.login("10.0.0.2", "admin", "admin123").await;
        assert!(outcome.is_authenticated());
    }
}
