//! # Portcullis
//!
//! Portcullis guards a session-based login flow against password guessing.
//! It verifies submitted credentials against a stored user mapping, counts
//! failed attempts per client identifier, locks an identifier out with an
//! exponentially growing delay, and gates protected operations on session
//! state.
//!
//! With the defaults, the third consecutive failure from one identifier locks
//! it for one minute, the fourth for two, the fifth for four, and so on. A
//! successful login clears the identifier. Sessions expire after fifteen
//! minutes without use.
//!
//! ## Storage Support
//!
//! - JSON files (`json` feature, enabled by default)
//! - In memory, via [`portcullis_core::repositories::MemoryRepositoryProvider`]
//! - Anything implementing [`RepositoryProvider`]
//!
//! ## Example
//!
//! ```rust,no_run
//! use portcullis::PortcullisBuilder;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let portcullis = PortcullisBuilder::new()
//!         .with_json_files("users.json", "login-failures.json")
//!         .initialize_storage(true)
//!         .build()
//!         .await?;
//!
//!     let sign_in = portcullis
//!         .sign_in("203.0.113.7", "admin", "admin123", None)
//!         .await?;
//!     if let Some(session) = sign_in.session {
//!         println!("signed in as {} ({})", session.user, session.role);
//!     }
//!
//!     Ok(())
//! }
//! ```
use std::sync::Arc;

use chrono::{DateTime, Utc};
use portcullis_core::{
    PasswordAuthVerifier, PasswordVerifier,
    repositories::{
        FailureLedgerRepositoryAdapter, SessionRepositoryAdapter, UserRepositoryAdapter,
    },
    services::{Authenticator, FailureLedgerService, SessionService, UserStore},
};

mod builder;
pub mod config;

pub use builder::{NoStorage, PortcullisBuilder, PortcullisBuilderError, WithStorage};
pub use config::PortcullisConfig;

/// Re-export core types from portcullis_core
///
/// These types are commonly used when working with the Portcullis API.
pub use portcullis_core::{
    AccessDenied, AccessPolicy, LockoutConfig, LockoutStatus, LoginOutcome, Session,
    SessionConfig, SessionToken, Surface, UserRecord, repositories::RepositoryProvider,
};

/// Re-export storage backends
///
/// These storage implementations are available when the corresponding feature is enabled.
#[cfg(feature = "json")]
pub use portcullis_storage_json::JsonRepositoryProvider;

/// Errors that can occur when using Portcullis.
///
/// Login itself never fails with an error: storage problems on that path are
/// absorbed and reported through [`LoginOutcome`]. These errors come from
/// session storage, access checks and operator calls.
#[derive(Debug, thiserror::Error)]
pub enum PortcullisError {
    /// Error when interacting with storage
    #[error("Storage error: {0}")]
    StorageError(String),
    /// Error issuing or looking up a session
    #[error("Session error: {0}")]
    SessionError(String),
    /// The session does not satisfy the access policy
    #[error(transparent)]
    AccessDenied(#[from] AccessDenied),
}

impl From<portcullis_core::Error> for PortcullisError {
    fn from(error: portcullis_core::Error) -> Self {
        match error {
            portcullis_core::Error::Storage(e) => PortcullisError::StorageError(e.to_string()),
            portcullis_core::Error::Session(e) => PortcullisError::SessionError(e.to_string()),
        }
    }
}

/// Result of [`Portcullis::sign_in`].
#[derive(Debug, Clone)]
pub struct SignIn {
    pub outcome: LoginOutcome,
    /// The freshly issued session, present only when authenticated.
    pub session: Option<Session>,
}

type Users<R> = UserRepositoryAdapter<R>;
type Ledger<R> = FailureLedgerRepositoryAdapter<R>;
type Sessions<R> = SessionRepositoryAdapter<R>;

/// The main coordinator that wires storage to the login, lockout and session services.
///
/// # Example
///
/// ```rust,no_run
/// use portcullis::Portcullis;
/// use portcullis_core::repositories::MemoryRepositoryProvider;
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() {
///     let portcullis = Portcullis::new(Arc::new(MemoryRepositoryProvider::new()));
///     let outcome = portcullis.login("127.0.0.1", "admin", "admin123").await;
///     println!("{outcome:?}");
/// }
/// ```
pub struct Portcullis<R: RepositoryProvider> {
    repositories: Arc<R>,
    users: Arc<UserStore<Users<R>>>,
    ledger: Arc<FailureLedgerService<Ledger<R>>>,
    authenticator: Arc<Authenticator<Users<R>, Ledger<R>>>,
    session_service: Arc<SessionService<Sessions<R>>>,
}

impl<R: RepositoryProvider> Portcullis<R> {
    /// Create a new Portcullis instance with default lockout and session settings
    pub fn new(repositories: Arc<R>) -> Self {
        Self::from_parts(
            repositories,
            LockoutConfig::default(),
            SessionConfig::default(),
            Arc::new(PasswordAuthVerifier::new()),
        )
    }

    pub(crate) fn from_parts(
        repositories: Arc<R>,
        lockout_config: LockoutConfig,
        session_config: SessionConfig,
        verifier: Arc<dyn PasswordVerifier>,
    ) -> Self {
        let users = Arc::new(UserStore::new(Arc::new(UserRepositoryAdapter::new(
            repositories.clone(),
        ))));
        let ledger = Arc::new(FailureLedgerService::new(
            Arc::new(FailureLedgerRepositoryAdapter::new(repositories.clone())),
            lockout_config,
        ));
        let authenticator = Arc::new(Authenticator::new(users.clone(), ledger.clone(), verifier));
        let session_service = Arc::new(SessionService::new(
            Arc::new(SessionRepositoryAdapter::new(repositories.clone())),
            session_config,
        ));

        Self {
            repositories,
            users,
            ledger,
            authenticator,
            session_service,
        }
    }

    pub fn repositories(&self) -> &Arc<R> {
        &self.repositories
    }

    pub fn lockout_config(&self) -> &LockoutConfig {
        self.ledger.config()
    }

    pub fn session_config(&self) -> &SessionConfig {
        self.session_service.config()
    }

    /// Prepare storage for first use
    pub async fn initialize(&self) -> Result<(), PortcullisError> {
        Ok(self.repositories.initialize().await?)
    }

    /// Health check for all repositories
    pub async fn health_check(&self) -> Result<(), PortcullisError> {
        Ok(self.repositories.health_check().await?)
    }

    /// Check credentials for `username` submitted from `identifier`
    ///
    /// This only decides and records the outcome; it does not issue a session.
    /// See [`Portcullis::sign_in`] for the full login flow.
    pub async fn login(&self, identifier: &str, username: &str, password: &str) -> LoginOutcome {
        self.authenticator.login(identifier, username, password).await
    }

    pub async fn login_at(
        &self,
        identifier: &str,
        username: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> LoginOutcome {
        self.authenticator
            .login_at(identifier, username, password, now)
            .await
    }

    /// Check credentials and, on success, replace the caller's session
    ///
    /// # Arguments
    ///
    /// * `identifier`: The client identifier failures are counted against
    /// * `username`, `password`: The submitted credentials
    /// * `previous`: The session token the client currently holds, if any
    ///
    /// # Returns
    ///
    /// The login outcome, and the new session when authenticated. A failed
    /// attempt leaves `previous` untouched.
    pub async fn sign_in(
        &self,
        identifier: &str,
        username: &str,
        password: &str,
        previous: Option<&SessionToken>,
    ) -> Result<SignIn, PortcullisError> {
        self.sign_in_at(identifier, username, password, previous, Utc::now())
            .await
    }

    pub async fn sign_in_at(
        &self,
        identifier: &str,
        username: &str,
        password: &str,
        previous: Option<&SessionToken>,
        now: DateTime<Utc>,
    ) -> Result<SignIn, PortcullisError> {
        let outcome = self.login_at(identifier, username, password, now).await;

        let LoginOutcome::Authenticated { username, role } = &outcome else {
            return Ok(SignIn {
                outcome,
                session: None,
            });
        };

        if let Some(previous) = previous {
            self.session_service.delete_session(previous).await?;
        }
        let session = self
            .session_service
            .create_session_at(username, role, now)
            .await?;

        Ok(SignIn {
            outcome,
            session: Some(session),
        })
    }

    /// End a session. Unknown tokens are ignored.
    pub async fn logout(&self, token: &SessionToken) -> Result<(), PortcullisError> {
        self.session_service.delete_session(token).await?;
        tracing::debug!("Session ended");
        Ok(())
    }

    /// Get the live session for a token, refreshing its idle timer
    pub async fn session(&self, token: &SessionToken) -> Result<Option<Session>, PortcullisError> {
        Ok(self.session_service.get_session(token).await?)
    }

    pub async fn session_at(
        &self,
        token: &SessionToken,
        now: DateTime<Utc>,
    ) -> Result<Option<Session>, PortcullisError> {
        Ok(self.session_service.get_session_at(token, now).await?)
    }

    /// Resolve `token` and check it against `policy` for a request to `path`
    ///
    /// # Returns
    ///
    /// The live session, or [`PortcullisError::AccessDenied`] describing how
    /// the caller should be turned away.
    pub async fn authorize(
        &self,
        token: Option<&SessionToken>,
        path: &str,
        policy: &AccessPolicy,
    ) -> Result<Session, PortcullisError> {
        let session = match token {
            Some(token) => self.session(token).await?,
            None => None,
        };

        let admitted = policy.check(session.as_ref(), Surface::from_path(path))?;
        Ok(admitted.clone())
    }

    /// Remove sessions that have been idle past their lifetime
    pub async fn cleanup_expired_sessions(&self) -> Result<u64, PortcullisError> {
        Ok(self.session_service.cleanup_expired_sessions().await?)
    }

    /// Get the current lockout state of an identifier
    pub async fn lockout_status(&self, identifier: &str) -> LockoutStatus {
        self.ledger.lockout_status(identifier).await
    }

    /// Clear an identifier's failures, returning whether it was locked
    pub async fn unlock(&self, identifier: &str) -> bool {
        self.ledger.unlock(identifier).await
    }

    /// Look up a user record
    pub async fn user(&self, username: &str) -> Option<UserRecord> {
        self.users.get(username).await
    }

    /// Number of users in the mapping that can authenticate
    pub async fn user_count(&self) -> usize {
        self.users.load_all().await.len()
    }
}
