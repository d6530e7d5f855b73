//! Builder pattern for constructing Portcullis instances
//!
//! This module provides a type-safe builder for creating [`Portcullis`] instances with
//! compile-time validation of storage configuration.
//!
//! # Example
//!
//! ```rust,no_run
//! use portcullis::PortcullisBuilder;
//! use chrono::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Build with JSON files and create the ledger if missing
//!     let portcullis = PortcullisBuilder::new()
//!         .with_json_files("users.json", "login-failures.json")
//!         .with_session_idle_lifetime(Duration::minutes(30))
//!         .initialize_storage(true)
//!         .build()
//!         .await?;
//!
//!     // Or build without initialisation and run it manually
//!     let portcullis = PortcullisBuilder::new()
//!         .with_json_files("users.json", "login-failures.json")
//!         .build()
//!         .await?;
//!     portcullis.initialize().await?;
//!
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use chrono::Duration;
use portcullis_core::{
    LockoutConfig, PasswordAuthVerifier, PasswordVerifier, SessionConfig,
    repositories::RepositoryProvider,
};

use crate::Portcullis;

#[cfg(feature = "json")]
use crate::PortcullisConfig;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur when building a Portcullis instance.
#[derive(Debug, thiserror::Error)]
pub enum PortcullisBuilderError {
    /// Failed to prepare the storage backend
    #[error("Storage initialization failed: {0}")]
    StorageInitialization(String),

    /// Invalid configuration provided
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

// ============================================================================
// Type-State Markers
// ============================================================================

/// Marker type indicating no storage has been configured yet.
///
/// This is the initial state of [`PortcullisBuilder`].
pub struct NoStorage;

/// Marker type indicating storage has been configured.
///
/// Contains the repository provider that will be used by Portcullis.
pub struct WithStorage<R: RepositoryProvider> {
    repositories: Arc<R>,
}

// ============================================================================
// Builder Implementation
// ============================================================================

/// A type-safe builder for constructing [`Portcullis`] instances.
///
/// # Type States
///
/// - [`NoStorage`]: Initial state, storage must be configured
/// - [`WithStorage<R>`]: Storage configured, ready to build or add more configuration
pub struct PortcullisBuilder<Storage> {
    storage: Storage,
    lockout_config: LockoutConfig,
    session_config: SessionConfig,
    verifier: Option<Arc<dyn PasswordVerifier>>,
    initialize_storage: bool,
}

impl Default for PortcullisBuilder<NoStorage> {
    fn default() -> Self {
        Self::new()
    }
}

impl PortcullisBuilder<NoStorage> {
    /// Create a new builder with default configuration.
    ///
    /// # Defaults
    ///
    /// - Lockout: enabled, 3 failures, 1 minute doubling per further failure
    /// - Session idle lifetime: 15 minutes
    /// - Password verifier: [`PasswordAuthVerifier`]
    /// - Initialize storage: false
    pub fn new() -> Self {
        Self {
            storage: NoStorage,
            lockout_config: LockoutConfig::default(),
            session_config: SessionConfig::default(),
            verifier: None,
            initialize_storage: false,
        }
    }

    /// Use an existing repository provider.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use portcullis::PortcullisBuilder;
    /// use portcullis_core::repositories::MemoryRepositoryProvider;
    /// use std::sync::Arc;
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let portcullis = PortcullisBuilder::new()
    ///     .with_repositories(Arc::new(MemoryRepositoryProvider::new()))
    ///     .build()
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_repositories<R: RepositoryProvider>(
        self,
        repositories: Arc<R>,
    ) -> PortcullisBuilder<WithStorage<R>> {
        PortcullisBuilder {
            storage: WithStorage { repositories },
            lockout_config: self.lockout_config,
            session_config: self.session_config,
            verifier: self.verifier,
            initialize_storage: self.initialize_storage,
        }
    }
}

#[cfg(feature = "json")]
impl PortcullisBuilder<NoStorage> {
    /// Configure JSON file storage.
    ///
    /// # Arguments
    ///
    /// * `users_path` - The user mapping file; it is only ever read
    /// * `ledger_path` - The failure ledger file; rewritten after every change
    pub fn with_json_files(
        self,
        users_path: impl Into<std::path::PathBuf>,
        ledger_path: impl Into<std::path::PathBuf>,
    ) -> PortcullisBuilder<WithStorage<crate::JsonRepositoryProvider>> {
        self.with_repositories(Arc::new(crate::JsonRepositoryProvider::new(
            users_path,
            ledger_path,
        )))
    }

    /// Configure JSON file storage, lockout and sessions from a [`PortcullisConfig`].
    pub fn from_config(
        config: &PortcullisConfig,
    ) -> PortcullisBuilder<WithStorage<crate::JsonRepositoryProvider>> {
        Self::new()
            .with_json_files(&config.users_file, &config.ledger_file)
            .with_lockout_config(config.lockout_config())
            .with_session_config(config.session_config())
    }
}

// ============================================================================
// Configuration Methods (available after storage is configured)
// ============================================================================

impl<R: RepositoryProvider> PortcullisBuilder<WithStorage<R>> {
    /// Configure lockout behaviour.
    ///
    /// Default: enabled, 3 failures before the first one-minute lock
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use portcullis::{LockoutConfig, PortcullisBuilder};
    /// use chrono::Duration;
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let portcullis = PortcullisBuilder::new()
    ///     .with_json_files("users.json", "login-failures.json")
    ///     .with_lockout_config(
    ///         LockoutConfig::default()
    ///             .with_max_failed_attempts(5)
    ///             .with_base_backoff(Duration::seconds(30)),
    ///     )
    ///     .build()
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_lockout_config(mut self, config: LockoutConfig) -> Self {
        self.lockout_config = config;
        self
    }

    pub fn with_session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Set how long a session may sit unused before it expires.
    ///
    /// Default: 15 minutes
    pub fn with_session_idle_lifetime(mut self, idle_lifetime: Duration) -> Self {
        self.session_config.idle_lifetime = idle_lifetime;
        self
    }

    /// Replace the password verifier.
    ///
    /// Default: [`PasswordAuthVerifier`], which accepts PHC-format hashes
    pub fn with_verifier(mut self, verifier: impl PasswordVerifier) -> Self {
        self.verifier = Some(Arc::new(verifier));
        self
    }

    /// Set whether to prepare storage (e.g. create an empty ledger) during build.
    ///
    /// Default: false
    pub fn initialize_storage(mut self, initialize: bool) -> Self {
        self.initialize_storage = initialize;
        self
    }

    /// Build the Portcullis instance.
    ///
    /// # Returns
    ///
    /// Returns the configured Portcullis instance, or an error if the
    /// configuration is invalid or storage initialisation fails.
    pub async fn build(self) -> Result<Portcullis<R>, PortcullisBuilderError> {
        self.validate()?;

        if self.initialize_storage {
            self.storage
                .repositories
                .initialize()
                .await
                .map_err(|e| PortcullisBuilderError::StorageInitialization(e.to_string()))?;
        }

        let verifier: Arc<dyn PasswordVerifier> = match self.verifier {
            Some(verifier) => verifier,
            None => Arc::new(PasswordAuthVerifier::new()),
        };

        Ok(Portcullis::from_parts(
            self.storage.repositories,
            self.lockout_config,
            self.session_config,
            verifier,
        ))
    }

    fn validate(&self) -> Result<(), PortcullisBuilderError> {
        if self.lockout_config.max_failed_attempts == 0 {
            return Err(PortcullisBuilderError::InvalidConfiguration(
                "max_failed_attempts must be at least 1".to_string(),
            ));
        }
        if self.lockout_config.base_backoff <= Duration::zero() {
            return Err(PortcullisBuilderError::InvalidConfiguration(
                "base_backoff must be positive".to_string(),
            ));
        }
        if self.session_config.idle_lifetime <= Duration::zero() {
            return Err(PortcullisBuilderError::InvalidConfiguration(
                "session idle lifetime must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
