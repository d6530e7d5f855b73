//! Repository traits for data access layer
//!
//! Services reach storage only through these traits, so the core can run
//! against files, an in-memory map in tests, or any other keyed store.
//!
//! # Trait Hierarchy
//!
//! - Individual `*Repository` traits define the operations for each data domain
//! - Individual `*RepositoryProvider` traits provide access to each repository type
//! - [`RepositoryProvider`] combines all provider traits plus lifecycle methods

pub mod adapter;
pub mod failure_ledger;
pub mod memory;
pub mod session;
pub mod user;

pub use adapter::{
    FailureLedgerRepositoryAdapter, SessionRepositoryAdapter, UserRepositoryAdapter,
};
pub use failure_ledger::FailureLedgerRepository;
pub use memory::{
    MemoryFailureLedgerRepository, MemoryRepositoryProvider, MemorySessionRepository,
    MemoryUserRepository,
};
pub use session::SessionRepository;
pub use user::UserRepository;

use async_trait::async_trait;

use crate::Error;

/// Provider trait for user repository access.
pub trait UserRepositoryProvider: Send + Sync + 'static {
    /// The user repository implementation type
    type UserRepo: UserRepository;

    /// Get the user repository
    fn user(&self) -> &Self::UserRepo;
}

/// Provider trait for failure ledger access.
pub trait FailureLedgerRepositoryProvider: Send + Sync + 'static {
    /// The failure ledger repository implementation type
    type FailureLedgerRepo: FailureLedgerRepository;

    /// Get the failure ledger repository
    fn failure_ledger(&self) -> &Self::FailureLedgerRepo;
}

/// Provider trait for session repository access.
pub trait SessionRepositoryProvider: Send + Sync + 'static {
    /// The session repository implementation type
    type SessionRepo: SessionRepository;

    /// Get the session repository
    fn session(&self) -> &Self::SessionRepo;
}

/// Provider trait that storage implementations must implement to provide all repositories.
///
/// # Implementing a Custom Storage Backend
///
/// ```rust,ignore
/// use portcullis_core::repositories::*;
///
/// struct MyStorage { /* ... */ }
///
/// impl UserRepositoryProvider for MyStorage {
///     type UserRepo = MyUserRepository;
///     fn user(&self) -> &Self::UserRepo { &self.user_repo }
/// }
///
/// // ... implement the other provider traits ...
///
/// #[async_trait]
/// impl RepositoryProvider for MyStorage {
///     async fn initialize(&self) -> Result<(), Error> { /* ... */ }
///     async fn health_check(&self) -> Result<(), Error> { /* ... */ }
/// }
/// ```
#[async_trait]
pub trait RepositoryProvider:
    UserRepositoryProvider + FailureLedgerRepositoryProvider + SessionRepositoryProvider
{
    /// Prepare storage for first use (e.g. create an empty ledger)
    async fn initialize(&self) -> Result<(), Error>;

    /// Health check for all repositories
    async fn health_check(&self) -> Result<(), Error>;
}
