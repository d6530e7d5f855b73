//! Core functionality for the portcullis project
//!
//! This crate holds the credential-verification and lockout logic behind a
//! session-based login flow:
//!
//! - [`services::UserStore`] reads user records from a [`repositories::UserRepository`].
//! - [`services::FailureLedgerService`] counts failed logins per client
//!   identifier and applies an exponential lockout.
//! - [`services::Authenticator`] combines both into a single login decision.
//! - [`guard`] decides whether a session may reach a protected operation.
//!
//! Storage is reached only through the traits in [`repositories`]; the
//! in-memory implementations there are suitable for tests and single-process
//! deployments. See `portcullis-storage-json` for file-backed storage and
//! `portcullis` for the assembled facade.
pub mod config;
pub mod error;
pub mod guard;
pub mod ledger;
pub mod password;
pub mod repositories;
pub mod services;
pub mod session;
pub mod user;

pub use config::{LockoutConfig, SessionConfig};
pub use error::Error;
pub use guard::{AccessDenied, AccessPolicy, Surface};
pub use ledger::{FailureLedger, FailureRecord, LockoutStatus};
pub use password::{PasswordAuthVerifier, PasswordVerifier};
pub use services::LoginOutcome;
pub use session::{Session, SessionToken};
pub use user::{StoredUser, UserRecord};
