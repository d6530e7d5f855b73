//! Service layer for business logic
//!
//! This module contains concrete service implementations that encapsulate
//! credential checking, lockout tracking and session management.

pub mod authenticator;
pub mod failure_ledger;
pub mod session;
pub mod user;

pub use authenticator::{Authenticator, LoginOutcome};
pub use failure_ledger::FailureLedgerService;
pub use session::SessionService;
pub use user::UserStore;
