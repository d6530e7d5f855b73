//! JSON file storage for portcullis.
//!
//! Two files back the provider:
//!
//! - the user mapping, `username -> "hash"` or `username -> {"password_hash", "role"}`,
//!   which is only ever read;
//! - the failure ledger, `identifier -> {"count", "locked_until"}`, which is
//!   rewritten in full after every change.
//!
//! Both are read afresh on every call. Writes go to a temporary sibling file
//! that is then renamed over the original, so a reader never sees a partially
//! written ledger.
//!
//! ```rust,ignore
//! use portcullis_storage_json::JsonRepositoryProvider;
//!
//! let storage = JsonRepositoryProvider::new("users.json", "login-failures.json");
//! storage.initialize().await?;
//! ```
mod file;
pub mod repositories;

pub use repositories::{JsonFailureLedgerRepository, JsonRepositoryProvider, JsonUserRepository};
