//! Repository trait for the failure ledger.

use async_trait::async_trait;

use crate::{Error, ledger::FailureLedger};

/// Whole-ledger storage for failed login attempts.
///
/// The ledger is always read and written as a unit. Implementations do not
/// need to merge concurrent writers: the last `save` wins. A `save` must be
/// visible to the very next `load`.
#[async_trait]
pub trait FailureLedgerRepository: Send + Sync + 'static {
    /// Read the full ledger. Absent storage is an empty ledger.
    async fn load(&self) -> Result<FailureLedger, Error>;

    /// Replace the full ledger.
    async fn save(&self, ledger: &FailureLedger) -> Result<(), Error>;
}
