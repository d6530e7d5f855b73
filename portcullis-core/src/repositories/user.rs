use std::collections::HashMap;

use crate::{Error, user::StoredUser};
use async_trait::async_trait;

/// Read access to the durable user mapping.
#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Read the full mapping of username to stored entry.
    ///
    /// Absent storage is an empty mapping, not an error.
    async fn load_all(&self) -> Result<HashMap<String, StoredUser>, Error>;
}
