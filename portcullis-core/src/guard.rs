//! Access guards for protected operations
//!
//! Guards look at session state only; they never touch the user mapping or
//! the failure ledger. Two checks exist:
//!
//! - [`require_session`]: any live session passes. Denial is
//!   [`AccessDenied::Unauthorized`], tagged with the [`Surface`] of the
//!   request so the HTTP layer can answer an API client with a structured
//!   401 and a browser with a redirect to the login page.
//! - [`require_role`]: the session role must equal the required role.
//!   Denial is always [`AccessDenied::Forbidden`], never a redirect.
//!
//! [`AccessPolicy`] wraps either check so middleware can be parameterised by
//! the capability it enforces.
use serde::Serialize;

use crate::Session;

/// Path prefix of programmatic endpoints.
pub const API_PATH_PREFIX: &str = "/api";

/// The kind of caller a request comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Surface {
    Api,
    Browser,
}

impl Surface {
    pub fn from_path(path: &str) -> Self {
        if path.starts_with(API_PATH_PREFIX) {
            Surface::Api
        } else {
            Surface::Browser
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AccessDenied {
    #[error("unauthorized")]
    Unauthorized(Surface),

    #[error("forbidden")]
    Forbidden,
}

pub fn require_session(
    session: Option<&Session>,
    surface: Surface,
) -> Result<&Session, AccessDenied> {
    session.ok_or(AccessDenied::Unauthorized(surface))
}

pub fn require_role<'a>(
    session: Option<&'a Session>,
    role: &str,
) -> Result<&'a Session, AccessDenied> {
    session
        .filter(|session| session.role == role)
        .ok_or(AccessDenied::Forbidden)
}

/// The capability a guarded operation demands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessPolicy {
    /// Any live session.
    Authenticated,
    /// A live session whose role equals the given one.
    Role(String),
}

impl AccessPolicy {
    pub fn role(role: impl Into<String>) -> Self {
        AccessPolicy::Role(role.into())
    }

    pub fn check<'a>(
        &self,
        session: Option<&'a Session>,
        surface: Surface,
    ) -> Result<&'a Session, AccessDenied> {
        match self {
            AccessPolicy::Authenticated => require_session(session, surface),
            AccessPolicy::Role(role) => require_role(session, role),
        }
    }

    /// Run `operation` only if the policy admits `session`.
    pub fn guarded<T>(
        &self,
        session: Option<&Session>,
        surface: Surface,
        operation: impl FnOnce(&Session) -> T,
    ) -> Result<T, AccessDenied> {
        let session = self.check(session, surface)?;
        Ok(operation(session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SessionToken;
    use chrono::Utc;

    fn session(role: &str) -> Session {
        Session::new(SessionToken::new("token"), "alice", role, Utc::now())
    }

    #[test]
    fn test_surface_from_path() {
        assert_eq!(Surface::from_path("/api/reports"), Surface::Api);
        assert_eq!(Surface::from_path("/api"), Surface::Api);
        assert_eq!(Surface::from_path("/"), Surface::Browser);
        assert_eq!(Surface::from_path("/dashboard/api"), Surface::Browser);
    }

    #[test]
    fn test_require_session_denial_carries_surface() {
        assert_eq!(
            require_session(None, Surface::Api),
            Err(AccessDenied::Unauthorized(Surface::Api))
        );
        assert_eq!(
            require_session(None, Surface::Browser),
            Err(AccessDenied::Unauthorized(Surface::Browser))
        );

        let viewer = session("viewer");
        assert_eq!(require_session(Some(&viewer), Surface::Api), Ok(&viewer));
    }

    #[test]
    fn test_require_role() {
        let admin = session("admin");
        let viewer = session("viewer");

        assert_eq!(require_role(Some(&admin), "admin"), Ok(&admin));
        assert_eq!(require_role(Some(&viewer), "admin"), Err(AccessDenied::Forbidden));
        assert_eq!(require_role(None, "admin"), Err(AccessDenied::Forbidden));
    }

    #[test]
    fn test_guarded_runs_operation_only_when_admitted() {
        let admin = session("admin");
        let policy = AccessPolicy::role("admin");

        let result = policy.guarded(Some(&admin), Surface::Browser, |s| s.user.clone());
        assert_eq!(result, Ok("alice".to_string()));

        let mut ran = false;
        let result = AccessPolicy::Authenticated.guarded(None, Surface::Api, |_| ran = true);
        assert_eq!(result, Err(AccessDenied::Unauthorized(Surface::Api)));
        assert!(!ran);
    }
}
