use axum_extra::extract::cookie::{Cookie, SameSite};
use portcullis::{Session, SessionToken};
use serde::{Deserialize, Serialize};

/// Default name of the session cookie.
pub const DEFAULT_COOKIE_NAME: &str = "session_id";

/// Default login entry point browsers are redirected to.
pub const DEFAULT_LOGIN_PATH: &str = "/login";

/// Client identifier used when the peer address is not available.
pub const UNKNOWN_CLIENT: &str = "unknown";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub username: String,
    pub role: String,
    pub session: Session,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginPageResponse {
    pub login: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionResponse {
    pub session: Session,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Address-derived identifier that failed logins are counted against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentifier(pub String);

#[derive(Debug, Clone)]
pub struct CookieConfig {
    pub name: String,
    pub http_only: bool,
    pub secure: bool,
    pub same_site: CookieSameSite,
    pub path: String,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self::new(DEFAULT_COOKIE_NAME)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub enum CookieSameSite {
    Strict,
    #[default]
    Lax,
    None,
}

impl From<CookieSameSite> for SameSite {
    fn from(value: CookieSameSite) -> Self {
        match value {
            CookieSameSite::Strict => SameSite::Strict,
            CookieSameSite::Lax => SameSite::Lax,
            CookieSameSite::None => SameSite::None,
        }
    }
}

impl CookieConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            http_only: true,
            secure: true,
            same_site: CookieSameSite::Lax,
            path: "/".to_string(),
        }
    }

    /// Same as the default but without the `Secure` flag, for plain HTTP.
    pub fn development() -> Self {
        Self {
            secure: false,
            ..Self::default()
        }
    }

    pub(crate) fn session_cookie(&self, token: &SessionToken) -> Cookie<'static> {
        Cookie::build((self.name.clone(), token.to_string()))
            .path(self.path.clone())
            .http_only(self.http_only)
            .secure(self.secure)
            .same_site(self.same_site.into())
            .build()
    }

    /// Cookie matching the session cookie's name and path, for removal.
    pub(crate) fn removal_cookie(&self) -> Cookie<'static> {
        Cookie::build((self.name.clone(), ""))
            .path(self.path.clone())
            .build()
    }
}
