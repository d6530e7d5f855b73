use std::convert::Infallible;
use std::net::SocketAddr;

use axum::{
    RequestPartsExt,
    extract::{ConnectInfo, FromRequestParts},
    http::{HeaderMap, header, request::Parts},
};
use axum_extra::extract::CookieJar;
use portcullis::{Session, SessionToken};

use crate::{
    error::AuthError,
    types::{ClientIdentifier, CookieConfig, DEFAULT_COOKIE_NAME, UNKNOWN_CLIENT},
};

impl<S> FromRequestParts<S> for ClientIdentifier
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ip = parts
            .extract::<ConnectInfo<SocketAddr>>()
            .await
            .ok()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
            .unwrap_or_else(|| UNKNOWN_CLIENT.to_string());

        Ok(ClientIdentifier(ip))
    }
}

/// The session admitted by the guard middleware.
///
/// Only available behind [`require_session`](crate::require_session) or
/// [`require_role`](crate::require_role).
pub struct CurrentSession(pub Session);

impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .map(CurrentSession)
            .ok_or(AuthError::Unauthorized)
    }
}

/// Session token presented by the client, if any.
pub struct SessionTokenFromRequest(pub Option<SessionToken>);

impl<S> FromRequestParts<S> for SessionTokenFromRequest
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let cookie_name = parts
            .extensions
            .get::<CookieConfig>()
            .map_or(DEFAULT_COOKIE_NAME, |config| config.name.as_str());

        Ok(SessionTokenFromRequest(session_token(
            &parts.headers,
            cookie_name,
        )))
    }
}

/// Read the session cookie, falling back to a Bearer token.
pub(crate) fn session_token(headers: &HeaderMap, cookie_name: &str) -> Option<SessionToken> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(cookie_name).filter(|c| !c.value().is_empty()) {
        return Some(SessionToken::new(cookie.value()));
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(SessionToken::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_cookie_wins_over_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("session_id=from-cookie"));
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer from-header"),
        );

        assert_eq!(
            session_token(&headers, "session_id"),
            Some(SessionToken::new("from-cookie"))
        );
    }

    #[test]
    fn test_bearer_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer from-header"),
        );

        assert_eq!(
            session_token(&headers, "session_id"),
            Some(SessionToken::new("from-header"))
        );
        assert_eq!(session_token(&HeaderMap::new(), "session_id"), None);
    }

    #[test]
    fn test_other_cookie_names_are_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark"));

        assert_eq!(session_token(&headers, "session_id"), None);
    }
}
