//! # Portcullis Axum Integration
//!
//! This crate provides Axum routes and middleware for Portcullis.
//!
//! ## Routes
//!
//! - `GET /login`: where unauthenticated browsers and logout land
//! - `POST /login`: form `username`, `password`. 200 with a session cookie,
//!   401 `Invalid credentials`, or 429 `Too many failed attempts` with a
//!   `Retry-After` header
//! - `GET`/`POST /logout`: ends the session and redirects to the login path
//! - `GET /session`: the current session, or 401
//! - `GET /health`: storage health
//!
//! Failed logins are counted against the peer IP address, so serve the app
//! with `into_make_service_with_connect_info::<SocketAddr>()`. Without it all
//! clients share the identifier `"unknown"`.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::{net::SocketAddr, sync::Arc};
//! use axum::{Router, middleware, routing::get};
//! use portcullis::{JsonRepositoryProvider, PortcullisBuilder};
//! use portcullis_axum::{AuthState, CookieConfig, CurrentSession, RoleState, require_role, require_session};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let portcullis = Arc::new(
//!         PortcullisBuilder::new()
//!             .with_json_files("users.json", "login-failures.json")
//!             .initialize_storage(true)
//!             .build()
//!             .await?,
//!     );
//!
//!     let auth = AuthState::new(portcullis).with_cookie_config(CookieConfig::development());
//!
//!     let admin = Router::new()
//!         .route("/admin", get(admin_handler))
//!         .route_layer(middleware::from_fn_with_state(
//!             RoleState::new(auth.clone(), "admin"),
//!             require_role::<JsonRepositoryProvider>,
//!         ));
//!
//!     let protected = Router::new()
//!         .route("/api/reports", get(reports_handler))
//!         .route_layer(middleware::from_fn_with_state(
//!             auth.clone(),
//!             require_session::<JsonRepositoryProvider>,
//!         ));
//!
//!     let app = Router::new()
//!         .merge(admin)
//!         .merge(protected)
//!         .merge(portcullis_axum::routes(auth).build());
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//!     axum::serve(
//!         listener,
//!         app.into_make_service_with_connect_info::<SocketAddr>(),
//!     )
//!     .await?;
//!     Ok(())
//! }
//!
//! async fn admin_handler(CurrentSession(session): CurrentSession) -> String {
//!     format!("hello {}", session.user)
//! }
//!
//! async fn reports_handler() -> &'static str {
//!     "[]"
//! }
//! ```

mod error;
mod extractors;
mod middleware;
mod routes;
mod types;

pub use error::{AuthError, Result};
pub use extractors::{CurrentSession, SessionTokenFromRequest};
pub use middleware::{AuthState, RoleState, require_role, require_session};
pub use routes::create_router;
pub use types::{
    ClientIdentifier, CookieConfig, CookieSameSite, DEFAULT_COOKIE_NAME, DEFAULT_LOGIN_PATH,
    HealthResponse, LoginPageResponse, LoginRequest, LoginResponse, SessionResponse, UNKNOWN_CLIENT,
};

use axum::Router;
use portcullis::RepositoryProvider;

/// Create the login, logout and session routes.
///
/// # Arguments
///
/// * `state` - The shared [`AuthState`]. Configure the cookie and login path
///   on it, then hand clones of the same state to the guard middleware so
///   routes and middleware agree.
///
/// # Returns
///
/// A builder for a Router that can be merged into your application or nested
/// under a prefix. When nesting, set the login path to the full public path.
///
/// # Example
///
/// ```rust,no_run
/// # use std::sync::Arc;
/// # use axum::Router;
/// # use portcullis::Portcullis;
/// # use portcullis_core::repositories::MemoryRepositoryProvider;
/// # let portcullis = Arc::new(Portcullis::new(Arc::new(MemoryRepositoryProvider::new())));
/// let auth = portcullis_axum::AuthState::new(portcullis).with_login_path("/auth/login");
/// let app: Router = Router::new().nest("/auth", portcullis_axum::routes(auth).build());
/// ```
pub fn routes<R>(state: AuthState<R>) -> AuthRouterBuilder<R>
where
    R: RepositoryProvider + 'static,
{
    AuthRouterBuilder { state }
}

/// Builder for the authentication routes
pub struct AuthRouterBuilder<R: RepositoryProvider> {
    state: AuthState<R>,
}

impl<R: RepositoryProvider + 'static> AuthRouterBuilder<R> {
    /// Build the router from the shared state
    pub fn build(self) -> Router {
        create_router(self.state)
    }
}

impl<R: RepositoryProvider + 'static> From<AuthRouterBuilder<R>> for Router {
    fn from(builder: AuthRouterBuilder<R>) -> Self {
        builder.build()
    }
}
