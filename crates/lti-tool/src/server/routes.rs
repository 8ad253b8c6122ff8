//! Router and shared handler state.

use std::sync::Arc;

use axum::Router;
use axum::extract::{DefaultBodyLimit, FromRef};
use axum::routing::{get, post};
use axum_extra::extract::cookie::Key;
use sha2::{Digest, Sha512};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use super::session::SessionStore;
use super::{grades, handlers};
use crate::config::Config;
use crate::lti::LtiService;

/// Shared state for HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub lti: Arc<LtiService>,
    pub sessions: Arc<dyn SessionStore>,
    cookie_key: Key,
}

impl AppState {
    #[must_use]
    pub fn new(config: Arc<Config>, lti: Arc<LtiService>, sessions: Arc<dyn SessionStore>) -> Self {
        let cookie_key = Key::from(Sha512::digest(config.secret_key.as_bytes()).as_slice());
        Self { config, lti, sessions, cookie_key }
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

/// Create the HTTP router.
pub fn create_router(state: AppState) -> Router {
    let body_limit = state.config.max_content_length;

    Router::new()
        .route("/", get(handlers::index))
        .route("/login", get(handlers::login_get).post(handlers::login_post))
        .route("/launch", post(handlers::launch))
        .route("/jwks", get(handlers::jwks))
        .route("/configure", get(handlers::configure))
        .route("/api/status", get(handlers::api_status))
        .route("/submit_grade", post(grades::submit_grade))
        .fallback(handlers::not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
