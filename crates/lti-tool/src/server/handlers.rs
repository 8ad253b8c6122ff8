//! Page and metadata route handlers.

use axum::Json;
use axum::extract::rejection::{FormRejection, QueryRejection};
use axum::extract::{Form, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum_extra::extract::cookie::SignedCookieJar;

use super::pages::{self, ErrorPage};
use super::routes::AppState;
use super::session::{self, SessionRecord};
use crate::config::Config;
use crate::error::ApiError;
use crate::lti::{LaunchRequest, LoginRequest};
use crate::models::LaunchSummary;
use crate::models::claims::message_type;

/// `GET /`
pub async fn index(State(state): State<AppState>) -> Html<String> {
    Html(pages::render_index(&state.config, state.lti.tool_config().len()))
}

/// `GET /login`
pub async fn login_get(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    query: Result<Query<LoginRequest>, QueryRejection>,
) -> Response {
    match query {
        Ok(Query(request)) => start_login(&state, jar, &request).await,
        Err(rejection) => login_rejected(&state, &rejection.body_text()),
    }
}

/// `POST /login`
pub async fn login_post(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    form: Result<Form<LoginRequest>, FormRejection>,
) -> Response {
    match form {
        Ok(Form(request)) => start_login(&state, jar, &request).await,
        Err(rejection) => login_rejected(&state, &rejection.body_text()),
    }
}

async fn start_login(state: &AppState, jar: SignedCookieJar, request: &LoginRequest) -> Response {
    match state.lti.login(request).await {
        Ok(redirect) => {
            let jar = jar.add(session::state_cookie(&state.config, &redirect.state));
            (StatusCode::FOUND, jar, [(header::LOCATION, redirect.url)]).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, iss = ?request.iss, "Login error");
            ErrorPage::new(StatusCode::BAD_REQUEST, "Failed to initiate login")
                .with_details(state.config.expose_error_details(), &e)
                .into_response()
        }
    }
}

fn login_rejected(state: &AppState, reason: &str) -> Response {
    tracing::error!(error = %reason, "Login error");
    ErrorPage::new(StatusCode::BAD_REQUEST, "Failed to initiate login")
        .with_details(state.config.expose_error_details(), reason)
        .into_response()
}

/// `POST /launch`
pub async fn launch(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    form: Result<Form<LaunchRequest>, FormRejection>,
) -> Response {
    let expose = state.config.expose_error_details();

    let Form(request) = match form {
        Ok(form) => form,
        Err(rejection) => {
            tracing::error!(error = %rejection, "LTI launch error");
            return ErrorPage::new(StatusCode::BAD_REQUEST, "Invalid LTI launch")
                .with_details(expose, rejection.body_text())
                .into_response();
        }
    };

    let state_cookie = request
        .state
        .as_deref()
        .and_then(|s| jar.get(&Config::state_cookie_name(s)))
        .map(|c| c.value().to_string());

    let launch = match state.lti.launch(&request, state_cookie.as_deref()).await {
        Ok(launch) => launch,
        Err(e) if e.is_protocol_error() => {
            tracing::error!(error = %e, "LTI launch error");
            return ErrorPage::new(StatusCode::BAD_REQUEST, "Invalid LTI launch")
                .with_details(expose, &e)
                .into_response();
        }
        Err(e) => {
            tracing::error!(error = %e, "Unexpected launch error");
            return ErrorPage::new(StatusCode::INTERNAL_SERVER_ERROR, "Launch failed")
                .with_details(expose, &e)
                .into_response();
        }
    };

    let summary = LaunchSummary::from_claims(&launch.claims);
    let record = SessionRecord {
        user_id: Some(summary.user.user_id.clone()),
        course_id: Some(summary.course.course_id.clone()),
        is_instructor: summary.user.has_instructor_role(),
        launch_id: Some(launch.launch_id.clone()),
    };

    let session_id = session::session_id(&state.config, &jar).unwrap_or_else(session::new_session_id);
    if let Err(e) = state.sessions.save(&session_id, &record).await {
        tracing::error!(error = %e, "Failed to save session");
        return ErrorPage::new(StatusCode::INTERNAL_SERVER_ERROR, "Launch failed")
            .with_details(expose, &e)
            .into_response();
    }

    let deep_link = if launch.is_deep_link_launch() {
        match state.lti.deep_link_response(&launch, &state.config.tool_name) {
            Ok(response) => Some(response),
            Err(e) => {
                tracing::warn!(error = %e, "Could not build deep linking response");
                None
            }
        }
    } else {
        None
    };

    tracing::info!(
        user_id = %record.user_id.as_deref().unwrap_or_default(),
        course_id = %record.course_id.as_deref().unwrap_or_default(),
        "Successful launch"
    );

    let mut jar = jar.add(session::session_cookie(&state.config, session_id));
    if let Some(login_state) = request.state.as_deref() {
        jar = jar.remove(session::state_cookie(&state.config, login_state));
    }

    let html = pages::render_launch(&state.config, &launch, &summary, deep_link.as_ref());
    (jar, Html(html)).into_response()
}

/// `GET /jwks`
pub async fn jwks(State(state): State<AppState>) -> Response {
    let set = state.lti.jwks();
    if set.keys.is_empty() {
        tracing::error!("JWKS requested but no tool keys are configured");
        return ApiError::internal("Failed to retrieve JWKS")
            .with_details(state.config.expose_error_details(), "no tool keys are configured")
            .into_response();
    }
    Json(set).into_response()
}

/// `GET /configure`
pub async fn configure(State(state): State<AppState>) -> impl IntoResponse {
    let config = &state.config;
    Json(serde_json::json!({
        "title": config.tool_name,
        "description": config.tool_description,
        "oidc_login_url": config.url_for("/login"),
        "launch_url": config.url_for("/launch"),
        "jwks_url": config.url_for("/jwks"),
        "target_link_uri": config.url_for("/launch"),
        "custom_parameters": {
            "tool_version": config.tool_version,
            "support_email": config.tool_support_email
        },
        "claims": ["iss", "sub", "name", "given_name", "family_name", "email", "locale"],
        "messages": [
            {"type": message_type::RESOURCE_LINK},
            {"type": message_type::DEEP_LINKING}
        ]
    }))
}

/// `GET /api/status`
pub async fn api_status(State(state): State<AppState>, jar: SignedCookieJar) -> impl IntoResponse {
    let record = current_session(&state, &jar).await.map(|(_, r)| r).unwrap_or_default();

    match record.user_id {
        None => Json(serde_json::json!({
            "status": "ok",
            "authenticated": false,
            "message": "Tool is running"
        })),
        Some(user_id) => Json(serde_json::json!({
            "status": "ok",
            "authenticated": true,
            "user_id": user_id,
            "course_id": record.course_id,
            "is_instructor": record.is_instructor
        })),
    }
}

/// Fallback for unknown paths.
pub async fn not_found() -> ErrorPage {
    ErrorPage::not_found()
}

/// The browser's session, if it has a live one.
pub(super) async fn current_session(state: &AppState, jar: &SignedCookieJar) -> Option<(String, SessionRecord)> {
    let id = session::session_id(&state.config, jar)?;
    match state.sessions.load(&id).await {
        Ok(record) => record.map(|r| (id, r)),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load session");
            None
        }
    }
}
