//! `POST /submit_grade`: grade passback through AGS.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum_extra::extract::cookie::SignedCookieJar;

use super::handlers::current_session;
use super::routes::AppState;
use crate::error::{AgsError, ApiError};
use crate::lti::ags::scope;
use crate::models::{GradeRequest, GradeResponse, Score, UserInfo};

/// Post a score for the current launch.
///
/// The launch and user come from the body, falling back to the session.
/// Learners may only grade themselves.
pub async fn submit_grade(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    body: Result<Json<GradeRequest>, JsonRejection>,
) -> Result<Json<GradeResponse>, ApiError> {
    let Json(request) = body.map_err(|rejection| {
        tracing::warn!(error = %rejection, "Rejected grade request body");
        ApiError::bad_request("Invalid request body")
    })?;

    let expose = state.config.expose_error_details();
    let (launch_id, user_id) = match (request.launch_id.clone(), request.user_id.clone()) {
        (Some(launch_id), Some(user_id)) => (launch_id, user_id),
        (launch_id, user_id) => {
            let session = current_session(&state, &jar).await.map(|(_, r)| r).unwrap_or_default();
            if let Err(reason) = session.validate() {
                return Err(ApiError::unauthorized("No active launch session").with_details(expose, reason));
            }
            match (launch_id.or(session.launch_id), user_id.or(session.user_id)) {
                (Some(launch_id), Some(user_id)) => (launch_id, user_id),
                _ => return Err(ApiError::unauthorized("No active launch session")),
            }
        }
    };

    let (score, max_score) = request
        .validated_score()
        .ok_or_else(|| ApiError::bad_request("Invalid score value"))?;

    let launch = state
        .lti
        .find_launch(&launch_id)
        .await
        .ok_or_else(|| ApiError::unauthorized("Launch session expired or not found"))?;

    let permitted = launch.claims.ags.as_ref().is_some_and(|ags| ags.has_scope(scope::SCORE));
    if !permitted {
        return Err(ApiError::forbidden("Grade submission not permitted for this launch"));
    }

    // Only staff may grade someone other than the launching user.
    let own_grade = launch.claims.sub.as_deref() == Some(user_id.as_str());
    if !own_grade && !UserInfo::from_claims(&launch.claims).is_instructor {
        tracing::warn!(%launch_id, %user_id, "Learner attempted to grade another user");
        return Err(ApiError::forbidden("Grade submission not permitted for this launch"));
    }

    let comment = request.comment().map(str::to_string);
    let payload = Score::completed(user_id.clone(), score, max_score, comment.clone(), chrono::Utc::now());

    match state.lti.submit_score(&launch, &payload).await {
        Ok(()) => {
            tracing::info!(%launch_id, %user_id, score, max_score, "Grade submitted");
            Ok(Json(GradeResponse { success: true, score, max_score, comment }))
        }
        Err(e @ (AgsError::Unavailable | AgsError::MissingScope(_))) => {
            tracing::warn!(error = %e, %launch_id, "Grade submission not permitted");
            Err(ApiError::forbidden("Grade submission not permitted for this launch"))
        }
        Err(e) => {
            tracing::error!(error = %e, %launch_id, "Failed to submit grade");
            Err(ApiError::internal("Failed to submit grade").with_details(expose, &e))
        }
    }
}
