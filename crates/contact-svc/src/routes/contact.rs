//! Contact protocol endpoints.

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use contact_common::{ChallengeResponse, Submission, VerifiedToken, VerifyOutcome, VerifyRequest};

use super::{ApiError, parse_body};
use crate::state::AppState;

/// Start verification for an email address.
///
/// Returns:
/// - 200: verified token (quiz disabled)
/// - 401: challenge token with question and answers (quiz enabled)
/// - 400: malformed body or email
/// - 429: rate limited
pub async fn verify(State(state): State<AppState>, body: Bytes) -> Result<Response, ApiError> {
    let req: VerifyRequest = parse_body(&state, &body).await?;

    let outcome = state.flow.verify(req).await?;
    let status = if outcome.requires_action() {
        StatusCode::UNAUTHORIZED
    } else {
        StatusCode::OK
    };
    match outcome {
        VerifyOutcome::Challenge(challenge) => Ok((status, Json(challenge)).into_response()),
        VerifyOutcome::Verified(token) => Ok((status, Json(token)).into_response()),
    }
}

/// Answer a challenge, receiving a verified token
pub async fn respond(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<VerifiedToken>, ApiError> {
    let req: ChallengeResponse = parse_body(&state, &body).await?;
    let token = state.flow.respond(req).await?;
    Ok(Json(token))
}

/// Submit the contact form with a verified token
pub async fn submit(State(state): State<AppState>, body: Bytes) -> Result<StatusCode, ApiError> {
    let req: Submission = parse_body(&state, &body).await?;
    state.flow.submit(req).await?;
    Ok(StatusCode::OK)
}

/// Throttled liveness probe used by the web form
pub async fn status(State(state): State<AppState>) -> StatusCode {
    state.flow.status().await;
    StatusCode::OK
}
