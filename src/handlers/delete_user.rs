use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap},
};
use serde_json::Value;

use super::{require_provider, RawBody};
use crate::error::ApiError;
use crate::middleware::{ApiResult, Success};
use crate::state::SharedState;

/// POST /delete-user - Delete the caller's own account
///
/// Expected Input:
/// ```json
/// { "token": "<access token>" }
/// ```
///
/// The subject claim of the token names the account to delete. The body is
/// read leniently: anything that is not a JSON object with a string `token`
/// counts as a missing token, including a body over the size limit.
pub async fn delete_user(State(state): State<SharedState>, headers: HeaderMap, body: RawBody) -> ApiResult {
    let origin = headers.get(header::ORIGIN).and_then(|v| v.to_str().ok());
    tracing::info!("Received delete-user request from origin: {:?}", origin);

    let provider = require_provider(&state)?;

    let token = match &body {
        Ok(bytes) => token_from_body(bytes),
        Err(e) => {
            tracing::warn!("Unreadable request body: {}", e);
            String::new()
        }
    };
    if token.is_empty() {
        tracing::warn!("Missing access token in request body");
        return Err(ApiError::MissingAuthToken);
    }

    tracing::debug!("Access token length: {}", token.len());

    let user_id = state.verifier.subject(&token).map_err(|e| {
        tracing::warn!("Rejected access token: {}", e);
        ApiError::Unauthorized
    })?;

    tracing::info!(user_id = %user_id, "Decoded user id from access token");

    provider.admin.delete_user(&user_id).await.map_err(|e| {
        tracing::error!(user_id = %user_id, "Failed to delete auth user: {}", e);
        ApiError::DeleteFailed
    })?;

    tracing::info!(user_id = %user_id, "Successfully deleted user");
    Ok(Success)
}

fn token_from_body(body: &Bytes) -> String {
    serde_json::from_slice::<Value>(body)
        .ok()
        .as_ref()
        .and_then(|v| v.get("token"))
        .and_then(Value::as_str)
        .map(|t| t.trim().to_string())
        .unwrap_or_default()
}
