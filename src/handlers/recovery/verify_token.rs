use axum::extract::State;
use chrono::Utc;

use super::username_field;
use crate::error::ApiError;
use crate::handlers::{field_string, parse_json_body, require_provider, RawBody};
use crate::middleware::{ApiResult, Success};
use crate::services::recovery::{hash_hex, is_expired};
use crate::state::SharedState;

/// POST /verify-recovery-token - Check an emailed recovery token
///
/// Expected Input:
/// ```json
/// { "username": "alice", "token": "<token from reset link>" }
/// ```
pub async fn verify_recovery_token(State(state): State<SharedState>, body: RawBody) -> ApiResult {
    let provider = require_provider(&state)?;
    let body = parse_json_body(&body)?;

    let username = username_field(&body);
    let token = field_string(&body, "token").trim().to_string();

    if username.is_empty() {
        return Err(ApiError::UsernameRequired);
    }
    if token.is_empty() {
        return Err(ApiError::RecoveryTokenRequired);
    }

    let profile = provider
        .store
        .find_profile(&username)
        .await
        .map_err(|e| {
            tracing::error!("Profile lookup failed: {}", e);
            ApiError::ServerLookupFailed { source: None, details: None }
        })?
        .ok_or(ApiError::UsernameNotFound)?;

    let credentials = provider
        .store
        .find_credentials(&profile.id)
        .await
        .map_err(|e| {
            tracing::error!("Recovery credential lookup failed: {}", e);
            ApiError::ServerLookupFailed { source: None, details: None }
        })?
        .unwrap_or_default();

    let stored_hash = credentials
        .email_recovery_token_hash
        .as_deref()
        .filter(|h| !h.is_empty())
        .ok_or(ApiError::RecoveryTokenInvalid)?;

    if hash_hex(&token) != stored_hash {
        return Err(ApiError::RecoveryTokenInvalid);
    }

    if is_expired(credentials.email_recovery_token_expires_at.as_deref(), Utc::now()) {
        return Err(ApiError::RecoveryTokenExpired);
    }

    Ok(Success)
}
