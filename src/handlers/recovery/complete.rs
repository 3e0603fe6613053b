use axum::extract::State;
use chrono::Utc;

use super::{log_attempt, username_field};
use crate::error::ApiError;
use crate::handlers::{field_string, parse_json_body, require_provider, RawBody};
use crate::identity::CredentialsUpdate;
use crate::middleware::{ApiResult, Success};
use crate::services::recovery::{hash_answer, hash_recovery_code, RecoveryMethod, MIN_PASSWORD_LENGTH};
use crate::state::SharedState;

/// POST /complete-recovery - Set a new password after proving ownership
///
/// Expected Input:
/// ```json
/// {
///   "username": "alice",
///   "newPassword": "correct horse",
///   "method": "questions" | "code",
///   "answer1": "...", "answer2": "...",   // questions
///   "recoveryCode": "ABCD-1234"           // code
/// }
/// ```
///
/// Every verdict after the profile lookup is written to the attempt log.
pub async fn complete_recovery(State(state): State<SharedState>, body: RawBody) -> ApiResult {
    let provider = require_provider(&state)?;
    let body = parse_json_body(&body)?;

    let username = username_field(&body);
    let new_password = field_string(&body, "newPassword");
    let answer1 = field_string(&body, "answer1");
    let answer2 = field_string(&body, "answer2");
    let recovery_code = field_string(&body, "recoveryCode");

    if username.is_empty() {
        return Err(ApiError::UsernameRequired);
    }

    let method = RecoveryMethod::parse(&field_string(&body, "method"));

    match method {
        RecoveryMethod::Questions if answer1.trim().is_empty() || answer2.trim().is_empty() => {
            return Err(ApiError::RecoveryAnswersRequired);
        }
        RecoveryMethod::Code if recovery_code.trim().is_empty() => {
            return Err(ApiError::RecoveryCodeRequired);
        }
        _ => {}
    }

    if new_password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::PasswordTooShort);
    }

    let store = provider.store.as_ref();

    let profile = store
        .find_profile(&username)
        .await
        .map_err(|e| {
            tracing::error!("Profile lookup failed: {}", e);
            ApiError::lookup_failed("profile", e.to_string())
        })?
        .ok_or(ApiError::UsernameNotFound)?;

    let credentials = store
        .find_credentials(&profile.id)
        .await
        .map_err(|e| {
            tracing::error!("Recovery credential lookup failed: {}", e);
            ApiError::lookup_failed("credentials", e.to_string())
        })?
        .unwrap_or_default();

    match method {
        RecoveryMethod::Questions => {
            let (Some(expected1), Some(expected2)) = (
                credentials.security_answer_1_hash.as_deref().filter(|h| !h.is_empty()),
                credentials.security_answer_2_hash.as_deref().filter(|h| !h.is_empty()),
            ) else {
                log_attempt(store, &username, false, Some("RECOVERY_NOT_SETUP")).await;
                return Err(ApiError::RecoveryNotSetup);
            };

            if hash_answer(&answer1) != expected1 || hash_answer(&answer2) != expected2 {
                log_attempt(store, &username, false, Some("INVALID_ANSWERS")).await;
                return Err(ApiError::IncorrectAnswers);
            }
        }
        RecoveryMethod::Code => {
            let hashes = credentials.recovery_codes_hash.unwrap_or_default();
            let mut used = credentials.used_recovery_codes.unwrap_or_default();
            let code_hash = hash_recovery_code(&recovery_code);

            if !hashes.contains(&code_hash) {
                log_attempt(store, &username, false, Some("INVALID_CODE")).await;
                return Err(ApiError::InvalidRecoveryCode);
            }

            if used.contains(&code_hash) {
                log_attempt(store, &username, false, Some("CODE_ALREADY_USED")).await;
                return Err(ApiError::RecoveryCodeAlreadyUsed);
            }

            used.push(code_hash);
            let update = CredentialsUpdate {
                used_recovery_codes: Some(used),
                ..Default::default()
            };
            if let Err(e) = store.update_credentials(&profile.id, &update).await {
                tracing::error!("Failed to mark recovery code as used: {}", e);
            }
        }
    }

    if let Err(e) = provider.admin.update_user_password(&profile.id, &new_password).await {
        tracing::error!("Failed to update auth password: {}", e);
        let details = e.provider_message().map(str::to_string);
        log_attempt(store, &username, false, Some("PASSWORD_UPDATE_FAILED")).await;
        return Err(ApiError::PasswordUpdateFailed { details });
    }

    if let Err(e) = store.touch_profile_after_reset(&profile.id, Utc::now()).await {
        tracing::error!("Failed to update profile after password reset: {}", e);
    }

    log_attempt(store, &username, true, None).await;

    tracing::info!(user_id = %profile.id, "Password reset completed");
    Ok(Success)
}
