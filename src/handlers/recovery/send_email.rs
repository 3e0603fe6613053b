use axum::extract::State;
use chrono::Utc;
use url::Url;

use super::username_field;
use crate::error::ApiError;
use crate::handlers::{field_string, parse_json_body, require_provider, RawBody};
use crate::identity::CredentialsUpdate;
use crate::middleware::{ApiResult, Success};
use crate::services::recovery::{
    build_reset_link, email_token_ttl, generate_token, hash_hex, is_throttled, normalize_locale, recovery_email,
};
use crate::state::SharedState;

/// POST /send-recovery-email - Email a password reset link
///
/// Expected Input:
/// ```json
/// { "username": "alice", "locale": "es-ES", "redirectUrl": "https://app.example.com/recover" }
/// ```
///
/// `locale` defaults to `en`; `redirectUrl` falls back to the configured
/// redirect target.
pub async fn send_recovery_email(State(state): State<SharedState>, body: RawBody) -> ApiResult {
    let provider = require_provider(&state)?;

    let email = state.email.as_ref().ok_or_else(|| {
        tracing::error!("Email provider not configured (RESEND_API_KEY or RECOVERY_EMAIL_FROM missing)");
        ApiError::EmailProviderNotConfigured
    })?;

    let body = parse_json_body(&body)?;

    let username = username_field(&body);
    let locale = normalize_locale(&field_string(&body, "locale"));
    let redirect = Some(field_string(&body, "redirectUrl"))
        .filter(|r| !r.is_empty())
        .or_else(|| state.fallback_redirect_url.clone())
        .unwrap_or_default();

    if username.is_empty() {
        return Err(ApiError::UsernameRequired);
    }

    if redirect.is_empty() {
        tracing::error!("Missing redirect URL for recovery email");
        return Err(ApiError::RecoveryRedirectUnconfigured);
    }

    let redirect = Url::parse(&redirect).map_err(|e| {
        tracing::error!("Invalid redirect URL provided {}: {}", redirect, e);
        ApiError::RecoveryRedirectInvalid
    })?;

    let profile = provider
        .store
        .find_profile(&username)
        .await
        .map_err(|e| {
            tracing::error!("Failed to lookup profile for username {}: {}", username, e);
            ApiError::ServerLookupFailed { source: None, details: None }
        })?
        .ok_or(ApiError::UsernameNotFound)?;

    let recipient = profile
        .recovery_email
        .as_deref()
        .filter(|e| !e.is_empty())
        .ok_or(ApiError::NoRecoveryEmail)?;

    let credentials = provider
        .store
        .find_credentials(&profile.id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch recovery credentials: {}", e);
            ApiError::ServerLookupFailed { source: None, details: None }
        })?
        .ok_or(ApiError::RecoveryNotSetup)?;

    let now = Utc::now();
    if is_throttled(credentials.email_recovery_token_sent_at.as_deref(), now) {
        return Err(ApiError::RecoveryEmailThrottled);
    }

    let token = generate_token();
    let mut update = CredentialsUpdate {
        email_recovery_token_hash: Some(hash_hex(&token)),
        email_recovery_token_expires_at: Some(now + email_token_ttl()),
        email_recovery_token_sent_at: Some(now),
        email_recovery_attempts: Some(credentials.email_recovery_attempts.unwrap_or(0) + 1),
        ..Default::default()
    };

    // Delivering a reset link to the address proves it is reachable.
    if !credentials.recovery_email_verified.unwrap_or(false) {
        update.recovery_email_verified = Some(true);
        update.recovery_email_verified_at = Some(now);
    }

    provider
        .store
        .update_credentials(&profile.id, &update)
        .await
        .map_err(|e| {
            tracing::error!("Failed to persist email recovery token: {}", e);
            ApiError::RecoveryTokenSaveFailed
        })?;

    let reset_link = build_reset_link(&redirect, &token, &profile.username, &locale);
    let message = recovery_email(
        &email.sender,
        recipient,
        profile.display_name.as_deref(),
        &profile.username,
        &reset_link,
    );

    email.mailer.send(&message).await.map_err(|e| {
        tracing::error!("Failed to send recovery email: {}", e);
        ApiError::RecoveryEmailFailed
    })?;

    tracing::info!(user_id = %profile.id, "Recovery email sent");
    Ok(Success)
}
