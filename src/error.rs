// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

/// Terminal failure of a function invocation. Each variant maps to a fixed
/// status code and a stable string code that clients match on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    // 400 Bad Request
    InvalidPayload,
    UsernameRequired,
    RecoveryAnswersRequired,
    RecoveryCodeRequired,
    RecoveryTokenRequired,
    PasswordTooShort,
    NoRecoveryEmail,
    RecoveryNotSetup,
    IncorrectAnswers,
    InvalidRecoveryCode,
    RecoveryCodeAlreadyUsed,
    RecoveryTokenInvalid,
    RecoveryTokenExpired,

    // 401 Unauthorized
    MissingAuthToken,
    Unauthorized,

    // 404 Not Found
    UsernameNotFound,

    // 405 Method Not Allowed
    MethodNotAllowed,

    // 429 Too Many Requests
    RecoveryEmailThrottled,

    // 500 Internal Server Error
    ServerMisconfigured,
    EmailProviderNotConfigured,
    RecoveryRedirectUnconfigured,
    RecoveryRedirectInvalid,
    DeleteFailed,
    ServerLookupFailed {
        source: Option<&'static str>,
        details: Option<String>,
    },
    RecoveryTokenSaveFailed,
    PasswordUpdateFailed {
        details: Option<String>,
    },

    // 502 Bad Gateway (email provider rejected the message)
    RecoveryEmailFailed,
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidPayload
            | ApiError::UsernameRequired
            | ApiError::RecoveryAnswersRequired
            | ApiError::RecoveryCodeRequired
            | ApiError::RecoveryTokenRequired
            | ApiError::PasswordTooShort
            | ApiError::NoRecoveryEmail
            | ApiError::RecoveryNotSetup
            | ApiError::IncorrectAnswers
            | ApiError::InvalidRecoveryCode
            | ApiError::RecoveryCodeAlreadyUsed
            | ApiError::RecoveryTokenInvalid
            | ApiError::RecoveryTokenExpired => StatusCode::BAD_REQUEST,
            ApiError::MissingAuthToken | ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::UsernameNotFound => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::RecoveryEmailThrottled => StatusCode::TOO_MANY_REQUESTS,
            ApiError::ServerMisconfigured
            | ApiError::EmailProviderNotConfigured
            | ApiError::RecoveryRedirectUnconfigured
            | ApiError::RecoveryRedirectInvalid
            | ApiError::DeleteFailed
            | ApiError::ServerLookupFailed { .. }
            | ApiError::RecoveryTokenSaveFailed
            | ApiError::PasswordUpdateFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::RecoveryEmailFailed => StatusCode::BAD_GATEWAY,
        }
    }

    /// Get error code for client handling.
    ///
    /// The lowercase codes belong to the request envelope shared by every
    /// function; the uppercase ones are recovery-flow outcomes the frontend
    /// translates directly.
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::InvalidPayload => "invalid_payload",
            ApiError::UsernameRequired => "USERNAME_REQUIRED",
            ApiError::RecoveryAnswersRequired => "RECOVERY_ANSWERS_REQUIRED",
            ApiError::RecoveryCodeRequired => "RECOVERY_CODE_REQUIRED",
            ApiError::RecoveryTokenRequired => "RECOVERY_TOKEN_REQUIRED",
            ApiError::PasswordTooShort => "PASSWORD_TOO_SHORT",
            ApiError::NoRecoveryEmail => "NO_RECOVERY_EMAIL",
            ApiError::RecoveryNotSetup => "RECOVERY_NOT_SETUP",
            ApiError::IncorrectAnswers => "INCORRECT_ANSWERS",
            ApiError::InvalidRecoveryCode => "INVALID_RECOVERY_CODE",
            ApiError::RecoveryCodeAlreadyUsed => "RECOVERY_CODE_ALREADY_USED",
            ApiError::RecoveryTokenInvalid => "RECOVERY_TOKEN_INVALID",
            ApiError::RecoveryTokenExpired => "RECOVERY_TOKEN_EXPIRED",
            ApiError::MissingAuthToken => "missing_auth_token",
            ApiError::Unauthorized => "unauthorized",
            ApiError::UsernameNotFound => "USERNAME_NOT_FOUND",
            ApiError::MethodNotAllowed => "method_not_allowed",
            ApiError::RecoveryEmailThrottled => "RECOVERY_EMAIL_THROTTLED",
            ApiError::ServerMisconfigured => "server_misconfigured",
            ApiError::EmailProviderNotConfigured => "EMAIL_PROVIDER_NOT_CONFIGURED",
            ApiError::RecoveryRedirectUnconfigured => "RECOVERY_REDIRECT_UNCONFIGURED",
            ApiError::RecoveryRedirectInvalid => "RECOVERY_REDIRECT_INVALID",
            ApiError::DeleteFailed => "delete_failed",
            ApiError::ServerLookupFailed { .. } => "SERVER_LOOKUP_FAILED",
            ApiError::RecoveryTokenSaveFailed => "RECOVERY_TOKEN_SAVE_FAILED",
            ApiError::PasswordUpdateFailed { .. } => "PASSWORD_UPDATE_FAILED",
            ApiError::RecoveryEmailFailed => "RECOVERY_EMAIL_FAILED",
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        let mut body = json!({ "error": self.error_code() });

        match self {
            ApiError::ServerLookupFailed { source, details } => {
                if let Some(source) = source {
                    body["source"] = json!(source);
                }
                if let Some(details) = details {
                    body["details"] = json!(details);
                }
            }
            ApiError::PasswordUpdateFailed { details: Some(details) } => {
                body["details"] = json!(details);
            }
            _ => {}
        }

        body
    }
}

impl ApiError {
    pub fn lookup_failed(source: &'static str, details: impl Into<String>) -> Self {
        ApiError::ServerLookupFailed {
            source: Some(source),
            details: Some(details.into()),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.error_code())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delete_flow_codes_match_wire_contract() {
        let cases = [
            (ApiError::MethodNotAllowed, 405, "method_not_allowed"),
            (ApiError::ServerMisconfigured, 500, "server_misconfigured"),
            (ApiError::MissingAuthToken, 401, "missing_auth_token"),
            (ApiError::Unauthorized, 401, "unauthorized"),
            (ApiError::DeleteFailed, 500, "delete_failed"),
        ];

        for (error, status, code) in cases {
            assert_eq!(error.status_code().as_u16(), status, "{code}");
            assert_eq!(error.to_json(), json!({ "error": code }));
        }
    }

    #[test]
    fn lookup_failure_carries_source_and_details() {
        let error = ApiError::lookup_failed("profile", "connection reset");
        assert_eq!(
            error.to_json(),
            json!({
                "error": "SERVER_LOOKUP_FAILED",
                "source": "profile",
                "details": "connection reset"
            })
        );
    }

    #[test]
    fn password_update_details_are_optional() {
        let bare = ApiError::PasswordUpdateFailed { details: None };
        assert_eq!(bare.to_json(), json!({ "error": "PASSWORD_UPDATE_FAILED" }));

        let detailed = ApiError::PasswordUpdateFailed {
            details: Some("Password should be at least 8 characters".to_string()),
        };
        assert_eq!(
            detailed.to_json()["details"],
            "Password should be at least 8 characters"
        );
    }

    #[test]
    fn throttle_and_email_failures_use_distinct_statuses() {
        assert_eq!(ApiError::RecoveryEmailThrottled.status_code(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(ApiError::RecoveryEmailFailed.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(ApiError::UsernameNotFound.status_code(), StatusCode::NOT_FOUND);
    }
}
