// handlers/recovery - password recovery functions
//
// Three steps of the recovery flow: request a reset email, check the emailed
// token, and set a new password after answering security questions or
// presenting a one-time recovery code.
use crate::identity::{AttemptLogEntry, RecoveryStore};

pub mod complete;
pub mod send_email;
pub mod verify_token;

pub use complete::complete_recovery;
pub use send_email::send_recovery_email;
pub use verify_token::verify_recovery_token;

/// Normalised username from the request body.
pub(crate) fn username_field(body: &serde_json::Value) -> String {
    super::field_string(body, "username").trim().to_lowercase()
}

/// Record a password-reset attempt. Failures are logged and never change the
/// response.
pub(crate) async fn log_attempt(store: &dyn RecoveryStore, username: &str, success: bool, failure_reason: Option<&str>) {
    let entry = AttemptLogEntry::password_reset(username, success, failure_reason);
    if let Err(e) = store.log_attempt(&entry).await {
        tracing::error!("Failed to log password reset attempt: {}", e);
    }
}
