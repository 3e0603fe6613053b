// Identity provider seams: privileged user administration and the recovery
// tables that live next to the auth schema.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod supabase;

pub use supabase::SupabaseClient;

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("identity provider URL is invalid: {0}")]
    InvalidUrl(String),
    #[error("request to identity provider failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("identity provider returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("unexpected identity provider response: {0}")]
    Decode(String),
}

impl ProviderError {
    /// Provider-supplied message, when the provider answered at all.
    pub fn provider_message(&self) -> Option<&str> {
        match self {
            ProviderError::Status { message, .. } if !message.is_empty() => Some(message),
            _ => None,
        }
    }
}

/// Privileged user administration. Calls run with the service credential,
/// never with a user session.
#[async_trait]
pub trait IdentityAdmin: Send + Sync {
    async fn delete_user(&self, user_id: &str) -> Result<(), ProviderError>;

    async fn update_user_password(&self, user_id: &str, password: &str) -> Result<(), ProviderError>;
}

/// Access to the profile and recovery-credential tables.
#[async_trait]
pub trait RecoveryStore: Send + Sync {
    async fn find_profile(&self, username: &str) -> Result<Option<Profile>, ProviderError>;

    async fn find_credentials(&self, user_id: &str) -> Result<Option<RecoveryCredentials>, ProviderError>;

    async fn update_credentials(&self, user_id: &str, update: &CredentialsUpdate) -> Result<(), ProviderError>;

    async fn touch_profile_after_reset(&self, user_id: &str, at: DateTime<Utc>) -> Result<(), ProviderError>;

    async fn log_attempt(&self, entry: &AttemptLogEntry) -> Result<(), ProviderError>;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub recovery_email: Option<String>,
}

/// Row of `user_recovery_credentials`. Hashes are lowercase hex SHA-256.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecoveryCredentials {
    #[serde(default)]
    pub recovery_codes_hash: Option<Vec<String>>,
    #[serde(default)]
    pub used_recovery_codes: Option<Vec<String>>,
    #[serde(default)]
    pub security_answer_1_hash: Option<String>,
    #[serde(default)]
    pub security_answer_2_hash: Option<String>,
    #[serde(default)]
    pub email_recovery_token_hash: Option<String>,
    #[serde(default)]
    pub email_recovery_token_expires_at: Option<String>,
    #[serde(default)]
    pub email_recovery_token_sent_at: Option<String>,
    #[serde(default)]
    pub email_recovery_attempts: Option<i64>,
    #[serde(default)]
    pub recovery_email_verified: Option<bool>,
}

/// Partial update of a credentials row; unset fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CredentialsUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_recovery_token_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_recovery_token_expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_recovery_token_sent_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_recovery_attempts: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recovery_email_verified: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recovery_email_verified_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used_recovery_codes: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttemptLogEntry {
    pub username: String,
    pub attempt_type: &'static str,
    pub success: bool,
    pub failure_reason: Option<String>,
    pub user_agent: &'static str,
    pub ip_address: &'static str,
}

impl AttemptLogEntry {
    pub fn password_reset(username: &str, success: bool, failure_reason: Option<&str>) -> Self {
        Self {
            username: username.to_string(),
            attempt_type: "password_reset",
            success,
            failure_reason: failure_reason.map(str::to_string),
            user_agent: "edge-function",
            ip_address: "edge",
        }
    }
}
