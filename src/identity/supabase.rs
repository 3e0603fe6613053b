use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use url::Url;

use super::{
    AttemptLogEntry, CredentialsUpdate, IdentityAdmin, Profile, ProviderError, RecoveryCredentials,
    RecoveryStore,
};

const PROFILE_COLUMNS: &str = "id,username,display_name,recovery_email";
const CREDENTIAL_COLUMNS: &str = "recovery_codes_hash,used_recovery_codes,security_answer_1_hash,security_answer_2_hash,email_recovery_token_hash,email_recovery_token_expires_at,email_recovery_token_sent_at,email_recovery_attempts,recovery_email_verified";

/// Service-role client for the Supabase auth admin API and the PostgREST
/// data API. Holds no session state.
#[derive(Clone)]
pub struct SupabaseClient {
    http: reqwest::Client,
    base: Url,
    service_key: String,
}

impl std::fmt::Debug for SupabaseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseClient").field("base", &self.base.as_str()).finish()
    }
}

impl SupabaseClient {
    pub fn new(base_url: &str, service_key: &str, timeout: Duration) -> Result<Self, ProviderError> {
        let base = Url::parse(base_url).map_err(|e| ProviderError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if base.cannot_be_a_base() {
            return Err(ProviderError::InvalidUrl(base_url.to_string()));
        }

        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base,
            service_key: service_key.to_string(),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }

    fn admin_user(&self, method: Method, user_id: &str) -> RequestBuilder {
        self.request(method, self.endpoint(&["auth", "v1", "admin", "users", user_id]))
    }

    fn table(&self, method: Method, table: &str) -> RequestBuilder {
        self.request(method, self.endpoint(&["rest", "v1", table]))
    }

    async fn select_first<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<Option<T>, ProviderError> {
        let response = ensure_success(request.send().await?).await?;
        let rows: Vec<T> = response
            .json()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))?;
        Ok(rows.into_iter().next())
    }
}

/// Turn a non-2xx answer into `ProviderError::Status`, keeping the
/// provider's own message where one can be found.
async fn ensure_success(response: Response) -> Result<Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ProviderError::Status {
        status: status.as_u16(),
        message: error_message(&body),
    })
}

fn error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        for key in ["msg", "message", "error_description", "error"] {
            if let Some(message) = value.get(key).and_then(Value::as_str) {
                return message.to_string();
            }
        }
    }
    body.trim().to_string()
}

#[async_trait]
impl IdentityAdmin for SupabaseClient {
    async fn delete_user(&self, user_id: &str) -> Result<(), ProviderError> {
        let response = self
            .admin_user(Method::DELETE, user_id)
            .json(&json!({ "should_soft_delete": false }))
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn update_user_password(&self, user_id: &str, password: &str) -> Result<(), ProviderError> {
        let response = self
            .admin_user(Method::PUT, user_id)
            .json(&json!({ "password": password }))
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }
}

#[async_trait]
impl RecoveryStore for SupabaseClient {
    async fn find_profile(&self, username: &str) -> Result<Option<Profile>, ProviderError> {
        let request = self.table(Method::GET, "profiles").query(&[
            ("select", PROFILE_COLUMNS.to_string()),
            ("username", format!("eq.{}", username)),
            ("limit", "1".to_string()),
        ]);
        self.select_first(request).await
    }

    async fn find_credentials(&self, user_id: &str) -> Result<Option<RecoveryCredentials>, ProviderError> {
        let request = self.table(Method::GET, "user_recovery_credentials").query(&[
            ("select", CREDENTIAL_COLUMNS.to_string()),
            ("user_id", format!("eq.{}", user_id)),
            ("limit", "1".to_string()),
        ]);
        self.select_first(request).await
    }

    async fn update_credentials(&self, user_id: &str, update: &CredentialsUpdate) -> Result<(), ProviderError> {
        let response = self
            .table(Method::PATCH, "user_recovery_credentials")
            .query(&[("user_id", format!("eq.{}", user_id))])
            .header("Prefer", "return=minimal")
            .json(update)
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn touch_profile_after_reset(&self, user_id: &str, at: DateTime<Utc>) -> Result<(), ProviderError> {
        let response = self
            .table(Method::PATCH, "profiles")
            .query(&[("id", format!("eq.{}", user_id))])
            .header("Prefer", "return=minimal")
            .json(&json!({
                "last_password_change_at": at,
                "failed_login_attempts": 0
            }))
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn log_attempt(&self, entry: &AttemptLogEntry) -> Result<(), ProviderError> {
        let response = self
            .table(Method::POST, "auth_attempt_log")
            .header("Prefer", "return=minimal")
            .json(entry)
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }
}
