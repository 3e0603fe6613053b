// In-memory providers and a request helper for handler tests.
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    extract::DefaultBodyLimit,
    http::{HeaderMap, Method, Request, StatusCode},
    Router,
};
use chrono::{DateTime, Utc};
use serde_json::Value;
use tower::ServiceExt;

use crate::auth::TokenVerifier;
use crate::identity::{
    AttemptLogEntry, CredentialsUpdate, IdentityAdmin, Profile, ProviderError, RecoveryCredentials,
    RecoveryStore,
};
use crate::mail::{EmailMessage, MailError, Mailer};
use crate::state::{AppState, EmailSettings, Provider};

fn rejected(message: &str) -> ProviderError {
    ProviderError::Status {
        status: 500,
        message: message.to_string(),
    }
}

#[derive(Default)]
pub struct FakeIdentity {
    pub deleted: Mutex<Vec<String>>,
    pub password_updates: Mutex<Vec<(String, String)>>,
    pub fail_delete: bool,
    pub fail_update: Option<String>,
}

#[async_trait]
impl IdentityAdmin for FakeIdentity {
    async fn delete_user(&self, user_id: &str) -> Result<(), ProviderError> {
        if self.fail_delete {
            return Err(rejected("User not found"));
        }
        self.deleted.lock().unwrap().push(user_id.to_string());
        Ok(())
    }

    async fn update_user_password(&self, user_id: &str, password: &str) -> Result<(), ProviderError> {
        if let Some(message) = &self.fail_update {
            return Err(rejected(message));
        }
        self.password_updates
            .lock()
            .unwrap()
            .push((user_id.to_string(), password.to_string()));
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeStore {
    pub profiles: Mutex<HashMap<String, Profile>>,
    pub credentials: Mutex<HashMap<String, RecoveryCredentials>>,
    pub updates: Mutex<Vec<(String, CredentialsUpdate)>>,
    pub touched: Mutex<Vec<(String, DateTime<Utc>)>>,
    pub attempts: Mutex<Vec<AttemptLogEntry>>,
    pub fail_profile_lookup: bool,
    pub fail_credentials_lookup: bool,
    pub fail_update: bool,
    pub fail_log: bool,
}

impl FakeStore {
    pub fn with_profile(self, profile: Profile) -> Self {
        self.profiles.lock().unwrap().insert(profile.username.clone(), profile);
        self
    }

    pub fn with_credentials(self, user_id: &str, credentials: RecoveryCredentials) -> Self {
        self.credentials.lock().unwrap().insert(user_id.to_string(), credentials);
        self
    }

    pub fn attempt_reasons(&self) -> Vec<(bool, Option<String>)> {
        self.attempts
            .lock()
            .unwrap()
            .iter()
            .map(|a| (a.success, a.failure_reason.clone()))
            .collect()
    }
}

#[async_trait]
impl RecoveryStore for FakeStore {
    async fn find_profile(&self, username: &str) -> Result<Option<Profile>, ProviderError> {
        if self.fail_profile_lookup {
            return Err(rejected("profiles unavailable"));
        }
        Ok(self.profiles.lock().unwrap().get(username).cloned())
    }

    async fn find_credentials(&self, user_id: &str) -> Result<Option<RecoveryCredentials>, ProviderError> {
        if self.fail_credentials_lookup {
            return Err(rejected("credentials unavailable"));
        }
        Ok(self.credentials.lock().unwrap().get(user_id).cloned())
    }

    async fn update_credentials(&self, user_id: &str, update: &CredentialsUpdate) -> Result<(), ProviderError> {
        if self.fail_update {
            return Err(rejected("update rejected"));
        }
        self.updates.lock().unwrap().push((user_id.to_string(), update.clone()));
        Ok(())
    }

    async fn touch_profile_after_reset(&self, user_id: &str, at: DateTime<Utc>) -> Result<(), ProviderError> {
        self.touched.lock().unwrap().push((user_id.to_string(), at));
        Ok(())
    }

    async fn log_attempt(&self, entry: &AttemptLogEntry) -> Result<(), ProviderError> {
        if self.fail_log {
            return Err(rejected("log table missing"));
        }
        self.attempts.lock().unwrap().push(entry.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeMailer {
    pub sent: Mutex<Vec<EmailMessage>>,
    pub fail: bool,
}

#[async_trait]
impl Mailer for FakeMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        if self.fail {
            return Err(MailError::Rejected {
                status: 422,
                body: "invalid from address".to_string(),
            });
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

pub const SENDER: &str = "Music Rights <no-reply@example.com>";

/// Router wired to fakes, plus handles to inspect what the handlers did.
pub struct TestApp {
    pub identity: Arc<FakeIdentity>,
    pub store: Arc<FakeStore>,
    pub mailer: Arc<FakeMailer>,
    router: Router,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub text: String,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.text).unwrap_or(Value::Null)
    }
}

impl TestApp {
    pub fn new(identity: FakeIdentity, store: FakeStore, mailer: FakeMailer) -> Self {
        Self::build(identity, store, mailer, true, true, None)
    }

    pub fn identity(identity: FakeIdentity) -> Self {
        Self::new(identity, FakeStore::default(), FakeMailer::default())
    }

    pub fn store(store: FakeStore) -> Self {
        Self::new(FakeIdentity::default(), store, FakeMailer::default())
    }

    pub fn misconfigured() -> Self {
        Self::build(
            FakeIdentity::default(),
            FakeStore::default(),
            FakeMailer::default(),
            false,
            true,
            None,
        )
    }

    pub fn without_email(store: FakeStore) -> Self {
        Self::build(FakeIdentity::default(), store, FakeMailer::default(), true, false, None)
    }

    pub fn with_redirect(store: FakeStore, mailer: FakeMailer, redirect: &str) -> Self {
        Self::build(
            FakeIdentity::default(),
            store,
            mailer,
            true,
            true,
            Some(redirect.to_string()),
        )
    }

    pub fn with_verifier(identity: FakeIdentity, verifier: TokenVerifier) -> Self {
        let mut app = Self::identity(identity);
        let state = AppState {
            provider: Some(Provider {
                admin: app.identity.clone(),
                store: app.store.clone(),
            }),
            email: None,
            fallback_redirect_url: None,
            verifier,
        };
        app.router = crate::app::app(Arc::new(state));
        app
    }

    /// Cap request bodies the way the server binary does.
    pub fn with_body_limit(mut self, limit: usize) -> Self {
        self.router = self.router.layer(DefaultBodyLimit::max(limit));
        self
    }

    fn build(
        identity: FakeIdentity,
        store: FakeStore,
        mailer: FakeMailer,
        with_provider: bool,
        with_email: bool,
        fallback_redirect_url: Option<String>,
    ) -> Self {
        let identity = Arc::new(identity);
        let store = Arc::new(store);
        let mailer = Arc::new(mailer);

        let state = AppState {
            provider: with_provider.then(|| Provider {
                admin: identity.clone(),
                store: store.clone(),
            }),
            email: with_email.then(|| EmailSettings {
                mailer: mailer.clone(),
                sender: SENDER.to_string(),
            }),
            fallback_redirect_url,
            verifier: TokenVerifier::unverified(),
        };

        Self {
            identity,
            store,
            mailer,
            router: crate::app::app(Arc::new(state)),
        }
    }

    pub async fn request(&self, method: Method, path: &str, origin: Option<&str>, body: &str) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(origin) = origin {
            builder = builder.header("Origin", origin);
        }
        let request = builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();

        TestResponse {
            status,
            headers,
            text: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    pub async fn post(&self, path: &str, body: &str) -> TestResponse {
        self.request(Method::POST, path, None, body).await
    }
}

/// Unsigned token whose payload segment is `payload`.
pub fn unsigned_token(payload: &Value) -> String {
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let body = URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{}.{}.signature", header, body)
}
