use std::sync::Arc;
use std::time::Duration;

use crate::auth::TokenVerifier;
use crate::config::AppConfig;
use crate::identity::{IdentityAdmin, RecoveryStore, SupabaseClient};
use crate::mail::{Mailer, ResendMailer};

/// Privileged identity-provider handles. Absent when the provider URL or
/// service credential is not configured.
#[derive(Clone)]
pub struct Provider {
    pub admin: Arc<dyn IdentityAdmin>,
    pub store: Arc<dyn RecoveryStore>,
}

#[derive(Clone)]
pub struct EmailSettings {
    pub mailer: Arc<dyn Mailer>,
    pub sender: String,
}

pub struct AppState {
    pub provider: Option<Provider>,
    pub email: Option<EmailSettings>,
    pub fallback_redirect_url: Option<String>,
    pub verifier: TokenVerifier,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    /// Build handles from configuration. Misconfiguration is logged here and
    /// reported per request by the functions that need the missing piece.
    pub fn from_config(config: &AppConfig) -> SharedState {
        let timeout = Duration::from_secs(config.http.timeout_secs);

        let provider = match config.supabase.credentials() {
            Some((url, key)) => match SupabaseClient::new(url, key, timeout) {
                Ok(client) => {
                    let client = Arc::new(client);
                    Some(Provider {
                        admin: client.clone(),
                        store: client,
                    })
                }
                Err(e) => {
                    tracing::error!("Invalid Supabase configuration: {}", e);
                    None
                }
            },
            None => {
                tracing::warn!("Missing Supabase environment variables; provider-backed functions will report server_misconfigured");
                None
            }
        };

        let email = match (&config.email.resend_api_key, &config.email.sender) {
            (Some(key), Some(sender)) if config.email.is_configured() => {
                match ResendMailer::new(&config.email.resend_api_url, key, timeout) {
                    Ok(mailer) => Some(EmailSettings {
                        mailer: Arc::new(mailer),
                        sender: sender.clone(),
                    }),
                    Err(e) => {
                        tracing::error!("Failed to build email client: {}", e);
                        None
                    }
                }
            }
            _ => None,
        };

        let verifier = TokenVerifier::new(config.supabase.jwt_secret.as_deref());
        if !verifier.verifies_signature() {
            tracing::warn!("SUPABASE_JWT_SECRET not set; bearer token signatures are not verified");
        }

        Arc::new(Self {
            provider,
            email,
            fallback_redirect_url: config.email.fallback_redirect_url.clone(),
            verifier,
        })
    }
}
