use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub supabase: SupabaseConfig,
    pub email: EmailConfig,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_request_size_bytes: usize,
}

/// Identity provider settings. Both values must be present for any
/// function that talks to the provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SupabaseConfig {
    pub url: Option<String>,
    #[serde(skip_serializing)]
    pub service_role_key: Option<String>,
    #[serde(skip_serializing)]
    pub jwt_secret: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    #[serde(skip_serializing)]
    pub resend_api_key: Option<String>,
    pub resend_api_url: String,
    pub sender: Option<String>,
    pub fallback_redirect_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub timeout_secs: u64,
}

impl SupabaseConfig {
    /// Returns `(url, service_role_key)` when both are set and non-empty.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.url.as_deref(), self.service_role_key.as_deref()) {
            (Some(url), Some(key)) if !url.is_empty() && !key.is_empty() => Some((url, key)),
            _ => None,
        }
    }
}

impl EmailConfig {
    pub fn is_configured(&self) -> bool {
        non_empty(&self.resend_api_key).is_some() && non_empty(&self.sender).is_some()
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Some(port) = env::var("ACCOUNT_FUNCTIONS_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.server.port = port;
        }
        if let Ok(v) = env::var("ACCOUNT_FUNCTIONS_HOST") {
            self.server.host = v;
        }
        if let Ok(v) = env::var("MAX_REQUEST_SIZE_BYTES") {
            self.server.max_request_size_bytes = v.parse().unwrap_or(self.server.max_request_size_bytes);
        }

        // Identity provider
        self.supabase.url = env_non_empty("SUPABASE_URL");
        self.supabase.service_role_key = env_non_empty("SUPABASE_SERVICE_ROLE_KEY")
            .or_else(|| env_non_empty("SUPABASE_SERVICE_KEY"))
            .or_else(|| env_non_empty("SERVICE_ROLE_KEY"));
        self.supabase.jwt_secret = env_non_empty("SUPABASE_JWT_SECRET");

        // Email provider
        self.email.resend_api_key = env_non_empty("RESEND_API_KEY");
        self.email.sender = env_non_empty("RECOVERY_EMAIL_FROM");
        self.email.fallback_redirect_url = env_non_empty("RECOVERY_EMAIL_REDIRECT_URL");
        if let Some(v) = env_non_empty("RESEND_API_URL") {
            self.email.resend_api_url = v;
        }

        // Outbound HTTP
        if let Ok(v) = env::var("HTTP_TIMEOUT_SECS") {
            self.http.timeout_secs = v.parse().unwrap_or(self.http.timeout_secs);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
                max_request_size_bytes: 1024 * 1024, // 1MB
            },
            supabase: SupabaseConfig::default(),
            email: EmailConfig::unset(),
            http: HttpConfig { timeout_secs: 30 },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
                max_request_size_bytes: 256 * 1024,
            },
            supabase: SupabaseConfig::default(),
            email: EmailConfig::unset(),
            http: HttpConfig { timeout_secs: 15 },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
                max_request_size_bytes: 64 * 1024,
            },
            supabase: SupabaseConfig::default(),
            email: EmailConfig::unset(),
            http: HttpConfig { timeout_secs: 10 },
        }
    }
}

impl EmailConfig {
    fn unset() -> Self {
        Self {
            resend_api_key: None,
            resend_api_url: "https://api.resend.com".to_string(),
            sender: None,
            fallback_redirect_url: None,
        }
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

pub fn config() -> &'static AppConfig {
    &CONFIG
}
