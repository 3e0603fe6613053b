#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use reqwest::StatusCode;
use serde_json::Value;

pub const SERVICE_KEY: &str = "service-role-key";

const PROVIDER_VARS: [&str; 10] = [
    "SUPABASE_URL",
    "SUPABASE_SERVICE_ROLE_KEY",
    "SUPABASE_SERVICE_KEY",
    "SERVICE_ROLE_KEY",
    "SUPABASE_JWT_SECRET",
    "RESEND_API_KEY",
    "RESEND_API_URL",
    "RECOVERY_EMAIL_FROM",
    "RECOVERY_EMAIL_REDIRECT_URL",
    "PORT",
];

/// A server process owned by one test; killed on drop.
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    fn spawn(envs: &[(&str, &str)]) -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let mut cmd = Command::new(env!("CARGO_BIN_EXE_account-functions"));
        for var in PROVIDER_VARS {
            cmd.env_remove(var);
        }
        cmd.env("APP_ENV", "development")
            .env("ACCOUNT_FUNCTIONS_HOST", "127.0.0.1")
            .env("ACCOUNT_FUNCTIONS_PORT", port.to_string())
            .envs(envs.iter().copied())
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

pub async fn start_server(envs: &[(&str, &str)]) -> Result<TestServer> {
    let server = TestServer::spawn(envs)?;
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

/// Server wired to a mock identity provider at `provider_url`.
pub async fn start_with_provider(provider_url: &str) -> Result<TestServer> {
    start_server(&[("SUPABASE_URL", provider_url), ("SUPABASE_SERVICE_ROLE_KEY", SERVICE_KEY)]).await
}

/// Unsigned token carrying `payload` as its claims.
pub fn unsigned_token(payload: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let body = URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{}.{}.signature", header, body)
}
