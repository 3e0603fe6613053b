use std::time::Duration;

use serde_json::{json, Value};

use crate::cli::utils::{output_error, output_success};
use crate::cli::OutputFormat;

pub async fn handle(url: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let client = reqwest::Client::new();
    let health_url = format!("{}/health", url.trim_end_matches('/'));

    match client.get(&health_url).timeout(Duration::from_secs(5)).send().await {
        Ok(response) if response.status().is_success() => {
            let body = response.json::<Value>().await.unwrap_or(Value::Null);
            output_success(output_format, &format!("{} is up", url), Some(json!({ "health": body })))
        }
        Ok(response) => {
            output_error(output_format, &format!("{} answered {}", url, response.status()), Some("unhealthy"))?;
            anyhow::bail!("service unhealthy")
        }
        Err(e) => {
            output_error(output_format, &format!("{} unreachable: {}", url, e), Some("unreachable"))?;
            anyhow::bail!("service unreachable")
        }
    }
}
