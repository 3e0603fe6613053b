// Password recovery primitives shared by the recovery functions.
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use sha2::{Digest, Sha256};
use url::Url;
use uuid::Uuid;

use crate::mail::EmailMessage;

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Minimum gap between two recovery emails for the same account.
pub fn email_throttle_window() -> Duration {
    Duration::seconds(60)
}

/// Lifetime of an emailed recovery token.
pub fn email_token_ttl() -> Duration {
    Duration::minutes(30)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryMethod {
    Questions,
    Code,
}

impl RecoveryMethod {
    /// Unknown methods fall back to security questions.
    pub fn parse(raw: &str) -> Self {
        match raw.to_lowercase().as_str() {
            "code" => RecoveryMethod::Code,
            _ => RecoveryMethod::Questions,
        }
    }
}

/// Lowercase hex SHA-256 of `value`.
pub fn hash_hex(value: &str) -> String {
    let digest = Sha256::digest(value.as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

pub fn hash_answer(answer: &str) -> String {
    hash_hex(answer.to_lowercase().trim())
}

pub fn hash_recovery_code(code: &str) -> String {
    hash_hex(&code.trim().to_uppercase())
}

/// 64 hex characters from two random v4 UUIDs.
pub fn generate_token() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

/// Parse a timestamp as stored by the data API. Unparsable values yield
/// `None` and are treated as absent by callers.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}

pub fn is_throttled(last_sent_at: Option<&str>, now: DateTime<Utc>) -> bool {
    last_sent_at
        .and_then(parse_timestamp)
        .map(|sent| now - sent < email_throttle_window())
        .unwrap_or(false)
}

pub fn is_expired(expires_at: Option<&str>, now: DateTime<Utc>) -> bool {
    expires_at
        .and_then(parse_timestamp)
        .map(|expires| now > expires)
        .unwrap_or(false)
}

pub fn normalize_locale(raw: &str) -> String {
    let locale = if raw.is_empty() { "en" } else { raw };
    locale.chars().take(5).collect()
}

/// Reset link: the redirect target with `token`, `username` and `locale`
/// set, replacing any existing values for those keys.
pub fn build_reset_link(redirect: &Url, token: &str, username: &str, locale: &str) -> String {
    const KEYS: [&str; 3] = ["token", "username", "locale"];

    let mut link = redirect.clone();
    let kept: Vec<(String, String)> = redirect
        .query_pairs()
        .filter(|(k, _)| !KEYS.contains(&k.as_ref()))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    link.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair("token", token)
        .append_pair("username", username)
        .append_pair("locale", locale);

    link.to_string()
}

pub fn recovery_email(from: &str, to: &str, display_name: Option<&str>, username: &str, reset_link: &str) -> EmailMessage {
    let name = display_name.filter(|n| !n.is_empty()).unwrap_or(username);

    let html = format!(
        r#"
  <div style="font-family: Arial, sans-serif; line-height: 1.5; color: #111827;">
    <h2 style="color: #111827;">Password recovery request</h2>
    <p>Hi {name},</p>
    <p>We received a request to reset the password for your Music Rights Platform account.</p>
    <p style="margin-top: 16px; margin-bottom: 16px;">
      <a href="{link}" style="display: inline-block; padding: 12px 16px; background-color: #111827; color: #ffffff; text-decoration: none; border-radius: 8px;">
        Reset your password
      </a>
    </p>
    <p>If you did not request a password reset, you can safely ignore this email.</p>
    <p style="margin-top: 24px; color: #6b7280; font-size: 12px;">This link expires in 30 minutes.</p>
  </div>
"#,
        name = escape_html(name),
        link = escape_html(reset_link),
    );

    let text = [
        format!("Hi {},", name),
        String::new(),
        "We received a request to reset the password for your Music Rights Platform account.".to_string(),
        String::new(),
        format!("Reset your password: {}", reset_link),
        String::new(),
        "If you did not request this, you can ignore this email.".to_string(),
        String::new(),
        "This link expires in 30 minutes.".to_string(),
    ]
    .join("\n");

    EmailMessage {
        from: from.to_string(),
        to: vec![to.to_string()],
        subject: "Reset your Music Rights Platform password".to_string(),
        html,
        text,
    }
}

fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
