use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Claims carried in the payload segment of an access token.
///
/// Known claims of an unexpected JSON type read as absent, so only the
/// subject decides whether a decodable payload is usable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenClaims {
    #[serde(default, deserialize_with = "lenient")]
    pub sub: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub role: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub exp: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

impl TokenClaims {
    /// The subject claim, which must be a non-empty string.
    pub fn subject(&self) -> Result<&str, TokenError> {
        match self.sub.as_deref() {
            Some(sub) if !sub.is_empty() => Ok(sub),
            _ => Err(TokenError::MissingSubject),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token must have three segments, found {0}")]
    Malformed(usize),
    #[error("payload segment is not valid base64url: {0}")]
    Encoding(#[from] base64::DecodeError),
    #[error("payload segment is not a JSON claims object: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("token has no subject claim")]
    MissingSubject,
    #[error("token signature rejected: {0}")]
    Signature(#[from] jsonwebtoken::errors::Error),
}

/// Split the token and decode its payload segment without checking the
/// signature.
pub fn decode_unverified(token: &str) -> Result<TokenClaims, TokenError> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(TokenError::Malformed(parts.len()));
    }

    // Accept padded input and the standard alphabet as well as base64url.
    let normalized: String = parts[1]
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();

    let bytes = URL_SAFE_NO_PAD.decode(normalized.as_bytes())?;
    let claims = serde_json::from_slice::<TokenClaims>(&bytes)?;
    Ok(claims)
}

/// Resolves the subject of a bearer token.
///
/// With a secret configured the HS256 signature and expiry are checked
/// before the subject is trusted. Without one the payload is only decoded.
#[derive(Clone)]
pub struct TokenVerifier {
    key: Option<DecodingKey>,
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("verifies_signature", &self.verifies_signature())
            .finish()
    }
}

impl TokenVerifier {
    pub fn new(secret: Option<&str>) -> Self {
        Self {
            key: secret
                .filter(|s| !s.is_empty())
                .map(|s| DecodingKey::from_secret(s.as_bytes())),
        }
    }

    pub fn unverified() -> Self {
        Self { key: None }
    }

    pub fn verifies_signature(&self) -> bool {
        self.key.is_some()
    }

    pub fn claims(&self, token: &str) -> Result<TokenClaims, TokenError> {
        match &self.key {
            None => decode_unverified(token),
            Some(key) => {
                let mut validation = Validation::new(Algorithm::HS256);
                validation.validate_aud = false;
                let data = decode::<TokenClaims>(token, key, &validation)?;
                Ok(data.claims)
            }
        }
    }

    pub fn subject(&self, token: &str) -> Result<String, TokenError> {
        let claims = self.claims(token)?;
        claims.subject().map(str::to_string)
    }
}
