// handlers/mod.rs - Function handlers
//
// Every function shares the same envelope: OPTIONS answers the preflight,
// anything but POST is rejected, and provider-backed work requires the
// service credential to be configured.
use axum::{body::Bytes, extract::rejection::BytesRejection};
use serde_json::Value;

use crate::error::ApiError;
use crate::middleware::PreflightOk;
use crate::state::{AppState, Provider};

pub mod delete_user;
pub mod recovery;

pub use delete_user::delete_user;

pub async fn preflight() -> PreflightOk {
    PreflightOk
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

pub(crate) fn require_provider(state: &AppState) -> Result<&Provider, ApiError> {
    state.provider.as_ref().ok_or_else(|| {
        tracing::error!("Missing Supabase configuration");
        ApiError::ServerMisconfigured
    })
}

/// Request body as the functions see it. A body that could not be read,
/// for example one over the size limit, is handled like an unparsable one.
pub type RawBody = Result<Bytes, BytesRejection>;

/// Parse a JSON request body. Recovery functions reject bodies that do not
/// parse.
pub(crate) fn parse_json_body(body: &RawBody) -> Result<Value, ApiError> {
    let bytes = body.as_ref().map_err(|e| {
        tracing::warn!("Unreadable request body: {}", e);
        ApiError::InvalidPayload
    })?;

    serde_json::from_slice(bytes).map_err(|e| {
        tracing::debug!("Rejected request body: {}", e);
        ApiError::InvalidPayload
    })
}

/// Read `key` as text: strings verbatim, scalars in their JSON spelling,
/// null or missing as the empty string.
pub(crate) fn field_string(body: &Value, key: &str) -> String {
    match body.get(key) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
