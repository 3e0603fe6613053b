use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

/// Successful completion of a function: `{"success": true}` with 200 OK.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Success;

impl IntoResponse for Success {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(json!({ "success": true }))).into_response()
    }
}

/// Body returned to CORS preflight requests.
#[derive(Debug, Clone, Copy)]
pub struct PreflightOk;

impl IntoResponse for PreflightOk {
    fn into_response(self) -> Response {
        (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            "ok",
        )
            .into_response()
    }
}

pub type ApiResult = Result<Success, crate::error::ApiError>;
