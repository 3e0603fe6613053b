pub mod cors;
pub mod response;

pub use cors::cors_headers;
pub use response::{ApiResult, PreflightOk, Success};
