use axum::{
    handler::Handler,
    middleware,
    routing::{get, post, MethodRouter},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware::cors_headers;
use crate::state::SharedState;

pub fn app(state: SharedState) -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        // Functions, also reachable under the hosted functions prefix
        .merge(function_routes())
        .nest("/functions/v1", function_routes())
        .with_state(state)
        // Global middleware
        .layer(middleware::from_fn(cors_headers))
        .layer(TraceLayer::new_for_http())
}

fn function_routes() -> Router<SharedState> {
    use handlers::recovery;

    Router::new()
        .route("/delete-user", function(handlers::delete_user))
        .route("/send-recovery-email", function(recovery::send_recovery_email))
        .route("/verify-recovery-token", function(recovery::verify_recovery_token))
        .route("/complete-recovery", function(recovery::complete_recovery))
}

/// POST handler with CORS preflight and a JSON 405 for every other method.
fn function<H, T>(handler: H) -> MethodRouter<SharedState>
where
    H: Handler<T, SharedState>,
    T: 'static,
{
    post(handler)
        .options(handlers::preflight)
        .fallback(handlers::method_not_allowed)
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Account Functions",
            "version": version,
            "endpoints": {
                "delete_user": "POST /delete-user",
                "send_recovery_email": "POST /send-recovery-email",
                "verify_recovery_token": "POST /verify-recovery-token",
                "complete_recovery": "POST /complete-recovery",
                "health": "GET /health"
            }
        }
    }))
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now()
    }))
}
