use axum::{Extension, response::Json};
use serde_json::{Value, json};

use crate::api::CallbackState;

/// Liveness probe for the callback server; also tells whether a consent
/// redirect is still expected.
pub async fn health(Extension(state): Extension<CallbackState>) -> Json<Value> {
    let awaiting_callback = state.lock().await.is_some();
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "awaiting_callback": awaiting_callback,
    }))
}
