use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::relay::RelayService;

/// `GET /`: service metadata.
pub async fn index(State(relay): State<Arc<RelayService>>) -> Json<Value> {
    let config = relay.config();
    let (entries, capacity) = relay.cache_usage().await;
    Json(json!({
        "status": "online",
        "service": "Roblox AI Code Generator",
        "version": env!("CARGO_PKG_VERSION"),
        "default_mode": config.effective_default_mode(),
        "models": {
            "default": config.default_model,
            "fast": config.fast_model,
            "full": config.full_model,
            "fallbacks": config.fallback_models,
        },
        "cache": {
            "capacity": capacity,
            "entries": entries,
        },
    }))
}

/// `GET /health`: liveness only, never touches the provider.
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}
