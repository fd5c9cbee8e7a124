//! HTTP surface for the Studio plugin.
//!
//! - `GET /` → service metadata
//! - `GET /health` → liveness, independent of the provider
//! - `POST /generate` → structured scripts
//! - `POST /generate-simple` → plain Luau code

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::relay::RelayService;

pub mod generate;
pub mod meta;

pub fn router(relay: Arc<RelayService>) -> Router {
    Router::new()
        .route("/", get(meta::index))
        .route("/health", get(meta::health))
        .route("/generate", post(generate::generate))
        .route("/generate-simple", post(generate::generate_simple))
        // Studio plugins and browser tools call from arbitrary origins
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(relay)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RelayConfig;
    use crate::error::InvokeError;
    use crate::provider::{ChatMessage, ChatProvider};
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    /// Fails the test if the provider is ever contacted.
    struct UnreachableProvider;

    #[async_trait]
    impl ChatProvider for UnreachableProvider {
        async fn complete(
            &self,
            model: &str,
            _messages: &[ChatMessage],
            _temperature: f32,
            _max_tokens: u32,
        ) -> Result<String, InvokeError> {
            panic!("provider contacted for model {model}");
        }
    }

    /// Replies with the same text for every model.
    struct EchoProvider(&'static str);

    #[async_trait]
    impl ChatProvider for EchoProvider {
        async fn complete(
            &self,
            _model: &str,
            _messages: &[ChatMessage],
            _temperature: f32,
            _max_tokens: u32,
        ) -> Result<String, InvokeError> {
            Ok(self.0.to_string())
        }
    }

    /// Every model answers with a 502.
    struct DownProvider;

    #[async_trait]
    impl ChatProvider for DownProvider {
        async fn complete(
            &self,
            model: &str,
            _messages: &[ChatMessage],
            _temperature: f32,
            _max_tokens: u32,
        ) -> Result<String, InvokeError> {
            Err(InvokeError::Provider {
                status: 502,
                excerpt: format!("{model} is down"),
            })
        }
    }

    fn app_with(provider: Arc<dyn ChatProvider>) -> Router {
        let config = RelayConfig {
            api_key: Some("sk-test".into()),
            fallback_models: vec!["backup/model".into()],
            ..RelayConfig::default()
        };
        router(Arc::new(RelayService::new(Arc::new(config), provider)))
    }

    async fn call(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        (status, serde_json::from_slice(&bytes).expect("json body"))
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health_never_contacts_provider() {
        let app = app_with(Arc::new(UnreachableProvider));
        let (status, body) = call(app, get_req("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "healthy"}));
    }

    #[tokio::test]
    async fn test_index_reports_models() {
        let app = app_with(Arc::new(UnreachableProvider));
        let (status, body) = call(app, get_req("/")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "online");
        assert_eq!(body["default_mode"], "fast");
        assert_eq!(body["models"]["fallbacks"], json!(["backup/model"]));
        assert_eq!(body["cache"]["entries"], 0);
        assert_eq!(body["cache"]["capacity"], 100);
    }

    #[tokio::test]
    async fn test_generate_empty_prompt_is_400() {
        let app = app_with(Arc::new(UnreachableProvider));
        let bodies = [
            json!({"prompt": ""}),
            json!({"prompt": "   "}),
            json!({}),
            json!({"prompt": 5}),
        ];
        for body in bodies {
            let (status, body) = call(app.clone(), post_json("/generate", body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["success"], false);
            assert!(body["error"].is_string());
        }
    }

    #[tokio::test]
    async fn test_generate_malformed_body_is_400() {
        let request = Request::builder()
            .method("POST")
            .uri("/generate")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = call(app_with(Arc::new(UnreachableProvider)), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_generate_success_then_cached() {
        let app = app_with(Arc::new(EchoProvider(
            r#"Sure! [{"scriptName":"Coins","scriptType":"ModuleScript","parent":"ReplicatedStorage","code":"return {}"}]"#,
        )));
        let request = || {
            post_json(
                "/generate",
                json!({"prompt": "coin system", "mode": "full", "max_tokens": 900}),
            )
        };

        let (status, body) = call(app.clone(), request()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["mode"], "full");
        assert_eq!(body["cached"], false);
        assert_eq!(body["model"], crate::config::DEFAULT_MODEL);
        assert_eq!(body["scripts"][0]["scriptName"], "Coins");
        assert_eq!(body["scripts"][0]["parent"], "ReplicatedStorage");
        assert!(body["elapsed_ms"].is_u64());

        let (_, again) = call(app, request()).await;
        assert_eq!(again["cached"], true);
        assert_eq!(again["scripts"], body["scripts"]);
    }

    #[tokio::test]
    async fn test_generate_exhausted_fallbacks_is_500() {
        let (status, body) = call(
            app_with(Arc::new(DownProvider)),
            post_json("/generate", json!({"prompt": "anything"})),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
        let error = body["error"].as_str().unwrap();
        assert!(error.contains("backup/model is down"), "{error}");
        assert!(body["elapsed_ms"].is_u64());
    }

    #[tokio::test]
    async fn test_generate_without_api_key_is_500() {
        let config = Arc::new(RelayConfig::default());
        let provider = crate::provider::OpenRouterClient::new(&config).unwrap();
        let app = router(Arc::new(RelayService::new(config, Arc::new(provider))));

        let (status, body) = call(app, post_json("/generate", json!({"prompt": "door"}))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().contains("OPENROUTER_API_KEY"));
    }

    #[tokio::test]
    async fn test_generate_simple_strips_fences() {
        let app = app_with(Arc::new(EchoProvider("```lua\nprint(1)\n```")));
        let request = post_json("/generate-simple", json!({"prompt": "print one"}));
        let (status, body) = call(app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["code"], "print(1)");
    }

    #[tokio::test]
    async fn test_generate_simple_requires_prompt() {
        let app = app_with(Arc::new(UnreachableProvider));
        let (status, body) = call(app, post_json("/generate-simple", json!({"prompt": ""}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_cors_preflight() {
        let request = Request::builder()
            .method("OPTIONS")
            .uri("/generate")
            .header("origin", "https://www.roblox.com")
            .header("access-control-request-method", "POST")
            .body(Body::empty())
            .unwrap();
        let response = app_with(Arc::new(UnreachableProvider))
            .oneshot(request)
            .await
            .unwrap();
        assert!(response.status().is_success());
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
    }
}
