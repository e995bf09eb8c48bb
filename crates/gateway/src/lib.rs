//! HTTP API gateway for DocIA.
//!
//! Exposes the answering pipeline over REST:
//! - `POST /ask`    — retrieval-augmented answer `{text, language}` → `{answer}`
//! - `POST /chat`   — keyword fallback `{message}` → `{response, timestamp}`
//! - `GET  /health` — service and model load status
//!
//! Built on Axum. The `Assistant` is constructed once and shared by `Arc`.

pub mod api;

use axum::extract::DefaultBodyLimit;
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use docia_assistant::Assistant;
use docia_core::Language;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

/// Shared application state for the gateway.
pub struct GatewayState {
    pub assistant: Arc<Assistant>,
    /// Answer language when a request does not name one
    pub default_language: Language,
}

pub type SharedState = Arc<GatewayState>;

impl GatewayState {
    pub fn new(assistant: Arc<Assistant>, default_language: Language) -> SharedState {
        Arc::new(Self {
            assistant,
            default_language,
        })
    }
}

/// Build the Axum router with all gateway routes.
///
/// Layers applied:
/// - CORS for the configured origins (`*` allows any)
/// - Request body size limit (1 MB)
/// - HTTP trace logging
pub fn build_router(state: SharedState, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/ask", post(api::ask_handler))
        .route("/chat", post(api::chat_handler))
        .route("/health", get(api::health_handler))
        .with_state(state)
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(cors_layer(cors_origins))
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|o| match o.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(origin = %o, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(3600))
}

/// Start the gateway HTTP server.
///
/// Loads the knowledge base and models once, then serves until shutdown.
pub async fn start(config: docia_config::AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let cors_origins = config.gateway.cors_origins.clone();
    let default_language = config.default_language;

    let assistant = Arc::new(Assistant::load(config).await?);
    let status = assistant.model_status();
    if !status.loaded {
        warn!("Serving without a generation engine; /ask will report the assistant unavailable");
    }

    let app = build_router(GatewayState::new(assistant, default_language), &cors_origins);

    info!(
        addr = %addr,
        model = status.model.as_deref().unwrap_or("none"),
        "Gateway starting"
    );
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{AskResponse, ChatResponse, ErrorResponse, HealthResponse};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use docia_assistant::Retriever;
    use docia_core::error::{EmbeddingError, GenerationError};
    use docia_core::{Embedder, GenerationParams, Generator, KnowledgeBase, KnowledgeEntry};
    use docia_providers::HashEmbedder;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    /// A mock generator that echoes the prompt followed by a fixed reply.
    struct MockGenerator {
        reply: String,
    }

    #[async_trait]
    impl Generator for MockGenerator {
        fn model_id(&self) -> &str {
            "mock-model"
        }

        async fn generate(
            &self,
            prompt: &str,
            _params: &GenerationParams,
        ) -> Result<String, GenerationError> {
            Ok(format!("{prompt} {}", self.reply))
        }
    }

    struct FailingEmbedder;

    impl Embedder for FailingEmbedder {
        fn name(&self) -> &str {
            "failing"
        }
        fn dimension(&self) -> usize {
            8
        }
        fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
            Err(EmbeddingError::Inference("encoder offline".into()))
        }
    }

    fn knowledge() -> Arc<KnowledgeBase> {
        Arc::new(KnowledgeBase::from_entries(vec![
            KnowledgeEntry::new("malaria", Language::En)
                .with_attribute("symptoms", "fever chills headache"),
            KnowledgeEntry::new("paludisme", Language::Fr)
                .with_attribute("symptomes", "fièvre frissons maux de tête"),
        ]))
    }

    fn app_with(embedder: Arc<dyn Embedder>, generator: Option<Arc<dyn Generator>>) -> Router {
        let assistant = Assistant::new(Retriever::new(knowledge(), embedder), generator);
        build_router(
            GatewayState::new(Arc::new(assistant), Language::Fr),
            &["*".to_string()],
        )
    }

    fn test_app() -> Router {
        app_with(
            Arc::new(HashEmbedder::default()),
            Some(Arc::new(MockGenerator {
                reply: "I'm not a doctor. ⚠️ Consult a real doctor".into(),
            })),
        )
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn health_endpoint() {
        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let response = test_app().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let health: HealthResponse = body_json(response).await;
        assert_eq!(health.status, "healthy");
        assert_eq!(health.service, "DocIA Chat API");
        assert!(health.model_loaded);
        assert_eq!(health.model.as_deref(), Some("mock-model"));
    }

    #[tokio::test]
    async fn health_reports_missing_model() {
        let app = app_with(Arc::new(HashEmbedder::default()), None);
        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let health: HealthResponse = body_json(app.oneshot(req).await.unwrap()).await;
        assert!(!health.model_loaded);
        assert!(health.model.is_none());
    }

    #[tokio::test]
    async fn ask_returns_sanitized_answer() {
        let response = test_app()
            .oneshot(post_json(
                "/ask",
                r#"{"text": "fever chills headache", "language": "en"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let ask: AskResponse = body_json(response).await;
        assert_eq!(ask.answer, "[/INST] I'm not a doctor. ⚠️ Consult a real doctor");
    }

    #[tokio::test]
    async fn ask_without_engine_returns_unavailable_in_default_language() {
        let app = app_with(Arc::new(HashEmbedder::default()), None);
        let response = app
            .oneshot(post_json("/ask", r#"{"text": "Qu'est-ce que le paludisme ?"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let ask: AskResponse = body_json(response).await;
        assert_eq!(ask.answer, docia_assistant::messages::unavailable(Language::Fr));
    }

    #[tokio::test]
    async fn ask_rejects_blank_text() {
        let response = test_app()
            .oneshot(post_json("/ask", r#"{"text": "   "}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let err: ErrorResponse = body_json(response).await;
        assert!(err.error.contains("empty"));
    }

    #[tokio::test]
    async fn ask_rejects_missing_text_and_bad_json() {
        for body in [r#"{"language": "en"}"#, "not json", r#"{"text": "hi", "language": "de"}"#] {
            let response = test_app().oneshot(post_json("/ask", body)).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
            let err: ErrorResponse = body_json(response).await;
            assert!(!err.error.is_empty());
        }
    }

    #[tokio::test]
    async fn ask_encoder_failure_is_internal_error() {
        let app = app_with(
            Arc::new(FailingEmbedder),
            Some(Arc::new(MockGenerator { reply: String::new() })),
        );
        let response = app
            .oneshot(post_json("/ask", r#"{"text": "fever", "language": "en"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let err: ErrorResponse = body_json(response).await;
        assert_eq!(err.error, "Internal server error");
    }

    #[tokio::test]
    async fn chat_answers_from_keywords() {
        let response = test_app()
            .oneshot(post_json("/chat", r#"{"message": "Comment prévenir le diabète ?"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let chat: ChatResponse = body_json(response).await;
        // prevention and definition both match once; the first category wins
        assert!(chat.response.starts_with("Le diabète est une maladie chronique"));
        assert!(chat.response.contains("\n\n⚠️ Important"));
        assert!(chat.timestamp > 1_600_000_000.0);
    }

    #[tokio::test]
    async fn chat_missing_message() {
        for body in ["{}", r#"{"message": null}"#, r#"{"message": 42}"#, "garbage"] {
            let response = test_app().oneshot(post_json("/chat", body)).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
            let err: ErrorResponse = body_json(response).await;
            assert_eq!(err.error, "Message requis");
        }
    }

    #[tokio::test]
    async fn chat_empty_message() {
        let response = test_app()
            .oneshot(post_json("/chat", r#"{"message": "   "}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let err: ErrorResponse = body_json(response).await;
        assert_eq!(err.error, "Message vide");
    }

    #[tokio::test]
    async fn cors_allows_configured_origin() {
        let assistant = Assistant::new(
            Retriever::new(knowledge(), Arc::new(HashEmbedder::default())),
            None,
        );
        let app = build_router(
            GatewayState::new(Arc::new(assistant), Language::Fr),
            &["http://localhost:3000".to_string()],
        );

        let req = Request::builder()
            .uri("/health")
            .header("origin", "http://localhost:3000")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "http://localhost:3000"
        );
    }
}
