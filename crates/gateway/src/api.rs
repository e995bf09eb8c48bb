//! Request handlers for `/ask`, `/chat` and `/health`.

use axum::{
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
};
use docia_assistant::messages;
use docia_core::{Language, QueryRequest};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::SharedState;

pub const SERVICE_NAME: &str = "DocIA Chat API";

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

// --- /ask ---

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub text: String,
    #[serde(default)]
    pub language: Option<Language>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,
}

pub async fn ask_handler(
    State(state): State<SharedState>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<AskResponse>, ApiError> {
    let Json(payload) = payload.map_err(|e| api_error(StatusCode::BAD_REQUEST, e.body_text()))?;
    let request = QueryRequest::new(
        payload.text,
        payload.language.unwrap_or(state.default_language),
    );

    info!(
        language = %request.language,
        text_len = request.text.len(),
        "Question received"
    );

    match state.assistant.ask(&request).await {
        Ok(answer) => Ok(Json(AskResponse { answer })),
        Err(e) if e.is_client_error() => Err(api_error(StatusCode::BAD_REQUEST, e.to_string())),
        Err(e) => {
            error!(error = %e, "Question failed");
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                messages::internal_error(request.language),
            ))
        }
    }
}

// --- /chat ---

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    /// Unix time in seconds, with sub-second precision
    pub timestamp: f64,
}

pub async fn chat_handler(
    State(state): State<SharedState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let message = match payload {
        Ok(Json(ChatRequest {
            message: Some(message),
        })) => message,
        _ => return Err(api_error(StatusCode::BAD_REQUEST, "Message requis")),
    };

    if message.trim().is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Message vide"));
    }

    match state.assistant.chat(&message) {
        Ok(response) => Ok(Json(ChatResponse {
            response,
            timestamp: unix_timestamp(),
        })),
        Err(e) => {
            error!(error = %e, "Chat failed");
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                messages::internal_error(Language::Fr),
            ))
        }
    }
}

fn unix_timestamp() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

// --- /health ---

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub model_loaded: bool,
    pub model: Option<String>,
}

pub async fn health_handler(State(state): State<SharedState>) -> Json<HealthResponse> {
    let model = state.assistant.model_status();
    Json(HealthResponse {
        status: "healthy".into(),
        service: SERVICE_NAME.into(),
        version: env!("CARGO_PKG_VERSION").into(),
        model_loaded: model.loaded,
        model: model.model,
    })
}
