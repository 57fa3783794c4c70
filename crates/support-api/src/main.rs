//! HTTP surface for the support chat pipeline.
//!
//! Three routes: `POST /chat` runs a message through the pipeline,
//! `POST /logout` ends the customer's conversation, `GET /health` reports
//! liveness. The customer identity arrives in the `x-customer-id` header.

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Json, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info};

use chat_pipeline::{ChatOutcome, ChatPipeline, ChatReply, RateLimiter};
use llm_client::LlmClient;
use message_guard::{GuardConfig, LlmGuard};
use session_store::{spawn_eviction_task, SessionStore};
use support_core::Language;
use translator::LlmTranslator;

mod fixture;

use fixture::FixtureReasoner;

/// Interval between idle-session eviction sweeps.
const EVICTION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

type Pipeline = ChatPipeline<LlmGuard, LlmTranslator, FixtureReasoner>;

#[derive(Clone)]
struct AppState {
    pipeline: Arc<Pipeline>,
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplyBody {
    answer: String,
    explanation: String,
    language: Language,
    correlation_id: String,
    tables: Vec<TableBody>,
}

#[derive(Debug, Serialize)]
struct TableBody {
    name: String,
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl From<ChatReply> for ReplyBody {
    fn from(reply: ChatReply) -> Self {
        Self {
            answer: reply.answer,
            explanation: reply.explanation,
            language: reply.language,
            correlation_id: reply.correlation_id,
            tables: reply
                .tables
                .into_iter()
                .map(|t| TableBody {
                    name: t.name,
                    columns: t.columns,
                    rows: t.rows,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
struct Health {
    status: String,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let addr = env::var("SUPPORT_API_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());

    let client = LlmClient::from_env().expect("LLM client configuration");
    let guard = LlmGuard::new(client.clone(), GuardConfig::from_env());
    let translator = LlmTranslator::new(client);
    let sessions = Arc::new(SessionStore::new());
    spawn_eviction_task(Arc::clone(&sessions), EVICTION_SWEEP_INTERVAL);

    let pipeline = ChatPipeline::new(
        guard,
        translator,
        FixtureReasoner::new(),
        sessions,
        RateLimiter::new(),
    );

    let state = AppState {
        pipeline: Arc::new(pipeline),
    };

    let app = Router::new()
        .route("/health", get(health))
        .route("/chat", post(chat))
        .route("/logout", post(logout))
        .with_state(state);

    let addr: SocketAddr = addr.parse().expect("Invalid SUPPORT_API_ADDR");
    info!(%addr, "Support API listening");

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

async fn health() -> Json<Health> {
    Json(Health {
        status: "ok".to_string(),
    })
}

async fn chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<ChatRequest>,
) -> Response {
    let customer_id = customer_header(&headers);

    match state.pipeline.chat(&customer_id, &payload.message).await {
        Ok(outcome) => {
            let (status, body) = outcome_parts(outcome);
            (status, Json(body)).into_response()
        }
        Err(err) => {
            error!(error = %err, "Chat request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(error_body("INTERNAL_ERROR", "Something went wrong.")),
            )
                .into_response()
        }
    }
}

async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let customer_id = customer_header(&headers);
    if customer_id.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(error_body(
                "MISSING_CUSTOMER_ID",
                "The x-customer-id header is required.",
            )),
        )
            .into_response();
    }

    let removed = state.pipeline.logout(&customer_id).await;
    let message = if removed {
        "Session ended."
    } else {
        "No active session."
    };
    (
        StatusCode::OK,
        Json(json!({ "status": "ok", "message": message })),
    )
        .into_response()
}

/// The customer id header value, empty when absent or non-UTF-8.
fn customer_header(headers: &HeaderMap) -> String {
    headers
        .get("x-customer-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Map a pipeline outcome to a status code and response body.
///
/// A guard refusal is shaped like a normal reply so clients render it as an
/// answer, but carries a 403.
fn outcome_parts(outcome: ChatOutcome) -> (StatusCode, Value) {
    match outcome {
        ChatOutcome::Answered(reply) => {
            let body = serde_json::to_value(ReplyBody::from(reply)).unwrap_or_default();
            (StatusCode::OK, body)
        }
        ChatOutcome::RejectedMissingCustomerId => (
            StatusCode::BAD_REQUEST,
            error_body(
                "MISSING_CUSTOMER_ID",
                "The x-customer-id header is required.",
            ),
        ),
        ChatOutcome::RejectedValidation => (
            StatusCode::BAD_REQUEST,
            error_body("VALIDATION_ERROR", "The message must not be empty."),
        ),
        ChatOutcome::RejectedRateLimit => (
            StatusCode::TOO_MANY_REQUESTS,
            error_body(
                "RATE_LIMIT_EXCEEDED",
                "Too many requests. Please wait a moment and try again.",
            ),
        ),
        ChatOutcome::RejectedUnsafe {
            answer,
            language,
            correlation_id,
        } => {
            let body = serde_json::to_value(ReplyBody {
                answer,
                explanation: String::new(),
                language,
                correlation_id,
                tables: Vec::new(),
            })
            .unwrap_or_default();
            (StatusCode::FORBIDDEN, body)
        }
    }
}

fn error_body(code: &str, message: &str) -> Value {
    json!({
        "error": {
            "code": code,
            "message": message,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chat_pipeline::REFUSAL_HE;

    #[test]
    fn test_answered_maps_to_ok_with_reply_body() {
        let reply = ChatReply {
            answer: "hi".to_string(),
            explanation: "because".to_string(),
            language: Language::English,
            correlation_id: "corr-1".to_string(),
            tables: Vec::new(),
        };

        let (status, body) = outcome_parts(ChatOutcome::Answered(reply));
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["answer"], "hi");
        assert_eq!(body["language"], "en");
        assert_eq!(body["correlationId"], "corr-1");
    }

    #[test]
    fn test_rejections_map_to_error_codes() {
        let (status, body) = outcome_parts(ChatOutcome::RejectedMissingCustomerId);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "MISSING_CUSTOMER_ID");

        let (status, body) = outcome_parts(ChatOutcome::RejectedValidation);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

        let (status, body) = outcome_parts(ChatOutcome::RejectedRateLimit);
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["error"]["code"], "RATE_LIMIT_EXCEEDED");
    }

    #[test]
    fn test_refusal_is_shaped_like_a_reply() {
        let (status, body) = outcome_parts(ChatOutcome::RejectedUnsafe {
            answer: REFUSAL_HE.to_string(),
            language: Language::Hebrew,
            correlation_id: "corr-2".to_string(),
        });

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["answer"], REFUSAL_HE);
        assert_eq!(body["language"], "he");
        assert!(body["tables"].as_array().unwrap().is_empty());
        assert!(body.get("error").is_none());
    }

    #[test]
    fn test_customer_header_defaults_to_empty() {
        let headers = HeaderMap::new();
        assert_eq!(customer_header(&headers), "");

        let mut headers = HeaderMap::new();
        headers.insert("x-customer-id", "CUST123456".parse().unwrap());
        assert_eq!(customer_header(&headers), "CUST123456");
    }
}
