//! HTTP gateway for Doppel.
//!
//! Two endpoints: `POST /chat` runs one turn of the routing loop, and
//! `GET /healthz` reports liveness. Chat always answers 200 with a JSON
//! body; internal failures are logged in full and surface to the user as
//! an apology inside an otherwise normal response, so a chat widget never
//! has to special-case errors.
//!
//! Built on Axum.

use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    response::Json,
    routing::{get, post},
};
use doppel_agent::RouterLoop;
use doppel_sessions::SessionStore;
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Shared application state for the gateway.
pub struct AppState {
    pub agent: Arc<RouterLoop>,
    pub sessions: Arc<SessionStore>,
    pub service_name: String,
}

pub type SharedState = Arc<AppState>;

/// Build the router with all gateway routes.
pub fn build_router(state: SharedState, allowed_origins: &[String]) -> Router {
    let cors = cors_layer(allowed_origins);

    Router::new()
        .route("/chat", post(chat_handler))
        .route("/healthz", get(healthz_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<_> = allowed_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
        .allow_headers([axum::http::header::CONTENT_TYPE])
}

// --- Request / Response types ---

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// The user's message
    pub message: String,
    /// Existing session ID (omit to start a new conversation)
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub answer: String,
    pub session_id: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    service: String,
}

// --- Handlers ---

async fn chat_handler(
    State(state): State<SharedState>,
    Json(request): Json<ChatRequest>,
) -> Json<ChatResponse> {
    let (session_id, handle) = state
        .sessions
        .get_or_create(request.session_id.as_deref())
        .await;

    let mut session = handle.lock().await;

    let answer = match state.agent.run_turn(&mut session, &request.message).await {
        Ok(outcome) => outcome.text().to_string(),
        Err(e) => {
            // Full detail stays in the logs; the user gets an apology in a
            // normal 200 response.
            error!(session_id = %session_id, error = %e, "Turn failed");
            format!("Sorry, something went wrong on my end ({e}). Please try again.")
        }
    };

    Json(ChatResponse {
        answer,
        session_id: session_id.to_string(),
    })
}

async fn healthz_handler(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: state.service_name.clone(),
    })
}

/// Start the gateway HTTP server.
pub async fn start(
    state: SharedState,
    host: &str,
    port: u16,
    allowed_origins: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let router = build_router(state, allowed_origins);
    let addr = format!("{host}:{port}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "Gateway listening");
    axum::serve(listener, router).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use doppel_agent::RouterLoop;
    use doppel_core::error::ProviderError;
    use doppel_core::provider::{Provider, ProviderRequest, ProviderResponse};
    use doppel_core::relay::OwnerContact;
    use doppel_core::tool::ToolRegistry;
    use doppel_core::{Message, Persona};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    /// Echoes how many messages it saw, to observe session continuity.
    struct HistoryEchoProvider;

    #[async_trait]
    impl Provider for HistoryEchoProvider {
        fn name(&self) -> &str {
            "history-echo"
        }

        async fn complete(
            &self,
            request: ProviderRequest,
        ) -> Result<ProviderResponse, ProviderError> {
            Ok(ProviderResponse {
                message: Message::assistant(format!("history={}", request.messages.len())),
                model: "test".into(),
                usage: None,
            })
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl Provider for FailingProvider {
        fn name(&self) -> &str {
            "failing"
        }

        async fn complete(
            &self,
            _: ProviderRequest,
        ) -> Result<ProviderResponse, ProviderError> {
            Err(ProviderError::AuthenticationFailed("bad key".into()))
        }
    }

    fn state_with(provider: Arc<dyn Provider>) -> SharedState {
        let agent = RouterLoop::new(
            provider,
            Arc::new(ToolRegistry::new()),
            Persona::load("Aayushmaan", None, None).unwrap(),
            Arc::new(doppel_agent::NoopRelay),
            OwnerContact {
                name: "Aayushmaan".into(),
                email: None,
            },
            "test-model",
        );

        Arc::new(AppState {
            agent: Arc::new(agent),
            sessions: Arc::new(SessionStore::new()),
            service_name: "doppel".into(),
        })
    }

    async fn post_chat(router: Router, body: serde_json::Value) -> serde_json::Value {
        let response = router
            .oneshot(
                axum::http::Request::builder()
                    .method("POST")
                    .uri("/chat")
                    .header("content-type", "application/json")
                    .body(axum::body::Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), axum::http::StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn healthz_reports_service_name() {
        let router = build_router(state_with(Arc::new(HistoryEchoProvider)), &[]);

        let response = router
            .oneshot(
                axum::http::Request::builder()
                    .uri("/healthz")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), axum::http::StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "doppel");
    }

    #[tokio::test]
    async fn chat_mints_session_and_continues_it() {
        let state = state_with(Arc::new(HistoryEchoProvider));

        let first = post_chat(
            build_router(Arc::clone(&state), &[]),
            serde_json::json!({"message": "hello"}),
        )
        .await;

        // preamble + user
        assert_eq!(first["answer"], "history=2");
        let session_id = first["session_id"].as_str().unwrap().to_string();
        assert!(!session_id.is_empty());

        let second = post_chat(
            build_router(state, &[]),
            serde_json::json!({"message": "again", "session_id": session_id}),
        )
        .await;

        // preamble + user + assistant + user
        assert_eq!(second["answer"], "history=4");
        assert_eq!(second["session_id"], session_id);
    }

    #[tokio::test]
    async fn unknown_session_id_is_adopted() {
        let router = build_router(state_with(Arc::new(HistoryEchoProvider)), &[]);

        let body = post_chat(
            router,
            serde_json::json!({"message": "hi", "session_id": "client-chosen"}),
        )
        .await;

        assert_eq!(body["session_id"], "client-chosen");
    }

    #[tokio::test]
    async fn internal_errors_still_answer_200() {
        let router = build_router(state_with(Arc::new(FailingProvider)), &[]);

        let body = post_chat(router, serde_json::json!({"message": "hello"})).await;
        let answer = body["answer"].as_str().unwrap();
        assert!(answer.contains("Sorry, something went wrong"));
        assert!(!body["session_id"].as_str().unwrap().is_empty());
    }
}
