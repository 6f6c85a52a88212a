//! HTTP API server.
//!
//! One question in, one answer out. Shares a single [`RagService`] across all
//! requests.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::error::CineragError;
use crate::rag::RagService;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, warn};

/// Shared application state.
struct AppState {
    service: Arc<RagService>,
}

/// Run the HTTP API server.
pub async fn run_serve(host: Option<String>, port: Option<u16>, settings: Settings) -> anyhow::Result<()> {
    if let Err(e) = preflight::check(Operation::Serve, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let spinner = Output::spinner("Loading catalog...");
    let service = RagService::from_settings(&settings, None).await;
    spinner.finish_and_clear();
    let service = Arc::new(service?);

    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Cinerag API Server");
    println!();
    Output::success(&format!(
        "Listening on http://{} ({} movies)",
        addr,
        service.catalog().len()
    ));
    println!();
    println!("Endpoints:");
    Output::kv("Status", "GET  /");
    Output::kv("Health", "GET  /health");
    Output::kv("Ask", "POST /ask");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, router(service))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    Ok(())
}

/// Build the API router around a loaded service.
pub fn router(service: Arc<RagService>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(status))
        .route("/health", get(health))
        .route("/ask", post(ask))
        .layer(cors)
        .with_state(Arc::new(AppState { service }))
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct AskRequest {
    question: String,
}

#[derive(Serialize)]
struct AskResponse {
    answer: String,
}

#[derive(Serialize)]
struct StatusResponse {
    message: &'static str,
    movies: usize,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(err: CineragError) -> Response {
    let status = match &err {
        CineragError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        e if e.is_request_fault() => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        error!("Request failed: {}", err);
    } else {
        warn!("Rejected request: {}", err);
    }

    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
        .into_response()
}

// === Handlers ===

async fn status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(StatusResponse {
        message: "Cinerag backend is running",
        movies: state.service.catalog().len(),
    })
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn ask(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<AskRequest>, JsonRejection>,
) -> Response {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => {
            return error_response(CineragError::InvalidInput(rejection.body_text()))
        }
    };
    match state.service.ask(&req.question).await {
        Ok(answer) => Json(AskResponse {
            answer: answer.text,
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, EmbeddingIndex, Movie, RecordStore};
    use crate::config::Prompts;
    use crate::rag::testing::{FakeEmbedder, FakeLanguageModel};
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn app(embedder: FakeEmbedder, llm: FakeLanguageModel, catalog: Catalog) -> Router {
        let service = RagService::new(
            Arc::new(catalog),
            Arc::new(embedder),
            Arc::new(llm),
            Prompts::default(),
        );
        router(Arc::new(service))
    }

    fn catalog() -> Catalog {
        Catalog::from_parts(
            RecordStore::new(vec![Movie::titled("Heat"), Movie::titled("Up")]),
            EmbeddingIndex::from_vectors(vec![vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap(),
        )
        .unwrap()
    }

    async fn post_ask(app: Router, body: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(
                Request::post("/ask")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_ask_ok() {
        let app = app(
            FakeEmbedder::constant(vec![1.0, 0.1]),
            FakeLanguageModel::replying("Michael Mann."),
            catalog(),
        );
        let (status, body) = post_ask(app, r#"{"question": "¿Quién dirigió Heat?"}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({ "answer": "Michael Mann." }));
    }

    #[tokio::test]
    async fn test_ask_empty_catalog() {
        let app = app(
            FakeEmbedder::constant(vec![1.0, 0.0]),
            FakeLanguageModel::failing("must not be called"),
            Catalog::default(),
        );
        let (status, body) = post_ask(app, r#"{"question": "¿Algo?"}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["answer"], "No se encontraron documentos similares.");
    }

    #[tokio::test]
    async fn test_ask_error_statuses() {
        let blank = app(
            FakeEmbedder::constant(vec![1.0, 0.0]),
            FakeLanguageModel::replying("unused"),
            catalog(),
        );
        let (status, body) = post_ask(blank, r#"{"question": "  "}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("empty"));

        let upstream = app(
            FakeEmbedder::failing("rate limited"),
            FakeLanguageModel::replying("unused"),
            catalog(),
        );
        let (status, body) = post_ask(upstream, r#"{"question": "¿Algo?"}"#).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body["error"].as_str().unwrap().contains("rate limited"));
    }

    #[tokio::test]
    async fn test_malformed_body_gets_json_error() {
        for body in ["{not json", r#"{"query": "¿Algo?"}"#] {
            let app = app(
                FakeEmbedder::constant(vec![1.0, 0.0]),
                FakeLanguageModel::replying("unused"),
                catalog(),
            );
            let (status, body) = post_ask(app, body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert!(body["error"].as_str().unwrap().starts_with("Invalid input"));
        }
    }

    #[tokio::test]
    async fn test_status_and_health() {
        let app = app(
            FakeEmbedder::constant(vec![1.0, 0.0]),
            FakeLanguageModel::replying("unused"),
            catalog(),
        );

        let response = app
            .clone()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["movies"], 2);

        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
