//! Routes and handlers

use axum::{
    extract::{Json, Path, State},
    http::{HeaderValue, Method, StatusCode},
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use report_agent_core::{Reply, Status, Turn};

use crate::auth::auth_middleware;
use crate::state::AppState;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let cors = build_cors_layer(
        &state.settings.server.cors_origins,
        state.settings.server.cors_enabled,
    );

    Router::new()
        // Chat
        .route("/alpha/chat", post(chat))
        // Conversation history
        .route(
            "/alpha/history/:user_id",
            get(get_history).delete(delete_history),
        )
        // Abbreviation index rebuilds
        .route("/alpha/index", post(rebuild_all))
        .route("/alpha/index/report", post(rebuild_reports))
        .route("/alpha/index/entity", post(rebuild_entities))
        // Health check
        .route("/health", get(health_check))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn build_cors_layer(origins: &[String], enabled: bool) -> CorsLayer {
    if !enabled {
        return CorsLayer::permissive();
    }
    if origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
            .allow_headers(Any);
    }
    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!(origin, "invalid CORS origin");
                None
            })
        })
        .collect();
    CorsLayer::new()
        .allow_origin(parsed)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any)
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    user_id: String,
    query: String,
}

#[derive(Debug, Serialize)]
struct ChatResponse {
    status: Status,
    data: Reply,
}

async fn chat(State(state): State<AppState>, Json(request): Json<ChatRequest>) -> impl IntoResponse {
    let (reply, status) = state
        .composer
        .compose(&request.user_id, &request.query)
        .await;
    Json(ChatResponse {
        status,
        data: reply,
    })
}

async fn get_history(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Json<Vec<Turn>> {
    Json(state.store.get(&user_id).await)
}

#[derive(Debug, Serialize)]
struct DeleteResponse {
    deleted: bool,
}

async fn delete_history(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Json<DeleteResponse> {
    Json(DeleteResponse {
        deleted: state.store.delete(&user_id).await,
    })
}

#[derive(Debug, Serialize)]
struct MessageResponse {
    message: String,
}

fn rebuild_reply(result: Result<(), report_agent_retrieval::RetrievalError>) -> impl IntoResponse {
    match result {
        Ok(()) => (
            StatusCode::OK,
            Json(MessageResponse {
                message: "Indexing successfully".to_string(),
            }),
        ),
        Err(e) => {
            tracing::error!(error = %e, "index rebuild failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(MessageResponse {
                    message: "Failed to rebuild index".to_string(),
                }),
            )
        }
    }
}

async fn rebuild_all(State(state): State<AppState>) -> impl IntoResponse {
    rebuild_reply(state.index.rebuild_all(&state.catalog).await)
}

async fn rebuild_reports(State(state): State<AppState>) -> impl IntoResponse {
    rebuild_reply(state.index.rebuild_reports(&state.catalog).await)
}

async fn rebuild_entities(State(state): State<AppState>) -> impl IntoResponse {
    rebuild_reply(state.index.rebuild_entities(&state.catalog).await)
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({ "message": "OK", "status_code": 200 }))
}
