//! HTTP/WebSocket API for the poker server.
//!
//! # Endpoints Overview
//!
//! - `GET /health` - Server health status
//! - `GET /api/tables` - Summaries of every open table
//! - `GET /api/tables/{id}?viewer=<player_id>` - Table as one player sees it
//! - `GET /api/players/{id}/balance` - Ledger balance
//! - `GET /ws/{table_id}?player_id=<id>` - Live table connection, see [`websocket`]
//!
//! # CORS
//!
//! CORS is configured permissively for development. In production, configure
//! appropriate origins, methods, and headers.

pub mod websocket;

use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
};
use poker_tables::{
    TableError, TableManager,
    entities::{PlayerId, TableId},
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::ledger::Ledger;

/// Application state shared across all HTTP handlers and WebSocket connections.
///
/// Cloned for each request; both fields are cheap handles.
#[derive(Clone)]
pub struct AppState {
    pub table_manager: TableManager,
    pub ledger: Arc<Ledger>,
}

/// Create the API router with all endpoints and middleware.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/tables", get(list_tables))
        .route("/api/tables/{table_id}", get(get_table))
        .route("/api/players/{player_id}/balance", get(get_balance))
        .route("/ws/{table_id}", get(websocket::websocket_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Map a table failure onto an HTTP status with a client-safe body.
pub(crate) fn table_error_response(err: &TableError) -> Response {
    let status = match err {
        TableError::NotFound(_) => StatusCode::NOT_FOUND,
        TableError::Closed(_) => StatusCode::GONE,
        TableError::Occupied(_) => StatusCode::CONFLICT,
        TableError::InvalidConfig(_) => StatusCode::BAD_REQUEST,
        TableError::Action(_) | TableError::Seat(_) | TableError::Start(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
    };
    (status, Json(json!({ "error": err.client_message() }))).into_response()
}

/// Health check endpoint for monitoring and load balancers.
///
/// # Example
///
/// ```bash
/// curl http://localhost:6969/health
/// # {"status":"healthy","version":"0.1.0","tables":{"active_count":1}}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let table_count = state.table_manager.active_table_count().await;
    crate::metrics::active_tables(table_count);

    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "tables": {
            "active_count": table_count
        },
    }))
}

async fn list_tables(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.table_manager.list_tables().await)
}

#[derive(Debug, Deserialize)]
pub struct ViewerQuery {
    viewer: Option<PlayerId>,
}

/// Table projection; hole cards are shown only for the `viewer` seat.
async fn get_table(
    State(state): State<AppState>,
    Path(table_id): Path<TableId>,
    Query(query): Query<ViewerQuery>,
) -> Response {
    match state
        .table_manager
        .get_projection(table_id, query.viewer)
        .await
    {
        Ok(view) => Json(view).into_response(),
        Err(e) => table_error_response(&e),
    }
}

async fn get_balance(
    State(state): State<AppState>,
    Path(player_id): Path<PlayerId>,
) -> impl IntoResponse {
    Json(json!({
        "player_id": player_id,
        "balance": state.ledger.balance(player_id).await,
    }))
}
