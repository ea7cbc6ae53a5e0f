//! Integration tests for the HTTP routes.
//!
//! Requests go through the router with `tower::ServiceExt::oneshot`, no
//! socket involved.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use poker_tables::{TableConfig, TableManager, entities::SeatRequest};
use pt_server::{
    api::{AppState, create_router},
    ledger::Ledger,
};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt; // For `oneshot` method

/// Helper to create test server with one table
async fn create_test_server() -> (axum::Router, AppState) {
    let ledger = Arc::new(Ledger::new(1_000));
    let table_manager = TableManager::new(ledger.clone());
    table_manager
        .get_or_create_table(
            1,
            TableConfig {
                name: "Table 1".to_string(),
                small_blind: 5,
                big_blind: 10,
                ..TableConfig::default()
            },
        )
        .await
        .unwrap();

    let state = AppState {
        table_manager,
        ledger,
    };
    (create_router(state.clone()), state)
}

async fn get_json(app: axum::Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn seat(player_id: i64, seat_number: usize) -> SeatRequest {
    SeatRequest {
        player_id,
        seat_number,
        display_name: format!("player {player_id}"),
        photo_url: None,
        buy_in: 200,
    }
}

#[tokio::test]
async fn test_health_check() {
    let (app, _state) = create_test_server().await;
    let (status, body) = get_json(app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["tables"]["active_count"], 1);
}

#[tokio::test]
async fn test_list_tables() {
    let (app, _state) = create_test_server().await;
    let (status, body) = get_json(app, "/api/tables").await;

    assert_eq!(status, StatusCode::OK);
    let tables = body.as_array().unwrap();
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0]["name"], "Table 1");
    assert_eq!(tables[0]["big_blind"], 10);
    assert_eq!(tables[0]["status"], "waiting");
}

#[tokio::test]
async fn test_table_view_hides_other_hole_cards() {
    let (app, state) = create_test_server().await;
    state.table_manager.add_player(1, seat(7, 0)).await.unwrap();
    state.table_manager.add_player(1, seat(8, 1)).await.unwrap();
    state.table_manager.start_hand(1).await.unwrap();

    let (status, body) = get_json(app.clone(), "/api/tables/1?viewer=7").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "preflop");
    let players = body["players"].as_array().unwrap();
    let mine = players.iter().find(|p| p["player_id"] == 7).unwrap();
    let theirs = players.iter().find(|p| p["player_id"] == 8).unwrap();
    assert_eq!(mine["hole_cards"].as_array().map(Vec::len), Some(2));
    assert!(theirs["hole_cards"].is_null());

    let (_, spectator) = get_json(app, "/api/tables/1").await;
    for player in spectator["players"].as_array().unwrap() {
        assert!(player["hole_cards"].is_null());
    }
}

#[tokio::test]
async fn test_unknown_table_is_not_found() {
    let (app, _state) = create_test_server().await;
    let (status, body) = get_json(app, "/api/tables/99").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Table not found");
}

#[tokio::test]
async fn test_balance_route() {
    let (app, state) = create_test_server().await;
    state.ledger.debit(3, 250).await.unwrap();

    let (status, body) = get_json(app, "/api/players/3/balance").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["balance"], 750);
}
