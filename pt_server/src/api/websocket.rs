//! WebSocket handler for live table play.
//!
//! # Connection Flow
//!
//! 1. Client connects via `GET /ws/{table_id}?player_id=<id>`
//! 2. Server subscribes the player to the table; the current view arrives first
//! 3. If the player already holds a seat, a pending disconnect grace is cancelled
//! 4. Server spawns a send task forwarding table updates and command responses
//! 5. On close the subscription is dropped and, for a seated player, the
//!    disconnect grace timer starts. The seat is kept until it fires.
//!
//! # Client Messages
//!
//! ```json
//! {"type":"join","seat":3,"buy_in":200,"display_name":"ana"}
//! {"type":"leave"}
//! {"type":"action","action":"raise","amount":10}
//! {"type":"rebuy","amount":100}
//! {"type":"sit_out"}
//! {"type":"sit_in"}
//! ```
//!
//! # Server Messages
//!
//! - Every `TableUpdate` (`{"type":"view",...}` or `{"type":"notice",...}`)
//! - Command responses (`{"type":"success",...}` or `{"type":"error",...}`)

use axum::{
    extract::{
        Path, Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use poker_tables::{
    TableError, TableUpdate,
    entities::{ActionKind, Chips, PlayerId, SeatNumber, SeatRequest, TableId},
    table::{ActionMessage, CreditRequest},
};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::{AppState, table_error_response};
use crate::metrics;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    player_id: PlayerId,
}

/// Client messages received via WebSocket
#[derive(Debug, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Take a seat, paying `buy_in` from the ledger
    Join {
        seat: SeatNumber,
        buy_in: Chips,
        display_name: String,
    },
    /// Give up the seat and cash out
    Leave,
    /// Act on the current hand
    Action {
        action: ActionKind,
        #[serde(default)]
        amount: Option<Chips>,
    },
    /// Top up a busted seat
    Rebuy { amount: Chips },
    SitOut,
    SitIn,
}

/// Response messages sent to client
#[derive(Debug, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerResponse {
    Success { message: String },
    Error { message: String },
}

impl ServerResponse {
    fn success(message: impl Into<String>) -> Self {
        Self::Success {
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}

/// Upgrade HTTP connection to WebSocket for one table.
///
/// Unknown tables are refused before the upgrade.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Path(table_id): Path<TableId>,
    Query(query): Query<WsQuery>,
    State(state): State<AppState>,
) -> Response {
    if state.table_manager.get_table(table_id).await.is_none() {
        return table_error_response(&TableError::NotFound(table_id));
    }

    ws.on_upgrade(move |socket| handle_socket(socket, table_id, query.player_id, state))
        .into_response()
}

/// Handle an established WebSocket connection.
async fn handle_socket(
    socket: WebSocket,
    table_id: TableId,
    player_id: PlayerId,
    state: AppState,
) {
    let (mut sender, mut receiver) = socket.split();
    metrics::websocket_connected();
    info!("WebSocket connected: table={}, player={}", table_id, player_id);

    let (update_tx, mut update_rx) = mpsc::channel::<TableUpdate>(32);
    let (response_tx, mut response_rx) = mpsc::channel::<String>(32);

    if let Err(e) = state
        .table_manager
        .subscribe(table_id, player_id, update_tx)
        .await
    {
        error!("Failed to subscribe to table {}: {}", table_id, e);
        metrics::websocket_disconnected();
        return;
    }

    match state.table_manager.player_reconnected(table_id, player_id).await {
        Ok(true) => info!("Player {} reconnected to table {}", player_id, table_id),
        Ok(false) => {}
        Err(e) => warn!("Reconnect check failed for table {}: {}", table_id, e),
    }

    let send_task = tokio::spawn(async move {
        loop {
            let json = tokio::select! {
                Some(update) = update_rx.recv() => match serde_json::to_string(&update) {
                    Ok(json) => json,
                    Err(e) => {
                        error!("Failed to serialize table update: {}", e);
                        continue;
                    }
                },
                Some(response) = response_rx.recv() => response,
                else => break,
            };

            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                metrics::websocket_messages_received();
                debug!("Received message from player {}: {}", player_id, text);

                let response = match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(client_msg) => {
                        handle_client_message(client_msg, table_id, player_id, &state).await
                    }
                    Err(e) => {
                        warn!("Failed to parse client message: {}", e);
                        ServerResponse::error("Invalid message format")
                    }
                };

                if let Ok(json) = serde_json::to_string(&response)
                    && response_tx.send(json).await.is_err()
                {
                    break;
                }
            }
            Ok(Message::Close(_)) => {
                info!("WebSocket closed: table={}, player={}", table_id, player_id);
                break;
            }
            Err(e) => {
                error!("WebSocket error: {}", e);
                break;
            }
            _ => {}
        }
    }

    send_task.abort();
    let _ = state.table_manager.unsubscribe(table_id, player_id).await;

    // The seat is held for the grace period rather than vacated now.
    if let Ok(true) = state
        .table_manager
        .player_left_table(table_id, player_id)
        .await
    {
        info!(
            "Player {} holds seat at table {} during disconnect grace",
            player_id, table_id
        );
    }

    metrics::websocket_disconnected();
    info!("WebSocket disconnected: table={}, player={}", table_id, player_id);
}

async fn seat_of(
    state: &AppState,
    table_id: TableId,
    player_id: PlayerId,
) -> Result<SeatNumber, ServerResponse> {
    match state.table_manager.seat_of(table_id, player_id).await {
        Ok(Some(seat)) => Ok(seat),
        Ok(None) => Err(ServerResponse::error("You are not seated at this table")),
        Err(e) => Err(ServerResponse::error(e.client_message())),
    }
}

/// Return chips the table refused.
async fn refund(state: &AppState, table_id: TableId, player_id: PlayerId, amount: Chips) {
    state
        .ledger
        .credit(&CreditRequest::new(table_id, player_id, amount))
        .await;
}

fn rejected(command: &'static str, err: &TableError) -> ServerResponse {
    metrics::commands_rejected(command);
    debug!("{} rejected: {}", command, err);
    ServerResponse::error(err.client_message())
}

/// Process a client command and return a response.
///
/// Chips for a join or rebuy leave the ledger before the table sees the
/// request and go straight back if the table refuses it.
pub async fn handle_client_message(
    msg: ClientMessage,
    table_id: TableId,
    player_id: PlayerId,
    state: &AppState,
) -> ServerResponse {
    match msg {
        ClientMessage::Join {
            seat,
            buy_in,
            display_name,
        } => {
            if let Err(e) = state.ledger.debit(player_id, buy_in).await {
                return ServerResponse::error(e.to_string());
            }

            let request = SeatRequest {
                player_id,
                seat_number: seat,
                display_name,
                photo_url: None,
                buy_in,
            };
            match state.table_manager.add_player(table_id, request).await {
                Ok(()) => ServerResponse::success(format!("Seated at {seat}")),
                Err(e) => {
                    refund(state, table_id, player_id, buy_in).await;
                    rejected("join", &e)
                }
            }
        }

        ClientMessage::Leave => {
            let seat = match seat_of(state, table_id, player_id).await {
                Ok(seat) => seat,
                Err(response) => return response,
            };
            match state.table_manager.remove_player(table_id, seat).await {
                Ok(refunded) => {
                    ServerResponse::success(format!("Left table, {refunded} chips returned"))
                }
                Err(e) => rejected("leave", &e),
            }
        }

        ClientMessage::Action { action, amount } => {
            let seat_number = match seat_of(state, table_id, player_id).await {
                Ok(seat) => seat,
                Err(response) => return response,
            };
            let message = ActionMessage {
                table_id,
                seat_number,
                action,
                amount,
            };
            match state.table_manager.handle_action(message).await {
                Ok(()) => ServerResponse::success(format!("{action} accepted")),
                Err(e) => rejected("action", &e),
            }
        }

        ClientMessage::Rebuy { amount } => {
            let seat = match seat_of(state, table_id, player_id).await {
                Ok(seat) => seat,
                Err(response) => return response,
            };
            if let Err(e) = state.ledger.debit(player_id, amount).await {
                return ServerResponse::error(e.to_string());
            }
            match state.table_manager.rebuy(table_id, seat, amount).await {
                Ok(()) => ServerResponse::success(format!("Added {amount} chips")),
                Err(e) => {
                    refund(state, table_id, player_id, amount).await;
                    rejected("rebuy", &e)
                }
            }
        }

        ClientMessage::SitOut | ClientMessage::SitIn => {
            let sitting_out = matches!(msg, ClientMessage::SitOut);
            let seat = match seat_of(state, table_id, player_id).await {
                Ok(seat) => seat,
                Err(response) => return response,
            };
            match state
                .table_manager
                .set_sitting_out(table_id, seat, sitting_out)
                .await
            {
                Ok(()) if sitting_out => ServerResponse::success("Sitting out"),
                Ok(()) => ServerResponse::success("Back in"),
                Err(e) => rejected("sit_out", &e),
            }
        }
    }
}
