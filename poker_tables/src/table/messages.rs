//! Table actor message types.

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};

use super::{errors::TableResult, host::RemovalReason, timers::TimerFired};
use crate::game::{
    TableView,
    entities::{Action, ActionKind, Chips, Deck, HandStatus, PlayerId, SeatNumber, SeatRequest, TableId},
};

/// Messages that can be sent to a TableActor
#[derive(Debug)]
pub enum TableMessage {
    /// Seat a player whose buy-in the host already collected
    AddPlayer {
        request: SeatRequest,
        response: oneshot::Sender<TableResult<()>>,
    },

    /// Vacate a seat; replies with the refunded stack
    RemovePlayer {
        seat: SeatNumber,
        response: oneshot::Sender<TableResult<Chips>>,
    },

    /// Add chips to a seat between hands
    Rebuy {
        seat: SeatNumber,
        amount: Chips,
        response: oneshot::Sender<TableResult<()>>,
    },

    /// Skip (or stop skipping) a seat when dealing
    SetSittingOut {
        seat: SeatNumber,
        sitting_out: bool,
        response: oneshot::Sender<TableResult<()>>,
    },

    /// Player action (fold, check, call, bet, raise, all-in)
    TakeAction {
        seat: SeatNumber,
        action: Action,
        response: oneshot::Sender<TableResult<()>>,
    },

    /// Deal a hand now instead of waiting for the restart timer. A given
    /// deck is dealt in order instead of a fresh shuffle.
    StartHand {
        deck: Option<Deck>,
        response: oneshot::Sender<TableResult<()>>,
    },

    CanStartHand {
        response: oneshot::Sender<bool>,
    },

    /// Get the table as seen by one viewer (`None` for a spectator)
    GetProjection {
        viewer: Option<PlayerId>,
        response: oneshot::Sender<TableView>,
    },

    GetSummary {
        response: oneshot::Sender<TableSummary>,
    },

    SeatOf {
        player_id: PlayerId,
        response: oneshot::Sender<Option<SeatNumber>>,
    },

    /// Start the grace timer if the player is seated here
    PlayerDisconnected {
        player_id: PlayerId,
        response: oneshot::Sender<bool>,
    },

    /// Cancel a pending grace timer; replies whether one was pending
    PlayerReconnected {
        player_id: PlayerId,
        response: oneshot::Sender<bool>,
    },

    /// Subscribe to per-viewer state updates
    Subscribe {
        viewer: PlayerId,
        sender: mpsc::Sender<TableUpdate>,
    },

    /// Unsubscribe from state updates
    Unsubscribe { viewer: PlayerId },

    /// Shut the table down; refused while anyone is seated
    Close {
        response: oneshot::Sender<TableResult<()>>,
    },

    /// Internal: a table timer went off
    TimerFired(TimerFired),
}

impl From<TimerFired> for TableMessage {
    fn from(value: TimerFired) -> Self {
        Self::TimerFired(value)
    }
}

/// Inbound action addressed to a table and seat.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ActionMessage {
    pub table_id: TableId,
    pub seat_number: SeatNumber,
    pub action: ActionKind,
    /// Required for `bet` and `raise`, ignored otherwise.
    #[serde(default)]
    pub amount: Option<Chips>,
}

/// Pushed to subscribers whenever something changes at the table.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum TableUpdate {
    View(TableView),
    Notice(PlayerNotice),
}

/// Sent only to the player it concerns.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlayerNotice {
    /// Turn clock ran out and an action was taken for the player
    TimedOut {
        table_id: TableId,
        seat: SeatNumber,
        action: Action,
    },
    /// Seat was vacated by a timer
    Removed {
        table_id: TableId,
        seat: SeatNumber,
        reason: RemovalReason,
        refunded: Chips,
    },
    /// Out of chips; rebuy before the deadline to keep the seat
    Busted {
        table_id: TableId,
        seat: SeatNumber,
        rebuy_secs: u64,
    },
}

/// Table listing entry
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct TableSummary {
    pub table_id: TableId,
    pub name: String,
    pub small_blind: Chips,
    pub big_blind: Chips,
    pub rake_percent: f64,
    pub max_seats: usize,
    pub seated: usize,
    pub status: HandStatus,
    pub hand_number: u64,
}
