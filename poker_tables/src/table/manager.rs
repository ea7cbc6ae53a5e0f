//! Table manager for spawning and routing to table actors.

use std::{collections::HashMap, sync::Arc};
use tokio::sync::{RwLock, mpsc};

use super::{
    actor::{TableActor, TableHandle},
    config::TableConfig,
    errors::{TableError, TableResult},
    host::TableHost,
    messages::{ActionMessage, TableMessage, TableSummary, TableUpdate},
};
use crate::game::{
    TableView,
    entities::{Action, Chips, Deck, PlayerId, SeatNumber, SeatRequest, TableId},
};

/// Registry of live tables, owned by the hosting process.
///
/// Cloning is cheap and every clone sees the same tables.
#[derive(Clone)]
pub struct TableManager {
    /// Ledger and persistence callbacks handed to every table
    host: Arc<dyn TableHost>,

    /// Active table handles
    tables: Arc<RwLock<HashMap<TableId, TableHandle>>>,
}

impl TableManager {
    /// Create a new table manager
    pub fn new(host: Arc<dyn TableHost>) -> Self {
        Self {
            host,
            tables: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Get the table with this ID, spawning it with `config` if it does not
    /// exist yet. `config` is ignored for an existing table.
    ///
    /// # Errors
    ///
    /// * `TableError::InvalidConfig` - table had to be created and `config` is invalid
    pub async fn get_or_create_table(
        &self,
        table_id: TableId,
        config: TableConfig,
    ) -> TableResult<TableHandle> {
        if let Some(handle) = self.get_table(table_id).await {
            return Ok(handle);
        }

        config.validate()?;

        let mut tables = self.tables.write().await;
        // Someone may have created it while we waited for the lock.
        if let Some(handle) = tables.get(&table_id)
            && !handle.is_closed()
        {
            return Ok(handle.clone());
        }

        let (actor, handle) = TableActor::new(table_id, config, self.host.clone());
        tables.insert(table_id, handle.clone());
        drop(tables);

        tokio::spawn(async move {
            actor.run().await;
        });

        log::info!("Created and spawned table {}", table_id);
        Ok(handle)
    }

    /// Get a table handle
    pub async fn get_table(&self, table_id: TableId) -> Option<TableHandle> {
        let tables = self.tables.read().await;
        tables.get(&table_id).filter(|h| !h.is_closed()).cloned()
    }

    async fn table(&self, table_id: TableId) -> TableResult<TableHandle> {
        self.get_table(table_id)
            .await
            .ok_or(TableError::NotFound(table_id))
    }

    /// Summaries of every open table, ordered by ID
    pub async fn list_tables(&self) -> Vec<TableSummary> {
        let handles: Vec<TableHandle> = {
            let tables = self.tables.read().await;
            tables.values().cloned().collect()
        };

        let mut summaries = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle
                .request(|response| TableMessage::GetSummary { response })
                .await
            {
                Ok(summary) => summaries.push(summary),
                Err(e) => log::debug!("Skipping table {}: {}", handle.table_id(), e),
            }
        }
        summaries.sort_by_key(|s| s.table_id);
        summaries
    }

    pub async fn active_table_count(&self) -> usize {
        let tables = self.tables.read().await;
        tables.values().filter(|h| !h.is_closed()).count()
    }

    /// Seat a player. The host has already taken `request.buy_in` from the
    /// player's balance and must return it if this fails.
    pub async fn add_player(&self, table_id: TableId, request: SeatRequest) -> TableResult<()> {
        self.table(table_id)
            .await?
            .request(|response| TableMessage::AddPlayer { request, response })
            .await?
    }

    /// Vacate a seat. The remaining stack is credited back through the
    /// host before this returns; the amount is returned for display.
    pub async fn remove_player(&self, table_id: TableId, seat: SeatNumber) -> TableResult<Chips> {
        self.table(table_id)
            .await?
            .request(|response| TableMessage::RemovePlayer { seat, response })
            .await?
    }

    /// Add host-validated chips to a seat between hands.
    pub async fn rebuy(&self, table_id: TableId, seat: SeatNumber, amount: Chips) -> TableResult<()> {
        self.table(table_id)
            .await?
            .request(|response| TableMessage::Rebuy {
                seat,
                amount,
                response,
            })
            .await?
    }

    pub async fn set_sitting_out(
        &self,
        table_id: TableId,
        seat: SeatNumber,
        sitting_out: bool,
    ) -> TableResult<()> {
        self.table(table_id)
            .await?
            .request(|response| TableMessage::SetSittingOut {
                seat,
                sitting_out,
                response,
            })
            .await?
    }

    pub async fn can_start_hand(&self, table_id: TableId) -> TableResult<bool> {
        self.table(table_id)
            .await?
            .request(|response| TableMessage::CanStartHand { response })
            .await
    }

    /// Deal immediately instead of waiting for the table's restart delay.
    pub async fn start_hand(&self, table_id: TableId) -> TableResult<()> {
        self.table(table_id)
            .await?
            .request(|response| TableMessage::StartHand {
                deck: None,
                response,
            })
            .await?
    }

    /// Deal immediately from a prearranged deck, for replays and tests.
    pub async fn start_hand_with_deck(&self, table_id: TableId, deck: Deck) -> TableResult<()> {
        self.table(table_id)
            .await?
            .request(|response| TableMessage::StartHand {
                deck: Some(deck),
                response,
            })
            .await?
    }

    /// Route an inbound action to its table.
    ///
    /// # Errors
    ///
    /// * `TableError::NotFound` - no such table
    /// * `TableError::Action` - out of turn, illegal, or missing an amount
    pub async fn handle_action(&self, message: ActionMessage) -> TableResult<()> {
        let action = Action::from_parts(message.action, message.amount)?;
        self.take_action(message.table_id, message.seat_number, action)
            .await
    }

    pub async fn take_action(
        &self,
        table_id: TableId,
        seat: SeatNumber,
        action: Action,
    ) -> TableResult<()> {
        self.table(table_id)
            .await?
            .request(|response| TableMessage::TakeAction {
                seat,
                action,
                response,
            })
            .await?
    }

    /// The table as `viewer` may see it; `None` for a spectator.
    pub async fn get_projection(
        &self,
        table_id: TableId,
        viewer: Option<PlayerId>,
    ) -> TableResult<TableView> {
        self.table(table_id)
            .await?
            .request(|response| TableMessage::GetProjection { viewer, response })
            .await
    }

    pub async fn seat_of(&self, table_id: TableId, player_id: PlayerId) -> TableResult<Option<SeatNumber>> {
        self.table(table_id)
            .await?
            .request(|response| TableMessage::SeatOf {
                player_id,
                response,
            })
            .await
    }

    /// Receive a `TableUpdate` on `sender` after every change at the table.
    /// The current view is sent straight away. One channel per viewer; a
    /// second subscription replaces the first.
    pub async fn subscribe(
        &self,
        table_id: TableId,
        viewer: PlayerId,
        sender: mpsc::Sender<TableUpdate>,
    ) -> TableResult<()> {
        self.table(table_id)
            .await?
            .send(TableMessage::Subscribe { viewer, sender })
            .await
    }

    pub async fn unsubscribe(&self, table_id: TableId, viewer: PlayerId) -> TableResult<()> {
        self.table(table_id)
            .await?
            .send(TableMessage::Unsubscribe { viewer })
            .await
    }

    /// Start the grace timer on every table where the player is seated.
    /// Returns those tables.
    pub async fn player_disconnected(&self, player_id: PlayerId) -> Vec<TableId> {
        let handles: Vec<TableHandle> = {
            let tables = self.tables.read().await;
            tables.values().cloned().collect()
        };

        let mut held = Vec::new();
        for handle in handles {
            let seated = handle
                .request(|response| TableMessage::PlayerDisconnected {
                    player_id,
                    response,
                })
                .await
                .unwrap_or(false);
            if seated {
                held.push(handle.table_id());
            }
        }
        held.sort_unstable();
        held
    }

    /// Start the grace timer at one table only. Returns whether the player
    /// is seated there.
    pub async fn player_left_table(&self, table_id: TableId, player_id: PlayerId) -> TableResult<bool> {
        self.table(table_id)
            .await?
            .request(|response| TableMessage::PlayerDisconnected {
                player_id,
                response,
            })
            .await
    }

    /// Cancel a pending grace timer. Returns whether one was pending.
    pub async fn player_reconnected(&self, table_id: TableId, player_id: PlayerId) -> TableResult<bool> {
        self.table(table_id)
            .await?
            .request(|response| TableMessage::PlayerReconnected {
                player_id,
                response,
            })
            .await
    }

    /// Shut a table down and forget it.
    ///
    /// # Errors
    ///
    /// * `TableError::Occupied` - someone is still seated
    pub async fn close_table(&self, table_id: TableId) -> TableResult<()> {
        self.table(table_id)
            .await?
            .request(|response| TableMessage::Close { response })
            .await??;

        let mut tables = self.tables.write().await;
        tables.remove(&table_id);
        drop(tables);

        log::info!("Closed table {}", table_id);
        Ok(())
    }
}
