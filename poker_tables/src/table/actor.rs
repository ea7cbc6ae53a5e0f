//! Table actor implementation with async message handling.

use std::{collections::HashMap, sync::Arc};
use tokio::sync::{mpsc, oneshot};

use super::{
    config::TableConfig,
    errors::{TableError, TableResult},
    host::{CreditRequest, HostError, RemovalReason, TableHost},
    messages::{PlayerNotice, TableMessage, TableSummary, TableUpdate},
    timers::{TimerKind, Timers},
};
use crate::game::{
    TableEvent, TableState, TableView,
    entities::{Chips, HandStatus, PlayerId, SeatNumber, TableId},
    project,
};

/// Attempts made to return a stack to the ledger while it reports itself
/// unavailable.
const REFUND_ATTEMPTS: usize = 3;

/// Table actor handle for sending messages
#[derive(Clone, Debug)]
pub struct TableHandle {
    sender: mpsc::Sender<TableMessage>,
    table_id: TableId,
}

impl TableHandle {
    /// Create a new table handle
    pub fn new(sender: mpsc::Sender<TableMessage>, table_id: TableId) -> Self {
        Self { sender, table_id }
    }

    /// Get table ID
    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Send a message to the table
    pub async fn send(&self, message: TableMessage) -> TableResult<()> {
        self.sender
            .send(message)
            .await
            .map_err(|_| TableError::Closed(self.table_id))
    }

    /// Send a message built around a reply channel and wait for the reply.
    pub async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> TableMessage,
    ) -> TableResult<T> {
        let (tx, rx) = oneshot::channel();
        self.send(build(tx)).await?;
        rx.await.map_err(|_| TableError::Closed(self.table_id))
    }
}

/// Table actor managing a single poker table
pub struct TableActor {
    /// Table ID
    id: TableId,

    /// Table configuration
    config: TableConfig,

    /// Seats and the current hand
    state: TableState,

    /// Message inbox
    inbox: mpsc::Receiver<TableMessage>,

    /// Ledger and persistence callbacks
    host: Arc<dyn TableHost>,

    /// Turn, showdown, restart, grace and rebuy clocks
    timers: Timers<TableMessage>,

    /// Who holds the turn clock: (hand number, street, seat)
    turn_owner: Option<(u64, HandStatus, SeatNumber)>,

    /// Per-viewer update channels
    subscribers: HashMap<PlayerId, mpsc::Sender<TableUpdate>>,

    /// Is table closed
    is_closed: bool,
}

impl TableActor {
    /// Create a new table actor
    ///
    /// # Arguments
    ///
    /// * `id` - Table ID
    /// * `config` - Table configuration, assumed valid
    /// * `host` - Collaborator receiving refunds and seat changes
    ///
    /// # Returns
    ///
    /// * `(TableActor, TableHandle)` - Actor and handle for sending messages
    pub fn new(id: TableId, config: TableConfig, host: Arc<dyn TableHost>) -> (Self, TableHandle) {
        let (sender, inbox) = mpsc::channel(100);

        let state = TableState::new(config.game_settings());
        let timers = Timers::new(&sender);

        let actor = Self {
            id,
            config,
            state,
            inbox,
            host,
            timers,
            turn_owner: None,
            subscribers: HashMap::new(),
            is_closed: false,
        };

        let handle = TableHandle::new(sender, id);

        (actor, handle)
    }

    /// Run the table actor event loop
    ///
    /// Exits when the table is closed or every handle has been dropped.
    pub async fn run(mut self) {
        log::info!("Table {} '{}' starting", self.id, self.config.name);

        while let Some(message) = self.inbox.recv().await {
            self.handle_message(message).await;

            if self.is_closed {
                break;
            }
        }

        self.timers.cancel_all();
        log::info!("Table {} '{}' closed", self.id, self.config.name);
    }

    /// Handle a table message
    async fn handle_message(&mut self, message: TableMessage) {
        match message {
            TableMessage::AddPlayer { request, response } => {
                let seat = request.seat_number;
                let player_id = request.player_id;
                let result = self.state.add_seat(request).map_err(TableError::from);
                if result.is_ok() {
                    self.host.on_seat_changed(self.id, seat, Some(player_id)).await;
                    self.after_change().await;
                }
                let _ = response.send(result);
            }

            TableMessage::RemovePlayer { seat, response } => {
                let result = self.remove_seat(seat, None).await;
                let _ = response.send(result);
            }

            TableMessage::Rebuy {
                seat,
                amount,
                response,
            } => {
                let result = self.state.rebuy(seat, amount).map_err(TableError::from);
                if result.is_ok() {
                    self.timers.cancel(TimerKind::Rebuy(seat));
                    self.after_change().await;
                }
                let _ = response.send(result);
            }

            TableMessage::SetSittingOut {
                seat,
                sitting_out,
                response,
            } => {
                let result = self
                    .state
                    .set_sitting_out(seat, sitting_out)
                    .map_err(TableError::from);
                if result.is_ok() {
                    self.after_change().await;
                }
                let _ = response.send(result);
            }

            TableMessage::TakeAction {
                seat,
                action,
                response,
            } => {
                let result = self.state.handle_action(seat, action).map_err(TableError::from);
                match &result {
                    Ok(()) => self.after_change().await,
                    Err(e) => log::debug!("Table {}: seat {} {} rejected: {}", self.id, seat, action, e),
                }
                let _ = response.send(result);
            }

            TableMessage::StartHand { deck, response } => {
                let result = match deck {
                    Some(deck) => self.state.start_hand_with_deck(deck),
                    None => self.state.start_new_hand(),
                }
                .map_err(TableError::from);
                if result.is_ok() {
                    self.after_change().await;
                }
                let _ = response.send(result);
            }

            TableMessage::CanStartHand { response } => {
                let _ = response.send(self.state.can_start_hand());
            }

            TableMessage::GetProjection { viewer, response } => {
                let _ = response.send(self.view_for(viewer));
            }

            TableMessage::GetSummary { response } => {
                let _ = response.send(self.summary());
            }

            TableMessage::SeatOf {
                player_id,
                response,
            } => {
                let _ = response.send(self.state.seat_of(player_id));
            }

            TableMessage::PlayerDisconnected {
                player_id,
                response,
            } => {
                let seated = self.state.seat_of(player_id).is_some();
                if seated {
                    log::info!(
                        "Table {}: player {} disconnected, holding seat for {}s",
                        self.id,
                        player_id,
                        self.config.disconnect_grace_secs
                    );
                    self.timers.schedule(
                        TimerKind::DisconnectGrace(player_id),
                        self.config.disconnect_grace(),
                    );
                }
                let _ = response.send(seated);
            }

            TableMessage::PlayerReconnected {
                player_id,
                response,
            } => {
                let was_pending = self.timers.cancel(TimerKind::DisconnectGrace(player_id));
                if was_pending {
                    log::info!("Table {}: player {} reconnected", self.id, player_id);
                }
                let _ = response.send(was_pending);
            }

            TableMessage::Subscribe { viewer, sender } => {
                let _ = sender.try_send(TableUpdate::View(self.view_for(Some(viewer))));
                self.subscribers.insert(viewer, sender);
                log::debug!("Player {} subscribed to table {}", viewer, self.id);
            }

            TableMessage::Unsubscribe { viewer } => {
                self.subscribers.remove(&viewer);
                log::debug!("Player {} unsubscribed from table {}", viewer, self.id);
            }

            TableMessage::Close { response } => {
                let result = if self.state.is_empty() {
                    self.timers.cancel_all();
                    self.subscribers.clear();
                    self.is_closed = true;
                    Ok(())
                } else {
                    Err(TableError::Occupied(self.id))
                };
                let _ = response.send(result);
            }

            TableMessage::TimerFired(fired) => {
                if self.timers.accept(fired) {
                    self.on_timer(fired.kind).await;
                } else {
                    log::debug!("Table {}: ignoring stale {:?} timer", self.id, fired.kind);
                }
            }
        }
    }

    async fn on_timer(&mut self, kind: TimerKind) {
        match kind {
            TimerKind::Turn => {
                if let Some((seat, action)) = self.state.apply_timeout() {
                    log::warn!("Table {}: seat {} timed out, forced {}", self.id, seat, action);
                    if let Some(player_id) = self.state.seat(seat).map(|s| s.player_id) {
                        self.notify_player(
                            player_id,
                            PlayerNotice::TimedOut {
                                table_id: self.id,
                                seat,
                                action,
                            },
                        );
                    }
                }
                // Force a fresh clock even if the same seat is somehow up again.
                self.turn_owner = None;
                self.after_change().await;
            }

            TimerKind::Showdown => {
                self.state.end_hand();
                self.after_change().await;
            }

            TimerKind::NextHand => {
                if let Err(e) = self.state.start_new_hand() {
                    log::debug!("Table {}: not dealing: {}", self.id, e);
                }
                self.after_change().await;
            }

            TimerKind::DisconnectGrace(player_id) => {
                if let Some(seat) = self.state.seat_of(player_id)
                    && let Err(e) = self.remove_seat(seat, Some(RemovalReason::Disconnected)).await
                {
                    log::error!("Table {}: could not remove seat {}: {}", self.id, seat, e);
                }
            }

            TimerKind::Rebuy(seat) => {
                let still_busted = self
                    .state
                    .seat(seat)
                    .is_some_and(|s| s.stack == 0);
                if still_busted
                    && let Err(e) = self.remove_seat(seat, Some(RemovalReason::RebuyTimeout)).await
                {
                    log::error!("Table {}: could not remove seat {}: {}", self.id, seat, e);
                }
            }
        }
    }

    /// Vacates a seat, returns its stack to the ledger and tells the host.
    /// `reason` is set when a timer did it rather than the player.
    async fn remove_seat(
        &mut self,
        seat: SeatNumber,
        reason: Option<RemovalReason>,
    ) -> TableResult<Chips> {
        let removed = self.state.remove_seat(seat)?;
        self.timers.cancel(TimerKind::Rebuy(seat));
        self.timers.cancel(TimerKind::DisconnectGrace(removed.player_id));

        let refunded = removed.stack;
        if refunded > 0 {
            self.refund(removed.player_id, refunded).await;
        }
        self.host.on_seat_changed(self.id, seat, None).await;

        if let Some(reason) = reason {
            log::warn!(
                "Table {}: removed player {} from seat {} ({})",
                self.id,
                removed.player_id,
                seat,
                reason
            );
            self.host
                .on_forced_removal(self.id, removed.player_id, seat, reason)
                .await;
            self.notify_player(
                removed.player_id,
                PlayerNotice::Removed {
                    table_id: self.id,
                    seat,
                    reason,
                    refunded,
                },
            );
        }

        self.after_change().await;
        Ok(refunded)
    }

    /// Credits the ledger. The same idempotency key is reused across
    /// retries so the player is paid once.
    async fn refund(&self, player_id: PlayerId, amount: Chips) {
        let request = CreditRequest::new(self.id, player_id, amount);
        for attempt in 1..=REFUND_ATTEMPTS {
            match self.host.credit_balance(request.clone()).await {
                Ok(()) => return,
                Err(HostError::Unavailable(e)) if attempt < REFUND_ATTEMPTS => {
                    log::warn!(
                        "Table {}: refund of {} to player {} failed (attempt {}): {}",
                        self.id,
                        amount,
                        player_id,
                        attempt,
                        e
                    );
                }
                Err(e) => {
                    log::error!(
                        "Table {}: refund of {} to player {} failed: {} (key {})",
                        self.id,
                        amount,
                        player_id,
                        e,
                        request.idempotency_key
                    );
                    return;
                }
            }
        }
    }

    /// Drains events, re-arms timers and pushes fresh views.
    async fn after_change(&mut self) {
        self.process_events().await;
        self.sync_timers();
        self.broadcast();
    }

    async fn process_events(&mut self) {
        for event in self.state.drain_events() {
            match event {
                TableEvent::PlayerBusted { seat, player_id } => {
                    log::info!("Table {}: {}", self.id, event);
                    self.timers
                        .schedule(TimerKind::Rebuy(seat), self.config.rebuy_timeout());
                    self.notify_player(
                        player_id,
                        PlayerNotice::Busted {
                            table_id: self.id,
                            seat,
                            rebuy_secs: self.config.rebuy_timeout_secs,
                        },
                    );
                }
                TableEvent::RakeCollected(amount) => {
                    let hand_number = self.state.hand().hand_number;
                    log::debug!("Table {}: {}", self.id, event);
                    self.host
                        .on_rake_collected(self.id, hand_number, amount)
                        .await;
                }
                TableEvent::PotUnclaimed(_) => {
                    log::warn!("Table {}: {}", self.id, event);
                }
                TableEvent::SeatTaken { .. }
                | TableEvent::SeatVacated { .. }
                | TableEvent::HandStarted { .. }
                | TableEvent::HandEnded { .. } => {
                    log::info!("Table {}: {}", self.id, event);
                }
                _ => log::debug!("Table {}: {}", self.id, event),
            }
        }
    }

    /// Arms exactly the clocks the current state calls for.
    fn sync_timers(&mut self) {
        let hand = self.state.hand();
        let turn_owner = self
            .state
            .current_turn()
            .filter(|_| hand.status.is_betting())
            .map(|seat| (hand.hand_number, hand.status, seat));

        match turn_owner {
            Some(owner) if self.turn_owner != Some(owner) => {
                self.timers.schedule(TimerKind::Turn, self.config.turn_time());
            }
            Some(_) => {}
            None => {
                self.timers.cancel(TimerKind::Turn);
            }
        }
        self.turn_owner = turn_owner;

        if self.state.status() == HandStatus::Showdown {
            if !self.timers.is_armed(TimerKind::Showdown) {
                self.timers
                    .schedule(TimerKind::Showdown, self.config.showdown_delay());
            }
        } else {
            self.timers.cancel(TimerKind::Showdown);
        }

        if self.state.can_start_hand() {
            if !self.timers.is_armed(TimerKind::NextHand) {
                self.timers
                    .schedule(TimerKind::NextHand, self.config.next_hand_delay());
            }
        } else {
            self.timers.cancel(TimerKind::NextHand);
        }
    }

    fn view_for(&self, viewer: Option<PlayerId>) -> TableView {
        project(&self.state, self.id, viewer, self.config.turn_time_secs)
    }

    fn summary(&self) -> TableSummary {
        TableSummary {
            table_id: self.id,
            name: self.config.name.clone(),
            small_blind: self.config.small_blind,
            big_blind: self.config.big_blind,
            rake_percent: self.config.rake_percent,
            max_seats: self.config.max_seats,
            seated: self.state.seats().len(),
            status: self.state.status(),
            hand_number: self.state.hand().hand_number,
        }
    }

    fn notify_player(&mut self, player_id: PlayerId, notice: PlayerNotice) {
        let Some(sender) = self.subscribers.get(&player_id) else {
            return;
        };
        if let Err(mpsc::error::TrySendError::Closed(_)) =
            sender.try_send(TableUpdate::Notice(notice))
        {
            self.subscribers.remove(&player_id);
        }
    }

    /// Push each subscriber its own view of the table
    fn broadcast(&mut self) {
        let state = &self.state;
        let table_id = self.id;
        let turn_time_secs = self.config.turn_time_secs;

        self.subscribers.retain(|viewer, sender| {
            let view = project(state, table_id, Some(*viewer), turn_time_secs);
            match sender.try_send(TableUpdate::View(view)) {
                Ok(()) => true,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    log::warn!("Subscriber {} channel full, dropping update", viewer);
                    true
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    log::debug!("Subscriber {} disconnected, removing", viewer);
                    false
                }
            }
        });
    }
}
