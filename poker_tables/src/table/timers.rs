//! Cancellable one-shot timers that report back through a table's inbox.
//!
//! Each timer is a spawned task that sleeps and then posts a `TimerFired`
//! message. Cancelling aborts the task, but a fire may already be queued
//! in the inbox by then, so every fire carries a token and `accept` only
//! lets through the one belonging to the timer that is currently armed.

use std::{collections::HashMap, time::Duration};
use tokio::{
    sync::mpsc::{Sender, WeakSender},
    task::JoinHandle,
};

use crate::game::entities::{PlayerId, SeatNumber};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TimerKind {
    /// Current seat's time to act
    Turn,
    /// Showdown results on display
    Showdown,
    /// Pause before dealing the next hand
    NextHand,
    /// Reconnect window for a dropped player
    DisconnectGrace(PlayerId),
    /// Rebuy window for a busted seat
    Rebuy(SeatNumber),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TimerFired {
    pub kind: TimerKind,
    pub token: u64,
}

pub struct Timers<M> {
    sender: WeakSender<M>,
    next_token: u64,
    armed: HashMap<TimerKind, (u64, JoinHandle<()>)>,
}

impl<M> Timers<M>
where
    M: From<TimerFired> + Send + 'static,
{
    /// Timers hold a weak sender so they never keep an inbox open.
    pub fn new(sender: &Sender<M>) -> Self {
        Self {
            sender: sender.downgrade(),
            next_token: 0,
            armed: HashMap::new(),
        }
    }

    /// Arms `kind` to fire after `delay`, replacing any timer of that kind.
    pub fn schedule(&mut self, kind: TimerKind, delay: Duration) {
        self.cancel(kind);
        self.next_token += 1;
        let fired = TimerFired {
            kind,
            token: self.next_token,
        };
        let sender = self.sender.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(sender) = sender.upgrade() {
                let _ = sender.send(M::from(fired)).await;
            }
        });
        self.armed.insert(kind, (fired.token, task));
    }

    /// Returns whether a timer of this kind was armed.
    pub fn cancel(&mut self, kind: TimerKind) -> bool {
        match self.armed.remove(&kind) {
            Some((_, task)) => {
                task.abort();
                true
            }
            None => false,
        }
    }

    pub fn is_armed(&self, kind: TimerKind) -> bool {
        self.armed.contains_key(&kind)
    }

    /// Claims a fire. True only for the live timer of that kind, which is
    /// then disarmed; stale fires from cancelled or replaced timers are
    /// refused.
    pub fn accept(&mut self, fired: TimerFired) -> bool {
        match self.armed.get(&fired.kind) {
            Some((token, _)) if *token == fired.token => {
                self.armed.remove(&fired.kind);
                true
            }
            _ => false,
        }
    }

    pub fn cancel_all(&mut self) {
        for (_, (_, task)) in self.armed.drain() {
            task.abort();
        }
    }
}

impl<M> Drop for Timers<M> {
    fn drop(&mut self) {
        for (_, (_, task)) in self.armed.drain() {
            task.abort();
        }
    }
}
