//! Domain events and their fan-out to subscribers.

use super::{PlayerId, TournamentId};
use crate::{
    ledger::EntryId,
    prize::Cents,
    seating::{BalanceMove, TableId},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Something that happened to a tournament
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TournamentEvent {
    ClockInitialized {
        tournament_id: TournamentId,
        state_id: i64,
    },
    TournamentStarted {
        tournament_id: TournamentId,
        duration_secs: i64,
    },
    ClockPaused {
        tournament_id: TournamentId,
        time_remaining: i64,
    },
    ClockResumed {
        tournament_id: TournamentId,
        time_remaining: i64,
    },
    LevelAdvanced {
        tournament_id: TournamentId,
        level: u32,
        duration_secs: i64,
    },
    BreakStarted {
        tournament_id: TournamentId,
        until: DateTime<Utc>,
    },
    BreakEnded {
        tournament_id: TournamentId,
        level: u32,
    },
    TimeAdded {
        tournament_id: TournamentId,
        seconds: i64,
        time_remaining: i64,
    },
    TournamentFinished {
        tournament_id: TournamentId,
    },
    ClockDeleted {
        tournament_id: TournamentId,
    },
    PlayerRegistered {
        tournament_id: TournamentId,
        player_id: PlayerId,
        entry_id: EntryId,
    },
    PlayerRemoved {
        tournament_id: TournamentId,
        player_id: PlayerId,
    },
    PlayerBusted {
        tournament_id: TournamentId,
        player_id: PlayerId,
        entry_number: u32,
        eliminated_by: Option<PlayerId>,
        finish_position: Option<u32>,
        can_reentry: bool,
    },
    BountyAwarded {
        tournament_id: TournamentId,
        eliminator_id: PlayerId,
        eliminated_id: PlayerId,
        amount: Cents,
        carried_forward: Cents,
    },
    PlayerReentered {
        tournament_id: TournamentId,
        player_id: PlayerId,
        entry_number: u32,
    },
    ReentryDeclined {
        tournament_id: TournamentId,
        player_id: PlayerId,
        finish_position: Option<u32>,
    },
    RebuyProcessed {
        tournament_id: TournamentId,
        player_id: PlayerId,
        chips: i64,
        amount: Cents,
    },
    AddonProcessed {
        tournament_id: TournamentId,
        player_id: PlayerId,
        chips: i64,
        amount: Cents,
    },
    TournamentCompleted {
        tournament_id: TournamentId,
        winner: Option<PlayerId>,
    },
    TableAdded {
        tournament_id: TournamentId,
        table_id: TableId,
        table_number: u32,
    },
    TableRemoved {
        tournament_id: TournamentId,
        table_id: TableId,
    },
    PlayerSeated {
        tournament_id: TournamentId,
        player_id: PlayerId,
        table_id: TableId,
        seat_number: u8,
    },
    PlayerUnseated {
        tournament_id: TournamentId,
        player_id: PlayerId,
        table_id: TableId,
        seat_number: u8,
    },
    PlayerMoved {
        tournament_id: TournamentId,
        movement: BalanceMove,
    },
    TablesBalanced {
        tournament_id: TournamentId,
        completed: usize,
        failed: usize,
    },
    TableBroken {
        tournament_id: TournamentId,
        table_id: TableId,
        /// False when some moves failed and the table stays `breaking`
        complete: bool,
    },
}

impl TournamentEvent {
    /// Tournament the event belongs to
    pub fn tournament_id(&self) -> TournamentId {
        match self {
            TournamentEvent::ClockInitialized { tournament_id, .. }
            | TournamentEvent::TournamentStarted { tournament_id, .. }
            | TournamentEvent::ClockPaused { tournament_id, .. }
            | TournamentEvent::ClockResumed { tournament_id, .. }
            | TournamentEvent::LevelAdvanced { tournament_id, .. }
            | TournamentEvent::BreakStarted { tournament_id, .. }
            | TournamentEvent::BreakEnded { tournament_id, .. }
            | TournamentEvent::TimeAdded { tournament_id, .. }
            | TournamentEvent::TournamentFinished { tournament_id }
            | TournamentEvent::ClockDeleted { tournament_id }
            | TournamentEvent::PlayerRegistered { tournament_id, .. }
            | TournamentEvent::PlayerRemoved { tournament_id, .. }
            | TournamentEvent::PlayerBusted { tournament_id, .. }
            | TournamentEvent::BountyAwarded { tournament_id, .. }
            | TournamentEvent::PlayerReentered { tournament_id, .. }
            | TournamentEvent::ReentryDeclined { tournament_id, .. }
            | TournamentEvent::RebuyProcessed { tournament_id, .. }
            | TournamentEvent::AddonProcessed { tournament_id, .. }
            | TournamentEvent::TournamentCompleted { tournament_id, .. }
            | TournamentEvent::TableAdded { tournament_id, .. }
            | TournamentEvent::TableRemoved { tournament_id, .. }
            | TournamentEvent::PlayerSeated { tournament_id, .. }
            | TournamentEvent::PlayerUnseated { tournament_id, .. }
            | TournamentEvent::PlayerMoved { tournament_id, .. }
            | TournamentEvent::TablesBalanced { tournament_id, .. }
            | TournamentEvent::TableBroken { tournament_id, .. } => *tournament_id,
        }
    }
}

/// Fan-out of events to bounded subscriber channels
///
/// Publishing never blocks: a full subscriber misses the event, a closed
/// one is dropped.
#[derive(Debug, Clone)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<mpsc::Sender<TournamentEvent>>>>,
    buffer: usize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

impl EventBus {
    /// Create a bus whose subscribers buffer up to `buffer` events
    pub fn new(buffer: usize) -> Self {
        Self {
            subscribers: Arc::new(Mutex::new(Vec::new())),
            buffer: buffer.max(1),
        }
    }

    /// Register a new subscriber
    pub fn subscribe(&self) -> mpsc::Receiver<TournamentEvent> {
        let (sender, receiver) = mpsc::channel(self.buffer);
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(sender);
        receiver
    }

    /// Deliver an event to every live subscriber
    pub fn publish(&self, event: TournamentEvent) {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        subscribers.retain(|sender| match sender.try_send(event.clone()) {
            Ok(_) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                log::warn!(
                    "Subscriber channel full, dropping event for tournament {}",
                    event.tournament_id()
                );
                true
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                log::debug!("Subscriber disconnected, removing");
                false
            }
        });
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_reaches_every_subscriber() {
        let bus = EventBus::new(4);
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        bus.publish(TournamentEvent::TournamentFinished { tournament_id: 3 });

        assert_eq!(
            first.recv().await,
            Some(TournamentEvent::TournamentFinished { tournament_id: 3 })
        );
        assert_eq!(
            second.recv().await,
            Some(TournamentEvent::TournamentFinished { tournament_id: 3 })
        );
    }

    #[tokio::test]
    async fn test_closed_subscribers_are_dropped() {
        let bus = EventBus::new(4);
        let receiver = bus.subscribe();
        let _kept = bus.subscribe();
        drop(receiver);

        bus.publish(TournamentEvent::ClockDeleted { tournament_id: 1 });
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[tokio::test]
    async fn test_full_subscriber_misses_events_but_stays() {
        let bus = EventBus::new(1);
        let mut receiver = bus.subscribe();

        bus.publish(TournamentEvent::ClockDeleted { tournament_id: 1 });
        bus.publish(TournamentEvent::ClockDeleted { tournament_id: 2 });

        assert_eq!(bus.subscriber_count(), 1);
        assert_eq!(receiver.recv().await.map(|e| e.tournament_id()), Some(1));
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn test_events_serialize_with_type_tag() {
        let event = TournamentEvent::PlayerSeated {
            tournament_id: 1,
            player_id: 2,
            table_id: 3,
            seat_number: 4,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "player_seated");
        assert_eq!(json["seat_number"], 4);
    }
}
