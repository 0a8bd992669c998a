//! Event types for the PharmaVaidya event system
//!
//! Events are broadcast via [`EventBus`] and serialized for SSE transmission.
//! Transient user notices travel on the same bus as domain events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::VoteDirection;

/// How prominently a notice should be shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeSeverity {
    Info,
    Warning,
    Error,
}

/// PharmaVaidya event types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum VaidyaEvent {
    /// Transient message for the user (toast)
    Notice {
        /// Target profile, None for everyone
        profile_id: Option<String>,
        severity: NoticeSeverity,
        title: String,
        description: String,
        timestamp: DateTime<Utc>,
    },

    /// A remedy passed verification and was stored
    RemedySubmitted {
        remedy_id: String,
        plant_name: String,
        timestamp: DateTime<Utc>,
    },

    /// Verification judged a remedy implausible
    RemedyRejected {
        plant_name: String,
        notes: String,
        timestamp: DateTime<Utc>,
    },

    /// Vote counters changed
    RemedyVoted {
        remedy_id: String,
        direction: VoteDirection,
        upvotes: u32,
        downvotes: u32,
        timestamp: DateTime<Utc>,
    },

    /// Points were added to a profile
    PointsAwarded {
        profile_id: String,
        points: u64,
        total: u64,
        reason: String,
        timestamp: DateTime<Utc>,
    },

    /// Pronunciation game changed state
    GameStateChanged {
        session_id: Uuid,
        state: String,
        timestamp: DateTime<Utc>,
    },
}

impl VaidyaEvent {
    /// Build a notice stamped with the current time
    pub fn notice(
        profile_id: Option<&str>,
        severity: NoticeSeverity,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        VaidyaEvent::Notice {
            profile_id: profile_id.map(str::to_string),
            severity,
            title: title.into(),
            description: description.into(),
            timestamp: Utc::now(),
        }
    }

    /// SSE event name
    pub fn event_type(&self) -> &str {
        match self {
            VaidyaEvent::Notice { .. } => "Notice",
            VaidyaEvent::RemedySubmitted { .. } => "RemedySubmitted",
            VaidyaEvent::RemedyRejected { .. } => "RemedyRejected",
            VaidyaEvent::RemedyVoted { .. } => "RemedyVoted",
            VaidyaEvent::PointsAwarded { .. } => "PointsAwarded",
            VaidyaEvent::GameStateChanged { .. } => "GameStateChanged",
        }
    }
}

/// Broadcast channel shared by all components
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<VaidyaEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// Slow subscribers lose the oldest events once `capacity` are buffered.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<VaidyaEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: VaidyaEvent,
    ) -> Result<usize, broadcast::error::SendError<VaidyaEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: VaidyaEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
