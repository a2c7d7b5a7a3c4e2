//! Boundary to the presence + broadcast transport.
//!
//! A session only ever talks to the room through a [`Channel`]. Sends are
//! fire-and-forget: a failure is reported back so it can be logged, and the
//! session moves on without retrying.

use duel_types::{BroadcastEvent, PlayerId, PresenceEntry};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("channel is closed")]
    Closed,
    #[error("not subscribed to the room yet")]
    NotSubscribed,
    #[error("send rejected: {0}")]
    Rejected(String),
}

pub trait Channel: Send {
    /// Announce (or update) the local presence payload.
    fn track(&self, presence: &PresenceEntry) -> Result<(), TransportError>;

    /// Send an event to every other subscriber of the room.
    fn send(&self, event: &BroadcastEvent) -> Result<(), TransportError>;

    /// Leave the room. Safe to call more than once.
    fn unsubscribe(&self);
}

/// Everything the transport can deliver to a session.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// The subscription is live; presence may now be announced.
    Subscribed,
    /// Full presence snapshot after any join or leave.
    PresenceSync(Vec<PresenceEntry>),
    Broadcast { from: PlayerId, event: BroadcastEvent },
}
