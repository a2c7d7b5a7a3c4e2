//! Client side of the relay: a [`Channel`] that speaks relay frames, and the
//! mapping from what the relay sends back to session input.

use duel_core::{Channel, Inbound, TransportError};
use duel_types::{BroadcastEvent, ClientFrame, PresenceEntry, RoomId, ServerFrame};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tracing::warn;

use crate::error::RelayError;

/// Queues client frames for whatever task owns the socket.
pub struct RelayChannel {
    outgoing: mpsc::UnboundedSender<ClientFrame>,
    closed: AtomicBool,
}

impl RelayChannel {
    /// Send the `Join` frame for `room_id` and return the channel plus the
    /// receiving end of its frame queue.
    pub fn connect(
        room_id: RoomId,
        presence: PresenceEntry,
    ) -> (Self, mpsc::UnboundedReceiver<ClientFrame>) {
        let (outgoing, receiver) = mpsc::unbounded_channel();
        // The receiver is alive here, so this cannot fail
        let _ = outgoing.send(ClientFrame::Join { room_id, presence });

        let channel = Self {
            outgoing,
            closed: AtomicBool::new(false),
        };
        (channel, receiver)
    }

    fn push(&self, frame: ClientFrame) -> Result<(), TransportError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TransportError::NotSubscribed);
        }
        self.outgoing
            .send(frame)
            .map_err(|_| TransportError::Closed)
    }
}

impl Channel for RelayChannel {
    fn track(&self, presence: &PresenceEntry) -> Result<(), TransportError> {
        self.push(ClientFrame::Track {
            presence: presence.clone(),
        })
    }

    fn send(&self, event: &BroadcastEvent) -> Result<(), TransportError> {
        self.push(ClientFrame::Broadcast {
            event: event.clone(),
        })
    }

    fn unsubscribe(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            let _ = self.outgoing.send(ClientFrame::Leave);
        }
    }
}

/// Turn a relay frame into session input. Refusals become errors.
pub fn inbound_from_frame(frame: ServerFrame) -> Result<Inbound, RelayError> {
    match frame {
        ServerFrame::Subscribed { .. } => Ok(Inbound::Subscribed),
        ServerFrame::PresenceSync { players } => Ok(Inbound::PresenceSync(players)),
        ServerFrame::Broadcast { from, event } => Ok(Inbound::Broadcast { from, event }),
        ServerFrame::RoomFull { room_id } => Err(RelayError::RoomFull { room_id }),
        ServerFrame::Error { message } => {
            warn!("Relay reported an error: {}", message);
            Err(RelayError::InvalidFrame(message))
        }
    }
}
