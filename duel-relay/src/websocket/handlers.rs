use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::RelayError;
use crate::hub::RoomHub;
use crate::websocket::connection::{ConnectionId, ConnectionManager};
use duel_types::{BroadcastEvent, ClientFrame, PresenceEntry, RoomId, ServerFrame};

#[derive(Clone)]
pub struct MessageHandler {
    connection_id: ConnectionId,
    connection_manager: Arc<ConnectionManager>,
    hub: Arc<RoomHub>,
}

impl MessageHandler {
    pub fn new(
        connection_id: ConnectionId,
        connection_manager: Arc<ConnectionManager>,
        hub: Arc<RoomHub>,
    ) -> Self {
        Self {
            connection_id,
            connection_manager,
            hub,
        }
    }

    /// Handle one client frame. Errors the client can act on are reported
    /// back as frames; only a dead connection is returned as an error.
    pub async fn handle_message(&self, frame: ClientFrame) -> Result<(), RelayError> {
        self.connection_manager
            .update_activity(self.connection_id)
            .await;

        let result = match frame {
            ClientFrame::Join { room_id, presence } => self.handle_join(room_id, presence).await,
            ClientFrame::Track { presence } => self.hub.track(self.connection_id, presence).await,
            ClientFrame::Broadcast { event } => self.handle_broadcast(event).await,
            ClientFrame::Leave => {
                self.hub.leave(self.connection_id).await;
                Ok(())
            }
            ClientFrame::Heartbeat => Ok(()),
        };

        match result {
            Ok(()) => Ok(()),
            Err(RelayError::ConnectionClosed) | Err(RelayError::ConnectionNotFound) => {
                Err(RelayError::ConnectionClosed)
            }
            Err(RelayError::RoomFull { room_id }) => {
                self.send_frame(ServerFrame::RoomFull { room_id }).await
            }
            Err(e) => {
                self.send_frame(ServerFrame::Error {
                    message: e.to_string(),
                })
                .await
            }
        }
    }

    pub async fn handle_disconnect(&self) {
        if let Some(room_id) = self.hub.leave(self.connection_id).await {
            info!(
                "Connection {} dropped out of room {}",
                self.connection_id, room_id
            );
        }
    }

    async fn handle_join(&self, room_id: RoomId, presence: PresenceEntry) -> Result<(), RelayError> {
        if room_id.trim().is_empty() {
            return Err(RelayError::InvalidFrame("room id is empty".to_string()));
        }
        if presence.id.trim().is_empty() {
            return Err(RelayError::InvalidFrame("player id is empty".to_string()));
        }

        match self.hub.join(self.connection_id, room_id.clone(), presence).await {
            Err(RelayError::RoomFull { room_id }) => {
                warn!(
                    "Connection {} turned away from full room {}",
                    self.connection_id, room_id
                );
                Err(RelayError::RoomFull { room_id })
            }
            other => other,
        }
    }

    async fn handle_broadcast(&self, event: BroadcastEvent) -> Result<(), RelayError> {
        let delivered = self.hub.broadcast(self.connection_id, event).await?;
        debug!("Broadcast from {} reached {} peers", self.connection_id, delivered);
        Ok(())
    }

    async fn send_frame(&self, frame: ServerFrame) -> Result<(), RelayError> {
        self.connection_manager
            .send_to_connection(self.connection_id, frame)
            .await
    }
}
