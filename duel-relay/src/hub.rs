use dashmap::DashMap;
use duel_types::{BroadcastEvent, PresenceEntry, RoomId, ServerFrame};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::RelayError;
use crate::websocket::connection::{ConnectionId, ConnectionManager};

#[derive(Debug, Clone)]
struct Member {
    connection_id: ConnectionId,
    presence: PresenceEntry,
}

/// Public view of a room: who is in it, nothing about the game.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub room_id: RoomId,
    pub player_count: usize,
    pub players: Vec<String>,
}

/// Rooms keyed by id, each a small set of subscribed connections with their
/// presence payloads. The hub only relays: it never reads event payloads.
pub struct RoomHub {
    rooms: DashMap<RoomId, Vec<Member>>,
    memberships: DashMap<ConnectionId, RoomId>,
    connection_manager: Arc<ConnectionManager>,
    capacity: usize,
}

impl RoomHub {
    pub fn new(connection_manager: Arc<ConnectionManager>, capacity: usize) -> Self {
        Self {
            rooms: DashMap::new(),
            memberships: DashMap::new(),
            connection_manager,
            capacity,
        }
    }

    pub fn room_of(&self, connection_id: ConnectionId) -> Option<RoomId> {
        self.memberships
            .get(&connection_id)
            .map(|room| room.value().clone())
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn summary(&self, room_id: &str) -> Option<RoomSummary> {
        self.rooms.get(room_id).map(|members| RoomSummary {
            room_id: room_id.to_string(),
            player_count: members.len(),
            players: members.iter().map(|m| m.presence.name.clone()).collect(),
        })
    }

    /// Subscribe a connection to a room. A player id already present (a
    /// reopened tab) takes over its old seat; anyone else is turned away
    /// once the room is at capacity.
    pub async fn join(
        &self,
        connection_id: ConnectionId,
        room_id: RoomId,
        presence: PresenceEntry,
    ) -> Result<(), RelayError> {
        if let Some(current) = self.room_of(connection_id) {
            if current != room_id {
                return Err(RelayError::AlreadyJoined { room_id: current });
            }
            return self.track(connection_id, presence).await;
        }

        let replaced = {
            let mut members = self.rooms.entry(room_id.clone()).or_default();
            let others = members
                .iter()
                .filter(|m| m.presence.id != presence.id)
                .count();
            if others >= self.capacity {
                return Err(RelayError::RoomFull { room_id });
            }

            let replaced: Vec<ConnectionId> = members
                .iter()
                .filter(|m| m.presence.id == presence.id)
                .map(|m| m.connection_id)
                .collect();
            members.retain(|m| m.presence.id != presence.id);
            members.push(Member {
                connection_id,
                presence: presence.clone(),
            });
            replaced
        };

        for old in replaced {
            info!("Player {} moved from connection {} to {}", presence.id, old, connection_id);
            self.memberships.remove(&old);
            self.connection_manager.set_connection_room(old, None).await;
        }

        self.memberships.insert(connection_id, room_id.clone());
        self.connection_manager
            .set_connection_room(connection_id, Some(room_id.clone()))
            .await;
        info!("{} ({}) joined room {}", presence.name, presence.id, room_id);

        self.connection_manager
            .send_to_connection(
                connection_id,
                ServerFrame::Subscribed {
                    room_id: room_id.clone(),
                },
            )
            .await?;
        self.sync_presence(&room_id).await;
        Ok(())
    }

    /// Replace the presence payload of a subscribed connection.
    pub async fn track(
        &self,
        connection_id: ConnectionId,
        presence: PresenceEntry,
    ) -> Result<(), RelayError> {
        let room_id = self.room_of(connection_id).ok_or(RelayError::NotInRoom)?;

        {
            let mut members = self.rooms.get_mut(&room_id).ok_or(RelayError::NotInRoom)?;
            let member = members
                .iter_mut()
                .find(|m| m.connection_id == connection_id)
                .ok_or(RelayError::NotInRoom)?;
            if member.presence.id != presence.id {
                return Err(RelayError::InvalidFrame(
                    "presence id cannot change after joining".to_string(),
                ));
            }
            member.presence = presence;
        }

        self.sync_presence(&room_id).await;
        Ok(())
    }

    /// Fan an event out to every other member of the sender's room. Returns
    /// how many connections it was handed to.
    pub async fn broadcast(
        &self,
        connection_id: ConnectionId,
        event: BroadcastEvent,
    ) -> Result<usize, RelayError> {
        let room_id = self.room_of(connection_id).ok_or(RelayError::NotInRoom)?;

        let (from, recipients) = {
            let members = self.rooms.get(&room_id).ok_or(RelayError::NotInRoom)?;
            let sender = members
                .iter()
                .find(|m| m.connection_id == connection_id)
                .ok_or(RelayError::NotInRoom)?;
            let recipients: Vec<ConnectionId> = members
                .iter()
                .filter(|m| m.connection_id != connection_id)
                .map(|m| m.connection_id)
                .collect();
            (sender.presence.id.clone(), recipients)
        };

        debug!("Relaying {} from {} in room {}", event.name(), from, room_id);

        let mut delivered = 0;
        for recipient in recipients {
            let frame = ServerFrame::Broadcast {
                from: from.clone(),
                event: event.clone(),
            };
            match self.connection_manager.send_to_connection(recipient, frame).await {
                Ok(()) => delivered += 1,
                Err(e) => warn!("Failed to relay to {}: {}", recipient, e),
            }
        }
        Ok(delivered)
    }

    /// Drop a connection from its room. Returns the room it was in.
    pub async fn leave(&self, connection_id: ConnectionId) -> Option<RoomId> {
        let (_, room_id) = self.memberships.remove(&connection_id)?;

        if let Some(mut members) = self.rooms.get_mut(&room_id) {
            members.retain(|m| m.connection_id != connection_id);
        }
        self.rooms.remove_if(&room_id, |_, members| members.is_empty());
        self.connection_manager
            .set_connection_room(connection_id, None)
            .await;

        info!("Connection {} left room {}", connection_id, room_id);
        self.sync_presence(&room_id).await;
        Some(room_id)
    }

    async fn sync_presence(&self, room_id: &str) {
        let (players, recipients) = match self.rooms.get(room_id) {
            Some(members) => (
                members.iter().map(|m| m.presence.clone()).collect::<Vec<_>>(),
                members.iter().map(|m| m.connection_id).collect::<Vec<_>>(),
            ),
            None => return,
        };

        for recipient in recipients {
            let frame = ServerFrame::PresenceSync {
                players: players.clone(),
            };
            if let Err(e) = self.connection_manager.send_to_connection(recipient, frame).await {
                warn!("Failed to sync presence to {}: {}", recipient, e);
            }
        }
    }
}
