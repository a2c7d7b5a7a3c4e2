use duel_types::{RoomId, ServerFrame};
use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};
use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

use crate::error::RelayError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct Connection {
    pub id: ConnectionId,
    pub connected_at: Instant,
    pub last_activity: Instant,
    pub room_id: Option<RoomId>,
    pub sender: mpsc::UnboundedSender<ServerFrame>,
}

impl Connection {
    pub fn new(id: ConnectionId) -> (Self, mpsc::UnboundedReceiver<ServerFrame>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let now = Instant::now();

        let connection = Self {
            id,
            connected_at: now,
            last_activity: now,
            room_id: None,
            sender,
        };

        (connection, receiver)
    }

    pub fn update_activity(&mut self) {
        self.last_activity = Instant::now();
    }

    pub fn send_frame(&self, frame: ServerFrame) -> Result<(), RelayError> {
        self.sender
            .send(frame)
            .map_err(|_| RelayError::ConnectionClosed)
    }

    pub fn is_inactive(&self, timeout: Duration) -> bool {
        self.last_activity.elapsed() > timeout
    }
}

/// Every open socket and the outbound queue feeding it. Dropping a
/// connection here closes its queue, which ends the socket's writer task.
pub struct ConnectionManager {
    connections: RwLock<HashMap<ConnectionId, Connection>>,
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    pub async fn create_connection(&self, id: ConnectionId) -> mpsc::UnboundedReceiver<ServerFrame> {
        let (conn, receiver) = Connection::new(id);
        self.connections.write().await.insert(id, conn);
        receiver
    }

    pub async fn remove_connection(&self, id: ConnectionId) -> Option<Connection> {
        self.connections.write().await.remove(&id)
    }

    pub async fn get_connection(&self, id: ConnectionId) -> Option<Connection> {
        self.connections.read().await.get(&id).cloned()
    }

    pub async fn update_activity(&self, id: ConnectionId) {
        let mut connections = self.connections.write().await;
        if let Some(connection) = connections.get_mut(&id) {
            connection.update_activity();
        }
    }

    pub async fn set_connection_room(&self, id: ConnectionId, room_id: Option<RoomId>) {
        let mut connections = self.connections.write().await;
        if let Some(connection) = connections.get_mut(&id) {
            connection.room_id = room_id;
        }
    }

    pub async fn send_to_connection(
        &self,
        id: ConnectionId,
        frame: ServerFrame,
    ) -> Result<(), RelayError> {
        let connections = self.connections.read().await;
        match connections.get(&id) {
            Some(connection) => connection.send_frame(frame),
            None => Err(RelayError::ConnectionNotFound),
        }
    }

    /// Drop connections idle for longer than `timeout` and return their ids.
    pub async fn cleanup_inactive_connections(&self, timeout: Duration) -> Vec<ConnectionId> {
        let inactive: Vec<ConnectionId> = {
            let connections = self.connections.read().await;
            connections
                .values()
                .filter(|conn| conn.is_inactive(timeout))
                .map(|conn| conn.id)
                .collect()
        };

        for connection_id in &inactive {
            tracing::info!("Removing inactive connection: {}", connection_id);
            self.remove_connection(*connection_id).await;
        }
        inactive
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }
}
