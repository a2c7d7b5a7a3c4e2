//! Reload resilience: remembers who this tab joined a room as.
//!
//! Storage is scoped like browser session storage. Rejoining with a saved
//! identity creates a new presence entry; nothing about the round resumes.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::warn;

pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String);
    fn remove(&self, key: &str);
}

#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: String) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), value);
        }
    }

    fn remove(&self, key: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(key);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedPlayer {
    pub name: String,
    pub id: String,
}

pub fn storage_key(room_id: &str) -> String {
    format!("wordle_room_{room_id}_player")
}

pub fn save(store: &dyn SessionStore, room_id: &str, player: &SavedPlayer) {
    match serde_json::to_string(player) {
        Ok(json) => store.set(&storage_key(room_id), json),
        Err(e) => warn!("Failed to serialize saved player for room {}: {}", room_id, e),
    }
}

/// Load the saved identity for a room. Corrupt data counts as nothing saved.
pub fn load(store: &dyn SessionStore, room_id: &str) -> Option<SavedPlayer> {
    let raw = store.get(&storage_key(room_id))?;
    match serde_json::from_str(&raw) {
        Ok(player) => Some(player),
        Err(e) => {
            warn!("Ignoring malformed saved player for room {}: {}", room_id, e);
            None
        }
    }
}

pub fn clear(store: &dyn SessionStore, room_id: &str) {
    store.remove(&storage_key(room_id));
}
