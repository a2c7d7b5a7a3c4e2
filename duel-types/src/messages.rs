use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use ts_rs::TS;

use crate::{Player, PlayerId, PresenceEntry, RoomId};

/// Every event a peer can broadcast to the room, tagged by the event name
/// the browser client listens for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "event", content = "payload", rename_all = "kebab-case")]
#[ts(export)]
pub enum BroadcastEvent {
    WordSet(WordSetPayload),
    StartToPlay(StartToPlayPayload),
    GuessUpdate(GuessUpdatePayload),
    RoundEnd(RoundEndPayload),
    RoundStart(RoundStartPayload),
}

impl BroadcastEvent {
    pub fn name(&self) -> &'static str {
        match self {
            BroadcastEvent::WordSet(_) => "word-set",
            BroadcastEvent::StartToPlay(_) => "start-to-play",
            BroadcastEvent::GuessUpdate(_) => "guess-update",
            BroadcastEvent::RoundEnd(_) => "round-end",
            BroadcastEvent::RoundStart(_) => "round-start",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct WordSetPayload {
    pub setter_id: PlayerId,
    pub target_player_id: PlayerId,
    pub word: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StartToPlayPayload {
    pub round_end_time: i64,
    pub current_round: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct GuessUpdatePayload {
    pub id: PlayerId,
    pub guesses: Vec<String>,
    pub current_row: usize,
    pub game_complete: bool,
    pub is_winner: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub solve_time: Option<i64>,
}

impl GuessUpdatePayload {
    pub fn from_player(player: &Player) -> Self {
        Self {
            id: player.id.clone(),
            guesses: player.guesses.clone(),
            current_row: player.current_row,
            game_complete: player.game_complete,
            is_winner: player.is_winner,
            solve_time: player.solve_time,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RoundEndPayload {
    pub round_winner_id: Option<PlayerId>,
    /// Authoritative player map, scores already applied.
    pub players: HashMap<PlayerId, Player>,
    #[serde(default)]
    pub round: u32,
    #[serde(default)]
    pub points_awarded: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RoundStartPayload {
    #[serde(default)]
    pub round: u32,
    /// Set when the host started a brand new game and scores must be zeroed.
    #[serde(default)]
    pub fresh_game: bool,
}

/// Frames a client sends to the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all_fields = "camelCase")]
#[ts(export)]
pub enum ClientFrame {
    Join { room_id: RoomId, presence: PresenceEntry },
    Track { presence: PresenceEntry },
    Broadcast { event: BroadcastEvent },
    Leave,
    Heartbeat,
}

/// Frames the relay pushes to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all_fields = "camelCase")]
#[ts(export)]
pub enum ServerFrame {
    Subscribed { room_id: RoomId },
    PresenceSync { players: Vec<PresenceEntry> },
    Broadcast { from: PlayerId, event: BroadcastEvent },
    RoomFull { room_id: RoomId },
    Error { message: String },
}
