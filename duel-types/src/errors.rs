use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

/// Why a local action was refused. A refused action never changes state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum GameError {
    InvalidWord { word: String },
    InvalidGuess { guess: String },
    AlreadyGuessed { guess: String },
    WordAlreadySet,
    NotHost,
    NotEnoughPlayers { present: usize },
    NoOpponent,
    RoundNotActive,
    PlayerAlreadyComplete,
    NoTargetWord,
    UnknownPlayer { player_id: String },
    InvalidPhase { current_phase: String },
    RoomFull { room_id: String },
}

impl GameError {
    /// Input mistakes are shown to the user; everything else is a guard that
    /// is quietly ignored.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            GameError::InvalidWord { .. }
                | GameError::InvalidGuess { .. }
                | GameError::AlreadyGuessed { .. }
                | GameError::WordAlreadySet
                | GameError::RoomFull { .. }
        )
    }
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameError::InvalidWord { word } => write!(f, "'{word}' is not a 5-letter word"),
            GameError::InvalidGuess { guess } => write!(f, "'{guess}' is not a 5-letter guess"),
            GameError::AlreadyGuessed { guess } => write!(f, "you already tried {guess}"),
            GameError::WordAlreadySet => write!(f, "you already chose a word this round"),
            GameError::NotHost => write!(f, "only the host can do that"),
            GameError::NotEnoughPlayers { present } => {
                write!(f, "need 2 players, {present} present")
            }
            GameError::NoOpponent => write!(f, "no opponent in the room"),
            GameError::RoundNotActive => write!(f, "round has not started"),
            GameError::PlayerAlreadyComplete => write!(f, "you have already finished this round"),
            GameError::NoTargetWord => write!(f, "no word has been set for you yet"),
            GameError::UnknownPlayer { player_id } => write!(f, "unknown player {player_id}"),
            GameError::InvalidPhase { current_phase } => {
                write!(f, "not allowed during {current_phase}")
            }
            GameError::RoomFull { room_id } => write!(f, "room {room_id} already has two players"),
        }
    }
}

impl std::error::Error for GameError {}
