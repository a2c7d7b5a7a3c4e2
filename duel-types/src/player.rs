use serde::{Deserialize, Serialize};
use ts_rs::TS;

pub type PlayerId = String;
pub type RoomId = String;

/// Letters in every target word and guess.
pub const WORD_LENGTH: usize = 5;
/// Guess slots each player gets per round.
pub const MAX_GUESSES: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub guesses: Vec<String>, // always MAX_GUESSES slots, "" when empty
    pub current_row: usize,
    pub game_complete: bool,
    pub is_winner: bool,
    pub score: i32,
    pub rounds_won: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub solve_time: Option<i64>, // epoch millis
    #[serde(default)]
    pub has_set_word: bool,
}

impl Player {
    pub fn new(id: impl Into<PlayerId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            guesses: empty_guesses(),
            current_row: 0,
            game_complete: false,
            is_winner: false,
            score: 0,
            rounds_won: 0,
            solve_time: None,
            has_set_word: false,
        }
    }

    /// Clear everything scoped to a single round, keeping score and rounds won.
    pub fn reset_round(&mut self) {
        self.guesses = empty_guesses();
        self.current_row = 0;
        self.game_complete = false;
        self.is_winner = false;
        self.solve_time = None;
        self.has_set_word = false;
    }

    pub fn reset_scores(&mut self) {
        self.score = 0;
        self.rounds_won = 0;
    }

    /// Number of guesses submitted this round.
    pub fn guesses_used(&self) -> usize {
        self.current_row
    }

    /// A player is done once they solved their word or ran out of rows.
    pub fn is_finished(&self) -> bool {
        self.game_complete || self.current_row >= MAX_GUESSES
    }

    /// Guesses that have actually been submitted, oldest first.
    pub fn submitted_guesses(&self) -> impl Iterator<Item = &str> {
        self.guesses
            .iter()
            .take(self.current_row.min(MAX_GUESSES))
            .map(String::as_str)
    }
}

pub fn empty_guesses() -> Vec<String> {
    vec![String::new(); MAX_GUESSES]
}

/// What each client announces on the presence channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PresenceEntry {
    pub id: PlayerId,
    pub name: String,
    pub joined_at: i64, // epoch millis
}

impl PresenceEntry {
    pub fn new(id: impl Into<PlayerId>, name: impl Into<String>, joined_at: i64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            joined_at,
        }
    }
}
