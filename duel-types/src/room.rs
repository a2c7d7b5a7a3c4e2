use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use ts_rs::TS;

use crate::{Player, PlayerId};

/// One client's replica of the shared room.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RoomState {
    pub players: HashMap<PlayerId, Player>,
    /// Keyed by the player who has to guess the word, set by their opponent.
    pub target_words: HashMap<PlayerId, String>,
    pub game_over: bool,
    pub current_round: u32,
    pub round_end_time: i64, // epoch millis, 0 when no round is running
    pub round_started: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub last_outcome: Option<RoundOutcome>,
}

impl RoomState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn player(&self, id: &str) -> Option<&Player> {
        self.players.get(id)
    }

    pub fn all_words_set(&self) -> bool {
        !self.players.is_empty() && self.players.values().all(|p| p.has_set_word)
    }

    pub fn all_finished(&self) -> bool {
        !self.players.is_empty() && self.players.values().all(Player::is_finished)
    }

    /// Reset per-round fields on every player and drop this round's words.
    pub fn reset_round(&mut self) {
        for player in self.players.values_mut() {
            player.reset_round();
        }
        self.target_words.clear();
        self.game_over = false;
        self.round_end_time = 0;
        self.round_started = false;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum RoundPhase {
    WaitingForPlayers,
    WordSetting,
    PlayingRound,
    RoundComplete,
}

/// Snapshot of a finished round, taken before per-round fields are wiped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RoundOutcome {
    pub round: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub winner_id: Option<PlayerId>,
    pub points_awarded: i32,
    pub target_words: HashMap<PlayerId, String>,
    pub guesses_used: HashMap<PlayerId, usize>,
    pub solved: HashMap<PlayerId, bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum RoundVerdict {
    Won,
    Lost,
    /// Both solved in the same number of turns; the solve time broke the tie.
    Draw,
    NoWinner,
}

impl RoundOutcome {
    /// How the round went from one player's point of view.
    pub fn verdict_for(&self, player_id: &str) -> RoundVerdict {
        let Some(winner) = &self.winner_id else {
            return RoundVerdict::NoWinner;
        };

        let solved_in = |id: &str| {
            self.solved
                .get(id)
                .copied()
                .unwrap_or(false)
                .then(|| self.guesses_used.get(id).copied().unwrap_or(0))
        };

        if winner == player_id {
            return RoundVerdict::Won;
        }

        match (solved_in(player_id), solved_in(winner)) {
            (Some(mine), Some(theirs)) if mine == theirs => RoundVerdict::Draw,
            _ => RoundVerdict::Lost,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(winner: Option<&str>, a: (usize, bool), b: (usize, bool)) -> RoundOutcome {
        RoundOutcome {
            round: 1,
            winner_id: winner.map(str::to_string),
            points_awarded: 0,
            target_words: HashMap::new(),
            guesses_used: HashMap::from([("a".to_string(), a.0), ("b".to_string(), b.0)]),
            solved: HashMap::from([("a".to_string(), a.1), ("b".to_string(), b.1)]),
        }
    }

    #[test]
    fn test_verdicts() {
        let o = outcome(Some("a"), (3, true), (5, true));
        assert_eq!(o.verdict_for("a"), RoundVerdict::Won);
        assert_eq!(o.verdict_for("b"), RoundVerdict::Lost);

        let tie = outcome(Some("a"), (4, true), (4, true));
        assert_eq!(tie.verdict_for("b"), RoundVerdict::Draw);

        let nobody = outcome(None, (6, false), (6, false));
        assert_eq!(nobody.verdict_for("a"), RoundVerdict::NoWinner);
        assert_eq!(nobody.verdict_for("b"), RoundVerdict::NoWinner);
    }

    #[test]
    fn test_room_predicates() {
        let mut room = RoomState::new();
        assert!(!room.all_words_set());
        assert!(!room.all_finished());

        room.players.insert("a".into(), Player::new("a", "A"));
        room.players.insert("b".into(), Player::new("b", "B"));
        room.players.get_mut("a").unwrap().has_set_word = true;
        assert!(!room.all_words_set());
        room.players.get_mut("b").unwrap().has_set_word = true;
        assert!(room.all_words_set());

        room.players.get_mut("a").unwrap().game_complete = true;
        room.players.get_mut("b").unwrap().current_row = 6;
        assert!(room.all_finished());
    }
}
