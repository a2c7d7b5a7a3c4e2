use duel_types::{
    GameError, GuessUpdatePayload, MAX_GUESSES, Player, PresenceEntry, RoomState, RoundEndPayload,
    RoundOutcome, RoundPhase,
};
use std::collections::HashMap;
use tracing::debug;

use crate::ScoringEngine;

/// Local replica of the room plus the explicit phase tag.
///
/// Every mutation of round bookkeeping goes through here, whether it comes
/// from a local action or from a replicated broadcast.
#[derive(Debug, Clone)]
pub struct Round {
    state: RoomState,
    phase: RoundPhase,
}

impl Default for Round {
    fn default() -> Self {
        Self::new()
    }
}

impl Round {
    pub fn new() -> Self {
        Self {
            state: RoomState::new(),
            phase: RoundPhase::WaitingForPlayers,
        }
    }

    pub fn state(&self) -> &RoomState {
        &self.state
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn player(&self, id: &str) -> Option<&Player> {
        self.state.players.get(id)
    }

    pub fn target_word(&self, id: &str) -> Option<&str> {
        self.state.target_words.get(id).map(String::as_str)
    }

    /// Move to `phase`, returning the previous one when it actually changed.
    pub(crate) fn set_phase(&mut self, phase: RoundPhase) -> Option<RoundPhase> {
        if self.phase == phase {
            return None;
        }
        debug!("Phase {:?} -> {:?}", self.phase, phase);
        Some(std::mem::replace(&mut self.phase, phase))
    }

    pub fn add_player(&mut self, entry: &PresenceEntry) {
        self.state
            .players
            .entry(entry.id.clone())
            .and_modify(|player| player.name = entry.name.clone())
            .or_insert_with(|| Player::new(entry.id.clone(), entry.name.clone()));
    }

    pub fn remove_player(&mut self, id: &str) {
        self.state.players.remove(id);
        self.state.target_words.remove(id);
    }

    /// Wipe scores and round counters for a brand new game.
    pub fn reset_game(&mut self) {
        for player in self.state.players.values_mut() {
            player.reset_scores();
        }
        self.state.reset_round();
        self.state.current_round = 0;
        self.state.last_outcome = None;
    }

    /// Enter word setting for round number `round`.
    pub fn begin_word_setting(&mut self, round: u32) -> Option<RoundPhase> {
        self.state.reset_round();
        self.state.current_round = round;
        self.set_phase(RoundPhase::WordSetting)
    }

    /// Record that `setter_id` chose `word` for `target_id`. Returns true when
    /// this completes the set of words. Words are fixed once chosen and only
    /// accepted before play starts.
    pub fn record_word(
        &mut self,
        setter_id: &str,
        target_id: &str,
        word: &str,
    ) -> Result<bool, GameError> {
        if self.state.round_started || self.state.game_over {
            return Err(GameError::InvalidPhase {
                current_phase: format!("{:?}", self.phase),
            });
        }

        let setter = self
            .state
            .players
            .get_mut(setter_id)
            .ok_or_else(|| GameError::UnknownPlayer {
                player_id: setter_id.to_string(),
            })?;
        if setter.has_set_word {
            return Err(GameError::WordAlreadySet);
        }

        setter.has_set_word = true;
        self.state
            .target_words
            .insert(target_id.to_string(), word.to_string());

        Ok(self.state.all_words_set())
    }

    /// Adopt a round deadline and start guessing.
    pub fn start_play(&mut self, round_end_time: i64, round: u32) -> Option<RoundPhase> {
        self.state.round_started = true;
        self.state.round_end_time = round_end_time;
        self.state.current_round = round;
        self.state.game_over = false;
        self.set_phase(RoundPhase::PlayingRound)
    }

    /// Place a guess in the local player's next row.
    pub fn submit_guess(
        &mut self,
        player_id: &str,
        guess: &str,
        now_ms: i64,
    ) -> Result<&Player, GameError> {
        if !self.state.round_started || self.state.game_over {
            return Err(GameError::RoundNotActive);
        }

        let target = self
            .state
            .target_words
            .get(player_id)
            .cloned()
            .ok_or(GameError::NoTargetWord)?;

        let player = self
            .state
            .players
            .get_mut(player_id)
            .ok_or_else(|| GameError::UnknownPlayer {
                player_id: player_id.to_string(),
            })?;

        if player.is_finished() {
            return Err(GameError::PlayerAlreadyComplete);
        }

        let row = player.current_row;
        let is_correct = guess == target;

        player.guesses[row] = guess.to_string();
        player.current_row = row + 1;
        player.is_winner = is_correct;
        player.game_complete = is_correct || player.current_row == MAX_GUESSES;
        player.solve_time = is_correct.then_some(now_ms);

        Ok(player)
    }

    /// Overwrite a remote player's guess fields. Updates that arrive outside a
    /// running round, or would move the row backwards, are stale and dropped;
    /// returns whether it was applied.
    pub fn apply_guess_update(&mut self, update: GuessUpdatePayload) -> Result<bool, GameError> {
        if !self.state.round_started || self.state.game_over {
            debug!(
                "Dropping guess update for {} outside a running round",
                update.id
            );
            return Ok(false);
        }

        let player = self
            .state
            .players
            .get_mut(&update.id)
            .ok_or_else(|| GameError::UnknownPlayer {
                player_id: update.id.clone(),
            })?;

        if update.current_row < player.current_row {
            debug!(
                "Dropping stale guess update for {} (row {} < {})",
                update.id, update.current_row, player.current_row
            );
            return Ok(false);
        }

        player.guesses = update.guesses;
        player.current_row = update.current_row;
        player.game_complete = update.game_complete;
        player.is_winner = update.is_winner;
        player.solve_time = update.solve_time;

        Ok(true)
    }

    pub fn all_finished(&self) -> bool {
        self.state.all_finished()
    }

    pub fn deadline_passed(&self, now_ms: i64) -> bool {
        self.state.round_end_time > 0 && now_ms >= self.state.round_end_time
    }

    /// A running round is over when everyone is done or time ran out.
    pub fn is_round_over(&self, now_ms: i64) -> bool {
        self.state.round_started
            && !self.state.game_over
            && (self.all_finished() || self.deadline_passed(now_ms))
    }

    /// Everyone is done; wait on the round-end from the host.
    pub fn mark_round_over(&mut self) -> Option<RoundPhase> {
        self.state.game_over = true;
        self.set_phase(RoundPhase::RoundComplete)
    }

    /// Score the round on a copy of the player map. The result is what the
    /// host broadcasts and then applies to itself.
    pub fn settle(&self) -> RoundEndPayload {
        let mut players = self.state.players.clone();
        let (round_winner_id, points_awarded) = ScoringEngine::settle_round(&mut players);

        RoundEndPayload {
            round_winner_id,
            players,
            round: self.state.current_round,
            points_awarded,
        }
    }

    /// Replace the player map with the authoritative one, keep a record of
    /// how the round went, and reset per-round fields.
    pub fn finish_round(&mut self, payload: RoundEndPayload) -> (RoundOutcome, Option<RoundPhase>) {
        let outcome = RoundOutcome {
            round: if payload.round > 0 {
                payload.round
            } else {
                self.state.current_round
            },
            winner_id: payload.round_winner_id,
            points_awarded: payload.points_awarded,
            target_words: self.state.target_words.clone(),
            guesses_used: payload
                .players
                .iter()
                .map(|(id, p)| (id.clone(), p.current_row))
                .collect(),
            solved: payload
                .players
                .iter()
                .map(|(id, p)| (id.clone(), p.is_winner))
                .collect::<HashMap<_, _>>(),
        };

        self.state.players = payload.players;
        self.state.reset_round();
        self.state.game_over = true;
        self.state.last_outcome = Some(outcome.clone());

        (outcome, self.set_phase(RoundPhase::RoundComplete))
    }

    /// Fall back to waiting whenever the room is not a full pair. A round that
    /// was still open is abandoned: words and guesses are dropped, scores and
    /// the round counter stay, and the host opens the next round once the
    /// pair is back.
    pub fn sync_with_presence(&mut self, present: usize) -> Option<RoundPhase> {
        if present >= 2 {
            return None;
        }

        if !self.state.game_over && self.state.current_round > 0 {
            debug!("Abandoning round {}", self.state.current_round);
            self.state.reset_round();
            self.state.game_over = true;
        }
        self.set_phase(RoundPhase::WaitingForPlayers)
    }
}

/// The phase implied by room state alone.
pub fn derive_phase(state: &RoomState, present: usize) -> RoundPhase {
    if present < 2 {
        RoundPhase::WaitingForPlayers
    } else if state.game_over {
        RoundPhase::RoundComplete
    } else if state.round_started {
        RoundPhase::PlayingRound
    } else if state.current_round == 0 {
        RoundPhase::WaitingForPlayers
    } else {
        RoundPhase::WordSetting
    }
}
