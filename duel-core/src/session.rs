use duel_types::{
    BroadcastEvent, GameError, GuessUpdatePayload, LetterResult, PlayerId, PresenceEntry, RoomId,
    RoomState, RoundPhase, RoundStartPayload, StartToPlayPayload, WordSetPayload,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::replication::{self, Applied};
use crate::{
    Channel, Clock, GuessComposer, Inbound, Key, Presence, Round, ScoringEngine, SessionConfig,
    SessionEvent, SessionEventBus, SessionEventHandler, seconds_remaining, validate_guess,
    validate_word,
};

/// Snapshot of everything a screen needs to draw the session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionView {
    pub room_id: RoomId,
    pub player_id: PlayerId,
    pub player_name: String,
    pub is_host: bool,
    pub opponent_id: Option<PlayerId>,
    pub phase: RoundPhase,
    pub time_remaining: u64,
    pub is_game_started: bool,
    pub current_input: String,
    pub state: RoomState,
}

/// One client's side of a duel.
///
/// Local actions are checked against the replica, applied, and broadcast.
/// Inbound traffic is funnelled through [`Session::handle_inbound`]. When
/// this client is host it also drives the round lifecycle: it alone sends
/// `start-to-play`, `round-end` and `round-start`.
pub struct Session<C: Channel> {
    room_id: RoomId,
    presence: Presence,
    round: Round,
    composer: GuessComposer,
    channel: C,
    clock: Arc<dyn Clock>,
    config: SessionConfig,
    events: SessionEventBus,
    subscribed: bool,
    is_game_started: bool,
    time_remaining: u64,
}

impl<C: Channel> Session<C> {
    pub fn new(
        room_id: impl Into<RoomId>,
        local: PresenceEntry,
        channel: C,
        clock: Arc<dyn Clock>,
        config: SessionConfig,
    ) -> Self {
        Self {
            room_id: room_id.into(),
            presence: Presence::new(local),
            round: Round::new(),
            composer: GuessComposer::new(),
            channel,
            clock,
            config,
            events: SessionEventBus::new(),
            subscribed: false,
            is_game_started: false,
            time_remaining: 0,
        }
    }

    /// Build a session for `name`/`id`, stamping the join time from `clock`.
    pub fn join(
        room_id: impl Into<RoomId>,
        player_id: impl Into<PlayerId>,
        name: impl Into<String>,
        channel: C,
        clock: Arc<dyn Clock>,
        config: SessionConfig,
    ) -> Self {
        let local = PresenceEntry::new(player_id, name, clock.now_ms());
        Self::new(room_id, local, channel, clock, config)
    }

    pub fn add_event_handler(&mut self, handler: Box<dyn SessionEventHandler>) {
        self.events.add_handler(handler);
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn local_id(&self) -> &str {
        self.presence.local_id()
    }

    pub fn is_host(&self) -> bool {
        self.presence.is_host()
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscribed
    }

    pub fn opponent_id(&self) -> Option<&str> {
        self.presence.opponent_id()
    }

    pub fn phase(&self) -> RoundPhase {
        self.round.phase()
    }

    pub fn state(&self) -> &RoomState {
        self.round.state()
    }

    pub fn presence(&self) -> &Presence {
        &self.presence
    }

    pub fn composer(&self) -> &GuessComposer {
        &self.composer
    }

    pub fn time_remaining(&self) -> u64 {
        self.time_remaining
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn view(&self) -> SessionView {
        let local = self.presence.local_entry();
        SessionView {
            room_id: self.room_id.clone(),
            player_id: local.id.clone(),
            player_name: local.name.clone(),
            is_host: self.is_host(),
            opponent_id: self.opponent_id().map(str::to_string),
            phase: self.phase(),
            time_remaining: self.time_remaining,
            is_game_started: self.is_game_started,
            current_input: self.composer.current().to_string(),
            state: self.round.state().clone(),
        }
    }

    /// Colour every submitted row of `player_id` against the word they were
    /// given. Empty until that word is known locally.
    pub fn board_for(&self, player_id: &str) -> Vec<Vec<LetterResult>> {
        let (Some(player), Some(target)) =
            (self.round.player(player_id), self.round.target_word(player_id))
        else {
            return Vec::new();
        };

        player
            .submitted_guesses()
            .map(|guess| ScoringEngine::evaluate_guess(guess, target))
            .collect()
    }

    /// Host only: wipe scores and open round one.
    pub fn start_game(&mut self) -> Result<(), GameError> {
        if !self.is_host() {
            return self.reject(GameError::NotHost);
        }
        let present = self.presence.count();
        if present != 2 {
            return self.reject(GameError::NotEnoughPlayers { present });
        }

        info!("Starting a new game in room {}", self.room_id);
        self.round.reset_game();
        self.is_game_started = false;
        self.open_round(true);
        Ok(())
    }

    /// Host only: open the next round for word setting.
    pub fn start_round(&mut self) -> Result<(), GameError> {
        if !self.is_host() {
            return self.reject(GameError::NotHost);
        }
        let present = self.presence.count();
        if present != 2 {
            return self.reject(GameError::NotEnoughPlayers { present });
        }
        if self.round.state().round_started && !self.round.state().game_over {
            return self.reject(GameError::InvalidPhase {
                current_phase: format!("{:?}", self.phase()),
            });
        }

        self.open_round(false);
        Ok(())
    }

    /// Choose the word the opponent has to find.
    pub fn submit_word(&mut self, word: &str) -> Result<(), GameError> {
        let word = match validate_word(word) {
            Ok(word) => word,
            Err(e) => return self.reject(e),
        };
        if self.phase() != RoundPhase::WordSetting {
            return self.reject(GameError::InvalidPhase {
                current_phase: format!("{:?}", self.phase()),
            });
        }
        let Some(opponent) = self.opponent_id().map(str::to_string) else {
            return self.reject(GameError::NoOpponent);
        };
        let local = self.local_id().to_string();
        if self.round.player(&local).is_none() {
            return self.reject(GameError::UnknownPlayer { player_id: local });
        }

        let both_set = match self.round.record_word(&local, &opponent, &word) {
            Ok(both_set) => both_set,
            Err(e) => return self.reject(e),
        };
        self.broadcast(BroadcastEvent::WordSet(WordSetPayload {
            setter_id: local.clone(),
            target_player_id: opponent.clone(),
            word,
        }));
        debug!("{} set a word for {}", local, opponent);

        if both_set && self.is_host() {
            self.begin_play();
        }
        Ok(())
    }

    /// Submit a full guess for the local player.
    pub fn submit_guess(&mut self, guess: &str) -> Result<(), GameError> {
        let guess = match validate_guess(guess) {
            Ok(guess) => guess,
            Err(e) => return self.reject(e),
        };
        if self.composer.has_tried(&guess) {
            return self.reject(GameError::AlreadyGuessed { guess });
        }

        let local = self.local_id().to_string();
        let now = self.clock.now_ms();
        let update = match self.round.submit_guess(&local, &guess, now) {
            Ok(player) => GuessUpdatePayload::from_player(player),
            Err(e) => return self.reject(e),
        };

        if let Some(target) = self.round.target_word(&local).map(str::to_string) {
            self.composer.commit(&guess, &target);
        }
        debug!("{} guessed {} (row {})", local, guess, update.current_row);
        self.broadcast(BroadcastEvent::GuessUpdate(update));

        if self.round.all_finished() {
            if self.is_host() {
                self.end_round();
            } else {
                let before = self.phase();
                self.round.mark_round_over();
                self.publish_phase_change(before);
            }
        }
        Ok(())
    }

    /// Keyboard path: letters and backspace edit the row, enter submits it.
    pub fn press_key(&mut self, key: Key) -> Result<(), GameError> {
        if self.phase() != RoundPhase::PlayingRound {
            return Ok(());
        }
        match self.composer.press(key) {
            Ok(Some(guess)) => self.submit_guess(&guess),
            Ok(None) => Ok(()),
            Err(e) => self.reject(e),
        }
    }

    /// Periodic work: refresh the countdown and, as host, close a round whose
    /// deadline has passed.
    pub fn tick(&mut self) -> u64 {
        let now = self.clock.now_ms();
        let state = self.round.state();

        if state.round_started && state.round_end_time > 0 {
            let remaining = seconds_remaining(state.round_end_time, now);
            if remaining != self.time_remaining {
                self.time_remaining = remaining;
                self.events.publish(SessionEvent::TimeRemaining { seconds: remaining });
            }
        }

        self.host_follow_up();
        self.time_remaining
    }

    /// Feed one message from the transport.
    pub fn handle_inbound(&mut self, inbound: Inbound) {
        match inbound {
            Inbound::Subscribed => {
                info!("Subscribed to room {}", self.room_id);
                self.subscribed = true;
                if let Err(e) = self.channel.track(self.presence.local_entry()) {
                    warn!("Failed to announce presence in {}: {}", self.room_id, e);
                }
            }
            Inbound::PresenceSync(entries) => self.handle_presence(entries),
            Inbound::Broadcast { from, event } => self.handle_broadcast(&from, event),
        }
    }

    /// Leave the room.
    pub fn leave(&mut self) {
        info!("Leaving room {}", self.room_id);
        self.subscribed = false;
        self.channel.unsubscribe();
    }

    fn handle_presence(&mut self, entries: Vec<PresenceEntry>) {
        let before = self.phase();
        let change = self.presence.apply_snapshot(entries);

        for id in &change.left {
            info!("{} left room {}", id, self.room_id);
            self.round.remove_player(id);
            self.events.publish(SessionEvent::PlayerLeft {
                player_id: id.clone(),
            });
        }
        for entry in &change.joined {
            self.round.add_player(entry);
            self.events.publish(SessionEvent::PlayerJoined {
                player_id: entry.id.clone(),
            });
        }
        if let Some(host_id) = change.new_host {
            let is_local = host_id == self.local_id();
            self.events.publish(SessionEvent::HostElected { host_id, is_local });
        }

        let state = self.round.state();
        let round_open = !state.game_over && state.current_round > 0;
        let round = state.current_round;
        self.round.sync_with_presence(self.presence.count());
        if round_open && self.round.state().game_over {
            info!("Round {} in room {} abandoned", round, self.room_id);
            self.composer.reset();
            self.time_remaining = 0;
            self.events.publish(SessionEvent::RoundAbandoned { round });
        }
        self.publish_phase_change(before);
        self.host_follow_up();
    }

    fn handle_broadcast(&mut self, from: &str, event: BroadcastEvent) {
        let before = self.phase();
        let name = event.name();

        let applied = match replication::apply(&mut self.round, &self.presence, from, event) {
            Ok(applied) => applied,
            Err(e) => {
                warn!("{}", e);
                return;
            }
        };
        debug!("Applied {} from {}: {:?}", name, from, applied);

        match applied {
            Applied::WordRecorded { both_set } => {
                if both_set && self.is_host() {
                    self.begin_play();
                }
            }
            Applied::PlayStarted {
                round,
                round_end_time,
            } => {
                self.is_game_started = true;
                self.events.publish(SessionEvent::RoundStarted {
                    round,
                    round_end_time,
                });
            }
            Applied::GuessApplied { round_over } => {
                if round_over && self.is_host() {
                    self.end_round();
                }
            }
            Applied::RoundEnded(outcome) => {
                info!(
                    "Round {} ended, winner: {:?}",
                    outcome.round, outcome.winner_id
                );
                self.composer.reset();
                self.time_remaining = 0;
                self.events.publish(SessionEvent::RoundEnded { outcome });
            }
            Applied::RoundStarted { fresh_game, .. } => {
                if fresh_game {
                    self.is_game_started = false;
                }
                self.composer.reset();
            }
            Applied::Stale => {}
        }

        self.publish_phase_change(before);
    }

    /// Host duties that can become due on any input: start play once both
    /// words are in, and close a round that is over.
    fn host_follow_up(&mut self) {
        if !self.is_host() || self.presence.count() != 2 {
            return;
        }

        let state = self.round.state();
        if self.phase() == RoundPhase::WordSetting && state.all_words_set() && !state.round_started
        {
            self.begin_play();
        } else if self.round.is_round_over(self.clock.now_ms()) {
            self.end_round();
        }
    }

    fn open_round(&mut self, fresh_game: bool) {
        let before = self.phase();
        let next = self.round.state().current_round + 1;

        self.round.begin_word_setting(next);
        self.composer.reset();
        self.time_remaining = 0;
        info!("Opening round {} in room {}", next, self.room_id);

        self.broadcast(BroadcastEvent::RoundStart(RoundStartPayload {
            round: next,
            fresh_game,
        }));
        self.publish_phase_change(before);
    }

    /// Host: fix the deadline and start guessing. Sent at most once a round.
    fn begin_play(&mut self) {
        if self.round.state().round_started {
            return;
        }

        let before = self.phase();
        let round_end_time = self.clock.now_ms() + self.config.round_duration_ms();
        let round = self.round.state().current_round.max(1);

        self.broadcast(BroadcastEvent::StartToPlay(StartToPlayPayload {
            round_end_time,
            current_round: round,
        }));
        self.round.start_play(round_end_time, round);
        self.is_game_started = true;
        self.time_remaining = seconds_remaining(round_end_time, self.clock.now_ms());
        info!("Round {} started, ends at {}", round, round_end_time);

        self.events.publish(SessionEvent::RoundStarted {
            round,
            round_end_time,
        });
        self.publish_phase_change(before);
    }

    /// Host: score the round, broadcast the result, and apply it locally.
    fn end_round(&mut self) {
        let before = self.phase();
        let payload = self.round.settle();

        self.broadcast(BroadcastEvent::RoundEnd(payload.clone()));
        let (outcome, _) = self.round.finish_round(payload);
        info!(
            "Round {} ended, winner: {:?} (+{})",
            outcome.round, outcome.winner_id, outcome.points_awarded
        );

        self.composer.reset();
        self.time_remaining = 0;
        self.events.publish(SessionEvent::RoundEnded { outcome });
        self.publish_phase_change(before);
    }

    fn broadcast(&self, event: BroadcastEvent) {
        if let Err(e) = self.channel.send(&event) {
            warn!("Failed to send {} to room {}: {}", event.name(), self.room_id, e);
        }
    }

    fn reject(&mut self, error: GameError) -> Result<(), GameError> {
        if error.is_user_facing() {
            info!("Rejected input: {}", error);
            self.events.publish(SessionEvent::InputRejected {
                error: error.clone(),
            });
        } else {
            debug!("Rejected action: {}", error);
        }
        Err(error)
    }

    fn publish_phase_change(&mut self, before: RoundPhase) {
        let after = self.phase();
        if before != after {
            self.events.publish(SessionEvent::PhaseChanged {
                from: before,
                to: after,
            });
        }
    }
}
