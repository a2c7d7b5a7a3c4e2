//! Applies broadcasts from the other peer to the local replica.
//!
//! Payloads are checked against the sender and the current room before any
//! state changes: a peer may only write its own player entry, and only the
//! host may send the round lifecycle events (`start-to-play`, `round-end`,
//! `round-start`). Anything that fails a check is dropped without touching
//! state, so the replica waits for the next consistent message instead.

use duel_types::{
    BroadcastEvent, GameError, GuessUpdatePayload, MAX_GUESSES, RoundEndPayload, RoundOutcome,
    RoundStartPayload, StartToPlayPayload, WordSetPayload,
};
use thiserror::Error;

use crate::{Presence, Round, validate_guess, validate_word};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProtocolError {
    #[error("{event} from {from} ignored: sender is not in the room")]
    UnknownSender { event: &'static str, from: String },
    #[error("{event} from {from} ignored: only the host sends it")]
    NotFromHost { event: &'static str, from: String },
    #[error("{event} from {from} ignored: a peer may only update itself")]
    ForeignSubject { event: &'static str, from: String },
    #[error("{event} ignored: {reason}")]
    Malformed { event: &'static str, reason: String },
    #[error(transparent)]
    Rejected(#[from] GameError),
}

/// What an applied event did, so the coordinator can follow up.
#[derive(Debug, Clone, PartialEq)]
pub enum Applied {
    WordRecorded { both_set: bool },
    PlayStarted { round: u32, round_end_time: i64 },
    GuessApplied { round_over: bool },
    RoundEnded(RoundOutcome),
    RoundStarted { round: u32, fresh_game: bool },
    /// A duplicate or out-of-date event; nothing changed.
    Stale,
}

/// Check an inbound event without applying it.
pub fn validate(
    round: &Round,
    presence: &Presence,
    from: &str,
    event: &BroadcastEvent,
) -> Result<(), ProtocolError> {
    let name = event.name();

    if !presence.contains(from) {
        return Err(ProtocolError::UnknownSender {
            event: name,
            from: from.to_string(),
        });
    }

    let host_only = matches!(
        event,
        BroadcastEvent::StartToPlay(_) | BroadcastEvent::RoundEnd(_) | BroadcastEvent::RoundStart(_)
    );
    if host_only && presence.host_id() != Some(from) {
        return Err(ProtocolError::NotFromHost {
            event: name,
            from: from.to_string(),
        });
    }

    match event {
        BroadcastEvent::WordSet(payload) => validate_word_set(name, from, payload),
        BroadcastEvent::StartToPlay(payload) => {
            if payload.round_end_time <= 0 {
                return Err(malformed(name, "missing round end time"));
            }
            Ok(())
        }
        BroadcastEvent::GuessUpdate(payload) => validate_guess_update(round, name, from, payload),
        BroadcastEvent::RoundEnd(payload) => validate_round_end(presence, name, payload),
        BroadcastEvent::RoundStart(_) => Ok(()),
    }
}

fn malformed(event: &'static str, reason: impl Into<String>) -> ProtocolError {
    ProtocolError::Malformed {
        event,
        reason: reason.into(),
    }
}

fn validate_word_set(
    name: &'static str,
    from: &str,
    payload: &WordSetPayload,
) -> Result<(), ProtocolError> {
    if payload.setter_id != from {
        return Err(ProtocolError::ForeignSubject {
            event: name,
            from: from.to_string(),
        });
    }
    if payload.target_player_id == payload.setter_id {
        return Err(malformed(name, "a player cannot set their own word"));
    }
    let word = validate_word(&payload.word)?;
    if word != payload.word {
        return Err(malformed(name, "word is not in canonical upper case"));
    }
    Ok(())
}

fn validate_guess_update(
    round: &Round,
    name: &'static str,
    from: &str,
    payload: &GuessUpdatePayload,
) -> Result<(), ProtocolError> {
    if payload.id != from {
        return Err(ProtocolError::ForeignSubject {
            event: name,
            from: from.to_string(),
        });
    }
    if payload.guesses.len() != MAX_GUESSES {
        return Err(malformed(
            name,
            format!("expected {} guess slots, got {}", MAX_GUESSES, payload.guesses.len()),
        ));
    }
    if payload.current_row > MAX_GUESSES {
        return Err(malformed(name, format!("row {} out of range", payload.current_row)));
    }
    for guess in &payload.guesses[..payload.current_row] {
        validate_guess(guess)?;
    }

    if payload.is_winner {
        let last = payload
            .current_row
            .checked_sub(1)
            .map(|row| payload.guesses[row].as_str());
        // We set this word ourselves, so we can hold the claim to it
        if let Some(target) = round.target_word(&payload.id) {
            if last != Some(target) {
                return Err(malformed(name, "winning guess does not match the target word"));
            }
        }
    }
    Ok(())
}

fn validate_round_end(
    presence: &Presence,
    name: &'static str,
    payload: &RoundEndPayload,
) -> Result<(), ProtocolError> {
    // The map replaces ours wholesale, so it must cover exactly the room
    let covers_room = payload.players.len() == presence.count()
        && presence.entries().all(|entry| payload.players.contains_key(&entry.id));
    if !covers_room {
        return Err(malformed(name, "player map does not match the room"));
    }
    if let Some(winner) = &payload.round_winner_id {
        match payload.players.get(winner) {
            Some(player) if player.is_winner => {}
            _ => return Err(malformed(name, "round winner did not solve their word")),
        }
    }
    if payload.players.values().any(|p| p.current_row > MAX_GUESSES) {
        return Err(malformed(name, "player row out of range"));
    }
    Ok(())
}

/// Validate and apply an inbound event to the replica.
pub fn apply(
    round: &mut Round,
    presence: &Presence,
    from: &str,
    event: BroadcastEvent,
) -> Result<Applied, ProtocolError> {
    validate(round, presence, from, &event)?;

    let applied = match event {
        BroadcastEvent::WordSet(payload) => apply_word_set(round, payload)?,
        BroadcastEvent::StartToPlay(payload) => apply_start_to_play(round, payload),
        BroadcastEvent::GuessUpdate(payload) => apply_guess_update(round, payload)?,
        BroadcastEvent::RoundEnd(payload) => apply_round_end(round, payload),
        BroadcastEvent::RoundStart(payload) => apply_round_start(round, payload),
    };

    Ok(applied)
}

fn apply_word_set(round: &mut Round, payload: WordSetPayload) -> Result<Applied, ProtocolError> {
    let both_set = round.record_word(&payload.setter_id, &payload.target_player_id, &payload.word)?;
    Ok(Applied::WordRecorded { both_set })
}

fn apply_start_to_play(round: &mut Round, payload: StartToPlayPayload) -> Applied {
    let state = round.state();

    let already_scored = state
        .last_outcome
        .as_ref()
        .is_some_and(|outcome| outcome.round == payload.current_round);
    if already_scored && !state.round_started {
        return Applied::Stale;
    }

    round.start_play(payload.round_end_time, payload.current_round);
    Applied::PlayStarted {
        round: payload.current_round,
        round_end_time: payload.round_end_time,
    }
}

fn apply_guess_update(
    round: &mut Round,
    payload: GuessUpdatePayload,
) -> Result<Applied, ProtocolError> {
    if !round.apply_guess_update(payload)? {
        return Ok(Applied::Stale);
    }

    let round_over = round.state().round_started && !round.state().game_over && round.all_finished();
    if round_over {
        round.mark_round_over();
    }
    Ok(Applied::GuessApplied { round_over })
}

fn apply_round_end(round: &mut Round, payload: RoundEndPayload) -> Applied {
    let state = round.state();
    let duplicate = !state.round_started
        && state
            .last_outcome
            .as_ref()
            .is_some_and(|outcome| payload.round > 0 && outcome.round == payload.round);
    if duplicate {
        return Applied::Stale;
    }

    let (outcome, _) = round.finish_round(payload);
    Applied::RoundEnded(outcome)
}

fn apply_round_start(round: &mut Round, payload: RoundStartPayload) -> Applied {
    if payload.fresh_game {
        round.reset_game();
    }

    let next = if payload.round > 0 {
        payload.round
    } else {
        round.state().current_round + 1
    };
    round.begin_word_setting(next);

    Applied::RoundStarted {
        round: next,
        fresh_game: payload.fresh_game,
    }
}
