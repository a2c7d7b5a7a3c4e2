use duel_types::{GameError, LetterResult, MAX_GUESSES, WORD_LENGTH};

use crate::{KeyboardState, ScoringEngine, validate_guess};

/// A key from the on-screen or physical keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Letter(char),
    Backspace,
    Enter,
}

impl Key {
    /// Parse a DOM-style key name. Anything that is not a single ASCII letter,
    /// `Enter` or `Backspace` is ignored.
    pub fn parse(key: &str) -> Option<Key> {
        match key {
            "Enter" => Some(Key::Enter),
            "Backspace" => Some(Key::Backspace),
            _ => {
                let mut chars = key.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if c.is_ascii_alphabetic() => {
                        Some(Key::Letter(c.to_ascii_uppercase()))
                    }
                    _ => None,
                }
            }
        }
    }
}

/// Builds up the local player's guesses one key at a time and keeps the
/// evaluated rows and keyboard colouring for the round.
#[derive(Debug, Clone, Default)]
pub struct GuessComposer {
    current: String,
    history: Vec<String>,
    rows: Vec<Vec<LetterResult>>,
    keyboard: KeyboardState,
    solved: bool,
}

impl GuessComposer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> &str {
        &self.current
    }

    pub fn turn(&self) -> usize {
        self.history.len()
    }

    pub fn rows(&self) -> &[Vec<LetterResult>] {
        &self.rows
    }

    pub fn keyboard(&self) -> &KeyboardState {
        &self.keyboard
    }

    pub fn is_solved(&self) -> bool {
        self.solved
    }

    pub fn is_done(&self) -> bool {
        self.solved || self.turn() >= MAX_GUESSES
    }

    pub fn has_tried(&self, guess: &str) -> bool {
        self.history.iter().any(|tried| tried == guess)
    }

    /// Feed one key. `Enter` hands back the buffered word once it is a
    /// well-formed guess not tried before; it is not committed until
    /// [`GuessComposer::commit`].
    pub fn press(&mut self, key: Key) -> Result<Option<String>, GameError> {
        if self.is_done() {
            return Ok(None);
        }

        match key {
            Key::Letter(c) => {
                if self.current.len() < WORD_LENGTH && c.is_ascii_alphabetic() {
                    self.current.push(c.to_ascii_uppercase());
                }
                Ok(None)
            }
            Key::Backspace => {
                self.current.pop();
                Ok(None)
            }
            Key::Enter => {
                let guess = validate_guess(&self.current)?;
                if self.has_tried(&guess) {
                    return Err(GameError::AlreadyGuessed { guess });
                }
                Ok(Some(guess))
            }
        }
    }

    /// Record an accepted guess: evaluate it, colour the keyboard, and clear
    /// the input buffer.
    pub fn commit(&mut self, guess: &str, target: &str) -> &[LetterResult] {
        let letters = ScoringEngine::evaluate_guess(guess, target);
        self.solved = ScoringEngine::is_solved(&letters);
        self.keyboard.record(&letters);
        self.rows.push(letters);
        self.history.push(guess.to_string());
        self.current.clear();
        &self.rows[self.rows.len() - 1]
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
