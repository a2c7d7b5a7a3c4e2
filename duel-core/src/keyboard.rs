use duel_types::{LetterResult, LetterStatus};
use std::collections::HashMap;

/// Best state seen so far for every letter typed this round.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyboardState {
    keys: HashMap<char, LetterStatus>,
}

impl KeyboardState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one evaluated guess in. A letter never drops to a weaker state.
    pub fn record(&mut self, letters: &[LetterResult]) {
        for result in letters {
            let letter = result.letter.to_ascii_uppercase();
            self.keys
                .entry(letter)
                .and_modify(|status| *status = status.best(result.status))
                .or_insert(result.status);
        }
    }

    pub fn status(&self, letter: char) -> Option<LetterStatus> {
        self.keys.get(&letter.to_ascii_uppercase()).copied()
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
