use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum LetterStatus {
    Correct, // Green - correct letter in correct position
    Present, // Yellow - correct letter in wrong position
    Absent,  // Grey - letter not in word
}

impl LetterStatus {
    /// Precedence used for keyboard aggregation: correct > present > absent.
    pub fn rank(self) -> u8 {
        match self {
            LetterStatus::Correct => 2,
            LetterStatus::Present => 1,
            LetterStatus::Absent => 0,
        }
    }

    /// Keep whichever of two states carries more information.
    pub fn best(self, other: LetterStatus) -> LetterStatus {
        if other.rank() > self.rank() { other } else { self }
    }

    pub fn color_name(self) -> &'static str {
        match self {
            LetterStatus::Correct => "green",
            LetterStatus::Present => "yellow",
            LetterStatus::Absent => "grey",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LetterResult {
    pub letter: char,
    pub status: LetterStatus,
    pub position: usize,
}

/// Staggered flip delay for revealing a tile, in milliseconds.
pub fn reveal_delay_ms(position: usize) -> u64 {
    position as u64 * 100
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_best_never_downgrades() {
        assert_eq!(LetterStatus::Correct.best(LetterStatus::Present), LetterStatus::Correct);
        assert_eq!(LetterStatus::Correct.best(LetterStatus::Absent), LetterStatus::Correct);
        assert_eq!(LetterStatus::Present.best(LetterStatus::Absent), LetterStatus::Present);
        assert_eq!(LetterStatus::Absent.best(LetterStatus::Correct), LetterStatus::Correct);
    }

    #[test]
    fn test_presentation_helpers() {
        assert_eq!(LetterStatus::Correct.color_name(), "green");
        assert_eq!(LetterStatus::Present.color_name(), "yellow");
        assert_eq!(LetterStatus::Absent.color_name(), "grey");
        assert_eq!(reveal_delay_ms(0), 0);
        assert_eq!(reveal_delay_ms(4), 400);
    }
}
