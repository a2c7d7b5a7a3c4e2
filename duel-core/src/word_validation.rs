use duel_types::{GameError, WORD_LENGTH};

/// Canonical form of a word: trimmed and upper-cased.
pub fn normalize_word(word: &str) -> String {
    word.trim().to_uppercase()
}

/// Check if word contains only ASCII letters
pub fn is_alphabetic(word: &str) -> bool {
    word.chars().all(|c| c.is_ascii_alphabetic())
}

fn is_well_formed(word: &str) -> bool {
    word.chars().count() == WORD_LENGTH && is_alphabetic(word)
}

/// Validate a target word chosen for the opponent.
pub fn validate_word(word: &str) -> Result<String, GameError> {
    let word = normalize_word(word);
    if is_well_formed(&word) {
        Ok(word)
    } else {
        Err(GameError::InvalidWord { word })
    }
}

/// Validate a guess. Same shape rules as a target word; there is no
/// dictionary check.
pub fn validate_guess(guess: &str) -> Result<String, GameError> {
    let guess = normalize_word(guess);
    if is_well_formed(&guess) {
        Ok(guess)
    } else {
        Err(GameError::InvalidGuess { guess })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_word() {
        assert_eq!(validate_word("crane").unwrap(), "CRANE");
        assert_eq!(validate_word("  Crane \n").unwrap(), "CRANE");
        assert_eq!(validate_word("SPEED").unwrap(), "SPEED");
    }

    #[test]
    fn test_wrong_lengths() {
        assert!(validate_word("").is_err());
        assert!(validate_word("four").is_err());
        assert!(validate_word("sixsix").is_err());
        assert_eq!(
            validate_word("abcd").unwrap_err(),
            GameError::InvalidWord { word: "ABCD".to_string() }
        );
    }

    #[test]
    fn test_invalid_characters() {
        assert!(validate_guess("te5ts").is_err());
        assert!(validate_guess("te st").is_err());
        assert!(validate_guess("test!").is_err());
        assert!(validate_guess("t-est").is_err());
        assert!(validate_guess("ÉCRAN").is_err());
        assert!(matches!(validate_guess("12345"), Err(GameError::InvalidGuess { .. })));
    }

    #[test]
    fn test_alphabetic_check() {
        assert!(is_alphabetic("hello"));
        assert!(is_alphabetic(""));
        assert!(!is_alphabetic("hello123"));
        assert!(!is_alphabetic(" "));
        assert!(!is_alphabetic("\t"));
    }
}
