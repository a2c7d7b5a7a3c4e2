use duel_types::{LetterResult, LetterStatus, MAX_GUESSES, Player, PlayerId};
use std::collections::HashMap;

pub struct ScoringEngine;

impl ScoringEngine {
    /// Evaluate a guess against the target word, letter by letter.
    ///
    /// Exact matches are marked first and removed from the pool of available
    /// target letters, so a repeated guess letter is only `Present` while the
    /// target still has an unclaimed copy of it.
    pub fn evaluate_guess(guess: &str, target: &str) -> Vec<LetterResult> {
        let guess_chars: Vec<char> = guess.to_uppercase().chars().collect();
        let target_chars: Vec<char> = target.to_uppercase().chars().collect();

        let mut letters: Vec<LetterResult> = guess_chars
            .iter()
            .enumerate()
            .map(|(position, &letter)| LetterResult {
                letter,
                status: LetterStatus::Absent,
                position,
            })
            .collect();

        // Unclaimed target letters
        let mut available: HashMap<char, usize> = HashMap::new();

        // First pass: mark correct positions
        for (i, &ch) in target_chars.iter().enumerate() {
            if guess_chars.get(i) == Some(&ch) {
                letters[i].status = LetterStatus::Correct;
            } else {
                *available.entry(ch).or_insert(0) += 1;
            }
        }

        // Second pass: mark present letters from what is left
        for letter in letters.iter_mut() {
            if letter.status == LetterStatus::Correct {
                continue;
            }
            if let Some(count) = available.get_mut(&letter.letter) {
                if *count > 0 {
                    *count -= 1;
                    letter.status = LetterStatus::Present;
                }
            }
        }

        letters
    }

    pub fn is_solved(letters: &[LetterResult]) -> bool {
        !letters.is_empty() && letters.iter().all(|l| l.status == LetterStatus::Correct)
    }

    /// Points for winning a round after `guesses_used` attempts.
    pub fn round_points(guesses_used: usize) -> i32 {
        let remaining = MAX_GUESSES.saturating_sub(guesses_used).max(1);
        remaining as i32 * 10
    }

    /// Pick the round winner among players who solved their word: fewest
    /// guesses, then earliest solve time.
    pub fn determine_round_winner<'a>(
        players: impl IntoIterator<Item = &'a Player>,
    ) -> Option<PlayerId> {
        players
            .into_iter()
            .filter(|p| p.is_winner)
            .min_by(|a, b| {
                a.current_row
                    .cmp(&b.current_row)
                    .then_with(|| {
                        let a_time = a.solve_time.unwrap_or(i64::MAX);
                        let b_time = b.solve_time.unwrap_or(i64::MAX);
                        a_time.cmp(&b_time)
                    })
                    // Deterministic on full ties so both replicas agree
                    .then_with(|| a.id.cmp(&b.id))
            })
            .map(|p| p.id.clone())
    }

    /// Apply the round result to a player map. Returns the winner and the
    /// points they earned; with no winner nothing changes.
    pub fn settle_round(players: &mut HashMap<PlayerId, Player>) -> (Option<PlayerId>, i32) {
        let Some(winner_id) = Self::determine_round_winner(players.values()) else {
            return (None, 0);
        };

        let Some(winner) = players.get_mut(&winner_id) else {
            return (None, 0);
        };

        let points = Self::round_points(winner.guesses_used());
        winner.score += points;
        winner.rounds_won += 1;

        (Some(winner_id), points)
    }
}
