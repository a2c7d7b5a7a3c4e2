use uuid::Uuid;

const SUFFIX_LEN: usize = 7;

fn random_suffix() -> String {
    // Base-36 rendering of a random v4 uuid, lowercase alphanumerics only
    let mut n = Uuid::new_v4().as_u128();
    let mut suffix = String::with_capacity(SUFFIX_LEN);
    for _ in 0..SUFFIX_LEN {
        let digit = (n % 36) as u32;
        n /= 36;
        suffix.push(char::from_digit(digit, 36).unwrap_or('0'));
    }
    suffix
}

/// Identifier for a freshly created room.
pub fn new_room_id() -> String {
    format!("wordle-{}", random_suffix())
}

/// Identifier for this browser tab's player.
pub fn new_player_id() -> String {
    format!("player-{}", random_suffix())
}
