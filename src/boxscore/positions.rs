//! Fielding position codes and the per-game position string.

/// Canonical tokens for position codes 1-12.
pub const POSITION_TOKENS: [&str; 12] = [
    "p", "c", "1b", "2b", "3b", "ss", "lf", "cf", "rf", "dh", "pr", "ph",
];

pub const DESIGNATED_HITTER: u8 = 10;

/// Placeholder for a position code outside 1-12.
pub const UNKNOWN_POSITION: &str = "?";

pub fn position_token(code: u8) -> Option<&'static str> {
    match code {
        1..=12 => Some(POSITION_TOKENS[usize::from(code) - 1]),
        _ => None,
    }
}

/// How a player first entered the game, when not as a starter in the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryRole {
    PinchHitter,
    PinchRunner,
}

impl EntryRole {
    pub fn token(self) -> &'static str {
        match self {
            EntryRole::PinchHitter => "ph",
            EntryRole::PinchRunner => "pr",
        }
    }
}

/// Build the hyphenated position string: the entry role first (if any),
/// then each fielding position in the order played. Unknown codes stay in
/// place as [`UNKNOWN_POSITION`].
pub fn position_string(entry: Option<EntryRole>, positions: &[u8]) -> String {
    entry
        .map(EntryRole::token)
        .into_iter()
        .chain(
            positions
                .iter()
                .map(|&code| position_token(code).unwrap_or(UNKNOWN_POSITION)),
        )
        .collect::<Vec<_>>()
        .join("-")
}
