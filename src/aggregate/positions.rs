//! Games played at each position, from persisted defensive appearances.

use crate::aggregate::{RowKind, SeasonRow, StatColumn};
use crate::boxscore::positions::POSITION_TOKENS;
use crate::db::models::DefensiveAppearance;

/// Count, per position token, the games in which the player appeared there.
/// A game counts once per position however often the player moved back.
pub fn position_counts(appearances: &[DefensiveAppearance]) -> [u32; 12] {
    let mut counts = [0u32; 12];
    for appearance in appearances {
        let tokens: Vec<&str> = appearance.position_list.split('-').collect();
        for (slot, token) in POSITION_TOKENS.iter().enumerate() {
            if tokens.contains(token) {
                counts[slot] += 1;
            }
        }
    }
    counts
}

pub fn season_row(player: &str, name: &str, appearances: &[DefensiveAppearance]) -> SeasonRow {
    let mut teams: Vec<&str> = Vec::new();
    for a in appearances {
        if !teams.contains(&a.my_team.as_str()) {
            teams.push(&a.my_team);
        }
    }
    let columns = POSITION_TOKENS
        .iter()
        .zip(position_counts(appearances))
        .map(|(token, games)| StatColumn::derived(token, games.to_string()))
        .collect();

    SeasonRow {
        kind: RowKind::Positions,
        player: player.to_string(),
        name: name.to_string(),
        team: teams.join("-"),
        games: appearances.len() as u32,
        columns,
    }
}
