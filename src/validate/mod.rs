//! Consistency validator: cross-checks the redundant views of one sealed
//! game and reports every disagreement. Read-only; never fails.

use serde::Serialize;
use std::fmt;

use crate::boxscore::game::{EventRecord, Game};
use crate::boxscore::positions::DESIGNATED_HITTER;
use crate::boxscore::side::{Side, SideMap};
use crate::boxscore::stat::Stat;
use crate::db::models::{BattingStats, FieldingStats, PitchingStats};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Mismatch,
    Missing,
    Duplicate,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Error => "ERROR",
            Severity::Mismatch => "MISMATCH",
            Severity::Missing => "MISSING",
            Severity::Duplicate => "DUPLICATE",
            Severity::Warning => "WARNING",
        })
    }
}

/// Which cross-check produced a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Check {
    RosterMembership,
    TeamTotals,
    DecisionSide,
    OpposingPitching,
    LinescoreLength,
    LinescoreRuns,
    RbiVersusRuns,
    InningsVersusOuts,
    BattingOrder,
    DefensivePositions,
    DuplicateAppearance,
    PlayerLine,
    EventParticipants,
    BattingOrderRange,
    Ingest,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub check: Check,
    /// "LOU at KC, 1938/04/19 (0)"
    pub game: String,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.severity, self.game, self.message)
    }
}

/// Read-only player lookup by team.
pub trait RosterLookup {
    fn has_team(&self, team: &str) -> bool;
    fn contains(&self, team: &str, player: &str) -> bool;
    fn display_name(&self, team: &str, player: &str) -> Option<&str>;
}

/// Run every check against `game`. Without a roster the membership checks
/// are skipped; everything else runs regardless of earlier failures.
pub fn validate(game: &Game, roster: Option<&dyn RosterLookup>) -> Vec<Diagnostic> {
    let mut checker = Checker::new(game, roster);
    checker.ingest_notes();
    checker.roster_membership();
    checker.team_totals();
    checker.decision_side();
    checker.opposing_pitching();
    checker.linescores();
    checker.rbi_versus_runs();
    checker.innings_versus_outs();
    checker.batting_order();
    checker.defensive_positions();
    checker.duplicates();
    checker.player_lines();
    checker.event_participants();
    checker.out
}

/// Strict per-side sums of the player lines.
#[derive(Debug, Clone, Copy)]
struct PlayerSums {
    at_bats: Stat,
    runs: Stat,
    hits: Stat,
    rbi: Stat,
    walks: Stat,
    strikeouts: Stat,
    putouts: Stat,
    assists: Stat,
    errors: Stat,
    pitcher_outs: Stat,
    pitcher_runs: Stat,
    pitcher_hits: Stat,
}

impl PlayerSums {
    fn of(game: &Game, side: Side) -> Self {
        let bat = |f: fn(&BattingStats) -> Stat| -> Stat {
            game.batting_for(side).map(|b| f(&b.stats)).sum()
        };
        let field = |f: fn(&FieldingStats) -> Stat| -> Stat {
            game.defense_for(side).map(|d| f(&d.stats)).sum()
        };
        let pitch = |f: fn(&PitchingStats) -> Stat| -> Stat {
            game.pitching_for(side).map(|p| f(&p.stats)).sum()
        };
        PlayerSums {
            at_bats: bat(|s| s.at_bats),
            runs: bat(|s| s.runs),
            hits: bat(|s| s.hits),
            rbi: bat(|s| s.rbi),
            walks: bat(|s| s.walks),
            strikeouts: bat(|s| s.strikeouts),
            putouts: field(|s| s.putouts),
            assists: field(|s| s.assists),
            errors: field(|s| s.errors),
            pitcher_outs: pitch(|s| s.outs),
            pitcher_runs: pitch(|s| s.runs),
            pitcher_hits: pitch(|s| s.hits),
        }
    }
}

struct Checker<'a> {
    game: &'a Game,
    roster: Option<&'a dyn RosterLookup>,
    label: String,
    sums: SideMap<PlayerSums>,
    out: Vec<Diagnostic>,
}

impl<'a> Checker<'a> {
    fn new(game: &'a Game, roster: Option<&'a dyn RosterLookup>) -> Self {
        Checker {
            game,
            roster,
            label: game.context.label(),
            sums: SideMap {
                road: PlayerSums::of(game, Side::Road),
                home: PlayerSums::of(game, Side::Home),
            },
            out: Vec::new(),
        }
    }

    fn report(&mut self, severity: Severity, check: Check, message: String) {
        self.out.push(Diagnostic {
            severity,
            check,
            game: self.label.clone(),
            message,
        });
    }

    fn team(&self, side: Side) -> &'a str {
        self.game.context.team(side)
    }

    /// Roster for `side`, if one is loaded and knows the team.
    fn roster_for(&self, side: Side) -> Option<&'a dyn RosterLookup> {
        self.roster.filter(|r| r.has_team(self.team(side)))
    }

    fn name(&self, side: Side, player: &str) -> String {
        self.roster
            .and_then(|r| r.display_name(self.team(side), player))
            .map_or_else(|| player.to_string(), |name| format!("{name} ({player})"))
    }

    /// Reported runs, falling back to the linescore total.
    fn team_runs(&self, side: Side) -> Stat {
        match self.game.totals[side].runs {
            Stat::Missing => self.game.line_scores[side]
                .as_ref()
                .map_or(Stat::Missing, |ls| ls.total()),
            runs => runs,
        }
    }

    fn ingest_notes(&mut self) {
        let g = self.game;
        for note in &g.notes {
            let message = format!("line {}: {}", note.line, note.message);
            self.report(Severity::Warning, Check::Ingest, message);
        }
    }

    fn roster_membership(&mut self) {
        let Some(roster) = self.roster else {
            return;
        };
        for side in Side::BOTH {
            let team = self.team(side);
            if !roster.has_team(team) {
                self.report(
                    Severity::Error,
                    Check::RosterMembership,
                    format!("no roster loaded for team {team}"),
                );
                continue;
            }
            let g = self.game;
            let listed = g
                .pitching_for(side)
                .map(|p| ("Pitcher", p.player.as_str()))
                .chain(g.batting_for(side).map(|b| ("Batter", b.player.as_str())))
                .chain(g.pinch_hitters[side].iter().map(|p| ("Pinch-hitter", p.player.as_str())))
                .chain(g.pinch_runners[side].iter().map(|p| ("Pinch-runner", p.player.as_str())));
            let unknown: Vec<String> = listed
                .filter(|(_, player)| !roster.contains(team, player))
                .map(|(role, player)| format!("{role} {player} not found in {team} roster"))
                .collect();
            for message in unknown {
                self.report(Severity::Error, Check::RosterMembership, message);
            }
        }
    }

    fn team_totals(&mut self) {
        for side in Side::BOTH {
            let t = self.game.totals[side];
            let s = self.sums[side];
            let pairs = [
                ("AB", s.at_bats, t.at_bats),
                ("Runs", s.runs, t.runs),
                ("Hits", s.hits, t.hits),
                ("RBI", s.rbi, t.rbi),
                ("Putouts", s.putouts, t.putouts),
                ("Assists", s.assists, t.assists),
                ("Errors", s.errors, t.errors),
                ("Walks", s.walks, t.walks),
                ("Strikeouts", s.strikeouts, t.strikeouts),
            ];
            for (stat, players, team_total) in pairs {
                if let (Stat::Known(p), Stat::Known(t)) = (players, team_total) {
                    if p != t {
                        let message = format!(
                            "{} {stat} (sum of players={p}, team total={t})",
                            self.team(side)
                        );
                        self.report(Severity::Mismatch, Check::TeamTotals, message);
                    }
                }
            }
        }
    }

    fn decision_side(&mut self) {
        let (Stat::Known(road), Stat::Known(home)) =
            (self.team_runs(Side::Road), self.team_runs(Side::Home))
        else {
            return;
        };
        let winner = match road.cmp(&home) {
            std::cmp::Ordering::Greater => Side::Road,
            std::cmp::Ordering::Less => Side::Home,
            std::cmp::Ordering::Equal => return,
        };
        let g = self.game;
        let ctx = &g.context;
        let decisions = [
            ("Winning", ctx.winning_pitcher.as_deref(), winner),
            ("Losing", ctx.losing_pitcher.as_deref(), winner.opponent()),
        ];
        for (label, pitcher, side) in decisions {
            let Some(pitcher) = pitcher else {
                continue;
            };
            if !g.pitching_for(side).any(|p| p.player == pitcher) {
                let message = format!(
                    "{label} pitcher {pitcher} not among {} pitchers",
                    self.team(side)
                );
                self.report(Severity::Error, Check::DecisionSide, message);
            }
        }
    }

    fn opposing_pitching(&mut self) {
        for side in Side::BOTH {
            let batting = self.sums[side];
            let pitching_side = side.opponent();
            let pitching = self.sums[pitching_side];
            let pairs = [
                ("Runs", batting.runs, pitching.pitcher_runs),
                ("Hits", batting.hits, pitching.pitcher_hits),
            ];
            for (stat, batters, pitchers) in pairs {
                if let (Stat::Known(b), Stat::Known(p)) = (batters, pitchers) {
                    if b != p {
                        let message = format!(
                            "{} {stat} (sum of players={b}, opposing pitcher totals={p} {})",
                            self.team(side),
                            self.team(pitching_side)
                        );
                        self.report(Severity::Mismatch, Check::OpposingPitching, message);
                    }
                }
            }
        }
    }

    fn linescores(&mut self) {
        let g = self.game;
        for side in Side::BOTH {
            if g.line_scores[side].is_none() {
                let message = format!("no linescore for {}", self.team(side));
                self.report(Severity::Missing, Check::LinescoreLength, message);
            }
        }
        let ls = &g.line_scores;
        if let (Some(road), Some(home)) = (&ls.road, &ls.home) {
            let (r, h) = (road.inning_count(), home.inning_count());
            let home_won = matches!(
                (self.team_runs(Side::Home), self.team_runs(Side::Road)),
                (Stat::Known(home_runs), Stat::Known(road_runs)) if home_runs > road_runs
            );
            if !(r == h || (r == h + 1 && home_won)) {
                let message = format!(
                    "Linescore length {}={r}, {}={h}",
                    self.team(Side::Road),
                    self.team(Side::Home)
                );
                self.report(Severity::Mismatch, Check::LinescoreLength, message);
            }
        }

        for side in Side::BOTH {
            let Some(ls) = &g.line_scores[side] else {
                continue;
            };
            if let (Stat::Known(innings), Stat::Known(team)) = (ls.total(), g.totals[side].runs)
            {
                if innings != team {
                    let message = format!(
                        "{} Linescore runs {innings}, team total {team}",
                        self.team(side)
                    );
                    self.report(Severity::Mismatch, Check::LinescoreRuns, message);
                }
            }
        }
    }

    fn rbi_versus_runs(&mut self) {
        for side in Side::BOTH {
            let s = self.sums[side];
            if let (Stat::Known(rbi), Stat::Known(runs)) = (s.rbi, s.runs) {
                if rbi > runs {
                    let message = format!("{} More RBI {rbi} than Runs {runs}", self.team(side));
                    self.report(Severity::Mismatch, Check::RbiVersusRuns, message);
                }
            }
        }
    }

    /// A side's innings come from the outs the opposing pitchers recorded.
    fn innings_versus_outs(&mut self) {
        let g = self.game;
        for side in Side::BOTH {
            let Some(ls) = &g.line_scores[side] else {
                continue;
            };
            let pitching_side = side.opponent();
            let Stat::Known(outs) = self.sums[pitching_side].pitcher_outs else {
                continue;
            };
            let innings = ls.inning_count();
            let team = self.team(side);
            if outs % 3 == 0 {
                if innings == outs / 3 {
                    continue;
                }
                // The game may have ended on a play with no pitcher out
                // recorded; the fielders' putouts settle it.
                let putouts = match g.totals[pitching_side].putouts {
                    Stat::Missing => self.sums[pitching_side].putouts,
                    reported => reported,
                };
                if putouts != Stat::Known(outs) {
                    let message = format!(
                        "{team} Linescore innings {innings}, opposing pitcher outs {outs}, opposing putouts {putouts}"
                    );
                    self.report(Severity::Mismatch, Check::InningsVersusOuts, message);
                }
            } else if innings != outs / 3 + 1 {
                let message = format!(
                    "{team} Linescore innings {innings}, opposing pitcher outs {outs} (game ended with 1 or 2 outs)"
                );
                self.report(Severity::Mismatch, Check::InningsVersusOuts, message);
            }
        }
    }

    fn batting_order(&mut self) {
        for side in Side::BOTH {
            let team = self.team(side);
            for spot in 1..=9u8 {
                if !self.game.batting_for(side).any(|b| b.lineup == spot) {
                    let message = format!("batting order {team} {spot}");
                    self.report(Severity::Missing, Check::BattingOrder, message);
                }
            }

            let mut numbers: Vec<u32> = self
                .game
                .batting_for(side)
                .map(|b| b.order_number())
                .collect();
            numbers.sort_unstable();
            let mut previous = 0;
            for current in numbers {
                if !(100..1000).contains(&current) {
                    let message = format!("invalid batting order position {team} {current}");
                    self.report(Severity::Error, Check::BattingOrderRange, message);
                } else if current != previous + 1 && current != previous / 100 * 100 + 100 {
                    let message = format!(
                        "unexpected batting order sequence {team} {previous} followed by {current}"
                    );
                    self.report(Severity::Mismatch, Check::BattingOrder, message);
                }
                previous = current;
            }
        }
    }

    fn defensive_positions(&mut self) {
        let last = if self.game.context.use_dh {
            DESIGNATED_HITTER
        } else {
            9
        };
        for side in Side::BOTH {
            let team = self.team(side);
            for position in 1..=last {
                let covered = self
                    .game
                    .defense_for(side)
                    .any(|d| d.positions.contains(&position));
                if !covered {
                    let message = format!("defensive position {team} {position}");
                    self.report(Severity::Missing, Check::DefensivePositions, message);
                }
            }
        }
    }

    fn duplicates(&mut self) {
        for side in Side::BOTH {
            let team = self.team(side);
            let g = self.game;
            let groups = [
                ("player in batting order", tally(g.batting_for(side).map(|b| b.player.as_str()))),
                ("pitcher", tally(g.pitching_for(side).map(|p| p.player.as_str()))),
                ("pinch-hitter", tally(g.pinch_hitters[side].iter().map(|p| p.player.as_str()))),
                ("pinch-runner", tally(g.pinch_runners[side].iter().map(|p| p.player.as_str()))),
            ];
            for (what, counts) in &groups {
                for &(player, count) in counts {
                    if count > 1 {
                        let message = format!("{what} listed more than once: {team} {player} ({count})");
                        self.report(Severity::Duplicate, Check::DuplicateAppearance, message);
                    }
                }
            }
            let (_, hitters) = &groups[2];
            let (_, runners) = &groups[3];
            for &(player, _) in hitters {
                if runners.iter().any(|&(r, _)| r == player) {
                    let message = format!("pinch-hitter also listed as a pinch-runner: {team} {player}");
                    self.report(Severity::Duplicate, Check::DuplicateAppearance, message);
                }
            }
        }
    }

    fn player_lines(&mut self) {
        let g = self.game;
        for b in &g.batting {
            let s = &b.stats;
            let who = format!("{} {}", self.team(b.side), self.name(b.side, &b.player));
            let Stat::Known(hits) = s.hits else {
                continue;
            };
            let extra: u64 = [s.doubles, s.triples, s.home_runs]
                .iter()
                .map(|x| u64::from(x.or_zero()))
                .sum();
            if extra > u64::from(hits) {
                self.report(
                    Severity::Error,
                    Check::PlayerLine,
                    format!(
                        "{who}: more 2B, 3B and HR than Hits ({} 2B, {} 3B, {} HR, {hits} H)",
                        s.doubles.or_zero(),
                        s.triples.or_zero(),
                        s.home_runs.or_zero()
                    ),
                );
            }
            if let Stat::Known(at_bats) = s.at_bats {
                if hits > at_bats {
                    self.report(
                        Severity::Error,
                        Check::PlayerLine,
                        format!("{who}: more Hits than AB ({hits} H, {at_bats} AB)"),
                    );
                }
            }
        }
        for p in &g.pitching {
            if let (Stat::Known(k), Stat::Known(outs)) = (p.stats.strikeouts, p.stats.outs) {
                if k > outs {
                    let who = format!("{} {}", self.team(p.side), self.name(p.side, &p.player));
                    self.report(
                        Severity::Error,
                        Check::PlayerLine,
                        format!("{who}: more Strikeouts than Outs ({k} K, {outs} outs)"),
                    );
                }
            }
        }
    }

    fn event_participants(&mut self) {
        let g = self.game;
        for event in &g.events {
            match event {
                EventRecord::DoublePlay { side, fielders }
                | EventRecord::TriplePlay { side, fielders } => {
                    let kind = if matches!(event, EventRecord::DoublePlay { .. }) {
                        "DP"
                    } else {
                        "TP"
                    };
                    let team = self.team(*side);
                    let roster = self.roster_for(*side);
                    for fielder in fielders {
                        if roster.is_some_and(|r| !r.contains(team, fielder)) {
                            let message = format!("{kind} fielder {fielder} not found in {team} roster");
                            self.report(Severity::Error, Check::EventParticipants, message);
                        }
                        let played = g.batting_for(*side).any(|b| &b.player == fielder)
                            || g.pitching_for(*side).any(|p| &p.player == fielder);
                        if !played {
                            let message =
                                format!("{kind} fielder {fielder} not found in {team} batting order");
                            self.report(Severity::Error, Check::EventParticipants, message);
                        }
                    }
                }
                EventRecord::HitByPitch { .. } => {}
            }
        }

        for batter_side in Side::BOTH {
            let pitcher_side = batter_side.opponent();
            for (batter, pitcher) in g.hit_batsmen(batter_side) {
                if let (Some(pitcher), Some(roster)) = (pitcher, self.roster_for(pitcher_side)) {
                    let team = self.team(pitcher_side);
                    if !roster.contains(team, pitcher) {
                        let message = format!("HBP pitcher {pitcher} not found in {team} roster");
                        self.report(Severity::Error, Check::EventParticipants, message);
                    }
                }
                if let Some(roster) = self.roster_for(batter_side) {
                    let team = self.team(batter_side);
                    if !roster.contains(team, batter) {
                        let message = format!("HBP batter {batter} not found in {team} roster");
                        self.report(Severity::Error, Check::EventParticipants, message);
                    }
                }
            }
        }
    }
}

/// Occurrence counts in first-seen order.
fn tally<'s>(ids: impl Iterator<Item = &'s str>) -> Vec<(&'s str, usize)> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for id in ids {
        match counts.iter_mut().find(|(seen, _)| *seen == id) {
            Some((_, n)) => *n += 1,
            None => counts.push((id, 1)),
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boxscore::game::{DefensiveLine, IngestNote, LineScore, PinchAppearance};
    use crate::db::models::{BattingLine, PitchingLine};
    use chrono::NaiveDate;
    use std::collections::HashMap;

    struct TestRoster(HashMap<String, Vec<String>>);

    impl RosterLookup for TestRoster {
        fn has_team(&self, team: &str) -> bool {
            self.0.contains_key(team)
        }

        fn contains(&self, team: &str, player: &str) -> bool {
            self.0.get(team).is_some_and(|ids| ids.iter().any(|id| id == player))
        }

        fn display_name(&self, _team: &str, _player: &str) -> Option<&str> {
            None
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(1938, 4, 19).unwrap()
    }

    fn zero_batting() -> BattingStats {
        BattingStats::from_values([Stat::ZERO; BattingStats::FIELDS])
    }

    fn zero_pitching() -> PitchingStats {
        PitchingStats::from_values([Stat::ZERO; PitchingStats::FIELDS])
    }

    fn zero_fielding() -> FieldingStats {
        FieldingStats::from_values([Stat::ZERO; FieldingStats::FIELDS])
    }

    fn team(side: Side) -> &'static str {
        match side {
            Side::Road => "LOU",
            Side::Home => "KC",
        }
    }

    fn batter(side: Side, player: &str, lineup: u8, sequence: u8) -> BattingLine {
        BattingLine {
            player: player.into(),
            date: date(),
            game_number: 0,
            side,
            my_team: team(side).into(),
            opponent: team(side.opponent()).into(),
            lineup,
            sequence,
            stats: zero_batting(),
        }
    }

    fn pitcher(side: Side, player: &str, outs: u32) -> PitchingLine {
        PitchingLine {
            player: player.into(),
            date: date(),
            game_number: 0,
            side,
            my_team: team(side).into(),
            opponent: team(side.opponent()).into(),
            sequence: 0,
            starter: true,
            winner: false,
            loser: false,
            stats: PitchingStats {
                outs: Stat::Known(outs),
                ..zero_pitching()
            },
        }
    }

    fn innings(n: usize) -> Option<LineScore> {
        Some(LineScore {
            innings: vec![Stat::ZERO; n],
        })
    }

    /// A complete 9-inning 0-0 game with nothing to report.
    fn clean_game() -> Game {
        let mut g = Game::default();
        g.context.road_team = "LOU".into();
        g.context.home_team = "KC".into();
        g.context.date = Some(date());
        for side in Side::BOTH {
            for spot in 1..=9u8 {
                let id = format!("{}{spot}", team(side).to_lowercase());
                g.batting.push(batter(side, &id, spot, 0));
                g.defense.push(DefensiveLine {
                    player: id,
                    side,
                    positions: vec![spot],
                    stats: zero_fielding(),
                });
            }
            g.pitching.push(pitcher(side, &format!("{}1", team(side).to_lowercase()), 27));
            g.line_scores[side] = innings(9);
        }
        g
    }

    fn messages(diags: &[Diagnostic], check: Check) -> Vec<String> {
        diags
            .iter()
            .filter(|d| d.check == check)
            .map(|d| d.message.clone())
            .collect()
    }

    #[test]
    fn test_clean_game_has_no_diagnostics() {
        let diags = validate(&clean_game(), None);
        assert!(diags.is_empty(), "{diags:?}");
    }

    #[test]
    fn test_diagnostic_display() {
        let d = Diagnostic {
            severity: Severity::Mismatch,
            check: Check::TeamTotals,
            game: clean_game().context.label(),
            message: "LOU AB (sum of players=30, team total=31)".into(),
        };
        assert_eq!(
            d.to_string(),
            "MISMATCH: LOU at KC, 1938/04/19 (0): LOU AB (sum of players=30, team total=31)"
        );
    }

    #[test]
    fn test_team_totals_mismatch_reported() {
        let mut g = clean_game();
        g.batting[0].stats.at_bats = Stat::Known(4);
        g.totals.road.at_bats = Stat::Known(3);
        let diags = validate(&g, None);
        assert_eq!(
            messages(&diags, Check::TeamTotals),
            vec!["LOU AB (sum of players=4, team total=3)"]
        );
    }

    #[test]
    fn test_missing_player_value_skips_comparison() {
        let mut g = clean_game();
        g.batting[0].stats.at_bats = Stat::Missing;
        g.batting[1].stats.at_bats = Stat::Known(4);
        g.totals.road.at_bats = Stat::Known(3);
        assert!(messages(&validate(&g, None), Check::TeamTotals).is_empty());
    }

    #[test]
    fn test_huge_counts_do_not_overflow_sums() {
        let mut g = clean_game();
        g.batting[0].stats.at_bats = Stat::Known(u32::MAX);
        g.batting[1].stats.at_bats = Stat::Known(1);
        g.totals.road.at_bats = Stat::Known(3);
        let diags = validate(&g, None);
        assert!(messages(&diags, Check::TeamTotals).is_empty());

        let mut g = clean_game();
        let s = &mut g.batting[0].stats;
        s.at_bats = Stat::Known(4);
        s.hits = Stat::Known(1);
        s.doubles = Stat::Known(u32::MAX);
        s.triples = Stat::Known(u32::MAX);
        assert_eq!(messages(&validate(&g, None), Check::PlayerLine).len(), 1);
    }

    #[test]
    fn test_batting_hits_against_opposing_pitchers() {
        let mut g = clean_game();
        g.batting[0].stats.at_bats = Stat::Known(4);
        g.batting[0].stats.hits = Stat::Known(2);
        assert_eq!(
            messages(&validate(&g, None), Check::OpposingPitching),
            vec!["LOU Hits (sum of players=2, opposing pitcher totals=0 KC)"]
        );

        let home_pitcher = g.pitching.iter_mut().find(|p| p.side == Side::Home).unwrap();
        home_pitcher.stats.hits = Stat::Known(2);
        assert!(messages(&validate(&g, None), Check::OpposingPitching).is_empty());
    }

    #[test]
    fn test_missing_pitcher_runs_skip_opposing_comparison() {
        let mut g = clean_game();
        g.batting[0].stats.runs = Stat::Known(1);
        let home_pitcher = g.pitching.iter_mut().find(|p| p.side == Side::Home).unwrap();
        home_pitcher.stats.runs = Stat::Missing;
        assert!(messages(&validate(&g, None), Check::OpposingPitching).is_empty());

        // Same gap on the batting side.
        let mut g = clean_game();
        g.batting[9].stats.runs = Stat::Missing;
        let road_pitcher = g.pitching.iter_mut().find(|p| p.side == Side::Road).unwrap();
        road_pitcher.stats.runs = Stat::Known(3);
        assert!(messages(&validate(&g, None), Check::OpposingPitching).is_empty());
    }

    #[test]
    fn test_linescore_length_boundary() {
        // Home team won without batting in the ninth.
        let mut g = clean_game();
        g.line_scores.home = Some(LineScore {
            innings: vec![Stat::ZERO, Stat::Known(1), Stat::ZERO, Stat::ZERO, Stat::ZERO, Stat::ZERO, Stat::ZERO, Stat::ZERO],
        });
        g.pitching[0].stats.outs = Stat::Known(24);
        let diags = validate(&g, None);
        assert!(messages(&diags, Check::LinescoreLength).is_empty(), "{diags:?}");

        // Same lengths but the home team did not outscore the road team.
        let mut g = clean_game();
        g.line_scores.home = innings(8);
        g.pitching[0].stats.outs = Stat::Known(24);
        assert_eq!(
            messages(&validate(&g, None), Check::LinescoreLength),
            vec!["Linescore length LOU=9, KC=8"]
        );
    }

    #[test]
    fn test_missing_linescore_reported_once_per_side() {
        let mut g = clean_game();
        g.line_scores.road = None;
        let diags = validate(&g, None);
        assert_eq!(messages(&diags, Check::LinescoreLength), vec!["no linescore for LOU"]);
        assert!(messages(&diags, Check::InningsVersusOuts).is_empty());
    }

    #[test]
    fn test_linescore_runs_against_team_total() {
        let mut g = clean_game();
        g.totals.home.runs = Stat::Known(2);
        assert_eq!(
            messages(&validate(&g, None), Check::LinescoreRuns),
            vec!["KC Linescore runs 0, team total 2"]
        );
    }

    #[test]
    fn test_rbi_may_not_exceed_runs() {
        let mut g = clean_game();
        g.batting[0].stats.rbi = Stat::Known(1);
        assert_eq!(
            messages(&validate(&g, None), Check::RbiVersusRuns),
            vec!["LOU More RBI 1 than Runs 0"]
        );

        g.batting[1].stats.runs = Stat::Missing;
        assert!(messages(&validate(&g, None), Check::RbiVersusRuns).is_empty());
    }

    #[test]
    fn test_innings_versus_partial_inning_outs() {
        let mut g = clean_game();
        // Home pitcher got 26 outs: the road team batted in 9 innings.
        g.pitching[1].stats.outs = Stat::Known(26);
        assert!(messages(&validate(&g, None), Check::InningsVersusOuts).is_empty());

        g.pitching[1].stats.outs = Stat::Known(23);
        assert_eq!(
            messages(&validate(&g, None), Check::InningsVersusOuts),
            vec!["LOU Linescore innings 9, opposing pitcher outs 23 (game ended with 1 or 2 outs)"]
        );
    }

    #[test]
    fn test_innings_versus_outs_falls_back_to_putouts() {
        let mut g = clean_game();
        g.pitching[1].stats.outs = Stat::Known(24);
        g.totals.home.putouts = Stat::Known(24);
        assert!(messages(&validate(&g, None), Check::InningsVersusOuts).is_empty());

        g.totals.home.putouts = Stat::Known(25);
        assert_eq!(
            messages(&validate(&g, None), Check::InningsVersusOuts),
            vec!["LOU Linescore innings 9, opposing pitcher outs 24, opposing putouts 25"]
        );
    }

    #[test]
    fn test_batting_order_chain_with_substitute() {
        let mut g = clean_game();
        g.batting.push(batter(Side::Road, "sub301", 3, 1));
        let diags = validate(&g, None);
        assert!(messages(&diags, Check::BattingOrder).is_empty(), "{diags:?}");
    }

    #[test]
    fn test_batting_order_gap_reported() {
        let mut g = clean_game();
        g.batting.push(batter(Side::Road, "sub103", 1, 3));
        assert_eq!(
            messages(&validate(&g, None), Check::BattingOrder),
            vec!["unexpected batting order sequence LOU 100 followed by 103"]
        );
    }

    #[test]
    fn test_empty_batting_spot_and_range() {
        let mut g = clean_game();
        g.batting.retain(|b| !(b.side == Side::Home && b.lineup == 4));
        g.batting.push(batter(Side::Road, "ten", 10, 0));
        let diags = validate(&g, None);
        assert!(messages(&diags, Check::BattingOrder).contains(&"batting order KC 4".to_string()));
        assert_eq!(
            messages(&diags, Check::BattingOrderRange),
            vec!["invalid batting order position LOU 1000"]
        );
    }

    #[test]
    fn test_designated_hitter_position_required() {
        let mut g = clean_game();
        g.context.use_dh = true;
        assert_eq!(
            messages(&validate(&g, None), Check::DefensivePositions),
            vec!["defensive position LOU 10", "defensive position KC 10"]
        );
    }

    #[test]
    fn test_duplicates_and_ph_pr_conflict() {
        let mut g = clean_game();
        g.pitching.push(pitcher(Side::Home, "kc1", 0));
        let pinch = |p: &str| PinchAppearance {
            player: p.into(),
            inning: Stat::Known(8),
        };
        g.pinch_hitters.road.push(pinch("lou9"));
        g.pinch_runners.road.push(pinch("lou9"));
        let diags = validate(&g, None);
        assert_eq!(
            messages(&diags, Check::DuplicateAppearance),
            vec![
                "pinch-hitter also listed as a pinch-runner: LOU lou9",
                "pitcher listed more than once: KC kc1 (2)",
            ]
        );
    }

    #[test]
    fn test_more_hits_than_at_bats() {
        let mut g = clean_game();
        g.batting[0].stats.at_bats = Stat::Known(4);
        g.batting[0].stats.hits = Stat::Known(5);
        let found = messages(&validate(&g, None), Check::PlayerLine);
        assert!(found.iter().any(|m| m.contains("more Hits than AB")), "{found:?}");
    }

    #[test]
    fn test_extra_base_hits_treat_missing_as_zero() {
        let mut g = clean_game();
        let s = &mut g.batting[0].stats;
        s.at_bats = Stat::Known(4);
        s.hits = Stat::Known(1);
        s.doubles = Stat::Missing;
        s.home_runs = Stat::Known(1);
        assert!(messages(&validate(&g, None), Check::PlayerLine).is_empty());

        g.batting[0].stats.triples = Stat::Known(1);
        assert_eq!(messages(&validate(&g, None), Check::PlayerLine).len(), 1);
    }

    #[test]
    fn test_strikeouts_above_outs() {
        let mut g = clean_game();
        g.pitching.push(PitchingLine {
            stats: PitchingStats {
                outs: Stat::Known(1),
                strikeouts: Stat::Known(2),
                ..zero_pitching()
            },
            ..pitcher(Side::Home, "relief", 0)
        });
        let found = messages(&validate(&g, None), Check::PlayerLine);
        assert_eq!(found, vec!["KC relief: more Strikeouts than Outs (2 K, 1 outs)"]);
    }

    #[test]
    fn test_roster_membership() {
        let mut known: Vec<String> = (1..=9).map(|n| format!("lou{n}")).collect();
        known.retain(|id| id != "lou5");
        let roster = TestRoster(HashMap::from([("LOU".to_string(), known)]));
        let diags = validate(&clean_game(), Some(&roster));
        assert_eq!(
            messages(&diags, Check::RosterMembership),
            vec!["Batter lou5 not found in LOU roster", "no roster loaded for team KC"]
        );
    }

    #[test]
    fn test_decision_pitchers_on_correct_side() {
        let mut g = clean_game();
        g.totals.road.runs = Stat::Known(1);
        g.line_scores.road = Some(LineScore {
            innings: [vec![Stat::Known(1)], vec![Stat::ZERO; 8]].concat(),
        });
        g.context.winning_pitcher = Some("kc1".into());
        g.context.losing_pitcher = Some("kc1".into());
        assert_eq!(
            messages(&validate(&g, None), Check::DecisionSide),
            vec!["Winning pitcher kc1 not among LOU pitchers"]
        );
    }

    #[test]
    fn test_event_participants() {
        let mut g = clean_game();
        g.events.push(EventRecord::DoublePlay {
            side: Side::Home,
            fielders: vec!["kc6".into(), "stranger".into()],
        });
        let found = messages(&validate(&g, None), Check::EventParticipants);
        assert_eq!(found, vec!["DP fielder stranger not found in KC batting order"]);
    }

    #[test]
    fn test_hit_by_pitch_participants_on_opposite_rosters() {
        let ids = |prefix: &str| (1..=9).map(|n| format!("{prefix}{n}")).collect::<Vec<_>>();
        let roster = TestRoster(HashMap::from([
            ("LOU".to_string(), ids("lou")),
            ("KC".to_string(), ids("kc")),
        ]));
        let mut g = clean_game();
        g.events.push(EventRecord::HitByPitch {
            pitcher_side: Side::Road,
            pitcher: Some("ghost".into()),
            batter: "kc2".into(),
        });
        g.events.push(EventRecord::HitByPitch {
            pitcher_side: Side::Home,
            pitcher: Some("kc1".into()),
            batter: "lou99".into(),
        });
        let found = messages(&validate(&g, Some(&roster)), Check::EventParticipants);
        assert_eq!(
            found,
            vec![
                "HBP batter lou99 not found in LOU roster",
                "HBP pitcher ghost not found in LOU roster"
            ]
        );
    }

    #[test]
    fn test_ingest_notes_become_warnings() {
        let mut g = clean_game();
        g.notes.push(IngestNote {
            line: 12,
            message: "field 4 of line record holds 'x', read as missing".into(),
        });
        let diags = validate(&g, None);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].severity, Severity::Warning);
        assert!(diags[0].message.starts_with("line 12: "));
    }
}
