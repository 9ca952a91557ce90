//! Game-by-game rows: a player's log, a team's results and its starting
//! lineups. Unlike season rows nothing is summed, so a missing stat is
//! simply an empty cell.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;

use crate::aggregate::batting::BattingStat;
use crate::aggregate::display::innings_display;
use crate::aggregate::pitching::PitchingStat;
use crate::aggregate::{GameLine, RowKind, StatColumn, StatKey};
use crate::boxscore::side::Side;
use crate::boxscore::stat::Stat;
use crate::db::models::{BattingLine, DayNight, DefensiveAppearance, GameContext, PitchingLine};
use crate::validate::RosterLookup;

/// Start times recorded as unknown.
const NO_START_TIME: &str = "00:00PM";

/// One game seen from one team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Matchup {
    pub date: String,
    pub game_number: u8,
    pub team: String,
    /// "vs" at home, "at" on the road.
    pub at: &'static str,
    pub opponent: String,
}

impl Matchup {
    fn new(date: Option<NaiveDate>, game_number: u8, side: Side, team: &str, opponent: &str) -> Self {
        Matchup {
            date: date.map(|d| d.format("%Y/%m/%d").to_string()).unwrap_or_default(),
            game_number,
            team: team.to_string(),
            at: match side {
                Side::Home => "vs",
                Side::Road => "at",
            },
            opponent: opponent.to_string(),
        }
    }

    fn of_game(ctx: &GameContext, side: Side) -> Self {
        Matchup::new(
            ctx.date,
            ctx.game_number,
            side,
            ctx.team(side),
            ctx.team(side.opponent()),
        )
    }
}

fn cell(stat: Stat) -> String {
    stat.known().map(|n| n.to_string()).unwrap_or_default()
}

fn flag(set: bool) -> String {
    String::from(if set { "1" } else { "0" })
}

fn runs(ctx: &GameContext, side: Side) -> Stat {
    match side {
        Side::Road => ctx.road_runs,
        Side::Home => ctx.home_runs,
    }
}

/// The selected team's side of the game; road first when no team is
/// selected or it is the road team.
fn view(ctx: &GameContext, team: Option<&str>) -> Side {
    if team == Some(ctx.home_team.as_str()) {
        Side::Home
    } else {
        Side::Road
    }
}

fn extra_innings(ctx: &GameContext) -> Option<u32> {
    (ctx.innings != 9).then_some(ctx.innings)
}

// ── Player game log ───────────────────────────────────────────────────────────

/// One player's line in one game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameLogRow {
    pub kind: RowKind,
    pub player: String,
    pub name: String,
    #[serde(flatten)]
    pub game: Matchup,
    pub columns: Vec<StatColumn>,
}

const BATTING_LOG: &[BattingStat] = &[
    BattingStat::AtBats,
    BattingStat::Runs,
    BattingStat::Hits,
    BattingStat::Doubles,
    BattingStat::Triples,
    BattingStat::HomeRuns,
    BattingStat::Rbi,
    BattingStat::StolenBases,
    BattingStat::CaughtStealing,
    BattingStat::Walks,
    BattingStat::IntentionalWalks,
    BattingStat::Strikeouts,
    BattingStat::Gidp,
    BattingStat::HitByPitch,
    BattingStat::SacHits,
    BattingStat::SacFlies,
    BattingStat::Interference,
];

const PITCHING_LOG: &[PitchingStat] = &[
    PitchingStat::Hits,
    PitchingStat::Runs,
    PitchingStat::EarnedRuns,
    PitchingStat::HomeRuns,
    PitchingStat::Walks,
    PitchingStat::IntentionalWalks,
    PitchingStat::Strikeouts,
    PitchingStat::HitBatsmen,
    PitchingStat::Balks,
    PitchingStat::WildPitches,
    PitchingStat::BattersFaced,
];

pub fn batting_log(name: &str, lines: &[BattingLine]) -> Vec<GameLogRow> {
    lines
        .iter()
        .map(|b| GameLogRow {
            kind: RowKind::Batting,
            player: b.player.clone(),
            name: name.to_string(),
            game: Matchup::new(Some(b.date), b.game_number, b.side, &b.my_team, &b.opponent),
            columns: BATTING_LOG
                .iter()
                .map(|&k| StatColumn::derived(k.label(), cell(b.stat(k))))
                .collect(),
        })
        .collect()
}

pub fn pitching_log(name: &str, lines: &[PitchingLine]) -> Vec<GameLogRow> {
    lines
        .iter()
        .map(|p| {
            let ip = p
                .stats
                .outs
                .known()
                .map(|outs| innings_display(u64::from(outs)))
                .unwrap_or_default();
            let mut columns = vec![
                StatColumn::derived("W", flag(p.winner)),
                StatColumn::derived("L", flag(p.loser)),
                StatColumn::derived("GS", flag(p.starter)),
                StatColumn::derived(PitchingStat::Outs.label(), ip),
            ];
            columns.extend(
                PITCHING_LOG
                    .iter()
                    .map(|&k| StatColumn::derived(k.label(), cell(p.stat(k)))),
            );
            GameLogRow {
                kind: RowKind::Pitching,
                player: p.player.clone(),
                name: name.to_string(),
                game: Matchup::new(Some(p.date), p.game_number, p.side, &p.my_team, &p.opponent),
                columns,
            }
        })
        .collect()
}

// ── Team game log ─────────────────────────────────────────────────────────────

/// A game's result and particulars, from the selected team's side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamGameRow {
    #[serde(flatten)]
    pub game: Matchup,
    pub runs: String,
    pub opponent_runs: String,
    /// Only for games that did not go nine.
    pub innings: Option<u32>,
    pub winning_pitcher: String,
    pub losing_pitcher: String,
    /// "H:MM"
    pub time_of_game: String,
    pub day_night: DayNight,
    pub start_time: String,
    pub attendance: String,
    pub comment: String,
}

pub fn team_game_rows(
    games: &[GameContext],
    team: Option<&str>,
    roster: Option<&dyn RosterLookup>,
) -> Vec<TeamGameRow> {
    games
        .iter()
        .map(|ctx| {
            let side = view(ctx, team);
            let pitcher = |id: &Option<String>| decision_name(ctx, id.as_deref(), roster);
            TeamGameRow {
                game: Matchup::of_game(ctx, side),
                runs: cell(runs(ctx, side)),
                opponent_runs: cell(runs(ctx, side.opponent())),
                innings: extra_innings(ctx),
                winning_pitcher: pitcher(&ctx.winning_pitcher),
                losing_pitcher: pitcher(&ctx.losing_pitcher),
                time_of_game: ctx
                    .time_of_game
                    .known()
                    .map(|m| format!("{}:{:02}", m / 60, m % 60))
                    .unwrap_or_default(),
                day_night: ctx.day_night,
                start_time: ctx
                    .start_time
                    .clone()
                    .filter(|t| t != NO_START_TIME)
                    .unwrap_or_default(),
                attendance: cell(ctx.attendance),
                comment: ctx.comment.clone(),
            }
        })
        .collect()
}

/// Roster name of a decision pitcher from either club, else the id.
fn decision_name(ctx: &GameContext, id: Option<&str>, roster: Option<&dyn RosterLookup>) -> String {
    let Some(id) = id else {
        return String::new();
    };
    roster
        .and_then(|r| {
            r.display_name(&ctx.road_team, id)
                .or_else(|| r.display_name(&ctx.home_team, id))
        })
        .unwrap_or(id)
        .to_string()
}

// ── Starting lineups ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Starter {
    /// First position played, e.g. "cf".
    pub position: String,
    pub player: String,
    pub name: String,
}

/// A team's starting nine and starting pitcher for one game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineupRow {
    #[serde(flatten)]
    pub game: Matchup,
    pub runs: String,
    pub opponent_runs: String,
    pub innings: Option<u32>,
    pub batters: Vec<Starter>,
    pub pitcher: Option<Starter>,
}

type GameKey = (NaiveDate, u8);

fn by_game<'l, L>(lines: &'l [L], key: impl Fn(&L) -> Option<GameKey>) -> HashMap<GameKey, Vec<&'l L>> {
    let mut games: HashMap<GameKey, Vec<&L>> = HashMap::new();
    for line in lines {
        if let Some(k) = key(line) {
            games.entry(k).or_default().push(line);
        }
    }
    games
}

/// Starting lineups of `team`. Lines of other teams are ignored, so the
/// caller may pass unfiltered lines.
pub fn lineup_rows(
    team: &str,
    games: &[GameContext],
    batting: &[BattingLine],
    defense: &[DefensiveAppearance],
    pitching: &[PitchingLine],
    roster: Option<&dyn RosterLookup>,
) -> Vec<LineupRow> {
    let starters = by_game(batting, |b| {
        (b.my_team == team && b.sequence == 0).then_some((b.date, b.game_number))
    });
    let fielders = by_game(defense, |d| (d.my_team == team).then_some((d.date, d.game_number)));
    let pitchers = by_game(pitching, |p| {
        (p.my_team == team && p.starter).then_some((p.date, p.game_number))
    });
    let name = |player: &str| {
        roster
            .and_then(|r| r.display_name(team, player))
            .unwrap_or(player)
            .to_string()
    };

    games
        .iter()
        .filter_map(|ctx| {
            let key = (ctx.date?, ctx.game_number);
            let side = view(ctx, Some(team));
            if ctx.team(side) != team {
                return None;
            }

            let mut order = starters.get(&key).cloned().unwrap_or_default();
            order.sort_by_key(|b| b.lineup);
            let batters = order
                .iter()
                .map(|b| {
                    let position = fielders
                        .get(&key)
                        .and_then(|f| f.iter().find(|d| d.player == b.player))
                        .and_then(|d| d.position_list.split('-').next())
                        .unwrap_or_default()
                        .to_string();
                    Starter {
                        position,
                        player: b.player.clone(),
                        name: name(&b.player),
                    }
                })
                .collect();
            let pitcher = pitchers.get(&key).and_then(|p| p.first()).map(|p| Starter {
                position: "p".to_string(),
                player: p.player.clone(),
                name: name(&p.player),
            });

            Some(LineupRow {
                game: Matchup::of_game(ctx, side),
                runs: cell(runs(ctx, side)),
                opponent_runs: cell(runs(ctx, side.opponent())),
                innings: extra_innings(ctx),
                batters,
                pitcher,
            })
        })
        .collect()
}
