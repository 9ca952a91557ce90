use anyhow::{Context, Result};
use clap::Parser;
use rayon::prelude::*;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::{info, warn};

mod aggregate;
mod boxscore;
mod config;
mod db;
mod error;
mod roster;
mod validate;

use aggregate::{batting, logs, pitching, player_slices, positions, SeasonRow};
use boxscore::{Accumulator, Game};
use config::{Command, Config, FilterArgs};
use db::models::LineFilter;
use db::Database;
use roster::Roster;
use validate::{validate, RosterLookup, Severity};

fn main() -> Result<()> {
    // Initialise tracing / logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let config = Config::parse();
    config.validate()?;

    match &config.command {
        Command::Check { file } => {
            let roster = load_roster(&config.rosters)?;
            check_file(&config, file, roster.as_ref(), None)
        }
        Command::Load {
            file,
            skip_validation,
        } => {
            let roster = if *skip_validation {
                None
            } else {
                load_roster(&config.rosters)?
            };
            let db = Database::open(&config.database)?;
            info!("Database opened: {}", config.database.display());
            check_file(&config, file, roster.as_ref(), Some((&db, *skip_validation)))?;
            info!("{} game(s) now stored", db.game_count()?);
            Ok(())
        }
        Command::Splits(filter) => splits(&config, filter),
        Command::Positions(filter) => position_summary(&config, filter),
        Command::Gamelog { player, filter } => game_log(&config, player, filter),
        Command::TeamLog(filter) => team_log(&config, filter),
        Command::Lineups(filter) => lineups(&config, filter),
        Command::Normalize { file } => normalize(&config, file),
    }
}

/// Rosters for the cross-checks. A directory with no roster files means
/// the membership checks are skipped rather than failing every player.
fn load_roster(dir: &Path) -> Result<Option<Roster>> {
    let roster = Roster::load_dir(dir)?;
    if roster.teams().is_empty() {
        warn!("no roster files in {}; skipping roster checks", dir.display());
        Ok(None)
    } else {
        Ok(Some(roster))
    }
}

fn accumulator(config: &Config) -> Accumulator {
    if config.strict {
        Accumulator::strict()
    } else {
        Accumulator::new()
    }
}

fn open_input(file: &Path) -> Result<BufReader<File>> {
    let f = File::open(file).with_context(|| format!("opening {}", file.display()))?;
    Ok(BufReader::new(f))
}

/// Ingest a file, print each game's diagnostics and optionally store it.
fn check_file(
    config: &Config,
    file: &Path,
    roster: Option<&Roster>,
    store: Option<(&Database, bool)>,
) -> Result<()> {
    let lookup = roster.map(|r| r as &dyn RosterLookup);
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let mut problems = 0usize;
    let mut warnings = 0usize;

    let on_game = |game: Game| -> Result<()> {
        let skip_validation = store.is_some_and(|(_, skip)| skip);
        if !skip_validation {
            for diagnostic in validate(&game, lookup) {
                if diagnostic.severity == Severity::Warning {
                    warnings += 1;
                } else {
                    problems += 1;
                }
                writeln!(out, "{diagnostic}")?;
            }
        }
        if let Some((db, _)) = store {
            db.insert_game(&game)
                .with_context(|| format!("storing {}", game.context.label()))?;
        }
        Ok(())
    };

    let games = accumulator(config).ingest(open_input(file)?, on_game)?;
    out.flush()?;
    info!(problems, warnings, "checked {games} box scores from {}", file.display());
    Ok(())
}

fn display_name<'r>(roster: Option<&'r Roster>, player: &'r str) -> &'r str {
    roster.and_then(|r| r.any_name(player)).unwrap_or(player)
}

fn print_rows<T: Serialize>(rows: &[T]) -> Result<()> {
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for row in rows {
        serde_json::to_writer(&mut out, row)?;
        writeln!(out)?;
    }
    out.flush()?;
    Ok(())
}

fn splits(config: &Config, filter: &FilterArgs) -> Result<()> {
    let db = Database::open(&config.database)?;
    let roster = load_roster(&config.rosters)?;
    let roster = roster.as_ref();
    let filter = filter.line_filter();

    let batting_lines = db.batting_lines(&filter)?;
    let pitching_lines = db.pitching_lines(&filter)?;
    info!(
        batting = batting_lines.len(),
        pitching = pitching_lines.len(),
        "aggregating season lines"
    );

    let mut rows: Vec<SeasonRow> = player_slices(&batting_lines, |b| b.player.as_str())
        .par_iter()
        .map(|lines| {
            let player = lines[0].player.as_str();
            batting::season_row(player, display_name(roster, player), lines)
        })
        .collect();
    rows.par_extend(
        player_slices(&pitching_lines, |p| p.player.as_str())
            .par_iter()
            .map(|lines| {
                let player = lines[0].player.as_str();
                pitching::season_row(player, display_name(roster, player), lines)
            }),
    );
    print_rows(&rows)
}

fn position_summary(config: &Config, filter: &FilterArgs) -> Result<()> {
    let db = Database::open(&config.database)?;
    let roster = load_roster(&config.rosters)?;
    let roster = roster.as_ref();

    let appearances = db.defensive_appearances(&filter.line_filter())?;
    info!(appearances = appearances.len(), "summarising positions");

    let rows: Vec<SeasonRow> = player_slices(&appearances, |a| a.player.as_str())
        .par_iter()
        .map(|games| {
            let player = games[0].player.as_str();
            positions::season_row(player, display_name(roster, player), games)
        })
        .collect();
    print_rows(&rows)
}

fn game_log(config: &Config, player: &str, filter: &FilterArgs) -> Result<()> {
    let db = Database::open(&config.database)?;
    let roster = load_roster(&config.rosters)?;
    let filter = LineFilter {
        player: Some(player.to_string()),
        ..filter.line_filter()
    };

    let name = display_name(roster.as_ref(), player);
    let mut rows = logs::batting_log(name, &db.batting_lines(&filter)?);
    rows.extend(logs::pitching_log(name, &db.pitching_lines(&filter)?));
    if rows.is_empty() {
        warn!("no stored games for {player}");
    }
    print_rows(&rows)
}

fn team_log(config: &Config, filter: &FilterArgs) -> Result<()> {
    let db = Database::open(&config.database)?;
    let roster = load_roster(&config.rosters)?;
    let games = db.games(&filter.line_filter())?;
    info!(games = games.len(), "listing games");

    let lookup = roster.as_ref().map(|r| r as &dyn RosterLookup);
    print_rows(&logs::team_game_rows(&games, filter.team.as_deref(), lookup))
}

fn lineups(config: &Config, filter: &FilterArgs) -> Result<()> {
    let team = filter
        .team
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("lineups needs --team"))?;
    let db = Database::open(&config.database)?;
    let roster = load_roster(&config.rosters)?;
    let filter = filter.line_filter();

    let games = db.games(&filter)?;
    let batting = db.batting_lines(&filter)?;
    let defense = db.defensive_appearances(&filter)?;
    let pitching = db.pitching_lines(&filter)?;
    info!(games = games.len(), "listing {team} lineups");

    let lookup = roster.as_ref().map(|r| r as &dyn RosterLookup);
    print_rows(&logs::lineup_rows(team, &games, &batting, &defense, &pitching, lookup))
}

fn normalize(config: &Config, file: &Path) -> Result<()> {
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let games = accumulator(config).ingest(open_input(file)?, |game| {
        for line in game.to_wire_lines() {
            writeln!(out, "{line}")?;
        }
        Ok(())
    })?;
    out.flush()?;
    info!("normalized {games} box scores from {}", file.display());
    Ok(())
}
