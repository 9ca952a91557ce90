use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::db::models::{LineFilter, Location};

/// Box score ingestion, cross-checking and season totals
#[derive(Parser, Debug, Clone)]
#[command(name = "box-ledger", version, about)]
pub struct Config {
    /// SQLite database path
    #[arg(long, global = true, env = "BOX_DATABASE", default_value = "boxscores.db")]
    pub database: PathBuf,

    /// Directory holding the *.ROS roster files
    #[arg(long, global = true, env = "BOX_ROSTERS", default_value = ".")]
    pub rosters: PathBuf,

    /// Reject numeric fields outside the digit alphabet instead of reading
    /// them as missing
    #[arg(long, global = true, env = "BOX_STRICT")]
    pub strict: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Ingest and cross-check a box score file, printing diagnostics
    Check { file: PathBuf },

    /// Ingest, cross-check and store a box score file
    Load {
        file: PathBuf,

        /// Store games without running the cross-checks
        #[arg(long)]
        skip_validation: bool,
    },

    /// Season batting and pitching totals per player, as JSON lines
    Splits(FilterArgs),

    /// Games played at each position per player, as JSON lines
    Positions(FilterArgs),

    /// One player's game-by-game batting and pitching lines
    Gamelog {
        /// Player id, e.g. beanb101
        player: String,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Game results with runs, innings and decisions, from --team's side
    TeamLog(FilterArgs),

    /// Starting lineups and starting pitcher of --team
    Lineups(FilterArgs),

    /// Re-emit every game of a file in canonical form
    Normalize { file: PathBuf },
}

#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Only this team's players
    #[arg(long)]
    pub team: Option<String>,

    /// Only games against this team
    #[arg(long)]
    pub opponent: Option<String>,

    #[arg(long, value_enum, default_value = "all")]
    pub location: Location,

    /// First date, YYYY/MM/DD
    #[arg(long, value_parser = parse_date)]
    pub start: Option<NaiveDate>,

    /// Last date, YYYY/MM/DD (inclusive)
    #[arg(long, value_parser = parse_date)]
    pub end: Option<NaiveDate>,
}

impl FilterArgs {
    pub fn line_filter(&self) -> LineFilter {
        LineFilter {
            player: None,
            team: self.team.clone(),
            opponent: self.opponent.clone(),
            location: self.location,
            start: self.start,
            end: self.end,
        }
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw, "%Y/%m/%d")
        .map_err(|e| format!("'{raw}' is not a YYYY/MM/DD date: {e}"))
}

impl Command {
    fn filter(&self) -> Option<&FilterArgs> {
        match self {
            Command::Splits(filter)
            | Command::Positions(filter)
            | Command::TeamLog(filter)
            | Command::Lineups(filter)
            | Command::Gamelog { filter, .. } => Some(filter),
            Command::Check { .. } | Command::Load { .. } | Command::Normalize { .. } => None,
        }
    }
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        let Some(filter) = self.command.filter() else {
            return Ok(());
        };
        if let (Some(start), Some(end)) = (filter.start, filter.end) {
            if end < start {
                anyhow::bail!("--end {end} is before --start {start}");
            }
        }
        match &self.command {
            Command::Lineups(f) if f.team.is_none() => {
                anyhow::bail!("lineups needs --team");
            }
            Command::TeamLog(f)
                if f.team.is_none() && (f.opponent.is_some() || f.location != Location::All) =>
            {
                anyhow::bail!("team-log --opponent and --location are relative to --team");
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        Config::try_parse_from(std::iter::once("box-ledger").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_filter_flags() {
        let config = parse(&[
            "splits",
            "--team",
            "LOU",
            "--location",
            "road",
            "--start",
            "1938/05/01",
            "--end",
            "1938/05/31",
        ]);
        let Command::Splits(filter) = &config.command else {
            panic!("expected splits");
        };
        let f = filter.line_filter();
        assert_eq!(f.team.as_deref(), Some("LOU"));
        assert_eq!(f.location, Location::Road);
        assert_eq!(f.start, NaiveDate::from_ymd_opt(1938, 5, 1));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_end_before_start_rejected() {
        let config = parse(&["positions", "--start", "1938/05/10", "--end", "1938/05/01"]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_date_is_a_parse_error() {
        let result = Config::try_parse_from(["box-ledger", "splits", "--start", "1938-05-01"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_gamelog_player_and_filter() {
        let config = parse(&["gamelog", "beanb101", "--opponent", "KC"]);
        let Command::Gamelog { player, filter } = &config.command else {
            panic!("expected gamelog");
        };
        assert_eq!(player, "beanb101");
        assert_eq!(filter.line_filter().opponent.as_deref(), Some("KC"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_lineups_need_a_team() {
        assert!(parse(&["lineups"]).validate().is_err());
        assert!(parse(&["lineups", "--team", "KC"]).validate().is_ok());
    }

    #[test]
    fn test_team_log_filters_are_relative_to_team() {
        assert!(parse(&["team-log"]).validate().is_ok());
        assert!(parse(&["team-log", "--location", "home"]).validate().is_err());
        assert!(parse(&["team-log", "--team", "KC", "--opponent", "LOU"])
            .validate()
            .is_ok());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let config = parse(&["load", "games.txt", "--skip-validation", "--database", "x.db"]);
        assert_eq!(config.database, PathBuf::from("x.db"));
        assert!(matches!(
            config.command,
            Command::Load {
                skip_validation: true,
                ..
            }
        ));
    }
}
