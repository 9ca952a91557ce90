//! Team rosters, read from headerless `*.ROS` files:
//! `id,last,first,bats,throws,team,pos`.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::{debug, info};

use crate::error::RosterError;
use crate::validate::RosterLookup;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default)]
pub struct Roster {
    teams: Vec<String>,
    players: HashMap<String, HashMap<String, RosterEntry>>,
}

impl Roster {
    /// Load every `*.ROS` file in `dir`. An empty directory gives an empty
    /// roster, not an error.
    pub fn load_dir(dir: &Path) -> Result<Self, RosterError> {
        let pattern = dir.join("*.ROS");
        let mut roster = Roster::default();
        let mut files = 0usize;
        for path in glob::glob(&pattern.to_string_lossy())? {
            let path = path?;
            let label = path.display().to_string();
            let file = File::open(&path).map_err(|source| RosterError::Io {
                path: label.clone(),
                source,
            })?;
            roster.read_from(file, &label)?;
            files += 1;
            debug!(file = %label, "loaded roster file");
        }
        info!(files, teams = roster.teams.len(), "loaded rosters from {}", dir.display());
        Ok(roster)
    }

    pub fn from_reader<R: Read>(rdr: R) -> Result<Self, RosterError> {
        let mut roster = Roster::default();
        roster.read_from(rdr, "<reader>")?;
        Ok(roster)
    }

    fn read_from<R: Read>(&mut self, rdr: R, label: &str) -> Result<(), RosterError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(rdr);

        for record in reader.records() {
            let record = record.map_err(|source| RosterError::Csv {
                path: label.to_string(),
                source,
            })?;
            if record.iter().all(str::is_empty) {
                continue;
            }
            if record.len() < 6 {
                return Err(RosterError::ShortRow {
                    path: label.to_string(),
                    line: record.position().map_or(0, |p| p.line()),
                });
            }
            let field = |i: usize| record.get(i).unwrap_or_default().to_string();
            let (last, first) = (field(1), field(2));
            let name = if first == "Unknown" || first.is_empty() {
                last
            } else {
                format!("{first} {last}")
            };
            self.insert(
                &field(5),
                RosterEntry {
                    id: field(0),
                    name,
                },
            );
        }
        Ok(())
    }

    fn insert(&mut self, team: &str, entry: RosterEntry) {
        if !self.players.contains_key(team) {
            self.teams.push(team.to_string());
        }
        self.players
            .entry(team.to_string())
            .or_default()
            .insert(entry.id.clone(), entry);
    }

    /// Teams in the order first seen.
    pub fn teams(&self) -> &[String] {
        &self.teams
    }

    pub fn entry(&self, team: &str, player: &str) -> Option<&RosterEntry> {
        self.players.get(team)?.get(player)
    }

    /// Display name from whichever team lists the player first.
    pub fn any_name(&self, player: &str) -> Option<&str> {
        self.teams
            .iter()
            .find_map(|t| self.display_name(t, player))
    }
}

impl RosterLookup for Roster {
    fn has_team(&self, team: &str) -> bool {
        self.players.contains_key(team)
    }

    fn contains(&self, team: &str, player: &str) -> bool {
        self.entry(team, player).is_some()
    }

    fn display_name(&self, team: &str, player: &str) -> Option<&str> {
        self.entry(team, player).map(|e| e.name.as_str())
    }
}
