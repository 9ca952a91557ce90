//! Season aggregation over one player's ordered per-game lines.
//!
//! Every counting stat keeps two numbers: the sum of its known values and
//! how many games supplied one. A stat is complete when every game did.
//! Derived ratios are only computed from complete inputs.

pub mod batting;
pub mod display;
pub mod logs;
pub mod pitching;
pub mod positions;

use serde::Serialize;
use std::marker::PhantomData;

use crate::boxscore::stat::Stat;

/// Running total of one stat over a window of games.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub sum: u64,
    /// Games in which the stat was recorded.
    pub occurrences: u32,
}

impl Tally {
    /// Missing values are dropped; they neither add nor count.
    pub fn record(&mut self, stat: Stat) {
        if let Stat::Known(n) = stat {
            self.sum += u64::from(n);
            self.occurrences += 1;
        }
    }
}

/// A countable stat of one line type.
pub trait StatKey: Copy + Eq + Send + Sync + 'static {
    const ALL: &'static [Self];

    fn index(self) -> usize;
    fn label(self) -> &'static str;
}

/// One player's line for one game.
pub trait GameLine {
    type Key: StatKey;

    fn player(&self) -> &str;
    fn team(&self) -> &str;
    fn stat(&self, key: Self::Key) -> Stat;
}

/// Sums, occurrence counts and teams for one player's window of games.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ledger<K: StatKey> {
    games: u32,
    tallies: Vec<Tally>,
    teams: Vec<String>,
    _key: PhantomData<K>,
}

impl<K: StatKey> Default for Ledger<K> {
    fn default() -> Self {
        Ledger {
            games: 0,
            tallies: vec![Tally::default(); K::ALL.len()],
            teams: Vec::new(),
            _key: PhantomData,
        }
    }
}

impl<K: StatKey> Ledger<K> {
    pub fn from_lines<'l, L>(lines: impl IntoIterator<Item = &'l L>) -> Self
    where
        L: GameLine<Key = K> + 'l,
    {
        let mut ledger = Self::default();
        for line in lines {
            ledger.add(line);
        }
        ledger
    }

    pub fn add<L: GameLine<Key = K>>(&mut self, line: &L) {
        self.games += 1;
        for &key in K::ALL {
            self.tallies[key.index()].record(line.stat(key));
        }
        if !self.teams.iter().any(|t| t == line.team()) {
            self.teams.push(line.team().to_string());
        }
    }

    pub fn games(&self) -> u32 {
        self.games
    }

    pub fn tally(&self, key: K) -> Tally {
        self.tallies[key.index()]
    }

    pub fn sum(&self, key: K) -> u64 {
        self.tally(key).sum
    }

    pub fn is_complete(&self, key: K) -> bool {
        self.tally(key).occurrences == self.games
    }

    pub fn all_complete(&self, keys: &[K]) -> bool {
        keys.iter().all(|&k| self.is_complete(k))
    }

    /// "LOU-MIL" for a player traded mid-window, teams in first-seen order.
    pub fn team_label(&self) -> String {
        self.teams.join("-")
    }

    /// Empty when never recorded, the sum marked `*` when incomplete.
    pub fn display(&self, key: K) -> String {
        let tally = self.tally(key);
        if tally.occurrences == 0 {
            String::new()
        } else if self.is_complete(key) {
            tally.sum.to_string()
        } else {
            format!("{}*", tally.sum)
        }
    }

    /// A counted-stat column with its occurrence count.
    fn column(&self, key: K) -> StatColumn {
        StatColumn {
            stat: key.label(),
            value: self.display(key),
            counted: Some(self.tally(key).occurrences),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RowKind {
    Batting,
    Pitching,
    Positions,
}

/// One output column. `counted` is the number of games that supplied the
/// stat; derived columns have none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatColumn {
    pub stat: &'static str,
    pub value: String,
    pub counted: Option<u32>,
}

impl StatColumn {
    fn derived(stat: &'static str, value: String) -> Self {
        StatColumn {
            stat,
            value,
            counted: None,
        }
    }
}

/// A player's season line, ready for output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeasonRow {
    pub kind: RowKind,
    pub player: String,
    pub name: String,
    pub team: String,
    pub games: u32,
    pub columns: Vec<StatColumn>,
}

#[cfg(test)]
impl SeasonRow {
    pub fn value(&self, stat: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|c| c.stat == stat)
            .map(|c| c.value.as_str())
    }
}

/// Split lines ordered by player into one contiguous slice per player.
pub fn player_slices<L, F>(lines: &[L], player: F) -> Vec<&[L]>
where
    F: Fn(&L) -> &str,
{
    let mut slices = Vec::new();
    let mut start = 0;
    for i in 1..=lines.len() {
        if i == lines.len() || player(&lines[i]) != player(&lines[start]) {
            slices.push(&lines[start..i]);
            start = i;
        }
    }
    slices
}
