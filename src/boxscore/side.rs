use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};

/// Road (0) or home (1) designation of a team within one game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Road,
    Home,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Road, Side::Home];

    /// Parse the wire side indicator.
    pub fn from_code(code: &str) -> Option<Side> {
        match code.trim() {
            "0" => Some(Side::Road),
            "1" => Some(Side::Home),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Side::Road => 0,
            Side::Home => 1,
        }
    }

    pub fn opponent(self) -> Side {
        match self {
            Side::Road => Side::Home,
            Side::Home => Side::Road,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Side::Road => "road",
            Side::Home => "home",
        }
    }

    fn from_label(s: &str) -> Option<Side> {
        match s {
            "road" => Some(Side::Road),
            "home" => Some(Side::Home),
            _ => None,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for Side {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Side {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let s = value.as_str()?;
        Side::from_label(s).ok_or_else(|| FromSqlError::Other(format!("bad side '{s}'").into()))
    }
}

/// One value per side, indexable by [`Side`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SideMap<T> {
    pub road: T,
    pub home: T,
}

impl<T> Index<Side> for SideMap<T> {
    type Output = T;

    fn index(&self, side: Side) -> &T {
        match side {
            Side::Road => &self.road,
            Side::Home => &self.home,
        }
    }
}

impl<T> IndexMut<Side> for SideMap<T> {
    fn index_mut(&mut self, side: Side) -> &mut T {
        match side {
            Side::Road => &mut self.road,
            Side::Home => &mut self.home,
        }
    }
}

/// The two team codes a side resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamPair {
    pub my_team: String,
    pub opponent: String,
}

/// Translates numeric side indicators into team codes for the active game.
///
/// Seeded by `info,visteam` / `info,hometeam`. After the first successful
/// resolution the table is locked: later team info cannot re-map a side that
/// lines have already been attributed to.
#[derive(Debug, Clone, Default)]
pub struct SideResolver {
    teams: SideMap<Option<String>>,
    locked: bool,
}

impl SideResolver {
    /// Returns `false` if the table is locked and the seed was ignored.
    pub fn seed(&mut self, side: Side, team: &str) -> bool {
        if self.locked && self.teams[side].as_deref() != Some(team) {
            return false;
        }
        self.teams[side] = Some(team.to_string());
        true
    }

    pub fn team(&self, side: Side) -> Option<&str> {
        self.teams[side].as_deref()
    }

    /// Resolve `side` to (my team, opponent). Both teams must be known.
    pub fn resolve(&mut self, side: Side) -> Option<TeamPair> {
        let my_team = self.teams[side].clone()?;
        let opponent = self.teams[side.opponent()].clone()?;
        self.locked = true;
        Some(TeamPair { my_team, opponent })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_codes() {
        assert_eq!(Side::from_code("0"), Some(Side::Road));
        assert_eq!(Side::from_code("1"), Some(Side::Home));
        assert_eq!(Side::from_code("2"), None);
        assert_eq!(Side::Home.opponent(), Side::Road);
    }

    #[test]
    fn test_resolver_needs_both_teams() {
        let mut resolver = SideResolver::default();
        assert!(resolver.seed(Side::Road, "LOU"));
        assert!(resolver.resolve(Side::Road).is_none());

        assert!(resolver.seed(Side::Home, "KC"));
        let pair = resolver.resolve(Side::Home).unwrap();
        assert_eq!(pair.my_team, "KC");
        assert_eq!(pair.opponent, "LOU");
    }

    #[test]
    fn test_resolver_locks_after_first_use() {
        let mut resolver = SideResolver::default();
        resolver.seed(Side::Road, "LOU");
        resolver.seed(Side::Home, "KC");
        resolver.resolve(Side::Road).unwrap();

        assert!(!resolver.seed(Side::Road, "MIL"));
        assert!(resolver.seed(Side::Road, "LOU"));
        assert_eq!(resolver.team(Side::Road), Some("LOU"));
    }
}
