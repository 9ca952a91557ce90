use rusqlite::types::{FromSql, FromSqlResult, ToSql, ToSqlOutput, Value, ValueRef};
use std::fmt;
use std::iter::Sum;
use std::ops::Add;

/// Wire literal for a statistic that was not recorded.
pub const MISSING_LITERAL: &str = "-1";

/// A counting statistic for one game: either a known non-negative count or
/// not recorded at all. `Missing` is never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Stat {
    Known(u32),
    #[default]
    Missing,
}

/// A numeric field that held characters outside `[0-9-]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutsideAlphabet;

impl Stat {
    pub const ZERO: Stat = Stat::Known(0);

    /// Parse a wire field. Empty, negative or otherwise unparseable literals
    /// made only of digits and `-` are `Missing`; anything else is rejected.
    pub fn from_wire(field: &str) -> Result<Stat, OutsideAlphabet> {
        let field = field.trim();
        if !field.chars().all(|c| c.is_ascii_digit() || c == '-') {
            return Err(OutsideAlphabet);
        }
        Ok(field
            .parse::<i64>()
            .ok()
            .and_then(|n| u32::try_from(n).ok())
            .map_or(Stat::Missing, Stat::Known))
    }

    pub fn to_wire(self) -> String {
        match self {
            Stat::Known(n) => n.to_string(),
            Stat::Missing => MISSING_LITERAL.to_string(),
        }
    }

    pub fn known(self) -> Option<u32> {
        match self {
            Stat::Known(n) => Some(n),
            Stat::Missing => None,
        }
    }

    /// Zero for `Missing`. Only for checks that explicitly tolerate gaps.
    pub fn or_zero(self) -> u32 {
        self.known().unwrap_or(0)
    }
}

/// Strict addition: one unknown contributor makes the total unknown. A
/// total too large for a count is unknown as well.
impl Add for Stat {
    type Output = Stat;

    fn add(self, rhs: Stat) -> Stat {
        match (self, rhs) {
            (Stat::Known(a), Stat::Known(b)) => a.checked_add(b).map_or(Stat::Missing, Stat::Known),
            _ => Stat::Missing,
        }
    }
}

impl Sum for Stat {
    fn sum<I: Iterator<Item = Stat>>(iter: I) -> Stat {
        iter.fold(Stat::ZERO, Add::add)
    }
}

impl From<u32> for Stat {
    fn from(n: u32) -> Self {
        Stat::Known(n)
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stat::Known(n) => write!(f, "{n}"),
            Stat::Missing => f.write_str("?"),
        }
    }
}

// Missing is stored as NULL.
impl ToSql for Stat {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Stat::Known(n) => ToSqlOutput::Owned(Value::Integer(i64::from(*n))),
            Stat::Missing => ToSqlOutput::Owned(Value::Null),
        })
    }
}

impl FromSql for Stat {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let n = <Option<i64> as FromSql>::column_result(value)?;
        Ok(n.and_then(|n| u32::try_from(n).ok())
            .map_or(Stat::Missing, Stat::Known))
    }
}
