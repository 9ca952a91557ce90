use chrono::NaiveDate;
use serde::Serialize;

use crate::boxscore::side::Side;
use crate::boxscore::stat::Stat;

/// Game-level metadata for one box score.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameContext {
    pub road_team: String,
    pub home_team: String,
    pub date: Option<NaiveDate>,
    /// 0 for a single game, 1 or 2 for the legs of a doubleheader.
    pub game_number: u8,
    pub winning_pitcher: Option<String>,
    pub losing_pitcher: Option<String>,
    pub start_time: Option<String>,
    pub day_night: DayNight,
    pub attendance: Stat,
    /// Minutes.
    pub time_of_game: Stat,
    pub use_dh: bool,
    /// Comment lines joined with `;`.
    pub comment: String,
    /// Linescore totals, filled in when the game is sealed.
    pub road_runs: Stat,
    pub home_runs: Stat,
    pub innings: u32,
}

impl GameContext {
    pub fn team(&self, side: Side) -> &str {
        match side {
            Side::Road => &self.road_team,
            Side::Home => &self.home_team,
        }
    }

    /// "LOU at KC, 1938/04/19 (0)"
    pub fn label(&self) -> String {
        let date = self
            .date
            .map(|d| d.format("%Y/%m/%d").to_string())
            .unwrap_or_else(|| "????/??/??".to_string());
        format!(
            "{} at {}, {} ({})",
            or_unknown(&self.road_team),
            or_unknown(&self.home_team),
            date,
            self.game_number
        )
    }
}

fn or_unknown(team: &str) -> &str {
    if team.is_empty() {
        "???"
    } else {
        team
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum DayNight {
    #[serde(rename = "D")]
    Day,
    #[serde(rename = "N")]
    Night,
    #[default]
    #[serde(rename = "U")]
    Unknown,
}

impl DayNight {
    pub fn from_info(value: &str) -> Self {
        match value {
            "day" => DayNight::Day,
            "night" => DayNight::Night,
            _ => DayNight::Unknown,
        }
    }

    /// Inverse of [`DayNight::from_info`].
    pub fn info_value(self) -> &'static str {
        match self {
            DayNight::Day => "day",
            DayNight::Night => "night",
            DayNight::Unknown => "unknown",
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            DayNight::Day => "D",
            DayNight::Night => "N",
            DayNight::Unknown => "U",
        }
    }

    /// Inverse of [`DayNight::code`], as stored.
    pub fn from_code(code: &str) -> Self {
        match code {
            "D" => DayNight::Day,
            "N" => DayNight::Night,
            _ => DayNight::Unknown,
        }
    }
}

/// `ab,r,h,2b,3b,hr,rbi,sh,sf,hbp,bb,ibb,k,sb,cs,gidp,int`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BattingStats {
    pub at_bats: Stat,
    pub runs: Stat,
    pub hits: Stat,
    pub doubles: Stat,
    pub triples: Stat,
    pub home_runs: Stat,
    pub rbi: Stat,
    pub sac_hits: Stat,
    pub sac_flies: Stat,
    pub hit_by_pitch: Stat,
    pub walks: Stat,
    pub intentional_walks: Stat,
    pub strikeouts: Stat,
    pub stolen_bases: Stat,
    pub caught_stealing: Stat,
    pub gidp: Stat,
    pub interference: Stat,
}

impl BattingStats {
    pub const FIELDS: usize = 17;

    pub fn from_values(v: [Stat; Self::FIELDS]) -> Self {
        BattingStats {
            at_bats: v[0],
            runs: v[1],
            hits: v[2],
            doubles: v[3],
            triples: v[4],
            home_runs: v[5],
            rbi: v[6],
            sac_hits: v[7],
            sac_flies: v[8],
            hit_by_pitch: v[9],
            walks: v[10],
            intentional_walks: v[11],
            strikeouts: v[12],
            stolen_bases: v[13],
            caught_stealing: v[14],
            gidp: v[15],
            interference: v[16],
        }
    }

    pub fn values(&self) -> [Stat; Self::FIELDS] {
        [
            self.at_bats,
            self.runs,
            self.hits,
            self.doubles,
            self.triples,
            self.home_runs,
            self.rbi,
            self.sac_hits,
            self.sac_flies,
            self.hit_by_pitch,
            self.walks,
            self.intentional_walks,
            self.strikeouts,
            self.stolen_bases,
            self.caught_stealing,
            self.gidp,
            self.interference,
        ]
    }
}

/// `ip*3,no-out,bfp,h,2b,3b,hr,r,er,bb,ibb,k,hbp,wp,balk,sh,sf`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PitchingStats {
    pub outs: Stat,
    pub no_out_batters: Stat,
    pub batters_faced: Stat,
    pub hits: Stat,
    pub doubles: Stat,
    pub triples: Stat,
    pub home_runs: Stat,
    pub runs: Stat,
    pub earned_runs: Stat,
    pub walks: Stat,
    pub intentional_walks: Stat,
    pub strikeouts: Stat,
    pub hit_batsmen: Stat,
    pub wild_pitches: Stat,
    pub balks: Stat,
    pub sac_hits: Stat,
    pub sac_flies: Stat,
}

impl PitchingStats {
    pub const FIELDS: usize = 17;

    pub fn from_values(v: [Stat; Self::FIELDS]) -> Self {
        PitchingStats {
            outs: v[0],
            no_out_batters: v[1],
            batters_faced: v[2],
            hits: v[3],
            doubles: v[4],
            triples: v[5],
            home_runs: v[6],
            runs: v[7],
            earned_runs: v[8],
            walks: v[9],
            intentional_walks: v[10],
            strikeouts: v[11],
            hit_batsmen: v[12],
            wild_pitches: v[13],
            balks: v[14],
            sac_hits: v[15],
            sac_flies: v[16],
        }
    }

    pub fn values(&self) -> [Stat; Self::FIELDS] {
        [
            self.outs,
            self.no_out_batters,
            self.batters_faced,
            self.hits,
            self.doubles,
            self.triples,
            self.home_runs,
            self.runs,
            self.earned_runs,
            self.walks,
            self.intentional_walks,
            self.strikeouts,
            self.hit_batsmen,
            self.wild_pitches,
            self.balks,
            self.sac_hits,
            self.sac_flies,
        ]
    }
}

/// `if*3,po,a,e,dp,tp,pb`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldingStats {
    pub outs_played: Stat,
    pub putouts: Stat,
    pub assists: Stat,
    pub errors: Stat,
    pub double_plays: Stat,
    pub triple_plays: Stat,
    pub passed_balls: Stat,
}

impl FieldingStats {
    pub const FIELDS: usize = 7;

    pub fn from_values(v: [Stat; Self::FIELDS]) -> Self {
        FieldingStats {
            outs_played: v[0],
            putouts: v[1],
            assists: v[2],
            errors: v[3],
            double_plays: v[4],
            triple_plays: v[5],
            passed_balls: v[6],
        }
    }

    pub fn values(&self) -> [Stat; Self::FIELDS] {
        [
            self.outs_played,
            self.putouts,
            self.assists,
            self.errors,
            self.double_plays,
            self.triple_plays,
            self.passed_balls,
        ]
    }
}

/// One player's batting line for one game.
#[derive(Debug, Clone, PartialEq)]
pub struct BattingLine {
    pub player: String,
    pub date: NaiveDate,
    pub game_number: u8,
    pub side: Side,
    pub my_team: String,
    pub opponent: String,
    /// Spot in the batting order, 1-9.
    pub lineup: u8,
    /// 0 for the starter in that spot, then 1, 2, ... for replacements.
    pub sequence: u8,
    pub stats: BattingStats,
}

impl BattingLine {
    /// `lineup * 100 + sequence`, e.g. 301 for the first sub in the third spot.
    pub fn order_number(&self) -> u32 {
        u32::from(self.lineup) * 100 + u32::from(self.sequence)
    }
}

/// One player's pitching line for one game.
#[derive(Debug, Clone, PartialEq)]
pub struct PitchingLine {
    pub player: String,
    pub date: NaiveDate,
    pub game_number: u8,
    pub side: Side,
    pub my_team: String,
    pub opponent: String,
    pub sequence: u8,
    pub starter: bool,
    pub winner: bool,
    pub loser: bool,
    pub stats: PitchingStats,
}

/// Positions a player appeared at in one game, as persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct DefensiveAppearance {
    pub player: String,
    pub date: NaiveDate,
    pub game_number: u8,
    pub side: Side,
    pub my_team: String,
    pub opponent: String,
    /// e.g. "ph-3b-ss"
    pub position_list: String,
    /// Counting stats of the first fielding fragment; all missing for a
    /// player who only pinch-hit or pinch-ran.
    pub stats: FieldingStats,
}

/// Which of a team's games a query covers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Location {
    #[default]
    All,
    Home,
    Road,
}

impl Location {
    pub fn side(self) -> Option<Side> {
        match self {
            Location::All => None,
            Location::Home => Some(Side::Home),
            Location::Road => Some(Side::Road),
        }
    }
}

/// Restricts which persisted lines a query returns. Dates are inclusive.
///
/// For games, `team` matches either club and `opponent`/`location` are read
/// relative to it; without a team they are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineFilter {
    pub player: Option<String>,
    pub team: Option<String>,
    pub opponent: Option<String>,
    pub location: Location,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}
