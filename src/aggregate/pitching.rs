use crate::aggregate::display::{format_ratio, innings_display, innings_pitched, ratio};
use crate::aggregate::{GameLine, Ledger, RowKind, SeasonRow, StatColumn, StatKey};
use crate::boxscore::stat::Stat;
use crate::db::models::PitchingLine;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PitchingStat {
    Outs,
    BattersFaced,
    Hits,
    HomeRuns,
    Runs,
    EarnedRuns,
    Walks,
    IntentionalWalks,
    Strikeouts,
    HitBatsmen,
    Balks,
    WildPitches,
}

impl StatKey for PitchingStat {
    const ALL: &'static [Self] = &[
        PitchingStat::Outs,
        PitchingStat::BattersFaced,
        PitchingStat::Hits,
        PitchingStat::HomeRuns,
        PitchingStat::Runs,
        PitchingStat::EarnedRuns,
        PitchingStat::Walks,
        PitchingStat::IntentionalWalks,
        PitchingStat::Strikeouts,
        PitchingStat::HitBatsmen,
        PitchingStat::Balks,
        PitchingStat::WildPitches,
    ];

    fn index(self) -> usize {
        self as usize
    }

    fn label(self) -> &'static str {
        match self {
            PitchingStat::Outs => "IP",
            PitchingStat::BattersFaced => "BFP",
            PitchingStat::Hits => "H",
            PitchingStat::HomeRuns => "HR",
            PitchingStat::Runs => "R",
            PitchingStat::EarnedRuns => "ER",
            PitchingStat::Walks => "BB",
            PitchingStat::IntentionalWalks => "IBB",
            PitchingStat::Strikeouts => "SO",
            PitchingStat::HitBatsmen => "HBP",
            PitchingStat::Balks => "BK",
            PitchingStat::WildPitches => "WP",
        }
    }
}

impl GameLine for PitchingLine {
    type Key = PitchingStat;

    fn player(&self) -> &str {
        &self.player
    }

    fn team(&self) -> &str {
        &self.my_team
    }

    fn stat(&self, key: PitchingStat) -> Stat {
        let s = &self.stats;
        match key {
            PitchingStat::Outs => s.outs,
            PitchingStat::BattersFaced => s.batters_faced,
            PitchingStat::Hits => s.hits,
            PitchingStat::HomeRuns => s.home_runs,
            PitchingStat::Runs => s.runs,
            PitchingStat::EarnedRuns => s.earned_runs,
            PitchingStat::Walks => s.walks,
            PitchingStat::IntentionalWalks => s.intentional_walks,
            PitchingStat::Strikeouts => s.strikeouts,
            PitchingStat::HitBatsmen => s.hit_batsmen,
            PitchingStat::Balks => s.balks,
            PitchingStat::WildPitches => s.wild_pitches,
        }
    }
}

/// Pitching ledger plus the decision counts, which come from flags and so
/// are always known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PitchingSeason {
    pub ledger: Ledger<PitchingStat>,
    pub wins: u32,
    pub losses: u32,
    pub starts: u32,
}

impl PitchingSeason {
    pub fn from_lines(lines: &[PitchingLine]) -> Self {
        PitchingSeason {
            ledger: Ledger::from_lines(lines),
            wins: lines.iter().filter(|p| p.winner).count() as u32,
            losses: lines.iter().filter(|p| p.loser).count() as u32,
            starts: lines.iter().filter(|p| p.starter).count() as u32,
        }
    }

    pub fn win_pct(&self) -> f64 {
        ratio(f64::from(self.wins), f64::from(self.wins + self.losses))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PitchingRates {
    pub era: Option<f64>,
    pub whip: Option<f64>,
    pub hits_per_nine: Option<f64>,
    pub home_runs_per_nine: Option<f64>,
    pub walks_per_nine: Option<f64>,
    pub strikeouts_per_nine: Option<f64>,
    pub strikeouts_per_walk: Option<f64>,
}

impl PitchingRates {
    /// Every rate divides by innings pitched, so all of them need complete
    /// outs besides their own inputs.
    pub fn from_ledger(ledger: &Ledger<PitchingStat>) -> Self {
        use PitchingStat::*;
        let ip = innings_pitched(ledger.sum(Outs));
        let sum = |k| ledger.sum(k) as f64;
        let per_nine = |k| {
            ledger
                .all_complete(&[Outs, k])
                .then(|| ratio(9.0 * sum(k), ip))
        };

        PitchingRates {
            era: per_nine(EarnedRuns),
            whip: ledger
                .all_complete(&[Outs, Walks, Hits])
                .then(|| ratio(sum(Walks) + sum(Hits), ip)),
            hits_per_nine: per_nine(Hits),
            home_runs_per_nine: per_nine(HomeRuns),
            walks_per_nine: per_nine(Walks),
            strikeouts_per_nine: per_nine(Strikeouts),
            strikeouts_per_walk: ledger
                .all_complete(&[Strikeouts, Walks])
                .then(|| ratio(sum(Strikeouts), sum(Walks))),
        }
    }
}

pub fn season_row(player: &str, name: &str, lines: &[PitchingLine]) -> SeasonRow {
    use PitchingStat::*;
    let season = PitchingSeason::from_lines(lines);
    let ledger = &season.ledger;
    let rates = PitchingRates::from_ledger(ledger);
    let fixed = |v: Option<f64>, places| v.map(|v| format_ratio(v, places, false)).unwrap_or_default();

    let outs = ledger.tally(Outs);
    let mut ip = if outs.occurrences == 0 {
        String::new()
    } else {
        innings_display(outs.sum)
    };
    if outs.occurrences > 0 && !ledger.is_complete(Outs) {
        ip.push('*');
    }

    let mut columns = vec![
        StatColumn::derived("W", season.wins.to_string()),
        StatColumn::derived("L", season.losses.to_string()),
        StatColumn::derived("W-L%", format_ratio(season.win_pct(), 3, true)),
        StatColumn::derived("ERA", fixed(rates.era, 3)),
        StatColumn::derived("G", ledger.games().to_string()),
        StatColumn::derived("GS", season.starts.to_string()),
        StatColumn {
            stat: Outs.label(),
            value: ip,
            counted: Some(outs.occurrences),
        },
    ];
    columns.extend(
        [
            Hits,
            Runs,
            EarnedRuns,
            HomeRuns,
            Walks,
            IntentionalWalks,
            Strikeouts,
            HitBatsmen,
            Balks,
            WildPitches,
            BattersFaced,
        ]
        .into_iter()
        .map(|k| ledger.column(k)),
    );
    columns.extend([
        StatColumn::derived("WHIP", fixed(rates.whip, 3)),
        StatColumn::derived("H9", fixed(rates.hits_per_nine, 1)),
        StatColumn::derived("HR9", fixed(rates.home_runs_per_nine, 1)),
        StatColumn::derived("BB9", fixed(rates.walks_per_nine, 1)),
        StatColumn::derived("SO9", fixed(rates.strikeouts_per_nine, 1)),
        StatColumn::derived("SO/W", fixed(rates.strikeouts_per_walk, 1)),
    ]);

    SeasonRow {
        kind: RowKind::Pitching,
        player: player.to_string(),
        name: name.to_string(),
        team: ledger.team_label(),
        games: ledger.games(),
        columns,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boxscore::side::Side;
    use crate::db::models::PitchingStats;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn outing(outs: u32, earned_runs: Stat, winner: bool) -> PitchingLine {
        PitchingLine {
            player: "smitj101".into(),
            date: NaiveDate::from_ymd_opt(1938, 6, 2).unwrap(),
            game_number: 0,
            side: Side::Road,
            my_team: "LOU".into(),
            opponent: "KC".into(),
            sequence: 0,
            starter: true,
            winner,
            loser: !winner,
            stats: PitchingStats {
                outs: Stat::Known(outs),
                earned_runs,
                hits: Stat::Known(6),
                walks: Stat::Known(2),
                strikeouts: Stat::Known(4),
                home_runs: Stat::Known(1),
                ..PitchingStats::from_values([Stat::ZERO; PitchingStats::FIELDS])
            },
        }
    }

    #[test]
    fn test_rates_over_complete_window() {
        let lines = [outing(27, Stat::Known(2), true), outing(24, Stat::Known(4), false)];
        let season = PitchingSeason::from_lines(&lines);
        let rates = PitchingRates::from_ledger(&season.ledger);

        // 51 outs = 17 innings
        assert_relative_eq!(rates.era.unwrap(), 9.0 * 6.0 / 17.0);
        assert_relative_eq!(rates.whip.unwrap(), 16.0 / 17.0);
        assert_relative_eq!(rates.strikeouts_per_nine.unwrap(), 9.0 * 8.0 / 17.0);
        assert_relative_eq!(rates.strikeouts_per_walk.unwrap(), 2.0);
        assert_relative_eq!(season.win_pct(), 0.5);
        assert_eq!(season.starts, 2);
    }

    #[test]
    fn test_incomplete_earned_runs_blank_era() {
        let lines = [outing(19, Stat::Known(2), true), outing(9, Stat::Missing, true)];
        let row = season_row("smitj101", "John Smith", &lines);
        assert_eq!(row.value("ER"), Some("2*"));
        assert_eq!(row.value("ERA"), Some(""));
        assert_eq!(row.value("IP"), Some("9.1"));
        assert_eq!(row.value("W"), Some("2"));
        assert_eq!(row.value("W-L%"), Some("1.000"));
        assert_eq!(row.value("WHIP"), Some("1.714"));
    }

    #[test]
    fn test_display_places() {
        let row = season_row("smitj101", "John Smith", &[outing(19, Stat::Known(3), false)]);
        assert_eq!(row.value("IP"), Some("6.1"));
        // 27 / (19 / 3)
        assert_eq!(row.value("ERA"), Some("4.263"));
        assert_eq!(row.value("H9"), Some("8.5"));
        assert_eq!(row.value("W-L%"), Some(".000"));
    }

    #[test]
    fn test_no_decisions_win_pct_zero() {
        let mut line = outing(3, Stat::ZERO, false);
        line.loser = false;
        let season = PitchingSeason::from_lines(&[line]);
        assert_eq!(season.win_pct(), 0.0);
    }

    #[test]
    fn test_zero_innings_rates_are_zero() {
        let season = PitchingSeason::from_lines(&[outing(0, Stat::Known(3), false)]);
        let rates = PitchingRates::from_ledger(&season.ledger);
        assert_eq!(rates.era, Some(0.0));
    }
}
