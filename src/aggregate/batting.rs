use crate::aggregate::display::{format_ratio, ratio, rounded};
use crate::aggregate::{GameLine, Ledger, RowKind, SeasonRow, StatColumn, StatKey};
use crate::boxscore::stat::Stat;
use crate::db::models::BattingLine;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BattingStat {
    AtBats,
    Runs,
    Hits,
    Doubles,
    Triples,
    HomeRuns,
    Rbi,
    SacHits,
    SacFlies,
    HitByPitch,
    Walks,
    IntentionalWalks,
    Strikeouts,
    StolenBases,
    CaughtStealing,
    Gidp,
    Interference,
}

impl StatKey for BattingStat {
    const ALL: &'static [Self] = &[
        BattingStat::AtBats,
        BattingStat::Runs,
        BattingStat::Hits,
        BattingStat::Doubles,
        BattingStat::Triples,
        BattingStat::HomeRuns,
        BattingStat::Rbi,
        BattingStat::SacHits,
        BattingStat::SacFlies,
        BattingStat::HitByPitch,
        BattingStat::Walks,
        BattingStat::IntentionalWalks,
        BattingStat::Strikeouts,
        BattingStat::StolenBases,
        BattingStat::CaughtStealing,
        BattingStat::Gidp,
        BattingStat::Interference,
    ];

    fn index(self) -> usize {
        self as usize
    }

    fn label(self) -> &'static str {
        match self {
            BattingStat::AtBats => "AB",
            BattingStat::Runs => "R",
            BattingStat::Hits => "H",
            BattingStat::Doubles => "2B",
            BattingStat::Triples => "3B",
            BattingStat::HomeRuns => "HR",
            BattingStat::Rbi => "RBI",
            BattingStat::SacHits => "SH",
            BattingStat::SacFlies => "SF",
            BattingStat::HitByPitch => "HBP",
            BattingStat::Walks => "BB",
            BattingStat::IntentionalWalks => "IBB",
            BattingStat::Strikeouts => "SO",
            BattingStat::StolenBases => "SB",
            BattingStat::CaughtStealing => "CS",
            BattingStat::Gidp => "GDP",
            BattingStat::Interference => "INT",
        }
    }
}

impl GameLine for BattingLine {
    type Key = BattingStat;

    fn player(&self) -> &str {
        &self.player
    }

    fn team(&self) -> &str {
        &self.my_team
    }

    fn stat(&self, key: BattingStat) -> Stat {
        let s = &self.stats;
        match key {
            BattingStat::AtBats => s.at_bats,
            BattingStat::Runs => s.runs,
            BattingStat::Hits => s.hits,
            BattingStat::Doubles => s.doubles,
            BattingStat::Triples => s.triples,
            BattingStat::HomeRuns => s.home_runs,
            BattingStat::Rbi => s.rbi,
            BattingStat::SacHits => s.sac_hits,
            BattingStat::SacFlies => s.sac_flies,
            BattingStat::HitByPitch => s.hit_by_pitch,
            BattingStat::Walks => s.walks,
            BattingStat::IntentionalWalks => s.intentional_walks,
            BattingStat::Strikeouts => s.strikeouts,
            BattingStat::StolenBases => s.stolen_bases,
            BattingStat::CaughtStealing => s.caught_stealing,
            BattingStat::Gidp => s.gidp,
            BattingStat::Interference => s.interference,
        }
    }
}

/// Ratio stats over a batting ledger. `None` when an input is incomplete.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BattingRates {
    pub average: Option<f64>,
    pub on_base: Option<f64>,
    pub slugging: Option<f64>,
    pub ops: Option<f64>,
    pub total_bases: Option<u64>,
}

impl BattingRates {
    pub fn from_ledger(ledger: &Ledger<BattingStat>) -> Self {
        use BattingStat::*;
        let sum = |k| ledger.sum(k) as f64;

        let average = ledger
            .all_complete(&[Hits, AtBats])
            .then(|| ratio(sum(Hits), sum(AtBats)));

        let total_bases = ledger
            .all_complete(&[Hits, Doubles, Triples, HomeRuns])
            .then(|| {
                ledger.sum(Hits) + ledger.sum(Doubles) + 2 * ledger.sum(Triples) + 3 * ledger.sum(HomeRuns)
            });

        let slugging = total_bases
            .filter(|_| ledger.is_complete(AtBats))
            .map(|tb| ratio(tb as f64, sum(AtBats)));

        // Sacrifice flies were not always scored; an incomplete count is
        // treated as none rather than blocking the rate.
        let on_base = ledger
            .all_complete(&[AtBats, Hits, Walks, HitByPitch])
            .then(|| {
                let sac_flies = if ledger.is_complete(SacFlies) {
                    sum(SacFlies)
                } else {
                    0.0
                };
                let reached = sum(Hits) + sum(Walks) + sum(HitByPitch);
                ratio(reached, sum(AtBats) + reached + sac_flies)
            });

        // OPS adds the two rates as displayed, not their exact values.
        let ops = slugging
            .zip(on_base)
            .map(|(slg, obp)| rounded(slg, 3) + rounded(obp, 3));

        BattingRates {
            average,
            on_base,
            slugging,
            ops,
            total_bases,
        }
    }
}

/// Build one output row for a player's lines.
pub fn season_row(player: &str, name: &str, lines: &[BattingLine]) -> SeasonRow {
    use BattingStat::*;
    let ledger = Ledger::from_lines(lines);
    let rates = BattingRates::from_ledger(&ledger);
    let pct = |v: Option<f64>| v.map(|v| format_ratio(v, 3, true)).unwrap_or_default();

    let mut columns: Vec<StatColumn> = [
        AtBats, Runs, Hits, Doubles, Triples, HomeRuns, Rbi, StolenBases, CaughtStealing, Walks,
        Strikeouts,
    ]
    .into_iter()
    .map(|k| ledger.column(k))
    .collect();
    columns.extend([
        StatColumn::derived("BA", pct(rates.average)),
        StatColumn::derived("OBP", pct(rates.on_base)),
        StatColumn::derived("SLG", pct(rates.slugging)),
        StatColumn::derived("OPS", pct(rates.ops)),
        StatColumn::derived(
            "TB",
            rates.total_bases.map(|tb| tb.to_string()).unwrap_or_default(),
        ),
    ]);
    columns.extend(
        [Gidp, HitByPitch, SacHits, SacFlies, IntentionalWalks, Interference]
            .into_iter()
            .map(|k| ledger.column(k)),
    );

    SeasonRow {
        kind: RowKind::Batting,
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
    use crate::db::models::BattingStats;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn game(stats: BattingStats) -> BattingLine {
        BattingLine {
            player: "beanb101".into(),
            date: NaiveDate::from_ymd_opt(1938, 5, 1).unwrap(),
            game_number: 0,
            side: Side::Home,
            my_team: "KC".into(),
            opponent: "LOU".into(),
            lineup: 3,
            sequence: 0,
            stats,
        }
    }

    fn zeros() -> BattingStats {
        BattingStats::from_values([Stat::ZERO; BattingStats::FIELDS])
    }

    #[test]
    fn test_average_needs_complete_hits() {
        let lines = [
            game(BattingStats {
                hits: Stat::Known(2),
                at_bats: Stat::Known(4),
                ..zeros()
            }),
            game(BattingStats {
                hits: Stat::Missing,
                at_bats: Stat::Known(4),
                ..zeros()
            }),
        ];
        let row = season_row("beanb101", "Bean Ball", &lines);
        assert_eq!(row.value("H"), Some("2*"));
        assert_eq!(row.value("AB"), Some("8"));
        assert_eq!(row.value("BA"), Some(""));
        assert_eq!(row.value("OPS"), Some(""));
    }

    #[test]
    fn test_rates_over_complete_window() {
        let lines = [
            game(BattingStats {
                at_bats: Stat::Known(4),
                hits: Stat::Known(2),
                doubles: Stat::Known(1),
                walks: Stat::Known(1),
                ..zeros()
            }),
            game(BattingStats {
                at_bats: Stat::Known(4),
                hits: Stat::Known(1),
                home_runs: Stat::Known(1),
                sac_flies: Stat::Known(1),
                ..zeros()
            }),
        ];
        let ledger = Ledger::from_lines(&lines);
        let rates = BattingRates::from_ledger(&ledger);

        assert_relative_eq!(rates.average.unwrap(), 3.0 / 8.0);
        // 3 H + 1 2B + 3 * 1 HR
        assert_eq!(rates.total_bases, Some(7));
        assert_relative_eq!(rates.slugging.unwrap(), 7.0 / 8.0);
        // (H + BB + HBP) / (AB + H + BB + HBP + SF)
        assert_relative_eq!(rates.on_base.unwrap(), 4.0 / 13.0);
        assert_relative_eq!(rates.ops.unwrap(), 0.875 + 0.308);

        let row = season_row("beanb101", "Bean Ball", &lines);
        assert_eq!(row.value("BA"), Some(".375"));
        assert_eq!(row.value("TB"), Some("7"));
        assert_eq!(row.games, 2);
        assert_eq!(row.team, "KC");
    }

    #[test]
    fn test_incomplete_sac_flies_count_as_none() {
        let lines = [
            game(BattingStats {
                at_bats: Stat::Known(3),
                hits: Stat::Known(1),
                sac_flies: Stat::Known(1),
                ..zeros()
            }),
            game(BattingStats {
                at_bats: Stat::Known(3),
                hits: Stat::Known(1),
                sac_flies: Stat::Missing,
                ..zeros()
            }),
        ];
        let rates = BattingRates::from_ledger(&Ledger::from_lines(&lines));
        assert_relative_eq!(rates.on_base.unwrap(), 2.0 / 8.0);
    }

    #[test]
    fn test_ops_adds_displayed_rates() {
        // SLG .3333 and OBP .5714 display as .333 and .571
        let lines = [game(BattingStats {
            at_bats: Stat::Known(3),
            hits: Stat::Known(1),
            walks: Stat::Known(3),
            ..zeros()
        })];
        let row = season_row("beanb101", "Bean Ball", &lines);
        assert_eq!(row.value("SLG"), Some(".333"));
        assert_eq!(row.value("OBP"), Some(".571"));
        assert_eq!(row.value("OPS"), Some(".904"));
    }

    #[test]
    fn test_zero_at_bats_is_zero_average() {
        let rates = BattingRates::from_ledger(&Ledger::from_lines(&[game(zeros())]));
        assert_eq!(rates.average, Some(0.0));
        assert_eq!(rates.slugging, Some(0.0));
    }

    #[test]
    fn test_caught_stealing_reads_its_own_field() {
        let lines = [game(BattingStats {
            stolen_bases: Stat::Known(3),
            caught_stealing: Stat::Known(1),
            ..zeros()
        })];
        let row = season_row("beanb101", "Bean Ball", &lines);
        assert_eq!(row.value("SB"), Some("3"));
        assert_eq!(row.value("CS"), Some("1"));
    }

    #[test]
    fn test_counters_ride_along() {
        let lines = [
            game(zeros()),
            game(BattingStats {
                walks: Stat::Missing,
                ..zeros()
            }),
        ];
        let row = season_row("beanb101", "Bean Ball", &lines);
        let walks = row.columns.iter().find(|c| c.stat == "BB").unwrap();
        assert_eq!(walks.value, "0*");
        assert_eq!(walks.counted, Some(1));
        let ba = row.columns.iter().find(|c| c.stat == "BA").unwrap();
        assert_eq!(ba.counted, None);
    }
}
