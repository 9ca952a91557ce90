//! A sealed box score: the game context plus every collection the
//! accumulator routed records into.

use chrono::NaiveDate;

use crate::boxscore::positions::{position_string, EntryRole};
use crate::boxscore::record::{
    BattingRecord, DefenseRecord, FieldingPlayRecord, HitByPitchRecord, PinchRecord,
    PitchingRecord, Record, TeamMiscRecord, TeamStatRecord,
};
use crate::boxscore::side::{Side, SideMap};
use crate::boxscore::stat::Stat;
use crate::db::models::{
    BattingLine, DefensiveAppearance, FieldingStats, GameContext, PitchingLine,
};

/// Per-inning runs for one side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineScore {
    pub innings: Vec<Stat>,
}

impl LineScore {
    /// Strict sum: one unrecorded inning makes the total unknown.
    pub fn total(&self) -> Stat {
        self.innings.iter().copied().sum()
    }

    pub fn inning_count(&self) -> u32 {
        self.innings.len() as u32
    }
}

/// Totals as printed in the source, not derived from player lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TeamGameTotals {
    pub at_bats: Stat,
    pub runs: Stat,
    pub hits: Stat,
    pub rbi: Stat,
    pub walks: Stat,
    pub strikeouts: Stat,
    pub putouts: Stat,
    pub assists: Stat,
    pub errors: Stat,
    pub left_on_base: Stat,
    pub earned_runs: Stat,
    pub double_plays: Stat,
    pub triple_plays: Stat,
    /// Whether a `teamstat` record was seen for this side.
    pub reported: bool,
}

impl TeamGameTotals {
    pub(crate) fn apply_team_stat(&mut self, t: &TeamStatRecord) {
        self.at_bats = t.at_bats;
        self.runs = t.runs;
        self.hits = t.hits;
        self.putouts = t.putouts;
        self.assists = t.assists;
        self.errors = t.errors;
        self.rbi = t.rbi;
        self.walks = t.walks;
        self.strikeouts = t.strikeouts;
        self.reported = true;
    }

    pub(crate) fn apply_misc(&mut self, t: &TeamMiscRecord) {
        self.left_on_base = t.left_on_base;
        self.earned_runs = t.earned_runs;
        self.double_plays = t.double_plays;
        self.triple_plays = t.triple_plays;
    }
}

/// A player's fielding for one game. `stats` come from the first `dline`
/// fragment only; later fragments add positions and nothing else. The
/// source format repeats or zeroes the counts on later fragments, so they
/// are not trustworthy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefensiveLine {
    pub player: String,
    pub side: Side,
    /// Position codes in the order played. May hold codes outside 1-12.
    pub positions: Vec<u8>,
    pub stats: FieldingStats,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinchAppearance {
    pub player: String,
    pub inning: Stat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventRecord {
    /// Fielders on `side` who turned a double play.
    DoublePlay { side: Side, fielders: Vec<String> },
    TriplePlay { side: Side, fielders: Vec<String> },
    /// `pitcher_side` is the fielding team; the batter belongs to the other.
    HitByPitch {
        pitcher_side: Side,
        pitcher: Option<String>,
        batter: String,
    },
}

/// A non-fatal anomaly noticed while ingesting, reported later as a
/// warning diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestNote {
    pub line: usize,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Game {
    pub context: GameContext,
    pub batting: Vec<BattingLine>,
    pub pitching: Vec<PitchingLine>,
    pub defense: Vec<DefensiveLine>,
    pub pinch_hitters: SideMap<Vec<PinchAppearance>>,
    pub pinch_runners: SideMap<Vec<PinchAppearance>>,
    pub line_scores: SideMap<Option<LineScore>>,
    pub totals: SideMap<TeamGameTotals>,
    pub events: Vec<EventRecord>,
    pub notes: Vec<IngestNote>,
}

impl Game {
    pub fn date(&self) -> Option<NaiveDate> {
        self.context.date
    }

    pub fn batting_for(&self, side: Side) -> impl Iterator<Item = &BattingLine> {
        self.batting.iter().filter(move |b| b.side == side)
    }

    pub fn pitching_for(&self, side: Side) -> impl Iterator<Item = &PitchingLine> {
        self.pitching.iter().filter(move |p| p.side == side)
    }

    pub fn defense_for(&self, side: Side) -> impl Iterator<Item = &DefensiveLine> {
        self.defense.iter().filter(move |d| d.side == side)
    }

    /// Hit batsmen grouped by the batter's team: the record names the
    /// pitcher's side, so the batter sits on the opposite one.
    pub fn hit_batsmen(&self, batter_side: Side) -> Vec<(&str, Option<&str>)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                EventRecord::HitByPitch {
                    pitcher_side,
                    pitcher,
                    batter,
                } if pitcher_side.opponent() == batter_side => {
                    Some((batter.as_str(), pitcher.as_deref()))
                }
                _ => None,
            })
            .collect()
    }

    fn entry_role(&self, side: Side, player: &str) -> Option<EntryRole> {
        if self.pinch_hitters[side].iter().any(|p| p.player == player) {
            Some(EntryRole::PinchHitter)
        } else if self.pinch_runners[side].iter().any(|p| p.player == player) {
            Some(EntryRole::PinchRunner)
        } else {
            None
        }
    }

    /// One persisted appearance per player per side: every fielder, then
    /// any pinch hitter or runner who never took the field.
    pub fn appearances(&self) -> Vec<DefensiveAppearance> {
        let Some(date) = self.context.date else {
            return Vec::new();
        };
        let row = |player: &str, side: Side, position_list: String, stats: FieldingStats| {
            DefensiveAppearance {
                player: player.to_string(),
                date,
                game_number: self.context.game_number,
                side,
                my_team: self.context.team(side).to_string(),
                opponent: self.context.team(side.opponent()).to_string(),
                position_list,
                stats,
            }
        };

        let mut out: Vec<DefensiveAppearance> = self
            .defense
            .iter()
            .map(|d| {
                let entry = self.entry_role(d.side, &d.player);
                row(&d.player, d.side, position_string(entry, &d.positions), d.stats)
            })
            .collect();

        for side in Side::BOTH {
            let pinch = self.pinch_hitters[side]
                .iter()
                .chain(self.pinch_runners[side].iter());
            for p in pinch {
                let listed = out
                    .iter()
                    .any(|a| a.side == side && a.player == p.player);
                if !listed {
                    let entry = self.entry_role(side, &p.player);
                    out.push(row(
                        &p.player,
                        side,
                        position_string(entry, &[]),
                        FieldingStats::default(),
                    ));
                }
            }
        }
        out
    }

    /// Re-encode the game as wire lines, starting with its `version` record.
    /// Ingesting the output yields an equal game.
    pub fn to_wire_lines(&self) -> Vec<String> {
        let ctx = &self.context;
        let mut records = vec![Record::Version("1".to_string())];
        let mut info = |key: &str, value: String| {
            records.push(Record::Info {
                key: key.to_string(),
                value,
            })
        };
        info("visteam", ctx.road_team.clone());
        info("hometeam", ctx.home_team.clone());
        if let Some(date) = ctx.date {
            info("date", date.format("%Y/%m/%d").to_string());
        }
        info("number", ctx.game_number.to_string());
        info("daynight", ctx.day_night.info_value().to_string());
        info("usedh", ctx.use_dh.to_string());
        if let Some(start) = &ctx.start_time {
            info("starttime", start.clone());
        }
        info("timeofgame", ctx.time_of_game.to_wire());
        info("attendance", ctx.attendance.to_wire());
        if let Some(wp) = &ctx.winning_pitcher {
            info("wp", wp.clone());
        }
        if let Some(lp) = &ctx.losing_pitcher {
            info("lp", lp.clone());
        }
        if !ctx.comment.is_empty() {
            records.push(Record::Comment(ctx.comment.clone()));
        }

        for side in Side::BOTH {
            if let Some(ls) = &self.line_scores[side] {
                records.push(Record::LineScore {
                    side,
                    innings: ls.innings.clone(),
                });
            }
        }
        records.extend(self.batting.iter().map(|b| {
            Record::Batting(BattingRecord {
                player: b.player.clone(),
                side: b.side,
                lineup: b.lineup,
                sequence: b.sequence,
                stats: b.stats,
            })
        }));
        records.extend(self.pitching.iter().map(|p| {
            Record::Pitching(PitchingRecord {
                player: p.player.clone(),
                side: p.side,
                sequence: p.sequence,
                stats: p.stats,
            })
        }));
        for d in &self.defense {
            for (i, &position) in d.positions.iter().enumerate() {
                records.push(Record::Defense(DefenseRecord {
                    player: d.player.clone(),
                    side: d.side,
                    sequence: i as u8,
                    position,
                    stats: if i == 0 { d.stats } else { FieldingStats::default() },
                }));
            }
        }
        for side in Side::BOTH {
            let pinch = |p: &PinchAppearance| PinchRecord {
                player: p.player.clone(),
                inning: p.inning,
                side,
            };
            records.extend(self.pinch_hitters[side].iter().map(|p| Record::PinchHit(pinch(p))));
            records.extend(self.pinch_runners[side].iter().map(|p| Record::PinchRun(pinch(p))));
        }
        for side in Side::BOTH {
            let t = &self.totals[side];
            records.push(Record::TeamMisc(TeamMiscRecord {
                side,
                left_on_base: t.left_on_base,
                earned_runs: t.earned_runs,
                double_plays: t.double_plays,
                triple_plays: t.triple_plays,
            }));
            if t.reported {
                records.push(Record::TeamStat {
                    record: TeamStatRecord {
                        side,
                        at_bats: t.at_bats,
                        runs: t.runs,
                        hits: t.hits,
                        putouts: t.putouts,
                        assists: t.assists,
                        errors: t.errors,
                        rbi: t.rbi,
                        walks: t.walks,
                        strikeouts: t.strikeouts,
                    },
                    from_stat: false,
                });
            }
        }
        records.extend(self.events.iter().map(|e| match e {
            EventRecord::DoublePlay { side, fielders } => Record::DoublePlay(FieldingPlayRecord {
                side: *side,
                fielders: fielders.clone(),
            }),
            EventRecord::TriplePlay { side, fielders } => Record::TriplePlay(FieldingPlayRecord {
                side: *side,
                fielders: fielders.clone(),
            }),
            EventRecord::HitByPitch {
                pitcher_side,
                pitcher,
                batter,
            } => Record::HitByPitch(HitByPitchRecord {
                pitcher_side: *pitcher_side,
                pitcher: pitcher.clone(),
                batter: batter.clone(),
            }),
        }));

        records.iter().map(Record::to_wire).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{BattingStats, PitchingStats};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(1938, 4, 19).unwrap()
    }

    fn game() -> Game {
        let mut g = Game::default();
        g.context.road_team = "LOU".into();
        g.context.home_team = "KC".into();
        g.context.date = Some(date());
        g
    }

    fn fielder(player: &str, side: Side, positions: &[u8]) -> DefensiveLine {
        DefensiveLine {
            player: player.into(),
            side,
            positions: positions.to_vec(),
            stats: FieldingStats::default(),
        }
    }

    #[test]
    fn test_line_score_total() {
        let ls = LineScore {
            innings: vec![Stat::Known(1), Stat::ZERO, Stat::Known(3)],
        };
        assert_eq!(ls.total(), Stat::Known(4));
        assert_eq!(ls.inning_count(), 3);

        let ls = LineScore {
            innings: vec![Stat::Known(1), Stat::Missing],
        };
        assert_eq!(ls.total(), Stat::Missing);
    }

    #[test]
    fn test_hit_batsmen_indexed_by_batter_team() {
        let mut g = game();
        g.events.push(EventRecord::HitByPitch {
            pitcher_side: Side::Home,
            pitcher: Some("pitch101".into()),
            batter: "batte101".into(),
        });
        assert_eq!(
            g.hit_batsmen(Side::Road),
            vec![("batte101", Some("pitch101"))]
        );
        assert!(g.hit_batsmen(Side::Home).is_empty());
    }

    #[test]
    fn test_appearances_merge_pinch_roles() {
        let mut g = game();
        g.defense.push(fielder("short101", Side::Road, &[5, 6]));
        g.defense.push(fielder("catch101", Side::Road, &[2]));
        g.pinch_hitters.road.push(PinchAppearance {
            player: "short101".into(),
            inning: Stat::Known(7),
        });
        g.pinch_runners.road.push(PinchAppearance {
            player: "speed101".into(),
            inning: Stat::Known(9),
        });

        let rows = g.appearances();
        let lists: Vec<(&str, &str)> = rows
            .iter()
            .map(|a| (a.player.as_str(), a.position_list.as_str()))
            .collect();
        assert_eq!(
            lists,
            vec![
                ("short101", "ph-3b-ss"),
                ("catch101", "c"),
                ("speed101", "pr"),
            ]
        );
        assert_eq!(rows[2].stats, FieldingStats::default());
        assert_eq!(rows[2].my_team, "LOU");
        assert_eq!(rows[2].opponent, "KC");
    }

    #[test]
    fn test_appearances_need_a_date() {
        let mut g = game();
        g.context.date = None;
        g.defense.push(fielder("catch101", Side::Home, &[2]));
        assert!(g.appearances().is_empty());
    }

    #[test]
    fn test_wire_lines_start_with_version() {
        let mut g = game();
        g.batting.push(BattingLine {
            player: "beanb101".into(),
            date: date(),
            game_number: 0,
            side: Side::Road,
            my_team: "LOU".into(),
            opponent: "KC".into(),
            lineup: 1,
            sequence: 0,
            stats: BattingStats::default(),
        });
        g.pitching.push(PitchingLine {
            player: "smitj101".into(),
            date: date(),
            game_number: 0,
            side: Side::Home,
            my_team: "KC".into(),
            opponent: "LOU".into(),
            sequence: 0,
            starter: true,
            winner: false,
            loser: false,
            stats: PitchingStats::default(),
        });
        let lines = g.to_wire_lines();
        assert_eq!(lines[0], "version,1");
        assert!(lines.contains(&"info,date,1938/04/19".to_string()));
        assert!(lines.iter().any(|l| l.starts_with("stat,bline,beanb101,0,1,0,")));
        assert!(lines.iter().any(|l| l.starts_with("stat,pline,smitj101,1,0,")));
    }
}
