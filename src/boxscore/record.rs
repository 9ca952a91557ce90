//! Record classifier: one raw line in, one typed record out.
//!
//! No game state is consulted here. Sides stay as raw indicators and numeric
//! fields are parsed into [`Stat`]s; resolving sides to teams is the
//! accumulator's job.

use crate::boxscore::side::Side;
use crate::boxscore::stat::Stat;
use crate::db::models::{BattingStats, FieldingStats, PitchingStats};
use crate::error::ParseError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BattingRecord {
    pub player: String,
    pub side: Side,
    pub lineup: u8,
    pub sequence: u8,
    pub stats: BattingStats,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PitchingRecord {
    pub player: String,
    pub side: Side,
    pub sequence: u8,
    pub stats: PitchingStats,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefenseRecord {
    pub player: String,
    pub side: Side,
    pub sequence: u8,
    pub position: u8,
    pub stats: FieldingStats,
}

/// `phline` / `prline`. Only the inning is kept; the per-appearance stat
/// fields that follow it are not used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinchRecord {
    pub player: String,
    pub inning: Stat,
    pub side: Side,
}

/// `stat,tline,side,lob,er,dp,tp`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamMiscRecord {
    pub side: Side,
    pub left_on_base: Stat,
    pub earned_runs: Stat,
    pub double_plays: Stat,
    pub triple_plays: Stat,
}

/// `teamstat,side,ab,r,h,po,a,e[,rbi,bb,k]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamStatRecord {
    pub side: Side,
    pub at_bats: Stat,
    pub runs: Stat,
    pub hits: Stat,
    pub putouts: Stat,
    pub assists: Stat,
    pub errors: Stat,
    pub rbi: Stat,
    pub walks: Stat,
    pub strikeouts: Stat,
}

/// `event,dpline|tpline,side,fielder...` where side is the team that turned
/// the play.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldingPlayRecord {
    pub side: Side,
    pub fielders: Vec<String>,
}

/// `event,hpline,side,pitcher,batter` where side is the pitcher's team.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HitByPitchRecord {
    pub pitcher_side: Side,
    pub pitcher: Option<String>,
    pub batter: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Version(String),
    Info { key: String, value: String },
    Comment(String),
    LineScore { side: Side, innings: Vec<Stat> },
    Batting(BattingRecord),
    Pitching(PitchingRecord),
    Defense(DefenseRecord),
    PinchHit(PinchRecord),
    PinchRun(PinchRecord),
    TeamMisc(TeamMiscRecord),
    /// `from_stat` is set for the `stat,teamstat` spelling.
    TeamStat { record: TeamStatRecord, from_stat: bool },
    DoublePlay(FieldingPlayRecord),
    TriplePlay(FieldingPlayRecord),
    HitByPitch(HitByPitchRecord),
}

/// A numeric field that held characters outside `[0-9-]` and was read as
/// missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoercedField {
    pub index: usize,
    pub raw: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    pub record: Record,
    pub coerced: Vec<CoercedField>,
}

impl Record {
    pub fn kind(&self) -> &'static str {
        match self {
            Record::Version(_) => "version",
            Record::Info { .. } => "info",
            Record::Comment(_) => "com",
            Record::LineScore { .. } => "line",
            Record::TeamStat {
                from_stat: false, ..
            } => "teamstat",
            Record::DoublePlay(_) | Record::TriplePlay(_) | Record::HitByPitch(_) => "event",
            _ => "stat",
        }
    }

    /// Encode back to the comma-delimited wire form.
    pub fn to_wire(&self) -> String {
        let mut out: Vec<String> = Vec::new();
        match self {
            Record::Version(v) => out.extend(["version".into(), v.clone()]),
            Record::Info { key, value } => {
                out.extend(["info".into(), key.clone(), value.clone()])
            }
            Record::Comment(text) => return format!("com,{text}"),
            Record::LineScore { side, innings } => {
                out.extend(["line".into(), side.code().to_string()]);
                out.extend(innings.iter().map(|s| s.to_wire()));
            }
            Record::Batting(b) => {
                out.extend([
                    "stat".into(),
                    "bline".into(),
                    b.player.clone(),
                    b.side.code().to_string(),
                    b.lineup.to_string(),
                    b.sequence.to_string(),
                ]);
                out.extend(b.stats.values().iter().map(|s| s.to_wire()));
            }
            Record::Pitching(p) => {
                out.extend([
                    "stat".into(),
                    "pline".into(),
                    p.player.clone(),
                    p.side.code().to_string(),
                    p.sequence.to_string(),
                ]);
                out.extend(p.stats.values().iter().map(|s| s.to_wire()));
            }
            Record::Defense(d) => {
                out.extend([
                    "stat".into(),
                    "dline".into(),
                    d.player.clone(),
                    d.side.code().to_string(),
                    d.sequence.to_string(),
                    d.position.to_string(),
                ]);
                out.extend(d.stats.values().iter().map(|s| s.to_wire()));
            }
            Record::PinchHit(p) | Record::PinchRun(p) => {
                let sub = if matches!(self, Record::PinchHit(_)) {
                    "phline"
                } else {
                    "prline"
                };
                out.extend([
                    "stat".into(),
                    sub.into(),
                    p.player.clone(),
                    p.inning.to_wire(),
                    p.side.code().to_string(),
                ]);
            }
            Record::TeamMisc(t) => {
                out.extend(["stat".into(), "tline".into(), t.side.code().to_string()]);
                out.extend(
                    [t.left_on_base, t.earned_runs, t.double_plays, t.triple_plays]
                        .iter()
                        .map(|s| s.to_wire()),
                );
            }
            Record::TeamStat { record: t, from_stat } => {
                if *from_stat {
                    out.push("stat".into());
                }
                out.extend(["teamstat".into(), t.side.code().to_string()]);
                out.extend(
                    [
                        t.at_bats,
                        t.runs,
                        t.hits,
                        t.putouts,
                        t.assists,
                        t.errors,
                        t.rbi,
                        t.walks,
                        t.strikeouts,
                    ]
                    .iter()
                    .map(|s| s.to_wire()),
                );
            }
            Record::DoublePlay(play) | Record::TriplePlay(play) => {
                let sub = if matches!(self, Record::DoublePlay(_)) {
                    "dpline"
                } else {
                    "tpline"
                };
                out.extend(["event".into(), sub.into(), play.side.code().to_string()]);
                out.extend(play.fielders.iter().cloned());
            }
            Record::HitByPitch(h) => {
                out.extend([
                    "event".into(),
                    "hpline".into(),
                    h.pitcher_side.code().to_string(),
                    h.pitcher.clone().unwrap_or_default(),
                    h.batter.clone(),
                ]);
            }
        }
        out.join(",")
    }
}

/// Positional view over one split line that remembers coerced numerics.
struct Fields<'a> {
    parts: Vec<&'a str>,
    coerced: Vec<CoercedField>,
}

impl<'a> Fields<'a> {
    fn new(line: &'a str) -> Self {
        Fields {
            parts: line.split(',').collect(),
            coerced: Vec::new(),
        }
    }

    fn require(&self, record: &'static str, expected: usize) -> Result<(), ParseError> {
        if self.parts.len() < expected {
            return Err(ParseError::TooFewFields {
                record,
                expected,
                found: self.parts.len(),
            });
        }
        Ok(())
    }

    fn text(&self, i: usize) -> &'a str {
        self.parts.get(i).map_or("", |s| s.trim())
    }

    fn side(&self, i: usize) -> Result<Side, ParseError> {
        let raw = self.text(i);
        Side::from_code(raw).ok_or_else(|| ParseError::InvalidSide(raw.to_string()))
    }

    /// Structural small integer (lineup spot, sequence, position code).
    fn small(&self, i: usize, what: &'static str) -> Result<u8, ParseError> {
        let raw = self.text(i);
        raw.parse::<u8>().map_err(|_| ParseError::InvalidField {
            index: i,
            what,
            raw: raw.to_string(),
        })
    }

    /// Counting stat. Absent trailing fields are missing.
    fn stat(&mut self, i: usize) -> Stat {
        let raw = self.text(i);
        match Stat::from_wire(raw) {
            Ok(stat) => stat,
            Err(_) => {
                self.coerced.push(CoercedField {
                    index: i,
                    raw: raw.to_string(),
                });
                Stat::Missing
            }
        }
    }

    fn stats<const N: usize>(&mut self, start: usize) -> [Stat; N] {
        let mut values = [Stat::Missing; N];
        for (offset, slot) in values.iter_mut().enumerate() {
            *slot = self.stat(start + offset);
        }
        values
    }

    fn rest(&self, start: usize) -> impl Iterator<Item = &'a str> + '_ {
        self.parts.iter().skip(start).map(|s| s.trim())
    }
}

/// Classify one raw line. Lines without a comma are structural and yield
/// `None`. Numeric fields outside the digit alphabet are read as missing and
/// listed in [`Classified::coerced`].
pub fn classify(line: &str) -> Result<Option<Classified>, ParseError> {
    let line = line.trim_end_matches(['\r', '\n']);
    let Some((kind, rest)) = line.split_once(',') else {
        return Ok(None);
    };

    // Free text: split on the first comma only.
    if kind.trim() == "com" {
        return Ok(Some(Classified {
            record: Record::Comment(rest.to_string()),
            coerced: Vec::new(),
        }));
    }

    let mut f = Fields::new(line);
    let record = match kind.trim() {
        "version" => Record::Version(f.text(1).to_string()),
        "info" => Record::Info {
            key: f.text(1).to_string(),
            value: f.text(2).to_string(),
        },
        "line" => {
            f.require("line", 2)?;
            let side = f.side(1)?;
            let count = f.parts.len() - 2;
            let innings = (0..count).map(|i| f.stat(2 + i)).collect();
            Record::LineScore { side, innings }
        }
        "teamstat" => Record::TeamStat {
            record: team_stat(&mut f, 1)?,
            from_stat: false,
        },
        "stat" => classify_stat(&mut f)?,
        "event" => classify_event(&f)?,
        other => return Err(ParseError::UnknownKind(other.to_string())),
    };

    Ok(Some(Classified {
        record,
        coerced: f.coerced,
    }))
}

fn classify_stat(f: &mut Fields<'_>) -> Result<Record, ParseError> {
    let sub_kind = f.text(1);
    let record = match sub_kind {
        // stat,bline,id,side,pos,seq,ab,...,int
        "bline" => {
            f.require("bline", 6 + BattingStats::FIELDS)?;
            Record::Batting(BattingRecord {
                player: f.text(2).to_string(),
                side: f.side(3)?,
                lineup: f.small(4, "batting order position")?,
                sequence: f.small(5, "batting order sequence")?,
                stats: BattingStats::from_values(f.stats(6)),
            })
        }
        // stat,pline,id,side,seq,ip*3,...,sf
        "pline" => {
            f.require("pline", 5 + PitchingStats::FIELDS)?;
            Record::Pitching(PitchingRecord {
                player: f.text(2).to_string(),
                side: f.side(3)?,
                sequence: f.small(4, "pitcher sequence")?,
                stats: PitchingStats::from_values(f.stats(5)),
            })
        }
        // stat,dline,id,side,seq,pos,if*3,po,a,e,dp,tp,pb
        "dline" => {
            f.require("dline", 6 + FieldingStats::FIELDS)?;
            Record::Defense(DefenseRecord {
                player: f.text(2).to_string(),
                side: f.side(3)?,
                sequence: f.small(4, "fielding sequence")?,
                position: f.small(5, "fielding position")?,
                stats: FieldingStats::from_values(f.stats(6)),
            })
        }
        // stat,phline,id,inning,side,... / stat,prline,id,inning,side,...
        "phline" | "prline" => {
            f.require(if sub_kind == "phline" { "phline" } else { "prline" }, 5)?;
            let pinch = PinchRecord {
                player: f.text(2).to_string(),
                inning: f.stat(3),
                side: f.side(4)?,
            };
            if sub_kind == "phline" {
                Record::PinchHit(pinch)
            } else {
                Record::PinchRun(pinch)
            }
        }
        "tline" => {
            f.require("tline", 7)?;
            let side = f.side(2)?;
            let [left_on_base, earned_runs, double_plays, triple_plays] = f.stats(3);
            Record::TeamMisc(TeamMiscRecord {
                side,
                left_on_base,
                earned_runs,
                double_plays,
                triple_plays,
            })
        }
        "teamstat" => Record::TeamStat {
            record: team_stat(f, 2)?,
            from_stat: true,
        },
        other => {
            return Err(ParseError::UnknownSubKind {
                kind: "stat",
                sub_kind: other.to_string(),
            })
        }
    };
    Ok(record)
}

fn team_stat(f: &mut Fields<'_>, side_at: usize) -> Result<TeamStatRecord, ParseError> {
    f.require("teamstat", side_at + 7)?;
    let side = f.side(side_at)?;
    let [at_bats, runs, hits, putouts, assists, errors, rbi, walks, strikeouts] =
        f.stats(side_at + 1);
    Ok(TeamStatRecord {
        side,
        at_bats,
        runs,
        hits,
        putouts,
        assists,
        errors,
        rbi,
        walks,
        strikeouts,
    })
}

fn classify_event(f: &Fields<'_>) -> Result<Record, ParseError> {
    let sub_kind = f.text(1);
    match sub_kind {
        "dpline" | "tpline" => {
            f.require("event", 4)?;
            let play = FieldingPlayRecord {
                side: f.side(2)?,
                fielders: f
                    .rest(3)
                    .filter(|id| !id.is_empty())
                    .map(str::to_string)
                    .collect(),
            };
            Ok(if sub_kind == "dpline" {
                Record::DoublePlay(play)
            } else {
                Record::TriplePlay(play)
            })
        }
        "hpline" => {
            f.require("hpline", 5)?;
            let pitcher = f.text(3);
            Ok(Record::HitByPitch(HitByPitchRecord {
                pitcher_side: f.side(2)?,
                pitcher: (!pitcher.is_empty()).then(|| pitcher.to_string()),
                batter: f.text(4).to_string(),
            }))
        }
        other => Err(ParseError::UnknownSubKind {
            kind: "event",
            sub_kind: other.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(line: &str) -> Record {
        let classified = classify(line).unwrap().unwrap();
        assert!(classified.coerced.is_empty(), "{:?}", classified.coerced);
        classified.record
    }

    #[test]
    fn test_line_without_delimiter_is_ignored() {
        assert_eq!(classify("").unwrap(), None);
        assert_eq!(classify("BOXTOP").unwrap(), None);
    }

    #[test]
    fn test_classify_bline() {
        let r = record("stat,bline,beanb101,0,3,1,4,1,2,1,0,0,1,0,-1,0,1,-1,0,1,-1,-1,-1");
        let Record::Batting(b) = r else {
            panic!("expected batting record, got {r:?}");
        };
        assert_eq!(b.player, "beanb101");
        assert_eq!(b.side, Side::Road);
        assert_eq!(b.lineup, 3);
        assert_eq!(b.sequence, 1);
        assert_eq!(b.stats.at_bats, Stat::Known(4));
        assert_eq!(b.stats.hits, Stat::Known(2));
        assert_eq!(b.stats.sac_flies, Stat::Missing);
        assert_eq!(b.stats.interference, Stat::Missing);
    }

    #[test]
    fn test_classify_pline_and_dline() {
        let r = record("stat,pline,smitj101,1,0,27,0,36,8,-1,-1,-1,3,-1,2,-1,5,0,0,0,-1,-1");
        let Record::Pitching(p) = r else {
            panic!("expected pitching record");
        };
        assert_eq!(p.side, Side::Home);
        assert_eq!(p.sequence, 0);
        assert_eq!(p.stats.outs, Stat::Known(27));
        assert_eq!(p.stats.earned_runs, Stat::Missing);

        let r = record("stat,dline,smitj101,1,0,1,0,1,3,0,-1,-1,-1");
        let Record::Defense(d) = r else {
            panic!("expected defense record");
        };
        assert_eq!(d.position, 1);
        assert_eq!(d.stats.assists, Stat::Known(3));
    }

    #[test]
    fn test_comment_keeps_embedded_commas() {
        let r = record("com,\"Called after 7, rain\"");
        assert_eq!(r, Record::Comment("\"Called after 7, rain\"".to_string()));
    }

    #[test]
    fn test_line_score() {
        let r = record("line,1,0,0,2,0,0,1,0,0");
        assert_eq!(
            r,
            Record::LineScore {
                side: Side::Home,
                innings: vec![0, 0, 2, 0, 0, 1, 0, 0]
                    .into_iter()
                    .map(Stat::Known)
                    .collect(),
            }
        );
    }

    #[test]
    fn test_teamstat_both_spellings() {
        let top = record("teamstat,0,34,3,9,24,11,2");
        let Record::TeamStat { record: t, from_stat } = top else {
            panic!("expected teamstat");
        };
        assert!(!from_stat);
        assert_eq!(t.at_bats, Stat::Known(34));
        assert_eq!(t.errors, Stat::Known(2));
        assert_eq!(t.rbi, Stat::Missing);

        let aliased = record("stat,teamstat,1,30,2,7,27,10,1,2,3,4");
        let Record::TeamStat { record: t, from_stat } = aliased else {
            panic!("expected teamstat");
        };
        assert!(from_stat);
        assert_eq!(t.strikeouts, Stat::Known(4));
    }

    #[test]
    fn test_events() {
        let r = record("event,dpline,1,smitj101,jonea101,brown101");
        let Record::DoublePlay(dp) = r else {
            panic!("expected double play");
        };
        assert_eq!(dp.side, Side::Home);
        assert_eq!(dp.fielders.len(), 3);

        let r = record("event,hpline,0,pitch101,batte101");
        assert_eq!(
            r,
            Record::HitByPitch(HitByPitchRecord {
                pitcher_side: Side::Road,
                pitcher: Some("pitch101".into()),
                batter: "batte101".into(),
            })
        );
    }

    #[test]
    fn test_unknown_kind_is_error() {
        assert_eq!(
            classify("play,1,0,x,??,,S8").unwrap_err(),
            ParseError::UnknownKind("play".into())
        );
        assert!(matches!(
            classify("stat,zline,x").unwrap_err(),
            ParseError::UnknownSubKind { .. }
        ));
    }

    #[test]
    fn test_bad_side_is_error() {
        assert_eq!(
            classify("line,2,0,0").unwrap_err(),
            ParseError::InvalidSide("2".into())
        );
    }

    #[test]
    fn test_short_bline_is_error() {
        assert!(matches!(
            classify("stat,bline,x,0,1,0,4").unwrap_err(),
            ParseError::TooFewFields { record: "bline", .. }
        ));
    }

    #[test]
    fn test_outside_alphabet_is_coerced() {
        let line = "line,0,1,0,x";
        let classified = classify(line).unwrap().unwrap();
        assert_eq!(
            classified.coerced,
            vec![CoercedField {
                index: 4,
                raw: "x".into()
            }]
        );
        let Record::LineScore { innings, .. } = classified.record else {
            panic!("expected line score");
        };
        assert_eq!(innings[2], Stat::Missing);
    }

    #[test]
    fn test_wire_round_trip() {
        let lines = [
            "version,BOXTOP1",
            "info,visteam,LOU",
            "com,\"a, b\"",
            "line,0,1,0,0,-1",
            "stat,bline,beanb101,0,3,0,4,1,2,1,0,0,1,0,-1,0,1,-1,0,1,-1,-1,-1",
            "stat,pline,smitj101,1,0,27,0,36,8,-1,-1,-1,3,-1,2,-1,5,0,0,0,-1,-1",
            "stat,dline,smitj101,1,0,1,0,1,3,0,-1,-1,-1",
            "stat,phline,jonea101,7,1",
            "stat,prline,jonea102,-1,0",
            "stat,tline,0,6,-1,1,0",
            "teamstat,0,34,3,9,24,11,2,3,-1,-1",
            "event,tpline,0,a,b,c",
            "event,hpline,1,,batte101",
        ];
        for line in lines {
            assert_eq!(record(line).to_wire(), line);
        }
    }
}
