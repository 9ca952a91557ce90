//! Game accumulator: routes classified records into the active game and
//! seals it on the next `version` record or at end of stream.

use anyhow::Context as _;
use chrono::NaiveDate;
use std::borrow::Cow;
use std::io::BufRead;
use tracing::{debug, warn};

use crate::boxscore::game::{
    DefensiveLine, EventRecord, Game, IngestNote, LineScore, PinchAppearance,
};
use crate::boxscore::positions::position_token;
use crate::boxscore::record::{classify, Classified, PinchRecord, Record};
use crate::boxscore::side::{Side, SideResolver, TeamPair};
use crate::boxscore::stat::Stat;
use crate::db::models::{BattingLine, DayNight, PitchingLine};
use crate::error::{IngestError, ParseError};

/// The active game and everything needed to attribute its records.
#[derive(Debug, Default)]
struct GameBuilder {
    game: Game,
    sides: SideResolver,
}

#[derive(Debug, Default)]
enum State {
    #[default]
    NoActiveGame,
    Accumulating(Box<GameBuilder>),
}

#[derive(Debug, Default)]
pub struct Accumulator {
    state: State,
    line_no: usize,
    games_scanned: usize,
    strict: bool,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// An accumulator that rejects numeric fields outside the digit
    /// alphabet instead of reading them as missing.
    pub fn strict() -> Self {
        Accumulator {
            strict: true,
            ..Self::default()
        }
    }

    /// Feed one raw line. Returns the previous game when this line starts a
    /// new one.
    pub fn push_line(&mut self, line: &str) -> Result<Option<Game>, IngestError> {
        self.line_no += 1;
        let line_no = self.line_no;
        let Some(Classified { record, coerced }) =
            classify(line).map_err(|source| IngestError::Parse {
                line: line_no,
                source,
            })?
        else {
            return Ok(None);
        };

        if let Record::Version(_) = record {
            let sealed = self.finish();
            self.state = State::Accumulating(Box::default());
            return Ok(sealed);
        }

        let State::Accumulating(builder) = &mut self.state else {
            return Err(IngestError::NoActiveGame {
                line: line_no,
                kind: record.kind(),
            });
        };

        if let (true, Some(field)) = (self.strict, coerced.first()) {
            return Err(IngestError::Parse {
                line: line_no,
                source: ParseError::InvalidNumber {
                    index: field.index,
                    raw: field.raw.clone(),
                },
            });
        }

        for field in coerced {
            builder.note(
                line_no,
                format!(
                    "field {} of {} record holds '{}', read as missing",
                    field.index,
                    record.kind(),
                    field.raw
                ),
            );
        }
        builder.apply(line_no, record)?;
        Ok(None)
    }

    /// Seal the in-progress game, if any.
    pub fn finish(&mut self) -> Option<Game> {
        match std::mem::take(&mut self.state) {
            State::NoActiveGame => None,
            State::Accumulating(builder) => {
                self.games_scanned += 1;
                let game = builder.seal();
                debug!(game = %game.context.label(), "sealed box score");
                Some(game)
            }
        }
    }

    /// Read a whole stream, handing each sealed game to `on_game` in file
    /// order. Returns the number of games.
    ///
    /// Bytes that are not UTF-8 are replaced rather than failing the file;
    /// the game they belong to carries a note.
    pub fn ingest<R, F>(mut self, mut reader: R, mut on_game: F) -> anyhow::Result<usize>
    where
        R: BufRead,
        F: FnMut(Game) -> anyhow::Result<()>,
    {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            let read = reader
                .read_until(b'\n', &mut buf)
                .with_context(|| format!("reading line {}", self.line_no + 1))?;
            if read == 0 {
                break;
            }
            let raw = buf
                .strip_suffix(b"\n")
                .map(|b| b.strip_suffix(b"\r").unwrap_or(b))
                .unwrap_or(&buf[..]);
            let line = String::from_utf8_lossy(raw);
            if let Some(game) = self.push_line(&line)? {
                on_game(game)?;
            }
            if let Cow::Owned(_) = line {
                self.note_replaced_bytes();
            }
        }
        if let Some(game) = self.finish() {
            on_game(game)?;
        }
        Ok(self.games_scanned)
    }

    fn note_replaced_bytes(&mut self) {
        let line = self.line_no;
        let message = format!("line {line} is not valid UTF-8; unreadable bytes replaced");
        match &mut self.state {
            State::Accumulating(builder) => builder.note(line, message),
            State::NoActiveGame => warn!(line, "{message}"),
        }
    }
}

impl GameBuilder {
    fn note(&mut self, line: usize, message: String) {
        warn!(line, "{message}");
        self.game.notes.push(IngestNote { line, message });
    }

    /// Resolve the side of a `stat` record and the date its lines are keyed
    /// by. Both must be known by now.
    fn attribute(&mut self, line: usize, side: Side) -> Result<(TeamPair, NaiveDate), IngestError> {
        let teams = self
            .sides
            .resolve(side)
            .ok_or(IngestError::UnresolvedSide { line, side })?;
        let date = self
            .game
            .context
            .date
            .ok_or(IngestError::MissingDate { line })?;
        Ok((teams, date))
    }

    fn apply(&mut self, line: usize, record: Record) -> Result<(), IngestError> {
        match record {
            Record::Version(_) => {}
            Record::Info { key, value } => self.apply_info(line, &key, value)?,
            Record::Comment(text) => {
                let comment = &mut self.game.context.comment;
                if !comment.is_empty() {
                    comment.push(';');
                }
                comment.push_str(&text);
            }
            Record::LineScore { side, innings } => {
                self.game.line_scores[side] = Some(LineScore { innings });
            }
            Record::Batting(b) => {
                let (teams, date) = self.attribute(line, b.side)?;
                self.game.batting.push(BattingLine {
                    player: b.player,
                    date,
                    game_number: self.game.context.game_number,
                    side: b.side,
                    my_team: teams.my_team,
                    opponent: teams.opponent,
                    lineup: b.lineup,
                    sequence: b.sequence,
                    stats: b.stats,
                });
            }
            Record::Pitching(p) => {
                let (teams, date) = self.attribute(line, p.side)?;
                let ctx = &self.game.context;
                let winner = ctx.winning_pitcher.as_deref() == Some(p.player.as_str());
                let loser = ctx.losing_pitcher.as_deref() == Some(p.player.as_str());
                self.game.pitching.push(PitchingLine {
                    date,
                    game_number: ctx.game_number,
                    side: p.side,
                    my_team: teams.my_team,
                    opponent: teams.opponent,
                    sequence: p.sequence,
                    starter: p.sequence == 0,
                    winner,
                    loser,
                    stats: p.stats,
                    player: p.player,
                });
            }
            Record::Defense(d) => {
                self.attribute(line, d.side)?;
                if position_token(d.position).is_none() {
                    self.note(
                        line,
                        format!("{} has unknown fielding position {}", d.player, d.position),
                    );
                }
                let existing = self
                    .game
                    .defense
                    .iter_mut()
                    .find(|f| f.side == d.side && f.player == d.player);
                match existing {
                    // Later fragments only add a position; their counts are
                    // not carried by the source and stay with the first.
                    Some(fielder) => fielder.positions.push(d.position),
                    None => self.game.defense.push(DefensiveLine {
                        player: d.player,
                        side: d.side,
                        positions: vec![d.position],
                        stats: d.stats,
                    }),
                }
            }
            Record::PinchHit(p) => {
                self.attribute(line, p.side)?;
                let side = p.side;
                self.game.pinch_hitters[side].push(pinch(p));
            }
            Record::PinchRun(p) => {
                self.attribute(line, p.side)?;
                let side = p.side;
                self.game.pinch_runners[side].push(pinch(p));
            }
            Record::TeamMisc(t) => {
                self.attribute(line, t.side)?;
                self.game.totals[t.side].apply_misc(&t);
            }
            Record::TeamStat { record, from_stat } => {
                if from_stat {
                    self.attribute(line, record.side)?;
                }
                self.game.totals[record.side].apply_team_stat(&record);
            }
            Record::DoublePlay(play) => self.game.events.push(EventRecord::DoublePlay {
                side: play.side,
                fielders: play.fielders,
            }),
            Record::TriplePlay(play) => self.game.events.push(EventRecord::TriplePlay {
                side: play.side,
                fielders: play.fielders,
            }),
            Record::HitByPitch(h) => self.game.events.push(EventRecord::HitByPitch {
                pitcher_side: h.pitcher_side,
                pitcher: h.pitcher,
                batter: h.batter,
            }),
        }
        Ok(())
    }

    fn apply_info(&mut self, line: usize, key: &str, value: String) -> Result<(), IngestError> {
        let ctx = &mut self.game.context;
        match key {
            "visteam" | "hometeam" => {
                let side = if key == "visteam" { Side::Road } else { Side::Home };
                if self.sides.seed(side, &value) {
                    match side {
                        Side::Road => ctx.road_team = value,
                        Side::Home => ctx.home_team = value,
                    }
                } else {
                    let current = self.sides.team(side).unwrap_or("?").to_string();
                    self.note(
                        line,
                        format!(
                            "{key} {value} arrives after lines were attributed to {current}; ignored"
                        ),
                    );
                }
            }
            "date" => {
                let date = NaiveDate::parse_from_str(value.trim(), "%Y/%m/%d")
                    .map_err(|_| IngestError::InvalidDate { line, raw: value })?;
                ctx.date = Some(date);
            }
            "number" => match value.trim().parse::<u8>() {
                Ok(n) => ctx.game_number = n,
                Err(_) => self.note(line, format!("game number '{value}' is not a number")),
            },
            "wp" => ctx.winning_pitcher = non_empty(value),
            "lp" => ctx.losing_pitcher = non_empty(value),
            "starttime" => ctx.start_time = non_empty(value),
            "daynight" => ctx.day_night = DayNight::from_info(value.trim()),
            "usedh" => ctx.use_dh = value.trim().eq_ignore_ascii_case("true"),
            "attendance" => ctx.attendance = lenient_stat(&value),
            "timeofgame" => ctx.time_of_game = lenient_stat(&value),
            other => debug!(line, key = other, "ignoring info record"),
        }
        Ok(())
    }

    fn seal(self) -> Game {
        let mut game = self.game;
        let road = game.line_scores.road.as_ref();
        let home = game.line_scores.home.as_ref();
        game.context.road_runs = road.map_or(Stat::Missing, LineScore::total);
        game.context.home_runs = home.map_or(Stat::Missing, LineScore::total);
        game.context.innings = road
            .map_or(0, LineScore::inning_count)
            .max(home.map_or(0, LineScore::inning_count));
        game
    }
}

fn pinch(p: PinchRecord) -> PinchAppearance {
    PinchAppearance {
        player: p.player,
        inning: p.inning,
    }
}

fn non_empty(value: String) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn lenient_stat(value: &str) -> Stat {
    Stat::from_wire(value).unwrap_or(Stat::Missing)
}
