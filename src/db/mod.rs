use anyhow::{anyhow, Context, Result};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, ToSql, Transaction};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

pub mod models;
use models::*;

use crate::boxscore::game::Game;

/// Thread-safe SQLite connection (single connection with mutex)
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the box-score database at the given path
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)
            .with_context(|| format!("opening database {}", path.display()))?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let db = Database {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    /// Run schema migrations (idempotent)
    fn run_migrations(&self) -> Result<()> {
        self.lock()?.execute_batch(SCHEMA_SQL)?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("database connection poisoned"))
    }

    // ── Games ─────────────────────────────────────────────────────────────────

    /// Store a sealed game and all its lines in one transaction. A game
    /// already stored under the same date, number and home team is replaced.
    pub fn insert_game(&self, game: &Game) -> Result<i64> {
        let ctx = &game.context;
        let date = ctx
            .date
            .ok_or_else(|| anyhow!("{}: game has no date", ctx.label()))?;

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM games WHERE date=?1 AND game_number=?2 AND home_team=?3",
            params![date, ctx.game_number, ctx.home_team],
        )?;
        tx.execute(
            "INSERT INTO games (
                date, game_number, road_team, home_team, winning_pitcher,
                losing_pitcher, start_time, day_night, attendance, time_of_game,
                use_dh, comment, road_runs, home_runs, innings
             ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15)",
            params![
                date,
                ctx.game_number,
                ctx.road_team,
                ctx.home_team,
                ctx.winning_pitcher,
                ctx.losing_pitcher,
                ctx.start_time,
                ctx.day_night.code(),
                ctx.attendance,
                ctx.time_of_game,
                ctx.use_dh,
                ctx.comment,
                ctx.road_runs,
                ctx.home_runs,
                ctx.innings,
            ],
        )?;
        let game_id = tx.last_insert_rowid();

        for b in &game.batting {
            let stats = b.stats.values();
            let mut values: Vec<&dyn ToSql> = vec![
                &game_id,
                &b.player,
                &b.date,
                &b.game_number,
                &b.side,
                &b.my_team,
                &b.opponent,
                &b.lineup,
                &b.sequence,
            ];
            values.extend(stats.iter().map(|s| s as &dyn ToSql));
            insert_row(&tx, "batting_lines", BATTING_KEYS, BATTING_STATS, &values)?;
        }

        for p in &game.pitching {
            let stats = p.stats.values();
            let mut values: Vec<&dyn ToSql> = vec![
                &game_id,
                &p.player,
                &p.date,
                &p.game_number,
                &p.side,
                &p.my_team,
                &p.opponent,
                &p.sequence,
                &p.starter,
                &p.winner,
                &p.loser,
            ];
            values.extend(stats.iter().map(|s| s as &dyn ToSql));
            insert_row(&tx, "pitching_lines", PITCHING_KEYS, PITCHING_STATS, &values)?;
        }

        for a in game.appearances() {
            let stats = a.stats.values();
            let mut values: Vec<&dyn ToSql> = vec![
                &game_id,
                &a.player,
                &a.date,
                &a.game_number,
                &a.side,
                &a.my_team,
                &a.opponent,
                &a.position_list,
            ];
            values.extend(stats.iter().map(|s| s as &dyn ToSql));
            insert_row(&tx, "defensive_lines", DEFENSE_KEYS, FIELDING_STATS, &values)?;
        }

        tx.commit()?;
        Ok(game_id)
    }

    pub fn game_count(&self) -> Result<u64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM games", [], |r| r.get(0))?;
        Ok(count as u64)
    }

    /// Stored games matching the filter, in date order.
    pub fn games(&self, filter: &LineFilter) -> Result<Vec<GameContext>> {
        let (clause, values) = game_where_clause(filter);
        let sql = format!(
            "SELECT date, game_number, road_team, home_team, winning_pitcher, losing_pitcher,
                    start_time, day_night, attendance, time_of_game, use_dh, comment,
                    road_runs, home_runs, innings
             FROM games{clause} ORDER BY date, game_number, home_team"
        );

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let games = stmt
            .query_map(params_from_iter(values), map_game)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(games)
    }

    // ── Player lines ──────────────────────────────────────────────────────────

    /// Batting lines matching the filter, ordered by player then game.
    pub fn batting_lines(&self, filter: &LineFilter) -> Result<Vec<BattingLine>> {
        self.select("batting_lines", BATTING_KEYS, BATTING_STATS, filter, map_batting)
    }

    pub fn pitching_lines(&self, filter: &LineFilter) -> Result<Vec<PitchingLine>> {
        self.select("pitching_lines", PITCHING_KEYS, PITCHING_STATS, filter, map_pitching)
    }

    pub fn defensive_appearances(&self, filter: &LineFilter) -> Result<Vec<DefensiveAppearance>> {
        self.select("defensive_lines", DEFENSE_KEYS, FIELDING_STATS, filter, map_defense)
    }

    fn select<T>(
        &self,
        table: &str,
        keys: &[&str],
        stats: &[&str],
        filter: &LineFilter,
        map: fn(&rusqlite::Row) -> rusqlite::Result<T>,
    ) -> Result<Vec<T>> {
        // game_id is never read back
        let columns = keys[1..].iter().chain(stats).copied().collect::<Vec<_>>().join(", ");
        let (clause, values) = where_clause(filter);
        let sql = format!(
            "SELECT {columns} FROM {table}{clause} ORDER BY player, date, game_number"
        );

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(values), map)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}

// ── SQL helpers ────────────────────────────────────────────────────────────────

const BATTING_KEYS: &[&str] = &[
    "game_id", "player", "date", "game_number", "side", "my_team", "opponent", "lineup",
    "sequence",
];
const BATTING_STATS: &[&str] = &[
    "ab", "r", "h", "doubles", "triples", "hr", "rbi", "sh", "sf", "hbp", "bb", "ibb", "so",
    "sb", "cs", "gidp", "interference",
];

const PITCHING_KEYS: &[&str] = &[
    "game_id", "player", "date", "game_number", "side", "my_team", "opponent", "sequence",
    "starter", "winner", "loser",
];
const PITCHING_STATS: &[&str] = &[
    "outs", "no_out", "bfp", "h", "doubles", "triples", "hr", "r", "er", "bb", "ibb", "so",
    "hbp", "wp", "balk", "sh", "sf",
];

const DEFENSE_KEYS: &[&str] = &[
    "game_id", "player", "date", "game_number", "side", "my_team", "opponent", "position_list",
];
const FIELDING_STATS: &[&str] = &["outs_played", "po", "a", "e", "dp", "tp", "pb"];

fn insert_row(
    tx: &Transaction,
    table: &str,
    keys: &[&str],
    stats: &[&str],
    values: &[&dyn ToSql],
) -> Result<()> {
    let columns: Vec<&str> = keys.iter().chain(stats).copied().collect();
    let placeholders = (1..=columns.len())
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(",");
    let sql = format!(
        "INSERT INTO {table} ({}) VALUES ({placeholders})",
        columns.join(", ")
    );
    tx.prepare_cached(&sql)?.execute(values)?;
    Ok(())
}

fn where_clause(filter: &LineFilter) -> (String, Vec<Value>) {
    let mut conditions = Vec::new();
    let mut values = Vec::new();
    let mut text = |column: &str, value: &str| {
        conditions.push(format!("{column} = ?"));
        values.push(Value::Text(value.to_string()));
    };
    if let Some(player) = &filter.player {
        text("player", player);
    }
    if let Some(team) = &filter.team {
        text("my_team", team);
    }
    if let Some(opponent) = &filter.opponent {
        text("opponent", opponent);
    }
    if let Some(side) = filter.location.side() {
        text("side", side.as_str());
    }
    date_range(filter, &mut conditions, &mut values);
    join_conditions(conditions, values)
}

/// Games of `filter.team`, seen from that team: home, road or either, and
/// against `filter.opponent` when given.
fn game_where_clause(filter: &LineFilter) -> (String, Vec<Value>) {
    let mut conditions = Vec::new();
    let mut values = Vec::new();
    if let Some(team) = &filter.team {
        let pairings: &[(&str, &str)] = match filter.location {
            Location::Home => &[("home_team", "road_team")],
            Location::Road => &[("road_team", "home_team")],
            Location::All => &[("road_team", "home_team"), ("home_team", "road_team")],
        };
        let mut either = Vec::new();
        for (mine, theirs) in pairings {
            values.push(Value::Text(team.clone()));
            match &filter.opponent {
                Some(opponent) => {
                    either.push(format!("({mine} = ? AND {theirs} = ?)"));
                    values.push(Value::Text(opponent.clone()));
                }
                None => either.push(format!("{mine} = ?")),
            }
        }
        conditions.push(format!("({})", either.join(" OR ")));
    }
    date_range(filter, &mut conditions, &mut values);
    join_conditions(conditions, values)
}

fn date_range(filter: &LineFilter, conditions: &mut Vec<String>, values: &mut Vec<Value>) {
    if let Some(start) = filter.start {
        conditions.push("date >= ?".to_string());
        values.push(Value::Text(start.format("%Y-%m-%d").to_string()));
    }
    if let Some(end) = filter.end {
        conditions.push("date <= ?".to_string());
        values.push(Value::Text(end.format("%Y-%m-%d").to_string()));
    }
}

fn join_conditions(conditions: Vec<String>, values: Vec<Value>) -> (String, Vec<Value>) {
    if conditions.is_empty() {
        (String::new(), values)
    } else {
        (format!(" WHERE {}", conditions.join(" AND ")), values)
    }
}

fn stat_array<const N: usize>(
    row: &rusqlite::Row,
    first: usize,
) -> rusqlite::Result<[crate::boxscore::stat::Stat; N]> {
    let mut out = [crate::boxscore::stat::Stat::Missing; N];
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = row.get(first + i)?;
    }
    Ok(out)
}

fn map_game(row: &rusqlite::Row) -> rusqlite::Result<GameContext> {
    let day_night: String = row.get(7)?;
    Ok(GameContext {
        date: Some(row.get(0)?),
        game_number: row.get(1)?,
        road_team: row.get(2)?,
        home_team: row.get(3)?,
        winning_pitcher: row.get(4)?,
        losing_pitcher: row.get(5)?,
        start_time: row.get(6)?,
        day_night: DayNight::from_code(&day_night),
        attendance: row.get(8)?,
        time_of_game: row.get(9)?,
        use_dh: row.get(10)?,
        comment: row.get(11)?,
        road_runs: row.get(12)?,
        home_runs: row.get(13)?,
        innings: row.get(14)?,
    })
}

fn map_batting(row: &rusqlite::Row) -> rusqlite::Result<BattingLine> {
    Ok(BattingLine {
        player: row.get(0)?,
        date: row.get(1)?,
        game_number: row.get(2)?,
        side: row.get(3)?,
        my_team: row.get(4)?,
        opponent: row.get(5)?,
        lineup: row.get(6)?,
        sequence: row.get(7)?,
        stats: BattingStats::from_values(stat_array(row, 8)?),
    })
}

fn map_pitching(row: &rusqlite::Row) -> rusqlite::Result<PitchingLine> {
    Ok(PitchingLine {
        player: row.get(0)?,
        date: row.get(1)?,
        game_number: row.get(2)?,
        side: row.get(3)?,
        my_team: row.get(4)?,
        opponent: row.get(5)?,
        sequence: row.get(6)?,
        starter: row.get(7)?,
        winner: row.get(8)?,
        loser: row.get(9)?,
        stats: PitchingStats::from_values(stat_array(row, 10)?),
    })
}

fn map_defense(row: &rusqlite::Row) -> rusqlite::Result<DefensiveAppearance> {
    Ok(DefensiveAppearance {
        player: row.get(0)?,
        date: row.get(1)?,
        game_number: row.get(2)?,
        side: row.get(3)?,
        my_team: row.get(4)?,
        opponent: row.get(5)?,
        position_list: row.get(6)?,
        stats: FieldingStats::from_values(stat_array(row, 7)?),
    })
}

/// SQLite schema (idempotent CREATE IF NOT EXISTS). Missing stats are NULL.
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS games (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    date            TEXT    NOT NULL,
    game_number     INTEGER NOT NULL,
    road_team       TEXT    NOT NULL,
    home_team       TEXT    NOT NULL,
    winning_pitcher TEXT,
    losing_pitcher  TEXT,
    start_time      TEXT,
    day_night       TEXT    NOT NULL DEFAULT 'U',
    attendance      INTEGER,
    time_of_game    INTEGER,
    use_dh          INTEGER NOT NULL DEFAULT 0,
    comment         TEXT    NOT NULL DEFAULT '',
    road_runs       INTEGER,
    home_runs       INTEGER,
    innings         INTEGER NOT NULL,
    UNIQUE (date, game_number, home_team)
);

CREATE TABLE IF NOT EXISTS batting_lines (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    game_id      INTEGER NOT NULL REFERENCES games(id) ON DELETE CASCADE,
    player       TEXT    NOT NULL,
    date         TEXT    NOT NULL,
    game_number  INTEGER NOT NULL,
    side         TEXT    NOT NULL,
    my_team      TEXT    NOT NULL,
    opponent     TEXT    NOT NULL,
    lineup       INTEGER NOT NULL,
    sequence     INTEGER NOT NULL,
    ab INTEGER, r INTEGER, h INTEGER, doubles INTEGER, triples INTEGER,
    hr INTEGER, rbi INTEGER, sh INTEGER, sf INTEGER, hbp INTEGER,
    bb INTEGER, ibb INTEGER, so INTEGER, sb INTEGER, cs INTEGER,
    gidp INTEGER, interference INTEGER
);

CREATE TABLE IF NOT EXISTS pitching_lines (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    game_id      INTEGER NOT NULL REFERENCES games(id) ON DELETE CASCADE,
    player       TEXT    NOT NULL,
    date         TEXT    NOT NULL,
    game_number  INTEGER NOT NULL,
    side         TEXT    NOT NULL,
    my_team      TEXT    NOT NULL,
    opponent     TEXT    NOT NULL,
    sequence     INTEGER NOT NULL,
    starter      INTEGER NOT NULL,
    winner       INTEGER NOT NULL,
    loser        INTEGER NOT NULL,
    outs INTEGER, no_out INTEGER, bfp INTEGER, h INTEGER, doubles INTEGER,
    triples INTEGER, hr INTEGER, r INTEGER, er INTEGER, bb INTEGER,
    ibb INTEGER, so INTEGER, hbp INTEGER, wp INTEGER, balk INTEGER,
    sh INTEGER, sf INTEGER
);

CREATE TABLE IF NOT EXISTS defensive_lines (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    game_id       INTEGER NOT NULL REFERENCES games(id) ON DELETE CASCADE,
    player        TEXT    NOT NULL,
    date          TEXT    NOT NULL,
    game_number   INTEGER NOT NULL,
    side          TEXT    NOT NULL,
    my_team       TEXT    NOT NULL,
    opponent      TEXT    NOT NULL,
    position_list TEXT    NOT NULL,
    outs_played INTEGER, po INTEGER, a INTEGER, e INTEGER,
    dp INTEGER, tp INTEGER, pb INTEGER
);

CREATE INDEX IF NOT EXISTS idx_batting_player ON batting_lines(player, date, game_number);
CREATE INDEX IF NOT EXISTS idx_pitching_player ON pitching_lines(player, date, game_number);
CREATE INDEX IF NOT EXISTS idx_defense_player ON defensive_lines(player, date, game_number);
CREATE INDEX IF NOT EXISTS idx_batting_game ON batting_lines(game_id);
CREATE INDEX IF NOT EXISTS idx_pitching_game ON pitching_lines(game_id);
CREATE INDEX IF NOT EXISTS idx_defense_game ON defensive_lines(game_id);
"#;
