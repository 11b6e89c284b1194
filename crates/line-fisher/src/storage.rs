//! SQLite storage for finished lines.
//!
//! Every line that reaches Done is written once through the [`LineSink`]
//! boundary. Stored lines can be read back per session or per position and
//! converted into [`FishLine`]s for export.

use crate::config::FishConfig;
use crate::line::{FishLine, LineStatus};
use crate::transposition::normalize_fen;
use chrono::Utc;
use fish_analysis::{Evaluation, SimpleMove};
use rusqlite::{params, Connection, Row};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Failed to encode or decode stored JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to create database directory: {0}")]
    Io(#[from] std::io::Error),
}

/// Write boundary for finished lines.
pub trait LineSink {
    fn record_line(
        &mut self,
        session_id: &str,
        root_fen: &str,
        config: &FishConfig,
        line: &FishLine,
        san: &str,
    ) -> Result<(), StorageError>;
}

/// Discards every line.
#[derive(Debug, Default)]
pub struct NullSink;

impl LineSink for NullSink {
    fn record_line(
        &mut self,
        _session_id: &str,
        _root_fen: &str,
        _config: &FishConfig,
        _line: &FishLine,
        _san: &str,
    ) -> Result<(), StorageError> {
        Ok(())
    }
}

/// A stored session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRow {
    pub id: String,
    pub root_fen: String,
    pub created_at: String,
    pub line_count: usize,
}

/// A stored line.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredLine {
    pub session_id: String,
    pub line: FishLine,
    pub san: String,
    pub created_at: String,
}

impl From<StoredLine> for FishLine {
    fn from(stored: StoredLine) -> Self {
        stored.line
    }
}

/// Columns of a `lines` row before JSON decoding.
struct RawLine {
    session_id: String,
    line_index: i64,
    node_id: String,
    pcns: String,
    san: String,
    score: Option<String>,
    position: String,
    status: String,
    initiator_plies: i64,
    responder_plies: i64,
    replies: String,
    alts: String,
    created_at: String,
}

const LINE_COLUMNS: &str = "session_id, line_index, node_id, pcns, san, score, position, status,
     initiator_plies, responder_plies, replies, alts, created_at";

impl RawLine {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            session_id: row.get(0)?,
            line_index: row.get(1)?,
            node_id: row.get(2)?,
            pcns: row.get(3)?,
            san: row.get(4)?,
            score: row.get(5)?,
            position: row.get(6)?,
            status: row.get(7)?,
            initiator_plies: row.get(8)?,
            responder_plies: row.get(9)?,
            replies: row.get(10)?,
            alts: row.get(11)?,
            created_at: row.get(12)?,
        })
    }

    fn decode(self) -> Result<StoredLine, StorageError> {
        let score: Option<Evaluation> = match self.score {
            Some(json) => Some(serde_json::from_str(&json)?),
            None => None,
        };
        let status: LineStatus = serde_json::from_str(&self.status)?;
        let replies: Vec<SimpleMove> = serde_json::from_str(&self.replies)?;
        let alts: Vec<SimpleMove> = serde_json::from_str(&self.alts)?;

        Ok(StoredLine {
            session_id: self.session_id,
            line: FishLine {
                line_index: self.line_index as usize,
                node_id: self.node_id,
                pcns: self.pcns.split_whitespace().map(str::to_string).collect(),
                position: self.position,
                score,
                best5_replies: replies,
                best5_alts: alts,
                initiator_plies: self.initiator_plies as usize,
                responder_plies: self.responder_plies as usize,
                status,
            },
            san: self.san,
            created_at: self.created_at,
        })
    }
}

/// SQLite-backed line catalogue.
///
/// # Example
///
/// ```ignore
/// let mut storage = Storage::open("data/fisher.db")?;
/// let mut fisher = LineFisher::start(config, &mut oracle, &mut storage).await?;
/// fisher.run(&mut oracle, &mut storage, &mut LogProgress).await?;
/// let lines = storage.session_lines(&fisher.state().session_id)?;
/// ```
pub struct Storage {
    conn: Connection,
}

impl Storage {
    /// Opens or creates a database at `path` (`":memory:"` for a private
    /// in-memory database). Parent directories are created as needed.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        let storage = Self { conn };
        storage.init_schema()?;
        Ok(storage)
    }

    fn init_schema(&self) -> Result<(), StorageError> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                root_fen TEXT NOT NULL,
                config TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS lines (
                session_id TEXT NOT NULL,
                line_index INTEGER NOT NULL,
                node_id TEXT NOT NULL,
                pcns TEXT NOT NULL,
                san TEXT NOT NULL,
                score TEXT,
                position TEXT NOT NULL,
                normalized_position TEXT NOT NULL,
                status TEXT NOT NULL,
                is_done INTEGER NOT NULL,
                is_full INTEGER NOT NULL,
                is_mate INTEGER NOT NULL,
                is_stalemate INTEGER NOT NULL,
                is_transposition INTEGER NOT NULL,
                transposition_target TEXT,
                initiator_plies INTEGER NOT NULL,
                responder_plies INTEGER NOT NULL,
                replies TEXT NOT NULL,
                alts TEXT NOT NULL,
                created_at TEXT NOT NULL,
                PRIMARY KEY (session_id, line_index)
            );

            CREATE INDEX IF NOT EXISTS idx_lines_position ON lines(normalized_position);
            ",
        )?;
        Ok(())
    }

    /// Inserts the session row if it does not exist yet.
    pub fn ensure_session(
        &self,
        session_id: &str,
        root_fen: &str,
        config: &FishConfig,
    ) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT OR IGNORE INTO sessions (id, root_fen, config, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            (
                session_id,
                root_fen,
                serde_json::to_string(config)?,
                Utc::now().to_rfc3339(),
            ),
        )?;
        Ok(())
    }

    /// Inserts or replaces one line of a session.
    pub fn save_line(&self, session_id: &str, line: &FishLine, san: &str) -> Result<(), StorageError> {
        let score = line.score.map(|s| serde_json::to_string(&s)).transpose()?;
        self.conn.execute(
            "INSERT INTO lines (session_id, line_index, node_id, pcns, san, score, position,
                normalized_position, status, is_done, is_full, is_mate, is_stalemate,
                is_transposition, transposition_target, initiator_plies, responder_plies,
                replies, alts, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
                ?17, ?18, ?19, ?20)
             ON CONFLICT(session_id, line_index) DO UPDATE SET
                node_id = excluded.node_id,
                pcns = excluded.pcns,
                san = excluded.san,
                score = excluded.score,
                position = excluded.position,
                normalized_position = excluded.normalized_position,
                status = excluded.status,
                is_done = excluded.is_done,
                is_full = excluded.is_full,
                is_mate = excluded.is_mate,
                is_stalemate = excluded.is_stalemate,
                is_transposition = excluded.is_transposition,
                transposition_target = excluded.transposition_target,
                initiator_plies = excluded.initiator_plies,
                responder_plies = excluded.responder_plies,
                replies = excluded.replies,
                alts = excluded.alts",
            params![
                session_id,
                line.line_index as i64,
                line.node_id,
                line.pcns.join(" "),
                san,
                score,
                line.position,
                normalize_fen(&line.position),
                serde_json::to_string(&line.status)?,
                line.is_done(),
                line.is_full(),
                line.is_mate(),
                line.is_stalemate(),
                line.is_transposition(),
                line.transposition_target(),
                line.initiator_plies as i64,
                line.responder_plies as i64,
                serde_json::to_string(&line.best5_replies)?,
                serde_json::to_string(&line.best5_alts)?,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// All lines of a session, ordered by index.
    pub fn session_lines(&self, session_id: &str) -> Result<Vec<StoredLine>, StorageError> {
        let sql = format!(
            "SELECT {} FROM lines WHERE session_id = ?1 ORDER BY line_index",
            LINE_COLUMNS
        );
        self.query_lines(&sql, session_id)
    }

    /// Lines from any session that reach `fen`, ignoring move counters.
    pub fn lines_at_position(&self, fen: &str) -> Result<Vec<StoredLine>, StorageError> {
        let sql = format!(
            "SELECT {} FROM lines WHERE normalized_position = ?1
             ORDER BY session_id, line_index",
            LINE_COLUMNS
        );
        self.query_lines(&sql, &normalize_fen(fen))
    }

    fn query_lines(&self, sql: &str, arg: &str) -> Result<Vec<StoredLine>, StorageError> {
        let mut stmt = self.conn.prepare(sql)?;
        let raw = stmt
            .query_map([arg], RawLine::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        raw.into_iter().map(RawLine::decode).collect()
    }

    /// Stored sessions, newest first.
    pub fn sessions(&self) -> Result<Vec<SessionRow>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT s.id, s.root_fen, s.created_at, COUNT(l.line_index)
             FROM sessions s LEFT JOIN lines l ON l.session_id = s.id
             GROUP BY s.id
             ORDER BY s.created_at DESC, s.id",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(SessionRow {
                    id: row.get(0)?,
                    root_fen: row.get(1)?,
                    created_at: row.get(2)?,
                    line_count: row.get::<_, i64>(3)? as usize,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// The stored configuration of a session.
    pub fn session_config(&self, session_id: &str) -> Result<Option<FishConfig>, StorageError> {
        let mut stmt = self
            .conn
            .prepare("SELECT config FROM sessions WHERE id = ?1")?;
        let mut rows = stmt.query([session_id])?;
        match rows.next()? {
            Some(row) => {
                let json: String = row.get(0)?;
                Ok(Some(serde_json::from_str(&json)?))
            }
            None => Ok(None),
        }
    }
}

impl LineSink for Storage {
    fn record_line(
        &mut self,
        session_id: &str,
        root_fen: &str,
        config: &FishConfig,
        line: &FishLine,
        san: &str,
    ) -> Result<(), StorageError> {
        self.ensure_session(session_id, root_fen, config)?;
        self.save_line(session_id, line, san)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board;
    use crate::config::START_FEN;

    fn finished_line(index: usize, moves: &[&str], status: LineStatus) -> FishLine {
        let mut line = FishLine::root(index, START_FEN, true);
        let mut pos = board::parse_fen(START_FEN).unwrap();
        for mv in moves {
            let played = board::play(&pos, mv).unwrap();
            line.node_id = if line.node_id.is_empty() {
                played.uci.clone()
            } else {
                format!("{}_{}", line.node_id, played.uci)
            };
            line.pcns.push(played.pcn.clone());
            line.position = played.fen();
            pos = played.position;
        }
        line.score = Some(Evaluation::Centipawns(-12));
        line.best5_replies = vec![SimpleMove::new("g8f6", Evaluation::Centipawns(15))];
        line.status = status;
        line
    }

    #[test]
    fn test_record_and_read_session() {
        let mut storage = Storage::open(":memory:").unwrap();
        let config = FishConfig::default();
        let line = finished_line(0, &["g1f3"], LineStatus::Expanded);
        storage
            .record_line("s1", START_FEN, &config, &line, "1. Nf3")
            .unwrap();

        let lines = storage.session_lines("s1").unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].san, "1. Nf3");
        assert_eq!(lines[0].line, line);
        assert_eq!(storage.session_config("s1").unwrap(), Some(config));
        assert_eq!(storage.session_config("missing").unwrap(), None);
    }

    #[test]
    fn test_record_line_upserts() {
        let mut storage = Storage::open(":memory:").unwrap();
        let config = FishConfig::default();
        let mut line = finished_line(2, &["e2e4"], LineStatus::Full);
        storage.record_line("s1", START_FEN, &config, &line, "1. e4").unwrap();
        line.score = Some(Evaluation::Mate(3));
        storage.record_line("s1", START_FEN, &config, &line, "1. e4").unwrap();

        let lines = storage.session_lines("s1").unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].line.score, Some(Evaluation::Mate(3)));
    }

    #[test]
    fn test_lines_at_position_ignores_move_counters() {
        let mut storage = Storage::open(":memory:").unwrap();
        let config = FishConfig::default();
        let a = finished_line(0, &["g1f3", "g8f6", "b1c3", "b8c6"], LineStatus::Expanded);
        let b = finished_line(
            1,
            &["b1c3", "b8c6", "g1f3", "g8f6"],
            LineStatus::Transposition {
                target: a.node_id.clone(),
            },
        );
        let other = finished_line(2, &["e2e4"], LineStatus::Full);
        for line in [&a, &b, &other] {
            storage.record_line("s1", START_FEN, &config, line, "").unwrap();
        }

        let query = a.position.replace(" 4 3", " 0 9");
        let found = storage.lines_at_position(&query).unwrap();
        let indexes: Vec<usize> = found.iter().map(|s| s.line.line_index).collect();
        assert_eq!(indexes, vec![0, 1]);
        assert_eq!(found[1].line.transposition_target(), Some(a.node_id.as_str()));
    }

    #[test]
    fn test_sessions_count_lines() {
        let mut storage = Storage::open(":memory:").unwrap();
        let config = FishConfig::default();
        storage
            .record_line("s1", START_FEN, &config, &finished_line(0, &["e2e4"], LineStatus::Full), "")
            .unwrap();
        storage
            .record_line("s1", START_FEN, &config, &finished_line(1, &["d2d4"], LineStatus::Full), "")
            .unwrap();
        storage.ensure_session("s2", START_FEN, &config).unwrap();

        let sessions = storage.sessions().unwrap();
        assert_eq!(sessions.len(), 2);
        let s1 = sessions.iter().find(|s| s.id == "s1").unwrap();
        assert_eq!(s1.line_count, 2);
        let s2 = sessions.iter().find(|s| s.id == "s2").unwrap();
        assert_eq!(s2.line_count, 0);
    }

    #[test]
    fn test_open_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/fisher.db");
        Storage::open(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_null_sink_accepts_everything() {
        let line = finished_line(0, &["e2e4"], LineStatus::Full);
        assert!(NullSink
            .record_line("s", START_FEN, &FishConfig::default(), &line, "")
            .is_ok());
    }
}
