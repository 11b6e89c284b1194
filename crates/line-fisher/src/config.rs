//! Configuration for fishing sessions.
//!
//! [`FishConfig`] describes one exploration session and is validated before
//! the first oracle call. [`FisherConfig`] wraps it with the engine and
//! database settings loaded from `fisher.toml`.

use crate::board;
use fish_analysis::{EngineSettings, Evaluation, SimpleMove};
use serde::{Deserialize, Serialize};
use shakmaty::Position;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The standard starting position.
pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Errors that can occur when loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse the configuration file as valid TOML.
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    /// The configuration parsed but describes an impossible session.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Parameters of one fishing session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FishConfig {
    /// Whether the initiator plays the white pieces.
    #[serde(default = "default_initiator_is_white")]
    pub initiator_is_white: bool,
    /// Predefined initiator moves, consumed one per initiator ply. Empty
    /// entries (and plies past the end) fall back to the oracle's best move.
    #[serde(default)]
    pub initiator_moves: Vec<String>,
    /// Branching factor per responder ply. Missing entries use
    /// `default_responder_count`.
    #[serde(default)]
    pub responder_move_counts: Vec<usize>,
    #[serde(default = "default_responder_count")]
    pub default_responder_count: usize,
    /// Number of ply pairs a line may reach before it is full.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Forwarded to the engine's `Threads` option.
    #[serde(default = "default_threads")]
    pub threads: u32,
    #[serde(default = "default_root_fen")]
    pub root_fen: String,
    /// Oracle score of the root position, filled in at startup.
    #[serde(default)]
    pub baseline_score: Option<Evaluation>,
    /// Oracle top moves at the root, filled in at startup.
    #[serde(default)]
    pub baseline_moves: Vec<SimpleMove>,
}

fn default_initiator_is_white() -> bool {
    true
}

fn default_responder_count() -> usize {
    3
}

fn default_max_depth() -> usize {
    4
}

fn default_threads() -> u32 {
    1
}

fn default_root_fen() -> String {
    START_FEN.to_string()
}

impl Default for FishConfig {
    fn default() -> Self {
        Self {
            initiator_is_white: default_initiator_is_white(),
            initiator_moves: Vec::new(),
            responder_move_counts: Vec::new(),
            default_responder_count: default_responder_count(),
            max_depth: default_max_depth(),
            threads: default_threads(),
            root_fen: default_root_fen(),
            baseline_score: None,
            baseline_moves: Vec::new(),
        }
    }
}

impl FishConfig {
    /// Rejects configurations the fisher cannot run.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for a zero depth budget, a zero
    /// branching factor, zero threads, an unparsable root FEN, or a root
    /// position without legal moves.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_depth == 0 {
            return Err(ConfigError::Invalid("max_depth must be at least 1".into()));
        }
        if self.default_responder_count == 0 {
            return Err(ConfigError::Invalid(
                "default_responder_count must be at least 1".into(),
            ));
        }
        if let Some(idx) = self.responder_move_counts.iter().position(|&n| n == 0) {
            return Err(ConfigError::Invalid(format!(
                "responder_move_counts[{}] must be at least 1",
                idx
            )));
        }
        if self.threads == 0 {
            return Err(ConfigError::Invalid("threads must be at least 1".into()));
        }

        let root = board::parse_fen(&self.root_fen)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if root.legal_moves().is_empty() {
            return Err(ConfigError::Invalid(format!(
                "root position has no legal moves: {}",
                self.root_fen
            )));
        }
        Ok(())
    }

    /// The predefined initiator move for the given ply-pair index, if any.
    pub fn initiator_move(&self, idx: usize) -> Option<&str> {
        self.initiator_moves
            .get(idx)
            .map(|m| m.trim())
            .filter(|m| !m.is_empty())
    }

    /// Branching factor for the responder ply at `depth_idx`.
    pub fn responder_count(&self, depth_idx: usize) -> usize {
        self.responder_move_counts
            .get(depth_idx)
            .copied()
            .unwrap_or(self.default_responder_count)
    }
}

/// Top-level configuration file.
///
/// Uses `fisher.toml` in the current directory by default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FisherConfig {
    /// Path to the UCI engine. Defaults to "stockfish" (assumes it's in PATH).
    #[serde(default = "default_engine_path")]
    pub engine_path: String,
    /// Fixed search depth for every oracle query.
    #[serde(default = "default_search_depth")]
    pub search_depth: u32,
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
    #[serde(default)]
    pub session: FishConfig,
}

fn default_engine_path() -> String {
    "stockfish".to_string()
}

fn default_search_depth() -> u32 {
    18
}

fn default_db_path() -> PathBuf {
    PathBuf::from("data/fisher.db")
}

impl Default for FisherConfig {
    fn default() -> Self {
        Self {
            engine_path: default_engine_path(),
            search_depth: default_search_depth(),
            db_path: default_db_path(),
            session: FishConfig::default(),
        }
    }
}

impl FisherConfig {
    /// Loads `fisher.toml` from the current directory, or the defaults if
    /// the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ReadError`] if the file exists but cannot be read,
    /// or [`ConfigError::ParseError`] if the file contains invalid TOML.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads the configuration from an explicit path. The file must exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn config_path() -> PathBuf {
        PathBuf::from("fisher.toml")
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            depth: self.search_depth,
            threads: self.session.threads,
        }
    }
}
