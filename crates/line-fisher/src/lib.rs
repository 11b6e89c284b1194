//! Opening line explorer.
//!
//! This crate builds a catalogue of chess opening lines by repeatedly asking
//! a move-analysis [`Oracle`](fish_analysis::Oracle) what to play and
//! branching on its answers.
//!
//! # Overview
//!
//! - [`LineFisher`] - The loop: work queue, ply alternation, termination, cancellation
//! - [`FishConfig`] / [`FisherConfig`] - Session parameters and the `fisher.toml` file
//! - [`FishLine`] / [`FishState`] - Lines and the WIP/Done partition of a session
//! - [`TranspositionTracker`] - First line seen per normalized position
//! - [`export`] - Move-numbered text rows with JSON metadata
//! - [`Storage`] - SQLite catalogue of finished lines
//!
//! # Example
//!
//! ```ignore
//! use fish_analysis::{EngineSettings, UciOracle};
//! use line_fisher::{FishConfig, LineFisher, LogProgress, NullSink};
//!
//! let mut oracle = UciOracle::spawn("stockfish", EngineSettings::default()).await?;
//! let mut sink = NullSink;
//! let mut fisher = LineFisher::start(FishConfig::default(), &mut oracle, &mut sink).await?;
//! fisher.run(&mut oracle, &mut sink, &mut LogProgress).await?;
//! println!("{}", fisher.export()?);
//! ```

pub mod board;
pub mod config;
pub mod export;
pub mod fisher;
pub mod line;
pub mod progress;
pub mod state;
pub mod storage;
pub mod transposition;

pub use config::{ConfigError, FishConfig, FisherConfig, START_FEN};
pub use fisher::{FishError, LineFisher, RunOutcome};
pub use line::{FishLine, LineStatus, Step};
pub use progress::{LogProgress, ProgressSink, ProgressSnapshot};
pub use state::{FishState, FishingFlag, SnapshotError};
pub use storage::{LineSink, NullSink, Storage, StorageError};
pub use transposition::{normalize_fen, TranspositionTracker};
