//! Move analysis for opening line exploration.
//!
//! This crate turns a UCI engine into a move-analysis oracle and ranks what
//! it reports.
//!
//! # Overview
//!
//! - [`Evaluation`] - White-relative position evaluation (centipawn or mate score)
//! - [`PvMove`] / [`SimpleMove`] - Raw analysis entries and ranked move/score pairs
//! - [`ranking`] - The comparator and depth filter that decide move order
//! - [`Oracle`] - The async contract the line fisher queries
//! - [`UciOracle`] - Oracle backed by an engine process like Stockfish
//!
//! # Example
//!
//! ```ignore
//! use fish_analysis::{ranking, EngineSettings, Oracle, UciOracle};
//!
//! let mut oracle = UciOracle::spawn("stockfish", EngineSettings::default()).await?;
//! let raw = oracle.top_moves(fen, 3).await?;
//! let ranked = ranking::sorted_analysis_moves_to_simple_moves(
//!     &raw, 3, ranking::deepest_depth(&raw), true,
//! );
//! ```

pub mod engine;
pub mod evaluation;
pub mod moves;
pub mod oracle;
pub mod ranking;

pub use engine::{EngineSettings, UciOracle};
pub use evaluation::Evaluation;
pub use moves::{PvMove, SimpleMove};
pub use oracle::{BestMove, Oracle, OracleError, ALTERNATIVE_COUNT};
