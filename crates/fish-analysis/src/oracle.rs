//! The move-analysis oracle contract.
//!
//! The line fisher never talks to an engine directly. It asks an [`Oracle`]
//! three kinds of question and runs every answer through
//! [`crate::ranking`] before acting on it.

use crate::{Evaluation, PvMove};
use async_trait::async_trait;
use thiserror::Error;

/// Number of alternatives requested alongside a best-move query.
pub const ALTERNATIVE_COUNT: usize = 5;

/// Errors that can occur when querying an oracle.
#[derive(Error, Debug)]
pub enum OracleError {
    /// Failed to spawn the engine process or talk to it.
    #[error("Engine I/O failed: {0}")]
    Io(#[from] std::io::Error),
    /// Engine executable was not found at the specified path.
    #[error("Engine not found at path: {0}")]
    NotFound(String),
    /// Engine failed to initialize properly (UCI handshake failed).
    #[error("Engine initialization failed")]
    InitFailed,
    /// Engine returned an invalid or unexpected response.
    #[error("Invalid engine response: {0}")]
    InvalidResponse(String),
    /// The position has no legal move to report.
    #[error("No legal moves in position: {0}")]
    NoMoves(String),
}

/// Answer to a best-move query.
#[derive(Debug, Clone, PartialEq)]
pub struct BestMove {
    /// The chosen move in UCI notation.
    pub mv: String,
    /// White-relative score of the chosen move.
    pub score: Evaluation,
    /// Raw, unranked analysis of the other candidates (including the chosen
    /// move itself).
    pub alternatives: Vec<PvMove>,
}

/// A source of chess move analysis.
///
/// Positions are passed as FEN strings and moves as UCI strings. Every call
/// may take a long time; callers issue one call at a time and only consume
/// the final settled result.
#[async_trait]
pub trait Oracle: Send {
    /// Score one specific move without searching for alternatives.
    async fn evaluate(&mut self, fen: &str, mv: &str) -> Result<Evaluation, OracleError>;

    /// The single best move with its score and the runner-up candidates.
    async fn best_move(&mut self, fen: &str) -> Result<BestMove, OracleError>;

    /// Up to `n` candidate moves. The list is not ranked.
    async fn top_moves(&mut self, fen: &str, n: usize) -> Result<Vec<PvMove>, OracleError>;
}

/// Side to move according to the second FEN field.
pub fn white_to_move(fen: &str) -> bool {
    fen.split_whitespace().nth(1) != Some("b")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_to_move_from_fen() {
        assert!(white_to_move(
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
        ));
        assert!(!white_to_move(
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"
        ));
    }

    #[test]
    fn oracle_error_display() {
        let not_found = OracleError::NotFound("/path/to/engine".to_string());
        assert!(not_found.to_string().contains("/path/to/engine"));

        assert_eq!(
            OracleError::InitFailed.to_string(),
            "Engine initialization failed"
        );

        let invalid = OracleError::InvalidResponse("bad response".to_string());
        assert!(invalid.to_string().contains("bad response"));
    }
}
