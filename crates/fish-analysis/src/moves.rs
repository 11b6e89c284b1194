//! Move/score pairs produced by the oracle and consumed by the line fisher.

use crate::Evaluation;
use serde::{Deserialize, Serialize};

/// One raw analysis entry as reported by the engine.
///
/// A single search produces many of these: one per principal variation per
/// completed depth. [`crate::ranking`] reduces them to [`SimpleMove`]s.
#[derive(Debug, Clone, PartialEq)]
pub struct PvMove {
    /// First move of the principal variation, in UCI notation.
    pub mv: String,
    /// White-relative score of the variation.
    pub score: Evaluation,
    /// Depth the variation was searched to.
    pub depth: u32,
    /// 1-based MultiPV slot the engine reported it in.
    pub multipv: u32,
    /// The full principal variation.
    pub pv: Vec<String>,
}

impl PvMove {
    pub fn new(mv: impl Into<String>, score: Evaluation, depth: u32) -> Self {
        let mv = mv.into();
        Self {
            pv: vec![mv.clone()],
            mv,
            score,
            depth,
            multipv: 1,
        }
    }
}

/// A ranked move with its score, the unit stored on lines and exported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleMove {
    /// Move in UCI notation.
    #[serde(rename = "move")]
    pub mv: String,
    /// White-relative score.
    pub score: Evaluation,
}

impl SimpleMove {
    pub fn new(mv: impl Into<String>, score: Evaluation) -> Self {
        Self {
            mv: mv.into(),
            score,
        }
    }
}

impl From<PvMove> for SimpleMove {
    fn from(m: PvMove) -> Self {
        Self {
            mv: m.mv,
            score: m.score,
        }
    }
}
