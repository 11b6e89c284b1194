//! Transposition detection.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Strips the halfmove clock and fullmove number from a FEN, keeping board,
/// side to move, castling rights and en passant square.
pub fn normalize_fen(fen: &str) -> String {
    fen.split_whitespace().take(4).collect::<Vec<_>>().join(" ")
}

/// Remembers which line first reached each normalized position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranspositionTracker {
    first_seen: HashMap<String, String>,
    hits: usize,
}

impl TranspositionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a position (normalized or not) has been recorded.
    pub fn has(&self, fen: &str) -> bool {
        self.first_seen.contains_key(&normalize_fen(fen))
    }

    /// Records `node_id` as the first line reaching `fen`. Later records of
    /// the same position are ignored.
    pub fn record(&mut self, fen: &str, node_id: &str) {
        self.first_seen
            .entry(normalize_fen(fen))
            .or_insert_with(|| node_id.to_string());
    }

    /// Node id of the line that first reached `fen`.
    pub fn first_seen(&self, fen: &str) -> Option<&str> {
        self.first_seen.get(&normalize_fen(fen)).map(String::as_str)
    }

    /// Returns the earlier line's node id if `fen` was already reached,
    /// otherwise records it for `node_id` and returns `None`.
    pub fn check_and_record(&mut self, fen: &str, node_id: &str) -> Option<String> {
        let key = normalize_fen(fen);
        if let Some(target) = self.first_seen.get(&key) {
            self.hits += 1;
            return Some(target.clone());
        }
        self.first_seen.insert(key, node_id.to_string());
        None
    }

    /// Number of transpositions detected so far.
    pub fn count(&self) -> usize {
        self.hits
    }

    /// Number of distinct positions recorded.
    pub fn positions(&self) -> usize {
        self.first_seen.len()
    }
}
