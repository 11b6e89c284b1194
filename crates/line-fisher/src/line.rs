//! A single explored line and its lifecycle.

use crate::board::{self, BoardError, GameEnd, Played};
use fish_analysis::{Evaluation, SimpleMove};
use serde::{Deserialize, Serialize};

/// Which kind of ply a pending line needs next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// One move: predefined or the oracle's best.
    Initiator,
    /// N-way branching on the oracle's top replies.
    Responder,
}

/// Where a line is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LineStatus {
    PendingInitiator,
    PendingResponder,
    /// The responder replies were turned into child lines.
    Expanded,
    /// The depth budget was reached.
    Full,
    /// The position was reached earlier by the line `target`.
    Transposition { target: String },
    Mate,
    Stalemate,
}

impl LineStatus {
    pub fn is_done(&self) -> bool {
        !matches!(
            self,
            LineStatus::PendingInitiator | LineStatus::PendingResponder
        )
    }
}

impl From<GameEnd> for LineStatus {
    fn from(end: GameEnd) -> Self {
        match end {
            GameEnd::Checkmate => LineStatus::Mate,
            GameEnd::Stalemate => LineStatus::Stalemate,
        }
    }
}

/// One line of the catalogue.
///
/// Mutators panic when called in the wrong state: a done line is never
/// touched again, and each ply type only applies to a line waiting for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FishLine {
    /// Assigned once from the session counter, never reused.
    pub line_index: usize,
    /// UCI moves joined with `_`. Empty while the line has no plies.
    pub node_id: String,
    /// Moves in piece coordinate notation.
    pub pcns: Vec<String>,
    /// FEN after the last move.
    pub position: String,
    /// White-relative score of the last move.
    pub score: Option<Evaluation>,
    /// Ranked responder candidates to the last move.
    pub best5_replies: Vec<SimpleMove>,
    /// Ranked alternatives at the last initiator ply.
    pub best5_alts: Vec<SimpleMove>,
    pub initiator_plies: usize,
    pub responder_plies: usize,
    pub status: LineStatus,
}

impl FishLine {
    /// The first line of a session, with no plies yet.
    pub fn root(line_index: usize, root_fen: &str, initiator_to_move: bool) -> Self {
        Self {
            line_index,
            node_id: String::new(),
            pcns: Vec::new(),
            position: root_fen.to_string(),
            score: None,
            best5_replies: Vec::new(),
            best5_alts: Vec::new(),
            initiator_plies: 0,
            responder_plies: 0,
            status: if initiator_to_move {
                LineStatus::PendingInitiator
            } else {
                LineStatus::PendingResponder
            },
        }
    }

    /// A new line continuing this one with a responder reply.
    pub fn child(&self, line_index: usize, reply: &Played, score: Evaluation) -> Self {
        let mut child = Self {
            line_index,
            node_id: self.node_id.clone(),
            pcns: self.pcns.clone(),
            position: self.position.clone(),
            score: Some(score),
            best5_replies: Vec::new(),
            best5_alts: self.best5_alts.clone(),
            initiator_plies: self.initiator_plies,
            responder_plies: self.responder_plies + 1,
            status: LineStatus::PendingInitiator,
        };
        child.append(reply);
        child
    }

    /// Appends an initiator ply.
    ///
    /// # Panics
    ///
    /// If the line is not waiting for an initiator ply.
    pub fn push_initiator(&mut self, played: &Played, score: Evaluation, alts: Vec<SimpleMove>) {
        assert_eq!(
            self.status,
            LineStatus::PendingInitiator,
            "line {} is not waiting for an initiator ply",
            self.line_index
        );
        self.append(played);
        self.score = Some(score);
        self.best5_alts = alts;
        self.initiator_plies += 1;
        self.status = LineStatus::PendingResponder;
    }

    /// Stores the ranked replies and marks the line expanded.
    ///
    /// # Panics
    ///
    /// If the line is not waiting for a responder ply.
    pub fn expand(&mut self, replies: Vec<SimpleMove>) {
        assert_eq!(
            self.status,
            LineStatus::PendingResponder,
            "line {} is not waiting for a responder ply",
            self.line_index
        );
        self.best5_replies = replies;
        self.status = LineStatus::Expanded;
    }

    /// Moves the line into a terminal state.
    ///
    /// # Panics
    ///
    /// If the line is already done, or `status` is not terminal.
    pub fn finish(&mut self, status: LineStatus) {
        assert!(!self.is_done(), "line {} is already done", self.line_index);
        assert!(status.is_done(), "{:?} is not a terminal status", status);
        self.status = status;
    }

    fn append(&mut self, played: &Played) {
        if !self.node_id.is_empty() {
            self.node_id.push('_');
        }
        self.node_id.push_str(&played.uci);
        self.pcns.push(played.pcn.clone());
        self.position = played.fen();
    }

    /// The ply type this line needs next, or `None` once it is done.
    pub fn next_step(&self) -> Option<Step> {
        match self.status {
            LineStatus::PendingInitiator => Some(Step::Initiator),
            LineStatus::PendingResponder => Some(Step::Responder),
            _ => None,
        }
    }

    /// Completed ply pairs, counted as responder plies placed.
    pub fn ply_pairs(&self) -> usize {
        self.responder_plies
    }

    pub fn is_done(&self) -> bool {
        self.status.is_done()
    }

    pub fn is_full(&self) -> bool {
        self.status == LineStatus::Full
    }

    pub fn is_mate(&self) -> bool {
        self.status == LineStatus::Mate
    }

    pub fn is_stalemate(&self) -> bool {
        self.status == LineStatus::Stalemate
    }

    pub fn is_transposition(&self) -> bool {
        matches!(self.status, LineStatus::Transposition { .. })
    }

    pub fn transposition_target(&self) -> Option<&str> {
        match &self.status {
            LineStatus::Transposition { target } => Some(target),
            _ => None,
        }
    }

    /// The line's moves in numbered SAN, replayed from `root_fen`.
    pub fn san_game(&self, root_fen: &str) -> Result<String, BoardError> {
        board::san_game(root_fen, &self.pcns)
    }
}
