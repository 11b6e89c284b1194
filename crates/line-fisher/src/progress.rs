//! Progress reporting.

use crate::config::FishConfig;
use crate::state::FishState;
use serde::Serialize;

/// UI-agnostic view of a running session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressSnapshot {
    pub analyzed: usize,
    pub total_wip: usize,
    pub total_done: usize,
    /// Position of the line processed in the last iteration.
    pub current_fen: Option<String>,
    pub current_line: Option<usize>,
    pub transpositions: usize,
}

impl ProgressSnapshot {
    pub fn from_state(state: &FishState, current: Option<(usize, &str)>) -> Self {
        Self {
            analyzed: state.analyzed,
            total_wip: state.wip.len(),
            total_done: state.done.len(),
            current_fen: current.map(|(_, fen)| fen.to_string()),
            current_line: current.map(|(idx, _)| idx),
            transpositions: state.transposition_count(),
        }
    }

    /// One-line human readable status.
    pub fn status(&self) -> String {
        let mut status = format!(
            "Analyzed {} | WIP {} | Done {} | Transpositions {}",
            self.analyzed, self.total_wip, self.total_done, self.transpositions
        );
        if let Some(idx) = self.current_line {
            status.push_str(&format!(" | Line #{}", idx));
        }
        status
    }
}

/// Receives a progress update after every loop iteration.
pub trait ProgressSink {
    fn on_progress(&mut self, status: &str, snapshot: &ProgressSnapshot);
}

impl<F> ProgressSink for F
where
    F: FnMut(&str, &ProgressSnapshot),
{
    fn on_progress(&mut self, status: &str, snapshot: &ProgressSnapshot) {
        self(status, snapshot)
    }
}

/// Writes progress to the log.
#[derive(Debug, Default)]
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn on_progress(&mut self, status: &str, snapshot: &ProgressSnapshot) {
        tracing::info!(
            fen = snapshot.current_fen.as_deref().unwrap_or(""),
            "{}",
            status
        );
    }
}

/// Describes a session configuration for display.
pub fn config_summary(config: &FishConfig) -> String {
    let side = if config.initiator_is_white {
        "white"
    } else {
        "black"
    };
    let predefined: Vec<&str> = config
        .initiator_moves
        .iter()
        .map(|m| if m.trim().is_empty() { "*" } else { m.trim() })
        .collect();
    let mut summary = format!(
        "Initiator {} | depth {} | replies {}",
        side, config.max_depth, config.default_responder_count
    );
    if !config.responder_move_counts.is_empty() {
        let counts: Vec<String> = config
            .responder_move_counts
            .iter()
            .map(|n| n.to_string())
            .collect();
        summary.push_str(&format!(" [{}]", counts.join(",")));
    }
    if !predefined.is_empty() {
        summary.push_str(&format!(" | moves {}", predefined.join(" ")));
    }
    if let Some(score) = config.baseline_score {
        summary.push_str(&format!(" | baseline {}", score));
    }
    summary
}
