//! Session state: the work queue, finished lines, and the cancellation flag.

use crate::config::FishConfig;
use crate::line::FishLine;
use crate::transposition::TranspositionTracker;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Errors from writing or reading a state snapshot.
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid snapshot: {0}")]
    Json(#[from] serde_json::Error),
}

/// Shared cooperative cancellation flag.
///
/// Clones share the same flag. The loop polls it once per iteration, so a
/// stop request lets the current oracle call finish.
#[derive(Debug, Clone)]
pub struct FishingFlag(Arc<AtomicBool>);

impl Default for FishingFlag {
    fn default() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }
}

impl FishingFlag {
    pub fn is_fishing(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn stop(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// One exploration session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FishState {
    pub session_id: String,
    pub config: FishConfig,
    /// Next line index to hand out.
    pub line_counter: usize,
    pub wip: VecDeque<FishLine>,
    pub done: Vec<FishLine>,
    pub transpositions: TranspositionTracker,
    /// Loop iterations completed.
    pub analyzed: usize,
    #[serde(skip)]
    fishing: FishingFlag,
}

impl FishState {
    pub fn new(config: FishConfig) -> Self {
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            config,
            line_counter: 0,
            wip: VecDeque::new(),
            done: Vec::new(),
            transpositions: TranspositionTracker::new(),
            analyzed: 0,
            fishing: FishingFlag::default(),
        }
    }

    pub fn is_fishing(&self) -> bool {
        self.fishing.is_fishing()
    }

    pub fn fishing_flag(&self) -> FishingFlag {
        self.fishing.clone()
    }

    /// Hands out the next line index.
    pub fn next_index(&mut self) -> usize {
        let idx = self.line_counter;
        self.line_counter += 1;
        idx
    }

    pub fn pop_wip(&mut self) -> Option<FishLine> {
        self.wip.pop_front()
    }

    pub fn push_wip(&mut self, line: FishLine) {
        self.wip.push_back(line);
    }

    /// Puts a line popped for processing back at the head of the queue.
    pub fn return_to_wip(&mut self, line: FishLine) {
        self.wip.push_front(line);
    }

    /// # Panics
    ///
    /// If the line is not done.
    pub fn push_done(&mut self, line: FishLine) {
        assert!(
            line.is_done(),
            "line {} moved to done while pending",
            line.line_index
        );
        self.done.push(line);
    }

    /// Done and WIP lines together, ordered by index.
    pub fn lines(&self) -> Vec<&FishLine> {
        let mut lines: Vec<&FishLine> = self.done.iter().chain(self.wip.iter()).collect();
        lines.sort_by_key(|l| l.line_index);
        lines
    }

    pub fn transposition_count(&self) -> usize {
        self.transpositions.count()
    }

    /// Checks the WIP/Done partition.
    ///
    /// # Panics
    ///
    /// If an index appears twice, a WIP line is done, a Done line is
    /// pending, or an index was never handed out.
    pub fn assert_consistent(&self) {
        let mut seen = HashSet::new();
        for line in &self.wip {
            assert!(
                !line.is_done(),
                "line {} is done but still in WIP",
                line.line_index
            );
            assert!(
                seen.insert(line.line_index),
                "line {} appears twice",
                line.line_index
            );
        }
        for line in &self.done {
            assert!(line.is_done(), "line {} in done is pending", line.line_index);
            assert!(
                seen.insert(line.line_index),
                "line {} is in both WIP and done",
                line.line_index
            );
        }
        if let Some(max) = seen.iter().max() {
            assert!(
                *max < self.line_counter,
                "line {} was never handed out",
                max
            );
        }
    }

    /// Writes the state as JSON.
    pub fn save(&self, path: &Path) -> Result<(), SnapshotError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Reads a state written by [`Self::save`]. The loaded state is fishing.
    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}
