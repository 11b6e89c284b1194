//! The line fisher loop.
//!
//! A session starts from one line at the root and grows a tree of lines by
//! alternating two kinds of ply:
//!
//! - **initiator**: one move, either predefined in the config (scored with
//!   `evaluate`) or the oracle's best move (with ranked alternatives);
//! - **responder**: the oracle's top `N` replies, each becoming a new line.
//!
//! Lines are processed FIFO, one oracle call at a time. A line ends when
//! its initiator ply transposes into a known position, mates or stalemates,
//! or reaches the depth budget. An expanded line ends once its replies have
//! been turned into children.

use crate::board::{self, BoardError, Played};
use crate::config::{ConfigError, FishConfig};
use crate::export::{self, ExportError};
use crate::line::{FishLine, LineStatus, Step};
use crate::progress::{ProgressSink, ProgressSnapshot};
use crate::state::{FishState, FishingFlag};
use crate::storage::LineSink;
use fish_analysis::oracle::white_to_move;
use fish_analysis::ranking::{deepest_depth, sorted_analysis_moves_to_simple_moves};
use fish_analysis::{Evaluation, Oracle, OracleError, PvMove, SimpleMove, ALTERNATIVE_COUNT};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FishError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Oracle failed: {0}")]
    Oracle(#[from] OracleError),
    #[error(transparent)]
    Board(#[from] BoardError),
}

/// How a call to [`LineFisher::run`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The work queue is empty.
    Finished,
    /// The fishing flag was cleared. WIP lines can be resumed.
    Cancelled,
}

/// Oracle and board results for one line, computed before anything is
/// mutated.
enum Plan {
    Initiator {
        played: Played,
        score: Evaluation,
        alts: Vec<SimpleMove>,
    },
    Responder {
        replies: Vec<SimpleMove>,
        children: Vec<Played>,
    },
}

fn rank(raw: &[PvMove], count: usize, fen: &str) -> Vec<SimpleMove> {
    sorted_analysis_moves_to_simple_moves(raw, count, deepest_depth(raw), white_to_move(fen))
}

pub struct LineFisher {
    state: FishState,
}

impl LineFisher {
    /// Validates `config`, captures the baseline at the root and seeds the
    /// work queue with line #0.
    ///
    /// # Errors
    ///
    /// A rejected config fails before any oracle call. Oracle and board
    /// errors during startup are returned as is.
    pub async fn start<O>(
        mut config: FishConfig,
        oracle: &mut O,
        sink: &mut dyn LineSink,
    ) -> Result<Self, FishError>
    where
        O: Oracle + ?Sized,
    {
        config.validate()?;
        let root = board::parse_fen(&config.root_fen)?;
        config.root_fen = board::to_fen(&root);

        let raw = oracle.top_moves(&config.root_fen, ALTERNATIVE_COUNT).await?;
        config.baseline_moves = rank(&raw, ALTERNATIVE_COUNT, &config.root_fen);
        config.baseline_score = config.baseline_moves.first().map(|m| m.score);

        let initiator_to_move = board::white_to_move(&root) == config.initiator_is_white;
        let mut fisher = Self {
            state: FishState::new(config),
        };
        tracing::info!(
            session = %fisher.state.session_id,
            root = %fisher.state.config.root_fen,
            baseline = ?fisher.state.config.baseline_score,
            "Fishing session started"
        );

        let index = fisher.state.next_index();
        let line = FishLine::root(index, &fisher.state.config.root_fen, initiator_to_move);
        if initiator_to_move {
            let plan = fisher.plan_initiator(&line, oracle).await?;
            fisher.apply(line, plan, sink);
        } else {
            fisher.state.push_wip(line);
        }
        Ok(fisher)
    }

    /// Continues a session from a saved state.
    pub fn resume(state: FishState) -> Self {
        state.fishing_flag().resume();
        Self { state }
    }

    pub fn state(&self) -> &FishState {
        &self.state
    }

    pub fn into_state(self) -> FishState {
        self.state
    }

    /// Handle for stopping the loop from another task.
    pub fn fishing_flag(&self) -> FishingFlag {
        self.state.fishing_flag()
    }

    /// Exports every Done and WIP line, ordered by index.
    pub fn export(&self) -> Result<String, ExportError> {
        export::export_lines(self.state.lines())
    }

    /// Processes lines until the queue is empty or fishing is stopped.
    ///
    /// # Errors
    ///
    /// Oracle and board errors stop the loop. The line being processed is
    /// put back at the head of the queue, so calling `run` again retries it.
    pub async fn run<O>(
        &mut self,
        oracle: &mut O,
        sink: &mut dyn LineSink,
        progress: &mut dyn ProgressSink,
    ) -> Result<RunOutcome, FishError>
    where
        O: Oracle + ?Sized,
    {
        loop {
            // An exhausted queue counts as finished even when stopped.
            if !self.state.is_fishing() && !self.state.wip.is_empty() {
                tracing::info!(wip = self.state.wip.len(), "Fishing cancelled");
                return Ok(RunOutcome::Cancelled);
            }
            let Some(line) = self.state.pop_wip() else {
                tracing::info!(
                    done = self.state.done.len(),
                    transpositions = self.state.transposition_count(),
                    "Fishing finished"
                );
                return Ok(RunOutcome::Finished);
            };
            let index = line.line_index;
            let fen = line.position.clone();
            self.step(line, oracle, sink).await?;
            self.state.analyzed += 1;

            #[cfg(debug_assertions)]
            self.state.assert_consistent();

            let snapshot = ProgressSnapshot::from_state(&self.state, Some((index, fen.as_str())));
            progress.on_progress(&snapshot.status(), &snapshot);
        }
    }

    async fn step<O>(
        &mut self,
        line: FishLine,
        oracle: &mut O,
        sink: &mut dyn LineSink,
    ) -> Result<(), FishError>
    where
        O: Oracle + ?Sized,
    {
        let plan = match line.next_step() {
            Some(Step::Initiator) => self.plan_initiator(&line, oracle).await,
            Some(Step::Responder) => self.plan_responder(&line, oracle).await,
            None => panic!("line {} is done but was queued", line.line_index),
        };
        match plan {
            Ok(plan) => {
                self.apply(line, plan, sink);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(line = line.line_index, error = %e, "Step failed, line returned to WIP");
                self.state.return_to_wip(line);
                Err(e)
            }
        }
    }

    async fn plan_initiator<O>(&self, line: &FishLine, oracle: &mut O) -> Result<Plan, FishError>
    where
        O: Oracle + ?Sized,
    {
        let pos = board::parse_fen(&line.position)?;
        match self.state.config.initiator_move(line.initiator_plies) {
            Some(mv) => {
                let played = board::play(&pos, mv)?;
                let score = oracle.evaluate(&line.position, &played.uci).await?;
                tracing::debug!(line = line.line_index, mv = %played.uci, %score, "Predefined move");
                Ok(Plan::Initiator {
                    played,
                    score,
                    alts: Vec::new(),
                })
            }
            None => {
                let best = oracle.best_move(&line.position).await?;
                let played = board::play(&pos, &best.mv)?;
                let alts = rank(&best.alternatives, ALTERNATIVE_COUNT, &line.position);
                tracing::debug!(line = line.line_index, mv = %played.uci, score = %best.score, "Best move");
                Ok(Plan::Initiator {
                    played,
                    score: best.score,
                    alts,
                })
            }
        }
    }

    async fn plan_responder<O>(&self, line: &FishLine, oracle: &mut O) -> Result<Plan, FishError>
    where
        O: Oracle + ?Sized,
    {
        let pos = board::parse_fen(&line.position)?;
        let count = self.state.config.responder_count(line.responder_plies);
        let raw = oracle.top_moves(&line.position, count).await?;
        let replies = rank(&raw, count, &line.position);
        let children = replies
            .iter()
            .map(|reply| board::play(&pos, &reply.mv))
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(line = line.line_index, count, replies = replies.len(), "Responder replies");
        Ok(Plan::Responder { replies, children })
    }

    fn apply(&mut self, line: FishLine, plan: Plan, sink: &mut dyn LineSink) {
        match plan {
            Plan::Initiator {
                played,
                score,
                alts,
            } => self.apply_initiator(line, played, score, alts, sink),
            Plan::Responder { replies, children } => {
                self.apply_responder(line, replies, children, sink)
            }
        }
    }

    fn apply_initiator(
        &mut self,
        mut line: FishLine,
        played: Played,
        score: Evaluation,
        alts: Vec<SimpleMove>,
        sink: &mut dyn LineSink,
    ) {
        line.push_initiator(&played, score, alts);

        if let Some(end) = played.game_end() {
            line.finish(end.into());
        } else if let Some(target) = self
            .state
            .transpositions
            .check_and_record(&line.position, &line.node_id)
        {
            tracing::debug!(line = line.line_index, %target, "Transposition");
            line.finish(LineStatus::Transposition { target });
        } else if line.ply_pairs() >= self.state.config.max_depth {
            line.finish(LineStatus::Full);
        } else {
            self.state.push_wip(line);
            return;
        }
        self.finish_line(line, sink);
    }

    fn apply_responder(
        &mut self,
        mut line: FishLine,
        replies: Vec<SimpleMove>,
        children: Vec<Played>,
        sink: &mut dyn LineSink,
    ) {
        let mut new_lines = Vec::with_capacity(children.len());
        for (reply, played) in replies.iter().zip(&children) {
            let index = self.state.next_index();
            new_lines.push((line.child(index, played, reply.score), played.game_end()));
        }

        line.expand(replies);
        self.finish_line(line, sink);

        for (mut child, end) in new_lines {
            match end {
                Some(end) => {
                    child.finish(end.into());
                    self.finish_line(child, sink);
                }
                None => self.state.push_wip(child),
            }
        }
    }

    /// Persists a done line and moves it to Done. Storage failures are
    /// logged and do not stop the session.
    fn finish_line(&mut self, line: FishLine, sink: &mut dyn LineSink) {
        let san = line
            .san_game(&self.state.config.root_fen)
            .unwrap_or_else(|e| {
                tracing::warn!(line = line.line_index, error = %e, "Could not render SAN");
                String::new()
            });
        if let Err(e) = sink.record_line(
            &self.state.session_id,
            &self.state.config.root_fen,
            &self.state.config,
            &line,
            &san,
        ) {
            tracing::warn!(line = line.line_index, error = %e, "Failed to persist line");
        }
        tracing::debug!(line = line.line_index, status = ?line.status, %san, "Line done");
        self.state.push_done(line);
    }
}
