//! UCI engine wrapper implementing [`Oracle`].

use crate::oracle::{white_to_move, BestMove, Oracle, OracleError, ALTERNATIVE_COUNT};
use crate::{Evaluation, PvMove};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use uci::{EngineInfo, EngineMessage, GoOptions, GuiCommand};

/// Maximum number of lines to read before giving up on a handshake response.
pub const MAX_UCI_LINES: usize = 1000;

/// Search settings passed through to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    /// Fixed search depth for every query.
    pub depth: u32,
    /// Value for the engine's `Threads` option.
    pub threads: u32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            depth: 18,
            threads: 1,
        }
    }
}

/// A finished search: the engine's `bestmove` and every settled pv line it
/// printed on the way.
#[derive(Debug)]
struct Search {
    best_move: Option<String>,
    moves: Vec<PvMove>,
}

/// Oracle backed by a UCI engine process such as Stockfish.
///
/// The process is started once and reused for every query. Queries run one
/// at a time; each one sets `MultiPV` (only when it changes), sends the
/// position, and searches to the configured depth.
pub struct UciOracle {
    /// The engine process handle. Killed when the oracle is dropped.
    process: Child,
    /// Writer for sending commands to the engine.
    stdin: ChildStdin,
    /// Line reader over the engine's output.
    stdout: Lines<BufReader<ChildStdout>>,
    /// The engine's name (reported via UCI id).
    name: String,
    settings: EngineSettings,
    /// MultiPV value currently set on the engine.
    multipv: usize,
}

impl UciOracle {
    /// Spawns the engine and performs the UCI handshake.
    ///
    /// # Errors
    ///
    /// - `OracleError::NotFound` if the executable does not exist
    /// - `OracleError::Io` if the process fails to start
    /// - `OracleError::InitFailed` if the handshake does not complete
    pub async fn spawn(engine_path: &str, settings: EngineSettings) -> Result<Self, OracleError> {
        let mut process = Command::new(engine_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => OracleError::NotFound(engine_path.to_string()),
                _ => OracleError::Io(e),
            })?;

        let stdin = process.stdin.take().ok_or(OracleError::InitFailed)?;
        let stdout = process.stdout.take().ok_or(OracleError::InitFailed)?;

        let mut oracle = Self {
            process,
            stdin,
            stdout: BufReader::new(stdout).lines(),
            name: String::new(),
            settings,
            multipv: 1,
        };
        oracle.init().await?;

        tracing::info!(
            engine = %oracle.name,
            depth = settings.depth,
            threads = settings.threads,
            "Engine ready"
        );
        Ok(oracle)
    }

    /// Returns the engine's name as reported via UCI protocol.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn settings(&self) -> EngineSettings {
        self.settings
    }

    /// Sends `quit` and waits for the process to exit.
    pub async fn quit(mut self) -> Result<(), OracleError> {
        self.send(&GuiCommand::Quit).await?;
        self.process.wait().await?;
        Ok(())
    }

    async fn init(&mut self) -> Result<(), OracleError> {
        self.send(&GuiCommand::Uci).await?;

        let mut name = String::new();
        let mut lines_read = 0;
        loop {
            if lines_read > MAX_UCI_LINES {
                return Err(OracleError::InitFailed);
            }
            lines_read += 1;
            match EngineMessage::parse(&self.read_line().await?) {
                Some(EngineMessage::Id { name: Some(n), .. }) => name = n,
                Some(EngineMessage::UciOk) => break,
                _ => {}
            }
        }

        self.name = if name.is_empty() {
            "Unknown Engine".to_string()
        } else {
            name
        };

        self.send(&GuiCommand::set_option("Threads", self.settings.threads))
            .await?;
        self.wait_ready().await
    }

    async fn wait_ready(&mut self) -> Result<(), OracleError> {
        self.send(&GuiCommand::IsReady).await?;
        let mut lines_read = 0;
        loop {
            if lines_read > MAX_UCI_LINES {
                return Err(OracleError::InitFailed);
            }
            lines_read += 1;
            if EngineMessage::parse(&self.read_line().await?) == Some(EngineMessage::ReadyOk) {
                return Ok(());
            }
        }
    }

    async fn set_multipv(&mut self, n: usize) -> Result<(), OracleError> {
        if n != self.multipv {
            self.send(&GuiCommand::set_option("MultiPV", n)).await?;
            self.multipv = n;
        }
        Ok(())
    }

    async fn search(
        &mut self,
        fen: &str,
        multipv: usize,
        searchmoves: Vec<String>,
    ) -> Result<Search, OracleError> {
        self.set_multipv(multipv.max(1)).await?;
        self.send(&GuiCommand::position_fen(fen)).await?;
        let go = GoOptions::depth(self.settings.depth).with_searchmoves(searchmoves);
        self.send(&GuiCommand::Go(go)).await?;

        let white = white_to_move(fen);
        let mut moves = Vec::new();
        loop {
            let line = self.read_line().await?;
            tracing::trace!(engine = %self.name, "{}", line);
            match EngineMessage::parse(&line) {
                Some(EngineMessage::Info(info)) => {
                    if let Some(m) = pv_move_from_info(&info, white) {
                        moves.push(m);
                    }
                }
                Some(EngineMessage::BestMove { mv, .. }) => {
                    tracing::debug!(fen, multipv, entries = moves.len(), best = ?mv, "Search finished");
                    return Ok(Search {
                        best_move: mv,
                        moves,
                    });
                }
                _ => {}
            }
        }
    }

    async fn send(&mut self, cmd: &GuiCommand) -> Result<(), OracleError> {
        let line = format!("{}\n", cmd.to_uci());
        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.flush().await?;
        Ok(())
    }

    async fn read_line(&mut self) -> Result<String, OracleError> {
        match self.stdout.next_line().await? {
            Some(line) => Ok(line.trim().to_string()),
            None => Err(OracleError::InvalidResponse(
                "Engine closed unexpectedly".to_string(),
            )),
        }
    }
}

/// Converts a settled `info` line into a white-relative analysis entry.
fn pv_move_from_info(info: &EngineInfo, white_to_move: bool) -> Option<PvMove> {
    if !info.is_settled_pv() {
        return None;
    }
    let depth = info.depth?;
    let score = Evaluation::from_uci_score(info.score?, white_to_move);
    Some(PvMove {
        mv: info.pv.first()?.clone(),
        score,
        depth,
        multipv: info.multipv.unwrap_or(1),
        pv: info.pv.clone(),
    })
}

/// Deepest entry reported for `mv`, later entries winning ties.
fn deepest_entry<'a>(moves: &'a [PvMove], mv: &str) -> Option<&'a PvMove> {
    moves
        .iter()
        .filter(|m| m.mv == mv)
        .fold(None, |best: Option<&PvMove>, m| match best {
            Some(b) if b.depth > m.depth => Some(b),
            _ => Some(m),
        })
}

#[async_trait]
impl Oracle for UciOracle {
    async fn evaluate(&mut self, fen: &str, mv: &str) -> Result<Evaluation, OracleError> {
        let search = self.search(fen, 1, vec![mv.to_string()]).await?;
        match deepest_entry(&search.moves, mv) {
            Some(entry) => Ok(entry.score),
            None if search.best_move.is_none() => Err(OracleError::NoMoves(fen.to_string())),
            None => Err(OracleError::InvalidResponse(format!(
                "No score reported for {}",
                mv
            ))),
        }
    }

    async fn best_move(&mut self, fen: &str) -> Result<BestMove, OracleError> {
        let search = self.search(fen, ALTERNATIVE_COUNT, Vec::new()).await?;
        let mv = search
            .best_move
            .ok_or_else(|| OracleError::NoMoves(fen.to_string()))?;
        let score = deepest_entry(&search.moves, &mv)
            .map(|m| m.score)
            .ok_or_else(|| OracleError::InvalidResponse(format!("No score reported for {}", mv)))?;
        Ok(BestMove {
            mv,
            score,
            alternatives: search.moves,
        })
    }

    async fn top_moves(&mut self, fen: &str, n: usize) -> Result<Vec<PvMove>, OracleError> {
        Ok(self.search(fen, n, Vec::new()).await?.moves)
    }
}
