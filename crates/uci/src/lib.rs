//! UCI (Universal Chess Interface) protocol library.
//!
//! This crate provides the GUI side of the UCI protocol: formatting the
//! commands sent to an analysis engine and parsing what the engine prints
//! back.
//!
//! # Commands sent to the engine
//!
//! - `uci` / `isready` - Handshake and synchronization
//! - `setoption name <name> value <value>` - Engine options (`Threads`, `MultiPV`)
//! - `position fen <fen> [moves <move>...]` - Set position
//! - `go [depth <d>] [searchmoves <move>...]` - Start search
//! - `quit`
//!
//! # Messages read from the engine
//!
//! - `id name <name>` / `id author <author>`
//! - `uciok` / `readyok`
//! - `info ...` - Search progress, one line per principal variation
//! - `bestmove <move> [ponder <move>]`

mod command;
mod info;

pub use command::{GoOptions, GuiCommand};
pub use info::{EngineInfo, Score, ScoreBound};

/// Messages sent from engine to GUI.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineMessage {
    /// Engine identification.
    Id { name: Option<String>, author: Option<String> },
    /// UCI initialization complete.
    UciOk,
    /// Engine is ready.
    ReadyOk,
    /// Search information.
    Info(EngineInfo),
    /// Best move found. `mv` is `None` when the engine reports `(none)`,
    /// which happens in checkmated or stalemated positions.
    BestMove { mv: Option<String>, ponder: Option<String> },
}

impl EngineMessage {
    /// Parse one line of engine output.
    ///
    /// Returns `None` for lines the GUI side has no use for (`option`,
    /// copyright banners, blank lines).
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        let mut parts = line.split_whitespace();

        match parts.next()? {
            "id" => match parts.next()? {
                "name" => Some(EngineMessage::Id {
                    name: Some(parts.collect::<Vec<_>>().join(" ")),
                    author: None,
                }),
                "author" => Some(EngineMessage::Id {
                    name: None,
                    author: Some(parts.collect::<Vec<_>>().join(" ")),
                }),
                _ => None,
            },
            "uciok" => Some(EngineMessage::UciOk),
            "readyok" => Some(EngineMessage::ReadyOk),
            "info" => EngineInfo::parse(line).map(EngineMessage::Info),
            "bestmove" => {
                let mv = parts
                    .next()
                    .filter(|m| *m != "(none)" && *m != "0000")
                    .map(str::to_string);
                let ponder = match parts.next() {
                    Some("ponder") => parts.next().map(str::to_string),
                    _ => None,
                };
                Some(EngineMessage::BestMove { mv, ponder })
            }
            _ => None,
        }
    }
}
