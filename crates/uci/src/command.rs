//! UCI command formatting.

/// Commands sent from GUI to engine.
#[derive(Debug, Clone, PartialEq)]
pub enum GuiCommand {
    /// Initialize UCI mode.
    Uci,
    /// Check if engine is ready.
    IsReady,
    /// Set an engine option, e.g. `Threads` or `MultiPV`.
    SetOption { name: String, value: String },
    /// Set up position from a FEN, optionally followed by moves.
    Position { fen: String, moves: Vec<String> },
    /// Start calculating.
    Go(GoOptions),
    /// Quit the engine.
    Quit,
}

/// Options for the `go` command.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GoOptions {
    /// Search to this depth.
    pub depth: Option<u32>,
    /// Restrict the search to these moves.
    pub searchmoves: Vec<String>,
}

impl GoOptions {
    /// Fixed-depth search over all moves.
    pub fn depth(depth: u32) -> Self {
        Self {
            depth: Some(depth),
            ..Self::default()
        }
    }

    /// Restrict the search to the given moves.
    pub fn with_searchmoves(mut self, moves: Vec<String>) -> Self {
        self.searchmoves = moves;
        self
    }
}

impl GuiCommand {
    /// Shorthand for a `setoption` command.
    pub fn set_option(name: &str, value: impl ToString) -> Self {
        GuiCommand::SetOption {
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    /// Shorthand for `position fen <fen>` without moves.
    pub fn position_fen(fen: &str) -> Self {
        GuiCommand::Position {
            fen: fen.to_string(),
            moves: Vec::new(),
        }
    }

    /// Format the command as a line of UCI text (without newline).
    pub fn to_uci(&self) -> String {
        match self {
            GuiCommand::Uci => "uci".to_string(),
            GuiCommand::IsReady => "isready".to_string(),
            GuiCommand::SetOption { name, value } => {
                format!("setoption name {} value {}", name, value)
            }
            GuiCommand::Position { fen, moves } => {
                let mut out = format!("position fen {}", fen);
                if !moves.is_empty() {
                    out.push_str(" moves ");
                    out.push_str(&moves.join(" "));
                }
                out
            }
            GuiCommand::Go(opts) => {
                let mut parts = vec!["go".to_string()];
                if let Some(d) = opts.depth {
                    parts.push(format!("depth {}", d));
                }
                // searchmoves must come last, it consumes the rest of the line
                if !opts.searchmoves.is_empty() {
                    parts.push(format!("searchmoves {}", opts.searchmoves.join(" ")));
                }
                parts.join(" ")
            }
            GuiCommand::Quit => "quit".to_string(),
        }
    }
}
