//! UCI info line parsing.

use std::str::FromStr;

/// Score in centipawns or mate distance, relative to the side to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    /// Centipawn score (100 = 1 pawn advantage).
    Cp(i32),
    /// Mate in N moves (positive = side to move mates, negative = gets mated).
    Mate(i32),
}

/// Whether a reported score is exact or only a search window bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScoreBound {
    #[default]
    Exact,
    Lower,
    Upper,
}

/// Search information from engine.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EngineInfo {
    /// Search depth in plies.
    pub depth: Option<u32>,
    /// Selective search depth.
    pub seldepth: Option<u32>,
    /// Index of this principal variation when `MultiPV` > 1 (1-based).
    pub multipv: Option<u32>,
    /// Score evaluation.
    pub score: Option<Score>,
    /// Bound flag that came with the score.
    pub bound: ScoreBound,
    /// Nodes searched.
    pub nodes: Option<u64>,
    /// Nodes per second.
    pub nps: Option<u64>,
    /// Time spent in milliseconds.
    pub time: Option<u64>,
    /// Principal variation (best line found).
    pub pv: Vec<String>,
    /// Current move being searched.
    pub currmove: Option<String>,
    /// Hash table usage (per mille).
    pub hashfull: Option<u32>,
    /// Arbitrary string info.
    pub string: Option<String>,
}

impl EngineInfo {
    /// Create a new empty info.
    pub fn new() -> Self {
        Self::default()
    }

    /// True when the line reports a finished principal variation: it has a
    /// depth, an exact score and at least one pv move.
    pub fn is_settled_pv(&self) -> bool {
        self.depth.is_some()
            && self.score.is_some()
            && self.bound == ScoreBound::Exact
            && !self.pv.is_empty()
    }

    /// Parse a UCI `info` line. Unknown keywords are skipped, and a value
    /// that fails to parse leaves its field unset.
    pub fn parse(line: &str) -> Option<Self> {
        let mut tokens = line.split_whitespace().peekable();
        if tokens.next() != Some("info") {
            return None;
        }

        let mut info = EngineInfo::new();
        while let Some(keyword) = tokens.next() {
            match keyword {
                "depth" => info.depth = next_value(&mut tokens),
                "seldepth" => info.seldepth = next_value(&mut tokens),
                "multipv" => info.multipv = next_value(&mut tokens),
                "nodes" => info.nodes = next_value(&mut tokens),
                "nps" => info.nps = next_value(&mut tokens),
                "time" => info.time = next_value(&mut tokens),
                "hashfull" => info.hashfull = next_value(&mut tokens),
                "currmove" => info.currmove = tokens.next().map(str::to_string),
                "score" => {
                    let kind = tokens.next();
                    let value = next_value(&mut tokens);
                    info.score = match (kind, value) {
                        (Some("cp"), Some(cp)) => Some(Score::Cp(cp)),
                        (Some("mate"), Some(n)) => Some(Score::Mate(n)),
                        _ => None,
                    };
                }
                "lowerbound" => info.bound = ScoreBound::Lower,
                "upperbound" => info.bound = ScoreBound::Upper,
                "pv" => {
                    while let Some(mv) = tokens.next_if(|t| !is_info_keyword(t)) {
                        info.pv.push(mv.to_string());
                    }
                }
                "string" => {
                    info.string = Some(tokens.collect::<Vec<_>>().join(" "));
                    break;
                }
                _ => {}
            }
        }

        Some(info)
    }
}

fn next_value<'a, T, I>(tokens: &mut I) -> Option<T>
where
    T: FromStr,
    I: Iterator<Item = &'a str>,
{
    tokens.next().and_then(|t| t.parse().ok())
}

fn is_info_keyword(s: &str) -> bool {
    matches!(
        s,
        "depth"
            | "seldepth"
            | "multipv"
            | "score"
            | "lowerbound"
            | "upperbound"
            | "nodes"
            | "nps"
            | "time"
            | "pv"
            | "currmove"
            | "currmovenumber"
            | "hashfull"
            | "tbhits"
            | "wdl"
            | "string"
    )
}
