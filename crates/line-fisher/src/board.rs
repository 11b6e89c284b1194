//! Chess rules glue.
//!
//! Legality, check detection and FEN handling come from `shakmaty`; this
//! module only adapts it to the string forms the fisher stores: FEN for
//! positions, UCI for oracle moves, and PCN (`Ng1f3`) for line history.

use shakmaty::fen::Fen;
use shakmaty::san::SanPlus;
use shakmaty::uci::UciMove;
use shakmaty::{CastlingMode, Chess, EnPassantMode, Move, Position, Role};
use thiserror::Error;

/// Errors from position parsing and move application.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    /// The FEN could not be parsed or describes an impossible position.
    #[error("Invalid FEN '{fen}': {reason}")]
    InvalidFen { fen: String, reason: String },
    /// The move is malformed or not legal in the position.
    #[error("Illegal move '{mv}' in position {fen}")]
    IllegalMove { mv: String, fen: String },
}

/// How a game ended on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEnd {
    Checkmate,
    Stalemate,
}

/// The result of applying one move.
#[derive(Debug, Clone)]
pub struct Played {
    /// The move in UCI notation.
    pub uci: String,
    /// The move in piece coordinate notation.
    pub pcn: String,
    /// Position after the move.
    pub position: Chess,
}

impl Played {
    pub fn fen(&self) -> String {
        to_fen(&self.position)
    }

    pub fn game_end(&self) -> Option<GameEnd> {
        game_end(&self.position)
    }
}

pub fn parse_fen(fen: &str) -> Result<Chess, BoardError> {
    let invalid = |reason: String| BoardError::InvalidFen {
        fen: fen.to_string(),
        reason,
    };
    let parsed: Fen = fen.trim().parse().map_err(|e| invalid(format!("{}", e)))?;
    parsed
        .into_position(CastlingMode::Standard)
        .map_err(|e| invalid(format!("{}", e)))
}

pub fn to_fen(pos: &Chess) -> String {
    Fen::from_position(pos.clone(), EnPassantMode::Legal).to_string()
}

pub fn white_to_move(pos: &Chess) -> bool {
    pos.turn().is_white()
}

pub fn game_end(pos: &Chess) -> Option<GameEnd> {
    if pos.is_checkmate() {
        Some(GameEnd::Checkmate)
    } else if pos.is_stalemate() {
        Some(GameEnd::Stalemate)
    } else {
        None
    }
}

/// Resolves a move written in UCI (`g1f3`), PCN (`Ng1f3`) or SAN (`Nf3`).
pub fn resolve_move(pos: &Chess, text: &str) -> Result<Move, BoardError> {
    let text = text.trim();
    let illegal = || BoardError::IllegalMove {
        mv: text.to_string(),
        fen: to_fen(pos),
    };

    let uci = pcn_to_uci(text);
    if let Ok(parsed) = uci.parse::<UciMove>() {
        if let Ok(m) = parsed.to_move(pos) {
            return Ok(m);
        }
    }
    let san: SanPlus = text.parse().map_err(|_| illegal())?;
    san.san.to_move(pos).map_err(|_| illegal())
}

/// Applies a move given in any notation [`resolve_move`] accepts.
pub fn play(pos: &Chess, text: &str) -> Result<Played, BoardError> {
    let m = resolve_move(pos, text)?;
    let uci = m.to_uci(CastlingMode::Standard).to_string();
    let pcn = pcn(&m, &uci);
    let position = pos.clone().play(&m).map_err(|_| BoardError::IllegalMove {
        mv: text.to_string(),
        fen: to_fen(pos),
    })?;
    Ok(Played { uci, pcn, position })
}

/// Piece coordinate notation: piece letter (none for pawns), origin,
/// destination, and `=X` for promotions. Castling is written as the king move.
fn pcn(m: &Move, uci: &str) -> String {
    let mut out = String::new();
    if m.role() != Role::Pawn {
        out.push(m.role().upper_char());
    }
    out.push_str(&uci[..uci.len().min(4)]);
    if let Some(promotion) = m.promotion() {
        out.push('=');
        out.push(promotion.upper_char());
    }
    out
}

/// Converts PCN back to UCI. UCI input passes through unchanged.
pub fn pcn_to_uci(pcn: &str) -> String {
    let body = match pcn.chars().next() {
        Some('K' | 'Q' | 'R' | 'B' | 'N') if pcn.len() >= 5 => &pcn[1..],
        _ => pcn,
    };
    match body.split_once('=') {
        Some((squares, promotion)) => format!("{}{}", squares, promotion.to_lowercase()),
        None => body.to_string(),
    }
}

/// Replays `pcns` from `root_fen` and renders them as numbered SAN, e.g.
/// `1. e4 e5 2. Nf3` or `3... Nc6 4. Bb5`.
pub fn san_game(root_fen: &str, pcns: &[String]) -> Result<String, BoardError> {
    let mut pos = parse_fen(root_fen)?;
    let mut parts: Vec<String> = Vec::with_capacity(pcns.len());

    for (i, text) in pcns.iter().enumerate() {
        let m = resolve_move(&pos, text)?;
        let number = pos.fullmoves().get();
        if white_to_move(&pos) {
            parts.push(format!("{}.", number));
        } else if i == 0 {
            parts.push(format!("{}...", number));
        }
        parts.push(SanPlus::from_move(pos.clone(), &m).to_string());
        pos.play_unchecked(&m);
    }

    Ok(parts.join(" "))
}
