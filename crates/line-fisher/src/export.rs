//! Text export of lines.
//!
//! Each line becomes one row: the moves with move numbers, a delimiter, and
//! a JSON object with the line's metadata.
//!
//! ```text
//! 1. Ng1f3 Ng8f6 2. Nb1c3 | {"lineId":1,"nodeId":"g1f3_g8f6_b1c3",...}
//! ```

use crate::line::FishLine;
use fish_analysis::{Evaluation, SimpleMove};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Separates the move string from the metadata.
pub const METADATA_DELIMITER: &str = " | ";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to encode line metadata: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Missing metadata delimiter in: {0}")]
    MissingDelimiter(String),
}

/// Per-line metadata written after the delimiter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportMeta {
    pub line_id: usize,
    pub node_id: String,
    pub score: Option<Evaluation>,
    pub is_done: bool,
    pub is_full: bool,
    pub is_mate: bool,
    pub is_stalemate: bool,
    pub is_transposition: bool,
    /// Node id of the line reached first, empty when not a transposition.
    pub transposition_target: String,
    pub replies: Vec<SimpleMove>,
    pub alts: Vec<SimpleMove>,
}

impl From<&FishLine> for ExportMeta {
    fn from(line: &FishLine) -> Self {
        Self {
            line_id: line.line_index,
            node_id: line.node_id.clone(),
            score: line.score,
            is_done: line.is_done(),
            is_full: line.is_full(),
            is_mate: line.is_mate(),
            is_stalemate: line.is_stalemate(),
            is_transposition: line.is_transposition(),
            transposition_target: line.transposition_target().unwrap_or_default().to_string(),
            replies: line.best5_replies.clone(),
            alts: line.best5_alts.clone(),
        }
    }
}

/// An export row read back.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedLine {
    pub pcns: Vec<String>,
    pub meta: ExportMeta,
}

/// Numbers moves using the side to move and fullmove counter of `fen`, the
/// position after the last move.
pub fn numbered_moves(pcns: &[String], fen: &str) -> String {
    let mut fields = fen.split_whitespace().skip(1);
    let black_to_move = fields.next() == Some("b");
    let fullmove: usize = fields.nth(3).and_then(|n| n.parse().ok()).unwrap_or(1);

    // Absolute ply of the first move, 0 = white's first move.
    let end_ply = (fullmove.max(1) - 1) * 2 + usize::from(black_to_move);
    let first_ply = end_ply.saturating_sub(pcns.len());

    let mut parts: Vec<String> = Vec::with_capacity(pcns.len() * 2);
    for (i, pcn) in pcns.iter().enumerate() {
        let ply = first_ply + i;
        if ply % 2 == 0 {
            parts.push(format!("{}.", ply / 2 + 1));
        } else if i == 0 {
            parts.push(format!("{}...", ply / 2 + 1));
        }
        parts.push(pcn.clone());
    }
    parts.join(" ")
}

pub fn export_line(line: &FishLine) -> Result<String, ExportError> {
    let meta = serde_json::to_string(&ExportMeta::from(line))?;
    Ok(format!(
        "{}{}{}",
        numbered_moves(&line.pcns, &line.position),
        METADATA_DELIMITER,
        meta
    ))
}

/// Exports lines in the given order, one row each.
pub fn export_lines<'a, I>(lines: I) -> Result<String, ExportError>
where
    I: IntoIterator<Item = &'a FishLine>,
{
    let rows = lines
        .into_iter()
        .map(export_line)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows.join("\n"))
}

pub fn parse_export_line(row: &str) -> Result<ParsedLine, ExportError> {
    let (moves, json) = row
        .split_once(METADATA_DELIMITER)
        .ok_or_else(|| ExportError::MissingDelimiter(row.to_string()))?;
    let pcns = moves
        .split_whitespace()
        .filter(|token| !token.ends_with('.'))
        .map(str::to_string)
        .collect();
    Ok(ParsedLine {
        pcns,
        meta: serde_json::from_str(json)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board;
    use crate::config::START_FEN;
    use crate::line::LineStatus;
    use proptest::prelude::*;
    use shakmaty::{CastlingMode, Position};

    fn strings(moves: &[&str]) -> Vec<String> {
        moves.iter().map(|s| s.to_string()).collect()
    }

    fn line_through(moves: &[&str]) -> FishLine {
        let mut line = FishLine::root(5, START_FEN, true);
        let mut pos = board::parse_fen(START_FEN).unwrap();
        for mv in moves {
            let played = board::play(&pos, mv).unwrap();
            line.node_id = if line.node_id.is_empty() {
                played.uci.clone()
            } else {
                format!("{}_{}", line.node_id, played.uci)
            };
            line.pcns.push(played.pcn.clone());
            line.position = played.fen();
            pos = played.position;
        }
        line
    }

    #[test]
    fn numbers_from_white() {
        let line = line_through(&["g1f3", "g8f6", "b1c3"]);
        assert_eq!(
            numbered_moves(&line.pcns, &line.position),
            "1. Ng1f3 Ng8f6 2. Nb1c3"
        );
    }

    #[test]
    fn numbers_from_black() {
        let pcns = strings(&["c7c5", "Ng1f3"]);
        let fen = "rnbqkbnr/pp1ppppp/8/2p5/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq - 1 2";
        assert_eq!(numbered_moves(&pcns, fen), "1... c7c5 2. Ng1f3");
    }

    #[test]
    fn empty_line_exports_empty_moves() {
        let line = FishLine::root(0, START_FEN, false);
        let row = export_line(&line).unwrap();
        assert!(row.starts_with(" | {"));
        assert!(parse_export_line(&row).unwrap().pcns.is_empty());
    }

    #[test]
    fn round_trip_keeps_moves_and_flags() {
        let mut line = line_through(&["g1f3", "g8f6", "b1c3", "b8c6", "e2e4"]);
        line.score = Some(Evaluation::Centipawns(41));
        line.best5_alts = vec![SimpleMove::new("e2e4", Evaluation::Centipawns(41))];
        line.status = LineStatus::Transposition {
            target: "g1f3_b8c6_b1c3_g8f6_e2e4".into(),
        };

        let row = export_line(&line).unwrap();
        let parsed = parse_export_line(&row).unwrap();
        assert_eq!(parsed.pcns, line.pcns);
        assert_eq!(parsed.meta, ExportMeta::from(&line));
        assert!(parsed.meta.is_done);
        assert!(parsed.meta.is_transposition);
        assert!(!parsed.meta.is_mate);
        assert_eq!(parsed.meta.transposition_target, "g1f3_b8c6_b1c3_g8f6_e2e4");
        assert_eq!(parsed.meta.line_id, 5);
    }

    #[test]
    fn json_uses_camel_case_keys() {
        let line = line_through(&["e2e4"]);
        let row = export_line(&line).unwrap();
        assert!(row.contains(r#""lineId":5"#));
        assert!(row.contains(r#""isStalemate":false"#));
        assert!(row.contains(r#""transpositionTarget":"""#));
    }

    #[test]
    fn rows_are_newline_separated() {
        let a = line_through(&["e2e4"]);
        let b = line_through(&["d2d4"]);
        let text = export_lines([&a, &b]).unwrap();
        assert_eq!(text.lines().count(), 2);
    }

    #[test]
    fn missing_delimiter_is_an_error() {
        assert!(matches!(
            parse_export_line("1. e2e4"),
            Err(ExportError::MissingDelimiter(_))
        ));
    }

    proptest! {
        #[test]
        fn random_games_round_trip(choices in prop::collection::vec(0usize..64, 0..16)) {
            let mut pos = board::parse_fen(START_FEN).unwrap();
            let mut moves: Vec<String> = Vec::new();
            for choice in choices {
                let legal = pos.legal_moves();
                if legal.is_empty() {
                    break;
                }
                let m = &legal[choice % legal.len()];
                moves.push(m.to_uci(CastlingMode::Standard).to_string());
                pos = board::play(&pos, moves.last().unwrap()).unwrap().position;
            }
            let refs: Vec<&str> = moves.iter().map(String::as_str).collect();
            let line = line_through(&refs);

            let parsed = parse_export_line(&export_line(&line).unwrap()).unwrap();
            prop_assert_eq!(parsed.pcns, line.pcns);
            prop_assert_eq!(parsed.meta.node_id, line.node_id);
        }
    }
}
