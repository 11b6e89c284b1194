//! Ranking and trimming of raw oracle output.
//!
//! The comparator here is the only place that decides what "best" means.
//! Everything that needs a best move or a top-N list goes through
//! [`sorted_analysis_moves_to_simple_moves`].

use crate::{Evaluation, PvMove, SimpleMove};
use std::cmp::Ordering;
use std::collections::HashMap;

/// How many plies short of the deepest reported depth an entry may be and
/// still count as usable.
pub const DEPTH_SLACK: u32 = 1;

/// Ranking bucket of a score, seen from the side to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Bucket {
    /// The mover delivers mate.
    Mating,
    /// No forced mate either way.
    Normal,
    /// The mover gets mated.
    Mated,
}

fn bucket(score: Evaluation, white_to_move: bool) -> Bucket {
    match score.relative_to(white_to_move) {
        Evaluation::Mate(n) if n > 0 => Bucket::Mating,
        Evaluation::Mate(_) => Bucket::Mated,
        Evaluation::Centipawns(_) => Bucket::Normal,
    }
}

/// Compares two candidates for the player about to move. `Ordering::Less`
/// means `a` ranks ahead of `b`.
pub fn compare_pv_moves(a: &PvMove, b: &PvMove, white_to_move: bool) -> Ordering {
    let (ba, bb) = (bucket(a.score, white_to_move), bucket(b.score, white_to_move));
    if ba != bb {
        return ba.cmp(&bb);
    }

    match (a.score, b.score) {
        (Evaluation::Mate(x), Evaluation::Mate(y)) => {
            // Shorter mates first when mating, longer defences first when mated.
            let (x, y) = (x.abs(), y.abs());
            if ba == Bucket::Mating {
                x.cmp(&y)
            } else {
                y.cmp(&x)
            }
        }
        (Evaluation::Centipawns(x), Evaluation::Centipawns(y)) => {
            b.depth.cmp(&a.depth).then_with(|| {
                // Black's good outcomes are the negative ones.
                if white_to_move {
                    y.cmp(&x)
                } else {
                    x.cmp(&y)
                }
            })
        }
        _ => Ordering::Equal,
    }
}

/// Orders candidate moves best-first for the side to move.
///
/// The sort is stable, so sorting an already sorted slice is a no-op.
pub fn sort_pv_moves(moves: &mut [PvMove], white_to_move: bool) {
    moves.sort_by(|a, b| compare_pv_moves(a, b, white_to_move));
}

/// Deepest depth reported in a batch of analysis entries.
pub fn deepest_depth(moves: &[PvMove]) -> u32 {
    moves.iter().map(|m| m.depth).max().unwrap_or(0)
}

/// Keeps one entry per move (the deepest, later entries winning ties) and
/// drops entries searched less than `max_depth - DEPTH_SLACK` plies.
///
/// First-appearance order of the moves is preserved.
pub fn filter_pv_moves(moves: &[PvMove], max_depth: u32) -> Vec<PvMove> {
    let mut latest: Vec<PvMove> = Vec::new();
    let mut slots: HashMap<&str, usize> = HashMap::new();

    for m in moves.iter().filter(|m| !m.mv.is_empty()) {
        match slots.get(m.mv.as_str()) {
            Some(&idx) => {
                if m.depth >= latest[idx].depth {
                    latest[idx] = m.clone();
                }
            }
            None => {
                slots.insert(m.mv.as_str(), latest.len());
                latest.push(m.clone());
            }
        }
    }

    latest.retain(|m| m.depth.saturating_add(DEPTH_SLACK) >= max_depth);
    latest
}

/// Filter, sort, and truncate raw analysis to at most `target_count`
/// move/score pairs.
pub fn sorted_analysis_moves_to_simple_moves(
    moves: &[PvMove],
    target_count: usize,
    max_depth: u32,
    white_to_move: bool,
) -> Vec<SimpleMove> {
    let mut usable = filter_pv_moves(moves, max_depth);
    sort_pv_moves(&mut usable, white_to_move);
    usable
        .into_iter()
        .take(target_count)
        .map(SimpleMove::from)
        .collect()
}
