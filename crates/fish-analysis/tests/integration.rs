//! Integration tests for the fish-analysis crate.
//!
//! These tests require Stockfish to be installed and available in PATH.
//! Run with: `cargo test -p fish-analysis --test integration -- --ignored`

use fish_analysis::ranking::{deepest_depth, sorted_analysis_moves_to_simple_moves};
use fish_analysis::{EngineSettings, Evaluation, Oracle, UciOracle};

const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Check if Stockfish is available in PATH.
fn stockfish_available() -> bool {
    std::process::Command::new("stockfish")
        .arg("--version")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .is_ok()
}

fn shallow() -> EngineSettings {
    EngineSettings {
        depth: 10,
        threads: 1,
    }
}

#[tokio::test]
#[ignore = "requires Stockfish"]
async fn test_engine_handshake_and_best_move() {
    if !stockfish_available() {
        eprintln!("Skipping test: Stockfish not available");
        return;
    }

    let mut oracle = UciOracle::spawn("stockfish", shallow())
        .await
        .expect("Failed to start Stockfish");

    assert!(
        oracle.name().to_lowercase().contains("stockfish"),
        "Engine name should contain 'Stockfish', got: {}",
        oracle.name()
    );

    let best = oracle
        .best_move(STARTING_FEN)
        .await
        .expect("Failed to analyze starting position");
    assert_eq!(best.mv.len(), 4, "Best move should be UCI, got: {}", best.mv);
    assert!(
        best.alternatives.iter().any(|m| m.mv == best.mv),
        "Alternatives should include the best move"
    );

    oracle.quit().await.expect("Failed to quit");
}

#[tokio::test]
#[ignore = "requires Stockfish"]
async fn test_top_moves_rank_for_black() {
    if !stockfish_available() {
        eprintln!("Skipping test: Stockfish not available");
        return;
    }

    let mut oracle = UciOracle::spawn("stockfish", shallow())
        .await
        .expect("Failed to start Stockfish");

    // 1. e4, black to move
    let fen = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1";
    let raw = oracle.top_moves(fen, 3).await.expect("Failed to get top moves");
    let ranked = sorted_analysis_moves_to_simple_moves(&raw, 3, deepest_depth(&raw), false);

    assert_eq!(ranked.len(), 3);
    // Scores are white-relative, so black's best comes first with the lowest score.
    for pair in ranked.windows(2) {
        if let (Evaluation::Centipawns(a), Evaluation::Centipawns(b)) =
            (pair[0].score, pair[1].score)
        {
            assert!(a <= b);
        }
    }
}

#[tokio::test]
#[ignore = "requires Stockfish"]
async fn test_evaluate_finds_mate_in_one() {
    if !stockfish_available() {
        eprintln!("Skipping test: Stockfish not available");
        return;
    }

    let mut oracle = UciOracle::spawn("stockfish", shallow())
        .await
        .expect("Failed to start Stockfish");

    // Scholar's mate position before Qxf7#
    let fen = "r1bqkb1r/pppp1ppp/2n2n2/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR w KQkq - 4 4";
    let score = oracle.evaluate(fen, "h5f7").await.expect("Failed to evaluate");
    assert_eq!(score, Evaluation::Mate(1));
}
