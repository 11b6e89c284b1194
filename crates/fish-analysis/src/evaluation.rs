//! Chess position evaluation types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents a chess position evaluation.
///
/// Evaluations are always white-relative: positive favours white, negative
/// favours black, whichever side was to move when the engine reported it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Evaluation {
    /// Centipawn evaluation (positive = white advantage)
    #[serde(rename = "cp")]
    Centipawns(i32),
    /// Mate in N moves (positive = white mates, negative = black mates)
    #[serde(rename = "mate")]
    Mate(i32),
}

impl Default for Evaluation {
    fn default() -> Self {
        Evaluation::Centipawns(0)
    }
}

impl Evaluation {
    /// Converts a side-to-move relative UCI score into a white-relative one.
    pub fn from_uci_score(score: uci::Score, white_to_move: bool) -> Self {
        let eval = match score {
            uci::Score::Cp(cp) => Evaluation::Centipawns(cp),
            uci::Score::Mate(n) => Evaluation::Mate(n),
        };
        if white_to_move {
            eval
        } else {
            eval.flip()
        }
    }

    /// Negates the evaluation (swaps which side it favours).
    pub fn flip(self) -> Self {
        match self {
            Evaluation::Centipawns(cp) => Evaluation::Centipawns(-cp),
            Evaluation::Mate(n) => Evaluation::Mate(-n),
        }
    }

    /// The same evaluation seen from the given side (positive = good for it).
    pub fn relative_to(self, white: bool) -> Self {
        if white {
            self
        } else {
            self.flip()
        }
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Evaluation::Centipawns(cp) => {
                let sign = if *cp < 0 { "-" } else { "+" };
                let abs = cp.unsigned_abs();
                write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
            }
            Evaluation::Mate(n) => write!(f, "#{}", n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_uci_score_white_to_move_keeps_sign() {
        let eval = Evaluation::from_uci_score(uci::Score::Cp(35), true);
        assert_eq!(eval, Evaluation::Centipawns(35));
    }

    #[test]
    fn from_uci_score_black_to_move_flips_sign() {
        assert_eq!(
            Evaluation::from_uci_score(uci::Score::Cp(35), false),
            Evaluation::Centipawns(-35)
        );
        assert_eq!(
            Evaluation::from_uci_score(uci::Score::Mate(2), false),
            Evaluation::Mate(-2)
        );
    }

    #[test]
    fn relative_to_black_flips() {
        assert_eq!(
            Evaluation::Centipawns(-80).relative_to(false),
            Evaluation::Centipawns(80)
        );
        assert_eq!(Evaluation::Mate(3).relative_to(true), Evaluation::Mate(3));
    }

    #[test]
    fn display_formats() {
        assert_eq!(Evaluation::Centipawns(35).to_string(), "+0.35");
        assert_eq!(Evaluation::Centipawns(-120).to_string(), "-1.20");
        assert_eq!(Evaluation::Centipawns(0).to_string(), "+0.00");
        assert_eq!(Evaluation::Mate(3).to_string(), "#3");
        assert_eq!(Evaluation::Mate(-2).to_string(), "#-2");
    }

    #[test]
    fn serializes_compactly() {
        let json = serde_json::to_string(&Evaluation::Centipawns(-17)).unwrap();
        assert_eq!(json, r#"{"cp":-17}"#);
        let back: Evaluation = serde_json::from_str(r#"{"mate":4}"#).unwrap();
        assert_eq!(back, Evaluation::Mate(4));
    }
}
