//! Engine score types.

use serde::{Deserialize, Serialize};

use crate::Side;

/// Magnitude a forced mate is clamped to when expressed in centipawns.
pub const MATE_SCORE: i32 = 32_000;

/// Represents a chess position evaluation.
///
/// Evaluations can be either centipawn scores (for normal positions)
/// or mate scores (when a forced mate is found). Whether positive means
/// White or the side to move depends on where the value came from: UCI
/// engines report from the side to move, the timeline stores White's view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Evaluation {
    /// Centipawn evaluation.
    Centipawn(i32),
    /// Mate in N moves (positive = the perspective side mates).
    Mate(i32),
}

impl Evaluation {
    /// Builds an evaluation from the two optional halves of a UCI `score` field.
    ///
    /// A mate score wins over a centipawn score when both are present.
    /// Returns `None` when neither is.
    pub fn from_uci_score(cp: Option<i32>, mate: Option<i32>) -> Option<Self> {
        match (cp, mate) {
            (_, Some(m)) => Some(Evaluation::Mate(m)),
            (Some(c), None) => Some(Evaluation::Centipawn(c)),
            (None, None) => None,
        }
    }

    /// Returns the same evaluation seen from the other side.
    pub fn flip(self) -> Self {
        match self {
            Evaluation::Centipawn(cp) => Evaluation::Centipawn(-cp),
            Evaluation::Mate(m) => Evaluation::Mate(-m),
        }
    }

    /// Converts an evaluation reported for `side_to_move` into White's perspective.
    pub fn white_relative(self, side_to_move: Side) -> Self {
        match side_to_move {
            Side::White => self,
            Side::Black => self.flip(),
        }
    }

    /// Returns the score in centipawns, clamping mates to ±[`MATE_SCORE`].
    ///
    /// `Mate(0)` means the perspective side has been mated.
    pub fn to_centipawns(self) -> i32 {
        match self {
            Evaluation::Centipawn(cp) => cp.clamp(-MATE_SCORE, MATE_SCORE),
            Evaluation::Mate(m) if m > 0 => MATE_SCORE,
            Evaluation::Mate(_) => -MATE_SCORE,
        }
    }
}

impl std::fmt::Display for Evaluation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Evaluation::Centipawn(cp) => write!(f, "{:+.2}", *cp as f64 / 100.0),
            Evaluation::Mate(m) if *m >= 0 => write!(f, "+M{}", m),
            Evaluation::Mate(m) => write!(f, "-M{}", m.abs()),
        }
    }
}
