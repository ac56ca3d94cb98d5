//! Per-ply evaluation records and the validated timeline they form.

use serde::{Deserialize, Serialize};

use crate::{ReviewError, Side};

/// Everything the classifier needs to know about one played move.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveEvaluation {
    /// Score after the move, in centipawns from White's perspective.
    pub score: i32,
    /// The side that played the move.
    pub side: Side,
    /// The move continued a known opening line.
    pub in_book: bool,
    /// The move was the only legal move.
    pub forced: bool,
    /// The move equals the engine's suggestion for the previous position.
    pub matches_suggestion: bool,
    /// The move in UCI notation (e.g. "e2e4").
    pub uci: String,
    /// Comment attached to the move before review, kept for the caller.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl MoveEvaluation {
    /// Creates an ordinary, non-book, non-forced move.
    pub fn new(side: Side, uci: impl Into<String>, score: i32) -> Self {
        Self {
            score,
            side,
            in_book: false,
            forced: false,
            matches_suggestion: false,
            uci: uci.into(),
            comment: None,
        }
    }

    /// Creates the synthetic entry for a checkmating move.
    ///
    /// No evaluation exists after mate, so the score is 0 and the move always
    /// counts as the best move.
    pub fn checkmate(side: Side, uci: impl Into<String>) -> Self {
        Self {
            matches_suggestion: true,
            ..Self::new(side, uci, 0)
        }
    }

    /// Marks the move as an opening book move.
    pub fn in_book(mut self, in_book: bool) -> Self {
        self.in_book = in_book;
        self
    }

    /// Marks the move as the only legal move.
    pub fn forced(mut self, forced: bool) -> Self {
        self.forced = forced;
        self
    }

    /// Marks whether the move equals the engine's previous suggestion.
    pub fn matching(mut self, matches_suggestion: bool) -> Self {
        self.matches_suggestion = matches_suggestion;
        self
    }

    /// Attaches a pre-existing comment.
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// The destination square of the move, e.g. "e4" for "e2e4".
    pub fn target_square(&self) -> Option<&str> {
        self.uci.get(2..4)
    }
}

/// An ordered, validated sequence of move evaluations for one game.
///
/// Sides strictly alternate and book membership, once lost, is never regained.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Timeline {
    moves: Vec<MoveEvaluation>,
}

impl Timeline {
    /// Validates and wraps a list of move evaluations.
    ///
    /// # Errors
    ///
    /// - [`ReviewError::EmptyTimeline`] if `moves` is empty
    /// - [`ReviewError::SideOutOfTurn`] if sides do not alternate
    /// - [`ReviewError::BookReentered`] if a book move follows a non-book move
    pub fn new(moves: Vec<MoveEvaluation>) -> Result<Self, ReviewError> {
        let first = moves.first().ok_or(ReviewError::EmptyTimeline)?;

        let mut expected = first.side;
        let mut left_book = false;
        for (ply, mv) in moves.iter().enumerate() {
            if mv.side != expected {
                return Err(ReviewError::SideOutOfTurn {
                    ply,
                    expected,
                    found: mv.side,
                });
            }
            // The seed move is never scored, so its own book flag does not count.
            if ply > 0 {
                if mv.in_book && left_book {
                    return Err(ReviewError::BookReentered { ply });
                }
                left_book |= !mv.in_book;
            }
            expected = expected.opposite();
        }

        Ok(Self { moves })
    }

    /// Validates a timeline whose last move delivered checkmate.
    ///
    /// # Errors
    ///
    /// Everything [`Timeline::new`] rejects, plus
    /// [`ReviewError::NotCheckmate`] if the last entry was not built with
    /// [`MoveEvaluation::checkmate`].
    pub fn with_checkmate(moves: Vec<MoveEvaluation>) -> Result<Self, ReviewError> {
        let timeline = Self::new(moves)?;
        let ply = timeline.moves.len() - 1;
        let last = &timeline.moves[ply];
        if last.score != 0 || !last.matches_suggestion || last.in_book || last.forced {
            return Err(ReviewError::NotCheckmate { ply });
        }
        Ok(timeline)
    }

    /// The move evaluations in playing order.
    pub fn moves(&self) -> &[MoveEvaluation] {
        &self.moves
    }

    /// Number of plies.
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    /// Always false for a validated timeline; provided for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }
}
