//! Errors produced while reviewing a game.

use thiserror::Error;

use crate::Side;

/// Errors that can occur when building a timeline or rating a game.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReviewError {
    /// The timeline contains no moves.
    #[error("Timeline is empty")]
    EmptyTimeline,
    /// A move was recorded for the side that is not on turn.
    #[error("Ply {ply} was played by {found} but it was {expected}'s turn")]
    SideOutOfTurn {
        /// Zero-based ply index.
        ply: usize,
        /// Side expected to move at this ply.
        expected: Side,
        /// Side recorded on the move.
        found: Side,
    },
    /// A move was marked as book after the game had already left the book.
    #[error("Ply {ply} is marked as a book move after the game left the book")]
    BookReentered {
        /// Zero-based ply index.
        ply: usize,
    },
    /// A timeline said to end in checkmate has an ordinary last move.
    #[error("Ply {ply} is not a checkmating move")]
    NotCheckmate {
        /// Zero-based ply index.
        ply: usize,
    },
    /// A side has no scored moves, so no average can be computed.
    #[error("Insufficient data: no scored moves for {}", join_sides(.sides))]
    InsufficientData {
        /// Every side with zero scored moves.
        sides: Vec<Side>,
    },
}

fn join_sides(sides: &[Side]) -> String {
    sides
        .iter()
        .map(Side::to_string)
        .collect::<Vec<_>>()
        .join(" and ")
}
