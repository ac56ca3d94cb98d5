//! The two sides of a game.

use serde::{Deserialize, Serialize};

/// The side that made a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Side {
    White = 0,
    Black = 1,
}

impl Side {
    /// Returns the opposite side.
    #[inline]
    pub const fn opposite(self) -> Self {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }

    /// Returns the sign that turns a White-relative score into one relative
    /// to this side (+1 for White, -1 for Black).
    #[inline]
    pub const fn sign(self) -> i32 {
        match self {
            Side::White => 1,
            Side::Black => -1,
        }
    }

    /// Returns the side to move at the given ply, counting from White's first move.
    #[inline]
    pub const fn at_ply(ply: usize) -> Self {
        if ply % 2 == 0 {
            Side::White
        } else {
            Side::Black
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::White => write!(f, "White"),
            Side::Black => write!(f, "Black"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_side() {
        assert_eq!(Side::White.opposite(), Side::Black);
        assert_eq!(Side::Black.opposite(), Side::White);
    }

    #[test]
    fn sign_flips_perspective() {
        assert_eq!(Side::White.sign() * 120, 120);
        assert_eq!(Side::Black.sign() * 120, -120);
    }

    #[test]
    fn side_at_ply_alternates() {
        assert_eq!(Side::at_ply(0), Side::White);
        assert_eq!(Side::at_ply(1), Side::Black);
        assert_eq!(Side::at_ply(6), Side::White);
    }

    #[test]
    fn display() {
        assert_eq!(format!("{}", Side::White), "White");
        assert_eq!(format!("{}", Side::Black), "Black");
    }
}
