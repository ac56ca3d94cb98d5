//! Opening book lookup.
//!
//! Books come in two shapes: opening lines keyed by move history, or a
//! polyglot `.bin` file keyed by Zobrist hash of the position.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::Deserialize;
use shakmaty::zobrist::{Zobrist64, ZobristHash};
use shakmaty::{CastlingMode, Chess, EnPassantMode, Move};
use thiserror::Error;

/// Size of one polyglot entry: key, move, weight, learn.
const POLYGLOT_ENTRY_SIZE: usize = 16;

/// Errors that can occur when loading an opening book.
#[derive(Debug, Error)]
pub enum BookError {
    /// A line contained something that is not a UCI move.
    #[error("invalid book line {line}: bad move '{token}'")]
    InvalidMove {
        /// Index of the offending line.
        line: usize,
        /// The rejected token.
        token: String,
    },

    /// A polyglot file whose length is not a whole number of entries.
    #[error("polyglot book is truncated: {0} bytes")]
    Truncated(usize),

    /// Failed to read the book file.
    #[error("failed to read opening book: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// On-disk book format: `{ "lines": ["e2e4 e7e5 g1f3", ...] }`.
#[derive(Debug, Deserialize)]
struct BookFile {
    lines: Vec<String>,
}

/// Common mainlines used when no book file is configured.
const BUILTIN_LINES: &[&str] = &[
    // Ruy Lopez
    "e2e4 e7e5 g1f3 b8c6 f1b5 a7a6 b5a4 g8f6 e1g1 f8e7 f1e1 b7b5 a4b3 d7d6 c2c3 e8g8",
    // Berlin
    "e2e4 e7e5 g1f3 b8c6 f1b5 g8f6 e1g1 f6e4 d2d4 e4d6 b5c6 d7c6 d4e5 d6f5",
    // Italian
    "e2e4 e7e5 g1f3 b8c6 f1c4 f8c5 c2c3 g8f6 d2d3 d7d6 e1g1 e8g8",
    "e2e4 e7e5 g1f3 b8c6 f1c4 g8f6 d2d3 f8e7 e1g1 e8g8",
    // Scotch
    "e2e4 e7e5 g1f3 b8c6 d2d4 e5d4 f3d4 g8f6 d4c6 b7c6 e4e5 d8e7",
    // Petrov
    "e2e4 e7e5 g1f3 g8f6 f3e5 d7d6 e5f3 f6e4 d2d4 d6d5",
    // Sicilian Najdorf
    "e2e4 c7c5 g1f3 d7d6 d2d4 c5d4 f3d4 g8f6 b1c3 a7a6 c1e3 e7e5",
    // Sicilian Taimanov
    "e2e4 c7c5 g1f3 e7e6 d2d4 c5d4 f3d4 b8c6 b1c3 d8c7",
    // Sicilian Alapin
    "e2e4 c7c5 c2c3 g8f6 e4e5 f6d5 d2d4 c5d4",
    // French
    "e2e4 e7e6 d2d4 d7d5 b1c3 g8f6 c1g5 f8e7 e4e5 f6d7",
    "e2e4 e7e6 d2d4 d7d5 e4e5 c7c5 c2c3 b8c6 g1f3 d8b6",
    // Caro-Kann
    "e2e4 c7c6 d2d4 d7d5 b1c3 d5e4 c3e4 c8f5 e4g3 f5g6",
    "e2e4 c7c6 d2d4 d7d5 e4e5 c8f5 g1f3 e7e6",
    // Scandinavian
    "e2e4 d7d5 e4d5 d8d5 b1c3 d5a5 d2d4 g8f6",
    // Pirc
    "e2e4 d7d6 d2d4 g8f6 b1c3 g7g6 g1f3 f8g7",
    // Queen's Gambit Declined
    "d2d4 d7d5 c2c4 e7e6 b1c3 g8f6 c1g5 f8e7 e2e3 e8g8 g1f3",
    // Queen's Gambit Accepted
    "d2d4 d7d5 c2c4 d5c4 g1f3 g8f6 e2e3 e7e6 f1c4 c7c5",
    // Slav
    "d2d4 d7d5 c2c4 c7c6 g1f3 g8f6 b1c3 d5c4 a2a4 c8f5",
    // London
    "d2d4 d7d5 c1f4 g8f6 e2e3 c7c5 c2c3 b8c6 g1f3",
    "d2d4 g8f6 c1f4 e7e6 e2e3 c7c5 c2c3",
    // King's Indian
    "d2d4 g8f6 c2c4 g7g6 b1c3 f8g7 e2e4 d7d6 g1f3 e8g8 f1e2 e7e5",
    // Nimzo-Indian
    "d2d4 g8f6 c2c4 e7e6 b1c3 f8b4 d1c2 e8g8 a2a3 b4c3 c2c3",
    // Queen's Indian
    "d2d4 g8f6 c2c4 e7e6 g1f3 b7b6 g2g3 c8b7 f1g2 f8e7",
    // Grunfeld
    "d2d4 g8f6 c2c4 g7g6 b1c3 d7d5 c4d5 f6d5 e2e4 d5c3 b2c3 f8g7",
    // Dutch
    "d2d4 f7f5 g2g3 g8f6 f1g2 e7e6 g1f3 d7d5",
    // English
    "c2c4 e7e5 b1c3 g8f6 g1f3 b8c6 g2g3 d7d5",
    "c2c4 g8f6 b1c3 e7e6 e2e4 d7d5 e4e5",
    // Reti
    "g1f3 d7d5 g2g3 g8f6 f1g2 e7e6 e1g1 f8e7",
    "g1f3 g8f6 c2c4 g7g6 b1c3 f8g7",
];

/// A set of known opening continuations.
///
/// Line books map the space-joined UCI move history (empty for the start
/// position) to the moves played there. Polyglot books map the position's
/// Zobrist key to moves written with castling as king-takes-rook.
#[derive(Debug, Clone, Default)]
pub struct OpeningBook {
    positions: HashMap<String, HashSet<String>>,
    polyglot: HashMap<u64, HashSet<String>>,
}

impl OpeningBook {
    /// Creates a new empty book.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a book from opening lines, each a space-separated UCI sequence.
    ///
    /// # Errors
    ///
    /// Returns [`BookError::InvalidMove`] if a token is not a UCI move.
    pub fn from_lines<I, S>(lines: I) -> Result<Self, BookError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut book = Self::new();
        for (index, line) in lines.into_iter().enumerate() {
            book.add_line(index, line.as_ref())?;
        }
        Ok(book)
    }

    /// The builtin book of common mainlines.
    #[must_use]
    pub fn builtin() -> Self {
        let mut book = Self::new();
        for (index, line) in BUILTIN_LINES.iter().enumerate() {
            // Builtin lines are checked by the tests below.
            if let Err(err) = book.add_line(index, line) {
                tracing::warn!("skipping builtin book line: {}", err);
            }
        }
        book
    }

    /// Loads a JSON book file of the form `{ "lines": [...] }`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid JSON, or
    /// contains a malformed move.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, BookError> {
        let content = std::fs::read_to_string(path)?;
        let file: BookFile = serde_json::from_str(&content)?;
        let book = Self::from_lines(&file.lines)?;
        tracing::debug!(
            "loaded opening book: {} lines, {} positions",
            file.lines.len(),
            book.len()
        );
        Ok(book)
    }

    /// Loads a book file, picking the format from its extension: `.bin` is
    /// polyglot, anything else JSON lines.
    ///
    /// # Errors
    ///
    /// See [`OpeningBook::load`] and [`OpeningBook::load_polyglot`].
    pub fn open(path: impl AsRef<Path>) -> Result<Self, BookError> {
        let path = path.as_ref();
        let polyglot = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("bin"));
        if polyglot {
            Self::load_polyglot(path)
        } else {
            Self::load(path)
        }
    }

    /// Loads a polyglot `.bin` book.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a whole number
    /// of 16-byte entries.
    pub fn load_polyglot(path: impl AsRef<Path>) -> Result<Self, BookError> {
        let bytes = std::fs::read(path)?;
        if bytes.len() % POLYGLOT_ENTRY_SIZE != 0 {
            return Err(BookError::Truncated(bytes.len()));
        }

        let mut book = Self::new();
        for entry in bytes.chunks_exact(POLYGLOT_ENTRY_SIZE) {
            let key = big_endian(&entry[0..8]);
            let raw = big_endian(&entry[8..10]) as u16;
            book.polyglot.entry(key).or_default().insert(polyglot_uci(raw));
        }
        tracing::debug!(
            "loaded polyglot book: {} entries, {} positions",
            bytes.len() / POLYGLOT_ENTRY_SIZE,
            book.len()
        );
        Ok(book)
    }

    fn add_line(&mut self, index: usize, line: &str) -> Result<(), BookError> {
        let mut history: Vec<&str> = Vec::new();
        for token in line.split_whitespace() {
            if !is_uci_move(token) {
                return Err(BookError::InvalidMove {
                    line: index,
                    token: token.to_string(),
                });
            }
            self.positions
                .entry(history.join(" "))
                .or_default()
                .insert(token.to_string());
            history.push(token);
        }
        Ok(())
    }

    /// Returns true if the book contains no positions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty() && self.polyglot.is_empty()
    }

    /// Returns the number of positions in the book.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len() + self.polyglot.len()
    }

    /// Whether `mv`, played in `pos` after `history`, is a book move.
    #[must_use]
    pub fn is_book_move(&self, pos: &Chess, history: &[String], mv: &Move) -> bool {
        let uci = mv.to_uci(CastlingMode::Standard).to_string();
        if self
            .positions
            .get(&history.join(" "))
            .is_some_and(|moves| moves.contains(&uci))
        {
            return true;
        }
        if self.polyglot.is_empty() {
            return false;
        }

        let key = pos.zobrist_hash::<Zobrist64>(EnPassantMode::Legal).0;
        let uci = mv.to_uci(CastlingMode::Chess960).to_string();
        self.polyglot
            .get(&key)
            .is_some_and(|moves| moves.contains(&uci))
    }
}

fn big_endian(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0, |acc, &b| (acc << 8) | u64::from(b))
}

/// Decodes a polyglot move: to-square in bits 0-5, from-square in bits 6-11,
/// promotion piece in bits 12-14.
fn polyglot_uci(raw: u16) -> String {
    let square = |index: u16| {
        let file = char::from(b'a' + (index & 7) as u8);
        let rank = char::from(b'1' + ((index >> 3) & 7) as u8);
        format!("{}{}", file, rank)
    };
    let promotion = match (raw >> 12) & 7 {
        1 => "n",
        2 => "b",
        3 => "r",
        4 => "q",
        _ => "",
    };
    format!("{}{}{}", square((raw >> 6) & 63), square(raw & 63), promotion)
}

fn is_uci_move(token: &str) -> bool {
    let bytes = token.as_bytes();
    let square = |file: u8, rank: u8| (b'a'..=b'h').contains(&file) && (b'1'..=b'8').contains(&rank);
    match bytes.len() {
        4 => square(bytes[0], bytes[1]) && square(bytes[2], bytes[3]),
        5 => {
            square(bytes[0], bytes[1])
                && square(bytes[2], bytes[3])
                && matches!(bytes[4], b'q' | b'r' | b'b' | b'n')
        }
        _ => false,
    }
}
