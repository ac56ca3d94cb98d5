//! Reading and writing game transcripts in PGN.
//!
//! Only the mainline of the first game is kept. Variations and NAGs are
//! dropped on the way in; comments survive and are written back next to the
//! classification markers.

use std::io::Write;
use std::ops::ControlFlow;
use std::path::Path;

use pgn_reader::{RawComment, RawTag, Reader, SanPlus, Visitor};
use review_core::ClassificationResult;
use thiserror::Error;

/// Errors that can occur when reading a transcript.
#[derive(Error, Debug)]
pub enum TranscriptError {
    /// Failed to read or tokenize the transcript.
    #[error("Failed to read transcript: {0}")]
    ReadError(#[from] std::io::Error),
    /// The input holds no game, or a game without moves.
    #[error("Transcript has no moves")]
    NoMoves,
}

/// One mainline move as written in the transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptMove {
    /// Move in SAN with its check or mate suffix.
    pub san: SanPlus,
    /// Comment that followed the move, if any.
    pub comment: Option<String>,
}

/// A parsed game: tag pairs, mainline moves and result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    /// Tag pairs in file order.
    pub tags: Vec<(String, String)>,
    /// Mainline moves in playing order.
    pub moves: Vec<TranscriptMove>,
    /// Game termination marker (`1-0`, `0-1`, `1/2-1/2` or `*`).
    pub result: String,
}

/// Collects tags, mainline SAN and comments of one game.
struct TranscriptBuilder;

impl Visitor for TranscriptBuilder {
    type Tags = Vec<(String, String)>;
    type Movetext = Transcript;
    type Output = Transcript;

    fn begin_tags(&mut self) -> ControlFlow<Transcript, Self::Tags> {
        ControlFlow::Continue(Vec::new())
    }

    fn tag(
        &mut self,
        tags: &mut Self::Tags,
        name: &[u8],
        value: RawTag<'_>,
    ) -> ControlFlow<Transcript> {
        tags.push((
            String::from_utf8_lossy(name).into_owned(),
            value.decode_utf8_lossy().into_owned(),
        ));
        ControlFlow::Continue(())
    }

    fn begin_movetext(&mut self, tags: Self::Tags) -> ControlFlow<Transcript, Transcript> {
        let result = tags
            .iter()
            .find(|(name, _)| name == "Result")
            .map(|(_, value)| value.clone())
            .unwrap_or_else(|| "*".to_string());
        ControlFlow::Continue(Transcript {
            tags,
            moves: Vec::new(),
            result,
        })
    }

    fn san(&mut self, game: &mut Transcript, san: SanPlus) -> ControlFlow<Transcript> {
        game.moves.push(TranscriptMove { san, comment: None });
        ControlFlow::Continue(())
    }

    fn comment(&mut self, game: &mut Transcript, comment: RawComment<'_>) -> ControlFlow<Transcript> {
        let text = String::from_utf8_lossy(comment.as_bytes());
        let text = text.trim();
        if text.is_empty() {
            return ControlFlow::Continue(());
        }
        // Comments before the first move have nowhere to go.
        if let Some(last) = game.moves.last_mut() {
            last.comment = Some(match last.comment.take() {
                Some(existing) => format!("{} {}", existing, text),
                None => text.to_string(),
            });
        }
        ControlFlow::Continue(())
    }

    fn end_game(&mut self, game: Transcript) -> Transcript {
        game
    }
}

impl Transcript {
    /// Reads and parses a PGN file.
    pub fn read(path: impl AsRef<Path>) -> Result<Self, TranscriptError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parses the first game in `pgn`.
    ///
    /// # Errors
    ///
    /// Returns [`TranscriptError::NoMoves`] if there is no game or the game
    /// has no moves.
    pub fn parse(pgn: &str) -> Result<Self, TranscriptError> {
        let mut reader = Reader::new(std::io::Cursor::new(pgn.as_bytes()));
        let game = reader
            .read_game(&mut TranscriptBuilder)?
            .ok_or(TranscriptError::NoMoves)?;
        if game.moves.is_empty() {
            return Err(TranscriptError::NoMoves);
        }
        Ok(game)
    }

    /// Returns the value of a tag pair.
    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(tag, _)| tag == name)
            .map(|(_, value)| value.as_str())
    }

    /// Writes the game with one classification marker per reviewed move.
    ///
    /// Each reviewed move gets `[%c_effect <sq>;square;<sq>;type;<Label>;persistent;true]`
    /// appended to its existing comment. Moves past the end of `review` are
    /// not written.
    pub fn write_annotated<W: Write>(
        &self,
        out: &mut W,
        review: &[ClassificationResult],
    ) -> std::io::Result<()> {
        for (name, value) in &self.tags {
            writeln!(out, "[{} \"{}\"]", name, value.replace('"', "\\\""))?;
        }
        writeln!(out)?;

        // Every move carries a comment, so Black moves get their own number.
        let mut groups: Vec<String> = Vec::new();
        for (ply, (mv, result)) in self.moves.iter().zip(review).enumerate() {
            let number = ply / 2 + 1;
            let dots = if ply % 2 == 0 { "." } else { "..." };
            let comment = match &mv.comment {
                Some(existing) => format!("{} {}", existing, effect(result)),
                None => effect(result),
            };
            groups.push(format!("{}{} {} {{{}}}", number, dots, mv.san, comment));
        }
        groups.push(self.result.clone());

        write_wrapped(out, &groups, 80)?;
        writeln!(out)
    }

    /// Writes the annotated game to a file.
    pub fn save_annotated(
        &self,
        path: impl AsRef<Path>,
        review: &[ClassificationResult],
    ) -> std::io::Result<()> {
        let mut file = std::io::BufWriter::new(std::fs::File::create(path)?);
        self.write_annotated(&mut file, review)?;
        file.flush()
    }
}

/// The `%c_effect` marker for one classified move.
fn effect(result: &ClassificationResult) -> String {
    let square = result.target_square().unwrap_or("a1");
    format!(
        "[%c_effect {sq};square;{sq};type;{label};persistent;true]",
        sq = square,
        label = result.classification
    )
}

fn write_wrapped<W: Write>(out: &mut W, groups: &[String], width: usize) -> std::io::Result<()> {
    let mut line = String::new();
    for token in groups {
        if !line.is_empty() && line.len() + 1 + token.len() > width {
            writeln!(out, "{}", line)?;
            line.clear();
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(token);
    }
    if !line.is_empty() {
        write!(out, "{}", line)?;
    }
    Ok(())
}
