//! Engine-backed review of recorded chess games.
//!
//! Reads a PGN transcript, evaluates every position with a UCI engine,
//! classifies the moves with [`review_core`] and writes the result back as an
//! annotated PGN and an optional JSON report.
//!
//! # Example
//!
//! ```ignore
//! use game_review::{build_timeline, AnalysisEngine, OpeningBook, Transcript};
//!
//! let transcript = Transcript::read("game.pgn")?;
//! let mut engine = AnalysisEngine::new("stockfish")?;
//! let timeline = build_timeline(&transcript, &mut engine, &OpeningBook::builtin(), 18)?;
//! let review = review_core::review_game(&timeline)?;
//! transcript.save_annotated("game_analyzed.pgn", &review.moves)?;
//! ```

pub mod book;
pub mod config;
pub mod engine;
pub mod pipeline;
pub mod report;
pub mod transcript;

pub use book::{BookError, OpeningBook};
pub use config::{ConfigError, ReviewConfig};
pub use engine::{AnalysisEngine, EngineError, PositionAnalysis, PositionEvaluator};
pub use pipeline::{build_timeline, PipelineError};
pub use transcript::{Transcript, TranscriptError, TranscriptMove};
