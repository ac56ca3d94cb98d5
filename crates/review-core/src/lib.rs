//! Move quality classification and accuracy rating for analysed games.
//!
//! This crate turns a timeline of per-move engine evaluations into a label
//! for every move and an accuracy and performance rating for each side. It is
//! pure computation: it never talks to an engine and never touches files.
//!
//! # Overview
//!
//! - [`MoveEvaluation`] / [`Timeline`] - validated per-ply input
//! - [`win_probability`] - centipawns to win percentage, accuracy and Elo transforms
//! - [`classify`] - labels every move ([`Classification`])
//! - [`aggregate`] / [`review_game`] - per-side [`RatingReport`]s
//! - [`Evaluation`] - engine scores with mate clamping
//!
//! # Example
//!
//! ```
//! use review_core::{review_game, MoveEvaluation, Side, Timeline};
//!
//! let timeline = Timeline::new(vec![
//!     MoveEvaluation::new(Side::White, "e2e4", 30).in_book(true),
//!     MoveEvaluation::new(Side::Black, "e7e5", 25),
//!     MoveEvaluation::new(Side::White, "g1f3", 30).matching(true),
//!     MoveEvaluation::new(Side::Black, "f7f6", 140),
//! ])?;
//! let review = review_game(&timeline)?;
//! println!("White accuracy: {:.1}%", review.white.accuracy_percent);
//! # Ok::<(), review_core::ReviewError>(())
//! ```

pub mod classification;
mod error;
pub mod evaluation;
pub mod rating;
mod side;
mod timeline;
pub mod win_probability;

pub use classification::{classify, Classification, ClassificationResult, ClassifiedGame};
pub use error::ReviewError;
pub use evaluation::{Evaluation, MATE_SCORE};
pub use rating::{aggregate, review_game, GameReview, RatingReport, SideTally};
pub use side::Side;
pub use timeline::{MoveEvaluation, Timeline};
