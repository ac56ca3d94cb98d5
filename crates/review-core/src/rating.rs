//! Per-side accuracy and performance rating.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::classification::{classify, ClassificationResult, ClassifiedGame};
use crate::win_probability::{accuracy_from_cp_loss, performance_rating};
use crate::{Classification, ReviewError, Side, Timeline};

/// Running totals for one side, filled in by the classifier.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SideTally {
    /// Number of moves that were scored (neither book nor forced).
    pub scored_moves: u32,
    /// Sum of win-chance loss over scored moves, in win-percentage points.
    pub win_chance_loss: f64,
    /// Accuracy of every scored move.
    pub accuracy_samples: Vec<f64>,
}

impl SideTally {
    /// Adds one scored move. `loss` is `None` for best moves.
    pub(crate) fn record(&mut self, accuracy: f64, loss: Option<f64>) {
        self.scored_moves += 1;
        if let Some(loss) = loss {
            self.win_chance_loss += loss;
        }
        self.accuracy_samples.push(accuracy);
    }

    /// Mean win-chance loss per scored move, or `None` with no scored moves.
    pub fn average_win_chance_loss(&self) -> Option<f64> {
        (self.scored_moves > 0).then(|| self.win_chance_loss / f64::from(self.scored_moves))
    }

    /// Mean of the per-move accuracies, or `None` with no scored moves.
    pub fn average_accuracy(&self) -> Option<f64> {
        if self.accuracy_samples.is_empty() {
            return None;
        }
        Some(self.accuracy_samples.iter().sum::<f64>() / self.accuracy_samples.len() as f64)
    }
}

/// Final rating for one side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingReport {
    /// The side this report describes.
    pub side: Side,
    /// Number of scored moves.
    pub scored_moves: u32,
    /// Average win-chance loss per scored move.
    pub average_win_chance_loss: f64,
    /// Mean of the per-move accuracies.
    pub average_accuracy: f64,
    /// Accuracy derived from the average win-chance loss.
    pub accuracy_percent: f64,
    /// Elo-like performance estimate, never below 100.
    pub performance: u32,
    /// How often each label was given to this side.
    pub counts: BTreeMap<Classification, u32>,
}

impl RatingReport {
    /// Number of moves with the given label.
    pub fn count(&self, classification: Classification) -> u32 {
        self.counts.get(&classification).copied().unwrap_or(0)
    }
}

/// Complete review of one game.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameReview {
    /// Classification of each move, in playing order.
    pub moves: Vec<ClassificationResult>,
    /// Rating for White.
    pub white: RatingReport,
    /// Rating for Black.
    pub black: RatingReport,
}

impl GameReview {
    /// The report for the given side.
    pub fn report(&self, side: Side) -> &RatingReport {
        match side {
            Side::White => &self.white,
            Side::Black => &self.black,
        }
    }
}

/// Turns classified moves into per-side reports.
///
/// Aggregate accuracy comes from the averaged win-chance loss, not from the
/// mean of the per-move accuracies; both are reported.
///
/// # Errors
///
/// Returns [`ReviewError::InsufficientData`] naming every side without a
/// single scored move.
pub fn aggregate(game: ClassifiedGame) -> Result<GameReview, ReviewError> {
    let averages = |tally: &SideTally| {
        tally
            .average_win_chance_loss()
            .zip(tally.average_accuracy())
    };

    let (white_avg, black_avg) = match (averages(&game.white), averages(&game.black)) {
        (Some(white), Some(black)) => (white, black),
        (white, black) => {
            let mut sides = Vec::new();
            if white.is_none() {
                sides.push(Side::White);
            }
            if black.is_none() {
                sides.push(Side::Black);
            }
            return Err(ReviewError::InsufficientData { sides });
        }
    };

    let white_accuracy = accuracy_from_cp_loss(white_avg.0);
    let black_accuracy = accuracy_from_cp_loss(black_avg.0);
    let (white_performance, black_performance) =
        performance_rating(white_accuracy, black_accuracy);

    let report = |side: Side, tally: &SideTally, avg: (f64, f64), accuracy: f64, performance: f64| {
        RatingReport {
            side,
            scored_moves: tally.scored_moves,
            average_win_chance_loss: avg.0,
            average_accuracy: avg.1,
            accuracy_percent: accuracy,
            performance: performance.round() as u32,
            counts: count_labels(&game.moves, side),
        }
    };

    let white = report(Side::White, &game.white, white_avg, white_accuracy, white_performance);
    let black = report(Side::Black, &game.black, black_avg, black_accuracy, black_performance);

    tracing::debug!(
        white_accuracy,
        black_accuracy,
        white_performance = white.performance,
        black_performance = black.performance,
        "rated game"
    );

    Ok(GameReview {
        moves: game.moves,
        white,
        black,
    })
}

fn count_labels(moves: &[ClassificationResult], side: Side) -> BTreeMap<Classification, u32> {
    let mut counts = BTreeMap::new();
    for result in moves.iter().filter(|m| m.side == side) {
        *counts.entry(result.classification).or_insert(0) += 1;
    }
    counts
}

/// Classifies and rates a complete timeline.
///
/// # Errors
///
/// Returns [`ReviewError::InsufficientData`] if either side made no scored moves.
pub fn review_game(timeline: &Timeline) -> Result<GameReview, ReviewError> {
    aggregate(classify(timeline))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MoveEvaluation;

    fn mv(ply: usize, score: i32) -> MoveEvaluation {
        MoveEvaluation::new(Side::at_ply(ply), "a1a2", score)
    }

    #[test]
    fn test_tally_averages() {
        let mut tally = SideTally::default();
        assert_eq!(tally.average_win_chance_loss(), None);
        assert_eq!(tally.average_accuracy(), None);

        tally.record(100.0, None);
        tally.record(60.0, Some(8.0));
        assert_eq!(tally.scored_moves, 2);
        assert_eq!(tally.average_win_chance_loss(), Some(4.0));
        assert_eq!(tally.average_accuracy(), Some(80.0));
    }

    #[test]
    fn test_all_book_game_has_insufficient_data() {
        let timeline = Timeline::new(vec![
            mv(0, 20).in_book(true),
            mv(1, 20).in_book(true),
            mv(2, 25).in_book(true),
        ])
        .unwrap();

        assert_eq!(
            review_game(&timeline),
            Err(ReviewError::InsufficientData {
                sides: vec![Side::White, Side::Black]
            })
        );
    }

    #[test]
    fn test_one_sided_data_names_missing_side() {
        // Only Black gets a scored move.
        let timeline = Timeline::new(vec![mv(0, 20), mv(1, 10)]).unwrap();
        assert_eq!(
            review_game(&timeline),
            Err(ReviewError::InsufficientData {
                sides: vec![Side::White]
            })
        );
    }

    #[test]
    fn test_review_rates_both_sides() {
        let timeline = Timeline::new(vec![
            mv(0, 0),
            mv(1, 0),
            mv(2, -30),
            mv(3, -30).matching(true),
            mv(4, -60),
            mv(5, -60).matching(true),
            mv(6, -90),
            mv(7, -90).matching(true),
        ])
        .unwrap();
        let review = review_game(&timeline).unwrap();

        let white = &review.white;
        assert_eq!(white.scored_moves, 3);
        assert!((white.average_win_chance_loss - 2.75876).abs() < 1e-4);
        assert!((white.average_accuracy - 88.4117).abs() < 1e-3);
        assert!((white.accuracy_percent - 88.3232).abs() < 1e-3);
        assert_eq!(white.performance, 2526);
        assert_eq!(white.count(Classification::Good), 3);
        assert_eq!(white.count(Classification::Book), 1);

        let black = &review.black;
        assert_eq!(black.scored_moves, 4);
        assert_eq!(black.average_win_chance_loss, 0.0);
        assert_eq!(black.average_accuracy, 100.0);
        assert!((black.accuracy_percent - 99.9999).abs() < 1e-9);
        assert_eq!(black.performance, 3113);
        assert_eq!(black.count(Classification::BestMove), 4);
        assert_eq!(black.count(Classification::Blunder), 0);

        assert_eq!(review.report(Side::Black), black);
        assert_eq!(review.moves.len(), 8);
    }

    #[test]
    fn test_win_chance_loss_is_never_negative() {
        // Every move improves the mover's position.
        let timeline = Timeline::new(vec![
            mv(0, 0),
            mv(1, -40),
            mv(2, 10),
            mv(3, -60),
            mv(4, 20),
        ])
        .unwrap();
        let review = review_game(&timeline).unwrap();

        assert_eq!(review.white.average_win_chance_loss, 0.0);
        assert_eq!(review.black.average_win_chance_loss, 0.0);
        assert!(review.white.performance >= 100);
    }

    #[test]
    fn test_poor_play_floors_performance() {
        let timeline = Timeline::new(vec![
            mv(0, 0),
            mv(1, 600),
            mv(2, -400),
            mv(3, 900),
            mv(4, -1200),
        ])
        .unwrap();
        let review = review_game(&timeline).unwrap();

        assert_eq!(review.white.performance, 100);
        assert_eq!(review.black.performance, 100);
    }
}
