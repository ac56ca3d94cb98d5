//! Move quality classification.
//!
//! The classifier walks a [`Timeline`] once, left to right, as an explicit
//! fold. The accumulator carries the last scored evaluation, the raw scores of
//! the two preceding plies for look-back, and the per-side tallies that the
//! rating step later turns into averages.

use serde::{Deserialize, Serialize};

use crate::rating::SideTally;
use crate::win_probability::{accuracy_from_win_delta, win_percent};
use crate::{MoveEvaluation, Side, Timeline};

/// Accuracy above which a non-best move is excellent.
pub const EXCELLENT_ACCURACY: f64 = 92.0;
/// Accuracy above which a non-best move is good.
pub const GOOD_ACCURACY: f64 = 80.0;
/// Accuracy above which a non-best move is only an inaccuracy.
pub const INACCURACY_ACCURACY: f64 = 70.0;
/// Accuracy above which a bad move is a mistake rather than a blunder.
pub const MISTAKE_ACCURACY: f64 = 20.0;

/// A swing larger than this between consecutive plies opened an opportunity.
pub const OPPORTUNITY_SWING: i32 = 50;
/// A position within this many centipawns of two plies ago counts as settled.
pub const SETTLED_SWING: i32 = 50;
/// A best move answering a swing larger than this is a great find.
pub const GREAT_FIND_SWING: i32 = 150;

/// Qualitative label of a single move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Classification {
    /// Still inside the opening book (or the unscored first move).
    Book,
    /// The only legal move.
    Forced,
    /// The engine's choice, or a move that kept the evaluation unchanged.
    BestMove,
    /// A best move found right after the position swung sharply.
    GreatFind,
    /// Minimal loss of winning chances.
    Excellent,
    /// Small loss of winning chances.
    Good,
    /// Noticeable loss of winning chances.
    Inaccuracy,
    /// Significant loss of winning chances.
    Mistake,
    /// Failed to punish an opponent's error in an otherwise settled position.
    Miss,
    /// Major loss of winning chances.
    Blunder,
}

impl Classification {
    /// Every label, in declaration order.
    pub const ALL: [Classification; 10] = [
        Classification::Book,
        Classification::Forced,
        Classification::BestMove,
        Classification::GreatFind,
        Classification::Excellent,
        Classification::Good,
        Classification::Inaccuracy,
        Classification::Mistake,
        Classification::Miss,
        Classification::Blunder,
    ];

    /// Name used in annotations and reports.
    pub fn as_str(self) -> &'static str {
        match self {
            Classification::Book => "Book",
            Classification::Forced => "Forced",
            Classification::BestMove => "BestMove",
            Classification::GreatFind => "GreatFind",
            Classification::Excellent => "Excellent",
            Classification::Good => "Good",
            Classification::Inaccuracy => "Inaccuracy",
            Classification::Mistake => "Mistake",
            Classification::Miss => "Miss",
            Classification::Blunder => "Blunder",
        }
    }

    /// Labels a move that was not the best move.
    ///
    /// `missed_opportunity` turns what would be a mistake or blunder into a
    /// miss.
    pub fn from_accuracy(accuracy: f64, missed_opportunity: bool) -> Self {
        if accuracy > EXCELLENT_ACCURACY {
            Classification::Excellent
        } else if accuracy > GOOD_ACCURACY {
            Classification::Good
        } else if accuracy > INACCURACY_ACCURACY {
            Classification::Inaccuracy
        } else if missed_opportunity {
            Classification::Miss
        } else if accuracy > MISTAKE_ACCURACY {
            Classification::Mistake
        } else {
            Classification::Blunder
        }
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification of one move.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    /// Zero-based ply index in the timeline.
    pub ply: usize,
    /// The side that played the move.
    pub side: Side,
    /// The move in UCI notation.
    pub uci: String,
    /// The assigned label.
    pub classification: Classification,
    /// Per-move accuracy; `None` for book and forced moves.
    pub accuracy: Option<f64>,
    /// Win-chance loss added to the side's total; `None` when nothing was added.
    pub win_chance_loss: Option<f64>,
}

impl ClassificationResult {
    /// Whether the move counted toward its side's averages.
    pub fn is_scored(&self) -> bool {
        self.accuracy.is_some()
    }

    /// The destination square of the move, e.g. "e4" for "e2e4".
    pub fn target_square(&self) -> Option<&str> {
        self.uci.get(2..4)
    }
}

/// Output of the classification pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedGame {
    /// One result per ply, in playing order.
    pub moves: Vec<ClassificationResult>,
    /// Running totals for White.
    pub white: SideTally,
    /// Running totals for Black.
    pub black: SideTally,
}

/// Accumulator threaded through the classification fold.
#[derive(Debug, Clone, Default)]
struct ClassifierState {
    /// Last scored evaluation; book and forced moves leave it untouched.
    previous_score: i32,
    /// Raw scores of the previous ply and the one before it.
    one_back: Option<i32>,
    two_back: Option<i32>,
    white: SideTally,
    black: SideTally,
    moves: Vec<ClassificationResult>,
}

impl ClassifierState {
    fn step(mut self, ply: usize, mv: &MoveEvaluation) -> Self {
        let result = if ply == 0 || mv.in_book {
            self.unscored(ply, mv, Classification::Book)
        } else if mv.forced {
            self.unscored(ply, mv, Classification::Forced)
        } else {
            self.scored(ply, mv)
        };

        tracing::debug!(
            ply,
            side = %mv.side,
            uci = %mv.uci,
            score = mv.score,
            classification = %result.classification,
            accuracy = ?result.accuracy,
            "classified move"
        );

        self.two_back = self.one_back;
        self.one_back = Some(mv.score);
        self.moves.push(result);
        self
    }

    fn unscored(&self, ply: usize, mv: &MoveEvaluation, classification: Classification) -> ClassificationResult {
        ClassificationResult {
            ply,
            side: mv.side,
            uci: mv.uci.clone(),
            classification,
            accuracy: None,
            win_chance_loss: None,
        }
    }

    fn scored(&mut self, ply: usize, mv: &MoveEvaluation) -> ClassificationResult {
        let previous = self.previous_score;
        let score = mv.score;

        // Scores are whole centipawns, so agreeing to two decimals means equal.
        let is_best = mv.matches_suggestion || previous == score;

        let accuracy = if is_best {
            100.0
        } else {
            // An improving move scores as if it held the previous evaluation.
            let after = match mv.side {
                Side::White => score.min(previous),
                Side::Black => score.max(previous),
            };
            let sign = mv.side.sign();
            accuracy_from_win_delta(win_percent(sign * previous), win_percent(sign * after))
        };

        let win_chance_loss = if is_best {
            None
        } else {
            let drop = sign_drop(mv.side, previous, score).max(0);
            Some(win_percent(drop) - 50.0)
        };

        let tally = match mv.side {
            Side::White => &mut self.white,
            Side::Black => &mut self.black,
        };
        tally.record(accuracy, win_chance_loss);

        let classification = if is_best {
            self.best_label(ply)
        } else {
            Classification::from_accuracy(accuracy, self.missed_opportunity(ply, score))
        };

        self.previous_score = score;

        ClassificationResult {
            ply,
            side: mv.side,
            uci: mv.uci.clone(),
            classification,
            accuracy: Some(accuracy),
            win_chance_loss,
        }
    }

    fn best_label(&self, ply: usize) -> Classification {
        match (self.two_back, self.one_back) {
            (Some(two), Some(one)) if ply > 2 && (two - one).abs() > GREAT_FIND_SWING => {
                Classification::GreatFind
            }
            _ => Classification::BestMove,
        }
    }

    /// The position had settled two plies ago, the opponent's reply then
    /// swung it, and this move let the swing go unpunished.
    fn missed_opportunity(&self, ply: usize, score: i32) -> bool {
        match (self.two_back, self.one_back) {
            (Some(two), Some(one)) => {
                ply > 3
                    && (two - score).abs() < SETTLED_SWING
                    && (one - score).abs() > OPPORTUNITY_SWING
            }
            _ => false,
        }
    }
}

/// How far the evaluation fell from the mover's point of view.
fn sign_drop(side: Side, previous: i32, score: i32) -> i32 {
    side.sign() * (previous - score)
}

/// Classifies every move of a timeline.
///
/// The first move is always labelled [`Classification::Book`] and never scored,
/// since there is no earlier evaluation to compare it against.
pub fn classify(timeline: &Timeline) -> ClassifiedGame {
    let state = timeline
        .moves()
        .iter()
        .enumerate()
        .fold(ClassifierState::default(), |state, (ply, mv)| {
            state.step(ply, mv)
        });

    ClassifiedGame {
        moves: state.moves,
        white: state.white,
        black: state.black,
    }
}
