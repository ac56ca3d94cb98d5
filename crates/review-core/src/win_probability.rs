//! Win percentage, accuracy and performance-rating transforms.
//!
//! All constants are fixed calibrations of a logistic win-probability curve
//! and an exponential accuracy curve; none of them are configurable.

/// Logistic slope mapping centipawns to winning chances.
const WIN_SLOPE: f64 = 0.00368208;

/// Accuracy curve: `ACC_SCALE * exp(-ACC_DECAY * loss) - ACC_OFFSET`.
const ACC_SCALE: f64 = 103.1668;
const ACC_DECAY: f64 = 0.04354;
const ACC_OFFSET: f64 = 3.1669;

/// Quadratic accuracy-to-Elo coefficients.
const ELO_A: f64 = -10.511;
const ELO_B: f64 = 2080.0;
const ELO_C: f64 = -99663.0;

/// No performance rating is ever reported below this.
pub const MIN_PERFORMANCE: f64 = 100.0;

/// Maps a White-relative centipawn score to White's win percentage (0-100).
///
/// Symmetric around 50 at 0 centipawns and saturating for large scores.
pub fn win_percent(centipawns: i32) -> f64 {
    let cp = f64::from(centipawns);
    50.0 + 50.0 * (2.0 / (1.0 + (-WIN_SLOPE * cp).exp()) - 1.0)
}

/// Accuracy of a single move from the mover's win percentage before and after it.
///
/// Not clamped: a move that raised the mover's chances scores above 100.
pub fn accuracy_from_win_delta(win_before: f64, win_after: f64) -> f64 {
    accuracy_from_cp_loss(win_before - win_after)
}

/// Accuracy for a win-chance loss already expressed in win-percentage points.
pub fn accuracy_from_cp_loss(loss: f64) -> f64 {
    ACC_SCALE * (-ACC_DECAY * loss).exp() - ACC_OFFSET
}

/// Elo-like estimate for a given accuracy, floored at [`MIN_PERFORMANCE`].
pub fn elo_from_accuracy(accuracy: f64) -> f64 {
    let elo = ELO_A * accuracy * accuracy + ELO_B * accuracy + ELO_C;
    elo.max(MIN_PERFORMANCE)
}

/// Performance ratings for White and Black.
///
/// Each side's own estimate is averaged with the estimate for the mean of both
/// accuracies, which damps outliers from a single very lopsided game.
pub fn performance_rating(accuracy_white: f64, accuracy_black: f64) -> (f64, f64) {
    let baseline = elo_from_accuracy((accuracy_white + accuracy_black) / 2.0);
    (
        (elo_from_accuracy(accuracy_white) + baseline) / 2.0,
        (elo_from_accuracy(accuracy_black) + baseline) / 2.0,
    )
}
