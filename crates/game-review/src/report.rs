//! Review output: the JSON report and the console summary.

use std::fmt::Write as _;
use std::path::Path;

use review_core::{GameReview, RatingReport, Side};
use serde::Serialize;

use crate::transcript::Transcript;

/// JSON representation of a reviewed game.
#[derive(Serialize)]
struct ReportJson<'a> {
    /// Name of the player with the white pieces, from the tags.
    #[serde(skip_serializing_if = "Option::is_none")]
    white_player: Option<&'a str>,
    /// Name of the player with the black pieces, from the tags.
    #[serde(skip_serializing_if = "Option::is_none")]
    black_player: Option<&'a str>,
    /// Game result token.
    result: &'a str,
    /// Search depth used for every position.
    depth: u32,
    /// Per-side ratings and per-move classifications.
    #[serde(flatten)]
    review: &'a GameReview,
}

/// Writes the review as pretty-printed JSON.
///
/// The file has `white_player`, `black_player`, `result`, `depth`, a
/// `moves` array with one classification per ply, and `white`/`black`
/// rating reports.
pub fn write_report<P: AsRef<Path>>(
    path: P,
    transcript: &Transcript,
    review: &GameReview,
    depth: u32,
) -> std::io::Result<()> {
    let json = ReportJson {
        white_player: transcript.tag("White"),
        black_player: transcript.tag("Black"),
        result: &transcript.result,
        depth,
        review,
    };

    let file = std::io::BufWriter::new(std::fs::File::create(path)?);
    serde_json::to_writer_pretty(file, &json)?;
    Ok(())
}

/// Console summary: accuracy, win-chance loss and performance per side.
pub fn summary(review: &GameReview) -> String {
    let mut out = String::new();
    for side in [Side::White, Side::Black] {
        let report = review.report(side);
        let _ = writeln!(out, "{} Accuracy: {:.1}", side, report.accuracy_percent);
    }
    for side in [Side::White, Side::Black] {
        let report = review.report(side);
        let _ = writeln!(
            out,
            "{} Winchance Loss: {:.0}",
            side, report.average_win_chance_loss
        );
    }
    for side in [Side::White, Side::Black] {
        let report = review.report(side);
        let _ = writeln!(out, "{} Performance: {}", side, report.performance);
    }
    for side in [Side::White, Side::Black] {
        let _ = writeln!(out, "{}: {}", side, label_counts(review.report(side)));
    }
    out
}

fn label_counts(report: &RatingReport) -> String {
    report
        .counts
        .iter()
        .map(|(label, count)| format!("{} {}", count, label))
        .collect::<Vec<_>>()
        .join(", ")
}
