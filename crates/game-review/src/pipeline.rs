//! Turns a transcript into an evaluated timeline.
//!
//! Every move is replayed on a board, checked against the opening book and
//! scored by the evaluator in the position it leads to.

use review_core::{MoveEvaluation, ReviewError, Side, Timeline};
use shakmaty::{CastlingMode, Chess, Color, Position};
use thiserror::Error;

use crate::book::OpeningBook;
use crate::engine::{EngineError, PositionEvaluator};
use crate::transcript::Transcript;

/// Errors that can occur while building a timeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A move is not legal in its position.
    #[error("Illegal move {san} at ply {ply}")]
    IllegalMove {
        /// Zero-based ply index.
        ply: usize,
        /// The move as written.
        san: String,
    },
    /// The evaluator failed.
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),
    /// The collected moves do not form a valid timeline.
    #[error("Review error: {0}")]
    Review(#[from] ReviewError),
}

fn side_of(color: Color) -> Side {
    match color {
        Color::White => Side::White,
        Color::Black => Side::Black,
    }
}

/// Replays `transcript`, evaluating every position at `depth`.
///
/// Stops at checkmate or stalemate; later moves in the transcript are
/// ignored.
///
/// # Errors
///
/// - [`PipelineError::IllegalMove`] for SAN that is illegal in its position
/// - [`PipelineError::Engine`] if the evaluator fails
pub fn build_timeline<E: PositionEvaluator + ?Sized>(
    transcript: &Transcript,
    evaluator: &mut E,
    book: &OpeningBook,
    depth: u32,
) -> Result<Timeline, PipelineError> {
    evaluator.new_game()?;

    let total = transcript.moves.len();
    let mut pos = Chess::default();
    let mut history: Vec<String> = Vec::with_capacity(total);
    let mut entries: Vec<MoveEvaluation> = Vec::with_capacity(total);
    let mut suggestion: Option<String> = None;
    let mut in_book = true;

    for (ply, written) in transcript.moves.iter().enumerate() {
        let illegal = || PipelineError::IllegalMove {
            ply,
            san: written.san.to_string(),
        };
        let mv = written.san.san.to_move(&pos).map_err(|_| illegal())?;
        let uci = mv.to_uci(CastlingMode::Standard).to_string();

        let side = side_of(pos.turn());
        let book_move = in_book && book.is_book_move(&pos, &history, &mv);
        in_book = book_move;
        let forced = pos.legal_moves().len() == 1;

        pos = pos.play(mv).map_err(|_| illegal())?;
        history.push(uci.clone());

        if pos.is_checkmate() {
            tracing::info!("[{}/{}] {} ({}) checkmate", ply + 1, total, written.san, uci);
            entries.push(attach(MoveEvaluation::checkmate(side, uci), written.comment.as_deref()));
            return Ok(Timeline::with_checkmate(entries)?);
        }

        if pos.is_stalemate() {
            tracing::info!("[{}/{}] {} ({}) stalemate", ply + 1, total, written.san, uci);
            let entry = MoveEvaluation::new(side, uci, 0)
                .in_book(book_move)
                .forced(forced);
            entries.push(attach(entry, written.comment.as_deref()));
            break;
        }

        let analysis = evaluator.evaluate(&history, depth)?;
        let score = analysis.white_score(side.opposite());
        let matches = suggestion.as_deref() == Some(uci.as_str());

        tracing::info!(
            "[{}/{}] {} ({}) score {} best {}",
            ply + 1,
            total,
            written.san,
            uci,
            score,
            suggestion.as_deref().unwrap_or("-")
        );
        tracing::debug!(
            depth = analysis.depth,
            nodes = analysis.nodes,
            book = book_move,
            forced,
            "evaluated ply {}",
            ply
        );

        suggestion = Some(analysis.best_move);
        let entry = MoveEvaluation::new(side, uci, score)
            .in_book(book_move)
            .forced(forced)
            .matching(matches);
        entries.push(attach(entry, written.comment.as_deref()));
    }

    Ok(Timeline::new(entries)?)
}

fn attach(entry: MoveEvaluation, comment: Option<&str>) -> MoveEvaluation {
    match comment {
        Some(comment) => entry.with_comment(comment),
        None => entry,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::PositionAnalysis;
    use review_core::Evaluation;

    /// Replays canned answers, one per call, then falls back to a level score.
    struct Scripted {
        answers: Vec<(Evaluation, &'static str)>,
        calls: Vec<Vec<String>>,
        new_games: u32,
    }

    impl Scripted {
        fn new(answers: Vec<(Evaluation, &'static str)>) -> Self {
            Self {
                answers,
                calls: Vec::new(),
                new_games: 0,
            }
        }
    }

    impl PositionEvaluator for Scripted {
        fn new_game(&mut self) -> Result<(), EngineError> {
            self.new_games += 1;
            Ok(())
        }

        fn evaluate(&mut self, moves: &[String], depth: u32) -> Result<PositionAnalysis, EngineError> {
            let (evaluation, best) = self
                .answers
                .get(self.calls.len())
                .copied()
                .unwrap_or((Evaluation::Centipawn(0), "0000"));
            self.calls.push(moves.to_vec());
            Ok(PositionAnalysis {
                best_move: best.to_string(),
                evaluation,
                depth,
                nodes: 1,
                pv: vec![best.to_string()],
            })
        }
    }

    struct Broken;

    impl PositionEvaluator for Broken {
        fn evaluate(&mut self, _: &[String], _: u32) -> Result<PositionAnalysis, EngineError> {
            Err(EngineError::InvalidResponse("Engine closed unexpectedly".to_string()))
        }
    }

    fn scholars_mate() -> (Transcript, Scripted) {
        let transcript = Transcript::parse(
            "1. e4 e5 2. Qh5 {Early queen} Nc6 3. Bc4 Nf6 4. Qxf7# Ke7 1-0",
        )
        .unwrap();
        let engine = Scripted::new(vec![
            (Evaluation::Centipawn(-30), "e7e5"),
            (Evaluation::Centipawn(30), "g1f3"),
            (Evaluation::Centipawn(40), "b8c6"),
            (Evaluation::Centipawn(-35), "g1f3"),
            (Evaluation::Centipawn(30), "g7g6"),
            (Evaluation::Mate(1), "h5f7"),
        ]);
        (transcript, engine)
    }

    #[test]
    fn test_scholars_mate_timeline() {
        let (transcript, mut engine) = scholars_mate();
        let book = OpeningBook::from_lines(["e2e4 e7e5 g1f3"]).unwrap();

        let timeline = build_timeline(&transcript, &mut engine, &book, 12).unwrap();
        let moves = timeline.moves();

        assert_eq!(moves.len(), 7, "moves after mate are ignored");
        assert_eq!(engine.new_games, 1);
        assert_eq!(engine.calls.len(), 6, "no evaluation after mate");
        assert_eq!(engine.calls[2], vec!["e2e4", "e7e5", "d1h5"]);

        let scores: Vec<i32> = moves.iter().map(|m| m.score).collect();
        assert_eq!(scores, vec![30, 30, -40, -35, -30, 32_000, 0]);

        let ucis: Vec<&str> = moves.iter().map(|m| m.uci.as_str()).collect();
        assert_eq!(ucis, vec!["e2e4", "e7e5", "d1h5", "b8c6", "f1c4", "g8f6", "h5f7"]);

        let book_flags: Vec<bool> = moves.iter().map(|m| m.in_book).collect();
        assert_eq!(book_flags, vec![true, true, false, false, false, false, false]);

        // e7e5 was suggested after e2e4, b8c6 after d1h5; mate always matches.
        let matches: Vec<bool> = moves.iter().map(|m| m.matches_suggestion).collect();
        assert_eq!(matches, vec![false, true, false, true, false, false, true]);

        assert_eq!(moves[2].comment.as_deref(), Some("Early queen"));
        assert_eq!(moves[5].side, Side::Black);
        assert!(moves.iter().all(|m| !m.forced));
    }

    #[test]
    fn test_book_is_left_for_good() {
        let transcript = Transcript::parse("1. e4 c5 2. Nf3 d6 *").unwrap();
        let book = OpeningBook::from_lines(["e2e4 e7e5 g1f3", "g1f3 d7d6"]).unwrap();
        let mut engine = Scripted::new(vec![]);

        let timeline = build_timeline(&transcript, &mut engine, &book, 10).unwrap();
        let book_flags: Vec<bool> = timeline.moves().iter().map(|m| m.in_book).collect();
        assert_eq!(book_flags, vec![true, false, false, false]);
    }

    #[test]
    fn test_only_legal_move_is_forced() {
        // 2...g6 is the only way out of check.
        let transcript = Transcript::parse("1. e4 f5 2. Qh5+ g6 *").unwrap();
        let mut engine = Scripted::new(vec![]);

        let timeline = build_timeline(&transcript, &mut engine, &OpeningBook::new(), 10).unwrap();
        let forced: Vec<bool> = timeline.moves().iter().map(|m| m.forced).collect();
        assert_eq!(forced, vec![false, false, false, true]);
        assert_eq!(timeline.moves()[3].uci, "g7g6");
    }

    #[test]
    fn test_black_perspective_scores_are_flipped() {
        let transcript = Transcript::parse("1. d4 d5 *").unwrap();
        let mut engine = Scripted::new(vec![
            (Evaluation::Centipawn(-25), "d7d5"),
            (Evaluation::Mate(-3), "c2c4"),
        ]);

        let timeline = build_timeline(&transcript, &mut engine, &OpeningBook::new(), 10).unwrap();
        let scores: Vec<i32> = timeline.moves().iter().map(|m| m.score).collect();
        assert_eq!(scores, vec![25, -32_000]);
    }

    #[test]
    fn test_stalemate_stops_without_evaluation() {
        let transcript = Transcript::parse(
            "1. e3 a5 2. Qh5 Ra6 3. Qxa5 h5 4. h4 Rah6 5. Qxc7 f6 6. Qxd7+ Kf7 \
             7. Qxb7 Qd3 8. Qxb8 Qh7 9. Qxc8 Kg6 10. Qe6 1/2-1/2",
        )
        .unwrap();
        let mut engine = Scripted::new(vec![]);

        let timeline = build_timeline(&transcript, &mut engine, &OpeningBook::new(), 10).unwrap();
        assert_eq!(timeline.len(), 19);
        assert_eq!(engine.calls.len(), 18);
        assert_eq!(timeline.moves()[18].score, 0);
        assert!(!timeline.moves()[18].matches_suggestion);
    }

    #[test]
    fn test_castling_uses_king_destination() {
        let transcript = Transcript::parse("1. e4 e5 2. Nf3 Nc6 3. Bc4 Bc5 4. O-O *").unwrap();
        let mut engine = Scripted::new(vec![]);

        let timeline = build_timeline(&transcript, &mut engine, &OpeningBook::new(), 10).unwrap();
        assert_eq!(timeline.moves()[6].uci, "e1g1");
    }

    #[test]
    fn test_illegal_move() {
        let transcript = Transcript::parse("1. e4 e5 2. Ke3 *").unwrap();
        let mut engine = Scripted::new(vec![]);

        match build_timeline(&transcript, &mut engine, &OpeningBook::new(), 10) {
            Err(PipelineError::IllegalMove { ply, san }) => {
                assert_eq!(ply, 2);
                assert_eq!(san, "Ke3");
            }
            other => panic!("Expected IllegalMove, got {:?}", other),
        }
    }

    #[test]
    fn test_ambiguous_move_is_illegal() {
        // Both knights reach d2.
        let transcript = Transcript::parse("1. d4 d5 2. Nf3 Nf6 3. Nbd2 Nbd7 4. e3 e6 5. Nb3 c5 6. Nd2 *")
            .unwrap();
        let mut engine = Scripted::new(vec![]);

        let err = build_timeline(&transcript, &mut engine, &OpeningBook::new(), 10).unwrap_err();
        assert!(matches!(err, PipelineError::IllegalMove { ply: 10, .. }));
        assert_eq!(err.to_string(), "Illegal move Nd2 at ply 10");
    }

    #[test]
    fn test_polyglot_book_marks_book_moves() {
        use shakmaty::zobrist::{Zobrist64, ZobristHash};
        use shakmaty::EnPassantMode;
        use std::io::Write;

        let start = Chess::default().zobrist_hash::<Zobrist64>(EnPassantMode::Legal).0;
        let mut bytes = start.to_be_bytes().to_vec();
        // d2d4: to d4 (27), from d2 (11).
        bytes.extend((27u16 | 11 << 6).to_be_bytes());
        bytes.extend([0, 1, 0, 0, 0, 0]);
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&bytes).unwrap();
        let book = OpeningBook::load_polyglot(file.path()).unwrap();

        let transcript = Transcript::parse("1. d4 d5 *").unwrap();
        let timeline = build_timeline(&transcript, &mut Scripted::new(vec![]), &book, 10).unwrap();
        let book_flags: Vec<bool> = timeline.moves().iter().map(|m| m.in_book).collect();
        assert_eq!(book_flags, vec![true, false]);
    }

    #[test]
    fn test_engine_failure_propagates() {
        let transcript = Transcript::parse("1. e4 e5 *").unwrap();
        let err = build_timeline(&transcript, &mut Broken, &OpeningBook::new(), 10).unwrap_err();
        assert!(matches!(err, PipelineError::Engine(EngineError::InvalidResponse(_))));
    }
}
