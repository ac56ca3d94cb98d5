//! End-to-end review scenarios over hand-built timelines.

use review_core::{
    review_game, Classification, MoveEvaluation, ReviewError, Side, Timeline,
};

fn white(uci: &str, score: i32) -> MoveEvaluation {
    MoveEvaluation::new(Side::White, uci, score)
}

fn black(uci: &str, score: i32) -> MoveEvaluation {
    MoveEvaluation::new(Side::Black, uci, score)
}

/// Scholar's mate with the blunder 3...Nf6?? and the mating 4.Qxf7#.
fn scholars_mate() -> Timeline {
    Timeline::with_checkmate(vec![
        white("e2e4", 30).in_book(true),
        black("e7e5", 30).in_book(true),
        white("d1h5", -40),
        black("b8c6", -35).matching(true),
        white("f1c4", -30),
        black("g8f6", 31_000),
        MoveEvaluation::checkmate(Side::White, "h5f7"),
    ])
    .expect("valid timeline")
}

#[test]
fn test_three_book_moves_are_insufficient() {
    let timeline = Timeline::new(vec![
        white("e2e4", 30).in_book(true),
        black("e7e5", 30).in_book(true),
        white("g1f3", 25).in_book(true),
    ])
    .unwrap();

    match review_game(&timeline) {
        Err(ReviewError::InsufficientData { sides }) => {
            assert_eq!(sides, vec![Side::White, Side::Black]);
        }
        other => panic!("Expected InsufficientData, got {:?}", other),
    }
}

#[test]
fn test_scholars_mate_review() {
    let review = review_game(&scholars_mate()).expect("review succeeds");
    let labels: Vec<Classification> = review.moves.iter().map(|m| m.classification).collect();

    assert_eq!(labels[0], Classification::Book);
    assert_eq!(labels[1], Classification::Book);
    assert_eq!(labels[5], Classification::Blunder, "Nf6 should be a blunder");
    assert!(matches!(
        labels[6],
        Classification::BestMove | Classification::GreatFind
    ));
    // The swing from 3...Nf6 is enormous, so the mate is a great find.
    assert_eq!(labels[6], Classification::GreatFind);

    assert_eq!(review.moves[6].target_square(), Some("f7"));
    assert_eq!(review.black.count(Classification::Blunder), 1);
    assert!(review.white.accuracy_percent > review.black.accuracy_percent);
    assert!(review.black.performance >= 100);
}

#[test]
fn test_book_and_forced_moves_do_not_change_ratings() {
    let base = vec![
        white("e2e4", 30).in_book(true),
        black("e7e5", 30),
        white("g1f3", 20),
        black("b8c6", 25).matching(true),
    ];
    let mut with_forced = base.clone();
    with_forced.push(white("e1f1", -2_000).forced(true));

    let plain = review_game(&Timeline::new(base).unwrap()).unwrap();
    let forced = review_game(&Timeline::new(with_forced).unwrap()).unwrap();

    assert_eq!(plain.white.scored_moves, forced.white.scored_moves);
    assert_eq!(plain.white.accuracy_percent, forced.white.accuracy_percent);
    assert_eq!(forced.moves[4].classification, Classification::Forced);
    assert_eq!(forced.moves[4].accuracy, None);
}

#[test]
fn test_review_serializes_to_json() {
    let review = review_game(&scholars_mate()).unwrap();
    let json = serde_json::to_value(&review).expect("serializable");

    assert_eq!(json["moves"][0]["classification"], "Book");
    assert_eq!(json["moves"][5]["uci"], "g8f6");
    assert_eq!(json["white"]["side"], "white");
    assert_eq!(json["black"]["counts"]["Blunder"], 1);
    assert!(json["black"]["performance"].as_u64().unwrap() >= 100);
}
