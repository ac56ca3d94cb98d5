use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use game_review::{build_timeline, report, AnalysisEngine, OpeningBook, ReviewConfig, Transcript};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "game-review")]
#[command(about = "Classify every move of a chess game and rate both players")]
struct Cli {
    /// PGN file to review
    pgn: PathBuf,
    /// Path to the UCI engine
    #[arg(short, long)]
    engine: Option<String>,
    /// Search depth per position
    #[arg(short, long)]
    depth: Option<u32>,
    /// Opening book: polyglot `.bin` or JSON lines
    #[arg(short, long)]
    book: Option<PathBuf>,
    /// Configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Where to write the annotated PGN
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Also write a JSON report here
    #[arg(long)]
    json: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => ReviewConfig::load_from(path),
        None => ReviewConfig::load(),
    }
    .context("Failed to load configuration")?;

    if let Some(engine) = cli.engine {
        config.engine_path = engine;
    }
    if let Some(depth) = cli.depth {
        anyhow::ensure!(depth > 0, "Search depth must be at least 1");
        config.depth = depth;
    }
    if let Some(book) = cli.book {
        config.book_path = Some(book);
    }

    let transcript = Transcript::read(&cli.pgn)
        .with_context(|| format!("Failed to read {}", cli.pgn.display()))?;
    let book = match &config.book_path {
        Some(path) => OpeningBook::open(path)
            .with_context(|| format!("Failed to load opening book {}", path.display()))?,
        None => OpeningBook::builtin(),
    };

    tracing::info!(
        "Reviewing {} moves with {} at depth {}",
        transcript.moves.len(),
        config.engine_path,
        config.depth
    );

    let mut engine = AnalysisEngine::new(&config.engine_path)
        .with_context(|| format!("Failed to start engine {}", config.engine_path))?;
    let timeline = build_timeline(&transcript, &mut engine, &book, config.depth)?;
    let review = review_core::review_game(&timeline)?;

    let output = cli
        .output
        .unwrap_or_else(|| config.annotated_path(&cli.pgn));
    if let Some(dir) = output.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    transcript
        .save_annotated(&output, &review.moves)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    tracing::info!("Annotated game written to {}", output.display());

    if let Some(path) = &cli.json {
        report::write_report(path, &transcript, &review, config.depth)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::info!("Report written to {}", path.display());
    }

    println!();
    print!("{}", report::summary(&review));
    Ok(())
}
