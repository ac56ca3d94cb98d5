//! UCI analysis engine client.

use review_core::{Evaluation, Side};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use thiserror::Error;

/// Maximum number of lines to read before giving up on a UCI response.
pub const MAX_UCI_LINES: usize = 10_000;

/// Errors that can occur when talking to an analysis engine.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Failed to spawn the engine process or talk to it.
    #[error("Engine I/O failed: {0}")]
    Io(#[from] std::io::Error),
    /// Engine executable was not found at the specified path.
    #[error("Engine not found at path: {0}")]
    NotFound(String),
    /// Engine failed to initialize properly (UCI handshake failed).
    #[error("Engine initialization failed")]
    InitFailed,
    /// Engine returned an invalid or unexpected response.
    #[error("Invalid engine response: {0}")]
    InvalidResponse(String),
}

/// Result of searching one position.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionAnalysis {
    /// The engine's preferred move in UCI notation.
    pub best_move: String,
    /// Evaluation from the side to move's perspective.
    pub evaluation: Evaluation,
    /// Search depth reached.
    pub depth: u32,
    /// Number of nodes searched.
    pub nodes: u64,
    /// Principal variation.
    pub pv: Vec<String>,
}

impl PositionAnalysis {
    /// White-relative centipawn score, mates clamped to the mate band.
    pub fn white_score(&self, side_to_move: Side) -> i32 {
        self.evaluation.white_relative(side_to_move).to_centipawns()
    }
}

/// Anything that can evaluate the position reached by a move sequence.
pub trait PositionEvaluator {
    /// Prepares for a new game.
    fn new_game(&mut self) -> Result<(), EngineError> {
        Ok(())
    }

    /// Searches the position after `moves` (UCI, from the start position).
    fn evaluate(&mut self, moves: &[String], depth: u32) -> Result<PositionAnalysis, EngineError>;
}

/// A UCI engine such as Stockfish running as a child process.
pub struct AnalysisEngine {
    process: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    name: String,
}

impl AnalysisEngine {
    /// Spawns the engine and performs the UCI handshake.
    ///
    /// # Errors
    ///
    /// - `EngineError::NotFound` if the path does not exist
    /// - `EngineError::Io` if the process fails to start
    /// - `EngineError::InitFailed` if the engine never answers `uciok`/`readyok`
    pub fn new(engine_path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let engine_path = engine_path.as_ref();
        let resolved = resolve_executable(engine_path)
            .ok_or_else(|| EngineError::NotFound(engine_path.display().to_string()))?;

        let mut process = Command::new(&resolved)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;

        let stdin = process.stdin.take().ok_or(EngineError::InitFailed)?;
        let stdout = process.stdout.take().ok_or(EngineError::InitFailed)?;

        let mut engine = Self {
            process,
            stdin,
            stdout: BufReader::new(stdout),
            name: String::new(),
        };
        engine.init_uci()?;

        tracing::info!("Engine ready: {}", engine.name);
        Ok(engine)
    }

    fn init_uci(&mut self) -> Result<(), EngineError> {
        self.send_command("uci")?;

        let mut name = None;
        self.read_until(|line| {
            if let Some(id) = line.strip_prefix("id name ") {
                name = Some(id.to_string());
            }
            line == "uciok"
        })
        .map_err(|_| EngineError::InitFailed)?;
        self.name = name.unwrap_or_else(|| "Unknown Engine".to_string());

        self.sync()
    }

    /// Returns the engine's name as reported via `id name`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Searches the position reached from the start position by `moves`.
    pub fn analyze_moves(
        &mut self,
        moves: &[String],
        depth: u32,
    ) -> Result<PositionAnalysis, EngineError> {
        if moves.is_empty() {
            self.send_command("position startpos")?;
        } else {
            self.send_command(&format!("position startpos moves {}", moves.join(" ")))?;
        }
        self.send_command(&format!("go depth {}", depth))?;

        let mut latest: Option<(u32, Evaluation, u64, Vec<String>)> = None;
        let mut best_move = None;
        self.read_until(|line| {
            if line.starts_with("info ") {
                if let Some(parsed) = Self::parse_info_line(line) {
                    latest = Some(parsed);
                }
                false
            } else if let Some(rest) = line.strip_prefix("bestmove") {
                best_move = rest.split_whitespace().next().map(str::to_string);
                true
            } else {
                false
            }
        })?;

        let best_move = best_move
            .filter(|m| m != "(none)")
            .ok_or_else(|| EngineError::InvalidResponse("No best move received".to_string()))?;
        let (depth, evaluation, nodes, pv) = latest
            .ok_or_else(|| EngineError::InvalidResponse("No score received".to_string()))?;

        Ok(PositionAnalysis {
            best_move,
            evaluation,
            depth,
            nodes,
            pv,
        })
    }

    /// Parses a UCI info line into depth, score, nodes and PV.
    ///
    /// Returns `None` for lines without depth or score, and for bound scores
    /// from an unfinished aspiration window.
    fn parse_info_line(line: &str) -> Option<(u32, Evaluation, u64, Vec<String>)> {
        let parts: Vec<&str> = line.split_whitespace().collect();

        let mut depth: Option<u32> = None;
        let mut cp: Option<i32> = None;
        let mut mate: Option<i32> = None;
        let mut nodes: u64 = 0;
        let mut pv: Vec<String> = Vec::new();

        let mut i = 0;
        while i < parts.len() {
            match parts[i] {
                "depth" => {
                    depth = parts.get(i + 1).and_then(|s| s.parse().ok());
                    i += 1;
                }
                "score" => {
                    match parts.get(i + 1).copied() {
                        Some("cp") => cp = parts.get(i + 2).and_then(|s| s.parse().ok()),
                        Some("mate") => mate = parts.get(i + 2).and_then(|s| s.parse().ok()),
                        _ => {}
                    }
                    i += 2;
                }
                "upperbound" | "lowerbound" => return None,
                "nodes" => {
                    nodes = parts.get(i + 1).and_then(|s| s.parse().ok()).unwrap_or(0);
                    i += 1;
                }
                "pv" => {
                    pv = parts[i + 1..].iter().map(|s| s.to_string()).collect();
                    break;
                }
                _ => {}
            }
            i += 1;
        }

        let depth = depth?;
        let evaluation = Evaluation::from_uci_score(cp, mate)?;
        Some((depth, evaluation, nodes, pv))
    }

    /// Clears the engine's hash tables and prepares for a new game.
    pub fn clear_hash(&mut self) -> Result<(), EngineError> {
        self.send_command("ucinewgame")?;
        self.sync()
    }

    /// Sends `isready` and waits for `readyok`.
    fn sync(&mut self) -> Result<(), EngineError> {
        self.send_command("isready")?;
        self.read_until(|line| line == "readyok")
            .map_err(|_| EngineError::InitFailed)
    }

    /// Reads lines until `done` returns true, bounded by [`MAX_UCI_LINES`].
    fn read_until(&mut self, mut done: impl FnMut(&str) -> bool) -> Result<(), EngineError> {
        for _ in 0..MAX_UCI_LINES {
            let line = self.read_line()?;
            if done(&line) {
                return Ok(());
            }
        }
        Err(EngineError::InvalidResponse(format!(
            "No answer within {} lines",
            MAX_UCI_LINES
        )))
    }

    fn send_command(&mut self, command: &str) -> Result<(), EngineError> {
        tracing::trace!(">> {}", command);
        writeln!(self.stdin, "{}", command)?;
        self.stdin.flush()?;
        Ok(())
    }

    fn read_line(&mut self) -> Result<String, EngineError> {
        let mut line = String::new();
        let bytes = self.stdout.read_line(&mut line)?;
        if bytes == 0 {
            return Err(EngineError::InvalidResponse(
                "Engine closed unexpectedly".to_string(),
            ));
        }
        let line = line.trim().to_string();
        tracing::trace!("<< {}", line);
        Ok(line)
    }
}

impl PositionEvaluator for AnalysisEngine {
    fn new_game(&mut self) -> Result<(), EngineError> {
        self.clear_hash()
    }

    fn evaluate(&mut self, moves: &[String], depth: u32) -> Result<PositionAnalysis, EngineError> {
        self.analyze_moves(moves, depth)
    }
}

impl Drop for AnalysisEngine {
    fn drop(&mut self) {
        let _ = self.send_command("quit");
        let _ = self.process.wait();
    }
}

/// Finds the engine binary, either as a path or by name on `PATH`.
fn resolve_executable(path: &Path) -> Option<std::path::PathBuf> {
    if path.exists() {
        return Some(path.to_path_buf());
    }
    if path.components().count() != 1 {
        return None;
    }
    std::env::var_os("PATH").and_then(|paths| {
        std::env::split_paths(&paths)
            .map(|dir| dir.join(path))
            .find(|candidate| candidate.is_file())
    })
}
