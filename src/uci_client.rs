//! UCI protocol client driving one engine process in strict lock-step.
//!
//! The client never has more than one command outstanding: every command that expects an
//! answer (`uci`, `isready`, `go`) blocks until the answer arrives or the deadline passes.
//! Lines that do not carry the awaited prefix (`id`, `option`, `info`, ...) are skipped.

use std::time::{Duration, Instant};

use tracing::{debug, instrument, warn};

use crate::{
    engine::EngineDescriptor,
    error::EngineError,
    process::{ProcessHandle, Shutdown},
};

const HANDSHAKE_ACK: &str = "uciok";
const READY_ACK: &str = "readyok";
const MOVE_RESULT: &str = "bestmove";
const NULL_MOVE: &str = "0000";
const NO_MOVE: &str = "(none)";

/// Lifecycle of a [`UciClient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    /// Process not launched yet.
    NotStarted,
    /// Handshake done, waiting for the next request.
    Ready,
    /// Process released; the client cannot be used anymore.
    Stopped,
}

/// Position a game starts from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StartPosition {
    /// Standard initial position.
    #[default]
    StartPos,
    /// Any position given in FEN.
    Fen(String),
}

impl StartPosition {
    /// Side to move in this position, `true` for white.
    pub fn white_to_move(&self) -> bool {
        match self {
            StartPosition::StartPos => true,
            StartPosition::Fen(fen) => fen.split_whitespace().nth(1) != Some("b"),
        }
    }
}

/// How long an engine may search for each move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchLimit {
    /// Fixed depth in plies.
    Depth(u32),
    /// Fixed thinking time.
    MoveTime(Duration),
}

impl Default for SearchLimit {
    fn default() -> Self {
        SearchLimit::Depth(6)
    }
}

/// Answer to a move request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BestMove {
    /// A move in coordinate notation, e.g. `e2e4` or `e7e8q`.
    Move(String),
    /// The engine reported it has no move to play.
    NoMove,
}

/// Timing used by a [`UciClient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientSettings {
    /// Deadline of every blocking wait.
    pub response_timeout: Duration,
    /// Time given to the engine to exit after `quit` before it is killed.
    pub shutdown_grace: Duration,
    /// Forward engine stderr instead of discarding it.
    pub show_stderr: bool,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            response_timeout: Duration::from_secs(30),
            shutdown_grace: Duration::from_secs(2),
            show_stderr: false,
        }
    }
}

/// Protocol client owning one engine process.
#[derive(Debug)]
pub struct UciClient {
    engine: EngineDescriptor,
    settings: ClientSettings,
    process: Option<ProcessHandle>,
    state: ClientState,
}

impl UciClient {
    /// Creates a client for `engine`. Nothing is launched until [`start`](Self::start).
    pub fn new(engine: EngineDescriptor, settings: ClientSettings) -> Self {
        Self {
            engine,
            settings,
            process: None,
            state: ClientState::NotStarted,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ClientState {
        self.state
    }

    /// Engine this client talks to.
    pub fn engine(&self) -> &EngineDescriptor {
        &self.engine
    }

    /// Launches the engine, performs the `uci` handshake, sends the options and waits for
    /// `readyok`.
    ///
    /// On failure the process is released before the error is returned.
    #[instrument(skip_all, fields(engine = %self.engine))]
    pub fn start(&mut self) -> Result<(), EngineError> {
        if self.state != ClientState::NotStarted {
            return Err(EngineError::NotReady { state: self.state });
        }
        let process = ProcessHandle::launch(
            self.engine.program(),
            self.engine.args(),
            self.engine.name(),
            self.settings.show_stderr,
        )?;
        debug!(pid = process.id(), "engine launched");
        self.process = Some(process);

        let result = self.handshake();
        match result {
            Ok(()) => self.state = ClientState::Ready,
            Err(_) => self.stop(),
        }
        result
    }

    fn handshake(&mut self) -> Result<(), EngineError> {
        self.send("uci")?;
        self.wait_for(HANDSHAKE_ACK, self.settings.response_timeout)?;
        let options = self
            .engine
            .options()
            .iter()
            .map(|(name, value)| format!("setoption name {name} value {value}"))
            .collect::<Vec<_>>();
        for option in &options {
            self.send(option)?;
        }
        self.sync_ready()
    }

    /// Sends `ucinewgame` and waits until the engine is ready again.
    ///
    /// On failure the engine is stopped: its answer may still be pending, so the client cannot
    /// be used again.
    #[instrument(skip_all, fields(engine = %self.engine))]
    pub fn new_game(&mut self) -> Result<(), EngineError> {
        self.ensure_ready()?;
        let result = self.send("ucinewgame").and_then(|_| self.sync_ready());
        self.stop_on_error(result)
    }

    /// Sets up `position` followed by `history` and asks for a move within `limit`.
    ///
    /// `0000` and `(none)` are reported as [`BestMove::NoMove`]. Any error stops the engine, as
    /// for [`new_game`](Self::new_game): later calls fail with [`EngineError::NotReady`].
    #[instrument(skip_all, fields(engine = %self.engine, ply = history.len()))]
    pub fn request_move(
        &mut self,
        position: &StartPosition,
        history: &[String],
        limit: SearchLimit,
    ) -> Result<BestMove, EngineError> {
        self.ensure_ready()?;
        let result = self.search(position, history, limit);
        self.stop_on_error(result)
    }

    fn search(
        &mut self,
        position: &StartPosition,
        history: &[String],
        limit: SearchLimit,
    ) -> Result<BestMove, EngineError> {
        self.send(&position_command(position, history))?;
        self.send(&go_command(limit))?;

        let timeout = match limit {
            SearchLimit::Depth(_) => self.settings.response_timeout,
            SearchLimit::MoveTime(time) => self.settings.response_timeout + time,
        };
        let line = self.wait_for(MOVE_RESULT, timeout)?;
        parse_best_move(&line)
    }

    /// Sends `quit` and releases the process, killing it if it does not exit in time.
    ///
    /// Safe to call in any state; later calls do nothing.
    #[instrument(skip_all, fields(engine = %self.engine))]
    pub fn stop(&mut self) {
        self.state = ClientState::Stopped;
        let Some(mut process) = self.process.take() else {
            return;
        };
        // an engine that already died cannot receive `quit`, release handles it
        let _ = process.write_line("quit");
        match process.release(self.settings.shutdown_grace) {
            Shutdown::Killed => warn!("engine did not quit in time and was killed"),
            Shutdown::Exited | Shutdown::AlreadyReleased => debug!("engine stopped"),
        }
    }

    /// A failed exchange leaves the engine out of step with the client.
    fn stop_on_error<T>(&mut self, result: Result<T, EngineError>) -> Result<T, EngineError> {
        if let Err(e) = &result {
            debug!("stopping engine after failed exchange: {e}");
            self.stop();
        }
        result
    }

    fn ensure_ready(&self) -> Result<(), EngineError> {
        match self.state {
            ClientState::Ready => Ok(()),
            state => Err(EngineError::NotReady { state }),
        }
    }

    fn sync_ready(&mut self) -> Result<(), EngineError> {
        self.send("isready")?;
        self.wait_for(READY_ACK, self.settings.response_timeout)?;
        Ok(())
    }

    fn send(&mut self, line: &str) -> Result<(), EngineError> {
        let process = self.process.as_mut().ok_or(EngineError::NotReady {
            state: self.state,
        })?;
        process.write_line(line)
    }

    /// Skips lines until one starts with `prefix`. The whole wait shares one deadline.
    fn wait_for(&mut self, prefix: &'static str, timeout: Duration) -> Result<String, EngineError> {
        let process = self.process.as_mut().ok_or(EngineError::NotReady {
            state: self.state,
        })?;
        let deadline = Instant::now() + timeout;
        loop {
            let line = process.read_line_until(deadline, prefix, timeout)?;
            let line = line.trim();
            if line.starts_with(prefix) {
                return Ok(line.to_string());
            }
        }
    }
}

impl Drop for UciClient {
    fn drop(&mut self) {
        self.stop();
    }
}

fn position_command(position: &StartPosition, history: &[String]) -> String {
    let mut command = match position {
        StartPosition::StartPos => "position startpos".to_string(),
        StartPosition::Fen(fen) => format!("position fen {fen}"),
    };
    if !history.is_empty() {
        command.push_str(" moves ");
        command.push_str(&history.join(" "));
    }
    command
}

fn go_command(limit: SearchLimit) -> String {
    match limit {
        SearchLimit::Depth(depth) => format!("go depth {depth}"),
        SearchLimit::MoveTime(time) => format!("go movetime {}", time.as_millis()),
    }
}

fn parse_best_move(line: &str) -> Result<BestMove, EngineError> {
    let malformed = || EngineError::MalformedResponse {
        line: line.to_string(),
    };
    let mut tokens = line.split_whitespace();
    if tokens.next() != Some(MOVE_RESULT) {
        return Err(malformed());
    }
    match tokens.next() {
        Some(NULL_MOVE) | Some(NO_MOVE) => Ok(BestMove::NoMove),
        Some(mv) if is_coordinate_move(mv) => Ok(BestMove::Move(mv.to_string())),
        _ => Err(malformed()),
    }
}

/// `e2e4`, `e7e8q`: two squares and an optional promotion piece.
fn is_coordinate_move(mv: &str) -> bool {
    let bytes = mv.as_bytes();
    let is_square = |file: u8, rank: u8| (b'a'..=b'h').contains(&file) && (b'1'..=b'8').contains(&rank);
    match bytes {
        [f1, r1, f2, r2] => is_square(*f1, *r1) && is_square(*f2, *r2),
        [f1, r1, f2, r2, promotion] => {
            is_square(*f1, *r1) && is_square(*f2, *r2) && b"qrbn".contains(promotion)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_command() {
        assert_eq!(
            position_command(&StartPosition::StartPos, &[]),
            "position startpos"
        );
        let history = vec!["e2e4".to_string(), "e7e5".to_string()];
        assert_eq!(
            position_command(&StartPosition::StartPos, &history),
            "position startpos moves e2e4 e7e5"
        );
        let fen = "8/8/8/8/8/8/6k1/4K2R w K - 0 1".to_string();
        assert_eq!(
            position_command(&StartPosition::Fen(fen.clone()), &history[..1]),
            format!("position fen {fen} moves e2e4")
        );
    }

    #[test]
    fn test_go_command() {
        assert_eq!(go_command(SearchLimit::Depth(8)), "go depth 8");
        assert_eq!(
            go_command(SearchLimit::MoveTime(Duration::from_millis(1500))),
            "go movetime 1500"
        );
    }

    #[test]
    fn test_parse_best_move() {
        assert_eq!(
            parse_best_move("bestmove e2e4 ponder e7e5").unwrap(),
            BestMove::Move("e2e4".to_string())
        );
        assert_eq!(
            parse_best_move("bestmove a7a8q").unwrap(),
            BestMove::Move("a7a8q".to_string())
        );
        assert_eq!(parse_best_move("bestmove 0000").unwrap(), BestMove::NoMove);
        assert_eq!(parse_best_move("bestmove (none)").unwrap(), BestMove::NoMove);
    }

    #[test]
    fn test_parse_malformed_best_move() {
        for line in ["bestmove", "bestmove e2", "bestmove e9e4", "bestmove e7e8k", "bestmoves e2e4"] {
            assert!(
                matches!(
                    parse_best_move(line),
                    Err(EngineError::MalformedResponse { .. })
                ),
                "{line} should be malformed"
            );
        }
    }

    #[test]
    fn test_side_to_move_from_fen() {
        assert!(StartPosition::StartPos.white_to_move());
        assert!(!StartPosition::Fen("8/8/8/8/8/8/6k1/4K2R b K - 0 1".to_string()).white_to_move());
        assert!(StartPosition::Fen("8/8/8/8/8/8/6k1/4K2R w K - 0 1".to_string()).white_to_move());
    }

    #[test]
    fn test_requests_need_ready_client() {
        let mut client = UciClient::new(
            EngineDescriptor::new("idle", "never-launched"),
            ClientSettings::default(),
        );
        assert!(matches!(
            client.new_game(),
            Err(EngineError::NotReady {
                state: ClientState::NotStarted
            })
        ));
        assert!(matches!(
            client.request_move(&StartPosition::StartPos, &[], SearchLimit::Depth(1)),
            Err(EngineError::NotReady { .. })
        ));
        client.stop();
        client.stop();
        assert_eq!(client.state(), ClientState::Stopped);
        assert!(matches!(client.start(), Err(EngineError::NotReady { .. })));
    }

    #[test]
    fn test_start_missing_program() {
        let mut client = UciClient::new(
            EngineDescriptor::new("ghost", "./definitely-not-an-engine"),
            ClientSettings::default(),
        );
        assert!(matches!(
            client.start(),
            Err(EngineError::ProcessLaunch { .. })
        ));
    }
}
