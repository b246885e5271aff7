//! Single game between two engines.
//!
//! A game goes through `Initializing -> AwaitingMove(side) -> Terminal`. Both players are
//! stopped when the game ends, whichever way it ends.

use std::{
    fmt::Display,
    ops::{Deref, DerefMut},
};

use tracing::{debug, info, instrument, warn};

use crate::{
    engine::{EngineDescriptor, EngineId},
    error::EngineError,
    uci_client::{BestMove, ClientSettings, SearchLimit, StartPosition, UciClient},
};

/// Default number of plies after which a game is declared drawn.
pub const DEFAULT_PLY_LIMIT: u32 = 300;

/// Something that can play one side of a game.
///
/// Implemented by [`UciClient`]; the game runner only talks to players through this trait.
pub trait Player {
    /// Identity used in the game record.
    fn engine_id(&self) -> &EngineId;

    /// Launches the player and makes it ready.
    fn start(&mut self) -> Result<(), EngineError>;

    /// Prepares the player for a fresh game.
    fn new_game(&mut self) -> Result<(), EngineError>;

    /// Asks for a move in `position` after `history`.
    fn request_move(
        &mut self,
        position: &StartPosition,
        history: &[String],
        limit: SearchLimit,
    ) -> Result<BestMove, EngineError>;

    /// Releases the player. Must be idempotent.
    fn stop(&mut self);
}

impl Player for UciClient {
    fn engine_id(&self) -> &EngineId {
        self.engine().id()
    }

    fn start(&mut self) -> Result<(), EngineError> {
        UciClient::start(self)
    }

    fn new_game(&mut self) -> Result<(), EngineError> {
        UciClient::new_game(self)
    }

    fn request_move(
        &mut self,
        position: &StartPosition,
        history: &[String],
        limit: SearchLimit,
    ) -> Result<BestMove, EngineError> {
        UciClient::request_move(self, position, history, limit)
    }

    fn stop(&mut self) {
        UciClient::stop(self)
    }
}

/// A side of the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    /// Moves first from the initial position.
    White,
    /// The other one.
    Black,
}

impl Color {
    /// The other side.
    pub fn opponent(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    fn wins(self) -> GameResult {
        match self {
            Color::White => GameResult::WhiteWins,
            Color::Black => GameResult::BlackWins,
        }
    }
}

/// Final result of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameResult {
    /// 1-0
    WhiteWins,
    /// 0-1
    BlackWins,
    /// 1/2-1/2
    Draw,
}

impl GameResult {
    /// Points awarded to `side`: 1, 0 or 0.5.
    pub fn score(self, side: Color) -> f64 {
        match (self, side) {
            (GameResult::Draw, _) => 0.5,
            (GameResult::WhiteWins, Color::White) | (GameResult::BlackWins, Color::Black) => 1.0,
            _ => 0.0,
        }
    }
}

impl Display for GameResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            GameResult::WhiteWins => "1-0",
            GameResult::BlackWins => "0-1",
            GameResult::Draw => "1/2-1/2",
        };
        f.write_str(s)
    }
}

/// Why a game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The side to move had no move. Checkmate and stalemate are not told apart.
    NoLegalMove,
    /// The ply cap was reached.
    PlyLimit,
    /// An engine failed (launch, timeout, crash, garbage) and forfeited.
    EngineFault,
}

/// Outcome of one finished game. Immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct GameRecord {
    white: EngineId,
    black: EngineId,
    result: GameResult,
    termination: Termination,
    moves: Vec<String>,
    fault: Option<String>,
}

impl GameRecord {
    /// Builds a record from its parts. The ply count is the number of moves.
    pub fn new(
        white: EngineId,
        black: EngineId,
        result: GameResult,
        termination: Termination,
        moves: Vec<String>,
    ) -> Self {
        Self {
            white,
            black,
            result,
            termination,
            moves,
            fault: None,
        }
    }

    fn with_fault(mut self, fault: &EngineError) -> Self {
        self.fault = Some(fault.to_string());
        self
    }

    /// White player.
    pub fn white(&self) -> &EngineId {
        &self.white
    }

    /// Black player.
    pub fn black(&self) -> &EngineId {
        &self.black
    }

    /// Final result.
    pub fn result(&self) -> GameResult {
        self.result
    }

    /// Reason the game ended.
    pub fn termination(&self) -> Termination {
        self.termination
    }

    /// Number of plies played.
    pub fn ply_count(&self) -> usize {
        self.moves.len()
    }

    /// Moves played, in coordinate notation.
    pub fn moves(&self) -> &[String] {
        &self.moves
    }

    /// Description of the engine fault, for [`Termination::EngineFault`] games.
    pub fn fault(&self) -> Option<&str> {
        self.fault.as_deref()
    }

    /// Numbered movetext followed by the result, e.g. `1. e2e4 e7e5 2. g1f3 1/2-1/2`.
    ///
    /// Numbering assumes white moved first.
    pub fn movetext(&self) -> String {
        let mut parts = self
            .moves
            .chunks(2)
            .enumerate()
            .map(|(i, pair)| format!("{}. {}", i + 1, pair.join(" ")))
            .collect::<Vec<_>>();
        parts.push(self.result.to_string());
        parts.join(" ")
    }
}

/// Limits of a single game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameConfig {
    /// Plies after which the game is drawn. Must be at least 1.
    pub ply_limit: u32,
    /// Search limit sent with every move request.
    pub search_limit: SearchLimit,
    /// Position the game starts from.
    pub start_position: StartPosition,
    /// Timing given to every client.
    pub client: ClientSettings,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            ply_limit: DEFAULT_PLY_LIMIT,
            search_limit: SearchLimit::default(),
            start_position: StartPosition::StartPos,
            client: ClientSettings::default(),
        }
    }
}

#[derive(Debug)]
enum GameState {
    Initializing,
    AwaitingMove(Color),
    Terminal(GameRecord),
}

/// Stops its player when dropped, on every exit path of the game.
struct Seat<'a, P: Player>(&'a mut P);

impl<P: Player> Deref for Seat<'_, P> {
    type Target = P;

    fn deref(&self) -> &P {
        &*self.0
    }
}

impl<P: Player> DerefMut for Seat<'_, P> {
    fn deref_mut(&mut self) -> &mut P {
        &mut *self.0
    }
}

impl<P: Player> Drop for Seat<'_, P> {
    fn drop(&mut self) {
        self.0.stop();
    }
}

/// Plays games to completion.
pub struct GameRunner {
    config: GameConfig,
}

impl GameRunner {
    /// Creates a runner using `config` for every game.
    ///
    /// # Panics
    ///
    /// Panics if `config.ply_limit` is 0. Settings built with
    /// [`GameSettingsBuilder`](crate::settings::GameSettingsBuilder) never are.
    pub fn new(config: GameConfig) -> Self {
        assert!(config.ply_limit >= 1, "ply limit must be at least 1");
        Self { config }
    }

    /// Configuration used for every game.
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Plays one game between fresh clients of `white` and `black`.
    pub fn play(&self, white: &EngineDescriptor, black: &EngineDescriptor) -> GameRecord {
        let mut white = UciClient::new(white.clone(), self.config.client);
        let mut black = UciClient::new(black.clone(), self.config.client);
        self.play_between(&mut white, &mut black)
    }

    /// Plays one game between two players and stops both of them before returning.
    #[instrument(skip_all, fields(white = %white.engine_id(), black = %black.engine_id()))]
    pub fn play_between<W: Player, B: Player>(&self, white: &mut W, black: &mut B) -> GameRecord {
        let white_id = white.engine_id().clone();
        let black_id = black.engine_id().clone();
        let mut white = Seat(white);
        let mut black = Seat(black);

        let position = &self.config.start_position;
        let first = if position.white_to_move() {
            Color::White
        } else {
            Color::Black
        };
        let mut moves: Vec<String> = vec![];
        let mut state = GameState::Initializing;

        let record = loop {
            state = match state {
                GameState::Initializing => {
                    match Self::initialize(&mut *white, &mut *black) {
                        Ok(()) => GameState::AwaitingMove(first),
                        Err((side, e)) => {
                            warn!("{side:?} failed to initialize: {e}");
                            GameState::Terminal(
                                GameRecord::new(
                                    white_id.clone(),
                                    black_id.clone(),
                                    side.opponent().wins(),
                                    Termination::EngineFault,
                                    vec![],
                                )
                                .with_fault(&e),
                            )
                        }
                    }
                }
                GameState::AwaitingMove(side) => {
                    let reply = match side {
                        Color::White => {
                            white.request_move(position, &moves, self.config.search_limit)
                        }
                        Color::Black => {
                            black.request_move(position, &moves, self.config.search_limit)
                        }
                    };
                    let finish = |result, termination, moves: &mut Vec<String>| {
                        GameRecord::new(
                            white_id.clone(),
                            black_id.clone(),
                            result,
                            termination,
                            std::mem::take(moves),
                        )
                    };
                    match reply {
                        Ok(BestMove::NoMove) => {
                            info!(ply = moves.len(), "{side:?} has no legal move");
                            GameState::Terminal(finish(
                                side.opponent().wins(),
                                Termination::NoLegalMove,
                                &mut moves,
                            ))
                        }
                        Ok(BestMove::Move(mv)) => {
                            moves.push(mv);
                            if moves.len() % 10 == 0 {
                                debug!("ply {}: {}", moves.len(), moves[moves.len() - 1]);
                            }
                            if moves.len() >= self.config.ply_limit as usize {
                                GameState::Terminal(finish(
                                    GameResult::Draw,
                                    Termination::PlyLimit,
                                    &mut moves,
                                ))
                            } else {
                                GameState::AwaitingMove(side.opponent())
                            }
                        }
                        Err(e) => {
                            warn!(ply = moves.len(), "{side:?} forfeits: {e}");
                            let record = finish(
                                side.opponent().wins(),
                                Termination::EngineFault,
                                &mut moves,
                            );
                            GameState::Terminal(record.with_fault(&e))
                        }
                    }
                }
                GameState::Terminal(record) => break record,
            };
        };

        white.stop();
        black.stop();
        info!(
            result = %record.result,
            termination = ?record.termination,
            plies = record.ply_count(),
            "game over"
        );
        record
    }

    fn initialize<W: Player, B: Player>(
        white: &mut W,
        black: &mut B,
    ) -> Result<(), (Color, EngineError)> {
        white.start().map_err(|e| (Color::White, e))?;
        black.start().map_err(|e| (Color::Black, e))?;
        white.new_game().map_err(|e| (Color::White, e))?;
        black.new_game().map_err(|e| (Color::Black, e))?;
        Ok(())
    }
}
