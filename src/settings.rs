//! Limits applied to every game of a tournament.
//!
//! The main entry point is [`GameSettingsBuilder`], which uses a builder pattern to configure:
//!
//! - **Game length**: the ply cap after which a game is drawn
//! - **Search**: a fixed depth or a fixed time per move
//! - **Start position**: the initial position or a FEN
//! - **Timing**: the deadline of every engine answer and the grace period given to an engine
//!   to quit before it is killed
//! - **Repetitions**: games played per ordered pair of engines
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use uci_tournament::settings::GameSettingsBuilder;
//!
//! let settings = GameSettingsBuilder::new()
//!     .with_ply_limit(200)
//!     .with_move_time(Duration::from_millis(100))
//!     .with_response_timeout(Duration::from_secs(5))
//!     .with_games_per_pairing(2)
//!     .build()
//!     .unwrap();
//! assert_eq!(settings.games_per_pairing(), 2);
//! ```
//!
//! You may also read settings from environment variables using
//! [`GameSettingsBuilder::from_env()`].

use std::{env, time::Duration};

use anyhow::{bail, Context};
use tracing::warn;

use crate::{
    game::{GameConfig, DEFAULT_PLY_LIMIT},
    uci_client::{ClientSettings, SearchLimit, StartPosition},
};

/// Builder for [`GameSettings`].
///
/// Unset values fall back to: 300 plies, depth 6, the initial position, 30 s response timeout,
/// 2 s shutdown grace and one game per ordered pair.
#[derive(Debug, Default)]
pub struct GameSettingsBuilder {
    ply_limit: Option<u32>,
    depth: Option<u32>,
    move_time: Option<Duration>,
    start_fen: Option<String>,
    response_timeout: Option<Duration>,
    shutdown_grace: Option<Duration>,
    games_per_pairing: Option<usize>,
}

impl GameSettingsBuilder {
    /// Creates a builder with every value left to its default.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder configured from environment variables.
    ///
    /// Read environment variables are:
    /// - `UCI_PLY_LIMIT` (u32): ply cap
    /// - `UCI_DEPTH` (u32): search depth
    /// - `UCI_MOVETIME_MS` (u64): time per move in milliseconds, overrides `UCI_DEPTH`
    /// - `UCI_START_FEN` (string): start position
    /// - `UCI_RESPONSE_TIMEOUT_MS` (u64): deadline of every engine answer
    /// - `UCI_SHUTDOWN_GRACE_MS` (u64): time given to an engine to quit
    /// - `UCI_GAMES_PER_PAIRING` (usize): games per ordered pair
    #[must_use]
    pub fn from_env() -> Self {
        fn parse<T: std::str::FromStr>(var: &str) -> Option<T> {
            env::var(var).ok()?.parse().ok()
        }

        fn parse_duration_millis(var: &str) -> Option<Duration> {
            parse::<u64>(var).map(Duration::from_millis)
        }

        GameSettingsBuilder {
            ply_limit: parse("UCI_PLY_LIMIT"),
            depth: parse("UCI_DEPTH"),
            move_time: parse_duration_millis("UCI_MOVETIME_MS"),
            start_fen: env::var("UCI_START_FEN").ok(),
            response_timeout: parse_duration_millis("UCI_RESPONSE_TIMEOUT_MS"),
            shutdown_grace: parse_duration_millis("UCI_SHUTDOWN_GRACE_MS"),
            games_per_pairing: parse("UCI_GAMES_PER_PAIRING"),
        }
    }

    /// Sets the number of plies after which a game is drawn.
    #[must_use]
    pub fn with_ply_limit(self, plies: u32) -> Self {
        Self {
            ply_limit: Some(plies),
            ..self
        }
    }

    /// Searches every move to a fixed depth.
    ///
    /// This will be ignored if `with_move_time` is also specified.
    #[must_use]
    pub fn with_depth(self, depth: u32) -> Self {
        if self.move_time.is_some() {
            warn!("`with_depth` is ignored if `with_move_time` is used!");
        }
        Self {
            depth: Some(depth),
            ..self
        }
    }

    /// Searches every move for a fixed time.
    #[must_use]
    pub fn with_move_time(self, time: Duration) -> Self {
        Self {
            move_time: Some(time),
            ..self
        }
    }

    /// Starts every game from `fen` instead of the initial position.
    #[must_use]
    pub fn with_start_fen(self, fen: impl Into<String>) -> Self {
        Self {
            start_fen: Some(fen.into()),
            ..self
        }
    }

    /// Sets the deadline of every blocking wait on an engine.
    #[must_use]
    pub fn with_response_timeout(self, timeout: Duration) -> Self {
        Self {
            response_timeout: Some(timeout),
            ..self
        }
    }

    /// Sets how long an engine may take to exit after `quit` before being killed.
    #[must_use]
    pub fn with_shutdown_grace(self, grace: Duration) -> Self {
        Self {
            shutdown_grace: Some(grace),
            ..self
        }
    }

    /// Sets the number of games for each ordered pair of engines.
    #[must_use]
    pub fn with_games_per_pairing(self, games: usize) -> Self {
        Self {
            games_per_pairing: Some(games),
            ..self
        }
    }

    /// Consumes the builder and returns the constructed [`GameSettings`].
    ///
    /// # Errors
    ///
    /// Returns an error when a value cannot work, e.g. a zero ply limit or response timeout.
    pub fn build(self) -> anyhow::Result<GameSettings> {
        let defaults = ClientSettings::default();

        let ply_limit = self.ply_limit.unwrap_or(DEFAULT_PLY_LIMIT);
        if ply_limit == 0 {
            bail!("ply limit must be at least 1");
        }

        let search_limit = match (self.move_time, self.depth) {
            (Some(time), _) if time.is_zero() => bail!("move time must not be zero"),
            (Some(time), _) => SearchLimit::MoveTime(time),
            (None, Some(0)) => bail!("search depth must be at least 1"),
            (None, Some(depth)) => SearchLimit::Depth(depth),
            (None, None) => SearchLimit::default(),
        };

        let start_position = match self.start_fen {
            Some(fen) => {
                let fen = fen.trim().to_string();
                check_fen_shape(&fen).with_context(|| format!("invalid start position '{fen}'"))?;
                StartPosition::Fen(fen)
            }
            None => StartPosition::StartPos,
        };

        let response_timeout = self.response_timeout.unwrap_or(defaults.response_timeout);
        if response_timeout.is_zero() {
            bail!("response timeout must not be zero");
        }

        let games_per_pairing = self.games_per_pairing.unwrap_or(1);
        if games_per_pairing == 0 {
            bail!("must play at least one game per pairing");
        }

        Ok(GameSettings {
            game: GameConfig {
                ply_limit,
                search_limit,
                start_position,
                client: ClientSettings {
                    response_timeout,
                    shutdown_grace: self.shutdown_grace.unwrap_or(defaults.shutdown_grace),
                    show_stderr: defaults.show_stderr,
                },
            },
            games_per_pairing,
        })
    }
}

/// Only the layout is checked; the position itself is the engines' business.
fn check_fen_shape(fen: &str) -> anyhow::Result<()> {
    let mut fields = fen.split_whitespace();
    let board = fields.next().context("empty FEN")?;
    if board.split('/').count() != 8 {
        bail!("board must have 8 ranks");
    }
    match fields.next() {
        Some("w") | Some("b") => Ok(()),
        Some(other) => bail!("side to move must be 'w' or 'b', got '{other}'"),
        None => bail!("missing side to move"),
    }
}

/// Validated limits for the games of a tournament.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSettings {
    pub(crate) game: GameConfig,
    pub(crate) games_per_pairing: usize,
}

impl GameSettings {
    /// Limits of a single game.
    pub fn game(&self) -> &GameConfig {
        &self.game
    }

    /// Games per ordered pair of engines.
    pub fn games_per_pairing(&self) -> usize {
        self.games_per_pairing
    }
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            game: GameConfig::default(),
            games_per_pairing: 1,
        }
    }
}
