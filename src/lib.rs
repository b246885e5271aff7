//! # UCI Tournament
//!
//! A Rust crate for running round-robin tournaments between chess engines speaking the
//! Universal Chess Interface (UCI).
//!
//! It provides:
//! - A lock-step UCI client with a deadline on every answer (`UciClient`)
//! - A game runner turning every engine failure into a forfeit (`GameRunner`)
//! - A round-robin schedule alternating colours inside each pairing (`RoundRobinSchedule`)
//! - A score board deriving standings from the full game log (`ScoreBoard`)
//! - A tournament driver tying them together, with cancellation (`Tournament`)
//!
//! Each engine runs as a separate OS process, launched fresh for every game and always stopped
//! when the game ends, even when it hangs or ignores `quit`.
//!
//! # Documentation Overview
//!
//! - For running a whole tournament, see the [`tournament`] module.
//! - For the protocol exchange and its timeouts, see [`uci_client`].
//! - For game rules (ply cap, forfeits, no-move handling), see [`game`].
//! - For configuring behavior and limits, see [`Configuration`](crate::configuration::Configuration)
//!   and [`settings`].
//!
//! # Usage Example
//!
//! ```no_run
//! use std::time::Duration;
//! use uci_tournament::prelude::*;
//!
//! fn main() -> anyhow::Result<()> {
//!     let roster = vec![
//!         EngineDescriptor::from_command_line("Chess++ Depth-4 (A)", "../build/chesscpp2 --uci")
//!             .with_option("Depth", "4"),
//!         EngineDescriptor::from_command_line("Chess++ Depth-4 (B)", "../build/chesscpp2 --uci")
//!             .with_option("Depth", "4"),
//!     ];
//!
//!     let settings = GameSettingsBuilder::new()
//!         .with_depth(4)
//!         .with_games_per_pairing(6)
//!         .with_response_timeout(Duration::from_secs(10))
//!         .build()?;
//!
//!     let tournament = Tournament::new(roster, Configuration::from_env(), settings);
//!     let report = tournament.run()?;
//!
//!     for entry in report.scoreboard.standings() {
//!         println!("{entry}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Engine Requirements
//!
//! - Answer `uci` with `uciok` and `isready` with `readyok`
//! - Answer `go` with `bestmove <move>`, using `0000` or `(none)` when there is no move
//! - Exit on `quit` (engines that do not are killed after a grace period)
#![warn(missing_docs)]

pub use anyhow;
pub mod configuration;
pub mod engine;
pub mod error;
pub mod game;
mod logger;
pub mod process;
pub mod scoreboard;
pub mod settings;
pub mod tournament;
pub mod tournament_scheduler;
pub mod uci_client;

pub use logger::init_logger;

/// Commonly used types and traits for quick access.
///
/// Import this prelude to get started easily:
/// ```rust
/// use uci_tournament::prelude::*;
/// ```
///
/// Includes:
/// - [`Configuration`](crate::configuration::Configuration)
/// - [`GameSettingsBuilder`](crate::settings::GameSettingsBuilder)
/// - [`EngineDescriptor`](crate::engine::EngineDescriptor)
/// - [`Tournament`](crate::tournament::Tournament)
pub mod prelude {
    pub use crate::configuration::Configuration;
    pub use crate::engine::{EngineDescriptor, EngineId};
    pub use crate::error::EngineError;
    pub use crate::game::{GameRecord, GameResult, GameRunner, Player, Termination};
    pub use crate::scoreboard::{ScoreBoard, StandingsEntry};
    pub use crate::settings::{GameSettings, GameSettingsBuilder};
    pub use crate::tournament::{CancellationToken, Tournament, TournamentReport};
    pub use crate::uci_client::{BestMove, SearchLimit, StartPosition, UciClient};
}
