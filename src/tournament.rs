//! Core tournament logic.
//!
//! This module defines the [`Tournament`] type, which orchestrates a round-robin between UCI
//! engines. Its responsibilities include:
//!
//! - Preparing engine descriptors (tablebase and opening book options)
//! - Planning games with [`RoundRobinSchedule`]
//! - Playing them one at a time with a [`GameRunner`]
//! - Recording every result in a [`ScoreBoard`]
//!
//! # Failures
//!
//! An engine that cannot be launched, answers too late, crashes or answers garbage loses the game
//! it was playing; the tournament goes on with the next game.
//!
//! # Cancellation
//!
//! [`Tournament::cancellation_token`] returns a handle that can be triggered from anywhere (for
//! instance a Ctrl-C handler). The tournament stops before starting the next game; games already
//! recorded are kept in the returned report.
//!
//! # Example
//!
//! ```no_run
//! use uci_tournament::prelude::*;
//!
//! fn main() -> anyhow::Result<()> {
//!     let roster = vec![
//!         EngineDescriptor::from_command_line("Chess++ Depth-8", "./build/chesscpp2 --uci")
//!             .with_option("Depth", "8"),
//!         EngineDescriptor::new("Stockfish Level-3", "stockfish").with_option("Skill Level", "3"),
//!     ];
//!     let settings = GameSettingsBuilder::new()
//!         .with_depth(8)
//!         .with_games_per_pairing(3)
//!         .build()?;
//!
//!     let tournament = Tournament::new(roster, Configuration::new(), settings);
//!     let report = tournament.run()?;
//!     println!("{}", report.scoreboard);
//!     Ok(())
//! }
//! ```

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::bail;
use tracing::{info, instrument, trace};

use crate::{
    configuration::Configuration,
    engine::EngineDescriptor,
    game::{GameRecord, GameResult, GameRunner, Termination},
    logger::init_logger_once,
    scoreboard::ScoreBoard,
    settings::GameSettings,
    tournament_scheduler::{RoundRobinSchedule, ScheduledGame},
};

/// Cloneable handle stopping a running tournament before its next game.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// Creates a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// True once [`cancel`](Self::cancel) was called on any clone.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// What a tournament produced.
#[derive(Debug, Clone)]
pub struct TournamentReport {
    /// Every game played and the standings derived from them.
    pub scoreboard: ScoreBoard,
    /// Number of games in the plan.
    pub scheduled: usize,
    /// True when the tournament was cancelled before the end of the plan.
    pub cancelled: bool,
}

/// A round-robin tournament between UCI engines.
pub struct Tournament {
    roster: Vec<EngineDescriptor>,
    config: Configuration,
    settings: GameSettings,
    cancel: CancellationToken,
}

impl Tournament {
    /// Creates a tournament between `roster`.
    ///
    /// Engines receive the tablebase directory and opening book from `config` when those exist
    /// and the engine does not set them itself. The roster is not modified afterwards.
    pub fn new(
        roster: Vec<EngineDescriptor>,
        config: Configuration,
        mut settings: GameSettings,
    ) -> Self {
        let roster = roster
            .into_iter()
            .map(|engine| {
                let engine = if config.use_tablebase {
                    engine.with_tablebase_dir(&config.tablebase_dir)
                } else {
                    engine
                };
                if config.use_book {
                    engine.with_opening_book(&config.book_path)
                } else {
                    engine
                }
            })
            .collect();
        settings.game.client.show_stderr = config.debug_engine_stderr;

        Tournament {
            roster,
            config,
            settings,
            cancel: CancellationToken::new(),
        }
    }

    /// Engines taking part, as they will be launched.
    pub fn roster(&self) -> &[EngineDescriptor] {
        &self.roster
    }

    /// Handle to cancel [`run`](Self::run) from another thread.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Plays every scheduled game, one after the other.
    ///
    /// # Errors
    /// Returns an error if fewer than two engines are given or the log file cannot be set up.
    /// The log file is set up by the first run with logging enabled; later runs in the same
    /// process reuse it. Engine failures are never errors: they lose the game being played.
    #[instrument(skip_all)]
    pub fn run(&self) -> anyhow::Result<TournamentReport> {
        if self.config.log {
            init_logger_once()?;
        }
        trace!(config = ?self.config, settings = ?self.settings);

        if self.roster.len() < 2 {
            bail!(
                "a round-robin needs at least two engines, got {}",
                self.roster.len()
            );
        }
        let names = self
            .roster
            .iter()
            .map(EngineDescriptor::name)
            .collect::<Vec<_>>();
        info!(engines = ?names, "starting round-robin");

        let plan = RoundRobinSchedule::new(self.settings.games_per_pairing).plan(self.roster.len());
        let runner = GameRunner::new(self.settings.game.clone());
        let mut scoreboard = ScoreBoard::with_participants(&self.roster);
        let mut cancelled = false;

        for game in &plan {
            if self.cancel.is_cancelled() {
                info!(
                    played = scoreboard.games_played(),
                    scheduled = plan.len(),
                    "tournament cancelled"
                );
                cancelled = true;
                break;
            }

            let white = &self.roster[game.white];
            let black = &self.roster[game.black];
            if self.config.verbose {
                println!(
                    "\n[Game {}/{}] {} (White) vs {} (Black)",
                    game.index + 1,
                    plan.len(),
                    white.name(),
                    black.name()
                );
            }

            let record = runner.play(white, black);
            info!(game = game.index, "{}", describe(game, white, black, &record));
            if self.config.verbose {
                print_game_result(white, black, &record);
            }

            scoreboard.record(record);
            if self.config.verbose {
                println!("\n{scoreboard}");
            }
        }

        Ok(TournamentReport {
            scoreboard,
            scheduled: plan.len(),
            cancelled,
        })
    }
}

fn describe(
    game: &ScheduledGame,
    white: &EngineDescriptor,
    black: &EngineDescriptor,
    record: &GameRecord,
) -> String {
    format!(
        "{} VS {} (pairing game {}): {} after {} plies ({:?})",
        white.name(),
        black.name(),
        game.game_in_pairing,
        record.result(),
        record.ply_count(),
        record.termination()
    )
}

fn print_game_result(white: &EngineDescriptor, black: &EngineDescriptor, record: &GameRecord) {
    let winner = match record.result() {
        GameResult::WhiteWins => Some(white),
        GameResult::BlackWins => Some(black),
        GameResult::Draw => None,
    };
    let reason = match record.termination() {
        Termination::NoLegalMove => "no legal move".to_string(),
        Termination::PlyLimit => "max moves".to_string(),
        Termination::EngineFault => format!(
            "engine fault: {}",
            record.fault().unwrap_or("unknown error")
        ),
    };
    match winner {
        Some(engine) => println!("  Result: {} wins ({reason})", engine.name()),
        None => println!("  Result: Draw ({reason})"),
    }
    println!("  {}", record.movetext());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{BOOK_OPTION, TABLEBASE_OPTION};

    #[test]
    fn test_needs_two_engines() {
        let tournament = Tournament::new(
            vec![EngineDescriptor::new("alone", "alone")],
            Configuration::new().with_verbose(false),
            GameSettings::default(),
        );
        assert!(tournament.run().is_err());
    }

    #[test]
    fn test_auto_resources_applied_to_roster() {
        let dir = std::env::temp_dir();
        let config = Configuration::new()
            .with_verbose(false)
            .with_tablebase_dir(&dir)
            .with_book_path("/definitely/not/a/book.bin");
        let tournament = Tournament::new(
            vec![
                EngineDescriptor::new("a", "a"),
                EngineDescriptor::new("b", "b").with_option(TABLEBASE_OPTION, "/elsewhere"),
            ],
            config,
            GameSettings::default(),
        );
        let roster = tournament.roster();
        assert_eq!(
            roster[0].options().get(TABLEBASE_OPTION),
            Some(&dir.display().to_string())
        );
        assert_eq!(
            roster[1].options().get(TABLEBASE_OPTION).map(String::as_str),
            Some("/elsewhere")
        );
        assert!(roster.iter().all(|e| !e.options().contains_key(BOOK_OPTION)));
    }

    #[test]
    fn test_auto_resources_can_be_disabled() {
        let config = Configuration::new()
            .with_verbose(false)
            .with_use_tablebase(false)
            .with_tablebase_dir(std::env::temp_dir());
        let tournament = Tournament::new(
            vec![EngineDescriptor::new("a", "a"), EngineDescriptor::new("b", "b")],
            config,
            GameSettings::default(),
        );
        assert!(tournament
            .roster()
            .iter()
            .all(|e| e.options().is_empty()));
    }

    #[test]
    fn test_cancelled_before_start_plays_nothing() {
        let tournament = Tournament::new(
            vec![
                EngineDescriptor::new("a", "./definitely-not-an-engine"),
                EngineDescriptor::new("b", "./definitely-not-an-engine"),
            ],
            Configuration::new().with_verbose(false),
            GameSettings::default(),
        );
        tournament.cancellation_token().cancel();
        let report = tournament.run().unwrap();
        assert!(report.cancelled);
        assert_eq!(report.scheduled, 2);
        assert_eq!(report.scoreboard.games_played(), 0);
    }

    #[test]
    fn test_unlaunchable_engines_forfeit_and_tournament_continues() {
        let tournament = Tournament::new(
            vec![
                EngineDescriptor::new("a", "./definitely-not-an-engine"),
                EngineDescriptor::new("b", "./definitely-not-an-engine-either"),
            ],
            Configuration::new().with_verbose(false),
            GameSettings::default(),
        );
        let report = tournament.run().unwrap();
        assert!(!report.cancelled);
        assert_eq!(report.scoreboard.games_played(), 2);
        for record in report.scoreboard.records() {
            // white is launched first and forfeits
            assert_eq!(record.termination(), Termination::EngineFault);
            assert_eq!(record.result(), GameResult::BlackWins);
        }
        assert_eq!(report.scoreboard.total_points(), 2.0);
    }
}
