//! Game log and the standings derived from it.
//!
//! The log is the only state: standings are rebuilt from every recorded game each time they are
//! asked for, so they can never drift from the games actually played.

use std::{collections::HashMap, fmt::Display};

use crate::{
    engine::{EngineDescriptor, EngineId},
    game::{Color, GameRecord, GameResult},
};

/// Standing of one competitor.
#[derive(Debug, Clone, PartialEq)]
pub struct StandingsEntry {
    /// Competitor identity.
    pub id: EngineId,
    /// Display name (first registered name for this id).
    pub name: String,
    /// Points: 1 per win, 0.5 per draw.
    pub score: f64,
    /// Number of wins.
    pub wins: u32,
    /// Number of draws.
    pub draws: u32,
    /// Number of losses.
    pub losses: u32,
}

impl StandingsEntry {
    fn new(id: EngineId, name: String) -> Self {
        Self {
            id,
            name,
            score: 0.0,
            wins: 0,
            draws: 0,
            losses: 0,
        }
    }

    /// Games counted in this entry.
    pub fn games(&self) -> u32 {
        self.wins + self.draws + self.losses
    }

    fn add(&mut self, result: GameResult, side: Color) {
        let points = result.score(side);
        self.score += points;
        if result == GameResult::Draw {
            self.draws += 1;
        } else if points > 0.0 {
            self.wins += 1;
        } else {
            self.losses += 1;
        }
    }
}

impl Display for StandingsEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:40} {:5.1} (+{} ={} -{})",
            self.name, self.score, self.wins, self.draws, self.losses
        )
    }
}

/// Append-only log of finished games.
#[derive(Debug, Clone, Default)]
pub struct ScoreBoard {
    participants: Vec<(EngineId, String)>,
    records: Vec<GameRecord>,
}

impl ScoreBoard {
    /// Creates an empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a board listing every engine of `roster`, even before it plays.
    ///
    /// Descriptors sharing an id are listed once, under the first name seen.
    pub fn with_participants<'a>(roster: impl IntoIterator<Item = &'a EngineDescriptor>) -> Self {
        let mut board = Self::new();
        for engine in roster {
            board.register(engine.id(), engine.name());
        }
        board
    }

    fn register(&mut self, id: &EngineId, name: &str) {
        if !self.participants.iter().any(|(known, _)| known == id) {
            self.participants.push((id.clone(), name.to_string()));
        }
    }

    /// Appends a finished game.
    pub fn record(&mut self, record: GameRecord) {
        self.register(record.white(), record.white().as_str());
        self.register(record.black(), record.black().as_str());
        self.records.push(record);
    }

    /// Every game recorded so far, in order.
    pub fn records(&self) -> &[GameRecord] {
        &self.records
    }

    /// Number of games recorded.
    pub fn games_played(&self) -> usize {
        self.records.len()
    }

    /// Sum of all points handed out. Always equals [`games_played`](Self::games_played).
    pub fn total_points(&self) -> f64 {
        self.standings().iter().map(|entry| entry.score).sum()
    }

    /// Standings by descending score, rebuilt from the whole log.
    ///
    /// Equal scores keep the order in which competitors were first seen.
    pub fn standings(&self) -> Vec<StandingsEntry> {
        let mut entries = self
            .participants
            .iter()
            .map(|(id, name)| StandingsEntry::new(id.clone(), name.clone()))
            .collect::<Vec<_>>();
        let position = entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (entry.id.clone(), i))
            .collect::<HashMap<_, _>>();

        for record in &self.records {
            // every recorded id was registered in `record`
            if let Some(&i) = position.get(record.white()) {
                entries[i].add(record.result(), Color::White);
            }
            if let Some(&i) = position.get(record.black()) {
                entries[i].add(record.result(), Color::Black);
            }
        }

        entries.sort_by(|a, b| b.score.total_cmp(&a.score));
        entries
    }
}

impl Display for ScoreBoard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rule = "=".repeat(60);
        writeln!(f, "{rule}")?;
        writeln!(f, "STANDINGS")?;
        writeln!(f, "{rule}")?;
        for entry in self.standings() {
            writeln!(f, "{entry}")?;
        }
        write!(f, "{rule}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Termination;

    fn game(white: &str, black: &str, result: GameResult) -> GameRecord {
        let termination = match result {
            GameResult::Draw => Termination::PlyLimit,
            _ => Termination::NoLegalMove,
        };
        GameRecord::new(
            EngineId::new(white),
            EngineId::new(black),
            result,
            termination,
            vec![],
        )
    }

    fn entry<'a>(standings: &'a [StandingsEntry], id: &str) -> &'a StandingsEntry {
        standings
            .iter()
            .find(|e| e.id.as_str() == id)
            .expect("missing entry")
    }

    #[test]
    fn test_points_per_result() {
        let mut board = ScoreBoard::new();
        board.record(game("A", "B", GameResult::WhiteWins));
        board.record(game("B", "A", GameResult::Draw));
        board.record(game("B", "A", GameResult::WhiteWins));

        let standings = board.standings();
        let a = entry(&standings, "A");
        let b = entry(&standings, "B");
        assert_eq!((a.score, a.wins, a.draws, a.losses), (1.5, 1, 1, 1));
        assert_eq!((b.score, b.wins, b.draws, b.losses), (1.5, 1, 1, 1));
    }

    #[test]
    fn test_total_points_equal_games_after_every_prefix() {
        let results = [
            GameResult::WhiteWins,
            GameResult::Draw,
            GameResult::BlackWins,
            GameResult::Draw,
            GameResult::Draw,
        ];
        let mut board = ScoreBoard::new();
        for (i, result) in results.into_iter().enumerate() {
            let (white, black) = if i % 2 == 0 { ("A", "C") } else { ("C", "B") };
            board.record(game(white, black, result));
            assert_eq!(board.total_points(), board.games_played() as f64);
        }
    }

    #[test]
    fn test_sorted_by_descending_score() {
        let mut board = ScoreBoard::new();
        board.record(game("A", "B", GameResult::BlackWins));
        board.record(game("C", "B", GameResult::Draw));
        board.record(game("C", "A", GameResult::WhiteWins));

        let names = board
            .standings()
            .into_iter()
            .map(|e| e.id.to_string())
            .collect::<Vec<_>>();
        assert_eq!(names, ["B", "C", "A"]);
    }

    #[test]
    fn test_same_name_merges_scores() {
        let roster = [
            EngineDescriptor::new("Stockfish", "stockfish"),
            EngineDescriptor::new("Stockfish", "/opt/stockfish"),
            EngineDescriptor::new("Other", "other"),
        ];
        let mut board = ScoreBoard::with_participants(&roster);
        board.record(game("Stockfish", "Other", GameResult::WhiteWins));
        board.record(game("Other", "Stockfish", GameResult::BlackWins));

        let standings = board.standings();
        assert_eq!(standings.len(), 2);
        assert_eq!(entry(&standings, "Stockfish").score, 2.0);
    }

    #[test]
    fn test_registered_participants_start_at_zero() {
        let roster = [
            EngineDescriptor::new("A", "a"),
            EngineDescriptor::new("B", "b"),
        ];
        let board = ScoreBoard::with_participants(&roster);
        let standings = board.standings();
        assert_eq!(standings.len(), 2);
        assert!(standings.iter().all(|e| e.games() == 0 && e.score == 0.0));
    }

    #[test]
    fn test_display_lists_record() {
        let mut board = ScoreBoard::new();
        board.record(game("A", "B", GameResult::WhiteWins));
        let text = board.to_string();
        assert!(text.contains("STANDINGS"));
        assert!(text.contains("(+1 =0 -0)"));
        assert!(text.contains("(+0 =0 -1)"));
    }
}
