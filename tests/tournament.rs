use std::{thread, time::Duration};

use tracing::{Level, Metadata};
use tracing_subscriber::{
    fmt,
    layer::{Context, Filter, SubscriberExt},
    Layer, Registry,
};
use uci_tournament::prelude::*;

const ENGINE: &str = env!("CARGO_BIN_EXE_scripted-engine");
const OPENING: &str = "e2e4,e7e5,g1f3,b8c6";

struct CustomLevelFilter;
impl<S> Filter<S> for CustomLevelFilter {
    fn enabled(&self, meta: &Metadata<'_>, _cx: &Context<'_, S>) -> bool {
        meta.level() <= &Level::INFO
    }
}

fn init_debug_logger() {
    let format = fmt::format()
        .without_time()
        .with_ansi(true)
        .with_level(true)
        .with_thread_names(true)
        .with_target(false);

    let reg = Registry::default().with(
        fmt::layer()
            .event_format(format)
            .with_test_writer()
            .with_filter(CustomLevelFilter),
    );

    let _ = tracing::subscriber::set_global_default(reg);
}

fn scripted(name: &str, args: &[&str]) -> EngineDescriptor {
    EngineDescriptor::new(name, ENGINE).with_args(args.iter().copied())
}

fn quiet() -> Configuration {
    Configuration::new()
        .with_verbose(false)
        .with_use_tablebase(false)
        .with_use_book(false)
}

#[test]
fn two_engines_three_games_each_way() {
    init_debug_logger();

    let settings = GameSettingsBuilder::new()
        .with_depth(1)
        .with_games_per_pairing(3)
        .with_response_timeout(Duration::from_secs(2))
        .with_shutdown_grace(Duration::from_millis(200))
        .build()
        .unwrap();
    let roster = vec![
        scripted("Alpha", &["--moves", OPENING]),
        scripted("Beta", &["--moves", OPENING]),
    ];

    let report = Tournament::new(roster, quiet(), settings).run().unwrap();
    assert!(!report.cancelled);
    assert_eq!(report.scheduled, 6);

    let board = &report.scoreboard;
    assert_eq!(board.games_played(), 6);
    assert_eq!(board.total_points(), 6.0);

    let whites = board
        .records()
        .iter()
        .map(|r| r.white().as_str())
        .collect::<Vec<_>>();
    assert_eq!(whites, ["Alpha", "Beta", "Alpha", "Beta", "Alpha", "Beta"]);

    // white runs out of moves at ply 4 in every game
    for record in board.records() {
        assert_eq!(record.result(), GameResult::BlackWins);
        assert_eq!(record.termination(), Termination::NoLegalMove);
    }

    let standings = board.standings();
    assert_eq!(standings.len(), 2);
    for entry in &standings {
        assert_eq!(entry.games(), 6);
        assert_eq!(entry.score, 3.0);
        assert_eq!((entry.wins, entry.draws, entry.losses), (3, 0, 3));
    }
    // equal scores keep roster order
    assert_eq!(standings[0].name, "Alpha");
}

#[test]
fn faulty_engine_loses_every_game() {
    init_debug_logger();

    let settings = GameSettingsBuilder::new()
        .with_depth(1)
        .with_ply_limit(6)
        .with_response_timeout(Duration::from_millis(500))
        .with_shutdown_grace(Duration::from_millis(100))
        .build()
        .unwrap();
    let roster = vec![
        scripted("Steady", &["--moves", OPENING, "--repeat"]),
        scripted("Broken", &["--then", "garbage"]),
        scripted("Drawish", &["--moves", OPENING, "--repeat"]),
    ];

    let report = Tournament::new(roster, quiet(), settings).run().unwrap();
    assert_eq!(report.scoreboard.games_played(), 6);
    assert_eq!(report.scoreboard.total_points(), 6.0);

    let standings = report.scoreboard.standings();
    let broken = standings.iter().find(|e| e.name == "Broken").unwrap();
    assert_eq!(broken.score, 0.0);
    assert_eq!(broken.losses, 4);

    // the two healthy engines draw both their games on the ply cap
    assert_eq!(standings[0].name, "Steady");
    assert_eq!(standings[0].score, 3.0);
    assert_eq!((standings[0].wins, standings[0].draws), (2, 2));
    assert_eq!(standings[1].name, "Drawish");
    assert_eq!(standings[1].score, 3.0);
}

#[test]
fn cancellation_stops_before_next_game() {
    init_debug_logger();

    let settings = GameSettingsBuilder::new()
        .with_depth(1)
        .with_games_per_pairing(2)
        .with_response_timeout(Duration::from_millis(800))
        .with_shutdown_grace(Duration::from_millis(100))
        .build()
        .unwrap();
    let roster = vec![
        scripted("Sleepy", &["--then", "hang"]),
        scripted("Other", &["--then", "hang"]),
    ];

    let tournament = Tournament::new(roster, quiet(), settings);
    let token = tournament.cancellation_token();
    let canceller = thread::spawn(move || {
        thread::sleep(Duration::from_millis(200));
        token.cancel();
    });

    let report = tournament.run().unwrap();
    canceller.join().unwrap();

    assert!(report.cancelled);
    assert_eq!(report.scheduled, 4);
    assert_eq!(report.scoreboard.games_played(), 1);
    let record = &report.scoreboard.records()[0];
    assert_eq!(record.termination(), Termination::EngineFault);
    assert_eq!(record.result(), GameResult::BlackWins);
}
