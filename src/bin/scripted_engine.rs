//! Minimal UCI engine replaying a fixed move list, used by the integration tests.
//!
//! ```text
//! scripted-engine [--moves m1,m2,...] [--repeat] [--then none|null|hang|exit|garbage]
//!                 [--stall uci|isready] [--ignore-quit] [--latin1-author] [--log FILE]
//! ```
//!
//! The reply to `go` is the script entry at the current ply (number of moves in the last
//! `position` command). Past the end of the script, `--then` decides what happens.

use std::{
    env,
    fs::OpenOptions,
    io::{self, BufRead, Write},
    time::Duration,
};

use anyhow::{bail, Context};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Then {
    NoneMove,
    NullMove,
    Hang,
    Exit,
    Garbage,
}

struct Script {
    moves: Vec<String>,
    repeat: bool,
    then: Then,
    stall: Option<String>,
    ignore_quit: bool,
    latin1_author: bool,
    log: Option<String>,
}

fn parse_args() -> anyhow::Result<Script> {
    let mut script = Script {
        moves: vec![],
        repeat: false,
        then: Then::NoneMove,
        stall: None,
        ignore_quit: false,
        latin1_author: false,
        log: None,
    };
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--moves" => {
                let list = args.next().context("--moves needs a value")?;
                script.moves = list
                    .split(',')
                    .filter(|m| !m.is_empty())
                    .map(str::to_string)
                    .collect();
            }
            "--repeat" => script.repeat = true,
            "--then" => {
                script.then = match args.next().context("--then needs a value")?.as_str() {
                    "none" => Then::NoneMove,
                    "null" => Then::NullMove,
                    "hang" => Then::Hang,
                    "exit" => Then::Exit,
                    "garbage" => Then::Garbage,
                    other => bail!("unknown --then value '{other}'"),
                }
            }
            "--stall" => script.stall = Some(args.next().context("--stall needs a value")?),
            "--ignore-quit" => script.ignore_quit = true,
            "--latin1-author" => script.latin1_author = true,
            "--log" => script.log = Some(args.next().context("--log needs a value")?),
            other => bail!("unknown argument '{other}'"),
        }
    }
    Ok(script)
}

fn main() -> anyhow::Result<()> {
    let script = parse_args()?;
    let mut log = match &script.log {
        Some(path) => Some(
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("could not open log '{path}'"))?,
        ),
        None => None,
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut ply = 0usize;

    for line in io::stdin().lock().lines() {
        let line = line?;
        let line = line.trim();
        if let Some(log) = log.as_mut() {
            writeln!(log, "{line}")?;
            log.flush()?;
        }
        let command = line.split_whitespace().next().unwrap_or_default();
        if script.stall.as_deref() == Some(command) {
            continue;
        }

        match command {
            "uci" => {
                writeln!(out, "id name scripted-engine")?;
                if script.latin1_author {
                    out.write_all(b"id author J\xfcrgen\n")?;
                }
                writeln!(out, "option name Depth type spin default 4 min 1 max 64")?;
                writeln!(out, "uciok")?;
            }
            "isready" => writeln!(out, "readyok")?,
            "position" => {
                ply = line
                    .split_whitespace()
                    .skip_while(|token| *token != "moves")
                    .skip(1)
                    .count();
            }
            "go" => {
                writeln!(out, "info depth 1 score cp 0")?;
                let scripted = if script.repeat && !script.moves.is_empty() {
                    script.moves.get(ply % script.moves.len())
                } else {
                    script.moves.get(ply)
                };
                match (scripted, script.then) {
                    (Some(mv), _) => writeln!(out, "bestmove {mv} ponder {mv}")?,
                    (None, Then::NoneMove) => writeln!(out, "bestmove (none)")?,
                    (None, Then::NullMove) => writeln!(out, "bestmove 0000")?,
                    (None, Then::Garbage) => writeln!(out, "bestmove")?,
                    (None, Then::Hang) => {}
                    (None, Then::Exit) => return Ok(()),
                }
            }
            "quit" if !script.ignore_quit => return Ok(()),
            _ => {}
        }
        out.flush()?;
    }

    if script.ignore_quit {
        // only a kill ends this process
        loop {
            std::thread::sleep(Duration::from_secs(60));
        }
    }
    Ok(())
}
