//! Errors raised while talking to an engine process.
//!
//! Every variant is fatal to the game in progress only: the game runner turns it into a
//! forfeiture for the faulting side and the tournament moves on to the next game.

use std::time::Duration;

use crate::uci_client::ClientState;

/// Failure of an engine subprocess or of the protocol exchange with it.
#[derive(Debug)]
pub enum EngineError {
    /// The subprocess could not be spawned.
    ProcessLaunch {
        /// Program that was launched.
        program: String,
        /// Underlying spawn error.
        source: std::io::Error,
    },
    /// The expected acknowledgement or result did not arrive in time.
    ProtocolTimeout {
        /// Prefix the client was waiting for (`uciok`, `readyok`, `bestmove`).
        expected: &'static str,
        /// Deadline that elapsed.
        waited: Duration,
    },
    /// A line carrying the expected prefix could not be understood.
    MalformedResponse {
        /// The offending line.
        line: String,
    },
    /// The engine closed its output stream or its input pipe broke.
    EngineExited,
    /// A command was issued while the client was not in the `Ready` state.
    NotReady {
        /// State the client was in.
        state: ClientState,
    },
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::ProcessLaunch { program, source } => {
                write!(f, "could not launch '{program}': {source}")
            }
            EngineError::ProtocolTimeout { expected, waited } => {
                write!(f, "no '{expected}' received within {waited:?}")
            }
            EngineError::MalformedResponse { line } => write!(f, "malformed response: '{line}'"),
            EngineError::EngineExited => write!(f, "engine exited unexpectedly"),
            EngineError::NotReady { state } => {
                write!(f, "client is {state:?}, expected Ready")
            }
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::ProcessLaunch { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl EngineError {
    /// True for faults that come from the engine not answering in time.
    pub fn is_timeout(&self) -> bool {
        matches!(self, EngineError::ProtocolTimeout { .. })
    }
}
