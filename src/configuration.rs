//! Config for the tournament behaviors
//!
//! This module provides configuration options for controlling how a tournament reports progress
//! and prepares engines.
//!
//! Configuration can be created programmatically using [`Configuration::new()`] or by reading
//! environment variables using [`Configuration::from_env()`].
//!
//! # Environment Variables
//!
//! The following environment variables can be used to override configuration values. All
//! values are optional. Flags are case-insensitive; set the value to `"true"` to enable one.
//!
//! - `UCI_VERBOSE` — Print game progress and standings to stdout (default: `true`)
//! - `UCI_LOG` — Enable logging to a file (default: `false`)
//! - `UCI_DEBUG_ENGINE_STDERR` — Let engine stderr through for debugging (default: `false`)
//! - `UCI_USE_TABLEBASE` — Give engines the tablebase directory when it exists (default: `true`)
//! - `UCI_USE_BOOK` — Give engines the opening book when it exists (default: `true`)
//! - `UCI_TABLEBASE_DIR` — Tablebase directory (default: `syzygy`)
//! - `UCI_BOOK_PATH` — Opening book file (default: `books/Titans.bin`)

use std::path::{Path, PathBuf};

/// Default endgame tablebase directory, relative to the working directory.
pub const DEFAULT_TABLEBASE_DIR: &str = "syzygy";
/// Default opening book, relative to the working directory.
pub const DEFAULT_BOOK_PATH: &str = "books/Titans.bin";

/// Configuration for tournament behaviors.
#[derive(Debug, Clone)]
pub struct Configuration {
    pub(crate) verbose: bool,
    pub(crate) log: bool,
    pub(crate) debug_engine_stderr: bool,
    pub(crate) use_tablebase: bool,
    pub(crate) use_book: bool,
    pub(crate) tablebase_dir: PathBuf,
    pub(crate) book_path: PathBuf,
}

impl Configuration {
    /// Create a new configuration with default parameters.
    ///
    /// By default:
    /// - Game progress and standings are printed to stdout.
    /// - Logging to file is disabled.
    /// - Engine stderr output is discarded.
    /// - `syzygy/` and `books/Titans.bin` are handed to engines when they exist.
    pub fn new() -> Self {
        Self {
            verbose: true,
            log: false,
            debug_engine_stderr: false,
            use_tablebase: true,
            use_book: true,
            tablebase_dir: PathBuf::from(DEFAULT_TABLEBASE_DIR),
            book_path: PathBuf::from(DEFAULT_BOOK_PATH),
        }
    }

    /// Create configuration from environment variables.
    ///
    /// See the [module documentation](self) for the recognized variables. Any other value
    /// (including unset) results in the default value for each field.
    pub fn from_env() -> Self {
        fn get_env_flag(var: &str, default: bool) -> bool {
            match std::env::var(var) {
                Ok(val) => val.eq_ignore_ascii_case("true"),
                Err(_) => default,
            }
        }

        fn get_env_path(var: &str, default: &str) -> PathBuf {
            std::env::var_os(var)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(default))
        }

        Self {
            verbose: get_env_flag("UCI_VERBOSE", true),
            log: get_env_flag("UCI_LOG", false),
            debug_engine_stderr: get_env_flag("UCI_DEBUG_ENGINE_STDERR", false),
            use_tablebase: get_env_flag("UCI_USE_TABLEBASE", true),
            use_book: get_env_flag("UCI_USE_BOOK", true),
            tablebase_dir: get_env_path("UCI_TABLEBASE_DIR", DEFAULT_TABLEBASE_DIR),
            book_path: get_env_path("UCI_BOOK_PATH", DEFAULT_BOOK_PATH),
        }
    }

    /// Enable or disable progress output.
    pub fn with_verbose(mut self, value: bool) -> Self {
        self.verbose = value;
        self
    }

    /// Enable or disable logging to file.
    pub fn with_log(mut self, value: bool) -> Self {
        self.log = value;
        self
    }

    /// Enable or disable engine stderr output (debug purposes only).
    pub fn with_debug_engine_stderr(mut self, value: bool) -> Self {
        self.debug_engine_stderr = value;
        self
    }

    /// Enable or disable handing the tablebase directory to engines.
    pub fn with_use_tablebase(mut self, value: bool) -> Self {
        self.use_tablebase = value;
        self
    }

    /// Enable or disable handing the opening book to engines.
    pub fn with_use_book(mut self, value: bool) -> Self {
        self.use_book = value;
        self
    }

    /// Set the tablebase directory.
    pub fn with_tablebase_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.tablebase_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Set the opening book file.
    pub fn with_book_path(mut self, path: impl AsRef<Path>) -> Self {
        self.book_path = path.as_ref().to_path_buf();
        self
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self::new()
    }
}
