//! Engine descriptors: how to launch an engine and which options to give it.

use std::{collections::BTreeMap, fmt::Display, path::Path};

use tracing::debug;

/// UCI option receiving the endgame tablebase directory.
pub const TABLEBASE_OPTION: &str = "SyzygyPath";
/// UCI option receiving the opening book file.
pub const BOOK_OPTION: &str = "BookPath";

/// Identity of a competitor. Scores of descriptors sharing an id are merged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EngineId(String);

impl EngineId {
    /// Creates an id from any string.
    pub fn new(id: impl Into<String>) -> Self {
        EngineId(id.into())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for EngineId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything needed to launch and configure one engine.
///
/// The id defaults to the display name, so two descriptors with the same name are the same
/// competitor unless one of them is given another id with [`with_id`](Self::with_id).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineDescriptor {
    id: EngineId,
    name: String,
    program: String,
    args: Vec<String>,
    options: BTreeMap<String, String>,
}

impl EngineDescriptor {
    /// Describes an engine launched as `program` without arguments.
    pub fn new(name: impl Into<String>, program: impl Into<String>) -> Self {
        let name = name.into();
        EngineDescriptor {
            id: EngineId::new(name.clone()),
            name,
            program: program.into(),
            args: vec![],
            options: BTreeMap::new(),
        }
    }

    /// Describes an engine from a whole command line such as `"./engine --uci"`.
    ///
    /// The line is split on whitespace; the first word is the program.
    pub fn from_command_line(name: impl Into<String>, command_line: &str) -> Self {
        let mut words = command_line.split_whitespace().map(str::to_string);
        let program = words.next().unwrap_or_default();
        Self::new(name, program).with_args(words)
    }

    /// Appends launch arguments.
    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Sets a UCI option, replacing any previous value.
    #[must_use]
    pub fn with_option(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(name.into(), value.into());
        self
    }

    /// Overrides the identity key used for scoring.
    #[must_use]
    pub fn with_id(mut self, id: EngineId) -> Self {
        self.id = id;
        self
    }

    /// Points the engine at an endgame tablebase directory.
    ///
    /// Only applied when `dir` exists and `SyzygyPath` was not set explicitly.
    #[must_use]
    pub fn with_tablebase_dir(self, dir: &Path) -> Self {
        if dir.is_dir() {
            self.with_default_option(TABLEBASE_OPTION, dir)
        } else {
            self
        }
    }

    /// Points the engine at an opening book file.
    ///
    /// Only applied when `file` exists and `BookPath` was not set explicitly.
    #[must_use]
    pub fn with_opening_book(self, file: &Path) -> Self {
        if file.is_file() {
            self.with_default_option(BOOK_OPTION, file)
        } else {
            self
        }
    }

    fn with_default_option(mut self, option: &str, path: &Path) -> Self {
        if !self.options.contains_key(option) {
            debug!(engine = %self.name, "{option} set to {}", path.display());
            self.options
                .insert(option.to_string(), path.display().to_string());
        }
        self
    }

    /// Identity key used for scoring.
    pub fn id(&self) -> &EngineId {
        &self.id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Program launched for this engine.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Launch arguments.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Options in the order they are sent to the engine.
    pub fn options(&self) -> &BTreeMap<String, String> {
        &self.options
    }
}

impl Display for EngineDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line_split() {
        let engine = EngineDescriptor::from_command_line("Chess++", "./build/chesscpp2 --uci");
        assert_eq!(engine.program(), "./build/chesscpp2");
        assert_eq!(engine.args(), ["--uci".to_string()]);
        assert_eq!(engine.id(), &EngineId::new("Chess++"));
    }

    #[test]
    fn test_same_name_same_id() {
        let a = EngineDescriptor::new("Stockfish", "stockfish").with_option("Skill Level", "3");
        let b = EngineDescriptor::new("Stockfish", "/opt/stockfish");
        assert_eq!(a.id(), b.id());

        let c = b.with_id(EngineId::new("stockfish-opt"));
        assert_ne!(a.id(), c.id());
        assert_eq!(c.name(), "Stockfish");
    }

    #[test]
    fn test_tablebase_needs_existing_dir() {
        let engine = EngineDescriptor::new("e", "e")
            .with_tablebase_dir(Path::new("/definitely/not/a/tablebase/dir"));
        assert!(!engine.options().contains_key(TABLEBASE_OPTION));

        let dir = std::env::temp_dir();
        let engine = EngineDescriptor::new("e", "e").with_tablebase_dir(&dir);
        assert_eq!(
            engine.options().get(TABLEBASE_OPTION),
            Some(&dir.display().to_string())
        );
    }

    #[test]
    fn test_explicit_option_wins_over_auto_resource() {
        let dir = std::env::temp_dir();
        let engine = EngineDescriptor::new("e", "e")
            .with_option(TABLEBASE_OPTION, "/my/syzygy")
            .with_tablebase_dir(&dir);
        assert_eq!(
            engine.options().get(TABLEBASE_OPTION).map(String::as_str),
            Some("/my/syzygy")
        );
    }

    #[test]
    fn test_book_must_be_a_file() {
        // a directory is not a book
        let engine = EngineDescriptor::new("e", "e").with_opening_book(&std::env::temp_dir());
        assert!(!engine.options().contains_key(BOOK_OPTION));
    }
}
