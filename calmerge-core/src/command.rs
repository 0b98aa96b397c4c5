//! Remote commands and the channel that delivers them.

use std::collections::BTreeSet;
use std::fmt;

use crate::error::CalMergeResult;

/// The fixed command vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Command {
    Override,
    Cancel,
}

impl Command {
    /// Case-insensitive exact match on the trimmed message text.
    pub fn parse(text: &str) -> Option<Command> {
        let text = text.trim();

        if text.eq_ignore_ascii_case("override") {
            Some(Command::Override)
        } else if text.eq_ignore_ascii_case("cancel") {
            Some(Command::Cancel)
        } else {
            None
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Override => write!(f, "override"),
            Command::Cancel => write!(f, "cancel"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandSet(BTreeSet<Command>);

impl CommandSet {
    /// Collect recognized commands from raw message texts, ignoring the rest.
    pub fn from_texts<'a>(texts: impl IntoIterator<Item = &'a str>) -> Self {
        texts.into_iter().filter_map(Command::parse).collect()
    }

    pub fn contains(&self, command: Command) -> bool {
        self.0.contains(&command)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Command> {
        self.0.iter()
    }
}

impl FromIterator<Command> for CommandSet {
    fn from_iter<I: IntoIterator<Item = Command>>(iter: I) -> Self {
        CommandSet(iter.into_iter().collect())
    }
}

/// Result of one poll of the command channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Poll {
    pub commands: CommandSet,
    /// Cursor to persist, even when no recognized command arrived
    pub cursor: Option<i64>,
}

/// A channel that delivers pending remote commands.
///
/// Called at most once per run. Implementations own their retry policy;
/// callers treat an error as "no commands, cursor unchanged".
#[allow(async_fn_in_trait)]
pub trait CommandSource {
    async fn poll(&self, cursor: Option<i64>) -> CalMergeResult<Poll>;
}
