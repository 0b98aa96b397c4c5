//! Title grammar for events calmerge creates.
//!
//! Every event written to the target calendar is titled
//! `[<tag>] <title>/<source>`. The title string is the only ownership marker:
//! anything that does not parse is a user event and is never deleted.

use std::fmt;

/// A parsed `[<tag>] <title>/<source>` title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedTitle {
    pub tag: String,
    pub title: String,
    pub source: String,
}

impl ManagedTitle {
    pub fn new(tag: &str, title: &str, source: &str) -> Self {
        ManagedTitle {
            tag: tag.to_string(),
            title: title.to_string(),
            source: source.to_string(),
        }
    }

    /// Parse a target-calendar title.
    ///
    /// The tag runs to the first `]` and must be followed by a single space.
    /// The rest is split at its last `/`, so raw titles may contain slashes
    /// but source labels may not.
    pub fn parse(s: &str) -> Option<Self> {
        let rest = s.strip_prefix('[')?;
        let (tag, rest) = rest.split_once(']')?;
        let rest = rest.strip_prefix(' ')?;
        let (title, source) = rest.rsplit_once('/')?;

        if tag.is_empty() || title.is_empty() || source.is_empty() {
            return None;
        }

        Some(ManagedTitle::new(tag, title, source))
    }
}

impl fmt::Display for ManagedTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}/{}", self.tag, self.title, self.source)
    }
}

/// Compose the target-calendar title for a source event.
pub fn compose(tag: &str, title: &str, source: &str) -> String {
    ManagedTitle::new(tag, title, source).to_string()
}

pub fn is_managed(title: &str) -> bool {
    ManagedTitle::parse(title).is_some()
}
