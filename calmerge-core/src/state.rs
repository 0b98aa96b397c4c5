//! Persisted control-plane state.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{CalMergeError, CalMergeResult};

/// The single state record shared between runs.
///
/// Treated as a value: control-plane steps take it and hand back a changed
/// copy, and it is written back once at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlState {
    /// An override was requested but its date has not been computed yet
    pub override_flag: bool,
    /// The day on which the skip policy is suspended
    pub override_date: Option<NaiveDate>,
    /// Bookmark into the remote command stream
    #[serde(rename = "telegram_offset")]
    pub command_cursor: Option<i64>,
}

impl ControlState {
    /// Advance the command cursor. It never moves backwards.
    pub fn with_cursor(self, cursor: Option<i64>) -> Self {
        let command_cursor = match (self.command_cursor, cursor) {
            (Some(current), Some(new)) => Some(current.max(new)),
            (current, new) => new.or(current),
        };

        ControlState {
            command_cursor,
            ..self
        }
    }

    pub fn without_override(self) -> Self {
        ControlState {
            override_flag: false,
            override_date: None,
            ..self
        }
    }
}

/// Reads and writes the state record as one JSON object.
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        StateStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the state record, falling back to defaults when the file is
    /// missing or unreadable.
    pub fn load(&self) -> ControlState {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no state file, using defaults");
            return ControlState::default();
        }

        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "could not read state file, using defaults");
                return ControlState::default();
            }
        };

        match serde_json::from_str(&content) {
            Ok(state) => state,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "malformed state file, using defaults");
                ControlState::default()
            }
        }
    }

    /// Overwrite the whole record.
    pub fn save(&self, state: &ControlState) -> CalMergeResult<()> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let content = serde_json::to_string_pretty(state)
            .map_err(|e| CalMergeError::Serialization(e.to_string()))?;

        let mut temp = self.path.clone().into_os_string();
        temp.push(".tmp");
        let temp = PathBuf::from(temp);

        std::fs::write(&temp, content)?;
        std::fs::rename(&temp, &self.path)?;

        debug!(path = %self.path.display(), ?state, "saved state");
        Ok(())
    }
}
