//! calmerge configuration.

use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use config::{Config, Environment, File};
use serde::Deserialize;
use tracing::debug;

use crate::constants::{DEFAULT_FUTURE_EVENTS_DAYS, MAX_FUTURE_EVENTS_DAYS, SOURCE_URL_ENV};
use crate::error::{CalMergeError, CalMergeResult};
use crate::remote::Remote;
use crate::skip_days::SkipDays;

static DEFAULT_STATE_FILE: &str = "~/.config/calmerge/state.json";

fn default_state_file() -> PathBuf {
    PathBuf::from(DEFAULT_STATE_FILE)
}

fn default_future_events_days() -> u32 {
    DEFAULT_FUTURE_EVENTS_DAYS
}

/// One `[[sources]]` entry as written in the config file.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct SourceConfig {
    /// Display name, only used in output
    #[serde(default)]
    pub title: String,
    /// Label written after the `/` in composed titles
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub tag: String,
    pub url: Option<String>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: i64,
}

/// Configuration at ~/.config/calmerge/config.toml
#[derive(Deserialize, Clone, Debug)]
pub struct CalmergeConfig {
    #[serde(default)]
    pub skip_days: Vec<u8>,

    #[serde(default = "default_future_events_days")]
    pub future_events_days: u32,

    /// IANA name; the system zone when omitted
    pub timezone: Option<String>,

    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,

    pub target: Option<Remote>,

    #[serde(default)]
    pub sources: Vec<SourceConfig>,

    pub telegram: Option<TelegramConfig>,
}

/// A feed to merge, fully resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    pub title: String,
    pub label: String,
    pub tag: String,
    pub url: String,
}

/// Validated settings for one run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub skip_days: SkipDays,
    pub timezone: Tz,
    pub future_events_days: u32,
    pub state_file: PathBuf,
    pub target: Remote,
    pub sources: Vec<Source>,
    pub telegram: Option<TelegramConfig>,
}

impl CalmergeConfig {
    pub fn config_path() -> CalMergeResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| CalMergeError::Config("Could not determine config directory".into()))?
            .join("calmerge");

        Ok(config_dir.join("config.toml"))
    }

    /// Load from `path` (or the default location), with `CALMERGE_*`
    /// environment overrides. A missing default file is created first.
    pub fn load(path: Option<&Path>) -> CalMergeResult<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let default_path = Self::config_path()?;
                if !default_path.exists() {
                    Self::create_default_config(&default_path)?;
                }
                default_path
            }
        };
        debug!(path = %config_path.display(), "loading config");

        Config::builder()
            .add_source(File::from(config_path).required(true))
            .add_source(
                Environment::with_prefix("CALMERGE")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("skip_days")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| CalMergeError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| CalMergeError::Config(e.to_string()))
    }

    /// Parse config from a TOML string, without environment overrides.
    pub fn from_toml(content: &str) -> CalMergeResult<Self> {
        toml::from_str(content).map_err(|e| CalMergeError::Config(e.to_string()))
    }

    /// Validate and resolve into [`Settings`], reading source URLs from
    /// `CALENDAR_URL_<index>` where the file leaves them out.
    pub fn resolve(self) -> CalMergeResult<Settings> {
        self.resolve_with(|key| std::env::var(key).ok())
    }

    fn resolve_with(self, env: impl Fn(&str) -> Option<String>) -> CalMergeResult<Settings> {
        let skip_days = SkipDays::new(self.skip_days)?;
        let timezone = resolve_timezone(self.timezone.as_deref())?;

        if self.future_events_days > MAX_FUTURE_EVENTS_DAYS {
            return Err(CalMergeError::Config(format!(
                "future_events_days = {} exceeds the maximum of {MAX_FUTURE_EVENTS_DAYS}",
                self.future_events_days
            )));
        }

        let target = self.target.ok_or_else(|| {
            CalMergeError::Config("No [target] calendar configured".into())
        })?;

        if self.sources.is_empty() {
            return Err(CalMergeError::Config("No [[sources]] configured".into()));
        }

        let sources = self
            .sources
            .into_iter()
            .enumerate()
            .map(|(index, source)| resolve_source(index, source, &env))
            .collect::<CalMergeResult<Vec<_>>>()?;

        let state_file =
            PathBuf::from(shellexpand::tilde(&self.state_file.to_string_lossy()).into_owned());

        Ok(Settings {
            skip_days,
            timezone,
            future_events_days: self.future_events_days,
            state_file,
            target,
            sources,
            telegram: self.telegram,
        })
    }

    /// Create a default config file with every option documented.
    pub fn create_default_config(path: &Path) -> CalMergeResult<()> {
        let contents = format!(
            "\
# calmerge configuration

# Weekdays that are normally not synced (0 = Monday ... 6 = Sunday):
# skip_days = [5, 6]

# How many days after today to sync (at most {MAX_FUTURE_EVENTS_DAYS}):
# future_events_days = {DEFAULT_FUTURE_EVENTS_DAYS}

# IANA timezone used for \"today\" and floating times (default: system zone):
# timezone = \"Europe/Berlin\"

# Where the override/cancel state is kept:
# state_file = \"{DEFAULT_STATE_FILE}\"

# The calendar calmerge writes into. `provider` selects the
# calmerge-provider-<name> binary; other keys are passed to it.
# [target]
# provider = \"google\"
# calendar_id = \"primary\"

# Read-only feeds to merge. Events are written as \"[tag] title/source\".
# `url` may be left out and given as {SOURCE_URL_ENV}<index> instead
# (index counts from 0 in file order).
# [[sources]]
# title = \"Work\"
# source = \"Google\"
# tag = \"WRK\"
# url = \"webcal://example.com/work.ics\"

# Optional remote control: send \"override\" or \"cancel\" to the bot.
# [telegram]
# bot_token = \"123456:ABC...\"
# chat_id = 12345678
"
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                CalMergeError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| CalMergeError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}

fn resolve_timezone(name: Option<&str>) -> CalMergeResult<Tz> {
    let name = match name {
        Some(n) => n.to_string(),
        None => iana_time_zone::get_timezone()
            .map_err(|e| CalMergeError::Config(format!("Could not detect system timezone: {e}")))?,
    };

    name.parse::<Tz>()
        .map_err(|_| CalMergeError::Config(format!("Unknown timezone '{name}'")))
}

fn resolve_source(
    index: usize,
    source: SourceConfig,
    env: &impl Fn(&str) -> Option<String>,
) -> CalMergeResult<Source> {
    let tag = source.tag.trim().to_string();
    let label = source.source.trim().to_string();

    if tag.is_empty() || tag.contains(']') {
        return Err(CalMergeError::Config(format!(
            "Source {index}: tag must be non-empty and must not contain ']'"
        )));
    }
    if label.is_empty() || label.contains('/') {
        return Err(CalMergeError::Config(format!(
            "Source {index}: source must be non-empty and must not contain '/'"
        )));
    }

    let env_key = format!("{SOURCE_URL_ENV}{index}");
    let url = source
        .url
        .filter(|u| !u.trim().is_empty())
        .or_else(|| env(&env_key))
        .ok_or_else(|| {
            CalMergeError::Config(format!(
                "Source {index} ({label}) has no url and {env_key} is not set (misaligned source index?)"
            ))
        })?;

    let title = if source.title.trim().is_empty() {
        label.clone()
    } else {
        source.title.trim().to_string()
    };

    Ok(Source {
        title,
        label,
        tag,
        url,
    })
}
