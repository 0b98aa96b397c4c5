/// Days ahead of today that are synced when the config does not say otherwise.
pub const DEFAULT_FUTURE_EVENTS_DAYS: u32 = 14;

/// Provider binaries are looked up on PATH as `calmerge-provider-<name>`.
pub const PROVIDER_BINARY_PREFIX: &str = "calmerge-provider-";

/// Environment variable holding the feed URL of source `<index>` when the
/// config omits it.
pub const SOURCE_URL_ENV: &str = "CALENDAR_URL_";

/// Summary used for feed entries without a SUMMARY property.
pub const UNTITLED_EVENT: &str = "(No title)";

/// Upper bound on occurrences expanded from a single RRULE.
pub const MAX_RECURRENCE_INSTANCES: u16 = 366;

/// Longest accepted lookahead. The window spans today plus this many days,
/// so a daily RRULE stays within `MAX_RECURRENCE_INSTANCES`.
pub const MAX_FUTURE_EVENTS_DAYS: u32 = MAX_RECURRENCE_INSTANCES as u32 - 1;
