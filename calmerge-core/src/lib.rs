//! Core engine for calmerge.
//!
//! - `control`: the skip-day / override / cancel state machine that gates a run
//! - `reconcile`: diffs source feed events against the target calendar
//! - `removal`: scoped deletion, restricted to events calmerge created
//! - `state`: the persisted control-plane record
//!
//! I/O collaborators (the target calendar provider, feed parsing, the remote
//! command channel) sit behind `catalog`, `feed`, `remote` and `command`.

pub mod catalog;
pub mod command;
pub mod config;
pub mod constants;
pub mod control;
pub mod error;
pub mod event;
pub mod feed;
pub mod reconcile;
pub mod remote;
pub mod removal;
pub mod skip_days;
pub mod state;
pub mod title;
pub mod window;
