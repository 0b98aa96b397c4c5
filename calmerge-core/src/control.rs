//! The control plane: decides whether a run syncs at all.
//!
//! Each step takes the current [`ControlState`] by value and hands back the
//! next one. Nothing here touches disk or the network; the caller loads the
//! state once, runs [`ControlPlane::decide`], performs whatever cleanup and
//! sync the [`Decision`] asks for, and saves once.
//!
//! Steps, in order:
//! 0. cancel an armed override (may stop the run)
//! 1. classify the armed override, discarding it if stale
//! 2. ingest a new override request and turn it into a date
//! 3. evaluate the skip-day gate
//!
//! After the sync, [`ControlPlane::consume_on_last`] clears today's
//! override on the last run of the day.

use std::fmt;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::command::{Command, CommandSet};
use crate::removal::RemoveMode;
use crate::skip_days::SkipDays;
use crate::state::ControlState;

/// What the operator asked for this run, from CLI flags and remote commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Intent {
    pub override_requested: bool,
    pub cancel_requested: bool,
    /// First scheduled run of the day
    pub first_run: bool,
    /// Last scheduled run of the day
    pub last_run: bool,
}

impl Intent {
    pub fn with_commands(self, commands: &CommandSet) -> Self {
        Intent {
            override_requested: self.override_requested || commands.contains(Command::Override),
            cancel_requested: self.cancel_requested || commands.contains(Command::Cancel),
            ..self
        }
    }
}

/// Removal ordered by a cancel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cleanup {
    pub date: NaiveDate,
    pub mode: RemoveMode,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CancelOutcome {
    /// Skip everything after the cleanup
    pub stop: bool,
    pub cleanup: Option<Cleanup>,
}

impl CancelOutcome {
    pub fn needs_cleanup(&self) -> bool {
        self.cleanup.is_some()
    }
}

/// Where the armed override stands relative to today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideStatus {
    None,
    /// In effect for the rest of today
    Active(NaiveDate),
    /// Armed for a later date
    Pending(NaiveDate),
    /// Dated before today and never consumed; discarded
    Stale(NaiveDate),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
}

/// Something worth telling the operator about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    fn info(message: String) -> Self {
        Notice {
            level: NoticeLevel::Info,
            message,
        }
    }

    fn warning(message: String) -> Self {
        Notice {
            level: NoticeLevel::Warning,
            message,
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.level {
            NoticeLevel::Info => write!(f, "{}", self.message),
            NoticeLevel::Warning => write!(f, "⚠️ {}", self.message),
        }
    }
}

/// Everything the caller needs after Steps 0–3.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub state: ControlState,
    /// The run ends after `cleanup`; no sync
    pub stop: bool,
    pub cleanup: Option<Cleanup>,
    pub status: OverrideStatus,
    /// Whether the sync pipeline runs
    pub process: bool,
}

pub struct ControlPlane {
    today: NaiveDate,
    skip_days: SkipDays,
    notices: Vec<Notice>,
}

impl ControlPlane {
    pub fn new(today: NaiveDate, skip_days: SkipDays) -> Self {
        ControlPlane {
            today,
            skip_days,
            notices: Vec::new(),
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Notices emitted so far, oldest first.
    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Run Steps 0–3.
    pub fn decide(&mut self, state: ControlState, intent: &Intent) -> Decision {
        let (state, cancel) = self.cancel(state, intent.cancel_requested);

        if cancel.stop {
            return Decision {
                state,
                stop: true,
                cleanup: cancel.cleanup,
                status: OverrideStatus::None,
                process: false,
            };
        }

        let (state, status) = self.classify(state);
        let state = self.arm(state, intent.override_requested);
        let state = self.resolve(state, intent.first_run);
        let process = self.should_process(&state);

        debug!(today = %self.today, ?state, process, "control plane settled");

        Decision {
            state,
            stop: false,
            cleanup: cancel.cleanup,
            status,
            process,
        }
    }

    /// Step 0: disarm an override that is active today or pending.
    ///
    /// Cancelling today's override stops the run and retracts what is left
    /// of today; cancelling a future one lets the run continue and retracts
    /// everything already synced for that date. Anything else is a no-op.
    pub fn cancel(&mut self, state: ControlState, requested: bool) -> (ControlState, CancelOutcome) {
        if !requested {
            return (state, CancelOutcome::default());
        }

        let date = match state.override_date {
            Some(date) if date >= self.today => date,
            _ => {
                info!(today = %self.today, "cancel requested but no override is armed");
                self.notices
                    .push(Notice::info("Nothing to cancel: no override is armed".into()));
                return (state, CancelOutcome::default());
            }
        };

        let outcome = if date == self.today {
            self.notices.push(Notice::info(format!(
                "Override for today ({date}) cancelled; removing the rest of today's synced events"
            )));
            CancelOutcome {
                stop: true,
                cleanup: Some(Cleanup {
                    date,
                    mode: RemoveMode::FutureToday,
                }),
            }
        } else {
            self.notices.push(Notice::info(format!(
                "Override for {date} cancelled; removing events synced for that day"
            )));
            CancelOutcome {
                stop: false,
                cleanup: Some(Cleanup {
                    date,
                    mode: RemoveMode::AllDay,
                }),
            }
        };

        info!(%date, stop = outcome.stop, "override cancelled");
        (state.without_override(), outcome)
    }

    /// Step 1: classify the armed override, discarding a stale one.
    ///
    /// An active override is deliberately silent so it does not notify on
    /// every run of the day.
    pub fn classify(&mut self, state: ControlState) -> (ControlState, OverrideStatus) {
        let Some(date) = state.override_date else {
            return (state, OverrideStatus::None);
        };

        if date == self.today {
            (state, OverrideStatus::Active(date))
        } else if date > self.today {
            (state, OverrideStatus::Pending(date))
        } else {
            warn!(%date, today = %self.today, "discarding stale override");
            self.notices.push(Notice::warning(format!(
                "Discarded stale override for {date}; it was never consumed"
            )));
            let state = ControlState {
                override_date: None,
                ..state
            };
            (state, OverrideStatus::Stale(date))
        }
    }

    /// Step 2a: raise the override flag.
    ///
    /// Absorbed when the flag is already up or a date is already armed, so a
    /// repeated request never moves an armed date.
    pub fn arm(&mut self, state: ControlState, requested: bool) -> ControlState {
        if !requested || state.override_flag {
            return state;
        }

        if let Some(date) = state.override_date {
            info!(%date, "override already armed, request absorbed");
            self.notices
                .push(Notice::info(format!("Override already armed for {date}")));
            return state;
        }

        ControlState {
            override_flag: true,
            ..state
        }
    }

    /// Step 2b: turn a raised flag into a date and lower the flag.
    ///
    /// On the first run of a skip day the override applies today; otherwise
    /// it applies to the next skip day after today.
    pub fn resolve(&mut self, state: ControlState, first_run: bool) -> ControlState {
        if !state.override_flag {
            return state;
        }

        if state.override_date.is_some() {
            return ControlState {
                override_flag: false,
                ..state
            };
        }

        let date = if first_run && self.skip_days.contains(self.today) {
            Some(self.today)
        } else {
            self.skip_days.next_after(self.today)
        };

        match date {
            Some(date) => {
                info!(%date, "override armed");
                self.notices
                    .push(Notice::info(format!("Override armed for {date}")));
            }
            None => {
                warn!("override requested but no skip days are configured");
                self.notices.push(Notice::warning(
                    "Override ignored: no skip days are configured".into(),
                ));
            }
        }

        ControlState {
            override_flag: false,
            override_date: date,
            ..state
        }
    }

    /// Step 3: the single gate for the sync pipeline.
    pub fn should_process(&self, state: &ControlState) -> bool {
        state.override_date == Some(self.today) || !self.skip_days.contains(self.today)
    }

    /// End-of-day clear: on the last run, today's override has been used.
    pub fn consume_on_last(&mut self, state: ControlState) -> ControlState {
        if state.override_date != Some(self.today) {
            return state;
        }

        info!(date = %self.today, "override consumed");
        self.notices.push(Notice::info(format!(
            "Override for {} consumed; normal schedule resumes",
            self.today
        )));

        ControlState {
            override_date: None,
            ..state
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2025-02-22 is a Saturday
    fn saturday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 2, 22).unwrap()
    }
    fn sunday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 2, 23).unwrap()
    }
    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 2, 24).unwrap()
    }
    fn next_saturday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
    }
    fn last_saturday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 2, 15).unwrap()
    }

    fn plane(today: NaiveDate) -> ControlPlane {
        ControlPlane::new(today, SkipDays::new([5, 6]).unwrap())
    }

    fn armed(date: NaiveDate) -> ControlState {
        ControlState {
            override_date: Some(date),
            ..Default::default()
        }
    }

    fn intent() -> Intent {
        Intent::default()
    }

    // --- should_process ---

    #[test]
    fn work_day_processes() {
        assert!(plane(monday()).should_process(&ControlState::default()));
    }

    #[test]
    fn skip_day_without_override_does_not_process() {
        assert!(!plane(saturday()).should_process(&ControlState::default()));
    }

    #[test]
    fn skip_day_with_override_today_processes() {
        assert!(plane(saturday()).should_process(&armed(saturday())));
    }

    #[test]
    fn skip_day_with_other_override_does_not_process() {
        assert!(!plane(saturday()).should_process(&armed(next_saturday())));
        assert!(!plane(saturday()).should_process(&armed(last_saturday())));
    }

    // --- Step 0: cancel ---

    #[test]
    fn no_cancel_request_is_noop() {
        let (state, outcome) = plane(saturday()).cancel(armed(saturday()), false);
        assert_eq!(outcome, CancelOutcome::default());
        assert_eq!(state, armed(saturday()));
    }

    #[test]
    fn cancel_today_stops_and_cleans_up_rest_of_today() {
        let mut plane = plane(saturday());
        let state = ControlState {
            override_flag: true,
            ..armed(saturday())
        };

        let (state, outcome) = plane.cancel(state, true);

        assert!(outcome.stop);
        assert_eq!(
            outcome.cleanup,
            Some(Cleanup {
                date: saturday(),
                mode: RemoveMode::FutureToday
            })
        );
        assert_eq!(state.override_date, None);
        assert!(!state.override_flag);
    }

    #[test]
    fn cancel_future_continues_and_cleans_up_that_day() {
        let mut plane = plane(monday());
        let state = ControlState {
            override_flag: true,
            ..armed(next_saturday())
        };

        let (state, outcome) = plane.cancel(state, true);

        assert!(!outcome.stop);
        assert_eq!(
            outcome.cleanup,
            Some(Cleanup {
                date: next_saturday(),
                mode: RemoveMode::AllDay
            })
        );
        assert_eq!(state.override_date, None);
        assert!(!state.override_flag);
    }

    #[test]
    fn cancel_with_nothing_armed_is_noop() {
        let (state, outcome) = plane(saturday()).cancel(ControlState::default(), true);
        assert!(!outcome.stop);
        assert!(!outcome.needs_cleanup());
        assert_eq!(state, ControlState::default());
    }

    #[test]
    fn cancel_past_override_is_noop() {
        let (state, outcome) = plane(monday()).cancel(armed(last_saturday()), true);
        assert!(!outcome.stop);
        assert!(!outcome.needs_cleanup());
        assert_eq!(state.override_date, Some(last_saturday()));
    }

    #[test]
    fn remote_cancel_behaves_like_cli_flag() {
        let commands = CommandSet::from_texts(["cancel"]);
        let decision = plane(saturday()).decide(armed(saturday()), &intent().with_commands(&commands));

        assert!(decision.stop);
        assert!(!decision.process);
        assert_eq!(decision.cleanup.map(|c| c.mode), Some(RemoveMode::FutureToday));
    }

    // --- Step 1: lifecycle ---

    #[test]
    fn active_override_is_kept_silently() {
        let mut plane = plane(saturday());
        let (state, status) = plane.classify(armed(saturday()));
        assert_eq!(status, OverrideStatus::Active(saturday()));
        assert_eq!(state, armed(saturday()));
        assert!(plane.notices().is_empty());
    }

    #[test]
    fn pending_override_is_kept() {
        let (state, status) = plane(monday()).classify(armed(next_saturday()));
        assert_eq!(status, OverrideStatus::Pending(next_saturday()));
        assert_eq!(state, armed(next_saturday()));
    }

    #[test]
    fn stale_override_is_cleared_with_warning() {
        let mut plane = plane(monday());
        let (state, status) = plane.classify(armed(last_saturday()));
        assert_eq!(status, OverrideStatus::Stale(last_saturday()));
        assert_eq!(state.override_date, None);
        assert_eq!(plane.notices()[0].level, NoticeLevel::Warning);
    }

    // --- Step 2: arming ---

    #[test]
    fn first_run_on_skip_day_arms_today() {
        let mut plane = plane(saturday());
        let request = Intent {
            override_requested: true,
            first_run: true,
            ..intent()
        };

        let decision = plane.decide(ControlState::default(), &request);

        assert_eq!(decision.state.override_date, Some(saturday()));
        assert!(!decision.state.override_flag);
        assert!(decision.process);
    }

    #[test]
    fn later_run_on_skip_day_arms_next_skip_day() {
        let request = Intent {
            override_requested: true,
            ..intent()
        };

        let decision = plane(saturday()).decide(ControlState::default(), &request);

        assert_eq!(decision.state.override_date, Some(sunday()));
        assert!(!decision.process);
    }

    #[test]
    fn work_day_arms_next_skip_day() {
        let request = Intent {
            override_requested: true,
            first_run: true,
            ..intent()
        };

        let decision = plane(monday()).decide(ControlState::default(), &request);

        assert_eq!(decision.state.override_date, Some(next_saturday()));
        assert_eq!(decision.status, OverrideStatus::None);
        assert!(decision.process);
    }

    #[test]
    fn repeated_request_does_not_move_armed_date() {
        let request = Intent {
            override_requested: true,
            first_run: true,
            ..intent()
        };

        // Pending Sunday override, asked again on the first Saturday run
        let decision = plane(saturday()).decide(armed(sunday()), &request);

        assert_eq!(decision.state.override_date, Some(sunday()));
        assert!(!decision.state.override_flag);
        assert!(!decision.process);
    }

    #[test]
    fn leftover_flag_is_resolved() {
        let state = ControlState {
            override_flag: true,
            ..Default::default()
        };

        let decision = plane(monday()).decide(state, &intent());

        assert_eq!(decision.state.override_date, Some(next_saturday()));
        assert!(!decision.state.override_flag);
    }

    #[test]
    fn empty_skip_days_makes_override_a_noop() {
        let mut plane = ControlPlane::new(saturday(), SkipDays::default());
        let request = Intent {
            override_requested: true,
            first_run: true,
            ..intent()
        };

        let decision = plane.decide(ControlState::default(), &request);

        assert_eq!(decision.state, ControlState::default());
        assert!(decision.process);
        assert_eq!(plane.notices()[0].level, NoticeLevel::Warning);
    }

    #[test]
    fn stale_override_is_cleared_before_new_request() {
        let mut plane = plane(monday());
        let request = Intent {
            override_requested: true,
            ..intent()
        };

        let decision = plane.decide(armed(last_saturday()), &request);

        assert_eq!(decision.status, OverrideStatus::Stale(last_saturday()));
        assert_eq!(decision.state.override_date, Some(next_saturday()));
        assert!(plane.notices().iter().any(|n| n.level == NoticeLevel::Warning));
    }

    #[test]
    fn cancel_and_override_together_rearm_after_future_cancel() {
        let request = Intent {
            override_requested: true,
            cancel_requested: true,
            ..intent()
        };

        let decision = plane(monday()).decide(armed(next_saturday()), &request);

        assert_eq!(
            decision.cleanup,
            Some(Cleanup {
                date: next_saturday(),
                mode: RemoveMode::AllDay
            })
        );
        assert_eq!(decision.state.override_date, Some(next_saturday()));
    }

    #[test]
    fn cancel_today_skips_the_rest_of_the_steps() {
        let request = Intent {
            override_requested: true,
            cancel_requested: true,
            first_run: true,
            ..intent()
        };

        let decision = plane(saturday()).decide(armed(saturday()), &request);

        assert!(decision.stop);
        assert_eq!(decision.state, ControlState::default());
    }

    #[test]
    fn command_cursor_survives_every_step() {
        let state = ControlState {
            command_cursor: Some(77),
            ..armed(last_saturday())
        };
        let request = Intent {
            override_requested: true,
            cancel_requested: true,
            ..intent()
        };

        let decision = plane(monday()).decide(state, &request);
        assert_eq!(decision.state.command_cursor, Some(77));
    }

    // --- End of day ---

    #[test]
    fn last_run_consumes_todays_override() {
        let mut plane = plane(saturday());
        let state = plane.consume_on_last(armed(saturday()));
        assert_eq!(state.override_date, None);
        assert_eq!(plane.notices().len(), 1);
    }

    #[test]
    fn last_run_keeps_future_override() {
        let mut plane = plane(saturday());
        let state = plane.consume_on_last(armed(next_saturday()));
        assert_eq!(state.override_date, Some(next_saturday()));
        assert!(plane.notices().is_empty());
    }
}
