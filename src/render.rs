//! Colored terminal rendering for calmerge types.

use calmerge_core::config::Source;
use calmerge_core::control::OverrideStatus;
use calmerge_core::reconcile::{EventAction, MergeEvent, counts};
use calmerge_core::window::SyncWindow;
use owo_colors::OwoColorize;

pub trait Render {
    fn render(&self) -> String;
}

impl Render for EventAction {
    fn render(&self) -> String {
        let symbol = self.symbol();
        match self {
            EventAction::Add => symbol.green().to_string(),
            EventAction::Delete => symbol.red().to_string(),
        }
    }
}

fn colorize(action: EventAction, text: &str) -> String {
    match action {
        EventAction::Add => text.green().to_string(),
        EventAction::Delete => text.red().to_string(),
    }
}

/// One planned operation, with times in the window's timezone.
fn render_op(op: &MergeEvent, window: &SyncWindow) -> String {
    let action = op.action();
    let time = format!(
        "{} → {}",
        op.start()
            .with_timezone(&window.timezone)
            .format("%a %Y-%m-%d %H:%M"),
        op.end().with_timezone(&window.timezone).format("%H:%M")
    );
    format!(
        "{} {} {}",
        action.render(),
        colorize(action, op.title()),
        time.dimmed()
    )
}

impl Render for Source {
    fn render(&self) -> String {
        format!("📅 {} {}", self.title, format!("[{}] /{}", self.tag, self.label).dimmed())
    }
}

impl Render for OverrideStatus {
    fn render(&self) -> String {
        match self {
            OverrideStatus::None => String::new(),
            OverrideStatus::Active(d) => format!("Override active for {d}").yellow().to_string(),
            OverrideStatus::Pending(d) => format!("Override armed for {d}").yellow().to_string(),
            OverrideStatus::Stale(d) => format!("Discarded stale override for {d}").red().to_string(),
        }
    }
}

/// Show counts instead of individual events above this many
const COMPACT_THRESHOLD: usize = 5;

pub fn render_plan(ops: &[MergeEvent], window: &SyncWindow, verbose: bool) -> String {
    if ops.is_empty() {
        return "   No changes".dimmed().to_string();
    }

    if verbose || ops.len() <= COMPACT_THRESHOLD {
        return ops
            .iter()
            .map(|op| format!("   {}", render_op(op, window)))
            .collect::<Vec<_>>()
            .join("\n");
    }

    let (adds, deletes) = counts(ops);
    let mut lines = Vec::new();
    if adds > 0 {
        let label = format!("({adds} new {})", pluralize(adds));
        lines.push(format!("   {} {}", "+".green(), label.green()));
    }
    if deletes > 0 {
        let label = format!("({deletes} removed {})", pluralize(deletes));
        lines.push(format!("   {} {}", "-".red(), label.red()));
    }
    lines.join("\n")
}

fn pluralize(count: usize) -> &'static str {
    if count == 1 { "event" } else { "events" }
}
