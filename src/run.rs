//! One invocation: control plane, optional cleanup, optional sync, save.

use anyhow::Result;
use calmerge_core::catalog::EventCatalog;
use calmerge_core::command::{CommandSet, CommandSource};
use calmerge_core::config::Settings;
use calmerge_core::control::{ControlPlane, Intent, Notice, OverrideStatus};
use calmerge_core::event::SourceEvent;
use calmerge_core::feed;
use calmerge_core::reconcile::{self, apply};
use calmerge_core::removal::remove_scoped;
use calmerge_core::state::StateStore;
use calmerge_core::window::SyncWindow;
use chrono::{DateTime, Utc};
use owo_colors::OwoColorize;
use tracing::{info, warn};

use crate::feed::FeedSource;
use crate::render::{Render, render_plan};
use crate::utils::tui;

pub struct RunOptions {
    pub intent: Intent,
    pub dry_run: bool,
    pub verbose: bool,
}

/// What the caller still has to deal with after a run.
#[derive(Debug, Default)]
pub struct RunReport {
    pub notices: Vec<Notice>,
    /// Human-readable descriptions of everything that failed
    pub failures: Vec<String>,
    pub synced: bool,
}

pub async fn execute<C, S, F>(
    settings: &Settings,
    options: &RunOptions,
    catalog: &C,
    commands: Option<&S>,
    feeds: &F,
    now: DateTime<Utc>,
) -> Result<RunReport>
where
    C: EventCatalog,
    S: CommandSource,
    F: FeedSource,
{
    let tz = settings.timezone;
    let store = StateStore::new(&settings.state_file);
    let loaded = store.load();
    let mut state = loaded.clone();

    let mut received = CommandSet::default();
    if let Some(source) = commands {
        match source.poll(state.command_cursor).await {
            Ok(poll) => {
                for command in poll.commands.iter() {
                    info!(%command, "remote command received");
                }
                received = poll.commands;
                state = state.with_cursor(poll.cursor);
            }
            Err(e) => warn!(error = %e, "could not poll remote commands"),
        }
    }

    let today = now.with_timezone(&tz).date_naive();
    let intent = options.intent.with_commands(&received);
    let mut plane = ControlPlane::new(today, settings.skip_days.clone());
    let decision = plane.decide(state, &intent);
    let mut state = decision.state.clone();
    let mut report = RunReport::default();

    if options.dry_run {
        println!("{}", "Dry run: nothing will be written".yellow());
    }
    if decision.status != OverrideStatus::None {
        println!("{}", decision.status.render());
    }

    if let Some(cleanup) = decision.cleanup {
        println!("Retracting {} ({})", cleanup.date, cleanup.mode);
        match catalog.events(&SyncWindow::single_day(cleanup.date, tz)).await {
            Ok(events) => {
                let removal = remove_scoped(
                    catalog,
                    &events,
                    cleanup.date,
                    cleanup.mode,
                    now,
                    tz,
                    options.dry_run,
                )
                .await;
                println!("   Removed {} event(s)", removal.removed);
                report
                    .failures
                    .extend(removal.failures.iter().map(|f| f.to_string()));
            }
            Err(e) => report
                .failures
                .push(format!("Could not list events for {}: {e}", cleanup.date)),
        }
    }

    if decision.stop {
        info!(%today, "run stopped after cancel");
    } else if !decision.process {
        println!("{}", format!("{today} is a skip day; not syncing").dimmed());
        info!(%today, "skip day, sync not processed");
    } else {
        let window = SyncWindow::new(
            today,
            settings.future_events_days,
            tz,
            settings.skip_days.clone(),
            state.override_date,
        );
        match sync(settings, options, catalog, feeds, &window).await {
            Ok(failures) => {
                report.synced = true;
                report.failures.extend(failures);
            }
            Err(e) => report.failures.push(format!("{e:#}")),
        }

        if intent.last_run {
            state = plane.consume_on_last(state);
        }
    }

    if options.dry_run {
        info!("dry run: state left untouched");
    } else if state != loaded {
        store.save(&state)?;
    }

    report.notices = plane.take_notices();
    Ok(report)
}

/// Download every feed, then reconcile and apply. Any feed failure aborts
/// before the target calendar is touched.
async fn sync<C: EventCatalog, F: FeedSource>(
    settings: &Settings,
    options: &RunOptions,
    catalog: &C,
    feeds: &F,
    window: &SyncWindow,
) -> Result<Vec<String>> {
    let mut wanted: Vec<SourceEvent> = Vec::new();

    for source in &settings.sources {
        let spinner = tui::create_spinner(source.render());
        let fetched = feeds.fetch(&source.url).await;
        spinner.finish_and_clear();
        println!("{}", source.render());

        let content = fetched?;
        let events = feed::parse_and_filter(&content, &source.label, &source.tag, window)?;
        println!("   {} event(s) in window", events.len());
        wanted.extend(events);
    }

    let existing: Vec<_> = catalog
        .events(window)
        .await?
        .into_iter()
        .filter(|e| window.admits(e.start))
        .collect();

    let ops = reconcile::reconcile(&existing, &wanted);
    println!("\n{}", render_plan(&ops, window, options.verbose));

    let applied = apply(catalog, &ops, options.dry_run).await;
    info!(
        added = applied.added,
        deleted = applied.deleted,
        failed = applied.failures.len(),
        dry_run = options.dry_run,
        "sync applied"
    );
    if applied.added > 0 || applied.deleted > 0 {
        let verb = if options.dry_run { "Would apply" } else { "Applied" };
        println!(
            "\n{verb}: {} added, {} deleted",
            applied.added, applied.deleted
        );
    }

    Ok(applied.failures.iter().map(|f| f.to_string()).collect())
}
