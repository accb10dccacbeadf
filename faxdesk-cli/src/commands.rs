use std::time::Duration;

use crossbeam_channel::RecvTimeoutError;
use faxdesk::{stats, FaxCategory, FaxFilter, IntakeOutcome, ReviewRequest, SettingsUpdate};
use serde::Serialize;
use serde_json::json;
use tokio::sync::broadcast::error::TryRecvError;

use crate::app::App;
use crate::cli::{BatchArgs, Command, ListArgs, PageArgs, SettingsCommand};
use crate::error::CliResult;

const EVENT_POLL: Duration = Duration::from_millis(250);

pub fn run(app: &App, command: Command) -> CliResult<()> {
    match command {
        Command::Watch => watch(app),
        Command::Scan => {
            let watcher = app.watcher()?;
            let report = watcher.manual_scan();
            print_json(&json!({ "report": report, "status": watcher.status() }))
        }
        Command::Ingest { file } => match app.intake.ingest_file(&file)? {
            IntakeOutcome::Created(record) => print_json(&json!({
                "duplicate": false,
                "fax": record.without_text(),
            })),
            IntakeOutcome::Duplicate { content_hash } => print_json(&json!({
                "duplicate": true,
                "content_hash": content_hash,
            })),
        },
        Command::List(args) => list(app, args),
        Command::Queue(PageArgs { limit, offset }) => print_json(&app.review.queue(limit, offset)?),
        Command::Show { id, feedback } => {
            let fax = app.review.get(id)?;
            if feedback {
                let records = app.review.feedback_for(id)?;
                print_json(&json!({ "fax": fax, "feedback": records }))
            } else {
                print_json(&fax)
            }
        }
        Command::Approve { id, reviewer } => {
            print_json(&app.review.approve(id, reviewer.as_deref())?)
        }
        Command::Override {
            id,
            category,
            reason,
            reviewer,
        } => print_json(&app.review.override_category(
            id,
            Some(category),
            reason.as_deref(),
            reviewer.as_deref(),
        )?),
        Command::Batch(args) => batch(app, args),
        Command::Process { id } => {
            app.review.mark_processed(id)?;
            print_json(&json!({ "id": id, "status": "processed" }))
        }
        Command::Delete { id } => {
            app.review.delete(id)?;
            print_json(&json!({ "id": id, "deleted": true }))
        }
        Command::Feedback {
            id,
            category,
            text,
            by,
        } => print_json(&app.review.submit_feedback(id, category, text, by)?),
        Command::Stats => print_json(&stats::fax_stats(&app.db)?),
        Command::Summary => print_json(&stats::queue_summary(&app.db)?),
        Command::Settings { command } => settings(app, command),
        Command::Categories => print_json(&FaxCategory::catalogue()),
    }
}

fn list(app: &App, args: ListArgs) -> CliResult<()> {
    let filter = FaxFilter {
        status: args.status,
        category: args.category,
        urgent_only: args.urgent,
        limit: args.page.limit,
        offset: args.page.offset,
    };
    print_json(&app.review.list(&filter)?)
}

fn batch(app: &App, args: BatchArgs) -> CliResult<()> {
    let request = ReviewRequest {
        action: args.action,
        category: args.category,
        reason: args.reason,
        reviewer: args.reviewer,
    };
    print_json(&app.review.batch_review(&args.ids, &request))
}

fn settings(app: &App, command: SettingsCommand) -> CliResult<()> {
    match command {
        SettingsCommand::Get { key: Some(key) } => {
            print_json(&json!({ "key": key, "value": app.settings.get_raw(&key)? }))
        }
        SettingsCommand::Get { key: None } => print_json(&json!({
            "settings": app.settings.get()?,
            "stored": app.settings.all_raw()?,
        })),
        SettingsCommand::Set { key, value } => {
            app.settings.set(&key, &value)?;
            print_json(&json!({ "key": key, "value": value }))
        }
        SettingsCommand::Update {
            watch_folder,
            auto_process,
            require_review,
            confidence_threshold,
        } => print_json(&app.settings.update(&SettingsUpdate {
            watch_folder,
            auto_process,
            require_review,
            confidence_threshold,
        })?),
    }
}

/// Runs the watcher until Ctrl-C, printing each event as one JSON line.
fn watch(app: &App) -> CliResult<()> {
    if !app.settings.auto_process()? {
        log::warn!("auto_process is off; files are only picked up by `faxdesk scan`");
        return Ok(());
    }

    let watcher = app.watcher()?;
    let mut events = watcher.subscribe();

    let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(1);
    ctrlc::set_handler(move || {
        log::info!("Received Ctrl+C, stopping watcher...");
        let _ = stop_tx.try_send(());
    })?;

    watcher.start()?;

    loop {
        loop {
            match events.try_recv() {
                Ok(event) => println!("{}", serde_json::to_string(&event)?),
                Err(TryRecvError::Lagged(n)) => log::warn!("Dropped {} watcher events", n),
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }

        match stop_rx.recv_timeout(EVENT_POLL) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {}
        }
    }

    watcher.stop();
    print_json(&watcher.status())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
