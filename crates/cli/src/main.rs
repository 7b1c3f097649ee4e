use std::sync::Arc;

use anyhow::Context;
use chrono::{NaiveDate, NaiveTime, Utc};
use clap::Parser;

use kitwatch_alerts::{NotificationDispatcher, Sender};
use kitwatch_infra::{
    DailySchedule, DataSourceSettings, DryRunDispatcher, ExpiryCheckRunner,
    FirebaseSnapshotReader, MailSettings, SendGridDispatcher,
};
use kitwatch_observability::LogFormat;

/// Daily kit expiry check: emails each study's contact about kits reaching an
/// expiry milestone (30, 15, 5 and 0 days).
#[derive(Debug, Parser)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Log output format (json or pretty).
    #[clap(long, global = true, default_value = "json", env = "KITWATCH_LOG_FORMAT")]
    log_format: LogFormat,
    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, clap::Subcommand)]
enum Command {
    /// Run the check once and exit.
    Run {
        /// Reference date (YYYY-MM-DD). Defaults to the current UTC date.
        #[clap(long)]
        today: Option<NaiveDate>,
        /// Render and log emails without sending them.
        #[clap(long)]
        dry_run: bool,
    },
    /// Run the check every day at a fixed UTC time until interrupted.
    Schedule {
        /// UTC time of day (HH:MM).
        #[clap(long, default_value = "08:00", value_parser = parse_time_of_day)]
        at: NaiveTime,
        /// Render and log emails without sending them.
        #[clap(long)]
        dry_run: bool,
    },
}

impl Command {
    fn dry_run(&self) -> bool {
        match self {
            Command::Run { dry_run, .. } | Command::Schedule { dry_run, .. } => *dry_run,
        }
    }
}

fn parse_time_of_day(s: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s, "%H:%M").map_err(|e| format!("expected HH:MM: {e}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    kitwatch_observability::init(args.log_format);

    // All configuration is loaded before any read or send.
    let data_source = DataSourceSettings::from_env().context("loading data source settings")?;
    let reader = Arc::new(FirebaseSnapshotReader::new(data_source));

    if args.command.dry_run() {
        let sender = match MailSettings::from_env() {
            Ok(mail) => mail.sender,
            Err(_) => Sender {
                email: "dry-run@localhost".to_string(),
                name: Some("kitwatch dry run".to_string()),
            },
        };
        tracing::warn!("dry run: emails are rendered and logged, not sent");
        execute(args.command, reader, Arc::new(DryRunDispatcher), sender).await
    } else {
        let mail = MailSettings::from_env().context("loading mail settings")?;
        let dispatcher = Arc::new(SendGridDispatcher::new(mail.api_key));
        execute(args.command, reader, dispatcher, mail.sender).await
    }
}

async fn execute<D>(
    command: Command,
    reader: Arc<FirebaseSnapshotReader>,
    dispatcher: Arc<D>,
    sender: Sender,
) -> anyhow::Result<()>
where
    D: NotificationDispatcher,
{
    let runner = ExpiryCheckRunner::new(reader, dispatcher, sender)?;

    match command {
        Command::Run { today, .. } => {
            let today = today.unwrap_or_else(|| Utc::now().date_naive());
            let report = runner
                .run_once(today)
                .await
                .context("daily expiry check failed")?;
            if report.failed() > 0 {
                tracing::warn!(
                    failed = report.failed(),
                    "some expiry alerts could not be delivered"
                );
            }
            Ok(())
        }
        Command::Schedule { at, .. } => {
            let handle = DailySchedule::at(at).spawn(Arc::new(runner));
            tokio::signal::ctrl_c()
                .await
                .context("waiting for shutdown signal")?;
            tracing::info!("shutdown requested");
            handle.shutdown().await;
            Ok(())
        }
    }
}
