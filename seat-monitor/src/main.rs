use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use seat_monitor::alerts::AlertCache;
use seat_monitor::config::{ConfigError, DEFAULT_CONFIG_PATH, MonitorConfig, process_env};
use seat_monitor::domain::{ScheduleType, SearchQuery, parse_travel_date};
use seat_monitor::interpret::interpret;
use seat_monitor::logging;
use seat_monitor::monitor::{AvailabilitySource, Monitor, SearchPlan};
use seat_monitor::notify::{
    AlertDispatcher, DEFAULT_QUEUE_CAPACITY, LogNotifier, NotifyError, TelegramNotifier,
};
use seat_monitor::portal::{DEFAULT_DEPARTURE_TIME, PortalClient, PortalError};

/// How long to wait for queued alerts on exit.
const DRAIN_DEADLINE: Duration = Duration::from_secs(30);

#[derive(Debug, Parser)]
#[command(name = "seat-monitor", version, about = "Watch the SGR booking portal for open seats")]
struct Cli {
    /// Path to the JSON config file
    #[arg(long, env = "SEAT_MONITOR_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Also append logs to this file
    #[arg(long, env = "SEAT_MONITOR_LOG_FILE")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Poll until interrupted (default)
    Run,
    /// Run a single check cycle and exit
    Once,
    /// Run one live query and print the interpreted result
    Probe {
        /// Travel date, DD/MM/YYYY
        #[arg(long, value_parser = parse_date_arg)]
        date: NaiveDate,
        /// express or inter_county
        #[arg(long, default_value = "express")]
        train_type: ScheduleType,
        /// Departure time, e.g. 10.00 (default: the first configured time
        /// for the train type)
        #[arg(long)]
        time: Option<String>,
    },
    /// Interpret a saved response page and print the result
    Parse {
        file: PathBuf,
    },
}

#[derive(Debug, thiserror::Error)]
enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("portal: {0}")]
    Portal(#[from] PortalError),

    #[error("notifier: {0}")]
    Notify(#[from] NotifyError),

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to render output: {0}")]
    Json(#[from] serde_json::Error),
}

fn parse_date_arg(s: &str) -> Result<NaiveDate, String> {
    parse_travel_date(s).map_err(|e| format!("expected DD/MM/YYYY: {e}"))
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.log_file.as_deref()) {
        eprintln!("failed to open log file: {e}");
        return ExitCode::FAILURE;
    }

    let result = match cli.command.unwrap_or(Command::Run) {
        Command::Run => watch(&cli.config, true).await,
        Command::Once => watch(&cli.config, false).await,
        Command::Probe {
            date,
            train_type,
            time,
        } => probe(&cli.config, date, train_type, time).await,
        Command::Parse { file } => parse_file(&file),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "fatal");
            ExitCode::FAILURE
        }
    }
}

/// Poll until Ctrl-C, or run a single cycle when `forever` is false.
async fn watch(config_path: &Path, forever: bool) -> Result<(), AppError> {
    let config = MonitorConfig::load(config_path)?;
    let portal = PortalClient::new(config.portal_config())?;
    let booking_url = portal.base_url().to_string();

    let dispatcher = match config.telegram(process_env) {
        Some(telegram) => {
            let notifier = TelegramNotifier::new(telegram)?;
            info!(destinations = notifier.destinations().len(), "sending alerts to telegram");
            AlertDispatcher::spawn(notifier, DEFAULT_QUEUE_CAPACITY)
        }
        None => {
            warn!("telegram credentials not configured, alerts will only be logged");
            AlertDispatcher::spawn(LogNotifier, DEFAULT_QUEUE_CAPACITY)
        }
    };

    let monitor = Monitor::new(
        portal,
        SearchPlan::from_config(&config),
        AlertCache::new(&config.alert_cache_config()),
        dispatcher,
        config.check_interval(),
    )
    .with_booking_url(booking_url);

    if monitor.plan().queries().is_empty() {
        warn!("no travel dates or train types configured, nothing will be checked");
    }

    if forever {
        monitor.run(shutdown_signal()).await;
    } else {
        monitor.run_cycle().await;
    }

    match monitor.shutdown(DRAIN_DEADLINE).await {
        Some(stats) => info!(
            delivered = stats.delivered,
            failed = stats.failed,
            "alert delivery stopped"
        ),
        None => warn!("alert queue not drained before deadline"),
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}

/// One live query, printed as JSON. Sends nothing.
async fn probe(
    config_path: &Path,
    date: NaiveDate,
    schedule_type: ScheduleType,
    time: Option<String>,
) -> Result<(), AppError> {
    let config = MonitorConfig::load(config_path)?;
    let portal = PortalClient::new(config.portal_config())?;

    let time = time
        .or_else(|| {
            SearchPlan::from_config(&config)
                .default_time(schedule_type)
                .map(str::to_string)
        })
        .unwrap_or_else(|| DEFAULT_DEPARTURE_TIME.to_string());

    let query = SearchQuery::new(
        schedule_type,
        date,
        config.route.terminal_id,
        config.route.destination_id,
    )
    .with_departure_time(time);

    let body = portal.fetch(&query).await?;
    let outcome = interpret(&body);
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

/// Interpret a saved response page, printed as JSON.
fn parse_file(path: &Path) -> Result<(), AppError> {
    let body = std::fs::read_to_string(path).map_err(|source| AppError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let outcome = interpret(&body);
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}
