use crate::error::FetchError;
use crate::models::DayId;
use env_logger::{Builder, Target};
use log::{Level, LevelFilter, SetLoggerError};
use std::env;
use std::io::Write;

pub fn parse_level(raw: &str) -> LevelFilter {
    match raw.to_lowercase().as_str() {
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

pub fn init_logging() -> Result<(), SetLoggerError> {
    let log_level = parse_level(&env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()));

    let mut builder = Builder::from_default_env();

    builder.format(|buf, record| {
        let timestamp = buf.timestamp();
        let target = record.target();
        let file = record.file().unwrap_or("unknown");
        let line = record.line().unwrap_or(0);

        match record.level() {
            Level::Info => writeln!(buf, "{} [INFO] [{}]: {}", timestamp, target, record.args()),
            level => writeln!(
                buf,
                "{} [{}] [{}:{}] {}: {}",
                timestamp,
                level,
                file,
                line,
                target,
                record.args()
            ),
        }
    });

    // Filter out noisy modules in production
    if env::var("RUST_ENV").unwrap_or_else(|_| "development".to_string()) == "production" {
        builder.filter_module("reqwest", LevelFilter::Warn);
        builder.filter_module("hyper", LevelFilter::Warn);
        builder.filter_module("tokio", LevelFilter::Info);
    }

    // Stderr keeps the CLI's stdout free for schedule output
    builder.filter_level(log_level).target(Target::Stderr).try_init()
}

pub fn log_error_with_context(error: &anyhow::Error, context: &str) {
    log::error!("[{}] {}", context, error);

    for cause in error.chain().skip(1) {
        log::error!("  Caused by: {}", cause);
    }
}

pub fn log_fetch_completed(records: usize, duration_ms: u64) {
    log::info!("[Fetch] Received {} activities in {}ms", records, duration_ms);
}

pub fn log_fetch_failure(day: DayId, error: &FetchError) {
    if error.is_transient() {
        log::warn!("[Schedule] Refresh of {} failed, keeping previous schedule: {}", day, error);
    } else {
        log::error!("[Schedule] Refresh of {} failed, keeping previous schedule: {}", day, error);
    }
}

pub fn log_schedule_published(day: DayId, count: usize) {
    log::info!("[Schedule] Published {} activities for {}", count, day);
}
