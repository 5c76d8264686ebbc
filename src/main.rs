// confschedule - conference schedule viewer
// Command-line front end: a list view per day and a detail view per activity

use anyhow::{Context, Result};
use clap::Parser;
use confschedule::utils::logging;
use confschedule::{
    ActivityFetcher, ActivityRecord, AppError, DayId, RefreshOutcome, ScheduleConfig, ScheduleStore,
};
use log::info;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "confschedule", version, about = "Show the conference schedule")]
struct Cli {
    /// Conference day to show (1-based); every day when omitted
    #[arg(short, long)]
    day: Option<u32>,

    /// Activity id to show in detail
    #[arg(short, long, requires = "day")]
    activity: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = logging::init_logging() {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let config = ScheduleConfig::from_env().context("Failed to load configuration")?;
    let fetcher = ActivityFetcher::new(&config).context("Failed to create schedule client")?;
    let store = ScheduleStore::spawn(Arc::new(fetcher), config.days.clone());

    let result = run(&cli, &store).await;
    store.shutdown();

    if let Err(e) = &result {
        logging::log_error_with_context(e, "confschedule");
    }
    result
}

async fn run(cli: &Cli, store: &ScheduleStore) -> Result<()> {
    match (cli.day.map(DayId), cli.activity.as_deref()) {
        (Some(day), Some(id)) => {
            report(day, &store.refresh_and_wait(day).await?);
            let activity = store
                .activity(day, id)
                .ok_or_else(|| AppError::not_found(format!("activity '{}' on {}", id, day)))?;
            print_detail(&activity);
        }
        (Some(day), None) => {
            report(day, &store.refresh_and_wait(day).await?);
            print_day(day, &store.schedule(day));
        }
        (None, _) => {
            for (day, outcome) in store.refresh_all().await? {
                report(day, &outcome);
                print_day(day, &store.schedule(day));
            }
        }
    }
    Ok(())
}

fn report(day: DayId, outcome: &RefreshOutcome) {
    match outcome {
        RefreshOutcome::Published { count } => info!("Loaded {} activities for {}", count, day),
        RefreshOutcome::Failed(error) => eprintln!(
            "Could not refresh {}: {}. Showing the last loaded schedule.",
            day,
            AppError::from(error.clone()).to_safe_string()
        ),
        RefreshOutcome::Superseded => info!("Refresh of {} was replaced by a newer one", day),
    }
}

fn print_day(day: DayId, schedule: &[ActivityRecord]) {
    println!("Schedule - {}", day);
    if schedule.is_empty() {
        println!("  No activities scheduled");
    }
    for activity in schedule {
        println!("  [{}] {} - {}", activity.id, activity.title, activity.time_range_label());
    }
    println!();
}

fn print_detail(activity: &ActivityRecord) {
    println!("{}", activity.title);
    println!("Time: {}", activity.time_range_label());
    println!("Room: {}", activity.location);
    if let Some(speakers) = activity.speakers_label() {
        println!("Speakers: {}", speakers);
    }
    if !activity.notes.is_empty() {
        println!("Notes: {}", activity.notes);
    }
}
