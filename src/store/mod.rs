//! Schedule store
//!
//! A single owner task holds every day's state; handles only send it
//! commands. Each refresh runs its fetch on a separate task that reports back
//! tagged with the generation it was started for. Starting a refresh for a
//! day cancels the one already in flight for that day, and any completion
//! whose generation is no longer current is dropped, so an older response can
//! never overwrite a newer one.

use crate::error::{AppError, AppResult, FetchError};
use crate::fetch::ActivitySource;
use crate::models::{ActivityRecord, ConferenceDays, DayId};
use crate::utils::logging;
use chrono::Utc;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;

pub mod filter;
pub mod state;

pub use state::{DayPhase, DayState, ScheduleSnapshot};

const COMMAND_BUFFER: usize = 32;
const EVENT_BUFFER: usize = 64;

/// Notifications for the presentation layer (banners, toasts, re-render).
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    ScheduleUpdated { day: DayId, count: usize },
    FetchFailed { day: DayId, error: FetchError },
    RefreshSuperseded { day: DayId },
}

/// How a single refresh request ended.
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    Published { count: usize },
    Failed(FetchError),
    /// A newer refresh for the same day replaced this one before it finished.
    Superseded,
}

enum Command {
    Refresh {
        day: DayId,
        reply: Option<oneshot::Sender<RefreshOutcome>>,
    },
}

struct Completion {
    day: DayId,
    generation: u64,
    result: Result<Vec<ActivityRecord>, FetchError>,
}

struct InFlight {
    generation: u64,
    cancel: CancellationToken,
    reply: Option<oneshot::Sender<RefreshOutcome>>,
}

/// Cloneable handle to a running schedule store.
#[derive(Clone)]
pub struct ScheduleStore {
    commands: mpsc::Sender<Command>,
    snapshot: watch::Receiver<ScheduleSnapshot>,
    events: broadcast::Sender<StoreEvent>,
    days: ConferenceDays,
    shutdown: CancellationToken,
}

impl ScheduleStore {
    /// Start the owner task on the current tokio runtime.
    pub fn spawn(source: Arc<dyn ActivitySource>, days: ConferenceDays) -> Self {
        Self::spawn_with_shutdown(source, days, CancellationToken::new())
    }

    pub fn spawn_with_shutdown(
        source: Arc<dyn ActivitySource>,
        days: ConferenceDays,
        shutdown: CancellationToken,
    ) -> Self {
        let initial = ScheduleSnapshot {
            days: days.days().map(|day| (day, DayState::empty())).collect(),
        };

        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (snapshot_tx, snapshot_rx) = watch::channel(initial.clone());
        let (event_tx, _) = broadcast::channel(EVENT_BUFFER);

        let owner = ScheduleOwner {
            source,
            days: days.clone(),
            state: initial,
            in_flight: HashMap::new(),
            next_generation: 0,
            snapshot: snapshot_tx,
            events: event_tx.clone(),
            shutdown: shutdown.clone(),
        };
        tokio::spawn(owner.run(command_rx));

        Self {
            commands: command_tx,
            snapshot: snapshot_rx,
            events: event_tx,
            days,
            shutdown,
        }
    }

    /// Request a refresh of one day without waiting for it.
    pub async fn refresh(&self, day: DayId) -> AppResult<()> {
        self.ensure_day(day)?;
        self.commands
            .send(Command::Refresh { day, reply: None })
            .await
            .map_err(|_| AppError::StoreClosed)
    }

    /// Refresh one day and wait until the result is published or rejected.
    pub async fn refresh_and_wait(&self, day: DayId) -> AppResult<RefreshOutcome> {
        self.ensure_day(day)?;
        let reply = self.send_refresh(day).await?;
        reply.await.map_err(|_| AppError::StoreClosed)
    }

    /// Initial load: refresh every configured day concurrently.
    pub async fn refresh_all(&self) -> AppResult<Vec<(DayId, RefreshOutcome)>> {
        let mut pending = Vec::with_capacity(self.days.len());
        for day in self.days.days() {
            pending.push((day, self.send_refresh(day).await?));
        }

        let mut outcomes = Vec::with_capacity(pending.len());
        for (day, reply) in pending {
            outcomes.push((day, reply.await.map_err(|_| AppError::StoreClosed)?));
        }
        Ok(outcomes)
    }

    /// Currently published schedule for a day; empty until first loaded.
    pub fn schedule(&self, day: DayId) -> Vec<ActivityRecord> {
        self.snapshot.borrow().schedule(day).to_vec()
    }

    pub fn day_state(&self, day: DayId) -> Option<DayState> {
        self.snapshot.borrow().day(day).cloned()
    }

    /// Detail lookup within a day's published schedule.
    pub fn activity(&self, day: DayId, id: &str) -> Option<ActivityRecord> {
        self.snapshot
            .borrow()
            .schedule(day)
            .iter()
            .find(|record| record.id == id)
            .cloned()
    }

    pub fn snapshot(&self) -> ScheduleSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Receiver that is notified whenever any day's state changes.
    pub fn subscribe(&self) -> watch::Receiver<ScheduleSnapshot> {
        self.snapshot.clone()
    }

    pub fn events(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    pub fn days(&self) -> &ConferenceDays {
        &self.days
    }

    /// Stop the owner task and cancel every in-flight fetch.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    pub fn is_running(&self) -> bool {
        !self.commands.is_closed()
    }

    fn ensure_day(&self, day: DayId) -> AppResult<()> {
        if self.days.contains_day(day) {
            Ok(())
        } else {
            Err(AppError::invalid_input(format!(
                "{} is not a conference day (1..={})",
                day,
                self.days.len()
            )))
        }
    }

    async fn send_refresh(&self, day: DayId) -> AppResult<oneshot::Receiver<RefreshOutcome>> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(Command::Refresh {
                day,
                reply: Some(reply_tx),
            })
            .await
            .map_err(|_| AppError::StoreClosed)?;
        Ok(reply_rx)
    }
}

struct ScheduleOwner {
    source: Arc<dyn ActivitySource>,
    days: ConferenceDays,
    state: ScheduleSnapshot,
    in_flight: HashMap<DayId, InFlight>,
    next_generation: u64,
    snapshot: watch::Sender<ScheduleSnapshot>,
    events: broadcast::Sender<StoreEvent>,
    shutdown: CancellationToken,
}

impl ScheduleOwner {
    async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        let (completion_tx, mut completions) = mpsc::unbounded_channel();
        info!("Schedule store started with {} conference days", self.days.len());

        loop {
            tokio::select! {
                biased;

                _ = self.shutdown.cancelled() => {
                    info!("Shutdown signal received, stopping schedule store");
                    break;
                }
                Some(completion) = completions.recv() => {
                    self.finish_refresh(completion);
                }
                command = commands.recv() => match command {
                    Some(Command::Refresh { day, reply }) => {
                        self.start_refresh(day, reply, &completion_tx);
                    }
                    None => {
                        debug!("All store handles dropped");
                        break;
                    }
                },
            }
        }

        // Pending replies are dropped with their senders; waiters see StoreClosed
        for (_, in_flight) in self.in_flight.drain() {
            in_flight.cancel.cancel();
        }
        info!("Schedule store stopped");
    }

    fn start_refresh(
        &mut self,
        day: DayId,
        reply: Option<oneshot::Sender<RefreshOutcome>>,
        completions: &mpsc::UnboundedSender<Completion>,
    ) {
        if !self.days.contains_day(day) {
            warn!("Ignoring refresh for unknown {}", day);
            return;
        }

        if let Some(previous) = self.in_flight.remove(&day) {
            debug!(
                "Superseding in-flight refresh of {} (generation {})",
                day, previous.generation
            );
            previous.cancel.cancel();
            if let Some(reply) = previous.reply {
                let _ = reply.send(RefreshOutcome::Superseded);
            }
            let _ = self.events.send(StoreEvent::RefreshSuperseded { day });
        }

        self.next_generation += 1;
        let generation = self.next_generation;
        let cancel = self.shutdown.child_token();

        self.state.days.entry(day).or_default().begin_loading();
        self.publish();

        let source = self.source.clone();
        let token = cancel.clone();
        let completions = completions.clone();
        tokio::spawn(async move {
            // Run the fetch on its own task so a panic still yields a completion
            let mut fetch = tokio::spawn(async move { source.fetch().await });
            let result = tokio::select! {
                biased;

                _ = token.cancelled() => {
                    debug!("Fetch for {} (generation {}) cancelled", day, generation);
                    fetch.abort();
                    return;
                }
                joined = &mut fetch => joined.unwrap_or_else(|e| {
                    warn!("Fetch task for {} (generation {}) failed: {}", day, generation, e);
                    Err(FetchError::network(format!("fetch task failed: {}", e)))
                }),
            };
            let _ = completions.send(Completion {
                day,
                generation,
                result,
            });
        });

        self.in_flight.insert(
            day,
            InFlight {
                generation,
                cancel,
                reply,
            },
        );
    }

    fn finish_refresh(&mut self, completion: Completion) {
        let Completion {
            day,
            generation,
            result,
        } = completion;

        let in_flight = match self.in_flight.remove(&day) {
            Some(current) if current.generation == generation => current,
            Some(current) => {
                self.in_flight.insert(day, current);
                debug!("Discarding stale response for {} (generation {})", day, generation);
                return;
            }
            None => {
                debug!("Discarding response for {} with no refresh pending", day);
                return;
            }
        };

        let (outcome, event) = match result {
            Ok(records) => {
                let unscheduled = filter::count_unscheduled(&self.days, &records);
                if unscheduled > 0 {
                    debug!("{} activities fall outside every conference day", unscheduled);
                }

                let schedule = self
                    .days
                    .window(day)
                    .map(|window| filter::build_day_schedule(&window, &records))
                    .unwrap_or_default();
                let count = schedule.len();

                self.state
                    .days
                    .entry(day)
                    .or_default()
                    .apply_success(schedule, Utc::now());
                logging::log_schedule_published(day, count);

                (
                    RefreshOutcome::Published { count },
                    StoreEvent::ScheduleUpdated { day, count },
                )
            }
            Err(error) => {
                logging::log_fetch_failure(day, &error);
                self.state.days.entry(day).or_default().apply_failure(error.clone());

                (
                    RefreshOutcome::Failed(error.clone()),
                    StoreEvent::FetchFailed { day, error },
                )
            }
        };

        self.publish();
        let _ = self.events.send(event);
        if let Some(reply) = in_flight.reply {
            let _ = reply.send(outcome);
        }
    }

    fn publish(&self) {
        self.snapshot.send_replace(self.state.clone());
    }
}
