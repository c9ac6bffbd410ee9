//! Background scrape monitoring: busy indicator and status polling.
//!
//! [`TaskPoller`] is a pure state machine. It never sleeps or performs I/O;
//! each transition returns a [`PollCommand`] telling the caller what to do
//! next. [`spawn_poller`] runs the machine inside one tokio task, the only
//! writer of its state, executing those commands against a
//! [`StatusSource`].

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::traits::StatusSource;

/// Delay between status checks while jobs are active.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// What the driver must do after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollCommand {
    /// Issue a status check now.
    CheckNow,
    /// Issue a status check after the delay.
    ScheduleCheck(Duration),
    /// Nothing to do.
    Idle,
}

/// Indicator and polling state.
///
/// Idle: not polling, no active tasks. Active: polling with at least one
/// active task. At most one status check is in flight or scheduled at a time.
#[derive(Debug, Clone)]
pub struct TaskPoller {
    active_tasks: u32,
    polling_active: bool,
    check_scheduled: bool,
    check_in_flight: bool,
    /// Whether the poller itself holds one of the active task slots.
    holds_task: bool,
    interval: Duration,
}

impl Default for TaskPoller {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

impl TaskPoller {
    pub fn new(interval: Duration) -> Self {
        Self {
            active_tasks: 0,
            polling_active: false,
            check_scheduled: false,
            check_in_flight: false,
            holds_task: false,
            interval,
        }
    }

    pub fn active_tasks(&self) -> u32 {
        self.active_tasks
    }

    pub fn indicator_visible(&self) -> bool {
        self.active_tasks > 0
    }

    pub fn is_polling(&self) -> bool {
        self.polling_active
    }

    pub fn has_pending_check(&self) -> bool {
        self.check_scheduled
    }

    pub fn check_in_flight(&self) -> bool {
        self.check_in_flight
    }

    /// Count a task as running; shows the indicator. Does not start polling.
    pub fn mark_task_started(&mut self) {
        self.active_tasks += 1;
        if self.active_tasks == 1 {
            tracing::debug!("Showing busy indicator");
        }
    }

    /// Count a task as done. When none remain the indicator hides and
    /// polling stops.
    pub fn mark_task_finished(&mut self) {
        self.active_tasks = self.active_tasks.saturating_sub(1);
        if self.active_tasks == 0 {
            tracing::debug!("Hiding busy indicator");
            // No slot is left for the poller to hold
            self.holds_task = false;
            self.stop_polling();
        }
    }

    /// Start polling with an immediate check. No-op while already polling.
    pub fn begin_polling(&mut self) -> PollCommand {
        if self.polling_active {
            return PollCommand::Idle;
        }
        self.polling_active = true;
        if self.check_in_flight {
            // The outstanding check's result resumes the cycle
            return PollCommand::Idle;
        }
        self.check_in_flight = true;
        PollCommand::CheckNow
    }

    /// Stop polling and cancel any scheduled check. Idempotent.
    pub fn stop_polling(&mut self) {
        if self.polling_active || self.check_scheduled {
            tracing::debug!("Stopping status polling");
        }
        self.polling_active = false;
        self.check_scheduled = false;
    }

    /// A scheduled delay elapsed.
    pub fn on_timer_fired(&mut self) -> PollCommand {
        if !self.check_scheduled {
            return PollCommand::Idle;
        }
        self.check_scheduled = false;
        if !self.polling_active || self.check_in_flight {
            return PollCommand::Idle;
        }
        self.check_in_flight = true;
        PollCommand::CheckNow
    }

    /// Feed the outcome of a status check.
    ///
    /// Active jobs keep the indicator up and schedule the next check. Zero
    /// jobs or a failed query release the poller's task and stop polling;
    /// failures are never retried.
    pub fn on_status(&mut self, result: Result<u32>) -> PollCommand {
        self.check_in_flight = false;

        if !self.polling_active {
            tracing::debug!("Ignoring status result after polling stopped");
            return PollCommand::Idle;
        }

        match result {
            Ok(jobs) if jobs > 0 => {
                tracing::debug!(jobs, "Scrape jobs active");
                if !self.holds_task {
                    self.holds_task = true;
                    self.mark_task_started();
                }
                self.check_scheduled = true;
                PollCommand::ScheduleCheck(self.interval)
            }
            outcome => {
                if let Err(e) = outcome {
                    tracing::warn!("Scrape status check failed, stopping polling: {:#}", e);
                } else {
                    tracing::debug!("No active scrape jobs");
                }
                self.release_task();
                self.stop_polling();
                PollCommand::Idle
            }
        }
    }

    fn release_task(&mut self) {
        if self.holds_task {
            self.holds_task = false;
            self.mark_task_finished();
        }
    }
}

// ==================== Async Driver ====================

/// Observable state published by the poller task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PollSnapshot {
    pub indicator_visible: bool,
    pub polling: bool,
    pub active_tasks: u32,
    pub checks_completed: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PollerMessage {
    BeginPolling,
    StopPolling,
    TaskStarted,
    TaskFinished,
    Shutdown,
}

/// Handle to a running poller task.
#[derive(Debug)]
pub struct PollerHandle {
    tx: mpsc::UnboundedSender<PollerMessage>,
    snapshot: watch::Receiver<PollSnapshot>,
    join: JoinHandle<()>,
}

impl PollerHandle {
    pub fn begin_polling(&self) {
        self.send(PollerMessage::BeginPolling);
    }

    pub fn stop_polling(&self) {
        self.send(PollerMessage::StopPolling);
    }

    pub fn mark_task_started(&self) {
        self.send(PollerMessage::TaskStarted);
    }

    pub fn mark_task_finished(&self) {
        self.send(PollerMessage::TaskFinished);
    }

    pub fn snapshot(&self) -> PollSnapshot {
        *self.snapshot.borrow()
    }

    /// Receiver for indicator changes.
    pub fn subscribe(&self) -> watch::Receiver<PollSnapshot> {
        self.snapshot.clone()
    }

    /// Teardown: stop polling, drop any pending timer and wait for the task.
    pub async fn shutdown(self) {
        self.send(PollerMessage::Shutdown);
        if let Err(e) = self.join.await {
            tracing::warn!("Poller task ended abnormally: {}", e);
        }
    }

    fn send(&self, message: PollerMessage) {
        if self.tx.send(message).is_err() {
            tracing::debug!(?message, "Poller task already stopped");
        }
    }
}

type StatusFuture = Pin<Box<dyn Future<Output = Result<u32>> + Send>>;
type TimerFuture = Pin<Box<tokio::time::Sleep>>;

/// Await an optional future; pending forever when absent.
async fn wait_on<F: Future + Unpin>(slot: &mut Option<F>) -> F::Output {
    match slot {
        Some(fut) => fut.await,
        None => std::future::pending().await,
    }
}

/// Spawn the poller task on the current tokio runtime.
pub fn spawn_poller<S>(source: S, interval: Duration) -> PollerHandle
where
    S: StatusSource + Clone + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel();
    let (snapshot_tx, snapshot_rx) = watch::channel(PollSnapshot::default());

    let join = tokio::spawn(async move {
        let mut poller = TaskPoller::new(interval);
        let mut in_flight: Option<StatusFuture> = None;
        let mut timer: Option<TimerFuture> = None;
        let mut checks_completed = 0u32;

        loop {
            let command = tokio::select! {
                // Commands first so a stop is never overtaken by a result
                biased;

                message = rx.recv() => match message {
                    Some(PollerMessage::BeginPolling) => poller.begin_polling(),
                    Some(PollerMessage::StopPolling) => {
                        poller.stop_polling();
                        PollCommand::Idle
                    }
                    Some(PollerMessage::TaskStarted) => {
                        poller.mark_task_started();
                        PollCommand::Idle
                    }
                    Some(PollerMessage::TaskFinished) => {
                        poller.mark_task_finished();
                        PollCommand::Idle
                    }
                    Some(PollerMessage::Shutdown) | None => {
                        poller.stop_polling();
                        break;
                    }
                },
                result = wait_on(&mut in_flight) => {
                    in_flight = None;
                    checks_completed += 1;
                    poller.on_status(result)
                }
                () = wait_on(&mut timer) => {
                    timer = None;
                    poller.on_timer_fired()
                }
            };

            match command {
                PollCommand::CheckNow => {
                    let source = source.clone();
                    in_flight = Some(Box::pin(async move { source.active_jobs().await }));
                }
                PollCommand::ScheduleCheck(delay) => {
                    timer = Some(Box::pin(tokio::time::sleep(delay)));
                }
                PollCommand::Idle => {}
            }
            if !poller.has_pending_check() {
                timer = None;
            }

            snapshot_tx.send_replace(PollSnapshot {
                indicator_visible: poller.indicator_visible(),
                polling: poller.is_polling(),
                active_tasks: poller.active_tasks(),
                checks_completed,
            });
        }

        snapshot_tx.send_replace(PollSnapshot {
            indicator_visible: poller.indicator_visible(),
            polling: false,
            active_tasks: poller.active_tasks(),
            checks_completed,
        });
        tracing::debug!("Poller task stopped");
    });

    PollerHandle {
        tx,
        snapshot: snapshot_rx,
        join,
    }
}
