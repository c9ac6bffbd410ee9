//! Force-scrape trigger button state.

use std::time::Duration;

pub const LABEL_READY: &str = "Force Scrape";
pub const LABEL_SCRAPING: &str = "Scraping...";
pub const LABEL_FAILED: &str = "Failed - Try Again";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshPhase {
    #[default]
    Ready,
    /// Request in flight.
    Scraping,
    /// Waiting to re-enable after a request completed.
    CoolingDown { failed: bool },
}

/// Label and enablement of the refresh trigger through one request cycle.
///
/// `begin` -> `complete` -> (caller sleeps the returned cooldown) -> `reenable`.
#[derive(Debug, Clone)]
pub struct RefreshButton {
    phase: RefreshPhase,
    success_cooldown: Duration,
    failure_cooldown: Duration,
}

impl Default for RefreshButton {
    fn default() -> Self {
        Self::new(Duration::from_millis(2000), Duration::from_millis(3000))
    }
}

impl RefreshButton {
    pub fn new(success_cooldown: Duration, failure_cooldown: Duration) -> Self {
        Self {
            phase: RefreshPhase::Ready,
            success_cooldown,
            failure_cooldown,
        }
    }

    pub fn phase(&self) -> RefreshPhase {
        self.phase
    }

    pub fn label(&self) -> &'static str {
        match self.phase {
            RefreshPhase::Ready | RefreshPhase::CoolingDown { failed: false } => LABEL_READY,
            RefreshPhase::Scraping => LABEL_SCRAPING,
            RefreshPhase::CoolingDown { failed: true } => LABEL_FAILED,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.phase == RefreshPhase::Ready
    }

    /// Press the button. Returns false if it is disabled.
    pub fn begin(&mut self) -> bool {
        if !self.is_enabled() {
            tracing::debug!(phase = ?self.phase, "Refresh trigger ignored while disabled");
            return false;
        }
        self.phase = RefreshPhase::Scraping;
        true
    }

    /// Record the request outcome and return how long to stay disabled.
    pub fn complete(&mut self, success: bool) -> Duration {
        self.phase = RefreshPhase::CoolingDown { failed: !success };
        if success {
            self.success_cooldown
        } else {
            self.failure_cooldown
        }
    }

    pub fn reenable(&mut self) {
        self.phase = RefreshPhase::Ready;
    }
}
