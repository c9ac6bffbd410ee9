//! Abstractions for time and remote job status to enable testing.
//!
//! This module provides traits for:
//! - `Clock`: Abstracting time access so "today" is deterministic in tests
//! - `StatusSource`: Abstracting the scrape-status endpoint polled by the task poller

use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};
use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone, Utc};

// ==================== Clock Trait ====================

/// Trait for abstracting time access.
///
/// Every countdown in the dashboard is relative to the local calendar day,
/// so injecting a mock clock pins "today" for reproducible tests.
pub trait Clock: Send + Sync {
    /// Get the current time in UTC.
    fn now_utc(&self) -> DateTime<Utc>;

    /// Get the current time in the local timezone.
    fn now_local(&self) -> DateTime<Local>;

    /// The current local calendar day.
    fn today(&self) -> NaiveDate {
        self.now_local().date_naive()
    }
}

/// System clock implementation using real time.
#[derive(Debug, Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn now_local(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Mock clock for testing with controllable time.
#[derive(Debug, Clone)]
pub struct MockClock {
    utc_time: Arc<Mutex<DateTime<Utc>>>,
}

impl MockClock {
    /// Create a new mock clock set to the given UTC time.
    pub fn new(time: DateTime<Utc>) -> Self {
        Self {
            utc_time: Arc::new(Mutex::new(time)),
        }
    }

    /// Create a mock clock at local noon of the given day.
    ///
    /// Noon never falls into a DST gap, so the local day is unambiguous.
    pub fn at_local_date(date: NaiveDate) -> Self {
        let noon = date.and_time(NaiveTime::from_hms_opt(12, 0, 0).unwrap_or_default());
        let local = Local
            .from_local_datetime(&noon)
            .earliest()
            .unwrap_or_else(|| noon.and_utc().with_timezone(&Local));
        Self::new(local.with_timezone(&Utc))
    }

    /// Set the mock clock to a new time.
    pub fn set_time(&self, time: DateTime<Utc>) {
        *self.utc_time.lock().unwrap() = time;
    }

    /// Advance the clock by a duration.
    pub fn advance(&self, duration: chrono::Duration) {
        let mut time = self.utc_time.lock().unwrap();
        *time = *time + duration;
    }
}

impl Clock for MockClock {
    fn now_utc(&self) -> DateTime<Utc> {
        *self.utc_time.lock().unwrap()
    }

    fn now_local(&self) -> DateTime<Local> {
        self.now_utc().with_timezone(&Local)
    }
}

// ==================== StatusSource Trait ====================

/// Trait for the remote job-status collaborator.
///
/// Implemented by the HTTP client in production and by
/// [`ScriptedStatusSource`] in tests.
pub trait StatusSource: Send + Sync {
    /// Number of scrape jobs currently pending or running.
    fn active_jobs(&self) -> impl Future<Output = Result<u32>> + Send;
}

/// Status source that replays a fixed script of responses.
///
/// Once the script is exhausted every further check reports zero active jobs.
#[derive(Debug, Clone, Default)]
pub struct ScriptedStatusSource {
    script: Arc<Mutex<VecDeque<Result<u32, String>>>>,
    calls: Arc<Mutex<u32>>,
}

impl ScriptedStatusSource {
    /// Create a source that answers with the given job counts in order.
    pub fn new(counts: impl IntoIterator<Item = u32>) -> Self {
        Self {
            script: Arc::new(Mutex::new(counts.into_iter().map(Ok).collect())),
            calls: Arc::new(Mutex::new(0)),
        }
    }

    /// Append a failing response to the script.
    pub fn push_failure(&self, message: &str) {
        self.script
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
    }

    /// Append a successful response to the script.
    pub fn push_count(&self, count: u32) {
        self.script.lock().unwrap().push_back(Ok(count));
    }

    /// How many status checks have been issued.
    pub fn call_count(&self) -> u32 {
        *self.calls.lock().unwrap()
    }
}

impl StatusSource for ScriptedStatusSource {
    async fn active_jobs(&self) -> Result<u32> {
        *self.calls.lock().unwrap() += 1;
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Ok(count)) => Ok(count),
            Some(Err(message)) => Err(anyhow!(message)),
            None => Ok(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_system_clock_returns_current_time() {
        let clock = SystemClock;
        let before = Utc::now();
        let clock_time = clock.now_utc();
        let after = Utc::now();

        assert!(clock_time >= before);
        assert!(clock_time <= after);
    }

    #[test]
    fn test_mock_clock_returns_set_time() {
        let fixed_time = Utc.with_ymd_and_hms(2024, 6, 15, 14, 30, 0).unwrap();
        let clock = MockClock::new(fixed_time);

        assert_eq!(clock.now_utc(), fixed_time);
    }

    #[test]
    fn test_mock_clock_advance() {
        let start = Utc.with_ymd_and_hms(2024, 6, 15, 10, 0, 0).unwrap();
        let clock = MockClock::new(start);

        clock.advance(chrono::Duration::hours(2));

        let expected = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
        assert_eq!(clock.now_utc(), expected);
    }

    #[test]
    fn test_mock_clock_at_local_date_pins_today() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let clock = MockClock::at_local_date(date);

        assert_eq!(clock.today(), date);

        clock.advance(chrono::Duration::days(1));
        assert_eq!(clock.today(), date.succ_opt().unwrap());
    }

    #[tokio::test]
    async fn test_scripted_source_replays_then_reports_idle() {
        let source = ScriptedStatusSource::new([3, 1]);
        source.push_failure("boom");

        assert_eq!(source.active_jobs().await.unwrap(), 3);
        assert_eq!(source.active_jobs().await.unwrap(), 1);
        assert!(source.active_jobs().await.is_err());
        assert_eq!(source.active_jobs().await.unwrap(), 0);
        assert_eq!(source.call_count(), 4);
    }
}
