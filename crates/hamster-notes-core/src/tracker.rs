use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors produced by time-tracker connections and calls.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TrackerError {
    /// The daemon or the bus could not be reached.
    #[error("tracker unavailable: {reason}")]
    Unavailable { reason: String },
    /// A remote method call failed.
    #[error("{method} failed: {reason}")]
    Call { method: &'static str, reason: String },
}

/// The two Hamster methods this bridge drives.
#[async_trait]
pub trait TimeTracker: Send + Sync {
    /// Start a fact; returns the id the daemon assigned to it.
    async fn add_fact(
        &self,
        description: &str,
        start_time: i32,
        end_time: i32,
        temporary: bool,
    ) -> Result<i32, TrackerError>;

    /// Stop whatever fact is currently running.
    async fn stop_tracking(&self, end_time: i32) -> Result<(), TrackerError>;
}

/// Establishes a connection to a time tracker.
#[async_trait]
pub trait Connector: Send + Sync {
    type Tracker: TimeTracker;

    async fn connect(&self) -> Result<Self::Tracker, TrackerError>;
}

/// Connection handle acquired on first use and re-acquired whenever it is missing.
pub struct LazyTracker<C: Connector> {
    connector: C,
    handle: Option<C::Tracker>,
}

impl<C: Connector> LazyTracker<C> {
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            handle: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.handle.is_some()
    }

    /// Return the connected tracker, connecting first if there is no handle.
    /// A failed attempt leaves the handle unset so the next call tries again.
    pub async fn acquire(&mut self) -> Result<&C::Tracker, TrackerError> {
        let tracker = match self.handle.take() {
            Some(tracker) => tracker,
            None => {
                debug!("connecting to time tracker");
                self.connector.connect().await.inspect_err(|err| {
                    warn!("time tracker unreachable: {err}");
                })?
            }
        };
        Ok(&*self.handle.insert(tracker))
    }

    /// Drop the handle; the next `acquire` reconnects.
    pub fn release(&mut self) {
        if self.handle.take().is_some() {
            debug!("released time tracker connection");
        }
    }
}

/// A call observed by [`InMemoryTracker`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerCall {
    AddFact {
        description: String,
        start_time: i32,
        end_time: i32,
        temporary: bool,
    },
    StopTracking {
        end_time: i32,
    },
}

/// Tracker that records calls instead of talking to a daemon.
/// Useful for tests and offline smoke checks; clones share one call log.
#[derive(Debug, Default, Clone)]
pub struct InMemoryTracker {
    calls: Arc<Mutex<Vec<TrackerCall>>>,
    failing: bool,
}

impl InMemoryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// A tracker whose every call fails.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<TrackerCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, method: &'static str, call: TrackerCall) -> Result<usize, TrackerError> {
        if self.failing {
            return Err(TrackerError::Call {
                method,
                reason: "simulated failure".into(),
            });
        }
        let mut calls = self.calls.lock().map_err(|err| TrackerError::Call {
            method,
            reason: format!("lock poisoned: {err}"),
        })?;
        calls.push(call);
        Ok(calls.len())
    }
}

#[async_trait]
impl TimeTracker for InMemoryTracker {
    async fn add_fact(
        &self,
        description: &str,
        start_time: i32,
        end_time: i32,
        temporary: bool,
    ) -> Result<i32, TrackerError> {
        let count = self.record(
            "AddFact",
            TrackerCall::AddFact {
                description: description.to_string(),
                start_time,
                end_time,
                temporary,
            },
        )?;
        Ok(i32::try_from(count).unwrap_or(i32::MAX))
    }

    async fn stop_tracking(&self, end_time: i32) -> Result<(), TrackerError> {
        self.record("StopTracking", TrackerCall::StopTracking { end_time })?;
        Ok(())
    }
}

/// Connector handing out clones of one [`InMemoryTracker`], or refusing to connect.
#[derive(Debug, Clone)]
pub struct InMemoryConnector {
    tracker: Option<InMemoryTracker>,
    attempts: Arc<AtomicUsize>,
}

impl InMemoryConnector {
    pub fn new(tracker: InMemoryTracker) -> Self {
        Self {
            tracker: Some(tracker),
            attempts: Arc::default(),
        }
    }

    /// A connector whose daemon is never reachable.
    pub fn unavailable() -> Self {
        Self {
            tracker: None,
            attempts: Arc::default(),
        }
    }

    /// Number of `connect` calls made so far.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for InMemoryConnector {
    type Tracker = InMemoryTracker;

    async fn connect(&self) -> Result<InMemoryTracker, TrackerError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        self.tracker.clone().ok_or_else(|| TrackerError::Unavailable {
            reason: "no tracker registered".into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn acquire_connects_once_and_reuses_handle() {
        let connector = InMemoryConnector::new(InMemoryTracker::new());
        let mut lazy = LazyTracker::new(connector.clone());
        assert!(!lazy.is_connected());

        lazy.acquire().await.expect("first acquire");
        lazy.acquire().await.expect("second acquire");

        assert!(lazy.is_connected());
        assert_eq!(connector.attempts(), 1);
    }

    #[tokio::test]
    async fn failed_connect_leaves_handle_unset_and_retries() {
        let connector = InMemoryConnector::unavailable();
        let mut lazy = LazyTracker::new(connector.clone());

        let err = lazy.acquire().await.expect_err("should be unavailable");
        assert!(matches!(err, TrackerError::Unavailable { .. }));
        assert!(!lazy.is_connected());

        lazy.acquire().await.expect_err("still unavailable");
        assert_eq!(connector.attempts(), 2);
    }

    #[tokio::test]
    async fn release_forces_reconnect() {
        let connector = InMemoryConnector::new(InMemoryTracker::new());
        let mut lazy = LazyTracker::new(connector.clone());
        lazy.acquire().await.expect("acquire");
        lazy.release();
        assert!(!lazy.is_connected());
        lazy.acquire().await.expect("reacquire");
        assert_eq!(connector.attempts(), 2);
    }

    #[tokio::test]
    async fn in_memory_tracker_records_calls() {
        let tracker = InMemoryTracker::new();
        let id = tracker
            .add_fact("Write report@Acme", 0, 0, false)
            .await
            .expect("add fact");
        tracker.stop_tracking(0).await.expect("stop");

        assert_eq!(id, 1);
        assert_eq!(
            tracker.calls(),
            vec![
                TrackerCall::AddFact {
                    description: "Write report@Acme".into(),
                    start_time: 0,
                    end_time: 0,
                    temporary: false,
                },
                TrackerCall::StopTracking { end_time: 0 },
            ]
        );
    }

    #[tokio::test]
    async fn failing_tracker_reports_method() {
        let tracker = InMemoryTracker::failing();
        let err = tracker.stop_tracking(0).await.expect_err("should fail");
        assert_eq!(
            err,
            TrackerError::Call {
                method: "StopTracking",
                reason: "simulated failure".into(),
            }
        );
        assert!(tracker.calls().is_empty());
    }
}
