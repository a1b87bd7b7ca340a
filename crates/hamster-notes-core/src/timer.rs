use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::{
    document::{Document, DocumentError},
    frontmatter::{extract_frontmatter, MetadataError},
    task::compose,
    tracker::{Connector, LazyTracker, TimeTracker, TrackerError},
};

/// Why a timer command stopped. Every variant ends the invocation.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Hamster is not running or not reachable")]
    ConnectionUnavailable(#[source] TrackerError),
    #[error("Current line is not an unchecked task")]
    NotActionable,
    #[error(transparent)]
    Metadata(#[from] MetadataError),
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error("Hamster rejected the request: {0}")]
    Tracker(#[source] TrackerError),
}

/// A fact handed to the daemon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartedFact {
    pub id: i32,
    pub description: String,
}

/// The start/stop commands, sharing one lazily connected tracker.
pub struct TimerCommands<C: Connector> {
    tracker: LazyTracker<C>,
}

impl<C: Connector> TimerCommands<C> {
    pub fn new(connector: C) -> Self {
        Self {
            tracker: LazyTracker::new(connector),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.tracker.is_connected()
    }

    /// Connect now if not already connected.
    pub async fn connect(&mut self) -> Result<(), CommandError> {
        self.tracker
            .acquire()
            .await
            .map(|_| ())
            .map_err(CommandError::ConnectionUnavailable)
    }

    /// Drop the tracker connection.
    pub fn disconnect(&mut self) {
        self.tracker.release();
    }

    /// Start a fact for the task on a 0-based line of `document`.
    #[instrument(skip(self, document))]
    pub async fn start(
        &mut self,
        document: &Document,
        line: usize,
    ) -> Result<StartedFact, CommandError> {
        let description = preview(document, line)?;
        let tracker = self
            .tracker
            .acquire()
            .await
            .map_err(CommandError::ConnectionUnavailable)?;

        let result = tracker.add_fact(&description, 0, 0, false).await;
        match result {
            Ok(id) => {
                info!(id, %description, "started fact");
                Ok(StartedFact { id, description })
            }
            Err(err) => Err(self.invalidate(err)),
        }
    }

    /// Stop the running fact.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> Result<(), CommandError> {
        let tracker = self
            .tracker
            .acquire()
            .await
            .map_err(CommandError::ConnectionUnavailable)?;

        let result = tracker.stop_tracking(0).await;
        match result {
            Ok(()) => {
                info!("stopped tracking");
                Ok(())
            }
            Err(err) => Err(self.invalidate(err)),
        }
    }

    // A failed call most likely means the daemon went away; reconnect next time.
    fn invalidate(&mut self, err: TrackerError) -> CommandError {
        warn!("tracker call failed, dropping connection: {err}");
        self.tracker.release();
        CommandError::Tracker(err)
    }
}

/// Compose the fact for a 0-based line of `document` without contacting the daemon.
pub fn preview(document: &Document, line: usize) -> Result<String, CommandError> {
    let text = document.line(line)?;
    let metadata = extract_frontmatter(document)?;
    compose(text, &metadata).ok_or(CommandError::NotActionable)
}
