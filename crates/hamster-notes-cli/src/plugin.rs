use std::path::Path;

use color_eyre::{eyre::WrapErr, Result};
use hamster_notes_core::{
    document::Document,
    timer::{CommandError, StartedFact, TimerCommands},
    tracker::Connector,
};
use tracing::{debug, info, warn};

use crate::config::Config;

/// Owns everything the commands need for one session: settings and the
/// tracker connection. Built by [`Plugin::load`], torn down by [`Plugin::unload`].
pub struct Plugin<C: Connector> {
    config: Config,
    timer: TimerCommands<C>,
}

impl<C: Connector> Plugin<C> {
    /// Set up settings and try to reach the daemon once. An unreachable daemon
    /// is logged, not fatal; the commands retry on their own.
    pub async fn load(config: Config, connector: C) -> Self {
        let mut timer = TimerCommands::new(connector);
        if let Err(err) = timer.connect().await {
            warn!("{err}");
        }
        info!(connected = timer.is_connected(), "plugin loaded");
        Self { config, timer }
    }

    pub fn is_connected(&self) -> bool {
        self.timer.is_connected()
    }

    /// Start a fact from a 1-based line of `document`.
    pub async fn start_timer(
        &mut self,
        document: &Document,
        line: u32,
    ) -> Result<StartedFact, CommandError> {
        self.timer.start(document, zero_based(line)).await
    }

    pub async fn stop_timer(&mut self) -> Result<(), CommandError> {
        self.timer.stop().await
    }

    /// Release the tracker connection.
    pub fn unload(mut self) {
        self.timer.disconnect();
        debug!(my_setting = %self.config.my_setting, "plugin unloaded");
    }
}

/// Read a note from disk.
pub async fn read_note(path: &Path) -> Result<Document> {
    let text = tokio::fs::read_to_string(path)
        .await
        .wrap_err_with(|| format!("reading {}", path.display()))?;
    Ok(Document::parse(&text))
}

pub fn zero_based(line: u32) -> usize {
    line.saturating_sub(1) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use hamster_notes_core::tracker::{InMemoryConnector, InMemoryTracker, TrackerCall};

    #[tokio::test]
    async fn load_connects_eagerly() {
        let connector = InMemoryConnector::new(InMemoryTracker::new());
        let plugin = Plugin::load(Config::default(), connector.clone()).await;
        assert!(plugin.is_connected());
        assert_eq!(connector.attempts(), 1);
        plugin.unload();
    }

    #[tokio::test]
    async fn load_survives_missing_daemon() {
        let plugin = Plugin::load(Config::default(), InMemoryConnector::unavailable()).await;
        assert!(!plugin.is_connected());
    }

    #[tokio::test]
    async fn start_timer_reads_note_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("note.md");
        std::fs::write(&path, "---\nproject: Acme\n---\n- [ ] Write report\n")
            .expect("write note");

        let tracker = InMemoryTracker::new();
        let mut plugin = Plugin::load(Config::default(), InMemoryConnector::new(tracker.clone())).await;
        let document = read_note(&path).await.expect("read note");
        let started = plugin.start_timer(&document, 4).await.expect("start");

        assert_eq!(started.description, "Write report@Acme");
        assert_eq!(
            tracker.calls(),
            vec![TrackerCall::AddFact {
                description: "Write report@Acme".into(),
                start_time: 0,
                end_time: 0,
                temporary: false,
            }]
        );
    }

    #[tokio::test]
    async fn stop_timer_after_daemon_appears() {
        let tracker = InMemoryTracker::new();
        let mut plugin = Plugin::load(Config::default(), InMemoryConnector::new(tracker.clone())).await;
        plugin.stop_timer().await.expect("stop");
        assert_eq!(tracker.calls(), vec![TrackerCall::StopTracking { end_time: 0 }]);
    }

    #[tokio::test]
    async fn missing_note_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(read_note(&dir.path().join("absent.md")).await.is_err());
    }

    #[test]
    fn converts_editor_line_numbers() {
        assert_eq!(zero_based(1), 0);
        assert_eq!(zero_based(12), 11);
    }
}
