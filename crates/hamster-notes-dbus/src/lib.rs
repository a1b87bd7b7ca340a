//! Session-bus adapter for the Hamster time-tracking daemon.

use async_trait::async_trait;
use hamster_notes_core::tracker::{Connector, TimeTracker, TrackerError};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use zbus::{
    fdo::DBusProxy, names::BusName, proxy::CacheProperties, zvariant::Value, Connection,
};

pub const DEFAULT_SERVICE: &str = "org.gnome.Hamster";
pub const DEFAULT_PATH: &str = "/org/gnome/Hamster";

#[zbus::proxy(
    interface = "org.gnome.Hamster",
    default_service = "org.gnome.Hamster",
    default_path = "/org/gnome/Hamster"
)]
trait Hamster {
    #[zbus(name = "AddFact")]
    fn add_fact(
        &self,
        fact: &str,
        start_time: i32,
        end_time: i32,
        temporary: bool,
    ) -> zbus::Result<i32>;

    #[zbus(name = "StopTracking")]
    fn stop_tracking(&self, end_time: &Value<'_>) -> zbus::Result<()>;
}

/// Where to find the daemon on the session bus.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct TrackerConfig {
    #[serde(default = "default_service")]
    pub service: String,
    #[serde(default = "default_path")]
    pub path: String,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            service: default_service(),
            path: default_path(),
        }
    }
}

fn default_service() -> String {
    DEFAULT_SERVICE.to_string()
}

fn default_path() -> String {
    DEFAULT_PATH.to_string()
}

/// Connects to Hamster over the session bus.
#[derive(Debug, Clone, Default)]
pub struct DbusConnector {
    config: TrackerConfig,
}

impl DbusConnector {
    pub fn new(config: TrackerConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Connector for DbusConnector {
    type Tracker = DbusTracker;

    #[instrument(skip(self), fields(service = %self.config.service, path = %self.config.path))]
    async fn connect(&self) -> Result<DbusTracker, TrackerError> {
        let connection = Connection::session().await.map_err(unavailable)?;

        // Building a proxy does not contact the service, so ask the bus whether
        // anyone owns the name before handing out a tracker.
        let name = BusName::try_from(self.config.service.as_str()).map_err(unavailable)?;
        let owned = DBusProxy::new(&connection)
            .await
            .map_err(unavailable)?
            .name_has_owner(name)
            .await
            .map_err(unavailable)?;
        if !owned {
            return Err(TrackerError::Unavailable {
                reason: format!("{} has no owner on the session bus", self.config.service),
            });
        }

        let proxy = HamsterProxy::builder(&connection)
            .destination(self.config.service.clone())
            .map_err(unavailable)?
            .path(self.config.path.clone())
            .map_err(unavailable)?
            .cache_properties(CacheProperties::No)
            .build()
            .await
            .map_err(unavailable)?;
        debug!("connected to hamster");
        Ok(DbusTracker { proxy })
    }
}

/// A live Hamster proxy.
pub struct DbusTracker {
    proxy: HamsterProxy<'static>,
}

#[async_trait]
impl TimeTracker for DbusTracker {
    #[instrument(skip(self))]
    async fn add_fact(
        &self,
        description: &str,
        start_time: i32,
        end_time: i32,
        temporary: bool,
    ) -> Result<i32, TrackerError> {
        self.proxy
            .add_fact(description, start_time, end_time, temporary)
            .await
            .map_err(|err| call_failed("AddFact", err))
    }

    #[instrument(skip(self))]
    async fn stop_tracking(&self, end_time: i32) -> Result<(), TrackerError> {
        self.proxy
            .stop_tracking(&Value::from(end_time))
            .await
            .map_err(|err| call_failed("StopTracking", err))
    }
}

fn unavailable(err: impl std::fmt::Display) -> TrackerError {
    TrackerError::Unavailable {
        reason: err.to_string(),
    }
}

fn call_failed(method: &'static str, err: zbus::Error) -> TrackerError {
    TrackerError::Call {
        method,
        reason: err.to_string(),
    }
}
