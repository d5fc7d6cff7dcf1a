use std::fmt;
use std::path::PathBuf;

use serde_json::{Map, Value};

use crate::kernel::data::AppData;
use crate::storage::ConfigStore;

/// Fired before the loader chain runs
pub const EVT_BOOT: &str = "app.boot";
/// Fired once the application reached the booted state
pub const EVT_BOOTED: &str = "app.booted";
/// Fired by the config loader before any file is read
pub const EVT_BEFORE_CONFIG: &str = "config.before";
/// Fired by the config loader after files and flags were merged
pub const EVT_AFTER_CONFIG: &str = "config.after";

/// Identifies which listeners an event reaches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Boot,
    Booted,
    BeforeConfig,
    AfterConfig,
    /// Application-defined event name
    Custom(&'static str),
}

impl EventKind {
    /// Get the wire name of this event
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::Boot => EVT_BOOT,
            EventKind::Booted => EVT_BOOTED,
            EventKind::BeforeConfig => EVT_BEFORE_CONFIG,
            EventKind::AfterConfig => EVT_AFTER_CONFIG,
            EventKind::Custom(name) => *name,
        }
    }

    /// Map a name back to its kind; unknown names become `Custom`
    pub fn from_name(name: &'static str) -> Self {
        match name {
            EVT_BOOT => EventKind::Boot,
            EVT_BOOTED => EventKind::Booted,
            EVT_BEFORE_CONFIG => EventKind::BeforeConfig,
            EVT_AFTER_CONFIG => EventKind::AfterConfig,
            other => EventKind::Custom(other),
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A lifecycle event together with its payload.
///
/// Payloads are borrowed mutably from their owner, so a listener that edits
/// the file list or the config store changes what later listeners and the
/// firer see.
#[derive(Debug)]
pub enum LifecycleEvent<'a> {
    /// `app.boot`: the application is about to run its loader chain
    Boot {
        name: &'a mut String,
        config: &'a mut ConfigStore,
        data: &'a mut AppData,
    },
    /// `app.booted`: boot finished; the payload is read-only
    Booted {
        name: &'a str,
        config: &'a ConfigStore,
    },
    /// `config.before`: files about to be loaded
    BeforeConfig {
        files: &'a mut Vec<PathBuf>,
        config: &'a mut ConfigStore,
    },
    /// `config.after`: files and flags merged
    AfterConfig {
        config: &'a mut ConfigStore,
    },
    /// Application-defined event with a JSON payload
    Custom {
        name: &'static str,
        payload: &'a mut Map<String, Value>,
    },
}

impl LifecycleEvent<'_> {
    pub fn kind(&self) -> EventKind {
        match self {
            LifecycleEvent::Boot { .. } => EventKind::Boot,
            LifecycleEvent::Booted { .. } => EventKind::Booted,
            LifecycleEvent::BeforeConfig { .. } => EventKind::BeforeConfig,
            LifecycleEvent::AfterConfig { .. } => EventKind::AfterConfig,
            LifecycleEvent::Custom { name, .. } => EventKind::Custom(*name),
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind().name()
    }
}
