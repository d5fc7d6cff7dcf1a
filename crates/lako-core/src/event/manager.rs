use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use serde_json::{Map, Value};

use crate::event::error::EventSystemError;
use crate::event::types::{EventKind, LifecycleEvent};
use crate::event::EventId;
use crate::kernel::error::{Error, Result};
use crate::storage::ConfigStore;

/// Boxed listener. Listeners receive the event by mutable reference so
/// payload edits are visible to everyone after them.
pub type Listener = Box<dyn for<'a, 'b> Fn(&'b mut LifecycleEvent<'a>) -> Result<()> + Send + Sync>;

/// Synchronous lifecycle event bus.
///
/// Listeners are keyed by event name and invoked in registration order.
/// Registration needs `&mut self`, so it can only happen while the owner is
/// still being set up; firing only needs `&self`.
pub struct EventManager {
    listeners: HashMap<&'static str, Vec<(EventId, Listener)>>,
    next_listener_id: EventId,
}

impl fmt::Debug for EventManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listener_count: usize = self.listeners.values().map(|v| v.len()).sum();
        f.debug_struct("EventManager")
            .field("event_names", &self.listeners.keys().collect::<Vec<_>>())
            .field("listener_count", &listener_count)
            .field("next_listener_id", &self.next_listener_id)
            .finish()
    }
}

impl EventManager {
    pub fn new() -> Self {
        Self {
            listeners: HashMap::new(),
            next_listener_id: 1,
        }
    }

    /// Register a listener for `kind`. Registering the same closure twice
    /// makes it fire twice.
    pub fn on<F>(&mut self, kind: EventKind, listener: F) -> EventId
    where
        F: for<'a, 'b> Fn(&'b mut LifecycleEvent<'a>) -> Result<()> + Send + Sync + 'static,
    {
        let id = self.next_listener_id;
        self.next_listener_id += 1;
        self.listeners
            .entry(kind.name())
            .or_default()
            .push((id, Box::new(listener)));
        log::debug!("Registered listener {} for event '{}'", id, kind);
        id
    }

    /// Listen to `app.boot` with access to the name and config store
    pub fn on_boot<F>(&mut self, listener: F) -> EventId
    where
        F: Fn(&mut String, &mut ConfigStore) -> Result<()> + Send + Sync + 'static,
    {
        self.on(EventKind::Boot, move |event| match event {
            LifecycleEvent::Boot { name, config, .. } => listener(&mut **name, &mut **config),
            _ => Ok(()),
        })
    }

    /// Listen to `app.booted`
    pub fn on_booted<F>(&mut self, listener: F) -> EventId
    where
        F: Fn(&str, &ConfigStore) -> Result<()> + Send + Sync + 'static,
    {
        self.on(EventKind::Booted, move |event| match event {
            LifecycleEvent::Booted { name, config } => listener(*name, *config),
            _ => Ok(()),
        })
    }

    /// Listen to `config.before`; the listener may edit the file list
    pub fn on_before_config<F>(&mut self, listener: F) -> EventId
    where
        F: Fn(&mut Vec<PathBuf>, &mut ConfigStore) -> Result<()> + Send + Sync + 'static,
    {
        self.on(EventKind::BeforeConfig, move |event| match event {
            LifecycleEvent::BeforeConfig { files, config } => listener(&mut **files, &mut **config),
            _ => Ok(()),
        })
    }

    /// Listen to `config.after`
    pub fn on_after_config<F>(&mut self, listener: F) -> EventId
    where
        F: Fn(&mut ConfigStore) -> Result<()> + Send + Sync + 'static,
    {
        self.on(EventKind::AfterConfig, move |event| match event {
            LifecycleEvent::AfterConfig { config } => listener(&mut **config),
            _ => Ok(()),
        })
    }

    /// Listen to an application-defined event
    pub fn on_custom<F>(&mut self, name: &'static str, listener: F) -> EventId
    where
        F: Fn(&mut Map<String, Value>) -> Result<()> + Send + Sync + 'static,
    {
        self.on(EventKind::Custom(name), move |event| match event {
            LifecycleEvent::Custom { payload, .. } => listener(&mut **payload),
            _ => Ok(()),
        })
    }

    /// Remove a listener by id
    pub fn off(&mut self, id: EventId) -> bool {
        let mut found = false;
        self.listeners.values_mut().for_each(|listeners| {
            let len_before = listeners.len();
            listeners.retain(|(l_id, _)| *l_id != id);
            if listeners.len() < len_before {
                found = true;
            }
        });
        self.listeners.retain(|_, listeners| !listeners.is_empty());
        found
    }

    /// Number of listeners registered for an event name
    pub fn listener_count(&self, event_name: &str) -> usize {
        self.listeners.get(event_name).map_or(0, Vec::len)
    }

    pub fn has_listeners(&self, event_name: &str) -> bool {
        self.listener_count(event_name) > 0
    }

    /// Invoke every listener, in order, even if some fail.
    /// Returns the failures; an event nobody listens to yields none.
    pub fn fire(&self, event: &mut LifecycleEvent<'_>) -> Vec<Error> {
        let event_name = event.name();
        let mut failures = Vec::new();
        for (id, listener) in self.listeners_for(event_name) {
            if let Err(e) = listener(&mut *event) {
                log::warn!("Listener {} for event '{}' failed: {}", id, event_name, e);
                failures.push(Self::listener_failed(event_name, *id, e));
            }
        }
        failures
    }

    /// Invoke listeners in order and stop at the first failure, returning it.
    /// On success returns how many listeners ran.
    pub fn must_fire(&self, event: &mut LifecycleEvent<'_>) -> Result<usize> {
        let event_name = event.name();
        let mut invoked = 0;
        for (id, listener) in self.listeners_for(event_name) {
            listener(&mut *event).map_err(|e| Self::listener_failed(event_name, *id, e))?;
            invoked += 1;
        }
        log::debug!("Event '{}' reached {} listener(s)", event_name, invoked);
        Ok(invoked)
    }

    fn listeners_for(&self, event_name: &str) -> impl Iterator<Item = &(EventId, Listener)> {
        self.listeners.get(event_name).into_iter().flatten()
    }

    fn listener_failed(event_name: &str, listener_id: EventId, source: Error) -> Error {
        EventSystemError::ListenerFailed {
            event_name: event_name.to_string(),
            listener_id,
            source: Box::new(source),
        }
        .into()
    }
}

impl Default for EventManager {
    fn default() -> Self {
        Self::new()
    }
}
