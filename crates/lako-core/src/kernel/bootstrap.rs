use std::any::Any;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::boot::{BootChain, BootLoader, ConfigLoader, EnvLoader};
use crate::event::{EventKind, EventManager, EventSystemError, LifecycleEvent};
use crate::http::{Dispatcher, HttpServer, Request, RequestHandler, Response, Router, Server};
use crate::kernel::constants;
use crate::kernel::data::AppData;
use crate::kernel::error::{Error, KernelLifecyclePhase, Result};
use crate::storage::ConfigStore;

/// Where an application is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    Booting,
    Booted,
}

/// Main application struct: identity, config, events and the boot chain.
///
/// An application boots at most once. A failed boot leaves it
/// `Uninitialized` with its loader chain intact, so `boot()` can be called
/// again. `run()` consumes the application and shares it with the server.
pub struct Application {
    name: String,
    state: LifecycleState,
    chain: BootChain,
    data: AppData,
    events: EventManager,
    config: ConfigStore,
    dispatcher: Dispatcher,
    server: Arc<dyn Server>,
    args: Vec<String>,
}

impl fmt::Debug for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Application")
            .field("name", &self.name)
            .field("state", &self.state)
            .field("chain", &self.chain)
            .field("data", &self.data)
            .field("events", &self.events)
            .field("config", &self.config)
            .field("dispatcher", &self.dispatcher)
            .field("args", &self.args)
            .finish_non_exhaustive()
    }
}

impl Default for Application {
    fn default() -> Self {
        Self::new()
    }
}

impl Application {
    /// Create an application with an empty loader chain and no flag
    /// arguments; pass them with [`Application::with_args`].
    pub fn new() -> Self {
        Self {
            name: String::new(),
            state: LifecycleState::Uninitialized,
            chain: BootChain::new(),
            data: AppData::new(),
            events: EventManager::new(),
            config: ConfigStore::new(),
            dispatcher: Dispatcher::default(),
            server: Arc::new(HttpServer::new()),
            args: Vec::new(),
        }
    }

    /// Create an application with the canonical chain: `.env` from the
    /// working directory, then the given config files and the `debug` flag.
    pub fn with_config_files<I, P>(files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self::new()
            .with_loader(EnvLoader::new("."))
            .with_loader(ConfigLoader::new(files))
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Append a loader to the boot chain
    pub fn with_loader<L: BootLoader + 'static>(mut self, loader: L) -> Self {
        self.chain.push(loader);
        self
    }

    /// Replace the whole boot chain
    pub fn with_chain(mut self, chain: BootChain) -> Self {
        self.chain = chain;
        self
    }

    /// Arguments scanned for flags, program name excluded
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_config_store(mut self, config: ConfigStore) -> Self {
        self.config = config;
        self
    }

    pub fn with_router<R: Router + 'static>(mut self, router: R) -> Self {
        self.dispatcher.set_router(Arc::new(router));
        self
    }

    pub fn with_server<S: Server + 'static>(mut self, server: S) -> Self {
        self.server = Arc::new(server);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn is_booted(&self) -> bool {
        self.state == LifecycleState::Booted
    }

    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut ConfigStore {
        &mut self.config
    }

    pub fn events(&self) -> &EventManager {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut EventManager {
        &mut self.events
    }

    pub fn loaders(&self) -> &BootChain {
        &self.chain
    }

    /// Append a loader to the boot chain in place
    pub fn add_loader<L: BootLoader + 'static>(&mut self, loader: L) {
        self.chain.push(loader);
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn set_router<R: Router + 'static>(&mut self, router: R) {
        self.dispatcher.set_router(Arc::new(router));
    }

    pub fn set_before_route<F>(&mut self, hook: F)
    where
        F: Fn(&Request, &mut Response) + Send + Sync + 'static,
    {
        self.dispatcher.set_before_route(hook);
    }

    pub fn set_after_route<F>(&mut self, hook: F)
    where
        F: Fn(&Request, &mut Response) + Send + Sync + 'static,
    {
        self.dispatcher.set_after_route(hook);
    }

    pub fn set_data<T: Any + Send + Sync>(&mut self, key: &str, value: T) {
        self.data.set(key, value);
    }

    pub fn data<T: Any + Send + Sync>(&self, key: &str) -> Option<&T> {
        self.data.get(key)
    }

    pub fn data_mut<T: Any + Send + Sync>(&mut self, key: &str) -> Option<&mut T> {
        self.data.get_mut(key)
    }

    pub fn remove_data<T: Any + Send + Sync>(&mut self, key: &str) -> Option<T> {
        self.data.remove(key)
    }

    /// Broadcast an application-defined event; stops at the first failure.
    /// Lifecycle event names are reserved.
    pub fn fire_custom(&self, name: &'static str, payload: &mut Map<String, Value>) -> Result<usize> {
        let reason = if name.is_empty() {
            Some("name is empty")
        } else if EventKind::from_name(name) != EventKind::Custom(name) {
            Some("name is reserved for a lifecycle event")
        } else {
            None
        };
        if let Some(reason) = reason {
            return Err(EventSystemError::InvalidEventName {
                event_name: name.to_string(),
                reason: reason.to_string(),
            }
            .into());
        }
        self.events.must_fire(&mut LifecycleEvent::Custom { name, payload })
    }

    /// Split borrow used by loaders that fire events while editing config
    pub(crate) fn config_parts(&mut self) -> (&EventManager, &mut ConfigStore, &[String]) {
        (&self.events, &mut self.config, &self.args)
    }

    /// Boot the application. Does nothing once booted.
    pub async fn boot(&mut self) -> Result<()> {
        if self.is_booted() {
            log::debug!("Application already booted, skipping");
            return Ok(());
        }

        log::info!("Booting {} v{}", self.display_name(), constants::APP_VERSION);
        self.state = LifecycleState::Booting;

        // Loaders get `&mut self`, so the chain is moved out while it runs
        let chain = std::mem::take(&mut self.chain);
        let result = self.boot_sequence(&chain).await;
        self.chain = chain;

        match result {
            Ok(()) => {
                log::info!("Application {} booted", self.display_name());
                Ok(())
            }
            Err(e) => {
                self.state = LifecycleState::Uninitialized;
                log::error!("Boot failed: {}", e);
                Err(Error::lifecycle(KernelLifecyclePhase::Boot, "boot sequence failed", e))
            }
        }
    }

    async fn boot_sequence(&mut self, chain: &BootChain) -> Result<()> {
        self.events.must_fire(&mut LifecycleEvent::Boot {
            name: &mut self.name,
            config: &mut self.config,
            data: &mut self.data,
        })?;

        chain.run(self).await?;

        if self.name.is_empty() {
            self.name = self.config.string_or(constants::CONFIG_KEY_NAME, "");
        }

        self.state = LifecycleState::Booted;
        self.events.must_fire(&mut LifecycleEvent::Booted {
            name: &self.name,
            config: &self.config,
        })?;
        Ok(())
    }

    /// Resolve the listen address: explicit argument, then the `listen`
    /// config key, then the server default.
    pub fn listen_addr(&self, addr: Option<&str>) -> String {
        if let Some(addr) = addr.filter(|a| !a.is_empty()) {
            return addr.to_string();
        }
        match self.config.get_string(constants::CONFIG_KEY_LISTEN) {
            Some(addr) if !addr.is_empty() => addr,
            _ => self.server.default_addr().to_string(),
        }
    }

    /// Boot if needed, then serve until the server stops
    pub async fn run(mut self, addr: Option<&str>) -> Result<()> {
        self.boot().await?;

        let addr = self.listen_addr(addr);
        log::info!(
            "======================== Begin Running {} (PID: {}) on {} ========================",
            self.display_name(),
            std::process::id(),
            addr
        );

        let server = Arc::clone(&self.server);
        let app = Arc::new(self);
        server.listen(&addr, app).await.map_err(|e| {
            Error::lifecycle(KernelLifecyclePhase::Run, format!("server on {} failed", addr), e)
        })
    }

    /// Run one request through the hooks and router
    pub fn serve_http(&self, request: &Request) -> Response {
        self.dispatcher.serve_http(request)
    }

    fn display_name(&self) -> &str {
        if self.name.is_empty() {
            constants::APP_NAME
        } else {
            &self.name
        }
    }
}

impl RequestHandler for Application {
    fn handle(&self, request: &Request) -> Response {
        self.serve_http(request)
    }
}
