//! # Lako Core
//!
//! Boot orchestration for Lako applications: a layered config store, an
//! ordered chain of boot loaders, a lifecycle event bus and a request
//! dispatch shim that sits in front of an external router and server.
//!
//! ```no_run
//! use lako_core::{Application, RouteTable};
//!
//! # async fn start() -> lako_core::Result<()> {
//! let mut app = Application::with_config_files(["config/app.toml"])
//!     .with_router(RouteTable::new().get("/", |_req, res| {
//!         res.body_mut().extend_from_slice(b"hello");
//!     }));
//! app.events_mut().on_booted(|name, _config| {
//!     log::info!("{} is up", name);
//!     Ok(())
//! });
//! app.run(None).await
//! # }
//! ```
pub mod boot;
pub mod event;
pub mod http;
pub mod kernel;
pub mod storage;

pub use boot::{BootChain, BootLoader, ConfigLoader, EnvLoader, FnLoader};
pub use event::{EventKind, EventManager, LifecycleEvent};
pub use http::{Dispatcher, HttpServer, Request, RequestHandler, Response, RouteTable, Router, Server};
pub use kernel::{Application, Error, LifecycleState, Result};
pub use storage::{ConfigStore, StorageProvider};

// Test module declaration
#[cfg(test)]
mod tests;
