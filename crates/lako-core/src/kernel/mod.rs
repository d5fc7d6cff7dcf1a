//! # Lako Core Kernel
//!
//! The kernel owns the [`Application`](bootstrap::Application): its identity,
//! config store, event manager, extension data and lifecycle state.
//!
//! ## Lifecycle
//!
//! `Uninitialized -> Booting -> Booted`. Booting fires `app.boot`, runs the
//! loader chain, fills in the name from config and fires `app.booted`.
//! Failure anywhere drops the application back to `Uninitialized`.
//! `run()` boots when needed and then hands the application to the server.
pub mod bootstrap;
pub mod constants;
pub mod data;
pub mod error;

pub use bootstrap::{Application, LifecycleState};
pub use data::AppData;
pub use error::{Error, KernelLifecyclePhase, Result};

// Test module declaration
#[cfg(test)]
mod tests;
