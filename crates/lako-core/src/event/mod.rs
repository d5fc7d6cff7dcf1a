//! # Lako Core Event System
//!
//! A synchronous publish/subscribe bus for lifecycle events. The boot
//! sequence fires `app.boot` and `app.booted`; the config loader fires
//! `config.before` and `config.after`. Applications can add their own named
//! events through [`EventKind::Custom`].
pub mod error;
pub mod manager;
pub mod types;

/// Type for listener identifiers
pub type EventId = u64;

/// Re-export important types
pub use error::EventSystemError;
pub use manager::{EventManager, Listener};
pub use types::{
    EventKind, LifecycleEvent, EVT_AFTER_CONFIG, EVT_BEFORE_CONFIG, EVT_BOOT, EVT_BOOTED,
};

// Test module declaration
#[cfg(test)]
mod tests;
