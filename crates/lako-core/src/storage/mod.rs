//! # Lako Core Storage
//!
//! Configuration sources and the layered [`ConfigStore`] populated during
//! boot. File access goes through a [`StorageProvider`] so loaders can be
//! pointed at any directory.
pub mod provider;
pub mod local;
pub mod config;
pub mod error;

/// Re-export key types
pub use provider::StorageProvider;
pub use local::LocalStorageProvider;
pub use config::{ConfigData, ConfigFormat, ConfigStore, FlagKind, FlagSpec, expand_env_vars};
pub use error::StorageSystemError;
