//! # Lako Core Kernel Errors
//!
//! Defines the crate-wide [`Error`] type.
//!
//! Each subsystem owns a typed error enum (events, boot loaders, storage,
//! HTTP serving); the kernel error wraps them all through `#[from]` so that
//! `?` works across module boundaries, and adds
//! [`Error::KernelLifecycleError`] for failures of the application state
//! machine itself.
use std::path::PathBuf;
use std::result::Result as StdResult;

use crate::boot::error::BootSystemError;
use crate::event::error::EventSystemError;
use crate::http::error::HttpError;
use crate::storage::error::StorageSystemError;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum Error {
    /// Lifecycle event listener or dispatch failure
    #[error("Event system error: {0}")]
    EventSystem(#[from] EventSystemError),

    /// Boot loader chain failure
    #[error("Boot system error: {0}")]
    BootSystem(#[from] BootSystemError),

    /// Configuration source failure
    #[error("Storage system error: {0}")]
    StorageSystem(#[from] StorageSystemError),

    /// HTTP serving collaborator failure
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    /// Error occurring during a specific kernel lifecycle phase.
    #[error("Kernel lifecycle error during {phase}: {message}")]
    KernelLifecycleError {
        phase: KernelLifecyclePhase,
        message: String,
        #[source]
        source: Option<Box<Error>>,
    },

    /// Generic error with message
    #[error("Error: {0}")]
    Other(String),
}

/// Represents a specific phase in the kernel's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ThisError)]
pub enum KernelLifecyclePhase {
    #[error("Boot")]
    Boot,
    #[error("Run")]
    Run,
}

/// Shorthand for Result with our Error type
pub type Result<T> = StdResult<T, Error>;

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Other(msg.to_string())
    }
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Other(msg)
    }
}

impl Error {
    /// Build an I/O error carrying the failed operation and path
    pub fn io(source: std::io::Error, operation: impl Into<String>, path: PathBuf) -> Self {
        Error::StorageSystem(StorageSystemError::io(source, operation, path))
    }

    /// Wrap an error as a lifecycle failure of the given phase
    pub fn lifecycle(phase: KernelLifecyclePhase, message: impl Into<String>, source: Error) -> Self {
        Error::KernelLifecycleError {
            phase,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}
