//! # Lako Core Boot Errors
//!
//! Defines error types raised while running the boot loader chain.
//!
//! [`BootSystemError::LoaderFailed`] wraps whatever a loader returned with
//! the loader's name and position in the chain, so a failed boot names the
//! step that aborted it.
use std::path::PathBuf;
use crate::kernel::error::Error;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BootSystemError {
    #[error("Boot loader '{loader}' (position {position}) failed: {source}")]
    LoaderFailed {
        loader: String,
        position: usize,
        #[source]
        source: Box<Error>,
    },

    #[error("Malformed env file '{path}' at line {line}: {reason}")]
    EnvFileMalformed {
        path: PathBuf,
        line: usize,
        reason: String,
    },
}
