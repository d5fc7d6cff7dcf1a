//! # Lako Core Storage Errors
//!
//! Defines error types specific to the Lako storage layer.
//!
//! This module includes [`StorageSystemError`], the enum covering failures
//! while reading configuration sources: file I/O, unsupported or malformed
//! configuration formats, and command-line flag values that do not match the
//! declared flag type.
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageSystemError {
    #[error("I/O error during operation '{operation}' on path '{path}': {source}")]
    Io {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Deserialization of '{path}' from '{format}' failed: {source}")]
    DeserializationError {
        path: PathBuf,
        format: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    #[error("Unsupported configuration format for path: {0}")]
    UnsupportedConfigFormat(PathBuf),

    #[error("Configuration file '{path}' must contain a table at the top level")]
    NotATable { path: PathBuf },

    #[error("Invalid flag specification '{spec}': {reason}")]
    InvalidFlagSpec { spec: String, reason: String },

    #[error("Invalid value '{value}' for flag '--{flag}': expected {expected}")]
    InvalidFlagValue {
        flag: String,
        value: String,
        expected: String,
    },

    #[error("Flag '--{flag}' requires a value")]
    MissingFlagValue { flag: String },

    #[error("Failed to parse command-line flags: {reason}")]
    FlagParse { reason: String },

    #[error("Cannot set configuration key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },
}

// Helper for creating Io errors, ensuring path is always included.
impl StorageSystemError {
    pub fn io(source: std::io::Error, operation: impl Into<String>, path: PathBuf) -> Self {
        StorageSystemError::Io {
            source,
            operation: operation.into(),
            path,
        }
    }
}
