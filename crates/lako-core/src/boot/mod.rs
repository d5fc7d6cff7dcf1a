//! # Lako Core Boot Loaders
//!
//! A boot loader is one fallible initialization step applied to the
//! [`Application`] while it boots. Loaders are composed into a [`BootChain`]
//! and applied strictly in the order they were added; the first failure
//! aborts the chain and whatever earlier loaders changed stays changed.
//!
//! Two canonical loaders ship with the crate:
//!
//! - [`EnvLoader`] reads dotenv-style files into the process environment.
//! - [`ConfigLoader`] loads config files and command-line flags into the
//!   application's config store, firing `config.before` / `config.after`.
//!
//! Environment loading normally comes first so that config files can refer
//! to variables with `${NAME}`.
pub mod config;
pub mod env;
pub mod error;

use std::fmt;

use async_trait::async_trait;

use crate::kernel::bootstrap::Application;
use crate::kernel::error::Result;

pub use config::{ConfigLoader, DEFAULT_FLAGS};
pub use env::{parse_env_file, EnvLoader, DEFAULT_ENV_FILE};
pub use error::BootSystemError;

/// Core trait that every boot step implements
#[async_trait]
pub trait BootLoader: Send + Sync {
    /// Short name used in logs and errors
    fn name(&self) -> &str;

    /// Apply this step to the application being booted
    async fn apply(&self, app: &mut Application) -> Result<()>;
}

/// Boot loader backed by a named closure
pub struct FnLoader<F> {
    name: String,
    f: F,
}

impl<F> FnLoader<F>
where
    F: Fn(&mut Application) -> Result<()> + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self { name: name.into(), f }
    }
}

#[async_trait]
impl<F> BootLoader for FnLoader<F>
where
    F: Fn(&mut Application) -> Result<()> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn apply(&self, app: &mut Application) -> Result<()> {
        (self.f)(app)
    }
}

/// Ordered list of boot loaders
#[derive(Default)]
pub struct BootChain {
    loaders: Vec<Box<dyn BootLoader>>,
}

impl fmt::Debug for BootChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BootChain")
            .field("loaders", &self.names())
            .finish()
    }
}

impl BootChain {
    pub fn new() -> Self {
        Self { loaders: Vec::new() }
    }

    /// Append a loader to the end of the chain
    pub fn push<L: BootLoader + 'static>(&mut self, loader: L) {
        self.loaders.push(Box::new(loader));
    }

    /// Builder form of [`push`](Self::push)
    pub fn with<L: BootLoader + 'static>(mut self, loader: L) -> Self {
        self.push(loader);
        self
    }

    pub fn len(&self) -> usize {
        self.loaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaders.is_empty()
    }

    /// Loader names in execution order
    pub fn names(&self) -> Vec<&str> {
        self.loaders.iter().map(|l| l.name()).collect()
    }

    /// Apply every loader in order, stopping at the first failure.
    /// Returns the number of loaders applied.
    pub async fn run(&self, app: &mut Application) -> Result<usize> {
        let total = self.loaders.len();
        for (position, loader) in self.loaders.iter().enumerate() {
            log::info!("Applying boot loader {}/{}: {}", position + 1, total, loader.name());
            if let Err(e) = loader.apply(app).await {
                log::error!("Boot loader '{}' failed: {}", loader.name(), e);
                return Err(BootSystemError::LoaderFailed {
                    loader: loader.name().to_string(),
                    position,
                    source: Box::new(e),
                }
                .into());
            }
        }
        Ok(total)
    }
}

// Test module declaration
#[cfg(test)]
mod tests;
