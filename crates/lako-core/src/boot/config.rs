use std::path::PathBuf;

use async_trait::async_trait;

use crate::boot::BootLoader;
use crate::event::LifecycleEvent;
use crate::kernel::bootstrap::Application;
use crate::kernel::error::Result;

/// Flags merged from the command line when none are given
pub const DEFAULT_FLAGS: &[&str] = &["debug"];

/// Loads config files, then command-line flags, into the application's
/// config store.
///
/// Fires `config.before` with the file list before reading anything, so
/// listeners can add, drop or reorder files, and `config.after` once files
/// and flags have been merged. A failed load returns the error without
/// firing `config.after`.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    files: Vec<PathBuf>,
    flags: Vec<String>,
}

impl ConfigLoader {
    pub fn new<I, P>(files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            files: files.into_iter().map(Into::into).collect(),
            flags: DEFAULT_FLAGS.iter().map(|f| f.to_string()).collect(),
        }
    }

    /// Replace the flag allow-list (`name` or `name:type` entries)
    pub fn with_flags<I, S>(mut self, flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.flags = flags.into_iter().map(Into::into).collect();
        self
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn flags(&self) -> &[String] {
        &self.flags
    }
}

#[async_trait]
impl BootLoader for ConfigLoader {
    fn name(&self) -> &str {
        "config"
    }

    async fn apply(&self, app: &mut Application) -> Result<()> {
        let (events, config, args) = app.config_parts();

        let mut files = self.files.clone();
        events.must_fire(&mut LifecycleEvent::BeforeConfig {
            files: &mut files,
            config: &mut *config,
        })?;

        let loaded = config.load_exists(&files)?;
        let flags = config.load_flags(&self.flags, args)?;
        log::info!(
            "Config loaded: {} of {} file(s), {} flag(s)",
            loaded,
            files.len(),
            flags
        );

        events.must_fire(&mut LifecycleEvent::AfterConfig { config })?;
        Ok(())
    }
}
