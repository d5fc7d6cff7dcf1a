#![cfg(test)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::boot::{BootChain, ConfigLoader, EnvLoader};
use crate::kernel::bootstrap::Application;

/// Temporary project directory with an env file and a config file
pub struct Project {
    pub dir: TempDir,
}

impl Project {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("Failed to create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create fixture dir");
        }
        fs::write(&path, contents).expect("Failed to write fixture");
        path
    }

    pub fn env_loader(&self) -> EnvLoader {
        EnvLoader::new(self.path())
    }

    pub fn config_loader(&self, files: &[&str]) -> ConfigLoader {
        ConfigLoader::new(files.iter().map(|f| self.path().join(f)))
    }

    /// Application with the canonical `[env, config]` chain rooted here
    pub fn app(&self, files: &[&str], args: &[&str]) -> Application {
        let chain = BootChain::new()
            .with(self.env_loader())
            .with(self.config_loader(files));
        Application::new()
            .with_args(args.iter().copied())
            .with_chain(chain)
    }
}
