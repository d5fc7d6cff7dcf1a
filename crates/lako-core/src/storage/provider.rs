use std::fmt::Debug;
use std::path::Path;
use crate::kernel::error::Result;

/// Read-side access to configuration and environment sources.
///
/// Boot loaders only ever need to ask whether a source exists and read it
/// whole, so the provider surface stays that small.
pub trait StorageProvider: Send + Sync + Debug {
    /// Get the name of this provider
    fn name(&self) -> &str;

    /// Check if a path exists
    fn exists(&self, path: &Path) -> bool;

    /// Check if a path is a file
    fn is_file(&self, path: &Path) -> bool;

    /// Read a file to a string
    fn read_to_string(&self, path: &Path) -> Result<String>;
}
