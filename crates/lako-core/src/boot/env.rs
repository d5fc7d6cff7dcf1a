use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use crate::boot::error::BootSystemError;
use crate::boot::BootLoader;
use crate::kernel::bootstrap::Application;
use crate::kernel::error::Result;
use crate::storage::{LocalStorageProvider, StorageProvider};

/// File name looked up when no env files are given
pub const DEFAULT_ENV_FILE: &str = ".env";

/// Loads dotenv-style files from a directory into the process environment.
///
/// Files that do not exist are skipped. Files that exist but contain a
/// malformed line fail the loader. Later files override earlier ones, and
/// loaded values override variables already set in the process.
#[derive(Debug, Clone)]
pub struct EnvLoader {
    dir: PathBuf,
    files: Vec<String>,
    provider: Arc<dyn StorageProvider>,
}

impl EnvLoader {
    /// Load `.env` from `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_files(dir, [DEFAULT_ENV_FILE])
    }

    /// Load the named files from `dir`, in order
    pub fn with_files<I, S>(dir: impl Into<PathBuf>, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            dir: dir.into(),
            files: files.into_iter().map(Into::into).collect(),
            provider: Arc::new(LocalStorageProvider::cwd()),
        }
    }

    /// Read through a different storage provider
    pub fn with_provider(mut self, provider: Arc<dyn StorageProvider>) -> Self {
        self.provider = provider;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn files(&self) -> &[String] {
        &self.files
    }

    /// Read every existing file and export its variables.
    /// Returns the variables that were set, in application order.
    pub fn load(&self) -> Result<Vec<(String, String)>> {
        let mut applied = Vec::new();
        for file in &self.files {
            let path = self.dir.join(file);
            if !self.provider.is_file(&path) {
                log::debug!("Env file {} does not exist, skipping", path.display());
                continue;
            }
            let content = self.provider.read_to_string(&path)?;
            let pairs = parse_env_file(&content, &path)?;
            log::info!("Loaded {} variable(s) from {}", pairs.len(), path.display());
            for (key, value) in pairs {
                // SAFETY: boot runs once on the caller's task before any
                // request handling starts, and nothing else in this crate
                // reads the environment concurrently with it.
                unsafe { std::env::set_var(&key, &value) };
                applied.push((key, value));
            }
        }
        Ok(applied)
    }
}

#[async_trait]
impl BootLoader for EnvLoader {
    fn name(&self) -> &str {
        "env"
    }

    async fn apply(&self, _app: &mut Application) -> Result<()> {
        self.load().map(|_| ())
    }
}

/// Parse dotenv content into ordered `(key, value)` pairs.
///
/// Supported syntax: blank lines, `#` comments, an optional `export `
/// prefix, single-quoted literal values, double-quoted values with
/// `\n \r \t \" \\` escapes, and unquoted values cut at ` #`.
pub fn parse_env_file(content: &str, path: &Path) -> Result<Vec<(String, String)>> {
    let malformed = |line: usize, reason: &str| BootSystemError::EnvFileMalformed {
        path: path.to_path_buf(),
        line,
        reason: reason.to_string(),
    };

    let mut pairs = Vec::new();
    for (index, raw_line) in content.lines().enumerate() {
        let line_no = index + 1;
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").map(str::trim_start).unwrap_or(line);

        let (key, value) = line
            .split_once('=')
            .ok_or_else(|| malformed(line_no, "expected KEY=VALUE"))?;
        let key = key.trim();
        if !is_valid_key(key) {
            return Err(malformed(line_no, "invalid variable name").into());
        }

        let value = parse_value(value.trim()).map_err(|reason| malformed(line_no, reason))?;
        pairs.push((key.to_string(), value));
    }
    Ok(pairs)
}

fn is_valid_key(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

fn parse_value(value: &str) -> std::result::Result<String, &'static str> {
    if let Some(rest) = value.strip_prefix('\'') {
        let end = rest.find('\'').ok_or("unterminated single quote")?;
        check_trailing(&rest[end + 1..])?;
        return Ok(rest[..end].to_string());
    }

    if let Some(rest) = value.strip_prefix('"') {
        let mut out = String::new();
        let mut chars = rest.char_indices();
        while let Some((i, c)) = chars.next() {
            match c {
                '"' => {
                    check_trailing(&rest[i + 1..])?;
                    return Ok(out);
                }
                '\\' => match chars.next() {
                    Some((_, 'n')) => out.push('\n'),
                    Some((_, 'r')) => out.push('\r'),
                    Some((_, 't')) => out.push('\t'),
                    Some((_, '"')) => out.push('"'),
                    Some((_, '\\')) => out.push('\\'),
                    Some((_, other)) => {
                        out.push('\\');
                        out.push(other);
                    }
                    None => return Err("unterminated double quote"),
                },
                _ => out.push(c),
            }
        }
        return Err("unterminated double quote");
    }

    // Unquoted: inline comments start at " #"
    let value = match value.find(" #") {
        Some(pos) => &value[..pos],
        None => value,
    };
    Ok(value.trim_end().to_string())
}

fn check_trailing(rest: &str) -> std::result::Result<(), &'static str> {
    let rest = rest.trim();
    if rest.is_empty() || rest.starts_with('#') {
        Ok(())
    } else {
        Err("unexpected characters after closing quote")
    }
}
