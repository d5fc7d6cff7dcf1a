use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::builder::BoolishValueParser;
use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use serde::{Serialize, Deserialize};
use serde_json::{Map, Number, Value};

use crate::kernel::error::Result;
use crate::storage::error::StorageSystemError;
use crate::storage::local::LocalStorageProvider;
use crate::storage::StorageProvider;

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// JSON format (.json)
    Json,
    /// YAML format (.yaml, .yml) - requires "yaml-config" feature
    #[cfg(feature = "yaml-config")]
    Yaml,
    /// TOML format (.toml) - requires "toml-config" feature
    #[cfg(feature = "toml-config")]
    Toml,
}

impl ConfigFormat {
    /// Get the file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            ConfigFormat::Json => "json",
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => "yaml",
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => "toml",
        }
    }

    /// Determine format from file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| match ext.to_lowercase().as_str() {
                "json" => Some(ConfigFormat::Json),
                #[cfg(feature = "yaml-config")]
                "yaml" | "yml" => Some(ConfigFormat::Yaml),
                #[cfg(feature = "toml-config")]
                "toml" => Some(ConfigFormat::Toml),
                _ => None,
            })
    }

    /// Parse a document into a generic value tree
    fn parse(&self, data: &str, path: &Path) -> Result<Value> {
        let deserialize_err = |source: Box<dyn std::error::Error + Send + Sync>| {
            StorageSystemError::DeserializationError {
                path: path.to_path_buf(),
                format: self.extension().to_string(),
                source,
            }
        };
        let value = match self {
            ConfigFormat::Json => serde_json::from_str::<Value>(data)
                .map_err(|e| deserialize_err(Box::new(e)))?,
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => serde_yaml::from_str::<Value>(data)
                .map_err(|e| deserialize_err(Box::new(e)))?,
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => toml::from_str::<Value>(data)
                .map_err(|e| deserialize_err(Box::new(e)))?,
        };
        Ok(value)
    }
}

/// In-memory representation of configuration data.
///
/// Keys may be dotted (`server.listen`) to address nested tables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigData {
    #[serde(flatten)]
    values: Map<String, Value>,
}

impl ConfigData {
    /// Create a new empty configuration
    pub fn new() -> Self {
        Self { values: Map::new() }
    }

    /// Create a configuration from a JSON object
    pub fn from_map(values: Map<String, Value>) -> Self {
        Self { values }
    }

    /// Look up a raw value. An exact top-level key wins over a dotted path.
    pub fn get_value(&self, key: &str) -> Option<&Value> {
        if let Some(value) = self.values.get(key) {
            return Some(value);
        }
        let mut parts = key.split('.');
        let first = parts.next()?;
        let mut current = self.values.get(first)?;
        for part in parts {
            current = current.as_object()?.get(part)?;
        }
        Some(current)
    }

    /// Get a configuration value
    pub fn get<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Option<T> {
        self.get_value(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    /// Get a configuration value with default
    pub fn get_or<T: for<'de> Deserialize<'de>>(&self, key: &str, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    /// Set a configuration value, creating intermediate tables for dotted keys
    pub fn set<T: Serialize>(&mut self, key: &str, value: T) -> Result<()> {
        let value = serde_json::to_value(value).map_err(|e| StorageSystemError::InvalidKey {
            key: key.to_string(),
            reason: format!("value is not serializable: {}", e),
        })?;
        if key.is_empty() || key.split('.').any(str::is_empty) {
            return Err(StorageSystemError::InvalidKey {
                key: key.to_string(),
                reason: "empty key segment".to_string(),
            }
            .into());
        }

        let mut segments: Vec<&str> = key.split('.').collect();
        let last = segments.pop().unwrap_or(key);
        let mut table = &mut self.values;
        for segment in segments {
            let entry = table
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            table = match entry {
                Value::Object(map) => map,
                _ => {
                    return Err(StorageSystemError::InvalidKey {
                        key: key.to_string(),
                        reason: format!("'{}' is not a table", segment),
                    }
                    .into());
                }
            };
        }
        table.insert(last.to_string(), value);
        Ok(())
    }

    /// Remove a top-level configuration value
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    /// Check if key exists
    pub fn contains_key(&self, key: &str) -> bool {
        self.get_value(key).is_some()
    }

    /// Get all top-level keys
    pub fn keys(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }

    /// Merge another layer on top of this one.
    ///
    /// Nested tables are merged key by key; any other value replaces what was
    /// there.
    pub fn merge(&mut self, other: ConfigData) {
        merge_tables(&mut self.values, other.values);
    }

    /// Borrow the underlying table
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.values
    }
}

fn merge_tables(target: &mut Map<String, Value>, source: Map<String, Value>) {
    for (key, value) in source {
        if let Value::Object(incoming) = value {
            if let Some(Value::Object(existing)) = target.get_mut(&key) {
                merge_tables(existing, incoming);
                continue;
            }
            target.insert(key, Value::Object(incoming));
        } else {
            target.insert(key, value);
        }
    }
}

/// Expand `${NAME}` and `${NAME|default}` references from the process
/// environment. Unset variables without a default expand to an empty string.
pub fn expand_env_vars(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            // Unterminated reference, keep it verbatim
            out.push_str(&rest[start..]);
            rest = "";
            break;
        };
        let expr = &after[..end];
        let (name, default) = match expr.split_once('|') {
            Some((name, default)) => (name.trim(), Some(default)),
            None => (expr.trim(), None),
        };
        match std::env::var(name) {
            Ok(value) => out.push_str(&value),
            Err(_) => out.push_str(default.unwrap_or("")),
        }
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    out
}

fn expand_env_in_value(value: &mut Value) {
    match value {
        Value::String(s) if s.contains("${") => *s = expand_env_vars(s),
        Value::Array(items) => items.iter_mut().for_each(expand_env_in_value),
        Value::Object(map) => map.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Declared type of a command-line flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagKind {
    /// No declared type: `true`/`false` become booleans, integers become
    /// numbers, anything else stays a string. A bare flag means `true`.
    Auto,
    Bool,
    Int,
    Float,
    Str,
}

impl FlagKind {
    fn expected(&self) -> &'static str {
        match self {
            FlagKind::Auto => "any value",
            FlagKind::Bool => "a boolean",
            FlagKind::Int => "an integer",
            FlagKind::Float => "a number",
            FlagKind::Str => "a string",
        }
    }
}

/// An allow-listed flag, written as `name` or `name:type`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagSpec {
    pub name: String,
    pub kind: FlagKind,
}

impl FlagSpec {
    pub fn parse(spec: &str) -> Result<Self> {
        let invalid = |reason: &str| StorageSystemError::InvalidFlagSpec {
            spec: spec.to_string(),
            reason: reason.to_string(),
        };
        let (name, kind) = match spec.split_once(':') {
            Some((name, ty)) => {
                let kind = match ty.trim() {
                    "bool" => FlagKind::Bool,
                    "int" => FlagKind::Int,
                    "float" => FlagKind::Float,
                    "str" | "string" => FlagKind::Str,
                    _ => return Err(invalid("unknown flag type").into()),
                };
                (name.trim(), kind)
            }
            None => (spec.trim(), FlagKind::Auto),
        };
        if name.is_empty() || name.starts_with('-') {
            return Err(invalid("flag name must be non-empty and not start with '-'").into());
        }
        if name.contains(|c: char| c == '=' || c.is_whitespace()) {
            return Err(invalid("flag name must not contain '=' or whitespace").into());
        }
        Ok(Self { name: name.to_string(), kind })
    }

    /// The clap argument accepting this flag as `--name`
    fn arg(&self) -> Arg {
        let arg = Arg::new(self.name.clone())
            .long(self.name.clone())
            .action(ArgAction::Set);
        match self.kind {
            FlagKind::Auto => arg
                .num_args(0..=1)
                .require_equals(true)
                .default_missing_value("true")
                .value_parser(value_parser!(String)),
            FlagKind::Bool => arg
                .num_args(0..=1)
                .require_equals(true)
                .default_missing_value("true")
                .value_parser(BoolishValueParser::new()),
            FlagKind::Int => arg
                .allow_negative_numbers(true)
                .value_parser(value_parser!(i64)),
            FlagKind::Float => arg
                .allow_negative_numbers(true)
                .value_parser(value_parser!(f64)),
            FlagKind::Str => arg
                .allow_hyphen_values(true)
                .value_parser(value_parser!(String)),
        }
    }

    /// Read this flag's parsed value, if it was given
    fn read(&self, matches: &ArgMatches) -> Result<Option<Value>> {
        let id = self.name.as_str();
        let value = match self.kind {
            FlagKind::Auto => matches.try_get_one::<String>(id).map(|v| v.map(|raw| auto_value(raw))),
            FlagKind::Bool => matches.try_get_one::<bool>(id).map(|v| v.map(|b| Value::Bool(*b))),
            FlagKind::Int => matches.try_get_one::<i64>(id).map(|v| v.map(|n| Value::Number((*n).into()))),
            FlagKind::Float => match matches.try_get_one::<f64>(id) {
                Ok(Some(f)) => {
                    let number = Number::from_f64(*f).ok_or_else(|| StorageSystemError::InvalidFlagValue {
                        flag: self.name.clone(),
                        value: f.to_string(),
                        expected: "a finite number".to_string(),
                    })?;
                    Ok(Some(Value::Number(number)))
                }
                other => other.map(|_| None),
            },
            FlagKind::Str => matches.try_get_one::<String>(id).map(|v| v.cloned().map(Value::String)),
        };
        value.map_err(|e| {
            StorageSystemError::FlagParse {
                reason: format!("flag '--{}': {}", self.name, e),
            }
            .into()
        })
    }
}

/// Type an untyped flag value the way a config file would
fn auto_value(raw: &str) -> Value {
    if raw.eq_ignore_ascii_case("true") {
        Value::Bool(true)
    } else if raw.eq_ignore_ascii_case("false") {
        Value::Bool(false)
    } else {
        match raw.parse::<i64>() {
            Ok(n) => Value::Number(n.into()),
            Err(_) => Value::String(raw.to_string()),
        }
    }
}

// Collects positionals and everything after `--`, so neither ends the scan
// nor lands in a flag. Flag names never start with '-', so the id is free.
const POSITIONAL_ID: &str = "-";

fn flag_command(specs: &[FlagSpec]) -> Command {
    Command::new("flags")
        .no_binary_name(true)
        .disable_help_flag(true)
        .disable_version_flag(true)
        .args_override_self(true)
        .arg(
            Arg::new(POSITIONAL_ID)
                .num_args(1..)
                .action(ArgAction::Append)
                .value_parser(value_parser!(String)),
        )
        .args(specs.iter().map(FlagSpec::arg))
}

/// Map a clap value error back to the allow-listed flag it concerns
fn flag_value_error(err: &clap::Error, specs: &[FlagSpec]) -> StorageSystemError {
    let context = |kind| match err.get(kind) {
        Some(ContextValue::String(s)) => s.as_str(),
        _ => "",
    };
    // Rendered as `--name <name>` or `--name[=<name>]`
    let rendered = context(ContextKind::InvalidArg).trim_start_matches('-');
    let name = rendered
        .split(|c: char| c == '=' || c == '[' || c.is_whitespace())
        .next()
        .unwrap_or_default();
    let value = context(ContextKind::InvalidValue);

    match specs.iter().find(|s| s.name == name) {
        Some(spec) if value.is_empty() => StorageSystemError::MissingFlagValue { flag: spec.name.clone() },
        Some(spec) => StorageSystemError::InvalidFlagValue {
            flag: spec.name.clone(),
            value: value.to_string(),
            expected: spec.kind.expected().to_string(),
        },
        None => StorageSystemError::FlagParse {
            reason: err.to_string().trim().to_string(),
        },
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

/// Layered configuration store.
///
/// Files are applied in the order given, then flags; each layer only
/// overrides the keys it sets.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    data: ConfigData,
    loaded_files: Vec<PathBuf>,
    provider: Arc<dyn StorageProvider>,
}

impl ConfigStore {
    /// Create an empty store reading from the working directory
    pub fn new() -> Self {
        Self::with_provider(Arc::new(LocalStorageProvider::cwd()))
    }

    /// Create an empty store reading through the given provider
    pub fn with_provider(provider: Arc<dyn StorageProvider>) -> Self {
        Self {
            data: ConfigData::new(),
            loaded_files: Vec::new(),
            provider,
        }
    }

    /// Load every path that exists, in order. Absent paths are skipped;
    /// present but malformed files fail the whole call.
    /// Returns the number of files loaded.
    pub fn load_exists<P: AsRef<Path>>(&mut self, paths: &[P]) -> Result<usize> {
        let mut loaded = 0;
        for path in paths {
            let path = path.as_ref();
            if !self.provider.is_file(path) {
                log::debug!("Config file {} does not exist, skipping", path.display());
                continue;
            }
            self.load_file(path)?;
            loaded += 1;
        }
        Ok(loaded)
    }

    /// Load one file; the file must exist
    pub fn load_file(&mut self, path: &Path) -> Result<()> {
        let format = ConfigFormat::from_path(path)
            .ok_or_else(|| StorageSystemError::UnsupportedConfigFormat(path.to_path_buf()))?;
        let content = self.provider.read_to_string(path)?;
        let mut value = format.parse(&content, path)?;
        expand_env_in_value(&mut value);
        let layer = match value {
            Value::Object(map) => ConfigData::from_map(map),
            // An empty YAML document parses to null
            Value::Null => ConfigData::new(),
            _ => return Err(StorageSystemError::NotATable { path: path.to_path_buf() }.into()),
        };
        log::debug!("Loaded config file {} ({} keys)", path.display(), layer.keys().len());
        self.data.merge(layer);
        self.loaded_files.push(path.to_path_buf());
        Ok(())
    }

    /// Merge allow-listed flags from `args` (program name excluded).
    ///
    /// Accepts `--name=value` and `--name value` for typed non-bool flags,
    /// and `--name` or `--name=value` for bool or untyped flags. Positionals
    /// are skipped and nothing after `--` is read. The scan ends at the
    /// first option outside the allow-list. When a flag repeats, the last
    /// occurrence wins. Returns the number of flags applied.
    pub fn load_flags<S: AsRef<str>>(&mut self, specs: &[S], args: &[String]) -> Result<usize> {
        let mut allowed: Vec<FlagSpec> = Vec::with_capacity(specs.len());
        for spec in specs {
            let spec = FlagSpec::parse(spec.as_ref())?;
            allowed.retain(|s| s.name != spec.name);
            allowed.push(spec);
        }

        let command = flag_command(&allowed);
        let matches = match command.clone().try_get_matches_from(args.iter()) {
            Ok(matches) => matches,
            Err(err) if matches!(err.kind(), ErrorKind::InvalidValue | ErrorKind::ValueValidation) => {
                return Err(flag_value_error(&err, &allowed).into());
            }
            Err(err) => {
                log::debug!("Flag scan stopped early: {:?}", err.kind());
                command
                    .ignore_errors(true)
                    .try_get_matches_from(args.iter())
                    .map_err(|e| StorageSystemError::FlagParse {
                        reason: e.to_string().trim().to_string(),
                    })?
            }
        };

        let mut applied = 0;
        for spec in &allowed {
            let Some(value) = spec.read(&matches)? else {
                continue;
            };
            log::debug!("Flag --{} overrides config value with {}", spec.name, value);
            self.data.set(&spec.name, value)?;
            applied += 1;
        }
        Ok(applied)
    }

    /// Get a typed value
    pub fn get<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Option<T> {
        self.data.get(key)
    }

    /// Get a raw value
    pub fn get_value(&self, key: &str) -> Option<&Value> {
        self.data.get_value(key)
    }

    /// Get a value rendered as a string; scalars are stringified
    pub fn get_string(&self, key: &str) -> Option<String> {
        match self.data.get_value(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Get a string value or the given default
    pub fn string_or(&self, key: &str, default: &str) -> String {
        self.get_string(key).unwrap_or_else(|| default.to_string())
    }

    /// Get a boolean; string values such as `"true"` or `"0"` are accepted
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.data.get_value(key)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => parse_bool(s),
            Value::Number(n) => n.as_i64().map(|n| n != 0),
            _ => None,
        }
    }

    /// Get a boolean or the given default
    pub fn bool_or(&self, key: &str, default: bool) -> bool {
        self.get_bool(key).unwrap_or(default)
    }

    /// Set a value directly, as the topmost layer
    pub fn set<T: Serialize>(&mut self, key: &str, value: T) -> Result<()> {
        self.data.set(key, value)
    }

    /// Check if key exists
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Files loaded so far, in load order
    pub fn loaded_files(&self) -> &[PathBuf] {
        &self.loaded_files
    }

    /// Borrow the merged data
    pub fn data(&self) -> &ConfigData {
        &self.data
    }

    /// Snapshot the merged data as a JSON value
    pub fn to_json(&self) -> Value {
        Value::Object(self.data.as_map().clone())
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}
