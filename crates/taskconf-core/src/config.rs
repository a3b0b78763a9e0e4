//! Raw configuration
//!
//! [`RawConfig`] holds key/value pairs exactly as they were loaded. It is
//! turned into a [`ResolvedConfig`] by [`RawConfig::resolve`], which never
//! modifies the raw values.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::interpolation;
use crate::lookup::EnvLookup;
use crate::resolved::ResolvedConfig;
use crate::source::{self, Format, RawMap};

/// Specifies a file to load, either required or optional
///
/// Use this with [`RawConfig::load_merged_with_specs`] to layer files where
/// some may not exist on every machine.
///
/// # Examples
///
/// ```no_run
/// use taskconf_core::{FileSpec, RawConfig};
///
/// let raw = RawConfig::load_merged_with_specs(&[
///     FileSpec::required("application.properties"),
///     FileSpec::optional("local.properties"), // Won't error if missing
/// ])?;
/// # Ok::<(), taskconf_core::Error>(())
/// ```
#[derive(Debug, Clone)]
pub enum FileSpec {
    /// A required file - error if not found
    Required(PathBuf),
    /// An optional file - silently skip if not found
    Optional(PathBuf),
}

impl FileSpec {
    /// Create a required file spec
    pub fn required(path: impl Into<PathBuf>) -> Self {
        FileSpec::Required(path.into())
    }

    /// Create an optional file spec
    pub fn optional(path: impl Into<PathBuf>) -> Self {
        FileSpec::Optional(path.into())
    }

    /// Get the path for this file spec
    pub fn path(&self) -> &Path {
        match self {
            FileSpec::Required(p) => p,
            FileSpec::Optional(p) => p,
        }
    }

    /// Check if this file spec is optional
    pub fn is_optional(&self) -> bool {
        matches!(self, FileSpec::Optional(_))
    }
}

impl<P: Into<PathBuf>> From<P> for FileSpec {
    fn from(path: P) -> Self {
        FileSpec::Required(path.into())
    }
}

/// Unresolved configuration, as loaded from its sources
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawConfig {
    values: RawMap,
    /// File each key's current value came from
    sources: HashMap<String, String>,
}

impl RawConfig {
    /// Create an empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a configuration from key/value pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        pairs.into_iter().collect()
    }

    /// Load configuration from properties text
    pub fn from_properties(text: &str) -> Result<Self> {
        source::parse_properties(text).map(Self::from_map)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        source::parse_yaml(yaml).map(Self::from_map)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        source::parse_json(json).map(Self::from_map)
    }

    fn from_map(values: RawMap) -> Self {
        Self {
            values,
            sources: HashMap::new(),
        }
    }

    /// Load a configuration file, picking the format from its extension
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(&display, &e))?;

        let format = Format::from_path(path);
        let values = format
            .parse(&content)
            .map_err(|e| e.with_path(&display))?;
        log::debug!(
            "loaded {} keys from {} ({})",
            values.len(),
            display,
            format.name()
        );

        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        let sources = values
            .keys()
            .map(|k| (k.clone(), filename.clone()))
            .collect();

        Ok(Self { values, sources })
    }

    /// Load and merge multiple files
    ///
    /// Files are merged in order, later files overriding earlier ones key by
    /// key. All files are required - use
    /// [`load_merged_with_specs`](Self::load_merged_with_specs) if some may
    /// not exist.
    pub fn load_merged<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let specs: Vec<FileSpec> = paths
            .iter()
            .map(|p| FileSpec::Required(p.as_ref().to_path_buf()))
            .collect();
        Self::load_merged_with_specs(&specs)
    }

    /// Load and merge multiple files with support for optional files
    ///
    /// Optional files that don't exist are silently skipped; any other
    /// error, including a malformed optional file, is returned.
    pub fn load_merged_with_specs(specs: &[FileSpec]) -> Result<Self> {
        let mut merged = Self::new();

        for spec in specs {
            match Self::load(spec.path()) {
                Ok(next) => merged.merge(next),
                Err(e) if e.is_not_found() && spec.is_optional() => {
                    log::debug!(
                        "optional config {} not found, skipping",
                        spec.path().display()
                    );
                }
                Err(e) => return Err(e),
            }
        }

        Ok(merged)
    }

    /// Merge another configuration into this one
    ///
    /// The other configuration's values (and sources) win.
    pub fn merge(&mut self, other: RawConfig) {
        let RawConfig { values, mut sources } = other;
        for (key, value) in values {
            match sources.remove(&key) {
                Some(source) => {
                    self.sources.insert(key.clone(), source);
                }
                None => {
                    self.sources.remove(&key);
                }
            }
            self.values.insert(key, value);
        }
    }

    /// Set a raw value, returning the previous one
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let key = key.into();
        self.sources.remove(&key);
        self.values.insert(key, value.into())
    }

    /// Get the raw (unresolved) value of a key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over key/value pairs in load order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// File a key's value was loaded from, if it came from a file
    pub fn source_of(&self, key: &str) -> Option<&str> {
        self.sources.get(key).map(String::as_str)
    }

    /// All tracked sources, keyed by config key
    pub fn dump_sources(&self) -> &HashMap<String, String> {
        &self.sources
    }

    /// The raw values as a flat map
    pub fn as_map(&self) -> &RawMap {
        &self.values
    }

    /// Resolve every value against `lookup`
    ///
    /// Never fails; unresolvable placeholders are handled by the
    /// interpolation rules (default, or left as written).
    pub fn resolve<L>(&self, lookup: &L) -> ResolvedConfig
    where
        L: EnvLookup + ?Sized,
    {
        let resolved: RawMap = self
            .values
            .iter()
            .map(|(key, raw)| (key.clone(), interpolation::resolve(raw, lookup)))
            .collect();
        log::debug!("resolved {} configuration values", resolved.len());
        ResolvedConfig::new(resolved)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawConfig {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_map(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
