//! Configuration sources
//!
//! Every supported format is read into the same flat shape: an ordered map
//! of key to raw string value. Nested YAML/JSON documents are flattened to
//! dotted keys (`db.pool.size`) and indexed keys (`hosts[0]`).
//!
//! Properties files follow `java.util.Properties` escaping: `\:` in a file
//! is already a plain `:` after loading. YAML and JSON values are kept as
//! written, so a `\:` there reaches the interpolator, which turns it into `:`.

use std::path::Path;

use encoding_rs::UTF_8;
use indexmap::IndexMap;
use java_properties::{PropertiesError, PropertiesIter, PropertiesWriter};

use crate::error::{Error, Result};

/// Flat key to raw value map produced by every source format
pub type RawMap = IndexMap<String, String>;

/// Supported source formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// `key=value` lines (`.properties`, `.conf`, `.env`)
    Properties,
    /// YAML document with a mapping at the root
    Yaml,
    /// JSON document with an object at the root
    Json,
}

impl Format {
    /// Pick a format from a file extension, defaulting to properties
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("yaml") | Some("yml") => Format::Yaml,
            Some("json") => Format::Json,
            _ => Format::Properties,
        }
    }

    /// Human-readable name, as used in CLI output
    pub fn name(self) -> &'static str {
        match self {
            Format::Properties => "properties",
            Format::Yaml => "YAML",
            Format::Json => "JSON",
        }
    }

    /// Parse source text in this format
    pub fn parse(self, text: &str) -> Result<RawMap> {
        match self {
            Format::Properties => parse_properties(text),
            Format::Yaml => parse_yaml(text),
            Format::Json => parse_json(text),
        }
    }
}

/// Parse properties text with `java.util.Properties` load semantics
///
/// Values are unescaped while loading (`\:` becomes `:`, `\uXXXX` a
/// character), so a value that should hand `\:` to the interpolator is
/// written `\\:` in the file. Later duplicates override earlier ones.
pub fn parse_properties(text: &str) -> Result<RawMap> {
    let mut map = RawMap::new();
    PropertiesIter::new_with_encoding(text.as_bytes(), UTF_8)
        .read_into(|key, value| {
            map.insert(key, value);
        })
        .map_err(properties_error)?;
    Ok(map)
}

/// Render a flat map as properties text that [`parse_properties`] reads back
pub fn write_properties(map: &RawMap) -> Result<String> {
    let mut buf = Vec::new();
    let mut writer = PropertiesWriter::new_with_encoding(&mut buf, UTF_8);
    for (key, value) in map {
        writer.write(key, value).map_err(properties_error)?;
    }
    writer.finish().map_err(properties_error)?;
    String::from_utf8(buf).map_err(|e| Error::parse(e.to_string()))
}

fn properties_error(e: PropertiesError) -> Error {
    let err = Error::parse(e.to_string());
    match e.line_number() {
        Some(line) => err.with_line(line),
        None => err,
    }
}

/// Parse a YAML document into a flat map
pub fn parse_yaml(text: &str) -> Result<RawMap> {
    let doc: serde_yaml::Value = serde_yaml::from_str(text).map_err(|e| {
        let err = Error::parse(e.to_string());
        match e.location() {
            Some(loc) => err.with_line(loc.line()),
            None => err,
        }
    })?;
    flatten_document(&doc)
}

/// Parse a JSON document into a flat map
pub fn parse_json(text: &str) -> Result<RawMap> {
    // Deserializing straight into the YAML value keeps key order
    let doc: serde_yaml::Value = serde_json::from_str(text)
        .map_err(|e| Error::parse(e.to_string()).with_line(e.line()))?;
    flatten_document(&doc)
}

fn flatten_document(doc: &serde_yaml::Value) -> Result<RawMap> {
    let mut map = RawMap::new();
    match doc {
        // An empty document is an empty configuration
        serde_yaml::Value::Null => {}
        serde_yaml::Value::Mapping(_) => flatten_into(doc, "", &mut map)?,
        other => {
            return Err(Error::parse(format!(
                "Expected a mapping at the document root, found {}",
                type_name(other)
            ))
            .with_help("Configuration files must map keys to values"));
        }
    }
    Ok(map)
}

fn flatten_into(value: &serde_yaml::Value, prefix: &str, out: &mut RawMap) -> Result<()> {
    match value {
        serde_yaml::Value::Mapping(mapping) => {
            for (k, v) in mapping {
                let key = scalar_to_string(k).ok_or_else(|| {
                    Error::parse(format!("Unsupported {} used as a key", type_name(k)))
                        .with_path(if prefix.is_empty() { "<root>" } else { prefix })
                })?;
                let path = if prefix.is_empty() {
                    key
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten_into(v, &path, out)?;
            }
        }
        serde_yaml::Value::Sequence(items) => {
            for (i, item) in items.iter().enumerate() {
                flatten_into(item, &format!("{}[{}]", prefix, i), out)?;
            }
        }
        serde_yaml::Value::Tagged(tagged) => flatten_into(&tagged.value, prefix, out)?,
        scalar => {
            // Only scalars reach this arm
            let text = scalar_to_string(scalar).unwrap_or_default();
            out.insert(prefix.to_string(), text);
        }
    }
    Ok(())
}

fn scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::Null => Some(String::new()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Tagged(tagged) => scalar_to_string(&tagged.value),
        serde_yaml::Value::Sequence(_) | serde_yaml::Value::Mapping(_) => None,
    }
}

fn type_name(value: &serde_yaml::Value) -> &'static str {
    match value {
        serde_yaml::Value::Null => "null",
        serde_yaml::Value::Bool(_) => "boolean",
        serde_yaml::Value::Number(_) => "number",
        serde_yaml::Value::String(_) => "string",
        serde_yaml::Value::Sequence(_) => "sequence",
        serde_yaml::Value::Mapping(_) => "mapping",
        serde_yaml::Value::Tagged(_) => "tagged value",
    }
}
