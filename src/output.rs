//! Validation and canonical serialization of rendered output.
//!
//! Rendered text is parsed according to the declared format, re-serialized
//! with sorted keys and fixed indentation, and written through a temporary
//! file that is renamed over the target. A failed parse or write leaves the
//! target untouched.

use serde::Serialize;
use std::fmt;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

const JSON_INDENT: &[u8] = b"    ";

/// Structured output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Format {
    #[default]
    Json,
    Yaml,
}

impl Format {
    /// Whether this build can produce the format.
    pub fn is_supported(self) -> bool {
        match self {
            Format::Json => true,
            Format::Yaml => cfg!(feature = "yaml"),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Json => f.write_str("json"),
            Format::Yaml => f.write_str("yaml"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("invalid {format} data")]
    InvalidPayload {
        format: Format,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("error writing to file {}", path.display())]
    IoFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{format} output is not supported by this build")]
    UnsupportedFormat { format: Format },
}

/// Validate `rendered` as `format` and write its canonical form to `path`.
pub fn write(path: &Path, rendered: &str, format: Format) -> Result<(), WriteError> {
    let canonical = canonicalize(rendered, format)?;
    write_atomically(path, canonical.as_bytes())
}

/// Parse `rendered` as `format` and return the canonical text.
pub fn canonicalize(rendered: &str, format: Format) -> Result<String, WriteError> {
    match format {
        Format::Json => canonical_json(rendered),
        Format::Yaml => canonical_yaml(rendered),
    }
}

fn canonical_json(rendered: &str) -> Result<String, WriteError> {
    let value: serde_json::Value =
        serde_json::from_str(rendered).map_err(|e| WriteError::InvalidPayload {
            format: Format::Json,
            source: Box::new(e),
        })?;
    let value = sort_json_keys(value);

    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(JSON_INDENT);
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value
        .serialize(&mut ser)
        .map_err(|e| WriteError::InvalidPayload {
            format: Format::Json,
            source: Box::new(e),
        })?;
    buf.push(b'\n');
    String::from_utf8(buf).map_err(|e| WriteError::InvalidPayload {
        format: Format::Json,
        source: Box::new(e),
    })
}

fn sort_json_keys(value: serde_json::Value) -> serde_json::Value {
    use serde_json::Value;
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, sort_json_keys(v)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_json_keys).collect()),
        other => other,
    }
}

#[cfg(feature = "yaml")]
fn canonical_yaml(rendered: &str) -> Result<String, WriteError> {
    let value: serde_yaml::Value =
        serde_yaml::from_str(rendered).map_err(|e| WriteError::InvalidPayload {
            format: Format::Yaml,
            source: Box::new(e),
        })?;
    serde_yaml::to_string(&sort_yaml_keys(value)).map_err(|e| WriteError::InvalidPayload {
        format: Format::Yaml,
        source: Box::new(e),
    })
}

#[cfg(not(feature = "yaml"))]
fn canonical_yaml(_rendered: &str) -> Result<String, WriteError> {
    Err(WriteError::UnsupportedFormat {
        format: Format::Yaml,
    })
}

#[cfg(feature = "yaml")]
fn sort_yaml_keys(value: serde_yaml::Value) -> serde_yaml::Value {
    use serde_yaml::Value;
    match value {
        Value::Mapping(map) => {
            let mut entries: Vec<(Value, Value)> = map.into_iter().collect();
            entries.sort_by(|(a, _), (b, _)| compare_yaml_keys(a, b));
            Value::Mapping(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, sort_yaml_keys(v)))
                    .collect(),
            )
        }
        Value::Sequence(items) => Value::Sequence(items.into_iter().map(sort_yaml_keys).collect()),
        Value::Tagged(tagged) => {
            let serde_yaml::value::TaggedValue { tag, value } = *tagged;
            Value::Tagged(Box::new(serde_yaml::value::TaggedValue {
                tag,
                value: sort_yaml_keys(value),
            }))
        }
        other => other,
    }
}

/// YAML keys need not be strings. Keys of different kinds order as null,
/// booleans, numbers, strings, then anything else; numbers compare by value
/// and composite keys by their serialized text.
#[cfg(feature = "yaml")]
fn compare_yaml_keys(a: &serde_yaml::Value, b: &serde_yaml::Value) -> std::cmp::Ordering {
    use serde_yaml::Value;
    fn rank(key: &Value) -> u8 {
        match key {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            _ => 4,
        }
    }
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => compare_yaml_numbers(x, y),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => rank(a)
            .cmp(&rank(b))
            .then_with(|| yaml_key_text(a).cmp(&yaml_key_text(b))),
    }
}

#[cfg(feature = "yaml")]
fn compare_yaml_numbers(a: &serde_yaml::Number, b: &serde_yaml::Number) -> std::cmp::Ordering {
    match (a.as_i64(), b.as_i64()) {
        (Some(x), Some(y)) => x.cmp(&y),
        _ => match (a.as_u64(), b.as_u64()) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => {
                let (x, y) = (a.as_f64().unwrap_or(f64::NAN), b.as_f64().unwrap_or(f64::NAN));
                x.total_cmp(&y)
            }
        },
    }
}

#[cfg(feature = "yaml")]
fn yaml_key_text(key: &serde_yaml::Value) -> String {
    serde_yaml::to_string(key)
        .map(|s| s.trim_end().to_string())
        .unwrap_or_default()
}

/// Write `contents` to a temporary file next to `path`, then rename it into place.
///
/// When `path` is a symlink to an existing file, the link's target is
/// replaced and the link itself is left alone.
fn write_atomically(path: &Path, contents: &[u8]) -> Result<(), WriteError> {
    let io_failure = |source: std::io::Error| WriteError::IoFailure {
        path: path.to_path_buf(),
        source,
    };
    let target = resolve_symlink(path);
    let path = target.as_path();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(io_failure)?;
    tmp.write_all(contents).map_err(io_failure)?;
    tmp.as_file().sync_all().map_err(io_failure)?;
    if let Some(perms) = target_permissions(path) {
        std::fs::set_permissions(tmp.path(), perms).map_err(io_failure)?;
    }
    tmp.persist(path).map_err(|e| io_failure(e.error))?;
    Ok(())
}

/// Final destination of `path` if it is a symlink that resolves; otherwise
/// `path` unchanged. A dangling link is replaced by a regular file.
fn resolve_symlink(path: &Path) -> PathBuf {
    match std::fs::symlink_metadata(path) {
        Ok(metadata) if metadata.file_type().is_symlink() => {
            std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
        }
        _ => path.to_path_buf(),
    }
}

/// Keep the permissions of an existing target; new files get the usual
/// `0644` rather than the private mode temporary files are created with.
fn target_permissions(path: &Path) -> Option<std::fs::Permissions> {
    if let Ok(metadata) = std::fs::metadata(path) {
        return Some(metadata.permissions());
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        Some(std::fs::Permissions::from_mode(0o644))
    }
    #[cfg(not(unix))]
    {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_keys_are_sorted_recursively_with_four_space_indent() {
        let out = canonicalize(r#"{"b": 1, "a": {"d": [1], "c": true}}"#, Format::Json).unwrap();
        let expected = "{\n    \"a\": {\n        \"c\": true,\n        \"d\": [\n            1\n        ]\n    },\n    \"b\": 1\n}\n";
        assert_eq!(out, expected);
    }

    #[test]
    fn malformed_json_is_invalid_payload() {
        let err = canonicalize("{\"count\": }", Format::Json).unwrap_err();
        assert!(matches!(
            err,
            WriteError::InvalidPayload {
                format: Format::Json,
                ..
            }
        ));
    }

    #[cfg(feature = "yaml")]
    #[test]
    fn yaml_is_block_style_with_sorted_keys() {
        let out = canonicalize("{z: 1, a: [x, y], m: {k: v}}", Format::Yaml).unwrap();
        assert_eq!(out, "a:\n- x\n- y\nm:\n  k: v\nz: 1\n");
    }

    #[cfg(feature = "yaml")]
    #[test]
    fn yaml_numeric_keys_sort_by_value() {
        let out = canonicalize("{10: a, x: c, 9: b, -1: d, 2.5: e}", Format::Yaml).unwrap();
        assert_eq!(out, "-1: d\n2.5: e\n9: b\n10: a\nx: c\n");
    }

    #[cfg(not(feature = "yaml"))]
    #[test]
    fn yaml_unsupported_without_feature() {
        assert!(!Format::Yaml.is_supported());
        let err = canonicalize("a: 1", Format::Yaml).unwrap_err();
        assert!(matches!(err, WriteError::UnsupportedFormat { .. }));
    }

    #[test]
    fn format_display_matches_cli_names() {
        assert_eq!(Format::Json.to_string(), "json");
        assert_eq!(Format::Yaml.to_string(), "yaml");
    }
}
