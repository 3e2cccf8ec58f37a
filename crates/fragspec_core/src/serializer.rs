//! Text parsing and rendering for documents and fragments.
//!
//! Parsing tries JSON first and falls back to YAML, so valid JSON never goes
//! through YAML's scalar resolution. Rendering is deterministic: JSON is
//! pretty-printed with two-space indentation and a trailing newline, YAML uses
//! block style with two-space indentation, no line folding and no anchors.

use std::fmt;
use std::path::Path;

use serde_json::{Map, Number, Value};
use serde_yaml::Value as YamlValue;

use crate::error::{FragError, FragResult};

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Json,
    Yaml,
}

impl Format {
    /// Pick the format matching a file extension, defaulting to YAML.
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Format::Json,
            _ => Format::Yaml,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Format::Json => "application/json",
            Format::Yaml => "application/yaml",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Json => write!(f, "json"),
            Format::Yaml => write!(f, "yaml"),
        }
    }
}

/// Parse text as JSON, or as YAML when it is not JSON.
pub fn parse(text: &str) -> FragResult<Value> {
    let json_error = match serde_json::from_str::<Value>(text) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    match serde_yaml::from_str::<YamlValue>(text) {
        Ok(value) => yaml_to_json(value),
        Err(yaml_error) => Err(FragError::Parse {
            json: json_error.to_string(),
            yaml: yaml_error.to_string(),
        }),
    }
}

/// Render a value in the requested format.
pub fn stringify(value: &Value, format: Format) -> FragResult<String> {
    match format {
        Format::Json => {
            let mut text = serde_json::to_string_pretty(value)?;
            text.push('\n');
            Ok(text)
        }
        // serde_yaml emits block style with two-space indentation, never folds
        // long scalars and has no notion of aliases when serializing a tree.
        Format::Yaml => stringify_yaml(value),
    }
}

/// Plain scalars that YAML 1.1 readers resolve to booleans.
const YAML11_BOOLEANS: &[&str] = &[
    "y", "Y", "yes", "Yes", "YES", "n", "N", "no", "No", "NO", "on", "On", "ON", "off", "Off",
    "OFF",
];

/// serde_yaml only quotes YAML 1.2 booleans, so strings like `yes` are
/// wrapped in a marker that is swapped for single quotes after rendering.
fn stringify_yaml(value: &Value) -> FragResult<String> {
    if !any_string(value, &|s: &str| YAML11_BOOLEANS.contains(&s)) {
        return Ok(serde_yaml::to_string(value)?);
    }

    let marker = (0..)
        .map(|n| format!("__fragspec_quote_{}__", n))
        .find(|marker| !any_string(value, &|s: &str| s.contains(marker.as_str())))
        .unwrap_or_default();
    let marked = mark_booleans(value, &marker);
    Ok(serde_yaml::to_string(&marked)?.replace(&marker, "'"))
}

fn any_string(value: &Value, pred: &dyn Fn(&str) -> bool) -> bool {
    match value {
        Value::String(s) => pred(s),
        Value::Array(items) => items.iter().any(|item| any_string(item, pred)),
        Value::Object(map) => map
            .iter()
            .any(|(key, item)| pred(key) || any_string(item, pred)),
        _ => false,
    }
}

fn mark_booleans(value: &Value, marker: &str) -> Value {
    let mark = |s: &str| {
        if YAML11_BOOLEANS.contains(&s) {
            format!("{marker}{s}{marker}")
        } else {
            s.to_string()
        }
    };
    match value {
        Value::String(s) => Value::String(mark(s)),
        Value::Array(items) => Value::Array(items.iter().map(|v| mark_booleans(v, marker)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, item)| (mark(key), mark_booleans(item, marker)))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn yaml_to_json(value: YamlValue) -> FragResult<Value> {
    Ok(match value {
        YamlValue::Null => Value::Null,
        YamlValue::Bool(b) => Value::Bool(b),
        YamlValue::Number(n) => yaml_number(&n),
        YamlValue::String(s) => Value::String(s),
        YamlValue::Sequence(items) => Value::Array(
            items
                .into_iter()
                .map(yaml_to_json)
                .collect::<FragResult<Vec<_>>>()?,
        ),
        YamlValue::Mapping(mapping) => {
            let mut object = Map::with_capacity(mapping.len());
            for (key, value) in mapping {
                object.insert(yaml_key(key)?, yaml_to_json(value)?);
            }
            Value::Object(object)
        }
        YamlValue::Tagged(tagged) => yaml_to_json(tagged.value)?,
    })
}

fn yaml_number(n: &serde_yaml::Number) -> Value {
    if let Some(i) = n.as_i64() {
        Value::Number(i.into())
    } else if let Some(u) = n.as_u64() {
        Value::Number(u.into())
    } else {
        // .nan and .inf have no JSON counterpart
        n.as_f64()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(n.to_string()))
    }
}

/// Mapping keys become strings, so `200:` and `"200":` address the same entry.
fn yaml_key(key: YamlValue) -> FragResult<String> {
    match key {
        YamlValue::String(s) => Ok(s),
        YamlValue::Number(n) => Ok(n.to_string()),
        YamlValue::Bool(b) => Ok(b.to_string()),
        YamlValue::Null => Ok("null".to_string()),
        YamlValue::Tagged(tagged) => yaml_key(tagged.value),
        other => Err(FragError::InvalidKey(format!("{:?}", other))),
    }
}
