//! YAML mapping loader
//!
//! Loads mapping documents from disk with two conveniences on top of plain
//! serde_yaml: environment variable expansion in string scalars, and a
//! conversion to JSON values so the rest of the crate works with a single
//! value model. Also home to [`deep_merge`], the recursive merge used both
//! here and during parameter resolution.

use regex::Regex;
use serde_json::Value as JsonValue;
use serde_yaml::Value as YamlValue;
use std::env;
use std::fs;
use std::path::Path;

use crate::mapping::QualityMapping;
use crate::{QualityError, Result};

/// Load a YAML file into JSON values
///
/// String scalars may reference environment variables as `${VAR}` or
/// `${VAR:default}`; references are expanded before conversion. Unset
/// variables without a default expand to the empty string.
pub fn load_yaml_file<P: AsRef<Path>>(path: P) -> Result<JsonValue> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| QualityError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut value: YamlValue =
        serde_yaml::from_str(&content).map_err(|source| QualityError::Yaml {
            path: path.to_path_buf(),
            source,
        })?;

    expand_variables(&mut value);
    yaml_to_json(&value)
}

/// Load, expand and type-check a quality mapping document
///
/// Built-in floors are filled in and post-parse validation runs before the
/// mapping is returned, so a successful load is a structurally sound one.
pub fn load_mapping<P: AsRef<Path>>(path: P) -> Result<QualityMapping> {
    let path = path.as_ref();
    let json = load_yaml_file(path)?;

    let mut mapping: QualityMapping = serde_json::from_value(json)
        .map_err(|e| QualityError::InvalidMapping(format!("{}: {}", path.display(), e)))?;

    mapping.constraints.apply_builtin();
    mapping.validate()?;

    tracing::debug!(
        "Parsed quality mapping from {} ({} task(s))",
        path.display(),
        mapping.tasks.len()
    );
    Ok(mapping)
}

/// Merge `overlay` into `base` recursively
///
/// Objects merge key by key; any other overlay value replaces the base
/// value wholesale, including arrays.
pub fn deep_merge(base: &mut JsonValue, overlay: &JsonValue) {
    match (base, overlay) {
        (JsonValue::Object(base_map), JsonValue::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => {
                        base_map.insert(key.clone(), overlay_value.clone());
                    }
                }
            }
        }
        (base, overlay) => {
            *base = overlay.clone();
        }
    }
}

/// Expand environment variables in every string scalar
fn expand_variables(value: &mut YamlValue) {
    match value {
        YamlValue::String(s) => {
            if let Some(expanded) = expand_env_in_string(s) {
                *s = expanded;
            }
        }
        YamlValue::Mapping(map) => {
            for (_, v) in map.iter_mut() {
                expand_variables(v);
            }
        }
        YamlValue::Sequence(seq) => {
            for item in seq.iter_mut() {
                expand_variables(item);
            }
        }
        _ => {}
    }
}

/// Expand `${VAR}` and `${VAR:default}` references in one string
fn expand_env_in_string(s: &str) -> Option<String> {
    if !s.contains("${") {
        return None;
    }

    let re = Regex::new(r"\$\{([^:}]+)(?::([^}]*))?\}").ok()?;
    let mut result = s.to_string();

    for cap in re.captures_iter(s) {
        let full_match = cap.get(0)?.as_str();
        let var_name = cap.get(1)?.as_str();
        let default_value = cap.get(2).map(|m| m.as_str()).unwrap_or("");

        let value = env::var(var_name).unwrap_or_else(|_| default_value.to_string());
        result = result.replace(full_match, &value);
    }

    Some(result)
}

/// Convert a YAML value tree to JSON values
///
/// Mapping keys must be strings; tagged values unwrap to their inner value.
fn yaml_to_json(yaml: &YamlValue) -> Result<JsonValue> {
    match yaml {
        YamlValue::Null => Ok(JsonValue::Null),
        YamlValue::Bool(b) => Ok(JsonValue::Bool(*b)),
        YamlValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(JsonValue::Number(i.into()))
            } else if let Some(u) = n.as_u64() {
                Ok(JsonValue::Number(u.into()))
            } else if let Some(f) = n.as_f64() {
                serde_json::Number::from_f64(f)
                    .map(JsonValue::Number)
                    .ok_or_else(|| {
                        QualityError::InvalidMapping(format!("Number {f} has no JSON representation"))
                    })
            } else {
                Err(QualityError::InvalidMapping("Unrepresentable number".to_string()))
            }
        }
        YamlValue::String(s) => Ok(JsonValue::String(s.clone())),
        YamlValue::Sequence(seq) => {
            let items: Result<Vec<JsonValue>> = seq.iter().map(yaml_to_json).collect();
            Ok(JsonValue::Array(items?))
        }
        YamlValue::Mapping(map) => {
            let mut object = serde_json::Map::new();
            for (k, v) in map {
                let key = match k {
                    YamlValue::String(s) => s.clone(),
                    other => {
                        return Err(QualityError::InvalidMapping(format!(
                            "Mapping keys must be strings, got {other:?}"
                        )))
                    }
                };
                object.insert(key, yaml_to_json(v)?);
            }
            Ok(JsonValue::Object(object))
        }
        YamlValue::Tagged(tagged) => yaml_to_json(&tagged.value),
    }
}
