//! Configuration loading and environment parsing.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use super::Config;

/// Load configuration with the following precedence (highest first):
/// 1) `GAME_STORE_CONFIG_JSON` env var containing raw JSON
/// 2) If `GAME_STORE_CONFIG_STDIN=true/1`, read JSON from stdin
/// 3) File pointed by `GAME_STORE_CONFIG_PATH` env var
/// 4) `config.json` in current working directory
/// 5) `config.json` next to the executable
/// 6) Defaults compiled into the binary
///
/// Individual fields can additionally be overridden by `GAME_STORE__*` env
/// vars using `__` as a nested separator, e.g. `GAME_STORE__DATA_DIR=/tmp`.
/// Errors while reading/parsing a source are printed to stderr and that
/// source is skipped; `load()` always returns a `Config`.
#[must_use]
pub fn load() -> Config {
    use std::env;
    use std::io::Read;

    let defaults = Config::default();
    let mut merged =
        serde_json::to_value(&defaults).unwrap_or_else(|_| Value::Object(serde_json::Map::new()));

    if let Ok(json) = env::var("GAME_STORE_CONFIG_JSON") {
        if let Some(value) = parse_json_document(&json, "GAME_STORE_CONFIG_JSON") {
            merge_values(&mut merged, value);
        }
    }

    if let Ok(val) = env::var("GAME_STORE_CONFIG_STDIN") {
        if env_var_truthy(&val) {
            let mut buf = String::new();
            if let Err(e) = std::io::stdin().read_to_string(&mut buf) {
                eprintln!("Failed to read config from stdin: {e}");
            } else if let Some(value) = parse_json_document(&buf, "stdin") {
                merge_values(&mut merged, value);
            }
        }
    }

    if let Ok(path) = env::var("GAME_STORE_CONFIG_PATH") {
        merge_file_source(&mut merged, &PathBuf::from(path));
    }

    merge_file_source(&mut merged, &PathBuf::from("config.json"));

    if let Ok(exe_path) = env::current_exe() {
        if let Some(mut exe_dir) = exe_path.parent().map(Path::to_path_buf) {
            exe_dir.push("config.json");
            merge_file_source(&mut merged, &exe_dir);
        }
    }

    apply_env_overrides(&mut merged);

    match serde_json::from_value::<Config>(merged) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to deserialize config; using defaults: {e}");
            defaults
        }
    }
}

fn parse_json_document(raw: &str, label: &str) -> Option<Value> {
    if raw.trim().is_empty() {
        return None;
    }
    match serde_json::from_str(raw) {
        Ok(value) => Some(value),
        Err(err) => {
            eprintln!("Failed to parse config from {label}: {err}");
            None
        }
    }
}

fn merge_file_source(target: &mut Value, path: &Path) {
    if path.as_os_str().is_empty() || !path.exists() {
        return;
    }
    match fs::read_to_string(path) {
        Ok(contents) => {
            if let Some(value) = parse_json_document(&contents, &format!("file {}", path.display()))
            {
                merge_values(target, value);
            }
        }
        Err(err) => eprintln!("Failed to read config from {}: {}", path.display(), err),
    }
}

fn merge_values(target: &mut Value, source: Value) {
    match (target, source) {
        (Value::Object(target_map), Value::Object(source_map)) => {
            for (key, value) in source_map {
                match target_map.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        target_map.insert(key, value);
                    }
                }
            }
        }
        (target_slot, source_value) => *target_slot = source_value,
    }
}

fn apply_env_overrides(root: &mut Value) {
    for (key, raw_value) in std::env::vars() {
        let Some(stripped) = key.strip_prefix("GAME_STORE__") else {
            continue;
        };
        let segments: Vec<String> = stripped
            .split("__")
            .filter(|segment| !segment.is_empty())
            .map(str::to_ascii_lowercase)
            .collect();
        if segments.is_empty() {
            continue;
        }
        set_nested_value(root, &segments, parse_env_value(&raw_value));
    }
}

fn env_var_truthy(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes")
}

fn parse_env_value(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.contains(',') {
        return Value::Array(trimmed.split(',').map(|s| parse_scalar(s.trim())).collect());
    }
    parse_scalar(trimmed)
}

fn parse_scalar(raw: &str) -> Value {
    if raw.is_empty() {
        return Value::String(String::new());
    }
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn set_nested_value(target: &mut Value, segments: &[String], value: Value) {
    if segments.is_empty() {
        *target = value;
        return;
    }
    if segments.len() == 1 {
        ensure_object(target).insert(segments[0].clone(), value);
        return;
    }
    let map = ensure_object(target);
    let entry = map
        .entry(segments[0].clone())
        .or_insert_with(|| Value::Object(serde_json::Map::new()));
    set_nested_value(entry, &segments[1..], value);
}

fn ensure_object(value: &mut Value) -> &mut serde_json::Map<String, Value> {
    if !value.is_object() {
        *value = Value::Object(serde_json::Map::new());
    }
    value.as_object_mut().expect("just coerced into an object")
}
