//! Configuration file loading
//!
//! Connectors receive their config, state and catalog as JSON files on the
//! command line. YAML configs are accepted too, by file extension.

use crate::error::{Error, Result};
use crate::types::{JsonObject, JsonValue};
use std::fs;
use std::path::Path;

/// Read and parse a JSON file
pub fn load_json(path: impl AsRef<Path>) -> Result<JsonValue> {
    let content = read_file(path.as_ref())?;
    Ok(serde_json::from_str(&content)?)
}

/// Read a config file: YAML for `.yaml`/`.yml`, JSON otherwise
pub fn load_config(path: impl AsRef<Path>) -> Result<JsonValue> {
    let path = path.as_ref();
    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

    if is_yaml {
        let content = read_file(path)?;
        Ok(serde_yaml::from_str(&content)?)
    } else {
        load_json(path)
    }
}

/// Fail with every key from `required_keys` that `config` lacks
pub fn check_config<S: AsRef<str>>(config: &JsonObject, required_keys: &[S]) -> Result<()> {
    let missing: Vec<&str> = required_keys
        .iter()
        .map(AsRef::as_ref)
        .filter(|key| !config.contains_key(*key))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::missing_field(missing.join(", ")))
    }
}

/// Persist an updated config (e.g. a refreshed token) as pretty JSON
pub fn update_config_file(path: impl AsRef<Path>, config: &JsonValue) -> Result<()> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(config)?;

    // Write to temp file first, then rename for atomicity
    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, json)
        .map_err(|e| Error::config(format!("Failed to write config file: {e}")))?;
    fs::rename(&temp_path, path)
        .map_err(|e| Error::config(format!("Failed to rename config file: {e}")))?;

    tracing::debug!("Updated config file {}", path.display());
    Ok(())
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::FileNotFound {
                path: path.display().to_string(),
            }
        } else {
            Error::Io(e)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    fn object(value: JsonValue) -> JsonObject {
        match value {
            JsonValue::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_load_json() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"api_key": "abc"}}"#).unwrap();
        assert_eq!(load_json(file.path()).unwrap(), json!({"api_key": "abc"}));
    }

    #[test]
    fn test_load_json_missing_file() {
        let err = load_json("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, Error::FileNotFound { .. }));
    }

    #[test]
    fn test_load_json_invalid() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{not json").unwrap();
        assert!(matches!(load_json(file.path()).unwrap_err(), Error::JsonParse(_)));
    }

    #[test]
    fn test_load_config_yaml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "api_key: abc\nstart_date: '2024-01-01'\n").unwrap();
        assert_eq!(
            load_config(&path).unwrap(),
            json!({"api_key": "abc", "start_date": "2024-01-01"})
        );
    }

    #[test]
    fn test_check_config() {
        let config = object(json!({"api_key": "abc"}));
        assert!(check_config(&config, &["api_key"]).is_ok());

        let err = check_config(&config, &["start_date", "api_key", "user_agent"]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Config is missing required keys: start_date, user_agent"
        );
    }

    #[test]
    fn test_update_config_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{}").unwrap();

        update_config_file(&path, &json!({"token": "new"})).unwrap();

        assert_eq!(load_json(&path).unwrap(), json!({"token": "new"}));
        assert!(!dir.path().join("config.tmp").exists());
    }
}
