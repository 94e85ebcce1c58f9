use crate::defines::SETTINGS_KEYS;
use crate::types::{Settings, SettingsError};
use crate::util::absolute_path;

use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Load and validate the broker config file at `config_file_path`.
///
/// Top-level keys other than `SETTINGS_KEYS` are rejected. Keys that are absent
/// are not an error; they are left empty and a warning is logged for each.
pub fn load_settings(config_file_path: &Path) -> Result<Settings, SettingsError> {
    let full_path = absolute_path(config_file_path).unwrap_or_else(|_| config_file_path.to_path_buf());

    if !full_path.exists() {
        return Err(SettingsError::ConfigMissing(full_path));
    }

    let raw = std::fs::read(&full_path).map_err(|source| SettingsError::ConfigUnreadable {
        path: full_path.clone(),
        source,
    })?;
    let json_data: serde_json::Value = serde_json::from_slice(&raw).map_err(|source| SettingsError::ConfigParse {
        path: full_path.clone(),
        source,
    })?;
    let object = json_data
        .as_object()
        .ok_or_else(|| SettingsError::ConfigNotObject(full_path.clone()))?;

    let unexpected: Vec<String> = object
        .keys()
        .filter(|k| !SETTINGS_KEYS.contains(&k.as_str()))
        .cloned()
        .collect();
    if !unexpected.is_empty() {
        return Err(SettingsError::UnexpectedKeys {
            found: unexpected,
            expected: SETTINGS_KEYS.to_vec(),
        });
    }

    for key in SETTINGS_KEYS.iter().filter(|k| !object.contains_key(**k)) {
        warn!(key, path = %full_path.display(), "config key missing, left empty");
    }

    let settings: Settings = serde_json::from_value(json_data).map_err(|source| SettingsError::ConfigParse {
        path: full_path.clone(),
        source,
    })?;

    info!(source = "program", event = "set", settings = "oanda", "Oanda settings read");
    Ok(settings)
}

/// Resolve the output directory, creating it if needed.
pub fn resolve_output_dir(directory_path: &Path) -> Result<PathBuf, SettingsError> {
    let full_path = absolute_path(directory_path).unwrap_or_else(|_| directory_path.to_path_buf());
    ensure_dir(&full_path)?;
    Ok(full_path)
}

/// Create `path` (and parents) unless it already exists.
pub fn ensure_dir(path: &Path) -> Result<(), SettingsError> {
    if !path.exists() {
        std::fs::create_dir_all(path).map_err(|source| SettingsError::OutputDirectory {
            path: path.to_path_buf(),
            source,
        })?;
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static COUNTER: AtomicUsize = AtomicUsize::new(0);

    /// Fresh, empty directory under the system temp dir.
    pub(crate) fn scratch_dir(name: &str) -> PathBuf {
        let n = COUNTER.fetch_add(1, Ordering::SeqCst);
        let dir = std::env::temp_dir().join(format!("oanda-trader-{}-{}-{}", name, std::process::id(), n));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_config(name: &str, content: &str) -> PathBuf {
        let path = scratch_dir(name).join("oanda.json");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_valid_settings() {
        let path = write_config("valid", r#"{
            "account_number": "101-004-1234567-001",
            "api_key": "secret",
            "rest_api_url": "https://api-fxpractice.oanda.com",
            "streaming_api_url": "https://stream-fxpractice.oanda.com"
        }"#);
        let settings = load_settings(&path).unwrap();
        assert_eq!(settings.account_number, "101-004-1234567-001");
        assert_eq!(settings.api_key, "secret");
        assert_eq!(settings.rest_api_url, "https://api-fxpractice.oanda.com");
        assert_eq!(settings.streaming_api_url, "https://stream-fxpractice.oanda.com");
    }

    #[test]
    fn test_missing_config_exits_with_path_code() {
        let path = scratch_dir("missing").join("nope.json");
        let err = load_settings(&path).unwrap_err();
        assert!(matches!(err, SettingsError::ConfigMissing(_)));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_malformed_json_exits_with_parse_code() {
        let path = write_config("malformed", "{ \"api_key\": ");
        let err = load_settings(&path).unwrap_err();
        assert!(matches!(err, SettingsError::ConfigParse { .. }));
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_non_object_exits_with_parse_code() {
        let path = write_config("array", "[1, 2]");
        assert_eq!(load_settings(&path).unwrap_err().exit_code(), 3);
    }

    #[test]
    fn test_extra_key_exits_with_key_code() {
        let path = write_config("extra", r#"{"api_key": "k", "password": "hunter2"}"#);
        let err = load_settings(&path).unwrap_err();
        match &err {
            SettingsError::UnexpectedKeys { found, .. } => assert_eq!(found, &vec!["password".to_string()]),
            other => panic!("unexpected error {:?}", other),
        }
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn test_absent_keys_are_not_rejected() {
        let path = write_config("partial", r#"{"api_key": "k"}"#);
        let settings = load_settings(&path).unwrap();
        assert_eq!(settings.api_key, "k");
        assert!(settings.account_number.is_empty());
        assert!(settings.rest_api_url.is_empty());
    }

    #[test]
    fn test_non_string_value_exits_with_parse_code() {
        let path = write_config("number", r#"{"account_number": 42}"#);
        assert_eq!(load_settings(&path).unwrap_err().exit_code(), 3);
    }

    #[test]
    fn test_resolve_output_dir_creates_nested() {
        let base = scratch_dir("output");
        let target = base.join("a").join("b");
        let resolved = resolve_output_dir(&target).unwrap();
        assert!(resolved.is_absolute());
        assert!(resolved.is_dir());
    }

    #[test]
    fn test_resolve_output_dir_fails_on_file() {
        let base = scratch_dir("output-file");
        let file = base.join("taken");
        std::fs::write(&file, b"x").unwrap();
        let err = resolve_output_dir(&file.join("sub")).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
