//! Format detection, file discovery and deserialization.

use std::path::{Path, PathBuf};

use pipeflow_fluid::FlowConfig;
use serde::de::DeserializeOwned;
use tracing::debug;

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur while loading settings files.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// A required file was not found in the given directory.
    #[error("required file '{file}' not found in {dir}")]
    MissingRequired { file: String, dir: PathBuf },

    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// Two files with the same base name but different formats exist.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// A value parsed but is unusable.
    #[error("invalid value in {file}: {detail}")]
    Invalid { file: PathBuf, detail: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

impl Format {
    pub const ALL: [Format; 3] = [Format::Ron, Format::Toml, Format::Json];

    pub fn extension(self) -> &'static str {
        match self {
            Format::Ron => "ron",
            Format::Toml => "toml",
            Format::Json => "json",
        }
    }
}

/// Detect the format of a file from its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// File discovery
// ===========================================================================

/// Look for `{base_name}.ron`, `.toml` and `.json` in `dir`.
///
/// Returns `Ok(None)` if none exists, or `Err(ConflictingFormats)` if more
/// than one does.
pub fn find_config_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut found: Option<PathBuf> = None;

    for format in Format::ALL {
        let candidate = dir.join(format!("{base_name}.{}", format.extension()));
        if candidate.exists() {
            if let Some(existing) = found {
                return Err(DataLoadError::ConflictingFormats {
                    a: existing,
                    b: candidate,
                });
            }
            found = Some(candidate);
        }
    }

    Ok(found)
}

// ===========================================================================
// Deserialization
// ===========================================================================

/// Read a file and deserialize it according to its extension.
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    let parse_error = |detail: String| DataLoadError::Parse {
        file: path.to_path_buf(),
        detail,
    };

    match format {
        Format::Ron => ron::from_str(&content).map_err(|e| parse_error(e.to_string())),
        Format::Json => serde_json::from_str(&content).map_err(|e| parse_error(e.to_string())),
        Format::Toml => toml::from_str(&content).map_err(|e| parse_error(e.to_string())),
    }
}

/// Load a [`FlowConfig`]. Missing fields take their defaults.
pub fn load_flow_config(path: &Path) -> Result<FlowConfig, DataLoadError> {
    let config: FlowConfig = deserialize_file(path)?;
    if config.transfer_per_tick == 0 {
        return Err(DataLoadError::Invalid {
            file: path.to_path_buf(),
            detail: "transfer_per_tick must be at least 1".to_string(),
        });
    }
    debug!(file = %path.display(), ?config, "loaded flow config");
    Ok(config)
}

/// Load `{base_name}.{ron,toml,json}` from `dir`, or the defaults if no
/// such file exists.
pub fn load_flow_config_from_dir(dir: &Path, base_name: &str) -> Result<FlowConfig, DataLoadError> {
    match find_config_file(dir, base_name)? {
        Some(path) => load_flow_config(&path),
        None => {
            debug!(dir = %dir.display(), base_name, "no flow config found, using defaults");
            Ok(FlowConfig::default())
        }
    }
}

/// Like [`find_config_file`], but a missing file is an error.
pub fn require_config_file(dir: &Path, base_name: &str) -> Result<PathBuf, DataLoadError> {
    find_config_file(dir, base_name)?.ok_or_else(|| DataLoadError::MissingRequired {
        file: base_name.to_string(),
        dir: dir.to_path_buf(),
    })
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// Create a fresh temporary directory for a test.
    fn test_dir(suffix: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "pipeflow_data_test_{suffix}_{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn cleanup(dir: &Path) {
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn detect_known_formats() {
        assert_eq!(detect_format(Path::new("a.ron")).unwrap(), Format::Ron);
        assert_eq!(detect_format(Path::new("a.toml")).unwrap(), Format::Toml);
        assert_eq!(detect_format(Path::new("a.json")).unwrap(), Format::Json);
    }

    #[test]
    fn detect_unsupported_format() {
        let err = detect_format(Path::new("flow.yaml")).unwrap_err();
        assert!(matches!(err, DataLoadError::UnsupportedFormat { .. }));
        assert!(detect_format(Path::new("flow")).is_err());
    }

    #[test]
    fn load_ron_config() {
        let dir = test_dir("ron");
        let path = dir.join("flow.ron");
        fs::write(&path, "(seed: 7, transfer_per_tick: 20)").unwrap();

        let config = load_flow_config(&path).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.transfer_per_tick, 20);
        assert_eq!(config.capacity, 250);
        cleanup(&dir);
    }

    #[test]
    fn load_toml_config() {
        let dir = test_dir("toml");
        let path = dir.join("flow.toml");
        fs::write(&path, "capacity = 1000\nlog_violations = false\n").unwrap();

        let config = load_flow_config(&path).unwrap();
        assert_eq!(config.capacity, 1000);
        assert!(!config.log_violations);
        assert_eq!(config.transfer_per_tick, 10);
        cleanup(&dir);
    }

    #[test]
    fn load_json_config() {
        let dir = test_dir("json");
        let path = dir.join("flow.json");
        fs::write(&path, r#"{ "seed": 3, "transfer_per_tick": 5, "capacity": 50 }"#).unwrap();

        let config = load_flow_config(&path).unwrap();
        assert_eq!(
            config,
            FlowConfig {
                seed: 3,
                transfer_per_tick: 5,
                capacity: 50,
                log_violations: true,
            }
        );
        cleanup(&dir);
    }

    #[test]
    fn parse_error_names_file() {
        let dir = test_dir("parse_err");
        let path = dir.join("flow.json");
        fs::write(&path, "{ not json").unwrap();

        let err = load_flow_config(&path).unwrap_err();
        match err {
            DataLoadError::Parse { file, .. } => assert_eq!(file, path),
            other => panic!("expected Parse, got {other:?}"),
        }
        cleanup(&dir);
    }

    #[test]
    fn zero_transfer_rate_is_invalid() {
        let dir = test_dir("zero_rate");
        let path = dir.join("flow.toml");
        fs::write(&path, "transfer_per_tick = 0\n").unwrap();

        let err = load_flow_config(&path).unwrap_err();
        assert!(matches!(err, DataLoadError::Invalid { .. }));
        cleanup(&dir);
    }

    #[test]
    fn find_single_file() {
        let dir = test_dir("find_single");
        fs::write(dir.join("flow.toml"), "").unwrap();

        let found = find_config_file(&dir, "flow").unwrap();
        assert_eq!(found, Some(dir.join("flow.toml")));
        cleanup(&dir);
    }

    #[test]
    fn find_conflicting_formats() {
        let dir = test_dir("find_conflict");
        fs::write(dir.join("flow.ron"), "()").unwrap();
        fs::write(dir.join("flow.json"), "{}").unwrap();

        let err = find_config_file(&dir, "flow").unwrap_err();
        assert!(matches!(err, DataLoadError::ConflictingFormats { .. }));
        cleanup(&dir);
    }

    #[test]
    fn missing_file_uses_defaults_or_errors() {
        let dir = test_dir("missing");
        assert_eq!(find_config_file(&dir, "flow").unwrap(), None);
        assert_eq!(
            load_flow_config_from_dir(&dir, "flow").unwrap(),
            FlowConfig::default()
        );
        let err = require_config_file(&dir, "flow").unwrap_err();
        assert!(err.to_string().starts_with("required file 'flow' not found"));
        cleanup(&dir);
    }

    #[test]
    fn load_from_dir_picks_up_file() {
        let dir = test_dir("from_dir");
        fs::write(dir.join("pipes.ron"), "(seed: 42)").unwrap();

        let config = load_flow_config_from_dir(&dir, "pipes").unwrap();
        assert_eq!(config.seed, 42);
        cleanup(&dir);
    }
}
