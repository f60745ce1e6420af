//! Persisted settings: stored API keys and the last-used conversion
//! parameters, in one JSON file.
//!
//! Nothing reads this implicitly. Callers load a [`Settings`] value, pass
//! the parts they need into the batch converter or credit aggregator, and
//! save it back after a change.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::credentials::CredentialStore;
use crate::error::ConfigError;
use crate::text::DEFAULT_MAX_CHUNK_CHARS;
use crate::SynthesisParams;

const APP_DIR: &str = "tts-batch";
const SETTINGS_FILE: &str = "settings.json";

/// Conversion parameters remembered between runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionDefaults {
    #[serde(flatten)]
    pub params: SynthesisParams,
    pub chunk_size: usize,
    pub output_directory: Option<PathBuf>,
}

impl Default for ConversionDefaults {
    fn default() -> Self {
        Self {
            params: SynthesisParams::default(),
            chunk_size: DEFAULT_MAX_CHUNK_CHARS,
            output_directory: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api_keys: CredentialStore,
    pub conversion: ConversionDefaults,
    pub request_timeout_secs: u64,
    /// API root override, mainly for testing against a local server.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_keys: CredentialStore::default(),
            conversion: ConversionDefaults::default(),
            request_timeout_secs: 30,
            base_url: None,
        }
    }
}

impl Settings {
    /// `<config dir>/tts-batch/settings.json`.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(dir.join(APP_DIR).join(SETTINGS_FILE))
    }

    /// Load settings from `path`. A missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No settings at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write settings to `path`, creating parent directories.
    ///
    /// Keys are stored in plain text, so on unix the file is readable by its
    /// owner only.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(io_err)?;
        let contents = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        let mut tmp = tempfile::Builder::new()
            .prefix(".settings-")
            .suffix(".json.tmp")
            .tempfile_in(dir)
            .map_err(io_err)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(tmp.path(), fs::Permissions::from_mode(0o600)).map_err(io_err)?;
        }
        tmp.write_all(contents.as_bytes()).map_err(io_err)?;
        tmp.persist(path).map_err(|e| io_err(e.error))?;
        log::debug!("Saved settings to {}", path.display());
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OutputFormat;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(&dir.path().join("settings.json")).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.request_timeout(), Duration::from_secs(30));
        assert_eq!(settings.conversion.chunk_size, 5000);
    }

    #[test]
    fn save_then_load_keeps_keys_and_parameters() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let mut settings = Settings::default();
        settings.api_keys.add("sk_one", Some("main")).unwrap();
        settings.api_keys.add("sk_two", None).unwrap();
        settings.conversion.params.voice_id = "voice-9".into();
        settings.conversion.params.output_format = OutputFormat::Pcm { sample_rate: 22050 };
        settings.conversion.output_directory = Some(dir.path().to_path_buf());
        settings.save(&path).unwrap();

        let loaded = Settings::load(&path).unwrap();
        assert_eq!(loaded, settings);
        assert_eq!(loaded.api_keys.current().unwrap().key, "sk_one");
        let names: Vec<_> = fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("settings.json")]);
    }

    #[cfg(unix)]
    #[test]
    fn saved_file_is_private_to_its_owner() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        // An older, world-readable file is replaced, not reused.
        fs::write(&path, "{}").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        let mut settings = Settings::default();
        settings.api_keys.add("sk_private_0001", None).unwrap();
        settings.save(&path).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
        assert_eq!(Settings::load(&path).unwrap(), settings);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(
            &path,
            r#"{"conversion": {"voice_id": "abc", "output_format": "mp3_22050_32"}}"#,
        )
        .unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.conversion.params.voice_id, "abc");
        assert_eq!(settings.conversion.params.model_id, crate::DEFAULT_MODEL_ID);
        assert_eq!(settings.conversion.chunk_size, 5000);
        assert!(settings.api_keys.is_empty());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            Settings::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }
}
