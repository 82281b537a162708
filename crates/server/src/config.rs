use std::path::{Path, PathBuf};

use labeldate_ocr::PipelineConfig;
use serde::Deserialize;
use thiserror::Error;

pub const CONFIG_ENV: &str = "LABELDATE_CONFIG";
pub const BIND_ENV: &str = "LABELDATE_BIND";
pub const DEFAULT_CONFIG_FILE: &str = "labeldate.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    /// Bunyan-style JSON lines.
    Json,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum RecognizerConfig {
    /// Returns `text` for every image. Only useful for demos and smoke tests.
    Mock {
        #[serde(default)]
        text: String,
    },
    Tesseract {
        data_path: Option<String>,
        #[serde(default = "default_lang")]
        lang: String,
    },
}

fn default_lang() -> String {
    "eng".into()
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        RecognizerConfig::Mock { text: String::new() }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// Where uploads are materialized while they are processed.
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    /// Deadline around one whole pipeline run.
    pub request_timeout_secs: u64,
    pub log_format: LogFormat,
    pub pipeline: PipelineConfig,
    /// Fixed `[x1, y1, x2, y2]` text regions. Empty means every image takes
    /// the whole-image fallback.
    pub regions: Vec<[f32; 4]>,
    pub recognizer: RecognizerConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8000".into(),
            upload_dir: std::env::temp_dir().join("labeldate"),
            max_upload_bytes: 20 * 1024 * 1024,
            request_timeout_secs: 60,
            log_format: LogFormat::default(),
            pipeline: PipelineConfig::default(),
            regions: Vec::new(),
            recognizer: RecognizerConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_toml(toml_content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_content)?)
    }

    /// Load using `LABELDATE_CONFIG` / `./labeldate.toml` / defaults, then
    /// apply `LABELDATE_BIND`.
    pub fn load() -> Result<Self, ConfigError> {
        let explicit = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        let bind = std::env::var(BIND_ENV).ok();
        Self::load_from(explicit.as_deref(), Path::new(DEFAULT_CONFIG_FILE), bind)
    }

    /// An explicit path must be readable; the fallback path is optional.
    pub fn load_from(
        explicit: Option<&Path>,
        fallback: &Path,
        bind_override: Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = match explicit {
            Some(path) => Self::from_toml(&read(path)?)?,
            None if fallback.exists() => Self::from_toml(&read(fallback)?)?,
            None => Self::default(),
        };
        if let Some(bind) = bind_override {
            config.bind_addr = bind;
        }
        Ok(config)
    }
}

fn read(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let c = ServerConfig::from_toml("").unwrap();
        assert_eq!(c.bind_addr, "0.0.0.0:8000");
        assert_eq!(c.max_upload_bytes, 20 * 1024 * 1024);
        assert_eq!(c.log_format, LogFormat::Pretty);
        assert!(c.pipeline.parallel_regions);
        assert!(c.regions.is_empty());
        assert_eq!(c.recognizer, RecognizerConfig::Mock { text: String::new() });
    }

    #[test]
    fn full_toml_parses() {
        let c = ServerConfig::from_toml(
            r#"
            bind_addr = "127.0.0.1:9000"
            upload_dir = "/var/tmp/labeldate"
            max_upload_bytes = 1048576
            request_timeout_secs = 5
            log_format = "json"
            regions = [[0.0, 0.0, 100.0, 40.0], [0.0, 40.0, 100.0, 80.0]]

            [pipeline]
            parallel_regions = false

            [recognizer]
            backend = "tesseract"
            data_path = "/usr/share/tessdata"
            "#,
        )
        .unwrap();
        assert_eq!(c.bind_addr, "127.0.0.1:9000");
        assert_eq!(c.upload_dir, PathBuf::from("/var/tmp/labeldate"));
        assert_eq!(c.request_timeout_secs, 5);
        assert_eq!(c.log_format, LogFormat::Json);
        assert_eq!(c.regions.len(), 2);
        assert!(!c.pipeline.parallel_regions);
        assert_eq!(
            c.recognizer,
            RecognizerConfig::Tesseract {
                data_path: Some("/usr/share/tessdata".into()),
                lang: "eng".into(),
            }
        );
    }

    #[test]
    fn mock_recognizer_text() {
        let c = ServerConfig::from_toml("[recognizer]\nbackend = \"mock\"\ntext = \"EXP 03/24\"")
            .unwrap();
        assert_eq!(c.recognizer, RecognizerConfig::Mock { text: "EXP 03/24".into() });
    }

    #[test]
    fn unknown_backend_is_rejected() {
        assert!(matches!(
            ServerConfig::from_toml("[recognizer]\nbackend = \"paddle\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn load_from_prefers_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let explicit = dir.path().join("explicit.toml");
        let fallback = dir.path().join("labeldate.toml");
        std::fs::write(&explicit, "bind_addr = \"127.0.0.1:1\"").unwrap();
        std::fs::write(&fallback, "bind_addr = \"127.0.0.1:2\"").unwrap();

        let c = ServerConfig::load_from(Some(&explicit), &fallback, None).unwrap();
        assert_eq!(c.bind_addr, "127.0.0.1:1");
    }

    #[test]
    fn load_from_uses_fallback_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let fallback = dir.path().join("labeldate.toml");
        std::fs::write(&fallback, "request_timeout_secs = 7").unwrap();

        let c = ServerConfig::load_from(None, &fallback, None).unwrap();
        assert_eq!(c.request_timeout_secs, 7);
    }

    #[test]
    fn load_from_defaults_without_files() {
        let dir = tempfile::tempdir().unwrap();
        let c = ServerConfig::load_from(None, &dir.path().join("missing.toml"), None).unwrap();
        assert_eq!(c.request_timeout_secs, 60);
    }

    #[test]
    fn missing_explicit_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        assert!(matches!(
            ServerConfig::load_from(Some(&missing), &missing, None),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn bind_override_wins() {
        let dir = tempfile::tempdir().unwrap();
        let c = ServerConfig::load_from(
            None,
            &dir.path().join("none.toml"),
            Some("127.0.0.1:8080".into()),
        )
        .unwrap();
        assert_eq!(c.bind_addr, "127.0.0.1:8080");
    }
}
