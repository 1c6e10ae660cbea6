//! Configuration management for receiptbook.
//!
//! Settings come from an optional TOML file, then environment variable
//! overrides. The recognition credential is read once into the settings and
//! treated as read-only for the life of the process.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Which recognition backend analyzes receipt images.
///
/// The backend choice also selects the extraction strategy: plain-text
/// backends feed the pattern-rule extractor, structured backends feed the
/// JSON-schema extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RecognitionProvider {
    /// Google Cloud Vision text detection (plain recognized text).
    Vision,
    /// Gemini vision model prompted for structured JSON (default).
    #[default]
    Gemini,
}

impl RecognitionProvider {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "vision" | "google-vision" | "googlevision" => Some(Self::Vision),
            "gemini" => Some(Self::Gemini),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vision => "vision",
            Self::Gemini => "gemini",
        }
    }
}

/// Recognition-service configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognitionSettings {
    /// Backend provider.
    #[serde(default)]
    pub provider: RecognitionProvider,
    /// API key for the selected provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Gemini model used for structured extraction.
    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_gemini_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for RecognitionSettings {
    fn default() -> Self {
        Self {
            provider: RecognitionProvider::default(),
            api_key: None,
            gemini_model: default_gemini_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Field-extraction options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionSettings {
    /// Drop exact duplicate (name, quantity, price) item matches produced
    /// when both item patterns fire on the same line. Off by default to
    /// match the observed source behavior.
    #[serde(default)]
    pub dedupe_items: bool,
}

/// Image normalization limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizeSettings {
    /// Maximum long-edge dimension in pixels; larger uploads are downscaled,
    /// smaller ones are never upscaled.
    #[serde(default = "default_max_edge")]
    pub max_edge: u32,
    /// JPEG re-encode quality, tuned for text legibility over size.
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
    /// Maximum base64 payload length embedded into `imageUrl`. Oversized
    /// payloads are not embedded.
    #[serde(default = "default_max_embedded_bytes")]
    pub max_embedded_bytes: usize,
}

fn default_max_edge() -> u32 {
    1600
}

fn default_jpeg_quality() -> u8 {
    85
}

fn default_max_embedded_bytes() -> usize {
    4 * 1024 * 1024
}

impl Default for NormalizeSettings {
    fn default() -> Self {
        Self {
            max_edge: default_max_edge(),
            jpeg_quality: default_jpeg_quality(),
            max_embedded_bytes: default_max_embedded_bytes(),
        }
    }
}

/// Receipt store location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Directory holding the receipt document store.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("receiptbook")
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Web server binding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_addr")]
    pub addr: String,
}

fn default_addr() -> String {
    "127.0.0.1:8780".to_string()
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            addr: default_addr(),
        }
    }
}

/// Top-level settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub recognition: RecognitionSettings,
    #[serde(default)]
    pub extraction: ExtractionSettings,
    #[serde(default)]
    pub normalize: NormalizeSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub server: ServerSettings,
}

/// Error loading settings from disk.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl Settings {
    /// Load settings from an optional TOML file, then apply env overrides.
    ///
    /// A missing explicit path is an error; a missing default path is not.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let settings = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = PathBuf::from("receiptbook.toml");
                if default_path.exists() {
                    Self::from_file(&default_path)?
                } else {
                    Self::default()
                }
            }
        };
        Ok(settings.with_env_overrides())
    }

    fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let raw = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply environment variable overrides.
    ///
    /// Supported env vars:
    /// - `RECEIPTBOOK_BACKEND`: "gemini" (default) or "vision"
    /// - `GEMINI_API_KEY`: credential for the Gemini backend
    /// - `VISION_API_KEY`: credential for the Google Vision backend
    /// - `RECEIPTBOOK_API_KEY`: explicit credential, wins over the above
    /// - `RECEIPTBOOK_GEMINI_MODEL`: Gemini model name
    /// - `RECEIPTBOOK_DATA_DIR`: receipt store directory
    /// - `RECEIPTBOOK_ADDR`: web server bind address
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(val) = std::env::var("RECEIPTBOOK_BACKEND") {
            if let Some(provider) = RecognitionProvider::from_str(&val) {
                self.recognition.provider = provider;
            }
        }

        // Explicit key wins over the provider-specific variable.
        if let Ok(val) = std::env::var("RECEIPTBOOK_API_KEY") {
            self.recognition.api_key = Some(val);
        }
        if self.recognition.api_key.is_none() {
            let provider_var = match self.recognition.provider {
                RecognitionProvider::Vision => "VISION_API_KEY",
                RecognitionProvider::Gemini => "GEMINI_API_KEY",
            };
            self.recognition.api_key = std::env::var(provider_var).ok();
        }

        if let Ok(val) = std::env::var("RECEIPTBOOK_GEMINI_MODEL") {
            self.recognition.gemini_model = val;
        }
        if let Ok(val) = std::env::var("RECEIPTBOOK_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(val);
        }
        if let Ok(val) = std::env::var("RECEIPTBOOK_ADDR") {
            self.server.addr = val;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_from_str() {
        assert_eq!(
            RecognitionProvider::from_str("vision"),
            Some(RecognitionProvider::Vision)
        );
        assert_eq!(
            RecognitionProvider::from_str("Gemini"),
            Some(RecognitionProvider::Gemini)
        );
        assert_eq!(RecognitionProvider::from_str("tesseract"), None);
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.recognition.provider, RecognitionProvider::Gemini);
        assert_eq!(settings.normalize.max_edge, 1600);
        assert_eq!(settings.normalize.jpeg_quality, 85);
        assert!(!settings.extraction.dedupe_items);
    }

    #[test]
    fn test_parse_partial_toml() {
        let settings: Settings = toml::from_str(
            r#"
            [recognition]
            provider = "vision"

            [normalize]
            max_edge = 1200
            "#,
        )
        .unwrap();
        assert_eq!(settings.recognition.provider, RecognitionProvider::Vision);
        assert_eq!(settings.normalize.max_edge, 1200);
        // Untouched sections keep defaults.
        assert_eq!(settings.normalize.jpeg_quality, 85);
        assert_eq!(settings.server.addr, "127.0.0.1:8780");
    }
}
