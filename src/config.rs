use serde::{Deserialize, Serialize};
use std::path::Path;
use crate::error::{Result, ProcessorError};

// Default values for processing configuration
fn default_true() -> bool {
    true
}

fn default_dictionary_delay_ms() -> u64 {
    300
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub translate: TranslateConfig,
    pub backend: BackendConfig,
    pub processing: ProcessingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateConfig {
    /// Google Translate API key; empty or "your_api_key_here" means unset
    pub google_api_key: String,
    /// Use the LibreTranslate provider when no Google key is configured
    pub use_libre: bool,
    /// LibreTranslate endpoint URL
    pub libre_url: String,
    /// Source language code for form content
    pub source_language: String,
    /// Target language code for form content
    pub target_language: String,
    /// HTTP request timeout in seconds
    pub request_timeout_secs: u64,
    /// Simulated latency of the offline dictionary provider
    #[serde(default = "default_dictionary_delay_ms")]
    pub dictionary_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Forms backend base URL
    pub base_url: String,
    /// Strategy generator base URL
    pub strategy_url: String,
    /// Trend service base URL
    pub trend_url: String,
    /// HTTP request timeout in seconds
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// Translate Sinhala content before conversion
    #[serde(default = "default_true")]
    pub enable_translation: bool,
    /// Include the metadata block in processed output
    #[serde(default = "default_true")]
    pub include_metadata: bool,
    /// Prune empty fields from exported output
    #[serde(default = "default_true")]
    pub remove_empty_fields: bool,
    /// Treat unmapped enum values as conversion errors instead of passing
    /// them through unchanged
    #[serde(default)]
    pub strict_enums: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            translate: TranslateConfig {
                google_api_key: String::new(),
                use_libre: false,
                libre_url: "https://libretranslate.pussthecat.org".to_string(),
                source_language: "si".to_string(),
                target_language: "en".to_string(),
                request_timeout_secs: 30,
                dictionary_delay_ms: 300,
            },
            backend: BackendConfig {
                base_url: "http://localhost:8000".to_string(),
                strategy_url: "http://localhost:8002".to_string(),
                trend_url: "http://localhost:8001".to_string(),
                request_timeout_secs: 60,
            },
            processing: ProcessingConfig {
                enable_translation: true,
                include_metadata: true,
                remove_empty_fields: true,
                strict_enums: false,
            },
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ProcessorError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| ProcessorError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ProcessorError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| ProcessorError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Apply provider-selection environment variables on top of the loaded
    /// configuration. Read once at startup; the resulting config is handed to
    /// the provider factory and never consulted again.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("GOOGLE_TRANSLATE_API_KEY") {
            self.translate.google_api_key = key;
        }
        if let Ok(flag) = std::env::var("USE_LIBRE_TRANSLATE") {
            self.translate.use_libre = flag == "true" || flag == "1";
        }
        if let Ok(url) = std::env::var("LIBRE_TRANSLATE_URL") {
            if !url.trim().is_empty() {
                self.translate.libre_url = url;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_roundtrip() {
        let config = Config::default();
        let serialized = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed.translate.target_language, "en");
        assert_eq!(parsed.backend.base_url, "http://localhost:8000");
        assert!(parsed.processing.enable_translation);
        assert!(!parsed.processing.strict_enums);
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.translate.use_libre = true;
        config.save_to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert!(loaded.translate.use_libre);
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = Config::from_file("/nonexistent/config.toml").unwrap_err();
        assert!(matches!(err, ProcessorError::Config(_)));
    }

    #[test]
    fn test_partial_processing_section_uses_defaults() {
        let toml_str = r#"
            [translate]
            google_api_key = ""
            use_libre = true
            libre_url = "http://localhost:5000"
            source_language = "si"
            target_language = "en"
            request_timeout_secs = 10

            [backend]
            base_url = "http://localhost:8000"
            strategy_url = "http://localhost:8002"
            trend_url = "http://localhost:8001"
            request_timeout_secs = 30

            [processing]
            strict_enums = true
        "#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert!(config.processing.enable_translation);
        assert!(config.processing.strict_enums);
        assert_eq!(config.translate.dictionary_delay_ms, 300);
    }
}
