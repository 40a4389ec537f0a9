// Pluggable translation providers behind a single trait:
// - Google: key-authenticated hosted API
// - Libre: self-hostable open-source endpoint
// - Dictionary: deterministic offline fallback, always available
//
// Provider selection happens once, from an explicit configuration object.

pub mod dictionary;
pub mod google;
pub mod libre;
pub mod service;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

pub use dictionary::DictionaryTranslator;
pub use google::GoogleTranslator;
pub use libre::LibreTranslator;
pub use service::{TranslationRecord, TranslationService};

use crate::config::TranslateConfig;
use crate::error::Result;

const PLACEHOLDER_API_KEY: &str = "your_api_key_here";

/// Main trait for translation providers.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Human-readable provider name, used in translation records and logs.
    fn name(&self) -> &str;

    /// Translate `text` from `from` to `to`. Fails on network or API errors;
    /// implementations must not silently return the input unchanged.
    async fn translate(&self, text: &str, from: &str, to: &str) -> Result<String>;
}

/// Select a provider from configuration, first match wins: explicit Google
/// API key, then the LibreTranslate opt-in, then the offline dictionary.
pub fn create_translator(config: &TranslateConfig) -> Arc<dyn Translator> {
    let api_key = config.google_api_key.trim();
    if !api_key.is_empty() && api_key != PLACEHOLDER_API_KEY {
        info!("Using Google Translate provider");
        return Arc::new(GoogleTranslator::new(
            api_key.to_string(),
            config.request_timeout_secs,
        ));
    }

    if config.use_libre {
        info!("Using LibreTranslate provider: {}", config.libre_url);
        return Arc::new(LibreTranslator::new(
            config.libre_url.clone(),
            config.request_timeout_secs,
        ));
    }

    warn!("No translation API configured, using offline dictionary provider");
    Arc::new(DictionaryTranslator::new(config.dictionary_delay_ms))
}
