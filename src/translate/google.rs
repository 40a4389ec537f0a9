use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::error::{ProcessorError, Result};
use super::Translator;

const GOOGLE_TRANSLATE_URL: &str = "https://translation.googleapis.com/language/translate/v2";

#[derive(Debug, Deserialize)]
struct GoogleResponse {
    data: GoogleData,
}

#[derive(Debug, Deserialize)]
struct GoogleData {
    translations: Vec<GoogleTranslation>,
}

#[derive(Debug, Deserialize)]
struct GoogleTranslation {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

/// Hosted Google Translate API provider, authenticated by API key.
pub struct GoogleTranslator {
    client: Client,
    api_key: String,
}

impl GoogleTranslator {
    pub fn new(api_key: String, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("HTTP client creation should not fail");

        Self { client, api_key }
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    fn name(&self) -> &str {
        "Google Translate"
    }

    async fn translate(&self, text: &str, from: &str, to: &str) -> Result<String> {
        let url = format!("{}?key={}", GOOGLE_TRANSLATE_URL, self.api_key);
        let body = json!({
            "q": text,
            "source": from,
            "target": to,
        });

        debug!("Sending translation request to Google Translate");

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProcessorError::Translation(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ProcessorError::Translation(format!(
                "Google Translate API error {}: {}",
                status, error_text
            )));
        }

        let parsed: GoogleResponse = response
            .json()
            .await
            .map_err(|e| ProcessorError::Translation(format!("Failed to parse response: {}", e)))?;

        parsed
            .data
            .translations
            .into_iter()
            .next()
            .map(|t| t.translated_text)
            .ok_or_else(|| ProcessorError::Translation("Empty translation list in response".to_string()))
    }
}
