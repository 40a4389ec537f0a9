use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::error::{ProcessorError, Result};
use super::Translator;

#[derive(Debug, Deserialize)]
struct LibreResponse {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

/// LibreTranslate provider against a configurable endpoint.
pub struct LibreTranslator {
    client: Client,
    base_url: String,
}

impl LibreTranslator {
    pub fn new(base_url: String, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("HTTP client creation should not fail");

        Self { client, base_url }
    }
}

#[async_trait]
impl Translator for LibreTranslator {
    fn name(&self) -> &str {
        "LibreTranslate"
    }

    async fn translate(&self, text: &str, from: &str, to: &str) -> Result<String> {
        // LibreTranslate instances rarely carry a Sinhala model; auto-detect
        // gives them a chance to route it themselves.
        let source = if from == "si" { "auto" } else { from };
        let url = format!("{}/translate", self.base_url);
        let body = json!({
            "q": text,
            "source": source,
            "target": to,
            "format": "text",
        });

        debug!("Sending translation request to: {}", url);

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
                "LibreTranslate API error {}: {}",
                status, error_text
            )));
        }

        let parsed: LibreResponse = response
            .json()
            .await
            .map_err(|e| ProcessorError::Translation(format!("Failed to parse response: {}", e)))?;

        let translated = parsed.translated_text.trim().to_string();
        if translated.is_empty() || translated == text {
            return Err(ProcessorError::Translation(
                "No translation returned or same as original".to_string(),
            ));
        }

        Ok(translated)
    }
}
