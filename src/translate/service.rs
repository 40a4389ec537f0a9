use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::TranslateConfig;
use crate::error::{ProcessorError, Result};
use crate::jsonpath;
use crate::language::{Language, TextField};
use super::{DictionaryTranslator, Translator};

/// Suffix appended to the provider name when the offline dictionary stood in
/// for a failed primary provider.
pub const FALLBACK_SUFFIX: &str = " (Fallback)";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationRecord {
    pub original_text: String,
    pub translated_text: String,
    pub provider: String,
}

/// Orchestrates translation of single fragments, batches, and whole form
/// records against an injected provider.
#[derive(Clone)]
pub struct TranslationService {
    provider: Arc<dyn Translator>,
    source: String,
    target: String,
    fallback_delay_ms: u64,
}

impl TranslationService {
    pub fn new(provider: Arc<dyn Translator>, config: &TranslateConfig) -> Self {
        Self {
            provider,
            source: config.source_language.clone(),
            target: config.target_language.clone(),
            fallback_delay_ms: config.dictionary_delay_ms,
        }
    }

    /// Translate a single fragment. A primary-provider failure is absorbed
    /// by retrying through a fresh offline dictionary, tagged in the record's
    /// provider name; callers never see the original error.
    pub async fn translate_text(&self, text: &str) -> Result<TranslationRecord> {
        match self.provider.translate(text, &self.source, &self.target).await {
            Ok(translated_text) => Ok(TranslationRecord {
                original_text: text.to_string(),
                translated_text,
                provider: self.provider.name().to_string(),
            }),
            Err(e) => {
                warn!("Primary translation provider ({}) failed: {}", self.provider.name(), e);

                let fallback = DictionaryTranslator::new(self.fallback_delay_ms);
                let translated_text = fallback.translate(text, &self.source, &self.target).await?;

                Ok(TranslationRecord {
                    original_text: text.to_string(),
                    translated_text,
                    provider: format!("{}{}", self.provider.name(), FALLBACK_SUFFIX),
                })
            }
        }
    }

    /// Translate a batch concurrently. The result aligns index-for-index
    /// with the input; one fragment's failure never aborts its siblings.
    pub async fn translate_batch(&self, texts: &[String]) -> Result<Vec<TranslationRecord>> {
        let mut handles = Vec::with_capacity(texts.len());
        for text in texts {
            let service = self.clone();
            let text = text.clone();
            handles.push(tokio::spawn(async move { service.translate_text(&text).await }));
        }

        let mut records = Vec::with_capacity(handles.len());
        for handle in handles {
            let record = handle
                .await
                .map_err(|e| ProcessorError::Translation(format!("Translation task failed: {}", e)))??;
            records.push(record);
        }

        Ok(records)
    }

    /// Rewrite the Sinhala fields of a record with their translations.
    /// Returns a deep copy; the original record is never mutated. With no
    /// Sinhala fields this is a cheap no-op that performs no provider calls.
    pub async fn translate_form_data(
        &self,
        record: &Value,
        fields: &[TextField],
    ) -> Result<(Value, Vec<TranslationRecord>)> {
        let sinhala_fields: Vec<&TextField> =
            fields.iter().filter(|f| f.language == Language::Si).collect();

        if sinhala_fields.is_empty() {
            return Ok((record.clone(), Vec::new()));
        }

        debug!("Translating {} Sinhala fields", sinhala_fields.len());

        let texts: Vec<String> = sinhala_fields.iter().map(|f| f.text.clone()).collect();
        let records = self.translate_batch(&texts).await?;

        let mut translated = record.clone();
        for (field, result) in sinhala_fields.iter().zip(&records) {
            jsonpath::set_value(
                &mut translated,
                &field.path,
                Value::String(result.translated_text.clone()),
            );
        }

        Ok((translated, records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::language::text_fields_for_translation;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingTranslator {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Translator for CountingTranslator {
        fn name(&self) -> &str {
            "Counting"
        }

        async fn translate(&self, text: &str, _from: &str, _to: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("translated:{}", text))
        }
    }

    struct FailingTranslator;

    #[async_trait]
    impl Translator for FailingTranslator {
        fn name(&self) -> &str {
            "Failing"
        }

        async fn translate(&self, _text: &str, _from: &str, _to: &str) -> Result<String> {
            Err(ProcessorError::Translation("simulated outage".to_string()))
        }
    }

    fn service(provider: Arc<dyn Translator>) -> TranslationService {
        let mut config = Config::default().translate;
        config.dictionary_delay_ms = 0;
        TranslationService::new(provider, &config)
    }

    #[tokio::test]
    async fn test_no_sinhala_fields_makes_no_provider_calls() {
        let provider = Arc::new(CountingTranslator { calls: AtomicUsize::new(0) });
        let service = service(provider.clone());

        let record = json!({"profile": {"city": "Colombo", "industry": "Food"}});
        let fields = text_fields_for_translation(&record);

        let (translated, records) = service.translate_form_data(&record, &fields).await.unwrap();

        assert_eq!(translated, record);
        assert!(records.is_empty());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_sinhala_fields_rewritten_in_deep_copy() {
        let provider = Arc::new(CountingTranslator { calls: AtomicUsize::new(0) });
        let service = service(provider.clone());

        let record = json!({
            "profile": {
                "services": "අපි ආහාර සේවය කරමු",
                "city": "Colombo",
                "tags": ["කොළඹ", "delivery"]
            }
        });
        let fields = text_fields_for_translation(&record);

        let (translated, records) = service.translate_form_data(&record, &fields).await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
        assert_eq!(
            translated["profile"]["services"],
            json!("translated:අපි ආහාර සේවය කරමු")
        );
        assert_eq!(translated["profile"]["tags"][0], json!("translated:කොළඹ"));
        // Untouched fields and the source record stay as they were
        assert_eq!(translated["profile"]["city"], json!("Colombo"));
        assert_eq!(record["profile"]["services"], json!("අපි ආහාර සේවය කරමු"));
    }

    #[tokio::test]
    async fn test_provider_failure_falls_back_to_dictionary() {
        let service = service(Arc::new(FailingTranslator));

        let record = service.translate_text("අපි ආහාර සේවය කරමු").await.unwrap();

        assert_eq!(record.provider, format!("Failing{}", FALLBACK_SUFFIX));
        assert_eq!(record.translated_text, "we food service do");
        assert_eq!(record.original_text, "අපි ආහාර සේවය කරමු");
    }

    #[tokio::test]
    async fn test_batch_preserves_input_order() {
        let provider = Arc::new(CountingTranslator { calls: AtomicUsize::new(0) });
        let service = service(provider);

        let texts: Vec<String> = (0..8).map(|i| format!("text-{}", i)).collect();
        let records = service.translate_batch(&texts).await.unwrap();

        assert_eq!(records.len(), texts.len());
        for (i, record) in records.iter().enumerate() {
            assert_eq!(record.original_text, format!("text-{}", i));
            assert_eq!(record.translated_text, format!("translated:text-{}", i));
        }
    }
}
