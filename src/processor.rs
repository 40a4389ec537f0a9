//! Pipeline orchestration: normalize, detect, translate, convert, submit.
//!
//! The public entry points never propagate errors; failures are folded into
//! the result types so callers inspect `success` and `backend_error` instead
//! of catching panics or exceptions.

use std::time::Instant;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::api::{ApiService, SubmissionResponse};
use crate::backend::to_backend_payload;
use crate::config::{Config, ProcessingConfig};
use crate::convert::{
    self, completion_rate, convert_to_structured_json, ConversionOptions, JsonExport,
    ProcessedFormData, REQUIRED_PROBES,
};
use crate::error::Result;
use crate::language::{
    aggregate_language, detect_languages, text_fields_for_translation, DetectedLanguage, Language,
    LanguageMap,
};
use crate::translate::{create_translator, TranslationRecord, TranslationService};

/// Raw step identifiers as produced by the form UI, paired with the section
/// names the converter expects.
const STEP_SECTIONS: &[(&str, &str)] = &[
    ("businessprofile", "businessProfile"),
    ("targetaudience", "targetAudience"),
    ("businessgoals", "businessGoals"),
    ("budgetresources", "budgetResources"),
    ("platformspreferences", "platformsPreferences"),
    ("currentchallenges", "currentChallenges"),
    ("strengthsopportunities", "strengthsOpportunities"),
    ("marketsituation", "marketSituation"),
];

#[derive(Debug, Clone)]
pub struct ProcessingOptions {
    pub enable_translation: bool,
    pub include_metadata: bool,
    pub remove_empty_fields: bool,
    pub strict_enums: bool,
}

impl Default for ProcessingOptions {
    fn default() -> Self {
        Self {
            enable_translation: true,
            include_metadata: true,
            remove_empty_fields: true,
            strict_enums: false,
        }
    }
}

impl From<&ProcessingConfig> for ProcessingOptions {
    fn from(config: &ProcessingConfig) -> Self {
        Self {
            enable_translation: config.enable_translation,
            include_metadata: config.include_metadata,
            remove_empty_fields: config.remove_empty_fields,
            strict_enums: config.strict_enums,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingMetadata {
    pub submission_date: String,
    pub detected_language: DetectedLanguage,
    pub translation_applied: bool,
    pub translated_fields_count: usize,
    pub total_processing_time_ms: u64,
    pub completion_rate: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ProcessedFormData>,
    pub translations: Vec<TranslationRecord>,
    pub original_languages: LanguageMap,
    pub processing_metadata: ProcessingMetadata,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionOutcome {
    #[serde(flatten)]
    pub processing: ProcessingResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend_response: Option<SubmissionResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend_error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    pub missing_fields: Vec<String>,
    pub completion_rate: u8,
}

pub struct FormProcessor {
    translation: TranslationService,
    api: ApiService,
}

impl FormProcessor {
    pub fn new(config: &Config) -> Self {
        let provider = create_translator(&config.translate);
        let translation = TranslationService::new(provider, &config.translate);
        let api = ApiService::new(&config.backend);

        Self { translation, api }
    }

    /// Construct with an explicit translation service, for callers that
    /// already built one around an injected provider.
    pub fn with_translation_service(config: &Config, translation: TranslationService) -> Self {
        Self {
            translation,
            api: ApiService::new(&config.backend),
        }
    }

    /// Run the full transformation pipeline. Never fails: any stage error is
    /// folded into a `success: false` result with zeroed metadata.
    pub async fn process_form_data(
        &self,
        raw_record: &Value,
        options: &ProcessingOptions,
    ) -> ProcessingResult {
        let started = Instant::now();

        match self.run_pipeline(raw_record, options).await {
            Ok(outcome) => {
                let PipelineOutcome {
                    data,
                    translations,
                    original_languages,
                    detected_language,
                    translation_applied,
                    completion_rate,
                } = outcome;

                let elapsed = started.elapsed().as_millis() as u64;
                info!(
                    "Form processing completed in {}ms ({} fields translated)",
                    elapsed,
                    translations.len()
                );

                ProcessingResult {
                    success: true,
                    processing_metadata: ProcessingMetadata {
                        submission_date: now_iso(),
                        detected_language,
                        translation_applied,
                        translated_fields_count: translations.len(),
                        total_processing_time_ms: elapsed,
                        completion_rate,
                    },
                    data: Some(data),
                    translations,
                    original_languages,
                    errors: Vec::new(),
                }
            }
            Err(e) => {
                warn!("Form data processing failed: {}", e);

                ProcessingResult {
                    success: false,
                    data: None,
                    translations: Vec::new(),
                    original_languages: LanguageMap::new(),
                    processing_metadata: ProcessingMetadata {
                        submission_date: now_iso(),
                        detected_language: DetectedLanguage::En,
                        translation_applied: false,
                        translated_fields_count: 0,
                        total_processing_time_ms: started.elapsed().as_millis() as u64,
                        completion_rate: 0,
                    },
                    errors: vec![e.to_string()],
                }
            }
        }
    }

    async fn run_pipeline(
        &self,
        raw_record: &Value,
        options: &ProcessingOptions,
    ) -> Result<PipelineOutcome> {
        let normalized = normalize_form_data(raw_record);

        // Language detection over the normalized record
        let original_languages = detect_languages(&normalized);
        let text_fields = text_fields_for_translation(&normalized);
        let detected_language = aggregate_language(&text_fields);
        let sinhala_count = text_fields
            .iter()
            .filter(|f| f.language == Language::Si)
            .count();
        debug!(
            "Detected {} text fields ({} Sinhala), overall language {:?}",
            text_fields.len(),
            sinhala_count,
            detected_language
        );

        // Translation, skipped when disabled or nothing to do. A failing
        // translation stage degrades to the original record rather than
        // aborting the pipeline.
        let mut record = normalized.clone();
        let mut translations = Vec::new();
        if options.enable_translation && sinhala_count > 0 {
            match self
                .translation
                .translate_form_data(&normalized, &text_fields)
                .await
            {
                Ok((translated, records)) => {
                    record = translated;
                    translations = records;
                }
                Err(e) => {
                    warn!("Translation failed, proceeding with original data: {}", e);
                }
            }
        }
        let translation_applied = !translations.is_empty();

        // Structural conversion
        let conversion = ConversionOptions {
            include_metadata: options.include_metadata,
            strict_enums: options.strict_enums,
        };
        let mut data = convert_to_structured_json(&record, &conversion)?;

        // Stamp processing facts onto the converted metadata block
        if let Some(metadata) = data.metadata.as_mut() {
            metadata.language = detected_language;
            metadata.translation_applied = translation_applied;
        }

        Ok(PipelineOutcome {
            completion_rate: completion_rate(&record),
            data,
            translations,
            original_languages,
            detected_language,
            translation_applied,
        })
    }

    /// Process and submit in one call. Backend failure is captured beside
    /// the intact processing result; it is not retried and not fatal.
    pub async fn process_and_submit(
        &self,
        raw_record: &Value,
        options: &ProcessingOptions,
    ) -> SubmissionOutcome {
        let processing = self.process_form_data(raw_record, options).await;

        let Some(data) = processing.data.clone() else {
            return SubmissionOutcome {
                processing,
                ai_prompt: None,
                backend_response: None,
                backend_error: None,
            };
        };

        let ai_prompt = convert::generate_ai_prompt(&data);
        debug!("Generated AI prompt ({} chars)", ai_prompt.len());

        let payload = to_backend_payload(&data);
        let (backend_response, backend_error) = match self.api.submit_form(&payload).await {
            Ok(response) => (Some(response), None),
            Err(e) => {
                warn!("Backend submission failed: {}", e);
                (None, Some(e.to_string()))
            }
        };

        SubmissionOutcome {
            processing,
            ai_prompt: Some(ai_prompt),
            backend_response,
            backend_error,
        }
    }

    /// Synchronous pre-submission guard over the fixed required-field list.
    pub fn validate_form_data(&self, raw_record: &Value) -> ValidationReport {
        validate_form_data(raw_record)
    }

    pub fn generate_ai_prompt(&self, data: &ProcessedFormData) -> String {
        convert::generate_ai_prompt(data)
    }

    pub fn export_as_json(
        &self,
        data: &ProcessedFormData,
        filename: Option<&str>,
    ) -> Result<JsonExport> {
        convert::export_as_json(data, filename)
    }

    pub fn api(&self) -> &ApiService {
        &self.api
    }
}

struct PipelineOutcome {
    data: ProcessedFormData,
    translations: Vec<TranslationRecord>,
    original_languages: LanguageMap,
    detected_language: DetectedLanguage,
    translation_applied: bool,
    completion_rate: u8,
}

/// Re-key a raw step-keyed record onto the section names the converter
/// expects. Missing steps become empty sections.
pub fn normalize_form_data(raw_record: &Value) -> Value {
    let mut sections = Map::new();
    for (step_key, section_key) in STEP_SECTIONS {
        let section = raw_record
            .get(*step_key)
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()));
        sections.insert((*section_key).to_string(), section);
    }
    Value::Object(sections)
}

/// Standalone validation guard; checks the same 7 probes the completion
/// rate is computed from, without touching the async pipeline.
pub fn validate_form_data(raw_record: &Value) -> ValidationReport {
    let normalized = normalize_form_data(raw_record);

    let missing_fields: Vec<String> = REQUIRED_PROBES
        .iter()
        .filter(|path| !convert::probe_populated(&normalized, path))
        .map(|path| path.to_string())
        .collect();

    ValidationReport {
        is_valid: missing_fields.is_empty(),
        completion_rate: completion_rate(&normalized),
        missing_fields,
    }
}

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::contains_sinhala;
    use serde_json::json;

    fn test_config() -> Config {
        let mut config = Config::default();
        config.translate.dictionary_delay_ms = 0;
        config
    }

    fn processor() -> FormProcessor {
        FormProcessor::new(&test_config())
    }

    fn raw_record() -> Value {
        json!({
            "businessprofile": {
                "businessType": "Restaurant",
                "industry": "Food & Beverage",
                "businessSize": "solo",
                "location": {"city": "Colombo", "district": "Western"},
                "businessStage": "new",
                "productsServices": "අපි ආහාර සේවය කරමු"
            },
            "targetaudience": {
                "demographics": {"ageRange": "25-34"}
            },
            "businessgoals": {"primaryGoal": "brand-awareness"},
            "budgetresources": {"monthlyBudget": "Rs. 50,000"},
            "platformspreferences": {"preferredPlatforms": ["facebook"]}
        })
    }

    #[test]
    fn test_normalize_form_data_rekeys_steps() {
        let normalized = normalize_form_data(&raw_record());
        assert_eq!(normalized["businessProfile"]["businessType"], json!("Restaurant"));
        assert_eq!(normalized["targetAudience"]["demographics"]["ageRange"], json!("25-34"));
        // Absent steps become empty sections
        assert_eq!(normalized["marketSituation"], json!({}));
    }

    #[test]
    fn test_validate_empty_record() {
        let report = validate_form_data(&json!({}));
        assert!(!report.is_valid);
        assert_eq!(report.missing_fields.len(), 7);
        assert_eq!(report.completion_rate, 0);
    }

    #[test]
    fn test_validate_complete_record() {
        let report = validate_form_data(&raw_record());
        assert!(report.is_valid);
        assert!(report.missing_fields.is_empty());
        assert_eq!(report.completion_rate, 100);
    }

    #[test]
    fn test_validate_reports_missing_paths() {
        let record = json!({
            "businessprofile": {"businessType": "Cafe"}
        });
        let report = validate_form_data(&record);
        assert!(!report.is_valid);
        assert!(report
            .missing_fields
            .contains(&"businessGoals.primaryGoal".to_string()));
        assert!(!report
            .missing_fields
            .contains(&"businessProfile.businessType".to_string()));
    }

    #[tokio::test]
    async fn test_process_sinhala_record_end_to_end() {
        let result = processor()
            .process_form_data(&raw_record(), &ProcessingOptions::default())
            .await;

        assert!(result.success);
        assert_eq!(result.processing_metadata.detected_language, DetectedLanguage::Mixed);
        assert!(result.processing_metadata.translation_applied);
        assert!(result.processing_metadata.translated_fields_count > 0);
        assert_eq!(result.processing_metadata.completion_rate, 100);

        let data = result.data.unwrap();
        assert!(!contains_sinhala(&data.business_profile.products_services));
        assert_eq!(data.business_profile.business_size, "Solo Entrepreneur");

        let metadata = data.metadata.unwrap();
        assert_eq!(metadata.language, DetectedLanguage::Mixed);
        assert!(metadata.translation_applied);
    }

    #[tokio::test]
    async fn test_process_pure_sinhala_detection() {
        let record = json!({
            "businessprofile": {"productsServices": "අපි ආහාර සේවය කරමු"}
        });
        let result = processor()
            .process_form_data(&record, &ProcessingOptions::default())
            .await;

        assert!(result.success);
        assert_eq!(result.processing_metadata.detected_language, DetectedLanguage::Si);
        assert!(result.processing_metadata.translation_applied);
        let data = result.data.unwrap();
        assert!(!contains_sinhala(&data.business_profile.products_services));
    }

    #[tokio::test]
    async fn test_translation_disabled_keeps_original_text() {
        let options = ProcessingOptions {
            enable_translation: false,
            ..ProcessingOptions::default()
        };
        let result = processor().process_form_data(&raw_record(), &options).await;

        assert!(result.success);
        assert!(!result.processing_metadata.translation_applied);
        assert!(result.translations.is_empty());
        let data = result.data.unwrap();
        assert!(contains_sinhala(&data.business_profile.products_services));
    }

    #[tokio::test]
    async fn test_conversion_error_becomes_failure_result() {
        let mut record = raw_record();
        record["businessprofile"]["businessSize"] = json!("family-run");

        let options = ProcessingOptions {
            strict_enums: true,
            ..ProcessingOptions::default()
        };
        let result = processor().process_form_data(&record, &options).await;

        assert!(!result.success);
        assert!(result.data.is_none());
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("businessSize"));
        assert_eq!(result.processing_metadata.completion_rate, 0);
        assert_eq!(result.processing_metadata.translated_fields_count, 0);
    }

    #[tokio::test]
    async fn test_english_record_skips_translation_entirely() {
        let record = json!({
            "businessprofile": {
                "businessType": "Bakery",
                "productsServices": "Fresh bread and pastries"
            }
        });
        let result = processor()
            .process_form_data(&record, &ProcessingOptions::default())
            .await;

        assert!(result.success);
        assert_eq!(result.processing_metadata.detected_language, DetectedLanguage::En);
        assert!(!result.processing_metadata.translation_applied);
        assert!(result.translations.is_empty());
    }

    #[tokio::test]
    async fn test_injected_failing_provider_falls_back() {
        use crate::error::ProcessorError;
        use crate::translate::Translator;
        use async_trait::async_trait;
        use std::sync::Arc;

        struct OfflineProvider;

        #[async_trait]
        impl Translator for OfflineProvider {
            fn name(&self) -> &str {
                "Offline"
            }

            async fn translate(&self, _text: &str, _from: &str, _to: &str) -> crate::error::Result<String> {
                Err(ProcessorError::Translation("connection refused".to_string()))
            }
        }

        let config = test_config();
        let translation = TranslationService::new(Arc::new(OfflineProvider), &config.translate);
        let processor = FormProcessor::with_translation_service(&config, translation);

        let result = processor
            .process_form_data(&raw_record(), &ProcessingOptions::default())
            .await;

        assert!(result.success);
        assert!(result.processing_metadata.translation_applied);
        assert!(result.translations.iter().all(|t| t.provider == "Offline (Fallback)"));
        let data = result.data.unwrap();
        assert!(!contains_sinhala(&data.business_profile.products_services));
    }

    #[tokio::test]
    async fn test_original_languages_map_paths() {
        let result = processor()
            .process_form_data(&raw_record(), &ProcessingOptions::default())
            .await;

        assert_eq!(
            result.original_languages.get("businessProfile.productsServices"),
            Some(&Language::Si)
        );
        assert_eq!(
            result.original_languages.get("businessProfile.businessType"),
            Some(&Language::En)
        );
    }
}
