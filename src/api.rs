//! HTTP client for the forms backend, strategy generator, and trend service.
//!
//! These are external collaborators; this module only speaks their
//! request/response shapes and maps transport problems onto ProcessorError.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::backend::BackendSubmissionPayload;
use crate::config::BackendConfig;
use crate::error::{ProcessorError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub database: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionResponse {
    pub id: String,
    pub message: String,
    pub status: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionListResponse {
    pub submissions: Vec<Value>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyMetadata {
    pub generation_time_ms: u64,
    pub llm_provider: String,
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyGenerationResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<StrategyMetadata>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendReport {
    #[serde(default)]
    pub signals: Vec<Value>,
    #[serde(default)]
    pub metadata: Option<Value>,
}

impl TrendReport {
    /// Empty-signal stand-in used by callers when the trend service is
    /// unreachable.
    pub fn empty() -> Self {
        Self {
            signals: Vec::new(),
            metadata: Some(json!({
                "note": "Trend service not available, using empty signals"
            })),
        }
    }
}

pub struct ApiService {
    client: Client,
    base_url: String,
    strategy_url: String,
    trend_url: String,
}

impl ApiService {
    pub fn new(config: &BackendConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .expect("HTTP client creation should not fail");

        Self {
            client,
            base_url: config.base_url.clone(),
            strategy_url: config.strategy_url.clone(),
            trend_url: config.trend_url.clone(),
        }
    }

    pub async fn health(&self) -> Result<HealthResponse> {
        let url = format!("{}/health", self.base_url);
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(ProcessorError::Backend(format!(
                "Health check failed: {}",
                response.status()
            )));
        }

        Ok(response.json().await?)
    }

    pub async fn submit_form(&self, payload: &BackendSubmissionPayload) -> Result<SubmissionResponse> {
        let url = format!("{}/api/v1/forms/submit", self.base_url);
        debug!("Submitting form data to {}", url);

        let response = self.client.post(&url).json(payload).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ProcessorError::Backend(format!(
                "Form submission failed ({}): {}",
                status, error_text
            )));
        }

        let result: SubmissionResponse = response.json().await?;
        info!("Form submitted successfully: {}", result.id);
        Ok(result)
    }

    pub async fn get_submissions(&self, page: u32, limit: u32) -> Result<SubmissionListResponse> {
        let url = format!(
            "{}/api/v1/forms/submissions?page={}&limit={}",
            self.base_url, page, limit
        );
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(ProcessorError::Backend(format!(
                "Failed to fetch submissions: {}",
                response.status()
            )));
        }

        Ok(response.json().await?)
    }

    pub async fn get_submission(&self, id: &str) -> Result<Value> {
        let url = format!("{}/api/v1/forms/submissions/{}", self.base_url, id);
        let response = self.client.get(&url).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ProcessorError::Backend("Submission not found".to_string()));
        }
        if !response.status().is_success() {
            return Err(ProcessorError::Backend(format!(
                "Failed to fetch submission: {}",
                response.status()
            )));
        }

        Ok(response.json().await?)
    }

    pub async fn get_stats(&self) -> Result<Value> {
        let url = format!("{}/api/v1/forms/stats", self.base_url);
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(ProcessorError::Backend(format!(
                "Failed to fetch stats: {}",
                response.status()
            )));
        }

        Ok(response.json().await?)
    }

    pub async fn update_submission_status(&self, id: &str, status: &str) -> Result<Value> {
        let url = format!("{}/api/v1/forms/submissions/{}/status", self.base_url, id);
        let response = self
            .client
            .put(&url)
            .json(&json!({ "status": status }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProcessorError::Backend(format!(
                "Failed to update submission status: {}",
                response.status()
            )));
        }

        Ok(response.json().await?)
    }

    pub async fn delete_submission(&self, id: &str) -> Result<Value> {
        let url = format!("{}/api/v1/forms/submissions/{}", self.base_url, id);
        let response = self.client.delete(&url).send().await?;

        if !response.status().is_success() {
            return Err(ProcessorError::Backend(format!(
                "Failed to delete submission: {}",
                response.status()
            )));
        }

        Ok(response.json().await?)
    }

    pub async fn generate_strategy(
        &self,
        sme_profile: &Value,
        trend_data: &TrendReport,
    ) -> Result<StrategyGenerationResponse> {
        let url = format!("{}/strategy/generate", self.strategy_url);
        let body = json!({
            "sme_profile": sme_profile,
            "trend_data": trend_data,
        });

        let response = self.client.post(&url).json(&body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ProcessorError::Backend(format!(
                "Strategy generation failed ({}): {}",
                status, error_text
            )));
        }

        Ok(response.json().await?)
    }

    pub async fn strategy_health(&self) -> Result<HealthResponse> {
        let url = format!("{}/health", self.strategy_url);
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(ProcessorError::Backend(format!(
                "Strategy generator health check failed: {}",
                response.status()
            )));
        }

        Ok(response.json().await?)
    }

    pub async fn get_trends(&self) -> Result<TrendReport> {
        let url = format!("{}/trends", self.trend_url);
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(ProcessorError::Backend(format!(
                "Failed to fetch trends: {}",
                response.status()
            )));
        }

        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_trend_report_shape() {
        let report = TrendReport::empty();
        assert!(report.signals.is_empty());
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["signals"], json!([]));
    }

    #[test]
    fn test_strategy_response_tolerates_missing_fields() {
        let parsed: StrategyGenerationResponse =
            serde_json::from_str(r#"{"success": false, "error": "model offline"}"#).unwrap();
        assert!(!parsed.success);
        assert_eq!(parsed.error.as_deref(), Some("model offline"));
        assert!(parsed.strategy.is_none());
        assert!(parsed.metadata.is_none());
    }
}
