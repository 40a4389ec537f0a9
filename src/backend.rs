//! Mapping of processed profiles into the forms backend's submission schema.
//!
//! The backend speaks a different vocabulary for every enum field; misses
//! land on fixed defaults rather than passing through, so the payload always
//! validates at the boundary.

use serde::{Deserialize, Serialize};

use crate::convert::{flatten_seasonality, ProcessedFormData};
use crate::language::DetectedLanguage;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendSubmissionPayload {
    pub business_profile: BackendBusinessProfile,
    pub budget_resources: BackendBudgetResources,
    pub business_goals: BackendBusinessGoals,
    pub target_audience: BackendTargetAudience,
    pub platforms_preferences: BackendPlatformsPreferences,
    pub current_challenges: BackendCurrentChallenges,
    pub strengths_opportunities: BackendStrengthsOpportunities,
    pub market_situation: BackendMarketSituation,
    pub form_language: DetectedLanguage,
    pub submission_source: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendBusinessProfile {
    pub business_name: String,
    pub business_type: String,
    pub business_size: String,
    pub business_stage: String,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub years_in_business: Option<u32>,
    pub unique_selling_proposition: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendBudgetResources {
    pub monthly_marketing_budget: Option<f64>,
    pub budget_currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_size: Option<u32>,
    pub has_marketing_experience: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_support_budget: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendBusinessGoals {
    pub primary_marketing_goal: String,
    pub secondary_marketing_goals: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specific_objectives: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_metrics: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendTargetAudience {
    pub age_range: String,
    pub gender: String,
    pub location_demographics: String,
    pub interests: String,
    pub buying_behavior: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pain_points: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendPlatformsPreferences {
    pub preferred_platforms: Vec<String>,
    pub current_online_presence: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website_url: Option<String>,
    pub has_brand_assets: bool,
    pub brand_guidelines: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendCurrentChallenges {
    pub main_challenges: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specific_obstacles: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_marketing_efforts: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub what_didnt_work: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendStrengthsOpportunities {
    pub business_strengths: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub competitive_advantages: Option<String>,
    pub market_opportunities: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub growth_areas: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendMarketSituation {
    pub seasonal_factors: String,
    pub competition_level: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_trends: Option<String>,
    pub pricing_strategy: String,
}

/// Map a processed profile into the backend submission schema.
pub fn to_backend_payload(data: &ProcessedFormData) -> BackendSubmissionPayload {
    let profile = &data.business_profile;
    let budget = &data.marketing_budget;
    let market = &data.target_market;
    let presence = &data.digital_presence;
    let situation = &data.market_situation;

    let business_name = if profile.business_type.is_empty() {
        "Unknown Business".to_string()
    } else {
        profile.business_type.clone()
    };

    BackendSubmissionPayload {
        business_profile: BackendBusinessProfile {
            business_name,
            business_type: profile.business_type.clone(),
            business_size: map_business_size(&profile.business_size).to_string(),
            business_stage: map_business_stage(&profile.business_stage).to_string(),
            // Rendered even when one side is empty; the backend tolerates
            // the dangling comma
            location: format!("{}, {}", profile.location.city, profile.location.district),
            years_in_business: None,
            unique_selling_proposition: profile.unique_selling_proposition.clone(),
        },
        budget_resources: BackendBudgetResources {
            monthly_marketing_budget: parse_budget(&budget.monthly_budget),
            budget_currency: "LKR".to_string(),
            team_size: budget.team_size,
            has_marketing_experience: budget.has_marketing_team,
            external_support_budget: None,
        },
        business_goals: BackendBusinessGoals {
            primary_marketing_goal: map_marketing_goal(&data.business_goals.primary_goal).to_string(),
            secondary_marketing_goals: data
                .business_goals
                .secondary_goals
                .iter()
                .map(|goal| map_marketing_goal(goal).to_string())
                .collect(),
            specific_objectives: None,
            success_metrics: None,
        },
        target_audience: BackendTargetAudience {
            age_range: market.demographics.age_range.clone(),
            gender: market.demographics.gender.join(", "),
            location_demographics: market.location.clone(),
            interests: market.interests.join(", "),
            buying_behavior: market.buying_frequency.clone(),
            pain_points: None,
        },
        platforms_preferences: BackendPlatformsPreferences {
            preferred_platforms: presence
                .preferred_platforms
                .iter()
                .map(|platform| map_social_platform(platform))
                .collect(),
            current_online_presence: presence
                .platform_experience
                .keys()
                .cloned()
                .collect::<Vec<_>>()
                .join(", "),
            website_url: None,
            has_brand_assets: presence.brand_assets.has_logo,
            brand_guidelines: if presence.brand_assets.has_brand_style {
                "Available".to_string()
            } else {
                "Not available".to_string()
            },
        },
        current_challenges: BackendCurrentChallenges {
            main_challenges: data
                .challenges
                .current_challenges
                .iter()
                .map(|challenge| map_challenge(challenge).to_string())
                .collect(),
            specific_obstacles: data.challenges.additional_challenges.clone(),
            previous_marketing_efforts: None,
            what_didnt_work: None,
        },
        strengths_opportunities: BackendStrengthsOpportunities {
            business_strengths: data.opportunities.strengths.join(", "),
            competitive_advantages: None,
            market_opportunities: data.opportunities.opportunities.join(", "),
            growth_areas: data.opportunities.additional_notes.clone(),
        },
        market_situation: BackendMarketSituation {
            seasonal_factors: flatten_seasonality(&situation.seasonality),
            competition_level: situation.competitor_behavior.clone(),
            market_trends: None,
            pricing_strategy: if situation.pricing_changes.has_recent_changes {
                format!(
                    "Recent changes: {}",
                    situation.pricing_changes.details.as_deref().unwrap_or("")
                )
            } else {
                "Stable pricing".to_string()
            },
        },
        form_language: data
            .metadata
            .as_ref()
            .map(|m| m.language)
            .unwrap_or(DetectedLanguage::En),
        submission_source: "web_form".to_string(),
    }
}

/// Best-effort extraction of the first numeric token from a free-text budget
/// range. Grouping commas are dropped before scanning; no digits means None.
pub fn parse_budget(budget: &str) -> Option<f64> {
    let cleaned = budget.replace(',', "");
    let bytes = cleaned.as_bytes();

    let start = bytes.iter().position(|b| b.is_ascii_digit())?;
    let mut end = start;
    while end < bytes.len() && (bytes[end].is_ascii_digit() || bytes[end] == b'.') {
        end += 1;
    }

    cleaned[start..end].parse().ok()
}

// Backend enum vocabularies with fixed defaults on miss.

fn map_business_size(size: &str) -> &'static str {
    match size {
        "Solo Entrepreneur" => "micro",
        "Small Team (2-10 employees)" => "small",
        "Medium Business (11-50 employees)" => "medium",
        // The backend has no "large" bucket; medium is its ceiling
        "Large Business (50+ employees)" => "medium",
        _ => "small",
    }
}

fn map_business_stage(stage: &str) -> &'static str {
    match stage {
        "New Business (0-1 years)" => "startup",
        "Growing Business (1-5 years)" => "growing",
        "Established Business (5+ years)" => "established",
        _ => "growing",
    }
}

fn map_marketing_goal(goal: &str) -> &'static str {
    match goal {
        "Brand Awareness" => "increase_brand_awareness",
        "Lead Generation" => "generate_leads",
        "Direct Sales" => "boost_sales",
        "Customer Retention" => "customer_retention",
        "Local Store Visits" => "market_expansion",
        "Website Traffic" => "improve_customer_engagement",
        _ => "increase_brand_awareness",
    }
}

fn map_social_platform(platform: &str) -> String {
    platform.to_lowercase()
}

fn map_challenge(challenge: &str) -> &'static str {
    match challenge {
        "Limited budget" => "limited_budget",
        "Lack of marketing expertise" => "lack_of_expertise",
        "Time constraints" => "time_constraints",
        "Measuring ROI" => "measuring_roi",
        "Content creation" => "content_creation",
        "Reaching target audience" => "reaching_target_audience",
        _ => "limited_budget",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::{convert_to_structured_json, ConversionOptions};
    use serde_json::json;

    fn processed() -> ProcessedFormData {
        let record = json!({
            "businessProfile": {
                "businessType": "Restaurant",
                "businessSize": "solo",
                "businessStage": "new",
                "location": {"city": "Colombo", "district": ""}
            },
            "businessGoals": {
                "primaryGoal": "brand-awareness",
                "secondaryGoals": ["leads", "something-unmapped"]
            },
            "budgetResources": {
                "monthlyBudget": "$1,000 - $2,500/month",
                "hasMarketingTeam": true,
                "teamSize": 2
            },
            "platformsPreferences": {
                "preferredPlatforms": ["Facebook", "TikTok"],
                "brandAssets": {"hasLogo": true, "hasBrandStyle": false}
            },
            "currentChallenges": {
                "challenges": ["Limited budget", "Unlisted challenge"]
            },
            "marketSituation": {
                "seasonality": [
                    {"category": "Festive", "subcategories": ["Christmas"]},
                    {"category": "Harvest", "subcategories": ["April", "May"]}
                ],
                "recentPriceChanges": true,
                "priceChangeDetails": "Raised 5%"
            }
        });
        convert_to_structured_json(&record, &ConversionOptions::default()).unwrap()
    }

    #[test]
    fn test_parse_budget() {
        assert_eq!(parse_budget("$1,000 - $2,500/month"), Some(1000.0));
        assert_eq!(parse_budget("Rs. 25000"), Some(25000.0));
        assert_eq!(parse_budget("12.5k"), Some(12.5));
        assert_eq!(parse_budget(""), None);
        assert_eq!(parse_budget("no digits here"), None);
    }

    #[test]
    fn test_enum_vocabulary_mapping() {
        let payload = to_backend_payload(&processed());
        assert_eq!(payload.business_profile.business_size, "micro");
        assert_eq!(payload.business_profile.business_stage, "startup");
        assert_eq!(payload.business_goals.primary_marketing_goal, "increase_brand_awareness");
        assert_eq!(
            payload.business_goals.secondary_marketing_goals,
            vec!["generate_leads", "increase_brand_awareness"]
        );
        assert_eq!(payload.platforms_preferences.preferred_platforms, vec!["facebook", "tiktok"]);
        assert_eq!(
            payload.current_challenges.main_challenges,
            vec!["limited_budget", "limited_budget"]
        );
    }

    #[test]
    fn test_defaults_on_unmapped_enums() {
        let mut data = processed();
        data.business_profile.business_size = "family-run".to_string();
        data.business_profile.business_stage = "winding-down".to_string();
        let payload = to_backend_payload(&data);
        assert_eq!(payload.business_profile.business_size, "small");
        assert_eq!(payload.business_profile.business_stage, "growing");
    }

    #[test]
    fn test_location_keeps_dangling_comma() {
        let payload = to_backend_payload(&processed());
        assert_eq!(payload.business_profile.location, "Colombo, ");
    }

    #[test]
    fn test_seasonality_flattened() {
        let payload = to_backend_payload(&processed());
        assert_eq!(
            payload.market_situation.seasonal_factors,
            "Festive: Christmas; Harvest: April, May"
        );
        assert_eq!(payload.market_situation.pricing_strategy, "Recent changes: Raised 5%");
    }

    #[test]
    fn test_budget_and_flags() {
        let payload = to_backend_payload(&processed());
        assert_eq!(payload.budget_resources.monthly_marketing_budget, Some(1000.0));
        assert_eq!(payload.budget_resources.budget_currency, "LKR");
        assert!(payload.budget_resources.has_marketing_experience);
        assert!(payload.platforms_preferences.has_brand_assets);
        assert_eq!(payload.platforms_preferences.brand_guidelines, "Not available");
        assert_eq!(payload.submission_source, "web_form");
    }
}
