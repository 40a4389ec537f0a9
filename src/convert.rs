//! Conversion of normalized form records into the structured profile shape.
//!
//! Enum-valued fields go through fixed translation tables; unmapped values
//! pass through unchanged unless strict mode is on. The completion rate is
//! derived from a fixed 7-probe required-field list shared with validation.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::error::{ProcessorError, Result};
use crate::jsonpath;
use crate::language::DetectedLanguage;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedFormData {
    pub business_profile: BusinessProfile,
    pub target_market: TargetMarket,
    pub business_goals: BusinessGoals,
    pub marketing_budget: MarketingBudget,
    pub digital_presence: DigitalPresence,
    pub challenges: Challenges,
    pub opportunities: Opportunities,
    pub market_situation: MarketSituation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ProcessedMetadata>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessProfile {
    pub business_type: String,
    pub industry: String,
    pub business_size: String,
    pub location: Location,
    pub business_stage: String,
    pub products_services: String,
    pub unique_selling_proposition: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub city: String,
    pub district: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetMarket {
    pub demographics: Demographics,
    pub location: String,
    pub interests: Vec<String>,
    pub buying_frequency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Demographics {
    pub age_range: String,
    pub gender: Vec<String>,
    pub income_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessGoals {
    pub primary_goal: String,
    pub secondary_goals: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketingBudget {
    pub monthly_budget: String,
    pub has_marketing_team: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_size: Option<u32>,
    pub content_creation_capacity: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DigitalPresence {
    pub preferred_platforms: Vec<String>,
    pub platform_experience: BTreeMap<String, String>,
    pub brand_assets: BrandAssets,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandAssets {
    pub has_logo: bool,
    pub has_brand_style: bool,
    pub brand_colors: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Challenges {
    pub current_challenges: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_challenges: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Opportunities {
    pub strengths: Vec<String>,
    pub opportunities: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSituation {
    pub seasonality: Vec<SeasonalityEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seasonality_other: Option<String>,
    pub competitor_behavior: String,
    pub stock_availability: String,
    pub pricing_changes: PricingChanges,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeasonalityEntry {
    pub category: String,
    pub factors: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingChanges {
    pub has_recent_changes: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedMetadata {
    pub submission_date: String,
    pub language: DetectedLanguage,
    pub translation_applied: bool,
    pub completion_rate: u8,
}

#[derive(Debug, Clone)]
pub struct ConversionOptions {
    pub include_metadata: bool,
    /// Treat an unmapped, non-empty enum value as an error instead of
    /// passing it through unchanged.
    pub strict_enums: bool,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            include_metadata: true,
            strict_enums: false,
        }
    }
}

/// Fixed required-field probe list behind both the completion rate and the
/// pre-submission validation guard. Paths address the normalized record.
pub const REQUIRED_PROBES: &[&str] = &[
    "businessProfile.businessType",
    "businessProfile.industry",
    "businessProfile.businessSize",
    "targetAudience.demographics.ageRange",
    "businessGoals.primaryGoal",
    "budgetResources.monthlyBudget",
    "platformsPreferences.preferredPlatforms",
];

/// Convert a normalized form record into the structured profile shape.
pub fn convert_to_structured_json(
    record: &Value,
    options: &ConversionOptions,
) -> Result<ProcessedFormData> {
    let strict = options.strict_enums;

    let profile = &record["businessProfile"];
    let business_profile = BusinessProfile {
        business_type: text(profile, &["businessType"]),
        industry: text(profile, &["industry"]),
        business_size: map_enum(
            &text(profile, &["businessSize"]),
            map_business_size,
            "businessSize",
            strict,
        )?,
        location: Location {
            city: text(profile, &["location", "city"]),
            district: text(profile, &["location", "district"]),
        },
        business_stage: map_enum(
            &text(profile, &["businessStage"]),
            map_business_stage,
            "businessStage",
            strict,
        )?,
        products_services: text(profile, &["productsServices"]),
        unique_selling_proposition: text(profile, &["uniqueSellingProposition"]),
    };

    let audience = &record["targetAudience"];
    let target_market = TargetMarket {
        demographics: Demographics {
            age_range: text(audience, &["demographics", "ageRange"]),
            gender: string_list(audience, &["demographics", "gender"]),
            income_level: text(audience, &["demographics", "incomeLevel"]),
        },
        location: text(audience, &["location"]),
        interests: string_list(audience, &["interests"]),
        buying_frequency: map_enum(
            &text(audience, &["buyingFrequency"]),
            map_buying_frequency,
            "buyingFrequency",
            strict,
        )?,
    };

    let goals = &record["businessGoals"];
    let business_goals = BusinessGoals {
        primary_goal: map_enum(
            &text(goals, &["primaryGoal"]),
            map_primary_goal,
            "primaryGoal",
            strict,
        )?,
        secondary_goals: string_list(goals, &["secondaryGoals"]),
    };

    let budget = &record["budgetResources"];
    let marketing_budget = MarketingBudget {
        monthly_budget: text(budget, &["monthlyBudget"]),
        has_marketing_team: flag(budget, &["hasMarketingTeam"]),
        team_size: number(budget, &["teamSize"]),
        content_creation_capacity: string_list(budget, &["contentCreationCapacity"]),
    };

    let platforms = &record["platformsPreferences"];
    let digital_presence = DigitalPresence {
        preferred_platforms: string_list(platforms, &["preferredPlatforms"]),
        platform_experience: string_map(platforms, &["platformExperience"]),
        brand_assets: BrandAssets {
            has_logo: flag(platforms, &["brandAssets", "hasLogo"]),
            has_brand_style: flag(platforms, &["brandAssets", "hasBrandStyle"]),
            brand_colors: string_list(platforms, &["brandAssets", "brandColors"]),
        },
    };

    let current = &record["currentChallenges"];
    let challenges = Challenges {
        current_challenges: string_list(current, &["challenges"]),
        additional_challenges: opt_text(current, &["additionalChallenges"]),
    };

    let strengths = &record["strengthsOpportunities"];
    let opportunities = Opportunities {
        strengths: string_list(strengths, &["strengths"]),
        opportunities: string_list(strengths, &["opportunities"]),
        additional_notes: opt_text(strengths, &["additionalNotes"]),
    };

    let situation = &record["marketSituation"];
    let market_situation = MarketSituation {
        seasonality: seasonality_entries(situation),
        seasonality_other: opt_text(situation, &["seasonalityOther"]),
        competitor_behavior: text(situation, &["competitorBehavior"]),
        stock_availability: map_enum(
            &text(situation, &["stockAvailability"]),
            map_stock_availability,
            "stockAvailability",
            strict,
        )?,
        pricing_changes: PricingChanges {
            has_recent_changes: flag(situation, &["recentPriceChanges"]),
            details: opt_text(situation, &["priceChangeDetails"]),
        },
    };

    let metadata = options.include_metadata.then(|| ProcessedMetadata {
        submission_date: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        language: DetectedLanguage::En,
        translation_applied: false,
        completion_rate: completion_rate(record),
    });

    Ok(ProcessedFormData {
        business_profile,
        target_market,
        business_goals,
        marketing_budget,
        digital_presence,
        challenges,
        opportunities,
        market_situation,
        metadata,
    })
}

/// Percentage of the fixed required-field probes holding non-empty values.
pub fn completion_rate(record: &Value) -> u8 {
    let populated = REQUIRED_PROBES
        .iter()
        .filter(|path| probe_populated(record, path))
        .count();

    ((populated as f64 / REQUIRED_PROBES.len() as f64) * 100.0).round() as u8
}

pub fn probe_populated(record: &Value, path: &str) -> bool {
    match jsonpath::get_value(record, path) {
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Number(_)) => true,
        Some(Value::Bool(b)) => *b,
        _ => false,
    }
}

/// Recursively strip empty members from an output tree. Objects drop members
/// whose cleaned value is null, an empty string, an empty array, or an empty
/// object; arrays drop null/empty-string entries at the top level only.
/// Children are cleaned before their parent is judged, so re-running on the
/// output is a no-op.
pub fn remove_empty_fields(value: &Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(
            items
                .iter()
                .filter(|item| !matches!(item, Value::Null) && !is_empty_string(item))
                .cloned()
                .collect(),
        ),
        Value::Object(map) => {
            let mut cleaned = Map::new();
            for (key, child) in map {
                let cleaned_child = remove_empty_fields(child);
                if !is_empty_value(&cleaned_child) {
                    cleaned.insert(key.clone(), cleaned_child);
                }
            }
            Value::Object(cleaned)
        }
        other => other.clone(),
    }
}

/// Build the human/LLM-readable prompt summary. Always produces all six
/// sections; absent fields are rendered as "Not specified"/"None".
pub fn generate_ai_prompt(data: &ProcessedFormData) -> String {
    let mut sections = Vec::with_capacity(6);

    let profile = &data.business_profile;
    sections.push(format!(
        "Business Overview:\n\
         - Type: {}\n\
         - Industry: {}\n\
         - Size: {}\n\
         - Stage: {}\n\
         - Location: {}, {}\n\
         - Products/Services: {}\n\
         - USP: {}",
        or_not_specified(&profile.business_type),
        or_not_specified(&profile.industry),
        or_not_specified(&profile.business_size),
        or_not_specified(&profile.business_stage),
        or_not_specified(&profile.location.city),
        or_not_specified(&profile.location.district),
        or_not_specified(&profile.products_services),
        or_not_specified(&profile.unique_selling_proposition),
    ));

    let market = &data.target_market;
    sections.push(format!(
        "Target Market:\n\
         - Demographics: {}, {}, {}\n\
         - Location: {}\n\
         - Interests: {}\n\
         - Buying Frequency: {}",
        or_not_specified(&market.demographics.age_range),
        market.demographics.gender.join(", "),
        or_not_specified(&market.demographics.income_level),
        or_not_specified(&market.location),
        join_or(&market.interests, "Not specified"),
        or_not_specified(&market.buying_frequency),
    ));

    let budget = &data.marketing_budget;
    let team = if budget.has_marketing_team {
        match budget.team_size {
            Some(size) => format!("Yes ({})", size),
            None => "Yes (size not specified)".to_string(),
        }
    } else {
        "No".to_string()
    };
    sections.push(format!(
        "Marketing Goals & Budget:\n\
         - Primary Goal: {}\n\
         - Secondary Goals: {}\n\
         - Monthly Budget: {}\n\
         - Team: {}",
        or_not_specified(&data.business_goals.primary_goal),
        join_or(&data.business_goals.secondary_goals, "None"),
        or_not_specified(&budget.monthly_budget),
        team,
    ));

    let presence = &data.digital_presence;
    sections.push(format!(
        "Digital Presence:\n\
         - Preferred Platforms: {}\n\
         - Brand Assets: {}, {}",
        join_or(&presence.preferred_platforms, "None selected"),
        if presence.brand_assets.has_logo { "Has Logo" } else { "No Logo" },
        if presence.brand_assets.has_brand_style { "Has Brand Style" } else { "No Brand Style" },
    ));

    sections.push(format!(
        "Current Situation:\n\
         - Challenges: {}\n\
         - Strengths: {}\n\
         - Opportunities: {}",
        join_or(&data.challenges.current_challenges, "None specified"),
        join_or(&data.opportunities.strengths, "None specified"),
        join_or(&data.opportunities.opportunities, "None specified"),
    ));

    let situation = &data.market_situation;
    sections.push(format!(
        "Market Context:\n\
         - Seasonality: {}\n\
         - Competitor Behavior: {}\n\
         - Stock Availability: {}\n\
         - Recent Price Changes: {}",
        or_not_specified(&flatten_seasonality(&situation.seasonality)),
        or_not_specified(&situation.competitor_behavior),
        or_not_specified(&situation.stock_availability),
        if situation.pricing_changes.has_recent_changes { "Yes" } else { "No" },
    ));

    sections.join("\n\n")
}

/// Join seasonality entries as `"Category: factor1, factor2; …"`.
pub fn flatten_seasonality(entries: &[SeasonalityEntry]) -> String {
    entries
        .iter()
        .map(|entry| format!("{}: {}", entry.category, entry.factors.join(", ")))
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonExport {
    pub json: String,
    pub filename: String,
}

/// Wrap processed data in a downloadable export envelope.
pub fn export_as_json(data: &ProcessedFormData, filename: Option<&str>) -> Result<JsonExport> {
    let envelope = serde_json::json!({
        "exportDate": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        "version": "1.0",
        "data": data,
    });

    let filename = match filename {
        Some(name) => name.to_string(),
        None => format!(
            "marketing-strategy-data-{}.json",
            Utc::now().timestamp_millis()
        ),
    };

    Ok(JsonExport {
        json: serde_json::to_string_pretty(&envelope)?,
        filename,
    })
}

// Enum translation tables. Misses return None and fall back to the
// pass-through policy (or an error in strict mode).

fn map_business_size(raw: &str) -> Option<&'static str> {
    match raw {
        "solo" => Some("Solo Entrepreneur"),
        "small-team" => Some("Small Team (2-10 employees)"),
        "medium" => Some("Medium Business (11-50 employees)"),
        "large" => Some("Large Business (50+ employees)"),
        _ => None,
    }
}

fn map_business_stage(raw: &str) -> Option<&'static str> {
    match raw {
        "new" => Some("New Business (0-1 years)"),
        "growing" => Some("Growing Business (1-5 years)"),
        "established" => Some("Established Business (5+ years)"),
        _ => None,
    }
}

fn map_buying_frequency(raw: &str) -> Option<&'static str> {
    match raw {
        "rare" => Some("Rarely (few times per year)"),
        "monthly" => Some("Monthly"),
        "weekly" => Some("Weekly"),
        "daily" => Some("Daily"),
        _ => None,
    }
}

fn map_primary_goal(raw: &str) -> Option<&'static str> {
    match raw {
        "brand-awareness" => Some("Brand Awareness"),
        "leads" => Some("Lead Generation"),
        "sales" => Some("Direct Sales"),
        "customer-retention" => Some("Customer Retention"),
        "local-visits" => Some("Local Store Visits"),
        "online-traffic" => Some("Website Traffic"),
        _ => None,
    }
}

fn map_stock_availability(raw: &str) -> Option<&'static str> {
    match raw {
        "always-available" => Some("Always Available"),
        "seasonal" => Some("Seasonal Availability"),
        "limited" => Some("Limited Stock"),
        "pre-order" => Some("Pre-order/Made-to-order"),
        _ => None,
    }
}

fn map_enum(
    raw: &str,
    table: fn(&str) -> Option<&'static str>,
    field: &str,
    strict: bool,
) -> Result<String> {
    if raw.is_empty() {
        return Ok(String::new());
    }
    match table(raw) {
        Some(mapped) => Ok(mapped.to_string()),
        None if strict => Err(ProcessorError::Conversion(format!(
            "Unmapped {} value: {}",
            field, raw
        ))),
        None => Ok(raw.to_string()),
    }
}

// Loose extraction helpers over the untyped record.

fn lookup<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    let mut current = value;
    for key in keys {
        current = current.get(key)?;
    }
    Some(current)
}

fn text(value: &Value, keys: &[&str]) -> String {
    lookup(value, keys)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn opt_text(value: &Value, keys: &[&str]) -> Option<String> {
    lookup(value, keys)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn flag(value: &Value, keys: &[&str]) -> bool {
    lookup(value, keys).and_then(Value::as_bool).unwrap_or(false)
}

fn number(value: &Value, keys: &[&str]) -> Option<u32> {
    lookup(value, keys).and_then(Value::as_u64).map(|n| n as u32)
}

fn string_list(value: &Value, keys: &[&str]) -> Vec<String> {
    lookup(value, keys)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn string_map(value: &Value, keys: &[&str]) -> BTreeMap<String, String> {
    lookup(value, keys)
        .and_then(Value::as_object)
        .map(|map| {
            map.iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect()
        })
        .unwrap_or_default()
}

fn seasonality_entries(situation: &Value) -> Vec<SeasonalityEntry> {
    situation
        .get("seasonality")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(|item| SeasonalityEntry {
                    category: text(item, &["category"]),
                    factors: string_list(item, &["subcategories"]),
                })
                .collect()
        })
        .unwrap_or_default()
}

fn or_not_specified(s: &str) -> &str {
    if s.is_empty() {
        "Not specified"
    } else {
        s
    }
}

fn join_or(list: &[String], fallback: &str) -> String {
    if list.is_empty() {
        fallback.to_string()
    } else {
        list.join(", ")
    }
}

fn is_empty_string(value: &Value) -> bool {
    matches!(value, Value::String(s) if s.is_empty())
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}
