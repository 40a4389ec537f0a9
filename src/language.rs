//! Sinhala/English language detection for form records.
//!
//! Detection is character-class based: Sinhala occupies the Unicode range
//! U+0D80-U+0DFF. A fragment counts as Sinhala when more than 10% of its
//! characters fall in that range.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::jsonpath::{join_index, join_key};

const SINHALA_RATIO_THRESHOLD: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "si")]
    Si,
    #[serde(rename = "en")]
    En,
}

/// Aggregate language of a whole record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetectedLanguage {
    #[serde(rename = "si")]
    Si,
    #[serde(rename = "en")]
    En,
    #[serde(rename = "mixed")]
    Mixed,
}

/// A single addressable string leaf extracted from a nested record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextField {
    pub path: String,
    pub text: String,
    pub language: Language,
}

/// Map from field path to detected language across an entire record.
pub type LanguageMap = BTreeMap<String, Language>;

pub fn is_sinhala_char(c: char) -> bool {
    ('\u{0D80}'..='\u{0DFF}').contains(&c)
}

pub fn contains_sinhala(text: &str) -> bool {
    text.chars().any(is_sinhala_char)
}

/// Classify a text fragment. Empty input defaults to English.
pub fn detect_language(text: &str) -> Language {
    let total = text.chars().count();
    if total == 0 {
        return Language::En;
    }

    let sinhala = text.chars().filter(|c| is_sinhala_char(*c)).count();
    if sinhala as f64 / total as f64 > SINHALA_RATIO_THRESHOLD {
        Language::Si
    } else {
        Language::En
    }
}

/// Classify every non-empty string leaf of a record, keyed by path.
pub fn detect_languages(record: &Value) -> LanguageMap {
    let mut map = LanguageMap::new();
    walk(record, "", &mut |path, text| {
        map.insert(path.to_string(), detect_language(text));
    });
    map
}

/// Collect every non-empty string leaf of a record as a translation
/// candidate, in traversal order.
pub fn text_fields_for_translation(record: &Value) -> Vec<TextField> {
    let mut fields = Vec::new();
    walk(record, "", &mut |path, text| {
        fields.push(TextField {
            path: path.to_string(),
            text: text.to_string(),
            language: detect_language(text),
        });
    });
    fields
}

/// Aggregate field languages into a single record-level classification.
/// Mixed iff both Sinhala and English fields are present.
pub fn aggregate_language(fields: &[TextField]) -> DetectedLanguage {
    let sinhala = fields.iter().any(|f| f.language == Language::Si);
    let english = fields.iter().any(|f| f.language == Language::En);
    match (sinhala, english) {
        (true, true) => DetectedLanguage::Mixed,
        (true, false) => DetectedLanguage::Si,
        _ => DetectedLanguage::En,
    }
}

/// Recursive traversal shared by `detect_languages` and
/// `text_fields_for_translation`. Paths are built with the `jsonpath`
/// helpers so the translation rewrite step resolves them identically.
fn walk(value: &Value, path: &str, visit: &mut impl FnMut(&str, &str)) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let child_path = join_key(path, key);
                match child {
                    Value::String(text) => {
                        if !text.trim().is_empty() {
                            visit(&child_path, text);
                        }
                    }
                    Value::Array(items) => walk_array(items, &child_path, visit),
                    Value::Object(_) => walk(child, &child_path, visit),
                    _ => {}
                }
            }
        }
        Value::Array(items) => walk_array(items, path, visit),
        _ => {}
    }
}

fn walk_array(items: &[Value], path: &str, visit: &mut impl FnMut(&str, &str)) {
    for (index, item) in items.iter().enumerate() {
        let item_path = join_index(path, index);
        match item {
            Value::String(text) => {
                if !text.trim().is_empty() {
                    visit(&item_path, text);
                }
            }
            Value::Object(_) => walk(item, &item_path, visit),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_detect_language_english() {
        assert_eq!(detect_language("Hello world"), Language::En);
        assert_eq!(detect_language(""), Language::En);
        assert_eq!(detect_language("   "), Language::En);
    }

    #[test]
    fn test_detect_language_sinhala() {
        assert_eq!(detect_language("අපි ආහාර සේවය කරමු"), Language::Si);
        // Mostly English with a single Sinhala word still crosses 10%
        assert_eq!(detect_language("we serve කෑම daily"), Language::Si);
    }

    #[test]
    fn test_detect_language_below_threshold() {
        // One Sinhala character against a long English string stays English
        let text = format!("{} ක", "a".repeat(50));
        assert_eq!(detect_language(&text), Language::En);
    }

    #[test]
    fn test_contains_sinhala() {
        assert!(contains_sinhala("කොළඹ city"));
        assert!(!contains_sinhala("Colombo city"));
        assert!(!contains_sinhala(""));
    }

    #[test]
    fn test_traversal_paths_for_nested_arrays() {
        let record = json!({"a": {"b": ["x", "y"]}});
        let fields = text_fields_for_translation(&record);
        let paths: Vec<&str> = fields.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["a.b[0]", "a.b[1]"]);
        assert_eq!(fields[0].text, "x");
        assert_eq!(fields[1].text, "y");
    }

    #[test]
    fn test_traversal_skips_blank_and_non_string_leaves() {
        let record = json!({
            "a": "",
            "b": "  ",
            "c": true,
            "d": 7,
            "e": {"f": "text"}
        });
        let fields = text_fields_for_translation(&record);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].path, "e.f");
    }

    #[test]
    fn test_detect_languages_map_matches_traversal() {
        let record = json!({
            "profile": {"services": "අපි ආහාර සේවය කරමු", "city": "Colombo"}
        });
        let map = detect_languages(&record);
        assert_eq!(map.get("profile.services"), Some(&Language::Si));
        assert_eq!(map.get("profile.city"), Some(&Language::En));
    }

    #[test]
    fn test_aggregate_language() {
        let record = json!({"a": "Hello", "b": "අපි"});
        let fields = text_fields_for_translation(&record);
        assert_eq!(aggregate_language(&fields), DetectedLanguage::Mixed);

        let fields = text_fields_for_translation(&json!({"a": "Hello"}));
        assert_eq!(aggregate_language(&fields), DetectedLanguage::En);

        let fields = text_fields_for_translation(&json!({"a": "අපි"}));
        assert_eq!(aggregate_language(&fields), DetectedLanguage::Si);

        assert_eq!(aggregate_language(&[]), DetectedLanguage::En);
    }
}
