use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::error::Result;
use super::Translator;

/// Marker wrapped around input the dictionary cannot translate. The caller
/// must be able to tell an untranslated passthrough from a real translation.
pub const FALLBACK_MARKER: &str = "[Dictionary Fallback]";

// Sinhala-English lookup table. Phrase entries win over single words because
// the table is applied longest key first.
const DICTIONARY: &[(&str, &str)] = &[
    // Phrases
    ("අපි සාම්ප්‍රදායික ශ්‍රී ලාංකික ආහාර වර්ග සේවය කරමු", "We serve traditional Sri Lankan food varieties"),
    ("අව්‍යාජ රස සහිත නවීන ප්‍රදර්ශනය", "Authentic flavors with modern presentation"),
    ("කොළඹ නගර ප්‍රදේශය", "Colombo metropolitan area"),
    ("ප්‍රතිෂ්ඨිත ආහාරශාලා වලින් තරගකාරිත්වය", "Competition from established restaurants"),
    ("අව්‍යාජ ශ්‍රී ලාංකික ආහාර කෙරෙහි වැඩිවන උනන්දුව", "Growing interest in authentic Sri Lankan cuisine"),
    ("සිංහල හා දමිළ අලුත් අවුරුද්ද (අප්‍රේල්)", "Sinhala and Tamil New Year (April)"),
    ("නත්තල් (දෙසැම්බර්)", "Christmas (December)"),
    ("අපේ ව්‍යාපාරය කාලයාකුල රටාවන් හේතුවෙන් බලපෑමට ලක්වේ", "Our business is affected by seasonal patterns"),
    ("සමාජ මාධ්‍ය හරහා වැඩි ක්‍රියාකාරකම් සහ බෙදාහැරීමේ විකල්ප", "Increased social media activities and delivery options"),
    // Mixed-language phrases, common in real user input
    ("we සාම්ප්‍රදායික ශ්‍රී ලාංකික ආහාර වර්ග සේවය කරමු", "We serve traditional Sri Lankan food varieties"),
    ("authentic රස සහිත නවීන ප්‍රදර්ශනය", "Authentic flavors with modern presentation"),
    ("Colombo නගර ප්‍රදේශය", "Colombo metropolitan area"),
    ("ප්‍රතිෂ්ඨිත foodශාලා වලින් තරගකාරිත්වය", "Competition from established restaurants"),
    ("අව්‍යාජ ශ්‍රී ලාංකික food කෙරෙහි වැඩිවන උනන්දුව", "Growing interest in authentic Sri Lankan cuisine"),
    ("සිංහල හා දමිළ new අවුරුද්ද (අප්‍රේල්)", "Sinhala and Tamil New Year (April)"),
    ("Christmas (දෙසැම්බර්)", "Christmas (December)"),
    ("සමාජ මාධ්‍ය හරහා more ක්‍රියාකාරකම් සහ බෙදාහැරීමේ විකල්ප", "Social media activities and delivery options"),
    // Single words
    ("ශ්‍රී ලාංකික", "Sri Lankan"),
    ("අපි", "we"),
    ("ආහාර", "food"),
    ("සේවය", "service"),
    ("කරමු", "do"),
    ("කොළඹ", "Colombo"),
    ("නගරය", "city"),
    ("නගර", "city"),
    ("ප්‍රදේශය", "area"),
    ("සාම්ප්‍රදායික", "traditional"),
    ("ශ්‍රී", "Sri"),
    ("ලාංකික", "Lankan"),
    ("අව්‍යාජ", "authentic"),
    ("රස", "taste"),
    ("සහිත", "with"),
    ("නවීන", "modern"),
    ("ප්‍රදර්ශනය", "presentation"),
    ("අත්දැකීම්", "experiences"),
    ("සමග", "with"),
    ("ප්‍රතිෂ්ඨිත", "established"),
    ("ආහාරශාලා", "restaurants"),
    ("තරගකාරිත්වය", "competition"),
    ("උනන්දුව", "interest"),
    ("වැඩිවන", "growing"),
    ("අලුත්", "new"),
    ("අවුරුද්ද", "year"),
    ("නත්තල්", "Christmas"),
    ("අවස්ථා", "occasions"),
    ("වලදී", "during"),
    ("වැඩි", "more"),
    ("වේ", "become"),
    ("භෝජන", "dining"),
    ("සංස්කෘතිය", "culture"),
    ("වර්ග", "varieties"),
    ("හේතුවෙන්", "due to"),
    ("බලපෑමට", "to impact"),
    ("ලක්වේ", "is subjected"),
    ("මාධ්‍ය", "media"),
    ("හරහා", "through"),
    ("ක්‍රියාකාරකම්", "activities"),
    ("බෙදාහැරීමේ", "delivery"),
    ("විකල්ප", "options"),
    ("කාලයාකුල", "seasonal"),
    ("රටාවන්", "patterns"),
    ("දමිළ", "Tamil"),
    ("අප්‍රේල්", "April"),
    ("දෙසැම්බර්", "December"),
];

/// Deterministic offline translator backed by a static bilingual table.
/// Used when no network provider is configured and as the fallback when one
/// fails mid-flight.
pub struct DictionaryTranslator {
    entries: Vec<(&'static str, &'static str)>,
    delay: Duration,
}

impl DictionaryTranslator {
    pub fn new(delay_ms: u64) -> Self {
        // Longest key first, so phrases are consumed before the words they
        // contain and partial replacements cannot corrupt them.
        let mut entries = DICTIONARY.to_vec();
        entries.sort_by(|(a, _), (b, _)| b.chars().count().cmp(&a.chars().count()));

        Self {
            entries,
            delay: Duration::from_millis(delay_ms),
        }
    }
}

#[async_trait]
impl Translator for DictionaryTranslator {
    fn name(&self) -> &str {
        "Dictionary Translator"
    }

    async fn translate(&self, text: &str, _from: &str, _to: &str) -> Result<String> {
        // Simulated network latency, kept bounded
        tokio::time::sleep(self.delay).await;

        let mut translated = text.to_string();
        let mut substituted = false;

        for (sinhala, english) in &self.entries {
            if translated.contains(sinhala) {
                translated = translated.replace(sinhala, english);
                substituted = true;
                debug!("Translated \"{}\" -> \"{}\"", sinhala, english);
            }
        }

        if substituted {
            Ok(translated)
        } else {
            Ok(format!("{} {}", FALLBACK_MARKER, text))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn translator() -> DictionaryTranslator {
        DictionaryTranslator::new(0)
    }

    #[tokio::test]
    async fn test_phrase_entry_wins_over_words() {
        let result = translator()
            .translate("අපි සාම්ප්‍රදායික ශ්‍රී ලාංකික ආහාර වර්ග සේවය කරමු", "si", "en")
            .await
            .unwrap();
        assert_eq!(result, "We serve traditional Sri Lankan food varieties");
    }

    #[tokio::test]
    async fn test_word_by_word_substitution() {
        let result = translator()
            .translate("අපි ආහාර සේවය කරමු", "si", "en")
            .await
            .unwrap();
        assert_eq!(result, "we food service do");
        assert!(!crate::language::contains_sinhala(&result));
    }

    #[tokio::test]
    async fn test_unknown_text_gets_visible_marker() {
        let result = translator()
            .translate("untranslatable input", "si", "en")
            .await
            .unwrap();
        assert!(result.starts_with(FALLBACK_MARKER));
        assert!(result.contains("untranslatable input"));
        assert_ne!(result, "untranslatable input");
    }
}
