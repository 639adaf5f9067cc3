//! Card records returned by the catalog

use serde::{Deserialize, Serialize};

/// A card as resolved from the catalog.
///
/// Records are read-only once fetched: the localization step replaces a
/// record wholesale, never field-by-field. The only mutation ever applied
/// is attaching `translated_text`, which belongs to this pipeline rather
/// than the catalog and survives until a new scan replaces the record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardRecord {
    /// Canonical (original-language) card name
    #[serde(rename = "name")]
    pub canonical_name: String,

    /// Name as printed on a localized edition
    #[serde(rename = "printed_name", default)]
    pub localized_name: Option<String>,

    /// Type line in the original language
    #[serde(rename = "type_line", default)]
    pub type_line: String,

    /// Type line as printed on a localized edition
    #[serde(rename = "printed_type_line", default)]
    pub localized_type_line: Option<String>,

    /// Rules text in the original language
    #[serde(rename = "oracle_text", default)]
    pub rules_text: Option<String>,

    /// Rules text as printed on a localized edition
    #[serde(rename = "printed_text", default)]
    pub localized_rules_text: Option<String>,

    /// BCP-47-ish language tag of this printing (e.g. "en", "pt")
    #[serde(rename = "lang")]
    pub language_tag: String,

    /// Set code of this printing
    #[serde(rename = "set", default)]
    pub set_code: Option<String>,

    /// Collector number within the set
    #[serde(rename = "collector_number", default)]
    pub collector_number: Option<String>,

    #[serde(rename = "image_uris", default)]
    image_uris: Option<ImageUris>,

    /// Machine translation attached by the translate action; never set by
    /// a catalog response
    #[serde(skip_deserializing, default)]
    pub translated_text: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ImageUris {
    #[serde(default)]
    normal: Option<String>,
}

impl CardRecord {
    /// Image URI for display, when the catalog provided one
    pub fn image_uri(&self) -> Option<&str> {
        self.image_uris.as_ref().and_then(|u| u.normal.as_deref())
    }

    /// Name to display: the localized printing's name when present
    pub fn display_name(&self) -> &str {
        self.localized_name.as_deref().unwrap_or(&self.canonical_name)
    }

    /// Type line to display, preferring the localized printing
    pub fn display_type_line(&self) -> &str {
        self.localized_type_line.as_deref().unwrap_or(&self.type_line)
    }

    /// Rules text to display, preferring the localized printing
    pub fn display_rules_text(&self) -> Option<&str> {
        self.localized_rules_text
            .as_deref()
            .or(self.rules_text.as_deref())
    }

    /// Text the translate action should send: the untranslated original
    /// when both the original and a localized printing's text exist.
    pub fn translation_source_text(&self) -> Option<&str> {
        self.rules_text
            .as_deref()
            .or(self.localized_rules_text.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json() -> &'static str {
        r#"{
            "name": "Lightning Bolt",
            "printed_name": "Raio",
            "type_line": "Instant",
            "printed_type_line": "Mágica Instantânea",
            "oracle_text": "Lightning Bolt deals 3 damage to any target.",
            "printed_text": "Raio causa 3 pontos de dano a qualquer alvo.",
            "lang": "pt",
            "set": "lea",
            "collector_number": "161",
            "image_uris": { "normal": "https://example.invalid/bolt.jpg" }
        }"#
    }

    #[test]
    fn test_deserialize_catalog_response() {
        let record: CardRecord = serde_json::from_str(sample_json()).unwrap();
        assert_eq!(record.canonical_name, "Lightning Bolt");
        assert_eq!(record.localized_name.as_deref(), Some("Raio"));
        assert_eq!(record.language_tag, "pt");
        assert_eq!(record.set_code.as_deref(), Some("lea"));
        assert_eq!(record.collector_number.as_deref(), Some("161"));
        assert_eq!(record.image_uri(), Some("https://example.invalid/bolt.jpg"));
        assert_eq!(record.translated_text, None);
    }

    #[test]
    fn test_deserialize_minimal_response() {
        let record: CardRecord =
            serde_json::from_str(r#"{"name": "Opt", "lang": "en"}"#).unwrap();
        assert_eq!(record.display_name(), "Opt");
        assert_eq!(record.display_rules_text(), None);
        assert!(record.image_uri().is_none());
    }

    #[test]
    fn test_display_prefers_localized_fields() {
        let record: CardRecord = serde_json::from_str(sample_json()).unwrap();
        assert_eq!(record.display_name(), "Raio");
        assert_eq!(record.display_type_line(), "Mágica Instantânea");
        assert_eq!(
            record.display_rules_text(),
            Some("Raio causa 3 pontos de dano a qualquer alvo.")
        );
    }

    #[test]
    fn test_translation_source_prefers_original_text() {
        let record: CardRecord = serde_json::from_str(sample_json()).unwrap();
        assert_eq!(
            record.translation_source_text(),
            Some("Lightning Bolt deals 3 damage to any target.")
        );
    }

    #[test]
    fn test_translated_text_never_comes_from_catalog() {
        // Even a hostile body cannot pre-populate the translation
        let json = r#"{"name": "Opt", "lang": "en", "translated_text": "injected"}"#;
        let record: CardRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.translated_text, None);
    }
}
