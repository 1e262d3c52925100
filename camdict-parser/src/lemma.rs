use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ParseError;

/// Which of the site's dictionaries an entry came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Language {
    #[default]
    Unknown,
    British,
    AmericanEnglish,
    BusinessEnglish,
}

impl Language {
    /// Map a dictionary block's `data-id` attribute.
    ///
    /// ```
    /// use camdict_parser::Language;
    ///
    /// assert_eq!(Language::from_data_id("cald4").unwrap(), Language::British);
    /// assert!(Language::from_data_id("nope").is_err());
    /// ```
    pub fn from_data_id(data_id: &str) -> Result<Self, ParseError> {
        match data_id {
            "unknown" => Ok(Self::Unknown),
            "cald4" => Ok(Self::British),
            "cacd" => Ok(Self::AmericanEnglish),
            "cbed" => Ok(Self::BusinessEnglish),
            other => Err(ParseError::UnknownDictionaryId(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::British => "british",
            Self::AmericanEnglish => "american-english",
            Self::BusinessEnglish => "business-english",
        }
    }
}

/// One dictionary sense.
///
/// The serialized field names are the service's wire format; empty lists and
/// maps are left out of the JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lemma {
    #[serde(rename = "lemma", default)]
    pub headword: String,
    /// Sorted.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub part_of_speech: Vec<String>,
    #[serde(default)]
    pub language: Language,
    /// Region label ("uk", "us") to its phonetic spellings.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub transcriptions: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub definition: String,
    #[serde(default)]
    pub guide_word: String,
    #[serde(default)]
    pub alternative: String,
    /// Sorted.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub grammar: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_serializes_kebab_case() {
        let json = serde_json::to_string(&Language::AmericanEnglish).unwrap();
        assert_eq!(json, "\"american-english\"");
        assert_eq!(Language::AmericanEnglish.as_str(), "american-english");
    }

    #[test]
    fn empty_collections_are_omitted() {
        let lemma = Lemma {
            headword: "hello".into(),
            definition: "used when meeting someone".into(),
            ..Lemma::default()
        };
        let value = serde_json::to_value(&lemma).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj["lemma"], "hello");
        assert_eq!(obj["language"], "unknown");
        assert!(!obj.contains_key("grammar"));
        assert!(!obj.contains_key("examples"));
        assert!(!obj.contains_key("transcriptions"));
        assert!(!obj.contains_key("part_of_speech"));
    }

    #[test]
    fn missing_fields_deserialize_to_defaults() {
        let lemma: Lemma = serde_json::from_str(r#"{"lemma":"x","guide_word":"y"}"#).unwrap();
        assert_eq!(lemma.headword, "x");
        assert_eq!(lemma.guide_word, "y");
        assert!(lemma.examples.is_empty());
        assert_eq!(lemma.language, Language::Unknown);
    }
}
