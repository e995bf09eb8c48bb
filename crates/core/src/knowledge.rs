//! Knowledge store — the curated medical topics the assistant retrieves from.
//!
//! The knowledge base is an external JSON document shaped as
//! `condition → language → attribute → (string | [string, …])`. It is loaded
//! once at startup and never mutated afterwards.
//!
//! Declaration order matters: the retriever scans candidates in file order
//! and keeps the first of several equally-scored matches, so the loader
//! preserves the order of conditions and attributes exactly as written.

use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use serde::Serialize;
use std::fmt;
use std::marker::PhantomData;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::KnowledgeError;
use crate::language::Language;

/// The value stored under an attribute: a single string or an ordered list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Text(String),
    List(Vec<String>),
}

impl AttributeValue {
    /// Build a list value from anything string-like.
    pub fn list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        AttributeValue::List(items.into_iter().map(Into::into).collect())
    }

    /// Flatten to the text that gets embedded: lists are joined with `", "`.
    pub fn flatten(&self) -> String {
        match self {
            AttributeValue::Text(s) => s.clone(),
            AttributeValue::List(items) => items.join(", "),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::Text(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        AttributeValue::Text(s)
    }
}

impl From<Vec<String>> for AttributeValue {
    fn from(items: Vec<String>) -> Self {
        AttributeValue::List(items)
    }
}

/// One condition's content in one language.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KnowledgeEntry {
    /// Condition key, e.g. `"diabetes"`.
    pub condition: String,
    /// Language of the attribute texts.
    pub language: Language,
    /// Attribute name → value, in declaration order.
    pub attributes: Vec<(String, AttributeValue)>,
}

impl KnowledgeEntry {
    pub fn new(condition: impl Into<String>, language: Language) -> Self {
        Self {
            condition: condition.into(),
            language,
            attributes: Vec::new(),
        }
    }

    /// Builder-style attribute insertion (keeps insertion order).
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    /// Look up an attribute by name.
    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }
}

/// A single retrievable text: one attribute of one condition, flattened.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate<'a> {
    pub condition: &'a str,
    pub attribute: &'a str,
    pub text: String,
}

/// The in-memory, read-only knowledge store.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    entries: Vec<KnowledgeEntry>,
}

impl KnowledgeBase {
    /// Build a store from already-constructed entries (order is preserved).
    pub fn from_entries(entries: Vec<KnowledgeEntry>) -> Self {
        Self { entries }
    }

    /// Load the knowledge base from a JSON file.
    pub fn load(path: &Path) -> Result<Self, KnowledgeError> {
        let content = std::fs::read_to_string(path).map_err(|e| KnowledgeError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let kb = Self::from_json_str(&content)?;
        debug!(
            path = %path.display(),
            entries = kb.len(),
            "Knowledge base loaded"
        );
        Ok(kb)
    }

    /// Parse the knowledge base from a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, KnowledgeError> {
        let raw: Ordered<Ordered<Ordered<serde_json::Value>>> =
            serde_json::from_str(json).map_err(|e| KnowledgeError::Parse(e.to_string()))?;

        let mut entries = Vec::new();
        for (condition, by_language) in raw.0 {
            for (code, attributes) in by_language.0 {
                let language = match code.parse::<Language>() {
                    Ok(language) => language,
                    Err(_) => {
                        warn!(condition = %condition, language = %code, "Skipping unsupported knowledge base language");
                        continue;
                    }
                };

                let mut entry = KnowledgeEntry::new(condition.clone(), language);
                for (attribute, value) in attributes.0 {
                    let value = to_attribute_value(&condition, &attribute, value)?;
                    entry.attributes.push((attribute, value));
                }
                entries.push(entry);
            }
        }

        Ok(Self { entries })
    }

    /// All entries, in declaration order.
    pub fn entries(&self) -> &[KnowledgeEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries written in the given language.
    pub fn for_language(&self, language: Language) -> impl Iterator<Item = &KnowledgeEntry> {
        self.entries.iter().filter(move |e| e.language == language)
    }

    /// Every retrievable text for a language, flattened, in scan order.
    pub fn candidates(&self, language: Language) -> impl Iterator<Item = Candidate<'_>> {
        self.for_language(language).flat_map(|entry| {
            entry.attributes.iter().map(move |(attribute, value)| Candidate {
                condition: &entry.condition,
                attribute,
                text: value.flatten(),
            })
        })
    }

    /// Distinct condition keys, in declaration order.
    pub fn conditions(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for entry in &self.entries {
            if !seen.contains(&entry.condition.as_str()) {
                seen.push(&entry.condition);
            }
        }
        seen
    }
}

fn to_attribute_value(
    condition: &str,
    attribute: &str,
    value: serde_json::Value,
) -> Result<AttributeValue, KnowledgeError> {
    let invalid = |reason: &str| KnowledgeError::InvalidValue {
        condition: condition.to_string(),
        attribute: attribute.to_string(),
        reason: reason.to_string(),
    };

    match value {
        serde_json::Value::Array(items) => items
            .into_iter()
            .map(|item| scalar_to_string(item).ok_or_else(|| invalid("list items must be scalars")))
            .collect::<Result<Vec<_>, _>>()
            .map(AttributeValue::List),
        serde_json::Value::Object(_) => Err(invalid("nested objects are not supported")),
        serde_json::Value::Null => Err(invalid("null values are not supported")),
        scalar => scalar_to_string(scalar)
            .map(AttributeValue::Text)
            .ok_or_else(|| invalid("unsupported scalar")),
    }
}

fn scalar_to_string(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// A JSON object deserialized into a `Vec`, keeping key order.
struct Ordered<V>(Vec<(String, V)>);

impl<'de, V: Deserialize<'de>> Deserialize<'de> for Ordered<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedVisitor<V> {
            type Value = Ordered<V>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a JSON object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, value)) = map.next_entry::<String, V>()? {
                    entries.push((key, value));
                }
                Ok(Ordered(entries))
            }
        }

        deserializer.deserialize_map(OrderedVisitor(PhantomData))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "malaria": {
            "fr": {
                "symptoms": ["fièvre", "frissons", "maux de tête"],
                "prevention": "Dormir sous une moustiquaire imprégnée."
            },
            "en": {
                "symptoms": ["fever", "chills", "headache"],
                "prevention": "Sleep under an insecticide-treated net."
            }
        },
        "diabetes": {
            "en": {
                "definition": "A chronic disease affecting blood sugar regulation.",
                "risk_factors": ["obesity", "inactivity"],
                "prevalence_pct": 6
            }
        }
    }"#;

    #[test]
    fn parses_nested_document() {
        let kb = KnowledgeBase::from_json_str(SAMPLE).unwrap();
        assert_eq!(kb.len(), 3);
        assert_eq!(kb.conditions(), vec!["malaria", "diabetes"]);
        assert_eq!(kb.for_language(Language::En).count(), 2);
        assert_eq!(kb.for_language(Language::Fr).count(), 1);
    }

    #[test]
    fn preserves_declaration_order() {
        let kb = KnowledgeBase::from_json_str(SAMPLE).unwrap();
        let attrs: Vec<&str> = kb
            .candidates(Language::En)
            .map(|c| c.attribute)
            .collect();
        assert_eq!(
            attrs,
            vec!["symptoms", "prevention", "definition", "risk_factors", "prevalence_pct"]
        );
    }

    #[test]
    fn lists_flatten_with_comma_space() {
        let kb = KnowledgeBase::from_json_str(SAMPLE).unwrap();
        let first = kb.candidates(Language::Fr).next().unwrap();
        assert_eq!(first.condition, "malaria");
        assert_eq!(first.text, "fièvre, frissons, maux de tête");
    }

    #[test]
    fn numbers_are_stringified() {
        let kb = KnowledgeBase::from_json_str(SAMPLE).unwrap();
        let diabetes = kb.for_language(Language::En).find(|e| e.condition == "diabetes").unwrap();
        assert_eq!(diabetes.get("prevalence_pct"), Some(&AttributeValue::Text("6".into())));
    }

    #[test]
    fn nested_objects_are_rejected() {
        let json = r#"{"flu": {"en": {"symptoms": {"early": "cough"}}}}"#;
        let err = KnowledgeBase::from_json_str(json).unwrap_err();
        assert!(matches!(err, KnowledgeError::InvalidValue { .. }));
        assert!(err.to_string().contains("flu/symptoms"));
    }

    #[test]
    fn unsupported_languages_are_skipped() {
        let json = r#"{"flu": {"de": {"symptoms": "Husten"}, "en": {"symptoms": "cough"}}}"#;
        let kb = KnowledgeBase::from_json_str(json).unwrap();
        assert_eq!(kb.len(), 1);
        assert_eq!(kb.entries()[0].language, Language::En);
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = KnowledgeBase::from_json_str("[1, 2, 3]").unwrap_err();
        assert!(matches!(err, KnowledgeError::Parse(_)));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let kb = KnowledgeBase::load(file.path()).unwrap();
        assert_eq!(kb.len(), 3);
    }

    #[test]
    fn load_missing_file_fails() {
        let err = KnowledgeBase::load(Path::new("/nonexistent/medical_kb.json")).unwrap_err();
        assert!(matches!(err, KnowledgeError::Read { .. }));
    }

    #[test]
    fn builder_entries() {
        let entry = KnowledgeEntry::new("asthma", Language::En)
            .with_attribute("triggers", AttributeValue::list(["dust", "pollen"]))
            .with_attribute("advice", "Keep your inhaler nearby.");
        let kb = KnowledgeBase::from_entries(vec![entry]);
        let texts: Vec<String> = kb.candidates(Language::En).map(|c| c.text).collect();
        assert_eq!(texts, vec!["dust, pollen", "Keep your inhaler nearby."]);
        assert_eq!(kb.candidates(Language::Fr).count(), 0);
    }
}
