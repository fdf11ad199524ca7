use std::fmt;

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::scoring::MatchDecision;

/// Handwritten value the arbitrator emits when no counterpart exists.
pub const NOT_FOUND: &str = "Not Found";

/// Master value that does not take part in scoring.
pub const NOT_APPLICABLE: &str = "N/A";

/// Category of an uploaded document. Fixes which fields are extracted.
///
/// Tags are the ones the upload form sends; anything else is carried as
/// [`DocumentType::Other`] and gets the generic extraction prompt.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DocumentType {
    /// National identity card (`aadhar`).
    IdentityCard,
    /// Tax identification card (`pan`).
    TaxIdCard,
    /// Secondary-school leaving marksheet (`marksheet_10th`).
    SecondarySchoolCertificate,
    CasteCertificate,
    /// Residency / domicile certificate.
    ResidencyCertificate,
    Other(String),
}

impl DocumentType {
    /// Parse a tag as sent by the client. Blank tags are rejected.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let tag = tag.trim();
        if tag.is_empty() {
            return None;
        }
        Some(match tag {
            "aadhar" => Self::IdentityCard,
            "pan" => Self::TaxIdCard,
            "marksheet_10th" => Self::SecondarySchoolCertificate,
            "caste_certificate" => Self::CasteCertificate,
            "domicile_certificate" => Self::ResidencyCertificate,
            other => Self::Other(other.to_string()),
        })
    }

    pub fn tag(&self) -> &str {
        match self {
            Self::IdentityCard => "aadhar",
            Self::TaxIdCard => "pan",
            Self::SecondarySchoolCertificate => "marksheet_10th",
            Self::CasteCertificate => "caste_certificate",
            Self::ResidencyCertificate => "domicile_certificate",
            Self::Other(tag) => tag.as_str(),
        }
    }

    /// Human-readable form of the tag, e.g. `caste certificate`.
    pub fn display_name(&self) -> String {
        self.tag().replace('_', " ")
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl Serialize for DocumentType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.tag())
    }
}

impl<'de> Deserialize<'de> for DocumentType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Self::from_tag(&tag).ok_or_else(|| de::Error::custom("empty document type"))
    }
}

/// Ordered label → value mapping.
///
/// Used for one document's extracted fields, for the handwritten form's
/// fields, and for the consolidated master data. Keys keep the position of
/// their first insertion; inserting an existing key replaces its value in
/// place. Serializes as a JSON object in that order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSet {
    entries: Vec<(String, String)>,
}

impl FieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a field. Returns the previous value, if any.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Overlay `other` on top of `self`; values from `other` win.
    pub fn merge_from(&mut self, other: &FieldSet) {
        for (key, value) in other.iter() {
            self.insert(key, value);
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FieldSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = FieldSet::new();
        for (k, v) in iter {
            set.insert(k, v);
        }
        set
    }
}

impl Serialize for FieldSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for FieldSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FieldSetVisitor;

        impl<'de> Visitor<'de> for FieldSetVisitor {
            type Value = FieldSet;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a JSON object of fields")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<FieldSet, A::Error> {
                let mut set = FieldSet::new();
                while let Some((key, value)) = access.next_entry::<String, Value>()? {
                    set.insert(key, value_to_text(value));
                }
                Ok(set)
            }
        }

        deserializer.deserialize_map(FieldSetVisitor)
    }
}

/// Flatten a JSON value into the string form stored for a field.
pub fn value_to_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        nested => nested.to_string(),
    }
}

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Value::deserialize(deserializer).map(value_to_text)
}

/// One master field matched against the handwritten form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonRecord {
    pub field: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub master_value: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub handwritten_value: String,
    pub similarity: f64,
    /// Per-field accept/flag outcome, filled in once the record is validated.
    #[serde(default, skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub decision: Option<MatchDecision>,
}

impl ComparisonRecord {
    /// Whether this record counts toward the overall similarity.
    pub fn is_scored(&self) -> bool {
        is_scored_value(&self.master_value)
    }

    pub fn is_not_found(&self) -> bool {
        self.handwritten_value == NOT_FOUND
    }

    /// Decision for this field's similarity against the accept threshold.
    pub fn decision(&self) -> MatchDecision {
        MatchDecision::from_similarity(self.similarity)
    }
}

/// Master values that are empty or `N/A` are excluded from scoring.
pub fn is_scored_value(master_value: &str) -> bool {
    !master_value.is_empty() && master_value != NOT_APPLICABLE
}

/// Outcome of validating a handwritten form against the master data.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub comparison: Vec<ComparisonRecord>,
    pub overall_similarity: f64,
    pub decision: MatchDecision,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_known_and_unknown_tags() {
        assert_eq!(DocumentType::from_tag("aadhar"), Some(DocumentType::IdentityCard));
        assert_eq!(DocumentType::from_tag("pan"), Some(DocumentType::TaxIdCard));
        assert_eq!(
            DocumentType::from_tag("birth_certificate"),
            Some(DocumentType::Other("birth_certificate".into()))
        );
        assert_eq!(DocumentType::from_tag("   "), None);
        assert_eq!(DocumentType::ResidencyCertificate.tag(), "domicile_certificate");
        assert_eq!(DocumentType::CasteCertificate.display_name(), "caste certificate");
    }

    #[test]
    fn field_set_keeps_source_order() {
        let fields: FieldSet =
            serde_json::from_str(r#"{"zeta":"1","alpha":"2","mid":"3"}"#).unwrap();
        let keys: Vec<_> = fields.keys().collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
        assert_eq!(
            serde_json::to_string(&fields).unwrap(),
            r#"{"zeta":"1","alpha":"2","mid":"3"}"#
        );
    }

    #[test]
    fn field_set_stringifies_non_string_values() {
        let fields: FieldSet = serde_json::from_value(json!({
            "percentage": 87.5,
            "verified": true,
            "dob": null,
            "marks": [1, 2]
        }))
        .unwrap();
        assert_eq!(fields.get("percentage"), Some("87.5"));
        assert_eq!(fields.get("verified"), Some("true"));
        assert_eq!(fields.get("dob"), Some(""));
        assert_eq!(fields.get("marks"), Some("[1,2]"));
    }

    #[test]
    fn field_set_rejects_non_objects() {
        assert!(serde_json::from_str::<FieldSet>("[1,2]").is_err());
        assert!(serde_json::from_str::<FieldSet>("\"name\"").is_err());
    }

    #[test]
    fn insert_overwrites_in_place() {
        let mut fields: FieldSet = [("name", "A"), ("dob", "1990")].into_iter().collect();
        assert_eq!(fields.insert("name", "B"), Some("A".to_string()));
        let pairs: Vec<_> = fields.iter().collect();
        assert_eq!(pairs, vec![("name", "B"), ("dob", "1990")]);
    }

    #[test]
    fn comparison_record_accepts_loose_values() {
        let rec: ComparisonRecord = serde_json::from_value(json!({
            "field": "percentage",
            "masterValue": 87.5,
            "handwrittenValue": "87.5",
            "similarity": 1
        }))
        .unwrap();
        assert_eq!(rec.master_value, "87.5");
        assert_eq!(rec.similarity, 1.0);
        assert!(rec.is_scored());
        assert_eq!(rec.decision, None);
    }

    #[test]
    fn comparison_record_serializes_stamped_decision() {
        let mut rec: ComparisonRecord = serde_json::from_value(json!({
            "field": "name",
            "masterValue": "A",
            "handwrittenValue": "A",
            "similarity": 0.5,
            "decision": "accepted"
        }))
        .unwrap();
        assert_eq!(rec.decision, None);
        assert!(serde_json::to_value(&rec).unwrap().get("decision").is_none());

        rec.decision = Some(rec.decision());
        assert_eq!(serde_json::to_value(&rec).unwrap()["decision"], "flagged");
    }

    #[test]
    fn sentinel_master_values_are_not_scored() {
        assert!(!is_scored_value(""));
        assert!(!is_scored_value(NOT_APPLICABLE));
        assert!(is_scored_value("A"));
    }
}
