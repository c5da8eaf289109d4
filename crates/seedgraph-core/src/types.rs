//! Core domain types for seedgraph descriptors.
//!
//! Every name that ends up inside a Cypher statement is an [`Identifier`],
//! validated when it is constructed. Values never reach statement text; they
//! travel as bound parameters.

use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, Unexpected, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ValidationError;

// ── Identifiers ───────────────────────────────────────────────────

/// Where an identifier is used. Only affects error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierKind {
    Label,
    RelationshipType,
    Property,
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Label => f.write_str("label"),
            Self::RelationshipType => f.write_str("relationship type"),
            Self::Property => f.write_str("property"),
        }
    }
}

/// A non-empty name over `[A-Za-z0-9_]`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    pub fn parse(kind: IdentifierKind, raw: impl Into<String>) -> Result<Self, ValidationError> {
        let raw = raw.into();
        if is_identifier(&raw) {
            Ok(Self(raw))
        } else {
            Err(ValidationError { kind, value: raw })
        }
    }

    pub fn label(raw: impl Into<String>) -> Result<Self, ValidationError> {
        Self::parse(IdentifierKind::Label, raw)
    }

    pub fn rel_type(raw: impl Into<String>) -> Result<Self, ValidationError> {
        Self::parse(IdentifierKind::RelationshipType, raw)
    }

    pub fn property(raw: impl Into<String>) -> Result<Self, ValidationError> {
        Self::parse(IdentifierKind::Property, raw)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Identifier {
    fn borrow(&self) -> &str {
        &self.0
    }
}

fn is_identifier(raw: &str) -> bool {
    !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

// ── Property Values ───────────────────────────────────────────────

/// A scalar property value.
///
/// JSON `null`, arrays, and objects do not deserialize into this type, and
/// neither do unsigned integers above `i64::MAX`. serde_json itself reads
/// integer literals beyond the `u64` range as floats; those arrive as
/// [`PropertyValue::Float`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl<'de> Deserialize<'de> for PropertyValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(PropertyValueVisitor)
    }
}

struct PropertyValueVisitor;

impl<'de> Visitor<'de> for PropertyValueVisitor {
    type Value = PropertyValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a boolean, 64-bit integer, float, or string")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
        Ok(PropertyValue::Boolean(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(PropertyValue::Integer(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        i64::try_from(v)
            .map(PropertyValue::Integer)
            .map_err(|_| E::invalid_value(Unexpected::Unsigned(v), &self))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(PropertyValue::Float(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(PropertyValue::String(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
        Ok(PropertyValue::String(v))
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(v) => write!(f, "{v}"),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::String(v) => write!(f, "{v:?}"),
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<i32> for PropertyValue {
    fn from(v: i32) -> Self {
        Self::Integer(v.into())
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

// ── Property Maps ─────────────────────────────────────────────────

/// Key-ordered mapping of validated property names to scalar values.
///
/// Iteration order is the key order, so statements built from the same map
/// always render identically.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, PropertyValue>")]
pub struct PropertyMap(BTreeMap<Identifier, PropertyValue>);

impl PropertyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a property, validating its name. Returns the previous value.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Result<Option<PropertyValue>, ValidationError> {
        let key = Identifier::property(key)?;
        Ok(self.0.insert(key, value.into()))
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Identifier, &PropertyValue)> {
        self.0.iter()
    }

    /// A copy of this map with `key` removed.
    pub fn without(&self, key: &str) -> PropertyMap {
        let mut copy = self.clone();
        copy.0.remove(key);
        copy
    }

    /// Overlay `other` onto `self`, overwriting shared keys.
    pub fn extend(&mut self, other: &PropertyMap) {
        for (key, value) in other.iter() {
            self.0.insert(key.clone(), value.clone());
        }
    }
}

impl TryFrom<BTreeMap<String, PropertyValue>> for PropertyMap {
    type Error = ValidationError;

    fn try_from(raw: BTreeMap<String, PropertyValue>) -> Result<Self, Self::Error> {
        let mut map = BTreeMap::new();
        for (key, value) in raw {
            map.insert(Identifier::property(key)?, value);
        }
        Ok(Self(map))
    }
}

impl<K: Into<String>, const N: usize> TryFrom<[(K, PropertyValue); N]> for PropertyMap {
    type Error = ValidationError;

    fn try_from(pairs: [(K, PropertyValue); N]) -> Result<Self, Self::Error> {
        let mut map = Self::new();
        for (key, value) in pairs {
            map.insert(key, value)?;
        }
        Ok(map)
    }
}

impl<'a> IntoIterator for &'a PropertyMap {
    type Item = (&'a Identifier, &'a PropertyValue);
    type IntoIter = std::collections::btree_map::Iter<'a, Identifier, PropertyValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// ── Descriptors ───────────────────────────────────────────────────

/// A node to upsert: its label and the properties to merge and set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeDescriptor {
    pub label: Identifier,
    pub properties: PropertyMap,
}

impl NodeDescriptor {
    pub fn new(label: &str, properties: PropertyMap) -> Result<Self, ValidationError> {
        Ok(Self {
            label: Identifier::label(label)?,
            properties,
        })
    }
}

/// A directed relationship between two merged endpoint nodes.
///
/// The JSON form uses the field names of the relationship input file
/// (`from_props`, `to_props`, `rel_props`); `rel_props` may be omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRelationship")]
pub struct RelationshipDescriptor {
    pub from_label: Identifier,
    #[serde(rename = "from_props")]
    pub from_properties: PropertyMap,
    pub rel_type: Identifier,
    pub to_label: Identifier,
    #[serde(rename = "to_props")]
    pub to_properties: PropertyMap,
    #[serde(rename = "rel_props")]
    pub rel_properties: PropertyMap,
}

impl RelationshipDescriptor {
    pub fn new(
        from_label: &str,
        from_properties: PropertyMap,
        rel_type: &str,
        to_label: &str,
        to_properties: PropertyMap,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            from_label: Identifier::label(from_label)?,
            from_properties,
            rel_type: Identifier::rel_type(rel_type)?,
            to_label: Identifier::label(to_label)?,
            to_properties,
            rel_properties: PropertyMap::new(),
        })
    }

    pub fn with_properties(mut self, rel_properties: PropertyMap) -> Self {
        self.rel_properties = rel_properties;
        self
    }
}

#[derive(Deserialize)]
struct RawRelationship {
    from_label: String,
    from_props: PropertyMap,
    rel_type: String,
    to_label: String,
    to_props: PropertyMap,
    #[serde(default)]
    rel_props: PropertyMap,
}

impl TryFrom<RawRelationship> for RelationshipDescriptor {
    type Error = ValidationError;

    fn try_from(raw: RawRelationship) -> Result<Self, Self::Error> {
        Ok(Self::new(
            &raw.from_label,
            raw.from_props,
            &raw.rel_type,
            &raw.to_label,
            raw.to_props,
        )?
        .with_properties(raw.rel_props))
    }
}

// ── Node Input ────────────────────────────────────────────────────

/// Node input grouped by label: `{ "Company": [ {...}, ... ], ... }`.
///
/// Labels are visited in key order; entries keep their input order.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(try_from = "BTreeMap<String, Vec<PropertyMap>>")]
pub struct NodeBatches(BTreeMap<Identifier, Vec<PropertyMap>>);

impl NodeBatches {
    pub fn labels(&self) -> impl Iterator<Item = &Identifier> {
        self.0.keys()
    }

    pub fn get(&self, label: &str) -> Option<&[PropertyMap]> {
        self.0.get(label).map(Vec::as_slice)
    }

    /// Total number of node entries across all labels.
    pub fn len(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flatten into descriptors. An empty `only` selects every label.
    pub fn descriptors(&self, only: &[String]) -> Vec<NodeDescriptor> {
        self.0
            .iter()
            .filter(|(label, _)| only.is_empty() || only.iter().any(|l| l == label.as_str()))
            .flat_map(|(label, entries)| {
                entries.iter().map(|properties| NodeDescriptor {
                    label: label.clone(),
                    properties: properties.clone(),
                })
            })
            .collect()
    }
}

impl TryFrom<BTreeMap<String, Vec<PropertyMap>>> for NodeBatches {
    type Error = ValidationError;

    fn try_from(raw: BTreeMap<String, Vec<PropertyMap>>) -> Result<Self, Self::Error> {
        let mut batches = BTreeMap::new();
        for (label, entries) in raw {
            batches.insert(Identifier::label(label)?, entries);
        }
        Ok(Self(batches))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_accepts_word_characters() {
        assert!(Identifier::label("Company").is_ok());
        assert!(Identifier::property("since_year").is_ok());
        assert!(Identifier::property("2020_revenue").is_ok());
    }

    #[test]
    fn test_identifier_rejects_unsafe_names() {
        for bad in ["", "founded year", "name;", "n`x", "a-b", "DROP)"] {
            let err = Identifier::property(bad).unwrap_err();
            assert_eq!(err.kind, IdentifierKind::Property);
            assert_eq!(err.value, bad);
        }
    }

    #[test]
    fn test_property_value_from_json_scalars() {
        let map: PropertyMap = serde_json::from_str(
            r#"{"name": "Acme Corp", "founded": 1995, "revenue": 12.5, "public": true}"#,
        )
        .unwrap();
        assert_eq!(map.get("name"), Some(&PropertyValue::from("Acme Corp")));
        assert_eq!(map.get("founded"), Some(&PropertyValue::Integer(1995)));
        assert_eq!(map.get("revenue"), Some(&PropertyValue::Float(12.5)));
        assert_eq!(map.get("public"), Some(&PropertyValue::Boolean(true)));
    }

    #[test]
    fn test_property_map_rejects_non_scalars() {
        assert!(serde_json::from_str::<PropertyMap>(r#"{"tags": ["a"]}"#).is_err());
        assert!(serde_json::from_str::<PropertyMap>(r#"{"ceo": null}"#).is_err());
    }

    #[test]
    fn test_property_value_rejects_integers_beyond_i64() {
        let max: PropertyValue = serde_json::from_str("9223372036854775807").unwrap();
        assert_eq!(max, PropertyValue::Integer(i64::MAX));

        let err = serde_json::from_str::<PropertyValue>("9223372036854775808").unwrap_err();
        assert!(err.to_string().contains("9223372036854775808"), "{err}");
        assert!(serde_json::from_str::<PropertyMap>(r#"{"shares": 18446744073709551615}"#).is_err());
    }

    #[test]
    fn test_property_map_rejects_bad_keys_on_deserialize() {
        let err = serde_json::from_str::<PropertyMap>(r#"{"founded year": 1995}"#).unwrap_err();
        assert!(err.to_string().contains("founded year"));
    }

    #[test]
    fn test_property_map_iterates_in_key_order() {
        let map = PropertyMap::try_from([
            ("name", PropertyValue::from("Acme")),
            ("industry", "Tech".into()),
            ("founded", 1995.into()),
        ])
        .unwrap();
        let keys: Vec<&str> = map.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["founded", "industry", "name"]);
    }

    #[test]
    fn test_relationship_from_json_defaults_rel_props() {
        let rel: RelationshipDescriptor = serde_json::from_str(
            r#"{
                "from_label": "Company",
                "from_props": {"name": "Acme Corp"},
                "rel_type": "OPERATES_IN",
                "to_label": "City",
                "to_props": {"name": "New York"}
            }"#,
        )
        .unwrap();
        assert_eq!(rel.rel_type.as_str(), "OPERATES_IN");
        assert!(rel.rel_properties.is_empty());
        assert_eq!(
            rel.to_properties.get("name"),
            Some(&PropertyValue::from("New York"))
        );
    }

    #[test]
    fn test_relationship_rejects_unsafe_type() {
        let result = serde_json::from_str::<RelationshipDescriptor>(
            r#"{
                "from_label": "Company", "from_props": {"name": "Acme"},
                "rel_type": "OPERATES IN",
                "to_label": "City", "to_props": {"name": "NYC"}
            }"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_node_batches_filter_and_order() {
        let batches: NodeBatches = serde_json::from_str(
            r#"{
                "Company": [{"name": "Acme"}, {"name": "Globex"}],
                "City": [{"name": "NYC"}]
            }"#,
        )
        .unwrap();
        assert_eq!(batches.len(), 3);

        let all = batches.descriptors(&[]);
        let labels: Vec<&str> = all.iter().map(|d| d.label.as_str()).collect();
        assert_eq!(labels, vec!["City", "Company", "Company"]);

        let companies = batches.descriptors(&["Company".to_string()]);
        assert_eq!(companies.len(), 2);
        assert_eq!(
            companies[1].properties.get("name"),
            Some(&PropertyValue::from("Globex"))
        );
    }
}
