//! Document model
//!
//! This module defines:
//! - Document: schema-free value for contract terms and message payloads
//! - Fields: insertion-ordered mapping with unique string keys
//!
//! ## Value Rules
//!
//! - Seven variants: Null, Bool, Int, Float, String, Sequence, Mapping
//! - No implicit coercions: `Int(1) != Float(1.0)`
//! - Float uses IEEE-754 equality: `NaN != NaN`, `-0.0 == 0.0`
//! - Mapping keys are unique; iteration and serialization follow insertion
//!   order, equality does not depend on it
//!
//! Documents handed to a message are wrapped in an `Arc` and never mutated
//! again; use `Arc::make_mut` for copy-on-write edits.

use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A schema-free structured value
#[derive(Debug, Clone)]
pub enum Document {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit floating point (IEEE-754)
    Float(f64),
    /// UTF-8 string
    String(String),
    /// Ordered sequence of documents
    Sequence(Vec<Document>),
    /// Mapping from unique string keys to documents
    Mapping(Fields),
}

// IEEE-754 float semantics and cross-variant inequality
impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Document::Null, Document::Null) => true,
            (Document::Bool(a), Document::Bool(b)) => a == b,
            (Document::Int(a), Document::Int(b)) => a == b,
            (Document::Float(a), Document::Float(b)) => a == b,
            (Document::String(a), Document::String(b)) => a == b,
            (Document::Sequence(a), Document::Sequence(b)) => a == b,
            (Document::Mapping(a), Document::Mapping(b)) => a == b,
            _ => false,
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Document::Null
    }
}

impl Document {
    /// An empty mapping
    pub fn mapping() -> Self {
        Document::Mapping(Fields::new())
    }

    /// An empty sequence
    pub fn sequence() -> Self {
        Document::Sequence(Vec::new())
    }

    /// Get the type name as a string
    pub fn type_name(&self) -> &'static str {
        match self {
            Document::Null => "Null",
            Document::Bool(_) => "Bool",
            Document::Int(_) => "Int",
            Document::Float(_) => "Float",
            Document::String(_) => "String",
            Document::Sequence(_) => "Sequence",
            Document::Mapping(_) => "Mapping",
        }
    }

    /// Check if this is a null value
    pub fn is_null(&self) -> bool {
        matches!(self, Document::Null)
    }

    /// Check if this is a string value
    pub fn is_string(&self) -> bool {
        matches!(self, Document::String(_))
    }

    /// Check if this is a mapping
    pub fn is_mapping(&self) -> bool {
        matches!(self, Document::Mapping(_))
    }

    /// Check if this is a sequence
    pub fn is_sequence(&self) -> bool {
        matches!(self, Document::Sequence(_))
    }

    /// Get as bool if this is a Bool value
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Document::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as i64 if this is an Int value
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Document::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as f64 if this is a Float value
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Document::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Get any number as f64 (Int is widened)
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Document::Int(i) => Some(*i as f64),
            Document::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Get as &str if this is a String value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Document::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as a slice if this is a Sequence
    pub fn as_sequence(&self) -> Option<&[Document]> {
        match self {
            Document::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Get the fields if this is a Mapping
    pub fn as_mapping(&self) -> Option<&Fields> {
        match self {
            Document::Mapping(fields) => Some(fields),
            _ => None,
        }
    }

    /// Mutable fields if this is a Mapping
    pub fn as_mapping_mut(&mut self) -> Option<&mut Fields> {
        match self {
            Document::Mapping(fields) => Some(fields),
            _ => None,
        }
    }

    /// Look up a key if this is a Mapping
    pub fn get(&self, key: &str) -> Option<&Document> {
        self.as_mapping().and_then(|fields| fields.get(key))
    }

    /// Look up a nested value by JSON-pointer-like path (`/terms/items/0`)
    ///
    /// The empty path returns `self`. Numeric segments index sequences.
    pub fn get_path(&self, path: &str) -> Option<&Document> {
        if path.is_empty() {
            return Some(self);
        }
        let rest = path.strip_prefix('/')?;
        rest.split('/').try_fold(self, |current, segment| match current {
            Document::Mapping(fields) => fields.get(segment),
            Document::Sequence(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
    }

    /// Nesting depth (scalars are depth 0)
    pub fn depth(&self) -> usize {
        match self {
            Document::Sequence(items) => {
                1 + items.iter().map(Document::depth).max().unwrap_or(0)
            }
            Document::Mapping(fields) => {
                1 + fields.values().map(Document::depth).max().unwrap_or(0)
            }
            _ => 0,
        }
    }

    /// Serialize to compact JSON text
    ///
    /// Non-finite floats have no JSON form and are written as `null`.
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse JSON text, keeping mapping keys in document order
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Insertion-ordered mapping with unique string keys
#[derive(Debug, Clone, Default)]
pub struct Fields {
    entries: Vec<(String, Document)>,
}

impl Fields {
    /// Create an empty mapping
    pub fn new() -> Self {
        Fields {
            entries: Vec::new(),
        }
    }

    /// Create an empty mapping with room for `capacity` entries
    pub fn with_capacity(capacity: usize) -> Self {
        Fields {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Document>) -> Self {
        self.insert(key, value);
        self
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a key
    pub fn get(&self, key: &str) -> Option<&Document> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Look up a key mutably
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Document> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Check if a key is present
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Insert a value
    ///
    /// An existing key keeps its position and has its value replaced; the
    /// previous value is returned.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<Document>,
    ) -> Option<Document> {
        let key = key.into();
        let value = value.into();
        match self.get_mut(&key) {
            Some(slot) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Remove a key, preserving the order of the remaining entries
    pub fn remove(&mut self, key: &str) -> Option<Document> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    /// Iterate entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Document)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterate keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Iterate values in insertion order
    pub fn values(&self) -> impl Iterator<Item = &Document> {
        self.entries.iter().map(|(_, v)| v)
    }
}

impl PartialEq for Fields {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl<K: Into<String>, V: Into<Document>> FromIterator<(K, V)> for Fields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = Fields::new();
        for (k, v) in iter {
            fields.insert(k, v);
        }
        fields
    }
}

impl IntoIterator for Fields {
    type Item = (String, Document);
    type IntoIter = std::vec::IntoIter<(String, Document)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

// ============================================================================
// From implementations for ergonomic construction
// ============================================================================

impl From<&str> for Document {
    fn from(s: &str) -> Self {
        Document::String(s.to_string())
    }
}

impl From<String> for Document {
    fn from(s: String) -> Self {
        Document::String(s)
    }
}

impl From<bool> for Document {
    fn from(b: bool) -> Self {
        Document::Bool(b)
    }
}

impl From<i64> for Document {
    fn from(i: i64) -> Self {
        Document::Int(i)
    }
}

impl From<i32> for Document {
    fn from(i: i32) -> Self {
        Document::Int(i as i64)
    }
}

impl From<u32> for Document {
    fn from(i: u32) -> Self {
        Document::Int(i as i64)
    }
}

impl From<f64> for Document {
    fn from(f: f64) -> Self {
        Document::Float(f)
    }
}

impl From<Vec<Document>> for Document {
    fn from(items: Vec<Document>) -> Self {
        Document::Sequence(items)
    }
}

impl From<Fields> for Document {
    fn from(fields: Fields) -> Self {
        Document::Mapping(fields)
    }
}

impl From<()> for Document {
    fn from(_: ()) -> Self {
        Document::Null
    }
}

impl<T: Into<Document>> From<Option<T>> for Document {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(Document::Null)
    }
}

// ============================================================================
// serde_json interop
// ============================================================================

impl From<serde_json::Value> for Document {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Document::Null,
            serde_json::Value::Bool(b) => Document::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Document::Int(i),
                // u64 beyond i64 range and real numbers
                None => Document::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Document::String(s),
            serde_json::Value::Array(arr) => {
                Document::Sequence(arr.into_iter().map(Document::from).collect())
            }
            serde_json::Value::Object(obj) => Document::Mapping(obj.into_iter().collect()),
        }
    }
}

impl From<Document> for serde_json::Value {
    fn from(doc: Document) -> Self {
        match doc {
            Document::Null => serde_json::Value::Null,
            Document::Bool(b) => serde_json::Value::Bool(b),
            Document::Int(i) => serde_json::Value::Number(i.into()),
            Document::Float(f) => serde_json::Number::from_f64(f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Document::String(s) => serde_json::Value::String(s),
            Document::Sequence(items) => {
                serde_json::Value::Array(items.into_iter().map(serde_json::Value::from).collect())
            }
            Document::Mapping(fields) => serde_json::Value::Object(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, serde_json::Value::from(v)))
                    .collect(),
            ),
        }
    }
}

// ============================================================================
// serde: untagged, order-preserving
// ============================================================================

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Document::Null => serializer.serialize_unit(),
            Document::Bool(b) => serializer.serialize_bool(*b),
            Document::Int(i) => serializer.serialize_i64(*i),
            Document::Float(f) => serializer.serialize_f64(*f),
            Document::String(s) => serializer.serialize_str(s),
            Document::Sequence(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Document::Mapping(fields) => fields.serialize(serializer),
        }
    }
}

impl Serialize for Fields {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self.iter() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

struct DocumentVisitor;

impl<'de> Visitor<'de> for DocumentVisitor {
    type Value = Document;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a document value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Document, E> {
        Ok(Document::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Document, E> {
        Ok(Document::Int(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Document, E> {
        Ok(i64::try_from(v)
            .map(Document::Int)
            .unwrap_or(Document::Float(v as f64)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Document, E> {
        Ok(Document::Float(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Document, E> {
        Ok(Document::String(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Document, E> {
        Ok(Document::String(v))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Document, E> {
        Ok(Document::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Document, E> {
        Ok(Document::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Document, D::Error> {
        Document::deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut access: A) -> Result<Document, A::Error> {
        let mut items = Vec::with_capacity(access.size_hint().unwrap_or(0).min(1024));
        while let Some(item) = access.next_element()? {
            items.push(item);
        }
        Ok(Document::Sequence(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Document, A::Error> {
        let mut fields = Fields::with_capacity(access.size_hint().unwrap_or(0).min(1024));
        while let Some((key, value)) = access.next_entry::<String, Document>()? {
            fields.insert(key, value);
        }
        Ok(Document::Mapping(fields))
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(DocumentVisitor)
    }
}

impl<'de> Deserialize<'de> for Fields {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Document::deserialize(deserializer)? {
            Document::Mapping(fields) => Ok(fields),
            other => Err(de::Error::invalid_type(
                de::Unexpected::Other(other.type_name()),
                &"a mapping",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms() -> Document {
        Document::Mapping(
            Fields::new()
                .with("price", 100)
                .with("currency", "EUR")
                .with("express", true),
        )
    }

    #[test]
    fn test_cross_variant_inequality() {
        assert_ne!(Document::Int(1), Document::Float(1.0));
        assert_ne!(Document::from("1"), Document::Int(1));
        assert_ne!(Document::Null, Document::Bool(false));
    }

    #[test]
    fn test_float_equality_is_ieee() {
        assert_ne!(Document::Float(f64::NAN), Document::Float(f64::NAN));
        assert_eq!(Document::Float(-0.0), Document::Float(0.0));
    }

    #[test]
    fn test_fields_keep_insertion_order() {
        let doc = terms();
        let keys: Vec<_> = doc.as_mapping().unwrap().keys().collect();
        assert_eq!(keys, vec!["price", "currency", "express"]);
    }

    #[test]
    fn test_fields_replace_keeps_position() {
        let mut fields = Fields::new().with("a", 1).with("b", 2);
        let previous = fields.insert("a", 10);
        assert_eq!(previous, Some(Document::Int(1)));
        let entries: Vec<_> = fields.iter().collect();
        assert_eq!(entries[0], ("a", &Document::Int(10)));
        assert_eq!(fields.len(), 2);
    }

    #[test]
    fn test_fields_remove() {
        let mut fields = Fields::new().with("a", 1).with("b", 2).with("c", 3);
        assert_eq!(fields.remove("b"), Some(Document::Int(2)));
        assert_eq!(fields.keys().collect::<Vec<_>>(), vec!["a", "c"]);
        assert!(fields.remove("b").is_none());
    }

    #[test]
    fn test_mapping_equality_ignores_order() {
        let a = Document::Mapping(Fields::new().with("x", 1).with("y", 2));
        let b = Document::Mapping(Fields::new().with("y", 2).with("x", 1));
        assert_eq!(a, b);
    }

    #[test]
    fn test_accessors() {
        let doc = terms();
        assert_eq!(doc.get("price").and_then(Document::as_int), Some(100));
        assert_eq!(doc.get("currency").and_then(Document::as_str), Some("EUR"));
        assert_eq!(doc.get("express").and_then(Document::as_bool), Some(true));
        assert_eq!(doc.get("price").and_then(Document::as_number), Some(100.0));
        assert!(doc.get("missing").is_none());
        assert!(Document::Int(3).get("price").is_none());
    }

    #[test]
    fn test_get_path() {
        let doc = Document::Mapping(Fields::new().with(
            "order",
            Fields::new().with("items", vec![Document::from("bolt"), Document::from("nut")]),
        ));
        assert_eq!(doc.get_path("/order/items/1").and_then(Document::as_str), Some("nut"));
        assert_eq!(doc.get_path(""), Some(&doc));
        assert!(doc.get_path("/order/items/9").is_none());
        assert!(doc.get_path("order").is_none());
    }

    #[test]
    fn test_depth() {
        assert_eq!(Document::Int(1).depth(), 0);
        assert_eq!(terms().depth(), 1);
        let nested = Document::Sequence(vec![Document::Sequence(vec![Document::Null])]);
        assert_eq!(nested.depth(), 2);
    }

    #[test]
    fn test_json_text_preserves_order() {
        let text = r#"{"zeta":1,"alpha":[true,null,2.5],"mid":"m"}"#;
        let doc = Document::from_json_str(text).unwrap();
        let keys: Vec<_> = doc.as_mapping().unwrap().keys().collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
        assert_eq!(doc.to_json_string().unwrap(), text);
    }

    #[test]
    fn test_json_large_unsigned_becomes_float() {
        let doc = Document::from_json_str("18446744073709551615").unwrap();
        assert!(doc.as_float().is_some());
    }

    #[test]
    fn test_serde_json_value_interop() {
        let json = serde_json::json!({"price": 100, "tags": ["a", "b"], "ratio": 0.5});
        let doc = Document::from(json.clone());
        assert_eq!(doc.get("price"), Some(&Document::Int(100)));
        assert_eq!(doc.get("ratio"), Some(&Document::Float(0.5)));
        let back = serde_json::Value::from(doc);
        assert_eq!(back, json);
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(Document::from(None::<i64>), Document::Null);
        assert_eq!(Document::from(Some("x")), Document::from("x"));
    }
}
