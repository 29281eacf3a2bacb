//! Record payloads stored in blocks.
//!
//! A [`Record`] is an ordered mapping of string keys to primitive values. The
//! ledger never interprets the fields; it only requires that every value can
//! be canonically encoded for hashing.

use crate::error::{ChainError, Result};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A primitive value held by a record field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl FieldValue {
    /// Non-finite floats have no canonical JSON form.
    pub fn is_canonical(&self) -> bool {
        match self {
            FieldValue::Float(f) => f.is_finite(),
            _ => true,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Int(i) => write!(f, "{}", i),
            FieldValue::Float(x) => write!(f, "{}", x),
            FieldValue::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        FieldValue::Int(v.into())
    }
}

impl From<u32> for FieldValue {
    fn from(v: u32) -> Self {
        FieldValue::Int(v.into())
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Str(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Str(v)
    }
}

/// Ordered key/value payload. Insertion order is kept for display; hashing
/// sorts keys independently of it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, FieldValue)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the four-field patient entry used by the medical ledger.
    pub fn patient(patient_id: &str, name: &str, age: u32, diagnosis: &str) -> Self {
        Record::new()
            .with("patient_id", patient_id)
            .with("name", name)
            .with("age", age)
            .with("diagnosis", diagnosis)
    }

    /// Builder form of [`Record::insert`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Sets `key`, replacing an existing value in place so the key keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Option<FieldValue> {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.fields.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Fails with [`ChainError::Serialization`] naming the first field that
    /// cannot be canonically encoded.
    pub fn check_canonical(&self) -> Result<()> {
        for (key, value) in &self.fields {
            if !value.is_canonical() {
                return Err(ChainError::Serialization(format!(
                    "field '{}' holds a non-finite number ({})",
                    key, value
                )));
            }
        }
        Ok(())
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

struct RecordVisitor;

impl<'de> Visitor<'de> for RecordVisitor {
    type Value = Record;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of string keys to primitive values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Record, A::Error> {
        let mut record = Record::new();
        while let Some((key, value)) = access.next_entry::<String, FieldValue>()? {
            record.insert(key, value);
        }
        Ok(record)
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Record, D::Error> {
        deserializer.deserialize_map(RecordVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patient_record_fields_in_order() {
        let record = Record::patient("P001", "Surya", 30, "Fever");
        let keys: Vec<&str> = record.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["patient_id", "name", "age", "diagnosis"]);
        assert_eq!(record.get("age"), Some(&FieldValue::Int(30)));
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut record = Record::new().with("a", 1).with("b", 2);
        let old = record.insert("a", "x");
        assert_eq!(old, Some(FieldValue::Int(1)));
        assert_eq!(record.len(), 2);
        assert_eq!(record.iter().next(), Some(("a", &FieldValue::from("x"))));
    }

    #[test]
    fn test_non_finite_float_rejected() {
        let record = Record::new().with("temp", f64::NAN);
        let err = record.check_canonical().unwrap_err();
        assert!(matches!(err, ChainError::Serialization(msg) if msg.contains("temp")));

        assert!(Record::new().with("temp", 37.5).check_canonical().is_ok());
    }

    #[test]
    fn test_json_shape() {
        let record = Record::new().with("z", true).with("a", 2.5);
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"z":true,"a":2.5}"#);

        let back: Record = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
