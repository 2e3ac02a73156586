//! Envelope metadata types.

use std::collections::HashMap;

/// Metadata travelling with an envelope: opaque string keys mapped to
/// tagged values. Never null; a new envelope starts with an empty map.
pub type Metadata = HashMap<String, MetadataValue>;

/// Possible values for metadata fields.
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    /// String value.
    String(String),
    /// Integer value.
    Int(i64),
    /// Floating-point value.
    Float(f64),
    /// Boolean value.
    Bool(bool),
    /// Raw bytes.
    Bytes(Vec<u8>),
}

impl MetadataValue {
    /// Render the value as a string for template substitution.
    ///
    /// Bytes have no string rendering and produce an empty string.
    pub fn format(&self) -> String {
        match self {
            MetadataValue::String(value) => value.clone(),
            MetadataValue::Int(value) => value.to_string(),
            MetadataValue::Float(value) => value.to_string(),
            MetadataValue::Bool(value) => value.to_string(),
            MetadataValue::Bytes(_) => String::new(),
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for MetadataValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for MetadataValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Vec<u8>> for MetadataValue {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}
