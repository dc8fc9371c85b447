//! Schema-less document representation shared by all backends.
//!
//! Backends translate [`AttributeMap`] to and from their native item type;
//! the marshaller never sees a backend SDK type.

use std::collections::HashMap;

/// A single loosely-typed attribute value.
///
/// Mirrors the attribute kinds common to key-value document services.
/// Numbers are kept as their decimal string form so no precision is lost
/// in transit.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    /// UTF-8 string.
    S(String),
    /// Decimal number in string form.
    N(String),
    /// Opaque binary data.
    B(Vec<u8>),
    Bool(bool),
    Null,
    /// Ordered list of values.
    L(Vec<AttributeValue>),
    /// Nested document.
    M(AttributeMap),
}

impl AttributeValue {
    /// Short name of the value's kind, used in decode errors.
    pub fn kind(&self) -> &'static str {
        match self {
            AttributeValue::S(_) => "string",
            AttributeValue::N(_) => "number",
            AttributeValue::B(_) => "binary",
            AttributeValue::Bool(_) => "bool",
            AttributeValue::Null => "null",
            AttributeValue::L(_) => "list",
            AttributeValue::M(_) => "map",
        }
    }

    pub fn as_s(&self) -> Option<&str> {
        match self {
            AttributeValue::S(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_b(&self) -> Option<&[u8]> {
        match self {
            AttributeValue::B(b) => Some(b),
            _ => None,
        }
    }
}

/// A document: attribute name to value.
pub type AttributeMap = HashMap<String, AttributeValue>;
