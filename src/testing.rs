//! Test utilities shared across unit and integration tests.
//!
//! This module is always compiled but hidden from documentation.
//! It provides canonical implementations of test fixtures to avoid
//! duplication.

#![doc(hidden)]

use crate::descriptor::{LeafType, RecordType, TypeDescriptor};
use crate::value::Value;

/// Parse a JSON document into a [`Value`].
///
/// Panics on malformed JSON; this is a test helper, feed it literals.
pub fn json(source: &str) -> Value {
    let parsed: serde_json::Value =
        serde_json::from_str(source).expect("test fixture must be valid JSON");
    Value::from(parsed)
}

/// The recursive JSON descriptor, for use under an alias binding named
/// `"JSON"`: scalars, lists of JSON, and string-keyed maps of JSON.
pub fn json_descriptor() -> TypeDescriptor {
    TypeDescriptor::union([
        TypeDescriptor::Leaf(LeafType::Int),
        TypeDescriptor::Leaf(LeafType::Float),
        TypeDescriptor::Leaf(LeafType::Bool),
        TypeDescriptor::None,
        TypeDescriptor::Leaf(LeafType::Str),
        TypeDescriptor::list(TypeDescriptor::alias("JSON")),
        TypeDescriptor::map(
            TypeDescriptor::Leaf(LeafType::Str),
            TypeDescriptor::alias("JSON"),
        ),
    ])
}

/// A record with one required and one optional field:
/// `{x: int, y?: float}`.
pub fn point_descriptor() -> TypeDescriptor {
    TypeDescriptor::from(
        RecordType::new()
            .field("x", TypeDescriptor::Leaf(LeafType::Int))
            .optional("y", TypeDescriptor::Leaf(LeafType::Float)),
    )
}
