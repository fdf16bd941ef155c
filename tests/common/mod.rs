//! Shared test utilities and fixtures.

#![allow(dead_code)]

use conform::{LeafType, TypeDescriptor};

// Re-export canonical fixtures from conform::testing
pub use conform::testing::{json, json_descriptor, point_descriptor};

pub fn int() -> TypeDescriptor {
    TypeDescriptor::Leaf(LeafType::Int)
}

pub fn float_t() -> TypeDescriptor {
    TypeDescriptor::Leaf(LeafType::Float)
}

pub fn bool_t() -> TypeDescriptor {
    TypeDescriptor::Leaf(LeafType::Bool)
}

pub fn str_t() -> TypeDescriptor {
    TypeDescriptor::Leaf(LeafType::Str)
}
