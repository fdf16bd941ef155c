//! Runtime validation of dynamic values against declarative type descriptors.
//!
//! A [`TypeDescriptor`] describes a type - generic containers, mappings,
//! fixed and variadic tuples, unions, literal constants, structural records
//! with optional fields, recursive named aliases, bounded type variables,
//! subtype assertions. [`check`] walks a [`Value`] against a descriptor and,
//! on divergence, returns a [`FailureTree`] explaining exactly where and why
//! the value fell short.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌───────────────┐     ┌──────────────┐
//! │  value.rs   │────▶│ descriptor.rs │────▶│ validate.rs  │
//! │   (Value,   │     │(TypeDescriptor,│    │   (check,    │
//! │   Class)    │     │   LeafType)   │     │ checked_iter)│
//! └─────────────┘     └───────────────┘     └──────────────┘
//!                             │                    │
//!                      ┌──────┴──────┐             ▼
//!                      │ aliases.rs  │      ┌─────────────┐
//!                      │(with_aliases)│────▶│ failure.rs  │
//!                      └─────────────┘      │(FailureTree)│
//!                             │             └─────────────┘
//!        ┌─────────────┐      ▼
//!        │annotation.rs│ ┌─────────────┐
//!        │  (parse_    │ │ inspect.rs  │
//!        │ annotation) │ │ (Inspection)│
//!        └─────────────┘ └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```
//! use conform::{check, parse_annotation, Value};
//!
//! let descriptor = parse_annotation("list[int | map[str, str]]").unwrap();
//! let good: Value = serde_json::from_str(r#"[1, {"a": "b"}]"#).unwrap();
//! assert!(check(&good, &descriptor).is_ok());
//!
//! let bad: Value = serde_json::from_str(r#"[1, {"a": 0}]"#).unwrap();
//! let err = check(&bad, &descriptor).unwrap_err();
//! println!("{err}"); // indented explanation down to the offending value
//! ```
//!
//! Recursive types work through scoped aliases:
//!
//! ```
//! use conform::{check, parse_annotation, with_aliases, Value};
//!
//! let json_t = parse_annotation(
//!     "int | float | bool | none | str | list[JSON] | map[str, JSON]",
//! )
//! .unwrap();
//! let doc: Value =
//!     serde_json::from_str(r#"[1, 2.2, {"a": ["Hello", null, {"b": true}]}]"#).unwrap();
//! with_aliases([("JSON", json_t)], || {
//!     assert!(check(&doc, &parse_annotation("list[JSON]").unwrap()).is_ok());
//! });
//! ```

// Module declarations
mod aliases;
mod annotation;
mod descriptor;
mod failure;
mod inspect;
pub mod testing;
mod validate;
mod value;

// Re-exports for public API
pub use aliases::with_aliases;
pub use annotation::{parse_annotation, ParseError};
pub use descriptor::{ExtensionType, LeafType, RecordField, RecordType, TypeDescriptor};
pub use failure::{FailureKind, FailureTree};
pub use inspect::{inspect, Inspection};
pub use validate::{
    can_check, check, checked, checked_iter, is_valid, latest_failure, CheckedIter, Error,
    Unsupported,
};
pub use value::{Class, Value, ValueKind};
