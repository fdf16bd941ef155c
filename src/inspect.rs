//! Dry-run traversal of descriptors: supportability probing with no value.
//!
//! [`inspect`] mirrors the matcher's dispatch, but instead of consuming a
//! value each case appends a record of the variant it visited (and its
//! arguments) to an append-only constructor trace, then recurses into
//! sub-descriptors unconditionally. Unlike the matcher it does not stop at
//! the first unsupported leaf - every unsupported leaf in the tree is
//! recorded and the traversal continues.
//!
//! The trace can then be replayed: [`Inspection::canonical`] rebuilds a
//! canonical descriptor from it, and [`Inspection::structure`] renders an
//! indented tree view of the descriptor shape, analogous to the failure
//! rendering but over shape rather than failures:
//!
//! ```text
//! tuple[
//!   list[
//!     str
//!   ],
//!   union[
//!     int,
//!     Unsupported[
//!       maybe[str]
//!     ],
//!   ],
//! ]
//! ```

use std::fmt;

use crate::aliases;
use crate::descriptor::{
    flatten_subtype_bound, ExtensionType, LeafType, RecordType, TypeDescriptor,
};
use crate::value::Value;

/// One recorded constructor visit. Aggregate entries carry only their own
/// arguments (arity, field skeleton); sub-descriptors follow in the trace.
#[derive(Debug, Clone, PartialEq)]
enum TraceEntry {
    Any,
    None,
    Leaf(LeafType),
    Literal(Vec<Value>),
    Collection { ordered: bool },
    Mapping,
    FixedTuple(usize),
    VariadicTuple,
    Union(usize),
    Record {
        name: Option<String>,
        fields: Vec<(String, bool)>,
    },
    TypeVar { name: String, bounded: bool },
    Alias(String),
    Subtype,
    Extension(ExtensionType),
    Unsupported(String),
}

/// Result of probing a descriptor, see [`inspect`].
#[derive(Debug, Clone, PartialEq)]
pub struct Inspection {
    trace: Vec<TraceEntry>,
    unsupported: Vec<String>,
}

/// Probe a descriptor for supportability without a concrete value.
///
/// Alias leaves are judged against the alias context active at probe time:
/// a resolvable alias is a supported leaf (its expansion is not traversed -
/// recursive aliases would never terminate), an unresolvable one is
/// unsupported.
pub fn inspect(descriptor: &TypeDescriptor) -> Inspection {
    let mut inspection = Inspection {
        trace: Vec::new(),
        unsupported: Vec::new(),
    };
    inspection.record(descriptor);
    inspection
}

impl Inspection {
    /// True iff no unsupported leaf was recorded anywhere in the traversal.
    pub fn supported(&self) -> bool {
        self.unsupported.is_empty()
    }

    /// The unsupported spellings, in traversal order.
    pub fn unsupported(&self) -> &[String] {
        &self.unsupported
    }

    /// Replay the trace into a canonical descriptor.
    ///
    /// Unsupported leaves stay in place as [`TypeDescriptor::Unsupported`];
    /// everything else reconstructs structurally.
    pub fn canonical(&self) -> TypeDescriptor {
        let (descriptor, last) = self.canonical_at(0);
        debug_assert_eq!(
            last,
            self.trace.len() - 1,
            "trace replay must consume every recorded constructor"
        );
        descriptor
    }

    /// Single-line annotation form of the canonical descriptor, with
    /// unsupported leaves left unwrapped.
    pub fn annotation(&self) -> String {
        self.canonical().to_string()
    }

    /// Multi-line, indented view of the descriptor shape. Unsupported
    /// leaves are wrapped in `Unsupported[...]` blocks.
    pub fn structure(&self) -> String {
        let (lines, _) = self.render_at(0, 0);
        lines.join("\n")
    }

    // ------------------------------------------------------------------
    // Probe
    // ------------------------------------------------------------------

    fn record(&mut self, descriptor: &TypeDescriptor) {
        match descriptor {
            TypeDescriptor::Any => self.trace.push(TraceEntry::Any),
            TypeDescriptor::None => self.trace.push(TraceEntry::None),
            TypeDescriptor::Leaf(leaf) => self.trace.push(TraceEntry::Leaf(leaf.clone())),
            TypeDescriptor::Literal(values) => {
                self.trace.push(TraceEntry::Literal(values.clone()));
            }
            TypeDescriptor::Collection { item, ordered } => {
                self.trace.push(TraceEntry::Collection { ordered: *ordered });
                self.record(item);
            }
            TypeDescriptor::Mapping { key, value } => {
                self.trace.push(TraceEntry::Mapping);
                self.record(key);
                self.record(value);
            }
            TypeDescriptor::FixedTuple(items) => {
                self.trace.push(TraceEntry::FixedTuple(items.len()));
                for item in items {
                    self.record(item);
                }
            }
            TypeDescriptor::VariadicTuple(item) => {
                self.trace.push(TraceEntry::VariadicTuple);
                self.record(item);
            }
            TypeDescriptor::Union(members) => {
                self.trace.push(TraceEntry::Union(members.len()));
                for member in members {
                    self.record(member);
                }
            }
            TypeDescriptor::Record(record) => {
                self.trace.push(TraceEntry::Record {
                    name: record.name().map(str::to_string),
                    fields: record
                        .fields()
                        .iter()
                        .map(|field| (field.name.clone(), field.required))
                        .collect(),
                });
                for field in record.fields() {
                    self.record(&field.descriptor);
                }
            }
            TypeDescriptor::TypeVar { name, bound } => {
                self.trace.push(TraceEntry::TypeVar {
                    name: name.clone(),
                    bounded: bound.is_some(),
                });
                if let Some(bound) = bound {
                    self.record(bound);
                }
            }
            TypeDescriptor::Alias(name) => {
                if aliases::resolve(name).is_some() {
                    self.trace.push(TraceEntry::Alias(name.clone()));
                } else {
                    self.record_unsupported(name.clone());
                }
            }
            TypeDescriptor::SubtypeOf(bound) => {
                if flatten_subtype_bound(bound).is_some() {
                    self.trace.push(TraceEntry::Subtype);
                    self.record(bound);
                } else {
                    self.record_unsupported(descriptor.to_string());
                }
            }
            TypeDescriptor::Extension(ext) => {
                self.trace.push(TraceEntry::Extension(ext.clone()));
            }
            TypeDescriptor::Unsupported(raw) => self.record_unsupported(raw.clone()),
        }
    }

    fn record_unsupported(&mut self, spelling: String) {
        self.unsupported.push(spelling.clone());
        self.trace.push(TraceEntry::Unsupported(spelling));
    }

    // ------------------------------------------------------------------
    // Replay
    // ------------------------------------------------------------------

    /// Rebuild the descriptor rooted at trace position `idx`; returns it
    /// with the index of the last entry it consumed.
    fn canonical_at(&self, idx: usize) -> (TypeDescriptor, usize) {
        match &self.trace[idx] {
            TraceEntry::Any => (TypeDescriptor::Any, idx),
            TraceEntry::None => (TypeDescriptor::None, idx),
            TraceEntry::Leaf(leaf) => (TypeDescriptor::Leaf(leaf.clone()), idx),
            TraceEntry::Literal(values) => {
                (TypeDescriptor::Literal(values.clone()), idx)
            }
            TraceEntry::Alias(name) => (TypeDescriptor::alias(name.clone()), idx),
            TraceEntry::Extension(ext) => (TypeDescriptor::Extension(ext.clone()), idx),
            TraceEntry::Unsupported(raw) => {
                (TypeDescriptor::Unsupported(raw.clone()), idx)
            }
            TraceEntry::Collection { ordered } => {
                let (item, last) = self.canonical_at(idx + 1);
                (
                    TypeDescriptor::Collection {
                        item: Box::new(item),
                        ordered: *ordered,
                    },
                    last,
                )
            }
            TraceEntry::Mapping => {
                let (key, after_key) = self.canonical_at(idx + 1);
                let (value, last) = self.canonical_at(after_key + 1);
                (TypeDescriptor::map(key, value), last)
            }
            TraceEntry::FixedTuple(arity) => {
                let mut items = Vec::with_capacity(*arity);
                let mut last = idx;
                for _ in 0..*arity {
                    let (item, next) = self.canonical_at(last + 1);
                    items.push(item);
                    last = next;
                }
                (TypeDescriptor::FixedTuple(items), last)
            }
            TraceEntry::VariadicTuple => {
                let (item, last) = self.canonical_at(idx + 1);
                (TypeDescriptor::variadic_tuple(item), last)
            }
            TraceEntry::Union(arity) => {
                let mut members = Vec::with_capacity(*arity);
                let mut last = idx;
                for _ in 0..*arity {
                    let (member, next) = self.canonical_at(last + 1);
                    members.push(member);
                    last = next;
                }
                (TypeDescriptor::Union(members), last)
            }
            TraceEntry::Record { name, fields } => {
                let mut record = match name {
                    Some(name) => RecordType::named(name.clone()),
                    Option::None => RecordType::new(),
                };
                let mut last = idx;
                for (field_name, required) in fields {
                    let (field_t, next) = self.canonical_at(last + 1);
                    record = if *required {
                        record.field(field_name.clone(), field_t)
                    } else {
                        record.optional(field_name.clone(), field_t)
                    };
                    last = next;
                }
                (TypeDescriptor::Record(record), last)
            }
            TraceEntry::TypeVar { name, bounded } => {
                if *bounded {
                    let (bound, last) = self.canonical_at(idx + 1);
                    (TypeDescriptor::bounded_var(name.clone(), bound), last)
                } else {
                    (TypeDescriptor::type_var(name.clone()), idx)
                }
            }
            TraceEntry::Subtype => {
                let (bound, last) = self.canonical_at(idx + 1);
                (TypeDescriptor::subtype_of(bound), last)
            }
        }
    }

    // ------------------------------------------------------------------
    // Structure rendering
    // ------------------------------------------------------------------

    fn render_at(&self, idx: usize, level: usize) -> (Vec<String>, usize) {
        let indent = "  ".repeat(level);
        match &self.trace[idx] {
            TraceEntry::Any => (vec![format!("{indent}any")], idx),
            TraceEntry::None => (vec![format!("{indent}none")], idx),
            TraceEntry::Leaf(leaf) => (vec![format!("{indent}{leaf}")], idx),
            TraceEntry::Literal(values) => {
                let listed = values
                    .iter()
                    .map(Value::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                (vec![format!("{indent}literal[{listed}]")], idx)
            }
            TraceEntry::Alias(name) => (vec![format!("{indent}'{name}'")], idx),
            TraceEntry::Extension(ext) => {
                (vec![format!("{indent}@{}", ext.name())], idx)
            }
            TraceEntry::Unsupported(raw) => (
                vec![
                    format!("{indent}Unsupported["),
                    format!("{indent}    {raw}"),
                    format!("{indent}]"),
                ],
                idx,
            ),
            TraceEntry::Collection { ordered } => {
                let (item, last) = self.render_at(idx + 1, level + 1);
                let head = if *ordered { "list" } else { "set" };
                let mut lines = vec![format!("{indent}{head}[")];
                lines.extend(item);
                lines.push(format!("{indent}]"));
                (lines, last)
            }
            TraceEntry::Mapping => {
                let (key, after_key) = self.render_at(idx + 1, level + 1);
                let (value, last) = self.render_at(after_key + 1, level + 1);
                (bracket_block(&indent, "map", vec![key, value]), last)
            }
            TraceEntry::FixedTuple(arity) => {
                if *arity == 0 {
                    return (vec![format!("{indent}tuple[]")], idx);
                }
                let mut children = Vec::with_capacity(*arity);
                let mut last = idx;
                for _ in 0..*arity {
                    let (child, next) = self.render_at(last + 1, level + 1);
                    children.push(child);
                    last = next;
                }
                (bracket_block(&indent, "tuple", children), last)
            }
            TraceEntry::VariadicTuple => {
                let (item, last) = self.render_at(idx + 1, level + 1);
                let mut lines = vec![format!("{indent}tuple[")];
                let mut item = item;
                if let Some(tail) = item.last_mut() {
                    tail.push(',');
                }
                lines.extend(item);
                lines.push(format!("{}...", "  ".repeat(level + 1)));
                lines.push(format!("{indent}]"));
                (lines, last)
            }
            TraceEntry::Union(arity) => {
                if *arity == 0 {
                    return (vec![format!("{indent}union[]")], idx);
                }
                let mut children = Vec::with_capacity(*arity);
                let mut last = idx;
                for _ in 0..*arity {
                    let (child, next) = self.render_at(last + 1, level + 1);
                    children.push(child);
                    last = next;
                }
                (bracket_block(&indent, "union", children), last)
            }
            TraceEntry::Record { name, fields } => {
                let head = match name {
                    Some(name) => format!("{indent}{name} {{"),
                    Option::None => format!("{indent}{{"),
                };
                let mut lines = vec![head];
                let field_indent = "  ".repeat(level + 1);
                let mut last = idx;
                for (field_name, required) in fields {
                    let (mut child, next) = self.render_at(last + 1, level + 1);
                    let marker = if *required { "" } else { "?" };
                    child[0] = format!(
                        "{field_indent}{field_name}{marker}: {}",
                        child[0].trim_start()
                    );
                    if let Some(tail) = child.last_mut() {
                        tail.push(',');
                    }
                    lines.extend(child);
                    last = next;
                }
                lines.push(format!("{indent}}}"));
                (lines, last)
            }
            TraceEntry::TypeVar { name, bounded } => {
                if !*bounded {
                    return (vec![format!("{indent}${name}")], idx);
                }
                let (bound, last) = self.render_at(idx + 1, level + 1);
                let mut lines = vec![format!("{indent}${name} bound=(")];
                lines.extend(bound);
                lines.push(format!("{indent})"));
                (lines, last)
            }
            TraceEntry::Subtype => {
                let (bound, last) = self.render_at(idx + 1, level + 1);
                let mut lines = vec![format!("{indent}type[")];
                lines.extend(bound);
                lines.push(format!("{indent}]"));
                (lines, last)
            }
        }
    }
}

/// Open a `head[` bracket, splice in the child blocks with trailing commas,
/// and close it at the same indent.
fn bracket_block(indent: &str, head: &str, children: Vec<Vec<String>>) -> Vec<String> {
    let mut lines = vec![format!("{indent}{head}[")];
    for mut child in children {
        if let Some(tail) = child.last_mut() {
            tail.push(',');
        }
        lines.extend(child);
    }
    lines.push(format!("{indent}]"));
    lines
}

impl fmt::Display for Inspection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.supported() {
            writeln!(f, "The following type can be validated against:")?;
        } else {
            writeln!(f, "The following type cannot be validated against:")?;
        }
        f.write_str(&self.structure())
    }
}
