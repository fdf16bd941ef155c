//! Failure trees: the causal-chain record of why a check failed.
//!
//! Every failing check produces exactly one [`FailureTree`]. The tree is
//! built bottom-up as the recursion unwinds: a failure at a nested level is
//! wrapped by its parent's own node, so the root holds the full path from
//! the outermost descriptor down to the innermost mismatch. Nodes are
//! immutable once the check returns and carry everything needed to render
//! an explanation - rendering never re-runs validation.
//!
//! The `Display` impl produces the indented multi-line form:
//!
//! ```text
//! Runtime validation error raised by check(val, t), details below.
//! For type list[int | map[str, str]], invalid value at idx: 1
//!   For union type int | map[str, str], invalid value: {"hi": 0}
//!     Not of the following member types: int.
//!     Not of member type map[str, str], details below:
//!       For type str, invalid value: 0
//! ```

use std::fmt;

use crate::aliases;
use crate::descriptor::TypeDescriptor;
use crate::value::Value;

/// How a failure node was produced.
#[derive(Debug, Clone, PartialEq)]
pub enum FailureKind {
    /// Leaf mismatch, or an aggregate whose precondition failed.
    Plain,
    /// Every union member rejected the value; causes hold all member
    /// failures in declared member order.
    Union,
    /// An element of an ordered or unordered container failed. For
    /// unordered containers the index reflects one iteration order and is
    /// not reproducible across runs.
    AtIdx { idx: usize, ordered: bool },
    /// A mapping value (or record field) failed under the given key.
    AtKey { key: Value },
    /// Required record fields absent from the value - batched, all of them.
    MissingKeys { keys: Vec<String> },
    /// The bound of a type variable rejected the value.
    TypeVarBound,
    /// The checked class is not a subclass of the asserted bound.
    Subtype,
    /// A registered extension predicate rejected the value.
    Extension,
}

/// One node of a failure tree.
#[derive(Debug, Clone, PartialEq)]
pub struct FailureTree {
    value: Value,
    descriptor: TypeDescriptor,
    kind: FailureKind,
    causes: Vec<FailureTree>,
    /// Alias bindings active when the node was built. Rendered only at the
    /// root, so nested nodes carry them without printing them.
    aliases: Vec<(String, TypeDescriptor)>,
}

impl FailureTree {
    fn node(
        value: &Value,
        descriptor: &TypeDescriptor,
        kind: FailureKind,
        causes: Vec<FailureTree>,
    ) -> Self {
        FailureTree {
            value: value.clone(),
            descriptor: descriptor.clone(),
            kind,
            causes,
            aliases: aliases::current_bindings(),
        }
    }

    /// Plain leaf mismatch with no further structure.
    pub(crate) fn leaf(value: &Value, descriptor: &TypeDescriptor) -> Self {
        Self::node(value, descriptor, FailureKind::Plain, Vec::new())
    }

    /// Plain mismatch wrapping a nested cause (mapping-key failures, record
    /// precondition failures).
    pub(crate) fn wrapping(
        value: &Value,
        descriptor: &TypeDescriptor,
        cause: FailureTree,
    ) -> Self {
        Self::node(value, descriptor, FailureKind::Plain, vec![cause])
    }

    /// Union node holding every member failure.
    pub(crate) fn union(
        value: &Value,
        descriptor: &TypeDescriptor,
        member_failures: Vec<FailureTree>,
    ) -> Self {
        debug_assert!(
            member_failures.iter().all(|cause| cause.value == *value),
            "union causes must concern the union's own value"
        );
        Self::node(value, descriptor, FailureKind::Union, member_failures)
    }

    pub(crate) fn at_idx(
        value: &Value,
        descriptor: &TypeDescriptor,
        cause: FailureTree,
        idx: usize,
        ordered: bool,
    ) -> Self {
        Self::node(
            value,
            descriptor,
            FailureKind::AtIdx { idx, ordered },
            vec![cause],
        )
    }

    pub(crate) fn at_key(
        value: &Value,
        descriptor: &TypeDescriptor,
        cause: FailureTree,
        key: Value,
    ) -> Self {
        Self::node(value, descriptor, FailureKind::AtKey { key }, vec![cause])
    }

    pub(crate) fn missing_keys(
        value: &Value,
        descriptor: &TypeDescriptor,
        keys: Vec<String>,
    ) -> Self {
        debug_assert!(!keys.is_empty(), "missing-keys node with no keys");
        Self::node(value, descriptor, FailureKind::MissingKeys { keys }, Vec::new())
    }

    pub(crate) fn typevar_bound(
        value: &Value,
        descriptor: &TypeDescriptor,
        cause: FailureTree,
    ) -> Self {
        Self::node(value, descriptor, FailureKind::TypeVarBound, vec![cause])
    }

    pub(crate) fn subtype(value: &Value, descriptor: &TypeDescriptor) -> Self {
        Self::node(value, descriptor, FailureKind::Subtype, Vec::new())
    }

    pub(crate) fn extension(value: &Value, descriptor: &TypeDescriptor) -> Self {
        Self::node(value, descriptor, FailureKind::Extension, Vec::new())
    }

    /// Relabel the node's descriptor with the alias it was reached through,
    /// so the diagnostic reads in terms of the alias rather than its
    /// expansion.
    pub(crate) fn relabel(mut self, alias: &str) -> Self {
        self.descriptor = TypeDescriptor::Alias(alias.to_string());
        self
    }

    /// The offending value.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// The descriptor the value was checked against.
    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    pub fn kind(&self) -> &FailureKind {
        &self.kind
    }

    /// The nested failures that caused this one.
    pub fn causes(&self) -> &[FailureTree] {
        &self.causes
    }

    /// Pre-order visit of the failure tree.
    ///
    /// Applies `fun` to this node with the accumulator, then recurses into
    /// every cause with the returned accumulator. Useful for building
    /// custom views of the tree without re-running validation.
    pub fn visit<A, F>(&self, fun: &mut F, acc: &A)
    where
        F: FnMut(&FailureTree, &A) -> A,
    {
        let next = fun(self, acc);
        for cause in &self.causes {
            cause.visit(fun, &next);
        }
    }

    fn type_descr(&self) -> &'static str {
        match (&self.kind, self.descriptor.is_alias()) {
            (FailureKind::Union, true) => "union type alias",
            (FailureKind::Union, false) => "union type",
            (_, true) => "type alias",
            (_, false) => "type",
        }
    }

    fn summary(&self) -> String {
        let t = &self.descriptor;
        match &self.kind {
            FailureKind::Plain | FailureKind::Union => {
                format!(
                    "For {} {t}, invalid value: {}",
                    self.type_descr(),
                    self.value
                )
            }
            FailureKind::AtIdx { idx, ordered: true } => {
                format!("For {} {t}, invalid value at idx: {idx}", self.type_descr())
            }
            FailureKind::AtIdx { idx, ordered: false } => {
                format!(
                    "For {} {t}, invalid value at sampled idx: {idx}",
                    self.type_descr()
                )
            }
            FailureKind::AtKey { key } => {
                format!("For {} {t}, invalid value at key: {key}", self.type_descr())
            }
            FailureKind::MissingKeys { keys } => {
                let listed = keys
                    .iter()
                    .map(|key| format!("{key:?}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("For {} {t}, missing required keys: {listed}", self.type_descr())
            }
            FailureKind::TypeVarBound => {
                format!(
                    "For type variable {t}, value does not satisfy bound: {}",
                    self.value
                )
            }
            FailureKind::Subtype => {
                format!("For {} {t}, invalid subclass: {}", self.type_descr(), self.value)
            }
            FailureKind::Extension => {
                format!(
                    "For extension {} {t}, invalid value: {}",
                    self.type_descr(),
                    self.value
                )
            }
        }
    }

    fn render(&self, top_level: bool) -> String {
        let mut lines: Vec<String> = Vec::new();
        if top_level {
            lines.push("Runtime validation error raised by check(val, t), details below.".into());
            if !self.aliases.is_empty() {
                lines.push("Validation type aliases:".into());
                lines.push("{".into());
                for (name, t) in &self.aliases {
                    lines.push(format!("    '{name}': {t}"));
                }
                lines.push("}".into());
            }
        }
        lines.push(self.summary());
        if matches!(self.kind, FailureKind::Union) {
            self.render_union_causes(&mut lines);
        } else {
            for cause in &self.causes {
                lines.push(indent(&cause.render(false)));
            }
        }
        lines.join("\n")
    }

    /// Union causes split into leaf failures (one summarized line) and
    /// expandable failures (nested blocks).
    fn render_union_causes(&self, lines: &mut Vec<String>) {
        let (expandable, leaves): (Vec<_>, Vec<_>) =
            self.causes.iter().partition(|cause| !cause.causes.is_empty());
        let leaf_types = || {
            leaves
                .iter()
                .map(|cause| cause.descriptor.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        };
        if !leaves.is_empty() && !expandable.is_empty() {
            lines.push(indent(&format!(
                "Not of the following member types: {}.",
                leaf_types()
            )));
        } else if !leaves.is_empty() {
            lines.push(indent(&format!("Not of any member type: {}.", leaf_types())));
        } else if expandable.is_empty() {
            lines.push("Type union is empty.".into());
        }
        for cause in expandable {
            lines.push(indent(&format!(
                "Not of member type {}, details below:",
                cause.descriptor
            )));
            for sub_cause in &cause.causes {
                lines.push(indent(&indent(&sub_cause.render(false))));
            }
        }
    }
}

/// Indent a block of text (possibly with newlines) by two spaces.
fn indent(text: &str) -> String {
    let ind = "  ";
    format!("{ind}{}", text.replace('\n', "\n  "))
}

impl fmt::Display for FailureTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(true))
    }
}
