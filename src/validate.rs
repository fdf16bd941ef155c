//! The validation engine: recursive matching of values against descriptors.
//!
//! [`check`] is the primary entry point. Dispatch is a single exhaustive
//! match over the descriptor variant; aggregate cases recurse depth-first
//! into the value, wrap any nested failure with positional or keyed context,
//! and return it up the chain. Nothing is retried and nothing is swallowed:
//! the first divergence along the fixed traversal order is what gets
//! reported, except unions (which report every member failure) and record
//! presence checks (which report every missing key at once).
//!
//! Three outcomes are kept distinct and must not be conflated:
//!
//! 1. the value matches - `Ok(())`;
//! 2. the value does not match - [`Error::Mismatch`], carrying the failure
//!    tree;
//! 3. the descriptor cannot be interpreted (unknown alias, non-class
//!    subtype bound, an [`TypeDescriptor::Unsupported`] leaf) -
//!    [`Error::Unsupported`]. "Validation could not be performed" is not
//!    "the value is invalid".
//!
//! Recursion is bounded by the value, not the descriptor: each descent
//! consumes one layer of the (finite) value, so checks terminate even when
//! a descriptor is infinitely self-referential through aliases.

use std::cell::RefCell;
use std::fmt;

use crate::aliases;
use crate::descriptor::{
    flatten_subtype_bound, LeafType, RecordType, SubtypeBound, TypeDescriptor,
};
use crate::failure::FailureTree;
use crate::inspect;
use crate::value::Value;

// ============================================================================
// OUTCOME TYPES
// ============================================================================

/// Why a descriptor could not be interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unsupported {
    descriptor: String,
    explanation: Option<String>,
}

impl Unsupported {
    fn new(descriptor: impl fmt::Display, explanation: Option<String>) -> Self {
        Unsupported {
            descriptor: descriptor.to_string(),
            explanation,
        }
    }

    /// The spelling of the offending descriptor.
    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }

    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }
}

impl fmt::Display for Unsupported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unsupported validation for type {}.", self.descriptor)?;
        if let Some(explanation) = &self.explanation {
            write!(f, " {explanation}")?;
        }
        Ok(())
    }
}

/// Outcome of a failed or unperformable check.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// The value does not satisfy the descriptor. Always recoverable;
    /// the tree explains where and why.
    Mismatch(Box<FailureTree>),
    /// The descriptor (or some part of it) is not interpretable.
    Unsupported(Unsupported),
}

impl Error {
    fn mismatch(tree: FailureTree) -> Self {
        Error::Mismatch(Box::new(tree))
    }

    fn unsupported(descriptor: impl fmt::Display, explanation: Option<String>) -> Self {
        Error::Unsupported(Unsupported::new(descriptor, explanation))
    }

    /// The failure tree, when this is a mismatch.
    pub fn failure(&self) -> Option<&FailureTree> {
        match self {
            Error::Mismatch(tree) => Some(tree),
            Error::Unsupported(_) => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Mismatch(tree) => write!(f, "{tree}"),
            Error::Unsupported(unsupported) => write!(f, "{unsupported}"),
        }
    }
}

impl std::error::Error for Error {}

/// Wrap the failure tree of a mismatch; unsupported-descriptor errors pass
/// through untouched so they never masquerade as match failures.
fn wrap_mismatch(err: Error, wrap: impl FnOnce(FailureTree) -> FailureTree) -> Error {
    match err {
        Error::Mismatch(cause) => Error::mismatch(wrap(*cause)),
        unsupported => unsupported,
    }
}

// ============================================================================
// ENTRY POINTS
// ============================================================================

thread_local! {
    static LATEST_FAILURE: RefCell<Option<Box<FailureTree>>> = const { RefCell::new(None) };
}

/// Check a value against a type descriptor.
///
/// Returns the failure tree on mismatch; see the module docs for the
/// distinction between a mismatch and an unsupported descriptor.
///
/// ```
/// use conform::{check, LeafType, TypeDescriptor, Value};
///
/// let t = TypeDescriptor::list(TypeDescriptor::Leaf(LeafType::Int));
/// assert!(check(&Value::list([Value::Int(1)]), &t).is_ok());
/// assert!(check(&Value::list([Value::from("x")]), &t).is_err());
/// ```
pub fn check(value: &Value, descriptor: &TypeDescriptor) -> Result<(), Error> {
    check_value(value, descriptor)
}

/// Boolean convenience form of [`check`].
///
/// On mismatch the failure tree is stored in a thread-confined slot
/// retrievable with [`latest_failure`]. The slot makes this form
/// non-reentrant: a nested `is_valid` call on the same thread overwrites it.
///
/// # Panics
///
/// Panics if the descriptor is unsupported - a boolean answer would
/// conflate "validation could not be performed" with "the value is
/// invalid". Use [`check`] to handle that case as an error.
pub fn is_valid(value: &Value, descriptor: &TypeDescriptor) -> bool {
    match check(value, descriptor) {
        Ok(()) => {
            LATEST_FAILURE.with(|slot| *slot.borrow_mut() = None);
            true
        }
        Err(Error::Mismatch(tree)) => {
            LATEST_FAILURE.with(|slot| *slot.borrow_mut() = Some(tree));
            false
        }
        Err(Error::Unsupported(unsupported)) => panic!("{unsupported}"),
    }
}

/// The failure tree recorded by the most recent [`is_valid`] call on this
/// thread, or `None` if that call succeeded (or none was made).
pub fn latest_failure() -> Option<Box<FailureTree>> {
    LATEST_FAILURE.with(|slot| slot.borrow().clone())
}

/// Like [`check`], but returns the value unchanged on success, for use
/// inline in expressions and pipelines.
pub fn checked(value: Value, descriptor: &TypeDescriptor) -> Result<Value, Error> {
    check(&value, descriptor)?;
    Ok(value)
}

/// Whether validation is supported for the given descriptor.
///
/// When this returns `false`, [`check`] returns [`Error::Unsupported`] for
/// some part of the descriptor regardless of the value.
pub fn can_check(descriptor: &TypeDescriptor) -> bool {
    inspect::inspect(descriptor).supported()
}

/// A pull-based validating adapter over an iterator of values.
///
/// Produced by [`checked_iter`]. Each element is checked against the item
/// descriptor at the moment it is yielded, so infinite sources are fine and
/// a failure surfaces exactly at the offending element.
#[derive(Debug, Clone)]
pub struct CheckedIter<I> {
    inner: I,
    item: TypeDescriptor,
}

impl<I> CheckedIter<I> {
    /// The item descriptor each element is checked against.
    pub fn item_descriptor(&self) -> &TypeDescriptor {
        &self.item
    }
}

impl<I: Iterator<Item = Value>> Iterator for CheckedIter<I> {
    type Item = Result<Value, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let value = self.inner.next()?;
        Some(check(&value, &self.item).map(|()| value))
    }
}

/// Wrap an iterable in a lazily-validating adapter.
///
/// The descriptor must be a collection descriptor (aliases are resolved
/// through the active context first); its item descriptor is what each
/// yielded element is checked against. Anything else is an
/// unsupported-descriptor error. The adapter is restartable only if the
/// underlying iterable is.
pub fn checked_iter<I>(
    iterable: I,
    descriptor: &TypeDescriptor,
) -> Result<CheckedIter<I::IntoIter>, Error>
where
    I: IntoIterator<Item = Value>,
{
    let mut current = descriptor.clone();
    let mut visited: Vec<String> = Vec::new();
    loop {
        match current {
            TypeDescriptor::Alias(name) => {
                if visited.contains(&name) {
                    return Err(Error::unsupported(
                        &name,
                        Some("Alias cycle never reaches a collection descriptor.".into()),
                    ));
                }
                match aliases::resolve(&name) {
                    Some(resolved) => {
                        visited.push(name);
                        current = resolved;
                    }
                    Option::None => return Err(unresolved_alias(&name)),
                }
            }
            TypeDescriptor::Collection { item, .. } => {
                return Ok(CheckedIter {
                    inner: iterable.into_iter(),
                    item: *item,
                })
            }
            other => {
                return Err(Error::unsupported(
                    &other,
                    Some("checked_iter requires a collection descriptor.".into()),
                ))
            }
        }
    }
}

// ============================================================================
// DISPATCH
// ============================================================================

fn check_value(value: &Value, descriptor: &TypeDescriptor) -> Result<(), Error> {
    match descriptor {
        TypeDescriptor::Any => Ok(()),
        TypeDescriptor::None => match value {
            Value::Null => Ok(()),
            _ => Err(Error::mismatch(FailureTree::leaf(value, descriptor))),
        },
        TypeDescriptor::Leaf(leaf) => {
            if leaf.admits(value) {
                Ok(())
            } else {
                Err(Error::mismatch(FailureTree::leaf(value, descriptor)))
            }
        }
        TypeDescriptor::Collection { item, ordered } => {
            check_collection(value, descriptor, item, *ordered)
        }
        TypeDescriptor::Mapping { key, value: val_t } => {
            check_mapping(value, descriptor, key, val_t)
        }
        TypeDescriptor::FixedTuple(items) => check_fixed_tuple(value, descriptor, items),
        TypeDescriptor::VariadicTuple(item) => check_variadic_tuple(value, descriptor, item),
        TypeDescriptor::Union(members) => check_union(value, descriptor, members),
        TypeDescriptor::Literal(constants) => {
            if constants.iter().any(|constant| constant == value) {
                Ok(())
            } else {
                Err(Error::mismatch(FailureTree::leaf(value, descriptor)))
            }
        }
        TypeDescriptor::Record(record) => check_record(value, descriptor, record),
        TypeDescriptor::Alias(name) => check_alias(value, name),
        TypeDescriptor::TypeVar { bound, .. } => match bound {
            Some(bound) => check_value(value, bound).map_err(|err| {
                wrap_mismatch(err, |cause| {
                    FailureTree::typevar_bound(value, descriptor, cause)
                })
            }),
            Option::None => Ok(()),
        },
        TypeDescriptor::SubtypeOf(bound) => check_subtype(value, descriptor, bound),
        TypeDescriptor::Extension(ext) => {
            if ext.admits(value) {
                Ok(())
            } else {
                Err(Error::mismatch(FailureTree::extension(value, descriptor)))
            }
        }
        TypeDescriptor::Unsupported(raw) => Err(Error::unsupported(raw, Option::None)),
    }
}

/// Container-kind test, then per-item recursion, fail-fast at the first
/// failing element.
fn check_collection(
    value: &Value,
    descriptor: &TypeDescriptor,
    item: &TypeDescriptor,
    ordered: bool,
) -> Result<(), Error> {
    let elements = match (value, ordered) {
        (Value::List(items) | Value::Tuple(items), _) => items,
        (Value::Set(items), false) => items,
        _ => return Err(Error::mismatch(FailureTree::leaf(value, descriptor))),
    };
    for (idx, element) in elements.iter().enumerate() {
        check_value(element, item).map_err(|err| {
            wrap_mismatch(err, |cause| {
                FailureTree::at_idx(value, descriptor, cause, idx, ordered)
            })
        })?;
    }
    Ok(())
}

/// Keys and values pairwise, stopping at the first failing pair. A failing
/// key wraps with no key context - the key itself is unusable as a
/// diagnostic handle - while a failing value wraps at its key.
fn check_mapping(
    value: &Value,
    descriptor: &TypeDescriptor,
    key_t: &TypeDescriptor,
    val_t: &TypeDescriptor,
) -> Result<(), Error> {
    let pairs = match value {
        Value::Map(pairs) => pairs,
        _ => return Err(Error::mismatch(FailureTree::leaf(value, descriptor))),
    };
    for (key, val) in pairs {
        check_value(key, key_t).map_err(|err| {
            wrap_mismatch(err, |cause| FailureTree::wrapping(value, descriptor, cause))
        })?;
        check_value(val, val_t).map_err(|err| {
            wrap_mismatch(err, |cause| {
                FailureTree::at_key(value, descriptor, cause, key.clone())
            })
        })?;
    }
    Ok(())
}

/// Exact arity first - a length mismatch is an immediate plain failure with
/// no index - then pairwise item checks.
fn check_fixed_tuple(
    value: &Value,
    descriptor: &TypeDescriptor,
    items: &[TypeDescriptor],
) -> Result<(), Error> {
    let elements = match value {
        Value::Tuple(elements) => elements,
        _ => return Err(Error::mismatch(FailureTree::leaf(value, descriptor))),
    };
    if elements.len() != items.len() {
        return Err(Error::mismatch(FailureTree::leaf(value, descriptor)));
    }
    for (idx, (item_t, element)) in items.iter().zip(elements).enumerate() {
        check_value(element, item_t).map_err(|err| {
            wrap_mismatch(err, |cause| {
                FailureTree::at_idx(value, descriptor, cause, idx, true)
            })
        })?;
    }
    Ok(())
}

fn check_variadic_tuple(
    value: &Value,
    descriptor: &TypeDescriptor,
    item: &TypeDescriptor,
) -> Result<(), Error> {
    let elements = match value {
        Value::Tuple(elements) => elements,
        _ => return Err(Error::mismatch(FailureTree::leaf(value, descriptor))),
    };
    for (idx, element) in elements.iter().enumerate() {
        check_value(element, item).map_err(|err| {
            wrap_mismatch(err, |cause| {
                FailureTree::at_idx(value, descriptor, cause, idx, true)
            })
        })?;
    }
    Ok(())
}

/// Members in declared order, first success short-circuits. When every
/// member fails, the union failure holds all member failures. The empty
/// union vacuously succeeds.
fn check_union(
    value: &Value,
    descriptor: &TypeDescriptor,
    members: &[TypeDescriptor],
) -> Result<(), Error> {
    if members.is_empty() {
        return Ok(());
    }
    let mut member_failures = Vec::with_capacity(members.len());
    for member in members {
        match check_value(value, member) {
            Ok(()) => return Ok(()),
            Err(Error::Mismatch(failure)) => member_failures.push(*failure),
            Err(unsupported @ Error::Unsupported(_)) => return Err(unsupported),
        }
    }
    Err(Error::mismatch(FailureTree::union(
        value,
        descriptor,
        member_failures,
    )))
}

/// Record checking runs in three stages: the value must be a string-keyed
/// mapping, every required field must be present (absences are batched into
/// one failure), and each present field's value must match its descriptor.
fn check_record(
    value: &Value,
    descriptor: &TypeDescriptor,
    record: &RecordType,
) -> Result<(), Error> {
    let precondition = TypeDescriptor::map(
        TypeDescriptor::Leaf(LeafType::Str),
        TypeDescriptor::Any,
    );
    check_value(value, &precondition).map_err(|err| {
        wrap_mismatch(err, |cause| FailureTree::wrapping(value, descriptor, cause))
    })?;

    let missing: Vec<String> = record
        .fields()
        .iter()
        .filter(|field| field.required && value.get_str(&field.name).is_none())
        .map(|field| field.name.clone())
        .collect();
    if !missing.is_empty() {
        return Err(Error::mismatch(FailureTree::missing_keys(
            value, descriptor, missing,
        )));
    }

    for field in record.fields() {
        if let Some(field_value) = value.get_str(&field.name) {
            check_value(field_value, &field.descriptor).map_err(|err| {
                wrap_mismatch(err, |cause| {
                    FailureTree::at_key(
                        value,
                        descriptor,
                        cause,
                        Value::Str(field.name.clone()),
                    )
                })
            })?;
        }
    }
    Ok(())
}

fn unresolved_alias(name: &str) -> Error {
    Error::unsupported(
        name,
        Some(format!(
            "Type alias is not known. Perhaps set it with with_aliases([(\"{name}\", ...)], ...)?"
        )),
    )
}

/// Resolve the alias in the active context and check against the expansion.
/// On failure the root node is relabeled with the alias so the diagnostic
/// reads in terms of the name, not its expansion. An unresolved alias is an
/// unsupported descriptor, never a mismatch.
fn check_alias(value: &Value, name: &str) -> Result<(), Error> {
    let resolved = match aliases::resolve(name) {
        Some(resolved) => resolved,
        Option::None => return Err(unresolved_alias(name)),
    };
    check_value(value, &resolved).map_err(|err| {
        wrap_mismatch(err, |cause| cause.relabel(name))
    })
}

/// The value itself must be a class object, and the bound must flatten to
/// concrete classes; both preconditions failing is "cannot evaluate", not a
/// mismatch. The class must derive from every flattened bound class; an
/// `Any` anywhere in the bound succeeds trivially.
fn check_subtype(
    value: &Value,
    descriptor: &TypeDescriptor,
    bound: &TypeDescriptor,
) -> Result<(), Error> {
    let class = match value {
        Value::Class(class) => class,
        _ => {
            return Err(Error::unsupported(
                descriptor,
                Some("Subtype checks require the value to be a class object.".into()),
            ))
        }
    };
    let flattened = match flatten_subtype_bound(bound) {
        Some(flattened) => flattened,
        Option::None => {
            return Err(Error::unsupported(
                descriptor,
                Some("Subtype bounds must be class-like leaves or unions thereof.".into()),
            ))
        }
    };
    match flattened {
        SubtypeBound::Vacuous => Ok(()),
        SubtypeBound::Classes(supertypes) => {
            if supertypes
                .iter()
                .all(|supertype| class.is_subclass_of(supertype))
            {
                Ok(())
            } else {
                Err(Error::mismatch(FailureTree::subtype(value, descriptor)))
            }
        }
    }
}
