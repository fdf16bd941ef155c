//! Scoped alias bindings for resolving named type indirections.
//!
//! The alias table is thread-confined: each thread carries its own stack of
//! scopes, and concurrent checks never observe each other's activations.
//! [`with_aliases`] pushes a merged copy of the innermost table extended
//! with the new bindings and pops it on every exit path - the pop lives in
//! a drop guard, so a panic propagating out of the body still restores the
//! outer scope. Inner bindings shadow outer ones for the inner scope only.

use std::cell::RefCell;
use std::collections::BTreeMap;

use crate::descriptor::TypeDescriptor;

thread_local! {
    static SCOPES: RefCell<Vec<BTreeMap<String, TypeDescriptor>>> =
        const { RefCell::new(Vec::new()) };
}

/// Run `body` with the given alias bindings active.
///
/// Bindings may refer to themselves or to each other through
/// [`TypeDescriptor::Alias`]; resolution happens lazily at check time, which
/// is what allows recursive type definitions:
///
/// ```
/// use conform::{check, with_aliases, TypeDescriptor, Value};
///
/// let nested = TypeDescriptor::union([
///     TypeDescriptor::Leaf(conform::LeafType::Int),
///     TypeDescriptor::list(TypeDescriptor::alias("Nested")),
/// ]);
/// let value = Value::list([
///     Value::Int(1),
///     Value::list([Value::Int(2), Value::list([])]),
/// ]);
/// with_aliases([("Nested", nested)], || {
///     assert!(check(&value, &TypeDescriptor::alias("Nested")).is_ok());
/// });
/// ```
pub fn with_aliases<N, I, R>(bindings: I, body: impl FnOnce() -> R) -> R
where
    N: Into<String>,
    I: IntoIterator<Item = (N, TypeDescriptor)>,
{
    let mut merged = SCOPES.with(|scopes| scopes.borrow().last().cloned().unwrap_or_default());
    merged.extend(bindings.into_iter().map(|(name, t)| (name.into(), t)));
    SCOPES.with(|scopes| scopes.borrow_mut().push(merged));
    let _guard = ScopeGuard;
    body()
}

struct ScopeGuard;

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        SCOPES.with(|scopes| {
            scopes.borrow_mut().pop();
        });
    }
}

/// Resolve an alias in the innermost active scope.
pub(crate) fn resolve(name: &str) -> Option<TypeDescriptor> {
    SCOPES.with(|scopes| {
        scopes
            .borrow()
            .last()
            .and_then(|table| table.get(name).cloned())
    })
}

/// Snapshot of the active bindings, for failure-tree rendering.
pub(crate) fn current_bindings() -> Vec<(String, TypeDescriptor)> {
    SCOPES.with(|scopes| {
        scopes
            .borrow()
            .last()
            .map(|table| {
                table
                    .iter()
                    .map(|(name, t)| (name.clone(), t.clone()))
                    .collect()
            })
            .unwrap_or_default()
    })
}
