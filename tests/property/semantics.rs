//! Differential tests: the matcher's aggregate cases against oracle
//! predicates written the obvious way.

use proptest::prelude::*;

use conform::{check, Error, FailureKind, LeafType, RecordType, TypeDescriptor, Value};

// ============================================================================
// STRATEGIES
// ============================================================================

/// Scalar leaf descriptors paired with nothing unsupported.
fn leaf_strategy() -> impl Strategy<Value = TypeDescriptor> {
    prop::sample::select(vec![
        TypeDescriptor::Leaf(LeafType::Bool),
        TypeDescriptor::Leaf(LeafType::Int),
        TypeDescriptor::Leaf(LeafType::Float),
        TypeDescriptor::Leaf(LeafType::Str),
        TypeDescriptor::None,
        TypeDescriptor::Any,
    ])
}

/// Scalar values.
fn scalar_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Int),
        (-1e6f64..1e6f64).prop_map(Value::Float),
        "[a-z]{0,5}".prop_map(Value::from),
    ]
}

fn matches(value: &Value, t: &TypeDescriptor) -> bool {
    match check(value, t) {
        Ok(()) => true,
        Err(Error::Mismatch(_)) => false,
        Err(Error::Unsupported(unsupported)) => {
            panic!("strategies must not produce unsupported descriptors: {unsupported}")
        }
    }
}

// ============================================================================
// DIFFERENTIAL PROPERTIES
// ============================================================================

proptest! {
    /// Differential test: a union accepts exactly when some member accepts,
    /// and a total failure carries one cause per member.
    #[test]
    fn diff_union_against_any_of(
        members in prop::collection::vec(leaf_strategy(), 0..5),
        value in scalar_strategy(),
    ) {
        let union_t = TypeDescriptor::union(members.clone());
        let oracle = members.is_empty() || members.iter().any(|m| matches(&value, m));
        prop_assert_eq!(matches(&value, &union_t), oracle);

        if !oracle {
            let err = check(&value, &union_t).unwrap_err();
            let failure = err.failure().unwrap();
            prop_assert_eq!(failure.kind(), &FailureKind::Union);
            prop_assert_eq!(failure.causes().len(), members.len());
        }
    }

    /// Differential test: a literal accepts exactly the values equal to one
    /// of its constants.
    #[test]
    fn diff_literal_against_contains(
        constants in prop::collection::vec(scalar_strategy(), 0..5),
        value in scalar_strategy(),
    ) {
        let t = TypeDescriptor::literal(constants.clone());
        let oracle = constants.iter().any(|constant| constant == &value);
        prop_assert_eq!(matches(&value, &t), oracle);
    }

    /// Differential test: a fixed tuple accepts exactly tuples of the right
    /// arity whose elements all match pairwise.
    #[test]
    fn diff_fixed_tuple_against_pairwise(
        items in prop::collection::vec(leaf_strategy(), 0..4),
        elements in prop::collection::vec(scalar_strategy(), 0..4),
    ) {
        let t = TypeDescriptor::fixed_tuple(items.clone());
        let value = Value::tuple(elements.clone());
        let oracle = elements.len() == items.len()
            && items.iter().zip(&elements).all(|(item, element)| matches(element, item));
        prop_assert_eq!(matches(&value, &t), oracle);
    }

    /// Differential test: the reported collection index is the position of
    /// the first element the item descriptor rejects.
    #[test]
    fn diff_collection_index_against_first_rejection(
        elements in prop::collection::vec(scalar_strategy(), 1..6),
        item in leaf_strategy(),
    ) {
        let t = TypeDescriptor::list(item.clone());
        let value = Value::list(elements.clone());
        let first_bad = elements.iter().position(|element| !matches(element, &item));
        match (first_bad, check(&value, &t)) {
            (Option::None, result) => prop_assert!(result.is_ok()),
            (Some(expected_idx), Err(Error::Mismatch(failure))) => {
                prop_assert_eq!(
                    failure.kind(),
                    &FailureKind::AtIdx { idx: expected_idx, ordered: true }
                );
            }
            (Some(_), result) => {
                prop_assert!(false, "expected mismatch, got {:?}", result);
            }
        }
    }

    /// Differential test: a variadic tuple accepts exactly tuples whose
    /// elements all match the item descriptor.
    #[test]
    fn diff_variadic_tuple_against_all(
        elements in prop::collection::vec(scalar_strategy(), 0..6),
        item in leaf_strategy(),
    ) {
        let t = TypeDescriptor::variadic_tuple(item.clone());
        let value = Value::tuple(elements.clone());
        let oracle = elements.iter().all(|element| matches(element, &item));
        prop_assert_eq!(matches(&value, &t), oracle);
    }

    /// Differential test: record presence checking reports exactly the
    /// required fields absent from the value, in declaration order.
    #[test]
    fn diff_record_missing_keys_against_set_difference(
        required in prop::collection::vec("[a-d]", 0..4),
        present in prop::collection::vec("[a-f]", 0..6),
    ) {
        // Dedup while keeping declaration order.
        let mut field_names: Vec<String> = Vec::new();
        for name in required {
            if !field_names.contains(&name) {
                field_names.push(name);
            }
        }
        let mut record = RecordType::new();
        for name in &field_names {
            record = record.field(name.clone(), TypeDescriptor::Any);
        }
        let t = TypeDescriptor::Record(record);
        let value = Value::Map(
            present
                .iter()
                .map(|name| (Value::Str(name.clone()), Value::Null))
                .collect(),
        );

        let expected_missing: Vec<String> = field_names
            .iter()
            .filter(|name| !present.contains(*name))
            .cloned()
            .collect();

        match check(&value, &t) {
            Ok(()) => prop_assert!(expected_missing.is_empty()),
            Err(Error::Mismatch(failure)) => {
                prop_assert_eq!(
                    failure.kind(),
                    &FailureKind::MissingKeys { keys: expected_missing }
                );
            }
            Err(other) => {
                prop_assert!(false, "unexpected error {:?}", other);
            }
        }
    }

    /// Property: `any` accepts everything and `none` accepts only null,
    /// whatever the value.
    #[test]
    fn prop_any_and_none_extremes(value in scalar_strategy()) {
        prop_assert!(matches(&value, &TypeDescriptor::Any));
        prop_assert_eq!(matches(&value, &TypeDescriptor::None), value == Value::Null);
    }

    /// Property: an unbound type variable behaves like `any`.
    #[test]
    fn prop_unbound_typevar_is_any(value in scalar_strategy()) {
        prop_assert!(matches(&value, &TypeDescriptor::type_var("T")));
    }

    /// Property: a bounded type variable agrees with its bound, modulo the
    /// wrapping failure node.
    #[test]
    fn prop_bounded_typevar_agrees_with_bound(
        bound in leaf_strategy(),
        value in scalar_strategy(),
    ) {
        let t = TypeDescriptor::bounded_var("T", bound.clone());
        prop_assert_eq!(matches(&value, &t), matches(&value, &bound));
        if let Err(Error::Mismatch(failure)) = check(&value, &t) {
            prop_assert_eq!(failure.kind(), &FailureKind::TypeVarBound);
        }
    }
}
