//! Entry-point conveniences: boolean form, pipeline form, lazy iteration,
//! supportability, and alias scoping as seen through the public API.

use super::common::{int, json, point_descriptor, str_t};
use conform::{
    can_check, check, checked, checked_iter, is_valid, latest_failure, with_aliases, Error,
    FailureKind, TypeDescriptor, Value,
};

#[test]
fn checked_passes_the_value_through_pipelines() {
    let values = [json("1"), json("2"), json("3")];
    let doubled: Result<Vec<Value>, Error> = values
        .into_iter()
        .map(|v| {
            checked(v, &int()).map(|v| match v {
                Value::Int(n) => Value::Int(n * 2),
                other => other,
            })
        })
        .collect();
    assert_eq!(
        doubled.unwrap(),
        vec![Value::Int(2), Value::Int(4), Value::Int(6)]
    );
}

#[test]
fn is_valid_slot_tracks_the_most_recent_call() {
    let t = TypeDescriptor::list(int());
    assert!(!is_valid(&json(r#"[1, "x"]"#), &t));
    let first = latest_failure().expect("failure should be recorded");
    assert_eq!(first.kind(), &FailureKind::AtIdx { idx: 1, ordered: true });

    // A later failure overwrites the slot.
    assert!(!is_valid(&json("\"nope\""), &t));
    let second = latest_failure().expect("failure should be recorded");
    assert_eq!(second.kind(), &FailureKind::Plain);

    // Success clears it.
    assert!(is_valid(&json("[1, 2]"), &t));
    assert!(latest_failure().is_none());
}

#[test]
#[should_panic(expected = "Unsupported validation")]
fn is_valid_refuses_to_answer_for_unsupported_descriptors() {
    is_valid(&json("1"), &TypeDescriptor::alias("Undefined"));
}

#[test]
fn checked_iter_surfaces_failures_at_the_offending_element() {
    let t = TypeDescriptor::list(int());
    let source = vec![json("1"), json("\"two\""), json("3")];
    let outcomes: Vec<bool> = checked_iter(source, &t)
        .unwrap()
        .map(|item| item.is_ok())
        .collect();
    assert_eq!(outcomes, vec![true, false, true]);
}

#[test]
fn checked_iter_is_restartable_iff_the_source_is() {
    let t = TypeDescriptor::set(int());
    let source = vec![json("1"), json("2")];
    // A cloneable source can be wrapped twice; each pass validates afresh.
    for _ in 0..2 {
        let count = checked_iter(source.clone(), &t).unwrap().count();
        assert_eq!(count, 2);
    }
}

#[test]
fn checked_iter_rejects_scalar_descriptors() {
    let err = checked_iter(Vec::<Value>::new(), &int()).unwrap_err();
    match err {
        Error::Unsupported(unsupported) => {
            assert_eq!(unsupported.descriptor(), "int");
            assert!(unsupported
                .explanation()
                .unwrap()
                .contains("collection descriptor"));
        }
        other => panic!("expected unsupported, got {other:?}"),
    }
}

#[test]
fn can_check_answers_without_a_value() {
    assert!(can_check(&point_descriptor()));
    assert!(!can_check(&TypeDescriptor::alias("Ghost")));
    with_aliases([("Ghost", str_t())], || {
        assert!(can_check(&TypeDescriptor::alias("Ghost")));
    });
}

#[test]
fn nested_alias_scopes_shadow_and_restore() {
    let value = json("\"text\"");
    with_aliases([("T", int())], || {
        assert!(check(&value, &TypeDescriptor::alias("T")).is_err());
        with_aliases([("T", str_t())], || {
            assert!(check(&value, &TypeDescriptor::alias("T")).is_ok());
        });
        // Outer binding is back in force.
        assert!(check(&value, &TypeDescriptor::alias("T")).is_err());
    });
    assert!(matches!(
        check(&value, &TypeDescriptor::alias("T")),
        Err(Error::Unsupported(_))
    ));
}

#[test]
fn mutually_recursive_aliases_resolve_within_one_scope() {
    // A tree of alternating node kinds: Odd wraps Even, Even wraps Odd.
    let odd = TypeDescriptor::union([int(), TypeDescriptor::list(TypeDescriptor::alias("Even"))]);
    let even = TypeDescriptor::union([str_t(), TypeDescriptor::list(TypeDescriptor::alias("Odd"))]);
    // Outer list items are Even; "a" is a str Even, and [1, ["b"]] nests an
    // Odd int and another Even underneath.
    let value = json(r#"["a", [1, ["b"]]]"#);
    with_aliases([("Odd", odd), ("Even", even)], || {
        assert!(check(&value, &TypeDescriptor::alias("Odd")).is_ok());
    });
}

#[test]
fn unsupported_error_message_names_the_alias_and_the_remedy() {
    let err = check(&json("0"), &TypeDescriptor::alias("Shape")).unwrap_err();
    let message = err.to_string();
    assert!(message.starts_with("Unsupported validation for type Shape."));
    assert!(message.contains("with_aliases"));
}

#[test]
fn record_spec_scenarios() {
    let t = point_descriptor();
    // Missing required field.
    let err = check(&json("{}"), &t).unwrap_err();
    assert_eq!(
        err.failure().unwrap().kind(),
        &FailureKind::MissingKeys { keys: vec!["x".into()] }
    );
    // Optional field absent.
    assert!(check(&json(r#"{"x": 1}"#), &t).is_ok());
    // Required field present but wrong.
    let err = check(&json(r#"{"x": "a"}"#), &t).unwrap_err();
    assert_eq!(
        err.failure().unwrap().kind(),
        &FailureKind::AtKey { key: Value::from("x") }
    );
}
