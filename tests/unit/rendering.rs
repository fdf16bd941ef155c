//! Golden tests for failure-tree rendering.
//!
//! The rendering is part of the contract: it must be deterministic for a
//! given tree and locate the offending value without re-running anything.

use super::common::{bool_t, float_t, int, json, str_t};
use conform::{
    check, with_aliases, Class, ExtensionType, RecordType, TypeDescriptor, Value,
};

fn rendered(value: &Value, t: &TypeDescriptor) -> String {
    check(value, t).unwrap_err().to_string()
}

#[test]
fn plain_leaf_failure() {
    assert_eq!(
        rendered(&json("12"), &str_t()),
        "Runtime validation error raised by check(val, t), details below.\n\
         For type str, invalid value: 12"
    );
}

#[test]
fn missing_keys_lists_every_absent_required_field() {
    let t = TypeDescriptor::from(
        RecordType::new()
            .field("x", int())
            .field("y", float_t())
            .optional("label", str_t()),
    );
    assert_eq!(
        rendered(&json("{}"), &t),
        "Runtime validation error raised by check(val, t), details below.\n\
         For type {x: int, y: float, label?: str}, missing required keys: \"x\", \"y\""
    );
}

#[test]
fn mapping_key_failures_have_no_key_context() {
    let t = TypeDescriptor::map(str_t(), int());
    let value = Value::map([(Value::Int(1), Value::Int(2))]);
    assert_eq!(
        rendered(&value, &t),
        "Runtime validation error raised by check(val, t), details below.\n\
         For type map[str, int], invalid value: {1: 2}\n\
         \x20\x20For type str, invalid value: 1"
    );
}

#[test]
fn unordered_container_indices_are_marked_sampled() {
    let t = TypeDescriptor::set(int());
    let value = Value::set([Value::from("x")]);
    let text = rendered(&value, &t);
    assert!(text.contains("invalid value at sampled idx: 0"));
    assert!(!text.contains("invalid value at idx:"));
}

#[test]
fn typevar_bound_failures_name_the_variable() {
    let t = TypeDescriptor::bounded_var("N", int());
    assert_eq!(
        rendered(&json("\"x\""), &t),
        "Runtime validation error raised by check(val, t), details below.\n\
         For type variable $N, value does not satisfy bound: \"x\"\n\
         \x20\x20For type int, invalid value: \"x\""
    );
}

#[test]
fn subtype_failures_show_the_rejected_class() {
    let base = Class::new("Base");
    let free = Class::new("Free");
    let t = TypeDescriptor::subtype_of(TypeDescriptor::instance_of(base));
    assert_eq!(
        rendered(&Value::Class(free), &t),
        "Runtime validation error raised by check(val, t), details below.\n\
         For type type[Base], invalid subclass: <class Free>"
    );
}

#[test]
fn extension_failures_use_the_extension_name() {
    let even = TypeDescriptor::Extension(ExtensionType::new("even", |value| {
        matches!(value, Value::Int(n) if n % 2 == 0)
    }));
    assert_eq!(
        rendered(&json("3"), &even),
        "Runtime validation error raised by check(val, t), details below.\n\
         For extension type @even, invalid value: 3"
    );
}

#[test]
fn literal_failures_list_the_constants() {
    let t = TypeDescriptor::literal([Value::from("on"), Value::from("off")]);
    assert_eq!(
        rendered(&json("\"x\""), &t),
        "Runtime validation error raised by check(val, t), details below.\n\
         For type literal[\"on\", \"off\"], invalid value: \"x\""
    );
}

#[test]
fn union_of_leaves_only_renders_one_summary_line() {
    let t = TypeDescriptor::union([bool_t(), int()]);
    assert_eq!(
        rendered(&json("\"x\""), &t),
        "Runtime validation error raised by check(val, t), details below.\n\
         For union type bool | int, invalid value: \"x\"\n\
         \x20\x20Not of any member type: bool, int."
    );
}

#[test]
fn alias_header_lists_bindings_in_name_order() {
    with_aliases(
        [("Beta", str_t()), ("Alpha", int())],
        || {
            let text = rendered(&json("null"), &TypeDescriptor::alias("Alpha"));
            let alpha = text.find("    'Alpha': int").expect("Alpha binding shown");
            let beta = text.find("    'Beta': str").expect("Beta binding shown");
            assert!(alpha < beta);
        },
    );
}

#[test]
fn rendering_is_stable_across_repeated_formatting() {
    let t = TypeDescriptor::list(TypeDescriptor::union([int(), TypeDescriptor::list(int())]));
    let err = check(&json(r#"[[1, "x"]]"#), &t).unwrap_err();
    assert_eq!(err.to_string(), err.to_string());
}

#[test]
fn visit_exposes_the_causal_path() {
    let t = TypeDescriptor::list(TypeDescriptor::map(str_t(), int()));
    let err = check(&json(r#"[{"a": "b"}]"#), &t).unwrap_err();
    let failure = err.failure().unwrap();

    let mut path: Vec<String> = Vec::new();
    failure.visit(
        &mut |node, _: &()| {
            path.push(node.descriptor().to_string());
        },
        &(),
    );
    assert_eq!(path, vec!["list[map[str, int]]", "map[str, int]", "int"]);
}
