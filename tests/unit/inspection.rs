//! Structural inspection through the public API: supportability verdicts,
//! canonical reconstruction, and the shape rendering.

use super::common::{int, str_t};
use conform::{
    inspect, with_aliases, Class, ExtensionType, RecordType, TypeDescriptor,
};

#[test]
fn display_header_reflects_the_verdict() {
    let good = inspect(&TypeDescriptor::list(int()));
    assert!(good
        .to_string()
        .starts_with("The following type can be validated against:\n"));

    let bad = inspect(&TypeDescriptor::list(TypeDescriptor::Unsupported("??".into())));
    assert!(bad
        .to_string()
        .starts_with("The following type cannot be validated against:\n"));
}

#[test]
fn unsupported_leaves_are_listed_in_traversal_order() {
    let t = TypeDescriptor::map(
        TypeDescriptor::Unsupported("first".into()),
        TypeDescriptor::fixed_tuple([
            int(),
            TypeDescriptor::Unsupported("second".into()),
            TypeDescriptor::alias("third"),
        ]),
    );
    let inspection = inspect(&t);
    assert_eq!(inspection.unsupported(), ["first", "second", "third"]);
}

#[test]
fn alias_support_depends_on_the_active_scope() {
    let t = TypeDescriptor::list(TypeDescriptor::alias("Node"));
    assert!(!inspect(&t).supported());
    with_aliases([("Node", int())], || {
        let inspection = inspect(&t);
        assert!(inspection.supported());
        // The alias stays folded in the canonical form.
        assert_eq!(inspection.canonical(), t);
    });
}

#[test]
fn canonical_preserves_extensions_and_classes() {
    let class = Class::new("Widget");
    let t = TypeDescriptor::fixed_tuple([
        TypeDescriptor::instance_of(class),
        TypeDescriptor::Extension(ExtensionType::new("positive", |_| true)),
    ]);
    let inspection = inspect(&t);
    assert!(inspection.supported());
    assert_eq!(inspection.canonical(), t);
}

#[test]
fn structure_spells_out_bounded_type_variables() {
    let t = TypeDescriptor::bounded_var("N", TypeDescriptor::union([int(), str_t()]));
    assert_eq!(
        inspect(&t).structure(),
        "$N bound=(\n\
         \x20\x20union[\n\
         \x20\x20\x20\x20int,\n\
         \x20\x20\x20\x20str,\n\
         \x20\x20]\n\
         )"
    );
}

#[test]
fn structure_spells_out_subtype_bounds() {
    let t = TypeDescriptor::subtype_of(TypeDescriptor::instance_of(Class::new("Base")));
    assert_eq!(inspect(&t).structure(), "type[\n\x20\x20Base\n]");
}

#[test]
fn annotation_of_a_named_record_is_its_name() {
    let t = TypeDescriptor::from(RecordType::named("Config").field("port", int()));
    let inspection = inspect(&t);
    assert_eq!(inspection.annotation(), "Config");
    assert_eq!(
        inspection.structure(),
        "Config {\n\x20\x20port: int,\n}"
    );
}

#[test]
fn variadic_tuple_structure_shows_the_ellipsis() {
    let t = TypeDescriptor::variadic_tuple(int());
    assert_eq!(
        inspect(&t).structure(),
        "tuple[\n\x20\x20int,\n\x20\x20...\n]"
    );
}

#[test]
fn probing_needs_no_value_and_leaves_no_trace_behind() {
    // Two inspections of unrelated descriptors do not interfere.
    let first = inspect(&TypeDescriptor::list(int()));
    let second = inspect(&TypeDescriptor::set(str_t()));
    assert_eq!(first.canonical(), TypeDescriptor::list(int()));
    assert_eq!(second.canonical(), TypeDescriptor::set(str_t()));
}
