//! Properties of the annotation reader: totality on arbitrary input and
//! agreement between rendered descriptors and reparsed ones.

use proptest::prelude::*;

use conform::{parse_annotation, RecordType, TypeDescriptor};

proptest! {
    /// Property: the parser is total - any input yields `Ok` or an error
    /// whose offset lies within the source, never a panic.
    #[test]
    fn prop_parser_never_panics(source in "[a-z\\[\\]{}|,:?$.\"\\\\ 0-9-]{0,40}") {
        match parse_annotation(&source) {
            Ok(_) => {}
            Err(err) => prop_assert!(err.offset() <= source.len()),
        }
    }

    /// Property: well-formed single-field records parse for any field name,
    /// and the optional marker controls the field's requiredness.
    #[test]
    fn prop_record_fields_round_trip(
        name in "[a-z_][a-z0-9_]{0,8}",
        optional in any::<bool>(),
    ) {
        let marker = if optional { "?" } else { "" };
        let source = format!("{{{name}{marker}: int}}");
        let parsed = parse_annotation(&source).unwrap();
        let expected = if optional {
            RecordType::new().optional(
                name.clone(),
                parse_annotation("int").unwrap(),
            )
        } else {
            RecordType::new().field(name.clone(), parse_annotation("int").unwrap())
        };
        prop_assert_eq!(parsed, TypeDescriptor::Record(expected));
    }

    /// Property: string constants survive a parse/render/parse cycle
    /// whatever their content.
    #[test]
    fn prop_literal_strings_round_trip(content in "[a-zA-Z0-9 \\\\\"\n\t]{0,12}") {
        let escaped = content
            .replace('\\', "\\\\")
            .replace('"', "\\\"")
            .replace('\n', "\\n")
            .replace('\t', "\\t");
        let source = format!("literal[\"{escaped}\"]");
        let parsed = parse_annotation(&source).unwrap();
        let reparsed = parse_annotation(&parsed.to_string()).unwrap();
        prop_assert_eq!(parsed, reparsed);
    }

    /// Property: whitespace between tokens never changes the parse.
    #[test]
    fn prop_whitespace_insensitive(pad in "[ \t\n]{0,3}") {
        let tight = parse_annotation("map[str,list[int|none]]").unwrap();
        let padded = format!("map[{pad}str{pad},{pad}list[{pad}int{pad}|{pad}none{pad}]{pad}]{pad}");
        prop_assert_eq!(parse_annotation(&padded).unwrap(), tight);
    }
}
