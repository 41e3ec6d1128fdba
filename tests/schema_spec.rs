use ebml_reader::ebml::schema::lex::{Lexer, TokenKind};
use ebml_reader::{Cardinality, EbmlError, ElemType, RangeClause, Schema, Varint};

fn schema(src: &str) -> Schema {
    Schema::parse(src.as_bytes()).expect("schema parses")
}

fn wire_id(bytes: &[u8]) -> Varint {
    Varint::parse(bytes).expect("id parses")
}

fn be64(v: u64) -> Vec<u8> {
    v.to_be_bytes().to_vec()
}

#[test]
fn lexer_splits_schema_source() {
    let src = r#"
        define types {
            bool := uint [ range:0..1; ]
        }
        define elements {

            // comments disappear between tokens
            TimecodeScale := 2ad7b1 uint [ def:1000000; ]
            Duration := 4489 float [ range:>0.0; ]

            Language := 22b59c string [ def:"eng"; range:32..126; ]
    "#;

    let expected: &[(TokenKind, &str)] = &[
        (TokenKind::AlphaNum, "define"),
        (TokenKind::AlphaNum, "types"),
        (TokenKind::Control, "{"),
        (TokenKind::AlphaNum, "bool"),
        (TokenKind::Control, ":="),
        (TokenKind::AlphaNum, "uint"),
        (TokenKind::Control, "["),
        (TokenKind::AlphaNum, "range"),
        (TokenKind::Control, ":"),
        (TokenKind::AlphaNum, "0..1"),
        (TokenKind::Control, ";"),
        (TokenKind::Control, "]"),
        (TokenKind::Control, "}"),
        (TokenKind::AlphaNum, "define"),
        (TokenKind::AlphaNum, "elements"),
        (TokenKind::Control, "{"),
        (TokenKind::AlphaNum, "TimecodeScale"),
        (TokenKind::Control, ":="),
        (TokenKind::AlphaNum, "2ad7b1"),
        (TokenKind::AlphaNum, "uint"),
        (TokenKind::Control, "["),
        (TokenKind::AlphaNum, "def"),
        (TokenKind::Control, ":"),
        (TokenKind::AlphaNum, "1000000"),
        (TokenKind::Control, ";"),
        (TokenKind::Control, "]"),
        (TokenKind::AlphaNum, "Duration"),
        (TokenKind::Control, ":="),
        (TokenKind::AlphaNum, "4489"),
        (TokenKind::AlphaNum, "float"),
        (TokenKind::Control, "["),
        (TokenKind::AlphaNum, "range"),
        (TokenKind::Control, ":"),
        (TokenKind::AlphaNum, ">0.0"),
        (TokenKind::Control, ";"),
        (TokenKind::Control, "]"),
        (TokenKind::AlphaNum, "Language"),
        (TokenKind::Control, ":="),
        (TokenKind::AlphaNum, "22b59c"),
        (TokenKind::AlphaNum, "string"),
        (TokenKind::Control, "["),
        (TokenKind::AlphaNum, "def"),
        (TokenKind::Control, ":"),
        (TokenKind::QuotedString, "\"eng\""),
        (TokenKind::Control, ";"),
        (TokenKind::AlphaNum, "range"),
        (TokenKind::Control, ":"),
        (TokenKind::AlphaNum, "32..126"),
        (TokenKind::Control, ";"),
        (TokenKind::Control, "]"),
        (TokenKind::Eof, ""),
    ];

    let mut lex = Lexer::new(src.as_bytes());
    for (i, (kind, val)) in expected.iter().enumerate() {
        let tok = lex.next_token();
        assert_eq!(tok.kind, *kind, "kind at index {i} (val '{}')", tok.val);
        assert_eq!(tok.val, *val, "val at index {i}");
    }
}

#[test]
fn lexer_reports_invalid_utf8() {
    let mut lex = Lexer::new(&[0xff, 0x20][..]);
    let tok = lex.next_token();
    assert_eq!(tok.kind, TokenKind::Err);
    assert_eq!(tok.val, "invalid utf8 character");
}

#[test]
fn implicit_elements_are_seeded() {
    let s = schema("");
    assert_eq!(s.len(), 11);

    let ebml = s.get(wire_id(&[0x1a, 0x45, 0xdf, 0xa3])).expect("EBML");
    assert_eq!(ebml.name, "EBML");
    assert_eq!(ebml.kind, ElemType::Container);
    assert_eq!(ebml.card, Cardinality::OneOrMore);
    assert_eq!(ebml.level, 0);

    let version = s.get(wire_id(&[0x42, 0x86])).expect("EBMLVersion");
    assert_eq!(version.name, "EBMLVersion");
    assert_eq!(version.kind, ElemType::Uint);
    assert_eq!(version.default, Some(be64(1)));
    assert_eq!(version.level, 1);
    assert_eq!(version.card, Cardinality::ZeroOrOnce);

    let max_id = s.get(wire_id(&[0x42, 0xf2])).expect("EBMLMaxIDLength");
    assert_eq!(max_id.default, Some(be64(4)));
    let max_size = s.get(wire_id(&[0x42, 0xf3])).expect("EBMLMaxSizeLength");
    assert_eq!(max_size.default, Some(be64(8)));

    let doc_type = s.get(wire_id(&[0x42, 0x82])).expect("DocType");
    assert_eq!(doc_type.kind, ElemType::String);
    assert_eq!(
        doc_type.ranges,
        vec![RangeClause::Int {
            lower: 32,
            upper: 126
        }]
    );
    assert!(!doc_type.must_match_default);

    let crc = s.get(wire_id(&[0xc3])).expect("CRC32");
    assert_eq!(crc.kind, ElemType::Container);
    assert_eq!(crc.card, Cardinality::ZeroOrMore);
    assert_eq!(crc.level, 0);

    let crc_value = s.get(wire_id(&[0x42, 0xfe])).expect("CRC32Value");
    assert_eq!(crc_value.kind, ElemType::Binary);
    assert_eq!(crc_value.size, 4);
    assert_eq!(crc_value.level, 1);

    let void = s.get(wire_id(&[0xec])).expect("Void");
    assert_eq!(void.kind, ElemType::Binary);
    assert_eq!(void.card, Cardinality::ZeroOrMore);
}

#[test]
fn type_aliases_copy_everything_but_identity() {
    let s = schema(
        r#"
        define types {
            bool := uint [ range:0..1; ]
            ascii := string [ range:32..126; ]
        }

        define elements {
            Foo := 53ab bool [ def:1; ]
            Bar := 53ac bool [ card:?; ]
        }
        "#,
    );

    let bool_range = vec![RangeClause::Uint { lower: 0, upper: 1 }];

    let foo = s.get(wire_id(&[0x53, 0xab])).expect("Foo");
    assert_eq!(foo.name, "Foo");
    assert_eq!(foo.kind, ElemType::Uint);
    assert_eq!(foo.default, Some(be64(1)));
    assert_eq!(foo.ranges, bool_range);

    let bar = s.get(wire_id(&[0x53, 0xac])).expect("Bar");
    assert_eq!(bar.name, "Bar");
    assert_eq!(bar.kind, ElemType::Uint);
    assert_eq!(bar.card, Cardinality::ZeroOrOnce);
    assert_eq!(bar.default, None);
    assert_eq!(bar.ranges, bool_range);

    // Alias lookups are case-insensitive and keep the constraint set.
    assert!(s.alias("bool").is_some());
    assert_eq!(
        s.alias("ASCII").expect("ascii alias").kind,
        ElemType::String
    );
}

#[test]
fn header_entries_pin_values() {
    let s = schema(
        r#"
        define header {
            DocType := "matroska";
            EBMLVersion := 1;
        }
        "#,
    );

    let doc_type = s.get(wire_id(&[0x42, 0x82])).expect("DocType");
    assert_eq!(doc_type.default.as_deref(), Some(&b"matroska"[..]));
    assert!(doc_type.must_match_default);

    let version = s.get(wire_id(&[0x42, 0x86])).expect("EBMLVersion");
    assert_eq!(version.default, Some(be64(1)));
    assert!(version.must_match_default);
}

#[test]
fn float_range_chains_keep_source_order() {
    let s = schema(
        "define elements { Duration := 4489 float [ range:>=1.0,<2.0,-6.5<..<7.2,-6.5<=..<=7.2; ] }",
    );

    let duration = s.get(wire_id(&[0x44, 0x89])).expect("Duration");
    assert_eq!(
        duration.ranges,
        vec![
            RangeClause::Float {
                lower: 1.0,
                upper: f64::MAX,
                exclusive_lower: false,
                exclusive_upper: false,
            },
            RangeClause::Float {
                lower: -f64::MAX,
                upper: 2.0,
                exclusive_lower: true,
                exclusive_upper: true,
            },
            RangeClause::Float {
                lower: -6.5,
                upper: 7.2,
                exclusive_lower: true,
                exclusive_upper: true,
            },
            RangeClause::Float {
                lower: -6.5,
                upper: 7.2,
                exclusive_lower: false,
                exclusive_upper: false,
            },
        ]
    );
}

#[test]
fn range_clause_may_end_the_parameter_list() {
    let s = schema("define elements { Foo := 53ab float [ def:1; range:>0.0 ] }");

    let foo = s.get(wire_id(&[0x53, 0xab])).expect("Foo");
    assert_eq!(foo.default, Some(1.0f64.to_be_bytes().to_vec()));
    assert_eq!(
        foo.ranges,
        vec![RangeClause::Float {
            lower: 0.0,
            upper: f64::MAX,
            exclusive_lower: true,
            exclusive_upper: true,
        }]
    );
}

#[test]
fn int_range_forms() {
    let s = schema("define elements { Foo := 53ab int [ range:0..1,..1,-5..,0; ] }");

    let foo = s.get(wire_id(&[0x53, 0xab])).expect("Foo");
    assert_eq!(
        foo.ranges,
        vec![
            RangeClause::Int { lower: 0, upper: 1 },
            RangeClause::Int {
                lower: i64::MIN,
                upper: 1
            },
            RangeClause::Int {
                lower: -5,
                upper: i64::MAX
            },
            RangeClause::Int { lower: 0, upper: 0 },
        ]
    );
}

#[test]
fn uint_range_rejects_open_negative_start() {
    let err = Schema::parse(&b"define elements { Foo := 53ab uint [ range:..1; ] }"[..])
        .expect_err("open lower bound on uint");
    assert!(matches!(err, EbmlError::InvalidRange(_)), "got {err:?}");
}

#[test]
fn unknown_type_is_fatal() {
    let err = Schema::parse(&b"define elements { Foo := 80 gizmo; }"[..])
        .expect_err("gizmo is not a type or alias");
    assert!(matches!(err, EbmlError::UnknownType(_)), "got {err:?}");
}

#[test]
fn unknown_header_name_is_fatal() {
    let err = Schema::parse(&b"define header { Nope := 1; }"[..])
        .expect_err("Nope was never declared");
    assert!(matches!(err, EbmlError::UnknownHeaderName(_)), "got {err:?}");
}

#[test]
fn user_declarations_override_implicit_ids() {
    let s = schema("define elements { Void := ec uint [ def:7; ] }");

    let void = s.get(wire_id(&[0xec])).expect("Void");
    assert_eq!(void.kind, ElemType::Uint);
    assert_eq!(void.default, Some(be64(7)));
}

#[test]
fn parsing_is_deterministic() {
    let src = r#"
        define types { bool := uint [ range:0..1; ] }
        define elements {
            Foo := 53ab bool [ def:1; ]
            Parent := 53ac container [ card:*; ] {
                Child := 53ad string [ def:"x"; ]
            }
        }
    "#;
    assert_eq!(schema(src), schema(src));
}

#[test]
fn string_defaults_take_hex_or_quoted_literals() {
    let s = schema(
        r#"
        define elements {
            Hexed := 53ab string [ def:0x616263; ]
            Quoted := 53ac string [ def:"a\"b"; ]
            Reference := 53ad uint [ def:TimecodeScale; ]
            BadHex := 53ae string [ def:0xzz; ]
        }
        "#,
    );

    assert_eq!(
        s.get(wire_id(&[0x53, 0xab])).expect("Hexed").default.as_deref(),
        Some(&b"abc"[..])
    );
    assert_eq!(
        s.get(wire_id(&[0x53, 0xac])).expect("Quoted").default.as_deref(),
        Some(&b"a\"b"[..])
    );
    // A value that names another field leaves no default, as does a
    // hex literal that fails to decode.
    assert_eq!(s.get(wire_id(&[0x53, 0xad])).expect("Reference").default, None);
    assert_eq!(s.get(wire_id(&[0x53, 0xae])).expect("BadHex").default, None);
}

#[test]
fn annotated_iterator_joins_schema() {
    let s = schema("");

    // An EBML container holding one DocType string child.
    let data: &[u8] = &[
        0x1a, 0x45, 0xdf, 0xa3, 0x87, // EBML, size 7
        0x42, 0x82, 0x84, b'w', b'e', b'b', b'm', // DocType "webm"
    ];
    let mut iter = s.iter_elems(data);

    let ebml = iter.next_elem().expect("reads").expect("EBML present");
    assert_eq!(ebml.name, "EBML");
    assert_eq!(ebml.kind, ElemType::Container);
    assert_eq!(ebml.level, 0);
    assert_eq!(ebml.size.value(), 7);
    assert!(ebml.bytes().is_empty(), "container bodies stay unread");

    let doc_type = iter.next_elem().expect("reads").expect("DocType present");
    assert_eq!(doc_type.name, "DocType");
    assert_eq!(doc_type.kind, ElemType::String);
    assert_eq!(doc_type.level, 1);
    assert_eq!(doc_type.str(), "webm");

    // Write-back: the materialized child reproduces its bytes, the
    // container only its header.
    let mut out = Vec::new();
    ebml.write(&mut out).expect("write succeeds");
    doc_type.write(&mut out).expect("write succeeds");
    assert_eq!(out, data);

    assert!(iter.next_elem().expect("clean end").is_none());
}

#[test]
fn queued_records_come_first() {
    let s = schema("");
    let data: &[u8] = &[0x1a, 0x45, 0xdf, 0xa3, 0x80];
    let mut iter = s.iter_elems(data);

    let ebml = iter.next_elem().expect("reads").expect("EBML present");
    iter.queue(ebml.clone());

    let replayed = iter.next_elem().expect("reads").expect("queued record");
    assert_eq!(replayed, ebml);
    assert!(iter.next_elem().expect("clean end").is_none());
}

#[test]
fn declare_and_define_are_interchangeable() {
    let s = schema(
        r#"
        declare elements {
            One := 53ab uint [ card:*; ]
            Two := 53ac uint [ card:1; ]
            Three := 53ad uint [ card:+; ]
        }
        "#,
    );
    assert_eq!(
        s.get(wire_id(&[0x53, 0xab])).expect("One").card,
        Cardinality::ZeroOrMore
    );
    assert_eq!(
        s.get(wire_id(&[0x53, 0xac])).expect("Two").card,
        Cardinality::ExactlyOnce
    );
    assert_eq!(
        s.get(wire_id(&[0x53, 0xad])).expect("Three").card,
        Cardinality::OneOrMore
    );
}

#[test]
fn child_block_on_primitive_is_fatal() {
    let err = Schema::parse(&b"define elements { Foo := 80 uint { } }"[..])
        .expect_err("only containers have children");
    assert!(matches!(err, EbmlError::Syntax { .. }), "got {err:?}");
}

#[test]
fn unknown_directive_is_fatal() {
    let err =
        Schema::parse(&b"define gizmos { }"[..]).expect_err("gizmos is not a block kind");
    assert!(matches!(err, EbmlError::Syntax { .. }), "got {err:?}");
}

#[test]
fn truncated_declaration_is_eof() {
    let err = Schema::parse(&b"define elements { Foo := 80 uint"[..])
        .expect_err("source ends mid-declaration");
    assert!(matches!(err, EbmlError::UnexpectedEof(_)), "got {err:?}");
}

#[test]
fn constraints_on_unsupported_types_are_fatal() {
    let err = Schema::parse(&b"define elements { Foo := 53ab date [ def:1; ] }"[..])
        .expect_err("dates have no default form");
    assert!(matches!(err, EbmlError::UnsupportedParam(_)), "got {err:?}");

    let err = Schema::parse(&b"define elements { Foo := 53ab date [ range:0..1; ] }"[..])
        .expect_err("dates have no range form");
    assert!(matches!(err, EbmlError::UnsupportedParam(_)), "got {err:?}");
}

#[test]
fn plain_interval_is_not_a_float_range() {
    let err = Schema::parse(&b"define elements { Foo := 53ab float [ range:1.0..2.0; ] }"[..])
        .expect_err("floats need the bracketed or prefixed forms");
    assert!(matches!(err, EbmlError::InvalidRange(_)), "got {err:?}");
}

#[test]
fn unknown_stream_id_is_fatal() {
    let s = schema("");
    let data: &[u8] = &[0x81, 0x80];
    let mut iter = s.iter_elems(data);

    let err = iter.next_elem().expect_err("0x81 is not declared");
    assert!(matches!(err, EbmlError::UnknownElementId(_)), "got {err:?}");
}
