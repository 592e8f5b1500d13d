//! Grammar tests through the top-level `parse` entry point.

use pretty_assertions::assert_eq;
use protoparse::parser::ast::*;
use protoparse::{parse, parse_with_config, ParseError, ParserConfig, ProtoError, TokenKind};

fn message(file: &ProtoFile, index: usize) -> &Message {
    match &file.body[index] {
        TopLevelDirective::Message(m) => m,
        other => panic!("expected message, got {}", other.kind_name()),
    }
}

fn parse_body(body: &str) -> Vec<MessageBody> {
    let file = parse(&format!("message M {{ {} }}", body)).unwrap();
    message(&file, 0).body.clone()
}

#[test]
fn test_top_level_directive_count() {
    let src = r#"
        syntax = "proto2";
        import "a.proto";
        import weak "b.proto";
        import public "c.proto";
        ;
        package foo.bar;
        option java_package = "com.example";
        ;;
        message A {}
        enum B { X = 0; }
    "#;
    let file = parse(src).unwrap();
    assert_eq!(file.version(), SyntaxVersion::Proto2);
    let kinds: Vec<_> = file.body.iter().map(|d| d.kind_name()).collect();
    assert_eq!(
        kinds,
        vec!["import", "import", "import", "package", "option", "message", "enum"]
    );
}

#[test]
fn test_missing_syntax_defaults_to_proto2() {
    let file = parse("package x;").unwrap();
    assert!(file.syntax.is_none());
    assert_eq!(file.version(), SyntaxVersion::Proto2);
}

#[test]
fn test_imports() {
    let file = parse(r#"import "plain.proto"; import weak 'w.proto'; import public "p.proto";"#).unwrap();
    let imports: Vec<_> = file
        .body
        .iter()
        .map(|d| match d {
            TopLevelDirective::Import(i) => (i.file.as_str(), i.modifier),
            _ => panic!("expected import"),
        })
        .collect();
    assert_eq!(
        imports,
        vec![
            ("plain.proto", None),
            ("w.proto", Some(ImportModifier::Weak)),
            ("p.proto", Some(ImportModifier::Public)),
        ]
    );
}

#[test]
fn test_option_names_and_constants() {
    let src = r#"
        option a = true;
        option (b.c) = -12;
        option (.d).e.f = +1.5;
        option g = FOO.BAR;
        option h = 'text';
        option i = -inf;
        option j = 0x10;
    "#;
    let file = parse(src).unwrap();
    let options: Vec<_> = file
        .body
        .iter()
        .map(|d| match d {
            TopLevelDirective::Option(o) => (o.name.value.clone(), o.value.clone()),
            _ => panic!("expected option"),
        })
        .collect();

    assert_eq!(options[0].0, "a");
    assert!(matches!(&options[0].1, Constant::Literal(Literal { value: LiteralValue::Bool(true), .. })));
    assert_eq!(options[1].0, "(b.c)");
    assert!(matches!(
        &options[1].1,
        Constant::Literal(Literal { value: LiteralValue::Int { negative: true, value: 12 }, .. })
    ));
    assert_eq!(options[2].0, "(.d).e.f");
    assert!(matches!(&options[2].1, Constant::Literal(Literal { value: LiteralValue::Float(f), .. }) if *f == 1.5));
    match &options[3].1 {
        Constant::Identifier(id) => assert_eq!(id.value, "FOO.BAR"),
        other => panic!("expected identifier, got {:?}", other),
    }
    assert!(matches!(&options[4].1, Constant::Literal(Literal { value: LiteralValue::String(s), .. }) if s == "text"));
    assert!(matches!(&options[5].1, Constant::Literal(Literal { value: LiteralValue::Float(f), .. }) if *f == f64::NEG_INFINITY));
    assert!(matches!(
        &options[6].1,
        Constant::Literal(Literal { value: LiteralValue::Int { negative: false, value: 16 }, .. })
    ));
}

#[test]
fn test_reserved_ranges() {
    let body = parse_body("reserved 1 to 2, 5 to max, 6;");
    match &body[0] {
        MessageBody::Reserved(r) => {
            assert_eq!(
                r.items,
                ReservedItems::Ranges(vec![
                    Range::Span(1, RangeEnd::Value(2)),
                    Range::Span(5, RangeEnd::Max),
                    Range::Single(6),
                ])
            );
            assert_eq!(r.field_names(), None);
        }
        _ => panic!("expected reserved"),
    }
}

#[test]
fn test_reserved_field_names() {
    let body = parse_body(r#"reserved "foo", "bar";"#);
    match &body[0] {
        MessageBody::Reserved(r) => {
            assert_eq!(r.field_names(), Some(&["foo".to_string(), "bar".to_string()][..]));
            assert_eq!(r.ranges(), None);
        }
        _ => panic!("expected reserved"),
    }
}

#[test]
fn test_reserved_cannot_mix_names_and_numbers() {
    let err = parse(r#"message M { reserved "foo", 3; }"#).unwrap_err();
    assert!(matches!(
        err,
        ProtoError::Parse(ParseError::UnexpectedToken {
            found: TokenKind::Number,
            ..
        })
    ));
}

#[test]
fn test_map_field() {
    let body = parse_body("map<int32, string> f1 = 1;");
    match &body[0] {
        MessageBody::MapField(m) => {
            assert_eq!(m.key_type, "int32");
            assert_eq!(m.value_type.value, "string");
            assert_eq!(m.map_name, "f1");
            assert_eq!(m.field_number, 1);
            assert!(m.options.is_empty());
        }
        _ => panic!("expected map field"),
    }
}

#[test]
fn test_map_key_must_be_primitive() {
    let err = parse("message M { map<Foo, string> f = 1; }").unwrap_err();
    match err {
        ProtoError::Parse(ParseError::UnexpectedToken { expected, lexeme, .. }) => {
            assert_eq!(expected, "primitive type");
            assert_eq!(lexeme, "Foo");
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_fields_with_labels_and_types() {
    let body = parse_body(
        "required int64 a = 1; optional .pkg.Outer.Inner b = 2 [default = 5]; repeated Foo.Bar c = 3; bytes d = 4;",
    );
    let fields: Vec<_> = body
        .iter()
        .map(|b| match b {
            MessageBody::Field(f) => (
                f.label,
                f.field_type.as_ref().unwrap().value.clone(),
                f.name.clone(),
                f.field_number,
            ),
            _ => panic!("expected field"),
        })
        .collect();
    assert_eq!(
        fields,
        vec![
            (Some(Label::Required), "int64".to_string(), "a".to_string(), 1),
            (Some(Label::Optional), ".pkg.Outer.Inner".to_string(), "b".to_string(), 2),
            (Some(Label::Repeated), "Foo.Bar".to_string(), "c".to_string(), 3),
            (None, "bytes".to_string(), "d".to_string(), 4),
        ]
    );
    match &body[1] {
        MessageBody::Field(f) => {
            let field_type = f.field_type.as_ref().unwrap();
            assert!(field_type.is_fully_qualified());
            assert!(!field_type.is_primitive());
            assert_eq!(f.field_options.len(), 1);
            assert_eq!(f.field_options[0].name.value, "default");
        }
        _ => unreachable!(),
    }
    match &body[0] {
        MessageBody::Field(f) => assert!(f.field_type.as_ref().unwrap().is_primitive()),
        _ => unreachable!(),
    }
}

#[test]
fn test_keyword_names_are_allowed() {
    let body = parse_body("string message = 1; int32 package = 2; bool string = 3;");
    let names: Vec<_> = body
        .iter()
        .map(|b| match b {
            MessageBody::Field(f) => f.name.clone(),
            _ => panic!("expected field"),
        })
        .collect();
    assert_eq!(names, vec!["message", "package", "string"]);
}

#[test]
fn test_oneof() {
    let body = parse_body("oneof choice { option (x) = 1; string a = 4; ; Foo b = 5; }");
    match &body[0] {
        MessageBody::OneOf(o) => {
            assert_eq!(o.oneof_name, "choice");
            assert_eq!(o.options.len(), 1);
            assert_eq!(o.fields.len(), 2);
            assert_eq!(o.fields[1].name, "b");
        }
        _ => panic!("expected oneof"),
    }
}

#[test]
fn test_enum() {
    let file = parse(
        "enum Color { option allow_alias = true; RED = 0; GREEN = 1 [deprecated = true]; NEG = -2; reserved 5 to 9; option = 3; }",
    )
    .unwrap();
    match &file.body[0] {
        TopLevelDirective::Enum(e) => {
            assert_eq!(e.name, "Color");
            assert_eq!(e.options.len(), 1);
            let values: Vec<_> = e.fields.iter().map(|f| (f.name.as_str(), f.field_number)).collect();
            assert_eq!(values, vec![("RED", 0), ("GREEN", 1), ("NEG", -2), ("option", 3)]);
            assert!(e.fields.iter().all(|f| f.field_type.is_none() && f.label.is_none()));
            assert_eq!(e.fields[1].field_options.len(), 1);
            assert_eq!(e.reserved.len(), 1);
        }
        _ => panic!("expected enum"),
    }
}

#[test]
fn test_extensions() {
    let body = parse_body("extensions 100 to 199, 500 to max;");
    match &body[0] {
        MessageBody::Extensions(e) => {
            assert_eq!(
                e.ranges,
                vec![Range::Span(100, RangeEnd::Value(199)), Range::Span(500, RangeEnd::Max)]
            );
        }
        _ => panic!("expected extensions"),
    }

    assert!(parse("message M { extensions ; }").is_err());
}

#[test]
fn test_nested_definitions() {
    let body = parse_body("message Inner { enum Kind { A = 0; } Kind k = 1; } Inner inner = 1; enum Top { B = 0; }");
    assert_eq!(body.len(), 3);
    match &body[0] {
        MessageBody::Message(inner) => {
            assert_eq!(inner.name, "Inner");
            assert!(matches!(inner.body[0], MessageBody::Enum(_)));
            assert!(matches!(inner.body[1], MessageBody::Field(_)));
        }
        _ => panic!("expected nested message"),
    }
    assert!(matches!(body[2], MessageBody::Enum(_)));
}

#[test]
fn test_groups() {
    let body = parse_body("repeated group Result = 1 { required string url = 2; }");
    match &body[0] {
        MessageBody::Group(g) => {
            assert_eq!(g.label, Label::Repeated);
            assert_eq!(g.name, "Result");
            assert_eq!(g.field_number, 1);
            assert_eq!(g.body.len(), 1);
        }
        _ => panic!("expected group"),
    }
}

#[test]
fn test_extend() {
    let file = parse("extend google.protobuf.FieldOptions { optional string my_opt = 50000; optional group G = 50001 {} }").unwrap();
    match &file.body[0] {
        TopLevelDirective::Extend(e) => {
            assert_eq!(e.extendee.value, "google.protobuf.FieldOptions");
            assert_eq!(e.body.len(), 2);
            assert!(matches!(&e.body[0], ExtendBody::Field(f) if f.name == "my_opt"));
            assert!(matches!(&e.body[1], ExtendBody::Group(g) if g.name == "G"));
        }
        _ => panic!("expected extend"),
    }
}

#[test]
fn test_service() {
    let src = r#"
        service Search {
            option (svc) = "x";
            rpc Find (Query) returns (stream Result);
            rpc Watch (stream .pkg.Query) returns (Result) {
                option deprecated = true;
            };
            rpc Named (stream) returns (stream.Result);
        }
    "#;
    let file = parse(src).unwrap();
    let TopLevelDirective::Service(service) = &file.body[0] else {
        panic!("expected service");
    };
    assert_eq!(service.name, "Search");
    assert_eq!(service.body.len(), 4);
    let rpcs: Vec<_> = service
        .body
        .iter()
        .filter_map(|b| match b {
            ServiceBody::Rpc(r) => Some((
                r.name.as_str(),
                r.input_stream,
                r.input.value.as_str(),
                r.output_stream,
                r.output.value.as_str(),
                r.options.len(),
            )),
            ServiceBody::Option(_) => None,
        })
        .collect();
    assert_eq!(
        rpcs,
        vec![
            ("Find", false, "Query", true, "Result", 0),
            ("Watch", true, ".pkg.Query", false, "Result", 1),
            ("Named", false, "stream", true, ".Result", 0),
        ]
    );
}

#[test]
fn test_node_spans_match_tokens() {
    let src = "syntax = \"proto3\";\n\nmessage Foo {\n  int32 bar = 1;\n}\n";
    let file = parse(src).unwrap();
    let foo = message(&file, 0);
    assert_eq!(&src[foo.loc.span.start..foo.loc.span.end], "message Foo {\n  int32 bar = 1;\n}");
    assert_eq!(foo.loc.span.start_pos.line, 3);
    assert_eq!(foo.loc.span.end_pos.line, 5);

    let MessageBody::Field(bar) = &foo.body[0] else {
        panic!("expected field");
    };
    assert_eq!(&src[bar.loc.span.start..bar.loc.span.end], "int32 bar = 1;");
    assert_eq!(file.token(bar.loc.first_token).unwrap().span.start, bar.loc.span.start);
    assert_eq!(file.token(bar.loc.last_token).unwrap().span.end, bar.loc.span.end);
    let ty = bar.field_type.as_ref().unwrap();
    assert_eq!(ty.loc.first_token, ty.loc.last_token);
    assert_eq!(file.tokens_of(&bar.loc).len(), 5);

    assert_eq!((file.span.start, file.span.end), (0, src.len()));
}

#[test]
fn test_number_where_directive_expected() {
    let err = parse("syntax = \"proto3\";\n123;").unwrap_err();
    assert_eq!(err.line(), 2);
    match err {
        ProtoError::Parse(ParseError::UnexpectedToken {
            expected,
            found,
            lexeme,
            line,
            column,
        }) => {
            assert_eq!(found, TokenKind::Number);
            assert_eq!(lexeme, "123");
            assert_eq!((line, column), (2, 0));
            assert!(expected.contains("'import'"));
            assert!(expected.contains("'message'"));
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_error_message_names_tokens() {
    let err = parse("message M { int32 a = ; }").unwrap_err();
    assert_eq!(
        err.to_string(),
        "syntax error at line 1:22: expected integer, found ';' ';'"
    );
}

#[test]
fn test_lexical_errors_propagate() {
    let err = parse("message M {\n  string s = 1 [default = \"oops];\n}").unwrap_err();
    assert!(matches!(err, ProtoError::Lex(_)));
    assert_eq!(err.line(), 2);
}

#[test]
fn test_syntax_must_come_first() {
    assert!(parse("package a;\nsyntax = \"proto3\";").is_err());
}

#[test]
fn test_float_field_number_rejected() {
    let err = parse("message M { int32 a = 1.5; }").unwrap_err();
    assert!(matches!(
        err,
        ProtoError::Parse(ParseError::UnexpectedToken { found: TokenKind::Number, .. })
    ));
}

#[test]
fn test_negative_field_numbers_configurable() {
    let src = "message M { int32 a = -5; }";
    let body = message(&parse(src).unwrap(), 0).body.clone();
    assert!(matches!(&body[0], MessageBody::Field(f) if f.field_number == -5));

    let strict = ParserConfig::default().with_negative_field_numbers(false);
    let err = parse_with_config(src, &strict).unwrap_err();
    assert_eq!(
        err,
        ProtoError::Parse(ParseError::NegativeFieldNumber { number: -5, line: 1 })
    );

    // Enum values stay signed regardless.
    assert!(parse_with_config("enum E { A = -1; }", &strict).is_ok());
}

#[test]
fn test_deep_nesting_is_bounded() {
    let depth = 200;
    let src = format!("{}{}", "message M { ".repeat(depth), "}".repeat(depth));
    let err = parse(&src).unwrap_err();
    assert!(matches!(
        err,
        ProtoError::Parse(ParseError::NestingTooDeep { limit: 64, .. })
    ));

    // Debug builds need a larger stack than the default test thread for
    // this much recursion.
    let relaxed = ParserConfig::default().with_max_depth(depth);
    let handle = std::thread::Builder::new()
        .stack_size(64 * 1024 * 1024)
        .spawn(move || parse_with_config(&src, &relaxed).is_ok())
        .unwrap();
    assert!(handle.join().unwrap());
}

#[test]
fn test_default_depth_fits_default_stack() {
    let depth = 64;
    let src = format!("{}{}", "message M { ".repeat(depth), "}".repeat(depth));
    assert!(parse(&src).is_ok());
}

#[test]
fn test_comments_do_not_reach_the_tree() {
    let src = "// header\nmessage M { // trailing\n  /* before */ int32 a = 1; }\n";
    let file = parse(src).unwrap();
    assert_eq!(file.comments().count(), 3);
    let m = message(&file, 0);
    assert_eq!(m.body.len(), 1);
    // The message's token range includes the comments inside it.
    let inner: Vec<_> = file
        .tokens_of(&m.loc)
        .iter()
        .filter(|t| t.kind == TokenKind::Comment)
        .collect();
    assert_eq!(inner.len(), 2);
}
