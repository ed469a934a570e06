use rdfio_model::{
    BlankNode, Cancellation, ErrorKind, GraphName, Literal, NamedNode, ParserConfig, RdfParseError,
    Statement, Subject, Term, Triple,
    vocab::{rdf, xsd},
};
use rdfio_ttl::{TriGParser, TurtleParser};

fn turtle(data: &str) -> Result<Vec<Triple>, RdfParseError> {
    TurtleParser::new().for_slice(data).collect()
}

fn trig(data: &str) -> Result<Vec<Statement>, RdfParseError> {
    TriGParser::new().for_slice(data).collect()
}

fn iri(value: &str) -> NamedNode {
    NamedNode::new_unchecked(value)
}

#[test]
fn prefix_and_a_keyword() {
    let triples = turtle("@prefix ex: <http://ex/> . ex:s a ex:T .").unwrap();
    assert_eq!(triples.len(), 1);
    assert_eq!(triples[0].predicate, rdf::TYPE);
    assert_eq!(triples[0].object, iri("http://ex/T").into());
}

#[test]
fn sparql_style_directives_without_dot() {
    let triples = turtle("PREFIX ex: <http://ex/>\nBASE <http://base/>\nex:s ex:p <o> .").unwrap();
    assert_eq!(triples[0].object, iri("http://base/o").into());
}

#[test]
fn base_resolution_applies_to_relative_iris() {
    let triples = turtle("@base <http://ex/dir/> . <a> <../p> <#f> .").unwrap();
    assert_eq!(triples[0].subject, iri("http://ex/dir/a").into());
    assert_eq!(triples[0].predicate, iri("http://ex/p"));
    assert_eq!(triples[0].object, iri("http://ex/dir/#f").into());
}

#[test]
fn unknown_prefix_is_a_parse_error() {
    let error = turtle("ex:s ex:p ex:o .").unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Syntax);
    assert!(error.message().contains("unknown prefix"));
}

#[test]
fn collection_desugars_to_exactly_five_statements() {
    let triples = turtle("<http://ex/s> <http://ex/p> ( <http://ex/a> <http://ex/b> ) .").unwrap();
    assert_eq!(triples.len(), 5);
    // The primary asserted triple comes first and points at the list head.
    assert_eq!(triples[0].subject, iri("http://ex/s").into());
    assert_eq!(triples[0].predicate, iri("http://ex/p"));
    let Term::BlankNode(head) = &triples[0].object else {
        panic!("the object must be the list head blank node");
    };
    assert_eq!(triples[1].subject, head.clone().into());
    assert_eq!(triples[1].predicate, rdf::FIRST);
    assert_eq!(triples[1].object, iri("http://ex/a").into());
    assert_eq!(triples[2].predicate, rdf::REST);
    let Term::BlankNode(second) = &triples[2].object else {
        panic!("rest must chain to the second cons cell");
    };
    assert_eq!(triples[3].subject, second.clone().into());
    assert_eq!(triples[3].object, iri("http://ex/b").into());
    assert_eq!(triples[4].object, Term::from(rdf::NIL));
}

#[test]
fn empty_collection_is_rdf_nil() {
    let triples = turtle("<http://ex/s> <http://ex/p> () .").unwrap();
    assert_eq!(triples.len(), 1);
    assert_eq!(triples[0].object, Term::from(rdf::NIL));
}

#[test]
fn nested_collections_honor_element_order() {
    let triples = turtle("<http://ex/s> <http://ex/p> ( <http://ex/a> ( <http://ex/b> ) ) .").unwrap();
    // 1 primary + 2 outer elements (4 triples) + 1 inner element (2 triples)
    assert_eq!(triples.len(), 7);
    let firsts: Vec<_> = triples
        .iter()
        .filter(|t| t.predicate == rdf::FIRST)
        .map(|t| t.object.clone())
        .collect();
    assert_eq!(firsts.len(), 3);
    assert_eq!(firsts[0], iri("http://ex/a").into());
    assert!(matches!(firsts[1], Term::BlankNode(_)));
    assert_eq!(firsts[2], iri("http://ex/b").into());
}

#[test]
fn blank_node_property_lists() {
    let triples = turtle("<http://ex/s> <http://ex/p> [ <http://ex/q> \"v\" ; <http://ex/r> 4 ] .")
        .unwrap();
    assert_eq!(triples.len(), 3);
    let Term::BlankNode(node) = &triples[0].object else {
        panic!("expected a fresh blank node object");
    };
    assert_eq!(triples[1].subject, node.clone().into());
    assert_eq!(triples[1].object, Literal::new_simple_literal("v").into());
    assert_eq!(
        triples[2].object,
        Literal::new_typed_literal("4", xsd::INTEGER).into()
    );
}

#[test]
fn standalone_property_list_statement() {
    let triples = turtle("[ <http://ex/p> <http://ex/o> ] .").unwrap();
    assert_eq!(triples.len(), 1);
    assert!(matches!(triples[0].subject, Subject::BlankNode(_)));
}

#[test]
fn empty_brackets_are_an_anonymous_node() {
    let triples = turtle("[] <http://ex/p> [] .").unwrap();
    assert_eq!(triples.len(), 1);
    let Subject::BlankNode(s) = &triples[0].subject else {
        panic!("expected an anonymous subject");
    };
    let Term::BlankNode(o) = &triples[0].object else {
        panic!("expected an anonymous object");
    };
    assert_ne!(s, o);
}

#[test]
fn predicate_and_object_lists_fan_out() {
    let triples = turtle(
        "<http://ex/s> <http://ex/p> \"a\", \"b\" ; <http://ex/q> \"c\" ; .",
    )
    .unwrap();
    assert_eq!(triples.len(), 3);
    assert_eq!(triples[0].object, Literal::new_simple_literal("a").into());
    assert_eq!(triples[1].object, Literal::new_simple_literal("b").into());
    assert_eq!(triples[2].predicate, iri("http://ex/q"));
}

#[test]
fn literal_forms() {
    let triples = turtle(
        r#"@prefix ex: <http://ex/> .
ex:s ex:p "short", 'single', """long
line""", true, 5, -2.5, 1.2e3, "tagged"@en-US, "dir"@en--rtl ."#,
    )
    .unwrap();
    let objects: Vec<_> = triples.iter().map(|t| t.object.clone()).collect();
    assert_eq!(objects[0], Literal::new_simple_literal("short").into());
    assert_eq!(objects[1], Literal::new_simple_literal("single").into());
    assert_eq!(objects[2], Literal::new_simple_literal("long\nline").into());
    assert_eq!(objects[3], Literal::new_typed_literal("true", xsd::BOOLEAN).into());
    assert_eq!(objects[4], Literal::new_typed_literal("5", xsd::INTEGER).into());
    assert_eq!(objects[5], Literal::new_typed_literal("-2.5", xsd::DECIMAL).into());
    assert_eq!(objects[6], Literal::new_typed_literal("1.2e3", xsd::DOUBLE).into());
    assert_eq!(
        objects[7],
        Literal::new_language_tagged_literal_unchecked("tagged", "en-us").into()
    );
    let Term::Literal(dir) = &objects[8] else {
        panic!("expected a directional literal");
    };
    assert_eq!(dir.language(), Some("en"));
    assert_eq!(dir.direction(), Some(rdfio_model::BaseDirection::Rtl));
}

#[test]
fn explicit_lang_string_datatype_is_rejected() {
    let error = turtle(
        "<http://ex/s> <http://ex/p> \"v\"^^<http://www.w3.org/1999/02/22-rdf-syntax-ns#langString> .",
    )
    .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Syntax);
}

#[test]
fn quoted_triples_as_subject_and_object() {
    let triples = turtle(
        "@prefix ex: <http://ex/> . << ex:s ex:p ex:o >> ex:q \"m\" .",
    )
    .unwrap();
    assert_eq!(triples.len(), 1);
    let Subject::Triple(inner) = &triples[0].subject else {
        panic!("expected a quoted triple subject");
    };
    assert_eq!(inner.predicate, iri("http://ex/p"));
}

#[test]
fn annotation_block_reifies_the_asserted_triple() {
    let triples = turtle(
        "@prefix ex: <http://ex/> . ex:s ex:p ex:o {| ex:certainty 0.9 |} .",
    )
    .unwrap();
    assert_eq!(triples.len(), 3);
    // asserted triple first
    assert_eq!(triples[0].subject, iri("http://ex/s").into());
    // then the reification binding
    assert_eq!(triples[1].predicate, rdf::REIFIES);
    let Subject::BlankNode(reifier) = &triples[1].subject else {
        panic!("the reifier must be a fresh blank node");
    };
    let Term::Triple(quoted) = &triples[1].object else {
        panic!("the reified object must be a triple term");
    };
    assert_eq!(quoted.subject, iri("http://ex/s").into());
    // and the annotation property on the reifier
    assert_eq!(triples[2].subject, reifier.clone().into());
    assert_eq!(triples[2].predicate, iri("http://ex/certainty"));
}

#[test]
fn named_reifier_binds_the_triple() {
    let triples = turtle("@prefix ex: <http://ex/> . ex:s ex:p ex:o ~ ex:r .").unwrap();
    assert_eq!(triples.len(), 2);
    assert_eq!(triples[1].subject, iri("http://ex/r").into());
    assert_eq!(triples[1].predicate, rdf::REIFIES);
}

#[test]
fn quoted_triple_statement_requires_version_or_option() {
    let input = "@prefix ex: <http://ex/> . << ex:s ex:p ex:o >> .";
    assert!(turtle(input).is_err());

    let enabled = TurtleParser::new()
        .with_config(ParserConfig::new().with_quoted_triple_statements(true))
        .for_slice(input)
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert_eq!(enabled.len(), 1);
    assert_eq!(enabled[0].subject, iri("http://ex/s").into());

    let versioned = turtle(
        "@version \"1.2\" . @prefix ex: <http://ex/> . << ex:s ex:p ex:o >> .",
    )
    .unwrap();
    assert_eq!(versioned.len(), 1);
}

#[test]
fn trig_named_graph_block() {
    let statements = trig("@prefix ex: <http://ex/> . ex:g { ex:s ex:p ex:o . }").unwrap();
    assert_eq!(statements.len(), 1);
    assert_eq!(statements[0].subject, iri("http://ex/s").into());
    assert_eq!(statements[0].graph_name, iri("http://ex/g").into());
}

#[test]
fn trig_graph_keyword_and_default_graph() {
    let statements = trig(
        "@prefix ex: <http://ex/> .\nGRAPH ex:g { ex:s ex:p ex:o . }\nex:s ex:p ex:o2 .",
    )
    .unwrap();
    assert_eq!(statements.len(), 2);
    assert!(statements[0].is_quad());
    assert_eq!(statements[1].graph_name, GraphName::DefaultGraph);
}

#[test]
fn trig_blank_node_graph_label() {
    let statements = trig("@prefix ex: <http://ex/> . _:g { ex:s ex:p ex:o . }").unwrap();
    assert_eq!(
        statements[0].graph_name,
        GraphName::BlankNode(BlankNode::new_unchecked("g"))
    );
}

#[test]
fn trig_rejects_nested_graph_blocks() {
    let error = trig("@prefix ex: <http://ex/> . ex:g { ex:h { ex:s ex:p ex:o . } }").unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Syntax);
}

#[test]
fn trig_rejects_directives_inside_graph_blocks() {
    let error = trig("<http://ex/g> { @prefix ex: <http://ex/> . }").unwrap_err();
    assert!(error.message().contains("directives"));
}

#[test]
fn turtle_rejects_graph_blocks() {
    assert!(turtle("<http://ex/g> { <http://ex/s> <http://ex/p> <http://ex/o> . }").is_err());
}

#[test]
fn annotation_open_is_not_a_graph_brace() {
    let statements = trig(
        "@prefix ex: <http://ex/> . ex:g { ex:s ex:p ex:o {| ex:q ex:r |} . }",
    )
    .unwrap();
    assert_eq!(statements.len(), 3);
    assert!(statements.iter().all(|s| s.graph_name == iri("http://ex/g").into()));
}

#[test]
fn desugared_statements_drain_one_per_pull() {
    let mut parser = TurtleParser::new()
        .for_slice("<http://ex/s> <http://ex/p> ( <http://ex/a> ) . <http://ex/s2> <http://ex/p> <http://ex/o> .");
    let first = parser.next().unwrap().unwrap();
    assert_eq!(first.subject, iri("http://ex/s").into());
    let second = parser.next().unwrap().unwrap();
    assert_eq!(second.predicate, rdf::FIRST);
    let third = parser.next().unwrap().unwrap();
    assert_eq!(third.predicate, rdf::REST);
    let fourth = parser.next().unwrap().unwrap();
    assert_eq!(fourth.subject, iri("http://ex/s2").into());
    assert!(parser.next().is_none());
}

#[test]
fn depth_limit_applies_to_nesting() {
    let config = ParserConfig::new().with_max_depth(2);
    let ok = TurtleParser::new()
        .with_config(config.clone())
        .for_slice("<http://ex/s> <http://ex/p> ( ( <http://ex/a> ) ) .")
        .collect::<Result<Vec<_>, _>>();
    assert!(ok.is_ok());
    let error = TurtleParser::new()
        .with_config(config)
        .for_slice("<http://ex/s> <http://ex/p> ( ( ( <http://ex/a> ) ) ) .")
        .collect::<Result<Vec<_>, _>>()
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::DepthExceeded);
}

#[test]
fn statement_limit_counts_desugared_statements() {
    let error = TurtleParser::new()
        .with_config(ParserConfig::new().with_max_statements(2))
        .for_slice("<http://ex/s> <http://ex/p> ( <http://ex/a> <http://ex/b> ) .")
        .collect::<Result<Vec<_>, _>>()
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::StatementLimitExceeded);
}

#[test]
fn cancellation_surfaces_before_reading() {
    let cancellation = Cancellation::new();
    cancellation.cancel();
    let error = TurtleParser::new()
        .with_config(ParserConfig::new().with_cancellation(cancellation))
        .for_slice("<http://ex/s> <http://ex/p> <http://ex/o> .")
        .collect::<Result<Vec<_>, _>>()
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Canceled);
}

#[test]
fn line_too_long_in_turtle() {
    let data = format!("<http://ex/s> <http://ex/p> \"{}\" .", "x".repeat(100));
    let error = TurtleParser::new()
        .with_config(ParserConfig::new().with_max_line_bytes(64))
        .for_slice(&data)
        .collect::<Result<Vec<_>, _>>()
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::LineTooLong);
}

#[test]
fn statement_too_long_across_lines() {
    let mut data = String::from("<http://ex/s> <http://ex/p> (\n");
    for _ in 0..100 {
        data.push_str("  <http://ex/aaaaaaaaaaaaaaaaaaaaaaaa>\n");
    }
    data.push_str(") .\n");
    let error = TurtleParser::new()
        .with_config(ParserConfig::new().with_max_statement_bytes(512))
        .for_slice(&data)
        .collect::<Result<Vec<_>, _>>()
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::StatementTooLong);
}

#[test]
fn errors_carry_positions_within_logical_statements() {
    let error = turtle("<http://ex/s>\n  <http://ex/p>\n  @bad .\n").unwrap_err();
    let position = error.position().expect("the error must carry a position");
    assert_eq!(position.line, 3);
}

#[test]
fn pre_declared_prefixes_and_base() {
    let triples = TurtleParser::new()
        .with_base_iri("http://base/")
        .unwrap()
        .with_prefix("ex", "http://ex/")
        .unwrap()
        .for_slice("ex:s ex:p <o> .")
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert_eq!(triples[0].subject, iri("http://ex/s").into());
    assert_eq!(triples[0].object, iri("http://base/o").into());
}
