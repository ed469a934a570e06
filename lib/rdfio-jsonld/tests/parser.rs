use rdfio_jsonld::{JsonLdParser, RemoteDocument};
use rdfio_model::{
    BlankNode, Cancellation, ErrorKind, GraphName, Literal, NamedNode, ParserConfig,
    RdfParseError, Statement, Subject, Term,
    vocab::{rdf, xsd},
};

fn parse(data: &str) -> Result<Vec<Statement>, RdfParseError> {
    JsonLdParser::new().for_slice(data).collect()
}

fn iri(value: &str) -> NamedNode {
    NamedNode::new_unchecked(value)
}

#[test]
fn scalars_and_arrays() {
    let statements = parse(
        r#"{
            "@context": {"ex": "http://ex/"},
            "@id": "http://ex/s",
            "ex:name": "n",
            "ex:age": 41,
            "ex:score": 4.5,
            "ex:ok": true,
            "ex:tags": ["a", "b"]
        }"#,
    )
    .unwrap();
    assert_eq!(statements.len(), 6);
    assert_eq!(statements[0].object, Literal::new_simple_literal("n").into());
    assert_eq!(
        statements[1].object,
        Literal::new_typed_literal("41", xsd::INTEGER).into()
    );
    assert_eq!(
        statements[2].object,
        Literal::new_typed_literal("4.5", xsd::DOUBLE).into()
    );
    assert_eq!(
        statements[3].object,
        Literal::new_typed_literal("true", xsd::BOOLEAN).into()
    );
    assert_eq!(statements[4].object, Literal::new_simple_literal("a").into());
    assert_eq!(statements[5].object, Literal::new_simple_literal("b").into());
}

#[test]
fn type_emits_rdf_type_and_skips_non_strings() {
    let statements = parse(
        r#"{
            "@context": {"@vocab": "http://vocab/"},
            "@id": "http://ex/s",
            "@type": ["Person", 42]
        }"#,
    )
    .unwrap();
    assert_eq!(statements.len(), 1);
    assert_eq!(statements[0].predicate, rdf::TYPE);
    assert_eq!(statements[0].object, iri("http://vocab/Person").into());
}

struct VocabLoader;

impl rdfio_jsonld::DocumentLoader for VocabLoader {
    fn load_document(
        &self,
        iri: &str,
        _cancellation: Option<&Cancellation>,
    ) -> Result<RemoteDocument, Box<dyn std::error::Error + Send + Sync>> {
        assert_eq!(iri, "https://schema.org/ctx");
        Ok(RemoteDocument {
            document_url: iri.to_owned(),
            document: br#"{ "@vocab": "https://schema.org/" }"#.to_vec(),
            context_url: None,
        })
    }
}

#[test]
fn remote_context_through_the_loader() {
    let parser = JsonLdParser::new().with_document_loader(VocabLoader);
    let statements = parser
        .for_slice(
            r#"{"@context":"https://schema.org/ctx","@id":"https://ex/x","@type":"Person","name":"n"}"#,
        )
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert_eq!(statements.len(), 2);
    assert_eq!(statements[0].predicate, rdf::TYPE);
    assert_eq!(statements[0].object, iri("https://schema.org/Person").into());
    assert_eq!(statements[1].predicate, iri("https://schema.org/name"));
    assert_eq!(statements[1].object, Literal::new_simple_literal("n").into());
}

#[test]
fn remote_context_without_loader_fails_on_use() {
    let error = parse(
        r#"{"@context":"https://schema.org/ctx","@id":"https://ex/x","name":"n"}"#,
    )
    .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Syntax);
    assert!(error.message().contains("document loader"));
}

#[test]
fn unmapped_keys_without_remote_context_are_dropped() {
    let statements = parse(r#"{"@id":"http://ex/s","name":"n"}"#).unwrap();
    assert!(statements.is_empty());
}

#[test]
fn value_objects_with_language_and_direction() {
    let statements = parse(
        r#"{
            "@context": {"ex": "http://ex/"},
            "@id": "http://ex/s",
            "ex:a": {"@value": "v", "@language": "en"},
            "ex:b": {"@value": "w", "@language": "en--rtl"},
            "ex:c": {"@value": "5", "@type": "http://www.w3.org/2001/XMLSchema#integer"},
            "ex:d": {"@value": "i", "@index": "ignored"}
        }"#,
    )
    .unwrap();
    assert_eq!(statements.len(), 4);
    assert_eq!(
        statements[0].object,
        Literal::new_language_tagged_literal_unchecked("v", "en").into()
    );
    let Term::Literal(directional) = &statements[1].object else {
        panic!("expected a literal");
    };
    assert_eq!(directional.direction(), Some(rdfio_model::BaseDirection::Rtl));
    assert_eq!(
        statements[2].object,
        Literal::new_typed_literal("5", xsd::INTEGER).into()
    );
    assert_eq!(statements[3].object, Literal::new_simple_literal("i").into());
}

#[test]
fn nested_nodes_emit_parent_triple_first() {
    let statements = parse(
        r#"{
            "@context": {"ex": "http://ex/"},
            "@id": "http://ex/s",
            "ex:knows": {"@id": "http://ex/o", "ex:name": "other"}
        }"#,
    )
    .unwrap();
    assert_eq!(statements.len(), 2);
    assert_eq!(statements[0].subject, iri("http://ex/s").into());
    assert_eq!(statements[0].object, iri("http://ex/o").into());
    assert_eq!(statements[1].subject, iri("http://ex/o").into());
    assert_eq!(statements[1].object, Literal::new_simple_literal("other").into());
}

#[test]
fn list_expansion_in_element_order() {
    let statements = parse(
        r#"{
            "@context": {"ex": "http://ex/"},
            "@id": "http://ex/s",
            "ex:items": {"@list": ["a", "b"]}
        }"#,
    )
    .unwrap();
    assert_eq!(statements.len(), 5);
    let Term::BlankNode(head) = &statements[0].object else {
        panic!("the list head must be a blank node");
    };
    assert_eq!(statements[1].subject, head.clone().into());
    assert_eq!(statements[1].predicate, rdf::FIRST);
    assert_eq!(statements[1].object, Literal::new_simple_literal("a").into());
    assert_eq!(statements[2].predicate, rdf::REST);
    assert_eq!(statements[3].object, Literal::new_simple_literal("b").into());
    assert_eq!(statements[4].object, Term::from(rdf::NIL));
}

#[test]
fn empty_list_is_rdf_nil() {
    let statements = parse(
        r#"{"@context": {"ex": "http://ex/"}, "@id": "http://ex/s", "ex:items": {"@list": []}}"#,
    )
    .unwrap();
    assert_eq!(statements.len(), 1);
    assert_eq!(statements[0].object, Term::from(rdf::NIL));
}

#[test]
fn list_container_term_definition() {
    let statements = parse(
        r#"{
            "@context": {"items": {"@id": "http://ex/items", "@container": "@list"}},
            "@id": "http://ex/s",
            "items": ["a"]
        }"#,
    )
    .unwrap();
    assert_eq!(statements.len(), 3);
    assert_eq!(statements[1].predicate, rdf::FIRST);
}

#[test]
fn set_is_flattened() {
    let statements = parse(
        r#"{"@context": {"ex": "http://ex/"}, "@id": "http://ex/s", "ex:p": {"@set": ["a", "b"]}}"#,
    )
    .unwrap();
    assert_eq!(statements.len(), 2);
}

#[test]
fn id_coercion_in_term_definitions() {
    let statements = parse(
        r#"{
            "@context": {"link": {"@id": "http://ex/link", "@type": "@id"}, "@base": "http://base/"},
            "@id": "http://ex/s",
            "link": "target"
        }"#,
    )
    .unwrap();
    assert_eq!(statements[0].object, iri("http://base/target").into());
}

#[test]
fn top_level_graph_without_id_is_the_default_graph() {
    let statements = parse(
        r#"{
            "@context": {"ex": "http://ex/"},
            "@graph": [
                {"@id": "http://ex/a", "ex:p": "1"},
                {"@id": "http://ex/b", "ex:p": "2"}
            ]
        }"#,
    )
    .unwrap();
    assert_eq!(statements.len(), 2);
    assert!(statements.iter().all(|s| !s.is_quad()));
}

#[test]
fn graph_with_id_names_the_graph() {
    let statements = parse(
        r#"{
            "@context": {"ex": "http://ex/"},
            "@id": "http://ex/g",
            "@graph": [{"@id": "http://ex/s", "ex:p": "v"}]
        }"#,
    )
    .unwrap();
    assert_eq!(statements.len(), 1);
    assert_eq!(statements[0].graph_name, iri("http://ex/g").into());
}

#[test]
fn nested_graph_nodes() {
    let statements = parse(
        r#"{
            "@context": {"ex": "http://ex/"},
            "@graph": [{
                "@id": "http://ex/g",
                "ex:label": "graph",
                "@graph": [{"@id": "http://ex/s", "ex:p": "v"}]
            }]
        }"#,
    )
    .unwrap();
    assert_eq!(statements.len(), 2);
    assert_eq!(statements[0].graph_name, GraphName::DefaultGraph);
    assert_eq!(statements[1].graph_name, iri("http://ex/g").into());
}

#[test]
fn blank_node_labels_are_preserved() {
    let statements = parse(
        r#"{"@context": {"ex": "http://ex/"}, "@id": "_:b1", "ex:p": {"@id": "_:b2"}}"#,
    )
    .unwrap();
    assert_eq!(
        statements[0].subject,
        Subject::BlankNode(BlankNode::new_unchecked("b1"))
    );
    assert_eq!(
        statements[0].object,
        Term::BlankNode(BlankNode::new_unchecked("b2"))
    );
}

#[test]
fn fresh_blank_nodes_for_nodes_without_id() {
    let statements = parse(
        r#"[{"@context": {"ex": "http://ex/"}, "ex:p": "1"},
            {"@context": {"ex": "http://ex/"}, "ex:p": "2"}]"#,
    )
    .unwrap();
    let Subject::BlankNode(a) = &statements[0].subject else {
        panic!("expected a blank node");
    };
    let Subject::BlankNode(b) = &statements[1].subject else {
        panic!("expected a blank node");
    };
    assert_ne!(a, b);
}

#[test]
fn statement_limit_is_enforced() {
    let results: Vec<_> = JsonLdParser::new()
        .with_config(ParserConfig::new().with_max_statements(2))
        .for_slice(
            r#"{"@context": {"ex": "http://ex/"}, "@id": "http://ex/s", "ex:p": ["a", "b", "c"]}"#,
        )
        .collect();
    assert_eq!(results.len(), 3);
    assert_eq!(
        results[2].as_ref().unwrap_err().kind(),
        ErrorKind::StatementLimitExceeded
    );
}

#[test]
fn cancellation_is_observed() {
    let cancellation = Cancellation::new();
    cancellation.cancel();
    let error = JsonLdParser::new()
        .with_config(ParserConfig::new().with_cancellation(cancellation))
        .for_slice(r#"{"@id": "http://ex/s"}"#)
        .collect::<Result<Vec<_>, _>>()
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Canceled);
}

#[test]
fn document_byte_cap_applies() {
    let data = format!(
        r#"{{"@context": {{"ex": "http://ex/"}}, "@id": "http://ex/s", "ex:p": "{}"}}"#,
        "x".repeat(4096)
    );
    let error = JsonLdParser::new()
        .with_config(ParserConfig::new().with_max_statement_bytes(1024))
        .for_slice(&data)
        .collect::<Result<Vec<_>, _>>()
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::StatementTooLong);
}

#[test]
fn round_trip_through_the_serializer() {
    let statements = parse(
        r#"{
            "@context": {"ex": "http://ex/"},
            "@id": "http://ex/s",
            "ex:name": "n",
            "ex:knows": {"@id": "http://ex/o"}
        }"#,
    )
    .unwrap();
    let mut serializer = rdfio_jsonld::JsonLdSerializer::new().for_writer(Vec::new());
    for statement in &statements {
        serializer.write_statement(statement).unwrap();
    }
    serializer.close().unwrap();
    let text = String::from_utf8(serializer.into_inner()).unwrap();
    let reparsed = parse(&text).unwrap();
    assert_eq!(statements, reparsed);
}
