use rdfio_model::{
    ErrorKind, Literal, NamedNode, ParserConfig, RdfParseError, Subject, Term, Triple,
    vocab::rdf,
};
use rdfio_xml::RdfXmlParser;

fn parse(data: &str) -> Result<Vec<Triple>, RdfParseError> {
    RdfXmlParser::new().for_slice(data).collect()
}

fn parse_with(data: &str, config: ParserConfig) -> Result<Vec<Triple>, RdfParseError> {
    RdfXmlParser::new().with_config(config).for_slice(data).collect()
}

fn iri(value: &str) -> NamedNode {
    NamedNode::new_unchecked(value)
}

const HEADER: &str =
    r#"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#" xmlns:ex="http://ex/">"#;

fn doc(body: &str) -> String {
    format!("<?xml version=\"1.0\"?>\n{HEADER}{body}</rdf:RDF>")
}

#[test]
fn description_with_literal_and_resource_properties() {
    let triples = parse(&doc(
        r#"<rdf:Description rdf:about="http://ex/s">
             <ex:name xml:lang="en">Foo</ex:name>
             <ex:knows rdf:resource="http://ex/o"/>
           </rdf:Description>"#,
    ))
    .unwrap();
    assert_eq!(triples.len(), 2);
    assert_eq!(
        triples[0].object,
        Literal::new_language_tagged_literal_unchecked("Foo", "en").into()
    );
    assert_eq!(triples[1].object, iri("http://ex/o").into());
}

#[test]
fn typed_node_elements_emit_rdf_type() {
    let triples = parse(&doc(r#"<ex:Person rdf:about="http://ex/s" ex:name="Bar"/>"#)).unwrap();
    assert_eq!(triples.len(), 2);
    assert_eq!(triples[0].predicate, iri("http://ex/name"));
    assert_eq!(triples[1].predicate, rdf::TYPE);
    assert_eq!(triples[1].object, iri("http://ex/Person").into());
}

#[test]
fn container_membership_expansion() {
    let triples = parse(
        r#"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"><rdf:Bag><rdf:li>1</rdf:li><rdf:_3>3</rdf:_3><rdf:li>4</rdf:li></rdf:Bag></rdf:RDF>"#,
    )
    .unwrap();
    let memberships: Vec<_> = triples
        .iter()
        .filter(|t| t.predicate.as_str().contains("#_"))
        .map(|t| t.predicate.clone())
        .collect();
    assert_eq!(
        memberships,
        vec![rdf::member(1), rdf::member(3), rdf::member(4)]
    );
}

#[test]
fn container_expansion_can_be_disabled() {
    let triples = parse_with(
        r#"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"><rdf:Bag><rdf:li>1</rdf:li></rdf:Bag></rdf:RDF>"#,
        ParserConfig::new().with_expand_containers(false),
    )
    .unwrap();
    assert!(triples.iter().any(|t| t.predicate == rdf::LI));
}

#[test]
fn rdf_id_expands_against_base_and_rejects_duplicates() {
    let triples = parse(&doc(
        r#"<rdf:Description xml:base="http://base/doc" rdf:ID="x"><ex:p>1</ex:p></rdf:Description>"#,
    ))
    .unwrap();
    assert_eq!(triples[0].subject, iri("http://base/doc#x").into());

    let error = parse(&doc(
        r#"<rdf:Description xml:base="http://base/doc" rdf:ID="x"><ex:p>1</ex:p></rdf:Description>
           <rdf:Description xml:base="http://base/doc" rdf:ID="x"><ex:p>2</ex:p></rdf:Description>"#,
    ))
    .unwrap_err();
    assert!(error.message().contains("duplicate rdf:ID"));
}

#[test]
fn rdf_id_on_property_elements_reifies() {
    let triples = parse(&doc(
        r#"<rdf:Description xml:base="http://base/" rdf:about="http://ex/s"><ex:p rdf:ID="r">v</ex:p></rdf:Description>"#,
    ))
    .unwrap();
    assert_eq!(triples.len(), 5);
    assert_eq!(triples[0].predicate, iri("http://ex/p"));
    assert_eq!(triples[1].subject, iri("http://base/#r").into());
    assert_eq!(triples[1].predicate, rdf::TYPE);
    assert_eq!(triples[1].object, Term::from(rdf::STATEMENT));
    assert_eq!(triples[2].predicate, rdf::SUBJECT);
    assert_eq!(triples[3].predicate, rdf::PREDICATE);
    assert_eq!(triples[4].predicate, rdf::OBJECT);
}

#[test]
fn nested_elements_without_parse_type_are_rejected() {
    let error = parse(&doc(
        r#"<rdf:Description rdf:about="http://ex/s">
             <ex:p><rdf:Description rdf:about="http://ex/o"/></ex:p>
           </rdf:Description>"#,
    ))
    .unwrap_err();
    assert!(error.message().contains("rdf:parseType"));
}

#[test]
fn parse_type_resource_mints_a_blank_node() {
    let triples = parse(&doc(
        r#"<rdf:Description rdf:about="http://ex/s">
             <ex:p rdf:parseType="Resource"><ex:q>v</ex:q></ex:p>
           </rdf:Description>"#,
    ))
    .unwrap();
    assert_eq!(triples.len(), 2);
    let Term::BlankNode(node) = &triples[0].object else {
        panic!("parseType=Resource must mint a blank node object");
    };
    assert_eq!(triples[1].subject, node.clone().into());
    assert_eq!(triples[1].predicate, iri("http://ex/q"));
}

#[test]
fn parse_type_literal_captures_xml() {
    let triples = parse(&doc(
        r#"<rdf:Description rdf:about="http://ex/s">
             <ex:p rdf:parseType="Literal"><b>bold</b> text</ex:p>
           </rdf:Description>"#,
    ))
    .unwrap();
    assert_eq!(triples.len(), 1);
    let Term::Literal(literal) = &triples[0].object else {
        panic!("expected a literal");
    };
    assert_eq!(literal.datatype(), rdf::XML_LITERAL);
    assert!(literal.value().contains("<b>bold</b>"));
}

#[test]
fn parse_type_collection_builds_a_list() {
    let triples = parse(&doc(
        r#"<rdf:Description rdf:about="http://ex/s">
             <ex:p rdf:parseType="Collection">
               <rdf:Description rdf:about="http://ex/a"/>
               <rdf:Description rdf:about="http://ex/b"/>
             </ex:p>
           </rdf:Description>"#,
    ))
    .unwrap();
    // primary triple first, then the cons cells in element order
    assert_eq!(triples.len(), 5);
    assert_eq!(triples[0].subject, iri("http://ex/s").into());
    assert_eq!(triples[1].predicate, rdf::FIRST);
    assert_eq!(triples[1].object, iri("http://ex/a").into());
    assert_eq!(triples[2].predicate, rdf::REST);
    assert_eq!(triples[3].object, iri("http://ex/b").into());
    assert_eq!(triples[4].object, Term::from(rdf::NIL));
}

#[test]
fn parse_type_triple_builds_a_triple_term() {
    let triples = parse(&doc(
        r#"<rdf:Description rdf:about="http://ex/s">
             <ex:p rdf:parseType="Triple">
               <rdf:Description rdf:subject="http://ex/a" rdf:predicate="http://ex/b" rdf:object="http://ex/c"/>
             </ex:p>
           </rdf:Description>"#,
    ))
    .unwrap();
    assert_eq!(triples.len(), 1);
    let Term::Triple(quoted) = &triples[0].object else {
        panic!("expected a triple term");
    };
    assert_eq!(quoted.subject, iri("http://ex/a").into());
    assert_eq!(quoted.predicate, iri("http://ex/b"));
    assert_eq!(quoted.object, iri("http://ex/c").into());
}

#[test]
fn incomplete_parse_type_triple_falls_back_to_reification() {
    let triples = parse(&doc(
        r#"<rdf:Description rdf:about="http://ex/s">
             <ex:p rdf:parseType="Triple">
               <rdf:Description rdf:subject="http://ex/a"/>
             </ex:p>
           </rdf:Description>"#,
    ))
    .unwrap();
    assert!(triples
        .iter()
        .any(|t| t.predicate == rdf::TYPE && t.object == Term::from(rdf::STATEMENT)));
    assert!(triples.iter().any(|t| t.predicate == rdf::SUBJECT));
    // and the property still points at the placeholder node
    assert!(triples.iter().any(|t| t.predicate == iri("http://ex/p")));
}

#[test]
fn annotation_attribute_reifies_with_a_triple_term() {
    let triples = parse(&doc(
        r#"<rdf:Description rdf:about="http://ex/s">
             <ex:p rdf:annotation="http://ex/ann">v</ex:p>
           </rdf:Description>"#,
    ))
    .unwrap();
    assert_eq!(triples.len(), 2);
    assert_eq!(triples[1].subject, iri("http://ex/ann").into());
    assert_eq!(triples[1].predicate, rdf::REIFIES);
    let Term::Triple(quoted) = &triples[1].object else {
        panic!("rdf:annotation must reify a triple term");
    };
    assert_eq!(quoted.object, Literal::new_simple_literal("v").into());
}

#[test]
fn reserved_names_are_rejected() {
    assert!(parse(&doc(r#"<rdf:Description ex:p="v" rdf:aboutEach="http://ex/x"/>"#)).is_err());
    assert!(parse(&doc(r#"<rdf:Description rdf:li="v"/>"#)).is_err());
    let error = parse(&doc(
        r#"<rdf:Description rdf:about="http://ex/s"><ex:p rdf:parseType="Resource" rdf:resource="http://ex/o"/></rdf:Description>"#,
    ))
    .unwrap_err();
    assert!(error.message().contains("mutually exclusive"));
}

#[test]
fn invalid_node_id_is_rejected() {
    let error = parse(&doc(r#"<rdf:Description rdf:nodeID="1bad"><ex:p>v</ex:p></rdf:Description>"#))
        .unwrap_err();
    assert!(error.message().contains("XML name"));
}

#[test]
fn queued_triples_are_delivered_before_an_error() {
    let data = doc(
        r#"<rdf:Description rdf:about="http://ex/s">
             <ex:p>v</ex:p>
             <ex:q rdf:parseType="Bogus">x</ex:q>
           </rdf:Description>"#,
    );
    let results: Vec<_> = RdfXmlParser::new().for_slice(&data).collect();
    assert!(results[0].is_ok());
    assert!(results.last().unwrap().is_err());
}

#[test]
fn depth_limit_applies_to_element_nesting() {
    let mut body = String::new();
    body.push_str(r#"<rdf:Description rdf:about="http://ex/s">"#);
    for _ in 0..30 {
        body.push_str(r#"<ex:p rdf:parseType="Resource">"#);
    }
    for _ in 0..30 {
        body.push_str("</ex:p>");
    }
    body.push_str("</rdf:Description>");
    let error = parse_with(&doc(&body), ParserConfig::new().with_max_depth(10)).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::DepthExceeded);
}

#[test]
fn statement_limit_is_enforced() {
    let body = r#"<rdf:Description rdf:about="http://ex/s"><ex:p>a</ex:p><ex:p>b</ex:p><ex:p>c</ex:p></rdf:Description>"#;
    let results: Vec<_> = RdfXmlParser::new()
        .with_config(ParserConfig::new().with_max_statements(2))
        .for_slice(&doc(body))
        .collect();
    assert_eq!(results.len(), 3);
    assert!(results[0].is_ok() && results[1].is_ok());
    assert_eq!(
        results[2].as_ref().unwrap_err().kind(),
        ErrorKind::StatementLimitExceeded
    );
}

#[test]
fn entities_from_doctype_are_resolved() {
    let data = format!(
        "<?xml version=\"1.0\"?>\n<!DOCTYPE rdf:RDF [<!ENTITY ex \"http://ex/\">]>\n{HEADER}<rdf:Description rdf:about=\"&ex;s\"><ex:p>v</ex:p></rdf:Description></rdf:RDF>"
    );
    let triples = parse(&data).unwrap();
    assert_eq!(triples[0].subject, iri("http://ex/s").into());
}

#[test]
fn fresh_blank_nodes_for_anonymous_descriptions() {
    let triples = parse(&doc(
        r#"<rdf:Description><ex:p>1</ex:p></rdf:Description><rdf:Description><ex:p>2</ex:p></rdf:Description>"#,
    ))
    .unwrap();
    let Subject::BlankNode(a) = &triples[0].subject else {
        panic!("expected a blank node");
    };
    let Subject::BlankNode(b) = &triples[1].subject else {
        panic!("expected a blank node");
    };
    assert_ne!(a, b);
}

#[test]
fn round_trip_through_the_serializer() {
    let triples = parse(&doc(
        r#"<rdf:Description rdf:about="http://ex/s">
             <ex:name>Foo</ex:name>
             <ex:knows rdf:resource="http://ex/o"/>
           </rdf:Description>"#,
    ))
    .unwrap();
    let mut serializer = rdfio_xml::RdfXmlSerializer::new()
        .with_prefix("ex", "http://ex/")
        .unwrap()
        .for_writer(Vec::new());
    for triple in &triples {
        serializer
            .write_statement(&rdfio_model::Statement::from(triple.clone()))
            .unwrap();
    }
    serializer.close().unwrap();
    let text = String::from_utf8(serializer.into_inner()).unwrap();
    let reparsed: Vec<Triple> = RdfXmlParser::new()
        .for_slice(&text)
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(triples, reparsed);
}
