//! Re-encoding a parsed stream and re-parsing it must yield an isomorphic
//! dataset, per format and across format pairs that can represent the same
//! statements.

#[path = "support/mod.rs"]
mod support;

use rdfio::{RdfFormat, RdfParser, RdfSerializer, Statement};
use support::isomorphic;

fn parse(format: RdfFormat, data: &[u8]) -> Vec<Statement> {
    RdfParser::from_format(format)
        .for_slice(data)
        .expect("opening a slice reader cannot fail for a fixed format")
        .collect::<Result<Vec<_>, _>>()
        .expect("the fixture must parse")
}

fn encode(format: RdfFormat, statements: &[Statement]) -> Vec<u8> {
    let mut writer = RdfSerializer::from_format(format).for_writer(Vec::new());
    for statement in statements {
        writer.write_statement(statement).expect("writing must succeed");
    }
    writer.close().expect("closing must succeed");
    writer.into_inner()
}

fn assert_round_trip(format: RdfFormat, statements: &[Statement]) {
    let encoded = encode(format, statements);
    let reparsed = parse(format, &encoded);
    assert!(
        isomorphic(statements, &reparsed),
        "{format} round trip failed:\n{}",
        String::from_utf8_lossy(&encoded)
    );
}

const TRIPLES_FIXTURE: &str = r#"@prefix ex: <http://ex/> .
ex:s a ex:T ;
    ex:name "name"@en ;
    ex:count 4 ;
    ex:items ( ex:a ex:b ) ;
    ex:knows [ ex:name "anon" ] .
"#;

const QUADS_FIXTURE: &str = r#"@prefix ex: <http://ex/> .
ex:s ex:p "default" .
ex:g { ex:s ex:p "named" . ex:s ex:q ex:o . }
_:g { ex:s ex:p "blank graph" . }
"#;

#[test]
fn triple_formats_round_trip() {
    let statements = parse(RdfFormat::Turtle, TRIPLES_FIXTURE.as_bytes());
    assert_eq!(statements.len(), 10);
    for format in [
        RdfFormat::NTriples,
        RdfFormat::Turtle,
        RdfFormat::RdfXml,
        RdfFormat::JsonLd,
    ] {
        assert_round_trip(format, &statements);
    }
}

#[test]
fn quad_formats_round_trip() {
    let statements = parse(RdfFormat::TriG, QUADS_FIXTURE.as_bytes());
    assert_eq!(statements.len(), 4);
    for format in [RdfFormat::NQuads, RdfFormat::TriG, RdfFormat::JsonLd] {
        assert_round_trip(format, &statements);
    }
}

#[test]
fn pretty_trig_round_trips() {
    let statements = parse(RdfFormat::TriG, QUADS_FIXTURE.as_bytes());
    let mut writer = RdfSerializer::from_format(RdfFormat::TriG)
        .pretty()
        .with_prefix("ex", "http://ex/")
        .expect("a valid prefix IRI")
        .for_writer(Vec::new());
    for statement in &statements {
        writer.write_statement(statement).expect("writing must succeed");
    }
    writer.close().expect("closing must succeed");
    let encoded = writer.into_inner();
    let reparsed = parse(RdfFormat::TriG, &encoded);
    assert!(isomorphic(&statements, &reparsed));
}

#[test]
fn cross_format_conversions_preserve_the_graph() {
    let original = parse(RdfFormat::Turtle, TRIPLES_FIXTURE.as_bytes());
    for from in [RdfFormat::NTriples, RdfFormat::Turtle, RdfFormat::RdfXml] {
        let first = encode(from, &original);
        let decoded = parse(from, &first);
        for to in [RdfFormat::NTriples, RdfFormat::JsonLd, RdfFormat::Turtle] {
            let second = encode(to, &decoded);
            let reparsed = parse(to, &second);
            assert!(
                isomorphic(&original, &reparsed),
                "{from} -> {to} conversion failed"
            );
        }
    }
}

#[test]
fn quoted_triples_round_trip_in_the_line_formats() {
    let data = "_:r <http://www.w3.org/1999/02/22-rdf-syntax-ns#reifies> <<( <http://ex/s> <http://ex/p> \"o\" )>> .\n";
    let statements = parse(RdfFormat::NTriples, data.as_bytes());
    for format in [RdfFormat::NTriples, RdfFormat::NQuads, RdfFormat::Turtle] {
        assert_round_trip(format, &statements);
    }
}

#[test]
fn annotations_round_trip_as_reification() {
    let statements = parse(
        RdfFormat::Turtle,
        b"@prefix ex: <http://ex/> . ex:s ex:p ex:o {| ex:certainty \"high\" |} .",
    );
    assert_eq!(statements.len(), 3);
    assert_round_trip(RdfFormat::NTriples, &statements);
    assert_round_trip(RdfFormat::Turtle, &statements);
}

#[test]
fn isomorphism_helper_distinguishes_structures() {
    let a = parse(
        RdfFormat::NTriples,
        b"_:a <http://ex/p> _:b .\n_:b <http://ex/p> _:a .\n",
    );
    let b = parse(
        RdfFormat::NTriples,
        b"_:x <http://ex/p> _:y .\n_:y <http://ex/p> _:x .\n",
    );
    let c = parse(
        RdfFormat::NTriples,
        b"_:x <http://ex/p> _:y .\n_:x <http://ex/p> _:z .\n",
    );
    assert!(isomorphic(&a, &b));
    assert!(!isomorphic(&a, &c));
}
