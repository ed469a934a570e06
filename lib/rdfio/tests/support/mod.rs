use rdfio::Statement;
use rdfio::model::{GraphName, Subject, Term, Triple};
use std::collections::HashMap;

/// Checks dataset equality up to blank node renaming.
///
/// A simple backtracking matcher: ample for test-sized datasets.
pub fn isomorphic(a: &[Statement], b: &[Statement]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut used = vec![false; b.len()];
    let mut mapping = HashMap::new();
    let mut reverse = HashMap::new();
    match_from(a, b, 0, &mut used, &mut mapping, &mut reverse)
}

fn match_from(
    a: &[Statement],
    b: &[Statement],
    index: usize,
    used: &mut [bool],
    mapping: &mut HashMap<String, String>,
    reverse: &mut HashMap<String, String>,
) -> bool {
    let Some(statement) = a.get(index) else {
        return true;
    };
    for candidate in 0..b.len() {
        if used[candidate] {
            continue;
        }
        let saved_mapping = mapping.clone();
        let saved_reverse = reverse.clone();
        if statements_match(statement, &b[candidate], mapping, reverse) {
            used[candidate] = true;
            if match_from(a, b, index + 1, used, mapping, reverse) {
                return true;
            }
            used[candidate] = false;
        }
        *mapping = saved_mapping;
        *reverse = saved_reverse;
    }
    false
}

fn statements_match(
    a: &Statement,
    b: &Statement,
    mapping: &mut HashMap<String, String>,
    reverse: &mut HashMap<String, String>,
) -> bool {
    subjects_match(&a.subject, &b.subject, mapping, reverse)
        && a.predicate == b.predicate
        && terms_match(&a.object, &b.object, mapping, reverse)
        && graphs_match(&a.graph_name, &b.graph_name, mapping, reverse)
}

fn subjects_match(
    a: &Subject,
    b: &Subject,
    mapping: &mut HashMap<String, String>,
    reverse: &mut HashMap<String, String>,
) -> bool {
    match (a, b) {
        (Subject::NamedNode(a), Subject::NamedNode(b)) => a == b,
        (Subject::BlankNode(a), Subject::BlankNode(b)) => {
            blank_nodes_match(a.as_str(), b.as_str(), mapping, reverse)
        }
        (Subject::Triple(a), Subject::Triple(b)) => triples_match(a, b, mapping, reverse),
        _ => false,
    }
}

fn terms_match(
    a: &Term,
    b: &Term,
    mapping: &mut HashMap<String, String>,
    reverse: &mut HashMap<String, String>,
) -> bool {
    match (a, b) {
        (Term::NamedNode(a), Term::NamedNode(b)) => a == b,
        (Term::BlankNode(a), Term::BlankNode(b)) => {
            blank_nodes_match(a.as_str(), b.as_str(), mapping, reverse)
        }
        (Term::Literal(a), Term::Literal(b)) => a == b,
        (Term::Triple(a), Term::Triple(b)) => triples_match(a, b, mapping, reverse),
        _ => false,
    }
}

fn graphs_match(
    a: &GraphName,
    b: &GraphName,
    mapping: &mut HashMap<String, String>,
    reverse: &mut HashMap<String, String>,
) -> bool {
    match (a, b) {
        (GraphName::NamedNode(a), GraphName::NamedNode(b)) => a == b,
        (GraphName::BlankNode(a), GraphName::BlankNode(b)) => {
            blank_nodes_match(a.as_str(), b.as_str(), mapping, reverse)
        }
        (GraphName::DefaultGraph, GraphName::DefaultGraph) => true,
        _ => false,
    }
}

fn triples_match(
    a: &Triple,
    b: &Triple,
    mapping: &mut HashMap<String, String>,
    reverse: &mut HashMap<String, String>,
) -> bool {
    subjects_match(&a.subject, &b.subject, mapping, reverse)
        && a.predicate == b.predicate
        && terms_match(&a.object, &b.object, mapping, reverse)
}

fn blank_nodes_match(
    a: &str,
    b: &str,
    mapping: &mut HashMap<String, String>,
    reverse: &mut HashMap<String, String>,
) -> bool {
    match (mapping.get(a), reverse.get(b)) {
        (Some(mapped), Some(back)) => mapped == b && back == a,
        (None, None) => {
            mapping.insert(a.to_owned(), b.to_owned());
            reverse.insert(b.to_owned(), a.to_owned());
            true
        }
        _ => false,
    }
}
