//! Fixed fetch and discovery queries
//!
//! DESCRIBE is not portable across engines, so every description fetch is a
//! hand-written CONSTRUCT.

use super::in_graph;
use crate::rdf::NamedNode;

/// Predicates followed from a View to collect its definition
const VIEW_CLOSURE: &[&str] = &[
    "https://cube.link/view/dimension",
    "https://cube.link/view/filter",
    "https://cube.link/view/from",
    "https://cube.link/view/source",
    "https://cube.link/view/join",
    "https://cube.link/view/path",
    "https://cube.link/view/argument",
    "https://cube.link/view/projection",
    "https://cube.link/view/columns",
    "https://cube.link/view/orderBy",
    "http://www.w3.org/ns/shacl#inversePath",
    "http://www.w3.org/ns/shacl#alternativePath",
    "http://www.w3.org/1999/02/22-rdf-syntax-ns#first",
    "http://www.w3.org/1999/02/22-rdf-syntax-ns#rest",
];

/// Predicates followed from a shape to collect its property shapes
const SHAPE_CLOSURE: &[&str] = &[
    "http://www.w3.org/ns/shacl#property",
    "http://www.w3.org/ns/shacl#or",
    "http://www.w3.org/ns/shacl#in",
    "http://www.w3.org/ns/shacl#node",
    "http://www.w3.org/1999/02/22-rdf-syntax-ns#first",
    "http://www.w3.org/1999/02/22-rdf-syntax-ns#rest",
];

fn alternatives(predicates: &[&str]) -> String {
    let predicates: Vec<String> = predicates.iter().map(|p| format!("<{p}>")).collect();
    format!("({})", predicates.join("|"))
}

fn construct(template: &str, graph: Option<&NamedNode>, body: Vec<String>) -> String {
    let mut lines = vec![format!("CONSTRUCT {{ {template} }} WHERE {{")];
    lines.extend(in_graph(graph, &body).into_iter().map(|l| format!("  {l}")));
    lines.push("}".to_string());
    lines.join("\n")
}

/// The cube's own triples, the triples of its blank nodes and those of any
/// container listing the cube as `schema:hasPart`
pub fn cube_query(cube: &NamedNode, graph: Option<&NamedNode>) -> String {
    construct(
        "?s ?p ?o",
        graph,
        vec![
            format!("{{ {cube} ?p ?o . BIND({cube} AS ?s) }}"),
            "UNION".to_string(),
            format!("{{ {cube} ?p0 ?s . FILTER(isBlank(?s)) ?s ?p ?o . }}"),
            "UNION".to_string(),
            format!("{{ ?s <http://schema.org/hasPart> {cube} . ?s ?p ?o . }}"),
        ],
    )
}

/// The cube's observation constraint and everything reachable from it
/// through property shapes, `sh:or`/`sh:in` alternatives and lists
pub fn shape_query(cube: &NamedNode, graph: Option<&NamedNode>) -> String {
    construct(
        &format!("{cube} <https://cube.link/observationConstraint> ?shape . ?s ?p ?o"),
        graph,
        vec![
            format!("{cube} <https://cube.link/observationConstraint> ?shape ."),
            format!("?shape {}* ?s .", alternatives(SHAPE_CLOSURE)),
            "?s ?p ?o .".to_string(),
        ],
    )
}

/// The View definition: the view and every node reachable through the
/// view vocabulary
pub fn view_query(view: &NamedNode, graph: Option<&NamedNode>) -> String {
    construct(
        "?s ?p ?o",
        graph,
        vec![
            format!("{view} {}* ?s .", alternatives(VIEW_CLOSURE)),
            "?s ?p ?o .".to_string(),
        ],
    )
}

/// `SELECT DISTINCT ?variable` over instances of `class`, restricted by
/// discovery patterns and filters
pub fn select_instances(
    variable: &str,
    class: &NamedNode,
    graph: Option<&NamedNode>,
    patterns: &[String],
    filters: &[String],
) -> String {
    let mut body = vec![format!(
        "?{variable} <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> {class} ."
    )];
    body.extend(patterns.iter().cloned());
    body.extend(filters.iter().cloned());

    let mut lines = vec![format!("SELECT DISTINCT ?{variable} WHERE {{")];
    lines.extend(in_graph(graph, &body).into_iter().map(|l| format!("  {l}")));
    lines.push("}".to_string());
    lines.join("\n")
}
