//! Shared fixtures: an in-memory oxigraph endpoint and a sample cube

#![allow(dead_code)]

use async_trait::async_trait;
use cubeview::config::SourceConfig;
use cubeview::model::Source;
use cubeview::rdf::{NamedNode, Quad, RdfFormat, RdfObject, RdfParser, RdfSubject, RdfTerm};
use cubeview::sparql::{QuerySolution, SparqlClient, SparqlError, SparqlResult};
use oxigraph::sparql::QueryResults;
use oxigraph::store::Store;
use std::sync::{Arc, Mutex};

pub const ENDPOINT: &str = "http://example.org/query";

/// Cube with four observations over two years and two places, plus a second,
/// expired cube and a version history container
pub const CUBE: &str = r#"
    @prefix cube: <https://cube.link/> .
    @prefix sh: <http://www.w3.org/ns/shacl#> .
    @prefix schema: <http://schema.org/> .
    @prefix dcat: <http://www.w3.org/ns/dcat#> .
    @prefix dcterms: <http://purl.org/dc/terms/> .
    @prefix xsd: <http://www.w3.org/2001/XMLSchema#> .
    @prefix ex: <http://example.org/> .

    ex:cube a cube:Cube ;
        schema:name "Energy"@en ;
        schema:version 2 ;
        dcat:theme ex:energy ;
        dcterms:creator ex:office ;
        cube:observationSet ex:observations ;
        cube:observationConstraint ex:shape .

    ex:history schema:hasPart ex:cube .

    ex:old a cube:Cube ;
        schema:version 1 ;
        schema:expires "2020-01-01"^^xsd:date .

    ex:shape sh:property
        [ sh:path ex:year ; schema:name "Year"@en, "Jahr"@de ; sh:datatype xsd:integer ],
        [ sh:path ex:place ; schema:name "Place"@en ; sh:nodeKind sh:IRI ],
        [ sh:path ex:value ; sh:datatype xsd:integer ; sh:minInclusive 0 ],
        [ sh:path cube:observedBy ] .

    ex:observations cube:observation ex:obs1, ex:obs2, ex:obs3, ex:obs4 .
    ex:obs1 ex:year 2000 ; ex:place ex:bern ; ex:value 10 ; cube:observedBy ex:office .
    ex:obs2 ex:year 2000 ; ex:place ex:zurich ; ex:value 20 ; cube:observedBy ex:office .
    ex:obs3 ex:year 2001 ; ex:place ex:bern ; ex:value 30 ; cube:observedBy ex:office .
    ex:obs4 ex:year 2001 ; ex:place ex:zurich ; ex:value 40 ; cube:observedBy ex:office .

    ex:bern schema:name "Bern"@de, "Berne"@fr .
    ex:zurich schema:name "Zürich"@de, "Zurich"@en .
"#;

/// SPARQL endpoint answered by an in-memory oxigraph store
pub struct OxigraphClient {
    store: Store,
    queries: Mutex<Vec<String>>,
}

fn error(e: impl std::fmt::Display) -> SparqlError {
    SparqlError::Results(e.to_string())
}

impl OxigraphClient {
    pub fn empty() -> Self {
        Self {
            store: Store::new().unwrap(),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn new(turtle: &str) -> Self {
        let client = Self::empty();
        client.load(RdfParser::parse(turtle, RdfFormat::Turtle).unwrap());
        client
    }

    pub fn load(&self, quads: impl IntoIterator<Item = Quad>) {
        for quad in quads {
            let quad = oxrdf::Quad::new(
                oxrdf::Subject::from(quad.subject),
                oxrdf::NamedNode::from(NamedNode::from(quad.predicate)),
                oxrdf::Term::from(quad.object),
                oxrdf::GraphName::DefaultGraph,
            );
            self.store.insert(&quad).unwrap();
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    fn query(&self, query: &str) -> SparqlResult<QueryResults> {
        self.queries.lock().unwrap().push(query.to_string());
        self.store.query(query).map_err(error)
    }
}

#[async_trait]
impl SparqlClient for OxigraphClient {
    async fn select(&self, query: &str) -> SparqlResult<Vec<QuerySolution>> {
        let QueryResults::Solutions(solutions) = self.query(query)? else {
            return Err(error("not a SELECT query"));
        };
        solutions
            .map(|solution| {
                let solution = solution.map_err(error)?;
                let mut row = QuerySolution::new();
                for (variable, term) in solution.iter() {
                    row.bind(variable.as_str(), RdfTerm::try_from(term.clone()).map_err(error)?);
                }
                Ok(row)
            })
            .collect()
    }

    async fn construct(&self, query: &str) -> SparqlResult<Vec<Quad>> {
        let QueryResults::Graph(triples) = self.query(query)? else {
            return Err(error("not a CONSTRUCT query"));
        };
        triples
            .map(|triple| {
                let triple = triple.map_err(error)?;
                Ok(Quad::triple(
                    RdfSubject::try_from(triple.subject).map_err(error)?,
                    NamedNode::from(triple.predicate),
                    RdfObject::try_from(triple.object).map_err(error)?,
                ))
            })
            .collect()
    }
}

pub fn ex(local: &str) -> NamedNode {
    NamedNode::new(&format!("http://example.org/{local}")).unwrap()
}

pub fn schema(local: &str) -> NamedNode {
    NamedNode::new(&format!("http://schema.org/{local}")).unwrap()
}

/// Source over the sample cube, plus its client for inspection
pub fn source() -> (Source, Arc<OxigraphClient>) {
    let client = Arc::new(OxigraphClient::new(CUBE));
    let source = Source::with_client(SourceConfig::new(ENDPOINT), client.clone()).unwrap();
    (source, client)
}

/// Source with no data behind it
pub fn offline_source() -> Source {
    Source::with_client(SourceConfig::new(ENDPOINT), Arc::new(OxigraphClient::empty())).unwrap()
}

pub fn normalize(query: &str) -> String {
    query.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Panics unless `query` is valid SPARQL 1.1
pub fn assert_valid(query: &str) {
    if let Err(e) = spargebra::Query::parse(query, None) {
        panic!("invalid SPARQL ({e}):\n{query}");
    }
}
