//! SPARQL query results

use super::{SparqlError, SparqlResult};
use crate::rdf::RdfTerm;
use indexmap::IndexMap;
use sparesults::{QueryResultsFormat, QueryResultsParser, ReaderQueryResultsParserOutput};

/// Query solution (variable bindings)
///
/// Bindings keep the order in which the endpoint reported them. Unbound
/// variables are simply absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuerySolution {
    /// Variable name → RDF term bindings
    pub bindings: IndexMap<String, RdfTerm>,
}

impl QuerySolution {
    /// Create a new query solution
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a binding
    pub fn get(&self, variable: &str) -> Option<&RdfTerm> {
        self.bindings.get(variable)
    }

    /// Add a binding
    pub fn bind(&mut self, variable: impl Into<String>, term: RdfTerm) {
        self.bindings.insert(variable.into(), term);
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn into_bindings(self) -> IndexMap<String, RdfTerm> {
        self.bindings
    }
}

/// Decoder for `application/sparql-results+json` documents
pub struct SelectResults;

impl SelectResults {
    /// Media type requested for SELECT queries
    pub const MEDIA_TYPE: &'static str = "application/sparql-results+json";

    /// Decode a SPARQL results JSON document
    pub fn parse_json(body: &[u8]) -> SparqlResult<Vec<QuerySolution>> {
        let parser = QueryResultsParser::from_format(QueryResultsFormat::Json);
        let output = parser
            .for_reader(body)
            .map_err(|e| SparqlError::Results(e.to_string()))?;

        let solutions = match output {
            ReaderQueryResultsParserOutput::Solutions(solutions) => solutions,
            ReaderQueryResultsParserOutput::Boolean(_) => {
                return Err(SparqlError::Results(
                    "expected solutions, got a boolean result".to_string(),
                ))
            }
        };

        let mut rows = Vec::new();
        for solution in solutions {
            let solution = solution.map_err(|e| SparqlError::Results(e.to_string()))?;
            let mut row = QuerySolution::new();
            for (variable, term) in solution.iter() {
                let term = RdfTerm::try_from(term.clone())
                    .map_err(|e| SparqlError::Results(e.to_string()))?;
                row.bind(variable.as_str(), term);
            }
            rows.push(row);
        }
        Ok(rows)
    }
}
