//! Cubeview: RDF Cube View query engine
//!
//! Models SPARQL-hosted data cubes and compiles declarative, RDF-encoded
//! Views (dimensions, filters, aggregates, ordering, pagination) into SPARQL.
//!
//! # Architecture
//!
//! - [`rdf`]: terms, the shared insertion-ordered [`rdf::Dataset`], vocabularies
//!   and Turtle / N-Triples I/O
//! - [`sparql`]: the [`sparql::SparqlClient`] trait and its HTTP implementation
//! - [`model`]: Source, Cube, CubeDimension, View, Dimension and Filter handles
//!   over the dataset
//! - [`compiler`]: View description to SELECT and COUNT queries
//! - [`config`]: per-source endpoint configuration
//!
//! ## Example Usage
//!
//! ```rust
//! use cubeview::compiler::QueryOptions;
//! use cubeview::config::SourceConfig;
//! use cubeview::model::{DimensionOptions, Source, View};
//! use cubeview::rdf::NamedNode;
//!
//! let source = Source::new(SourceConfig::new("https://example.org/query")).unwrap();
//! let cube = NamedNode::new("https://example.org/cube").unwrap();
//! let cube_source = source.to_cube_source(&cube);
//!
//! let view = View::with_source(&source);
//! let year = view
//!     .create_dimension(DimensionOptions::new(&cube_source, "https://example.org/year"))
//!     .unwrap();
//! view.add_dimension(&year);
//! view.set_limit(Some(10));
//!
//! let compiled = view.observations_query(QueryOptions::default()).unwrap();
//! assert!(compiled.query.starts_with("SELECT DISTINCT ?dimension0 WHERE {"));
//! assert!(compiled.query.ends_with("LIMIT 10"));
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod compiler;
pub mod config;
pub mod model;
pub mod rdf;
pub mod sparql;

// Re-export main types for convenience
pub use compiler::{compile, CompiledQuery, QueryError, QueryOptions, QueryResult};

pub use config::{ConfigError, QueryOperation, SourceConfig};

pub use model::{
    cube_filter, filters_from_params, Aggregate, BrowseParams, Cube, CubeDimension, CubesOptions,
    DateFunction, Dimension, DimensionOptions, Direction, DiscoveryPredicate, Filter, ModelError,
    ModelResult, Operation, OrderBy, Projection, SearchFilter, Source, View, ViewOptions,
};

pub use rdf::{BlankNode, Dataset, Literal, NamedNode, Quad, RdfObject, RdfSubject, RdfTerm};

pub use sparql::{HttpSparqlClient, QuerySolution, SparqlClient, SparqlError, SparqlResult};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(version(), "0.1.0");
    }
}
