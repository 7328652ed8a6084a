//! Cube and View object model
//!
//! The entities of this module are handles into a shared [`Dataset`]:
//!
//! - [`Source`]: a SPARQL endpoint, optionally tagged as a cube or lookup source
//! - [`Cube`] and [`CubeDimension`]: a remote cube and the columns of its shape
//! - [`View`], [`Dimension`] and [`Filter`]: the declarative query
//!
//! Views compile to SPARQL through [`crate::compiler`] and execute through
//! the [`crate::sparql::SparqlClient`] of their main source.
//!
//! [`Dataset`]: crate::rdf::Dataset

mod browse;
mod cube;
mod cube_dimension;
mod dimension;
mod discovery;
mod filter;
mod node;
mod source;
mod term;
mod view;

pub use browse::{filters_from_params, BrowseParams, SearchFilter, SearchFilterKind};
pub use cube::Cube;
pub use cube_dimension::CubeDimension;
pub use dimension::{Aggregate, Dimension, DimensionOptions};
pub use discovery::{cube_filter, Comparison, DiscoveryPredicate, Fragments};
pub use filter::{DateFunction, Filter, FilterBuilder, Operation};
pub use node::Node;
pub use source::{CubesOptions, Source, SourceKind};
pub use term::TermLike;
pub use view::{Direction, OrderBy, Projection, View, ViewOptions};

use crate::compiler::QueryError;
use crate::config::ConfigError;
use crate::rdf::RdfError;
use crate::sparql::SparqlError;
use thiserror::Error;

/// Model errors
#[derive(Error, Debug)]
pub enum ModelError {
    /// Endpoint or transport failure
    #[error(transparent)]
    Sparql(#[from] SparqlError),

    /// Malformed View definition found while compiling
    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Rdf(#[from] RdfError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A filter is missing a required part
    #[error("Filter {filter} is missing its {missing}")]
    InvalidFilter {
        filter: String,
        missing: &'static str,
    },

    #[error("View has no dimensions")]
    NoDimensions,

    #[error("Needs a explicit Source or a source attached to the CubeDimensions")]
    NoSource,

    /// A cube dimension has no `sh:path`
    #[error("Dimension {0} has no path")]
    MissingPath(String),

    #[error("Invalid term: {0}")]
    InvalidTerm(String),
}

pub type ModelResult<T> = Result<T, ModelError>;
