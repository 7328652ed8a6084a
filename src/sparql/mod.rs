//! SPARQL protocol client support
//!
//! This module talks to remote SPARQL 1.1 endpoints:
//! - [`SparqlClient`], the async seam every model object executes through
//! - [`HttpSparqlClient`], the reqwest-backed implementation
//! - decoding of SELECT results (SPARQL results JSON) and CONSTRUCT results
//!   (N-Triples) into crate types
//!
//! # Example
//!
//! ```rust,no_run
//! use cubeview::config::SourceConfig;
//! use cubeview::sparql::{HttpSparqlClient, SparqlClient};
//!
//! # async fn run() -> cubeview::sparql::SparqlResult<()> {
//! let client = HttpSparqlClient::new(SourceConfig::new("https://lindas.admin.ch/query"))?;
//! let rows = client.select("SELECT ?cube WHERE { ?cube a <https://cube.link/Cube> } LIMIT 1").await?;
//! println!("{} rows", rows.len());
//! # Ok(())
//! # }
//! ```

mod client;
mod results;

pub use client::{HttpSparqlClient, SparqlClient};
pub use results::{QuerySolution, SelectResults};

use crate::rdf::ParseError;
use thiserror::Error;

/// SPARQL errors
#[derive(Error, Debug)]
pub enum SparqlError {
    /// HTTP transport error (connection, timeout, ...)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status
    #[error("Endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    /// SELECT results could not be decoded
    #[error("Invalid query results: {0}")]
    Results(String),

    /// CONSTRUCT results could not be parsed
    #[error("Invalid RDF response: {0}")]
    Rdf(#[from] ParseError),
}

pub type SparqlResult<T> = Result<T, SparqlError>;
