//! RDF serialization formats
//!
//! Supports:
//! - N-Triples (NT), the format requested for CONSTRUCT responses
//! - Turtle (TTL), used for fixtures and persisted view definitions

mod turtle;

use super::types::Quad;
use thiserror::Error;

pub use turtle::{TurtleParserWrapper, TurtleSerializerWrapper};

/// RDF serialization format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RdfFormat {
    /// Turtle format (.ttl)
    Turtle,
    /// N-Triples format (.nt)
    NTriples,
}

impl RdfFormat {
    /// Media type used in HTTP content negotiation
    pub fn media_type(&self) -> &'static str {
        match self {
            RdfFormat::Turtle => "text/turtle",
            RdfFormat::NTriples => "application/n-triples",
        }
    }

    /// Pick a format from a `Content-Type` header value
    pub fn from_media_type(media_type: &str) -> Option<Self> {
        let essence = media_type.split(';').next()?.trim();
        match essence {
            "text/turtle" | "application/x-turtle" => Some(RdfFormat::Turtle),
            "application/n-triples" | "text/plain" => Some(RdfFormat::NTriples),
            _ => None,
        }
    }
}

/// Parse errors
#[derive(Error, Debug)]
pub enum ParseError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Serialization errors
#[derive(Error, Debug)]
pub enum SerializeError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),
}

pub type SerializeResult<T> = Result<T, SerializeError>;

/// RDF parser
pub struct RdfParser;

impl RdfParser {
    /// Parse RDF data from a string into default-graph quads
    ///
    /// Blank node labels are scoped to the document: every call mints fresh
    /// blank nodes, so parsing two responses never merges their nodes.
    pub fn parse(input: &str, format: RdfFormat) -> ParseResult<Vec<Quad>> {
        match format {
            RdfFormat::Turtle => TurtleParserWrapper::parse(input),
            RdfFormat::NTriples => TurtleParserWrapper::parse_ntriples(input),
        }
    }
}

/// RDF serializer
pub struct RdfSerializer;

impl RdfSerializer {
    /// Serialize quads to a string (graph names are dropped)
    pub fn serialize(quads: &[Quad], format: RdfFormat) -> SerializeResult<String> {
        match format {
            RdfFormat::Turtle => TurtleSerializerWrapper::serialize(quads),
            RdfFormat::NTriples => TurtleSerializerWrapper::serialize_ntriples(quads),
        }
    }
}
