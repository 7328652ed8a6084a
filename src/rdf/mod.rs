//! RDF (Resource Description Framework) support
//!
//! This module implements the in-memory side of the cube model:
//! - RDF terms and quads (oxrdf wrappers)
//! - An insertion-ordered quad store and the shared [`Dataset`] handle
//! - RDF collections (lists)
//! - Vocabulary namespaces (cube, view, SHACL, schema.org, ...)
//! - N-Triples / Turtle parsing and serialization
//!
//! # Example
//!
//! ```rust
//! use cubeview::rdf::{Dataset, Literal, NamedNode, Quad};
//!
//! let dataset = Dataset::new();
//! let subject = NamedNode::new("http://example.org/alice").unwrap();
//! let predicate = NamedNode::new("http://xmlns.com/foaf/0.1/name").unwrap();
//!
//! dataset.insert(Quad::triple(subject.clone(), predicate.clone(), Literal::new_simple_literal("Alice")));
//!
//! let names = dataset.objects(&subject.into(), &predicate.into());
//! assert_eq!(names.len(), 1);
//! ```

mod namespace;
mod serialization;
mod store;
mod types;

pub use types::{
    BlankNode, Literal, NamedNode, Quad, QuadPattern, RdfError, RdfObject, RdfPredicate,
    RdfResult, RdfSubject, RdfTerm,
};

pub use store::{Dataset, RdfStore};

pub use namespace::{
    cube, dcat, dcterms, rdf, schema, sh, view, xsd, Namespace, CUBE, DCAT, DCTERMS, RDF, SCHEMA,
    SH, VIEW, XSD,
};

pub use serialization::{
    ParseError, ParseResult, RdfFormat, RdfParser, RdfSerializer, SerializeError,
    SerializeResult,
};
