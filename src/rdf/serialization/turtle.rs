//! Turtle and N-Triples implementation

use super::{ParseError, ParseResult, SerializeError, SerializeResult};
use crate::rdf::{BlankNode, Literal, NamedNode, Quad, RdfObject, RdfSubject};
use rio_api::formatter::TriplesFormatter;
use rio_api::model as rio;
use rio_api::parser::TriplesParser;
use rio_turtle::{NTriplesFormatter, NTriplesParser, TurtleError, TurtleFormatter, TurtleParser};
use std::collections::HashMap;

const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";

impl From<TurtleError> for ParseError {
    fn from(e: TurtleError) -> Self {
        ParseError::Parse(e.to_string())
    }
}

/// Turtle parser
pub struct TurtleParserWrapper;

impl TurtleParserWrapper {
    /// Parse a Turtle document
    pub fn parse(input: &str) -> ParseResult<Vec<Quad>> {
        let mut parser = TurtleParser::new(input.as_bytes(), None);
        collect(&mut parser)
    }

    /// Parse an N-Triples document
    pub fn parse_ntriples(input: &str) -> ParseResult<Vec<Quad>> {
        let mut parser = NTriplesParser::new(input.as_bytes());
        collect(&mut parser)
    }
}

fn collect<P>(parser: &mut P) -> ParseResult<Vec<Quad>>
where
    P: TriplesParser,
    ParseError: From<P::Error>,
{
    let mut labels = BlankNodeLabels::default();
    let mut quads = Vec::new();

    parser.parse_all(&mut |t| -> ParseResult<()> {
        let subject = labels.subject(t.subject)?;
        let predicate = NamedNode::new(t.predicate.iri).map_err(|e| ParseError::Parse(e.to_string()))?;
        let object = labels.object(t.object)?;
        quads.push(Quad::triple(subject, predicate, object));
        Ok(())
    })?;

    Ok(quads)
}

/// Maps document-local blank node labels to fresh blank nodes
#[derive(Default)]
struct BlankNodeLabels {
    nodes: HashMap<String, BlankNode>,
}

impl BlankNodeLabels {
    fn blank(&mut self, id: &str) -> BlankNode {
        self.nodes.entry(id.to_string()).or_default().clone()
    }

    fn subject(&mut self, s: rio::Subject<'_>) -> ParseResult<RdfSubject> {
        match s {
            rio::Subject::NamedNode(n) => Ok(RdfSubject::NamedNode(
                NamedNode::new(n.iri).map_err(|e| ParseError::Parse(e.to_string()))?,
            )),
            rio::Subject::BlankNode(b) => Ok(RdfSubject::BlankNode(self.blank(b.id))),
            _ => Err(ParseError::Parse("Unsupported subject type".to_string())),
        }
    }

    fn object(&mut self, o: rio::Term<'_>) -> ParseResult<RdfObject> {
        match o {
            rio::Term::NamedNode(n) => Ok(RdfObject::NamedNode(
                NamedNode::new(n.iri).map_err(|e| ParseError::Parse(e.to_string()))?,
            )),
            rio::Term::BlankNode(b) => Ok(RdfObject::BlankNode(self.blank(b.id))),
            rio::Term::Literal(rio::Literal::Simple { value }) => {
                Ok(RdfObject::Literal(Literal::new_simple_literal(value)))
            }
            rio::Term::Literal(rio::Literal::LanguageTaggedString { value, language }) => {
                Ok(RdfObject::Literal(
                    Literal::new_language_tagged_literal(value, language)
                        .map_err(|e| ParseError::Parse(e.to_string()))?,
                ))
            }
            rio::Term::Literal(rio::Literal::Typed { value, datatype }) => {
                let datatype =
                    NamedNode::new(datatype.iri).map_err(|e| ParseError::Parse(e.to_string()))?;
                Ok(RdfObject::Literal(Literal::new_typed_literal(value, datatype)))
            }
            _ => Err(ParseError::Parse("Unsupported object type".to_string())),
        }
    }
}

/// Turtle serializer
pub struct TurtleSerializerWrapper;

impl TurtleSerializerWrapper {
    /// Serialize quads to Turtle
    pub fn serialize(quads: &[Quad]) -> SerializeResult<String> {
        let mut output = Vec::new();
        let mut formatter = TurtleFormatter::new(&mut output);
        for quad in quads {
            with_rio_triple(quad, |t| formatter.format(t))?;
        }
        formatter.finish()?;

        String::from_utf8(output).map_err(|e| SerializeError::Serialize(e.to_string()))
    }

    /// Serialize quads to N-Triples
    pub fn serialize_ntriples(quads: &[Quad]) -> SerializeResult<String> {
        let mut output = Vec::new();
        let mut formatter = NTriplesFormatter::new(&mut output);
        for quad in quads {
            with_rio_triple(quad, |t| formatter.format(t))?;
        }
        formatter.finish()?;

        String::from_utf8(output).map_err(|e| SerializeError::Serialize(e.to_string()))
    }
}

/// Borrow `quad` as a rio triple for the duration of `f`
fn with_rio_triple<F>(quad: &Quad, f: F) -> std::io::Result<()>
where
    F: FnOnce(&rio::Triple<'_>) -> std::io::Result<()>,
{
    let subject = match &quad.subject {
        RdfSubject::NamedNode(n) => rio::Subject::NamedNode(rio::NamedNode { iri: n.as_str() }),
        RdfSubject::BlankNode(b) => rio::Subject::BlankNode(rio::BlankNode { id: b.as_str() }),
    };
    let predicate = rio::NamedNode {
        iri: quad.predicate.as_named_node().as_str(),
    };

    let datatype;
    let object = match &quad.object {
        RdfObject::NamedNode(n) => rio::Term::NamedNode(rio::NamedNode { iri: n.as_str() }),
        RdfObject::BlankNode(b) => rio::Term::BlankNode(rio::BlankNode { id: b.as_str() }),
        RdfObject::Literal(l) => {
            datatype = l.datatype();
            let literal = if let Some(language) = l.language() {
                rio::Literal::LanguageTaggedString {
                    value: l.value(),
                    language,
                }
            } else if datatype.as_str() == XSD_STRING {
                rio::Literal::Simple { value: l.value() }
            } else {
                rio::Literal::Typed {
                    value: l.value(),
                    datatype: rio::NamedNode {
                        iri: datatype.as_str(),
                    },
                }
            };
            rio::Term::Literal(literal)
        }
    };

    f(&rio::Triple {
        subject,
        predicate,
        object,
    })
}
