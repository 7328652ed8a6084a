//! Term coercion
//!
//! API functions accept anything that names a term: a ready RDF term, a
//! string holding an IRI, a model entity or a list of those. [`TermLike`]
//! is that sum type, with one conversion per arm.

use super::{ModelError, ModelResult};
use crate::rdf::{Dataset, Literal, NamedNode, RdfObject, RdfSubject};
use oxrdf::NamedNodeRef;

/// Anything that can be turned into an RDF term
#[derive(Debug, Clone, PartialEq)]
pub enum TermLike {
    /// A ready RDF term
    Term(RdfObject),
    /// An IRI string
    Str(String),
    /// The term of a model entity
    Entity(RdfSubject),
    /// An ordered list, stored as an RDF collection
    List(Vec<TermLike>),
}

impl TermLike {
    /// Convert to a term, writing list structure into `dataset` when needed
    pub fn to_term(&self, dataset: &Dataset) -> ModelResult<RdfObject> {
        match self {
            TermLike::Term(term) => Ok(term.clone()),
            TermLike::Str(iri) => Ok(NamedNode::new(iri)?.into()),
            TermLike::Entity(subject) => Ok(subject.clone().into()),
            TermLike::List(items) => {
                let items = items
                    .iter()
                    .map(|item| item.to_term(dataset))
                    .collect::<ModelResult<Vec<_>>>()?;
                Ok(dataset.insert_list(&items, None))
            }
        }
    }

    /// Convert to a term usable in subject position
    pub fn to_subject(&self, dataset: &Dataset) -> ModelResult<RdfSubject> {
        let term = self.to_term(dataset)?;
        term.to_subject()
            .ok_or_else(|| ModelError::InvalidTerm(format!("{term} cannot be a subject")))
    }

    /// The IRI, if this is a single IRI
    pub fn as_named_node(&self) -> Option<NamedNode> {
        match self {
            TermLike::Term(RdfObject::NamedNode(n)) => Some(n.clone()),
            TermLike::Entity(RdfSubject::NamedNode(n)) => Some(n.clone()),
            TermLike::Str(iri) => NamedNode::new(iri).ok(),
            _ => None,
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, TermLike::List(_))
    }
}

impl From<RdfObject> for TermLike {
    fn from(term: RdfObject) -> Self {
        TermLike::Term(term)
    }
}

impl From<NamedNode> for TermLike {
    fn from(node: NamedNode) -> Self {
        TermLike::Term(node.into())
    }
}

impl From<NamedNodeRef<'_>> for TermLike {
    fn from(node: NamedNodeRef<'_>) -> Self {
        TermLike::Term(node.into())
    }
}

impl From<Literal> for TermLike {
    fn from(literal: Literal) -> Self {
        TermLike::Term(literal.into())
    }
}

impl From<RdfSubject> for TermLike {
    fn from(subject: RdfSubject) -> Self {
        TermLike::Entity(subject)
    }
}

impl From<&str> for TermLike {
    fn from(iri: &str) -> Self {
        TermLike::Str(iri.to_string())
    }
}

impl From<String> for TermLike {
    fn from(iri: String) -> Self {
        TermLike::Str(iri)
    }
}

impl From<i64> for TermLike {
    fn from(value: i64) -> Self {
        TermLike::Term(Literal::new_integer(value).into())
    }
}

impl<T: Into<TermLike>> From<Vec<T>> for TermLike {
    fn from(items: Vec<T>) -> Self {
        TermLike::List(items.into_iter().map(Into::into).collect())
    }
}
