//! View query compiler
//!
//! Turns a View, read from the dataset through its term, into SPARQL. The
//! compilation runs over one [`ViewQuery`] context in fixed steps:
//!
//! 1. `dimensions`: resolve every dimension the view touches
//! 2. `sources`: resolve the sources those dimensions draw from
//! 3. `patterns`: emit the triple patterns binding each dimension
//! 4. `filters`: compile filters into FILTER, HAVING, OPTIONAL and SERVICE
//! 5. `result`: assemble projection, grouping, ordering and pagination
//!
//! Compilation is pure: it reads the dataset and never writes to it.

mod dimensions;
mod filters;
mod patterns;
mod result;
mod sources;
pub mod templates;

use crate::model::Aggregate;
use crate::rdf::{Dataset, NamedNode, RdfObject, RdfSubject};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Compilation errors
///
/// All of them mean the View definition is malformed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    #[error("Unknown filter operation: {0}")]
    UnknownOperation(String),

    #[error("Unknown aggregate: {0}")]
    UnknownAggregate(String),

    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    #[error("Unknown order direction: {0}")]
    UnknownDirection(String),

    #[error("Invalid property path: {0}")]
    InvalidPath(String),

    #[error("Invalid term: {0}")]
    InvalidTerm(String),

    #[error("Dimension {0} has no path")]
    MissingPath(String),

    #[error("Dimension {0} has no source")]
    MissingSource(String),

    #[error("Source {0} has no cube")]
    MissingCube(String),

    #[error("Dimension {0} uses a LookupSource without a join")]
    MissingJoin(String),

    #[error("Filter {0} has no dimension")]
    MissingDimension(String),

    #[error("Filter {0} has no operation")]
    MissingOperation(String),

    #[error("Filter {0} has no argument")]
    MissingArgument(String),

    #[error("Unknown dimension: {0}")]
    UnknownDimension(String),
}

pub type QueryResult<T> = Result<T, QueryError>;

/// Compilation options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// Emit a flat SELECT without DISTINCT, GROUP BY or HAVING
    pub disable_distinct: bool,
}

/// SPARQL variable
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Variable(String);

impl Variable {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Name without the leading `?`
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "?{}", self.0)
    }
}

/// Per-prefix monotonic variable allocator
#[derive(Debug, Default)]
pub(crate) struct Variables {
    counters: HashMap<&'static str, usize>,
}

impl Variables {
    pub(crate) fn next(&mut self, prefix: &'static str) -> Variable {
        let counter = self.counters.entry(prefix).or_insert(0);
        let variable = Variable(format!("{prefix}{counter}"));
        *counter += 1;
        variable
    }
}

/// One `view:from` entry of a dimension
#[derive(Debug, Clone, PartialEq)]
pub struct FromEntry {
    pub source: RdfSubject,
    pub path: RdfObject,
    pub join: Option<RdfSubject>,
}

/// A dimension as seen by the compiler
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedDimension {
    /// The dimension's own term
    pub term: RdfSubject,
    /// Output property (`view:as`, the path, or a placeholder)
    pub property: RdfObject,
    /// Variable bound to the dimension value in the WHERE clause
    pub variable: Variable,
    /// Variable holding the value in result rows
    pub output: Variable,
    pub aggregate: Option<Aggregate>,
    pub is_result: bool,
    pub is_filter: bool,
    pub has_language_filter: bool,
    pub from: Vec<FromEntry>,
}

impl ResolvedDimension {
    pub fn is_aggregate(&self) -> bool {
        self.aggregate.is_some()
    }
}

#[derive(Debug, Clone)]
pub(crate) enum SourceKind {
    Cube {
        cube: NamedNode,
        observation_set: Variable,
        observation: Variable,
    },
    Lookup,
}

#[derive(Debug, Clone)]
pub(crate) struct ResolvedSource {
    pub(crate) term: RdfSubject,
    pub(crate) graph: Option<NamedNode>,
    pub(crate) kind: SourceKind,
    pub(crate) patterns: Vec<String>,
}

impl ResolvedSource {
    /// Patterns binding this source's observations (empty for lookups)
    pub(crate) fn anchor_patterns(&self) -> Vec<String> {
        match &self.kind {
            SourceKind::Cube {
                cube,
                observation_set,
                observation,
            } => vec![
                format!(
                    "{} <https://cube.link/observationSet> {} .",
                    cube, observation_set
                ),
                format!(
                    "{} <https://cube.link/observation> {} .",
                    observation_set, observation
                ),
            ],
            SourceKind::Lookup => Vec::new(),
        }
    }

    pub(crate) fn is_lookup(&self) -> bool {
        matches!(self.kind, SourceKind::Lookup)
    }
}

/// Output of one compilation
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    /// The observations query
    pub query: String,
    /// COUNT(*) over the observations query without ordering or pagination
    pub count_query: String,
    /// Every resolved dimension; result dimensions come first, in column order
    pub dimensions: Vec<ResolvedDimension>,
}

impl CompiledQuery {
    /// Dimensions present in result rows, in column order
    pub fn results(&self) -> impl Iterator<Item = &ResolvedDimension> {
        self.dimensions.iter().filter(|d| d.is_result)
    }
}

/// Compilation context shared by the sub-builders
pub struct ViewQuery<'a> {
    dataset: &'a Dataset,
    view: RdfSubject,
    options: QueryOptions,
    variables: Variables,
    dimensions: Vec<ResolvedDimension>,
    sources: Vec<ResolvedSource>,
    language_blocks: Vec<String>,
    /// Patterns hanging off a language-bound variable, emitted after its BIND
    late_patterns: Vec<String>,
    service_blocks: Vec<String>,
    where_filters: Vec<String>,
    having: Vec<String>,
}

impl<'a> ViewQuery<'a> {
    pub fn new(dataset: &'a Dataset, view: RdfSubject, options: QueryOptions) -> Self {
        Self {
            dataset,
            view,
            options,
            variables: Variables::default(),
            dimensions: Vec::new(),
            sources: Vec::new(),
            language_blocks: Vec::new(),
            late_patterns: Vec::new(),
            service_blocks: Vec::new(),
            where_filters: Vec::new(),
            having: Vec::new(),
        }
    }

    /// Run every compilation step
    pub fn compile(mut self) -> QueryResult<CompiledQuery> {
        dimensions::resolve(&mut self)?;
        sources::resolve(&mut self)?;
        patterns::build(&mut self)?;
        filters::build(&mut self)?;
        result::build(self)
    }

    fn dimension_index(&self, term: &RdfSubject) -> Option<usize> {
        self.dimensions.iter().position(|d| &d.term == term)
    }

    fn source_index(&self, term: &RdfSubject) -> Option<usize> {
        self.sources.iter().position(|s| &s.term == term)
    }
}

/// Compile the View at `view` in `dataset`
pub fn compile(
    dataset: &Dataset,
    view: &RdfSubject,
    options: QueryOptions,
) -> QueryResult<CompiledQuery> {
    ViewQuery::new(dataset, view.clone(), options).compile()
}

/// Wrap `lines` in a `GRAPH` block when a graph is given
pub(crate) fn in_graph(graph: Option<&NamedNode>, lines: &[String]) -> Vec<String> {
    match graph {
        Some(graph) => {
            let mut block = vec![format!("GRAPH {graph} {{")];
            block.extend(lines.iter().map(|l| format!("  {l}")));
            block.push("}".to_string());
            block
        }
        None => lines.to_vec(),
    }
}

pub(crate) fn subject_of(term: &RdfObject) -> QueryResult<RdfSubject> {
    term.to_subject()
        .ok_or_else(|| QueryError::InvalidTerm(term.to_string()))
}
