//! View filters

use super::{Dimension, ModelError, ModelResult, Node, TermLike};
use crate::rdf::{rdf, view, BlankNode, Literal, RdfObject, RdfSubject};
use oxrdf::NamedNodeRef;

/// Filter operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Eq,
    Ne,
    Lt,
    Gt,
    Lte,
    Gte,
    In,
    /// Language fallback chain over language-tagged values
    Lang,
    /// Full text search through the Stardog search service
    StardogTextSearch,
}

const OPERATIONS: [Operation; 9] = [
    Operation::Eq,
    Operation::Ne,
    Operation::Lt,
    Operation::Gt,
    Operation::Lte,
    Operation::Gte,
    Operation::In,
    Operation::Lang,
    Operation::StardogTextSearch,
];

impl Operation {
    pub fn term(&self) -> NamedNodeRef<'static> {
        match self {
            Operation::Eq => view::EQ,
            Operation::Ne => view::NE,
            Operation::Lt => view::LT,
            Operation::Gt => view::GT,
            Operation::Lte => view::LTE,
            Operation::Gte => view::GTE,
            Operation::In => view::IN,
            Operation::Lang => view::LANG,
            Operation::StardogTextSearch => view::STARDOG_TEXT_SEARCH,
        }
    }

    pub fn from_term(term: &RdfObject) -> Option<Self> {
        let term = term.as_named_node()?;
        OPERATIONS.into_iter().find(|op| *term == op.term())
    }

    /// Infix operator of a binary comparison
    pub fn symbol(&self) -> Option<&'static str> {
        match self {
            Operation::Eq => Some("="),
            Operation::Ne => Some("!="),
            Operation::Lt => Some("<"),
            Operation::Gt => Some(">"),
            Operation::Lte => Some("<="),
            Operation::Gte => Some(">="),
            Operation::In | Operation::Lang | Operation::StardogTextSearch => None,
        }
    }
}

/// Date part extracted before comparing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFunction {
    Day,
    Month,
    Year,
}

impl DateFunction {
    pub fn term(&self) -> NamedNodeRef<'static> {
        match self {
            DateFunction::Day => view::DAY,
            DateFunction::Month => view::MONTH,
            DateFunction::Year => view::YEAR,
        }
    }

    pub fn from_term(term: &RdfObject) -> Option<Self> {
        let term = term.as_named_node()?;
        [DateFunction::Day, DateFunction::Month, DateFunction::Year]
            .into_iter()
            .find(|f| *term == f.term())
    }

    pub fn sparql_name(&self) -> &'static str {
        match self {
            DateFunction::Day => "DAY",
            DateFunction::Month => "MONTH",
            DateFunction::Year => "YEAR",
        }
    }
}

/// A condition on one dimension
///
/// Filters are created through [`Dimension::filter`] and become part of a
/// View once passed to [`View::add_filter`](super::View::add_filter).
#[derive(Clone)]
pub struct Filter {
    node: Node,
}

impl Filter {
    fn create(
        dimension: &Dimension,
        operation: Operation,
        arguments: Arguments,
    ) -> ModelResult<Self> {
        let parent = dimension.node().parent().unwrap_or_else(|| dimension.node().clone());
        let node = parent.create_child(BlankNode::new().into());
        let dataset = node.dataset().clone();

        node.add(rdf::TYPE, view::FILTER_CLASS);
        node.add(view::DIMENSION, dimension.term().clone());
        node.add(view::OPERATION, operation.term());
        match arguments {
            Arguments::Single(argument) => node.add(view::ARGUMENT, argument.to_term(&dataset)?),
            Arguments::Set(arguments) => {
                for argument in arguments {
                    node.add(view::ARGUMENT, argument.to_term(&dataset)?);
                }
            }
            Arguments::List(arguments) => {
                node.add(view::ARGUMENT, dataset.insert_list(&arguments, None));
            }
        }

        Ok(Self { node })
    }

    /// Wrap an existing filter description
    pub(crate) fn from_term(parent: &Node, term: RdfSubject) -> Self {
        Self {
            node: parent.create_child(term),
        }
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    pub fn term(&self) -> &RdfSubject {
        self.node.term()
    }

    /// Term of the filtered dimension
    pub fn dimension(&self) -> Option<RdfObject> {
        self.node.out_one(view::DIMENSION)
    }

    pub fn operation(&self) -> Option<Operation> {
        Operation::from_term(&self.node.out_one(view::OPERATION)?)
    }

    pub fn function(&self) -> Option<DateFunction> {
        DateFunction::from_term(&self.node.out_one(view::FUNCTION)?)
    }

    /// Arguments in their stored order; lists are expanded
    pub fn arguments(&self) -> Vec<RdfObject> {
        let values = self.node.out(view::ARGUMENT);
        match values.as_slice() {
            [single] => self.node.dataset().list(single).unwrap_or_else(|| values.clone()),
            _ => values,
        }
    }

    /// Compare the year, month or day of the dimension value
    pub fn with_function(self, function: DateFunction) -> Self {
        self.node.set(view::FUNCTION, function.term());
        self
    }

    /// Check the filter names a dimension, an operation and an argument
    pub fn validate(&self) -> ModelResult<()> {
        let missing = if self.dimension().is_none() {
            Some("dimension")
        } else if self.operation().is_none() {
            Some("operation")
        } else if self.node.out(view::ARGUMENT).is_empty() {
            Some("argument")
        } else {
            None
        };

        match missing {
            Some(missing) => Err(ModelError::InvalidFilter {
                filter: self.term().to_string(),
                missing,
            }),
            None => Ok(()),
        }
    }

    /// Remove this filter's description
    pub fn clear(&self) {
        self.node.clear();
    }
}

impl std::fmt::Debug for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Filter")
            .field("term", self.term())
            .field("operation", &self.operation())
            .finish()
    }
}

enum Arguments {
    Single(TermLike),
    Set(Vec<TermLike>),
    List(Vec<RdfObject>),
}

/// Creates filters on one dimension
pub struct FilterBuilder<'a> {
    dimension: &'a Dimension,
}

impl<'a> FilterBuilder<'a> {
    pub(crate) fn new(dimension: &'a Dimension) -> Self {
        Self { dimension }
    }

    fn compare(&self, operation: Operation, argument: impl Into<TermLike>) -> ModelResult<Filter> {
        Filter::create(self.dimension, operation, Arguments::Single(argument.into()))
    }

    pub fn eq(&self, argument: impl Into<TermLike>) -> ModelResult<Filter> {
        self.compare(Operation::Eq, argument)
    }

    pub fn ne(&self, argument: impl Into<TermLike>) -> ModelResult<Filter> {
        self.compare(Operation::Ne, argument)
    }

    pub fn lt(&self, argument: impl Into<TermLike>) -> ModelResult<Filter> {
        self.compare(Operation::Lt, argument)
    }

    pub fn gt(&self, argument: impl Into<TermLike>) -> ModelResult<Filter> {
        self.compare(Operation::Gt, argument)
    }

    pub fn lte(&self, argument: impl Into<TermLike>) -> ModelResult<Filter> {
        self.compare(Operation::Lte, argument)
    }

    pub fn gte(&self, argument: impl Into<TermLike>) -> ModelResult<Filter> {
        self.compare(Operation::Gte, argument)
    }

    /// Value is one of `arguments`
    pub fn is_in(&self, arguments: Vec<TermLike>) -> ModelResult<Filter> {
        Filter::create(self.dimension, Operation::In, Arguments::Set(arguments))
    }

    /// Pick the value in the first available language of `languages`
    ///
    /// `""` matches untagged literals, `"*"` any language.
    pub fn lang(&self, languages: &[&str]) -> ModelResult<Filter> {
        let languages = languages
            .iter()
            .map(|l| Literal::new_simple_literal(*l).into())
            .collect();
        Filter::create(self.dimension, Operation::Lang, Arguments::List(languages))
    }

    pub fn stardog_text_search(&self, query: &str) -> ModelResult<Filter> {
        let arguments = vec![Literal::new_simple_literal(query).into()];
        Filter::create(
            self.dimension,
            Operation::StardogTextSearch,
            Arguments::List(arguments),
        )
    }
}
