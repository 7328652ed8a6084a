//! Composable predicates for cube and view discovery
//!
//! Each [`DiscoveryPredicate`] compiles against the discovered variable into
//! triple patterns and `FILTER` expressions. Predicates are AND-combined by
//! concatenating their fragments.

use crate::compiler::Variable;
use crate::rdf::{schema, Literal, NamedNode, RdfObject};

/// Binary comparison of a discovery predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Ne,
    Lt,
    Gt,
    Lte,
    Gte,
}

impl Comparison {
    pub fn symbol(&self) -> &'static str {
        match self {
            Comparison::Eq => "=",
            Comparison::Ne => "!=",
            Comparison::Lt => "<",
            Comparison::Gt => ">",
            Comparison::Lte => "<=",
            Comparison::Gte => ">=",
        }
    }
}

/// Fragments contributed to a discovery query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragments {
    pub patterns: Vec<String>,
    pub filters: Vec<String>,
}

/// A condition on discovered cubes or views
#[derive(Debug, Clone, PartialEq)]
pub enum DiscoveryPredicate {
    /// `?x predicate ?v . FILTER (?v op value)`
    Compare {
        comparison: Comparison,
        predicate: NamedNode,
        value: RdfObject,
    },
    /// `?x predicate ?v . FILTER (?v IN (values))`
    In {
        predicate: NamedNode,
        values: Vec<RdfObject>,
    },
    /// The subject has no `predicate` (with `value`, if given)
    NotExists {
        predicate: NamedNode,
        value: Option<RdfObject>,
    },
    /// `subject predicate ?x`, with `subject` fresh when not given
    PatternIn {
        predicate: NamedNode,
        subject: Option<NamedNode>,
    },
}

impl DiscoveryPredicate {
    pub fn compare(comparison: Comparison, predicate: NamedNode, value: impl Into<RdfObject>) -> Self {
        DiscoveryPredicate::Compare {
            comparison,
            predicate,
            value: value.into(),
        }
    }

    pub fn eq(predicate: NamedNode, value: impl Into<RdfObject>) -> Self {
        Self::compare(Comparison::Eq, predicate, value)
    }

    pub fn ne(predicate: NamedNode, value: impl Into<RdfObject>) -> Self {
        Self::compare(Comparison::Ne, predicate, value)
    }

    pub fn lt(predicate: NamedNode, value: impl Into<RdfObject>) -> Self {
        Self::compare(Comparison::Lt, predicate, value)
    }

    pub fn gt(predicate: NamedNode, value: impl Into<RdfObject>) -> Self {
        Self::compare(Comparison::Gt, predicate, value)
    }

    pub fn lte(predicate: NamedNode, value: impl Into<RdfObject>) -> Self {
        Self::compare(Comparison::Lte, predicate, value)
    }

    pub fn gte(predicate: NamedNode, value: impl Into<RdfObject>) -> Self {
        Self::compare(Comparison::Gte, predicate, value)
    }

    pub fn is_in(predicate: NamedNode, values: Vec<RdfObject>) -> Self {
        DiscoveryPredicate::In { predicate, values }
    }

    pub fn not_exists(predicate: NamedNode, value: Option<RdfObject>) -> Self {
        DiscoveryPredicate::NotExists { predicate, value }
    }

    pub fn pattern_in(predicate: NamedNode, subject: Option<NamedNode>) -> Self {
        DiscoveryPredicate::PatternIn { predicate, subject }
    }

    /// Compile against `subject`; `index` keeps fresh variables unique
    /// across the predicates of one query
    pub fn compile(&self, subject: &Variable, index: usize) -> Fragments {
        let fresh = Variable::new(format!("value{index}"));
        match self {
            DiscoveryPredicate::Compare {
                comparison,
                predicate,
                value,
            } => Fragments {
                patterns: vec![format!("{subject} {predicate} {fresh} .")],
                filters: vec![format!("FILTER ({fresh} {} {value})", comparison.symbol())],
            },
            DiscoveryPredicate::In { predicate, values } => {
                let values: Vec<String> = values.iter().map(ToString::to_string).collect();
                Fragments {
                    patterns: vec![format!("{subject} {predicate} {fresh} .")],
                    filters: vec![format!("FILTER ({fresh} IN ({}))", values.join(", "))],
                }
            }
            DiscoveryPredicate::NotExists { predicate, value } => {
                let object = value
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_else(|| fresh.to_string());
                Fragments {
                    patterns: Vec::new(),
                    filters: vec![format!("FILTER NOT EXISTS {{ {subject} {predicate} {object} . }}")],
                }
            }
            DiscoveryPredicate::PatternIn { predicate, subject: container } => {
                let container = container
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_else(|| fresh.to_string());
                Fragments {
                    patterns: vec![format!("{container} {predicate} {subject} .")],
                    filters: Vec::new(),
                }
            }
        }
    }
}

/// Cube-specific discovery predicates
pub mod cube_filter {
    use super::*;

    /// Cube is part of `container` (any container when `None`)
    pub fn is_part_of(container: Option<NamedNode>) -> DiscoveryPredicate {
        DiscoveryPredicate::pattern_in(schema::HAS_PART.into(), container)
    }

    /// Cube has no `schema:expires`
    pub fn no_expires() -> DiscoveryPredicate {
        DiscoveryPredicate::not_exists(schema::EXPIRES.into(), None)
    }

    /// Cube has no `schema:validThrough`
    pub fn no_valid_through() -> DiscoveryPredicate {
        DiscoveryPredicate::not_exists(schema::VALID_THROUGH.into(), None)
    }

    /// Cube's `schema:creativeWorkStatus` is one of `values`
    pub fn status(values: Vec<NamedNode>) -> DiscoveryPredicate {
        DiscoveryPredicate::is_in(
            schema::CREATIVE_WORK_STATUS.into(),
            values.into_iter().map(Into::into).collect(),
        )
    }

    /// Cube has `schema:version` equal to `value`
    pub fn version(value: i64) -> DiscoveryPredicate {
        version::eq(value)
    }

    /// `schema:version` comparisons
    pub mod version {
        use super::*;

        fn compare(comparison: Comparison, value: i64) -> DiscoveryPredicate {
            DiscoveryPredicate::compare(comparison, schema::VERSION.into(), Literal::new_integer(value))
        }

        pub fn eq(value: i64) -> DiscoveryPredicate {
            compare(Comparison::Eq, value)
        }

        pub fn ne(value: i64) -> DiscoveryPredicate {
            compare(Comparison::Ne, value)
        }

        pub fn lt(value: i64) -> DiscoveryPredicate {
            compare(Comparison::Lt, value)
        }

        pub fn gt(value: i64) -> DiscoveryPredicate {
            compare(Comparison::Gt, value)
        }

        pub fn lte(value: i64) -> DiscoveryPredicate {
            compare(Comparison::Lte, value)
        }

        pub fn gte(value: i64) -> DiscoveryPredicate {
            compare(Comparison::Gte, value)
        }
    }
}
