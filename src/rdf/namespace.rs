//! RDF namespaces and vocabulary terms
//!
//! The view vocabulary (`https://cube.link/view/`) is the wire format of
//! stored View definitions and must match it exactly.

use super::types::NamedNode;
use oxrdf::NamedNodeRef;

/// Namespace (prefix → IRI mapping)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Namespace {
    /// Prefix
    pub prefix: &'static str,
    /// IRI
    pub iri: &'static str,
}

impl Namespace {
    pub const fn new(prefix: &'static str, iri: &'static str) -> Self {
        Self { prefix, iri }
    }

    /// Mint a term in this namespace
    pub fn term(&self, local: &str) -> NamedNode {
        NamedNode::new_unchecked(format!("{}{}", self.iri, local))
    }

    /// Whether `iri` lives in this namespace
    pub fn contains(&self, iri: &str) -> bool {
        iri.starts_with(self.iri)
    }
}

pub const RDF: Namespace = Namespace::new("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#");
pub const XSD: Namespace = Namespace::new("xsd", "http://www.w3.org/2001/XMLSchema#");
pub const SH: Namespace = Namespace::new("sh", "http://www.w3.org/ns/shacl#");
pub const SCHEMA: Namespace = Namespace::new("schema", "http://schema.org/");
pub const CUBE: Namespace = Namespace::new("cube", "https://cube.link/");
pub const VIEW: Namespace = Namespace::new("view", "https://cube.link/view/");
pub const DCAT: Namespace = Namespace::new("dcat", "http://www.w3.org/ns/dcat#");
pub const DCTERMS: Namespace = Namespace::new("dcterms", "http://purl.org/dc/terms/");

pub mod rdf {
    use super::NamedNodeRef;

    pub const TYPE: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/1999/02/22-rdf-syntax-ns#type");
    pub const FIRST: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/1999/02/22-rdf-syntax-ns#first");
    pub const REST: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/1999/02/22-rdf-syntax-ns#rest");
    pub const NIL: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/1999/02/22-rdf-syntax-ns#nil");
}

pub mod xsd {
    use super::NamedNodeRef;

    pub const INTEGER: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/2001/XMLSchema#integer");
}

pub mod sh {
    use super::NamedNodeRef;

    pub const PROPERTY: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#property");
    pub const PATH: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#path");
    pub const DATATYPE: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#datatype");
    pub const NODE_KIND: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#nodeKind");
    pub const OR: NamedNodeRef<'_> = NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#or");
    pub const IN: NamedNodeRef<'_> = NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#in");
    pub const NODE: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#node");
    pub const MIN_INCLUSIVE: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#minInclusive");
    pub const MIN_EXCLUSIVE: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#minExclusive");
    pub const MAX_INCLUSIVE: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#maxInclusive");
    pub const MAX_EXCLUSIVE: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#maxExclusive");
    pub const INVERSE_PATH: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#inversePath");
    pub const ALTERNATIVE_PATH: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#alternativePath");
}

pub mod schema {
    use super::NamedNodeRef;

    pub const NAME: NamedNodeRef<'_> = NamedNodeRef::new_unchecked("http://schema.org/name");
    pub const HAS_PART: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://schema.org/hasPart");
    pub const EXPIRES: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://schema.org/expires");
    pub const VALID_THROUGH: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://schema.org/validThrough");
    pub const CREATIVE_WORK_STATUS: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://schema.org/creativeWorkStatus");
    pub const VERSION: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://schema.org/version");
}

pub mod dcat {
    use super::NamedNodeRef;

    pub const THEME: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/dcat#theme");
}

pub mod dcterms {
    use super::NamedNodeRef;

    pub const CREATOR: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://purl.org/dc/terms/creator");
}

pub mod cube {
    use super::NamedNodeRef;

    pub const CUBE: NamedNodeRef<'_> = NamedNodeRef::new_unchecked("https://cube.link/Cube");
    pub const OBSERVATION_CONSTRAINT: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("https://cube.link/observationConstraint");
    pub const OBSERVATION_SET: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("https://cube.link/observationSet");
    pub const OBSERVATION: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("https://cube.link/observation");
    pub const OBSERVED_BY: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("https://cube.link/observedBy");
    pub const UNDEFINED: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("https://cube.link/Undefined");
}

pub mod view {
    use super::NamedNodeRef;

    macro_rules! view_terms {
        ($($name:ident => $local:literal),* $(,)?) => {
            $(
                pub const $name: NamedNodeRef<'_> =
                    NamedNodeRef::new_unchecked(concat!("https://cube.link/view/", $local));
            )*
        };
    }

    view_terms! {
        VIEW => "View",
        DIMENSION_CLASS => "Dimension",
        FILTER_CLASS => "Filter",
        SOURCE => "Source",
        CUBE_SOURCE => "CubeSource",
        LOOKUP_SOURCE => "LookupSource",
        DIMENSION => "dimension",
        FILTER => "filter",
        FROM => "from",
        SOURCE_PROPERTY => "source",
        PATH => "path",
        JOIN => "join",
        AS => "as",
        AGGREGATE => "aggregate",
        AVG => "Avg",
        MAX => "Max",
        MIN => "Min",
        OPERATION => "operation",
        EQ => "Eq",
        NE => "Ne",
        LT => "Lt",
        GT => "Gt",
        LTE => "Lte",
        GTE => "Gte",
        IN => "In",
        LANG => "Lang",
        STARDOG_TEXT_SEARCH => "StardogTextSearch",
        ARGUMENT => "argument",
        FUNCTION => "function",
        DAY => "Day",
        MONTH => "Month",
        YEAR => "Year",
        PROJECTION => "projection",
        COLUMNS => "columns",
        ORDER_BY => "orderBy",
        DIRECTION => "direction",
        ASCENDING => "Ascending",
        DESCENDING => "Descending",
        OFFSET => "offset",
        LIMIT => "limit",
        ENDPOINT => "endpoint",
        GRAPH => "graph",
        CUBE => "cube",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_terms() {
        assert_eq!(VIEW.term("View").as_str(), view::VIEW.as_str());
        assert_eq!(CUBE.term("Cube").as_str(), cube::CUBE.as_str());
        assert_eq!(SH.term("path").as_str(), sh::PATH.as_str());
    }

    #[test]
    fn test_view_vocabulary() {
        assert_eq!(view::SOURCE_PROPERTY.as_str(), "https://cube.link/view/source");
        assert_eq!(
            view::STARDOG_TEXT_SEARCH.as_str(),
            "https://cube.link/view/StardogTextSearch"
        );
        assert!(VIEW.contains(view::ORDER_BY.as_str()));
        assert!(!VIEW.contains(cube::OBSERVATION.as_str()));
    }
}
