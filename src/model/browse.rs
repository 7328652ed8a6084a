//! Browse filters
//!
//! Turns the parameters of a dataset browsing request into the discovery
//! predicates narrowing [`Source::cubes`](super::Source::cubes).

use super::DiscoveryPredicate;
use crate::rdf::{dcat, dcterms, NamedNode, RdfResult};
use serde::{Deserialize, Serialize};

/// Browsing request parameters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowseParams {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub iri: Option<String>,
    #[serde(default)]
    pub subtype: Option<String>,
    #[serde(default)]
    pub subiri: Option<String>,
}

/// What a search filter narrows on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SearchFilterKind {
    Theme,
    Organization,
}

impl SearchFilterKind {
    fn parse(kind: &str) -> Option<Self> {
        match kind {
            "theme" => Some(SearchFilterKind::Theme),
            "organization" => Some(SearchFilterKind::Organization),
            _ => None,
        }
    }
}

/// One narrowing step of a browse request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilter {
    #[serde(rename = "type")]
    pub kind: SearchFilterKind,
    pub iri: String,
}

impl SearchFilter {
    /// Discovery predicate matching cubes with this theme or creator
    pub fn to_predicate(&self) -> RdfResult<DiscoveryPredicate> {
        let predicate = match self.kind {
            SearchFilterKind::Theme => dcat::THEME,
            SearchFilterKind::Organization => dcterms::CREATOR,
        };
        Ok(DiscoveryPredicate::eq(
            predicate.into(),
            NamedNode::new(&self.iri)?,
        ))
    }
}

/// Filters of a browse request, `type`/`iri` first and `subtype`/`subiri`
/// second; kinds other than theme and organization contribute nothing
pub fn filters_from_params(params: &BrowseParams) -> Vec<SearchFilter> {
    [
        (&params.kind, &params.iri),
        (&params.subtype, &params.subiri),
    ]
    .into_iter()
    .filter_map(|(kind, iri)| {
        let kind = SearchFilterKind::parse(kind.as_deref()?)?;
        Some(SearchFilter {
            kind,
            iri: iri.clone()?,
        })
    })
    .collect()
}
