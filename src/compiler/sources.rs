//! Source resolution

use super::{QueryError, QueryResult, ResolvedSource, SourceKind, ViewQuery};
use crate::rdf::{rdf, view, RdfObject, RdfSubject};

/// Collect the distinct sources of all resolved dimensions, in first-use
/// order, and allocate the observation variables of each cube source
pub(super) fn resolve(ctx: &mut ViewQuery<'_>) -> QueryResult<()> {
    let terms: Vec<RdfSubject> = ctx
        .dimensions
        .iter()
        .flat_map(|d| d.from.iter().map(|f| f.source.clone()))
        .collect();

    for term in terms {
        if ctx.source_index(&term).is_some() {
            continue;
        }

        let dataset = ctx.dataset;
        let graph = dataset
            .object(&term, &view::GRAPH.into())
            .and_then(|g| g.as_named_node().cloned());

        let lookup = dataset.has(
            &term,
            &rdf::TYPE.into(),
            &RdfObject::from(view::LOOKUP_SOURCE),
        );
        let kind = if lookup {
            SourceKind::Lookup
        } else {
            let cube = dataset
                .object(&term, &view::CUBE.into())
                .and_then(|c| c.as_named_node().cloned())
                .ok_or_else(|| QueryError::MissingCube(term.to_string()))?;
            SourceKind::Cube {
                cube,
                observation_set: ctx.variables.next("observationSet"),
                observation: ctx.variables.next("observation"),
            }
        };

        ctx.sources.push(ResolvedSource {
            term,
            graph,
            kind,
            patterns: Vec::new(),
        });
    }

    for source in &mut ctx.sources {
        source.patterns = source.anchor_patterns();
    }
    Ok(())
}
