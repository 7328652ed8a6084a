//! Triple pattern generation

use super::{in_graph, subject_of, FromEntry, QueryError, QueryResult, SourceKind, ViewQuery};
use crate::rdf::{sh, Dataset, RdfObject};

/// Render `path` as a SPARQL property path
///
/// A path is an IRI, an RDF list (sequence path) or a blank node carrying
/// `sh:inversePath` or `sh:alternativePath`.
pub(crate) fn render_path(dataset: &Dataset, path: &RdfObject) -> QueryResult<String> {
    match path {
        RdfObject::NamedNode(iri) => Ok(iri.to_string()),
        RdfObject::BlankNode(_) => {
            let node = subject_of(path)?;
            if let Some(inverse) = dataset.object(&node, &sh::INVERSE_PATH.into()) {
                return Ok(format!("^{}", group(dataset, &inverse)?));
            }
            if let Some(alternatives) = dataset.object(&node, &sh::ALTERNATIVE_PATH.into()) {
                let items = dataset
                    .list(&alternatives)
                    .ok_or_else(|| QueryError::InvalidPath(path.to_string()))?;
                return join(dataset, &items, "|", path).map(|p| format!("({p})"));
            }
            match dataset.list(path) {
                Some(items) if !items.is_empty() => join(dataset, &items, "/", path),
                _ => Err(QueryError::InvalidPath(path.to_string())),
            }
        }
        RdfObject::Literal(_) => Err(QueryError::InvalidPath(path.to_string())),
    }
}

fn group(dataset: &Dataset, path: &RdfObject) -> QueryResult<String> {
    let rendered = render_path(dataset, path)?;
    Ok(if path.is_named_node() {
        rendered
    } else {
        format!("({rendered})")
    })
}

fn join(dataset: &Dataset, items: &[RdfObject], separator: &str, path: &RdfObject) -> QueryResult<String> {
    if items.is_empty() {
        return Err(QueryError::InvalidPath(path.to_string()));
    }
    let parts = items
        .iter()
        .map(|item| group(dataset, item))
        .collect::<QueryResult<Vec<_>>>()?;
    Ok(parts.join(separator))
}

/// Index of the source of `from` and the variable its patterns hang off:
/// the observation for cube sources, the joined dimension for lookups
pub(crate) fn anchor(
    ctx: &ViewQuery<'_>,
    dimension: &super::ResolvedDimension,
    from: &FromEntry,
) -> QueryResult<(usize, String)> {
    let index = ctx
        .source_index(&from.source)
        .ok_or_else(|| QueryError::MissingSource(dimension.term.to_string()))?;

    let anchor = match &ctx.sources[index].kind {
        SourceKind::Cube { observation, .. } => observation.to_string(),
        SourceKind::Lookup => {
            let join = from
                .join
                .as_ref()
                .and_then(|join| ctx.dimension_index(join))
                .ok_or_else(|| QueryError::MissingJoin(dimension.term.to_string()))?;
            ctx.dimensions[join].variable.to_string()
        }
    };
    Ok((index, anchor))
}

/// Emit `anchor path ?dimension` for every source entry of every dimension.
/// Language filtered dimensions are bound by their filter instead.
pub(super) fn build(ctx: &mut ViewQuery<'_>) -> QueryResult<()> {
    let mut emitted = Vec::new();
    let mut late = Vec::new();
    for dimension in ctx.dimensions.iter().filter(|d| !d.has_language_filter) {
        for from in &dimension.from {
            let (source, anchor) = anchor(ctx, dimension, from)?;
            let path = render_path(ctx.dataset, &from.path)?;
            let pattern = format!("{anchor} {path} {} .", dimension.variable);
            if joins_language_bound(ctx, from) {
                late.extend(in_graph(ctx.sources[source].graph.as_ref(), &[pattern]));
            } else {
                emitted.push((source, pattern));
            }
        }
    }

    for (source, pattern) in emitted {
        ctx.sources[source].patterns.push(pattern);
    }
    ctx.late_patterns = late;
    Ok(())
}

/// Whether `from` joins through a dimension bound by a language BIND
fn joins_language_bound(ctx: &ViewQuery<'_>, from: &FromEntry) -> bool {
    from.join
        .as_ref()
        .and_then(|join| ctx.dimension_index(join))
        .is_some_and(|index| ctx.dimensions[index].has_language_filter)
}
