//! Projection, grouping, ordering and pagination

use super::dimensions::columns;
use super::{
    in_graph, subject_of, CompiledQuery, QueryError, QueryResult, ResolvedDimension, ViewQuery,
};
use crate::model::Direction;
use crate::rdf::{view, Dataset, RdfObject, RdfSubject};

fn projection(dataset: &Dataset, view: &RdfSubject) -> Option<RdfSubject> {
    dataset.object(view, &view::PROJECTION.into())?.to_subject()
}

fn integer(dataset: &Dataset, projection: Option<&RdfSubject>, predicate: oxrdf::NamedNodeRef<'_>) -> Option<i64> {
    dataset
        .object(projection?, &predicate.into())?
        .as_literal()?
        .as_i64()
}

/// Order result dimensions by `view:columns` when declared
fn order_results(dataset: &Dataset, view: &RdfSubject, dimensions: Vec<ResolvedDimension>) -> Vec<ResolvedDimension> {
    let (mut results, others): (Vec<_>, Vec<_>) = dimensions.into_iter().partition(|d| d.is_result);
    if let Some(columns) = columns(dataset, view) {
        results.sort_by_key(|d| {
            let term = RdfObject::from(d.term.clone());
            columns.iter().position(|c| c == &term)
        });
    }
    results.extend(others);
    results
}

/// `ORDER BY` conditions; a grouped query only orders by its result columns
fn order_by(
    ctx: &ViewQuery<'_>,
    dimensions: &[ResolvedDimension],
    grouped: bool,
) -> QueryResult<Vec<String>> {
    let dataset = ctx.dataset;
    let Some(projection) = projection(dataset, &ctx.view) else {
        return Ok(Vec::new());
    };
    let Some(head) = dataset.object(&projection, &view::ORDER_BY.into()) else {
        return Ok(Vec::new());
    };
    let items = dataset
        .list(&head)
        .ok_or_else(|| QueryError::InvalidTerm(head.to_string()))?;

    let mut conditions = Vec::new();
    for item in items {
        let item = subject_of(&item)?;
        let dimension = dataset
            .object(&item, &view::DIMENSION.into())
            .ok_or_else(|| QueryError::InvalidTerm(item.to_string()))?;
        let dimension = dimensions
            .iter()
            .find(|d| RdfObject::from(d.term.clone()) == dimension && (d.is_result || !grouped))
            .ok_or_else(|| QueryError::UnknownDimension(dimension.to_string()))?;

        let direction = match dataset.object(&item, &view::DIRECTION.into()) {
            Some(direction) => Direction::from_term(&direction)
                .ok_or_else(|| QueryError::UnknownDirection(direction.to_string()))?,
            None => Direction::Ascending,
        };
        conditions.push(format!("{}({})", direction.sparql_name(), dimension.output));
    }
    Ok(conditions)
}

fn indent(lines: Vec<String>) -> impl Iterator<Item = String> {
    lines
        .into_iter()
        .flat_map(|block| block.lines().map(|l| format!("  {l}")).collect::<Vec<_>>())
}

/// Assemble the observations query and the count query
pub(super) fn build(mut ctx: ViewQuery<'_>) -> QueryResult<CompiledQuery> {
    let mut dimensions =
        order_results(ctx.dataset, &ctx.view, std::mem::take(&mut ctx.dimensions));

    let distinct = !ctx.options.disable_distinct;
    let mut select = Vec::new();
    for dimension in dimensions.iter_mut().filter(|d| d.is_result) {
        match (&dimension.aggregate, distinct) {
            (Some(aggregate), true) => {
                let output = ctx.variables.next("aggregate");
                select.push(format!(
                    "({}({}) AS {})",
                    aggregate.sparql_name(),
                    dimension.variable,
                    output
                ));
                dimension.output = output;
            }
            _ => select.push(dimension.variable.to_string()),
        }
    }

    let grouped = distinct
        && (dimensions.iter().any(|d| d.is_result && d.is_aggregate()) || !ctx.having.is_empty());
    let group_by: Vec<String> = dimensions
        .iter()
        .filter(|d| d.is_result && !d.is_aggregate())
        .map(|d| d.variable.to_string())
        .collect();

    let mut body = Vec::new();
    let (lookups, cubes): (Vec<_>, Vec<_>) = ctx.sources.iter().partition(|s| s.is_lookup());
    for source in cubes.into_iter().chain(lookups) {
        body.extend(in_graph(source.graph.as_ref(), &source.patterns));
    }
    body.extend(ctx.language_blocks.iter().cloned());
    body.extend(ctx.late_patterns.iter().cloned());
    body.extend(ctx.service_blocks.iter().cloned());
    body.extend(ctx.where_filters.iter().cloned());

    let head = if select.is_empty() { "*".to_string() } else { select.join(" ") };
    let mut inner = vec![format!(
        "SELECT {}{} WHERE {{",
        if distinct { "DISTINCT " } else { "" },
        head
    )];
    inner.extend(indent(body));
    inner.push("}".to_string());
    if grouped {
        if !group_by.is_empty() {
            inner.push(format!("GROUP BY {}", group_by.join(" ")));
        }
        if !ctx.having.is_empty() {
            inner.push(format!("HAVING {}", ctx.having.join(" ")));
        }
    }

    let mut query = inner.clone();
    let order = order_by(&ctx, &dimensions, grouped)?;
    if !order.is_empty() {
        query.push(format!("ORDER BY {}", order.join(" ")));
    }
    let projection = projection(ctx.dataset, &ctx.view);
    if let Some(offset) = integer(ctx.dataset, projection.as_ref(), view::OFFSET) {
        query.push(format!("OFFSET {offset}"));
    }
    if let Some(limit) = integer(ctx.dataset, projection.as_ref(), view::LIMIT) {
        query.push(format!("LIMIT {limit}"));
    }

    let mut count = vec!["SELECT (COUNT(*) AS ?count) WHERE {".to_string(), "  {".to_string()];
    count.extend(inner.into_iter().map(|l| format!("    {l}")));
    count.push("  }".to_string());
    count.push("}".to_string());

    Ok(CompiledQuery {
        query: query.join("\n"),
        count_query: count.join("\n"),
        dimensions,
    })
}
