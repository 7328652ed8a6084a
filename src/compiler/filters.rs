//! Filter compilation

use super::patterns::{anchor, render_path};
use super::{in_graph, subject_of, QueryError, QueryResult, ResolvedDimension, SourceKind, ViewQuery};
use crate::model::{DateFunction, Operation};
use crate::rdf::{view, Dataset, RdfObject, RdfSubject};

const TEXT_MATCH: &str = "<tag:stardog:api:search:textMatch>";
const TEXT_QUERY: &str = "<tag:stardog:api:search:query>";
const TEXT_RESULT: &str = "<tag:stardog:api:search:result>";

/// A filter as read from the dataset
struct FilterDefinition {
    term: RdfSubject,
    dimension: usize,
    operation: Operation,
    function: Option<DateFunction>,
    arguments: Vec<RdfObject>,
}

fn read_filter(ctx: &ViewQuery<'_>, term: RdfSubject) -> QueryResult<FilterDefinition> {
    let dataset = ctx.dataset;
    let name = term.to_string();

    let dimension = dataset
        .object(&term, &view::DIMENSION.into())
        .ok_or_else(|| QueryError::MissingDimension(name.clone()))?;
    let dimension = ctx
        .dimension_index(&subject_of(&dimension)?)
        .ok_or_else(|| QueryError::UnknownDimension(dimension.to_string()))?;

    let operation = dataset
        .object(&term, &view::OPERATION.into())
        .ok_or_else(|| QueryError::MissingOperation(name.clone()))?;
    let operation = Operation::from_term(&operation)
        .ok_or_else(|| QueryError::UnknownOperation(operation.to_string()))?;

    let function = match dataset.object(&term, &view::FUNCTION.into()) {
        Some(function) => Some(
            DateFunction::from_term(&function)
                .ok_or_else(|| QueryError::UnknownFunction(function.to_string()))?,
        ),
        None => None,
    };

    let arguments = arguments(dataset, &term, operation);
    if arguments.is_empty() {
        return Err(QueryError::MissingArgument(name));
    }

    Ok(FilterDefinition {
        term,
        dimension,
        operation,
        function,
        arguments,
    })
}

/// Arguments of a filter: an ordered list for list operations, the set of
/// `view:argument` values for `In`, a single value otherwise
fn arguments(dataset: &Dataset, filter: &RdfSubject, operation: Operation) -> Vec<RdfObject> {
    let values = dataset.objects(filter, &view::ARGUMENT.into());
    match operation {
        Operation::Lang | Operation::StardogTextSearch => values
            .first()
            .and_then(|head| dataset.list(head))
            .unwrap_or_default(),
        Operation::In => match values.as_slice() {
            [single] => dataset.list(single).unwrap_or_else(|| values.clone()),
            _ => values,
        },
        _ => values.into_iter().take(1).collect(),
    }
}

/// Compile every `view:filter` of the view
pub(super) fn build(ctx: &mut ViewQuery<'_>) -> QueryResult<()> {
    let terms: Vec<RdfSubject> = ctx
        .dataset
        .objects(&ctx.view, &view::FILTER.into())
        .iter()
        .map(subject_of)
        .collect::<QueryResult<_>>()?;

    let mut language_filters = Vec::new();
    for term in terms {
        let filter = read_filter(ctx, term)?;
        match filter.operation {
            Operation::Lang => language_filters.push(filter),
            Operation::StardogTextSearch => text_search(ctx, &filter),
            _ => comparison(ctx, &filter),
        }
    }

    // all filters of one dimension share one fallback chain
    let mut pending: Vec<usize> = Vec::new();
    for filter in &language_filters {
        if !pending.contains(&filter.dimension) {
            pending.push(filter.dimension);
        }
    }
    for index in bind_order(ctx, pending) {
        let languages: Vec<String> = language_filters
            .iter()
            .filter(|f| f.dimension == index)
            .flat_map(|f| f.arguments.iter().map(|a| a.value().to_string()))
            .collect();
        language(ctx, index, &languages)?;
    }
    Ok(())
}

/// Order language-bound dimensions so a dimension joining through another
/// comes after the BIND of the one it joins through
fn bind_order(ctx: &ViewQuery<'_>, mut pending: Vec<usize>) -> Vec<usize> {
    let mut ordered = Vec::with_capacity(pending.len());
    while !pending.is_empty() {
        let ready = pending
            .iter()
            .position(|&index| {
                ctx.dimensions[index].from.iter().all(|from| {
                    from.join
                        .as_ref()
                        .and_then(|join| ctx.dimension_index(join))
                        .map_or(true, |join| !pending.contains(&join) || join == index)
                })
            })
            // a join cycle cannot be ordered; keep declaration order
            .unwrap_or(0);
        ordered.push(pending.remove(ready));
    }
    ordered
}

fn comparison(ctx: &mut ViewQuery<'_>, filter: &FilterDefinition) {
    let dimension = &ctx.dimensions[filter.dimension];
    let having = dimension.is_aggregate() && !dimension.has_language_filter;

    let mut expression = match (&dimension.aggregate, having && !ctx.options.disable_distinct) {
        (Some(aggregate), true) => format!("{}({})", aggregate.sparql_name(), dimension.variable),
        _ => dimension.variable.to_string(),
    };
    if let Some(function) = filter.function {
        expression = format!("{}({expression})", function.sparql_name());
    }

    let condition = match filter.operation.symbol() {
        Some(symbol) => format!("{expression} {symbol} {}", filter.arguments[0]),
        None => {
            let values: Vec<String> = filter.arguments.iter().map(|a| a.to_string()).collect();
            format!("{expression} IN ({})", values.join(", "))
        }
    };

    if having && !ctx.options.disable_distinct {
        ctx.having.push(format!("({condition})"));
    } else {
        ctx.where_filters.push(format!("FILTER ({condition})"));
    }
}

fn text_search(ctx: &mut ViewQuery<'_>, filter: &FilterDefinition) {
    let dimension = &ctx.dimensions[filter.dimension];
    ctx.service_blocks.push(format!(
        "SERVICE {TEXT_MATCH} {{\n  [] {TEXT_QUERY} {} ;\n    {TEXT_RESULT} {} .\n}}",
        filter.arguments[0], dimension.variable
    ));
    tracing::trace!(filter = %filter.term, "compiled text search");
}

/// One OPTIONAL per language in priority order, then a COALESCE picking the
/// first language present in the data
fn language(ctx: &mut ViewQuery<'_>, index: usize, languages: &[String]) -> QueryResult<()> {
    let dimension: ResolvedDimension = ctx.dimensions[index].clone();
    let mut candidates = Vec::new();

    for from in &dimension.from {
        let (source, anchor_var) = anchor(ctx, &dimension, from)?;
        let path = render_path(ctx.dataset, &from.path)?;
        let graph = ctx.sources[source].graph.clone();

        for language in languages {
            let variable = ctx.variables.next("language");
            let block = if language == "*" {
                let value = ctx.variables.next("value");
                let mut body = match &ctx.sources[source].kind {
                    SourceKind::Cube { .. } => ctx.sources[source].anchor_patterns(),
                    SourceKind::Lookup => Vec::new(),
                };
                body.push(format!("{anchor_var} {path} {value} ."));
                let mut lines = vec![format!(
                    "OPTIONAL {{ {{ SELECT {anchor_var} (MIN({value}) AS {variable}) WHERE {{"
                )];
                lines.extend(in_graph(graph.as_ref(), &body).into_iter().map(|l| format!("  {l}")));
                lines.push(format!("}} GROUP BY {anchor_var} }} }}"));
                lines.join("\n")
            } else {
                let condition = if language.is_empty() {
                    format!("LANG({variable}) = \"\"")
                } else {
                    format!("LANGMATCHES(LANG({variable}), \"{}\")", escape(language))
                };
                let body = vec![
                    format!("{anchor_var} {path} {variable} ."),
                    format!("FILTER ({condition})"),
                ];
                let mut lines = vec!["OPTIONAL {".to_string()];
                lines.extend(in_graph(graph.as_ref(), &body).into_iter().map(|l| format!("  {l}")));
                lines.push("}".to_string());
                lines.join("\n")
            };
            ctx.language_blocks.push(block);
            candidates.push(variable.to_string());
        }
    }

    ctx.language_blocks.push(format!(
        "BIND (COALESCE({}) AS {})",
        candidates.join(", "),
        dimension.variable
    ));
    Ok(())
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
