//! Dimension resolution

use super::{subject_of, FromEntry, QueryError, QueryResult, ResolvedDimension, ViewQuery};
use crate::model::Aggregate;
use crate::rdf::{view, BlankNode, Dataset, RdfObject, RdfPredicate, RdfSubject};

/// `view:projection/view:columns` of `view`, if declared
pub(crate) fn columns(dataset: &Dataset, view: &RdfSubject) -> Option<Vec<RdfObject>> {
    let projection = dataset.object(view, &view::PROJECTION.into())?.to_subject()?;
    let head = dataset.object(&projection, &view::COLUMNS.into())?;
    dataset.list(&head)
}

fn object(dataset: &Dataset, subject: &RdfSubject, predicate: impl Into<RdfPredicate>) -> Option<RdfObject> {
    dataset.object(subject, &predicate.into())
}

/// Collect the dimensions referenced by the view, its filters and joins, and
/// allocate one variable per dimension
pub(super) fn resolve(ctx: &mut ViewQuery<'_>) -> QueryResult<()> {
    let dataset = ctx.dataset;
    let direct: Vec<RdfSubject> = dataset
        .objects(&ctx.view, &view::DIMENSION.into())
        .iter()
        .map(subject_of)
        .collect::<QueryResult<_>>()?;

    let mut filtered = Vec::new();
    let mut language_filtered = Vec::new();
    for filter in dataset.objects(&ctx.view, &view::FILTER.into()) {
        let filter = subject_of(&filter)?;
        let dimension = object(dataset, &filter, view::DIMENSION)
            .ok_or_else(|| QueryError::MissingDimension(filter.to_string()))?;
        let dimension = subject_of(&dimension)?;
        if object(dataset, &filter, view::OPERATION) == Some(RdfObject::from(view::LANG)) {
            language_filtered.push(dimension.clone());
        }
        filtered.push(dimension);
    }

    let columns = columns(dataset, &ctx.view);

    let mut pending: Vec<RdfSubject> = direct.clone();
    pending.extend(filtered.iter().cloned());
    let mut index = 0;
    while index < pending.len() {
        let term = pending[index].clone();
        index += 1;
        if ctx.dimension_index(&term).is_some() {
            continue;
        }

        let from = from_entries(dataset, &term)?;
        for entry in &from {
            if let Some(join) = &entry.join {
                pending.push(join.clone());
            }
        }

        let aggregate = match object(dataset, &term, view::AGGREGATE) {
            Some(term) => Some(
                Aggregate::from_term(&term)
                    .ok_or_else(|| QueryError::UnknownAggregate(term.to_string()))?,
            ),
            None => None,
        };

        let property = match object(dataset, &term, view::AS) {
            Some(property) => property,
            None => match from.first().map(|f| &f.path) {
                Some(path @ RdfObject::NamedNode(_)) => path.clone(),
                _ => BlankNode::new().into(),
            },
        };

        let term_object = RdfObject::from(term.clone());
        let is_direct = direct.contains(&term);
        let is_result = match &columns {
            Some(columns) => columns.contains(&term_object),
            None => is_direct,
        };

        let variable = ctx.variables.next("dimension");
        ctx.dimensions.push(ResolvedDimension {
            is_filter: filtered.contains(&term),
            has_language_filter: language_filtered.contains(&term),
            term,
            property,
            output: variable.clone(),
            variable,
            aggregate,
            is_result,
            from,
        });
    }

    Ok(())
}

fn from_entries(dataset: &Dataset, dimension: &RdfSubject) -> QueryResult<Vec<FromEntry>> {
    let mut entries = Vec::new();
    for from in dataset.objects(dimension, &view::FROM.into()) {
        let from = subject_of(&from)?;
        let source = object(dataset, &from, view::SOURCE_PROPERTY)
            .ok_or_else(|| QueryError::MissingSource(dimension.to_string()))?;
        let path = object(dataset, &from, view::PATH)
            .ok_or_else(|| QueryError::MissingPath(dimension.to_string()))?;
        let join = object(dataset, &from, view::JOIN)
            .map(|join| subject_of(&join))
            .transpose()?;

        entries.push(FromEntry {
            source: subject_of(&source)?,
            path,
            join,
        });
    }

    if entries.is_empty() {
        return Err(QueryError::MissingPath(dimension.to_string()));
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::QueryOptions;
    use crate::rdf::{Literal, NamedNode, Quad};

    fn ex(local: &str) -> NamedNode {
        NamedNode::new(&format!("http://example.org/{local}")).unwrap()
    }

    fn dimension(dataset: &Dataset, term: &str, path: &str) {
        let from = BlankNode::new();
        dataset.insert(Quad::triple(ex(term), view::FROM, from.clone()));
        dataset.insert(Quad::triple(from.clone(), view::SOURCE_PROPERTY, ex("source")));
        dataset.insert(Quad::triple(from, view::PATH, ex(path)));
    }

    #[test]
    fn test_direct_and_filter_only_dimensions() {
        let dataset = Dataset::new();
        dimension(&dataset, "year", "year");
        dimension(&dataset, "area", "area");
        dataset.insert(Quad::triple(ex("view"), view::DIMENSION, ex("year")));
        dataset.insert(Quad::triple(ex("view"), view::FILTER, ex("filter")));
        dataset.insert(Quad::triple(ex("filter"), view::DIMENSION, ex("area")));
        dataset.insert(Quad::triple(ex("filter"), view::OPERATION, view::LANG));
        dataset.insert(Quad::triple(ex("year"), view::AS, ex("Year")));

        let mut ctx = ViewQuery::new(&dataset, ex("view").into(), QueryOptions::default());
        resolve(&mut ctx).unwrap();

        assert_eq!(ctx.dimensions.len(), 2);
        let year = &ctx.dimensions[0];
        assert_eq!(year.property, ex("Year").into());
        assert!(year.is_result && !year.is_filter);
        assert_eq!(year.variable.name(), "dimension0");

        let area = &ctx.dimensions[1];
        assert_eq!(area.property, ex("area").into());
        assert!(!area.is_result && area.is_filter && area.has_language_filter);
    }

    #[test]
    fn test_unknown_aggregate() {
        let dataset = Dataset::new();
        dimension(&dataset, "year", "year");
        dataset.insert(Quad::triple(ex("view"), view::DIMENSION, ex("year")));
        dataset.insert(Quad::triple(ex("year"), view::AGGREGATE, ex("Median")));

        let mut ctx = ViewQuery::new(&dataset, ex("view").into(), QueryOptions::default());
        assert_eq!(
            resolve(&mut ctx),
            Err(QueryError::UnknownAggregate("<http://example.org/Median>".to_string()))
        );
    }

    #[test]
    fn test_missing_path() {
        let dataset = Dataset::new();
        dataset.insert(Quad::triple(ex("view"), view::DIMENSION, ex("year")));
        dataset.insert(Quad::triple(ex("year"), view::AS, Literal::new_simple_literal("x")));

        let mut ctx = ViewQuery::new(&dataset, ex("view").into(), QueryOptions::default());
        assert!(matches!(resolve(&mut ctx), Err(QueryError::MissingPath(_))));
    }
}
