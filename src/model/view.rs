//! Views: declarative queries over cubes
//!
//! A [`View`] lists dimensions and filters and carries an optional projection
//! (columns, ordering, pagination) under `view:projection`. Views are
//! compiled by [`crate::compiler`] from their RDF description, so a View
//! built in code and one fetched from an endpoint behave the same.

use super::{
    Cube, Dimension, DimensionOptions, Filter, ModelError, ModelResult, Node, Source,
};
use crate::compiler::{self, templates, CompiledQuery, QueryOptions};
use crate::rdf::{
    rdf, view, BlankNode, Dataset, Literal, Quad, RdfObject, RdfSubject, RdfTerm,
};
use indexmap::IndexMap;
use oxrdf::NamedNodeRef;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info};

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    pub fn term(&self) -> NamedNodeRef<'static> {
        match self {
            Direction::Ascending => view::ASCENDING,
            Direction::Descending => view::DESCENDING,
        }
    }

    pub fn from_term(term: &RdfObject) -> Option<Self> {
        let term = term.as_named_node()?;
        [Direction::Ascending, Direction::Descending]
            .into_iter()
            .find(|d| *term == d.term())
    }

    pub fn sparql_name(&self) -> &'static str {
        match self {
            Direction::Ascending => "ASC",
            Direction::Descending => "DESC",
        }
    }
}

/// One sort key
#[derive(Debug, Clone)]
pub struct OrderBy {
    pub dimension: Dimension,
    pub direction: Direction,
}

impl OrderBy {
    pub fn asc(dimension: &Dimension) -> Self {
        Self {
            dimension: dimension.clone(),
            direction: Direction::Ascending,
        }
    }

    pub fn desc(dimension: &Dimension) -> Self {
        Self {
            dimension: dimension.clone(),
            direction: Direction::Descending,
        }
    }
}

/// Pagination and ordering, replaced as a whole by [`View::update_projection`]
#[derive(Debug, Clone, Default)]
pub struct Projection {
    pub offset: Option<u64>,
    pub limit: Option<u64>,
    pub order_by: Vec<OrderBy>,
}

/// Options of [`View::with_options`]
#[derive(Clone, Default)]
pub struct ViewOptions {
    /// View term; a fresh blank node when not given
    pub term: Option<RdfSubject>,
    /// Explicit main source
    pub source: Option<Source>,
    /// Dataset to describe the view in; the source's dataset, else a new one
    pub dataset: Option<Dataset>,
}

struct ViewInner {
    node: Node,
    source: Option<Source>,
    dimensions: RwLock<Vec<Dimension>>,
    filters: RwLock<Vec<Filter>>,
}

/// A declarative query over one or more cubes
///
/// Cloning shares the view.
#[derive(Clone)]
pub struct View {
    inner: Arc<ViewInner>,
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|e| e.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|e| e.into_inner())
}

impl View {
    /// Empty view in a fresh dataset
    pub fn new() -> Self {
        Self::with_options(ViewOptions::default())
    }

    /// Empty view described in `source`'s dataset, executing there
    pub fn with_source(source: &Source) -> Self {
        Self::with_options(ViewOptions {
            source: Some(source.clone()),
            ..Default::default()
        })
    }

    pub fn with_options(options: ViewOptions) -> Self {
        let dataset = options
            .dataset
            .or_else(|| options.source.as_ref().map(|s| s.dataset().clone()))
            .unwrap_or_default();
        let term = options.term.unwrap_or_else(|| BlankNode::new().into());

        let node = Node::new(term, dataset);
        node.add(rdf::TYPE, view::VIEW);

        Self {
            inner: Arc::new(ViewInner {
                node,
                source: options.source,
                dimensions: RwLock::new(Vec::new()),
                filters: RwLock::new(Vec::new()),
            }),
        }
    }

    /// View with one dimension per dimension of `cube`, path used as output
    /// property, and columns in natural IRI order when `sort_columns` is set
    pub fn from_cube(cube: &Cube, sort_columns: bool) -> ModelResult<Self> {
        let view = Self::with_options(ViewOptions {
            source: Some(cube.source().clone()),
            dataset: Some(cube.dataset().clone()),
            ..Default::default()
        });
        let source = cube.source().to_cube_source(cube.term());

        let mut paths = Vec::new();
        for cube_dimension in cube.dimensions() {
            let path = cube_dimension
                .path()
                .ok_or_else(|| ModelError::MissingPath(cube_dimension.term().to_string()))?;
            paths.push(path);
        }
        if sort_columns {
            paths.sort_by(|a, b| natural_cmp(a.as_str(), b.as_str()));
        }

        for path in paths {
            let dimension = view.create_dimension(DimensionOptions::new(&source, path))?;
            view.add_dimension(&dimension);
        }
        view.set_columns(Some(&view.dimensions()));

        debug!(cube = %cube.term(), dimensions = view.dimensions().len(), "view from cube");
        Ok(view)
    }

    pub fn node(&self) -> &Node {
        &self.inner.node
    }

    pub fn term(&self) -> &RdfSubject {
        self.inner.node.term()
    }

    pub fn dataset(&self) -> &Dataset {
        self.inner.node.dataset()
    }

    /// Explicit source, if any
    pub fn source(&self) -> Option<&Source> {
        self.inner.source.as_ref()
    }

    /// Create a dimension owned by this view; it becomes part of the result
    /// once passed to [`View::add_dimension`]
    pub fn create_dimension(&self, options: DimensionOptions) -> ModelResult<Dimension> {
        Dimension::create(self.node(), options)
    }

    pub fn add_dimension(&self, dimension: &Dimension) {
        self.node().add(view::DIMENSION, dimension.term().clone());
        write(&self.inner.dimensions).push(dimension.clone());
    }

    pub fn dimensions(&self) -> Vec<Dimension> {
        read(&self.inner.dimensions).clone()
    }

    /// Dimension whose output property is `property`
    pub fn dimension(&self, property: impl Into<RdfObject>) -> Option<Dimension> {
        let property = property.into();
        read(&self.inner.dimensions)
            .iter()
            .find(|d| d.alias().as_ref() == Some(&property))
            .cloned()
    }

    pub fn filters(&self) -> Vec<Filter> {
        read(&self.inner.filters).clone()
    }

    /// Add `filter` after checking it is complete
    pub fn add_filter(&self, filter: &Filter) -> ModelResult<()> {
        filter.validate()?;
        self.node().add(view::FILTER, filter.term().clone());
        write(&self.inner.filters).push(filter.clone());
        Ok(())
    }

    /// Remove and clear every filter
    pub fn clear_filters(&self) {
        let filters = std::mem::take(&mut *write(&self.inner.filters));
        for filter in filters {
            self.remove_filter(&filter);
        }
    }

    /// Remove and clear one filter, keeping the others
    pub fn clear_filter(&self, filter: &Filter) {
        let removed = {
            let mut filters = write(&self.inner.filters);
            let before = filters.len();
            filters.retain(|f| f.term() != filter.term());
            filters.len() != before
        };
        if removed {
            self.remove_filter(filter);
        }
    }

    fn remove_filter(&self, filter: &Filter) {
        self.dataset().remove(&Quad::triple(
            self.term().clone(),
            view::FILTER,
            filter.term().clone(),
        ));
        filter.clear();
    }

    fn projection(&self) -> Option<RdfSubject> {
        self.node().out_one(view::PROJECTION)?.to_subject()
    }

    fn projection_or_create(&self) -> RdfSubject {
        match self.projection() {
            Some(projection) => projection,
            None => {
                let projection: RdfSubject = BlankNode::new().into();
                self.node().add(view::PROJECTION, projection.clone());
                projection
            }
        }
    }

    fn projection_integer(&self, predicate: NamedNodeRef<'_>) -> Option<u64> {
        let projection = self.projection()?;
        let value = self.dataset().object(&projection, &predicate.into())?;
        value.as_literal()?.as_i64().and_then(|v| u64::try_from(v).ok())
    }

    /// Remove `projection predicate ?o` together with the structure below `?o`
    fn clear_projection_value(&self, predicate: NamedNodeRef<'_>) {
        let Some(projection) = self.projection() else {
            return;
        };
        let dataset = self.dataset();
        for value in dataset.remove_out(&projection, &predicate.into()) {
            if let RdfObject::BlankNode(blank) = value {
                dataset.remove_description(&blank.into());
            }
        }
    }

    fn set_projection_integer(&self, predicate: NamedNodeRef<'_>, value: Option<u64>) {
        self.clear_projection_value(predicate);
        if let Some(value) = value {
            let projection = self.projection_or_create();
            let value = i64::try_from(value).unwrap_or(i64::MAX);
            self.dataset()
                .insert(Quad::triple(projection, predicate, Literal::new_integer(value)));
        }
    }

    pub fn get_offset(&self) -> Option<u64> {
        self.projection_integer(view::OFFSET)
    }

    /// Set or, with `None`, remove the offset
    pub fn set_offset(&self, offset: Option<u64>) -> &Self {
        self.set_projection_integer(view::OFFSET, offset);
        self
    }

    pub fn get_limit(&self) -> Option<u64> {
        self.projection_integer(view::LIMIT)
    }

    /// Set or, with `None`, remove the limit
    pub fn set_limit(&self, limit: Option<u64>) -> &Self {
        self.set_projection_integer(view::LIMIT, limit);
        self
    }

    /// Sort keys; entries naming dimensions unknown to this view are skipped
    pub fn get_order_by(&self) -> Vec<OrderBy> {
        let dataset = self.dataset();
        let Some(head) = self
            .projection()
            .and_then(|p| dataset.object(&p, &view::ORDER_BY.into()))
        else {
            return Vec::new();
        };
        let dimensions = self.dimensions();

        dataset
            .list(&head)
            .unwrap_or_default()
            .iter()
            .filter_map(RdfObject::to_subject)
            .filter_map(|item| {
                let dimension = dataset.object(&item, &view::DIMENSION.into())?;
                let dimension = dimensions
                    .iter()
                    .find(|d| RdfObject::from(d.term().clone()) == dimension)?;
                let direction = dataset
                    .object(&item, &view::DIRECTION.into())
                    .and_then(|d| Direction::from_term(&d))
                    .unwrap_or(Direction::Ascending);
                Some(OrderBy {
                    dimension: dimension.clone(),
                    direction,
                })
            })
            .collect()
    }

    /// Replace the sort keys; an empty list removes them
    pub fn set_order_by(&self, order_by: &[OrderBy]) -> &Self {
        self.clear_projection_value(view::ORDER_BY);
        if order_by.is_empty() {
            return self;
        }

        let dataset = self.dataset();
        let items: Vec<RdfObject> = order_by
            .iter()
            .map(|entry| {
                let item = BlankNode::new();
                dataset.insert(Quad::triple(
                    item.clone(),
                    view::DIMENSION,
                    entry.dimension.term().clone(),
                ));
                dataset.insert(Quad::triple(item.clone(), view::DIRECTION, entry.direction.term()));
                item.into()
            })
            .collect();
        let head = dataset.insert_list(&items, None);
        dataset.insert(Quad::triple(self.projection_or_create(), view::ORDER_BY, head));
        self
    }

    /// Clear offset, limit and ordering, then set them from `projection`
    pub fn update_projection(&self, projection: Projection) -> &Self {
        self.set_offset(None).set_limit(None).set_order_by(&[]);
        self.set_offset(projection.offset)
            .set_limit(projection.limit)
            .set_order_by(&projection.order_by)
    }

    /// Result columns in order, when declared
    pub fn columns(&self) -> Option<Vec<Dimension>> {
        let dataset = self.dataset();
        let head = dataset.object(&self.projection()?, &view::COLUMNS.into())?;
        let dimensions = self.dimensions();
        let columns = dataset
            .list(&head)?
            .iter()
            .filter_map(|term| {
                dimensions
                    .iter()
                    .find(|d| RdfObject::from(d.term().clone()) == *term)
                    .cloned()
            })
            .collect();
        Some(columns)
    }

    /// Declare which dimensions are results, and in which order; `None`
    /// makes every direct dimension a result again
    pub fn set_columns(&self, columns: Option<&[Dimension]>) -> &Self {
        self.clear_projection_value(view::COLUMNS);
        if let Some(columns) = columns {
            let terms: Vec<RdfObject> = columns.iter().map(|d| d.term().clone().into()).collect();
            let head = self.dataset().insert_list(&terms, None);
            self.dataset()
                .insert(Quad::triple(self.projection_or_create(), view::COLUMNS, head));
        }
        self
    }

    /// Compile the observations and count queries
    pub fn observations_query(&self, options: QueryOptions) -> ModelResult<CompiledQuery> {
        Ok(compiler::compile(self.dataset(), self.term(), options)?)
    }

    /// Fetch the observations, one map per row keyed by output property
    pub async fn observations(
        &self,
        options: QueryOptions,
    ) -> ModelResult<Vec<IndexMap<String, RdfTerm>>> {
        if read(&self.inner.dimensions).is_empty() {
            return Err(ModelError::NoDimensions);
        }
        let source = self.main_source()?;
        let compiled = self.observations_query(options)?;

        let rows = source.select(&compiled.query).await?;
        let observations: Vec<IndexMap<String, RdfTerm>> = rows
            .iter()
            .map(|row| {
                compiled
                    .results()
                    .filter_map(|dimension| {
                        let value = row.get(dimension.output.name())?;
                        Some((dimension.property.value().to_string(), value.clone()))
                    })
                    .collect()
            })
            .collect();

        info!(view = %self.term(), rows = observations.len(), "observations fetched");
        Ok(observations)
    }

    /// Number of observations, `None` when the endpoint returns no count
    pub async fn observation_count(&self, options: QueryOptions) -> ModelResult<Option<u64>> {
        let source = self.main_source()?;
        let compiled = self.observations_query(options)?;

        let rows = source.select(&compiled.count_query).await?;
        let count = rows
            .first()
            .and_then(|row| row.get("count"))
            .and_then(RdfObject::as_literal)
            .and_then(Literal::as_i64)
            .and_then(|count| u64::try_from(count).ok());
        Ok(count)
    }

    /// The explicit source, else the first source of the first dimension
    /// that has one
    pub fn main_source(&self) -> ModelResult<Source> {
        if let Some(source) = &self.inner.source {
            return Ok(source.clone());
        }
        read(&self.inner.dimensions)
            .iter()
            .find_map(|d| d.sources().into_iter().next())
            .ok_or(ModelError::NoSource)
    }

    /// Replace this view's description with the one stored at its endpoint;
    /// returns the number of triples fetched
    pub async fn fetch_view_full(&self) -> ModelResult<usize> {
        let RdfSubject::NamedNode(iri) = self.term() else {
            return Err(ModelError::InvalidTerm(format!(
                "{} is not an IRI, only named views can be fetched",
                self.term()
            )));
        };
        let source = self.main_source()?;
        let quads = source
            .construct(&templates::view_query(iri, source.graph()))
            .await?;

        let count = quads.len();
        if count > 0 {
            self.dataset().remove_description(self.term());
            self.dataset().extend(quads);
        }
        debug!(view = %iri, triples = count, "view fetched");
        Ok(count)
    }

    /// Fetch the description and rebuild dimensions and filters from it
    pub async fn init(&self) -> ModelResult<usize> {
        let count = self.fetch_view_full().await?;
        if count > 0 {
            self.update_entities()?;
        }
        Ok(count)
    }

    /// Rebuild the dimension and filter handles from the dataset
    pub fn update_entities(&self) -> ModelResult<()> {
        let fallback = self.main_source()?;
        let dataset = self.dataset().clone();

        for old in std::mem::take(&mut *write(&self.inner.dimensions)) {
            old.node().detach();
        }
        for old in std::mem::take(&mut *write(&self.inner.filters)) {
            old.node().detach();
        }

        let mut sources: HashMap<RdfSubject, Source> = HashMap::new();
        let mut dimensions = Vec::new();
        for term in self.node().out(view::DIMENSION) {
            let Some(term) = term.to_subject() else {
                continue;
            };
            let mut dimension_sources = Vec::new();
            for from in dataset.objects(&term, &view::FROM.into()) {
                let Some(source) = from
                    .to_subject()
                    .and_then(|f| dataset.object(&f, &view::SOURCE_PROPERTY.into()))
                    .and_then(|s| s.to_subject())
                else {
                    continue;
                };
                let source = match sources.get(&source) {
                    Some(known) => known.clone(),
                    None => {
                        let built = Source::from_dataset(source.clone(), &dataset, &fallback)?;
                        sources.insert(source, built.clone());
                        built
                    }
                };
                dimension_sources.push(source);
            }
            dimensions.push(Dimension::from_term(self.node(), term, dimension_sources));
        }

        let filters: Vec<Filter> = self
            .node()
            .out(view::FILTER)
            .iter()
            .filter_map(RdfObject::to_subject)
            .map(|term| Filter::from_term(self.node(), term))
            .collect();

        debug!(
            view = %self.term(),
            dimensions = dimensions.len(),
            filters = filters.len(),
            "view entities rebuilt"
        );
        *write(&self.inner.dimensions) = dimensions;
        *write(&self.inner.filters) = filters;
        Ok(())
    }

    /// Remove this view's description and every dimension and filter no
    /// other view still uses
    pub fn clear(&self) {
        let mut dependents: Vec<Node> = std::mem::take(&mut *write(&self.inner.dimensions))
            .iter()
            .map(|d| d.node().clone())
            .collect();
        dependents.extend(
            std::mem::take(&mut *write(&self.inner.filters))
                .iter()
                .map(|f| f.node().clone()),
        );
        self.inner.node.clear_with(&dependents);
    }
}

impl Default for View {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("View")
            .field("term", self.term())
            .field("dimensions", &read(&self.inner.dimensions).len())
            .field("filters", &read(&self.inner.filters).len())
            .finish()
    }
}

/// Case-insensitive string order comparing digit runs by numeric value
fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();

    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) if l.is_ascii_digit() && r.is_ascii_digit() => {
                let l = digits(&mut left);
                let r = digits(&mut right);
                let l = l.trim_start_matches('0');
                let r = r.trim_start_matches('0');
                let ordering = l.len().cmp(&r.len()).then_with(|| l.cmp(r));
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            (Some(l), Some(r)) => {
                let ordering = l.to_lowercase().cmp(r.to_lowercase());
                if ordering != Ordering::Equal {
                    return ordering;
                }
                left.next();
                right.next();
            }
        }
    }
}

fn digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(c) = chars.peek().copied().filter(char::is_ascii_digit) {
        run.push(c);
        chars.next();
    }
    run
}
