//! View dimensions

use super::{CubeDimension, FilterBuilder, ModelResult, Node, Source, TermLike};
use crate::rdf::{cube, rdf, sh, view, BlankNode, NamedNode, RdfObject, RdfSubject};
use oxrdf::NamedNodeRef;
use std::sync::{Arc, RwLock};

/// Aggregate applied to a dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Avg,
    Max,
    Min,
}

impl Aggregate {
    pub fn term(&self) -> NamedNodeRef<'static> {
        match self {
            Aggregate::Avg => view::AVG,
            Aggregate::Max => view::MAX,
            Aggregate::Min => view::MIN,
        }
    }

    pub fn from_term(term: &RdfObject) -> Option<Self> {
        [Aggregate::Avg, Aggregate::Max, Aggregate::Min]
            .into_iter()
            .find(|a| term.as_named_node().is_some_and(|n| *n == a.term()))
    }

    /// SPARQL aggregate function
    pub fn sparql_name(&self) -> &'static str {
        match self {
            Aggregate::Avg => "AVG",
            Aggregate::Max => "MAX",
            Aggregate::Min => "MIN",
        }
    }
}

/// Options of [`View::create_dimension`](super::View::create_dimension)
#[derive(Debug, Clone)]
pub struct DimensionOptions {
    pub source: Source,
    /// An IRI or a list of IRIs (sequence path)
    pub path: TermLike,
    /// Output property; defaults to `path` when it is a single IRI
    pub alias: Option<TermLike>,
    /// Dimension whose value anchors a lookup source
    pub join: Option<Dimension>,
    pub aggregate: Option<Aggregate>,
}

impl DimensionOptions {
    pub fn new(source: &Source, path: impl Into<TermLike>) -> Self {
        Self {
            source: source.clone(),
            path: path.into(),
            alias: None,
            join: None,
            aggregate: None,
        }
    }

    pub fn alias(mut self, alias: impl Into<TermLike>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn join(mut self, join: &Dimension) -> Self {
        self.join = Some(join.clone());
        self
    }

    pub fn aggregate(mut self, aggregate: Aggregate) -> Self {
        self.aggregate = Some(aggregate);
        self
    }
}

struct DimensionInner {
    node: Node,
    sources: RwLock<Vec<Source>>,
}

/// One output column of a View
///
/// Cloning shares the dimension.
#[derive(Clone)]
pub struct Dimension {
    inner: Arc<DimensionInner>,
}

impl Dimension {
    /// Declare a new dimension owned by `parent`
    pub(crate) fn create(parent: &Node, options: DimensionOptions) -> ModelResult<Self> {
        let node = parent.create_child(BlankNode::new().into());
        let dimension = Self {
            inner: Arc::new(DimensionInner {
                node,
                sources: RwLock::new(Vec::new()),
            }),
        };

        let dataset = dimension.node().dataset();
        dimension.node().add(rdf::TYPE, view::DIMENSION_CLASS);

        let alias = match &options.alias {
            Some(alias) => Some(alias.to_term(dataset)?),
            None => options.path.as_named_node().map(RdfObject::from),
        };
        if let Some(alias) = alias {
            dimension.node().add(view::AS, alias);
        }
        if let Some(aggregate) = options.aggregate {
            dimension.node().add(view::AGGREGATE, aggregate.term());
        }

        dimension.add_from(&options.source, options.path, options.join.as_ref())?;
        Ok(dimension)
    }

    /// Wrap an existing dimension description
    pub(crate) fn from_term(parent: &Node, term: RdfSubject, sources: Vec<Source>) -> Self {
        let node = parent.create_child(term);
        Self {
            inner: Arc::new(DimensionInner {
                node,
                sources: RwLock::new(sources),
            }),
        }
    }

    /// Draw values from `path` in `source` as well
    pub fn add_from(
        &self,
        source: &Source,
        path: impl Into<TermLike>,
        join: Option<&Dimension>,
    ) -> ModelResult<()> {
        let dataset = self.node().dataset();
        let path = path.into().to_term(dataset)?;
        source.write_into(dataset);

        let from = Node::blank(dataset.clone());
        from.add(view::SOURCE_PROPERTY, source.term().clone());
        from.add(view::PATH, path);
        if let Some(join) = join {
            from.add(view::JOIN, join.term().clone());
        }
        self.node().add(view::FROM, from.term().clone());

        self.inner
            .sources
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(source.clone());
        Ok(())
    }

    pub fn node(&self) -> &Node {
        &self.inner.node
    }

    pub fn term(&self) -> &RdfSubject {
        self.inner.node.term()
    }

    pub fn same_as(&self, other: &Dimension) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Sources in declaration order
    pub fn sources(&self) -> Vec<Source> {
        self.inner
            .sources
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Output property (`view:as`)
    pub fn alias(&self) -> Option<RdfObject> {
        self.node().out_one(view::AS)
    }

    pub fn aggregate(&self) -> Option<Aggregate> {
        Aggregate::from_term(&self.node().out_one(view::AGGREGATE)?)
    }

    /// `(source, path)` of every `view:from` entry
    pub fn from_entries(&self) -> Vec<(RdfObject, RdfObject)> {
        let dataset = self.node().dataset();
        self.node()
            .out(view::FROM)
            .iter()
            .filter_map(RdfObject::to_subject)
            .filter_map(|from| {
                let source = dataset.object(&from, &view::SOURCE_PROPERTY.into())?;
                let path = dataset.object(&from, &view::PATH.into())?;
                Some((source, path))
            })
            .collect()
    }

    /// Path of the first `view:from` entry
    pub fn path(&self) -> Option<RdfObject> {
        self.from_entries().into_iter().next().map(|(_, path)| path)
    }

    /// Cube IRIs feeding this dimension
    pub fn cubes(&self) -> Vec<NamedNode> {
        let dataset = self.node().dataset();
        let mut cubes = Vec::new();
        for (source, _) in self.from_entries() {
            let Some(source) = source.to_subject() else {
                continue;
            };
            if let Some(RdfObject::NamedNode(cube)) = dataset.object(&source, &view::CUBE.into()) {
                if !cubes.contains(&cube) {
                    cubes.push(cube);
                }
            }
        }
        cubes
    }

    /// Shape-level dimensions of the source cubes sharing this dimension's path
    pub fn cube_dimensions(&self) -> Vec<CubeDimension> {
        let dataset = self.node().dataset();
        let mut found = Vec::new();
        for (source, path) in self.from_entries() {
            let Some(RdfObject::NamedNode(cube)) = source
                .to_subject()
                .and_then(|s| dataset.object(&s, &view::CUBE.into()))
            else {
                continue;
            };
            let cube: RdfSubject = cube.into();
            for shape in dataset.objects(&cube, &cube::OBSERVATION_CONSTRAINT.into()) {
                let Some(shape) = shape.to_subject() else {
                    continue;
                };
                for property in dataset.objects(&shape, &sh::PROPERTY.into()) {
                    let Some(property) = property.to_subject() else {
                        continue;
                    };
                    if dataset.has(&property, &sh::PATH.into(), &path) {
                        found.push(CubeDimension::new(property, dataset.clone()));
                    }
                }
            }
        }
        found
    }

    /// Build filters on this dimension
    pub fn filter(&self) -> FilterBuilder<'_> {
        FilterBuilder::new(self)
    }

    /// Remove this dimension's description
    pub fn clear(&self) {
        self.inner.node.clear();
    }
}

impl std::fmt::Debug for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dimension")
            .field("term", self.term())
            .field("alias", &self.alias())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourceConfig;
    use crate::rdf::Dataset;
    use crate::sparql::{QuerySolution, SparqlClient, SparqlResult};
    use async_trait::async_trait;

    struct NoClient;

    #[async_trait]
    impl SparqlClient for NoClient {
        async fn select(&self, _query: &str) -> SparqlResult<Vec<QuerySolution>> {
            Ok(Vec::new())
        }

        async fn construct(&self, _query: &str) -> SparqlResult<Vec<crate::rdf::Quad>> {
            Ok(Vec::new())
        }
    }

    fn ex(local: &str) -> NamedNode {
        NamedNode::new(&format!("http://example.org/{local}")).unwrap()
    }

    fn cube_source(dataset: &Dataset) -> Source {
        let source = Source::with_dataset(
            SourceConfig::new("http://example.org/query"),
            Arc::new(NoClient),
            dataset.clone(),
        )
        .unwrap();
        source.to_cube_source(&ex("cube"))
    }

    #[test]
    fn test_aggregate_terms() {
        assert_eq!(Aggregate::from_term(&view::MIN.into()), Some(Aggregate::Min));
        assert_eq!(Aggregate::from_term(&ex("Median").into()), None);
        assert_eq!(Aggregate::Avg.sparql_name(), "AVG");
    }

    #[test]
    fn test_create_writes_declaration() {
        let dataset = Dataset::new();
        let parent = Node::blank(dataset.clone());
        let source = cube_source(&dataset);

        let dimension = Dimension::create(
            &parent,
            DimensionOptions::new(&source, ex("year")).aggregate(Aggregate::Max),
        )
        .unwrap();

        assert_eq!(dimension.alias(), Some(ex("year").into()));
        assert_eq!(dimension.aggregate(), Some(Aggregate::Max));
        assert_eq!(dimension.path(), Some(ex("year").into()));
        assert_eq!(dimension.cubes(), vec![ex("cube")]);
        assert_eq!(dimension.sources().len(), 1);
        assert!(dimension.node().parent().unwrap().same_as(&parent));
    }

    #[test]
    fn test_sequence_path_has_no_default_alias() {
        let dataset = Dataset::new();
        let parent = Node::blank(dataset.clone());
        let source = cube_source(&dataset);

        let dimension = Dimension::create(
            &parent,
            DimensionOptions::new(&source, vec![ex("a"), ex("b")]),
        )
        .unwrap();
        assert!(dimension.alias().is_none());
        let path = dimension.path().unwrap();
        assert_eq!(dataset.list(&path).unwrap().len(), 2);
    }

    #[test]
    fn test_cube_dimensions_follow_the_shape() {
        let dataset = Dataset::new();
        let parent = Node::blank(dataset.clone());
        let source = cube_source(&dataset);
        let property = BlankNode::new();
        dataset.insert(crate::rdf::Quad::triple(ex("cube"), cube::OBSERVATION_CONSTRAINT, ex("shape")));
        dataset.insert(crate::rdf::Quad::triple(ex("shape"), sh::PROPERTY, property.clone()));
        dataset.insert(crate::rdf::Quad::triple(property.clone(), sh::PATH, ex("year")));

        let dimension =
            Dimension::create(&parent, DimensionOptions::new(&source, ex("year"))).unwrap();
        let cube_dimensions = dimension.cube_dimensions();
        assert_eq!(cube_dimensions.len(), 1);
        assert_eq!(cube_dimensions[0].path(), Some(ex("year")));

        dimension.add_from(&source, ex("other"), None).unwrap();
        assert_eq!(dimension.from_entries().len(), 2);
        assert_eq!(dimension.cube_dimensions().len(), 1);
    }
}
