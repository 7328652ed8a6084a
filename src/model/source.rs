//! Sources: SPARQL endpoints hosting cubes and views

use super::{Cube, DiscoveryPredicate, ModelError, ModelResult, Node, TermLike, View, ViewOptions};
use crate::compiler::{templates, Variable};
use crate::config::SourceConfig;
use crate::rdf::{cube, rdf, view, Dataset, NamedNode, Quad, RdfObject, RdfSubject};
use crate::sparql::{HttpSparqlClient, QuerySolution, SparqlClient};
use futures::future::try_join_all;
use std::sync::Arc;
use tracing::{debug, info};

/// What a source is used for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    /// A bare endpoint
    Plain,
    /// The endpoint backing one cube
    Cube(NamedNode),
    /// An endpoint only joined in for lookups (labels and the like)
    Lookup,
}

impl SourceKind {
    fn class(&self) -> oxrdf::NamedNodeRef<'static> {
        match self {
            SourceKind::Plain => view::SOURCE,
            SourceKind::Cube(_) => view::CUBE_SOURCE,
            SourceKind::Lookup => view::LOOKUP_SOURCE,
        }
    }
}

/// Options of [`Source::cubes`]
#[derive(Debug, Clone, Default)]
pub struct CubesOptions {
    /// Predicates every returned cube must satisfy
    pub filters: Vec<DiscoveryPredicate>,
    /// Only fetch the cube descriptions, not their shapes
    pub no_shape: bool,
}

struct SourceInner {
    node: Node,
    config: SourceConfig,
    endpoint: NamedNode,
    graph: Option<NamedNode>,
    kind: SourceKind,
    client: Arc<dyn SparqlClient>,
}

/// A SPARQL endpoint plus optional named graph
///
/// Cloning shares the source.
#[derive(Clone)]
pub struct Source {
    inner: Arc<SourceInner>,
}

impl Source {
    /// Source talking HTTP to `config.endpoint`, in a fresh dataset
    pub fn new(config: SourceConfig) -> ModelResult<Self> {
        let client = Arc::new(HttpSparqlClient::new(config.clone())?);
        Self::with_client(config, client)
    }

    /// Source executing through `client`, in a fresh dataset
    pub fn with_client(config: SourceConfig, client: Arc<dyn SparqlClient>) -> ModelResult<Self> {
        Self::with_dataset(config, client, Dataset::new())
    }

    /// Source executing through `client`, described in `dataset`
    pub fn with_dataset(
        config: SourceConfig,
        client: Arc<dyn SparqlClient>,
        dataset: Dataset,
    ) -> ModelResult<Self> {
        let endpoint = NamedNode::new(&config.endpoint)?;
        let graph = config.graph.as_deref().map(NamedNode::new).transpose()?;
        Ok(Self::build(
            Node::blank(dataset),
            config,
            endpoint,
            graph,
            SourceKind::Plain,
            client,
        ))
    }

    fn build(
        node: Node,
        config: SourceConfig,
        endpoint: NamedNode,
        graph: Option<NamedNode>,
        kind: SourceKind,
        client: Arc<dyn SparqlClient>,
    ) -> Self {
        let source = Self {
            inner: Arc::new(SourceInner {
                node,
                config,
                endpoint,
                graph,
                kind,
                client,
            }),
        };
        source.write_into(source.dataset());
        source
    }

    /// Rebuild a source from its description in `dataset`
    ///
    /// The client of `fallback` is reused when both point to the same
    /// endpoint; otherwise a new HTTP client is created.
    pub fn from_dataset(term: RdfSubject, dataset: &Dataset, fallback: &Source) -> ModelResult<Self> {
        let node = Node::new(term, dataset.clone());
        let endpoint = match node.out_one(view::ENDPOINT) {
            Some(RdfObject::NamedNode(endpoint)) => endpoint,
            _ => fallback.inner.endpoint.clone(),
        };
        let graph = node
            .out_one(view::GRAPH)
            .and_then(|g| g.as_named_node().cloned());

        let types = node.out(rdf::TYPE);
        let kind = if types.contains(&view::LOOKUP_SOURCE.into()) {
            SourceKind::Lookup
        } else if let Some(RdfObject::NamedNode(cube)) = node.out_one(view::CUBE) {
            SourceKind::Cube(cube)
        } else {
            SourceKind::Plain
        };

        let config = SourceConfig {
            endpoint: endpoint.as_str().to_string(),
            graph: graph.as_ref().map(|g| g.as_str().to_string()),
            ..fallback.inner.config.clone()
        };
        let client: Arc<dyn SparqlClient> = if endpoint == fallback.inner.endpoint {
            fallback.inner.client.clone()
        } else {
            Arc::new(HttpSparqlClient::new(config.clone())?)
        };

        Ok(Self::build(node, config, endpoint, graph, kind, client))
    }

    fn derive(&self, kind: SourceKind) -> Source {
        let node = self.node().create_child(crate::rdf::BlankNode::new().into());
        Self::build(
            node,
            self.inner.config.clone(),
            self.inner.endpoint.clone(),
            self.inner.graph.clone(),
            kind,
            self.inner.client.clone(),
        )
    }

    /// A source on the same endpoint backing `cube`
    pub fn to_cube_source(&self, cube: &NamedNode) -> Source {
        self.derive(SourceKind::Cube(cube.clone()))
    }

    /// A lookup source on the same endpoint
    pub fn to_lookup_source(&self) -> Source {
        self.derive(SourceKind::Lookup)
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

    pub fn config(&self) -> &SourceConfig {
        &self.inner.config
    }

    pub fn client(&self) -> Arc<dyn SparqlClient> {
        self.inner.client.clone()
    }

    pub fn kind(&self) -> &SourceKind {
        &self.inner.kind
    }

    pub fn endpoint(&self) -> &NamedNode {
        &self.inner.endpoint
    }

    pub fn graph(&self) -> Option<&NamedNode> {
        self.inner.graph.as_ref()
    }

    /// Whether both handles are the same source
    pub fn same_as(&self, other: &Source) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Triples describing this source
    pub fn description(&self) -> Vec<Quad> {
        let term = self.term().clone();
        let mut quads = vec![
            Quad::triple(term.clone(), rdf::TYPE, self.inner.kind.class()),
            Quad::triple(term.clone(), view::ENDPOINT, self.inner.endpoint.clone()),
        ];
        if let Some(graph) = &self.inner.graph {
            quads.push(Quad::triple(term.clone(), view::GRAPH, graph.clone()));
        }
        if let SourceKind::Cube(cube) = &self.inner.kind {
            quads.push(Quad::triple(term, view::CUBE, cube.clone()));
        }
        quads
    }

    /// Make sure `dataset` describes this source
    pub fn write_into(&self, dataset: &Dataset) {
        dataset.extend(self.description());
    }

    /// Prepend the configured query prefix
    pub fn prepare(&self, query: &str) -> String {
        format!("{}{}", self.inner.config.query_prefix, query)
    }

    /// Run a SELECT query against this source
    pub async fn select(&self, query: &str) -> ModelResult<Vec<QuerySolution>> {
        debug!(endpoint = %self.inner.endpoint.as_str(), "SELECT");
        Ok(self.inner.client.select(&self.prepare(query)).await?)
    }

    /// Run a CONSTRUCT query against this source
    pub async fn construct(&self, query: &str) -> ModelResult<Vec<Quad>> {
        debug!(endpoint = %self.inner.endpoint.as_str(), "CONSTRUCT");
        Ok(self.inner.client.construct(&self.prepare(query)).await?)
    }

    /// Fetch the cube at `iri`, or `None` if the endpoint knows nothing about it
    pub async fn cube(&self, iri: impl Into<TermLike>) -> ModelResult<Option<Cube>> {
        let iri = named_node(iri.into())?;
        let cube = Cube::new(self, iri);
        cube.init().await?;

        if cube.quads().is_empty() {
            debug!(cube = %cube.term(), "cube not found");
            cube.clear();
            return Ok(None);
        }
        Ok(Some(cube))
    }

    /// Discover cubes matching every predicate of `options.filters` and
    /// fetch them concurrently, keeping the order of the discovery results
    pub async fn cubes(&self, options: CubesOptions) -> ModelResult<Vec<Cube>> {
        let iris = self.discover("cube", cube::CUBE.into(), &options.filters).await?;
        let cubes: Vec<Cube> = iris.into_iter().map(|iri| Cube::new(self, iri)).collect();

        let no_shape = options.no_shape;
        try_join_all(cubes.iter().map(|cube| async move {
            if no_shape {
                cube.fetch_cube().await.map(|_| ())
            } else {
                cube.init().await
            }
        }))
        .await?;

        info!(count = cubes.len(), "cubes fetched");
        Ok(cubes)
    }

    /// Fetch the View at `iri`, or `None` if the endpoint knows nothing about it
    pub async fn view(&self, iri: impl Into<TermLike>) -> ModelResult<Option<View>> {
        let iri = named_node(iri.into())?;
        let view = self.view_handle(iri);
        if view.init().await? == 0 {
            debug!(view = %view.term(), "view not found");
            view.clear();
            return Ok(None);
        }
        Ok(Some(view))
    }

    /// Discover Views matching every predicate and fetch them concurrently
    pub async fn views(&self, filters: &[DiscoveryPredicate]) -> ModelResult<Vec<View>> {
        let iris = self.discover("view", view::VIEW.into(), filters).await?;
        let views: Vec<View> = iris.into_iter().map(|iri| self.view_handle(iri)).collect();

        try_join_all(views.iter().map(|view| view.init())).await?;

        info!(count = views.len(), "views fetched");
        Ok(views)
    }

    fn view_handle(&self, iri: NamedNode) -> View {
        View::with_options(ViewOptions {
            term: Some(iri.into()),
            source: Some(self.clone()),
            dataset: None,
        })
    }

    async fn discover(
        &self,
        variable: &str,
        class: NamedNode,
        filters: &[DiscoveryPredicate],
    ) -> ModelResult<Vec<NamedNode>> {
        let subject = Variable::new(variable);
        let mut patterns = Vec::new();
        let mut conditions = Vec::new();
        for (index, filter) in filters.iter().enumerate() {
            let fragments = filter.compile(&subject, index);
            patterns.extend(fragments.patterns);
            conditions.extend(fragments.filters);
        }

        let query =
            templates::select_instances(variable, &class, self.graph(), &patterns, &conditions);
        let rows = self.select(&query).await?;

        let iris: Vec<NamedNode> = rows
            .iter()
            .filter_map(|row| row.get(variable).and_then(|t| t.as_named_node()).cloned())
            .collect();
        debug!(class = %class, found = iris.len(), "discovery");
        Ok(iris)
    }

    /// Remove this source's description and its children
    pub fn clear(&self) {
        self.inner.node.clear();
    }
}

fn named_node(term: TermLike) -> ModelResult<NamedNode> {
    term.as_named_node()
        .ok_or_else(|| ModelError::InvalidTerm(format!("{term:?} is not an IRI")))
}

impl std::fmt::Debug for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Source")
            .field("term", self.term())
            .field("endpoint", &self.inner.endpoint.as_str())
            .field("graph", &self.inner.graph)
            .field("kind", &self.inner.kind)
            .finish()
    }
}
