//! Cubes

use super::{CubeDimension, ModelResult, Node, Source};
use crate::compiler::templates;
use crate::rdf::{cube, rdf, schema, sh, Dataset, NamedNode, Quad, RdfObject, RdfSubject};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

struct CubeInner {
    node: Node,
    iri: NamedNode,
    source: Source,
    quads: Mutex<Vec<Quad>>,
    ignore: Vec<RdfObject>,
}

/// One data cube hosted at a [`Source`]
///
/// A cube starts empty; [`Cube::init`] fetches its description and its
/// shape into the source's dataset.
#[derive(Clone)]
pub struct Cube {
    inner: Arc<CubeInner>,
}

impl Cube {
    /// Cube `iri` at `source`, ignoring `rdf:type` when deriving dimensions
    pub fn new(source: &Source, iri: NamedNode) -> Self {
        Self::with_ignore(source, iri, vec![rdf::TYPE.into()])
    }

    /// Cube `iri` at `source`, ignoring the given paths when deriving dimensions
    pub fn with_ignore(source: &Source, iri: NamedNode, ignore: Vec<NamedNode>) -> Self {
        let node = source.node().create_child(iri.clone().into());
        Self {
            inner: Arc::new(CubeInner {
                node,
                iri,
                source: source.clone(),
                quads: Mutex::new(Vec::new()),
                ignore: ignore.into_iter().map(Into::into).collect(),
            }),
        }
    }

    fn quads_mut(&self) -> MutexGuard<'_, Vec<Quad>> {
        self.inner.quads.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn term(&self) -> &NamedNode {
        &self.inner.iri
    }

    pub fn node(&self) -> &Node {
        &self.inner.node
    }

    pub fn source(&self) -> &Source {
        &self.inner.source
    }

    pub fn dataset(&self) -> &Dataset {
        self.inner.node.dataset()
    }

    /// Every quad fetched for this cube so far
    pub fn quads(&self) -> Vec<Quad> {
        self.quads_mut().clone()
    }

    fn subject(&self) -> RdfSubject {
        self.inner.iri.clone().into()
    }

    fn merge(&self, quads: Vec<Quad>) -> usize {
        let count = quads.len();
        self.dataset().extend(quads.iter().cloned());
        self.quads_mut().extend(quads);
        count
    }

    /// Fetch the cube's description (and its version history container)
    pub async fn fetch_cube(&self) -> ModelResult<usize> {
        let query = templates::cube_query(&self.inner.iri, self.source().graph());
        let quads = self.source().construct(&query).await?;
        let count = self.merge(quads);
        debug!(cube = %self.inner.iri, triples = count, "fetched cube");
        Ok(count)
    }

    /// Fetch the cube's shape with all of its property shapes
    pub async fn fetch_shape(&self) -> ModelResult<usize> {
        let query = templates::shape_query(&self.inner.iri, self.source().graph());
        let quads = self.source().construct(&query).await?;
        let count = self.merge(quads);
        debug!(cube = %self.inner.iri, triples = count, "fetched shape");
        Ok(count)
    }

    /// Fetch the description, then the shape
    pub async fn init(&self) -> ModelResult<()> {
        self.fetch_cube().await?;
        self.fetch_shape().await?;
        info!(cube = %self.inner.iri, triples = self.quads_mut().len(), "cube loaded");
        Ok(())
    }

    /// The observation constraint of this cube
    ///
    /// When several are present (a blank shape fetched twice) the one whose
    /// property shapes carry paths wins, the latest one otherwise.
    pub fn shape_term(&self) -> Option<RdfSubject> {
        let shapes: Vec<RdfSubject> = self
            .dataset()
            .objects(&self.subject(), &cube::OBSERVATION_CONSTRAINT.into())
            .iter()
            .filter_map(RdfObject::to_subject)
            .collect();

        let complete = shapes.iter().rev().find(|shape| {
            self.dataset()
                .objects(shape, &sh::PROPERTY.into())
                .iter()
                .filter_map(RdfObject::to_subject)
                .any(|property| {
                    self.dataset()
                        .object(&property, &sh::PATH.into())
                        .is_some()
                })
        });
        complete.or(shapes.last()).cloned()
    }

    /// Dimensions derived from the shape, skipping ignored paths and
    /// `cube:observedBy`
    pub fn dimensions(&self) -> Vec<CubeDimension> {
        let Some(shape) = self.shape_term() else {
            return Vec::new();
        };
        let observed_by = RdfObject::from(cube::OBSERVED_BY);

        self.dataset()
            .objects(&shape, &sh::PROPERTY.into())
            .iter()
            .filter_map(RdfObject::to_subject)
            .map(|property| CubeDimension::new(property, self.dataset().clone()))
            .filter(|dimension| match dimension.path_term() {
                Some(path) => path != observed_by && !self.inner.ignore.contains(&path),
                None => true,
            })
            .collect()
    }

    /// `schema:version` as an integer
    pub fn version(&self) -> Option<i64> {
        self.dataset()
            .object(&self.subject(), &schema::VERSION.into())?
            .as_literal()?
            .as_i64()
    }

    /// Containers listing this cube as `schema:hasPart`
    pub fn containers(&self) -> Vec<RdfSubject> {
        self.dataset()
            .subjects(&schema::HAS_PART.into(), &self.inner.iri.clone().into())
    }

    /// Remove everything fetched for this cube
    pub fn clear(&self) {
        let quads = std::mem::take(&mut *self.quads_mut());
        for quad in &quads {
            self.dataset().remove(quad);
        }
        self.inner.node.clear();
    }
}

impl std::fmt::Debug for Cube {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cube").field("term", &self.inner.iri).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourceConfig;
    use crate::rdf::{RdfFormat, RdfParser};
    use crate::sparql::{QuerySolution, SparqlClient, SparqlResult};
    use async_trait::async_trait;

    const CUBE: &str = r#"
        @prefix cube: <https://cube.link/> .
        @prefix schema: <http://schema.org/> .
        @prefix ex: <http://example.org/> .

        ex:cube a cube:Cube ;
            schema:version 3 ;
            cube:observationConstraint ex:shape .
        ex:history schema:hasPart ex:cube .
    "#;

    const SHAPE: &str = r#"
        @prefix cube: <https://cube.link/> .
        @prefix sh: <http://www.w3.org/ns/shacl#> .
        @prefix ex: <http://example.org/> .

        ex:cube cube:observationConstraint ex:shape .
        ex:shape sh:property
            [ sh:path ex:year ; sh:datatype <http://www.w3.org/2001/XMLSchema#gYear> ],
            [ sh:path ex:value ],
            [ sh:path cube:observedBy ] .
    "#;

    /// Answers the shape query with the shape, anything else with the cube
    struct Fixture;

    #[async_trait]
    impl SparqlClient for Fixture {
        async fn select(&self, _query: &str) -> SparqlResult<Vec<QuerySolution>> {
            Ok(Vec::new())
        }

        async fn construct(&self, query: &str) -> SparqlResult<Vec<Quad>> {
            let document = if query.contains("?shape") { SHAPE } else { CUBE };
            Ok(RdfParser::parse(document, RdfFormat::Turtle)?)
        }
    }

    fn ex(local: &str) -> NamedNode {
        NamedNode::new(&format!("http://example.org/{local}")).unwrap()
    }

    fn source() -> Source {
        Source::with_client(SourceConfig::new("http://example.org/query"), Arc::new(Fixture))
            .unwrap()
    }

    #[tokio::test]
    async fn test_init_reads_description_and_shape() {
        let source = source();
        let cube = source.cube(ex("cube")).await.unwrap().unwrap();

        assert_eq!(cube.version(), Some(3));
        assert_eq!(cube.containers(), vec![RdfSubject::from(ex("history"))]);
        assert_eq!(cube.shape_term(), Some(ex("shape").into()));

        let paths: Vec<_> = cube.dimensions().iter().filter_map(|d| d.path()).collect();
        assert_eq!(paths, vec![ex("year"), ex("value")]);
    }

    #[tokio::test]
    async fn test_ignored_paths() {
        let source = source();
        let cube = Cube::with_ignore(&source, ex("cube"), vec![ex("value")]);
        cube.init().await.unwrap();

        let paths: Vec<_> = cube.dimensions().iter().filter_map(|d| d.path()).collect();
        assert_eq!(paths, vec![ex("year")]);
    }

    #[tokio::test]
    async fn test_clear_removes_fetched_quads() {
        let source = source();
        let before = source.dataset().len();
        let cube = Cube::new(&source, ex("cube"));
        cube.init().await.unwrap();
        assert!(source.dataset().len() > before);

        cube.clear();
        assert_eq!(source.dataset().len(), before);
        assert!(cube.quads().is_empty());
        assert!(source.node().children().is_empty());
    }
}
