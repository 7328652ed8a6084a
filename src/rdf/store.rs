//! RDF quad store implementation
//!
//! An in-memory, insertion-ordered quad store with subject and object
//! indices, plus [`Dataset`], the shared handle every model node points into.

use super::namespace::rdf;
use super::serialization::{ParseResult, RdfFormat, RdfParser, RdfSerializer, SerializeResult};
use super::types::{NamedNode, Quad, QuadPattern, RdfObject, RdfPredicate, RdfSubject};
use indexmap::{IndexMap, IndexSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// RDF quad store with subject and object indices
///
/// Quads keep their insertion order, so anything read back from the store
/// (and every query compiled from it) is deterministic.
#[derive(Clone, Debug, Default)]
pub struct RdfStore {
    /// All quads (primary storage)
    quads: IndexSet<Quad>,

    /// Subject -> quads with that subject
    subject_index: IndexMap<RdfSubject, IndexSet<Quad>>,

    /// Object -> quads with that object
    object_index: IndexMap<RdfObject, IndexSet<Quad>>,
}

impl RdfStore {
    /// Create a new empty RDF store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a quad, returning false if it was already present
    pub fn insert(&mut self, quad: Quad) -> bool {
        if self.quads.contains(&quad) {
            return false;
        }

        self.subject_index
            .entry(quad.subject.clone())
            .or_default()
            .insert(quad.clone());
        self.object_index
            .entry(quad.object.clone())
            .or_default()
            .insert(quad.clone());
        self.quads.insert(quad);
        true
    }

    /// Remove a quad, returning false if it was not present
    pub fn remove(&mut self, quad: &Quad) -> bool {
        if !self.quads.shift_remove(quad) {
            return false;
        }

        if let Some(quads) = self.subject_index.get_mut(&quad.subject) {
            quads.shift_remove(quad);
            if quads.is_empty() {
                self.subject_index.shift_remove(&quad.subject);
            }
        }
        if let Some(quads) = self.object_index.get_mut(&quad.object) {
            quads.shift_remove(quad);
            if quads.is_empty() {
                self.object_index.shift_remove(&quad.object);
            }
        }
        true
    }

    /// Check if a quad exists in the store
    pub fn contains(&self, quad: &Quad) -> bool {
        self.quads.contains(quad)
    }

    /// Get the total number of quads
    pub fn len(&self) -> usize {
        self.quads.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.quads.is_empty()
    }

    /// Clear all quads
    pub fn clear(&mut self) {
        self.quads.clear();
        self.subject_index.clear();
        self.object_index.clear();
    }

    /// Query quads matching a pattern
    pub fn matching(&self, pattern: &QuadPattern) -> Vec<Quad> {
        let candidates: Box<dyn Iterator<Item = &Quad>> = match (&pattern.subject, &pattern.object)
        {
            (Some(subject), _) => match self.subject_index.get(subject) {
                Some(quads) => Box::new(quads.iter()),
                None => return Vec::new(),
            },
            (None, Some(object)) => match self.object_index.get(object) {
                Some(quads) => Box::new(quads.iter()),
                None => return Vec::new(),
            },
            (None, None) => Box::new(self.quads.iter()),
        };

        candidates
            .filter(|quad| pattern.matches(quad))
            .cloned()
            .collect()
    }

    /// Get an iterator over all quads
    pub fn iter(&self) -> impl Iterator<Item = &Quad> {
        self.quads.iter()
    }

    /// Whether any quad has `term` in object position
    pub fn is_referenced(&self, term: &RdfObject) -> bool {
        self.object_index.contains_key(term)
    }
}

/// Shared, mutable handle to an [`RdfStore`]
///
/// Cloning the handle shares the store. All model nodes (sources, cubes,
/// views, dimensions, filters) read and write their attributes through it.
#[derive(Clone, Debug, Default)]
pub struct Dataset {
    store: Arc<RwLock<RdfStore>>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether both handles point to the same store
    pub fn same_as(&self, other: &Dataset) -> bool {
        Arc::ptr_eq(&self.store, &other.store)
    }

    fn read(&self) -> RwLockReadGuard<'_, RdfStore> {
        // a poisoned lock only means another writer panicked mid-update;
        // the store itself stays structurally valid
        self.store.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, RdfStore> {
        self.store.write().unwrap_or_else(|e| e.into_inner())
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn insert(&self, quad: Quad) -> bool {
        self.write().insert(quad)
    }

    pub fn extend(&self, quads: impl IntoIterator<Item = Quad>) {
        let mut store = self.write();
        for quad in quads {
            store.insert(quad);
        }
    }

    pub fn remove(&self, quad: &Quad) -> bool {
        self.write().remove(quad)
    }

    pub fn contains(&self, quad: &Quad) -> bool {
        self.read().contains(quad)
    }

    pub fn matching(&self, pattern: &QuadPattern) -> Vec<Quad> {
        self.read().matching(pattern)
    }

    /// Snapshot of every quad, in insertion order
    pub fn quads(&self) -> Vec<Quad> {
        self.read().iter().cloned().collect()
    }

    pub fn is_referenced(&self, term: &RdfObject) -> bool {
        self.read().is_referenced(term)
    }

    /// Objects of `subject predicate ?o`
    pub fn objects(&self, subject: &RdfSubject, predicate: &RdfPredicate) -> Vec<RdfObject> {
        self.matching(&QuadPattern::new(
            Some(subject.clone()),
            Some(predicate.clone()),
            None,
        ))
        .into_iter()
        .map(|q| q.object)
        .collect()
    }

    /// First object of `subject predicate ?o`
    pub fn object(&self, subject: &RdfSubject, predicate: &RdfPredicate) -> Option<RdfObject> {
        self.objects(subject, predicate).into_iter().next()
    }

    /// Subjects of `?s predicate object`
    pub fn subjects(&self, predicate: &RdfPredicate, object: &RdfObject) -> Vec<RdfSubject> {
        self.matching(&QuadPattern::new(
            None,
            Some(predicate.clone()),
            Some(object.clone()),
        ))
        .into_iter()
        .map(|q| q.subject)
        .collect()
    }

    pub fn has(&self, subject: &RdfSubject, predicate: &RdfPredicate, object: &RdfObject) -> bool {
        !self
            .matching(&QuadPattern::new(
                Some(subject.clone()),
                Some(predicate.clone()),
                Some(object.clone()),
            ))
            .is_empty()
    }

    /// Remove every `subject predicate ?o` quad, returning the removed objects
    pub fn remove_out(&self, subject: &RdfSubject, predicate: &RdfPredicate) -> Vec<RdfObject> {
        let mut store = self.write();
        let quads = store.matching(&QuadPattern::new(
            Some(subject.clone()),
            Some(predicate.clone()),
            None,
        ));
        for quad in &quads {
            store.remove(quad);
        }
        quads.into_iter().map(|q| q.object).collect()
    }

    /// Remove the description of `subject`: all of its out-edges plus,
    /// recursively, the description of every untyped blank node that is no
    /// longer referenced once those edges are gone. Returns the removed quads.
    ///
    /// Blank nodes carrying an `rdf:type` are entities with a lifecycle of
    /// their own and are left in place.
    pub fn remove_description(&self, subject: &RdfSubject) -> Vec<Quad> {
        let rdf_type = RdfPredicate::from(rdf::TYPE);
        let mut store = self.write();
        let mut removed = Vec::new();
        let mut pending = vec![subject.clone()];

        while let Some(current) = pending.pop() {
            let quads = store.matching(&QuadPattern::new(Some(current), None, None));
            for quad in quads {
                store.remove(&quad);
                if let RdfObject::BlankNode(blank) = &quad.object {
                    let node = RdfSubject::BlankNode(blank.clone());
                    let typed = !store
                        .matching(&QuadPattern::new(Some(node.clone()), Some(rdf_type.clone()), None))
                        .is_empty();
                    if !typed && !store.is_referenced(&quad.object) {
                        pending.push(node);
                    }
                }
                removed.push(quad);
            }
        }
        removed
    }

    /// Read an RDF collection starting at `head`
    ///
    /// Returns `None` when `head` is neither `rdf:nil` nor a well-formed list
    /// node.
    pub fn list(&self, head: &RdfObject) -> Option<Vec<RdfObject>> {
        let nil = RdfObject::from(rdf::NIL);
        let first = RdfPredicate::from(rdf::FIRST);
        let rest = RdfPredicate::from(rdf::REST);

        let mut items = Vec::new();
        let mut current = head.clone();
        while current != nil {
            let node = current.to_subject()?;
            items.push(self.object(&node, &first)?);
            current = self.object(&node, &rest)?;
            // guard against cyclic lists
            if items.len() > self.len() {
                return None;
            }
        }
        Some(items)
    }

    /// Write `items` as an RDF collection, returning its head
    pub fn insert_list(&self, items: &[RdfObject], graph: Option<&NamedNode>) -> RdfObject {
        let mut head = RdfObject::from(rdf::NIL);
        let mut store = self.write();
        for item in items.iter().rev() {
            let node = super::types::BlankNode::new();
            store.insert(Quad::new(
                node.clone(),
                rdf::FIRST,
                item.clone(),
                graph.cloned(),
            ));
            store.insert(Quad::new(node.clone(), rdf::REST, head, graph.cloned()));
            head = node.into();
        }
        head
    }

    /// Serialize every quad as N-Triples, in insertion order
    pub fn to_ntriples(&self) -> SerializeResult<String> {
        RdfSerializer::serialize(&self.quads(), RdfFormat::NTriples)
    }

    /// Parse `input` and add its triples; returns how many were parsed
    pub fn load(&self, input: &str, format: RdfFormat) -> ParseResult<usize> {
        let quads = RdfParser::parse(input, format)?;
        let count = quads.len();
        self.extend(quads);
        Ok(count)
    }
}
