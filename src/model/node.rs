//! Node lifecycle
//!
//! Every entity of the model (source, cube, view, dimension, filter) is a
//! [`Node`]: a handle holding its own term and the [`Dataset`] its attributes
//! live in. Nodes form an ownership tree through `parent`/`children` so that
//! clearing a node tears down its dependents as well.

use crate::rdf::{BlankNode, Dataset, Quad, RdfObject, RdfPredicate, RdfSubject};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tracing::debug;

struct NodeInner {
    term: RdfSubject,
    dataset: Dataset,
    parent: Mutex<Option<Weak<NodeInner>>>,
    children: Mutex<Vec<Node>>,
}

/// Handle to one entity in a shared dataset
///
/// Cloning a node clones the handle, not the entity.
#[derive(Clone)]
pub struct Node {
    inner: Arc<NodeInner>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

impl Node {
    /// Create a root node
    pub fn new(term: RdfSubject, dataset: Dataset) -> Self {
        Self {
            inner: Arc::new(NodeInner {
                term,
                dataset,
                parent: Mutex::new(None),
                children: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Create a root node with a fresh blank node term
    pub fn blank(dataset: Dataset) -> Self {
        Self::new(BlankNode::new().into(), dataset)
    }

    /// Create a node owned by `self`, sharing its dataset
    pub fn create_child(&self, term: RdfSubject) -> Node {
        let child = Node::new(term, self.dataset().clone());
        self.add_child(&child);
        child
    }

    pub fn term(&self) -> &RdfSubject {
        &self.inner.term
    }

    pub fn dataset(&self) -> &Dataset {
        &self.inner.dataset
    }

    pub fn parent(&self) -> Option<Node> {
        lock(&self.inner.parent)
            .as_ref()
            .and_then(Weak::upgrade)
            .map(|inner| Node { inner })
    }

    pub fn children(&self) -> Vec<Node> {
        lock(&self.inner.children).clone()
    }

    /// Whether both handles point to the same node
    pub fn same_as(&self, other: &Node) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Make `child` a child of `self`, detaching it from any previous parent
    pub fn add_child(&self, child: &Node) {
        child.detach();
        *lock(&child.inner.parent) = Some(Arc::downgrade(&self.inner));
        lock(&self.inner.children).push(child.clone());
    }

    fn remove_child(&self, child: &Node) {
        lock(&self.inner.children).retain(|c| !c.same_as(child));
    }

    /// Detach from the parent's children
    pub fn detach(&self) {
        let parent = lock(&self.inner.parent).take();
        if let Some(parent) = parent.and_then(|p| p.upgrade()) {
            Node { inner: parent }.remove_child(self);
        }
    }

    /// Objects of `self predicate ?o`
    pub fn out(&self, predicate: impl Into<RdfPredicate>) -> Vec<RdfObject> {
        self.dataset().objects(self.term(), &predicate.into())
    }

    /// First object of `self predicate ?o`
    pub fn out_one(&self, predicate: impl Into<RdfPredicate>) -> Option<RdfObject> {
        self.dataset().object(self.term(), &predicate.into())
    }

    /// Add `self predicate object`
    pub fn add(&self, predicate: impl Into<RdfPredicate>, object: impl Into<RdfObject>) {
        self.dataset()
            .insert(Quad::triple(self.term().clone(), predicate, object));
    }

    /// Replace every `self predicate ?o` with a single `self predicate object`
    pub fn set(&self, predicate: impl Into<RdfPredicate>, object: impl Into<RdfObject>) {
        let predicate = predicate.into();
        self.dataset().remove_out(self.term(), &predicate);
        self.add(predicate, object);
    }

    /// Remove every `self predicate ?o`, returning the removed objects
    pub fn delete(&self, predicate: impl Into<RdfPredicate>) -> Vec<RdfObject> {
        self.dataset().remove_out(self.term(), &predicate.into())
    }

    /// Whether any triple still points at this node
    pub fn is_referenced(&self) -> bool {
        self.dataset().is_referenced(&self.term().clone().into())
    }

    /// Clear this node and its children
    ///
    /// Detaches from the parent, removes this node's own description and then
    /// clears every child that nothing references any more. Children still
    /// referenced by surviving nodes are released but keep their triples.
    /// Clearing an already cleared node is a no-op.
    pub fn clear(&self) {
        self.clear_with(&[]);
    }

    /// Like [`Node::clear`], also considering `dependents` that are not
    /// children of this node (nodes it uses but another node created)
    pub fn clear_with(&self, dependents: &[Node]) {
        self.detach();
        let removed = self.dataset().remove_description(self.term());
        debug!(term = %self.term(), triples = removed.len(), "cleared node");

        let mut pending: Vec<Node> = std::mem::take(&mut *lock(&self.inner.children));
        for dependent in dependents {
            if !pending.iter().any(|n| n.same_as(dependent)) {
                pending.push(dependent.clone());
            }
        }
        for child in &pending {
            *lock(&child.inner.parent) = None;
        }

        // clearing one dependent can release another (a filter releasing
        // its filter-only dimension), so repeat until nothing changes
        loop {
            let before = pending.len();
            let (released, kept): (Vec<Node>, Vec<Node>) =
                pending.into_iter().partition(|n| !n.is_referenced());
            for node in &released {
                node.clear();
            }
            pending = kept;
            if pending.len() == before {
                break;
            }
        }
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node").field("term", self.term()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rdf::{view, Literal, NamedNode};

    fn ex(local: &str) -> NamedNode {
        NamedNode::new(&format!("http://example.org/{local}")).unwrap()
    }

    #[test]
    fn test_parent_child_tracking() {
        let root = Node::new(ex("root").into(), Dataset::new());
        let child = root.create_child(ex("child").into());

        assert!(child.parent().unwrap().same_as(&root));
        assert_eq!(root.children().len(), 1);
        assert!(child.dataset().same_as(root.dataset()));

        let other = Node::new(ex("other").into(), root.dataset().clone());
        other.add_child(&child);
        assert!(root.children().is_empty());
        assert!(child.parent().unwrap().same_as(&other));
    }

    #[test]
    fn test_set_replaces_values() {
        let node = Node::blank(Dataset::new());
        node.add(view::OFFSET, Literal::new_integer(1));
        node.add(view::OFFSET, Literal::new_integer(2));
        assert_eq!(node.out(view::OFFSET).len(), 2);

        node.set(view::OFFSET, Literal::new_integer(3));
        assert_eq!(node.out(view::OFFSET), vec![Literal::new_integer(3).into()]);

        assert_eq!(node.delete(view::OFFSET).len(), 1);
        assert!(node.out_one(view::OFFSET).is_none());
    }

    #[test]
    fn test_clear_cascades_to_unreferenced_children() {
        let root = Node::new(ex("root").into(), Dataset::new());
        let owned = root.create_child(ex("owned").into());
        let shared = root.create_child(ex("shared").into());
        let other = Node::new(ex("other").into(), root.dataset().clone());

        root.add(view::DIMENSION, owned.term().clone());
        root.add(view::DIMENSION, shared.term().clone());
        other.add(view::DIMENSION, shared.term().clone());
        owned.add(view::PATH, ex("a"));
        shared.add(view::PATH, ex("b"));

        root.clear();
        let dataset = root.dataset();
        assert!(owned.out(view::PATH).is_empty());
        assert_eq!(shared.out(view::PATH), vec![ex("b").into()]);
        assert_eq!(other.out(view::DIMENSION).len(), 1);
        assert!(shared.parent().is_none());
        assert!(root.children().is_empty());

        let snapshot = dataset.quads();
        root.clear();
        assert_eq!(dataset.quads(), snapshot);
    }

    #[test]
    fn test_clear_releases_chained_dependents() {
        let root = Node::new(ex("root").into(), Dataset::new());
        let dimension = root.create_child(ex("dimension").into());
        let filter = root.create_child(ex("filter").into());

        root.add(view::FILTER, filter.term().clone());
        filter.add(view::DIMENSION, dimension.term().clone());
        dimension.add(view::PATH, ex("p"));

        root.clear();
        assert!(root.dataset().is_empty());
    }
}
