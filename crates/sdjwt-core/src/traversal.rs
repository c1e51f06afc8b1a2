//! # Traversal Engine: Trampolined Map and Fold
//!
//! Every consumer of a disclosure tree (the digest generator, claim-path
//! collection, plain-value projection, definition validation) is written
//! against the operators in this module instead of hand-rolled recursion.
//!
//! - [`fold`]: structure-collapsing, depth-first, post-order. Each node is
//!   handed to one of three [`Fold`] handlers (leaf, object, array) together
//!   with a [`Visit`] carrying its tag and the path so far, giving the six
//!   `{Always, Never} × {leaf, object, array}` cases. Container handlers
//!   receive their children's outputs in order.
//! - [`walk`]: pre-order visiting with pruning; the walker threads its own
//!   accumulator.
//! - [`DisclosableObject::map`]: structure-preserving; built on `fold`.
//!
//! ## Stack Discipline
//!
//! None of the operators recurse on the native call stack. Pending nodes,
//! container completion markers and intermediate results live in
//! heap-allocated work lists, so stack usage is independent of tree depth.

use crate::path::ClaimPath;
use crate::tree::{
    Disclosable, DisclosableArray, DisclosableObject, DisclosableValue, DisclosureTag,
};

/// Position of a node within its parent.
#[derive(Debug, PartialEq, Eq)]
pub enum PathSegment<'t, K> {
    /// Entry of a keyed container.
    Key(&'t K),
    /// Element of a positional container.
    Index(usize),
}

impl<K> Clone for PathSegment<'_, K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K> Copy for PathSegment<'_, K> {}

/// Borrowed view of a node's shape.
#[derive(Debug)]
pub enum Node<'t, K, A, M = ()> {
    /// A leaf value.
    Leaf(&'t A),
    /// A keyed container.
    Object(&'t DisclosableObject<K, A, M>),
    /// A positional container.
    Array(&'t DisclosableArray<K, A, M>),
}

impl<K, A, M> Clone for Node<'_, K, A, M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, A, M> Copy for Node<'_, K, A, M> {}

impl<K, A, M> DisclosableValue<K, A, M> {
    /// Borrow this value as a [`Node`].
    pub fn as_node(&self) -> Node<'_, K, A, M> {
        match self {
            Self::Leaf(a) => Node::Leaf(a),
            Self::Object(o) => Node::Object(o),
            Self::Array(a) => Node::Array(a),
        }
    }
}

/// Context handed to every handler.
#[derive(Debug)]
pub struct Visit<'v, 't, K> {
    path: &'v [PathSegment<'t, K>],
    tag: Option<DisclosureTag>,
}

impl<'v, 't, K> Visit<'v, 't, K> {
    /// Path from the root to this node; empty at the root.
    pub fn path(&self) -> &'v [PathSegment<'t, K>] {
        self.path
    }

    /// The node's tag; `None` for the untagged root.
    pub fn tag(&self) -> Option<DisclosureTag> {
        self.tag
    }

    /// Whether the node carries the `Always` tag.
    pub fn is_always(&self) -> bool {
        self.tag == Some(DisclosureTag::Always)
    }

    /// Position within the parent; `None` at the root.
    pub fn position(&self) -> Option<PathSegment<'t, K>> {
        self.path.last().copied()
    }

    /// Nesting depth; zero at the root.
    pub fn depth(&self) -> usize {
        self.path.len()
    }
}

impl Visit<'_, '_, String> {
    /// The path as a [`ClaimPath`]; `None` at the root.
    pub fn claim_path(&self) -> Option<ClaimPath> {
        ClaimPath::from_segments(self.path)
    }
}

/// Handlers for a post-order fold.
///
/// A node is one of six cases, a shape paired with a tag:
///
/// | shape  | `Always`                     | `Never`                     |
/// |--------|------------------------------|-----------------------------|
/// | leaf   | [`Fold::leaf`], tag `Always`   | [`Fold::leaf`], tag `Never`   |
/// | object | [`Fold::object`], tag `Always` | [`Fold::object`], tag `Never` |
/// | array  | [`Fold::array`], tag `Always`  | [`Fold::array`], tag `Never`  |
///
/// The shape selects the handler and the tag arrives through
/// [`Visit::tag`] (`None` only for the untagged root), so a folder that
/// treats both tags alike writes each shape once.
///
/// Children's outputs arrive in the container's own order: entry order for
/// objects, element order for arrays.
pub trait Fold<K, A, M = ()> {
    /// Result produced for each node.
    type Output;

    /// Handle a leaf.
    fn leaf(&mut self, visit: &Visit<'_, '_, K>, value: &A) -> Self::Output;

    /// Handle an object once all of its entries were folded.
    fn object(
        &mut self,
        visit: &Visit<'_, '_, K>,
        object: &DisclosableObject<K, A, M>,
        children: Vec<Self::Output>,
    ) -> Self::Output;

    /// Handle an array once all of its elements were folded.
    fn array(
        &mut self,
        visit: &Visit<'_, '_, K>,
        array: &DisclosableArray<K, A, M>,
        children: Vec<Self::Output>,
    ) -> Self::Output;
}

/// Outcome of visiting a node in [`walk`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Descend into the node's children.
    Continue,
    /// Do not visit the node's children.
    SkipChildren,
}

/// Pre-order visitor.
pub trait Walk<K, A, M = ()> {
    /// Called once per node before its children.
    fn enter(&mut self, visit: &Visit<'_, '_, K>, node: Node<'_, K, A, M>) -> Flow;
}

enum FoldTask<'t, K, A, M> {
    Enter {
        node: Node<'t, K, A, M>,
        tag: DisclosureTag,
        segment: PathSegment<'t, K>,
    },
    ExitObject {
        object: &'t DisclosableObject<K, A, M>,
        tag: DisclosureTag,
    },
    ExitArray {
        array: &'t DisclosableArray<K, A, M>,
        tag: DisclosureTag,
    },
}

fn schedule_children<'t, K, A, M>(node: Node<'t, K, A, M>, tasks: &mut Vec<FoldTask<'t, K, A, M>>) {
    match node {
        Node::Leaf(_) => {}
        Node::Object(object) => {
            for (key, child) in object.entries().iter().rev() {
                tasks.push(FoldTask::Enter {
                    node: child.value().as_node(),
                    tag: child.tag(),
                    segment: PathSegment::Key(key),
                });
            }
        }
        Node::Array(array) => {
            for (index, child) in array.elements().iter().enumerate().rev() {
                tasks.push(FoldTask::Enter {
                    node: child.value().as_node(),
                    tag: child.tag(),
                    segment: PathSegment::Index(index),
                });
            }
        }
    }
}

/// Fold every descendant of `node` and return the outputs of its direct
/// children, in order. `base` is the path of `node` itself.
fn fold_children<'t, K, A, M, F>(
    node: Node<'t, K, A, M>,
    base: &[PathSegment<'t, K>],
    folder: &mut F,
) -> Vec<F::Output>
where
    F: Fold<K, A, M> + ?Sized,
{
    let mut tasks = Vec::new();
    schedule_children(node, &mut tasks);
    let mut path: Vec<PathSegment<'t, K>> = base.to_vec();
    let mut results: Vec<F::Output> = Vec::new();

    while let Some(task) = tasks.pop() {
        match task {
            FoldTask::Enter { node, tag, segment } => {
                path.push(segment);
                match node {
                    Node::Leaf(value) => {
                        let visit = Visit { path: &path, tag: Some(tag) };
                        results.push(folder.leaf(&visit, value));
                        path.pop();
                    }
                    Node::Object(object) => {
                        tasks.push(FoldTask::ExitObject { object, tag });
                        schedule_children(node, &mut tasks);
                    }
                    Node::Array(array) => {
                        tasks.push(FoldTask::ExitArray { array, tag });
                        schedule_children(node, &mut tasks);
                    }
                }
            }
            FoldTask::ExitObject { object, tag } => {
                let children = results.split_off(results.len().saturating_sub(object.len()));
                let visit = Visit { path: &path, tag: Some(tag) };
                let output = folder.object(&visit, object, children);
                path.pop();
                results.push(output);
            }
            FoldTask::ExitArray { array, tag } => {
                let children = results.split_off(results.len().saturating_sub(array.len()));
                let visit = Visit { path: &path, tag: Some(tag) };
                let output = folder.array(&visit, array, children);
                path.pop();
                results.push(output);
            }
        }
    }
    results
}

fn fold_node<'t, K, A, M, F>(
    node: Node<'t, K, A, M>,
    tag: Option<DisclosureTag>,
    folder: &mut F,
) -> F::Output
where
    F: Fold<K, A, M> + ?Sized,
{
    let root = Visit { path: &[], tag };
    match node {
        Node::Leaf(value) => folder.leaf(&root, value),
        Node::Object(object) => {
            let children = fold_children(node, &[], folder);
            folder.object(&root, object, children)
        }
        Node::Array(array) => {
            let children = fold_children(node, &[], folder);
            folder.array(&root, array, children)
        }
    }
}

/// Fold a tree rooted at an (untagged) object.
pub fn fold<K, A, M, F>(root: &DisclosableObject<K, A, M>, folder: &mut F) -> F::Output
where
    F: Fold<K, A, M> + ?Sized,
{
    fold_node(Node::Object(root), None, folder)
}

/// Fold a tree rooted at a tagged element.
pub fn fold_element<K, A, M, F>(root: &Disclosable<K, A, M>, folder: &mut F) -> F::Output
where
    F: Fold<K, A, M> + ?Sized,
{
    fold_node(root.value().as_node(), Some(root.tag()), folder)
}

enum WalkTask<'t, K, A, M> {
    Enter {
        node: Node<'t, K, A, M>,
        tag: DisclosureTag,
        segment: PathSegment<'t, K>,
    },
    Leave,
}

/// Visit every node of the tree rooted at `root` in pre-order. A node for
/// which the walker returns [`Flow::SkipChildren`] has none of its
/// descendants visited.
pub fn walk<K, A, M, W>(root: &DisclosableObject<K, A, M>, walker: &mut W)
where
    W: Walk<K, A, M> + ?Sized,
{
    let root_node = Node::Object(root);
    if walker.enter(&Visit { path: &[], tag: None }, root_node) == Flow::SkipChildren {
        return;
    }

    let mut tasks: Vec<WalkTask<'_, K, A, M>> = Vec::new();
    let mut path: Vec<PathSegment<'_, K>> = Vec::new();
    push_walk_children(root_node, &mut tasks);

    while let Some(task) = tasks.pop() {
        match task {
            WalkTask::Enter { node, tag, segment } => {
                path.push(segment);
                let flow = walker.enter(&Visit { path: &path, tag: Some(tag) }, node);
                tasks.push(WalkTask::Leave);
                if flow == Flow::Continue {
                    push_walk_children(node, &mut tasks);
                }
            }
            WalkTask::Leave => {
                path.pop();
            }
        }
    }
}

fn push_walk_children<'t, K, A, M>(node: Node<'t, K, A, M>, tasks: &mut Vec<WalkTask<'t, K, A, M>>) {
    match node {
        Node::Leaf(_) => {}
        Node::Object(object) => {
            for (key, child) in object.entries().iter().rev() {
                tasks.push(WalkTask::Enter {
                    node: child.value().as_node(),
                    tag: child.tag(),
                    segment: PathSegment::Key(key),
                });
            }
        }
        Node::Array(array) => {
            for (index, child) in array.elements().iter().enumerate().rev() {
                tasks.push(WalkTask::Enter {
                    node: child.value().as_node(),
                    tag: child.tag(),
                    segment: PathSegment::Index(index),
                });
            }
        }
    }
}

// ---------------------------------------------------------------------------
// map
// ---------------------------------------------------------------------------

struct MapFold<F> {
    f: F,
}

impl<K, A, M, B, F> Fold<K, A, M> for MapFold<F>
where
    K: Clone,
    M: Clone,
    F: FnMut(&[PathSegment<'_, K>], &A) -> B,
{
    type Output = DisclosableValue<K, B, M>;

    fn leaf(&mut self, visit: &Visit<'_, '_, K>, value: &A) -> Self::Output {
        DisclosableValue::Leaf((self.f)(visit.path(), value))
    }

    fn object(
        &mut self,
        _visit: &Visit<'_, '_, K>,
        object: &DisclosableObject<K, A, M>,
        children: Vec<Self::Output>,
    ) -> Self::Output {
        DisclosableValue::Object(map_object_shell(object, children))
    }

    fn array(
        &mut self,
        _visit: &Visit<'_, '_, K>,
        array: &DisclosableArray<K, A, M>,
        children: Vec<Self::Output>,
    ) -> Self::Output {
        DisclosableValue::Array(map_array_shell(array, children))
    }
}

fn map_array_shell<K, A, M: Clone, B>(
    array: &DisclosableArray<K, A, M>,
    children: Vec<DisclosableValue<K, B, M>>,
) -> DisclosableArray<K, B, M> {
    let elements = array
        .elements()
        .iter()
        .zip(children)
        .map(|(el, v)| Disclosable::tagged(el.tag(), v))
        .collect();
    DisclosableArray::from_validated(elements, array.minimum_digests(), array.metadata().clone())
}

fn map_object_shell<K: Clone, A, M: Clone, B>(
    object: &DisclosableObject<K, A, M>,
    children: Vec<DisclosableValue<K, B, M>>,
) -> DisclosableObject<K, B, M> {
    let entries = object
        .entries()
        .iter()
        .zip(children)
        .map(|((k, el), v)| (k.clone(), Disclosable::tagged(el.tag(), v)))
        .collect();
    DisclosableObject::from_validated(entries, object.minimum_digests(), object.metadata().clone())
}

impl<K: Clone, A, M: Clone> DisclosableObject<K, A, M> {
    /// Transform every leaf, keeping shape, tags, hints and container
    /// annotations.
    pub fn map<B>(&self, f: impl FnMut(&A) -> B) -> DisclosableObject<K, B, M> {
        self.map_with_path(ignore_path(f))
    }

    /// Like [`DisclosableObject::map`], also handing the leaf's path to `f`.
    pub fn map_with_path<B>(
        &self,
        f: impl FnMut(&[PathSegment<'_, K>], &A) -> B,
    ) -> DisclosableObject<K, B, M> {
        let mut folder = MapFold { f };
        let children = fold_children(Node::Object(self), &[], &mut folder);
        map_object_shell(self, children)
    }
}

impl<K: Clone, A, M: Clone> DisclosableArray<K, A, M> {
    /// Transform every leaf, keeping shape, tags, hints and container
    /// annotations.
    pub fn map<B>(&self, f: impl FnMut(&A) -> B) -> DisclosableArray<K, B, M> {
        let mut folder = MapFold { f: ignore_path(f) };
        let children = fold_children(Node::Array(self), &[], &mut folder);
        map_array_shell(self, children)
    }
}

impl<K: Clone, A, M: Clone> Disclosable<K, A, M> {
    /// Transform every leaf of this element, keeping shape and tags.
    pub fn map<B>(&self, f: impl FnMut(&A) -> B) -> Disclosable<K, B, M> {
        let mut folder = MapFold { f: ignore_path(f) };
        Disclosable::tagged(self.tag(), fold_element(self, &mut folder))
    }
}

fn ignore_path<K, A, B>(
    mut f: impl FnMut(&A) -> B,
) -> impl FnMut(&[PathSegment<'_, K>], &A) -> B {
    move |_, a| f(a)
}
