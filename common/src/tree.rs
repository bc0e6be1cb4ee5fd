//! Arena-backed mutable rooted tree.
//!
//! Nodes live in a single vector and are addressed by stable [`NodeId`]
//! handles. Each node records its parent index and its depth, so parent and
//! depth queries are constant time rather than a scan from the root. Moving a
//! subtree is an explicit [`Tree::detach`] / [`Tree::attach`] pair (or the
//! combined [`Tree::reattach`]); depths are refreshed for the moved subtree
//! only.
//!
//! A detached node keeps its own children but is unreachable from the root,
//! so it is ignored by [`Tree::breadth_first`], [`Tree::height`],
//! [`Tree::nodes_at_depth`] and [`Tree::find`] until it is attached again.

use std::collections::VecDeque;
use thiserror::Error;

/// Stable handle to a node owned by a [`Tree`].
///
/// Handles are only meaningful for the tree that issued them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Errors raised by structural tree operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TreeError {
    /// The handle was not issued by this tree.
    #[error("node {0:?} does not belong to this tree")]
    UnknownNode(NodeId),

    /// The root can neither be detached nor attached elsewhere.
    #[error("the root node cannot be moved")]
    RootNotMovable,

    /// The node already has a parent; detach it first.
    #[error("node {0:?} is already attached to a parent")]
    AlreadyAttached(NodeId),

    /// The requested parent is not reachable from the root.
    #[error("parent node {0:?} is not attached to the tree")]
    ParentDetached(NodeId),

    /// The requested parent lies inside the subtree being moved.
    #[error("attaching {node:?} beneath {parent:?} would create a cycle")]
    WouldCreateCycle {
        /// Node being moved.
        node: NodeId,
        /// Requested new parent.
        parent: NodeId,
    },
}

#[derive(Debug, Clone)]
struct Node<T> {
    value: T,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    depth: usize,
}

/// A rooted tree whose children are exclusively owned by one parent at a time.
///
/// # Examples
///
/// ```
/// use jarmod_common::tree::Tree;
///
/// let mut tree = Tree::new("root");
/// let a = tree.insert(tree.root(), "a")?;
/// let b = tree.insert(a, "b")?;
///
/// assert_eq!(tree.depth(b), Some(2));
/// assert_eq!(tree.parent(b), Some(a));
/// assert_eq!(tree.height(), 2);
/// # Ok::<(), jarmod_common::tree::TreeError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Tree<T> {
    nodes: Vec<Node<T>>,
}

impl<T> Tree<T> {
    /// Creates a tree holding only a root node.
    #[must_use]
    pub fn new(root: T) -> Self {
        Self {
            nodes: vec![Node {
                value: root,
                parent: None,
                children: Vec::new(),
                depth: 0,
            }],
        }
    }

    /// Returns the handle of the root node.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Returns how many nodes the arena holds, detached ones included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true when `id` was issued by this tree.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    /// Returns the value stored at `id`.
    #[must_use]
    pub fn value(&self, id: NodeId) -> Option<&T> {
        self.nodes.get(id.0).map(|node| &node.value)
    }

    /// Returns the parent of `id`, or `None` for the root and detached nodes.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).and_then(|node| node.parent)
    }

    /// Returns the children of `id` in insertion order.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.0)
            .map_or(&[][..], |node| node.children.as_slice())
    }

    /// Returns true when `id` is reachable from the root.
    #[must_use]
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if current == self.root() {
                return true;
            }
            match self.parent(current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// Returns the distance from the root to `id`.
    ///
    /// The root has depth `0`. Unknown and detached nodes have no depth.
    #[must_use]
    pub fn depth(&self, id: NodeId) -> Option<usize> {
        if !self.is_attached(id) {
            return None;
        }
        self.nodes.get(id.0).map(|node| node.depth)
    }

    /// Adds `value` as the last child of `parent`.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::UnknownNode`] for a foreign handle and
    /// [`TreeError::ParentDetached`] when `parent` is not reachable from the
    /// root.
    pub fn insert(&mut self, parent: NodeId, value: T) -> Result<NodeId, TreeError> {
        let parent_depth = self.attached_depth(parent)?;
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            value,
            parent: Some(parent),
            children: Vec::new(),
            depth: parent_depth + 1,
        });
        self.node_mut(parent)?.children.push(id);
        Ok(id)
    }

    /// Removes `id` (with its whole subtree) from its parent.
    ///
    /// Detaching an already detached node is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::RootNotMovable`] for the root and
    /// [`TreeError::UnknownNode`] for a foreign handle.
    pub fn detach(&mut self, id: NodeId) -> Result<(), TreeError> {
        if id == self.root() {
            return Err(TreeError::RootNotMovable);
        }
        let Some(parent) = self.node(id)?.parent else {
            return Ok(());
        };
        self.node_mut(parent)?.children.retain(|child| *child != id);
        self.node_mut(id)?.parent = None;
        Ok(())
    }

    /// Appends the detached node `id` (with its subtree) to `parent`.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::AlreadyAttached`] if `id` still has a parent,
    /// [`TreeError::WouldCreateCycle`] if `parent` is inside the subtree of
    /// `id`, and the errors of [`Tree::insert`] for an invalid `parent`.
    pub fn attach(&mut self, id: NodeId, parent: NodeId) -> Result<(), TreeError> {
        if id == self.root() {
            return Err(TreeError::RootNotMovable);
        }
        if self.node(id)?.parent.is_some() {
            return Err(TreeError::AlreadyAttached(id));
        }
        if parent == id || self.is_ancestor(id, parent) {
            return Err(TreeError::WouldCreateCycle { node: id, parent });
        }
        self.attached_depth(parent)?;

        self.node_mut(parent)?.children.push(id);
        self.node_mut(id)?.parent = Some(parent);
        self.refresh_depths(id);
        Ok(())
    }

    /// Moves `id` (with its subtree) beneath `new_parent`.
    ///
    /// The move is validated before anything is detached, so a rejected move
    /// leaves the tree untouched.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::WouldCreateCycle`] if `new_parent` is `id` or one
    /// of its descendants, plus the errors of [`Tree::detach`] and
    /// [`Tree::attach`].
    pub fn reattach(&mut self, id: NodeId, new_parent: NodeId) -> Result<(), TreeError> {
        if id == self.root() {
            return Err(TreeError::RootNotMovable);
        }
        self.node(id)?;
        if new_parent == id || self.is_ancestor(id, new_parent) {
            return Err(TreeError::WouldCreateCycle {
                node: id,
                parent: new_parent,
            });
        }
        self.attached_depth(new_parent)?;

        self.detach(id)?;
        self.attach(id, new_parent)
    }

    /// Returns true when `ancestor` lies strictly above `node`.
    #[must_use]
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = self.parent(node);
        while let Some(candidate) = current {
            if candidate == ancestor {
                return true;
            }
            current = self.parent(candidate);
        }
        false
    }

    /// Returns the nodes from `ancestor` down to `descendant`, both included.
    ///
    /// Returns `None` when `descendant` is not `ancestor` and does not lie
    /// beneath it.
    #[must_use]
    pub fn path_between(&self, ancestor: NodeId, descendant: NodeId) -> Option<Vec<NodeId>> {
        let mut path = vec![descendant];
        let mut current = descendant;
        while current != ancestor {
            current = self.parent(current)?;
            path.push(current);
        }
        path.reverse();
        Some(path)
    }

    /// Returns every attached node in breadth-first discovery order.
    #[must_use]
    pub fn breadth_first(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut queue = VecDeque::from([self.root()]);
        while let Some(id) = queue.pop_front() {
            order.push(id);
            queue.extend(self.children(id).iter().copied());
        }
        order
    }

    /// Returns the greatest depth among attached nodes.
    #[must_use]
    pub fn height(&self) -> usize {
        self.breadth_first()
            .into_iter()
            .filter_map(|id| self.nodes.get(id.0).map(|node| node.depth))
            .max()
            .unwrap_or(0)
    }

    /// Returns the attached nodes at `depth` in breadth-first discovery order.
    #[must_use]
    pub fn nodes_at_depth(&self, depth: usize) -> Vec<NodeId> {
        self.breadth_first()
            .into_iter()
            .filter(|id| self.nodes.get(id.0).is_some_and(|node| node.depth == depth))
            .collect()
    }

    /// Returns the first attached node, in breadth-first order, whose value
    /// satisfies `predicate`.
    pub fn find<P>(&self, mut predicate: P) -> Option<NodeId>
    where
        P: FnMut(&T) -> bool,
    {
        self.breadth_first()
            .into_iter()
            .find(|id| self.value(*id).is_some_and(&mut predicate))
    }

    fn node(&self, id: NodeId) -> Result<&Node<T>, TreeError> {
        self.nodes.get(id.0).ok_or(TreeError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node<T>, TreeError> {
        self.nodes.get_mut(id.0).ok_or(TreeError::UnknownNode(id))
    }

    fn attached_depth(&self, id: NodeId) -> Result<usize, TreeError> {
        let node = self.node(id)?;
        if self.is_attached(id) {
            Ok(node.depth)
        } else {
            Err(TreeError::ParentDetached(id))
        }
    }

    /// Recomputes depths for the subtree rooted at `id` from its parent.
    fn refresh_depths(&mut self, id: NodeId) {
        let mut queue = VecDeque::from([id]);
        while let Some(current) = queue.pop_front() {
            let parent_depth = self
                .parent(current)
                .and_then(|parent| self.nodes.get(parent.0))
                .map_or(0, |parent| parent.depth);
            if let Some(node) = self.nodes.get_mut(current.0) {
                node.depth = parent_depth + 1;
                queue.extend(node.children.iter().copied());
            }
        }
    }
}
