//! The read-only navigation contract shared by every tree representation.
//!
//! [`Tree`] is implemented by lightweight `Copy` handles, [`Node`](crate::Node)
//! for the mutable [`TreeNode`](crate::TreeNode) and
//! [`FlatNode`](crate::FlatNode) for the array backed
//! [`FlatTreeNode`](crate::FlatTreeNode). Only the five required methods are
//! representation specific; everything else is derived from them.
pub mod iter;
pub mod path;

use std::fmt::Display;
use std::hash::{Hash, Hasher};

use crate::error::TreeError;
use crate::parentheses;
use iter::{BreadthFirst, Children, PathFromAncestor, Postorder, Preorder};
use path::Path;

pub trait Tree<'a>: Copy + Sized + 'a {
    type Value: 'a;

    /// The value of this node, `None` for a node without value (e.g. the empty tree).
    fn value(self) -> Option<&'a Self::Value>;

    /// The parent of this node, `None` for the root.
    fn parent(self) -> Option<Self>;

    /// The child at the given `index`, `None` if the index is out of range.
    fn child(self, index: usize) -> Option<Self>;

    fn child_count(self) -> usize;

    /// Identity (not structural) comparison: `true` iff both handles denote
    /// the same node of the same tree instance.
    fn identical(self, other: Self) -> bool;

    /// The child at the given `index`.
    fn child_at(self, index: usize) -> Result<Self, TreeError> {
        self.child(index).ok_or(TreeError::IndexOutOfBounds {
            index,
            len: self.child_count(),
        })
    }

    fn children(self) -> Children<Self> {
        Children::new(self)
    }

    fn first_child(self) -> Option<Self> {
        self.child(0)
    }

    fn last_child(self) -> Option<Self> {
        self.child_count()
            .checked_sub(1)
            .and_then(|index| self.child(index))
    }

    /// The index of `child` among the children of this node.
    fn index_of(self, child: Self) -> Option<usize> {
        self.children().position(|c| c.identical(child))
    }

    fn is_child(self, node: Self) -> bool {
        node.parent().is_some_and(|parent| parent.identical(self))
    }

    /// The child directly following `child`; `None` if `child` is the last
    /// child or not a child of this node at all.
    fn child_after(self, child: Self) -> Option<Self> {
        self.index_of(child).and_then(|index| self.child(index + 1))
    }

    /// The child directly preceding `child`; `None` if `child` is the first
    /// child or not a child of this node at all.
    fn child_before(self, child: Self) -> Option<Self> {
        self.index_of(child)
            .and_then(|index| index.checked_sub(1))
            .and_then(|index| self.child(index))
    }

    fn is_root(self) -> bool {
        self.parent().is_none()
    }

    fn is_leaf(self) -> bool {
        self.child_count() == 0
    }

    fn root(self) -> Self {
        let mut node = self;
        while let Some(parent) = node.parent() {
            node = parent;
        }
        node
    }

    /// Number of edges between this node and its root.
    fn level(self) -> usize {
        std::iter::successors(self.parent(), |node| node.parent()).count()
    }

    /// Number of levels below this node; `0` for a leaf.
    fn depth(self) -> usize {
        let level = self.level();
        self.breadth_first()
            .last()
            .map_or(0, |deepest| deepest.level() - level)
    }

    /// Number of nodes of the sub-tree rooted at this node, itself included.
    fn size(self) -> usize {
        self.preorder().count()
    }

    fn leaf_count(self) -> usize {
        self.preorder().filter(|node| node.is_leaf()).count()
    }

    fn is_sibling(self, node: Self) -> bool {
        self.identical(node)
            || match (self.parent(), node.parent()) {
                (Some(a), Some(b)) => a.identical(b),
                _ => false,
            }
    }

    /// Number of siblings, this node included; `1` for the root.
    fn sibling_count(self) -> usize {
        self.parent().map_or(1, |parent| parent.child_count())
    }

    fn next_sibling(self) -> Option<Self> {
        self.parent().and_then(|parent| parent.child_after(self))
    }

    fn previous_sibling(self) -> Option<Self> {
        self.parent().and_then(|parent| parent.child_before(self))
    }

    fn first_leaf(self) -> Self {
        let mut leaf = self;
        while let Some(child) = leaf.first_child() {
            leaf = child;
        }
        leaf
    }

    fn last_leaf(self) -> Self {
        let mut leaf = self;
        while let Some(child) = leaf.last_child() {
            leaf = child;
        }
        leaf
    }

    /// The leaf following this node's sub-tree, within the whole tree.
    fn next_leaf(self) -> Option<Self> {
        match self.next_sibling() {
            Some(sibling) => Some(sibling.first_leaf()),
            None => self.parent().and_then(|parent| parent.next_leaf()),
        }
    }

    /// The leaf preceding this node's sub-tree, within the whole tree.
    fn previous_leaf(self) -> Option<Self> {
        match self.previous_sibling() {
            Some(sibling) => Some(sibling.last_leaf()),
            None => self.parent().and_then(|parent| parent.previous_leaf()),
        }
    }

    /// The node following this one in a preorder traversal of the whole tree.
    fn next_node(self) -> Option<Self> {
        if let Some(child) = self.first_child() {
            return Some(child);
        }
        let mut node = Some(self);
        while let Some(n) = node {
            if let Some(sibling) = n.next_sibling() {
                return Some(sibling);
            }
            node = n.parent();
        }
        None
    }

    /// The node preceding this one in a preorder traversal of the whole tree.
    fn previous_node(self) -> Option<Self> {
        let parent = self.parent()?;
        match self.previous_sibling() {
            Some(sibling) => Some(sibling.last_leaf()),
            None => Some(parent),
        }
    }

    /// `true` if `node` is this node or one of its ancestors.
    fn is_ancestor(self, node: Self) -> bool {
        std::iter::successors(Some(self), |n| n.parent()).any(|n| n.identical(node))
    }

    /// `true` if `node` is this node or one of its descendants.
    fn is_descendant(self, node: Self) -> bool {
        node.is_ancestor(self)
    }

    /// `true` if both nodes belong to the same tree.
    fn is_related(self, node: Self) -> bool {
        self.root().identical(node.root())
    }

    /// The nearest common ancestor of this node and `node`.
    fn shared_ancestor(self, node: Self) -> Option<Self> {
        let (level1, level2) = (self.level(), node.level());
        let (mut deep, mut shallow) = if level1 >= level2 {
            (self, node)
        } else {
            (node, self)
        };
        for _ in 0..level1.abs_diff(level2) {
            deep = deep.parent()?;
        }
        loop {
            if deep.identical(shallow) {
                return Some(deep);
            }
            deep = deep.parent()?;
            shallow = shallow.parent()?;
        }
    }

    /// The child indices leading from the root to this node.
    fn path(self) -> Path {
        let mut indices = Vec::with_capacity(self.level());
        let mut node = self;
        while let Some(parent) = node.parent() {
            if let Some(index) = parent.index_of(node) {
                indices.push(index);
            }
            node = parent;
        }
        indices.reverse();
        Path::from(indices)
    }

    /// The nodes from the root down to this node, both inclusive.
    fn path_elements(self) -> Vec<Self> {
        let mut nodes: Vec<_> = std::iter::successors(Some(self), |n| n.parent()).collect();
        nodes.reverse();
        nodes
    }

    /// The nodes from `ancestor` down to this node; `None` if `ancestor` is
    /// not an ancestor of this node.
    fn path_from_ancestor(self, ancestor: Self) -> Option<PathFromAncestor<Self>> {
        PathFromAncestor::new(ancestor, self)
    }

    /// Resolves `path` relative to this node. Fails softly with `None` as
    /// soon as one index is out of range.
    fn child_at_path(self, path: &Path) -> Option<Self> {
        path.iter().try_fold(self, |node, index| node.child(index))
    }

    fn preorder(self) -> Preorder<Self> {
        Preorder::new(self)
    }

    fn postorder(self) -> Postorder<Self> {
        Postorder::new(self)
    }

    fn breadth_first(self) -> BreadthFirst<Self> {
        BreadthFirst::new(self)
    }

    /// Depth-first enumeration in the sense of Swing's `TreeNode`, which
    /// visits children before their parent (postorder).
    fn depth_first(self) -> Postorder<Self> {
        self.postorder()
    }

    /// Structural equality: same shape and equal values at every position.
    /// Works across representations.
    fn tree_eq<'b, U>(self, other: U) -> bool
    where
        U: Tree<'b>,
        Self::Value: PartialEq<U::Value>,
    {
        let mut left = self.preorder();
        let mut right = other.preorder();
        loop {
            match (left.next(), right.next()) {
                (None, None) => return true,
                (Some(a), Some(b)) => {
                    if a.child_count() != b.child_count() {
                        return false;
                    }
                    let equal = match (a.value(), b.value()) {
                        (Some(x), Some(y)) => x == y,
                        (None, None) => true,
                        _ => false,
                    };
                    if !equal {
                        return false;
                    }
                }
                _ => return false,
            }
        }
    }

    /// Feeds the structure of this sub-tree into `state`. Structurally equal
    /// trees hash equally, whatever their representation.
    fn tree_hash<H: Hasher>(self, state: &mut H)
    where
        Self::Value: Hash,
    {
        for node in self.preorder() {
            node.value().hash(state);
            node.child_count().hash(state);
        }
    }

    /// Renders the sub-tree as `value(child1,child2,...)`, see
    /// [`parentheses`](crate::parentheses).
    fn to_parentheses_string(self) -> String
    where
        Self::Value: Display,
    {
        parentheses::to_string(self, |value| value.to_string())
    }

    fn to_parentheses_string_with<F>(self, mapper: F) -> String
    where
        F: FnMut(&Self::Value) -> String,
    {
        parentheses::to_string(self, mapper)
    }
}
