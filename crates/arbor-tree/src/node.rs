use std::collections::VecDeque;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use slotmap::{SlotMap, new_key_type};

use crate::error::TreeError;
use crate::flat::FlatTreeNode;
use crate::parentheses::{self, ParseError};
use crate::tree::Tree;
use crate::tree::path::Path;

new_key_type! { pub struct NodeId; }

#[derive(Debug, Clone)]
struct NodeData<V> {
    value: Option<V>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl<V> NodeData<V> {
    fn new(value: Option<V>, parent: Option<NodeId>) -> Self {
        Self {
            value,
            parent,
            children: Vec::new(),
        }
    }
}

/// A mutable tree with ordered children.
///
/// All nodes of one tree live in a single arena and are addressed by
/// [`NodeId`]. Sub-trees move between trees only as owned `TreeNode` values
/// (see [`attach`](Self::attach) and [`detach`](Self::detach)), so a node can
/// never end up as a child of its own descendant.
///
/// ```
/// use arbor_tree::{Tree, TreeNode};
///
/// let mut tree = TreeNode::of(0).with(TreeNode::of(1)).with(TreeNode::of(2));
/// let two = tree.root().child(1).unwrap().id();
/// tree.attach_value(two, 3).unwrap();
///
/// assert_eq!(tree.to_string(), "0(1,2(3))");
/// ```
#[derive(Clone)]
pub struct TreeNode<V> {
    nodes: SlotMap<NodeId, NodeData<V>>,
    root: NodeId,
}

impl<V> TreeNode<V> {
    /// Creates the empty tree: a single root node without value.
    pub fn new() -> Self {
        Self::with_root(None)
    }

    /// Creates a single node tree holding `value`.
    pub fn of(value: V) -> Self {
        Self::with_root(Some(value))
    }

    fn with_root(value: Option<V>) -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(NodeData::new(value, None));
        Self { nodes, root }
    }

    /// Deep copies any [`Tree`] into a new mutable tree.
    pub fn from_tree<'a, T>(tree: T) -> Self
    where
        T: Tree<'a, Value = V>,
        V: Clone + 'a,
    {
        Self::from_tree_with(tree, V::clone)
    }

    /// Copies any [`Tree`] into a new mutable tree, converting every value
    /// with `mapper`.
    pub fn from_tree_with<'a, T, F>(tree: T, mut mapper: F) -> Self
    where
        T: Tree<'a>,
        F: FnMut(&T::Value) -> V,
    {
        let mut target = Self::with_root(tree.value().map(&mut mapper));
        let mut queue = VecDeque::from([(tree, target.root)]);

        while let Some((source, parent)) = queue.pop_front() {
            for child in source.children() {
                let id = target
                    .nodes
                    .insert(NodeData::new(child.value().map(&mut mapper), Some(parent)));
                target.nodes[parent].children.push(id);
                queue.push_back((child, id));
            }
        }

        target
    }

    pub fn root(&self) -> Node<'_, V> {
        Node {
            tree: self,
            id: self.root,
        }
    }

    pub fn root_id(&self) -> NodeId {
        self.root
    }

    /// The node with the given id, `None` if it does not belong to this tree.
    pub fn node(&self, id: NodeId) -> Option<Node<'_, V>> {
        self.nodes.contains_key(id).then_some(Node { tree: self, id })
    }

    /// The id of the node at `path`, relative to the root.
    pub fn node_at_path(&self, path: &Path) -> Option<NodeId> {
        self.root().child_at_path(path).map(Node::id)
    }

    /// The value of the root node.
    pub fn value(&self) -> Option<&V> {
        self.nodes[self.root].value.as_ref()
    }

    pub fn value_mut(&mut self, id: NodeId) -> Option<&mut V> {
        self.nodes.get_mut(id).and_then(|data| data.value.as_mut())
    }

    /// Sets the value of node `id`, returning the previous one.
    pub fn set_value(&mut self, id: NodeId, value: V) -> Result<Option<V>, TreeError> {
        let data = self.nodes.get_mut(id).ok_or(TreeError::NodeNotFound)?;
        Ok(data.value.replace(value))
    }

    /// `true` for the empty tree, a root without value and children.
    pub fn is_empty(&self) -> bool {
        let root = &self.nodes[self.root];
        root.value.is_none() && root.children.is_empty()
    }

    /// Number of nodes in the tree.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Appends `child` as the last child of `parent`. Returns the id the
    /// root of `child` has in this tree.
    pub fn attach(&mut self, parent: NodeId, child: TreeNode<V>) -> Result<NodeId, TreeError> {
        let index = self.children_of(parent)?.len();
        self.insert(parent, index, child)
    }

    /// Appends a new leaf holding `value` to `parent`.
    pub fn attach_value(&mut self, parent: NodeId, value: V) -> Result<NodeId, TreeError> {
        self.attach(parent, TreeNode::of(value))
    }

    /// Builder style variant of [`attach`](Self::attach) on the root.
    pub fn with(mut self, child: TreeNode<V>) -> Self {
        let root = self.root;
        self.graft(child, root, self.nodes[root].children.len());
        self
    }

    /// Inserts `child` at `index` among the children of `parent`, shifting
    /// the following children to the right.
    pub fn insert(
        &mut self,
        parent: NodeId,
        index: usize,
        child: TreeNode<V>,
    ) -> Result<NodeId, TreeError> {
        let len = self.children_of(parent)?.len();
        if index > len {
            return Err(TreeError::IndexOutOfBounds { index, len });
        }
        Ok(self.graft(child, parent, index))
    }

    /// Replaces the child at `index` of `parent` with `child` and returns the
    /// replaced sub-tree.
    pub fn replace(
        &mut self,
        parent: NodeId,
        index: usize,
        child: TreeNode<V>,
    ) -> Result<TreeNode<V>, TreeError> {
        let removed = self.remove(parent, index)?;
        self.graft(child, parent, index);
        Ok(removed)
    }

    /// Removes the child at `index` of `parent` and returns it as an
    /// independent tree.
    pub fn remove(&mut self, parent: NodeId, index: usize) -> Result<TreeNode<V>, TreeError> {
        let children = self.children_of(parent)?;
        let id = *children.get(index).ok_or(TreeError::IndexOutOfBounds {
            index,
            len: children.len(),
        })?;
        self.detach(id)
    }

    /// Removes node `id` (with its sub-tree) from its parent and returns it
    /// as an independent tree whose root has no parent.
    pub fn detach(&mut self, id: NodeId) -> Result<TreeNode<V>, TreeError> {
        if id == self.root {
            return Err(TreeError::RootNotDetachable);
        }
        let parent = self
            .nodes
            .get(id)
            .ok_or(TreeError::NodeNotFound)?
            .parent
            .ok_or(TreeError::NodeNotFound)?;
        self.nodes[parent].children.retain(|child| *child != id);

        let mut detached = TreeNode {
            nodes: SlotMap::with_key(),
            root: id,
        };
        let mut queue = VecDeque::from([(id, None)]);
        while let Some((old, parent)) = queue.pop_front() {
            let Some(data) = self.nodes.remove(old) else {
                continue;
            };
            let new = detached.nodes.insert(NodeData::new(data.value, parent));
            match parent {
                Some(parent) => detached.nodes[parent].children.push(new),
                None => detached.root = new,
            }
            queue.extend(data.children.into_iter().map(|child| (child, Some(new))));
        }

        Ok(detached)
    }

    pub fn remove_all_children(&mut self, id: NodeId) -> Result<(), TreeError> {
        let data = self.nodes.get_mut(id).ok_or(TreeError::NodeNotFound)?;
        let mut stack = std::mem::take(&mut data.children);
        while let Some(node) = stack.pop() {
            if let Some(data) = self.nodes.remove(node) {
                stack.extend(data.children);
            }
        }
        Ok(())
    }

    /// Replaces the node at `path` with `child`. The empty path replaces the
    /// root in place: it takes over the value and children of `child`.
    ///
    /// Returns `false` if no node exists at `path`.
    pub fn replace_at_path(&mut self, path: &Path, child: TreeNode<V>) -> bool {
        let Some(parent_path) = path.parent() else {
            let root = self.root;
            if self.remove_all_children(root).is_err() {
                return false;
            }
            let TreeNode {
                mut nodes,
                root: source_root,
            } = child;
            let Some(data) = nodes.remove(source_root) else {
                return false;
            };
            self.nodes[root].value = data.value;
            for (index, grandchild) in data.children.into_iter().enumerate() {
                self.graft_from(&mut nodes, grandchild, root, index);
            }
            return true;
        };

        match (self.node_at_path(&parent_path), path.last()) {
            (Some(parent), Some(index)) => self.replace(parent, index, child).is_ok(),
            _ => false,
        }
    }

    /// Removes the node at `path`. The root can't be removed, so the empty
    /// path yields `false`, as does a path without node.
    pub fn remove_at_path(&mut self, path: &Path) -> bool {
        match (path.parent().and_then(|p| self.node_at_path(&p)), path.last()) {
            (Some(parent), Some(index)) => self.remove(parent, index).is_ok(),
            _ => false,
        }
    }

    /// Returns a structurally identical tree with every value converted by `mapper`.
    pub fn map<B, F>(&self, mapper: F) -> TreeNode<B>
    where
        F: FnMut(&V) -> B,
    {
        TreeNode::from_tree_with(self.root(), mapper)
    }

    /// Converts this tree into its immutable, array backed form.
    pub fn flatten(&self) -> FlatTreeNode<V>
    where
        V: Clone,
    {
        FlatTreeNode::of(self.root())
    }

    /// Parses the parentheses form `value(child1,child2,...)`, converting
    /// every (unescaped) value text with `mapper`.
    pub fn parse_with<F>(text: &str, mapper: F) -> Result<Self, ParseError>
    where
        F: FnMut(&str) -> V,
    {
        parentheses::parse(text, mapper)
    }

    /// Appends a new leaf to `parent`, which must be a node of this tree.
    pub(crate) fn push_value(&mut self, parent: NodeId, value: V) -> NodeId {
        let id = self.nodes.insert(NodeData::new(Some(value), Some(parent)));
        self.nodes[parent].children.push(id);
        id
    }

    fn children_of(&self, id: NodeId) -> Result<&[NodeId], TreeError> {
        self.nodes
            .get(id)
            .map(|data| data.children.as_slice())
            .ok_or(TreeError::NodeNotFound)
    }

    fn graft(&mut self, child: TreeNode<V>, parent: NodeId, index: usize) -> NodeId {
        let TreeNode { mut nodes, root } = child;
        self.graft_from(&mut nodes, root, parent, index)
    }

    /// Moves the sub-tree `source_id` out of `source` and inserts it at
    /// `index` among the children of `parent`.
    fn graft_from(
        &mut self,
        source: &mut SlotMap<NodeId, NodeData<V>>,
        source_id: NodeId,
        parent: NodeId,
        index: usize,
    ) -> NodeId {
        let mut grafted = None;
        let mut queue = VecDeque::from([(source_id, parent)]);

        while let Some((old, new_parent)) = queue.pop_front() {
            let Some(data) = source.remove(old) else {
                continue;
            };
            let new = self.nodes.insert(NodeData::new(data.value, Some(new_parent)));
            match grafted {
                None => {
                    self.nodes[new_parent].children.insert(index, new);
                    grafted = Some(new);
                }
                Some(_) => self.nodes[new_parent].children.push(new),
            }
            queue.extend(data.children.into_iter().map(|child| (child, new)));
        }

        grafted.unwrap_or(parent)
    }
}

impl TreeNode<String> {
    /// Parses the parentheses form into a tree of strings.
    ///
    /// ```
    /// use arbor_tree::{Tree, TreeNode};
    ///
    /// let tree = TreeNode::parse("mul(x,add(y,1))").unwrap();
    /// assert_eq!(tree.root().size(), 5);
    /// assert_eq!(tree.to_string(), "mul(x,add(y,1))");
    /// ```
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        parentheses::parse(text, |value| value.to_string())
    }
}

impl FromStr for TreeNode<String> {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl<V> Default for TreeNode<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: PartialEq> PartialEq for TreeNode<V> {
    fn eq(&self, other: &Self) -> bool {
        self.root().tree_eq(other.root())
    }
}

impl<V: Eq> Eq for TreeNode<V> {}

impl<V: Hash> Hash for TreeNode<V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.root().tree_hash(state);
    }
}

impl<V: fmt::Display> fmt::Display for TreeNode<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root().to_parentheses_string())
    }
}

impl<V: fmt::Debug> fmt::Debug for TreeNode<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self.root().to_parentheses_string_with(|value| format!("{value:?}"));
        f.debug_tuple("TreeNode").field(&format_args!("{text}")).finish()
    }
}

impl<V> From<V> for TreeNode<V> {
    fn from(value: V) -> Self {
        Self::of(value)
    }
}

/// A borrowed, copyable handle to one node of a [`TreeNode`].
pub struct Node<'a, V> {
    tree: &'a TreeNode<V>,
    id: NodeId,
}

impl<'a, V> Node<'a, V> {
    pub fn id(self) -> NodeId {
        self.id
    }

    /// The tree this node belongs to.
    pub fn tree(self) -> &'a TreeNode<V> {
        self.tree
    }

    /// Copies the sub-tree rooted at this node into a new, independent tree.
    pub fn to_tree_node(self) -> TreeNode<V>
    where
        V: Clone,
    {
        TreeNode::from_tree(self)
    }

    fn data(self) -> &'a NodeData<V> {
        &self.tree.nodes[self.id]
    }

    fn handle(self, id: NodeId) -> Self {
        Node { tree: self.tree, id }
    }
}

impl<V> Clone for Node<'_, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V> Copy for Node<'_, V> {}

impl<'a, V: 'a> Tree<'a> for Node<'a, V> {
    type Value = V;

    fn value(self) -> Option<&'a V> {
        self.data().value.as_ref()
    }

    fn parent(self) -> Option<Self> {
        self.data().parent.map(|id| self.handle(id))
    }

    fn child(self, index: usize) -> Option<Self> {
        self.data().children.get(index).map(|id| self.handle(*id))
    }

    fn child_count(self) -> usize {
        self.data().children.len()
    }

    fn identical(self, other: Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl<V: fmt::Debug> fmt::Debug for Node<'_, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("value", &self.value())
            .field("child_count", &self.child_count())
            .finish()
    }
}
