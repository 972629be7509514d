//! Immutable, array backed trees.
//!
//! A [`FlatTreeNode`] stores all nodes of a tree in breadth-first order. The
//! children of every node are therefore contiguous and addressed by an
//! offset and a count, which keeps navigation O(1) without any pointers.
use std::collections::VecDeque;
use std::fmt;
use std::hash::{Hash, Hasher};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::TreeError;
use crate::node::TreeNode;
use crate::tree::Tree;

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(
        try_from = "RawFlatTreeNode<V>",
        bound(deserialize = "V: Deserialize<'de>")
    )
)]
#[derive(Clone)]
pub struct FlatTreeNode<V> {
    values: Vec<Option<V>>,
    child_offsets: Vec<usize>,
    child_counts: Vec<usize>,
    parents: Vec<Option<usize>>,
}

/// The storage arrays as they come off the wire, before validation.
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct RawFlatTreeNode<V> {
    values: Vec<Option<V>>,
    child_offsets: Vec<usize>,
    child_counts: Vec<usize>,
    parents: Vec<Option<usize>>,
}

#[cfg(feature = "serde")]
impl<V> TryFrom<RawFlatTreeNode<V>> for FlatTreeNode<V> {
    type Error = TreeError;

    fn try_from(raw: RawFlatTreeNode<V>) -> Result<Self, Self::Error> {
        Self::from_parts(raw.values, raw.child_offsets, raw.child_counts, raw.parents)
    }
}

impl<V> FlatTreeNode<V> {
    /// Flattens any [`Tree`], cloning its values.
    pub fn of<'a, T>(tree: T) -> Self
    where
        T: Tree<'a, Value = V>,
        V: Clone + 'a,
    {
        Self::of_with(tree, V::clone)
    }

    /// Flattens any [`Tree`], converting its values with `mapper`.
    pub fn of_with<'a, T, F>(tree: T, mut mapper: F) -> Self
    where
        T: Tree<'a>,
        F: FnMut(&T::Value) -> V,
    {
        let size = tree.size();
        let mut flat = Self {
            values: Vec::with_capacity(size),
            child_offsets: Vec::with_capacity(size),
            child_counts: Vec::with_capacity(size),
            parents: Vec::with_capacity(size),
        };

        // The next free slot for a child block. Breadth-first order hands out
        // child blocks in the same order the parents are visited.
        let mut next_offset = 1;
        let mut parent_of_next: VecDeque<Option<usize>> = VecDeque::from([None]);

        for (index, node) in tree.breadth_first().enumerate() {
            let child_count = node.child_count();
            flat.values.push(node.value().map(&mut mapper));
            flat.child_offsets.push(next_offset);
            flat.child_counts.push(child_count);
            flat.parents.push(parent_of_next.pop_front().flatten());
            parent_of_next.extend(std::iter::repeat_n(Some(index), child_count));
            next_offset += child_count;
        }

        flat
    }

    /// Assembles a flat tree from its storage arrays.
    ///
    /// The arrays must describe one tree rooted at index 0: every node with
    /// children owns the block `offset..offset + count` stored after itself,
    /// and every node but the root lies in the block of its parent.
    pub fn from_parts(
        values: Vec<Option<V>>,
        child_offsets: Vec<usize>,
        child_counts: Vec<usize>,
        parents: Vec<Option<usize>>,
    ) -> Result<Self, TreeError> {
        let invalid = |index, reason| TreeError::InvalidLayout { index, reason };
        let len = values.len();

        if len == 0 {
            return Err(invalid(0, "a flat tree holds at least its root"));
        }
        if child_offsets.len() != len || child_counts.len() != len || parents.len() != len {
            return Err(invalid(0, "storage arrays differ in length"));
        }
        if parents[0].is_some() {
            return Err(invalid(0, "the root has a parent"));
        }

        let block = |index: usize| child_offsets[index]..child_offsets[index] + child_counts[index];
        for index in 0..len {
            if child_counts[index] == 0 {
                continue;
            }
            let offset = child_offsets[index];
            if offset <= index || offset.checked_add(child_counts[index]).is_none_or(|end| end > len) {
                return Err(invalid(index, "children out of range"));
            }
            if block(index).any(|child| parents[child] != Some(index)) {
                return Err(invalid(index, "a child does not link back to its parent"));
            }
        }
        for index in 1..len {
            let linked = parents[index].is_some_and(|parent| {
                parent < len && child_counts[parent] > 0 && block(parent).contains(&index)
            });
            if !linked {
                return Err(invalid(index, "not a child of its parent"));
            }
        }

        Ok(Self {
            values,
            child_offsets,
            child_counts,
            parents,
        })
    }

    pub fn root(&self) -> FlatNode<'_, V> {
        FlatNode {
            tree: self,
            index: 0,
        }
    }

    /// The node stored at `index`, `None` if out of range.
    pub fn node(&self, index: usize) -> Option<FlatNode<'_, V>> {
        (index < self.len()).then_some(FlatNode { tree: self, index })
    }

    /// All nodes in storage (breadth-first) order.
    pub fn nodes(&self) -> impl ExactSizeIterator<Item = FlatNode<'_, V>> + '_ {
        (0..self.len()).map(|index| FlatNode { tree: self, index })
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// A flat tree always holds at least its root.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Rebuilds the mutable, linked form.
    pub fn to_tree_node(&self) -> TreeNode<V>
    where
        V: Clone,
    {
        TreeNode::from_tree(self.root())
    }

    pub fn map<B, F>(&self, mut mapper: F) -> FlatTreeNode<B>
    where
        F: FnMut(&V) -> B,
    {
        FlatTreeNode {
            values: self
                .values
                .iter()
                .map(|value| value.as_ref().map(&mut mapper))
                .collect(),
            child_offsets: self.child_offsets.clone(),
            child_counts: self.child_counts.clone(),
            parents: self.parents.clone(),
        }
    }
}

impl<V: Clone> From<&TreeNode<V>> for FlatTreeNode<V> {
    fn from(tree: &TreeNode<V>) -> Self {
        tree.flatten()
    }
}

impl<V: PartialEq> PartialEq for FlatTreeNode<V> {
    fn eq(&self, other: &Self) -> bool {
        self.root().tree_eq(other.root())
    }
}

impl<V: Eq> Eq for FlatTreeNode<V> {}

impl<V: Hash> Hash for FlatTreeNode<V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.root().tree_hash(state);
    }
}

impl<V: fmt::Display> fmt::Display for FlatTreeNode<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root().to_parentheses_string())
    }
}

impl<V: fmt::Debug> fmt::Debug for FlatTreeNode<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self.root().to_parentheses_string_with(|value| format!("{value:?}"));
        f.debug_tuple("FlatTreeNode").field(&format_args!("{text}")).finish()
    }
}

/// A borrowed, copyable handle to one node of a [`FlatTreeNode`].
pub struct FlatNode<'a, V> {
    tree: &'a FlatTreeNode<V>,
    index: usize,
}

impl<V> FlatNode<'_, V> {
    /// The storage index of this node.
    pub fn index(self) -> usize {
        self.index
    }

    /// Storage index of the first child; meaningless for a leaf.
    pub fn child_offset(self) -> usize {
        self.tree.child_offsets[self.index]
    }
}

impl<V> Clone for FlatNode<'_, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V> Copy for FlatNode<'_, V> {}

impl<'a, V: 'a> Tree<'a> for FlatNode<'a, V> {
    type Value = V;

    fn value(self) -> Option<&'a V> {
        self.tree.values[self.index].as_ref()
    }

    fn parent(self) -> Option<Self> {
        self.tree.parents[self.index].map(|index| FlatNode {
            tree: self.tree,
            index,
        })
    }

    fn child(self, index: usize) -> Option<Self> {
        (index < self.child_count()).then(|| FlatNode {
            tree: self.tree,
            index: self.child_offset() + index,
        })
    }

    fn child_count(self) -> usize {
        self.tree.child_counts[self.index]
    }

    fn identical(self, other: Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.index == other.index
    }

    fn index_of(self, child: Self) -> Option<usize> {
        let offset = self.child_offset();
        (self.is_child(child)).then(|| child.index - offset)
    }
}

impl<V: fmt::Debug> fmt::Debug for FlatNode<'_, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlatNode")
            .field("index", &self.index)
            .field("value", &self.value())
            .field("child_count", &self.child_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::path::Path;
    use rstest::{fixture, rstest};

    #[fixture]
    fn tree() -> TreeNode<String> {
        TreeNode::parse("0(1(4,5),2(6),3(7(10,11),8,9))").unwrap()
    }

    #[rstest]
    fn test_storage_order(tree: TreeNode<String>) {
        let flat = tree.flatten();
        let stored: Vec<_> = flat.nodes().filter_map(|n| n.value().cloned()).collect();
        assert_eq!(stored, (0..12).map(|i| i.to_string()).collect::<Vec<_>>());
        assert_eq!(flat.len(), 12);
        assert_eq!(flat.root().child_offset(), 1);
    }

    #[rstest]
    fn test_unflatten(tree: TreeNode<String>) {
        let flat = FlatTreeNode::from(&tree);
        assert_eq!(flat.to_tree_node(), tree);
        assert!(flat.root().tree_eq(tree.root()));
        assert!(tree.root().tree_eq(flat.root()));
        assert_eq!(flat.to_string(), tree.to_string());
    }

    #[rstest]
    #[case(&[])]
    #[case(&[0, 1])]
    #[case(&[1, 0])]
    #[case(&[2])]
    #[case(&[2, 0, 1])]
    #[case(&[2, 2])]
    fn test_accessors_agree(tree: TreeNode<String>, #[case] path: &[usize]) {
        let flat = tree.flatten();
        let path = Path::of(path);
        let linked = tree.root().child_at_path(&path).unwrap();
        let node = flat.root().child_at_path(&path).unwrap();

        assert_eq!(node.value(), linked.value());
        assert_eq!(node.child_count(), linked.child_count());
        assert_eq!(node.level(), linked.level());
        assert_eq!(node.depth(), linked.depth());
        assert_eq!(node.path(), path);
        assert_eq!(
            node.parent().and_then(|p| p.value()),
            linked.parent().and_then(|p| p.value())
        );
        assert_eq!(
            node.next_sibling().and_then(|n| n.value()),
            linked.next_sibling().and_then(|n| n.value())
        );
        assert!(node.tree_eq(linked));
    }

    #[rstest]
    fn test_traversals_agree(tree: TreeNode<String>) {
        let flat = tree.flatten();
        let linked: Vec<_> = tree.root().postorder().map(|n| n.value()).collect();
        let flattened: Vec<_> = flat.root().postorder().map(|n| n.value()).collect();
        assert_eq!(linked, flattened);

        let linked: Vec<_> = tree.root().preorder().map(|n| n.path()).collect();
        let flattened: Vec<_> = flat.root().preorder().map(|n| n.path()).collect();
        assert_eq!(linked, flattened);
    }

    #[test]
    fn test_single_node() {
        let flat = TreeNode::of(7).flatten();
        assert_eq!(flat.len(), 1);
        assert!(flat.root().is_leaf());
        assert!(flat.root().child(0).is_none());
        assert!(flat.node(1).is_none());
    }

    #[rstest]
    fn test_from_parts(tree: TreeNode<String>) {
        let flat = tree.flatten();
        let rebuilt = FlatTreeNode::from_parts(
            flat.values.clone(),
            flat.child_offsets.clone(),
            flat.child_counts.clone(),
            flat.parents.clone(),
        )
        .unwrap();
        assert_eq!(rebuilt, flat);
    }

    #[rstest]
    #[case::empty(vec![], vec![], vec![], vec![], 0)]
    #[case::lengths(vec![Some(0)], vec![1, 1], vec![0], vec![None], 0)]
    #[case::root_parent(vec![Some(0)], vec![1], vec![0], vec![Some(0)], 0)]
    #[case::offset_out_of_range(vec![Some(0)], vec![5], vec![2], vec![None], 0)]
    #[case::count_overflow(vec![Some(0), Some(1)], vec![1, 0], vec![usize::MAX, 0], vec![None, Some(0)], 0)]
    #[case::block_before_parent(vec![Some(0), Some(1)], vec![1, 0], vec![1, 1], vec![None, Some(0)], 1)]
    #[case::wrong_back_link(vec![Some(0), Some(1), Some(2)], vec![1, 2, 3], vec![2, 0, 0], vec![None, Some(0), Some(1)], 0)]
    #[case::orphan(vec![Some(0), Some(1), Some(2)], vec![1, 2, 3], vec![1, 0, 0], vec![None, Some(0), Some(0)], 2)]
    fn test_from_parts_rejects(
        #[case] values: Vec<Option<u8>>,
        #[case] child_offsets: Vec<usize>,
        #[case] child_counts: Vec<usize>,
        #[case] parents: Vec<Option<usize>>,
        #[case] index: usize,
    ) {
        let error = FlatTreeNode::from_parts(values, child_offsets, child_counts, parents)
            .err()
            .unwrap();
        assert!(matches!(error, TreeError::InvalidLayout { index: i, .. } if i == index));
    }

    #[rstest]
    fn test_map(tree: TreeNode<String>) {
        let flat = tree.flatten().map(|value| value.len());
        assert_eq!(flat.to_string(), "1(1(1,1),1(1),1(1(2,2),1,1))");
    }
}
