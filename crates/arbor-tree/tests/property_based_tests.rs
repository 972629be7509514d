//! Property-based tests for the tree representations and the parentheses format.
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use arbor_tree::{FlatTreeNode, Tree, TreeNode};
use proptest::prelude::*;

mod strategies {
    use super::*;

    /// Leaf values, including characters the parentheses format has to escape.
    pub fn value() -> impl Strategy<Value = String> {
        "[a-z0-9(),\\\\ ]{1,4}"
    }

    pub fn tree() -> impl Strategy<Value = TreeNode<String>> {
        value()
            .prop_map(TreeNode::of)
            .prop_recursive(5, 48, 4, |inner| {
                (value(), prop::collection::vec(inner, 1..4)).prop_map(|(value, children)| {
                    children.into_iter().fold(TreeNode::of(value), TreeNode::with)
                })
            })
    }
}

fn hash_of<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Parsing is the left inverse of printing.
    #[test]
    fn parentheses_round_trip(tree in strategies::tree()) {
        let text = tree.to_string();
        let parsed = TreeNode::parse(&text);
        prop_assert!(parsed.is_ok(), "{text:?} does not parse: {parsed:?}");
        prop_assert_eq!(parsed.unwrap(), tree);
    }

    /// Flattening and unflattening yields a structurally equal tree.
    #[test]
    fn flatten_round_trip(tree in strategies::tree()) {
        let flat = FlatTreeNode::from(&tree);
        prop_assert_eq!(flat.len(), tree.root().size());
        prop_assert!(flat.root().tree_eq(tree.root()));
        prop_assert_eq!(flat.to_tree_node(), tree.clone());
        prop_assert_eq!(hash_of(&flat), hash_of(&tree));
    }

    /// Both representations enumerate the same values in every traversal order.
    #[test]
    fn traversals_agree(tree in strategies::tree()) {
        let flat = tree.flatten();
        let linked: Vec<_> = tree.root().preorder().map(|n| n.value()).collect();
        let flattened: Vec<_> = flat.root().preorder().map(|n| n.value()).collect();
        prop_assert_eq!(linked, flattened);

        let linked: Vec<_> = tree.root().postorder().map(|n| n.value()).collect();
        let flattened: Vec<_> = flat.root().postorder().map(|n| n.value()).collect();
        prop_assert_eq!(linked, flattened);

        let linked: Vec<_> = tree.root().breadth_first().map(|n| n.value()).collect();
        let flattened: Vec<_> = flat.nodes().map(|n| n.value()).collect();
        prop_assert_eq!(linked, flattened);
    }

    /// Walking `next_node` from the root reproduces the preorder traversal.
    #[test]
    fn next_node_walk_is_preorder(tree in strategies::tree()) {
        let walked: Vec<_> = std::iter::successors(Some(tree.root()), |n| n.next_node())
            .map(|n| n.id())
            .collect();
        let preorder: Vec<_> = tree.root().preorder().map(|n| n.id()).collect();
        prop_assert_eq!(walked, preorder);
    }

    /// Every node is found again at its own path.
    #[test]
    fn paths_resolve(tree in strategies::tree()) {
        let root = tree.root();
        for node in root.preorder() {
            let path = node.path();
            prop_assert_eq!(path.len(), node.level());
            let found = root.child_at_path(&path);
            prop_assert!(found.is_some_and(|found| found.identical(node)));
        }
    }

    /// Breadth-first order never visits a shallower node after a deeper one.
    #[test]
    fn breadth_first_levels_are_monotonic(tree in strategies::tree()) {
        let levels: Vec<_> = tree.root().breadth_first().map(|n| n.level()).collect();
        prop_assert!(levels.windows(2).all(|w| w[0] <= w[1]));
        prop_assert_eq!(levels.last().copied().unwrap_or_default(), tree.root().depth());
    }

    /// Detaching a sub-tree and attaching it back at the same index restores the tree.
    #[test]
    fn detach_then_insert_restores(tree in strategies::tree(), pick in any::<prop::sample::Index>()) {
        let ids: Vec<_> = tree.root().preorder().skip(1).map(|n| n.id()).collect();
        prop_assume!(!ids.is_empty());

        let mut copy = tree.clone();
        let id = ids[pick.index(ids.len())];
        let node = copy.node(id).unwrap();
        let parent = node.parent().unwrap().id();
        let index = node.parent().and_then(|p| p.index_of(node)).unwrap();

        let detached = copy.detach(id).unwrap();
        prop_assert!(detached.root().is_root());
        prop_assert_eq!(copy.root().size() + detached.root().size(), tree.root().size());

        copy.insert(parent, index, detached).unwrap();
        prop_assert_eq!(copy, tree);
    }
}
