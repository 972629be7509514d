#![no_main]

use arbitrary::Arbitrary;
use arbor_tree::{Tree, TreeNode};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Clone, Arbitrary)]
struct ArbitraryTree {
    value: String,
    children: Vec<ArbitraryTree>,
}

impl ArbitraryTree {
    fn to_tree(&self) -> TreeNode<String> {
        self.children
            .iter()
            .map(ArbitraryTree::to_tree)
            .fold(TreeNode::of(self.value.clone()), TreeNode::with)
    }
}

#[derive(Debug, Clone, Arbitrary)]
enum Input {
    Raw(String),
    Generated(ArbitraryTree),
}

fuzz_target!(|input: Input| {
    match input {
        Input::Raw(text) => {
            if let Ok(tree) = TreeNode::parse(&text) {
                let printed = tree.to_string();
                let reparsed = TreeNode::parse(&printed).expect("printed trees parse");
                assert_eq!(reparsed.to_string(), printed);
            }
        }
        Input::Generated(generated) => {
            let tree = generated.to_tree();
            // Surrounding whitespace of a value is escaped, but the empty
            // root value can't be told apart from the empty tree.
            if tree.root().is_leaf() && tree.value().is_some_and(String::is_empty) {
                return;
            }
            let parsed = TreeNode::parse(&tree.to_string()).expect("printed trees parse");
            assert_eq!(parsed, tree);
            assert!(tree.flatten().root().tree_eq(parsed.root()));
        }
    }
});
