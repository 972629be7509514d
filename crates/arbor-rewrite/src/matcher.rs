use arbor_tree::Tree;
use arbor_tree::iter::BreadthFirst;
use tracing::trace;

use crate::pattern::{Bindings, TreePattern};

/// A sub-tree matching a pattern, together with the variable bindings of the match.
#[derive(Debug, Clone)]
pub struct TreeMatchResult<T> {
    pub tree: T,
    pub bindings: Bindings<T>,
}

/// Lazy breadth-first search for the sub-trees matching a [`TreePattern`].
///
/// Every node of the host tree gets a fresh match attempt, so bindings never
/// carry over from one candidate to the next.
pub struct TreeMatcher<'p, T, F> {
    pattern: &'p TreePattern,
    nodes: BreadthFirst<T>,
    equals: F,
}

impl<'p, 'a, T, F> TreeMatcher<'p, T, F>
where
    T: Tree<'a>,
{
    pub(crate) fn new(pattern: &'p TreePattern, tree: T, equals: F) -> Self {
        Self {
            pattern,
            nodes: tree.breadth_first(),
            equals,
        }
    }
}

impl<'a, T, F> Iterator for TreeMatcher<'_, T, F>
where
    T: Tree<'a>,
    T::Value: PartialEq,
    F: Fn(&T::Value, &str) -> bool,
{
    type Item = TreeMatchResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        for node in self.nodes.by_ref() {
            let bindings = self.pattern.match_tree_with(node, &self.equals);
            trace!(
                pattern = %self.pattern,
                path = %node.path(),
                matched = bindings.is_some(),
                "match attempt"
            );
            if let Some(bindings) = bindings {
                return Some(TreeMatchResult {
                    tree: node,
                    bindings,
                });
            }
        }
        None
    }
}
