use std::collections::VecDeque;
use std::iter::FusedIterator;

use super::Tree;

/// Iterates over the direct children of a node, in order.
#[derive(Debug, Clone)]
pub struct Children<T> {
    node: T,
    front: usize,
    back: usize,
}

impl<'a, T: Tree<'a>> Children<T> {
    pub(crate) fn new(node: T) -> Self {
        Self {
            node,
            front: 0,
            back: node.child_count(),
        }
    }
}

impl<'a, T: Tree<'a>> Iterator for Children<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        let child = self.node.child(self.front);
        self.front += 1;
        child
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.back.saturating_sub(self.front);
        (len, Some(len))
    }
}

impl<'a, T: Tree<'a>> DoubleEndedIterator for Children<T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        self.back -= 1;
        self.node.child(self.back)
    }
}

impl<'a, T: Tree<'a>> ExactSizeIterator for Children<T> {}
impl<'a, T: Tree<'a>> FusedIterator for Children<T> {}

/// Preorder traversal: a node is visited before its children.
#[derive(Debug, Clone)]
pub struct Preorder<T> {
    stack: Vec<T>,
}

impl<T> Preorder<T> {
    pub(crate) fn new(root: T) -> Self {
        Self { stack: vec![root] }
    }
}

impl<'a, T: Tree<'a>> Iterator for Preorder<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children().rev());
        Some(node)
    }
}

impl<'a, T: Tree<'a>> FusedIterator for Preorder<T> {}

/// Postorder traversal: a node is visited after all of its children.
#[derive(Debug, Clone)]
pub struct Postorder<T> {
    // Node plus the index of the next child to descend into.
    stack: Vec<(T, usize)>,
}

impl<T> Postorder<T> {
    pub(crate) fn new(root: T) -> Self {
        Self {
            stack: vec![(root, 0)],
        }
    }
}

impl<'a, T: Tree<'a>> Iterator for Postorder<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (node, next_child) = self.stack.last_mut()?;
            let node = *node;
            if *next_child < node.child_count() {
                let index = *next_child;
                *next_child += 1;
                if let Some(child) = node.child(index) {
                    self.stack.push((child, 0));
                }
            } else {
                self.stack.pop();
                return Some(node);
            }
        }
    }
}

impl<'a, T: Tree<'a>> FusedIterator for Postorder<T> {}

/// Breadth-first (level order) traversal.
#[derive(Debug, Clone)]
pub struct BreadthFirst<T> {
    queue: VecDeque<T>,
}

impl<T> BreadthFirst<T> {
    pub(crate) fn new(root: T) -> Self {
        Self {
            queue: VecDeque::from([root]),
        }
    }
}

impl<'a, T: Tree<'a>> Iterator for BreadthFirst<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.queue.pop_front()?;
        self.queue.extend(node.children());
        Some(node)
    }
}

impl<'a, T: Tree<'a>> FusedIterator for BreadthFirst<T> {}

/// The nodes from an ancestor down to a descendant, both inclusive.
#[derive(Debug, Clone)]
pub struct PathFromAncestor<T> {
    nodes: std::vec::IntoIter<T>,
}

impl<'a, T: Tree<'a>> PathFromAncestor<T> {
    /// Returns `None` if `ancestor` is not an ancestor of (or identical to) `node`.
    pub(crate) fn new(ancestor: T, node: T) -> Option<Self> {
        let mut nodes = Vec::with_capacity(node.level() + 1);
        let mut current = Some(node);
        while let Some(n) = current {
            nodes.push(n);
            if n.identical(ancestor) {
                nodes.reverse();
                return Some(Self {
                    nodes: nodes.into_iter(),
                });
            }
            current = n.parent();
        }
        None
    }
}

impl<'a, T: Tree<'a>> Iterator for PathFromAncestor<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.nodes.next()
    }
}
