use arbor_tree::TreeNode;
use tracing::debug;

/// Rewrites a tree in place.
pub trait TreeRewriter<V> {
    /// Applies rewrites to `tree` until nothing changes any more or `limit`
    /// rewrites have been done. Returns the number of rewrites.
    fn rewrite_limited(&self, tree: &mut TreeNode<V>, limit: usize) -> usize;

    /// Rewrites `tree` to a fixpoint. Returns `true` if the tree changed.
    ///
    /// This does not terminate for rewriters that never reach a fixpoint on
    /// `tree`; use [`rewrite_limited`](Self::rewrite_limited) to bound the work.
    fn rewrite(&self, tree: &mut TreeNode<V>) -> bool {
        self.rewrite_limited(tree, usize::MAX) > 0
    }
}

impl<V, R: TreeRewriter<V> + ?Sized> TreeRewriter<V> for &R {
    fn rewrite_limited(&self, tree: &mut TreeNode<V>, limit: usize) -> usize {
        (**self).rewrite_limited(tree, limit)
    }
}

impl<V, R: TreeRewriter<V> + ?Sized> TreeRewriter<V> for Box<R> {
    fn rewrite_limited(&self, tree: &mut TreeNode<V>, limit: usize) -> usize {
        (**self).rewrite_limited(tree, limit)
    }
}

/// Runs every rewriter once, in order, and repeats these passes until a
/// whole pass leaves the tree unchanged or `limit` rewrites have been done.
/// Returns the total number of rewrites.
pub fn rewrite_all<V, R>(tree: &mut TreeNode<V>, limit: usize, rewriters: &[R]) -> usize
where
    R: TreeRewriter<V>,
{
    let mut total = 0;
    let mut passes = 0;

    loop {
        let mut count = 0;
        for rewriter in rewriters {
            if total >= limit {
                break;
            }
            let rewrites = rewriter.rewrite_limited(tree, limit - total);
            count += rewrites;
            total += rewrites;
        }
        passes += 1;
        debug!(pass = passes, rewrites = count, total, "rewrite pass done");

        if count == 0 || total >= limit {
            return total;
        }
    }
}

/// Rewriters applied in sequence until their common fixpoint, see [`rewrite_all`].
#[derive(Debug, Clone, Default)]
pub struct Concat<R> {
    rewriters: Vec<R>,
}

impl<R> Concat<R> {
    pub fn rewriters(&self) -> &[R] {
        &self.rewriters
    }
}

impl<V, R: TreeRewriter<V>> TreeRewriter<V> for Concat<R> {
    fn rewrite_limited(&self, tree: &mut TreeNode<V>, limit: usize) -> usize {
        rewrite_all(tree, limit, &self.rewriters)
    }
}

/// Combines `rewriters` into a single one.
///
/// ```
/// use arbor_rewrite::{TreeRewriteRule, TreeRewriter, concat};
/// use arbor_tree::TreeNode;
///
/// let rewriter = concat([
///     TreeRewriteRule::compile("add(<x>,0) -> <x>").unwrap(),
///     TreeRewriteRule::compile("mul(<x>,1) -> <x>").unwrap(),
/// ]);
/// let mut tree = TreeNode::parse("mul(add(mul(y,1),0),1)").unwrap();
/// assert!(rewriter.rewrite(&mut tree));
/// assert_eq!(tree.to_string(), "y");
/// ```
pub fn concat<R, I>(rewriters: I) -> Concat<R>
where
    I: IntoIterator<Item = R>,
{
    Concat {
        rewriters: rewriters.into_iter().collect(),
    }
}

/// A rewriter backed by a closure taking the tree and the rewrite limit.
#[derive(Debug, Clone, Copy)]
pub struct FromFn<F>(F);

impl<V, F> TreeRewriter<V> for FromFn<F>
where
    F: Fn(&mut TreeNode<V>, usize) -> usize,
{
    fn rewrite_limited(&self, tree: &mut TreeNode<V>, limit: usize) -> usize {
        (self.0)(tree, limit)
    }
}

pub fn from_fn<F>(rewriter: F) -> FromFn<F> {
    FromFn(rewriter)
}
