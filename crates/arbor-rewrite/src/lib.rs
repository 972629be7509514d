//! Pattern matching and rewriting of [`arbor_tree`] trees.
//!
//! Patterns are trees in the parentheses format whose `<name>` leaves are
//! variables. A [`TreeRewriteRule`] `pattern -> template` replaces sub-trees
//! matching its pattern by its template, filling in the sub-trees bound to the
//! variables. Rules are applied in place until a fixpoint is reached:
//!
//! - a single rule repeatedly rewrites the first match, in breadth-first
//!   order, restarting from the root after every rewrite;
//! - a [`RuleSet`] (or any [`concat`] of rewriters) runs every rule once per
//!   pass and stops after the first pass that doesn't change the tree.
//!
//! Termination is up to the rules. [`TreeRewriter::rewrite_limited`] bounds the
//! number of rewrites for rule sets that may not converge.
//!
//! ## Example
//!
//! ```rust
//! use arbor_rewrite::{RuleSet, TreeRewriter};
//! use arbor_tree::TreeNode;
//!
//! let rules = RuleSet::parse(
//!     "
//!     ## double negation
//!     neg(neg(<x>)) -> <x>
//!     sub(<x>,<x>) -> 0
//!     ",
//! )
//! .unwrap();
//!
//! let mut tree = TreeNode::parse("add(neg(neg(sub(y,y))),z)").unwrap();
//! assert!(rules.rewrite(&mut tree));
//! assert_eq!(tree.to_string(), "add(0,z)");
//! ```
mod error;
mod matcher;
mod pattern;
mod rewriter;
mod rule;
pub mod rules;

pub use error::Error;
pub use error::PatternError;
pub use error::RuleError;
pub use matcher::TreeMatchResult;
pub use matcher::TreeMatcher;
pub use pattern::Bindings;
pub use pattern::Decl;
pub use pattern::TreePattern;
pub use rewriter::Concat;
pub use rewriter::FromFn;
pub use rewriter::TreeRewriter;
pub use rewriter::concat;
pub use rewriter::from_fn;
pub use rewriter::rewrite_all;
pub use rule::TreeRewriteRule;
pub use rule::ValueMapping;
pub use rules::RuleSet;
