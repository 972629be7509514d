//! Rule sets written as text, one rule per line.
//!
//! ```text
//! # comments and blank lines are ignored
//! add(<x>,0) -> <x>
//! mul(<x>,1) -> <x>
//! ```
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use arbor_tree::TreeNode;
use itertools::Itertools;

use crate::error::RuleError;
use crate::rewriter::{TreeRewriter, rewrite_all};
use crate::rule::{TreeRewriteRule, ValueMapping};

const COMMENT: char = '#';

/// Algebraic identities on the operation names produced by
/// [`arbor_tree::math::parse`].
pub const ARITHMETIC_RULES: &str = "\
sub(<x>,<x>) -> 0
sub(<x>,0) -> <x>
add(<x>,0) -> <x>
add(0,<x>) -> <x>
add(<x>,<x>) -> mul(2,<x>)
div(<x>,<x>) -> 1
div(0,<x>) -> 0
mul(<x>,0) -> 0
mul(0,<x>) -> 0
mul(<x>,1) -> <x>
mul(1,<x>) -> <x>
mul(<x>,<x>) -> pow(<x>,2)
pow(<x>,0) -> 1
pow(0,<x>) -> 0
pow(<x>,1) -> <x>
pow(1,<x>) -> 1
";

/// The compiled [`ARITHMETIC_RULES`].
///
/// ```
/// use arbor_rewrite::{TreeRewriter, rules::ARITHMETIC};
///
/// let mut tree = arbor_tree::math::parse("(x - x) * y + z * 1").unwrap();
/// ARITHMETIC.rewrite(&mut tree);
/// assert_eq!(tree.to_string(), "z");
/// ```
pub static ARITHMETIC: LazyLock<RuleSet<String>> = LazyLock::new(|| {
    RuleSet::parse(ARITHMETIC_RULES).expect("the arithmetic rules are well-formed")
});

/// An ordered list of rewrite rules, applied until none of them matches.
#[derive(Debug, Clone)]
pub struct RuleSet<V> {
    rules: Vec<TreeRewriteRule<V>>,
}

impl RuleSet<String> {
    pub fn parse(text: &str) -> Result<Self, RuleError> {
        Self::parse_with(text, ValueMapping::default())
    }
}

impl<V> RuleSet<V> {
    pub fn new(rules: Vec<TreeRewriteRule<V>>) -> Self {
        Self { rules }
    }

    /// Parses one rule per line. Blank lines and lines starting with `#` are
    /// skipped; errors carry the (1-based) line number.
    pub fn parse_with(text: &str, values: ValueMapping<V>) -> Result<Self, RuleError> {
        text.lines()
            .enumerate()
            .map(|(index, line)| (index + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty() && !line.starts_with(COMMENT))
            .map(|(line, rule)| {
                TreeRewriteRule::compile_with(rule, values.clone()).map_err(|error| {
                    RuleError::Line {
                        line,
                        error: Box::new(error),
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self::new)
    }

    pub fn rules(&self) -> &[TreeRewriteRule<V>] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn push(&mut self, rule: TreeRewriteRule<V>) {
        self.rules.push(rule);
    }
}

impl<V: Clone + PartialEq> TreeRewriter<V> for RuleSet<V> {
    fn rewrite_limited(&self, tree: &mut TreeNode<V>, limit: usize) -> usize {
        rewrite_all(tree, limit, &self.rules)
    }
}

impl<V> Default for RuleSet<V> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<V> FromIterator<TreeRewriteRule<V>> for RuleSet<V> {
    fn from_iter<I: IntoIterator<Item = TreeRewriteRule<V>>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<V> Extend<TreeRewriteRule<V>> for RuleSet<V> {
    fn extend<I: IntoIterator<Item = TreeRewriteRule<V>>>(&mut self, iter: I) {
        self.rules.extend(iter);
    }
}

impl<V> fmt::Display for RuleSet<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.rules.iter().join("\n"))
    }
}

impl FromStr for RuleSet<String> {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
