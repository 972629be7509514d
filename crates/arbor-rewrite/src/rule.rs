use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use arbor_tree::{Tree, TreeNode};
use tracing::debug;

use crate::error::RuleError;
use crate::pattern::TreePattern;
use crate::rewriter::TreeRewriter;

const SEPARATOR: &str = "->";

type Equals<V> = Arc<dyn Fn(&V, &str) -> bool + Send + Sync>;
type FromLiteral<V> = Arc<dyn Fn(&str) -> V + Send + Sync>;

/// Relates the tree values of a rewrite rule to the literals of its pattern
/// and template.
pub struct ValueMapping<V> {
    equals: Equals<V>,
    from_literal: FromLiteral<V>,
}

impl<V> ValueMapping<V> {
    /// `equals` decides whether a tree value matches a pattern literal,
    /// `from_literal` creates the tree values for the template literals.
    pub fn new<E, L>(equals: E, from_literal: L) -> Self
    where
        V: 'static,
        E: Fn(&V, &str) -> bool + Send + Sync + 'static,
        L: Fn(&str) -> V + Send + Sync + 'static,
    {
        Self {
            equals: Arc::new(equals),
            from_literal: Arc::new(from_literal),
        }
    }

    /// Matches values by their [`Display`](fmt::Display) text.
    pub fn display<L>(from_literal: L) -> Self
    where
        V: fmt::Display + 'static,
        L: Fn(&str) -> V + Send + Sync + 'static,
    {
        Self::new(|value: &V, literal: &str| value.to_string() == literal, from_literal)
    }

    pub fn equals(&self, value: &V, literal: &str) -> bool {
        (self.equals)(value, literal)
    }

    pub fn from_literal(&self, literal: &str) -> V {
        (self.from_literal)(literal)
    }
}

impl<V> Clone for ValueMapping<V> {
    fn clone(&self) -> Self {
        Self {
            equals: Arc::clone(&self.equals),
            from_literal: Arc::clone(&self.from_literal),
        }
    }
}

impl Default for ValueMapping<String> {
    fn default() -> Self {
        Self::new(
            |value: &String, literal: &str| value == literal,
            |literal: &str| literal.to_string(),
        )
    }
}

impl<V> fmt::Debug for ValueMapping<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueMapping").finish_non_exhaustive()
    }
}

/// A rewrite rule `pattern -> template`.
///
/// Applying the rule replaces a sub-tree matching the pattern with the
/// template, where the variables of the template are substituted with the
/// sub-trees bound by the match.
///
/// ```
/// use arbor_rewrite::{TreeRewriteRule, TreeRewriter};
/// use arbor_tree::TreeNode;
///
/// let rule = TreeRewriteRule::compile("add(<x>,0) -> <x>").unwrap();
/// let mut tree = TreeNode::parse("add(add(y,0),0)").unwrap();
///
/// assert!(rule.rewrite(&mut tree));
/// assert_eq!(tree.to_string(), "y");
/// assert!(!rule.rewrite(&mut tree));
/// ```
#[derive(Debug, Clone)]
pub struct TreeRewriteRule<V> {
    pattern: TreePattern,
    template: TreePattern,
    values: ValueMapping<V>,
}

impl TreeRewriteRule<String> {
    /// Compiles a rule of the form `pattern -> template`.
    pub fn compile(rule: &str) -> Result<Self, RuleError> {
        Self::compile_with(rule, ValueMapping::default())
    }
}

impl<V> TreeRewriteRule<V> {
    pub fn new(pattern: TreePattern, template: TreePattern, values: ValueMapping<V>) -> Self {
        Self {
            pattern,
            template,
            values,
        }
    }

    /// Compiles a rule of the form `pattern -> template` for trees holding
    /// values of type `V`.
    pub fn compile_with(rule: &str, values: ValueMapping<V>) -> Result<Self, RuleError> {
        let parts: Vec<_> = rule.split(SEPARATOR).collect();
        match parts.as_slice() {
            [_] => Err(RuleError::MissingSeparator(rule.to_string())),
            [pattern, template] => Ok(Self::new(
                TreePattern::compile(pattern.trim())?,
                TreePattern::compile(template.trim())?,
                values,
            )),
            _ => Err(RuleError::AmbiguousSeparator {
                count: parts.len() - 1,
                rule: rule.to_string(),
            }),
        }
    }

    pub fn pattern(&self) -> &TreePattern {
        &self.pattern
    }

    pub fn template(&self) -> &TreePattern {
        &self.template
    }

    /// Rewrites the first sub-tree of `tree`, in breadth-first order, that
    /// matches the pattern. Returns `false` if there is no such sub-tree.
    pub fn apply(&self, tree: &mut TreeNode<V>) -> bool
    where
        V: Clone + PartialEq,
    {
        let replacement = {
            let equals = |value: &V, literal: &str| self.values.equals(value, literal);
            self.pattern
                .matcher_with(tree.root(), equals)
                .next()
                .map(|found| {
                    let expanded = self
                        .template
                        .expand(&found.bindings, |literal| self.values.from_literal(literal));
                    (found.tree.path(), expanded)
                })
        };

        match replacement {
            Some((path, expanded)) => {
                debug!(rule = %self, path = %path, "rewrite");
                tree.replace_at_path(&path, expanded)
            }
            None => false,
        }
    }
}

impl<V: Clone + PartialEq> TreeRewriter<V> for TreeRewriteRule<V> {
    fn rewrite_limited(&self, tree: &mut TreeNode<V>, limit: usize) -> usize {
        let mut count = 0;
        while count < limit && self.apply(tree) {
            count += 1;
        }
        count
    }
}

impl<V> fmt::Display for TreeRewriteRule<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {SEPARATOR} {}", self.pattern, self.template)
    }
}

impl FromStr for TreeRewriteRule<String> {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::compile(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PatternError;
    use rstest::rstest;

    fn tree(text: &str) -> TreeNode<String> {
        TreeNode::parse(text).unwrap()
    }

    #[rstest]
    #[case("add(<x>,0) -> <x>", "add(add(y,0),0)", "y", 2)]
    #[case("add(<x>,0) -> <x>", "mul(add(y,0),add(z,0))", "mul(y,z)", 2)]
    #[case("add(<x>,0) -> <x>", "mul(y,z)", "mul(y,z)", 0)]
    #[case("sub(<x>,<x>) -> 0", "add(sub(a(b),a(b)),sub(a,b))", "add(0,sub(a,b))", 1)]
    #[case("add(<x>,<x>) -> mul(2,<x>)", "add(sin(x),sin(x))", "mul(2,sin(x))", 1)]
    #[case("neg(neg(<x>)) -> <x>", "neg(neg(neg(neg(z))))", "z", 2)]
    fn test_rewrite(
        #[case] rule: &str,
        #[case] host: &str,
        #[case] expected: &str,
        #[case] rewrites: usize,
    ) {
        let rule = TreeRewriteRule::compile(rule).unwrap();
        let mut tree = tree(host);
        assert_eq!(rule.rewrite_limited(&mut tree, usize::MAX), rewrites);
        assert_eq!(tree.to_string(), expected);
    }

    #[test]
    fn test_fixpoint_is_stable() {
        let rule = TreeRewriteRule::compile("add(<x>,0) -> <x>").unwrap();
        let mut tree = tree("add(add(y,0),0)");
        assert!(rule.rewrite(&mut tree));
        assert_eq!(tree, self::tree("y"));
        assert!(!rule.rewrite(&mut tree));
        assert_eq!(tree, self::tree("y"));
    }

    #[test]
    fn test_replaces_root() {
        let rule = TreeRewriteRule::compile("f(<x>) -> g(<x>,<x>)").unwrap();
        let mut tree = tree("f(h(1))");
        assert!(rule.apply(&mut tree));
        assert_eq!(tree.to_string(), "g(h(1),h(1))");
        assert!(tree.root().is_root());
        assert_eq!(tree.len(), 5);
    }

    #[test]
    fn test_unbound_template_variable_removes_node() {
        let rule = TreeRewriteRule::compile("f(<x>) -> g(<x>,<y>)").unwrap();
        let mut tree = tree("h(f(1),2)");
        assert_eq!(rule.rewrite_limited(&mut tree, 1), 1);
        assert_eq!(tree.to_string(), "h(g(1),2)");
    }

    #[test]
    fn test_unbound_template_root_empties_tree() {
        let rule = TreeRewriteRule::compile("f(<x>) -> <y>").unwrap();
        let mut tree = tree("f(1)");
        assert_eq!(rule.rewrite_limited(&mut tree, 1), 1);
        assert!(tree.is_empty());
    }

    #[rstest]
    #[case(0, 0, "neg(neg(neg(neg(neg(neg(z))))))")]
    #[case(1, 1, "neg(neg(neg(neg(z))))")]
    #[case(5, 3, "z")]
    fn test_rewrite_limit(#[case] limit: usize, #[case] rewrites: usize, #[case] expected: &str) {
        let rule = TreeRewriteRule::compile("neg(neg(<x>)) -> <x>").unwrap();
        let mut tree = tree("neg(neg(neg(neg(neg(neg(z))))))");
        assert_eq!(rule.rewrite_limited(&mut tree, limit), rewrites);
        assert_eq!(tree.to_string(), expected);
    }

    #[test]
    fn test_limit_bounds_endless_rule() {
        let rule = TreeRewriteRule::compile("f(<x>,<y>) -> f(<y>,<x>)").unwrap();
        let mut tree = tree("g(f(1,2))");
        assert_eq!(rule.rewrite_limited(&mut tree, 3), 3);
        assert_eq!(tree.to_string(), "g(f(2,1))");
    }

    #[rstest]
    #[case("add(<x>,0)", RuleError::MissingSeparator("add(<x>,0)".to_string()))]
    #[case(
        "a -> b -> c",
        RuleError::AmbiguousSeparator { count: 2, rule: "a -> b -> c".to_string() }
    )]
    #[case(
        "f(<x>(1)) -> <x>",
        RuleError::Pattern(PatternError::NonLeafVariable {
            name: "x".into(),
            subtree: "<x>(1)".to_string(),
        })
    )]
    fn test_compile_errors(#[case] rule: &str, #[case] expected: RuleError) {
        assert_eq!(TreeRewriteRule::compile(rule).unwrap_err(), expected);
    }

    #[test]
    fn test_display() {
        let rule: TreeRewriteRule<String> = "  mul( <x> , 1 )->  <x> ".parse().unwrap();
        assert_eq!(rule.to_string(), "mul(<x>,1) -> <x>");
        assert_eq!(rule.pattern().variables().len(), 1);
        assert_eq!(rule.template().tree().len(), 1);
    }

    #[test]
    fn test_custom_values() {
        let values = ValueMapping::display(|literal: &str| literal.parse::<i64>().unwrap_or_default());
        let rule = TreeRewriteRule::compile_with("3(<x>,<x>) -> 4(<x>,0)", values).unwrap();

        let mut tree = TreeNode::of(1).with(
            TreeNode::of(3)
                .with(TreeNode::of(7))
                .with(TreeNode::of(7)),
        );
        assert!(rule.rewrite(&mut tree));
        assert_eq!(tree.to_string(), "1(4(7,0))");
    }
}
