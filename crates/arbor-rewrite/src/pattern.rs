//! Tree patterns with free variables.
//!
//! A pattern is written in the parentheses format, where a leaf of the form
//! `<name>` is a variable standing for an arbitrary sub-tree:
//!
//! ```text
//! add(<x>,mul(<y>,<x>))
//! ```
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use arbor_tree::{Node, Tree, TreeError, TreeNode};
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::error::PatternError;
use crate::matcher::TreeMatcher;

/// Sub-trees bound to the variables of a pattern by one successful match.
pub type Bindings<T> = FxHashMap<SmolStr, T>;

/// A single node of a compiled pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Decl {
    Literal(String),
    Variable(SmolStr),
}

impl Decl {
    /// Classifies the (already unescaped) text of a pattern node.
    pub fn parse(text: &str) -> Result<Self, PatternError> {
        match text.strip_prefix('<').and_then(|t| t.strip_suffix('>')) {
            Some(name) if is_identifier(name) => Ok(Decl::Variable(SmolStr::new(name))),
            Some(_) => Err(PatternError::InvalidVariable(text.to_string())),
            None => Ok(Decl::Literal(text.to_string())),
        }
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, Decl::Variable(_))
    }
}

impl fmt::Display for Decl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decl::Literal(value) => write!(f, "{value}"),
            Decl::Variable(name) => write!(f, "<{name}>"),
        }
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// A compiled tree pattern.
///
/// ```
/// use arbor_rewrite::TreePattern;
/// use arbor_tree::TreeNode;
///
/// let pattern = TreePattern::compile("add(<x>,<x>)").unwrap();
/// let tree = TreeNode::parse("add(sin(y),sin(y))").unwrap();
///
/// let bindings = pattern.match_tree(tree.root()).unwrap();
/// assert_eq!(bindings["x"].to_tree_node().to_string(), "sin(y)");
/// assert!(!pattern.matches(TreeNode::parse("add(1,2)").unwrap().root()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreePattern {
    pattern: TreeNode<Decl>,
    variables: BTreeSet<SmolStr>,
}

impl TreePattern {
    /// Compiles the textual form of a pattern. The empty text is the pattern
    /// matching a single node with an empty value.
    pub fn compile(text: &str) -> Result<Self, PatternError> {
        let mut invalid = None;
        let mut pattern = TreeNode::parse_with(text, |value| {
            Decl::parse(value).unwrap_or_else(|error| {
                invalid.get_or_insert(error);
                Decl::Literal(value.to_string())
            })
        })?;

        if let Some(error) = invalid {
            return Err(error);
        }
        if pattern.value().is_none() {
            pattern = TreeNode::of(Decl::Literal(String::new()));
        }

        Self::new(pattern)
    }

    /// Wraps an already built pattern tree, checking that every variable is a leaf.
    pub fn new(pattern: TreeNode<Decl>) -> Result<Self, PatternError> {
        let mut variables = BTreeSet::new();

        for node in pattern.root().preorder() {
            if let Some(Decl::Variable(name)) = node.value() {
                if !node.is_leaf() {
                    return Err(PatternError::NonLeafVariable {
                        name: name.clone(),
                        subtree: node.to_parentheses_string(),
                    });
                }
                variables.insert(name.clone());
            }
        }

        Ok(Self { pattern, variables })
    }

    /// The variable names used by this pattern, sorted.
    pub fn variables(&self) -> &BTreeSet<SmolStr> {
        &self.variables
    }

    pub fn tree(&self) -> &TreeNode<Decl> {
        &self.pattern
    }

    /// Tests whether the whole `tree` matches, comparing values by their
    /// [`Display`](fmt::Display) text.
    pub fn matches<'a, T>(&self, tree: T) -> bool
    where
        T: Tree<'a>,
        T::Value: PartialEq + fmt::Display,
    {
        self.match_tree(tree).is_some()
    }

    pub fn matches_with<'a, T, F>(&self, tree: T, equals: F) -> bool
    where
        T: Tree<'a>,
        T::Value: PartialEq,
        F: Fn(&T::Value, &str) -> bool,
    {
        self.match_tree_with(tree, equals).is_some()
    }

    /// Matches the whole `tree` and returns the variable bindings on success.
    pub fn match_tree<'a, T>(&self, tree: T) -> Option<Bindings<T>>
    where
        T: Tree<'a>,
        T::Value: PartialEq + fmt::Display,
    {
        self.match_tree_with(tree, display_equals)
    }

    /// Matches the whole `tree`, comparing the values of literal pattern
    /// nodes with `equals`. Bound variables are compared structurally.
    pub fn match_tree_with<'a, T, F>(&self, tree: T, equals: F) -> Option<Bindings<T>>
    where
        T: Tree<'a>,
        T::Value: PartialEq,
        F: Fn(&T::Value, &str) -> bool,
    {
        let mut bindings = Bindings::default();
        match_node(self.pattern.root(), tree, &mut bindings, &equals).then_some(bindings)
    }

    /// Lazily enumerates every sub-tree of `tree` matching this pattern,
    /// in breadth-first order.
    pub fn matcher<'a, T>(&self, tree: T) -> TreeMatcher<'_, T, fn(&T::Value, &str) -> bool>
    where
        T: Tree<'a>,
        T::Value: PartialEq + fmt::Display,
    {
        let equals: fn(&T::Value, &str) -> bool = display_equals::<T::Value>;
        TreeMatcher::new(self, tree, equals)
    }

    pub fn matcher_with<'a, T, F>(&self, tree: T, equals: F) -> TreeMatcher<'_, T, F>
    where
        T: Tree<'a>,
        T::Value: PartialEq,
        F: Fn(&T::Value, &str) -> bool,
    {
        TreeMatcher::new(self, tree, equals)
    }

    /// Instantiates this pattern as a template.
    ///
    /// Variables are replaced by copies of their bound sub-trees, literals
    /// are converted with `from_literal`. A variable without binding is left
    /// out of the result; if it is the root, the result is the empty tree.
    pub fn expand<'a, T, F>(&self, bindings: &Bindings<T>, mut from_literal: F) -> TreeNode<T::Value>
    where
        T: Tree<'a>,
        T::Value: Clone,
        F: FnMut(&str) -> T::Value,
    {
        expand_node(self.pattern.root(), bindings, &mut from_literal)
            .ok()
            .flatten()
            .unwrap_or_default()
    }
}

fn display_equals<V: fmt::Display>(value: &V, literal: &str) -> bool {
    value.to_string() == literal
}

/// Walks `pattern` and `node` in lockstep preorder, binding variables on
/// their first occurrence.
fn match_node<'a, T, F>(
    pattern: Node<'_, Decl>,
    node: T,
    bindings: &mut Bindings<T>,
    equals: &F,
) -> bool
where
    T: Tree<'a>,
    T::Value: PartialEq,
    F: Fn(&T::Value, &str) -> bool,
{
    let mut stack = vec![(pattern, node)];

    while let Some((pattern, node)) = stack.pop() {
        let literal = match pattern.value() {
            Some(Decl::Variable(name)) => {
                match bindings.get(name) {
                    Some(bound) if !bound.tree_eq(node) => return false,
                    Some(_) => {}
                    None => {
                        bindings.insert(name.clone(), node);
                    }
                }
                continue;
            }
            Some(Decl::Literal(literal)) => literal.as_str(),
            None => "",
        };

        let value_matches = match node.value() {
            Some(value) => equals(value, literal),
            None => literal.is_empty(),
        };
        if !value_matches || pattern.child_count() != node.child_count() {
            return false;
        }
        stack.extend(pattern.children().zip(node.children()).rev());
    }

    true
}

fn expand_node<'a, T, F>(
    template: Node<'_, Decl>,
    bindings: &Bindings<T>,
    from_literal: &mut F,
) -> Result<Option<TreeNode<T::Value>>, TreeError>
where
    T: Tree<'a>,
    T::Value: Clone,
    F: FnMut(&str) -> T::Value,
{
    let text = |decl: Option<&Decl>| match decl {
        Some(Decl::Literal(literal)) => literal.clone(),
        _ => String::new(),
    };

    if let Some(Decl::Variable(name)) = template.value() {
        return Ok(bindings.get(name).map(|bound| TreeNode::from_tree(*bound)));
    }

    let mut expanded = TreeNode::of(from_literal(&text(template.value())));
    let mut stack: Vec<_> = template
        .children()
        .rev()
        .map(|child| (child, expanded.root_id()))
        .collect();

    while let Some((template, parent)) = stack.pop() {
        match template.value() {
            Some(Decl::Variable(name)) => {
                if let Some(bound) = bindings.get(name) {
                    expanded.attach(parent, TreeNode::from_tree(*bound))?;
                }
            }
            decl => {
                let id = expanded.attach_value(parent, from_literal(&text(decl)))?;
                stack.extend(template.children().rev().map(|child| (child, id)));
            }
        }
    }

    Ok(Some(expanded))
}

impl fmt::Display for TreePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.pattern)
    }
}

impl FromStr for TreePattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::compile(s)
    }
}
