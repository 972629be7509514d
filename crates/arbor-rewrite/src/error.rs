use arbor_tree::ParseError;
use miette::Diagnostic;
use smol_str::SmolStr;
use thiserror::Error;

#[allow(unused_assignments)]
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum PatternError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),
    #[error("Variable node `<{name}>` is not a leaf: {subtree}")]
    #[diagnostic(
        code(arbor_rewrite::pattern::non_leaf_variable),
        help("Variables stand for whole sub-trees and can't have children.")
    )]
    NonLeafVariable { name: SmolStr, subtree: String },
    #[error("Variable is not a valid identifier: `{0}`")]
    #[diagnostic(
        code(arbor_rewrite::pattern::invalid_variable),
        help("Variable names start with a letter or `_`, followed by letters, digits or `_`.")
    )]
    InvalidVariable(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum RuleError {
    #[error("Invalid rewrite rule; missing separator `->`: {0}")]
    #[diagnostic(code(arbor_rewrite::rule::missing_separator))]
    MissingSeparator(String),
    #[error("Invalid rewrite rule; found {count} separators `->`: {rule}")]
    #[diagnostic(code(arbor_rewrite::rule::ambiguous_separator))]
    AmbiguousSeparator { count: usize, rule: String },
    #[error(transparent)]
    #[diagnostic(transparent)]
    Pattern(#[from] PatternError),
    #[error("Invalid rewrite rule on line {line}: {error}")]
    #[diagnostic(code(arbor_rewrite::rule::line))]
    Line {
        line: usize,
        #[source]
        error: Box<RuleError>,
    },
}

/// Any error raised while compiling patterns, rules or rule sets.
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum Error {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Pattern(#[from] PatternError),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Rule(#[from] RuleError),
}
