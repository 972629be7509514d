//! The parentheses tree format.
//!
//! ```text
//! tree := value [ "(" tree ( "," tree )* ")" ]
//! ```
//!
//! A leaf is written as its bare value, an inner node as
//! `value(child1,child2,...)`. The characters `(`, `)`, `,` and `\` are
//! escaped with `\` wherever they occur inside a value. Unescaped whitespace
//! around a value is not part of it, and an empty or all-whitespace text
//! parses to the empty tree.
use std::iter::Peekable;
use std::str::CharIndices;

use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

use crate::node::{NodeId, TreeNode};
use crate::tree::Tree;

const ESCAPE: char = '\\';
const OPEN: char = '(';
const CLOSE: char = ')';
const SEPARATOR: char = ',';

#[allow(unused_assignments)]
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum ParseError {
    #[error("Unexpected character `{token}` at position {position}")]
    #[diagnostic(
        code(arbor_tree::parentheses::unexpected_token),
        help("Escape `(`, `)`, `,` and `\\` with a backslash when they are part of a value.")
    )]
    UnexpectedToken {
        token: char,
        position: usize,
        #[source_code]
        src: String,
        #[label("unexpected character")]
        span: SourceSpan,
    },
    #[error("Unclosed parenthesis opened at position {position}")]
    #[diagnostic(code(arbor_tree::parentheses::unclosed))]
    Unclosed {
        position: usize,
        #[source_code]
        src: String,
        #[label("opened here")]
        span: SourceSpan,
    },
    #[error("Dangling escape character at position {position}")]
    #[diagnostic(
        code(arbor_tree::parentheses::dangling_escape),
        help("A trailing backslash must itself be escaped as `\\\\`.")
    )]
    DanglingEscape {
        position: usize,
        #[source_code]
        src: String,
        #[label("nothing to escape")]
        span: SourceSpan,
    },
}

impl ParseError {
    /// Byte offset of the offending character.
    pub fn position(&self) -> usize {
        match self {
            ParseError::UnexpectedToken { position, .. }
            | ParseError::Unclosed { position, .. }
            | ParseError::DanglingEscape { position, .. } => *position,
        }
    }
}

/// Parses `text`, converting every unescaped value with `mapper`.
pub fn parse<V, F>(text: &str, mapper: F) -> Result<TreeNode<V>, ParseError>
where
    F: FnMut(&str) -> V,
{
    if text.trim().is_empty() {
        return Ok(TreeNode::new());
    }

    let mut parser = Parser {
        text,
        chars: text.char_indices().peekable(),
        mapper,
    };
    let tree = parser.parse_tree()?;

    match parser.chars.next() {
        Some((position, token)) => Err(parser.unexpected(token, position)),
        None => Ok(tree),
    }
}

struct Parser<'a, F> {
    text: &'a str,
    chars: Peekable<CharIndices<'a>>,
    mapper: F,
}

impl<F> Parser<'_, F> {
    fn parse_tree<V>(&mut self) -> Result<TreeNode<V>, ParseError>
    where
        F: FnMut(&str) -> V,
    {
        let value = self.parse_value()?;
        let mut tree = TreeNode::of((self.mapper)(&value));
        let mut current = tree.root_id();
        // Nodes whose `(` is not closed yet, innermost last.
        let mut open: Vec<(NodeId, usize)> = Vec::new();

        loop {
            let parent = match self.chars.peek() {
                Some(&(position, OPEN)) => {
                    self.chars.next();
                    open.push((current, position));
                    current
                }
                _ => match self.close_until_separator(&mut open)? {
                    Some(parent) => parent,
                    None => return Ok(tree),
                },
            };

            let value = self.parse_value()?;
            current = tree.push_value(parent, (self.mapper)(&value));
        }
    }

    /// Consumes closing parentheses up to the next separator and returns the
    /// node the following sibling belongs to, `None` once the root is closed.
    fn close_until_separator(
        &mut self,
        open: &mut Vec<(NodeId, usize)>,
    ) -> Result<Option<NodeId>, ParseError> {
        while let Some(&(parent, position)) = open.last() {
            match self.chars.next() {
                Some((_, SEPARATOR)) => return Ok(Some(parent)),
                Some((_, CLOSE)) => {
                    self.skip_whitespace();
                    open.pop();
                }
                Some((position, token)) => return Err(self.unexpected(token, position)),
                None => {
                    return Err(ParseError::Unclosed {
                        position,
                        src: self.text.to_string(),
                        span: (position, 1).into(),
                    });
                }
            }
        }
        Ok(None)
    }

    /// Reads one value up to the next unescaped structural character.
    fn parse_value(&mut self) -> Result<String, ParseError> {
        let mut value = String::new();
        let mut significant = 0;

        while let Some(&(position, c)) = self.chars.peek() {
            match c {
                OPEN | CLOSE | SEPARATOR => break,
                ESCAPE => {
                    self.chars.next();
                    let (_, escaped) = self.chars.next().ok_or(ParseError::DanglingEscape {
                        position,
                        src: self.text.to_string(),
                        span: (position, 1).into(),
                    })?;
                    value.push(escaped);
                    significant = value.len();
                }
                c if c.is_whitespace() => {
                    self.chars.next();
                    if !value.is_empty() {
                        value.push(c);
                    }
                }
                c => {
                    self.chars.next();
                    value.push(c);
                    significant = value.len();
                }
            }
        }

        value.truncate(significant);
        Ok(value)
    }

    fn skip_whitespace(&mut self) {
        while self.chars.next_if(|(_, c)| c.is_whitespace()).is_some() {}
    }

    fn unexpected(&self, token: char, position: usize) -> ParseError {
        ParseError::UnexpectedToken {
            token,
            position,
            src: self.text.to_string(),
            span: (position, token.len_utf8()).into(),
        }
    }
}

/// Renders `tree` in the parentheses format. Values are converted with
/// `mapper` and escaped; a node without value is written as the empty string.
pub fn to_string<'a, T, F>(tree: T, mut mapper: F) -> String
where
    T: Tree<'a>,
    F: FnMut(&T::Value) -> String,
{
    enum Step<T> {
        Node(T),
        Separator,
        Close,
    }

    let mut out = String::new();
    let mut stack = vec![Step::Node(tree)];

    while let Some(step) = stack.pop() {
        match step {
            Step::Node(node) => {
                if let Some(value) = node.value() {
                    escape_into(&mapper(value), &mut out);
                }
                if node.is_leaf() {
                    continue;
                }
                out.push(OPEN);
                stack.push(Step::Close);
                for (index, child) in node.children().enumerate().rev() {
                    stack.push(Step::Node(child));
                    if index > 0 {
                        stack.push(Step::Separator);
                    }
                }
            }
            Step::Separator => out.push(SEPARATOR),
            Step::Close => out.push(CLOSE),
        }
    }

    out
}

/// Appends `value` to `out`, escaping structural characters and the
/// whitespace at both ends which the parser would otherwise trim.
pub fn escape_into(value: &str, out: &mut String) {
    let last = value.chars().count().saturating_sub(1);
    for (index, c) in value.chars().enumerate() {
        let edge_whitespace = c.is_whitespace() && (index == 0 || index == last);
        if matches!(c, OPEN | CLOSE | SEPARATOR | ESCAPE) || edge_whitespace {
            out.push(ESCAPE);
        }
        out.push(c);
    }
}

pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    escape_into(value, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn parse_str(text: &str) -> Result<TreeNode<String>, ParseError> {
        parse(text, |value| value.to_string())
    }

    #[rstest]
    #[case::leaf("a")]
    #[case::nested("0(1(4,5),2(6),3(7(10,11),8,9))")]
    #[case::operators("add(mul(x,y),neg(1))")]
    #[case::empty_values("a(,b,)")]
    #[case::escaped_structure("f(\\(,\\),\\,,\\\\)")]
    #[case::unicode("λ(α,β(γ))")]
    fn test_round_trip(#[case] text: &str) {
        let tree = parse_str(text).unwrap();
        assert_eq!(tree.to_string(), text);
    }

    #[rstest]
    #[case::trimmed(" a ( b , c ) ", "a(b,c)")]
    #[case::inner_whitespace("hello world(x)", "hello world(x)")]
    #[case::escaped_whitespace("\\ a\\ (b)", "\\ a\\ (b)")]
    #[case::newlines("a(\n  b,\n  c\n)", "a(b,c)")]
    #[case::after_close("a( b(c) , d ) ", "a(b(c),d)")]
    fn test_whitespace(#[case] text: &str, #[case] expected: &str) {
        assert_eq!(parse_str(text).unwrap().to_string(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("\n\t")]
    fn test_empty(#[case] text: &str) {
        let tree = parse_str(text).unwrap();
        assert!(tree.is_empty());
    }

    #[test]
    fn test_escaped_values() {
        let tree = parse_str("f(a\\,b,\\(x\\))").unwrap();
        let values: Vec<_> = tree
            .root()
            .preorder()
            .filter_map(|node| node.value().cloned())
            .collect();
        assert_eq!(values, vec!["f", "a,b", "(x)"]);
    }

    #[rstest]
    #[case::unclosed("a(", ParseError::Unclosed { position: 1, src: "a(".into(), span: (1, 1).into() })]
    #[case::extra_close("())", ParseError::UnexpectedToken { token: ')', position: 2, src: "())".into(), span: (2, 1).into() })]
    #[case::second_tree("a(b,c)(", ParseError::UnexpectedToken { token: '(', position: 6, src: "a(b,c)(".into(), span: (6, 1).into() })]
    #[case::dangling_escape("a\\", ParseError::DanglingEscape { position: 1, src: "a\\".into(), span: (1, 1).into() })]
    #[case::nested_open("a(b(c)(d))", ParseError::UnexpectedToken { token: '(', position: 6, src: "a(b(c)(d))".into(), span: (6, 1).into() })]
    fn test_errors(#[case] text: &str, #[case] expected: ParseError) {
        let error = parse_str(text).unwrap_err();
        assert_eq!(error.position(), expected.position());
        assert_eq!(error, expected);
    }

    #[test]
    fn test_deeply_nested() {
        let depth = 200_000;
        let text = format!("{}x{}", "a(".repeat(depth), ")".repeat(depth));
        let tree = parse_str(&text).unwrap();
        assert_eq!(tree.len(), depth + 1);
        assert_eq!(tree.to_string(), text);

        let unclosed = format!("{}x", "a(".repeat(depth));
        let error = parse_str(&unclosed).unwrap_err();
        assert_eq!(error.position(), 2 * depth - 1);
    }

    #[test]
    fn test_mapper() {
        let tree = parse("1(2,3(4))", |v| v.parse::<u32>().unwrap()).unwrap();
        let sum: u32 = tree.root().preorder().filter_map(|n| n.value()).sum();
        assert_eq!(sum, 10);
    }

    #[rstest]
    #[case("a,b", "a\\,b")]
    #[case(" x", "\\ x")]
    #[case("x ", "x\\ ")]
    #[case("a b", "a b")]
    #[case("\\", "\\\\")]
    fn test_escape(#[case] value: &str, #[case] expected: &str) {
        assert_eq!(escape(value), expected);
    }
}
