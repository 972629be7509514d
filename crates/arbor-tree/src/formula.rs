//! A configurable operator-precedence parser turning token streams into trees.
//!
//! The grammar is fixed, the tokens are not: every syntactic role is decided
//! by a predicate configured through [`FormulaParser::builder`].
//!
//! ```text
//! expr    := level_0
//! level_i := level_i+1 ( op_i level_i+1 )*      (left-associative)
//! level_n := unary? primary
//! primary := "(" expr ")"
//!          | function "(" expr ( "," expr )* ")"
//!          | identifier
//! ```
//!
//! Parentheses and function calls may be nested at most
//! [`DEFAULT_MAX_DEPTH`] levels deep unless configured otherwise with
//! [`FormulaParserBuilder::max_depth`].
use std::collections::BTreeMap;
use std::fmt::Display;
use std::iter::{Enumerate, Peekable};

use miette::Diagnostic;
use thiserror::Error;

use crate::node::TreeNode;

pub const DEFAULT_MAX_DEPTH: usize = 128;

/// The role a token was recognized in, handed to the token mapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenCategory {
    UnaryOperator,
    BinaryOperator,
    Function,
    Identifier,
}

#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum FormulaError {
    #[error("Unexpected token `{token}` at position {position}")]
    #[diagnostic(code(arbor_tree::formula::unexpected_token))]
    UnexpectedToken { token: String, position: usize },
    #[error("Unexpected end of input at position {position}, expected {expected}")]
    #[diagnostic(code(arbor_tree::formula::unexpected_end))]
    UnexpectedEnd {
        position: usize,
        expected: &'static str,
    },
    #[error("Nesting deeper than {limit} levels at position {position}")]
    #[diagnostic(code(arbor_tree::formula::too_deep))]
    TooDeep { position: usize, limit: usize },
}

type Predicate<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;

fn never<T>() -> Predicate<T> {
    Box::new(|_| false)
}

/// Returns a predicate matching tokens whose text is one of `symbols`.
pub fn any_of<T: AsRef<str>>(
    symbols: &'static [&'static str],
) -> impl Fn(&T) -> bool + Send + Sync {
    move |token| symbols.contains(&token.as_ref())
}

pub struct FormulaParser<T> {
    left_paren: Predicate<T>,
    right_paren: Predicate<T>,
    separator: Predicate<T>,
    unary_operators: Predicate<T>,
    /// Binary operator predicates, ordered from lowest to highest precedence.
    binary_operators: Vec<Vec<Predicate<T>>>,
    identifiers: Predicate<T>,
    functions: Predicate<T>,
    max_depth: usize,
}

impl<T> FormulaParser<T> {
    pub fn builder() -> FormulaParserBuilder<T> {
        FormulaParserBuilder::default()
    }

    /// Parses `tokens` into a tree, converting every consumed token with
    /// `mapper`. Parentheses and separators shape the tree but never become
    /// nodes themselves.
    ///
    /// ```
    /// use arbor_tree::formula::{FormulaParser, any_of};
    ///
    /// let parser = FormulaParser::<&str>::builder()
    ///     .left_paren(|t| *t == "(")
    ///     .right_paren(|t| *t == ")")
    ///     .separator(|t| *t == ",")
    ///     .unary_operators(any_of(&["-"]))
    ///     .binary_operators(|ops| ops.add(1, any_of(&["+", "-"])).add(2, any_of(&["*", "/"])))
    ///     .identifiers(|t| t.chars().all(char::is_alphanumeric))
    ///     .functions(any_of(&["sin", "max"]))
    ///     .build();
    ///
    /// let tree = parser
    ///     .parse("x * x + sin ( z )".split_whitespace(), |t, _| t.to_string())
    ///     .unwrap();
    /// assert_eq!(tree.to_string(), "+(*(x,x),sin(z))");
    /// ```
    pub fn parse<I, F, V>(&self, tokens: I, mapper: F) -> Result<TreeNode<V>, FormulaError>
    where
        I: IntoIterator<Item = T>,
        F: FnMut(&T, TokenCategory) -> V,
        T: Display,
    {
        let mut state = State {
            parser: self,
            tokens: tokens.into_iter().enumerate().peekable(),
            mapper,
            consumed: 0,
            depth: 0,
        };

        let tree = state.expr(0)?;
        match state.tokens.next() {
            Some((position, token)) => Err(FormulaError::UnexpectedToken {
                token: token.to_string(),
                position,
            }),
            None => Ok(tree),
        }
    }

    fn is_binary_operator(&self, level: usize, token: &T) -> bool {
        self.binary_operators
            .get(level)
            .is_some_and(|predicates| predicates.iter().any(|predicate| predicate(token)))
    }
}

struct State<'p, T, I: Iterator<Item = T>, F> {
    parser: &'p FormulaParser<T>,
    tokens: Peekable<Enumerate<I>>,
    mapper: F,
    consumed: usize,
    depth: usize,
}

impl<T, I, F, V> State<'_, T, I, F>
where
    T: Display,
    I: Iterator<Item = T>,
    F: FnMut(&T, TokenCategory) -> V,
{
    fn expr(&mut self, level: usize) -> Result<TreeNode<V>, FormulaError> {
        if level == self.parser.binary_operators.len() {
            return self.unary();
        }

        let mut lhs = self.expr(level + 1)?;
        while let Some(operator) =
            self.next_if(|parser, token| parser.is_binary_operator(level, token))
        {
            let rhs = self.expr(level + 1)?;
            lhs = TreeNode::of((self.mapper)(&operator, TokenCategory::BinaryOperator))
                .with(lhs)
                .with(rhs);
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<TreeNode<V>, FormulaError> {
        match self.next_if(|parser, token| (parser.unary_operators)(token)) {
            Some(operator) => {
                let operand = self.primary()?;
                let tree = TreeNode::of((self.mapper)(&operator, TokenCategory::UnaryOperator));
                Ok(tree.with(operand))
            }
            None => self.primary(),
        }
    }

    fn primary(&mut self) -> Result<TreeNode<V>, FormulaError> {
        let (position, token) = self.next("an expression")?;
        let parser = self.parser;

        if (parser.left_paren)(&token) {
            self.descend(position)?;
            let tree = self.expr(0)?;
            self.expect_right_paren()?;
            self.depth -= 1;
            return Ok(tree);
        }

        let is_call = (parser.functions)(&token)
            && self
                .tokens
                .peek()
                .is_some_and(|(_, next)| (parser.left_paren)(next));
        if is_call {
            self.descend(position)?;
            self.tokens.next();
            self.consumed += 1;
            let mut tree = TreeNode::of((self.mapper)(&token, TokenCategory::Function));
            loop {
                tree = tree.with(self.expr(0)?);
                if self.next_if(|parser, token| (parser.separator)(token)).is_none() {
                    break;
                }
            }
            self.expect_right_paren()?;
            self.depth -= 1;
            return Ok(tree);
        }

        if (parser.identifiers)(&token) || (parser.functions)(&token) {
            return Ok(TreeNode::of((self.mapper)(&token, TokenCategory::Identifier)));
        }

        Err(FormulaError::UnexpectedToken {
            token: token.to_string(),
            position,
        })
    }

    fn descend(&mut self, position: usize) -> Result<(), FormulaError> {
        if self.depth == self.parser.max_depth {
            return Err(FormulaError::TooDeep {
                position,
                limit: self.parser.max_depth,
            });
        }
        self.depth += 1;
        Ok(())
    }

    fn expect_right_paren(&mut self) -> Result<(), FormulaError> {
        let (position, token) = self.next("`)`")?;
        if (self.parser.right_paren)(&token) {
            Ok(())
        } else {
            Err(FormulaError::UnexpectedToken {
                token: token.to_string(),
                position,
            })
        }
    }

    fn next(&mut self, expected: &'static str) -> Result<(usize, T), FormulaError> {
        let next = self.tokens.next().ok_or(FormulaError::UnexpectedEnd {
            position: self.consumed,
            expected,
        })?;
        self.consumed += 1;
        Ok(next)
    }

    fn next_if(&mut self, predicate: impl Fn(&FormulaParser<T>, &T) -> bool) -> Option<T> {
        let parser = self.parser;
        let (_, token) = self.tokens.next_if(|(_, token)| predicate(parser, token))?;
        self.consumed += 1;
        Some(token)
    }
}

/// Collects binary operator predicates by precedence, see
/// [`FormulaParserBuilder::binary_operators`].
pub struct BinaryOperators<T> {
    levels: BTreeMap<u32, Vec<Predicate<T>>>,
}

impl<T> BinaryOperators<T> {
    /// Registers operators at `precedence`; higher values bind tighter.
    /// Operators added with the same precedence share one level.
    pub fn add(
        mut self,
        precedence: u32,
        operators: impl Fn(&T) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.levels
            .entry(precedence)
            .or_default()
            .push(Box::new(operators));
        self
    }
}

pub struct FormulaParserBuilder<T> {
    left_paren: Predicate<T>,
    right_paren: Predicate<T>,
    separator: Predicate<T>,
    unary_operators: Predicate<T>,
    binary_operators: Vec<Vec<Predicate<T>>>,
    identifiers: Predicate<T>,
    functions: Predicate<T>,
    max_depth: usize,
}

impl<T> Default for FormulaParserBuilder<T> {
    fn default() -> Self {
        Self {
            left_paren: never(),
            right_paren: never(),
            separator: never(),
            unary_operators: never(),
            binary_operators: Vec::new(),
            identifiers: never(),
            functions: never(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl<T> FormulaParserBuilder<T> {
    pub fn left_paren(mut self, predicate: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        self.left_paren = Box::new(predicate);
        self
    }

    pub fn right_paren(mut self, predicate: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        self.right_paren = Box::new(predicate);
        self
    }

    /// The token separating function arguments.
    pub fn separator(mut self, predicate: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        self.separator = Box::new(predicate);
        self
    }

    pub fn unary_operators(
        mut self,
        predicate: impl Fn(&T) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.unary_operators = Box::new(predicate);
        self
    }

    /// Configures the binary operators. Replaces any previous configuration.
    pub fn binary_operators(
        mut self,
        configure: impl FnOnce(BinaryOperators<T>) -> BinaryOperators<T>,
    ) -> Self {
        let operators = configure(BinaryOperators {
            levels: BTreeMap::new(),
        });
        self.binary_operators = operators.levels.into_values().collect();
        self
    }

    /// Identifiers are the atoms of a formula: variables, constants and numbers.
    pub fn identifiers(mut self, predicate: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        self.identifiers = Box::new(predicate);
        self
    }

    pub fn functions(mut self, predicate: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        self.functions = Box::new(predicate);
        self
    }

    /// Limits how deep parentheses and function calls may nest.
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn build(self) -> FormulaParser<T> {
        FormulaParser {
            left_paren: self.left_paren,
            right_paren: self.right_paren,
            separator: self.separator,
            unary_operators: self.unary_operators,
            binary_operators: self.binary_operators,
            identifiers: self.identifiers,
            functions: self.functions,
            max_depth: self.max_depth,
        }
    }
}
