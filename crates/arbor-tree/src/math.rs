//! Arithmetic formulas, parsed into trees of operation names.
//!
//! Operators are written out as the function names the rewrite rules use:
//! `a + b` becomes `add(a,b)`, `-a` becomes `neg(a)`. Precedence from low to
//! high is `+ -`, `* / %` and `^`; all of them are left-associative and a
//! unary minus binds tighter than any of them.
use std::sync::LazyLock;

use miette::Diagnostic;
use thiserror::Error;

use crate::formula::{FormulaError, FormulaParser, TokenCategory};
use crate::lexer::{self, LexerError, Token, TokenKind};
use crate::node::TreeNode;

/// Names that are parsed as function calls when followed by `(`.
pub const FUNCTIONS: &[&str] = &[
    "abs", "neg", "min", "max", "ceil", "floor", "signum", "rint", "add", "sub", "mul", "div",
    "mod", "pow", "sqr", "sqrt", "cbrt", "hypot", "exp", "log", "log10", "sin", "cos", "tan",
    "asin", "acos", "atan", "sinh", "cosh", "tanh",
];

#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum MathError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Lexer(#[from] LexerError),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Formula(#[from] FormulaError),
}

static PARSER: LazyLock<FormulaParser<Token>> = LazyLock::new(|| {
    FormulaParser::builder()
        .left_paren(|t: &Token| t.is(TokenKind::LParen))
        .right_paren(|t: &Token| t.is(TokenKind::RParen))
        .separator(|t: &Token| t.is(TokenKind::Comma))
        .unary_operators(|t: &Token| t.is(TokenKind::Operator) && t.text == "-")
        .binary_operators(|ops| {
            ops.add(11, operator(&["+", "-"]))
                .add(12, operator(&["*", "/", "%"]))
                .add(13, operator(&["^"]))
        })
        .identifiers(|t: &Token| t.is(TokenKind::Identifier) || t.is(TokenKind::Number))
        .functions(|t: &Token| t.is(TokenKind::Identifier) && FUNCTIONS.contains(&t.text.as_str()))
        .build()
});

fn operator(symbols: &'static [&'static str]) -> impl Fn(&Token) -> bool + Send + Sync + 'static {
    move |t| t.is(TokenKind::Operator) && symbols.contains(&t.text.as_str())
}

fn name(token: &Token, category: TokenCategory) -> String {
    let name = match (category, token.text.as_str()) {
        (TokenCategory::UnaryOperator, "-") => "neg",
        (TokenCategory::BinaryOperator, "+") => "add",
        (TokenCategory::BinaryOperator, "-") => "sub",
        (TokenCategory::BinaryOperator, "*") => "mul",
        (TokenCategory::BinaryOperator, "/") => "div",
        (TokenCategory::BinaryOperator, "%") => "mod",
        (TokenCategory::BinaryOperator, "^") => "pow",
        (_, text) => text,
    };
    name.to_string()
}

/// Parses an arithmetic formula.
///
/// ```
/// let tree = arbor_tree::math::parse("x * x + sin(z) - -1").unwrap();
/// assert_eq!(tree.to_string(), "sub(add(mul(x,x),sin(z)),neg(1))");
/// ```
pub fn parse(text: &str) -> Result<TreeNode<String>, MathError> {
    let tokens = lexer::tokenize(text)?;
    Ok(PARSER.parse(tokens, name)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("x", "x")]
    #[case("1 + 2 * 3", "add(1,mul(2,3))")]
    #[case("(1 + 2) * 3", "mul(add(1,2),3)")]
    #[case("a - b - c", "sub(sub(a,b),c)")]
    #[case("a / b % c", "mod(div(a,b),c)")]
    #[case("2 ^ x ^ 2", "pow(pow(2,x),2)")]
    #[case("-x ^ 2", "pow(neg(x),2)")]
    #[case("-(x + 1)", "neg(add(x,1))")]
    #[case("max(a, min(b, 0.5))", "max(a,min(b,0.5))")]
    #[case("sin(x) * cos(x)", "mul(sin(x),cos(x))")]
    #[case("hypot(x, y) + foo", "add(hypot(x,y),foo)")]
    fn test_parse(#[case] text: &str, #[case] expected: &str) {
        assert_eq!(parse(text).unwrap().to_string(), expected);
    }

    #[rstest]
    #[case("1 +")]
    #[case("foo(x)")]
    #[case("sin(x")]
    #[case("x y")]
    #[case("--x")]
    fn test_formula_errors(#[case] text: &str) {
        assert!(matches!(parse(text), Err(MathError::Formula(_))));
    }

    #[test]
    fn test_deeply_nested_parentheses() {
        let text = format!("{}x{}", "(".repeat(200_000), ")".repeat(200_000));
        assert!(matches!(
            parse(&text),
            Err(MathError::Formula(FormulaError::TooDeep { .. }))
        ));
    }

    #[test]
    fn test_lexer_error() {
        assert!(matches!(parse("x # 1"), Err(MathError::Lexer(_))));
    }

    #[test]
    fn test_error_position() {
        let error = parse("sin(x))").unwrap_err();
        assert_eq!(
            error,
            MathError::Formula(FormulaError::UnexpectedToken {
                token: ")".to_string(),
                position: 4,
            })
        );
    }
}
