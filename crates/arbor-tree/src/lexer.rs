//! Tokenizer for arithmetic formulas such as `2 * sin(x) ^ 2 - 1.5`.
use std::fmt;

use miette::{Diagnostic, SourceSpan};
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::tag,
    character::complete::{alpha1, alphanumeric1, char, digit1, multispace0, one_of},
    combinator::{map, opt, recognize},
    multi::many0,
    sequence::{pair, preceded},
};
use nom_locate::LocatedSpan;
use thiserror::Error;

type Span<'a> = LocatedSpan<&'a str>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Number,
    Identifier,
    Operator,
    LParen,
    RParen,
    Comma,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    /// Byte offset of the token in the tokenized input.
    pub offset: usize,
}

impl Token {
    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}

impl AsRef<str> for Token {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

#[allow(unused_assignments)]
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum LexerError {
    #[error("Unexpected character `{character}` at position {position}")]
    #[diagnostic(code(arbor_tree::lexer::unexpected_character))]
    UnexpectedCharacter {
        character: char,
        position: usize,
        #[source_code]
        src: String,
        #[label("not part of any token")]
        span: SourceSpan,
    },
}

fn token(kind: TokenKind, span: Span) -> Token {
    Token {
        kind,
        text: span.fragment().to_string(),
        offset: span.location_offset(),
    }
}

fn number(input: Span) -> IResult<Span, Token> {
    map(
        recognize(pair(digit1, opt(pair(char('.'), digit1)))),
        |span: Span| token(TokenKind::Number, span),
    )
    .parse(input)
}

fn identifier(input: Span) -> IResult<Span, Token> {
    map(
        recognize(pair(
            alt((alpha1, tag("_"))),
            many0(alt((alphanumeric1, tag("_")))),
        )),
        |span: Span| token(TokenKind::Identifier, span),
    )
    .parse(input)
}

fn punctuation(input: Span) -> IResult<Span, Token> {
    alt((
        map(recognize(one_of("+-*/%^")), |span: Span| {
            token(TokenKind::Operator, span)
        }),
        map(tag("("), |span: Span| token(TokenKind::LParen, span)),
        map(tag(")"), |span: Span| token(TokenKind::RParen, span)),
        map(tag(","), |span: Span| token(TokenKind::Comma, span)),
    ))
    .parse(input)
}

fn next_token(input: Span) -> IResult<Span, Token> {
    preceded(multispace0, alt((number, identifier, punctuation))).parse(input)
}

/// Splits `input` into tokens, skipping whitespace.
///
/// ```
/// use arbor_tree::lexer::{TokenKind, tokenize};
///
/// let tokens = tokenize("max(x, 2.5)").unwrap();
/// let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
/// assert_eq!(kinds, vec![
///     TokenKind::Identifier,
///     TokenKind::LParen,
///     TokenKind::Identifier,
///     TokenKind::Comma,
///     TokenKind::Number,
///     TokenKind::RParen,
/// ]);
/// ```
pub fn tokenize(input: &str) -> Result<Vec<Token>, LexerError> {
    let mut tokens = Vec::new();
    let mut rest = Span::new(input);

    while !rest.fragment().trim_start().is_empty() {
        match next_token(rest) {
            Ok((remaining, token)) => {
                tokens.push(token);
                rest = remaining;
            }
            Err(_) => {
                let skipped = rest.fragment().len() - rest.fragment().trim_start().len();
                let position = rest.location_offset() + skipped;
                let character = input[position..].chars().next().unwrap_or_default();
                return Err(LexerError::UnexpectedCharacter {
                    character,
                    position,
                    src: input.to_string(),
                    span: (position, character.len_utf8()).into(),
                });
            }
        }
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn texts(input: &str) -> Vec<String> {
        tokenize(input)
            .unwrap()
            .into_iter()
            .map(|token| token.text)
            .collect()
    }

    #[rstest]
    #[case("", vec![])]
    #[case("x*x+sin(z)", vec!["x", "*", "x", "+", "sin", "(", "z", ")"])]
    #[case("  1.25 ^ _a1 % b ", vec!["1.25", "^", "_a1", "%", "b"])]
    #[case("-x-1", vec!["-", "x", "-", "1"])]
    #[case("max(a,\n b)", vec!["max", "(", "a", ",", "b", ")"])]
    fn test_tokenize(#[case] input: &str, #[case] expected: Vec<&str>) {
        assert_eq!(texts(input), expected);
    }

    #[test]
    fn test_offsets() {
        let tokens = tokenize("a +  12").unwrap();
        let offsets: Vec<_> = tokens.iter().map(|t| (t.kind, t.offset)).collect();
        assert_eq!(
            offsets,
            vec![
                (TokenKind::Identifier, 0),
                (TokenKind::Operator, 2),
                (TokenKind::Number, 5),
            ]
        );
    }

    #[rstest]
    #[case("a $ b", '$', 2)]
    #[case("1 + ?", '?', 4)]
    #[case("π", 'π', 0)]
    fn test_unexpected_character(#[case] input: &str, #[case] character: char, #[case] position: usize) {
        match tokenize(input) {
            Err(LexerError::UnexpectedCharacter {
                character: c,
                position: p,
                ..
            }) => {
                assert_eq!(c, character);
                assert_eq!(p, position);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
