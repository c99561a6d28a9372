//! Lexer for GraphQL query text.
//!
//! Tokenizes an executable document into spanned tokens. Commas and `#`
//! comments are insignificant in GraphQL and are consumed as trivia
//! alongside whitespace.

use std::fmt;

use chumsky::prelude::*;

/// A token in a GraphQL executable document.
#[derive(Debug, Clone, PartialEq)]
pub enum Token<'src> {
    // ========================================================================
    // Keywords
    // ========================================================================
    Query,
    Mutation,
    Subscription,
    Fragment,
    On,
    True,
    False,
    Null,

    // ========================================================================
    // Literals
    // ========================================================================
    Name(&'src str),
    IntLit(&'src str),
    FloatLit(&'src str),
    StringLit(&'src str),

    // ========================================================================
    // Punctuators
    // ========================================================================
    Dollar,
    Bang,
    LParen,
    RParen,
    Spread,
    Colon,
    Eq,
    At,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Query => write!(f, "query"),
            Token::Mutation => write!(f, "mutation"),
            Token::Subscription => write!(f, "subscription"),
            Token::Fragment => write!(f, "fragment"),
            Token::On => write!(f, "on"),
            Token::True => write!(f, "true"),
            Token::False => write!(f, "false"),
            Token::Null => write!(f, "null"),
            Token::Name(s) => write!(f, "{s}"),
            Token::IntLit(s) | Token::FloatLit(s) => write!(f, "{s}"),
            Token::StringLit(s) => write!(f, "\"{s}\""),
            Token::Dollar => write!(f, "$"),
            Token::Bang => write!(f, "!"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Spread => write!(f, "..."),
            Token::Colon => write!(f, ":"),
            Token::Eq => write!(f, "="),
            Token::At => write!(f, "@"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::LBrace => write!(f, "{{"),
            Token::RBrace => write!(f, "}}"),
        }
    }
}

/// Map a lexed identifier to its keyword token, or keep it as a name.
fn keyword_or_name(ident: &str) -> Token<'_> {
    match ident {
        "query" => Token::Query,
        "mutation" => Token::Mutation,
        "subscription" => Token::Subscription,
        "fragment" => Token::Fragment,
        "on" => Token::On,
        "true" => Token::True,
        "false" => Token::False,
        "null" => Token::Null,
        _ => Token::Name(ident),
    }
}

/// Create the lexer.
///
/// Returns a parser that tokenizes query text into a sequence of tokens
/// with span information, skipping whitespace, commas, and comments.
pub fn lexer<'src>(
) -> impl Parser<'src, &'src str, Vec<(Token<'src>, SimpleSpan)>, extra::Err<Rich<'src, char>>> {
    // Names: letter or underscore, then alphanumeric or underscore
    let name = text::ident().map(keyword_or_name);

    // String literals: "..." (block strings and escapes are out of subset)
    let string_lit = just('"')
        .ignore_then(none_of('"').repeated().to_slice())
        .then_ignore(just('"'))
        .map(Token::StringLit);

    // Numbers: optional sign, digits, optional fraction, optional exponent
    let number = just('-')
        .or_not()
        .then(text::digits(10))
        .then(just('.').then(text::digits(10)).or_not())
        .then(
            one_of("eE")
                .then(one_of("+-").or_not())
                .then(text::digits(10))
                .or_not(),
        )
        .to_slice()
        .map(|s: &str| {
            if s.contains(['.', 'e', 'E']) {
                Token::FloatLit(s)
            } else {
                Token::IntLit(s)
            }
        });

    // Punctuators (multi-char first)
    let symbol = choice((
        just("...").to(Token::Spread),
        just('$').to(Token::Dollar),
        just('!').to(Token::Bang),
        just('(').to(Token::LParen),
        just(')').to(Token::RParen),
        just(':').to(Token::Colon),
        just('=').to(Token::Eq),
        just('@').to(Token::At),
        just('[').to(Token::LBracket),
        just(']').to(Token::RBracket),
        just('{').to(Token::LBrace),
        just('}').to(Token::RBrace),
    ));

    // Comments run to end of line; commas are insignificant separators
    let comment = just('#')
        .then(any().and_is(just('\n').not()).repeated())
        .ignored();
    let trivia = comment.or(just(',').ignored());

    let token = choice((name, string_lit, number, symbol)).map_with(|tok, e| (tok, e.span()));

    token
        .padded_by(trivia.padded().repeated())
        .padded()
        .repeated()
        .collect()
        .padded_by(trivia.padded().repeated())
        .padded()
        .then_ignore(end())
}

/// Lex query text into tokens.
///
/// Returns Ok with the token list on success, or Err with the lex errors.
pub fn lex(source: &str) -> Result<Vec<(Token<'_>, SimpleSpan)>, Vec<Rich<'_, char>>> {
    let (tokens, errs) = lexer().parse(source).into_output_errors();
    if errs.is_empty() {
        Ok(tokens.unwrap_or_default())
    } else {
        Err(errs)
    }
}
