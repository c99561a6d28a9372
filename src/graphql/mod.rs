//! GraphQL query parsing.
//!
//! This module parses the executable-document subset the projection engine
//! needs: operations, aliased fields, arguments, and nested selection sets.
//! The engine parses the same query text that produced the response it is
//! projecting, so it can recover aliases and selected subtrees by walking
//! the AST in lock-step with the data path.
//!
//! Host template tokens (`${...}`) clash with GraphQL syntax and must be
//! stripped with [`munge_host_variables`] before parsing.
//!
//! # Example
//!
//! ```ignore
//! use frameql::graphql;
//!
//! let result = graphql::parse("query { servers { name cpu: load } }");
//! let operation = result.document.as_ref().and_then(|d| d.operation());
//! for diag in &result.diagnostics {
//!     eprintln!("{}", diag);
//! }
//! ```

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod resolve;

use std::fmt;
use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;

pub use ast::{Document, Field, Operation, Selection, SelectionSet};
pub use resolve::{alias_for, descendant_field};

/// Placeholder substituted for host `${...}` tokens before parsing.
pub const VARIABLE_PLACEHOLDER: &str = "PLUGIN_VARIABLE";

static HOST_VARIABLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{[^}]+\}").expect("host variable regex is valid"));

/// Replace host `${...}` template tokens with a fixed placeholder so the
/// query text becomes syntactically valid GraphQL.
pub fn munge_host_variables(query: &str) -> String {
    HOST_VARIABLE
        .replace_all(query, VARIABLE_PLACEHOLDER)
        .to_string()
}

/// Result of parsing a query document.
#[derive(Debug)]
pub struct ParseResult {
    /// The parsed document, if parsing succeeded.
    pub document: Option<Document>,
    /// Diagnostic messages (errors and warnings).
    pub diagnostics: Vec<Diagnostic>,
}

impl ParseResult {
    /// Returns true if parsing succeeded without errors.
    pub fn is_ok(&self) -> bool {
        self.document.is_some() && !self.has_errors()
    }

    /// Returns true if there are any errors.
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Returns only the error diagnostics.
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
    }

    /// The first operation of the parsed document, if any.
    pub fn operation(&self) -> Option<&ast::Operation> {
        self.document.as_ref().and_then(Document::operation)
    }
}

/// A diagnostic message with source location.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// The span in the query text where the diagnostic applies.
    pub span: Range<usize>,
    /// The severity level.
    pub severity: Severity,
    /// The diagnostic message.
    pub message: String,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub fn error(span: Range<usize>, message: impl Into<String>) -> Self {
        Self {
            span,
            severity: Severity::Error,
            message: message.into(),
        }
    }

    /// Create a new warning diagnostic.
    pub fn warning(span: Range<usize>, message: impl Into<String>) -> Self {
        Self {
            span,
            severity: Severity::Warning,
            message: message.into(),
        }
    }
}

/// Diagnostic severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// A fatal error that prevents resolution against the document.
    Error,
    /// A warning that does not prevent resolution.
    Warning,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}: {} (at {:?})", level, self.message, self.span)
    }
}

impl std::error::Error for Diagnostic {}

/// Parse GraphQL query text.
///
/// Returns a `ParseResult` containing the parsed document (if successful)
/// and any diagnostic messages. Fragment definitions and uses parse but
/// draw a warning: the path resolver addresses fields by response name and
/// never follows fragments.
pub fn parse(source: &str) -> ParseResult {
    use chumsky::error::Rich;
    use chumsky::input::Input;
    use chumsky::span::SimpleSpan;
    use chumsky::span::Span as _;
    use chumsky::Parser as _;

    // Step 1: Lexical analysis
    let (tokens, lex_errs) = lexer::lexer().parse(source).into_output_errors();

    let mut diagnostics: Vec<Diagnostic> = lex_errs
        .into_iter()
        .map(|e: Rich<'_, char>| {
            let span = e.span();
            Diagnostic::error(span.start()..span.end(), e.to_string())
        })
        .collect();

    // If lexing failed completely, return early
    let tokens: Vec<(lexer::Token<'_>, SimpleSpan)> = match tokens {
        Some(t) => t,
        None => {
            return ParseResult {
                document: None,
                diagnostics,
            };
        }
    };

    // Step 2: Parsing
    let len = source.len();
    let eoi: SimpleSpan = (len..len).into();
    let token_stream = tokens
        .as_slice()
        .map(eoi, |(tok, span): &(lexer::Token<'_>, SimpleSpan)| {
            (tok, span)
        });

    let (document, parse_errs) = parser::parser().parse(token_stream).into_output_errors();

    diagnostics.extend(parse_errs.into_iter().map(
        |e: Rich<'_, lexer::Token<'_>, SimpleSpan>| {
            let span = e.span();
            Diagnostic::error(span.start()..span.end(), e.to_string())
        },
    ));

    if let Some(document) = &document {
        warn_on_fragments(document, &mut diagnostics);
    }

    ParseResult {
        document,
        diagnostics,
    }
}

fn warn_on_fragments(document: &Document, diagnostics: &mut Vec<Diagnostic>) {
    for fragment in document.fragments() {
        diagnostics.push(Diagnostic::warning(
            0..0,
            format!(
                "fragment `{}` is ignored by data-path resolution",
                fragment.name
            ),
        ));
    }
    for definition in &document.definitions {
        if let ast::Definition::Operation(operation) = definition {
            warn_on_fragment_uses(&operation.selection_set, diagnostics);
        }
    }
}

fn warn_on_fragment_uses(set: &SelectionSet, diagnostics: &mut Vec<Diagnostic>) {
    for selection in &set.selections {
        match selection {
            Selection::Field(field) => {
                if let Some(sub) = &field.selection_set {
                    warn_on_fragment_uses(sub, diagnostics);
                }
            }
            Selection::FragmentSpread(name) => diagnostics.push(Diagnostic::warning(
                0..0,
                format!("fragment spread `...{name}` is ignored by data-path resolution"),
            )),
            Selection::InlineFragment(inline) => {
                diagnostics.push(Diagnostic::warning(
                    0..0,
                    "inline fragment is ignored by data-path resolution".to_string(),
                ));
                warn_on_fragment_uses(&inline.selection_set, diagnostics);
            }
        }
    }
}
