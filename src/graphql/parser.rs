//! Parser for GraphQL executable documents using chumsky.
//!
//! Transforms a token stream from the lexer into a [`Document`]. Directives
//! are parsed and discarded; the projection engine has no use for them.

use chumsky::input::ValueInput;
use chumsky::prelude::*;

use super::ast::*;
use super::lexer::Token;

/// Create the document parser.
///
/// The parser is generic over the input type, accepting any `ValueInput`
/// that produces `Token` values with `SimpleSpan` spans.
pub fn parser<'tokens, 'src: 'tokens, I>(
) -> impl Parser<'tokens, I, Document, extra::Err<Rich<'tokens, Token<'src>, SimpleSpan>>>
where
    I: ValueInput<'tokens, Token = Token<'src>, Span = SimpleSpan>,
{
    // ==========================================================================
    // Basic token parsers
    // ==========================================================================

    let name = select! {
        Token::Name(s) => s.to_string(),
    }
    .labelled("name");

    // ==========================================================================
    // Input values
    // ==========================================================================

    let value_name = name.clone();
    let value = recursive(move |value| {
        let object_field = value_name
            .clone()
            .then_ignore(just(Token::Colon))
            .then(value.clone());

        choice((
            just(Token::Dollar)
                .ignore_then(value_name.clone())
                .map(ConstValue::Variable),
            select! {
                Token::IntLit(s) => ConstValue::Int(s.parse().unwrap_or_default()),
                Token::FloatLit(s) => ConstValue::Float(s.parse().unwrap_or_default()),
                Token::StringLit(s) => ConstValue::String(s.to_string()),
            },
            just(Token::True).to(ConstValue::Boolean(true)),
            just(Token::False).to(ConstValue::Boolean(false)),
            just(Token::Null).to(ConstValue::Null),
            value_name.clone().map(ConstValue::Enum),
            value
                .clone()
                .repeated()
                .collect::<Vec<_>>()
                .delimited_by(just(Token::LBracket), just(Token::RBracket))
                .map(ConstValue::List),
            object_field
                .repeated()
                .collect::<Vec<_>>()
                .delimited_by(just(Token::LBrace), just(Token::RBrace))
                .map(ConstValue::Object),
        ))
    })
    .labelled("value");

    // ==========================================================================
    // Arguments and directives
    // ==========================================================================

    let arguments = name
        .clone()
        .then_ignore(just(Token::Colon))
        .then(value.clone())
        .map(|(name, value)| Argument { name, value })
        .repeated()
        .collect::<Vec<_>>()
        .delimited_by(just(Token::LParen), just(Token::RParen))
        .labelled("arguments");

    // Directives are accepted and dropped
    let directives = just(Token::At)
        .ignore_then(name.clone())
        .then(arguments.clone().or_not())
        .repeated()
        .collect::<Vec<_>>()
        .ignored();

    // ==========================================================================
    // Selection sets: fields, fragment spreads, inline fragments
    // ==========================================================================

    let sel_name = name.clone();
    let sel_arguments = arguments.clone();
    let sel_directives = directives.clone();
    let selection_set = recursive(move |selection_set| {
        let field = sel_name
            .clone()
            .then(just(Token::Colon).ignore_then(sel_name.clone()).or_not())
            .then(sel_arguments.clone().or_not())
            .then_ignore(sel_directives.clone())
            .then(selection_set.clone().or_not())
            .map(|(((first, aliased), arguments), sub_selection)| {
                // `alias: name` when the colon form was used, else `name`
                let (alias, name) = match aliased {
                    Some(name) => (Some(first), name),
                    None => (None, first),
                };
                Selection::Field(Field {
                    alias,
                    name,
                    arguments: arguments.unwrap_or_default(),
                    selection_set: sub_selection,
                })
            });

        let fragment_spread = just(Token::Spread)
            .ignore_then(sel_name.clone())
            .then_ignore(sel_directives.clone())
            .map(Selection::FragmentSpread);

        let inline_fragment = just(Token::Spread)
            .ignore_then(just(Token::On).ignore_then(sel_name.clone()).or_not())
            .then_ignore(sel_directives.clone())
            .then(selection_set.clone())
            .map(|(type_condition, selection_set)| {
                Selection::InlineFragment(InlineFragment {
                    type_condition,
                    selection_set,
                })
            });

        let selection = choice((fragment_spread, inline_fragment, field));

        selection
            .repeated()
            .at_least(1)
            .collect::<Vec<_>>()
            .delimited_by(just(Token::LBrace), just(Token::RBrace))
            .map(|selections| SelectionSet { selections })
    })
    .labelled("selection set");

    // ==========================================================================
    // Operation and fragment definitions
    // ==========================================================================

    let type_name = name.clone();
    let type_syntax = recursive(move |type_syntax| {
        let named = type_name.clone().map(TypeSyntax::Named);
        let list = type_syntax
            .delimited_by(just(Token::LBracket), just(Token::RBracket))
            .map(|inner| TypeSyntax::List(Box::new(inner)));
        named
            .or(list)
            .then(just(Token::Bang).or_not())
            .map(|(inner, bang)| {
                if bang.is_some() {
                    TypeSyntax::NonNull(Box::new(inner))
                } else {
                    inner
                }
            })
    });

    let variable_definition = just(Token::Dollar)
        .ignore_then(name.clone())
        .then_ignore(just(Token::Colon))
        .then(type_syntax)
        .then(just(Token::Eq).ignore_then(value.clone()).or_not())
        .map(|((name, var_type), default)| VariableDefinition {
            name,
            var_type,
            default,
        });

    let variable_definitions = variable_definition
        .repeated()
        .collect::<Vec<_>>()
        .delimited_by(just(Token::LParen), just(Token::RParen));

    let operation_type = choice((
        just(Token::Query).to(OperationType::Query),
        just(Token::Mutation).to(OperationType::Mutation),
        just(Token::Subscription).to(OperationType::Subscription),
    ));

    let operation_header = operation_type
        .then(name.clone().or_not())
        .then(variable_definitions.or_not())
        .then_ignore(directives.clone());

    // Shorthand documents start straight at the selection set
    let operation = operation_header
        .or_not()
        .then(selection_set.clone())
        .map(|(header, selection_set)| {
            let ((operation_type, name), variable_definitions) =
                header.unwrap_or(((OperationType::Query, None), None));
            Operation {
                operation_type,
                name,
                variable_definitions: variable_definitions.unwrap_or_default(),
                selection_set,
            }
        });

    let fragment_definition = just(Token::Fragment)
        .ignore_then(name.clone())
        .then_ignore(just(Token::On))
        .then(name.clone())
        .then_ignore(directives)
        .then(selection_set)
        .map(|((name, type_condition), selection_set)| FragmentDefinition {
            name,
            type_condition,
            selection_set,
        });

    let definition = choice((
        fragment_definition.map(Definition::Fragment),
        operation.map(Definition::Operation),
    ));

    definition
        .repeated()
        .at_least(1)
        .collect::<Vec<_>>()
        .map(|definitions| Document { definitions })
        .then_ignore(end())
}
