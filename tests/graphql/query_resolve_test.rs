//! Integration tests for query parsing and AST path resolution.

use frameql::error::ProjectionError;
use frameql::graphql::{self, alias_for, descendant_field};
use frameql::path::DataPath;

fn operation(source: &str) -> graphql::ast::Operation {
    let parsed = graphql::parse(source);
    assert!(parsed.is_ok(), "diagnostics: {:?}", parsed.diagnostics);
    parsed.operation().expect("operation present").clone()
}

#[test]
fn test_descendant_node() {
    let op = operation(
        "
        query {
            foo {
                bar {
                    baz
                }
            }
        }
    ",
    );

    let foo = descendant_field(&op, &DataPath::parse("foo")).expect("foo resolves");
    assert_eq!(foo.name, "foo");

    let baz = descendant_field(&op, &DataPath::parse("foo.bar.baz")).expect("baz resolves");
    assert_eq!(baz.name, "baz");
}

#[test]
fn test_alias_if_exists() {
    let op = operation(
        "
        query {
            foo {
                bar: baz
                boz
            }
        }
    ",
    );
    let foo = descendant_field(&op, &DataPath::parse("foo")).expect("foo resolves");

    let alias = alias_for(foo, "bar").expect("alias found");
    assert_eq!(alias.name, "baz");
    assert!(alias_for(foo, "boz").is_none());
}

#[test]
fn test_missing_field_is_a_configuration_error() {
    let op = operation("query { foo { bar } }");
    let err = descendant_field(&op, &DataPath::parse("foo.qux")).expect_err("must fail");
    match err {
        ProjectionError::FieldNotFound { field, index, path } => {
            assert_eq!(field, "qux");
            assert_eq!(index, 1);
            assert_eq!(path, "foo.qux");
        }
        other => panic!("expected FieldNotFound, got {other:?}"),
    }
}

#[test]
fn test_descending_into_scalar_selection_fails() {
    let op = operation("query { foo { bar } }");
    assert!(matches!(
        descendant_field(&op, &DataPath::parse("foo.bar.deeper")),
        Err(ProjectionError::NoSelectionSet { .. })
    ));
}

#[test]
fn test_path_follows_response_names() {
    // The path addresses response names, so an aliased field resolves by
    // its alias, not its underlying name
    let op = operation("query { renamed: foo { bar } }");
    assert!(descendant_field(&op, &DataPath::parse("renamed.bar")).is_ok());
    assert!(descendant_field(&op, &DataPath::parse("foo.bar")).is_err());
}

#[test]
fn test_parse_reports_diagnostics_with_spans() {
    let result = graphql::parse("query { foo");
    assert!(result.has_errors() || result.document.is_none());
}

#[test]
fn test_munged_host_tokens_parse() {
    let munged = graphql::munge_host_variables(
        "query { metrics(from: ${timeFrom}, to: ${timeTo}) { value } }",
    );
    assert!(!munged.contains("${"));
    let result = graphql::parse(&munged);
    assert!(result.is_ok(), "diagnostics: {:?}", result.diagnostics);
}
