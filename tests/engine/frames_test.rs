//! Integration tests for grouped frame building: group-key bucketing,
//! column typing through schema and aliases, display titles, and row
//! normalization.

use frameql::engine::frames::{build_frames, FrameSettings, ResolvedPath};
use frameql::engine::FieldType;
use frameql::graphql;
use frameql::graphql::ast::Operation;
use frameql::path::DataPath;
use frameql::schema::types::{NamedType, TypeRef};
use frameql::schema::{TypeRegistry, GENERIC_SCALAR};
use frameql::template::{NoopResolver, ScopedVars};
use frameql::value::{CellValue, FieldName, FlatRecord};

fn registry() -> TypeRegistry {
    let mut registry = TypeRegistry::new("Query");
    registry.insert(NamedType::object(
        "Query",
        vec![(
            "servers".to_string(),
            TypeRef::List(Box::new(TypeRef::Named("Server".to_string()))),
        )],
    ));
    registry.insert(NamedType::object(
        "Server",
        vec![
            ("name".to_string(), TypeRef::Named("String".to_string())),
            ("load".to_string(), TypeRef::Named("Float".to_string())),
            ("Time".to_string(), TypeRef::Named("String".to_string())),
            (
                "payload".to_string(),
                TypeRef::Named(GENERIC_SCALAR.to_string()),
            ),
        ],
    ));
    registry.insert(NamedType::scalar("String"));
    registry.insert(NamedType::scalar("Float"));
    registry.insert(NamedType::scalar("Int"));
    registry.insert(NamedType::scalar(GENERIC_SCALAR));
    registry
}

fn operation(source: &str) -> Operation {
    let parsed = graphql::parse(source);
    assert!(parsed.is_ok(), "diagnostics: {:?}", parsed.diagnostics);
    parsed.operation().expect("operation present").clone()
}

fn record(fields: Vec<(&str, CellValue)>) -> FlatRecord {
    fields
        .into_iter()
        .map(|(name, value)| (FieldName::from_wire(name), value))
        .collect()
}

fn server_records() -> Vec<FlatRecord> {
    vec![
        record(vec![
            ("name", CellValue::String("a".to_string())),
            ("load", CellValue::Float(0.5)),
            (
                "Time",
                CellValue::String("2024-07-15T10:00:00Z".to_string()),
            ),
        ]),
        record(vec![
            ("name", CellValue::String("b".to_string())),
            ("load", CellValue::Float(0.7)),
            (
                "Time",
                CellValue::String("2024-07-15T10:00:00Z".to_string()),
            ),
        ]),
        record(vec![
            ("name", CellValue::String("a".to_string())),
            ("load", CellValue::Float(0.6)),
            (
                "Time",
                CellValue::String("2024-07-15T10:01:00Z".to_string()),
            ),
        ]),
    ]
}

struct Fixture {
    registry: TypeRegistry,
    operation: Operation,
    path: DataPath,
}

impl Fixture {
    fn new(query: &str) -> Self {
        Self {
            registry: registry(),
            operation: operation(query),
            path: DataPath::parse("servers"),
        }
    }

    fn resolved(&self) -> ResolvedPath<'_> {
        ResolvedPath {
            path: &self.path,
            schema_type: self.registry.get("Server").expect("Server type present"),
            query_node: graphql::descendant_field(&self.operation, &self.path)
                .expect("servers resolves"),
        }
    }
}

fn settings<'a>(
    group_by: &'a [String],
    alias_by: Option<&'a str>,
    scoped_vars: &'a ScopedVars,
) -> FrameSettings<'a> {
    FrameSettings {
        time_path: "Time",
        time_format: None,
        group_by,
        alias_by,
        scoped_vars,
        templates: &NoopResolver,
    }
}

#[test]
fn test_grouping_in_first_seen_order() {
    let fixture = Fixture::new("query { servers { name load Time } }");
    let vars = ScopedVars::new();
    let group_by = vec!["name".to_string()];

    let frames = build_frames(
        server_records(),
        fixture.resolved(),
        &fixture.registry,
        &settings(&group_by, None, &vars),
    )
    .expect("frames build");

    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0].group_key(), "a");
    assert_eq!(frames[1].group_key(), "b");
    assert_eq!(frames[0].row_count(), 2);
    assert_eq!(frames[1].row_count(), 1);
}

#[test]
fn test_grouped_titles_join_key_and_field() {
    let fixture = Fixture::new("query { servers { name load Time } }");
    let vars = ScopedVars::new();
    let group_by = vec!["name".to_string()];

    let frames = build_frames(
        server_records(),
        fixture.resolved(),
        &fixture.registry,
        &settings(&group_by, None, &vars),
    )
    .expect("frames build");

    let load = frames[0].column("load").expect("load column");
    assert_eq!(load.display_name(), "a_load");
    let load_b = frames[1].column("load").expect("load column");
    assert_eq!(load_b.display_name(), "b_load");
}

#[test]
fn test_ungrouped_titles_are_field_names() {
    let fixture = Fixture::new("query { servers { name load Time } }");
    let vars = ScopedVars::new();

    let frames = build_frames(
        server_records(),
        fixture.resolved(),
        &fixture.registry,
        &settings(&[], None, &vars),
    )
    .expect("frames build");

    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].group_key(), "");
    assert_eq!(
        frames[0].column("load").expect("load column").display_name(),
        "load"
    );
}

#[test]
fn test_column_types() {
    let fixture = Fixture::new("query { servers { name load Time } }");
    let vars = ScopedVars::new();

    let frames = build_frames(
        server_records(),
        fixture.resolved(),
        &fixture.registry,
        &settings(&[], None, &vars),
    )
    .expect("frames build");

    let frame = &frames[0];
    assert_eq!(
        frame.column("Time").expect("Time column").field_type(),
        FieldType::Time
    );
    assert_eq!(
        frame.column("load").expect("load column").field_type(),
        FieldType::Number
    );
    assert_eq!(
        frame.column("name").expect("name column").field_type(),
        FieldType::String
    );
}

#[test]
fn test_aliased_field_types_through_underlying_field() {
    let fixture = Fixture::new("query { servers { cpu: load } }");
    let vars = ScopedVars::new();

    let records = vec![record(vec![("cpu", CellValue::Float(0.5))])];
    let frames = build_frames(
        records,
        fixture.resolved(),
        &fixture.registry,
        &settings(&[], None, &vars),
    )
    .expect("frames build");

    assert_eq!(
        frames[0].column("cpu").expect("cpu column").field_type(),
        FieldType::Number
    );
}

#[test]
fn test_lifted_fields_stay_strings() {
    let fixture = Fixture::new("query { servers { load } }");
    let vars = ScopedVars::new();

    // A lifted `load` would be numeric by schema, but lifted fields are
    // never schema-typed
    let records = vec![record(vec![
        ("load", CellValue::Float(0.5)),
        ("..load", CellValue::Float(0.9)),
    ])];
    let frames = build_frames(
        records,
        fixture.resolved(),
        &fixture.registry,
        &settings(&[], None, &vars),
    )
    .expect("frames build");

    assert_eq!(
        frames[0].column("load").expect("load column").field_type(),
        FieldType::Number
    );
    assert_eq!(
        frames[0].column("..load").expect("lifted column").field_type(),
        FieldType::String
    );
}

#[test]
fn test_datetime_looking_values_type_as_time() {
    let fixture = Fixture::new("query { servers { name } }");
    let vars = ScopedVars::new();

    let records = vec![record(vec![(
        "name",
        CellValue::String("2024-07-15T10:00:00Z".to_string()),
    )])];
    let frames = build_frames(
        records,
        fixture.resolved(),
        &fixture.registry,
        &settings(&[], None, &vars),
    )
    .expect("frames build");

    assert_eq!(
        frames[0].column("name").expect("name column").field_type(),
        FieldType::Time
    );
}

#[test]
fn test_alias_template_titles() {
    let fixture = Fixture::new("query { servers { name load Time } }");
    let vars = ScopedVars::new();
    let group_by = vec!["name".to_string()];

    let frames = build_frames(
        server_records(),
        fixture.resolved(),
        &fixture.registry,
        &settings(&group_by, Some("$field_name: $fieldName"), &vars),
    )
    .expect("frames build");

    let load = frames[0].column("load").expect("load column");
    assert_eq!(load.display_name(), "a: load");
    let name = frames[0].column("name").expect("name column");
    assert_eq!(name.display_name(), "a: name");
}

#[test]
fn test_rows_normalize_falsy_to_empty_string() {
    let fixture = Fixture::new("query { servers { name load Time } }");
    let vars = ScopedVars::new();

    let records = vec![
        record(vec![
            ("name", CellValue::String("a".to_string())),
            ("load", CellValue::Float(0.5)),
        ]),
        record(vec![
            ("name", CellValue::Null),
            ("load", CellValue::Float(0.0)),
        ]),
    ];
    let frames = build_frames(
        records,
        fixture.resolved(),
        &fixture.registry,
        &settings(&[], None, &vars),
    )
    .expect("frames build");

    let frame = &frames[0];
    assert_eq!(frame.row_count(), 2);
    let load = frame.column("load").expect("load column");
    assert_eq!(load.values()[0], CellValue::Float(0.5));
    assert_eq!(load.values()[1], CellValue::String(String::new()));
    let name = frame.column("name").expect("name column");
    assert_eq!(name.values()[1], CellValue::String(String::new()));
}

#[test]
fn test_time_field_parses_to_instant() {
    let fixture = Fixture::new("query { servers { name load Time } }");
    let vars = ScopedVars::new();

    let frames = build_frames(
        server_records(),
        fixture.resolved(),
        &fixture.registry,
        &settings(&[], None, &vars),
    )
    .expect("frames build");

    let time = frames[0].column("Time").expect("Time column");
    assert!(matches!(time.values()[0], CellValue::Time(_)));
}

#[test]
fn test_missing_group_field_yields_empty_component() {
    let fixture = Fixture::new("query { servers { name load Time } }");
    let vars = ScopedVars::new();
    let group_by = vec!["name".to_string(), "missing".to_string()];

    let records = vec![record(vec![
        ("name", CellValue::String("a".to_string())),
        ("load", CellValue::Float(0.5)),
    ])];
    let frames = build_frames(
        records,
        fixture.resolved(),
        &fixture.registry,
        &settings(&group_by, None, &vars),
    )
    .expect("frames build");

    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].group_key(), "a,");
}
