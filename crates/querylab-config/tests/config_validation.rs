use std::fs;
use std::path::{Path, PathBuf};

use querylab_config::{
    ConfigDocument, ConfigOverrides, apply_overrides, load_document, validate_config,
};
use querylab_core::{ErrorKind, Kind};
use serde_json::json;

fn temp_out_dir(label: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("querylab_{label}_{}", uuid::Uuid::new_v4()));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn employees_document() -> serde_json::Value {
    json!({
        "data_generation": {"num_records": 5, "seed": 1, "table_name": "employees"},
        "fields": [
            {"name": "id", "type": "int", "values": {"min": 1, "max": 5}},
            {"name": "dept", "type": "str", "values": ["Sales", "Eng"]},
            {"name": "active", "type": "bool", "values": [true, false]}
        ]
    })
}

fn configuration_message(document: serde_json::Value) -> String {
    let err = validate_config(&document).expect_err("document should be rejected");
    assert_eq!(err.kind(), ErrorKind::Configuration, "{err}");
    err.to_string()
}

#[test]
fn valid_document_builds_schema_in_field_order() {
    let validated = validate_config(&employees_document()).expect("valid config");
    let schema = validated.schema;
    assert!(validated.warnings.is_empty());
    assert_eq!(schema.field_names(), vec!["id", "dept", "active"]);
    assert_eq!(schema.record_count(), 5);
    assert_eq!(schema.seed(), Some(1));
    assert_eq!(schema.table_name(), "employees");
    assert_eq!(
        schema.field("id").map(|field| &field.kind),
        Some(&Kind::Integer { min: 1, max: 5 })
    );
}

#[test]
fn accepts_alias_keys() {
    let document = json!({
        "data_generation": {"record_count": 3, "table_name": "t"},
        "fields": [
            {"name": "flag", "kind": "bool", "domain": [true, false]}
        ]
    });
    let validated = validate_config(&document).expect("aliases accepted");
    assert_eq!(validated.schema.record_count(), 3);
    assert_eq!(validated.schema.seed(), None);
    assert_eq!(validated.schema.fields()[0].kind, Kind::Boolean);
}

#[test]
fn missing_sections_are_rejected() {
    let message = configuration_message(json!({"fields": []}));
    assert!(message.contains("missing_data_generation"), "{message}");

    let message = configuration_message(json!({
        "data_generation": {"num_records": 1, "table_name": "t"},
        "fields": []
    }));
    assert!(message.contains("fields_empty"), "{message}");

    let message = configuration_message(json!({
        "data_generation": {"num_records": 1, "table_name": "t"}
    }));
    assert!(message.contains("missing_fields"), "{message}");
}

#[test]
fn record_count_must_be_positive_and_bounded() {
    for bad in [json!(0), json!(-4), json!(10_000_001), json!("ten"), json!(2.5)] {
        let mut document = employees_document();
        document["data_generation"]["num_records"] = bad;
        let message = configuration_message(document);
        assert!(message.contains("/data_generation/num_records"), "{message}");
    }
}

#[test]
fn first_violation_is_reported() {
    let document = json!({
        "data_generation": {"num_records": 2, "table_name": "t"},
        "fields": [
            {"name": "a", "type": "float", "values": [1.5]},
            {"name": "b", "type": "int", "values": {"min": 9, "max": 1}}
        ]
    });
    let message = configuration_message(document);
    assert!(message.contains("unknown_field_type"), "{message}");
    assert!(message.contains("/fields/0/type"), "{message}");
    assert!(!message.contains("/fields/1"), "{message}");
}

#[test]
fn non_string_type_is_named_in_the_message() {
    for (bad, shown) in [
        (json!(5), "has type 5,"),
        (json!(null), "has type null,"),
        (json!(["int"]), "has type [\"int\"],"),
    ] {
        let mut document = employees_document();
        document["fields"][0]["type"] = bad;
        let message = configuration_message(document);
        assert!(message.contains("unknown_field_type"), "{message}");
        assert!(message.contains("/fields/0/type"), "{message}");
        assert!(message.contains(shown), "{message}");
    }
}

#[test]
fn domains_must_match_their_kind() {
    let cases = [
        (
            json!({"name": "n", "type": "int", "values": {"min": 3, "max": 2}}),
            "inverted_int_range",
        ),
        (
            json!({"name": "n", "type": "int", "values": {"min": 1}}),
            "invalid_int_bound",
        ),
        (
            json!({"name": "s", "type": "str", "values": []}),
            "invalid_candidate_list",
        ),
        (
            json!({"name": "s", "type": "str", "values": ["a", 2]}),
            "invalid_str_value",
        ),
        (
            json!({"name": "b", "type": "bool", "values": ["yes"]}),
            "invalid_bool_value",
        ),
        (json!({"name": "b", "type": "bool"}), "missing_field_values"),
    ];

    for (field, code) in cases {
        let document = json!({
            "data_generation": {"num_records": 1, "table_name": "t"},
            "fields": [field]
        });
        let message = configuration_message(document);
        assert!(message.contains(code), "expected {code} in {message}");
    }
}

#[test]
fn names_must_be_unique_identifiers() {
    let mut document = employees_document();
    document["fields"][2]["name"] = json!("id");
    let message = configuration_message(document);
    assert!(message.contains("duplicate_field"), "{message}");

    let mut document = employees_document();
    document["data_generation"]["table_name"] = json!("employees; DROP TABLE x");
    let message = configuration_message(document);
    assert!(message.contains("invalid_table_name"), "{message}");

    let mut document = employees_document();
    document["fields"][0]["name"] = json!("1st");
    let message = configuration_message(document);
    assert!(message.contains("invalid_field_name"), "{message}");
}

#[test]
fn suspicious_domains_produce_warnings() {
    let document = json!({
        "data_generation": {"num_records": 1, "table_name": "t"},
        "fields": [
            {"name": "s", "type": "str", "values": ["a", "a", "b"]},
            {"name": "b", "type": "bool", "values": [true]}
        ]
    });
    let validated = validate_config(&document).expect("warnings only");
    let codes: Vec<&str> = validated
        .warnings
        .iter()
        .map(|issue| issue.code.as_str())
        .collect();
    assert_eq!(codes, vec!["duplicate_candidates", "partial_bool_domain"]);
}

#[test]
fn overrides_are_validated_like_the_document() {
    let mut document = employees_document();
    apply_overrides(
        &mut document,
        &ConfigOverrides {
            num_records: Some(42),
            seed: Some(7),
            table_name: Some("staff".to_string()),
        },
    );
    let schema = validate_config(&document).expect("overridden").schema;
    assert_eq!(schema.record_count(), 42);
    assert_eq!(schema.seed(), Some(7));
    assert_eq!(schema.table_name(), "staff");

    apply_overrides(
        &mut document,
        &ConfigOverrides {
            num_records: Some(0),
            ..ConfigOverrides::default()
        },
    );
    let message = configuration_message(document);
    assert!(message.contains("invalid_record_count"), "{message}");
}

#[test]
fn loads_toml_and_json_documents() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../configs");

    let toml_doc = load_document(&root.join("employees.toml")).expect("load toml");
    let schema = validate_config(&toml_doc).expect("toml config").schema;
    assert_eq!(schema.table_name(), "employees");
    assert_eq!(schema.field_names(), vec!["id", "dept"]);

    let json_doc = load_document(&root.join("customers.json")).expect("load json");
    let schema = validate_config(&json_doc).expect("json config").schema;
    assert_eq!(schema.record_count(), 1000);
    assert_eq!(schema.seed(), None);
}

#[test]
fn load_errors_are_classified() {
    let dir = temp_out_dir("load_errors");

    let missing = load_document(&dir.join("absent.toml")).expect_err("missing file");
    assert_eq!(missing.kind(), ErrorKind::FileIo);

    let yaml = dir.join("config.yaml");
    fs::write(&yaml, "data_generation: {}").expect("write yaml");
    let unsupported = load_document(&yaml).expect_err("unsupported extension");
    assert_eq!(unsupported.kind(), ErrorKind::Configuration);

    let broken = dir.join("broken.json");
    fs::write(&broken, "{ not json").expect("write json");
    let parse = load_document(&broken).expect_err("parse failure");
    assert_eq!(parse.kind(), ErrorKind::Configuration);
}

#[test]
fn validated_schema_converts_back_to_document() {
    let schema = validate_config(&employees_document())
        .expect("valid config")
        .schema;
    let document = ConfigDocument::from(&schema);
    let value = serde_json::to_value(&document).expect("serialize document");
    let reparsed = validate_config(&value).expect("round trip").schema;
    assert_eq!(reparsed, schema);
}
