use querylab_core::{DatasetSchema, ErrorKind, FieldSpec, Kind, MAX_RECORD_COUNT, Value};

fn fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec::new("id", Kind::Integer { min: 1, max: 5 }),
        FieldSpec::new(
            "dept",
            Kind::Text {
                candidates: vec!["Sales".to_string(), "Eng".to_string()],
            },
        ),
        FieldSpec::new("active", Kind::Boolean),
    ]
}

#[test]
fn builds_valid_schema() {
    let schema = DatasetSchema::new(fields(), 5, Some(1), "employees").expect("valid schema");
    assert_eq!(schema.field_names(), vec!["id", "dept", "active"]);
    assert_eq!(schema.record_count(), 5);
    assert_eq!(schema.seed(), Some(1));
    assert_eq!(schema.table_name(), "employees");
}

#[test]
fn rejects_out_of_range_record_count() {
    for count in [0, MAX_RECORD_COUNT + 1] {
        let err = DatasetSchema::new(fields(), count, None, "t").expect_err("bad count");
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}

#[test]
fn rejects_duplicate_fields_and_bad_domains() {
    let mut duplicated = fields();
    duplicated.push(FieldSpec::new("id", Kind::Boolean));
    let err = DatasetSchema::new(duplicated, 1, None, "t").expect_err("duplicate");
    assert!(err.to_string().contains("duplicate field name: id"));

    let inverted = vec![FieldSpec::new("n", Kind::Integer { min: 3, max: 2 })];
    assert!(DatasetSchema::new(inverted, 1, None, "t").is_err());

    let empty = vec![FieldSpec::new("s", Kind::Text { candidates: vec![] })];
    assert!(DatasetSchema::new(empty, 1, None, "t").is_err());

    assert!(DatasetSchema::new(fields(), 1, None, "drop table").is_err());
}

#[test]
fn kind_domain_checks() {
    let range = Kind::Integer { min: 1, max: 5 };
    assert!(range.contains(&Value::Integer(1)));
    assert!(range.contains(&Value::Integer(5)));
    assert!(!range.contains(&Value::Integer(6)));
    assert!(!range.contains(&Value::Boolean(true)));
    assert!(Kind::Boolean.accepts_type(&Value::Boolean(false)));
    assert!(!Kind::Boolean.accepts_type(&Value::Integer(0)));
}
