//! End-to-end generation tests: schema file in, application skeleton out.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crudgen::codegen::{
    generate, load_schema, validate, GenerateError, GenerationOptions, LayerSelection,
    OverwritePolicy, PrimaryKeyPolicy, TableOutcome, ValidationError, ViolationKind,
};
use tempfile::TempDir;

const HR_SCHEMA: &str = r#"
tables:
  - name: department
    doc: Organisational unit
    columns:
      - { name: id, type: integer, primary_key: true }
      - { name: name, type: varchar(100), nullable: false }
      - { name: budget, type: "numeric(12,2)" }
  - name: employee
    columns:
      - { name: id, type: integer, primary_key: true }
      - { name: name, type: text, nullable: false }
      - { name: department_id, type: integer, references: department.id }
      - { name: manager_id, type: integer, references: employee.id }
      - { name: hired_at, type: timestamp, default: CURRENT_TIMESTAMP }
"#;

const ORDER_SCHEMA: &str = r#"
tables:
  - name: order_line
    columns:
      - { name: order_id, type: integer, primary_key: true }
      - { name: line_no, type: integer, primary_key: true }
      - { name: sku, type: text, nullable: false }
  - name: shipment_item
    columns:
      - { name: id, type: integer, primary_key: true }
      - name: order_id
        type: integer
        references: { table: order_line, column: order_id, constraint: fk_line }
      - name: line_no
        type: integer
        references: { table: order_line, column: line_no, constraint: fk_line }
"#;

fn write_schema(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn read(root: &Path, relative: &str) -> String {
    fs::read_to_string(root.join(relative))
        .unwrap_or_else(|e| panic!("failed to read {}: {}", relative, e))
}

fn load_schema_str(contents: &str) -> crudgen::codegen::SchemaDescriptor {
    let dir = TempDir::new().unwrap();
    load_schema(write_schema(dir.path(), "schema.yaml", contents)).unwrap()
}

/// Every file under `root`, keyed by its path relative to `root`.
fn snapshot(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    let mut files = BTreeMap::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        for entry in fs::read_dir(&dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                pending.push(path);
            } else {
                let relative = path.strip_prefix(root).unwrap().to_path_buf();
                files.insert(relative, fs::read(&path).unwrap());
            }
        }
    }
    files
}

#[test]
fn test_department_employee_skeleton() {
    let dir = TempDir::new().unwrap();
    let schema = load_schema(write_schema(dir.path(), "hr.yaml", HR_SCHEMA)).unwrap();
    let out = dir.path().join("out");

    let report = generate(&schema, &out, &GenerationOptions::default()).unwrap();
    assert!(report.is_success(), "{}", report);
    assert_eq!(report.generated_tables().collect::<Vec<_>>(), vec!["department", "employee"]);
    // 10 layers per table, 14 backend and 8 frontend scaffold files
    assert_eq!(report.files_written, 2 * 10 + 14 + 8);

    let department = read(&out, "backend/models/department.py");
    assert!(department.contains("class Department(Base):\n    \"\"\"Organisational unit\"\"\""));
    assert!(department.contains(
        "employees_collection: Mapped[list[\"Employee\"]] = relationship(\"Employee\", back_populates=\"department\""
    ));

    let employee = read(&out, "backend/models/employee.py");
    assert!(employee.contains("ForeignKey(\"department.id\")"));
    assert!(employee.contains("remote_side=\"[Employee.id]\""));
    assert!(employee.contains("server_default=func.now()"));

    let router = read(&out, "backend/routers/employee.py");
    assert!(router.contains("@router.get(\"/{id}\", response_model=EmployeeRead)"));
    assert!(router.contains("\"Employee not found\""));

    let main = read(&out, "backend/main.py");
    assert!(main.contains("from routers import department, employee\n"));
    assert!(main.contains("prefix=\"/employees\""));

    assert!(read(&out, "backend/tests/test_employee.py").contains("def test_create"));
    assert!(read(&out, "frontend/src/services/employeeService.js").contains("const resource = '/employees'"));
    assert!(read(&out, "frontend/src/stores/departmentStore.js").contains("defineStore('department'"));
    assert!(out.join("frontend/src/views/EmployeeListView.vue").exists());
    assert!(out.join("frontend/src/views/EmployeeFormView.vue").exists());
    assert!(out.join("frontend/src/tests/employeeStore.test.js").exists());
    assert!(read(&out, "frontend/src/router/index.js").contains("EmployeeFormView"));
}

#[test]
fn test_composite_foreign_key_is_one_relationship() {
    let dir = TempDir::new().unwrap();
    let schema = load_schema(write_schema(dir.path(), "orders.yaml", ORDER_SCHEMA)).unwrap();

    let model = validate(&schema, &GenerationOptions::default()).unwrap();
    let item = model.table("shipment_item").unwrap();
    assert_eq!(item.foreign_keys.len(), 1);
    assert_eq!(item.foreign_keys[0].columns, vec!["order_id", "line_no"]);
    assert_eq!(item.foreign_keys[0].parent_attr, "order_line");

    let out = dir.path().join("out");
    let report = generate(&schema, &out, &GenerationOptions::default()).unwrap();
    assert!(report.is_success(), "{}", report);

    let model_py = read(&out, "backend/models/shipment_item.py");
    assert!(model_py.contains(
        "ForeignKeyConstraint([\"order_id\", \"line_no\"], [\"order_line.order_id\", \"order_line.line_no\"])"
    ));
    assert!(model_py.contains(
        "relationship(\"OrderLine\", back_populates=\"shipment_items_collection\", foreign_keys=\"[ShipmentItem.order_id, ShipmentItem.line_no]\")"
    ));

    let router = read(&out, "backend/routers/order_line.py");
    assert!(router.contains("@router.get(\"/{order_id}/{line_no}\""));
}

#[test]
fn test_self_reference_names_both_ends() {
    let model = validate(&load_schema_str(HR_SCHEMA), &GenerationOptions::default()).unwrap();

    let employee = model.table("employee").unwrap();
    let manager = &employee.foreign_keys[1];
    assert_eq!(manager.target_table, "employee");
    assert_eq!(manager.parent_attr, "manager");
    assert_eq!(manager.collection_attr, "employees_collection");
    assert!(employee.children.iter().any(|c| c.attr == "employees_collection"));
}

#[test]
fn test_validation_errors_are_aggregated() {
    let schema = load_schema_str(
        r#"
tables:
  - name: department
    columns:
      - { name: id, type: integer, primary_key: true }
      - { name: name, type: text }
      - { name: name, type: text }
  - name: employee
    columns:
      - { name: id, type: integer, primary_key: true }
      - { name: badge, type: geometry }
      - { name: office_id, type: integer, references: office.id }
      - { name: team_id, type: integer, references: team }
  - name: placeholder
    columns: []
"#,
    );

    let dir = TempDir::new().unwrap();
    let out = dir.path().join("out");
    let err = generate(&schema, &out, &GenerationOptions::default()).unwrap_err();
    let report = match err {
        GenerateError::Validation(report) => report,
        other => panic!("expected validation errors, got {}", other),
    };

    assert_eq!(report.len(), 5, "{}", report);
    assert_eq!(report.of_kind(ViolationKind::TypeMapping).count(), 1);
    assert!(report.errors.iter().any(|e| matches!(e, ValidationError::DuplicateColumn { column, .. } if column == "name")));
    assert!(report.errors.iter().any(|e| matches!(e, ValidationError::UnknownForeignTable { target_table, .. } if target_table == "office")));
    assert!(report.errors.iter().any(|e| matches!(e, ValidationError::MalformedReference { .. })));
    assert!(report.errors.iter().any(|e| matches!(e, ValidationError::NoColumns { table } if table == "placeholder")));
    assert!(!out.exists());
}

#[test]
fn test_primary_key_policies() {
    let yaml = format!(
        "{}  - name: audit_log\n    columns:\n      - {{ name: message, type: text }}\n",
        HR_SCHEMA
    );
    let schema = load_schema_str(&yaml);

    // defer: only the keyless table fails
    let dir = TempDir::new().unwrap();
    let report = generate(&schema, dir.path(), &GenerationOptions::default()).unwrap();
    let failed: Vec<&str> = report.failed_tables().map(|t| t.table.as_str()).collect();
    assert_eq!(failed, vec!["audit_log"]);
    assert_eq!(report.generated_tables().count(), 2);
    assert!(!dir.path().join("backend/models/audit_log.py").exists());
    assert!(!read(dir.path(), "backend/main.py").contains("audit_log"));

    // reject: validation error, nothing written
    let dir = TempDir::new().unwrap();
    let options = GenerationOptions {
        primary_key_policy: PrimaryKeyPolicy::Reject,
        ..Default::default()
    };
    match generate(&schema, dir.path(), &options) {
        Err(GenerateError::Validation(report)) => {
            assert_eq!(
                report.errors,
                vec![ValidationError::MissingPrimaryKey { table: "audit_log".to_string() }]
            );
        }
        other => panic!("expected a validation error, got {:?}", other.map(|r| r.to_string())),
    }
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);

    // synthesize: an auto-generated key is added
    let dir = TempDir::new().unwrap();
    let options = GenerationOptions {
        primary_key_policy: PrimaryKeyPolicy::Synthesize,
        ..Default::default()
    };
    let report = generate(&schema, dir.path(), &options).unwrap();
    assert!(report.is_success(), "{}", report);
    let model = read(dir.path(), "backend/models/audit_log.py");
    assert!(model.contains("id: Mapped[int] = mapped_column(\"id\", BigInteger().with_variant(Integer, \"sqlite\"), primary_key=True"));
}

#[test]
fn test_keyless_child_is_left_out_of_its_parent() {
    let schema = load_schema_str(
        r#"
tables:
  - name: department
    columns:
      - { name: id, type: integer, primary_key: true }
      - { name: name, type: text }
  - name: audit_log
    columns:
      - { name: message, type: text }
      - { name: department_id, type: integer, references: department.id }
"#,
    );

    let dir = TempDir::new().unwrap();
    let report = generate(&schema, dir.path(), &GenerationOptions::default()).unwrap();
    assert_eq!(report.generated_tables().collect::<Vec<_>>(), vec!["department"]);
    assert_eq!(report.failed_tables().map(|t| t.table.as_str()).collect::<Vec<_>>(), vec!["audit_log"]);

    for relative in [
        "backend/models/department.py",
        "backend/schemas/department.py",
        "backend/crud/department.py",
        "frontend/src/views/DepartmentFormView.vue",
    ] {
        let content = read(dir.path(), relative);
        assert!(!content.contains("audit_log"), "{} mentions audit_log", relative);
        assert!(!content.contains("AuditLog"), "{} mentions AuditLog", relative);
    }
    assert!(!read(dir.path(), "backend/models/department.py").contains("relationship"));
}

#[test]
fn test_type_and_schema_errors_are_reported_together() {
    let schema = load_schema_str(
        r#"
tables:
  - name: department
    columns:
      - { name: id, type: integer, primary_key: true }
      - { name: id, type: integer }
"#,
    );
    let mut options = GenerationOptions::default();
    options.types.replace_defaults = true;

    let dir = TempDir::new().unwrap();
    let out = dir.path().join("out");
    let report = match generate(&schema, &out, &options) {
        Err(GenerateError::Validation(report)) => report,
        other => panic!("expected validation errors, got {:?}", other.map(|r| r.to_string())),
    };
    assert!(report.of_kind(ViolationKind::TypeMapping).count() > 0, "{}", report);
    assert!(report.of_kind(ViolationKind::SchemaValidation).count() > 0, "{}", report);
    assert!(report
        .errors
        .iter()
        .any(|e| matches!(e, ValidationError::DuplicateColumn { column, .. } if column == "id")));
    assert!(!out.exists());
}

#[test]
fn test_keyword_table_names_are_rejected() {
    let schema = load_schema_str(
        r#"
tables:
  - name: class
    columns:
      - { name: id, type: integer, primary_key: true }
  - name: student
    columns:
      - { name: id, type: integer, primary_key: true }
"#,
    );

    match validate(&schema, &GenerationOptions::default()) {
        Err(GenerateError::Validation(report)) => {
            assert_eq!(
                report.errors,
                vec![ValidationError::ReservedTableName {
                    table: "class".to_string(),
                    identifier: "class".to_string(),
                }]
            );
        }
        other => panic!("expected a validation error, got {:?}", other.map(|m| m.tables().len())),
    }
}

#[test]
fn test_skip_existing_keeps_edited_files() {
    let dir = TempDir::new().unwrap();
    let schema = load_schema_str(HR_SCHEMA);
    let first = generate(&schema, dir.path(), &GenerationOptions::default()).unwrap();

    let edited = dir.path().join("backend/routers/employee.py");
    fs::write(&edited, "# hand edited\n").unwrap();
    fs::remove_file(dir.path().join("frontend/src/App.vue")).unwrap();

    let options = GenerationOptions {
        overwrite: OverwritePolicy::SkipExisting,
        ..Default::default()
    };
    let second = generate(&schema, dir.path(), &options).unwrap();
    assert!(second.is_success());
    assert_eq!(second.files_written, 1);
    assert_eq!(second.files_skipped, first.files_written - 1);
    assert_eq!(fs::read_to_string(&edited).unwrap(), "# hand edited\n");
    assert!(dir.path().join("frontend/src/App.vue").exists());

    // always: the edit is replaced
    generate(&schema, dir.path(), &GenerationOptions::default()).unwrap();
    assert_ne!(fs::read_to_string(&edited).unwrap(), "# hand edited\n");
}

#[test]
fn test_regeneration_is_byte_identical() {
    let schema = load_schema_str(HR_SCHEMA);
    let options = GenerationOptions {
        eager_load: vec!["department".to_string()],
        ..Default::default()
    };

    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();
    generate(&schema, first.path(), &options).unwrap();
    generate(&schema, second.path(), &options).unwrap();

    let a = snapshot(first.path());
    let b = snapshot(second.path());
    assert_eq!(a.keys().collect::<Vec<_>>(), b.keys().collect::<Vec<_>>());
    for (path, content) in &a {
        assert!(b[path] == *content, "{} differs between runs", path.display());
    }
}

#[test]
fn test_layer_selection() {
    let schema = load_schema_str(HR_SCHEMA);

    let dir = TempDir::new().unwrap();
    let options = GenerationOptions {
        layers: LayerSelection::Frontend,
        frontend_dir: "web".to_string(),
        ..Default::default()
    };
    let report = generate(&schema, dir.path(), &options).unwrap();
    assert!(report.is_success());
    assert!(!dir.path().join("backend").exists());
    assert!(dir.path().join("web/src/stores/employeeStore.js").exists());
    let files = report.files_for("employee").unwrap();
    assert_eq!(files.len(), 5);
    assert!(files.iter().all(|f| f.starts_with("web")));

    let dir = TempDir::new().unwrap();
    let options = GenerationOptions {
        layers: LayerSelection::Backend,
        ..Default::default()
    };
    let report = generate(&schema, dir.path(), &options).unwrap();
    assert_eq!(report.scaffold.len(), 1);
    assert!(dir.path().join("backend/crud/department.py").exists());
    assert!(!dir.path().join("frontend").exists());
}

#[test]
fn test_schema_directory() {
    let dir = TempDir::new().unwrap();
    let schema_dir = dir.path().join("schema");
    fs::create_dir(&schema_dir).unwrap();
    write_schema(&schema_dir, "01_orders.yaml", ORDER_SCHEMA);
    write_schema(
        &schema_dir,
        "02_tags.json",
        r#"[{"name": "tag", "columns": [{"name": "id", "type": "uuid", "primary_key": true}, {"name": "label", "type": "text"}]}]"#,
    );

    let schema = load_schema(&schema_dir).unwrap();
    let out = dir.path().join("out");
    let report = generate(&schema, &out, &GenerationOptions::default()).unwrap();
    assert_eq!(
        report.tables.iter().map(|t| t.table.as_str()).collect::<Vec<_>>(),
        vec!["order_line", "shipment_item", "tag"]
    );
    assert!(report
        .tables
        .iter()
        .all(|t| matches!(t.outcome, TableOutcome::Generated { .. })));
    assert!(read(&out, "backend/schemas/tag.py").contains("class TagRead("));
}
