//! The intermediate representation every template reads from.
//!
//! [`SchemaModel::build`] validates a [`SchemaDescriptor`] and groups
//! foreign-key columns into relationships. Relationship names and child
//! collections are filled in afterwards by
//! [`resolve_relationships`](crate::codegen::relationships::resolve_relationships);
//! after that the model is read-only.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::codegen::error::{ValidationError, ValidationReport};
use crate::codegen::naming::{NamingEngine, PYTHON_KEYWORDS};
use crate::codegen::type_mapper::TypeMapper;
use crate::codegen::types::{
    ColumnDescriptor, DataType, ReferenceDescriptor, SchemaDescriptor, TableDescriptor,
};

/// What to do with tables that declare no primary key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PrimaryKeyPolicy {
    /// Keep the table; its layers fail to render.
    #[default]
    Defer,
    /// Fail validation.
    Reject,
    /// Prepend an auto-generated `id` column.
    Synthesize,
}

impl PrimaryKeyPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrimaryKeyPolicy::Defer => "defer",
            PrimaryKeyPolicy::Reject => "reject",
            PrimaryKeyPolicy::Synthesize => "synthesize",
        }
    }
}

/// Target of a single column's foreign-key reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnReference {
    pub table: String,
    pub column: String,
    pub schema: Option<String>,
    pub constraint: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Name of the owning table
    pub table: String,
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
    pub primary_key: bool,
    /// Value is produced by the database; excluded from create payloads
    pub auto_generated: bool,
    /// Raw SQL default
    pub default: Option<String>,
    pub length: Option<u32>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
    pub timezone: bool,
    pub references: Option<ColumnReference>,
    pub doc: Option<String>,
    /// Added by [`PrimaryKeyPolicy::Synthesize`]
    pub synthetic: bool,
}

impl Column {
    pub fn new(table: &str, name: &str, data_type: DataType) -> Self {
        Self {
            table: table.to_string(),
            name: name.to_string(),
            data_type,
            nullable: true,
            primary_key: false,
            auto_generated: false,
            default: None,
            length: None,
            precision: None,
            scale: None,
            timezone: false,
            references: None,
            doc: None,
            synthetic: false,
        }
    }

    /// True when the default is a "current time" function.
    pub fn default_is_now(&self) -> bool {
        matches!(
            self.default.as_deref().map(|d| d.trim().to_uppercase()),
            Some(ref d) if d == "CURRENT_TIMESTAMP" || d == "NOW()" || d == "GETDATE()"
        )
    }
}

/// One relationship from the owning table to `target_table`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    /// Local columns, in declaration order
    pub columns: Vec<String>,
    pub target_table: String,
    /// Target columns, positionally paired with `columns`
    pub target_columns: Vec<String>,
    pub constraint: Option<String>,
    /// Attribute on the owning table holding the parent record
    pub parent_attr: String,
    /// Attribute on the target table holding the owning table's records
    pub collection_attr: String,
}

impl ForeignKey {
    pub fn is_composite(&self) -> bool {
        self.columns.len() > 1
    }

    pub fn column_pairs(&self) -> impl Iterator<Item = (&String, &String)> {
        self.columns.iter().zip(self.target_columns.iter())
    }
}

/// A (child table, foreign key) pair whose foreign key targets the owning table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildCollection {
    pub child_table: String,
    /// Index into the child's `foreign_keys`
    pub foreign_key: usize,
    /// Same as the foreign key's `collection_attr`
    pub attr: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub name: String,
    pub schema: Option<String>,
    pub doc: Option<String>,
    pub columns: Vec<Column>,
    pub foreign_keys: Vec<ForeignKey>,
    pub children: Vec<ChildCollection>,
}

impl Table {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn primary_key(&self) -> Vec<&Column> {
        self.columns.iter().filter(|c| c.primary_key).collect()
    }

    pub fn has_primary_key(&self) -> bool {
        self.columns.iter().any(|c| c.primary_key)
    }

    pub fn qualified_name(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{}.{}", schema, self.name),
            None => self.name.clone(),
        }
    }

    /// The foreign key `column` belongs to, if any.
    pub fn foreign_key_for(&self, column: &str) -> Option<&ForeignKey> {
        self.foreign_keys
            .iter()
            .find(|fk| fk.columns.iter().any(|c| c == column))
    }
}

/// Validated set of tables, in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaModel {
    tables: Vec<Table>,
    resolved: bool,
}

impl SchemaModel {
    /// Validate `descriptor` and build the unresolved model.
    ///
    /// Every violation is collected; the result is an error if any was found.
    pub fn build(
        descriptor: &SchemaDescriptor,
        types: &TypeMapper,
        naming: &NamingEngine,
        policy: PrimaryKeyPolicy,
    ) -> Result<Self, ValidationReport> {
        let mut errors = Vec::new();
        let mut tables = Vec::with_capacity(descriptor.tables.len());
        let mut seen_names: HashSet<&str> = HashSet::new();
        let mut identifiers: HashMap<String, &str> = HashMap::new();

        for (index, table_desc) in descriptor.tables.iter().enumerate() {
            let name = table_desc.name.trim();
            let forms = naming.forms(name);
            if forms.snake.is_empty() {
                errors.push(ValidationError::EmptyTableName { index });
                continue;
            }
            if !seen_names.insert(name) {
                errors.push(ValidationError::DuplicateTable {
                    table: name.to_string(),
                });
                continue;
            }
            let module = &forms.snake_singular;
            if PYTHON_KEYWORDS.contains(&module.as_str())
                || module.starts_with(|c: char| c.is_ascii_digit())
            {
                errors.push(ValidationError::ReservedTableName {
                    table: name.to_string(),
                    identifier: module.clone(),
                });
                continue;
            }
            match identifiers.get(&forms.snake_singular) {
                Some(first) => errors.push(ValidationError::TableNameCollision {
                    first: first.to_string(),
                    second: name.to_string(),
                    identifier: forms.snake_singular.clone(),
                }),
                None => {
                    identifiers.insert(forms.snake_singular.clone(), name);
                }
            }

            if let Some(table) = build_table(table_desc, types, naming, policy, &mut errors) {
                tables.push(table);
            }
        }

        let mut model = SchemaModel {
            tables,
            resolved: false,
        };
        model.group_foreign_keys(&mut errors);

        if errors.is_empty() {
            Ok(model)
        } else {
            Err(ValidationReport::new(errors))
        }
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    /// Whether `name` gets per-table code: it exists and has a primary key.
    /// Neighbors only link to tables that do.
    pub fn is_renderable(&self, name: &str) -> bool {
        self.table(name).is_some_and(Table::has_primary_key)
    }

    /// The child table and foreign key a collection entry stands for.
    pub fn child_foreign_key(&self, child: &ChildCollection) -> Option<(&Table, &ForeignKey)> {
        let table = self.table(&child.child_table)?;
        let fk = table.foreign_keys.get(child.foreign_key)?;
        Some((table, fk))
    }

    pub(crate) fn tables_mut(&mut self) -> &mut Vec<Table> {
        &mut self.tables
    }

    pub(crate) fn mark_resolved(&mut self) {
        self.resolved = true;
    }

    /// Check every reference target and group referencing columns into foreign keys.
    fn group_foreign_keys(&mut self, errors: &mut Vec<ValidationError>) {
        let mut grouped = Vec::with_capacity(self.tables.len());
        for table in &self.tables {
            let mut fks: Vec<ForeignKey> = Vec::new();
            let mut open: HashMap<(String, Option<String>), usize> = HashMap::new();

            for column in &table.columns {
                let Some(reference) = &column.references else {
                    continue;
                };
                let Some(target) = self.tables.iter().find(|t| {
                    t.name == reference.table
                        && (reference.schema.is_none() || reference.schema == t.schema)
                }) else {
                    errors.push(ValidationError::UnknownForeignTable {
                        table: table.name.clone(),
                        column: column.name.clone(),
                        target_table: reference.table.clone(),
                    });
                    continue;
                };
                let Some(target_column) = target.column(&reference.column) else {
                    errors.push(ValidationError::UnknownForeignColumn {
                        table: table.name.clone(),
                        column: column.name.clone(),
                        target_table: reference.table.clone(),
                        target_column: reference.column.clone(),
                    });
                    continue;
                };
                if target_column.data_type != column.data_type {
                    tracing::warn!(
                        "{}.{} is {} but references {}.{} which is {}",
                        table.name,
                        column.name,
                        column.data_type,
                        target.name,
                        target_column.name,
                        target_column.data_type
                    );
                }

                let key = (reference.table.clone(), reference.constraint.clone());
                match open.get(&key) {
                    Some(&idx)
                        if reference.constraint.is_some()
                            || !fks[idx].target_columns.contains(&reference.column) =>
                    {
                        fks[idx].columns.push(column.name.clone());
                        fks[idx].target_columns.push(reference.column.clone());
                    }
                    _ => {
                        open.insert(key, fks.len());
                        fks.push(ForeignKey {
                            columns: vec![column.name.clone()],
                            target_table: reference.table.clone(),
                            target_columns: vec![reference.column.clone()],
                            constraint: reference.constraint.clone(),
                            parent_attr: String::new(),
                            collection_attr: String::new(),
                        });
                    }
                }
            }
            grouped.push(fks);
        }

        for (table, fks) in self.tables.iter_mut().zip(grouped) {
            table.foreign_keys = fks;
        }
    }
}

fn build_table(
    desc: &TableDescriptor,
    types: &TypeMapper,
    naming: &NamingEngine,
    policy: PrimaryKeyPolicy,
    errors: &mut Vec<ValidationError>,
) -> Option<Table> {
    let table_name = desc.name.trim().to_string();
    if desc.columns.is_empty() {
        errors.push(ValidationError::NoColumns { table: table_name });
        return None;
    }

    let mut columns = Vec::with_capacity(desc.columns.len() + 1);
    let mut seen: HashSet<String> = HashSet::new();
    for (index, col_desc) in desc.columns.iter().enumerate() {
        let column_name = col_desc.name.trim();
        let snake = naming.forms(column_name).snake.clone();
        if snake.is_empty() {
            errors.push(ValidationError::EmptyColumnName {
                table: table_name.clone(),
                index,
            });
            continue;
        }
        if !seen.insert(snake) {
            errors.push(ValidationError::DuplicateColumn {
                table: table_name.clone(),
                column: column_name.to_string(),
            });
            continue;
        }
        if let Some(column) = build_column(&table_name, col_desc, types, errors) {
            columns.push(column);
        }
    }

    let pk_count = columns.iter().filter(|c| c.primary_key).count();
    if pk_count == 0 && desc.columns.iter().all(|c| !c.primary_key) {
        match policy {
            PrimaryKeyPolicy::Defer => {}
            PrimaryKeyPolicy::Reject => errors.push(ValidationError::MissingPrimaryKey {
                table: table_name.clone(),
            }),
            PrimaryKeyPolicy::Synthesize => {
                columns.insert(0, synthetic_key(&table_name, &columns));
            }
        }
    } else if pk_count == 1 {
        if let Some(pk) = columns.iter_mut().find(|c| c.primary_key) {
            let desc_override = desc
                .columns
                .iter()
                .find(|c| c.name.trim() == pk.name)
                .and_then(|c| c.auto_generated);
            pk.auto_generated = desc_override.unwrap_or_else(|| infer_auto_generated(pk));
        }
    }

    Some(Table {
        name: table_name,
        schema: desc.schema.clone().filter(|s| !s.trim().is_empty()),
        doc: desc.doc.clone(),
        columns,
        foreign_keys: Vec::new(),
        children: Vec::new(),
    })
}

fn build_column(
    table: &str,
    desc: &ColumnDescriptor,
    types: &TypeMapper,
    errors: &mut Vec<ValidationError>,
) -> Option<Column> {
    let name = desc.name.trim();
    let references = match &desc.references {
        None => None,
        Some(reference) => match parse_reference(reference) {
            Some(parsed) => Some(parsed),
            None => {
                errors.push(ValidationError::MalformedReference {
                    table: table.to_string(),
                    column: name.to_string(),
                    reference: describe_reference(reference),
                });
                None
            }
        },
    };

    let Some(parsed) = types.parse_type_name(&desc.data_type) else {
        errors.push(ValidationError::UnknownDataType {
            table: table.to_string(),
            column: name.to_string(),
            type_name: desc.data_type.clone(),
        });
        return None;
    };

    Some(Column {
        table: table.to_string(),
        name: name.to_string(),
        data_type: parsed.data_type,
        nullable: desc.nullable && !desc.primary_key,
        primary_key: desc.primary_key,
        // Only a lone primary key is inferred; see build_table.
        auto_generated: desc.auto_generated.unwrap_or(false),
        default: desc.default.as_ref().and_then(default_text),
        length: desc.length.or(parsed.length),
        precision: desc.precision.or(parsed.precision),
        scale: desc.scale.or(parsed.scale),
        timezone: parsed.timezone,
        references,
        doc: desc.doc.clone(),
        synthetic: false,
    })
}

fn default_text(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::Null => None,
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        other => serde_json::to_string(other).ok(),
    }
}

fn parse_reference(reference: &ReferenceDescriptor) -> Option<ColumnReference> {
    let (schema, table, column, constraint) = match reference {
        ReferenceDescriptor::Path(path) => {
            let parts: Vec<&str> = path.trim().split('.').map(str::trim).collect();
            match parts.as_slice() {
                [table, column] => (None, *table, *column, None),
                [schema, table, column] => (Some(schema.to_string()), *table, *column, None),
                _ => return None,
            }
        }
        ReferenceDescriptor::Detailed {
            table,
            column,
            schema,
            constraint,
        } => (
            schema.clone(),
            table.trim(),
            column.trim(),
            constraint.clone(),
        ),
    };
    if table.is_empty() || column.is_empty() || schema.as_deref().is_some_and(str::is_empty) {
        return None;
    }
    Some(ColumnReference {
        table: table.to_string(),
        column: column.to_string(),
        schema,
        constraint,
    })
}

fn describe_reference(reference: &ReferenceDescriptor) -> String {
    match reference {
        ReferenceDescriptor::Path(path) => path.clone(),
        ReferenceDescriptor::Detailed { table, column, .. } => format!("{}.{}", table, column),
    }
}

fn infer_auto_generated(pk: &Column) -> bool {
    if pk.references.is_some() {
        return false;
    }
    match pk.data_type {
        DataType::Integer | DataType::BigInt => pk.default.is_none(),
        DataType::Uuid => match &pk.default {
            None => true,
            Some(default) => {
                let default = default.to_lowercase();
                ["uuid_generate", "gen_random_uuid", "uuid()", "newid()"]
                    .iter()
                    .any(|f| default.contains(f))
            }
        },
        _ => false,
    }
}

fn synthetic_key(table: &str, existing: &[Column]) -> Column {
    let taken = |name: &str| existing.iter().any(|c| c.name == name);
    let mut name = "id".to_string();
    let mut n = 1;
    while taken(&name) {
        name = if n == 1 {
            "row_id".to_string()
        } else {
            format!("row_id{}", n)
        };
        n += 1;
    }
    tracing::info!("{}: adding synthetic primary key '{}'", table, name);

    let mut column = Column::new(table, &name, DataType::BigInt);
    column.nullable = false;
    column.primary_key = true;
    column.auto_generated = true;
    column.synthetic = true;
    column
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::error::ViolationKind;

    fn table(name: &str, columns: Vec<ColumnDescriptor>) -> TableDescriptor {
        TableDescriptor {
            name: name.to_string(),
            columns,
            ..Default::default()
        }
    }

    fn build(tables: Vec<TableDescriptor>, policy: PrimaryKeyPolicy) -> Result<SchemaModel, ValidationReport> {
        SchemaModel::build(
            &SchemaDescriptor::new(tables),
            &TypeMapper::default(),
            &NamingEngine::default(),
            policy,
        )
    }

    #[test]
    fn test_department_employee() {
        let model = build(
            vec![
                table(
                    "department",
                    vec![
                        ColumnDescriptor::new("id", "integer").primary_key(),
                        ColumnDescriptor::new("name", "varchar(100)").not_null(),
                    ],
                ),
                table(
                    "employee",
                    vec![
                        ColumnDescriptor::new("id", "integer").primary_key(),
                        ColumnDescriptor::new("name", "text"),
                        ColumnDescriptor::new("department_id", "integer").references("department.id"),
                    ],
                ),
            ],
            PrimaryKeyPolicy::Defer,
        )
        .unwrap();

        let department = model.table("department").unwrap();
        assert!(department.columns[0].auto_generated);
        assert_eq!(department.columns[1].length, Some(100));
        assert!(!department.columns[1].nullable);

        let employee = model.table("employee").unwrap();
        assert_eq!(employee.foreign_keys.len(), 1);
        assert_eq!(employee.foreign_keys[0].columns, vec!["department_id"]);
        assert_eq!(employee.foreign_keys[0].target_table, "department");
        assert!(!model.is_resolved());
    }

    #[test]
    fn test_errors_are_aggregated() {
        let report = build(
            vec![
                table(
                    "employee",
                    vec![
                        ColumnDescriptor::new("id", "integer").primary_key(),
                        ColumnDescriptor::new("name", "text"),
                        ColumnDescriptor::new("Name", "text"),
                        ColumnDescriptor::new("shape", "geometry"),
                        ColumnDescriptor::new("team_id", "integer").references("team.id"),
                        ColumnDescriptor::new("boss_id", "integer").references("employee.uid"),
                        ColumnDescriptor::new("desk_id", "integer").references("desk"),
                    ],
                ),
                table("audit_log", vec![ColumnDescriptor::new("message", "text")]),
                table("empty", vec![]),
            ],
            PrimaryKeyPolicy::Reject,
        )
        .unwrap_err();

        assert_eq!(report.len(), 7);
        assert!(report.errors.contains(&ValidationError::DuplicateColumn {
            table: "employee".to_string(),
            column: "Name".to_string(),
        }));
        assert!(report.errors.contains(&ValidationError::MissingPrimaryKey {
            table: "audit_log".to_string(),
        }));
        assert!(report.errors.contains(&ValidationError::NoColumns {
            table: "empty".to_string(),
        }));
        assert!(report.errors.contains(&ValidationError::UnknownForeignTable {
            table: "employee".to_string(),
            column: "team_id".to_string(),
            target_table: "team".to_string(),
        }));
        assert!(report.errors.contains(&ValidationError::UnknownForeignColumn {
            table: "employee".to_string(),
            column: "boss_id".to_string(),
            target_table: "employee".to_string(),
            target_column: "uid".to_string(),
        }));
        assert!(report.errors.contains(&ValidationError::MalformedReference {
            table: "employee".to_string(),
            column: "desk_id".to_string(),
            reference: "desk".to_string(),
        }));
        assert_eq!(report.of_kind(ViolationKind::TypeMapping).count(), 1);
    }

    #[test]
    fn test_table_identifier_collision() {
        let report = build(
            vec![
                table("Employee", vec![ColumnDescriptor::new("id", "integer").primary_key()]),
                table("employees", vec![ColumnDescriptor::new("id", "integer").primary_key()]),
            ],
            PrimaryKeyPolicy::Defer,
        )
        .unwrap_err();
        assert_eq!(
            report.errors,
            vec![ValidationError::TableNameCollision {
                first: "Employee".to_string(),
                second: "employees".to_string(),
                identifier: "employee".to_string(),
            }]
        );
    }

    #[test]
    fn test_unimportable_module_names() {
        let key = || vec![ColumnDescriptor::new("id", "integer").primary_key()];
        let report = build(
            vec![
                table("Global", key()),
                table("2fa_token", key()),
                table("classroom", key()),
            ],
            PrimaryKeyPolicy::Defer,
        )
        .unwrap_err();
        assert_eq!(
            report.errors,
            vec![
                ValidationError::ReservedTableName {
                    table: "Global".to_string(),
                    identifier: "global".to_string(),
                },
                ValidationError::ReservedTableName {
                    table: "2fa_token".to_string(),
                    identifier: "2fa_token".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_primary_key_policies() {
        let log = || {
            table(
                "audit_log",
                vec![
                    ColumnDescriptor::new("id", "text"),
                    ColumnDescriptor::new("message", "text"),
                ],
            )
        };

        let deferred = build(vec![log()], PrimaryKeyPolicy::Defer).unwrap();
        assert!(!deferred.tables()[0].has_primary_key());

        let synthesized = build(vec![log()], PrimaryKeyPolicy::Synthesize).unwrap();
        let pk = &synthesized.tables()[0].columns[0];
        assert_eq!(pk.name, "row_id");
        assert!(pk.primary_key && pk.auto_generated && pk.synthetic);
        assert_eq!(pk.data_type, DataType::BigInt);
        assert_eq!(synthesized.tables()[0].columns.len(), 3);
    }

    #[test]
    fn test_composite_and_repeated_targets() {
        let model = build(
            vec![
                table(
                    "order_line",
                    vec![
                        ColumnDescriptor::new("order_id", "integer").primary_key(),
                        ColumnDescriptor::new("line_no", "integer").primary_key(),
                    ],
                ),
                table(
                    "shipment_item",
                    vec![
                        ColumnDescriptor::new("id", "uuid").primary_key(),
                        ColumnDescriptor::new("order_id", "integer").references("order_line.order_id"),
                        ColumnDescriptor::new("line_no", "integer").references("order_line.line_no"),
                        ColumnDescriptor::new("replaces_order_id", "integer")
                            .references("order_line.order_id"),
                    ],
                ),
            ],
            PrimaryKeyPolicy::Defer,
        )
        .unwrap();

        let line = model.table("order_line").unwrap();
        assert!(line.columns.iter().all(|c| !c.auto_generated));

        let item = model.table("shipment_item").unwrap();
        assert!(item.columns[0].auto_generated);
        assert_eq!(item.foreign_keys.len(), 2);
        assert!(item.foreign_keys[0].is_composite());
        assert_eq!(item.foreign_keys[0].target_columns, vec!["order_id", "line_no"]);
        assert_eq!(item.foreign_keys[1].columns, vec!["replaces_order_id"]);
    }

    #[test]
    fn test_defaults_and_auto_generation() {
        let model = build(
            vec![table(
                "event",
                vec![
                    ColumnDescriptor::new("id", "uuid")
                        .primary_key()
                        .with_default("gen_random_uuid()"),
                    ColumnDescriptor::new("created_at", "timestamptz").with_default("now()"),
                    ColumnDescriptor::new("priority", "integer").with_default("0"),
                ],
            )],
            PrimaryKeyPolicy::Defer,
        )
        .unwrap();
        let event = &model.tables()[0];
        assert!(event.columns[0].auto_generated);
        assert!(event.columns[1].default_is_now());
        assert!(event.columns[1].timezone);
        assert!(!event.columns[2].default_is_now());
    }
}
