//! Type definitions for the schema description consumed by the generator.
//!
//! These types mirror the YAML/JSON schema files one-to-one. They carry no
//! validation; [`SchemaModel::build`](crate::codegen::schema::SchemaModel::build)
//! turns them into the checked intermediate representation.

use serde::{Deserialize, Serialize};
use std::fmt;

fn default_nullable() -> bool {
    true
}

/// Top-level schema document: `{ tables: [...] }`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SchemaDescriptor {
    #[serde(default)]
    pub tables: Vec<TableDescriptor>,
}

impl SchemaDescriptor {
    pub fn new(tables: Vec<TableDescriptor>) -> Self {
        Self { tables }
    }
}

/// Table definition in a schema file
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TableDescriptor {
    /// Raw table name
    pub name: String,
    /// Optional schema/namespace qualifier (e.g. "hr")
    #[serde(default)]
    pub schema: Option<String>,
    /// Columns in declaration order
    #[serde(default)]
    pub columns: Vec<ColumnDescriptor>,
    /// Documentation string
    #[serde(default)]
    pub doc: Option<String>,
}

/// Column definition in a schema file
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ColumnDescriptor {
    /// Raw column name
    pub name: String,
    /// Type name, canonical ("text") or SQL spelling ("varchar(100)")
    #[serde(rename = "type")]
    pub data_type: String,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
    #[serde(default)]
    pub primary_key: bool,
    /// Raw SQL default (e.g. "now()", "0", "'draft'")
    #[serde(default)]
    pub default: Option<serde_yaml::Value>,
    /// Overrides auto-generated key inference
    #[serde(default)]
    pub auto_generated: Option<bool>,
    #[serde(default)]
    pub length: Option<u32>,
    #[serde(default)]
    pub precision: Option<u32>,
    #[serde(default)]
    pub scale: Option<u32>,
    #[serde(default)]
    pub references: Option<ReferenceDescriptor>,
    #[serde(default)]
    pub doc: Option<String>,
}

impl ColumnDescriptor {
    /// Shorthand used by tests and programmatic callers.
    pub fn new(name: &str, data_type: &str) -> Self {
        Self {
            name: name.to_string(),
            data_type: data_type.to_string(),
            nullable: true,
            primary_key: false,
            default: None,
            auto_generated: None,
            length: None,
            precision: None,
            scale: None,
            references: None,
            doc: None,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn references(mut self, target: &str) -> Self {
        self.references = Some(ReferenceDescriptor::Path(target.to_string()));
        self
    }

    pub fn with_default(mut self, default: &str) -> Self {
        self.default = Some(serde_yaml::Value::String(default.to_string()));
        self
    }
}

/// Foreign-key target of a column
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ReferenceDescriptor {
    /// "table.column" or "schema.table.column"
    Path(String),
    Detailed {
        table: String,
        column: String,
        #[serde(default)]
        schema: Option<String>,
        /// Columns sharing a constraint name form one composite key
        #[serde(default)]
        constraint: Option<String>,
    },
}

/// Closed set of abstract column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DataType {
    #[serde(rename = "integer")]
    Integer,
    #[serde(rename = "bigint")]
    BigInt,
    #[serde(rename = "decimal")]
    Decimal,
    #[serde(rename = "text")]
    Text,
    #[serde(rename = "long-text", alias = "long_text")]
    LongText,
    #[serde(rename = "boolean")]
    Boolean,
    #[serde(rename = "date")]
    Date,
    #[serde(rename = "timestamp")]
    Timestamp,
    #[serde(rename = "uuid")]
    Uuid,
    #[serde(rename = "json")]
    Json,
    #[serde(rename = "binary")]
    Binary,
}

impl DataType {
    pub const ALL: [DataType; 11] = [
        DataType::Integer,
        DataType::BigInt,
        DataType::Decimal,
        DataType::Text,
        DataType::LongText,
        DataType::Boolean,
        DataType::Date,
        DataType::Timestamp,
        DataType::Uuid,
        DataType::Json,
        DataType::Binary,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Integer => "integer",
            DataType::BigInt => "bigint",
            DataType::Decimal => "decimal",
            DataType::Text => "text",
            DataType::LongText => "long-text",
            DataType::Boolean => "boolean",
            DataType::Date => "date",
            DataType::Timestamp => "timestamp",
            DataType::Uuid => "uuid",
            DataType::Json => "json",
            DataType::Binary => "binary",
        }
    }

    /// Parse a canonical name (not an alias).
    pub fn from_name(name: &str) -> Option<DataType> {
        let name = name.trim().to_lowercase();
        if name == "long_text" {
            return Some(DataType::LongText);
        }
        DataType::ALL.into_iter().find(|t| t.as_str() == name)
    }

    /// Position in [`DataType::ALL`]
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, DataType::Integer | DataType::BigInt)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_wrapped_yaml() {
        let yaml = r#"
tables:
  - name: department
    columns:
      - { name: id, type: integer, primary_key: true, nullable: false }
      - { name: name, type: varchar(100) }
  - name: employee
    schema: hr
    columns:
      - { name: id, type: integer, primary_key: true }
      - name: department_id
        type: integer
        references: department.id
      - name: mentor_id
        type: integer
        references: { table: employee, column: id, constraint: fk_mentor }
"#;
        let doc: SchemaDescriptor = serde_yaml::from_str(yaml).unwrap();
        let tables = doc.tables;
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[1].schema.as_deref(), Some("hr"));
        assert!(tables[0].columns[1].nullable);
        assert!(matches!(
            tables[1].columns[1].references,
            Some(ReferenceDescriptor::Path(ref p)) if p == "department.id"
        ));
        assert!(matches!(
            tables[1].columns[2].references,
            Some(ReferenceDescriptor::Detailed { ref constraint, .. }) if constraint.as_deref() == Some("fk_mentor")
        ));
    }

    #[test]
    fn test_parse_table_list_json() {
        let json = r#"[{"name": "tag", "columns": [{"name": "id", "type": "uuid", "primary_key": true}]}]"#;
        let tables: Vec<TableDescriptor> = serde_json::from_str(json).unwrap();
        assert_eq!(tables[0].name, "tag");
    }

    #[test]
    fn test_unknown_column_field_is_rejected() {
        let yaml = "name: t\ncolumns:\n  - { name: id, type: integer, primary: true }\n";
        assert!(serde_yaml::from_str::<TableDescriptor>(yaml).is_err());
    }

    #[test]
    fn test_data_type_names() {
        assert_eq!(DataType::from_name("BIGINT"), Some(DataType::BigInt));
        assert_eq!(DataType::from_name("long_text"), Some(DataType::LongText));
        assert_eq!(DataType::from_name("varchar"), None);
        for (i, t) in DataType::ALL.iter().enumerate() {
            assert_eq!(t.index(), i);
            assert_eq!(DataType::from_name(t.as_str()), Some(*t));
        }
    }
}
