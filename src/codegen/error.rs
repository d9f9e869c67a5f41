//! Error types for schema validation, rendering and output.
//!
//! Validation problems are collected rather than returned one at a time so a
//! schema author can fix everything in a single pass. Render and write errors
//! are scoped to one table and never abort the whole run.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::codegen::layers::Layer;
use crate::codegen::type_mapper::TypeTarget;

/// Broad category of a validation problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    SchemaValidation,
    TypeMapping,
}

/// A single problem found while validating the schema or the type mapping table.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("table name cannot be empty (table #{index})")]
    EmptyTableName { index: usize },

    #[error("table '{table}' is declared more than once")]
    DuplicateTable { table: String },

    #[error("tables '{first}' and '{second}' both map to the identifier '{identifier}'")]
    TableNameCollision {
        first: String,
        second: String,
        identifier: String,
    },

    #[error("table '{table}' maps to the module name '{identifier}', which Python cannot import")]
    ReservedTableName { table: String, identifier: String },

    #[error("table '{table}' has no columns")]
    NoColumns { table: String },

    #[error("table '{table}': column name cannot be empty (column #{index})")]
    EmptyColumnName { table: String, index: usize },

    #[error("table '{table}': duplicate column '{column}'")]
    DuplicateColumn { table: String, column: String },

    #[error("table '{table}' has no primary key")]
    MissingPrimaryKey { table: String },

    #[error("table '{table}', column '{column}': malformed reference '{reference}' (expected table.column)")]
    MalformedReference {
        table: String,
        column: String,
        reference: String,
    },

    #[error("table '{table}', column '{column}': references unknown table '{target_table}'")]
    UnknownForeignTable {
        table: String,
        column: String,
        target_table: String,
    },

    #[error("table '{table}', column '{column}': references unknown column '{target_table}.{target_column}'")]
    UnknownForeignColumn {
        table: String,
        column: String,
        target_table: String,
        target_column: String,
    },

    #[error("table '{table}', column '{column}': unknown data type '{type_name}'")]
    UnknownDataType {
        table: String,
        column: String,
        type_name: String,
    },

    #[error("type mapping: no {target} representation for '{data_type}'")]
    UnmappedType { data_type: String, target: TypeTarget },

    #[error("type mapping: alias '{alias}' points at unknown type '{target}'")]
    UnknownAliasTarget { alias: String, target: String },
}

impl ValidationError {
    pub fn kind(&self) -> ViolationKind {
        match self {
            ValidationError::UnknownDataType { .. }
            | ValidationError::UnmappedType { .. }
            | ValidationError::UnknownAliasTarget { .. } => ViolationKind::TypeMapping,
            _ => ViolationKind::SchemaValidation,
        }
    }
}

/// Every violation found during the Validating phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub errors: Vec<ValidationError>,
}

impl ValidationReport {
    pub fn new(errors: Vec<ValidationError>) -> Self {
        Self { errors }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn of_kind(&self, kind: ViolationKind) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter().filter(move |e| e.kind() == kind)
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} validation error(s):", self.errors.len())?;
        for error in &self.errors {
            write!(f, "\n  - {}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationReport {}

/// A layer could not be rendered for a table.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("table '{table}', layer {layer}: requires {attribute}, which the table does not have")]
    MissingAttribute {
        table: String,
        layer: Layer,
        attribute: &'static str,
    },

    #[error("formatting failed")]
    Format(#[from] fmt::Error),
}

/// Writing a rendered artifact to disk failed.
#[derive(Error, Debug)]
#[error("failed to write {}: {source}", path.display())]
pub struct WriteError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Why one table's (or the scaffold's) artifacts were not all produced.
#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Write(#[from] WriteError),
}

/// Failure while loading the schema description.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("schema path does not exist: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("no tables found in {}", .0.display())]
    Empty(PathBuf),
}

/// Failure while loading or interpreting `crudgen.yaml`.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("unsupported {setting} '{value}' (expected one of: {expected})")]
    InvalidValue {
        setting: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// Run-level failure. Table-scoped failures are reported in the
/// [`GenerationReport`](crate::codegen::orchestration::GenerationReport) instead.
#[derive(Error, Debug)]
pub enum GenerateError {
    #[error(transparent)]
    Validation(#[from] ValidationReport),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_violation_kinds() {
        let schema = ValidationError::DuplicateColumn {
            table: "employee".to_string(),
            column: "name".to_string(),
        };
        let types = ValidationError::UnknownDataType {
            table: "employee".to_string(),
            column: "name".to_string(),
            type_name: "geometry".to_string(),
        };
        assert_eq!(schema.kind(), ViolationKind::SchemaValidation);
        assert_eq!(types.kind(), ViolationKind::TypeMapping);
    }

    #[test]
    fn test_report_lists_every_error() {
        let report = ValidationReport::new(vec![
            ValidationError::NoColumns { table: "a".to_string() },
            ValidationError::MissingPrimaryKey { table: "b".to_string() },
        ]);
        let text = report.to_string();
        assert!(text.starts_with("2 validation error(s):"));
        assert!(text.contains("table 'a' has no columns"));
        assert!(text.contains("table 'b' has no primary key"));
    }
}
