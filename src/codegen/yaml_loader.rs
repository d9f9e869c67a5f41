//! Schema description loader.
//!
//! A schema path is either one file or a directory of files. Each file holds
//! `{ tables: [...] }` or a bare list of tables, in YAML or JSON (JSON is read
//! by the same YAML parser).

use serde_yaml::Value;
use std::fs;
use std::path::{Path, PathBuf};

use crate::codegen::error::LoadError;
use crate::codegen::types::{SchemaDescriptor, TableDescriptor};

const SCHEMA_EXTENSIONS: &[&str] = &["yaml", "yml", "json"];

/// Load a schema description from a file or directory
///
/// # Arguments
///
/// * `path` - A schema file, or a directory whose `.yaml`/`.yml`/`.json`
///   files are read in file-name order
///
/// # Example
///
/// ```ignore
/// use crudgen::codegen::load_schema;
///
/// let schema = load_schema("schema/hr.yaml").unwrap();
/// ```
pub fn load_schema<P: AsRef<Path>>(path: P) -> Result<SchemaDescriptor, LoadError> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }

    let files = if path.is_dir() {
        schema_files(path)?
    } else {
        vec![path.to_path_buf()]
    };

    let mut tables = Vec::new();
    for file in &files {
        let loaded = load_schema_file(file)?;
        tracing::debug!(file = %file.display(), tables = loaded.len(), "Loaded schema file");
        tables.extend(loaded);
    }

    if tables.is_empty() {
        return Err(LoadError::Empty(path.to_path_buf()));
    }

    Ok(SchemaDescriptor::new(tables))
}

/// Schema files of a directory, sorted by file name
fn schema_files(dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
    let io_error = |source| LoadError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_error)? {
        let path = entry.map_err(io_error)?.path();
        let is_schema = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| SCHEMA_EXTENSIONS.contains(&ext.to_lowercase().as_str()));
        if path.is_file() && is_schema {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Load the tables of a single schema file
pub fn load_schema_file<P: AsRef<Path>>(path: P) -> Result<Vec<TableDescriptor>, LoadError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_schema(&contents).map_err(|message| LoadError::Parse {
        path: path.to_path_buf(),
        message,
    })
}

/// Parse schema text in either accepted shape
pub fn parse_schema(contents: &str) -> Result<Vec<TableDescriptor>, String> {
    let value: Value = serde_yaml::from_str(contents).map_err(|e| e.to_string())?;
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Sequence(_) => serde_yaml::from_value(value).map_err(|e| e.to_string()),
        Value::Mapping(ref map) => {
            if !map.contains_key("tables") {
                return Err("expected a 'tables' key or a list of tables".to_string());
            }
            let descriptor: SchemaDescriptor =
                serde_yaml::from_value(value).map_err(|e| e.to_string())?;
            Ok(descriptor.tables)
        }
        _ => Err("expected a mapping with 'tables' or a list of tables".to_string()),
    }
}
