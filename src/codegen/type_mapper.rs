//! Maps abstract column types to the representation each output layer needs.
//!
//! The mapping table is validated for totality when the mapper is built, so
//! [`TypeMapper::map`] never fails during rendering.

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;
use uuid::Uuid;

use crate::codegen::error::ValidationError;
use crate::codegen::naming::to_snake_case;
use crate::codegen::schema::Column;
use crate::codegen::types::DataType;

static TYPE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([A-Za-z][A-Za-z0-9_ \-]*?)\s*(?:\(\s*(\d+)\s*(?:,\s*(\d+)\s*)?\))?\s*$")
        .expect("valid type name regex")
});

/// Which layer a representation is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TypeTarget {
    /// SQLAlchemy column type
    Persistence,
    /// Pydantic field annotation
    Validation,
    /// HTML input type
    Display,
    /// JavaScript type name
    Client,
    /// Sample value for generated tests
    DefaultSample,
}

impl TypeTarget {
    pub const ALL: [TypeTarget; 5] = [
        TypeTarget::Persistence,
        TypeTarget::Validation,
        TypeTarget::Display,
        TypeTarget::Client,
        TypeTarget::DefaultSample,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TypeTarget::Persistence => "persistence",
            TypeTarget::Validation => "validation",
            TypeTarget::Display => "display",
            TypeTarget::Client => "client",
            TypeTarget::DefaultSample => "default-sample",
        }
    }
}

impl fmt::Display for TypeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Complete row of the mapping table for one abstract type.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerTypes {
    pub persistence: String,
    pub validation: String,
    pub display: String,
    pub client: String,
    pub default_sample: Value,
}

/// Partial row, as written in configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LayerTypesOverride {
    #[serde(default)]
    pub persistence: Option<String>,
    #[serde(default)]
    pub validation: Option<String>,
    #[serde(default)]
    pub display: Option<String>,
    #[serde(default)]
    pub client: Option<String>,
    #[serde(default, rename = "default-sample", alias = "default_sample")]
    pub default_sample: Option<Value>,
}

impl LayerTypesOverride {
    fn from_full(full: &LayerTypes) -> Self {
        Self {
            persistence: Some(full.persistence.clone()),
            validation: Some(full.validation.clone()),
            display: Some(full.display.clone()),
            client: Some(full.client.clone()),
            default_sample: Some(full.default_sample.clone()),
        }
    }

    fn merge(&mut self, other: &LayerTypesOverride) {
        if other.persistence.is_some() {
            self.persistence = other.persistence.clone();
        }
        if other.validation.is_some() {
            self.validation = other.validation.clone();
        }
        if other.display.is_some() {
            self.display = other.display.clone();
        }
        if other.client.is_some() {
            self.client = other.client.clone();
        }
        if other.default_sample.is_some() {
            self.default_sample = other.default_sample.clone();
        }
    }

    fn has(&self, target: TypeTarget) -> bool {
        match target {
            TypeTarget::Persistence => self.persistence.is_some(),
            TypeTarget::Validation => self.validation.is_some(),
            TypeTarget::Display => self.display.is_some(),
            TypeTarget::Client => self.client.is_some(),
            TypeTarget::DefaultSample => self.default_sample.is_some(),
        }
    }

    fn complete(self) -> Option<LayerTypes> {
        Some(LayerTypes {
            persistence: self.persistence?,
            validation: self.validation?,
            display: self.display?,
            client: self.client?,
            default_sample: self.default_sample?,
        })
    }
}

/// `types:` section of `crudgen.yaml`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TypesConfig {
    /// Start from an empty table instead of the built-in one
    #[serde(default)]
    pub replace_defaults: bool,
    /// Extra type-name spellings, e.g. `citext: text`
    #[serde(default)]
    pub aliases: IndexMap<String, String>,
    #[serde(default)]
    pub overrides: IndexMap<DataType, LayerTypesOverride>,
}

/// A type name from a schema file after alias resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedType {
    pub data_type: DataType,
    pub length: Option<u32>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
    pub timezone: bool,
}

const BUILTIN_ALIASES: &[(&str, DataType)] = &[
    ("int", DataType::Integer),
    ("int2", DataType::Integer),
    ("int4", DataType::Integer),
    ("smallint", DataType::Integer),
    ("tinyint", DataType::Integer),
    ("mediumint", DataType::Integer),
    ("serial", DataType::Integer),
    ("smallserial", DataType::Integer),
    ("int8", DataType::BigInt),
    ("bigserial", DataType::BigInt),
    ("big-int", DataType::BigInt),
    ("numeric", DataType::Decimal),
    ("number", DataType::Decimal),
    ("float", DataType::Decimal),
    ("float4", DataType::Decimal),
    ("float8", DataType::Decimal),
    ("real", DataType::Decimal),
    ("double", DataType::Decimal),
    ("double precision", DataType::Decimal),
    ("money", DataType::Decimal),
    ("varchar", DataType::Text),
    ("varchar2", DataType::Text),
    ("nvarchar", DataType::Text),
    ("char", DataType::Text),
    ("nchar", DataType::Text),
    ("character", DataType::Text),
    ("character varying", DataType::Text),
    ("string", DataType::Text),
    ("citext", DataType::Text),
    ("tinytext", DataType::Text),
    ("longtext", DataType::LongText),
    ("mediumtext", DataType::LongText),
    ("ntext", DataType::LongText),
    ("clob", DataType::LongText),
    ("bool", DataType::Boolean),
    ("bit", DataType::Boolean),
    ("datetime", DataType::Timestamp),
    ("datetime2", DataType::Timestamp),
    ("smalldatetime", DataType::Timestamp),
    ("timestamptz", DataType::Timestamp),
    ("timestamp with time zone", DataType::Timestamp),
    ("timestamp without time zone", DataType::Timestamp),
    ("datetimeoffset", DataType::Timestamp),
    ("uniqueidentifier", DataType::Uuid),
    ("jsonb", DataType::Json),
    ("bytea", DataType::Binary),
    ("blob", DataType::Binary),
    ("longblob", DataType::Binary),
    ("varbinary", DataType::Binary),
    ("bytes", DataType::Binary),
];

fn row(
    persistence: &str,
    validation: &str,
    display: &str,
    client: &str,
    default_sample: Value,
) -> LayerTypes {
    LayerTypes {
        persistence: persistence.to_string(),
        validation: validation.to_string(),
        display: display.to_string(),
        client: client.to_string(),
        default_sample,
    }
}

/// Built-in mapping table, one row per [`DataType`].
pub fn default_layer_types(data_type: DataType) -> LayerTypes {
    use serde_json::json;
    match data_type {
        DataType::Integer => row("Integer", "int", "number", "number", json!(1)),
        DataType::BigInt => row("BigInteger", "int", "number", "number", json!(1)),
        DataType::Decimal => row("Numeric", "Decimal", "number", "number", json!(1.0)),
        DataType::Text => row("String", "str", "text", "string", json!("sample {column}")),
        DataType::LongText => row("Text", "str", "textarea", "string", json!("sample text")),
        DataType::Boolean => row("Boolean", "bool", "checkbox", "boolean", json!(true)),
        DataType::Date => row("Date", "date", "date", "string", json!("2024-01-01")),
        DataType::Timestamp => row(
            "DateTime",
            "datetime",
            "datetime-local",
            "string",
            json!("2024-01-01T12:00:00"),
        ),
        DataType::Uuid => row("Uuid", "UUID", "text", "string", json!("{uuid}")),
        DataType::Json => row("JSON", "dict[str, Any]", "textarea", "object", json!({})),
        DataType::Binary => row("LargeBinary", "bytes", "text", "string", json!("c2FtcGxl")),
    }
}

/// Total mapping from abstract type to per-layer representation.
#[derive(Debug, Clone)]
pub struct TypeMapper {
    /// Indexed by [`DataType::index`]; always holds every type.
    table: Vec<LayerTypes>,
    aliases: HashMap<String, DataType>,
}

impl Default for TypeMapper {
    fn default() -> Self {
        Self {
            table: DataType::ALL.iter().map(|t| default_layer_types(*t)).collect(),
            aliases: builtin_aliases(),
        }
    }
}

fn builtin_aliases() -> HashMap<String, DataType> {
    BUILTIN_ALIASES
        .iter()
        .map(|(name, data_type)| (name.to_string(), *data_type))
        .collect()
}

fn normalize_type_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

impl TypeMapper {
    /// Build a mapper from configuration, reporting every missing cell and bad alias.
    pub fn from_config(config: &TypesConfig) -> Result<Self, Vec<ValidationError>> {
        let (mapper, errors) = Self::from_config_partial(config);
        if errors.is_empty() {
            Ok(mapper)
        } else {
            Err(errors)
        }
    }

    /// Like [`TypeMapper::from_config`], but always returns a usable mapper:
    /// incomplete rows fall back to the built-in row and bad aliases are dropped.
    /// Lets schema validation continue so all violations are reported together.
    pub fn from_config_partial(config: &TypesConfig) -> (Self, Vec<ValidationError>) {
        let mut cells: IndexMap<DataType, LayerTypesOverride> = IndexMap::new();
        if !config.replace_defaults {
            for data_type in DataType::ALL {
                cells.insert(
                    data_type,
                    LayerTypesOverride::from_full(&default_layer_types(data_type)),
                );
            }
        }
        for (data_type, cell) in &config.overrides {
            cells.entry(*data_type).or_default().merge(cell);
        }

        let mut errors = Vec::new();
        let mut table = Vec::with_capacity(DataType::ALL.len());
        for data_type in DataType::ALL {
            let cell = cells.shift_remove(&data_type).unwrap_or_default();
            for target in TypeTarget::ALL {
                if !cell.has(target) {
                    errors.push(ValidationError::UnmappedType {
                        data_type: data_type.as_str().to_string(),
                        target,
                    });
                }
            }
            table.push(
                cell.complete()
                    .unwrap_or_else(|| default_layer_types(data_type)),
            );
        }

        let mut aliases = builtin_aliases();
        for (alias, target) in &config.aliases {
            match DataType::from_name(target) {
                Some(data_type) => {
                    aliases.insert(normalize_type_name(alias), data_type);
                }
                None => errors.push(ValidationError::UnknownAliasTarget {
                    alias: alias.clone(),
                    target: target.clone(),
                }),
            }
        }

        (Self { table, aliases }, errors)
    }

    pub fn layer_types(&self, data_type: DataType) -> &LayerTypes {
        &self.table[data_type.index()]
    }

    /// Resolve a schema-file type name such as `VARCHAR(100)` or `numeric(10, 2)`.
    pub fn parse_type_name(&self, name: &str) -> Option<ParsedType> {
        let caps = TYPE_NAME.captures(name)?;
        let base = normalize_type_name(caps.get(1)?.as_str());
        let first: Option<u32> = caps.get(2).and_then(|m| m.as_str().parse().ok());
        let second: Option<u32> = caps.get(3).and_then(|m| m.as_str().parse().ok());

        let data_type = DataType::from_name(&base).or_else(|| self.aliases.get(&base).copied())?;
        let timezone = base == "timestamptz"
            || base == "datetimeoffset"
            || base == "timestamp with time zone";

        let mut parsed = ParsedType {
            data_type,
            length: None,
            precision: None,
            scale: None,
            timezone,
        };
        match data_type {
            DataType::Text => parsed.length = first,
            DataType::Decimal => {
                parsed.precision = first;
                parsed.scale = second;
            }
            _ => {}
        }
        Some(parsed)
    }

    /// Representation of `column` for `target`. Samples are rendered as JSON text.
    pub fn map(&self, column: &Column, target: TypeTarget) -> String {
        let types = self.layer_types(column.data_type);
        match target {
            TypeTarget::Persistence => persistence_type(&types.persistence, column),
            TypeTarget::Validation => types.validation.clone(),
            TypeTarget::Display => types.display.clone(),
            TypeTarget::Client => types.client.clone(),
            TypeTarget::DefaultSample => self.sample(column).to_string(),
        }
    }

    /// Sample value for `column` with `{column}` and `{uuid}` expanded.
    pub fn sample(&self, column: &Column) -> Value {
        expand_placeholders(&self.layer_types(column.data_type).default_sample, column)
    }
}

fn persistence_type(base: &str, column: &Column) -> String {
    if base.contains('(') {
        return base.to_string();
    }
    match (column.data_type, column.length, column.precision, column.scale) {
        (DataType::Text, Some(length), _, _) => format!("{}({})", base, length),
        (DataType::Decimal, _, Some(precision), Some(scale)) => {
            format!("{}({}, {})", base, precision, scale)
        }
        (DataType::Decimal, _, Some(precision), None) => format!("{}({})", base, precision),
        (DataType::Timestamp, ..) if column.timezone => format!("{}(timezone=True)", base),
        _ => base.to_string(),
    }
}

fn expand_placeholders(value: &Value, column: &Column) -> Value {
    match value {
        Value::String(s) if s.contains('{') => {
            let mut text = s.replace("{column}", &to_snake_case(&column.name));
            if text.contains("{uuid}") {
                let seed = format!("{}.{}", column.table, column.name);
                let id = Uuid::new_v5(&Uuid::NAMESPACE_OID, seed.as_bytes());
                text = text.replace("{uuid}", &id.to_string());
            }
            Value::String(text)
        }
        Value::Array(items) => {
            Value::Array(items.iter().map(|v| expand_placeholders(v, column)).collect())
        }
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), expand_placeholders(v, column)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Render a JSON value as a Python literal.
pub fn python_literal(value: &Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(_) => value.to_string(),
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(python_literal).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Object(map) => {
            let entries: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{}: {}", Value::String(k.clone()), python_literal(v)))
                .collect();
            format!("{{{}}}", entries.join(", "))
        }
    }
}

/// Render a JSON value as a JavaScript literal.
pub fn js_literal(value: &Value) -> String {
    value.to_string()
}
