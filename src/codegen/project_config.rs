//! Project configuration schema for crudgen.yaml
//!
//! Every section is optional; an empty file yields the default options.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::codegen::backend::DatabaseType;
use crate::codegen::error::ConfigError;
use crate::codegen::layers::Layer;
use crate::codegen::naming::NamingRules;
use crate::codegen::schema::PrimaryKeyPolicy;
use crate::codegen::type_mapper::TypesConfig;

/// Top-level project configuration from crudgen.yaml
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CrudgenConfig {
    #[serde(default)]
    pub project: ProjectSection,
    #[serde(default)]
    pub database: DatabaseSection,
    #[serde(default)]
    pub generation: GenerationSection,
    #[serde(default)]
    pub naming: NamingConfig,
    #[serde(default)]
    pub types: TypesConfig,
}

/// Project metadata and output directory names
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProjectSection {
    #[serde(default = "default_project_name")]
    pub name: String,
    #[serde(default = "default_backend_dir")]
    pub backend_dir: String,
    #[serde(default = "default_frontend_dir")]
    pub frontend_dir: String,
}

impl Default for ProjectSection {
    fn default() -> Self {
        Self {
            name: default_project_name(),
            backend_dir: default_backend_dir(),
            frontend_dir: default_frontend_dir(),
        }
    }
}

fn default_project_name() -> String {
    "crud_app".to_string()
}

fn default_backend_dir() -> String {
    "backend".to_string()
}

fn default_frontend_dir() -> String {
    "frontend".to_string()
}

fn default_api_base_url() -> String {
    "http://localhost:8000".to_string()
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DatabaseSection {
    /// postgresql, mysql, mariadb, sqlite or mssql
    #[serde(rename = "type", default)]
    pub db_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GenerationSection {
    #[serde(default)]
    pub layers: Option<String>,
    #[serde(default)]
    pub overwrite: OverwritePolicy,
    #[serde(default)]
    pub primary_key_policy: PrimaryKeyPolicy,
    /// Tables whose read endpoint loads child collections
    #[serde(default)]
    pub eager_load: Vec<String>,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
}

impl Default for GenerationSection {
    fn default() -> Self {
        Self {
            layers: None,
            overwrite: OverwritePolicy::default(),
            primary_key_policy: PrimaryKeyPolicy::default(),
            eager_load: Vec::new(),
            api_base_url: default_api_base_url(),
        }
    }
}

/// Extra inflection rules, merged over the built-in ones
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NamingConfig {
    /// singular: plural
    #[serde(default)]
    pub irregular: IndexMap<String, String>,
    #[serde(default)]
    pub uncountable: Vec<String>,
}

impl NamingConfig {
    pub fn to_rules(&self) -> NamingRules {
        let mut rules = NamingRules::default();
        for (singular, plural) in &self.irregular {
            rules.add_irregular(singular, plural);
        }
        for word in &self.uncountable {
            rules.add_uncountable(word);
        }
        rules
    }
}

/// Which half of the skeleton to emit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerSelection {
    Backend,
    Frontend,
    #[default]
    Both,
}

impl LayerSelection {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "backend" => Some(LayerSelection::Backend),
            "frontend" => Some(LayerSelection::Frontend),
            "both" | "all" => Some(LayerSelection::Both),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LayerSelection::Backend => "backend",
            LayerSelection::Frontend => "frontend",
            LayerSelection::Both => "both",
        }
    }

    pub fn includes(&self, layer: Layer) -> bool {
        match self {
            LayerSelection::Backend => layer.is_backend(),
            LayerSelection::Frontend => !layer.is_backend(),
            LayerSelection::Both => true,
        }
    }

    /// Selected layers in render order.
    pub fn layers(&self) -> Vec<Layer> {
        Layer::ALL.into_iter().filter(|l| self.includes(*l)).collect()
    }
}

/// What to do when a target file already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverwritePolicy {
    #[default]
    Always,
    SkipExisting,
}

/// Everything a generation run needs besides the schema and output root.
#[derive(Debug, Clone)]
pub struct GenerationOptions {
    pub layers: LayerSelection,
    pub overwrite: OverwritePolicy,
    pub primary_key_policy: PrimaryKeyPolicy,
    pub database: DatabaseType,
    pub eager_load: Vec<String>,
    pub api_base_url: String,
    pub project_name: String,
    pub backend_dir: String,
    pub frontend_dir: String,
    pub naming: NamingConfig,
    pub types: TypesConfig,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            layers: LayerSelection::default(),
            overwrite: OverwritePolicy::default(),
            primary_key_policy: PrimaryKeyPolicy::default(),
            database: DatabaseType::default(),
            eager_load: Vec::new(),
            api_base_url: default_api_base_url(),
            project_name: default_project_name(),
            backend_dir: default_backend_dir(),
            frontend_dir: default_frontend_dir(),
            naming: NamingConfig::default(),
            types: TypesConfig::default(),
        }
    }
}

impl CrudgenConfig {
    /// Load project configuration from crudgen.yaml
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_yaml(contents: &str) -> Result<Self, serde_yaml::Error> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(contents)
    }

    /// Options described by this file alone, without CLI or environment overrides.
    pub fn to_options(&self) -> Result<GenerationOptions, ConfigError> {
        let database = match &self.database.db_type {
            Some(value) => parse_database(value)?,
            None => DatabaseType::default(),
        };
        let layers = match &self.generation.layers {
            Some(value) => parse_layers(value)?,
            None => LayerSelection::default(),
        };

        Ok(GenerationOptions {
            layers,
            overwrite: self.generation.overwrite,
            primary_key_policy: self.generation.primary_key_policy,
            database,
            eager_load: self.generation.eager_load.clone(),
            api_base_url: self.generation.api_base_url.clone(),
            project_name: self.project.name.clone(),
            backend_dir: self.project.backend_dir.clone(),
            frontend_dir: self.project.frontend_dir.clone(),
            naming: self.naming.clone(),
            types: self.types.clone(),
        })
    }
}

pub fn parse_database(value: &str) -> Result<DatabaseType, ConfigError> {
    DatabaseType::parse(value).ok_or_else(|| ConfigError::InvalidValue {
        setting: "database type",
        value: value.to_string(),
        expected: "postgresql, mysql, mariadb, sqlite, mssql",
    })
}

pub fn parse_layers(value: &str) -> Result<LayerSelection, ConfigError> {
    LayerSelection::parse(value).ok_or_else(|| ConfigError::InvalidValue {
        setting: "layer selection",
        value: value.to_string(),
        expected: "backend, frontend, both",
    })
}
