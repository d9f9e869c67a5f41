//! Schema-driven CRUD application generator.
//!
//! A run moves through four phases: the schema description is loaded
//! ([`yaml_loader`]), validated into a [`SchemaModel`] ([`schema`],
//! [`type_mapper`]), its relationships resolved ([`relationships`]), and
//! every table rendered through every selected [`Layer`] ([`renderer`])
//! and written under the output root ([`fs_utils`]). [`orchestration`]
//! drives the phases.

pub mod backend;
pub mod context;
pub mod error;
pub mod frontend;
pub mod fs_utils;
pub mod layers;
pub mod naming;
pub mod orchestration;
pub mod project_config;
pub mod relationships;
pub mod renderer;
pub mod schema;
pub mod type_mapper;
pub mod types;
pub mod yaml_loader;

// Re-export key types
pub use backend::DatabaseType;
pub use error::{
    ArtifactError, ConfigError, GenerateError, LoadError, RenderError, ValidationError,
    ValidationReport, ViolationKind, WriteError,
};
pub use fs_utils::{OutputWriter, WriteOutcome};
pub use layers::{Layer, Side};
pub use naming::{IdentifierForms, NamingEngine, NamingRules};
pub use orchestration::{
    generate, validate, GenerationReport, ScaffoldOutcome, TableOutcome, TableReport,
};
pub use project_config::{CrudgenConfig, GenerationOptions, LayerSelection, OverwritePolicy};
pub use relationships::resolve_relationships;
pub use renderer::TemplateRenderer;
pub use schema::{PrimaryKeyPolicy, SchemaModel};
pub use type_mapper::{TypeMapper, TypeTarget, TypesConfig};
pub use types::{ColumnDescriptor, DataType, SchemaDescriptor, TableDescriptor};
pub use yaml_loader::load_schema;

/// Generate from a schema path using the options in a crudgen.yaml file.
///
/// A missing config file means default options.
///
/// # Example
///
/// ```rust,no_run
/// let report = crudgen::codegen::generate_from_yaml("schema.yaml", "crudgen.yaml", "out")
///     .expect("Code generation failed");
/// assert!(report.is_success());
/// ```
pub fn generate_from_yaml(
    schema_path: impl AsRef<std::path::Path>,
    config_path: impl AsRef<std::path::Path>,
    output_root: impl AsRef<std::path::Path>,
) -> Result<GenerationReport, GenerateError> {
    let config_path = config_path.as_ref();
    let options = if config_path.exists() {
        CrudgenConfig::from_file(config_path)?.to_options()?
    } else {
        GenerationOptions::default()
    };
    let schema = load_schema(schema_path)?;
    generate(&schema, output_root.as_ref(), &options)
}
