//! High-level orchestration API for code generation.
//!
//! [`generate`] drives one run: validate the schema and type configuration,
//! resolve relationships, then render and write every selected layer for
//! every table, followed by the project scaffold.
//!
//! Validation failures abort before anything is written. Render and write
//! failures are scoped to one table: its remaining layers are skipped, the
//! failure is recorded in the [`GenerationReport`], and the run continues.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::codegen::context::{ProjectContext, TableContext};
use crate::codegen::error::{ArtifactError, GenerateError, RenderError, ValidationReport};
use crate::codegen::fs_utils::OutputWriter;
use crate::codegen::layers::{Layer, Side};
use crate::codegen::naming::NamingEngine;
use crate::codegen::project_config::GenerationOptions;
use crate::codegen::relationships::resolve_relationships;
use crate::codegen::renderer::TemplateRenderer;
use crate::codegen::schema::SchemaModel;
use crate::codegen::type_mapper::TypeMapper;
use crate::codegen::types::SchemaDescriptor;
use crate::codegen::{backend, frontend};

/// Result of generating one table.
#[derive(Debug)]
pub enum TableOutcome {
    /// Every selected layer was written (or kept, under skip-existing)
    Generated { files: Vec<PathBuf> },
    /// Rendering or writing `layer` failed; later layers were not attempted
    Failed { layer: Layer, error: ArtifactError },
}

#[derive(Debug)]
pub struct TableReport {
    pub table: String,
    pub outcome: TableOutcome,
}

/// Result of the project-level scaffold pass for one side.
#[derive(Debug)]
pub enum ScaffoldOutcome {
    Generated { side: Side, files: Vec<PathBuf> },
    Failed { side: Side, error: ArtifactError },
}

/// Per-table summary of a generation run.
#[derive(Debug, Default)]
pub struct GenerationReport {
    pub tables: Vec<TableReport>,
    pub scaffold: Vec<ScaffoldOutcome>,
    pub files_written: usize,
    pub files_skipped: usize,
}

impl GenerationReport {
    /// True when every table and the scaffold were generated.
    pub fn is_success(&self) -> bool {
        self.tables
            .iter()
            .all(|t| matches!(t.outcome, TableOutcome::Generated { .. }))
            && self
                .scaffold
                .iter()
                .all(|s| matches!(s, ScaffoldOutcome::Generated { .. }))
    }

    pub fn generated_tables(&self) -> impl Iterator<Item = &str> {
        self.tables
            .iter()
            .filter(|t| matches!(t.outcome, TableOutcome::Generated { .. }))
            .map(|t| t.table.as_str())
    }

    pub fn failed_tables(&self) -> impl Iterator<Item = &TableReport> {
        self.tables
            .iter()
            .filter(|t| matches!(t.outcome, TableOutcome::Failed { .. }))
    }

    /// Files of a generated table, relative to the output root.
    pub fn files_for(&self, table: &str) -> Option<&[PathBuf]> {
        self.tables.iter().find(|t| t.table == table).and_then(|t| match &t.outcome {
            TableOutcome::Generated { files } => Some(files.as_slice()),
            TableOutcome::Failed { .. } => None,
        })
    }
}

impl fmt::Display for GenerationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for report in &self.tables {
            match &report.outcome {
                TableOutcome::Generated { files } => {
                    writeln!(f, "  ✓ {} ({} files)", report.table, files.len())?
                }
                TableOutcome::Failed { layer, error } => {
                    writeln!(f, "  ✗ {} failed at {}: {}", report.table, layer, error)?
                }
            }
        }
        for outcome in &self.scaffold {
            match outcome {
                ScaffoldOutcome::Generated { side, files } => {
                    writeln!(f, "  ✓ {} scaffold ({} files)", side, files.len())?
                }
                ScaffoldOutcome::Failed { side, error } => {
                    writeln!(f, "  ✗ {} scaffold failed: {}", side, error)?
                }
            }
        }
        let failed = self.failed_tables().count();
        write!(
            f,
            "{} table(s) generated, {} failed; {} file(s) written, {} skipped",
            self.tables.len() - failed,
            failed,
            self.files_written,
            self.files_skipped
        )
    }
}

/// Validate and resolve a schema without rendering anything.
///
/// Returns the resolved IR, or every schema and type-mapping violation found.
pub fn validate(
    schema: &SchemaDescriptor,
    options: &GenerationOptions,
) -> Result<SchemaModel, GenerateError> {
    let naming = NamingEngine::new(options.naming.to_rules());
    let (_, model) = build_model(schema, options, &naming)?;
    Ok(model)
}

/// Generate the application skeleton for `schema` under `output_root`.
///
/// # Example
///
/// ```rust,no_run
/// use std::path::Path;
/// use crudgen::codegen::{generate, load_schema, GenerationOptions};
///
/// let schema = load_schema("schema/hr.yaml").unwrap();
/// let report = generate(&schema, Path::new("out"), &GenerationOptions::default()).unwrap();
/// println!("{}", report);
/// ```
pub fn generate(
    schema: &SchemaDescriptor,
    output_root: &Path,
    options: &GenerationOptions,
) -> Result<GenerationReport, GenerateError> {
    let naming = NamingEngine::new(options.naming.to_rules());
    let (types, model) = build_model(schema, options, &naming)?;

    for name in &options.eager_load {
        if model.table(name).is_none() {
            warn!(table = %name, "Eager loading requested for unknown table, ignoring");
        }
    }

    let renderer = TemplateRenderer::new(&model, &naming, &types)
        .with_api_base_url(&options.api_base_url)
        .with_eager_load(&options.eager_load);
    let layers = options.layers.layers();
    let mut writer = OutputWriter::new(output_root, options.overwrite);
    let mut report = GenerationReport::default();
    let mut generated: Vec<TableContext> = Vec::new();

    info!(
        tables = model.tables().len(),
        layers = options.layers.as_str(),
        output = %output_root.display(),
        "Rendering"
    );

    for table in model.tables() {
        info!(table = %table.name, "Generating table");
        let forms = naming.forms(&table.name);

        // Render every layer before writing any, so a render failure leaves
        // no files behind for this table.
        let (ctx, rendered) = match renderer.render_table(table, &layers) {
            Ok(result) => result,
            Err((layer, error)) => {
                warn!(table = %table.name, layer = %layer, error = %error, "Table failed to render");
                report.tables.push(TableReport {
                    table: table.name.clone(),
                    outcome: TableOutcome::Failed {
                        layer,
                        error: error.into(),
                    },
                });
                continue;
            }
        };

        let mut files = Vec::with_capacity(rendered.len());
        let mut failure = None;
        for (layer, text) in rendered {
            let relative = side_dir(layer.side(), options).join(layer.relative_path(&forms));
            match writer.write(&relative, &text) {
                Ok(_) => files.push(relative),
                Err(error) => {
                    failure = Some((layer, error));
                    break;
                }
            }
        }

        let outcome = match failure {
            Some((layer, error)) => {
                warn!(table = %table.name, layer = %layer, error = %error, "Table failed to write");
                TableOutcome::Failed {
                    layer,
                    error: error.into(),
                }
            }
            None => {
                debug!(table = %table.name, files = files.len(), "Table generated");
                generated.push(ctx);
                TableOutcome::Generated { files }
            }
        };
        report.tables.push(TableReport {
            table: table.name.clone(),
            outcome,
        });
    }

    let contexts: Vec<&TableContext> = generated.iter().collect();
    let project = ProjectContext::build(
        &options.project_name,
        options.database,
        &options.api_base_url,
        &contexts,
        &model,
    );
    for side in [Side::Backend, Side::Frontend] {
        if !layers.iter().any(|l| l.side() == side) {
            continue;
        }
        info!(side = %side, tables = contexts.len(), "Writing project scaffold");
        let outcome = match write_scaffold(&project, side, options, &mut writer) {
            Ok(files) => ScaffoldOutcome::Generated { side, files },
            Err(error) => {
                warn!(side = %side, error = %error, "Scaffold failed");
                ScaffoldOutcome::Failed { side, error }
            }
        };
        report.scaffold.push(outcome);
    }

    report.files_written = writer.written();
    report.files_skipped = writer.skipped();
    info!(
        written = report.files_written,
        skipped = report.files_skipped,
        failed = report.failed_tables().count(),
        "Generation finished"
    );
    Ok(report)
}

/// Validating + Resolving phases.
///
/// Type-mapping and schema violations are collected together; the schema is
/// still checked against a best-effort mapper when the type configuration is
/// incomplete.
fn build_model(
    schema: &SchemaDescriptor,
    options: &GenerationOptions,
    naming: &NamingEngine,
) -> Result<(TypeMapper, SchemaModel), ValidationReport> {
    info!(tables = schema.tables.len(), "Validating schema");
    let (types, mut errors) = TypeMapper::from_config_partial(&options.types);

    let model = match SchemaModel::build(schema, &types, naming, options.primary_key_policy) {
        Ok(model) => Some(model),
        Err(report) => {
            errors.extend(report.errors);
            None
        }
    };

    match model {
        Some(mut model) if errors.is_empty() => {
            info!("Resolving relationships");
            resolve_relationships(&mut model, naming);
            Ok((types, model))
        }
        _ => Err(ValidationReport::new(errors)),
    }
}

fn side_dir(side: Side, options: &GenerationOptions) -> PathBuf {
    match side {
        Side::Backend => PathBuf::from(&options.backend_dir),
        Side::Frontend => PathBuf::from(&options.frontend_dir),
    }
}

fn write_scaffold(
    project: &ProjectContext,
    side: Side,
    options: &GenerationOptions,
    writer: &mut OutputWriter,
) -> Result<Vec<PathBuf>, ArtifactError> {
    let rendered = match side {
        Side::Backend => backend::scaffold_files(project),
        Side::Frontend => frontend::scaffold_files(project),
    }
    .map_err(RenderError::from)?;

    let base = side_dir(side, options);
    let mut files = Vec::with_capacity(rendered.len());
    for (path, content) in rendered {
        let relative = base.join(path);
        writer.write(&relative, &content)?;
        files.push(relative);
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::context::tests::hr_descriptor;
    use crate::codegen::project_config::LayerSelection;
    use crate::codegen::types::{ColumnDescriptor, TableDescriptor};
    use tempfile::TempDir;

    #[test]
    fn test_generate_writes_every_layer() {
        let dir = TempDir::new().unwrap();
        let report = generate(&hr_descriptor(), dir.path(), &GenerationOptions::default()).unwrap();

        assert!(report.is_success(), "{}", report);
        let files = report.files_for("employee").unwrap();
        assert_eq!(files.len(), Layer::ALL.len());
        assert_eq!(files[0], PathBuf::from("backend/models/employee.py"));
        assert_eq!(files[9], PathBuf::from("frontend/src/tests/employeeStore.test.js"));
        assert!(dir.path().join("backend/main.py").exists());
        assert!(dir.path().join("frontend/src/router/index.js").exists());
        assert_eq!(report.files_skipped, 0);
    }

    #[test]
    fn test_failed_table_does_not_stop_the_run() {
        let dir = TempDir::new().unwrap();
        let mut schema = hr_descriptor();
        schema.tables.push(TableDescriptor {
            name: "audit_log".to_string(),
            columns: vec![ColumnDescriptor::new("message", "text")],
            ..Default::default()
        });
        let options = GenerationOptions {
            layers: LayerSelection::Backend,
            ..Default::default()
        };

        let report = generate(&schema, dir.path(), &options).unwrap();
        assert!(!report.is_success());
        let failed: Vec<&str> = report.failed_tables().map(|t| t.table.as_str()).collect();
        assert_eq!(failed, vec!["audit_log"]);
        assert!(!dir.path().join("backend/models/audit_log.py").exists());

        let main = std::fs::read_to_string(dir.path().join("backend/main.py")).unwrap();
        assert!(main.contains("from routers import department, employee\n"));
        assert!(!dir.path().join("frontend").exists());
        assert!(report.to_string().contains("audit_log failed at persistence-model"));
    }

    #[test]
    fn test_validation_aborts_before_writing() {
        let dir = TempDir::new().unwrap();
        let mut schema = hr_descriptor();
        schema.tables[1].columns.push(ColumnDescriptor::new("badge", "geometry"));
        schema.tables[1]
            .columns
            .push(ColumnDescriptor::new("office_id", "integer").references("office.id"));

        let err = generate(&schema, dir.path(), &GenerationOptions::default()).unwrap_err();
        match err {
            GenerateError::Validation(report) => assert_eq!(report.len(), 2),
            other => panic!("unexpected error: {}", other),
        }
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_validate_returns_resolved_model() {
        let model = validate(&hr_descriptor(), &GenerationOptions::default()).unwrap();
        assert!(model.is_resolved());
        assert_eq!(model.table("department").unwrap().children.len(), 1);
    }
}
