//! crudgen CLI - generate a CRUD application skeleton from a table schema
//!
//! Reads a YAML/JSON schema description and writes a FastAPI backend and a
//! Vue frontend for every table.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::prelude::*;

use crudgen::codegen::project_config::{parse_database, parse_layers};
use crudgen::codegen::{
    generate, load_schema, validate, CrudgenConfig, GenerateError, GenerationOptions,
    IdentifierForms, NamingEngine, OverwritePolicy, SchemaModel,
};

#[derive(Parser)]
#[command(name = "crudgen")]
#[command(version, about = "Generate a CRUD application skeleton from a table schema", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate backend and frontend code for every table
    Generate {
        /// Schema file, or a directory of schema files
        #[arg(short, long)]
        schema: PathBuf,

        /// Output directory for generated code
        #[arg(short, long, default_value = "generated")]
        output: PathBuf,

        /// Path to crudgen.yaml (optional)
        #[arg(short, long, default_value = "crudgen.yaml")]
        config: PathBuf,

        /// Layers to generate (backend, frontend, both) - overrides config file
        #[arg(short, long)]
        layers: Option<String>,

        /// Overwrite existing files even if the config says skip-existing
        #[arg(short, long)]
        force: bool,

        /// Database type (postgresql, mysql, mariadb, sqlite, mssql) - overrides config file
        #[arg(short, long)]
        database: Option<String>,
    },

    /// Validate a schema without generating code
    Validate {
        /// Schema file, or a directory of schema files
        #[arg(short, long)]
        schema: PathBuf,

        /// Path to crudgen.yaml (optional)
        #[arg(short, long, default_value = "crudgen.yaml")]
        config: PathBuf,
    },

    /// Print the resolved tables, identifier forms and relationships
    Inspect {
        /// Schema file, or a directory of schema files
        #[arg(short, long)]
        schema: PathBuf,

        /// Path to crudgen.yaml (optional)
        #[arg(short, long, default_value = "crudgen.yaml")]
        config: PathBuf,
    },
}

fn main() {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Generate { schema, output, config, layers, force, database } => {
            generate_code(schema, output, config, layers, force, database)
        }
        Commands::Validate { schema, config } => validate_schema(schema, config),
        Commands::Inspect { schema, config } => inspect_schema(schema, config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Load crudgen.yaml if present, otherwise use defaults
fn load_options(config: &Path) -> Result<GenerationOptions, String> {
    if !config.exists() {
        println!("  ℹ No config file at {}, using defaults", config.display());
        return Ok(GenerationOptions::default());
    }

    let options = CrudgenConfig::from_file(config)
        .and_then(|c| c.to_options())
        .map_err(|e| e.to_string())?;
    println!("  ✓ Configuration loaded: {}", options.project_name);
    Ok(options)
}

/// Apply CLI and environment overrides with precedence: CLI > ENV > config file > default
fn apply_overrides(
    options: &mut GenerationOptions,
    cli_database: Option<String>,
    cli_layers: Option<String>,
) -> Result<(), String> {
    if let Some(value) = cli_database {
        options.database = parse_database(&value).map_err(|e| e.to_string())?;
        println!("  ℹ Using database type from CLI flag: {}", options.database.as_str());
    } else if let Ok(value) = std::env::var("CRUDGEN_DATABASE_TYPE") {
        options.database = parse_database(&value).map_err(|e| e.to_string())?;
        println!("  ℹ Using database type from CRUDGEN_DATABASE_TYPE: {}", options.database.as_str());
    }

    if let Some(value) = cli_layers {
        options.layers = parse_layers(&value).map_err(|e| e.to_string())?;
    } else if let Ok(value) = std::env::var("CRUDGEN_LAYERS") {
        options.layers = parse_layers(&value).map_err(|e| e.to_string())?;
        println!("  ℹ Using layer selection from CRUDGEN_LAYERS: {}", options.layers.as_str());
    }

    Ok(())
}

/// Report validation errors one per line
fn describe(error: GenerateError) -> String {
    match error {
        GenerateError::Validation(report) => {
            for e in &report.errors {
                println!("  ✗ {}", e);
            }
            format!("schema has {} validation error(s)", report.len())
        }
        other => other.to_string(),
    }
}

fn generate_code(
    schema: PathBuf,
    output: PathBuf,
    config: PathBuf,
    layers: Option<String>,
    force: bool,
    database: Option<String>,
) -> Result<(), String> {
    println!("🔧 Generating code from {}...", schema.display());

    let mut options = load_options(&config)?;
    apply_overrides(&mut options, database, layers)?;
    if force {
        options.overwrite = OverwritePolicy::Always;
    }

    let descriptor = load_schema(&schema).map_err(|e| e.to_string())?;
    println!("  ✓ Loaded {} tables", descriptor.tables.len());

    let report = generate(&descriptor, &output, &options).map_err(describe)?;
    println!("{}", report);

    if !report.is_success() {
        return match report.failed_tables().count() {
            0 => Err("project scaffold failed to generate".to_string()),
            failed => Err(format!("{} table(s) failed to generate", failed)),
        };
    }

    println!("✨ Code generation complete! Output: {}", output.display());
    Ok(())
}

fn validate_schema(schema: PathBuf, config: PathBuf) -> Result<(), String> {
    println!("🔍 Validating {}...", schema.display());

    let options = load_options(&config)?;
    let descriptor = load_schema(&schema).map_err(|e| e.to_string())?;
    let model = validate(&descriptor, &options).map_err(describe)?;

    let relationships: usize = model.tables().iter().map(|t| t.foreign_keys.len()).sum();
    println!(
        "✅ Schema is valid: {} tables, {} relationships",
        model.tables().len(),
        relationships
    );
    Ok(())
}

fn inspect_schema(schema: PathBuf, config: PathBuf) -> Result<(), String> {
    let options = load_options(&config)?;
    let descriptor = load_schema(&schema).map_err(|e| e.to_string())?;
    let model = validate(&descriptor, &options).map_err(describe)?;
    let naming = NamingEngine::new(options.naming.to_rules());

    print_model(&model, &naming);
    Ok(())
}

/// Every identifier form a table is generated under
fn names_line(forms: &IdentifierForms) -> String {
    format!(
        "{} / {} / {} / {} / {} / \"{}\"",
        forms.snake_singular,
        forms.snake_plural,
        forms.pascal_singular,
        forms.pascal_plural,
        forms.camel_singular,
        forms.title
    )
}

fn print_model(model: &SchemaModel, naming: &NamingEngine) {
    for table in model.tables() {
        let forms = naming.forms(&table.name);
        println!("\n📋 {}", table.qualified_name());
        println!("  names: {}", names_line(&forms));

        let key: Vec<&str> = table.primary_key().iter().map(|c| c.name.as_str()).collect();
        if key.is_empty() {
            println!("  primary key: (none)");
        } else {
            println!("  primary key: {}", key.join(", "));
        }

        for column in &table.columns {
            let nullable = if column.nullable { "" } else { " not null" };
            let synthetic = if column.synthetic { " (synthesized)" } else { "" };
            println!("    - {}: {}{}{}", column.name, column.data_type, nullable, synthetic);
        }

        for fk in &table.foreign_keys {
            let pairs: Vec<String> = fk
                .column_pairs()
                .map(|(local, remote)| format!("{} -> {}", local, remote))
                .collect();
            println!("  ↑ {} -> {} ({})", fk.parent_attr, fk.target_table, pairs.join(", "));
        }
        for child in &table.children {
            println!("  ↓ {} <- {}", child.attr, child.child_table);
        }
    }
}
