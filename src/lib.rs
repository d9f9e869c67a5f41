//! # crudgen: Schema-Driven CRUD Application Generator
//!
//! crudgen reads a declarative description of relational tables and writes a
//! working application skeleton: a Python backend (SQLAlchemy models,
//! Pydantic schemas, CRUD functions, FastAPI routers, pytest suites) and a
//! Vue frontend (axios services, Pinia stores, PrimeVue list and form views,
//! vitest store tests).
//!
//! ## Example schema
//!
//! ```yaml
//! tables:
//!   - name: department
//!     columns:
//!       - { name: id, type: integer, primary_key: true }
//!       - { name: name, type: varchar(100), nullable: false }
//!   - name: employee
//!     columns:
//!       - { name: id, type: integer, primary_key: true }
//!       - { name: name, type: text, nullable: false }
//!       - { name: department_id, type: integer, references: department.id }
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use crudgen::{generate, load_schema, GenerationOptions};
//!
//! let schema = load_schema("schema.yaml")?;
//! let report = generate(&schema, Path::new("out"), &GenerationOptions::default())?;
//! println!("{}", report);
//! # Ok::<(), crudgen::GenerateError>(())
//! ```

// Code generation framework
pub mod codegen;

// Re-export the run-level API
pub use codegen::{
    generate, generate_from_yaml, load_schema, validate, CrudgenConfig, DatabaseType,
    GenerateError, GenerationOptions, GenerationReport, Layer, LayerSelection, OverwritePolicy,
    PrimaryKeyPolicy, SchemaDescriptor, SchemaModel,
};
