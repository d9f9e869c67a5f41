//! Python backend templates: SQLAlchemy models, Pydantic schemas, CRUD
//! functions, FastAPI routers and pytest suites.
//!
//! Each `render_*` function writes one per-table artifact from a
//! [`TableContext`](crate::codegen::context::TableContext).
//! [`scaffold_files`] produces the project-level files that tie them together.

mod crud;
mod models;
mod pytest;
mod routers;
mod scaffold;
mod schemas;
pub mod utils;

pub use crud::render_crud;
pub use models::render_model;
pub use pytest::render_backend_test;
pub use routers::render_router;
pub use scaffold::scaffold_files;
pub use schemas::render_schemas;
pub use utils::DatabaseType;

use std::fmt::{self, Write};

/// Write import lines, dropping leading and doubled blank lines.
fn write_imports(output: &mut String, lines: &[String]) -> fmt::Result {
    let mut previous_blank = true;
    for line in lines {
        let blank = line.is_empty();
        if blank && previous_blank {
            continue;
        }
        writeln!(output, "{}", line)?;
        previous_blank = blank;
    }
    Ok(())
}

/// Triple-quoted docstring body with quotes neutralized.
fn docstring(text: &str) -> String {
    text.trim().replace("\"\"\"", "'''")
}
