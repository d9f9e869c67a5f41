use std::fmt::{self, Write};

use super::{docstring, write_imports};
use crate::codegen::context::{PrimaryKeyContext, TableContext};

/// Generate the SQLAlchemy declarative model for one table
pub fn render_model(ctx: &TableContext, pk: &PrimaryKeyContext, output: &mut String) -> fmt::Result {
    writeln!(output, "\"\"\"SQLAlchemy model for the {} table.\"\"\"\n", ctx.qualified_name)?;
    write_imports(output, &ctx.model_imports)?;

    if !ctx.model_type_imports.is_empty() {
        writeln!(output, "\nif TYPE_CHECKING:")?;
        for line in &ctx.model_type_imports {
            writeln!(output, "    {}", line)?;
        }
    }

    writeln!(output, "\n\nclass {}(Base):", ctx.pascal_singular)?;
    if let Some(doc) = &ctx.doc {
        writeln!(output, "    \"\"\"{}\"\"\"\n", docstring(doc))?;
    }
    writeln!(output, "    __tablename__ = \"{}\"", ctx.name)?;
    if let Some(args) = &ctx.table_args {
        writeln!(output, "    __table_args__ = {}", args)?;
    }
    writeln!(output)?;

    for column in &ctx.columns {
        writeln!(
            output,
            "    {}: Mapped[{}] = mapped_column({})",
            column.attr, column.annotation, column.column_args
        )?;
    }

    if !ctx.parent_relationships.is_empty() || !ctx.child_relationships.is_empty() {
        writeln!(output)?;
    }
    for rel in ctx.parent_relationships.iter().chain(&ctx.child_relationships) {
        writeln!(
            output,
            "    {}: {} = relationship({})",
            rel.attr, rel.annotation, rel.args
        )?;
    }

    let repr_fields: Vec<String> = pk
        .parts
        .iter()
        .map(|p| format!("{}={{self.{}!r}}", p.attr, p.attr))
        .collect();
    writeln!(output, "\n    def __repr__(self) -> str:")?;
    writeln!(
        output,
        "        return f\"<{} {}>\"",
        ctx.pascal_singular,
        repr_fields.join(" ")
    )?;

    Ok(())
}
