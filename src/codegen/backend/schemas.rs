use std::fmt::{self, Write};

use super::write_imports;
use crate::codegen::context::TableContext;

/// Generate the Pydantic schema family (Base, Create, Update, Read, Full)
pub fn render_schemas(ctx: &TableContext, output: &mut String) -> fmt::Result {
    let name = &ctx.pascal_singular;

    writeln!(output, "\"\"\"Pydantic schemas for the {} table.\"\"\"\n", ctx.qualified_name)?;
    write_imports(output, &ctx.schema_imports)?;

    writeln!(output, "\n\nclass {}Base(BaseModel):", name)?;
    let mut empty = true;
    for column in ctx.create_columns() {
        writeln!(output, "    {}: {}", column.attr, column.create_annotation)?;
        empty = false;
    }
    if empty {
        writeln!(output, "    pass")?;
    }

    writeln!(output, "\n\nclass {}Create({}Base):", name, name)?;
    writeln!(output, "    pass")?;

    writeln!(output, "\n\nclass {}Update(BaseModel):", name)?;
    let mut empty = true;
    for column in ctx.update_columns() {
        writeln!(output, "    {}: {}", column.attr, column.update_annotation)?;
        empty = false;
    }
    if empty {
        writeln!(output, "    pass")?;
    }

    writeln!(output, "\n\nclass {}Read({}Base):", name, name)?;
    writeln!(output, "    model_config = ConfigDict(from_attributes=True)")?;
    let read_only: Vec<_> = ctx.read_only_columns().collect();
    if !read_only.is_empty() {
        writeln!(output)?;
    }
    for column in read_only {
        writeln!(output, "    {}: {}", column.attr, column.annotation)?;
    }

    writeln!(output, "\n\nclass {}Full({}Read):", name, name)?;
    if ctx.children.is_empty() {
        writeln!(output, "    pass")?;
        return Ok(());
    }
    for child in &ctx.children {
        writeln!(output, "    {}: list[\"{}\"] = []", child.attr, child.child_read_class)?;
    }

    // Child modules import this one for their own Full schema, so these come last
    if !ctx.child_schema_imports.is_empty() {
        writeln!(output)?;
        writeln!(output)?;
        for line in &ctx.child_schema_imports {
            writeln!(output, "{}", line)?;
        }
    }
    writeln!(output, "\n{}Full.model_rebuild()", name)?;

    Ok(())
}
