use std::fmt::{self, Write};

use super::js_str;
use crate::codegen::context::{PrimaryKeyContext, TableContext};

/// Generate the axios service for one table
pub fn render_service(ctx: &TableContext, pk: &PrimaryKeyContext, output: &mut String) -> fmt::Result {
    let name = &ctx.pascal_singular;

    writeln!(output, "import api from './api'\n")?;
    writeln!(output, "const resource = {}", js_str(&ctx.route_prefix))?;

    writeln!(output, "\nexport async function list{}(params = {{}}) {{", ctx.pascal_plural)?;
    writeln!(output, "  const response = await api.get(`${{resource}}/`, {{ params }})")?;
    writeln!(output, "  return response.data")?;
    writeln!(output, "}}")?;

    writeln!(output, "\nexport async function get{}(key) {{", name)?;
    writeln!(output, "  const response = await api.get(`${{resource}}/{}`)", pk.js_key_path)?;
    writeln!(output, "  return response.data")?;
    writeln!(output, "}}")?;

    writeln!(output, "\nexport async function create{}(data) {{", name)?;
    writeln!(output, "  const response = await api.post(`${{resource}}/`, data)")?;
    writeln!(output, "  return response.data")?;
    writeln!(output, "}}")?;

    writeln!(output, "\nexport async function update{}(key, data) {{", name)?;
    writeln!(output, "  const response = await api.put(`${{resource}}/{}`, data)", pk.js_key_path)?;
    writeln!(output, "  return response.data")?;
    writeln!(output, "}}")?;

    writeln!(output, "\nexport async function delete{}(key) {{", name)?;
    writeln!(output, "  await api.delete(`${{resource}}/{}`)", pk.js_key_path)?;
    writeln!(output, "}}")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::context::tests::hr_model;
    use crate::codegen::naming::NamingEngine;
    use crate::codegen::type_mapper::TypeMapper;

    #[test]
    fn test_service_functions() {
        let naming = NamingEngine::default();
        let model = hr_model(&naming);
        let ctx = TableContext::build(
            model.table("department").unwrap(),
            &model,
            &naming,
            &TypeMapper::default(),
            "http://localhost:8000",
            false,
        );
        let mut output = String::new();
        render_service(&ctx, ctx.primary_key.as_ref().unwrap(), &mut output).unwrap();

        assert!(output.contains("const resource = '/departments'\n"));
        assert!(output.contains("export async function listDepartments(params = {}) {"));
        assert!(output.contains("export async function getDepartment(key) {\n  const response = await api.get(`${resource}/${key.id}`)\n"));
        assert!(output.contains("export async function updateDepartment(key, data) {"));
        assert!(output.contains("export async function deleteDepartment(key) {\n  await api.delete(`${resource}/${key.id}`)\n"));
    }
}
