use std::fmt::{self, Write};

use crate::codegen::context::{PrimaryKeyContext, TableContext};

/// Generate the vitest suite for one table's store, with the service mocked out
pub fn render_store_test(ctx: &TableContext, pk: &PrimaryKeyContext, output: &mut String) -> fmt::Result {
    let name = &ctx.pascal_singular;
    let plural = &ctx.pascal_plural;
    let service_module = format!("../services/{}Service", ctx.snake_singular);

    writeln!(output, "import {{ beforeEach, describe, expect, it, vi }} from 'vitest'")?;
    writeln!(output, "import {{ createPinia, setActivePinia }} from 'pinia'")?;
    writeln!(
        output,
        "import {{ use{}Store }} from '../stores/{}Store'",
        name, ctx.snake_singular
    )?;
    writeln!(output, "import * as service from '{}'\n", service_module)?;

    writeln!(output, "vi.mock('{}', () => ({{", service_module)?;
    writeln!(output, "  list{}: vi.fn(),", plural)?;
    writeln!(output, "  get{}: vi.fn(),", name)?;
    writeln!(output, "  create{}: vi.fn(),", name)?;
    writeln!(output, "  update{}: vi.fn(),", name)?;
    writeln!(output, "  delete{}: vi.fn(),", name)?;
    writeln!(output, "}}))\n")?;

    writeln!(output, "const record = {{")?;
    for column in &ctx.columns {
        writeln!(output, "  {}: {},", column.attr, column.sample_js)?;
    }
    writeln!(output, "}}")?;
    writeln!(output, "const key = {}\n", pk.js_key_of_record)?;

    writeln!(output, "describe('{} store', () => {{", ctx.snake_singular)?;
    writeln!(output, "  beforeEach(() => {{")?;
    writeln!(output, "    setActivePinia(createPinia())")?;
    writeln!(output, "    vi.clearAllMocks()")?;
    writeln!(output, "  }})\n")?;

    writeln!(output, "  it('fetchAll loads items', async () => {{")?;
    writeln!(output, "    service.list{}.mockResolvedValue([record])", plural)?;
    writeln!(output, "    const store = use{}Store()", name)?;
    writeln!(output, "    await store.fetchAll()")?;
    writeln!(output, "    expect(store.items).toEqual([record])")?;
    writeln!(output, "    expect(store.loading).toBe(false)")?;
    writeln!(output, "  }})\n")?;

    writeln!(output, "  it('fetchOne sets current', async () => {{")?;
    writeln!(output, "    service.get{}.mockResolvedValue(record)", name)?;
    writeln!(output, "    const store = use{}Store()", name)?;
    writeln!(output, "    await store.fetchOne(key)")?;
    writeln!(output, "    expect(service.get{}).toHaveBeenCalledWith(key)", name)?;
    writeln!(output, "    expect(store.current).toEqual(record)")?;
    writeln!(output, "  }})\n")?;

    writeln!(output, "  it('create appends the new record', async () => {{")?;
    writeln!(output, "    service.create{}.mockResolvedValue(record)", name)?;
    writeln!(output, "    const store = use{}Store()", name)?;
    writeln!(output, "    await store.create(record)")?;
    writeln!(output, "    expect(store.items).toHaveLength(1)")?;
    writeln!(output, "  }})\n")?;

    writeln!(output, "  it('update replaces the matching record', async () => {{")?;
    writeln!(output, "    const updated = {{ ...record }}")?;
    writeln!(output, "    service.update{}.mockResolvedValue(updated)", name)?;
    writeln!(output, "    const store = use{}Store()", name)?;
    writeln!(output, "    store.items = [record]")?;
    writeln!(output, "    await store.update(key, updated)")?;
    writeln!(output, "    expect(service.update{}).toHaveBeenCalledWith(key, updated)", name)?;
    writeln!(output, "    expect(store.items[0]).toBe(updated)")?;
    writeln!(output, "    expect(store.current).toEqual(updated)")?;
    writeln!(output, "  }})\n")?;

    writeln!(output, "  it('remove drops the record', async () => {{")?;
    writeln!(output, "    service.delete{}.mockResolvedValue()", name)?;
    writeln!(output, "    const store = use{}Store()", name)?;
    writeln!(output, "    store.items = [record]")?;
    writeln!(output, "    await store.remove(key)")?;
    writeln!(output, "    expect(store.items).toHaveLength(0)")?;
    writeln!(output, "  }})\n")?;

    writeln!(output, "  it('records errors', async () => {{")?;
    writeln!(output, "    service.list{}.mockRejectedValue(new Error('boom'))", plural)?;
    writeln!(output, "    const store = use{}Store()", name)?;
    writeln!(output, "    await expect(store.fetchAll()).rejects.toThrow('boom')")?;
    writeln!(output, "    expect(store.error).toBe('boom')")?;
    writeln!(output, "    expect(store.loading).toBe(false)")?;
    writeln!(output, "  }})")?;
    writeln!(output, "}})")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::context::tests::hr_model;
    use crate::codegen::naming::NamingEngine;
    use crate::codegen::type_mapper::TypeMapper;

    #[test]
    fn test_store_test_uses_samples() {
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
        render_store_test(&ctx, ctx.primary_key.as_ref().unwrap(), &mut output).unwrap();

        assert!(output.contains("vi.mock('../services/departmentService', () => ({\n  listDepartments: vi.fn(),"));
        assert!(output.contains("const record = {\n  id: 1,\n  name: \"sample name\",\n  budget: 1.0,\n}\n"));
        assert!(output.contains("const key = { id: record.id }\n"));
        assert!(output.contains("describe('department store', () => {"));
    }
}
