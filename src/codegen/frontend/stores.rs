use std::fmt::{self, Write};

use super::js_str;
use crate::codegen::context::{PrimaryKeyContext, TableContext};

/// Generate the Pinia store for one table.
///
/// Every action goes through `track`, which maintains `loading` and `error`
/// and rethrows so views can react to failures.
pub fn render_store(ctx: &TableContext, pk: &PrimaryKeyContext, output: &mut String) -> fmt::Result {
    let name = &ctx.pascal_singular;

    writeln!(output, "import {{ defineStore }} from 'pinia'")?;
    writeln!(output, "import * as service from '../services/{}Service'\n", ctx.snake_singular)?;

    writeln!(output, "async function track(store, action) {{")?;
    writeln!(output, "  store.loading = true")?;
    writeln!(output, "  store.error = null")?;
    writeln!(output, "  try {{")?;
    writeln!(output, "    return await action()")?;
    writeln!(output, "  }} catch (err) {{")?;
    writeln!(output, "    store.error = err?.response?.data?.detail ?? err?.message ?? String(err)")?;
    writeln!(output, "    throw err")?;
    writeln!(output, "  }} finally {{")?;
    writeln!(output, "    store.loading = false")?;
    writeln!(output, "  }}")?;
    writeln!(output, "}}\n")?;

    writeln!(output, "const matches = (record, key) => {}\n", pk.js_matches)?;

    writeln!(
        output,
        "export const use{}Store = defineStore({}, {{",
        name,
        js_str(&ctx.snake_singular)
    )?;
    writeln!(output, "  state: () => ({{")?;
    writeln!(output, "    items: [],")?;
    writeln!(output, "    current: null,")?;
    writeln!(output, "    loading: false,")?;
    writeln!(output, "    error: null,")?;
    writeln!(output, "  }}),")?;
    writeln!(output, "  actions: {{")?;

    writeln!(output, "    async fetchAll(params = {{}}) {{")?;
    writeln!(
        output,
        "      this.items = await track(this, () => service.list{}(params))",
        ctx.pascal_plural
    )?;
    writeln!(output, "      return this.items")?;
    writeln!(output, "    }},")?;

    writeln!(output, "    async fetchOne(key) {{")?;
    writeln!(output, "      this.current = await track(this, () => service.get{}(key))", name)?;
    writeln!(output, "      return this.current")?;
    writeln!(output, "    }},")?;

    writeln!(output, "    async create(data) {{")?;
    writeln!(output, "      const created = await track(this, () => service.create{}(data))", name)?;
    writeln!(output, "      this.items.push(created)")?;
    writeln!(output, "      return created")?;
    writeln!(output, "    }},")?;

    writeln!(output, "    async update(key, data) {{")?;
    writeln!(
        output,
        "      const updated = await track(this, () => service.update{}(key, data))",
        name
    )?;
    writeln!(output, "      const index = this.items.findIndex((record) => matches(record, key))")?;
    writeln!(output, "      if (index !== -1) {{")?;
    writeln!(output, "        this.items[index] = updated")?;
    writeln!(output, "      }}")?;
    writeln!(output, "      this.current = updated")?;
    writeln!(output, "      return updated")?;
    writeln!(output, "    }},")?;

    writeln!(output, "    async remove(key) {{")?;
    writeln!(output, "      await track(this, () => service.delete{}(key))", name)?;
    writeln!(output, "      this.items = this.items.filter((record) => !matches(record, key))")?;
    writeln!(output, "    }},")?;

    writeln!(output, "  }},")?;
    writeln!(output, "}})")?;

    Ok(())
}
