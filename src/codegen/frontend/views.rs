use std::collections::BTreeSet;
use std::fmt::{self, Write};

use super::js_str;
use crate::codegen::context::{ColumnContext, PrimaryKeyContext, TableContext, Widget};

/// Generate the PrimeVue list view for one table
pub fn render_list_view(ctx: &TableContext, pk: &PrimaryKeyContext, output: &mut String) -> fmt::Result {
    let single = &ctx.snake_singular;

    writeln!(output, "<template>")?;
    writeln!(output, "  <div class=\"{}-list\">", single.replace('_', "-"))?;
    writeln!(output, "    <Toolbar>")?;
    writeln!(output, "      <template #start>")?;
    writeln!(output, "        <h2>{}</h2>", ctx.title_plural)?;
    writeln!(output, "      </template>")?;
    writeln!(output, "      <template #end>")?;
    writeln!(
        output,
        "        <Button label=\"New\" icon=\"pi pi-plus\" @click=\"router.push({{ name: '{}-new' }})\" />",
        single
    )?;
    writeln!(output, "      </template>")?;
    writeln!(output, "    </Toolbar>")?;
    writeln!(output, "    <p v-if=\"store.error\" class=\"error\">{{{{ store.error }}}}</p>")?;

    write!(output, "    <DataTable :value=\"store.items\" :loading=\"store.loading\"")?;
    if let Some(data_key) = &pk.data_key {
        write!(output, " dataKey=\"{}\"", data_key)?;
    }
    writeln!(output, " paginator :rows=\"20\">")?;
    for column in ctx.columns.iter().filter(|c| c.in_list) {
        writeln!(
            output,
            "      <Column field=\"{}\" header=\"{}\" sortable />",
            column.attr, column.label
        )?;
    }
    writeln!(output, "      <Column header=\"Actions\">")?;
    writeln!(output, "        <template #body=\"{{ data }}\">")?;
    writeln!(output, "          <Button icon=\"pi pi-pencil\" text @click=\"edit(data)\" />")?;
    writeln!(
        output,
        "          <Button icon=\"pi pi-trash\" text severity=\"danger\" @click=\"remove(data)\" />"
    )?;
    writeln!(output, "        </template>")?;
    writeln!(output, "      </Column>")?;
    writeln!(output, "    </DataTable>")?;
    writeln!(output, "  </div>")?;
    writeln!(output, "</template>\n")?;

    writeln!(output, "<script setup>")?;
    writeln!(output, "import {{ onMounted }} from 'vue'")?;
    writeln!(output, "import {{ useRouter }} from 'vue-router'")?;
    writeln!(output, "import Button from 'primevue/button'")?;
    writeln!(output, "import Column from 'primevue/column'")?;
    writeln!(output, "import DataTable from 'primevue/datatable'")?;
    writeln!(output, "import Toolbar from 'primevue/toolbar'")?;
    writeln!(
        output,
        "import {{ use{}Store }} from '../stores/{}Store'\n",
        ctx.pascal_singular, single
    )?;
    writeln!(output, "const router = useRouter()")?;
    writeln!(output, "const store = use{}Store()\n", ctx.pascal_singular)?;
    writeln!(output, "onMounted(() => store.fetchAll().catch(() => {{}}))\n")?;

    writeln!(output, "function edit(record) {{")?;
    writeln!(
        output,
        "  router.push({{ name: '{}-edit', params: {} }})",
        single, pk.js_key_of_record
    )?;
    writeln!(output, "}}\n")?;

    writeln!(output, "async function remove(record) {{")?;
    writeln!(
        output,
        "  if (!window.confirm({})) {{",
        js_str(&format!("Delete this {}?", ctx.title.to_lowercase()))
    )?;
    writeln!(output, "    return")?;
    writeln!(output, "  }}")?;
    writeln!(output, "  await store.remove({}).catch(() => {{}})", pk.js_key_of_record)?;
    writeln!(output, "}}")?;
    writeln!(output, "</script>")?;

    Ok(())
}

/// Generate the PrimeVue create/edit form for one table.
///
/// The same view serves `/new` and `/:key/edit`; the presence of route
/// params selects edit mode.
pub fn render_form_view(ctx: &TableContext, pk: &PrimaryKeyContext, output: &mut String) -> fmt::Result {
    let single = &ctx.snake_singular;

    writeln!(output, "<template>")?;
    writeln!(output, "  <div class=\"{}-form\">", single.replace('_', "-"))?;
    writeln!(
        output,
        "    <h2>{{{{ isEdit ? 'Edit {}' : 'New {}' }}}}</h2>",
        ctx.title, ctx.title
    )?;
    writeln!(output, "    <p v-if=\"error\" class=\"error\">{{{{ error }}}}</p>")?;
    writeln!(output, "    <form @submit.prevent=\"save\">")?;
    for column in &ctx.columns {
        write_field(output, column)?;
    }
    writeln!(output, "      <div class=\"actions\">")?;
    writeln!(output, "        <Button type=\"submit\" label=\"Save\" :loading=\"store.loading\" />")?;
    writeln!(
        output,
        "        <Button type=\"button\" label=\"Cancel\" severity=\"secondary\" text @click=\"router.back()\" />"
    )?;
    writeln!(output, "      </div>")?;
    writeln!(output, "    </form>")?;
    writeln!(output, "  </div>")?;
    writeln!(output, "</template>\n")?;

    writeln!(output, "<script setup>")?;
    writeln!(output, "import {{ computed, onMounted, reactive, ref }} from 'vue'")?;
    writeln!(output, "import {{ useRoute, useRouter }} from 'vue-router'")?;
    for component in form_components(ctx) {
        writeln!(
            output,
            "import {} from 'primevue/{}'",
            component,
            component.to_lowercase()
        )?;
    }
    writeln!(
        output,
        "import {{ use{}Store }} from '../stores/{}Store'",
        ctx.pascal_singular, single
    )?;
    for import in &ctx.form_store_imports {
        writeln!(output, "import {{ {} }} from '../stores/{}'", import.store_fn, import.module)?;
    }
    writeln!(output)?;

    writeln!(output, "const route = useRoute()")?;
    writeln!(output, "const router = useRouter()")?;
    writeln!(output, "const store = use{}Store()", ctx.pascal_singular)?;
    for import in &ctx.form_store_imports {
        writeln!(output, "const {} = {}()", import.store_var, import.store_fn)?;
    }
    writeln!(output, "const error = ref(null)\n")?;

    let key_fields: Vec<String> = pk
        .parts
        .iter()
        .map(|p| format!("{}: route.params.{}", p.attr, p.attr))
        .collect();
    writeln!(output, "const isEdit = computed(() => Object.keys(route.params).length > 0)")?;
    writeln!(output, "const key = computed(() => ({{ {} }}))\n", key_fields.join(", "))?;

    writeln!(output, "const form = reactive({{")?;
    for column in &ctx.columns {
        writeln!(output, "  {}: {},", column.attr, column.empty_js)?;
    }
    writeln!(output, "}})")?;
    let json: Vec<String> = ctx.json_columns().map(|c| format!("{}: ''", c.attr)).collect();
    writeln!(output, "const jsonText = reactive({{ {} }})\n", json.join(", "))?;

    writeln!(output, "const createFields = {}", js_list(ctx.create_columns()))?;
    writeln!(output, "const updateFields = {}", js_list(ctx.update_columns()))?;
    writeln!(
        output,
        "const numberFields = {}\n",
        js_list(ctx.columns.iter().filter(|c| c.widget == Widget::Number))
    )?;

    writeln!(output, "onMounted(async () => {{")?;
    let mut option_stores: BTreeSet<&str> = BTreeSet::new();
    for column in &ctx.columns {
        if let Some(foreign) = &column.foreign {
            option_stores.insert(&foreign.store_var);
        }
    }
    for store_var in option_stores {
        writeln!(output, "  {}.fetchAll().catch(() => {{}})", store_var)?;
    }
    writeln!(output, "  if (!isEdit.value) {{")?;
    writeln!(output, "    return")?;
    writeln!(output, "  }}")?;
    writeln!(output, "  try {{")?;
    writeln!(output, "    const record = await store.fetchOne(key.value)")?;
    writeln!(output, "    for (const field of Object.keys(form)) {{")?;
    writeln!(output, "      const value = record[field] ?? null")?;
    writeln!(
        output,
        "      form[field] = numberFields.includes(field) && value !== null ? Number(value) : value"
    )?;
    writeln!(output, "    }}")?;
    writeln!(output, "    for (const field of Object.keys(jsonText)) {{")?;
    writeln!(
        output,
        "      jsonText[field] = record[field] == null ? '' : JSON.stringify(record[field], null, 2)"
    )?;
    writeln!(output, "    }}")?;
    writeln!(output, "  }} catch (err) {{")?;
    writeln!(output, "    error.value = store.error ?? String(err)")?;
    writeln!(output, "  }}")?;
    writeln!(output, "}})\n")?;

    writeln!(output, "function payload(creating) {{")?;
    writeln!(output, "  const data = {{}}")?;
    writeln!(output, "  for (const field of creating ? createFields : updateFields) {{")?;
    writeln!(output, "    let value = form[field]")?;
    writeln!(output, "    if (field in jsonText) {{")?;
    writeln!(
        output,
        "      value = jsonText[field].trim() ? JSON.parse(jsonText[field]) : null"
    )?;
    writeln!(output, "    }}")?;
    writeln!(output, "    if (creating && (value === null || value === '')) {{")?;
    writeln!(output, "      continue")?;
    writeln!(output, "    }}")?;
    writeln!(output, "    data[field] = value")?;
    writeln!(output, "  }}")?;
    writeln!(output, "  return data")?;
    writeln!(output, "}}\n")?;

    writeln!(output, "async function save() {{")?;
    writeln!(output, "  error.value = null")?;
    writeln!(output, "  try {{")?;
    writeln!(output, "    if (isEdit.value) {{")?;
    writeln!(output, "      await store.update(key.value, payload(false))")?;
    writeln!(output, "    }} else {{")?;
    writeln!(output, "      await store.create(payload(true))")?;
    writeln!(output, "    }}")?;
    writeln!(output, "    router.push({{ name: '{}-list' }})", single)?;
    writeln!(output, "  }} catch (err) {{")?;
    writeln!(output, "    error.value = store.error ?? err.message ?? String(err)")?;
    writeln!(output, "  }}")?;
    writeln!(output, "}}")?;
    writeln!(output, "</script>")?;

    Ok(())
}

fn write_field(output: &mut String, column: &ColumnContext) -> fmt::Result {
    let attr = &column.attr;
    if column.readonly {
        writeln!(output, "      <div v-if=\"isEdit\" class=\"field\">")?;
    } else {
        writeln!(output, "      <div class=\"field\">")?;
    }
    writeln!(output, "        <label for=\"{}\">{}</label>", attr, column.label)?;

    let mut flags = String::new();
    if column.readonly {
        flags.push_str(" disabled");
    } else if column.primary_key {
        flags.push_str(" :disabled=\"isEdit\"");
    }
    if column.required && !column.readonly {
        flags.push_str(" required");
    }

    match column.widget {
        Widget::Input => writeln!(
            output,
            "        <InputText id=\"{}\" v-model=\"form.{}\" type=\"{}\"{} />",
            attr, attr, column.input_type, flags
        )?,
        Widget::TextArea => writeln!(
            output,
            "        <Textarea id=\"{}\" v-model=\"form.{}\" rows=\"5\" autoResize{} />",
            attr, attr, flags
        )?,
        Widget::Json => writeln!(
            output,
            "        <Textarea id=\"{}\" v-model=\"jsonText.{}\" rows=\"6\"{} />",
            attr, attr, flags
        )?,
        Widget::Number => {
            let fraction = column
                .fraction_digits
                .map(|d| format!(" :minFractionDigits=\"{}\" :maxFractionDigits=\"{}\"", d, d))
                .unwrap_or_default();
            writeln!(
                output,
                "        <InputNumber inputId=\"{}\" v-model=\"form.{}\" :useGrouping=\"false\"{}{} />",
                attr, attr, fraction, flags
            )?
        }
        Widget::Checkbox => writeln!(
            output,
            "        <Checkbox inputId=\"{}\" v-model=\"form.{}\" binary{} />",
            attr, attr, flags
        )?,
        Widget::Select => {
            let (store_var, label, value) = column
                .foreign
                .as_ref()
                .map(|f| (f.store_var.as_str(), f.label_attr.as_str(), f.value_attr.as_str()))
                .unwrap_or(("store", attr.as_str(), attr.as_str()));
            writeln!(
                output,
                "        <Select inputId=\"{}\" v-model=\"form.{}\" :options=\"{}.items\" optionLabel=\"{}\" optionValue=\"{}\" showClear filter{} />",
                attr, attr, store_var, label, value, flags
            )?
        }
    }
    writeln!(output, "      </div>")
}

/// PrimeVue components the form's widgets need, sorted.
fn form_components(ctx: &TableContext) -> BTreeSet<&'static str> {
    let mut components = BTreeSet::from(["Button"]);
    for column in &ctx.columns {
        components.insert(match column.widget {
            Widget::Input => "InputText",
            Widget::TextArea | Widget::Json => "Textarea",
            Widget::Number => "InputNumber",
            Widget::Checkbox => "Checkbox",
            Widget::Select => "Select",
        });
    }
    components
}

fn js_list<'a>(columns: impl Iterator<Item = &'a ColumnContext>) -> String {
    let items: Vec<String> = columns.map(|c| js_str(&c.attr)).collect();
    format!("[{}]", items.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::context::tests::hr_model;
    use crate::codegen::naming::NamingEngine;
    use crate::codegen::type_mapper::TypeMapper;

    fn context(name: &str) -> TableContext {
        let naming = NamingEngine::default();
        let model = hr_model(&naming);
        TableContext::build(
            model.table(name).unwrap(),
            &model,
            &naming,
            &TypeMapper::default(),
            "http://localhost:8000",
            false,
        )
    }

    #[test]
    fn test_list_view() {
        let ctx = context("department");
        let mut output = String::new();
        render_list_view(&ctx, ctx.primary_key.as_ref().unwrap(), &mut output).unwrap();

        assert!(output.contains("<h2>Departments</h2>"));
        assert!(output.contains("dataKey=\"id\" paginator"));
        assert!(output.contains("<Column field=\"budget\" header=\"Budget\" sortable />"));
        assert!(output.contains("router.push({ name: 'department-edit', params: { id: record.id } })"));
        assert!(output.contains("if (!window.confirm('Delete this department?')) {"));
    }

    #[test]
    fn test_form_widgets() {
        let ctx = context("employee");
        let mut output = String::new();
        render_form_view(&ctx, ctx.primary_key.as_ref().unwrap(), &mut output).unwrap();

        assert!(output.contains("<div v-if=\"isEdit\" class=\"field\">\n        <label for=\"id\">Id</label>\n        <InputNumber inputId=\"id\" v-model=\"form.id\" :useGrouping=\"false\" disabled />"));
        assert!(output.contains("<InputText id=\"name\" v-model=\"form.name\" type=\"text\" required />"));
        assert!(output.contains(":options=\"departmentStore.items\" optionLabel=\"name\" optionValue=\"id\""));
        assert!(output.contains(":options=\"store.items\""));
        assert!(output.contains("<Textarea id=\"profile\" v-model=\"jsonText.profile\" rows=\"6\" />"));
        assert!(output.contains("import { useDepartmentStore } from '../stores/departmentStore'\n"));
        assert!(output.contains("const departmentStore = useDepartmentStore()\n"));
        assert!(output.contains("const createFields = ['name', 'department_id', 'manager_id', 'hired_at', 'profile']\n"));
        assert!(output.contains("const key = computed(() => ({ id: route.params.id }))\n"));
        assert!(output.contains("import Select from 'primevue/select'\n"));
    }
}
