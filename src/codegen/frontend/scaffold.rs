/// Frontend app shell generation.

use std::fmt::{self, Write};

use super::js_str;
use crate::codegen::context::ProjectContext;

/// Project-level frontend files as (path relative to the frontend dir, contents).
pub fn scaffold_files(project: &ProjectContext) -> Result<Vec<(String, String)>, fmt::Error> {
    let mut files = Vec::new();

    let mut add = |path: &str, render: &dyn Fn(&ProjectContext, &mut String) -> fmt::Result| {
        let mut output = String::new();
        render(project, &mut output).map(|_| files.push((path.to_string(), output)))
    };

    add("package.json", &generate_package_json)?;
    add("vite.config.js", &generate_vite_config)?;
    add("index.html", &generate_index_html)?;
    add("README.md", &generate_readme)?;
    add("src/main.js", &generate_main_js)?;
    add("src/App.vue", &generate_app_vue)?;
    add("src/router/index.js", &generate_router)?;
    add("src/services/api.js", &generate_api_js)?;

    Ok(files)
}

/// Generate package.json
fn generate_package_json(project: &ProjectContext, output: &mut String) -> fmt::Result {
    let name = format!("{}-frontend", project.project_name.replace('_', "-"));
    writeln!(output, "{{")?;
    writeln!(output, "  \"name\": {},", serde_json::Value::String(name))?;
    writeln!(output, "  \"version\": \"0.1.0\",")?;
    writeln!(output, "  \"private\": true,")?;
    writeln!(output, "  \"type\": \"module\",")?;
    writeln!(output, "  \"scripts\": {{")?;
    writeln!(output, "    \"dev\": \"vite\",")?;
    writeln!(output, "    \"build\": \"vite build\",")?;
    writeln!(output, "    \"preview\": \"vite preview\",")?;
    writeln!(output, "    \"test\": \"vitest run\"")?;
    writeln!(output, "  }},")?;
    writeln!(output, "  \"dependencies\": {{")?;
    writeln!(output, "    \"@primevue/themes\": \"^4.0.0\",")?;
    writeln!(output, "    \"axios\": \"^1.6.0\",")?;
    writeln!(output, "    \"pinia\": \"^2.1.7\",")?;
    writeln!(output, "    \"primeicons\": \"^7.0.0\",")?;
    writeln!(output, "    \"primevue\": \"^4.0.0\",")?;
    writeln!(output, "    \"vue\": \"^3.4.0\",")?;
    writeln!(output, "    \"vue-router\": \"^4.3.0\"")?;
    writeln!(output, "  }},")?;
    writeln!(output, "  \"devDependencies\": {{")?;
    writeln!(output, "    \"@vitejs/plugin-vue\": \"^5.0.0\",")?;
    writeln!(output, "    \"jsdom\": \"^24.0.0\",")?;
    writeln!(output, "    \"vite\": \"^5.2.0\",")?;
    writeln!(output, "    \"vitest\": \"^1.6.0\"")?;
    writeln!(output, "  }}")?;
    writeln!(output, "}}")?;
    Ok(())
}

/// Generate vite.config.js
fn generate_vite_config(_project: &ProjectContext, output: &mut String) -> fmt::Result {
    writeln!(output, "import {{ defineConfig }} from 'vitest/config'")?;
    writeln!(output, "import vue from '@vitejs/plugin-vue'\n")?;
    writeln!(output, "export default defineConfig({{")?;
    writeln!(output, "  plugins: [vue()],")?;
    writeln!(output, "  server: {{")?;
    writeln!(output, "    host: '0.0.0.0',")?;
    writeln!(output, "    port: 5173,")?;
    writeln!(output, "  }},")?;
    writeln!(output, "  test: {{")?;
    writeln!(output, "    environment: 'jsdom',")?;
    writeln!(output, "  }},")?;
    writeln!(output, "}})")?;
    Ok(())
}

/// Generate index.html
fn generate_index_html(project: &ProjectContext, output: &mut String) -> fmt::Result {
    writeln!(output, "<!DOCTYPE html>")?;
    writeln!(output, "<html lang=\"en\">")?;
    writeln!(output, "  <head>")?;
    writeln!(output, "    <meta charset=\"UTF-8\" />")?;
    writeln!(
        output,
        "    <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\" />"
    )?;
    writeln!(output, "    <title>{}</title>", project.title)?;
    writeln!(output, "  </head>")?;
    writeln!(output, "  <body>")?;
    writeln!(output, "    <div id=\"app\"></div>")?;
    writeln!(output, "    <script type=\"module\" src=\"/src/main.js\"></script>")?;
    writeln!(output, "  </body>")?;
    writeln!(output, "</html>")?;
    Ok(())
}

fn generate_readme(project: &ProjectContext, output: &mut String) -> fmt::Result {
    writeln!(output, "# {} Frontend\n", project.title)?;
    writeln!(output, "Vue 3 + PrimeVue + Pinia client for the generated API.\n")?;
    writeln!(output, "```bash")?;
    writeln!(output, "npm install")?;
    writeln!(output, "npm run dev")?;
    writeln!(output, "npm test")?;
    writeln!(output, "```\n")?;
    writeln!(
        output,
        "The API base URL defaults to `{}`; set `VITE_API_BASE_URL` to override it.",
        project.api_base_url
    )?;
    Ok(())
}

fn generate_main_js(_project: &ProjectContext, output: &mut String) -> fmt::Result {
    writeln!(output, "import {{ createApp }} from 'vue'")?;
    writeln!(output, "import {{ createPinia }} from 'pinia'")?;
    writeln!(output, "import PrimeVue from 'primevue/config'")?;
    writeln!(output, "import Aura from '@primevue/themes/aura'")?;
    writeln!(output, "import 'primeicons/primeicons.css'")?;
    writeln!(output, "import App from './App.vue'")?;
    writeln!(output, "import router from './router'\n")?;
    writeln!(output, "const app = createApp(App)")?;
    writeln!(output, "app.use(createPinia())")?;
    writeln!(output, "app.use(router)")?;
    writeln!(output, "app.use(PrimeVue, {{ theme: {{ preset: Aura }} }})")?;
    writeln!(output, "app.mount('#app')")?;
    Ok(())
}

fn generate_app_vue(project: &ProjectContext, output: &mut String) -> fmt::Result {
    writeln!(output, "<template>")?;
    writeln!(output, "  <div class=\"app\">")?;
    writeln!(output, "    <nav class=\"nav\">")?;
    writeln!(output, "      <strong>{}</strong>", project.title)?;
    for table in &project.tables {
        writeln!(
            output,
            "      <RouterLink :to=\"{{ name: '{}-list' }}\">{}</RouterLink>",
            table.snake_singular, table.title_plural
        )?;
    }
    writeln!(output, "    </nav>")?;
    writeln!(output, "    <main>")?;
    writeln!(output, "      <RouterView />")?;
    writeln!(output, "    </main>")?;
    writeln!(output, "  </div>")?;
    writeln!(output, "</template>\n")?;
    writeln!(output, "<style>")?;
    writeln!(output, ".nav {{")?;
    writeln!(output, "  display: flex;")?;
    writeln!(output, "  gap: 1rem;")?;
    writeln!(output, "  padding: 1rem;")?;
    writeln!(output, "}}")?;
    writeln!(output, ".field {{")?;
    writeln!(output, "  display: flex;")?;
    writeln!(output, "  flex-direction: column;")?;
    writeln!(output, "  gap: 0.25rem;")?;
    writeln!(output, "  margin-bottom: 1rem;")?;
    writeln!(output, "}}")?;
    writeln!(output, ".error {{")?;
    writeln!(output, "  color: #b91c1c;")?;
    writeln!(output, "}}")?;
    writeln!(output, "</style>")?;
    Ok(())
}

fn generate_router(project: &ProjectContext, output: &mut String) -> fmt::Result {
    writeln!(output, "import {{ createRouter, createWebHistory }} from 'vue-router'")?;
    for table in &project.tables {
        writeln!(
            output,
            "import {}ListView from '../views/{}ListView.vue'",
            table.pascal_singular, table.pascal_singular
        )?;
        writeln!(
            output,
            "import {}FormView from '../views/{}FormView.vue'",
            table.pascal_singular, table.pascal_singular
        )?;
    }

    writeln!(output, "\nconst routes = [")?;
    if let Some(first) = project.tables.first() {
        writeln!(output, "  {{ path: '/', redirect: {} }},", js_str(&first.route_prefix))?;
    }
    for table in &project.tables {
        let view = &table.pascal_singular;
        let single = &table.snake_singular;
        writeln!(
            output,
            "  {{ path: {}, name: '{}-list', component: {}ListView }},",
            js_str(&table.route_prefix),
            single,
            view
        )?;
        writeln!(
            output,
            "  {{ path: {}, name: '{}-new', component: {}FormView }},",
            js_str(&format!("{}/new", table.route_prefix)),
            single,
            view
        )?;
        writeln!(
            output,
            "  {{ path: {}, name: '{}-edit', component: {}FormView }},",
            js_str(&format!("{}/{}/edit", table.route_prefix, table.js_route_params)),
            single,
            view
        )?;
    }
    writeln!(output, "]\n")?;
    writeln!(output, "export default createRouter({{")?;
    writeln!(output, "  history: createWebHistory(),")?;
    writeln!(output, "  routes,")?;
    writeln!(output, "}})")?;
    Ok(())
}

fn generate_api_js(project: &ProjectContext, output: &mut String) -> fmt::Result {
    writeln!(output, "import axios from 'axios'\n")?;
    writeln!(
        output,
        "export const API_URL = import.meta.env.VITE_API_BASE_URL || {}\n",
        js_str(&project.api_base_url)
    )?;
    writeln!(output, "const api = axios.create({{")?;
    writeln!(output, "  baseURL: API_URL,")?;
    writeln!(output, "  headers: {{ 'Content-Type': 'application/json' }},")?;
    writeln!(output, "}})\n")?;
    writeln!(output, "export default api")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::backend::DatabaseType;
    use crate::codegen::context::tests::hr_model;
    use crate::codegen::context::TableContext;
    use crate::codegen::naming::NamingEngine;
    use crate::codegen::type_mapper::TypeMapper;

    fn files() -> Vec<(String, String)> {
        let naming = NamingEngine::default();
        let model = hr_model(&naming);
        let contexts: Vec<TableContext> = model
            .tables()
            .iter()
            .map(|t| {
                TableContext::build(t, &model, &naming, &TypeMapper::default(), "http://api.local/", false)
            })
            .collect();
        let refs: Vec<&TableContext> = contexts.iter().collect();
        let project = ProjectContext::build("hr_portal", DatabaseType::PostgreSQL, "http://api.local/", &refs, &model);
        scaffold_files(&project).unwrap()
    }

    fn file<'a>(files: &'a [(String, String)], path: &str) -> &'a str {
        files
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, c)| c.as_str())
            .unwrap_or_else(|| panic!("missing {}", path))
    }

    #[test]
    fn test_router_lists_every_table() {
        let files = files();
        let router = file(&files, "src/router/index.js");
        assert!(router.contains("import DepartmentListView from '../views/DepartmentListView.vue'\n"));
        assert!(router.contains("  { path: '/', redirect: '/departments' },\n"));
        assert!(router.contains("  { path: '/employees/:id/edit', name: 'employee-edit', component: EmployeeFormView },\n"));

        let app = file(&files, "src/App.vue");
        assert!(app.contains("<RouterLink :to=\"{ name: 'employee-list' }\">Employees</RouterLink>"));
    }

    #[test]
    fn test_api_base_url_and_package_name() {
        let files = files();
        assert!(file(&files, "src/services/api.js")
            .contains("import.meta.env.VITE_API_BASE_URL || 'http://api.local'\n"));
        assert!(file(&files, "package.json").contains("\"name\": \"hr-portal-frontend\","));
        assert_eq!(files.len(), 8);
    }
}
