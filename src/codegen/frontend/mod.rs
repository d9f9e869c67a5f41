/// Vue 3 frontend templates: axios services, Pinia stores, PrimeVue views
/// and vitest store tests.
///
/// ## Layout
///
/// Per table the frontend side produces:
/// - `src/services/{table}Service.js` calling the backend router
/// - `src/stores/{table}Store.js` wrapping the service in a Pinia store
/// - `src/views/{Table}ListView.vue` and `src/views/{Table}FormView.vue`
/// - `src/tests/{table}Store.test.js` testing the store against a mocked service
///
/// [`scaffold_files`] produces the app shell (router, navigation, axios
/// instance, build configuration) listing every generated table.

mod scaffold;
mod services;
mod stores;
mod views;
mod vitest;

pub use scaffold::scaffold_files;
pub use services::render_service;
pub use stores::render_store;
pub use views::{render_form_view, render_list_view};
pub use vitest::render_store_test;

/// Single-quoted JavaScript string literal
fn js_str(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
}
