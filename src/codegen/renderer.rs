//! Rendering of one table through one layer's template.
//!
//! Templates are plain functions over a [`TableContext`]. The set of
//! templates is closed: [`template_for`] maps every [`Layer`] to exactly one
//! function, so a layer without a template cannot compile.

use std::collections::HashSet;
use std::fmt;

use crate::codegen::backend;
use crate::codegen::context::{PrimaryKeyContext, TableContext};
use crate::codegen::error::RenderError;
use crate::codegen::frontend;
use crate::codegen::layers::Layer;
use crate::codegen::naming::NamingEngine;
use crate::codegen::schema::{SchemaModel, Table};
use crate::codegen::type_mapper::TypeMapper;

/// Signature shared by every per-table template.
pub type TemplateFn = fn(&TableContext, &PrimaryKeyContext, &mut String) -> fmt::Result;

fn schemas_template(ctx: &TableContext, _pk: &PrimaryKeyContext, output: &mut String) -> fmt::Result {
    backend::render_schemas(ctx, output)
}

/// The registered template for a layer.
pub fn template_for(layer: Layer) -> TemplateFn {
    match layer {
        Layer::PersistenceModel => backend::render_model,
        Layer::ValidationSchema => schemas_template,
        Layer::CrudOperations => backend::render_crud,
        Layer::Router => backend::render_router,
        Layer::BackendTest => backend::render_backend_test,
        Layer::ApiService => frontend::render_service,
        Layer::StateStore => frontend::render_store,
        Layer::ListView => frontend::render_list_view,
        Layer::FormView => frontend::render_form_view,
        Layer::StoreTest => frontend::render_store_test,
    }
}

/// Renders tables of a resolved [`SchemaModel`].
///
/// Holds the run's naming cache and type mapper by reference; rendering never
/// mutates the model.
pub struct TemplateRenderer<'a> {
    model: &'a SchemaModel,
    naming: &'a NamingEngine,
    types: &'a TypeMapper,
    api_base_url: String,
    eager_load: HashSet<String>,
}

impl<'a> TemplateRenderer<'a> {
    pub fn new(model: &'a SchemaModel, naming: &'a NamingEngine, types: &'a TypeMapper) -> Self {
        Self {
            model,
            naming,
            types,
            api_base_url: "http://localhost:8000".to_string(),
            eager_load: HashSet::new(),
        }
    }

    pub fn with_api_base_url(mut self, url: &str) -> Self {
        self.api_base_url = url.to_string();
        self
    }

    /// Tables whose read-by-key endpoint loads child collections.
    pub fn with_eager_load<S: AsRef<str>>(mut self, tables: &[S]) -> Self {
        self.eager_load = tables.iter().map(|t| t.as_ref().to_string()).collect();
        self
    }

    /// Build the rendering context for a table.
    pub fn context(&self, table: &Table) -> TableContext {
        TableContext::build(
            table,
            self.model,
            self.naming,
            self.types,
            &self.api_base_url,
            self.eager_load.contains(&table.name),
        )
    }

    /// Render a single layer for a table.
    pub fn render(&self, table: &Table, layer: Layer) -> Result<String, RenderError> {
        self.check_model(table, layer)?;
        render_context(&self.context(table), layer)
    }

    /// Render several layers for one table, stopping at the first failure.
    ///
    /// Nothing is returned for a table that fails, so callers can write
    /// a table's files all together or not at all.
    pub fn render_table(
        &self,
        table: &Table,
        layers: &[Layer],
    ) -> Result<(TableContext, Vec<(Layer, String)>), (Layer, RenderError)> {
        let ctx = self.context(table);
        let mut rendered = Vec::with_capacity(layers.len());
        for &layer in layers {
            self.check_model(table, layer).map_err(|e| (layer, e))?;
            let text = render_context(&ctx, layer).map_err(|e| (layer, e))?;
            rendered.push((layer, text));
        }
        Ok((ctx, rendered))
    }

    fn check_model(&self, table: &Table, layer: Layer) -> Result<(), RenderError> {
        if !self.model.is_resolved() {
            return Err(RenderError::MissingAttribute {
                table: table.name.clone(),
                layer,
                attribute: "resolved relationships",
            });
        }
        Ok(())
    }
}

/// Render one layer from an already built context.
pub fn render_context(ctx: &TableContext, layer: Layer) -> Result<String, RenderError> {
    // Models need a mapper identity; routes and views address records by key
    let Some(pk) = &ctx.primary_key else {
        return Err(RenderError::MissingAttribute {
            table: ctx.name.clone(),
            layer,
            attribute: "a primary key",
        });
    };

    let mut output = String::new();
    template_for(layer)(ctx, pk, &mut output)?;
    Ok(output)
}
