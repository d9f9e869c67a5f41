//! Output layers and where their artifacts live.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::codegen::naming::IdentifierForms;

/// One category of generated per-table artifact.
///
/// Declaration order is render order: every backend layer precedes every
/// frontend layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Layer {
    PersistenceModel,
    ValidationSchema,
    CrudOperations,
    Router,
    BackendTest,
    ApiService,
    StateStore,
    ListView,
    FormView,
    StoreTest,
}

/// Which half of the skeleton a layer belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Backend,
    Frontend,
}

impl Layer {
    pub const ALL: [Layer; 10] = [
        Layer::PersistenceModel,
        Layer::ValidationSchema,
        Layer::CrudOperations,
        Layer::Router,
        Layer::BackendTest,
        Layer::ApiService,
        Layer::StateStore,
        Layer::ListView,
        Layer::FormView,
        Layer::StoreTest,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Layer::PersistenceModel => "persistence-model",
            Layer::ValidationSchema => "validation-schema",
            Layer::CrudOperations => "crud-operations",
            Layer::Router => "router",
            Layer::BackendTest => "backend-test",
            Layer::ApiService => "api-service",
            Layer::StateStore => "state-store",
            Layer::ListView => "list-view",
            Layer::FormView => "form-view",
            Layer::StoreTest => "store-test",
        }
    }

    pub fn side(&self) -> Side {
        match self {
            Layer::PersistenceModel
            | Layer::ValidationSchema
            | Layer::CrudOperations
            | Layer::Router
            | Layer::BackendTest => Side::Backend,
            _ => Side::Frontend,
        }
    }

    pub fn is_backend(&self) -> bool {
        self.side() == Side::Backend
    }

    /// Path of the artifact relative to its side's root directory.
    pub fn relative_path(&self, table: &IdentifierForms) -> String {
        let snake = &table.snake_singular;
        let pascal = &table.pascal_singular;
        match self {
            Layer::PersistenceModel => format!("models/{}.py", snake),
            Layer::ValidationSchema => format!("schemas/{}.py", snake),
            Layer::CrudOperations => format!("crud/{}.py", snake),
            Layer::Router => format!("routers/{}.py", snake),
            Layer::BackendTest => format!("tests/test_{}.py", snake),
            Layer::ApiService => format!("src/services/{}Service.js", snake),
            Layer::StateStore => format!("src/stores/{}Store.js", snake),
            Layer::ListView => format!("src/views/{}ListView.vue", pascal),
            Layer::FormView => format!("src/views/{}FormView.vue", pascal),
            Layer::StoreTest => format!("src/tests/{}Store.test.js", snake),
        }
    }
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Backend => "backend",
            Side::Frontend => "frontend",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
