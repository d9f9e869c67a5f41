//! Rendering context: every decision a template needs, precomputed.
//!
//! Templates only format fields of these structs and branch on their
//! booleans. Anything derived from names or types is computed here through
//! the [`NamingEngine`] and [`TypeMapper`] so all layers agree.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

use crate::codegen::backend::utils::{py_str, py_str_list};
use crate::codegen::backend::DatabaseType;
use crate::codegen::naming::{to_title_case, NamingEngine, PYTHON_KEYWORDS};
use crate::codegen::schema::{Column, ForeignKey, SchemaModel, Table};
use crate::codegen::type_mapper::{js_literal, python_literal, TypeMapper, TypeTarget};
use crate::codegen::types::DataType;

static PY_TYPE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(date|datetime|time|timedelta|Decimal|UUID|Any|Optional)\b")
        .expect("valid python type token regex")
});

/// Form control for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Widget {
    /// `<InputText>` with `input_type`
    Input,
    TextArea,
    Number,
    Checkbox,
    /// Text area holding serialized JSON
    Json,
    /// Dropdown of parent records
    Select,
}

/// Parent records offered by a foreign-key dropdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignOption {
    /// Variable holding the parent store in the form view
    pub store_var: String,
    pub value_attr: String,
    pub label_attr: String,
}

/// A store the form view imports for foreign-key dropdowns.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct StoreImport {
    pub store_fn: String,
    pub module: String,
    pub store_var: String,
}

#[derive(Debug, Clone)]
pub struct ColumnContext {
    /// Database column name
    pub name: String,
    /// Attribute name in Python and JSON payloads
    pub attr: String,
    pub label: String,
    pub data_type: DataType,
    pub nullable: bool,
    pub primary_key: bool,
    pub auto_generated: bool,
    /// Pydantic field type, wrapped in `Optional` when nullable
    pub annotation: String,
    /// Field declaration tail in the Base/Create schema
    pub create_annotation: String,
    /// Field declaration tail in the Update schema
    pub update_annotation: String,
    /// SQLAlchemy type expression, e.g. `String(100)`
    pub persistence_type: String,
    /// Arguments of `mapped_column(...)`
    pub column_args: String,
    pub in_create: bool,
    /// Create payload may omit it
    pub create_optional: bool,
    pub in_update: bool,
    pub in_list: bool,
    pub widget: Widget,
    pub input_type: String,
    pub readonly: bool,
    pub required: bool,
    pub client_type: String,
    pub fraction_digits: Option<u32>,
    pub sample_py: String,
    pub sample_js: String,
    /// Initial value in an empty form
    pub empty_js: String,
    pub foreign: Option<ForeignOption>,
    pub doc: Option<String>,
}

/// One column of the primary key.
#[derive(Debug, Clone)]
pub struct KeyPart {
    pub attr: String,
    pub python_type: String,
}

#[derive(Debug, Clone)]
pub struct PrimaryKeyContext {
    pub parts: Vec<KeyPart>,
    pub is_composite: bool,
    /// `id: int` or `order_id: int, line_no: int`
    pub py_params: String,
    /// `id` or `order_id, line_no`
    pub py_args: String,
    /// Identity passed to `Session.get`
    pub get_key: String,
    /// Arguments of `.where(...)` selecting one record
    pub where_clause: String,
    pub order_by: String,
    /// `/{id}` or `/{order_id}/{line_no}`
    pub route_path: String,
    /// f-string path segment built from a `created` response dict
    pub test_path_from_created: String,
    pub test_missing_path: String,
    /// `:id` or `:order_id/:line_no`
    pub js_route_params: String,
    /// Template-literal path built from a `key` object
    pub js_key_path: String,
    /// Key object built from a `record`
    pub js_key_of_record: String,
    /// Expression comparing `record` against `key`
    pub js_matches: String,
    /// Single-column keys only
    pub data_key: Option<String>,
}

/// A relationship attribute on the persistence model.
#[derive(Debug, Clone)]
pub struct RelationshipContext {
    pub attr: String,
    /// Full `Mapped[...]` annotation
    pub annotation: String,
    /// Arguments of `relationship(...)`
    pub args: String,
}

/// The parent side of a child collection, seen from the parent.
#[derive(Debug, Clone)]
pub struct ChildContext {
    pub attr: String,
    pub child_class: String,
    pub child_module: String,
    pub child_read_class: String,
    pub self_referential: bool,
    pub label: String,
}

#[derive(Debug, Clone)]
pub struct TableContext {
    pub name: String,
    pub qualified_name: String,
    pub doc: Option<String>,
    pub snake_singular: String,
    pub snake_plural: String,
    pub pascal_singular: String,
    pub pascal_plural: String,
    pub camel_singular: String,
    pub title: String,
    pub title_plural: String,
    /// URL prefix the router is mounted under
    pub route_prefix: String,
    pub api_base_url: String,
    pub columns: Vec<ColumnContext>,
    pub primary_key: Option<PrimaryKeyContext>,
    pub parent_relationships: Vec<RelationshipContext>,
    pub child_relationships: Vec<RelationshipContext>,
    pub children: Vec<ChildContext>,
    pub eager_load: bool,
    pub model_imports: Vec<String>,
    pub model_type_imports: Vec<String>,
    /// Contents of `__table_args__`, if any
    pub table_args: Option<String>,
    pub schema_imports: Vec<String>,
    /// `from schemas.x import XRead` lines needed by the Full schema
    pub child_schema_imports: Vec<String>,
    pub form_store_imports: Vec<StoreImport>,
    /// Update test payload: attribute and new value
    pub update_sample: Option<(String, String)>,
}

impl TableContext {
    pub fn build(
        table: &Table,
        model: &SchemaModel,
        naming: &NamingEngine,
        types: &TypeMapper,
        api_base_url: &str,
        eager_load: bool,
    ) -> Self {
        let forms = naming.forms(&table.name);
        let pascal = forms.pascal_singular.clone();

        let columns: Vec<ColumnContext> = table
            .columns
            .iter()
            .map(|c| column_context(table, c, model, naming, types))
            .collect();

        let primary_key = primary_key_context(table, &pascal, naming, types);

        // Only tables that get generated code are linked
        let linked: Vec<&ForeignKey> = table
            .foreign_keys
            .iter()
            .filter(|fk| model.is_renderable(&fk.target_table))
            .collect();

        let parent_relationships = linked
            .iter()
            .map(|fk| parent_relationship(table, fk, naming))
            .collect();

        let mut child_relationships = Vec::new();
        let mut children = Vec::new();
        for child in &table.children {
            let Some((child_table, fk)) = model.child_foreign_key(child) else {
                continue;
            };
            if !child_table.has_primary_key() {
                continue;
            }
            let child_forms = naming.forms(&child_table.name);
            child_relationships.push(RelationshipContext {
                attr: child.attr.clone(),
                annotation: format!("Mapped[list[{}]]", py_str(&child_forms.pascal_singular)),
                args: format!(
                    "{}, back_populates={}, foreign_keys={}",
                    py_str(&child_forms.pascal_singular),
                    py_str(&fk.parent_attr),
                    py_str(&foreign_keys_expr(&child_forms.pascal_singular, &fk.columns, naming)),
                ),
            });
            children.push(ChildContext {
                attr: child.attr.clone(),
                child_class: child_forms.pascal_singular.clone(),
                child_module: child_forms.snake_singular.clone(),
                child_read_class: format!("{}Read", child_forms.pascal_singular),
                self_referential: child_table.name == table.name,
                label: to_title_case(child.attr.trim_end_matches("_collection")),
            });
        }

        let model_type_imports = related_classes(table, model, naming)
            .into_iter()
            .map(|(module, class)| format!("from models.{} import {}", module, class))
            .collect::<Vec<_>>();

        let table_args = table_args(table, &linked);
        let model_imports = model_imports(
            &columns,
            &linked,
            !linked.is_empty() || !children.is_empty(),
            !model_type_imports.is_empty(),
            table_args.is_some(),
        );

        let child_schema_imports: BTreeSet<String> = children
            .iter()
            .filter(|c| !c.self_referential)
            .map(|c| {
                format!(
                    "from schemas.{} import {}  # noqa: E402",
                    c.child_module, c.child_read_class
                )
            })
            .collect();
        let schema_imports = schema_imports(&columns);

        let mut form_store_imports: BTreeSet<StoreImport> = BTreeSet::new();
        for fk in &linked {
            if fk.is_composite() || fk.target_table == table.name {
                continue;
            }
            let target = naming.forms(&fk.target_table);
            form_store_imports.insert(StoreImport {
                store_fn: format!("use{}Store", target.pascal_singular),
                module: format!("{}Store", target.snake_singular),
                store_var: format!("{}Store", target.camel_singular),
            });
        }

        let update_sample = columns
            .iter()
            .find(|c| {
                c.in_update
                    && c.foreign.is_none()
                    && matches!(c.data_type, DataType::Text | DataType::LongText)
            })
            .map(|c| (c.attr.clone(), py_str(&format!("updated {}", c.attr))));

        let eager_load = eager_load && !children.is_empty();
        TableContext {
            name: table.name.clone(),
            qualified_name: table.qualified_name(),
            doc: table.doc.clone(),
            snake_singular: forms.snake_singular.clone(),
            snake_plural: forms.snake_plural.clone(),
            pascal_singular: pascal.clone(),
            pascal_plural: forms.pascal_plural.clone(),
            camel_singular: forms.camel_singular.clone(),
            title: to_title_case(&forms.snake_singular),
            title_plural: to_title_case(&forms.snake_plural),
            route_prefix: format!("/{}", forms.snake_plural),
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            columns,
            primary_key,
            parent_relationships,
            child_relationships,
            children,
            eager_load,
            model_imports,
            model_type_imports,
            table_args,
            schema_imports,
            child_schema_imports: child_schema_imports.into_iter().collect(),
            form_store_imports: form_store_imports.into_iter().collect(),
            update_sample,
        }
    }

    pub fn create_columns(&self) -> impl Iterator<Item = &ColumnContext> {
        self.columns.iter().filter(|c| c.in_create)
    }

    pub fn update_columns(&self) -> impl Iterator<Item = &ColumnContext> {
        self.columns.iter().filter(|c| c.in_update)
    }

    pub fn read_only_columns(&self) -> impl Iterator<Item = &ColumnContext> {
        self.columns.iter().filter(|c| !c.in_create)
    }

    pub fn json_columns(&self) -> impl Iterator<Item = &ColumnContext> {
        self.columns.iter().filter(|c| c.widget == Widget::Json)
    }
}

/// Attribute name that is a valid Python identifier.
pub fn safe_attr(snake: &str) -> String {
    if PYTHON_KEYWORDS.contains(&snake) {
        format!("{}_", snake)
    } else if snake.starts_with(|c: char| c.is_ascii_digit()) {
        format!("c_{}", snake)
    } else {
        snake.to_string()
    }
}

fn attr_of(name: &str, naming: &NamingEngine) -> String {
    safe_attr(&naming.forms(name).snake)
}

fn column_context(
    table: &Table,
    column: &Column,
    model: &SchemaModel,
    naming: &NamingEngine,
    types: &TypeMapper,
) -> ColumnContext {
    let attr = attr_of(&column.name, naming);
    let python_type = types.map(column, TypeTarget::Validation);
    let annotation = if column.nullable {
        format!("Optional[{}]", python_type)
    } else {
        python_type.clone()
    };
    let has_default = column.default.is_some();
    let display = types.map(column, TypeTarget::Display);
    let sample = types.sample(column);

    let single_fk = table
        .foreign_key_for(&column.name)
        .filter(|fk| !fk.is_composite() && model.is_renderable(&fk.target_table));
    let foreign = single_fk.map(|fk| {
        let target_forms = naming.forms(&fk.target_table);
        let target = model.table(&fk.target_table);
        ForeignOption {
            store_var: if fk.target_table == table.name {
                "store".to_string()
            } else {
                format!("{}Store", target_forms.camel_singular)
            },
            value_attr: attr_of(&fk.target_columns[0], naming),
            label_attr: target
                .map(|t| label_attr(t, naming))
                .unwrap_or_else(|| attr_of(&fk.target_columns[0], naming)),
        }
    });

    let widget = if foreign.is_some() {
        Widget::Select
    } else if column.data_type == DataType::Json {
        Widget::Json
    } else {
        match display.as_str() {
            "textarea" => Widget::TextArea,
            "checkbox" => Widget::Checkbox,
            "number" => Widget::Number,
            _ => Widget::Input,
        }
    };
    let empty_js = match widget {
        Widget::Checkbox => "false".to_string(),
        _ => "null".to_string(),
    };

    ColumnContext {
        name: column.name.clone(),
        label: to_title_case(&naming.forms(&column.name).snake),
        data_type: column.data_type,
        nullable: column.nullable,
        primary_key: column.primary_key,
        auto_generated: column.auto_generated,
        create_annotation: if column.nullable || has_default {
            format!("Optional[{}] = None", python_type)
        } else {
            python_type.clone()
        },
        update_annotation: format!("Optional[{}] = None", python_type),
        annotation,
        persistence_type: types.map(column, TypeTarget::Persistence),
        column_args: column_args(table, column, model, types),
        in_create: !column.auto_generated,
        create_optional: column.nullable || has_default,
        in_update: !column.primary_key && !column.auto_generated,
        in_list: !matches!(
            column.data_type,
            DataType::LongText | DataType::Json | DataType::Binary
        ),
        widget,
        input_type: display,
        readonly: column.primary_key && column.auto_generated,
        required: !column.auto_generated && !column.nullable && !has_default,
        client_type: types.map(column, TypeTarget::Client),
        fraction_digits: (column.data_type == DataType::Decimal)
            .then(|| column.scale.unwrap_or(2)),
        sample_py: python_literal(&sample),
        sample_js: js_literal(&sample),
        empty_js,
        foreign,
        doc: column.doc.clone(),
        attr,
    }
}

/// Column shown in dropdowns that reference `table`.
fn label_attr(table: &Table, naming: &NamingEngine) -> String {
    table
        .columns
        .iter()
        .find(|c| !c.primary_key && c.data_type == DataType::Text)
        .or_else(|| table.columns.iter().find(|c| c.primary_key))
        .or_else(|| table.columns.first())
        .map(|c| attr_of(&c.name, naming))
        .unwrap_or_default()
}

fn column_args(table: &Table, column: &Column, model: &SchemaModel, types: &TypeMapper) -> String {
    let mut persistence = types.map(column, TypeTarget::Persistence);
    // SQLite only autoincrements INTEGER PRIMARY KEY
    if column.primary_key && column.auto_generated && column.data_type == DataType::BigInt {
        persistence = format!("{}().with_variant(Integer, \"sqlite\")", persistence);
    }
    let mut args = vec![py_str(&column.name), persistence];

    if let Some(fk) = table.foreign_key_for(&column.name) {
        if !fk.is_composite() && model.is_renderable(&fk.target_table) {
            let target = match target_schema(table, fk) {
                Some(schema) => format!("{}.{}.{}", schema, fk.target_table, fk.target_columns[0]),
                None => format!("{}.{}", fk.target_table, fk.target_columns[0]),
            };
            args.push(format!("ForeignKey({})", py_str(&target)));
        }
    }
    if column.primary_key {
        args.push("primary_key=True".to_string());
        if column.auto_generated && column.data_type.is_integer() {
            args.push("autoincrement=True".to_string());
        }
        if column.auto_generated && column.data_type == DataType::Uuid && column.default.is_none()
        {
            args.push("default=uuid.uuid4".to_string());
        }
    }
    args.push(format!(
        "nullable={}",
        if column.nullable { "True" } else { "False" }
    ));
    if let Some(default) = &column.default {
        if column.default_is_now() {
            args.push("server_default=func.now()".to_string());
        } else {
            args.push(format!("server_default=text({})", py_str(default)));
        }
    }
    if let Some(doc) = &column.doc {
        args.push(format!("comment={}", py_str(doc)));
    }
    args.join(", ")
}

/// Schema qualifier the foreign key's references were written with.
fn target_schema<'a>(table: &'a Table, fk: &ForeignKey) -> Option<&'a str> {
    table
        .columns
        .iter()
        .filter_map(|c| c.references.as_ref())
        .find(|r| r.table == fk.target_table)
        .and_then(|r| r.schema.as_deref())
}

fn foreign_keys_expr(class: &str, columns: &[String], naming: &NamingEngine) -> String {
    let attrs: Vec<String> = columns
        .iter()
        .map(|c| format!("{}.{}", class, attr_of(c, naming)))
        .collect();
    format!("[{}]", attrs.join(", "))
}

fn parent_relationship(table: &Table, fk: &ForeignKey, naming: &NamingEngine) -> RelationshipContext {
    let own = naming.forms(&table.name);
    let target = naming.forms(&fk.target_table);
    let optional = fk
        .columns
        .iter()
        .any(|c| table.column(c).map_or(true, |c| c.nullable));
    let class = py_str(&target.pascal_singular);
    let annotation = if optional {
        format!("Mapped[Optional[{}]]", class)
    } else {
        format!("Mapped[{}]", class)
    };

    let mut args = format!(
        "{}, back_populates={}, foreign_keys={}",
        class,
        py_str(&fk.collection_attr),
        py_str(&foreign_keys_expr(&own.pascal_singular, &fk.columns, naming)),
    );
    if fk.target_table == table.name {
        args.push_str(&format!(
            ", remote_side={}",
            py_str(&foreign_keys_expr(&own.pascal_singular, &fk.target_columns, naming))
        ));
    }

    RelationshipContext {
        attr: fk.parent_attr.clone(),
        annotation,
        args,
    }
}

/// (module, class) of every other model this table's relationships name.
fn related_classes(table: &Table, model: &SchemaModel, naming: &NamingEngine) -> BTreeSet<(String, String)> {
    let mut related = BTreeSet::new();
    let names = table
        .foreign_keys
        .iter()
        .map(|fk| fk.target_table.as_str())
        .chain(table.children.iter().map(|c| c.child_table.as_str()));
    for name in names {
        if name == table.name || !model.is_renderable(name) {
            continue;
        }
        let forms = naming.forms(name);
        related.insert((forms.snake_singular.clone(), forms.pascal_singular.clone()));
    }
    related
}

fn table_args(table: &Table, linked: &[&ForeignKey]) -> Option<String> {
    let mut entries: Vec<String> = Vec::new();
    for fk in linked.iter().filter(|fk| fk.is_composite()) {
        let local: Vec<&str> = fk.columns.iter().map(String::as_str).collect();
        let prefix = match target_schema(table, fk) {
            Some(schema) => format!("{}.{}", schema, fk.target_table),
            None => fk.target_table.clone(),
        };
        let remote: Vec<String> = fk
            .target_columns
            .iter()
            .map(|c| format!("{}.{}", prefix, c))
            .collect();
        entries.push(format!(
            "ForeignKeyConstraint({}, {})",
            py_str_list(&local),
            py_str_list(&remote)
        ));
    }
    if let Some(schema) = &table.schema {
        entries.push(format!("{{\"schema\": {}}}", py_str(schema)));
    }
    if entries.is_empty() {
        None
    } else {
        Some(format!("({},)", entries.join(", ")))
    }
}

/// `from x import a, b` lines for Python names used in `annotations`.
fn python_type_imports<'a>(
    annotations: impl Iterator<Item = &'a str>,
    extra_typing: &[&str],
) -> Vec<String> {
    let mut datetime = BTreeSet::new();
    let mut typing: BTreeSet<&str> = BTreeSet::new();
    let mut decimal = false;
    let mut uuid = false;
    for annotation in annotations {
        for token in PY_TYPE_TOKEN.find_iter(annotation) {
            match token.as_str() {
                "date" => {
                    datetime.insert("date");
                }
                "datetime" => {
                    datetime.insert("datetime");
                }
                "time" => {
                    datetime.insert("time");
                }
                "timedelta" => {
                    datetime.insert("timedelta");
                }
                "Decimal" => decimal = true,
                "UUID" => uuid = true,
                "Any" => {
                    typing.insert("Any");
                }
                "Optional" => {
                    typing.insert("Optional");
                }
                _ => {}
            }
        }
    }

    let mut lines = Vec::new();
    if !datetime.is_empty() {
        lines.push(format!(
            "from datetime import {}",
            datetime.into_iter().collect::<Vec<_>>().join(", ")
        ));
    }
    if decimal {
        lines.push("from decimal import Decimal".to_string());
    }
    // Constants sort before classes
    let typing: Vec<&str> = extra_typing.iter().copied().chain(typing).collect();
    if !typing.is_empty() {
        lines.push(format!("from typing import {}", typing.join(", ")));
    }
    if uuid {
        lines.push("from uuid import UUID".to_string());
    }
    lines
}

fn model_imports(
    columns: &[ColumnContext],
    linked: &[&ForeignKey],
    has_relationships: bool,
    type_checking: bool,
    has_table_args: bool,
) -> Vec<String> {
    let mut annotations: Vec<String> = columns.iter().map(|c| c.annotation.clone()).collect();
    if linked.iter().any(|fk| {
        fk.columns
            .iter()
            .any(|c| columns.iter().find(|cc| cc.name == *c).map_or(true, |cc| cc.nullable))
    }) {
        annotations.push("Optional".to_string());
    }
    let extra: &[&str] = if type_checking { &["TYPE_CHECKING"] } else { &[] };
    let mut lines = python_type_imports(annotations.iter().map(String::as_str), extra);
    if columns.iter().any(|c| c.column_args.contains("uuid.uuid4")) {
        lines.insert(0, "import uuid".to_string());
    }

    let mut sqlalchemy: BTreeSet<String> = BTreeSet::new();
    for column in columns {
        let base = column.persistence_type.split('(').next().unwrap_or_default();
        if !base.is_empty() {
            sqlalchemy.insert(base.to_string());
        }
        if column.column_args.contains("with_variant(Integer") {
            sqlalchemy.insert("Integer".to_string());
        }
        if column.column_args.contains("ForeignKey(") {
            sqlalchemy.insert("ForeignKey".to_string());
        }
        if column.column_args.contains("func.now()") {
            sqlalchemy.insert("func".to_string());
        }
        if column.column_args.contains("server_default=text(") {
            sqlalchemy.insert("text".to_string());
        }
    }
    if has_table_args && linked.iter().any(|fk| fk.is_composite()) {
        sqlalchemy.insert("ForeignKeyConstraint".to_string());
    }
    if !sqlalchemy.is_empty() {
        lines.push(String::new());
        lines.push(format!(
            "from sqlalchemy import {}",
            sqlalchemy.into_iter().collect::<Vec<_>>().join(", ")
        ));
    }
    let mut orm = vec!["Mapped", "mapped_column"];
    if has_relationships {
        orm.push("relationship");
    }
    lines.push(format!("from sqlalchemy.orm import {}", orm.join(", ")));
    lines.push(String::new());
    lines.push("from database import Base".to_string());
    lines
}

fn schema_imports(columns: &[ColumnContext]) -> Vec<String> {
    let annotations = columns.iter().flat_map(|c| {
        let update = c.in_update.then_some(c.update_annotation.as_str());
        let create = c.in_create.then_some(c.create_annotation.as_str());
        let read = (!c.in_create).then_some(c.annotation.as_str());
        [create, update, read].into_iter().flatten()
    });
    let mut lines = python_type_imports(annotations, &[]);
    lines.push(String::new());
    lines.push("from pydantic import BaseModel, ConfigDict".to_string());
    lines
}

fn primary_key_context(
    table: &Table,
    pascal: &str,
    naming: &NamingEngine,
    types: &TypeMapper,
) -> Option<PrimaryKeyContext> {
    let pk = table.primary_key();
    if pk.is_empty() {
        return None;
    }
    let parts: Vec<KeyPart> = pk
        .iter()
        .map(|c| KeyPart {
            attr: attr_of(&c.name, naming),
            python_type: types.map(c, TypeTarget::Validation),
        })
        .collect();
    let attrs: Vec<&str> = parts.iter().map(|p| p.attr.as_str()).collect();
    let join = |f: &dyn Fn(&KeyPart) -> String, sep: &str| -> String {
        parts.iter().map(f).collect::<Vec<_>>().join(sep)
    };

    let is_composite = parts.len() > 1;
    let get_key = if is_composite {
        format!("({})", attrs.join(", "))
    } else {
        attrs[0].to_string()
    };
    let missing: Vec<&str> = pk.iter().map(|c| missing_key_segment(c.data_type)).collect();

    Some(PrimaryKeyContext {
        py_params: join(&|p| format!("{}: {}", p.attr, p.python_type), ", "),
        py_args: attrs.join(", "),
        get_key,
        where_clause: join(&|p| format!("{}.{} == {}", pascal, p.attr, p.attr), ", "),
        order_by: join(&|p| format!("{}.{}", pascal, p.attr), ", "),
        route_path: join(&|p| format!("/{{{}}}", p.attr), ""),
        test_path_from_created: join(&|p| format!("{{created['{}']}}", p.attr), "/"),
        test_missing_path: missing.join("/"),
        js_route_params: join(&|p| format!(":{}", p.attr), "/"),
        js_key_path: join(&|p| format!("${{key.{}}}", p.attr), "/"),
        js_key_of_record: format!(
            "{{ {} }}",
            join(&|p| format!("{}: record.{}", p.attr, p.attr), ", ")
        ),
        js_matches: join(
            &|p| format!("String(record.{}) === String(key.{})", p.attr, p.attr),
            " && ",
        ),
        data_key: (!is_composite).then(|| attrs[0].to_string()),
        is_composite,
        parts,
    })
}

fn missing_key_segment(data_type: DataType) -> &'static str {
    match data_type {
        DataType::Uuid => "00000000-0000-0000-0000-000000000000",
        DataType::Date => "1900-01-01",
        DataType::Timestamp => "1900-01-01T00:00:00",
        DataType::Text | DataType::LongText | DataType::Binary | DataType::Json => "missing-key",
        DataType::Boolean => "false",
        DataType::Integer | DataType::BigInt | DataType::Decimal => "999999",
    }
}

/// Everything the project-level scaffold needs.
#[derive(Debug, Clone)]
pub struct ProjectContext {
    pub project_name: String,
    pub title: String,
    pub database: DatabaseType,
    pub database_url: String,
    pub api_base_url: String,
    /// Schema qualifiers used by any table
    pub schemas: Vec<String>,
    pub tables: Vec<ScaffoldTable>,
}

#[derive(Debug, Clone)]
pub struct ScaffoldTable {
    pub snake_singular: String,
    pub snake_plural: String,
    pub pascal_singular: String,
    pub title_plural: String,
    pub route_prefix: String,
    pub js_route_params: String,
}

impl ProjectContext {
    /// `tables` are the successfully generated tables, in input order.
    pub fn build(
        project_name: &str,
        database: DatabaseType,
        api_base_url: &str,
        tables: &[&TableContext],
        model: &SchemaModel,
    ) -> Self {
        let schemas: BTreeSet<String> = tables
            .iter()
            .filter_map(|t| model.table(&t.name).and_then(|t| t.schema.clone()))
            .collect();
        ProjectContext {
            project_name: project_name.to_string(),
            title: to_title_case(project_name),
            database,
            database_url: database.default_url(project_name),
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            schemas: schemas.into_iter().collect(),
            tables: tables
                .iter()
                .map(|t| ScaffoldTable {
                    snake_singular: t.snake_singular.clone(),
                    snake_plural: t.snake_plural.clone(),
                    pascal_singular: t.pascal_singular.clone(),
                    title_plural: t.title_plural.clone(),
                    route_prefix: t.route_prefix.clone(),
                    js_route_params: t
                        .primary_key
                        .as_ref()
                        .map(|pk| pk.js_route_params.clone())
                        .unwrap_or_default(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::codegen::relationships::resolve_relationships;
    use crate::codegen::schema::PrimaryKeyPolicy;
    use crate::codegen::types::{ColumnDescriptor, SchemaDescriptor, TableDescriptor};

    pub(crate) fn hr_descriptor() -> SchemaDescriptor {
        let table = |name: &str, columns: Vec<ColumnDescriptor>| TableDescriptor {
            name: name.to_string(),
            columns,
            ..Default::default()
        };
        SchemaDescriptor::new(vec![
            table(
                "department",
                vec![
                    ColumnDescriptor::new("id", "integer").primary_key(),
                    ColumnDescriptor::new("name", "varchar(100)").not_null(),
                    ColumnDescriptor::new("budget", "numeric(12,2)"),
                ],
            ),
            table(
                "employee",
                vec![
                    ColumnDescriptor::new("id", "integer").primary_key(),
                    ColumnDescriptor::new("name", "text").not_null(),
                    ColumnDescriptor::new("department_id", "integer").references("department.id"),
                    ColumnDescriptor::new("manager_id", "integer").references("employee.id"),
                    ColumnDescriptor::new("hired_at", "timestamp").with_default("CURRENT_TIMESTAMP"),
                    ColumnDescriptor::new("profile", "json"),
                ],
            ),
        ])
    }

    pub(crate) fn hr_model(naming: &NamingEngine) -> SchemaModel {
        let mut model = SchemaModel::build(
            &hr_descriptor(),
            &TypeMapper::default(),
            naming,
            PrimaryKeyPolicy::Defer,
        )
        .unwrap();
        resolve_relationships(&mut model, naming);
        model
    }

    fn context(name: &str) -> TableContext {
        let naming = NamingEngine::default();
        let model = hr_model(&naming);
        TableContext::build(
            model.table(name).unwrap(),
            &model,
            &naming,
            &TypeMapper::default(),
            "http://localhost:8000/",
            true,
        )
    }

    #[test]
    fn test_column_decisions() {
        let employee = context("employee");
        let id = &employee.columns[0];
        assert!(id.readonly && !id.in_create && !id.in_update);
        assert_eq!(id.column_args, r#""id", Integer, primary_key=True, autoincrement=True, nullable=False"#);

        let department_id = &employee.columns[2];
        assert_eq!(department_id.widget, Widget::Select);
        assert_eq!(department_id.annotation, "Optional[int]");
        assert!(department_id.column_args.contains(r#"ForeignKey("department.id")"#));
        let option = department_id.foreign.as_ref().unwrap();
        assert_eq!(option.store_var, "departmentStore");
        assert_eq!(option.label_attr, "name");

        let manager_id = &employee.columns[3];
        assert_eq!(manager_id.foreign.as_ref().unwrap().store_var, "store");

        let hired_at = &employee.columns[4];
        assert!(hired_at.column_args.contains("server_default=func.now()"));
        assert!(hired_at.create_optional && !hired_at.required);

        assert_eq!(employee.columns[5].widget, Widget::Json);
        assert!(!employee.columns[5].in_list);
        assert_eq!(employee.api_base_url, "http://localhost:8000");
    }

    #[test]
    fn test_relationship_wiring() {
        let employee = context("employee");
        assert_eq!(employee.parent_relationships.len(), 2);
        assert_eq!(employee.parent_relationships[0].attr, "department");
        assert_eq!(
            employee.parent_relationships[0].args,
            r#""Department", back_populates="employees_collection", foreign_keys="[Employee.department_id]""#
        );
        assert!(employee.parent_relationships[1]
            .args
            .ends_with(r#"remote_side="[Employee.id]""#));
        assert_eq!(employee.model_type_imports, vec!["from models.department import Department"]);
        assert_eq!(employee.form_store_imports.len(), 1);

        let department = context("department");
        assert_eq!(department.children.len(), 1);
        assert_eq!(department.child_relationships[0].attr, "employees_collection");
        assert_eq!(
            department.child_schema_imports,
            vec!["from schemas.employee import EmployeeRead  # noqa: E402"]
        );
        assert!(department.eager_load);
    }

    #[test]
    fn test_imports() {
        let department = context("department");
        assert!(department.model_imports.contains(&"from decimal import Decimal".to_string()));
        assert!(department
            .model_imports
            .contains(&"from sqlalchemy import Integer, Numeric, String".to_string()));
        assert!(department
            .model_imports
            .contains(&"from typing import TYPE_CHECKING, Optional".to_string()));

        let employee = context("employee");
        assert!(employee
            .schema_imports
            .contains(&"from typing import Any, Optional".to_string()));
        assert!(employee.schema_imports.contains(&"from datetime import datetime".to_string()));
    }

    #[test]
    fn test_primary_key_shapes() {
        let employee = context("employee");
        let pk = employee.primary_key.unwrap();
        assert_eq!(pk.py_params, "id: int");
        assert_eq!(pk.route_path, "/{id}");
        assert_eq!(pk.test_path_from_created, "{created['id']}");
        assert_eq!(pk.js_key_path, "${key.id}");
        assert_eq!(pk.js_key_of_record, "{ id: record.id }");
        assert_eq!(pk.data_key.as_deref(), Some("id"));
    }

    #[test]
    fn test_keyless_tables_are_not_linked() {
        let naming = NamingEngine::default();
        let mut descriptor = hr_descriptor();
        descriptor.tables.push(TableDescriptor {
            name: "audit_log".to_string(),
            columns: vec![
                ColumnDescriptor::new("message", "text"),
                ColumnDescriptor::new("department_id", "integer").references("department.id"),
            ],
            ..Default::default()
        });
        descriptor.tables.push(TableDescriptor {
            name: "alert".to_string(),
            columns: vec![
                ColumnDescriptor::new("id", "integer").primary_key(),
                ColumnDescriptor::new("message", "text").references("audit_log.message"),
            ],
            ..Default::default()
        });
        let mut model = SchemaModel::build(
            &descriptor,
            &TypeMapper::default(),
            &naming,
            PrimaryKeyPolicy::Defer,
        )
        .unwrap();
        resolve_relationships(&mut model, &naming);
        assert!(!model.is_renderable("audit_log"));
        let build = |name: &str| {
            TableContext::build(
                model.table(name).unwrap(),
                &model,
                &naming,
                &TypeMapper::default(),
                "",
                true,
            )
        };

        let department = build("department");
        assert_eq!(department.children.len(), 1);
        assert_eq!(department.children[0].child_class, "Employee");
        assert_eq!(department.model_type_imports, vec!["from models.employee import Employee"]);
        assert_eq!(department.child_schema_imports.len(), 1);

        let alert = build("alert");
        assert!(alert.parent_relationships.is_empty());
        assert!(alert.model_type_imports.is_empty());
        assert!(alert.form_store_imports.is_empty());
        assert!(alert.columns[1].foreign.is_none());
        assert_eq!(alert.columns[1].widget, Widget::Input);
        assert!(!alert.columns[1].column_args.contains("ForeignKey"));
        assert!(!alert.model_imports.iter().any(|l| l.contains("relationship")));
        assert!(!alert.eager_load);
    }

    #[test]
    fn test_safe_attr() {
        assert_eq!(safe_attr("class"), "class_");
        assert_eq!(safe_attr("2fa_code"), "c_2fa_code");
        assert_eq!(safe_attr("name"), "name");
    }
}
