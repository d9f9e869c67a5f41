/// Relationship resolution for the schema model
///
/// Names both ends of every foreign key and registers each foreign key as a
/// child collection on the table it targets. Resolution is two linear passes
/// over the tables' foreign keys; self-references need no special casing.

use std::collections::{HashMap, HashSet};

use crate::codegen::naming::NamingEngine;
use crate::codegen::schema::{ChildCollection, SchemaModel, Table};

/// Fill in relationship names and child collections. Runs once per model.
pub fn resolve_relationships(model: &mut SchemaModel, naming: &NamingEngine) {
    if model.is_resolved() {
        return;
    }

    // First pass: parent reference on the owning table
    for table in model.tables_mut().iter_mut() {
        let mut taken = column_attrs(table, naming);
        for fk in table.foreign_keys.iter_mut() {
            let base = match fk.columns.as_slice() {
                [column] => {
                    let snake = naming.forms(column).snake.clone();
                    match snake.strip_suffix("_id") {
                        Some(stem) if !stem.is_empty() => stem.to_string(),
                        _ => naming.forms(&fk.target_table).snake_singular.clone(),
                    }
                }
                _ => naming.forms(&fk.target_table).snake_singular.clone(),
            };
            fk.parent_attr = claim(&base, &mut taken);
        }
    }

    // Second pass: collection on the target table
    let index: HashMap<String, usize> = model
        .tables()
        .iter()
        .enumerate()
        .map(|(i, t)| (t.name.clone(), i))
        .collect();
    let mut taken_by_target: HashMap<usize, HashSet<String>> = HashMap::new();
    let mut collections: Vec<(usize, usize, usize, String)> = Vec::new();

    for (child_idx, child) in model.tables().iter().enumerate() {
        let child_forms = naming.forms(&child.name);
        let child_plural = &child_forms.snake_plural;
        for (fk_idx, fk) in child.foreign_keys.iter().enumerate() {
            let Some(&target_idx) = index.get(&fk.target_table) else {
                continue;
            };
            let same_target = child
                .foreign_keys
                .iter()
                .filter(|other| other.target_table == fk.target_table)
                .count();
            let base = if same_target > 1 {
                format!("{}_by_{}_collection", child_plural, fk.parent_attr)
            } else {
                format!("{}_collection", child_plural)
            };

            let taken = taken_by_target.entry(target_idx).or_insert_with(|| {
                let target = &model.tables()[target_idx];
                let mut taken = column_attrs(target, naming);
                taken.extend(target.foreign_keys.iter().map(|f| f.parent_attr.clone()));
                taken
            });
            let attr = claim(&base, taken);
            collections.push((target_idx, child_idx, fk_idx, attr));
        }
    }

    let child_names: Vec<String> = model.tables().iter().map(|t| t.name.clone()).collect();
    let tables = model.tables_mut();
    for (target_idx, child_idx, fk_idx, attr) in collections {
        tables[child_idx].foreign_keys[fk_idx].collection_attr = attr.clone();
        tables[target_idx].children.push(ChildCollection {
            child_table: child_names[child_idx].clone(),
            foreign_key: fk_idx,
            attr,
        });
    }

    model.mark_resolved();
}

fn column_attrs(table: &Table, naming: &NamingEngine) -> HashSet<String> {
    table
        .columns
        .iter()
        .map(|c| naming.forms(&c.name).snake.clone())
        .collect()
}

/// Reserve `base`, or `base_ref`, `base_ref2`, ... if it is taken.
fn claim(base: &str, taken: &mut HashSet<String>) -> String {
    let mut name = base.to_string();
    let mut n = 1;
    while taken.contains(&name) {
        name = if n == 1 {
            format!("{}_ref", base)
        } else {
            format!("{}_ref{}", base, n)
        };
        n += 1;
    }
    taken.insert(name.clone());
    name
}
