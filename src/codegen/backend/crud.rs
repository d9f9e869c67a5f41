use std::fmt::{self, Write};

use crate::codegen::context::{PrimaryKeyContext, TableContext};

/// Generate the CRUD function module for one table
pub fn render_crud(ctx: &TableContext, pk: &PrimaryKeyContext, output: &mut String) -> fmt::Result {
    let model = &ctx.pascal_singular;
    let single = &ctx.snake_singular;
    let plural = &ctx.snake_plural;

    writeln!(output, "\"\"\"CRUD operations for the {} table.\"\"\"\n", ctx.qualified_name)?;
    writeln!(output, "from typing import Optional\n")?;
    writeln!(output, "from sqlalchemy import select")?;
    if ctx.eager_load {
        writeln!(output, "from sqlalchemy.orm import Session, selectinload\n")?;
    } else {
        writeln!(output, "from sqlalchemy.orm import Session\n")?;
    }
    writeln!(output, "from models.{} import {}", single, model)?;
    writeln!(
        output,
        "from schemas.{} import {}Create, {}Update",
        single, model, model
    )?;

    // get
    writeln!(output, "\n\ndef get_{}(db: Session, {}) -> Optional[{}]:", single, pk.py_params, model)?;
    writeln!(output, "    return db.get({}, {})", model, pk.get_key)?;

    if ctx.eager_load {
        writeln!(
            output,
            "\n\ndef get_{}_full(db: Session, {}) -> Optional[{}]:",
            single, pk.py_params, model
        )?;
        writeln!(output, "    stmt = (")?;
        writeln!(output, "        select({})", model)?;
        for child in &ctx.children {
            writeln!(output, "        .options(selectinload({}.{}))", model, child.attr)?;
        }
        writeln!(output, "        .where({})", pk.where_clause)?;
        writeln!(output, "    )")?;
        writeln!(output, "    return db.scalars(stmt).first()")?;
    }

    // list
    writeln!(
        output,
        "\n\ndef list_{}(db: Session, skip: int = 0, limit: int = 100) -> list[{}]:",
        plural, model
    )?;
    writeln!(
        output,
        "    stmt = select({}).order_by({}).offset(skip).limit(limit)",
        model, pk.order_by
    )?;
    writeln!(output, "    return list(db.scalars(stmt).all())")?;

    // create
    writeln!(
        output,
        "\n\ndef create_{}(db: Session, payload: {}Create) -> {}:",
        single, model, model
    )?;
    writeln!(output, "    obj = {}(**payload.model_dump(exclude_unset=True))", model)?;
    writeln!(output, "    db.add(obj)")?;
    writeln!(output, "    db.commit()")?;
    writeln!(output, "    db.refresh(obj)")?;
    writeln!(output, "    return obj")?;

    // update
    writeln!(
        output,
        "\n\ndef update_{}(db: Session, {}, payload: {}Update) -> Optional[{}]:",
        single, pk.py_params, model, model
    )?;
    writeln!(output, "    obj = db.get({}, {})", model, pk.get_key)?;
    writeln!(output, "    if obj is None:")?;
    writeln!(output, "        return None")?;
    writeln!(output, "    for field, value in payload.model_dump(exclude_unset=True).items():")?;
    writeln!(output, "        setattr(obj, field, value)")?;
    writeln!(output, "    db.commit()")?;
    writeln!(output, "    db.refresh(obj)")?;
    writeln!(output, "    return obj")?;

    // delete
    writeln!(output, "\n\ndef delete_{}(db: Session, {}) -> bool:", single, pk.py_params)?;
    writeln!(output, "    obj = db.get({}, {})", model, pk.get_key)?;
    writeln!(output, "    if obj is None:")?;
    writeln!(output, "        return False")?;
    writeln!(output, "    db.delete(obj)")?;
    writeln!(output, "    db.commit()")?;
    writeln!(output, "    return True")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::context::tests::hr_model;
    use crate::codegen::naming::NamingEngine;
    use crate::codegen::type_mapper::TypeMapper;

    fn render(name: &str, eager_load: bool) -> String {
        let naming = NamingEngine::default();
        let model = hr_model(&naming);
        let ctx = TableContext::build(
            model.table(name).unwrap(),
            &model,
            &naming,
            &TypeMapper::default(),
            "http://localhost:8000",
            eager_load,
        );
        let mut output = String::new();
        render_crud(&ctx, ctx.primary_key.as_ref().unwrap(), &mut output).unwrap();
        output
    }

    #[test]
    fn test_crud_functions() {
        let output = render("department", false);
        assert!(output.contains("def get_department(db: Session, id: int) -> Optional[Department]:\n    return db.get(Department, id)\n"));
        assert!(output.contains("def list_departments(db: Session, skip: int = 0, limit: int = 100) -> list[Department]:"));
        assert!(output.contains("select(Department).order_by(Department.id).offset(skip).limit(limit)"));
        assert!(output.contains("def create_department(db: Session, payload: DepartmentCreate) -> Department:"));
        assert!(output.contains("def update_department(db: Session, id: int, payload: DepartmentUpdate) -> Optional[Department]:"));
        assert!(output.contains("def delete_department(db: Session, id: int) -> bool:"));
        assert!(!output.contains("selectinload"));
    }

    #[test]
    fn test_eager_loading() {
        let output = render("department", true);
        assert!(output.contains("from sqlalchemy.orm import Session, selectinload\n"));
        assert!(output.contains("        .options(selectinload(Department.employees_collection))\n        .where(Department.id == id)\n"));
    }
}
