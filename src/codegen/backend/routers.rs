use std::fmt::{self, Write};

use crate::codegen::context::{PrimaryKeyContext, TableContext};

/// Generate the FastAPI router for one table.
///
/// The router carries no prefix; `main.py` mounts it under the table's
/// route prefix so every generated router has the same shape.
pub fn render_router(ctx: &TableContext, pk: &PrimaryKeyContext, output: &mut String) -> fmt::Result {
    let model = &ctx.pascal_singular;
    let single = &ctx.snake_singular;
    let plural = &ctx.snake_plural;
    let read_class = if ctx.eager_load {
        format!("{}Full", model)
    } else {
        format!("{}Read", model)
    };
    let getter = if ctx.eager_load {
        format!("get_{}_full", single)
    } else {
        format!("get_{}", single)
    };

    writeln!(output, "\"\"\"HTTP endpoints for the {} table.\"\"\"\n", ctx.qualified_name)?;
    writeln!(output, "from fastapi import APIRouter, Depends, HTTPException, Response, status")?;
    writeln!(output, "from sqlalchemy.orm import Session\n")?;
    writeln!(output, "import crud.{} as crud", single)?;
    writeln!(output, "from database import get_db")?;
    let mut schema_names = vec![format!("{}Create", model), format!("{}Read", model)];
    if ctx.eager_load {
        schema_names.push(format!("{}Full", model));
    }
    schema_names.push(format!("{}Update", model));
    writeln!(output, "from schemas.{} import {}", single, schema_names.join(", "))?;

    writeln!(output, "\nrouter = APIRouter()")?;

    writeln!(output, "\n\n@router.get(\"/\", response_model=list[{}Read])", model)?;
    writeln!(
        output,
        "def list_{}(skip: int = 0, limit: int = 100, db: Session = Depends(get_db)):",
        plural
    )?;
    writeln!(output, "    return crud.list_{}(db, skip=skip, limit=limit)", plural)?;

    writeln!(output, "\n\n@router.get(\"{}\", response_model={})", pk.route_path, read_class)?;
    writeln!(output, "def get_{}({}, db: Session = Depends(get_db)):", single, pk.py_params)?;
    writeln!(output, "    obj = crud.{}(db, {})", getter, pk.py_args)?;
    write_not_found(output, ctx)?;
    writeln!(output, "    return obj")?;

    writeln!(
        output,
        "\n\n@router.post(\"/\", response_model={}Read, status_code=status.HTTP_201_CREATED)",
        model
    )?;
    writeln!(
        output,
        "def create_{}(payload: {}Create, db: Session = Depends(get_db)):",
        single, model
    )?;
    writeln!(output, "    return crud.create_{}(db, payload)", single)?;

    writeln!(output, "\n\n@router.put(\"{}\", response_model={}Read)", pk.route_path, model)?;
    writeln!(
        output,
        "def update_{}({}, payload: {}Update, db: Session = Depends(get_db)):",
        single, pk.py_params, model
    )?;
    writeln!(output, "    obj = crud.update_{}(db, {}, payload)", single, pk.py_args)?;
    write_not_found(output, ctx)?;
    writeln!(output, "    return obj")?;

    writeln!(
        output,
        "\n\n@router.delete(\"{}\", status_code=status.HTTP_204_NO_CONTENT)",
        pk.route_path
    )?;
    writeln!(output, "def delete_{}({}, db: Session = Depends(get_db)):", single, pk.py_params)?;
    writeln!(output, "    if not crud.delete_{}(db, {}):", single, pk.py_args)?;
    writeln!(
        output,
        "        raise HTTPException(status_code=404, detail=\"{} not found\")",
        ctx.title
    )?;
    writeln!(output, "    return Response(status_code=status.HTTP_204_NO_CONTENT)")?;

    Ok(())
}

fn write_not_found(output: &mut String, ctx: &TableContext) -> fmt::Result {
    writeln!(output, "    if obj is None:")?;
    writeln!(
        output,
        "        raise HTTPException(status_code=404, detail=\"{} not found\")",
        ctx.title
    )
}
