use std::fmt::{self, Write};

use crate::codegen::context::{PrimaryKeyContext, TableContext};

/// Generate the pytest module exercising one table's endpoints.
///
/// Tests run against the `client` fixture from `tests/conftest.py`, which
/// gives every test a fresh in-memory database.
pub fn render_backend_test(ctx: &TableContext, pk: &PrimaryKeyContext, output: &mut String) -> fmt::Result {
    let single = &ctx.snake_singular;
    let prefix = &ctx.route_prefix;
    let item_path = format!("f\"{}/{}\"", prefix, pk.test_path_from_created);

    writeln!(output, "\"\"\"Endpoint tests for {}.\"\"\"\n", prefix)?;
    writeln!(output, "PAYLOAD = {{")?;
    for column in ctx.create_columns() {
        // Parent rows do not exist in the test database
        let value = if column.foreign.is_some() && column.nullable {
            "None"
        } else {
            column.sample_py.as_str()
        };
        writeln!(output, "    \"{}\": {},", column.attr, value)?;
    }
    writeln!(output, "}}")?;

    writeln!(output, "\n\ndef _create(client):")?;
    writeln!(output, "    response = client.post(\"{}/\", json=PAYLOAD)", prefix)?;
    writeln!(output, "    assert response.status_code == 201, response.text")?;
    writeln!(output, "    return response.json()")?;

    writeln!(output, "\n\ndef test_create_{}(client):", single)?;
    writeln!(output, "    created = _create(client)")?;
    for part in &pk.parts {
        writeln!(output, "    assert created[\"{}\"] is not None", part.attr)?;
    }

    writeln!(output, "\n\ndef test_list_{}(client):", ctx.snake_plural)?;
    writeln!(output, "    _create(client)")?;
    writeln!(output, "    response = client.get(\"{}/\")", prefix)?;
    writeln!(output, "    assert response.status_code == 200")?;
    writeln!(output, "    assert len(response.json()) == 1")?;

    writeln!(output, "\n\ndef test_get_{}(client):", single)?;
    writeln!(output, "    created = _create(client)")?;
    writeln!(output, "    response = client.get({})", item_path)?;
    writeln!(output, "    assert response.status_code == 200")?;
    for part in &pk.parts {
        writeln!(
            output,
            "    assert response.json()[\"{}\"] == created[\"{}\"]",
            part.attr, part.attr
        )?;
    }

    writeln!(output, "\n\ndef test_update_{}(client):", single)?;
    writeln!(output, "    created = _create(client)")?;
    match &ctx.update_sample {
        Some((attr, value)) => {
            writeln!(
                output,
                "    response = client.put({}, json={{\"{}\": {}}})",
                item_path, attr, value
            )?;
            writeln!(output, "    assert response.status_code == 200, response.text")?;
            writeln!(output, "    assert response.json()[\"{}\"] == {}", attr, value)?;
        }
        None => {
            writeln!(output, "    response = client.put({}, json={{}})", item_path)?;
            writeln!(output, "    assert response.status_code == 200, response.text")?;
        }
    }

    writeln!(output, "\n\ndef test_delete_{}(client):", single)?;
    writeln!(output, "    created = _create(client)")?;
    writeln!(output, "    response = client.delete({})", item_path)?;
    writeln!(output, "    assert response.status_code == 204")?;
    writeln!(output, "    assert client.get({}).status_code == 404", item_path)?;

    writeln!(output, "\n\ndef test_get_missing_{}(client):", single)?;
    writeln!(output, "    response = client.get(\"{}/{}\")", prefix, pk.test_missing_path)?;
    writeln!(output, "    assert response.status_code == 404")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::context::tests::hr_model;
    use crate::codegen::naming::NamingEngine;
    use crate::codegen::type_mapper::TypeMapper;

    fn render(name: &str) -> String {
        let naming = NamingEngine::default();
        let model = hr_model(&naming);
        let ctx = TableContext::build(
            model.table(name).unwrap(),
            &model,
            &naming,
            &TypeMapper::default(),
            "http://localhost:8000",
            false,
        );
        let mut output = String::new();
        render_backend_test(&ctx, ctx.primary_key.as_ref().unwrap(), &mut output).unwrap();
        output
    }

    #[test]
    fn test_payload_and_paths() {
        let output = render("employee");
        assert!(output.contains("PAYLOAD = {\n    \"name\": \"sample name\",\n"));
        assert!(output.contains("    \"department_id\": None,\n"));
        assert!(!output.contains("    \"id\":"));
        assert!(output.contains("    response = client.get(f\"/employees/{created['id']}\")\n"));
        assert!(output.contains("    response = client.get(\"/employees/999999\")\n"));
    }

    #[test]
    fn test_update_uses_text_column() {
        let output = render("department");
        assert!(output.contains(
            "json={\"name\": \"updated name\"})\n    assert response.status_code == 200, response.text\n    assert response.json()[\"name\"] == \"updated name\"\n"
        ));
    }
}
