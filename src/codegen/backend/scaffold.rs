use std::fmt::{self, Write};

use super::utils::{py_str, py_str_list};
use crate::codegen::context::ProjectContext;

/// Project-level backend files as (path relative to the backend dir, contents).
pub fn scaffold_files(project: &ProjectContext) -> Result<Vec<(String, String)>, fmt::Error> {
    let mut files = Vec::new();

    let mut add = |path: &str, render: &dyn Fn(&ProjectContext, &mut String) -> fmt::Result| {
        let mut output = String::new();
        render(project, &mut output).map(|_| files.push((path.to_string(), output)))
    };

    add("main.py", &generate_main)?;
    add("database.py", &generate_database)?;
    add("config.py", &generate_config)?;
    add("requirements.txt", &generate_requirements)?;
    add("Dockerfile", &generate_dockerfile)?;
    add(".env.example", &generate_env_example)?;
    add("pytest.ini", &generate_pytest_ini)?;
    add("README.md", &generate_readme)?;
    add("tests/conftest.py", &generate_conftest)?;
    add("models/__init__.py", &generate_models_init)?;
    add("schemas/__init__.py", &|_, out| package_init(out, "Pydantic schemas."))?;
    add("crud/__init__.py", &|_, out| package_init(out, "CRUD operations."))?;
    add("routers/__init__.py", &|_, out| package_init(out, "API routers."))?;
    add("tests/__init__.py", &|_, out| package_init(out, "Endpoint tests."))?;

    Ok(files)
}

fn package_init(output: &mut String, doc: &str) -> fmt::Result {
    writeln!(output, "\"\"\"{}\"\"\"", doc)
}

fn generate_main(project: &ProjectContext, output: &mut String) -> fmt::Result {
    writeln!(output, "\"\"\"FastAPI application for {}.\"\"\"\n", project.title)?;
    writeln!(output, "from fastapi import FastAPI")?;
    writeln!(output, "from fastapi.middleware.cors import CORSMiddleware\n")?;
    writeln!(output, "from config import settings")?;
    if !project.tables.is_empty() {
        let modules: Vec<&str> = project.tables.iter().map(|t| t.snake_singular.as_str()).collect();
        writeln!(output, "from routers import {}", modules.join(", "))?;
    }

    writeln!(output, "\napp = FastAPI(title={})\n", py_str(&project.title))?;
    writeln!(output, "app.add_middleware(")?;
    writeln!(output, "    CORSMiddleware,")?;
    writeln!(output, "    allow_origins=settings.cors_origins,")?;
    writeln!(output, "    allow_credentials=True,")?;
    writeln!(output, "    allow_methods=[\"*\"],")?;
    writeln!(output, "    allow_headers=[\"*\"],")?;
    writeln!(output, ")")?;

    if !project.tables.is_empty() {
        writeln!(output)?;
    }
    for table in &project.tables {
        writeln!(
            output,
            "app.include_router({}.router, prefix={}, tags=[{}])",
            table.snake_singular,
            py_str(&table.route_prefix),
            py_str(&table.title_plural)
        )?;
    }

    writeln!(output, "\n\n@app.get(\"/health\")")?;
    writeln!(output, "def health():")?;
    writeln!(output, "    return {{\"status\": \"ok\"}}")?;
    Ok(())
}

fn generate_database(_project: &ProjectContext, output: &mut String) -> fmt::Result {
    writeln!(output, "\"\"\"Engine, session factory and declarative base.\"\"\"\n")?;
    writeln!(output, "from sqlalchemy import create_engine")?;
    writeln!(output, "from sqlalchemy.orm import DeclarativeBase, sessionmaker\n")?;
    writeln!(output, "from config import settings\n")?;
    writeln!(output, "connect_args = (")?;
    writeln!(output, "    {{\"check_same_thread\": False}}")?;
    writeln!(output, "    if settings.database_url.startswith(\"sqlite\")")?;
    writeln!(output, "    else {{}}")?;
    writeln!(output, ")")?;
    writeln!(
        output,
        "engine = create_engine(settings.database_url, connect_args=connect_args, pool_pre_ping=True)"
    )?;
    writeln!(
        output,
        "SessionLocal = sessionmaker(bind=engine, autoflush=False, autocommit=False)"
    )?;
    writeln!(output, "\n\nclass Base(DeclarativeBase):")?;
    writeln!(output, "    pass")?;
    writeln!(output, "\n\ndef get_db():")?;
    writeln!(output, "    db = SessionLocal()")?;
    writeln!(output, "    try:")?;
    writeln!(output, "        yield db")?;
    writeln!(output, "    finally:")?;
    writeln!(output, "        db.close()")?;
    Ok(())
}

fn generate_config(project: &ProjectContext, output: &mut String) -> fmt::Result {
    writeln!(output, "\"\"\"Application settings read from the environment and .env.\"\"\"\n")?;
    writeln!(output, "from pydantic_settings import BaseSettings, SettingsConfigDict")?;
    writeln!(output, "\n\nclass Settings(BaseSettings):")?;
    writeln!(
        output,
        "    model_config = SettingsConfigDict(env_file=\".env\", extra=\"ignore\")\n"
    )?;
    writeln!(output, "    database_url: str = {}", py_str(&project.database_url))?;
    writeln!(
        output,
        "    cors_origins: list[str] = {}",
        py_str_list(&["http://localhost:5173"])
    )?;
    writeln!(output, "\n\nsettings = Settings()")?;
    Ok(())
}

fn generate_requirements(project: &ProjectContext, output: &mut String) -> fmt::Result {
    writeln!(output, "fastapi>=0.110")?;
    writeln!(output, "uvicorn[standard]>=0.29")?;
    writeln!(output, "sqlalchemy>=2.0")?;
    writeln!(output, "pydantic>=2.6")?;
    writeln!(output, "pydantic-settings>=2.2")?;
    if let Some(driver) = project.database.driver_requirement() {
        writeln!(output, "{}", driver)?;
    }
    writeln!(output, "httpx>=0.27")?;
    writeln!(output, "pytest>=8.0")?;
    Ok(())
}

fn generate_dockerfile(_project: &ProjectContext, output: &mut String) -> fmt::Result {
    writeln!(output, "FROM python:3.12-slim\n")?;
    writeln!(output, "WORKDIR /app\n")?;
    writeln!(output, "COPY requirements.txt .")?;
    writeln!(output, "RUN pip install --no-cache-dir -r requirements.txt\n")?;
    writeln!(output, "COPY . .\n")?;
    writeln!(output, "EXPOSE 8000\n")?;
    writeln!(
        output,
        "CMD [\"uvicorn\", \"main:app\", \"--host\", \"0.0.0.0\", \"--port\", \"8000\"]"
    )?;
    Ok(())
}

fn generate_env_example(project: &ProjectContext, output: &mut String) -> fmt::Result {
    writeln!(output, "# Database dialect: {}", project.database.as_str())?;
    writeln!(output, "DATABASE_URL={}", project.database_url)?;
    writeln!(output, "CORS_ORIGINS=[\"http://localhost:5173\"]")?;
    Ok(())
}

fn generate_pytest_ini(_project: &ProjectContext, output: &mut String) -> fmt::Result {
    writeln!(output, "[pytest]")?;
    writeln!(output, "pythonpath = .")?;
    writeln!(output, "testpaths = tests")?;
    Ok(())
}

fn generate_readme(project: &ProjectContext, output: &mut String) -> fmt::Result {
    writeln!(output, "# {} API\n", project.title)?;
    writeln!(output, "FastAPI + SQLAlchemy backend targeting {}.\n", project.database.as_str())?;
    writeln!(output, "## Running\n")?;
    writeln!(output, "```bash")?;
    writeln!(output, "pip install -r requirements.txt")?;
    writeln!(output, "cp .env.example .env")?;
    writeln!(output, "uvicorn main:app --reload")?;
    writeln!(output, "```\n")?;
    writeln!(output, "## Testing\n")?;
    writeln!(output, "```bash")?;
    writeln!(output, "pytest")?;
    writeln!(output, "```\n")?;
    writeln!(output, "## Resources\n")?;
    if project.tables.is_empty() {
        writeln!(output, "No resources were generated.")?;
    }
    for table in &project.tables {
        writeln!(output, "- `{}` ({})", table.route_prefix, table.title_plural)?;
    }
    Ok(())
}

fn generate_conftest(project: &ProjectContext, output: &mut String) -> fmt::Result {
    writeln!(output, "\"\"\"Shared fixtures: an in-memory SQLite database per test.\"\"\"\n")?;
    writeln!(output, "import pytest")?;
    writeln!(output, "from fastapi.testclient import TestClient")?;
    writeln!(output, "from sqlalchemy import create_engine")?;
    writeln!(output, "from sqlalchemy.orm import sessionmaker")?;
    writeln!(output, "from sqlalchemy.pool import StaticPool\n")?;
    writeln!(output, "import models  # noqa: F401")?;
    writeln!(output, "from database import Base, get_db")?;
    writeln!(output, "from main import app\n")?;

    writeln!(output, "engine = create_engine(")?;
    writeln!(output, "    \"sqlite://\",")?;
    writeln!(output, "    connect_args={{\"check_same_thread\": False}},")?;
    writeln!(output, "    poolclass=StaticPool,")?;
    if project.schemas.is_empty() {
        writeln!(output, ")")?;
    } else {
        // SQLite has no schemas
        let entries: Vec<String> = project
            .schemas
            .iter()
            .map(|s| format!("{}: None", py_str(s)))
            .collect();
        writeln!(
            output,
            ").execution_options(schema_translate_map={{{}}})",
            entries.join(", ")
        )?;
    }
    writeln!(
        output,
        "TestingSessionLocal = sessionmaker(bind=engine, autoflush=False, autocommit=False)"
    )?;

    writeln!(output, "\n\ndef override_get_db():")?;
    writeln!(output, "    db = TestingSessionLocal()")?;
    writeln!(output, "    try:")?;
    writeln!(output, "        yield db")?;
    writeln!(output, "    finally:")?;
    writeln!(output, "        db.close()")?;

    writeln!(output, "\n\n@pytest.fixture()")?;
    writeln!(output, "def client():")?;
    writeln!(output, "    Base.metadata.create_all(bind=engine)")?;
    writeln!(output, "    app.dependency_overrides[get_db] = override_get_db")?;
    writeln!(output, "    with TestClient(app) as test_client:")?;
    writeln!(output, "        yield test_client")?;
    writeln!(output, "    app.dependency_overrides.clear()")?;
    writeln!(output, "    Base.metadata.drop_all(bind=engine)")?;
    Ok(())
}

fn generate_models_init(project: &ProjectContext, output: &mut String) -> fmt::Result {
    writeln!(output, "\"\"\"SQLAlchemy models; importing this package registers every mapper.\"\"\"\n")?;
    for table in &project.tables {
        writeln!(
            output,
            "from models.{} import {}",
            table.snake_singular, table.pascal_singular
        )?;
    }
    let names: Vec<&str> = project.tables.iter().map(|t| t.pascal_singular.as_str()).collect();
    if !names.is_empty() {
        writeln!(output)?;
    }
    writeln!(output, "__all__ = {}", py_str_list(&names))?;
    Ok(())
}
