//! Idempotent provisioning of the storage backend.
//!
//! Creates the backing relations, registers the fixed bucket with its
//! permissive CORS origins, registers the two logical tables (notes with
//! its subject index, subjects), and registers the mock search function.
//! Every step tolerates "already exists"; failures are collected rather
//! than aborting the run so the report shows how far provisioning got.

use sqlx::PgPool;
use tracing::{error, info};

use studynotes_core::{defaults, Result};

const SCHEMA_STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS table_item (
        table_name TEXT NOT NULL,
        id         TEXT NOT NULL,
        item       JSONB NOT NULL,
        version    BIGINT,
        PRIMARY KEY (table_name, id)
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS table_item_subject_idx
        ON table_item ((item->'subjectId'->>'S'))
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS object_blob (
        bucket       TEXT NOT NULL,
        key          TEXT NOT NULL,
        data         BYTEA NOT NULL,
        content_type TEXT NOT NULL,
        etag         TEXT NOT NULL,
        created_at   TIMESTAMPTZ NOT NULL DEFAULT now(),
        PRIMARY KEY (bucket, key)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS bucket_registry (
        name         TEXT PRIMARY KEY,
        cors_origins TEXT NOT NULL,
        created_at   TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS table_registry (
        name       TEXT PRIMARY KEY,
        index_name TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS function_registry (
        name        TEXT PRIMARY KEY,
        description TEXT NOT NULL,
        created_at  TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
];

/// Outcome of one provisioning run.
#[derive(Debug, Default)]
pub struct ProvisionReport {
    /// True when the bucket row was inserted (false: already existed).
    pub bucket_created: bool,
    /// Logical tables newly registered this run.
    pub tables_created: Vec<String>,
    /// True when the search function was newly registered.
    pub function_registered: bool,
    /// Human-readable descriptions of failed steps.
    pub failures: Vec<String>,
}

impl ProvisionReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

async fn register_table(pool: &PgPool, name: &str, index: Option<&str>) -> Result<bool> {
    let result = sqlx::query(
        "INSERT INTO table_registry (name, index_name) VALUES ($1, $2)
         ON CONFLICT (name) DO NOTHING",
    )
    .bind(name)
    .bind(index)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Provision all backend resources. Safe to run repeatedly.
pub async fn provision(pool: &PgPool) -> ProvisionReport {
    let mut report = ProvisionReport::default();

    for statement in SCHEMA_STATEMENTS {
        if let Err(e) = sqlx::query(statement).execute(pool).await {
            error!(subsystem = "store", component = "provision", error = %e,
                   "schema statement failed");
            report.failures.push(format!("schema: {e}"));
        }
    }

    match sqlx::query(
        "INSERT INTO bucket_registry (name, cors_origins) VALUES ($1, $2)
         ON CONFLICT (name) DO NOTHING",
    )
    .bind(defaults::BUCKET)
    .bind("*")
    .execute(pool)
    .await
    {
        Ok(result) => {
            report.bucket_created = result.rows_affected() == 1;
            info!(
                subsystem = "store",
                component = "provision",
                op = "bucket",
                created = report.bucket_created,
                "bucket {}",
                if report.bucket_created {
                    "created"
                } else {
                    "already exists"
                }
            );
        }
        Err(e) => report.failures.push(format!("bucket: {e}")),
    }

    for (table, index) in [
        (defaults::NOTES_TABLE, Some(defaults::SUBJECT_INDEX)),
        (defaults::SUBJECTS_TABLE, None),
    ] {
        match register_table(pool, table, index).await {
            Ok(true) => {
                info!(subsystem = "store", component = "provision", table = table,
                      "table registered");
                report.tables_created.push(table.to_string());
            }
            Ok(false) => {
                info!(subsystem = "store", component = "provision", table = table,
                      "table already exists");
            }
            Err(e) => report.failures.push(format!("table {table}: {e}")),
        }
    }

    match sqlx::query(
        "INSERT INTO function_registry (name, description) VALUES ($1, $2)
         ON CONFLICT (name) DO NOTHING",
    )
    .bind(defaults::SEARCH_FUNCTION)
    .bind("Function to search notes")
    .execute(pool)
    .await
    {
        Ok(result) => {
            report.function_registered = result.rows_affected() == 1;
            info!(
                subsystem = "store",
                component = "provision",
                op = "function",
                created = report.function_registered,
                "search function {}",
                if report.function_registered {
                    "registered"
                } else {
                    "already registered"
                }
            );
        }
        Err(e) => report.failures.push(format!("function: {e}")),
    }

    report
}
