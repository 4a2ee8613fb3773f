//! PostgreSQL backends: items as JSONB, blobs as bytea.
//!
//! The table store keeps every logical table in one backing relation,
//! keyed by (table_name, id), with the item's `version` attribute lifted
//! into a column so conditional puts are a single guarded statement. The
//! object store keys blobs by (bucket, key) and records a BLAKE3 etag on
//! every put.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sqlx::{PgPool, Row};
use tracing::debug;

use studynotes_core::{defaults, AttrValue, Error, Item, ObjectStore, Result, TableStore};

fn item_id(item: &Item) -> Result<String> {
    match item.get("id") {
        Some(AttrValue::S(id)) => Ok(id.clone()),
        _ => Err(Error::InvalidInput("item has no string id attribute".into())),
    }
}

fn item_version(item: &Item) -> Option<i64> {
    match item.get("version") {
        Some(AttrValue::N(n)) => n.parse().ok(),
        _ => None,
    }
}

fn decode_item(value: JsonValue) -> Result<Item> {
    serde_json::from_value(value).map_err(Error::from)
}

/// PostgreSQL implementation of [`TableStore`].
#[derive(Clone)]
pub struct PgTableStore {
    pool: PgPool,
}

impl PgTableStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TableStore for PgTableStore {
    async fn put_item(&self, table: &str, item: Item) -> Result<()> {
        let id = item_id(&item)?;
        let version = item_version(&item);
        let body = serde_json::to_value(&item)?;
        sqlx::query(
            r#"
            INSERT INTO table_item (table_name, id, item, version)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (table_name, id)
            DO UPDATE SET item = EXCLUDED.item, version = EXCLUDED.version
            "#,
        )
        .bind(table)
        .bind(&id)
        .bind(&body)
        .bind(version)
        .execute(&self.pool)
        .await
        .map_err(Error::Backend)?;
        Ok(())
    }

    async fn put_item_versioned(
        &self,
        table: &str,
        item: Item,
        expected_version: Option<i64>,
    ) -> Result<bool> {
        let id = item_id(&item)?;
        let version = item_version(&item);
        let body = serde_json::to_value(&item)?;

        let result = match expected_version {
            None => sqlx::query(
                r#"
                INSERT INTO table_item (table_name, id, item, version)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (table_name, id) DO NOTHING
                "#,
            )
            .bind(table)
            .bind(&id)
            .bind(&body)
            .bind(version)
            .execute(&self.pool)
            .await
            .map_err(Error::Backend)?,
            Some(expected) => sqlx::query(
                r#"
                UPDATE table_item
                SET item = $3, version = $4
                WHERE table_name = $1 AND id = $2 AND version = $5
                "#,
            )
            .bind(table)
            .bind(&id)
            .bind(&body)
            .bind(version)
            .bind(expected)
            .execute(&self.pool)
            .await
            .map_err(Error::Backend)?,
        };

        Ok(result.rows_affected() == 1)
    }

    async fn get_item(&self, table: &str, id: &str) -> Result<Option<Item>> {
        let row = sqlx::query("SELECT item FROM table_item WHERE table_name = $1 AND id = $2")
            .bind(table)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Backend)?;
        row.map(|r| decode_item(r.get("item"))).transpose()
    }

    async fn query_index(
        &self,
        table: &str,
        index: &str,
        key_attr: &str,
        key_value: &str,
    ) -> Result<Vec<Item>> {
        debug!(
            subsystem = "store",
            component = "table_store",
            op = "query_index",
            table = table,
            index = index
        );
        let rows = sqlx::query(
            r#"
            SELECT item FROM table_item
            WHERE table_name = $1 AND item->($2::text)->>'S' = $3
            ORDER BY id
            "#,
        )
        .bind(table)
        .bind(key_attr)
        .bind(key_value)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Backend)?;
        rows.into_iter()
            .map(|r| decode_item(r.get("item")))
            .collect()
    }

    async fn scan(&self, table: &str) -> Result<Vec<Item>> {
        let rows = sqlx::query(
            "SELECT item FROM table_item WHERE table_name = $1 ORDER BY id",
        )
        .bind(table)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Backend)?;
        rows.into_iter()
            .map(|r| decode_item(r.get("item")))
            .collect()
    }

    async fn delete_item(&self, table: &str, id: &str) -> Result<()> {
        sqlx::query("DELETE FROM table_item WHERE table_name = $1 AND id = $2")
            .bind(table)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Backend)?;
        Ok(())
    }
}

/// PostgreSQL implementation of [`ObjectStore`] for a fixed bucket.
#[derive(Clone)]
pub struct PgObjectStore {
    pool: PgPool,
    bucket: String,
}

impl PgObjectStore {
    /// Object store scoped to the default bucket.
    pub fn new(pool: PgPool) -> Self {
        Self::with_bucket(pool, defaults::BUCKET)
    }

    pub fn with_bucket(pool: PgPool, bucket: impl Into<String>) -> Self {
        Self {
            pool,
            bucket: bucket.into(),
        }
    }
}

#[async_trait]
impl ObjectStore for PgObjectStore {
    async fn put(&self, key: &str, data: &[u8], content_type: &str) -> Result<()> {
        let etag = blake3::hash(data).to_hex().to_string();
        sqlx::query(
            r#"
            INSERT INTO object_blob (bucket, key, data, content_type, etag)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (bucket, key)
            DO UPDATE SET data = EXCLUDED.data,
                          content_type = EXCLUDED.content_type,
                          etag = EXCLUDED.etag
            "#,
        )
        .bind(&self.bucket)
        .bind(key)
        .bind(data)
        .bind(content_type)
        .bind(&etag)
        .execute(&self.pool)
        .await
        .map_err(Error::Backend)?;
        debug!(
            subsystem = "store",
            component = "object_store",
            op = "put",
            object_key = key,
            blob_size = data.len()
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let row = sqlx::query("SELECT data FROM object_blob WHERE bucket = $1 AND key = $2")
            .bind(&self.bucket)
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Backend)?;
        match row {
            Some(r) => Ok(r.get("data")),
            None => Err(Error::ObjectNotFound(key.to_string())),
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM object_blob WHERE bucket = $1 AND key = $2")
            .bind(&self.bucket)
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(Error::Backend)?;
        Ok(())
    }
}
