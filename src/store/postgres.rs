//! PostgreSQL document store: one JSONB table per collection inside a configurable schema.

use crate::document::{strip_metadata, Document};
use crate::error::{AppError, ConfigError};
use crate::store::{DocumentStore, UpdateMode};
use async_trait::async_trait;
use bson::oid::ObjectId;
use serde_json::{Map, Value};
use sqlx::types::Json;
use sqlx::{ConnectOptions, PgPool};
use std::str::FromStr;

#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
    schema: String,
}

type Row = (String, Json<Map<String, Value>>);

impl PgDocumentStore {
    pub fn new(pool: PgPool, schema: impl Into<String>) -> Self {
        PgDocumentStore {
            pool,
            schema: schema.into(),
        }
    }

    fn table(&self, collection: &str) -> String {
        qualified_table(&self.schema, collection)
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn qualified_table(schema: &str, collection: &str) -> String {
    format!("{}.{}", quote_ident(schema), quote_ident(collection))
}

fn row_to_document((id, Json(fields)): Row) -> Result<Document, AppError> {
    let oid = ObjectId::parse_str(&id).map_err(|e| AppError::Store(format!("corrupt id {}: {}", id, e)))?;
    Ok(Document::with_id(oid, strip_metadata(fields)))
}

/// Create the schema and one table per collection if they do not exist.
pub async fn ensure_collections(pool: &PgPool, schema: &str, collections: &[&str]) -> Result<(), AppError> {
    sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {}", quote_ident(schema)))
        .execute(pool)
        .await?;
    for collection in collections {
        let ddl = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id TEXT PRIMARY KEY,
                doc JSONB NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
            qualified_table(schema, collection)
        );
        sqlx::query(&ddl).execute(pool).await?;
        tracing::debug!(schema, collection, "collection table ready");
    }
    Ok(())
}

/// Ensure the database in `database_url` exists; create it if not. Connects to the
/// default `postgres` database to run CREATE DATABASE. Call before creating the main pool.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), AppError> {
    let (admin_url, db_name) = parse_db_name_from_url(database_url)?;
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = sqlx::postgres::PgConnectOptions::from_str(&admin_url)
        .map_err(|e| invalid_url(e.to_string()))?;
    let mut conn: sqlx::PgConnection = opts.connect().await?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists.0 {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", quote_ident(&db_name)))
            .execute(&mut conn)
            .await?;
    }
    Ok(())
}

fn invalid_url(reason: String) -> AppError {
    AppError::Config(ConfigError::Invalid {
        key: "DATABASE_URL",
        reason,
    })
}

fn parse_db_name_from_url(url: &str) -> Result<(String, String), AppError> {
    let path_start = url.rfind('/').ok_or_else(|| invalid_url("no path".into()))? + 1;
    let path_and_query = url.get(path_start..).unwrap_or("");
    let db_name = path_and_query.split('?').next().unwrap_or("").trim();
    let base = url.get(..path_start).unwrap_or(url);
    Ok((format!("{}postgres", base), db_name.to_string()))
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn find_all(&self, collection: &str) -> Result<Vec<Document>, AppError> {
        let sql = format!("SELECT id, doc FROM {} ORDER BY id", self.table(collection));
        tracing::debug!(sql = %sql, "query");
        let rows: Vec<Row> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
        rows.into_iter().map(row_to_document).collect()
    }

    async fn find_by_id(&self, collection: &str, id: &ObjectId) -> Result<Option<Document>, AppError> {
        let sql = format!("SELECT id, doc FROM {} WHERE id = $1", self.table(collection));
        tracing::debug!(sql = %sql, id = %id, "query");
        let row: Option<Row> = sqlx::query_as(&sql).bind(id.to_hex()).fetch_optional(&self.pool).await?;
        row.map(row_to_document).transpose()
    }

    async fn find_by_ids(&self, collection: &str, ids: &[ObjectId]) -> Result<Vec<Document>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!("SELECT id, doc FROM {} WHERE id = ANY($1) ORDER BY id", self.table(collection));
        let hex: Vec<String> = ids.iter().map(|id| id.to_hex()).collect();
        tracing::debug!(sql = %sql, ids = ?hex, "query");
        let rows: Vec<Row> = sqlx::query_as(&sql).bind(&hex).fetch_all(&self.pool).await?;
        rows.into_iter().map(row_to_document).collect()
    }

    async fn insert(&self, collection: &str, doc: Document) -> Result<Document, AppError> {
        let sql = format!(
            "INSERT INTO {} (id, doc) VALUES ($1, $2) RETURNING id, doc",
            self.table(collection)
        );
        tracing::debug!(sql = %sql, id = %doc.id, "query");
        let row: Row = sqlx::query_as(&sql)
            .bind(doc.id_hex())
            .bind(Json(&doc.fields))
            .fetch_one(&self.pool)
            .await?;
        row_to_document(row)
    }

    async fn update(
        &self,
        collection: &str,
        id: &ObjectId,
        fields: Map<String, Value>,
        mode: UpdateMode,
    ) -> Result<Option<Document>, AppError> {
        let assignment = match mode {
            UpdateMode::Merge => "doc = doc || $2",
            UpdateMode::Replace => "doc = $2",
        };
        let sql = format!(
            "UPDATE {} SET {} WHERE id = $1 RETURNING id, doc",
            self.table(collection),
            assignment
        );
        tracing::debug!(sql = %sql, id = %id, "query");
        let row: Option<Row> = sqlx::query_as(&sql)
            .bind(id.to_hex())
            .bind(Json(&fields))
            .fetch_optional(&self.pool)
            .await?;
        row.map(row_to_document).transpose()
    }

    async fn delete(&self, collection: &str, id: &ObjectId) -> Result<Option<Document>, AppError> {
        let sql = format!("DELETE FROM {} WHERE id = $1 RETURNING id, doc", self.table(collection));
        tracing::debug!(sql = %sql, id = %id, "query");
        let row: Option<Row> = sqlx::query_as(&sql).bind(id.to_hex()).fetch_optional(&self.pool).await?;
        row.map(row_to_document).transpose()
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").fetch_optional(&self.pool).await?;
        Ok(())
    }
}
