//! SQLite database layer (embedded, no external dependencies)
//!
//! Referential integrity and cascades are enforced by the schema's foreign
//! keys. Operations that issue more than one statement run inside a single
//! transaction; an early return drops the transaction, which rolls it back.

mod cases;
mod clients;
mod items;
mod timing;

use anyhow::{Context, Result};
use async_trait::async_trait;
use casebook_core::ports::{Backend, EntityStore};
use casebook_core::{CasebookError, ItemKind};
use sqlx::error::ErrorKind;
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        tracing::info!("Opening SQLite database at: {}", database_url);

        let in_memory = is_memory_url(database_url);

        // Create parent directory if needed
        if let Some(parent) = database_file(database_url).and_then(|p| p.parent().map(PathBuf::from)) {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(&parent).await.with_context(|| {
                    format!("Failed to create database directory: {}", parent.display())
                })?;
            }
        }

        let mut options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("Invalid database URL: {}", database_url))?
            .create_if_missing(true)
            .foreign_keys(true);
        if !in_memory {
            options = options
                .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
                .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);
        }

        let mut pool_options = SqlitePoolOptions::new().max_connections(max_connections);
        if in_memory {
            // Every connection to :memory: opens its own empty database
            pool_options = pool_options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }

        let pool = pool_options
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to connect to SQLite database at: {}", database_url))?;

        tracing::info!("SQLite connection established, running migrations...");

        MIGRATOR
            .run(&pool)
            .await
            .context("Failed to run database migrations")?;

        tracing::info!("Database initialization complete");

        Ok(Self { pool })
    }

    /// Private in-memory database, mainly for tests
    pub async fn in_memory() -> Result<Self> {
        Self::connect("sqlite::memory:", 1).await
    }
}

#[async_trait]
impl EntityStore for Database {
    fn backend(&self) -> Backend {
        Backend::Relational
    }

    async fn ping(&self) -> casebook_core::Result<bool> {
        let one: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(one == 1)
    }
}

/// Map a sqlx failure into the core taxonomy. Constraint violations are the
/// caller's fault and keep the database's own message.
pub(crate) fn db_err(err: sqlx::Error) -> CasebookError {
    if let sqlx::Error::Database(ref db) = err {
        match db.kind() {
            ErrorKind::ForeignKeyViolation
            | ErrorKind::UniqueViolation
            | ErrorKind::CheckViolation
            | ErrorKind::NotNullViolation => {
                return CasebookError::Integrity(db.message().to_string());
            }
            _ => {}
        }
    }
    CasebookError::Database(err.to_string())
}

#[cfg(test)]
impl Database {
    /// Total rows across every data table, for orphan checks
    pub(crate) async fn row_count(&self) -> usize {
        let mut total = 0;
        for table in [
            "clients",
            "business_cases",
            "cost_items",
            "revenue_items",
            "cost_timing",
            "revenue_timing",
            "case_tags",
        ] {
            let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
                .fetch_one(&self.pool)
                .await
                .unwrap();
            total += count as usize;
        }
        total
    }

    pub(crate) async fn link_count(&self) -> usize {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM case_tags")
            .fetch_one(&self.pool)
            .await
            .unwrap();
        count as usize
    }
}

fn items_table(kind: ItemKind) -> &'static str {
    match kind {
        ItemKind::Cost => "cost_items",
        ItemKind::Revenue => "revenue_items",
    }
}

fn timing_table(kind: ItemKind) -> &'static str {
    match kind {
        ItemKind::Cost => "cost_timing",
        ItemKind::Revenue => "revenue_timing",
    }
}

fn is_memory_url(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

/// Filesystem path behind a `sqlite:` URL, if it has one
fn database_file(url: &str) -> Option<PathBuf> {
    if is_memory_url(url) {
        return None;
    }
    let path = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))
        .unwrap_or(url);
    let path = path.split('?').next().unwrap_or(path);
    (!path.is_empty()).then(|| PathBuf::from(path))
}
