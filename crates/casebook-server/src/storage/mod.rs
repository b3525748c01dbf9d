//! Storage layer
//!
//! Uses SQLite (via sqlx) when a database URL is configured, otherwise a
//! process-local in-memory store built on DashMap. The choice is made once at
//! startup and both backends sit behind the same `EntityStore` trait.

pub mod db;
pub mod memory;

pub use db::Database;
pub use memory::MemoryStore;

use crate::config::ServerConfig;
use anyhow::{Context, Result};
use casebook_core::ports::EntityStore;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, warn};

/// Pick and initialize the backend for this process
pub async fn connect(config: &ServerConfig) -> Result<Arc<dyn EntityStore>> {
    match config.database_url.as_deref() {
        Some(url) => {
            info!("Database URL configured, using relational backend");
            let db = Database::connect(url, config.max_connections)
                .await
                .context("Failed to initialize database")?;
            Ok(Arc::new(db))
        }
        None => {
            warn!("No database URL configured, using in-memory backend (data is lost on restart)");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

/// Fresh opaque record identifier
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub fn now() -> DateTime<Utc> {
    Utc::now()
}
