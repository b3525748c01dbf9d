//! Client persistence

use super::{db_err, Database};
use crate::storage::{new_id, now};
use async_trait::async_trait;
use casebook_core::ports::ClientStore;
use casebook_core::{Client, ClientPatch, NewClient, Patch, Result};
use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite};

const CLIENT_COLUMNS: &str = "id, name, notes, created_at, updated_at";

#[async_trait]
impl ClientStore for Database {
    async fn list_clients(&self) -> Result<Vec<Client>> {
        let rows: Vec<ClientRow> = sqlx::query_as(&format!(
            "SELECT {CLIENT_COLUMNS} FROM clients ORDER BY created_at DESC, rowid DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows.into_iter().map(Client::from).collect())
    }

    async fn get_client(&self, id: &str) -> Result<Option<Client>> {
        let row: Option<ClientRow> =
            sqlx::query_as(&format!("SELECT {CLIENT_COLUMNS} FROM clients WHERE id = ?1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_err)?;

        Ok(row.map(Client::from))
    }

    async fn create_client(&self, client: NewClient) -> Result<Client> {
        let stamp = now();
        let created = Client {
            id: new_id(),
            name: client.name,
            notes: client.notes,
            created_at: stamp,
            updated_at: stamp,
        };

        sqlx::query(
            r#"
            INSERT INTO clients (id, name, notes, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&created.id)
        .bind(&created.name)
        .bind(&created.notes)
        .bind(created.created_at)
        .bind(created.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(created)
    }

    async fn update_client(&self, id: &str, patch: ClientPatch) -> Result<Option<Client>> {
        if patch.is_empty() {
            return self.get_client(id).await;
        }

        let mut query = QueryBuilder::<Sqlite>::new("UPDATE clients SET ");
        {
            let mut set = query.separated(", ");
            if let Patch::Set(name) = patch.name {
                set.push("name = ").push_bind_unseparated(name);
            }
            if let Patch::Set(notes) = patch.notes {
                set.push("notes = ").push_bind_unseparated(notes);
            }
            set.push("updated_at = ").push_bind_unseparated(now());
        }
        query
            .push(" WHERE id = ")
            .push_bind(id.to_string())
            .push(format!(" RETURNING {CLIENT_COLUMNS}"));

        let row: Option<ClientRow> = query
            .build_query_as::<ClientRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(row.map(Client::from))
    }

    async fn delete_client(&self, id: &str) -> Result<bool> {
        // Cases, their items, timing and tag links go with it (ON DELETE CASCADE)
        let result = sqlx::query("DELETE FROM clients WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(result.rows_affected() > 0)
    }
}

// Helper struct for sqlx query_as
#[derive(sqlx::FromRow)]
struct ClientRow {
    id: String,
    name: String,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ClientRow> for Client {
    fn from(r: ClientRow) -> Self {
        Client {
            id: r.id,
            name: r.name,
            notes: r.notes,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}
