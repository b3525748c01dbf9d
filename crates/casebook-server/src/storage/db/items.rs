//! Cost and revenue item persistence

use super::{db_err, items_table, Database};
use crate::storage::{new_id, now};
use async_trait::async_trait;
use casebook_core::ports::ItemStore;
use casebook_core::{
    CasebookError, ItemKind, LineItem, LineItemPatch, NewLineItem, Patch, Result,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{QueryBuilder, Sqlite};
use std::str::FromStr;

const ITEM_COLUMNS: &str = "id, case_id, name, category, amount, notes, created_at, updated_at";

#[async_trait]
impl ItemStore for Database {
    async fn list_items(&self, kind: ItemKind, case_id: Option<&str>) -> Result<Vec<LineItem>> {
        let rows: Vec<ItemRow> = sqlx::query_as(&format!(
            "SELECT {ITEM_COLUMNS} FROM {} WHERE (?1 IS NULL OR case_id = ?1) \
             ORDER BY created_at DESC, rowid DESC",
            items_table(kind)
        ))
        .bind(case_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter().map(LineItem::try_from).collect()
    }

    async fn get_item(&self, kind: ItemKind, id: &str) -> Result<Option<LineItem>> {
        let row: Option<ItemRow> = sqlx::query_as(&format!(
            "SELECT {ITEM_COLUMNS} FROM {} WHERE id = ?1",
            items_table(kind)
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(LineItem::try_from).transpose()
    }

    async fn create_item(&self, kind: ItemKind, item: NewLineItem) -> Result<LineItem> {
        let stamp = now();
        let created = LineItem {
            id: new_id(),
            case_id: item.case_id,
            name: item.name,
            category: item.category,
            amount: item.amount,
            notes: item.notes,
            created_at: stamp,
            updated_at: stamp,
        };

        // An unknown case_id fails the foreign key and surfaces as Integrity
        sqlx::query(&format!(
            "INSERT INTO {} ({ITEM_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            items_table(kind)
        ))
        .bind(&created.id)
        .bind(&created.case_id)
        .bind(&created.name)
        .bind(&created.category)
        .bind(created.amount.to_string())
        .bind(&created.notes)
        .bind(created.created_at)
        .bind(created.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(created)
    }

    async fn update_item(
        &self,
        kind: ItemKind,
        id: &str,
        patch: LineItemPatch,
    ) -> Result<Option<LineItem>> {
        if patch.is_empty() {
            return self.get_item(kind, id).await;
        }

        let mut query = QueryBuilder::<Sqlite>::new(format!("UPDATE {} SET ", items_table(kind)));
        {
            let mut set = query.separated(", ");
            if let Patch::Set(case_id) = patch.case_id {
                set.push("case_id = ").push_bind_unseparated(case_id);
            }
            if let Patch::Set(name) = patch.name {
                set.push("name = ").push_bind_unseparated(name);
            }
            if let Patch::Set(category) = patch.category {
                set.push("category = ").push_bind_unseparated(category);
            }
            if let Patch::Set(amount) = patch.amount {
                set.push("amount = ").push_bind_unseparated(amount.to_string());
            }
            if let Patch::Set(notes) = patch.notes {
                set.push("notes = ").push_bind_unseparated(notes);
            }
            set.push("updated_at = ").push_bind_unseparated(now());
        }
        query
            .push(" WHERE id = ")
            .push_bind(id.to_string())
            .push(format!(" RETURNING {ITEM_COLUMNS}"));

        let row: Option<ItemRow> = query
            .build_query_as::<ItemRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        row.map(LineItem::try_from).transpose()
    }

    async fn delete_item(&self, kind: ItemKind, id: &str) -> Result<bool> {
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = ?1", items_table(kind)))
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(result.rows_affected() > 0)
    }
}

// Helper struct for sqlx query_as
#[derive(sqlx::FromRow)]
struct ItemRow {
    id: String,
    case_id: String,
    name: String,
    category: Option<String>,
    amount: String,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ItemRow> for LineItem {
    type Error = CasebookError;

    fn try_from(r: ItemRow) -> Result<Self> {
        let amount = Decimal::from_str(&r.amount).map_err(|e| {
            CasebookError::Database(format!("invalid amount '{}' on item {}: {}", r.amount, r.id, e))
        })?;
        Ok(LineItem {
            id: r.id,
            case_id: r.case_id,
            name: r.name,
            category: r.category,
            amount,
            notes: r.notes,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}
