//! Cost and revenue timing persistence

use super::{db_err, timing_table, Database};
use crate::storage::{new_id, now};
use async_trait::async_trait;
use casebook_core::ports::TimingStore;
use casebook_core::validate::check_date_order;
use casebook_core::{ItemKind, NewTiming, Patch, Result, Timing, TimingPatch};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{QueryBuilder, Sqlite};

fn timing_columns(kind: ItemKind) -> String {
    format!(
        "id, {} AS item_id, start_date, end_date, recurrence_interval_months, notes, \
         created_at, updated_at",
        kind.parent_key()
    )
}

#[async_trait]
impl TimingStore for Database {
    async fn list_timing(&self, kind: ItemKind, item_id: Option<&str>) -> Result<Vec<Timing>> {
        let rows: Vec<TimingRow> = sqlx::query_as(&format!(
            "SELECT {} FROM {} WHERE (?1 IS NULL OR {} = ?1) ORDER BY created_at DESC, rowid DESC",
            timing_columns(kind),
            timing_table(kind),
            kind.parent_key()
        ))
        .bind(item_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows.into_iter().map(|r| r.into_timing(kind)).collect())
    }

    async fn get_timing(&self, kind: ItemKind, id: &str) -> Result<Option<Timing>> {
        let row: Option<TimingRow> = sqlx::query_as(&format!(
            "SELECT {} FROM {} WHERE id = ?1",
            timing_columns(kind),
            timing_table(kind)
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.map(|r| r.into_timing(kind)))
    }

    async fn create_timing(&self, kind: ItemKind, timing: NewTiming) -> Result<Timing> {
        let stamp = now();
        let created = Timing {
            id: new_id(),
            kind,
            item_id: timing.item_id,
            start_date: timing.schedule.start_date,
            end_date: timing.schedule.end_date,
            recurrence_interval_months: timing.schedule.recurrence_interval_months,
            notes: timing.schedule.notes,
            created_at: stamp,
            updated_at: stamp,
        };

        sqlx::query(&format!(
            "INSERT INTO {} (id, {}, start_date, end_date, recurrence_interval_months, notes, \
             created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            timing_table(kind),
            kind.parent_key()
        ))
        .bind(&created.id)
        .bind(&created.item_id)
        .bind(created.start_date)
        .bind(created.end_date)
        .bind(created.recurrence_interval_months)
        .bind(&created.notes)
        .bind(created.created_at)
        .bind(created.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(created)
    }

    async fn update_timing(
        &self,
        kind: ItemKind,
        id: &str,
        patch: TimingPatch,
    ) -> Result<Option<Timing>> {
        if patch.is_empty() {
            return self.get_timing(kind, id).await;
        }

        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let current: Option<(Option<NaiveDate>, Option<NaiveDate>)> = sqlx::query_as(&format!(
            "SELECT start_date, end_date FROM {} WHERE id = ?1",
            timing_table(kind)
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err)?;
        let Some((start_date, end_date)) = current else {
            return Ok(None);
        };
        check_date_order(
            *patch.start_date.resolve(&start_date),
            *patch.end_date.resolve(&end_date),
        )?;

        let mut query =
            QueryBuilder::<Sqlite>::new(format!("UPDATE {} SET ", timing_table(kind)));
        {
            let mut set = query.separated(", ");
            if let Patch::Set(start_date) = patch.start_date {
                set.push("start_date = ").push_bind_unseparated(start_date);
            }
            if let Patch::Set(end_date) = patch.end_date {
                set.push("end_date = ").push_bind_unseparated(end_date);
            }
            if let Patch::Set(recurrence) = patch.recurrence_interval_months {
                set.push("recurrence_interval_months = ")
                    .push_bind_unseparated(recurrence);
            }
            if let Patch::Set(notes) = patch.notes {
                set.push("notes = ").push_bind_unseparated(notes);
            }
            set.push("updated_at = ").push_bind_unseparated(now());
        }
        query
            .push(" WHERE id = ")
            .push_bind(id.to_string())
            .push(format!(" RETURNING {}", timing_columns(kind)));

        let row: Option<TimingRow> = query
            .build_query_as::<TimingRow>()
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;
        Ok(row.map(|r| r.into_timing(kind)))
    }

    async fn delete_timing(&self, kind: ItemKind, id: &str) -> Result<bool> {
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = ?1", timing_table(kind)))
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(result.rows_affected() > 0)
    }
}

// Helper struct for sqlx query_as
#[derive(sqlx::FromRow)]
struct TimingRow {
    id: String,
    item_id: String,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    recurrence_interval_months: Option<i64>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TimingRow {
    fn into_timing(self, kind: ItemKind) -> Timing {
        Timing {
            id: self.id,
            kind,
            item_id: self.item_id,
            start_date: self.start_date,
            end_date: self.end_date,
            recurrence_interval_months: self.recurrence_interval_months,
            notes: self.notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
