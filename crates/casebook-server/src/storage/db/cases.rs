//! Business case persistence, including the tag registry and case-tag links

use super::{db_err, Database};
use crate::storage::{new_id, now};
use async_trait::async_trait;
use casebook_core::ports::CaseStore;
use casebook_core::{
    BusinessCase, CasePatch, CaseStatus, CasebookError, Decimal, DurationUnit, NewCase, Patch,
    Result, TimeBasis,
};
use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use std::collections::HashMap;
use std::str::FromStr;

const CASE_SELECT: &str = r#"
    SELECT c.id, c.client_id, cl.name AS client_name, c.title, c.description, c.status,
           c.category, c.time_basis, c.duration_value, c.duration_unit, c.currency_code,
           c.created_at, c.updated_at
    FROM business_cases c
    LEFT JOIN clients cl ON cl.id = c.client_id
"#;

#[async_trait]
impl CaseStore for Database {
    async fn list_cases(&self, client_id: Option<&str>) -> Result<Vec<BusinessCase>> {
        let mut conn = self.pool.acquire().await.map_err(db_err)?;

        let rows: Vec<CaseRow> = sqlx::query_as(&format!(
            "{CASE_SELECT} WHERE (?1 IS NULL OR c.client_id = ?1) ORDER BY c.created_at DESC, c.rowid DESC"
        ))
        .bind(client_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(db_err)?;

        let mut tags = tags_by_case(&mut conn, None).await?;
        rows.into_iter()
            .map(|row| {
                let case_tags = tags.remove(&row.id).unwrap_or_default();
                row.into_case(case_tags)
            })
            .collect()
    }

    async fn get_case(&self, id: &str) -> Result<Option<BusinessCase>> {
        let mut conn = self.pool.acquire().await.map_err(db_err)?;
        fetch_case(&mut conn, id).await
    }

    async fn create_case(&self, case: NewCase) -> Result<BusinessCase> {
        let id = new_id();
        let stamp = now();

        let mut tx = self.pool.begin().await.map_err(db_err)?;

        sqlx::query(
            r#"
            INSERT INTO business_cases (id, client_id, title, description, status, category,
                                        time_basis, duration_value, duration_unit, currency_code,
                                        created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&id)
        .bind(&case.client_id)
        .bind(&case.title)
        .bind(&case.description)
        .bind(case.status.as_str())
        .bind(&case.category)
        .bind(case.time_basis.map(TimeBasis::as_str))
        .bind(case.duration_value.map(|d| d.to_string()))
        .bind(case.duration_unit.map(DurationUnit::as_str))
        .bind(&case.currency_code)
        .bind(stamp)
        .bind(stamp)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        replace_tags(&mut tx, &id, &case.tags, stamp).await?;

        let created = fetch_case(&mut tx, &id)
            .await?
            .ok_or_else(|| CasebookError::Database(format!("case {} missing after insert", id)))?;

        tx.commit().await.map_err(db_err)?;
        Ok(created)
    }

    async fn update_case(&self, id: &str, patch: CasePatch) -> Result<Option<BusinessCase>> {
        if patch.is_empty() {
            return self.get_case(id).await;
        }

        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let exists: Option<(String,)> = sqlx::query_as("SELECT id FROM business_cases WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_err)?;
        if exists.is_none() {
            return Ok(None);
        }

        let stamp = now();
        let mut query = QueryBuilder::<Sqlite>::new("UPDATE business_cases SET ");
        {
            let mut set = query.separated(", ");
            if let Patch::Set(client_id) = patch.client_id {
                set.push("client_id = ").push_bind_unseparated(client_id);
            }
            if let Patch::Set(title) = patch.title {
                set.push("title = ").push_bind_unseparated(title);
            }
            if let Patch::Set(description) = patch.description {
                set.push("description = ").push_bind_unseparated(description);
            }
            if let Patch::Set(status) = patch.status {
                set.push("status = ").push_bind_unseparated(status.as_str());
            }
            if let Patch::Set(category) = patch.category {
                set.push("category = ").push_bind_unseparated(category);
            }
            if let Patch::Set(time_basis) = patch.time_basis {
                set.push("time_basis = ")
                    .push_bind_unseparated(time_basis.map(TimeBasis::as_str));
            }
            if let Patch::Set(duration_value) = patch.duration_value {
                set.push("duration_value = ")
                    .push_bind_unseparated(duration_value.map(|d| d.to_string()));
            }
            if let Patch::Set(duration_unit) = patch.duration_unit {
                set.push("duration_unit = ")
                    .push_bind_unseparated(duration_unit.map(DurationUnit::as_str));
            }
            if let Patch::Set(currency_code) = patch.currency_code {
                set.push("currency_code = ").push_bind_unseparated(currency_code);
            }
            // Tag replacement counts as a mutation of the case
            set.push("updated_at = ").push_bind_unseparated(stamp);
        }
        query.push(" WHERE id = ").push_bind(id.to_string());
        query.build().execute(&mut *tx).await.map_err(db_err)?;

        if let Patch::Set(tags) = patch.tags {
            replace_tags(&mut tx, id, &tags, stamp).await?;
        }

        let updated = fetch_case(&mut tx, id).await?;
        tx.commit().await.map_err(db_err)?;
        Ok(updated)
    }

    async fn delete_case(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM business_cases WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(result.rows_affected() > 0)
    }
}

async fn fetch_case(conn: &mut SqliteConnection, id: &str) -> Result<Option<BusinessCase>> {
    let row: Option<CaseRow> = sqlx::query_as(&format!("{CASE_SELECT} WHERE c.id = ?1"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(db_err)?;

    let Some(row) = row else {
        return Ok(None);
    };
    let mut tags = tags_by_case(conn, Some(id)).await?;
    let case_tags = tags.remove(id).unwrap_or_default();
    row.into_case(case_tags).map(Some)
}

/// Tag names per case id, each list sorted by name
async fn tags_by_case(
    conn: &mut SqliteConnection,
    case_id: Option<&str>,
) -> Result<HashMap<String, Vec<String>>> {
    let rows: Vec<(String, String)> = sqlx::query_as(
        r#"
        SELECT ct.case_id, t.name
        FROM case_tags ct
        JOIN tags t ON t.id = ct.tag_id
        WHERE (?1 IS NULL OR ct.case_id = ?1)
        ORDER BY t.name
        "#,
    )
    .bind(case_id)
    .fetch_all(&mut *conn)
    .await
    .map_err(db_err)?;

    let mut by_case: HashMap<String, Vec<String>> = HashMap::new();
    for (case_id, name) in rows {
        by_case.entry(case_id).or_default().push(name);
    }
    Ok(by_case)
}

/// Replace every tag link of a case. Names are upserted into the shared
/// registry; an existing row with the same name is reused.
async fn replace_tags(
    conn: &mut SqliteConnection,
    case_id: &str,
    tags: &[String],
    stamp: DateTime<Utc>,
) -> Result<()> {
    sqlx::query("DELETE FROM case_tags WHERE case_id = ?1")
        .bind(case_id)
        .execute(&mut *conn)
        .await
        .map_err(db_err)?;

    for name in tags {
        sqlx::query(
            r#"
            INSERT INTO tags (id, name, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?3)
            ON CONFLICT(name) DO NOTHING
            "#,
        )
        .bind(new_id())
        .bind(name)
        .bind(stamp)
        .execute(&mut *conn)
        .await
        .map_err(db_err)?;

        let (tag_id,): (String,) = sqlx::query_as("SELECT id FROM tags WHERE name = ?1")
            .bind(name)
            .fetch_one(&mut *conn)
            .await
            .map_err(db_err)?;

        sqlx::query("INSERT OR IGNORE INTO case_tags (case_id, tag_id) VALUES (?1, ?2)")
            .bind(case_id)
            .bind(tag_id)
            .execute(&mut *conn)
            .await
            .map_err(db_err)?;
    }

    Ok(())
}

// Helper struct for sqlx query_as
#[derive(sqlx::FromRow)]
struct CaseRow {
    id: String,
    client_id: String,
    client_name: Option<String>,
    title: String,
    description: Option<String>,
    status: String,
    category: Option<String>,
    time_basis: Option<String>,
    /// Decimal text
    duration_value: Option<String>,
    duration_unit: Option<String>,
    currency_code: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CaseRow {
    fn into_case(self, tags: Vec<String>) -> Result<BusinessCase> {
        let duration_value = self
            .duration_value
            .as_deref()
            .map(Decimal::from_str)
            .transpose()
            .map_err(|e| {
                CasebookError::Database(format!(
                    "invalid duration_value on case {}: {}",
                    self.id, e
                ))
            })?;
        Ok(BusinessCase {
            id: self.id,
            client_id: self.client_id,
            client_name: self.client_name,
            title: self.title,
            description: self.description,
            // CHECK constraints keep these columns within the enum values
            status: CaseStatus::from_db_value(&self.status).unwrap_or_default(),
            category: self.category,
            time_basis: self.time_basis.as_deref().and_then(TimeBasis::from_db_value),
            duration_value,
            duration_unit: self
                .duration_unit
                .as_deref()
                .and_then(DurationUnit::from_db_value),
            currency_code: self.currency_code,
            tags,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
