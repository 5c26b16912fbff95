//! Customer queries

use std::collections::HashMap;

use anyhow::Result;
use sqlx::{PgPool, QueryBuilder};
use uuid::Uuid;

use crate::types::NewCustomer;

/// Inserts a batch of customers as a single statement, so the whole batch
/// commits or fails together.
pub async fn insert_many(pool: &PgPool, rows: &[NewCustomer]) -> Result<()> {
    if rows.is_empty() {
        return Ok(());
    }
    let mut builder = QueryBuilder::new(
        "INSERT INTO customers (id, sequence_number, full_name, mobile_number, mobile_number2, civil_id) ",
    );
    builder.push_values(rows, |mut b, row| {
        b.push_bind(row.id)
            .push_bind(row.sequence_number)
            .push_bind(&row.full_name)
            .push_bind(&row.mobile_number)
            .push_bind(row.mobile_number2.as_deref())
            .push_bind(row.civil_id.as_deref());
    });
    builder.build().execute(pool).await?;
    Ok(())
}

/// Customer sequence number -> id, for resolving sheet references.
pub async fn ids_by_sequence(pool: &PgPool) -> Result<HashMap<i64, Uuid>> {
    let rows: Vec<(i64, Uuid)> =
        sqlx::query_as("SELECT sequence_number, id FROM customers")
            .fetch_all(pool)
            .await?;
    Ok(rows.into_iter().collect())
}

/// Deletes imported customers, optionally only those imported within the
/// last N hours. Returns the number of rows removed.
pub async fn delete_imported(pool: &PgPool, newer_than_hours: Option<i32>) -> Result<u64> {
    let result = match newer_than_hours {
        Some(hours) => {
            sqlx::query(
                "DELETE FROM customers WHERE created_at >= now() - make_interval(hours => $1)",
            )
            .bind(hours)
            .execute(pool)
            .await?
        }
        None => sqlx::query("DELETE FROM customers").execute(pool).await?,
    };
    Ok(result.rows_affected())
}
