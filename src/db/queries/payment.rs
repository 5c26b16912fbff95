//! Payment queries

use anyhow::Result;
use sqlx::{PgPool, QueryBuilder};

use crate::types::NewPayment;

/// Inserts a batch of payments as a single statement.
pub async fn insert_many(pool: &PgPool, rows: &[NewPayment]) -> Result<()> {
    if rows.is_empty() {
        return Ok(());
    }
    let mut builder = QueryBuilder::new(
        "INSERT INTO payments (id, customer_id, transaction_id, amount, payment_date, \
         balance_before, balance_after, notes) ",
    );
    builder.push_values(rows, |mut b, row| {
        b.push_bind(row.id)
            .push_bind(row.customer_id)
            .push_bind(row.transaction_id)
            .push_bind(row.amount)
            .push_bind(row.payment_date)
            .push_bind(row.balance_before)
            .push_bind(row.balance_after)
            .push_bind(row.notes.as_deref());
    });
    builder.build().execute(pool).await?;
    Ok(())
}

/// Deletes imported payments, optionally only recent ones.
pub async fn delete_imported(pool: &PgPool, newer_than_hours: Option<i32>) -> Result<u64> {
    let result = match newer_than_hours {
        Some(hours) => {
            sqlx::query(
                "DELETE FROM payments WHERE created_at >= now() - make_interval(hours => $1)",
            )
            .bind(hours)
            .execute(pool)
            .await?
        }
        None => sqlx::query("DELETE FROM payments").execute(pool).await?,
    };
    Ok(result.rows_affected())
}
