//! Transaction queries

use std::collections::HashMap;

use anyhow::Result;
use rust_decimal::Decimal;
use sqlx::{PgPool, QueryBuilder};
use uuid::Uuid;

use crate::services::store::TransactionRef;
use crate::types::{BalanceUpdate, NewTransaction};

/// Inserts a batch of transactions as a single statement.
pub async fn insert_many(pool: &PgPool, rows: &[NewTransaction]) -> Result<()> {
    if rows.is_empty() {
        return Ok(());
    }
    let mut builder = QueryBuilder::new(
        "INSERT INTO transactions (id, sequence_number, customer_id, cost_price, extra_price, \
         amount, installment_amount, number_of_installments, start_date, remaining_balance, \
         profit, status, has_legal_case, legal_case_details, notes) ",
    );
    builder.push_values(rows, |mut b, row| {
        b.push_bind(row.id)
            .push_bind(row.sequence_number)
            .push_bind(row.customer_id)
            .push_bind(row.cost_price)
            .push_bind(row.extra_price)
            .push_bind(row.amount)
            .push_bind(row.installment_amount)
            .push_bind(row.number_of_installments)
            .push_bind(row.start_date)
            .push_bind(row.remaining_balance)
            .push_bind(row.profit)
            .push_bind(row.status.as_str())
            .push_bind(row.has_legal_case)
            .push_bind(row.legal_case_details.as_deref())
            .push_bind(row.notes.as_deref());
    });
    builder.build().execute(pool).await?;
    Ok(())
}

/// Transaction sequence number -> ref, for resolving payment imports.
/// Transactions without a sequence number cannot be referenced from a sheet.
pub async fn refs_by_sequence(pool: &PgPool) -> Result<HashMap<i64, TransactionRef>> {
    let rows: Vec<(i64, Uuid, Uuid, Decimal)> = sqlx::query_as(
        "SELECT sequence_number, id, customer_id, remaining_balance \
         FROM transactions WHERE sequence_number IS NOT NULL",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows
        .into_iter()
        .map(|(seq, id, customer_id, remaining_balance)| {
            (
                seq,
                TransactionRef {
                    id,
                    customer_id,
                    remaining_balance,
                },
            )
        })
        .collect())
}

/// Applies post-import remaining-balance and status changes.
pub async fn apply_balance_updates(pool: &PgPool, updates: &[BalanceUpdate]) -> Result<()> {
    for update in updates {
        sqlx::query(
            "UPDATE transactions SET remaining_balance = $1, status = $2 WHERE id = $3",
        )
        .bind(update.remaining_balance)
        .bind(update.status.as_str())
        .bind(update.transaction_id)
        .execute(pool)
        .await?;
    }
    Ok(())
}

/// Deletes imported transactions, optionally only recent ones.
pub async fn delete_imported(pool: &PgPool, newer_than_hours: Option<i32>) -> Result<u64> {
    let result = match newer_than_hours {
        Some(hours) => {
            sqlx::query(
                "DELETE FROM transactions WHERE created_at >= now() - make_interval(hours => $1)",
            )
            .bind(hours)
            .execute(pool)
            .await?
        }
        None => sqlx::query("DELETE FROM transactions").execute(pool).await?,
    };
    Ok(result.rows_affected())
}
