//! Persistence seam for the import pipeline
//!
//! The pipeline talks to a trait so its chunking and failure handling can be
//! tested without a database; `PgStore` is the production implementation.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::queries;
use crate::types::{BalanceUpdate, NewCustomer, NewPayment, NewTransaction};

/// What the payment importer needs to know about an existing transaction.
#[derive(Debug, Clone)]
pub struct TransactionRef {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub remaining_balance: Decimal,
}

#[async_trait]
pub trait ImportStore: Send + Sync {
    /// Inserts a chunk of customers atomically.
    async fn insert_customers(&self, rows: &[NewCustomer]) -> Result<()>;

    /// Inserts a chunk of transactions atomically.
    async fn insert_transactions(&self, rows: &[NewTransaction]) -> Result<()>;

    /// Inserts a chunk of payments atomically.
    async fn insert_payments(&self, rows: &[NewPayment]) -> Result<()>;

    /// Customer sequence number -> customer id, for reference resolution.
    async fn customer_ids_by_sequence(&self) -> Result<HashMap<i64, Uuid>>;

    /// Transaction sequence number -> transaction ref, for payment imports.
    async fn transactions_by_sequence(&self) -> Result<HashMap<i64, TransactionRef>>;

    /// Applies post-import balance and status changes to transactions.
    async fn apply_balance_updates(&self, updates: &[BalanceUpdate]) -> Result<()>;
}

/// Postgres-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ImportStore for PgStore {
    async fn insert_customers(&self, rows: &[NewCustomer]) -> Result<()> {
        queries::customer::insert_many(&self.pool, rows).await
    }

    async fn insert_transactions(&self, rows: &[NewTransaction]) -> Result<()> {
        queries::transaction::insert_many(&self.pool, rows).await
    }

    async fn insert_payments(&self, rows: &[NewPayment]) -> Result<()> {
        queries::payment::insert_many(&self.pool, rows).await
    }

    async fn customer_ids_by_sequence(&self) -> Result<HashMap<i64, Uuid>> {
        queries::customer::ids_by_sequence(&self.pool).await
    }

    async fn transactions_by_sequence(&self) -> Result<HashMap<i64, TransactionRef>> {
        queries::transaction::refs_by_sequence(&self.pool).await
    }

    async fn apply_balance_updates(&self, updates: &[BalanceUpdate]) -> Result<()> {
        queries::transaction::apply_balance_updates(&self.pool, updates).await
    }
}
