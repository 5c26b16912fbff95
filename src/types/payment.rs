//! Payment types

use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

/// Payment row ready for insertion
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub transaction_id: Uuid,
    pub amount: Decimal,
    pub payment_date: NaiveDate,
    pub balance_before: Option<Decimal>,
    pub balance_after: Option<Decimal>,
    pub notes: Option<String>,
}

impl NewPayment {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        customer_id: Uuid,
        transaction_id: Uuid,
        amount: Decimal,
        payment_date: NaiveDate,
        balance_before: Option<Decimal>,
        balance_after: Option<Decimal>,
        notes: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            customer_id,
            transaction_id,
            amount,
            payment_date,
            balance_before,
            balance_after,
            notes,
        }
    }
}

/// Post-import adjustment to a transaction's running balance
#[derive(Debug, Clone)]
pub struct BalanceUpdate {
    pub transaction_id: Uuid,
    pub remaining_balance: Decimal,
    pub status: super::TransactionStatus,
}
