//! Transaction (installment sale) types

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Transaction status stored in the `status` column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Active,
    Completed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Active => "active",
            TransactionStatus::Completed => "completed",
        }
    }
}

/// Transaction row ready for insertion
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub id: Uuid,
    pub sequence_number: Option<i64>,
    pub customer_id: Uuid,
    pub cost_price: Decimal,
    pub extra_price: Decimal,
    pub amount: Decimal,
    pub installment_amount: Decimal,
    pub number_of_installments: i32,
    pub start_date: NaiveDate,
    pub remaining_balance: Decimal,
    pub profit: Decimal,
    pub status: TransactionStatus,
    pub has_legal_case: bool,
    pub legal_case_details: Option<String>,
    pub notes: Option<String>,
}

impl NewTransaction {
    /// Builds an insertable transaction, computing the derived money fields.
    ///
    /// `amount` is the full sale price (cost + extra), `profit` is the
    /// markup, and the remaining balance starts at the full amount. When the
    /// sheet does not carry an installment amount it is derived by splitting
    /// the total evenly, rounded to 3 decimal places.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        sequence_number: Option<i64>,
        customer_id: Uuid,
        cost_price: Decimal,
        extra_price: Decimal,
        installment_amount: Option<Decimal>,
        number_of_installments: i32,
        start_date: NaiveDate,
        legal_case_details: Option<String>,
        notes: Option<String>,
    ) -> Self {
        let amount = cost_price + extra_price;
        let installment_amount = installment_amount
            .unwrap_or_else(|| (amount / Decimal::from(number_of_installments)).round_dp(3));
        Self {
            id: Uuid::new_v4(),
            sequence_number,
            customer_id,
            cost_price,
            extra_price,
            amount,
            installment_amount,
            number_of_installments,
            start_date,
            remaining_balance: amount,
            profit: extra_price,
            status: TransactionStatus::Active,
            has_legal_case: legal_case_details.is_some(),
            legal_case_details,
            notes,
        }
    }
}
