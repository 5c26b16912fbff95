//! Import pipeline
//!
//! Orchestrates a full import run: mapping completeness, per-row coercion and
//! validation, reference resolution against existing data, chunked atomic
//! inserts, and the final per-row report. Rows are never silently dropped;
//! everything that is not inserted comes back with its spreadsheet row number
//! and the reasons.

use std::collections::HashMap;

use base64::prelude::{Engine, BASE64_STANDARD};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::services::normalize::{normalize_row, FieldValue, NormalizedRow};
use crate::services::schema;
use crate::services::sheet::{read_workbook, Sheet, SheetError};
use crate::services::store::{ImportStore, TransactionRef};
use crate::services::validate::{validate_row, AMOUNT_EXCEEDS_BALANCE};
use crate::types::{
    BalanceUpdate, FailedRow, ImportResult, ImportTarget, NewCustomer, NewPayment,
    NewTransaction, RunImportRequest, TransactionStatus,
};

/// Rows are written in chunks of this size; each chunk is one atomic insert.
pub const CHUNK_SIZE: usize = 100;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("محتوى الملف غير صالح")]
    InvalidPayload,
    #[error(transparent)]
    Sheet(#[from] SheetError),
    #[error("لم يتم ربط الأعمدة المطلوبة: {}", .0.join("، "))]
    IncompleteMapping(Vec<String>),
    #[error("فشل في جلب البيانات المرجعية: {0}")]
    DependencyLookup(String),
}

/// Runs an import from a wire request.
pub async fn run_import(
    store: &dyn ImportStore,
    request: &RunImportRequest,
) -> Result<ImportResult, ImportError> {
    let bytes = BASE64_STANDARD
        .decode(&request.file_content)
        .map_err(|_| ImportError::InvalidPayload)?;
    import_file(
        store,
        &bytes,
        request.sheet_name.as_deref(),
        request.target,
        &request.mappings,
    )
    .await
}

/// Runs an import from raw file bytes.
pub async fn import_file(
    store: &dyn ImportStore,
    bytes: &[u8],
    sheet_name: Option<&str>,
    target: ImportTarget,
    mappings: &HashMap<String, String>,
) -> Result<ImportResult, ImportError> {
    let workbook = read_workbook(bytes)?;
    let sheet = workbook.sheet(sheet_name)?;
    import_rows(store, sheet, target, mappings).await
}

/// One record ready for insertion, tagged with its spreadsheet row number.
#[derive(Debug, Clone)]
enum Record {
    Customer(NewCustomer),
    Transaction(NewTransaction),
    Payment(NewPayment),
}

/// Runs an import over an already-parsed sheet.
pub async fn import_rows(
    store: &dyn ImportStore,
    sheet: &Sheet,
    target: ImportTarget,
    mappings: &HashMap<String, String>,
) -> Result<ImportResult, ImportError> {
    let missing = schema::missing_required_labels(
        target,
        mappings.values().map(String::as_str),
    );
    if !missing.is_empty() {
        return Err(ImportError::IncompleteMapping(missing));
    }

    let mut resolver = Resolver::load(store, target).await?;

    let mut accepted: Vec<(i32, Record)> = Vec::new();
    let mut failed: Vec<FailedRow> = Vec::new();

    for (index, raw) in sheet.rows.iter().enumerate() {
        // Sheet row number as the operator sees it: 1-based, header is row 1
        let row_number = (index + 2) as i32;
        if raw.is_blank() {
            continue;
        }
        let row = normalize_row(sheet, index, raw, target, mappings);
        let mut errors = validate_row(target, &row);
        let record = if errors.is_empty() {
            resolver.build(target, &row, &mut errors)
        } else {
            None
        };
        match record {
            Some(record) if errors.is_empty() => accepted.push((row_number, record)),
            _ => failed.push(FailedRow {
                row: row_number,
                errors,
            }),
        }
    }

    let mut success_count = 0usize;
    let mut committed_payments: Vec<NewPayment> = Vec::new();

    for chunk in accepted.chunks(CHUNK_SIZE) {
        match insert_chunk(store, chunk).await {
            Ok(()) => {
                success_count += chunk.len();
                for (_, record) in chunk {
                    if let Record::Payment(p) = record {
                        committed_payments.push(p.clone());
                    }
                }
            }
            Err(e) => {
                warn!(rows = chunk.len(), error = %e, "chunk insert failed");
                let message = format!("فشل حفظ الصف: {e}");
                for (row, _) in chunk {
                    failed.push(FailedRow {
                        row: *row,
                        errors: vec![message.clone()],
                    });
                }
            }
        }
    }

    if !committed_payments.is_empty() {
        let updates = resolver.balance_updates(&committed_payments);
        // The payment rows are already committed at this point; a failed
        // balance update must not discard the per-row report.
        if let Err(e) = store.apply_balance_updates(&updates).await {
            error!(error = %e, "failed to apply transaction balance updates");
        }
    }

    failed.sort_by_key(|f| f.row);
    info!(
        table = target.as_str(),
        success = success_count,
        failed = failed.len(),
        "import finished"
    );
    Ok(ImportResult {
        success_count,
        failed_rows: failed,
    })
}

async fn insert_chunk(
    store: &dyn ImportStore,
    chunk: &[(i32, Record)],
) -> anyhow::Result<()> {
    // A chunk is homogeneous; the first record decides the table.
    match chunk.first().map(|(_, r)| r) {
        Some(Record::Customer(_)) => {
            let rows: Vec<NewCustomer> = chunk
                .iter()
                .filter_map(|(_, r)| match r {
                    Record::Customer(c) => Some(c.clone()),
                    _ => None,
                })
                .collect();
            store.insert_customers(&rows).await
        }
        Some(Record::Transaction(_)) => {
            let rows: Vec<NewTransaction> = chunk
                .iter()
                .filter_map(|(_, r)| match r {
                    Record::Transaction(t) => Some(t.clone()),
                    _ => None,
                })
                .collect();
            store.insert_transactions(&rows).await
        }
        Some(Record::Payment(_)) => {
            let rows: Vec<NewPayment> = chunk
                .iter()
                .filter_map(|(_, r)| match r {
                    Record::Payment(p) => Some(p.clone()),
                    _ => None,
                })
                .collect();
            store.insert_payments(&rows).await
        }
        None => Ok(()),
    }
}

/// Resolves sheet sequence numbers against existing rows and tracks running
/// balances while payments are being accepted.
struct Resolver {
    customers: HashMap<i64, Uuid>,
    transactions: HashMap<i64, TransactionRef>,
    /// Remaining balance per transaction, updated as payments are accepted
    remaining: HashMap<Uuid, Decimal>,
}

impl Resolver {
    async fn load(store: &dyn ImportStore, target: ImportTarget) -> Result<Self, ImportError> {
        let lookup_err = |e: anyhow::Error| ImportError::DependencyLookup(e.to_string());
        let customers = match target {
            ImportTarget::Customer => HashMap::new(),
            ImportTarget::Transaction | ImportTarget::Payment => {
                store.customer_ids_by_sequence().await.map_err(lookup_err)?
            }
        };
        let transactions = match target {
            ImportTarget::Payment => {
                store.transactions_by_sequence().await.map_err(lookup_err)?
            }
            _ => HashMap::new(),
        };
        let remaining = transactions
            .values()
            .map(|t| (t.id, t.remaining_balance))
            .collect();
        Ok(Self {
            customers,
            transactions,
            remaining,
        })
    }

    /// Builds the insertable record for a validated row, or records the
    /// resolution errors.
    fn build(
        &mut self,
        target: ImportTarget,
        row: &NormalizedRow,
        errors: &mut Vec<String>,
    ) -> Option<Record> {
        match target {
            ImportTarget::Customer => Some(Record::Customer(build_customer(row))),
            ImportTarget::Transaction => self.build_transaction(row, errors),
            ImportTarget::Payment => self.build_payment(row, errors),
        }
    }

    fn build_transaction(
        &mut self,
        row: &NormalizedRow,
        errors: &mut Vec<String>,
    ) -> Option<Record> {
        let customer_seq = row.get("customer_id").and_then(FieldValue::as_int)?;
        let Some(&customer_id) = self.customers.get(&customer_seq) else {
            errors.push(format!("لم يتم العثور على عميل برقم {customer_seq}"));
            return None;
        };
        Some(Record::Transaction(NewTransaction::new(
            row.get("sequence_number").and_then(FieldValue::as_int),
            customer_id,
            row.get("cost_price").and_then(FieldValue::as_money)?,
            row.get("extra_price")
                .and_then(FieldValue::as_money)
                .unwrap_or(Decimal::ZERO),
            row.get("installment_amount").and_then(FieldValue::as_money),
            i32::try_from(row.get("number_of_installments").and_then(FieldValue::as_int)?)
                .ok()?,
            row.get("start_date").and_then(FieldValue::as_date)?,
            row.get("legal_case_details")
                .and_then(FieldValue::as_text)
                .map(str::to_string),
            row.get("notes").and_then(FieldValue::as_text).map(str::to_string),
        )))
    }

    fn build_payment(&mut self, row: &NormalizedRow, errors: &mut Vec<String>) -> Option<Record> {
        let customer_seq = row.get("customer_id").and_then(FieldValue::as_int)?;
        let tx_seq = row.get("transaction_id").and_then(FieldValue::as_int)?;
        let amount = row.get("amount").and_then(FieldValue::as_money)?;
        let payment_date = row.get("payment_date").and_then(FieldValue::as_date)?;

        let customer_id = match self.customers.get(&customer_seq) {
            Some(id) => *id,
            None => {
                errors.push(format!("لم يتم العثور على عميل برقم {customer_seq}"));
                return None;
            }
        };
        let tx = match self.transactions.get(&tx_seq) {
            Some(tx) => tx.clone(),
            None => {
                errors.push(format!("لم يتم العثور على معاملة برقم {tx_seq}"));
                return None;
            }
        };

        let remaining = *self.remaining.get(&tx.id).unwrap_or(&tx.remaining_balance);
        // The sheet's own debt column, when mapped, is as binding as the
        // transaction's running balance
        let balance_before = row
            .get("balance_before")
            .and_then(FieldValue::as_money)
            .unwrap_or(remaining);
        if amount > remaining || amount > balance_before {
            errors.push(AMOUNT_EXCEEDS_BALANCE.to_string());
            return None;
        }

        let balance_after = row
            .get("balance_after")
            .and_then(FieldValue::as_money)
            .unwrap_or(balance_before - amount);

        self.remaining.insert(tx.id, remaining - amount);

        Some(Record::Payment(NewPayment::new(
            customer_id,
            tx.id,
            amount,
            payment_date,
            Some(balance_before),
            Some(balance_after),
            row.get("notes").and_then(FieldValue::as_text).map(str::to_string),
        )))
    }

    /// Final balances recomputed from the payments that actually committed,
    /// so a failed chunk never skews a transaction's balance.
    fn balance_updates(&self, committed: &[NewPayment]) -> Vec<BalanceUpdate> {
        let mut paid: HashMap<Uuid, Decimal> = HashMap::new();
        for payment in committed {
            *paid.entry(payment.transaction_id).or_default() += payment.amount;
        }
        let mut updates: Vec<BalanceUpdate> = paid
            .into_iter()
            .filter_map(|(tx_id, total)| {
                let initial = self
                    .transactions
                    .values()
                    .find(|t| t.id == tx_id)
                    .map(|t| t.remaining_balance)?;
                let remaining_balance = initial - total;
                Some(BalanceUpdate {
                    transaction_id: tx_id,
                    remaining_balance,
                    status: if remaining_balance <= Decimal::ZERO {
                        TransactionStatus::Completed
                    } else {
                        TransactionStatus::Active
                    },
                })
            })
            .collect();
        updates.sort_by_key(|u| u.transaction_id);
        updates
    }
}

fn build_customer(row: &NormalizedRow) -> NewCustomer {
    NewCustomer::new(
        row.get("sequence_number")
            .and_then(FieldValue::as_int)
            .unwrap_or_default(),
        row.get("full_name")
            .and_then(FieldValue::as_text)
            .unwrap_or_default()
            .to_string(),
        row.get("mobile_number")
            .and_then(FieldValue::as_text)
            .unwrap_or_default()
            .to_string(),
        row.get("mobile_number2")
            .and_then(FieldValue::as_text)
            .map(str::to_string),
        row.get("civil_id").and_then(FieldValue::as_text).map(str::to_string),
    )
}
