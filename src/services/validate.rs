//! Row validation
//!
//! Walks the target's field table in declaration order and collects every
//! problem on the row, so an operator sees the full list in one pass instead
//! of fixing errors one re-upload at a time.

use rust_decimal::Decimal;

use crate::services::normalize::{FieldValue, NormalizedRow};
use crate::services::schema::{self, FieldKind, FieldSpec, PHONE_RE};
use crate::types::ImportTarget;

pub const TOTAL_NOT_POSITIVE: &str = "إجمالي السعر يجب أن يكون أكبر من صفر";
pub const BALANCE_MISMATCH: &str = "المتبقى غير متسق مع الدين المستحق وقيمة الدفعة";
pub const AMOUNT_EXCEEDS_BALANCE: &str = "قيمة الدفعة تتجاوز الرصيد المتبقي";

/// All validation errors on a row, in field-declaration order followed by
/// cross-field checks. Empty means the row is accepted.
pub fn validate_row(target: ImportTarget, row: &NormalizedRow) -> Vec<String> {
    let mut errors = Vec::new();

    for spec in schema::fields(target) {
        if row.invalid.contains(spec.name) {
            errors.push(spec.invalid_msg.to_string());
            continue;
        }
        match row.get(spec.name) {
            None => {
                if spec.required {
                    if let Some(msg) = spec.required_msg {
                        errors.push(msg.to_string());
                    }
                }
            }
            Some(value) => {
                if let Some(msg) = bound_error(spec, value) {
                    errors.push(msg.to_string());
                }
            }
        }
    }

    match target {
        ImportTarget::Transaction => validate_transaction(row, &mut errors),
        ImportTarget::Payment => validate_payment(row, &mut errors),
        ImportTarget::Customer => {}
    }

    errors
}

fn bound_error(spec: &FieldSpec, value: &FieldValue) -> Option<&'static str> {
    match (spec.kind, value) {
        (FieldKind::SequenceId, FieldValue::Int(v)) => {
            (*v <= 0).then_some(spec.invalid_msg)
        }
        (FieldKind::Integer { min }, FieldValue::Int(v)) => {
            // Integers land in 32-bit columns; anything wider is not a
            // plausible sheet value
            (*v < min || *v > i32::MAX as i64)
                .then(|| spec.bound_msg.unwrap_or(spec.invalid_msg))
        }
        (FieldKind::Money, FieldValue::Money(v)) => {
            // A bound message marks the strictly-positive amounts; the rest
            // only have to be non-negative.
            match spec.bound_msg {
                Some(msg) => (*v <= Decimal::ZERO).then_some(msg),
                None => (*v < Decimal::ZERO).then_some(spec.invalid_msg),
            }
        }
        (FieldKind::Text { min_len }, FieldValue::Text(v)) => {
            (v.chars().count() < min_len).then(|| spec.bound_msg.unwrap_or(spec.invalid_msg))
        }
        (FieldKind::Phone, FieldValue::Text(v)) => {
            let cleaned: String = v.chars().filter(|c| !c.is_whitespace()).collect();
            (!PHONE_RE.is_match(&cleaned)).then(|| spec.bound_msg.unwrap_or(spec.invalid_msg))
        }
        _ => None,
    }
}

fn validate_transaction(row: &NormalizedRow, errors: &mut Vec<String>) {
    let cost = row.get("cost_price").and_then(FieldValue::as_money);
    let extra = row
        .get("extra_price")
        .and_then(FieldValue::as_money)
        .unwrap_or(Decimal::ZERO);
    if let Some(cost) = cost {
        if cost + extra <= Decimal::ZERO && !errors.iter().any(|e| e == TOTAL_NOT_POSITIVE) {
            errors.push(TOTAL_NOT_POSITIVE.to_string());
        }
    }
}

fn validate_payment(row: &NormalizedRow, errors: &mut Vec<String>) {
    let amount = row.get("amount").and_then(FieldValue::as_money);
    let before = row.get("balance_before").and_then(FieldValue::as_money);
    let after = row.get("balance_after").and_then(FieldValue::as_money);
    if let (Some(amount), Some(before)) = (amount, before) {
        // The sheet's own debt column is the hard limit
        if before - amount < Decimal::ZERO {
            errors.push(AMOUNT_EXCEEDS_BALANCE.to_string());
        }
        if let Some(after) = after {
            if before - amount != after {
                errors.push(BALANCE_MISMATCH.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::normalize::normalize_row;
    use crate::services::sheet::read_workbook;
    use std::collections::HashMap;

    fn customer_row(csv: &str) -> NormalizedRow {
        let workbook = read_workbook(csv.as_bytes()).unwrap();
        let sheet = &workbook.sheets[0];
        let mappings: HashMap<String, String> = [
            ("كود".to_string(), "sequence_number".to_string()),
            ("الاسم الكامل".to_string(), "full_name".to_string()),
            ("رقم الهاتف".to_string(), "mobile_number".to_string()),
        ]
        .into();
        normalize_row(sheet, 0, &sheet.rows[0], ImportTarget::Customer, &mappings)
    }

    fn payment_row(csv: &str) -> NormalizedRow {
        let workbook = read_workbook(csv.as_bytes()).unwrap();
        let sheet = &workbook.sheets[0];
        let mappings: HashMap<String, String> = [
            ("رقم العميل".to_string(), "customer_id".to_string()),
            ("رقم البيع".to_string(), "transaction_id".to_string()),
            ("قيمة الدفعة".to_string(), "amount".to_string()),
            ("تاريخ الدفعة".to_string(), "payment_date".to_string()),
            ("الدين المستحق".to_string(), "balance_before".to_string()),
            ("المتبقى".to_string(), "balance_after".to_string()),
        ]
        .into();
        normalize_row(sheet, 0, &sheet.rows[0], ImportTarget::Payment, &mappings)
    }

    #[test]
    fn valid_customer_passes() {
        let row = customer_row("كود,الاسم الكامل,رقم الهاتف\n1,أحمد علي,99887766\n");
        assert!(validate_row(ImportTarget::Customer, &row).is_empty());
    }

    #[test]
    fn missing_name_reports_the_required_message() {
        let row = customer_row("كود,الاسم الكامل,رقم الهاتف\n1,,99887766\n");
        let errors = validate_row(ImportTarget::Customer, &row);
        assert_eq!(errors, vec!["اسم العميل مطلوب".to_string()]);
    }

    #[test]
    fn short_name_reports_the_bound_message() {
        let row = customer_row("كود,الاسم الكامل,رقم الهاتف\n1,أ,99887766\n");
        let errors = validate_row(ImportTarget::Customer, &row);
        assert_eq!(
            errors,
            vec!["اسم العميل يجب أن يكون على الأقل حرفين".to_string()]
        );
    }

    #[test]
    fn bad_phone_and_bad_code_are_both_reported() {
        let row = customer_row("كود,الاسم الكامل,رقم الهاتف\nليس رقم,أحمد علي,٩٩٨٨rubbish\n");
        let errors = validate_row(ImportTarget::Customer, &row);
        assert_eq!(
            errors,
            vec![
                "رقم العميل يجب أن يكون رقم".to_string(),
                "رقم الموبايل غير صالح".to_string(),
            ]
        );
    }

    #[test]
    fn phone_ignores_interior_whitespace() {
        let row = customer_row("كود,الاسم الكامل,رقم الهاتف\n1,أحمد علي,+965 9988 7766\n");
        assert!(validate_row(ImportTarget::Customer, &row).is_empty());
    }

    #[test]
    fn consistent_payment_balances_pass() {
        let row = payment_row(
            "رقم العميل,رقم البيع,قيمة الدفعة,تاريخ الدفعة,الدين المستحق,المتبقى\n\
             1,10,25,2024-01-15,100,75\n",
        );
        assert!(validate_row(ImportTarget::Payment, &row).is_empty());
    }

    #[test]
    fn payment_exceeding_the_sheet_debt_is_rejected() {
        // balance_before mapped without balance_after: 50 - 75 goes negative
        let row = payment_row(
            "رقم العميل,رقم البيع,قيمة الدفعة,تاريخ الدفعة,الدين المستحق,المتبقى\n\
             1,10,75,2024-01-15,50,\n",
        );
        let errors = validate_row(ImportTarget::Payment, &row);
        assert_eq!(errors, vec![AMOUNT_EXCEEDS_BALANCE.to_string()]);
    }

    #[test]
    fn negative_balance_after_is_rejected_even_when_arithmetic_is_consistent() {
        // 50 - 75 = -25 matches the sheet, but the debt is still exceeded
        // and a negative balance cell fails its own field check
        let row = payment_row(
            "رقم العميل,رقم البيع,قيمة الدفعة,تاريخ الدفعة,الدين المستحق,المتبقى\n\
             1,10,75,2024-01-15,50,-25\n",
        );
        let errors = validate_row(ImportTarget::Payment, &row);
        assert_eq!(
            errors,
            vec![
                "المتبقى يجب أن يكون رقم".to_string(),
                AMOUNT_EXCEEDS_BALANCE.to_string(),
            ]
        );
    }

    #[test]
    fn inconsistent_payment_balances_are_rejected() {
        let row = payment_row(
            "رقم العميل,رقم البيع,قيمة الدفعة,تاريخ الدفعة,الدين المستحق,المتبقى\n\
             1,10,25,2024-01-15,100,80\n",
        );
        let errors = validate_row(ImportTarget::Payment, &row);
        assert_eq!(errors, vec![BALANCE_MISMATCH.to_string()]);
    }

    #[test]
    fn zero_payment_amount_is_rejected() {
        let row = payment_row(
            "رقم العميل,رقم البيع,قيمة الدفعة,تاريخ الدفعة,الدين المستحق,المتبقى\n\
             1,10,0,2024-01-15,,\n",
        );
        let errors = validate_row(ImportTarget::Payment, &row);
        assert_eq!(errors, vec!["قيمة الدفعة يجب أن تكون أكبر من صفر".to_string()]);
    }
}
