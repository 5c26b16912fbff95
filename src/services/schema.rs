//! Destination field schemas
//!
//! One static table per import target. Labels and messages are the Arabic
//! strings the back office shows its operators; validation walks these tables
//! instead of branching per target.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::{FieldDescriptor, ImportTarget};

/// Kuwaiti-style mobile numbers: optional +, 8 to 15 digits
pub static PHONE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\+?[0-9]{8,15}$").unwrap()
});

/// What a destination field holds, with the bound the validator enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Whole-number sequence id referencing another sheet/table
    SequenceId,
    /// Non-negative money amount
    Money,
    Integer { min: i64 },
    Date,
    Text { min_len: usize },
    Phone,
}

/// One destination column of an import target.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    /// Arabic label shown in the mapping UI
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    /// Message when a required field is missing
    pub required_msg: Option<&'static str>,
    /// Message when a present value cannot be coerced
    pub invalid_msg: &'static str,
    /// Message when a coerced value violates the kind's bound
    pub bound_msg: Option<&'static str>,
}

pub static CUSTOMER_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        name: "sequence_number",
        label: "كود",
        kind: FieldKind::SequenceId,
        required: true,
        required_msg: Some("رقم العميل مطلوب"),
        invalid_msg: "رقم العميل يجب أن يكون رقم",
        bound_msg: None,
    },
    FieldSpec {
        name: "full_name",
        label: "الاسم الكامل",
        kind: FieldKind::Text { min_len: 2 },
        required: true,
        required_msg: Some("اسم العميل مطلوب"),
        invalid_msg: "اسم العميل غير صالح",
        bound_msg: Some("اسم العميل يجب أن يكون على الأقل حرفين"),
    },
    FieldSpec {
        name: "mobile_number",
        label: "رقم الهاتف",
        kind: FieldKind::Phone,
        required: true,
        required_msg: Some("رقم الموبايل مطلوب"),
        invalid_msg: "رقم الموبايل غير صالح",
        bound_msg: Some("رقم الموبايل غير صالح"),
    },
    FieldSpec {
        name: "mobile_number2",
        label: "رقم الهاتف 2",
        kind: FieldKind::Phone,
        required: false,
        required_msg: None,
        invalid_msg: "رقم الموبايل الثاني غير صالح",
        bound_msg: Some("رقم الموبايل الثاني غير صالح"),
    },
    FieldSpec {
        name: "civil_id",
        label: "الرقم المدني",
        kind: FieldKind::Text { min_len: 0 },
        required: false,
        required_msg: None,
        invalid_msg: "الرقم المدني غير صالح",
        bound_msg: None,
    },
];

pub static TRANSACTION_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        name: "sequence_number",
        label: "رقم البيع",
        kind: FieldKind::SequenceId,
        required: false,
        required_msg: None,
        invalid_msg: "رقم البيع يجب أن يكون رقم",
        bound_msg: None,
    },
    FieldSpec {
        name: "customer_id",
        label: "رقم العميل",
        kind: FieldKind::SequenceId,
        required: true,
        required_msg: Some("رقم العميل مطلوب"),
        invalid_msg: "رقم العميل يجب أن يكون رقم",
        bound_msg: None,
    },
    FieldSpec {
        name: "cost_price",
        label: "سعر السلعة",
        kind: FieldKind::Money,
        required: true,
        required_msg: Some("سعر السلعة مطلوب"),
        invalid_msg: "سعر السلعة يجب أن يكون رقم",
        bound_msg: Some("سعر السلعة يجب أن يكون أكبر من صفر"),
    },
    FieldSpec {
        name: "extra_price",
        label: "السعر الاضافى",
        kind: FieldKind::Money,
        required: false,
        required_msg: None,
        invalid_msg: "السعر الاضافى يجب أن يكون رقم",
        bound_msg: None,
    },
    FieldSpec {
        name: "installment_amount",
        label: "قيمة القسط",
        kind: FieldKind::Money,
        required: false,
        required_msg: None,
        invalid_msg: "قيمة القسط يجب أن تكون رقم",
        bound_msg: None,
    },
    FieldSpec {
        name: "number_of_installments",
        label: "عدد الدفعات",
        kind: FieldKind::Integer { min: 1 },
        required: true,
        required_msg: Some("عدد الدفعات مطلوب"),
        invalid_msg: "عدد الدفعات يجب أن يكون رقماً صحيحاً",
        bound_msg: Some("عدد الدفعات يجب أن يكون رقماً صحيحاً"),
    },
    FieldSpec {
        name: "start_date",
        label: "تاريخ البدء",
        kind: FieldKind::Date,
        required: true,
        required_msg: Some("تاريخ بدء القرض مطلوب"),
        invalid_msg: "تاريخ غير صالح",
        bound_msg: None,
    },
    FieldSpec {
        name: "legal_case_details",
        label: "اتعاب محاماه",
        kind: FieldKind::Text { min_len: 0 },
        required: false,
        required_msg: None,
        invalid_msg: "اتعاب محاماه غير صالحة",
        bound_msg: None,
    },
    FieldSpec {
        name: "notes",
        label: "ملاحظات",
        kind: FieldKind::Text { min_len: 0 },
        required: false,
        required_msg: None,
        invalid_msg: "الملاحظات غير صالحة",
        bound_msg: None,
    },
];

pub static PAYMENT_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        name: "customer_id",
        label: "رقم العميل",
        kind: FieldKind::SequenceId,
        required: true,
        required_msg: Some("رقم العميل مطلوب"),
        invalid_msg: "رقم العميل يجب أن يكون رقم",
        bound_msg: None,
    },
    FieldSpec {
        name: "transaction_id",
        label: "رقم البيع",
        kind: FieldKind::SequenceId,
        required: true,
        required_msg: Some("رقم المعاملة مطلوب"),
        invalid_msg: "رقم المعاملة يجب أن يكون رقم",
        bound_msg: None,
    },
    FieldSpec {
        name: "amount",
        label: "قيمة الدفعة",
        kind: FieldKind::Money,
        required: true,
        required_msg: Some("قيمة الدفعة مطلوبة"),
        invalid_msg: "قيمة الدفعة يجب أن تكون رقم",
        bound_msg: Some("قيمة الدفعة يجب أن تكون أكبر من صفر"),
    },
    FieldSpec {
        name: "payment_date",
        label: "تاريخ الدفعة",
        kind: FieldKind::Date,
        required: true,
        required_msg: Some("تاريخ الدفعة مطلوب"),
        invalid_msg: "تاريخ غير صالح",
        bound_msg: None,
    },
    FieldSpec {
        name: "balance_before",
        label: "الدين المستحق",
        kind: FieldKind::Money,
        required: false,
        required_msg: None,
        invalid_msg: "الدين المستحق يجب أن يكون رقم",
        bound_msg: None,
    },
    FieldSpec {
        name: "balance_after",
        label: "المتبقى",
        kind: FieldKind::Money,
        required: false,
        required_msg: None,
        invalid_msg: "المتبقى يجب أن يكون رقم",
        bound_msg: None,
    },
    FieldSpec {
        name: "notes",
        label: "ملاحظات",
        kind: FieldKind::Text { min_len: 0 },
        required: false,
        required_msg: None,
        invalid_msg: "الملاحظات غير صالحة",
        bound_msg: None,
    },
];

/// The field table for a target.
pub fn fields(target: ImportTarget) -> &'static [FieldSpec] {
    match target {
        ImportTarget::Customer => CUSTOMER_FIELDS,
        ImportTarget::Transaction => TRANSACTION_FIELDS,
        ImportTarget::Payment => PAYMENT_FIELDS,
    }
}

pub fn field(target: ImportTarget, name: &str) -> Option<&'static FieldSpec> {
    fields(target).iter().find(|f| f.name == name)
}

/// Wire descriptors for the mapping UI.
pub fn descriptors(target: ImportTarget) -> Vec<FieldDescriptor> {
    fields(target)
        .iter()
        .map(|f| FieldDescriptor {
            name: f.name.to_string(),
            label: f.label.to_string(),
            required: f.required,
        })
        .collect()
}

/// Labels of required fields that no spreadsheet header is mapped to.
pub fn missing_required_labels<'a, I>(target: ImportTarget, mapped_fields: I) -> Vec<String>
where
    I: Iterator<Item = &'a str> + Clone,
{
    fields(target)
        .iter()
        .filter(|f| f.required && !mapped_fields.clone().any(|m| m == f.name))
        .map(|f| f.label.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_required_field_has_a_required_message() {
        for target in [
            ImportTarget::Customer,
            ImportTarget::Transaction,
            ImportTarget::Payment,
        ] {
            for spec in fields(target) {
                if spec.required {
                    assert!(
                        spec.required_msg.is_some(),
                        "{} / {} is required but has no message",
                        target.as_str(),
                        spec.name
                    );
                }
            }
        }
    }

    #[test]
    fn missing_required_labels_reports_unmapped_fields() {
        let mapped = ["sequence_number", "full_name"];
        let missing =
            missing_required_labels(ImportTarget::Customer, mapped.iter().copied());
        assert_eq!(missing, vec!["رقم الهاتف".to_string()]);
    }

    #[test]
    fn complete_mapping_has_no_missing_labels() {
        let mapped = ["sequence_number", "full_name", "mobile_number"];
        let missing =
            missing_required_labels(ImportTarget::Customer, mapped.iter().copied());
        assert!(missing.is_empty());
    }

    #[test]
    fn phone_pattern_accepts_international_prefix() {
        assert!(PHONE_RE.is_match("+96599887766"));
        assert!(PHONE_RE.is_match("99887766"));
        assert!(!PHONE_RE.is_match("99-887"));
        assert!(!PHONE_RE.is_match("1234567"));
    }
}
