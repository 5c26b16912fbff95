//! Cell coercion
//!
//! Maps the sheet's raw cells onto the destination fields of a target and
//! coerces each one to its typed value. Coercion never aborts a row; fields
//! that cannot be coerced are recorded and reported by the validator.

use std::collections::{HashMap, HashSet};

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;

use crate::services::schema::{self, FieldKind};
use crate::services::sheet::{CellValue, RawRow, Sheet};
use crate::types::ImportTarget;

/// A coerced cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Int(i64),
    Money(Decimal),
    Date(NaiveDate),
    Text(String),
}

impl FieldValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            FieldValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_money(&self) -> Option<Decimal> {
        match self {
            FieldValue::Money(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            FieldValue::Date(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(v) => Some(v),
            _ => None,
        }
    }
}

/// A row after coercion, keyed by destination field name.
#[derive(Debug, Clone)]
pub struct NormalizedRow {
    /// 0-based position within the sheet's data rows
    pub index: usize,
    pub values: HashMap<&'static str, FieldValue>,
    /// Fields whose cell was present but could not be coerced
    pub invalid: HashSet<&'static str>,
}

impl NormalizedRow {
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.values.get(field)
    }
}

/// Coerces one raw row into typed destination fields.
///
/// Headers are walked in sheet order so that two headers mapped to the same
/// field resolve deterministically (first non-empty value wins).
pub fn normalize_row(
    sheet: &Sheet,
    index: usize,
    row: &RawRow,
    target: ImportTarget,
    mappings: &HashMap<String, String>,
) -> NormalizedRow {
    let mut values = HashMap::new();
    let mut invalid = HashSet::new();

    for header in &sheet.headers {
        let Some(field_name) = mappings.get(header) else {
            continue;
        };
        let Some(spec) = schema::field(target, field_name) else {
            continue;
        };
        if values.contains_key(spec.name) || invalid.contains(spec.name) {
            continue;
        }
        let cell = row.get(header);
        if cell.is_empty() {
            continue;
        }
        match coerce(cell, spec.kind) {
            Some(value) => {
                values.insert(spec.name, value);
            }
            None => {
                invalid.insert(spec.name);
            }
        }
    }

    NormalizedRow {
        index,
        values,
        invalid,
    }
}

fn coerce(cell: &CellValue, kind: FieldKind) -> Option<FieldValue> {
    match kind {
        FieldKind::SequenceId | FieldKind::Integer { .. } => coerce_int(cell).map(FieldValue::Int),
        FieldKind::Money => coerce_money(cell).map(FieldValue::Money),
        FieldKind::Date => coerce_date(cell).map(FieldValue::Date),
        FieldKind::Text { .. } | FieldKind::Phone => coerce_text(cell).map(FieldValue::Text),
    }
}

fn coerce_int(cell: &CellValue) -> Option<i64> {
    match cell {
        CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 9.2e18 => Some(*n as i64),
        CellValue::Text(s) => s.trim().replace(',', "").parse::<i64>().ok(),
        _ => None,
    }
}

fn coerce_money(cell: &CellValue) -> Option<Decimal> {
    match cell {
        CellValue::Number(n) => Decimal::try_from(*n).ok(),
        CellValue::Text(s) => s.trim().replace(',', "").parse::<Decimal>().ok(),
        _ => None,
    }
}

/// Excel serial dates count days from this epoch (the 1900 date system,
/// including its leap-year quirk).
const EXCEL_EPOCH: (i32, u32, u32) = (1899, 12, 30);

// Serial numbers outside this window are almost certainly not dates.
const SERIAL_MIN: f64 = 1.0;
const SERIAL_MAX: f64 = 200_000.0;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%d.%m.%Y", "%d-%m-%Y", "%Y/%m/%d"];

fn coerce_date(cell: &CellValue) -> Option<NaiveDate> {
    match cell {
        CellValue::Number(n) => serial_to_date(*n),
        CellValue::Text(s) => {
            let trimmed = s.trim();
            // A cell that is purely numeric text is a serial that survived a
            // text export; an already-formatted date never parses as f64, so
            // re-importing exported data stays stable.
            if let Ok(serial) = trimmed.parse::<f64>() {
                return serial_to_date(serial);
            }
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        }
        _ => None,
    }
}

fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !(SERIAL_MIN..=SERIAL_MAX).contains(&serial) {
        return None;
    }
    let (y, m, d) = EXCEL_EPOCH;
    let epoch = NaiveDate::from_ymd_opt(y, m, d)?;
    epoch.checked_add_signed(Duration::days(serial.trunc() as i64))
}

fn coerce_text(cell: &CellValue) -> Option<String> {
    match cell {
        CellValue::Text(s) => Some(s.trim().to_string()),
        CellValue::Number(n) => {
            if n.fract() == 0.0 && n.abs() < 1e15 {
                Some(format!("{}", *n as i64))
            } else {
                Some(n.to_string())
            }
        }
        CellValue::Bool(b) => Some(b.to_string()),
        CellValue::Empty => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn excel_serial_dates_resolve_against_the_1900_epoch() {
        // 45292 is 2024-01-01 in the 1900 date system
        assert_eq!(
            coerce_date(&CellValue::Number(45292.0)),
            Some(date(2024, 1, 1))
        );
        // Time-of-day fraction is dropped
        assert_eq!(
            coerce_date(&CellValue::Number(45292.75)),
            Some(date(2024, 1, 1))
        );
    }

    #[test]
    fn serial_dates_survive_a_text_export() {
        assert_eq!(
            coerce_date(&CellValue::Text("45292".to_string())),
            Some(date(2024, 1, 1))
        );
    }

    #[test]
    fn formatted_dates_parse_with_common_layouts() {
        for raw in ["2024-03-15", "15/03/2024", "15.03.2024", "15-03-2024", "2024/03/15"] {
            assert_eq!(
                coerce_date(&CellValue::Text(raw.to_string())),
                Some(date(2024, 3, 15)),
                "failed for {raw}"
            );
        }
    }

    #[test]
    fn iso_dates_are_not_mistaken_for_serials() {
        // Re-normalizing an already-normalized date must not shift it
        let once = coerce_date(&CellValue::Text("2024-03-15".to_string())).unwrap();
        let twice = coerce_date(&CellValue::Text(once.to_string())).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn out_of_range_serials_are_rejected() {
        assert_eq!(coerce_date(&CellValue::Number(0.0)), None);
        assert_eq!(coerce_date(&CellValue::Number(3_000_000.0)), None);
    }

    #[test]
    fn money_accepts_thousands_separators() {
        assert_eq!(
            coerce_money(&CellValue::Text("1,250.500".to_string())),
            Some(Decimal::new(1_250_500, 3))
        );
        assert_eq!(
            coerce_money(&CellValue::Number(99.5)),
            Some(Decimal::new(995, 1))
        );
        assert_eq!(coerce_money(&CellValue::Text("abc".to_string())), None);
    }

    #[test]
    fn ints_reject_fractions() {
        assert_eq!(coerce_int(&CellValue::Number(12.0)), Some(12));
        assert_eq!(coerce_int(&CellValue::Number(12.5)), None);
        assert_eq!(coerce_int(&CellValue::Text(" 1,200 ".to_string())), Some(1200));
    }

    #[test]
    fn normalize_row_records_invalid_fields_without_aborting() {
        use std::collections::HashMap;

        let sheet = crate::services::sheet::read_workbook(
            "كود,الاسم الكامل,رقم الهاتف\nليس رقم,أحمد,99887766\n".as_bytes(),
        )
        .unwrap();
        let sheet = &sheet.sheets[0];
        let mappings: HashMap<String, String> = [
            ("كود".to_string(), "sequence_number".to_string()),
            ("الاسم الكامل".to_string(), "full_name".to_string()),
            ("رقم الهاتف".to_string(), "mobile_number".to_string()),
        ]
        .into();

        let row = normalize_row(sheet, 0, &sheet.rows[0], ImportTarget::Customer, &mappings);
        assert!(row.invalid.contains("sequence_number"));
        assert_eq!(
            row.get("full_name").and_then(|v| v.as_text()),
            Some("أحمد")
        );
        assert_eq!(
            row.get("mobile_number").and_then(|v| v.as_text()),
            Some("99887766")
        );
    }
}
