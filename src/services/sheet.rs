//! Spreadsheet reading
//!
//! Turns an uploaded file (xlsx/xls/ods or delimited text) into sheets of
//! header-keyed rows. Binary workbooks go through calamine; anything that is
//! valid UTF-8 text falls back to the csv reader.

use std::collections::HashMap;
use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::types::BlankCells;

#[derive(Debug, Error)]
pub enum SheetError {
    #[error("فشل قراءة ملف الإكسل")]
    Unreadable,
    #[error("لم يتم العثور على ورقة العمل \"{0}\"")]
    SheetNotFound(String),
}

/// A single cell, already collapsed to the shapes the importer cares about.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Bool(bool),
    Empty,
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

/// One data row, keyed by the sheet's header strings.
#[derive(Debug, Clone, Default)]
pub struct RawRow {
    pub cells: HashMap<String, CellValue>,
}

impl RawRow {
    pub fn get(&self, header: &str) -> &CellValue {
        self.cells.get(header).unwrap_or(&CellValue::Empty)
    }

    pub fn is_blank(&self) -> bool {
        self.cells.values().all(|c| c.is_empty())
    }
}

#[derive(Debug, Clone)]
pub struct Sheet {
    pub name: String,
    /// Headers in sheet order, trimmed, blanks dropped
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

#[derive(Debug, Clone, Default)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name.clone()).collect()
    }

    /// Returns the named sheet, or the first one when no name is given.
    pub fn sheet(&self, name: Option<&str>) -> Result<&Sheet, SheetError> {
        match name {
            Some(n) => self
                .sheets
                .iter()
                .find(|s| s.name == n)
                .ok_or_else(|| SheetError::SheetNotFound(n.to_string())),
            None => self.sheets.first().ok_or(SheetError::Unreadable),
        }
    }
}

/// Parses an uploaded file into a [`Workbook`].
pub fn read_workbook(bytes: &[u8]) -> Result<Workbook, SheetError> {
    match open_workbook_auto_from_rs(Cursor::new(bytes.to_vec())) {
        Ok(mut workbook) => {
            let names = workbook.sheet_names().to_vec();
            let mut sheets = Vec::with_capacity(names.len());
            for name in names {
                let range = workbook
                    .worksheet_range(&name)
                    .map_err(|_| SheetError::Unreadable)?;
                sheets.push(sheet_from_rows(
                    name,
                    range.rows().map(|row| row.iter().map(cell_from_data).collect()),
                ));
            }
            if sheets.is_empty() {
                return Err(SheetError::Unreadable);
            }
            debug!(sheets = sheets.len(), "parsed workbook");
            Ok(Workbook { sheets })
        }
        // Not a recognized workbook container; try it as delimited text.
        Err(_) => read_delimited(bytes),
    }
}

fn read_delimited(bytes: &[u8]) -> Result<Workbook, SheetError> {
    let text = std::str::from_utf8(bytes).map_err(|_| SheetError::Unreadable)?;
    let delimiter = detect_delimiter(text);
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut rows: Vec<Vec<CellValue>> = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|_| SheetError::Unreadable)?;
        rows.push(record.iter().map(cell_from_text).collect());
    }
    if rows.is_empty() {
        return Err(SheetError::Unreadable);
    }
    Ok(Workbook {
        sheets: vec![sheet_from_rows("Sheet1".to_string(), rows.into_iter())],
    })
}

fn detect_delimiter(text: &str) -> u8 {
    let first_line = text.lines().next().unwrap_or("");
    let semicolons = first_line.matches(';').count();
    let commas = first_line.matches(',').count();
    if semicolons > commas {
        b';'
    } else {
        b','
    }
}

fn sheet_from_rows(name: String, mut rows: impl Iterator<Item = Vec<CellValue>>) -> Sheet {
    let header_cells = rows.next().unwrap_or_default();
    let mut headers = Vec::new();
    // Header position -> header string, skipping blank header cells
    let mut columns: Vec<(usize, String)> = Vec::new();
    for (idx, cell) in header_cells.iter().enumerate() {
        let title = match cell {
            CellValue::Text(s) => s.trim().to_string(),
            CellValue::Number(n) => trim_float(*n),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Empty => String::new(),
        };
        if title.is_empty() {
            continue;
        }
        if !headers.contains(&title) {
            headers.push(title.clone());
        }
        columns.push((idx, title));
    }

    let mut data_rows: Vec<RawRow> = Vec::new();
    for cells in rows {
        let mut row = RawRow::default();
        for (idx, title) in &columns {
            let value = cells.get(*idx).cloned().unwrap_or(CellValue::Empty);
            // Duplicate headers: first non-empty value wins
            match row.cells.get(title) {
                Some(existing) if !existing.is_empty() => {}
                _ => {
                    row.cells.insert(title.clone(), value);
                }
            }
        }
        data_rows.push(row);
    }
    // Trailing blank rows carry no data and would only inflate row numbers
    while data_rows.last().is_some_and(|r| r.is_blank()) {
        data_rows.pop();
    }

    Sheet {
        name,
        headers,
        rows: data_rows,
    }
}

fn cell_from_data(data: &Data) -> CellValue {
    match data {
        Data::String(s) => cell_from_text(s),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(_) | Data::Empty => CellValue::Empty,
    }
}

fn cell_from_text(text: &str) -> CellValue {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        CellValue::Empty
    } else {
        CellValue::Text(trimmed.to_string())
    }
}

/// Renders a whole-number float without the trailing `.0`.
fn trim_float(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Builds a bounded JSON preview of a sheet's rows.
pub fn preview_rows(
    sheet: &Sheet,
    limit: usize,
    blank_cells: BlankCells,
) -> Vec<Map<String, Value>> {
    sheet
        .rows
        .iter()
        .take(limit)
        .map(|row| {
            let mut out = Map::new();
            for header in &sheet.headers {
                let value = match row.get(header) {
                    CellValue::Text(s) => Value::String(s.clone()),
                    CellValue::Number(n) => serde_json::Number::from_f64(*n)
                        .map(Value::Number)
                        .unwrap_or(Value::Null),
                    CellValue::Bool(b) => Value::Bool(*b),
                    CellValue::Empty => match blank_cells {
                        BlankCells::EmptyString => Value::String(String::new()),
                        BlankCells::Null => Value::Null,
                    },
                };
                out.insert(header.clone(), value);
            }
            out
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn csv_sheet(text: &str) -> Sheet {
        let workbook = read_workbook(text.as_bytes()).unwrap();
        workbook.sheets.into_iter().next().unwrap()
    }

    #[test]
    fn parses_csv_with_headers() {
        let sheet = csv_sheet("كود,الاسم الكامل\n1,أحمد\n2,سارة\n");
        assert_eq!(sheet.headers, vec!["كود", "الاسم الكامل"]);
        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(
            sheet.rows[0].get("الاسم الكامل"),
            &CellValue::Text("أحمد".to_string())
        );
    }

    #[test]
    fn detects_semicolon_delimiter() {
        let sheet = csv_sheet("a;b\n1;2\n");
        assert_eq!(sheet.headers, vec!["a", "b"]);
        assert_eq!(sheet.rows[0].get("b"), &CellValue::Text("2".to_string()));
    }

    #[test]
    fn drops_trailing_blank_rows() {
        let sheet = csv_sheet("a,b\n1,2\n,\n,\n");
        assert_eq!(sheet.rows.len(), 1);
    }

    #[test]
    fn keeps_interior_blank_rows() {
        // An interior blank row still occupies a spreadsheet row number
        let sheet = csv_sheet("a,b\n1,2\n,\n3,4\n");
        assert_eq!(sheet.rows.len(), 3);
        assert!(sheet.rows[1].is_blank());
    }

    #[test]
    fn duplicate_header_first_nonempty_wins() {
        let sheet = csv_sheet("a,a\n,x\ny,z\n");
        assert_eq!(sheet.headers, vec!["a"]);
        assert_eq!(sheet.rows[0].get("a"), &CellValue::Text("x".to_string()));
        assert_eq!(sheet.rows[1].get("a"), &CellValue::Text("y".to_string()));
    }

    #[test]
    fn missing_sheet_is_reported_with_its_name() {
        let workbook = read_workbook("a\n1\n".as_bytes()).unwrap();
        let err = workbook.sheet(Some("مبيعات")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "لم يتم العثور على ورقة العمل \"مبيعات\""
        );
    }

    #[test]
    fn garbage_bytes_are_unreadable() {
        let err = read_workbook(&[0xff, 0xfe, 0x00, 0x01]).unwrap_err();
        assert!(matches!(err, SheetError::Unreadable));
    }

    #[test]
    fn preview_respects_limit_and_blank_policy() {
        let sheet = csv_sheet("a,b\n1,\n2,x\n3,y\n");
        let rows = preview_rows(&sheet, 2, BlankCells::Null);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["a"], Value::String("1".to_string()));
        assert_eq!(rows[0]["b"], Value::Null);

        let rows = preview_rows(&sheet, 2, BlankCells::EmptyString);
        assert_eq!(rows[0]["b"], Value::String(String::new()));
    }
}
