//! Import wire types

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Target table for an import
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportTarget {
    Customer,
    Transaction,
    Payment,
}

impl ImportTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportTarget::Customer => "customer",
            ImportTarget::Transaction => "transaction",
            ImportTarget::Payment => "payment",
        }
    }

    /// Arabic display label
    pub fn label(&self) -> &'static str {
        match self {
            ImportTarget::Customer => "العملاء",
            ImportTarget::Transaction => "المعاملات",
            ImportTarget::Payment => "الدفعات",
        }
    }
}

/// How blank cells are rendered in preview rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum BlankCells {
    /// Blank cells become `""`
    #[default]
    EmptyString,
    /// Blank cells become JSON `null`
    Null,
}

/// Request to preview the first rows of an uploaded spreadsheet
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewRequest {
    /// Base64-encoded file content
    pub file_content: String,
    pub file_name: Option<String>,
    /// Sheet to read; defaults to the first sheet
    pub sheet_name: Option<String>,
    /// Maximum rows to return; defaults to 10
    pub limit: Option<usize>,
    #[serde(default)]
    pub blank_cells: BlankCells,
}

/// Preview response: headers plus a bounded sample of rows
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetPreviewResponse {
    pub sheet_names: Vec<String>,
    pub sheet_name: String,
    pub headers: Vec<String>,
    pub rows: Vec<serde_json::Map<String, serde_json::Value>>,
    pub total_rows: usize,
}

/// Request to run a full import
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunImportRequest {
    /// Base64-encoded file content
    pub file_content: String,
    pub file_name: Option<String>,
    pub sheet_name: Option<String>,
    pub target: ImportTarget,
    /// Spreadsheet header -> destination field name
    pub mappings: HashMap<String, String>,
}

/// A rejected row and the reasons it was rejected
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedRow {
    /// 1-based spreadsheet row (header is row 1)
    pub row: i32,
    pub errors: Vec<String>,
}

/// Outcome of an import run
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ImportResult {
    pub success_count: usize,
    pub failed_rows: Vec<FailedRow>,
}

/// Request for the mappable fields of a target
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldsRequest {
    pub target: ImportTarget,
}

/// One mappable destination field
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub name: String,
    /// Arabic display label
    pub label: String,
    pub required: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldsResponse {
    pub target: ImportTarget,
    pub fields: Vec<FieldDescriptor>,
}

/// Request to delete previously imported rows
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteDataRequest {
    pub target: ImportTarget,
    /// Restrict the delete to rows imported within the last N hours
    pub newer_than_hours: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteDataResponse {
    pub target: ImportTarget,
    pub deleted: u64,
}
