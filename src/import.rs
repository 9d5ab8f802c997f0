//! Bulk import from spreadsheets
//!
//! The first worksheet is read with calamine; its first row holds the column
//! headers. Each later row is upserted as an asset keyed by `자산번호`. Department
//! labels are resolved and committed as the batch goes, so later rows reuse the
//! nodes earlier rows created. Rows are independent: a failure stops the batch but
//! leaves already processed rows in place.

use std::collections::HashMap;
use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{DatabaseConnection, EntityTrait, Set};
use serde::Serialize;

use crate::department_path::DepartmentResolver;
use crate::entity::asset::{self, AssetStatus};
use crate::error::{AppError, AppResult};

/// Column headers
pub mod column {
    pub const ASSET_CODE: &str = "자산번호";
    pub const ASSET_NAME: &str = "자산명";
    pub const DEPARTMENT: &str = "소속";
    pub const OWNER_NAME: &str = "소유자";
    pub const OWNER_ID: &str = "사번";
    pub const MANAGER_ID: &str = "관리자사번";
    pub const MANAGER_NAME: &str = "관리자";
    pub const STATUS: &str = "상태";
    pub const DESCRIPTION: &str = "설명";
}

pub const DEFAULT_ASSET_NAME: &str = "무명자산";
pub const UNKNOWN_ID: &str = "UNKNOWN";
pub const UNCONFIRMED_NAME: &str = "미확인";

/// One spreadsheet cell
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Empty,
}

impl CellValue {
    /// Cell as trimmed text; None when empty. Whole numbers lose their fraction.
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Text(s) => {
                let s = s.trim();
                if s.is_empty() {
                    None
                } else {
                    Some(s.to_string())
                }
            }
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    Some(format!("{}", *n as i64))
                } else {
                    Some(n.to_string())
                }
            }
            CellValue::Empty => None,
        }
    }
}

impl From<&Data> for CellValue {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => CellValue::Empty,
            Data::String(s) => CellValue::Text(s.clone()),
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Float(f) => CellValue::Number(*f),
            Data::Bool(b) => CellValue::Text(b.to_string()),
            other => CellValue::Text(other.to_string()),
        }
    }
}

/// A data row: header name to cell
#[derive(Debug, Clone, Default)]
pub struct SheetRow {
    cells: HashMap<String, CellValue>,
}

impl SheetRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, header: &str, value: CellValue) -> Self {
        self.insert(header, value);
        self
    }

    pub fn insert(&mut self, header: &str, value: CellValue) {
        self.cells.insert(header.trim().to_string(), value);
    }

    /// Text of a column, None if the column is missing or blank
    pub fn text(&self, header: &str) -> Option<String> {
        self.cells.get(header).and_then(CellValue::as_text)
    }
}

/// Parse the first worksheet of an xlsx/xls/ods workbook
pub fn read_workbook(bytes: Vec<u8>) -> AppResult<Vec<SheetRow>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| AppError::Spreadsheet(e.to_string()))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| AppError::Spreadsheet("엑셀 파일에 시트가 없습니다.".to_string()))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| AppError::Spreadsheet(e.to_string()))?;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(header_row) => header_row
            .iter()
            .map(|c| CellValue::from(c).as_text().unwrap_or_default())
            .collect(),
        None => return Ok(Vec::new()),
    };

    let mut result = Vec::new();
    for cells in rows {
        let mut row = SheetRow::new();
        let mut blank = true;
        for (header, cell) in headers.iter().zip(cells.iter()) {
            if header.is_empty() {
                continue;
            }
            let value = CellValue::from(cell);
            if value.as_text().is_some() {
                blank = false;
            }
            row.insert(header, value);
        }
        if !blank {
            result.push(row);
        }
    }

    tracing::debug!("Read {} data rows from sheet {}", result.len(), sheet_name);
    Ok(result)
}

/// Asset fields extracted from one row
#[derive(Debug, Clone, PartialEq)]
pub struct ImportRecord {
    pub asset_code: String,
    pub asset_name: String,
    pub department: Option<String>,
    pub owner_id: String,
    pub owner_name: String,
    pub manager_id: Option<String>,
    pub manager_name: Option<String>,
    pub status: Option<AssetStatus>,
    pub description: Option<String>,
}

impl ImportRecord {
    /// None when the row has no asset code; such rows are skipped
    pub fn from_row(row: &SheetRow) -> Option<Self> {
        let asset_code = row.text(column::ASSET_CODE)?;
        Some(Self {
            asset_code,
            asset_name: row
                .text(column::ASSET_NAME)
                .unwrap_or_else(|| DEFAULT_ASSET_NAME.to_string()),
            department: row.text(column::DEPARTMENT),
            owner_id: row
                .text(column::OWNER_ID)
                .unwrap_or_else(|| UNKNOWN_ID.to_string()),
            owner_name: row
                .text(column::OWNER_NAME)
                .unwrap_or_else(|| UNCONFIRMED_NAME.to_string()),
            manager_id: row.text(column::MANAGER_ID),
            manager_name: row.text(column::MANAGER_NAME),
            status: row
                .text(column::STATUS)
                .and_then(|s| AssetStatus::parse(&s)),
            description: row.text(column::DESCRIPTION),
        })
    }
}

/// Outcome counters of an import
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    /// Asset rows created or updated
    pub processed: usize,
    /// Department nodes created
    pub created_departments: usize,
    /// Rows without an asset code
    pub skipped: usize,
}

impl ImportSummary {
    pub fn message(&self) -> String {
        format!("{}개의 자산이 처리되었습니다. (신규/갱신 포함)", self.processed)
    }
}

/// An import that stopped part way
#[derive(Debug)]
pub struct ImportFailure {
    /// Counters up to the failing row
    pub summary: ImportSummary,
    /// Spreadsheet row number (header = 1) that failed
    pub row: usize,
    pub error: AppError,
}

impl std::fmt::Display for ImportFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "row {}: {}", self.row, self.error)
    }
}

/// Import rows in order, stopping at the first failure
pub async fn import_rows(
    db: &DatabaseConnection,
    rows: &[SheetRow],
) -> Result<ImportSummary, ImportFailure> {
    let mut resolver = DepartmentResolver::new();
    let mut summary = ImportSummary::default();

    for (index, row) in rows.iter().enumerate() {
        let Some(record) = ImportRecord::from_row(row) else {
            summary.skipped += 1;
            continue;
        };

        if let Err(error) = import_record(db, &mut resolver, record).await {
            summary.created_departments = resolver.created();
            return Err(ImportFailure {
                summary,
                row: index + 2,
                error,
            });
        }
        summary.processed += 1;
    }

    summary.created_departments = resolver.created();
    tracing::info!(
        "Import finished: {} assets, {} departments created, {} rows skipped",
        summary.processed,
        summary.created_departments,
        summary.skipped
    );
    Ok(summary)
}

/// Create or update one asset keyed by its code.
///
/// A single `INSERT .. ON CONFLICT (asset_code) DO UPDATE`, so concurrent imports of
/// the same code both succeed. Name, department and owner are always overwritten;
/// manager, status and description only when the row carries them.
async fn import_record(
    db: &DatabaseConnection,
    resolver: &mut DepartmentResolver,
    record: ImportRecord,
) -> AppResult<()> {
    // Resolved on the pool, outside any transaction: nodes commit immediately.
    let department_id = match record.department.as_deref() {
        Some(label) => resolver.resolve(db, label).await?,
        None => None,
    };

    let mut on_conflict = OnConflict::column(asset::Column::AssetCode);
    on_conflict.update_columns([
        asset::Column::AssetName,
        asset::Column::DepartmentId,
        asset::Column::OwnerId,
        asset::Column::OwnerName,
        asset::Column::UpdatedAt,
    ]);
    if record.manager_id.is_some() {
        on_conflict.update_column(asset::Column::ManagerId);
    }
    if record.manager_name.is_some() {
        on_conflict.update_column(asset::Column::ManagerName);
    }
    if record.status.is_some() {
        on_conflict.update_column(asset::Column::Status);
    }
    if record.description.is_some() {
        on_conflict.update_column(asset::Column::Description);
    }

    let now = Utc::now();
    let model = asset::ActiveModel {
        asset_code: Set(record.asset_code),
        asset_name: Set(record.asset_name),
        owner_id: Set(record.owner_id),
        owner_name: Set(record.owner_name),
        manager_id: Set(record.manager_id.unwrap_or_else(|| UNKNOWN_ID.to_string())),
        manager_name: Set(record
            .manager_name
            .unwrap_or_else(|| UNCONFIRMED_NAME.to_string())),
        description: Set(record.description),
        qr_url: Set(None),
        status: Set(record.status.unwrap_or_default().as_str().to_string()),
        department_id: Set(department_id),
        deleted_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    asset::Entity::insert(model)
        .on_conflict(on_conflict.to_owned())
        .exec_without_returning(db)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_text() {
        assert_eq!(CellValue::Number(12345.0).as_text().as_deref(), Some("12345"));
        assert_eq!(CellValue::Number(1.5).as_text().as_deref(), Some("1.5"));
        assert_eq!(CellValue::Text("  IT  ".to_string()).as_text().as_deref(), Some("IT"));
        assert_eq!(CellValue::Text("   ".to_string()).as_text(), None);
        assert_eq!(CellValue::Empty.as_text(), None);
    }

    #[test]
    fn test_record_defaults() {
        let row = SheetRow::new().with(column::ASSET_CODE, CellValue::Number(1001.0));
        let record = ImportRecord::from_row(&row).unwrap();
        assert_eq!(record.asset_code, "1001");
        assert_eq!(record.asset_name, DEFAULT_ASSET_NAME);
        assert_eq!(record.owner_id, UNKNOWN_ID);
        assert_eq!(record.owner_name, UNCONFIRMED_NAME);
        assert_eq!(record.department, None);
        assert_eq!(record.status, None);
    }

    #[test]
    fn test_record_without_code_is_skipped() {
        let row = SheetRow::new()
            .with(column::ASSET_CODE, CellValue::Text(" ".to_string()))
            .with(column::ASSET_NAME, CellValue::Text("노트북".to_string()));
        assert!(ImportRecord::from_row(&row).is_none());
    }

    #[test]
    fn test_record_optional_columns() {
        let row = SheetRow::new()
            .with(column::ASSET_CODE, CellValue::Text("NB-001".to_string()))
            .with(column::OWNER_ID, CellValue::Number(20240001.0))
            .with(column::STATUS, CellValue::Text("repair".to_string()))
            .with(column::MANAGER_NAME, CellValue::Text("김관리".to_string()));
        let record = ImportRecord::from_row(&row).unwrap();
        assert_eq!(record.owner_id, "20240001");
        assert_eq!(record.status, Some(AssetStatus::Repair));
        assert_eq!(record.manager_name.as_deref(), Some("김관리"));
        assert_eq!(record.manager_id, None);
    }

    #[test]
    fn test_summary_message() {
        let summary = ImportSummary {
            processed: 3,
            ..Default::default()
        };
        assert_eq!(summary.message(), "3개의 자산이 처리되었습니다. (신규/갱신 포함)");
    }

    /// Minimal xlsx package with one inline-string worksheet
    fn build_xlsx(sheet_rows: &str) -> Vec<u8> {
        use std::io::Write;

        let parts = [
            (
                "[Content_Types].xml",
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#.to_string(),
            ),
            (
                "_rels/.rels",
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#.to_string(),
            ),
            (
                "xl/workbook.xml",
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="자산" sheetId="1" r:id="rId1"/></sheets></workbook>"#.to_string(),
            ),
            (
                "xl/_rels/workbook.xml.rels",
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#.to_string(),
            ),
            (
                "xl/worksheets/sheet1.xml",
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{}</sheetData></worksheet>"#,
                    sheet_rows
                ),
            ),
        ];

        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options: zip::write::FileOptions<()> = zip::write::FileOptions::default()
            .compression_method(zip::CompressionMethod::Stored);
        for (name, body) in parts {
            zip.start_file(name, options.clone()).unwrap();
            zip.write_all(body.as_bytes()).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    fn text_cell(cell: &str, value: &str) -> String {
        format!(r#"<c r="{}" t="inlineStr"><is><t>{}</t></is></c>"#, cell, value)
    }

    fn number_cell(cell: &str, value: &str) -> String {
        format!(r#"<c r="{}"><v>{}</v></c>"#, cell, value)
    }

    #[test]
    fn test_read_workbook() {
        let sheet = [
            format!(
                r#"<row r="1">{}{}{}</row>"#,
                text_cell("A1", column::ASSET_CODE),
                text_cell("B1", column::ASSET_NAME),
                text_cell("C1", column::OWNER_ID)
            ),
            format!(
                r#"<row r="2">{}{}{}</row>"#,
                text_cell("A2", "NB-001"),
                text_cell("B2", "노트북"),
                number_cell("C2", "20240001")
            ),
            format!(r#"<row r="3">{}</row>"#, text_cell("B3", "  ")),
            format!(
                r#"<row r="5">{}{}</row>"#,
                number_cell("A5", "1001"),
                text_cell("B5", "모니터")
            ),
        ]
        .concat();

        let rows = read_workbook(build_xlsx(&sheet)).unwrap();

        // The whitespace-only row and the missing row 4 are dropped
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].text(column::ASSET_CODE).as_deref(), Some("NB-001"));
        assert_eq!(rows[0].text(column::OWNER_ID).as_deref(), Some("20240001"));
        assert_eq!(rows[1].text(column::ASSET_CODE).as_deref(), Some("1001"));
        assert_eq!(rows[1].text(column::ASSET_NAME).as_deref(), Some("모니터"));
        assert_eq!(rows[1].text(column::OWNER_ID), None);
    }

    #[test]
    fn test_read_workbook_header_only() {
        let sheet = format!(r#"<row r="1">{}</row>"#, text_cell("A1", column::ASSET_CODE));
        let rows = read_workbook(build_xlsx(&sheet)).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_read_workbook_rejects_garbage() {
        let result = read_workbook(b"not a workbook".to_vec());
        assert!(matches!(result, Err(AppError::Spreadsheet(_))));
    }
}
