pub mod csv_bundle;
pub mod json_book;
pub mod xlsx_book;

use std::collections::HashMap;
use std::path::Path;

use crate::errors::AppError;

pub use csv_bundle::CsvBundleCodec;
pub use json_book::JsonWorkbookCodec;
pub use xlsx_book::XlsxCodec;

/// A row as column name to cell text.
pub type Row = HashMap<String, String>;

/// Reads and writes a workbook document.
pub trait SheetCodec: Send + Sync {
    fn parse(&self, bytes: &[u8]) -> Result<Workbook, AppError>;

    fn serialize(&self, workbook: &Workbook) -> Result<Vec<u8>, AppError>;

    /// File extension of serialized documents, without the dot.
    fn extension(&self) -> &str;
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_sheet(&mut self, sheet: Sheet) {
        self.sheets.push(sheet);
    }

    /// Sheet looked up by exact name.
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|sheet| sheet.name == name)
    }

    pub fn require_sheet(&self, name: &str) -> Result<&Sheet, AppError> {
        self.sheet(name)
            .ok_or_else(|| AppError::ImportFormat(format!("missing sheet \"{}\"", name)))
    }
}

impl Sheet {
    pub fn new(name: &str, columns: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Row) {
        self.rows.push(row);
    }

    /// Cells of `row` in column order; absent cells are empty.
    pub fn ordered_cells<'a>(&'a self, row: &'a Row) -> impl Iterator<Item = &'a str> + 'a {
        self.columns
            .iter()
            .map(move |column| row.get(column).map(String::as_str).unwrap_or(""))
    }
}

/// Codec by format name: `xlsx` (Excel), `zip` (CSV bundle) or `json`.
pub fn codec_for(format: &str) -> Result<Box<dyn SheetCodec>, AppError> {
    match format.trim().to_ascii_lowercase().as_str() {
        "xlsx" | "xls" | "excel" => Ok(Box::new(XlsxCodec)),
        "zip" | "csv" => Ok(Box::new(CsvBundleCodec)),
        "json" => Ok(Box::new(JsonWorkbookCodec)),
        other => Err(AppError::Validation(format!(
            "Unknown workbook format '{}', expected xlsx, zip or json",
            other
        ))),
    }
}

/// Codec matching a document's file extension. Unknown extensions are
/// tried as Excel workbooks.
pub fn codec_for_path(path: &Path) -> Box<dyn SheetCodec> {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "json" => Box::new(JsonWorkbookCodec),
        "zip" => Box::new(CsvBundleCodec),
        _ => Box::new(XlsxCodec),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sheets_are_found_by_exact_name() {
        let mut workbook = Workbook::new();
        workbook.add_sheet(Sheet::new("Organizations", &["ID"]));

        assert!(workbook.sheet("Organizations").is_some());
        assert!(workbook.sheet("organizations").is_none());
        assert!(matches!(
            workbook.require_sheet("Contacts"),
            Err(AppError::ImportFormat(_))
        ));
    }

    #[test]
    fn ordered_cells_fill_gaps() {
        let sheet = Sheet::new("S", &["A", "B", "C"]);
        let row: Row = [("C".to_string(), "3".to_string()), ("A".to_string(), "1".to_string())]
            .into_iter()
            .collect();

        assert_eq!(sheet.ordered_cells(&row).collect::<Vec<_>>(), vec!["1", "", "3"]);
    }

    #[test]
    fn picks_codecs() {
        assert_eq!(codec_for("ZIP").unwrap().extension(), "zip");
        assert_eq!(codec_for("json").unwrap().extension(), "json");
        assert_eq!(codec_for("xlsx").unwrap().extension(), "xlsx");
        assert!(codec_for("ods").is_err());
        assert_eq!(codec_for_path(Path::new("a/b.json")).extension(), "json");
        assert_eq!(codec_for_path(Path::new("export.zip")).extension(), "zip");
        assert_eq!(codec_for_path(Path::new("Export.XLSX")).extension(), "xlsx");
        assert_eq!(codec_for_path(Path::new("legacy.xls")).extension(), "xlsx");
    }
}
