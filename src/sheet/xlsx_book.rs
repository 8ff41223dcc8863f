use std::io::Cursor;

use super::*;
use calamine::{Data, Reader, open_workbook_auto_from_rs};
use tracing::debug;

/// Excel workbook, one worksheet per sheet with the header in the first row.
///
/// Reads `.xlsx` and legacy `.xls`; always writes `.xlsx`. Every cell is
/// written as text so values come back exactly as exported.
#[derive(Debug, Clone, Copy, Default)]
pub struct XlsxCodec;

impl SheetCodec for XlsxCodec {
    fn parse(&self, bytes: &[u8]) -> Result<Workbook, AppError> {
        let mut book = open_workbook_auto_from_rs(Cursor::new(bytes))
            .map_err(|e| AppError::ImportFormat(format!("unreadable workbook: {}", e)))?;
        let mut workbook = Workbook::new();

        for name in book.sheet_names() {
            let range = book
                .worksheet_range(&name)
                .map_err(|e| AppError::ImportFormat(format!("unreadable sheet {}: {}", name, e)))?;

            let mut rows = range.rows();
            let columns: Vec<String> = rows
                .next()
                .map(|header| header.iter().map(|cell| cell_text(cell).trim().to_string()).collect())
                .unwrap_or_default();

            let mut sheet = Sheet {
                name,
                columns,
                rows: Vec::new(),
            };

            for cells in rows {
                if cells.iter().all(|cell| cell_text(cell).trim().is_empty()) {
                    continue;
                }

                let row: Row = sheet
                    .columns
                    .iter()
                    .zip(cells.iter())
                    .map(|(column, cell)| (column.clone(), cell_text(cell)))
                    .collect();
                sheet.push_row(row);
            }

            debug!(sheet = %sheet.name, rows = sheet.rows.len(), "read worksheet");
            workbook.add_sheet(sheet);
        }

        Ok(workbook)
    }

    fn serialize(&self, workbook: &Workbook) -> Result<Vec<u8>, AppError> {
        let mut book = rust_xlsxwriter::Workbook::new();

        for sheet in &workbook.sheets {
            let worksheet = book.add_worksheet();
            worksheet.set_name(&sheet.name)?;

            for (col, column) in sheet.columns.iter().enumerate() {
                worksheet.write_string(0, column_index(col)?, column)?;
            }
            for (index, row) in sheet.rows.iter().enumerate() {
                let line = u32::try_from(index + 1)
                    .map_err(|_| AppError::Validation("Too many rows for a worksheet".to_string()))?;
                for (col, cell) in sheet.ordered_cells(row).enumerate() {
                    if !cell.is_empty() {
                        worksheet.write_string(line, column_index(col)?, cell)?;
                    }
                }
            }
        }

        Ok(book.save_to_buffer()?)
    }

    fn extension(&self) -> &str {
        "xlsx"
    }
}

fn column_index(col: usize) -> Result<u16, AppError> {
    u16::try_from(col)
        .map_err(|_| AppError::Validation("Too many columns for a worksheet".to_string()))
}

// Workbooks edited by hand carry numbers and booleans as typed cells
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(text) => text.clone(),
        Data::Float(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
            format!("{}", *value as i64)
        }
        other => other.to_string(),
    }
}
