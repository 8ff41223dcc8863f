use std::io::{Cursor, Read, Seek};
use std::path::Path;

use super::*;
use csv::{ReaderBuilder, Writer};
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const SHEET_EXTENSION: &str = ".csv";

/// Workbook stored as a zip archive holding one `<sheet name>.csv` per sheet.
///
/// The first CSV record is the header row. Rows that are entirely blank are
/// skipped on read.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvBundleCodec;

impl SheetCodec for CsvBundleCodec {
    fn parse(&self, bytes: &[u8]) -> Result<Workbook, AppError> {
        read_bundle(Cursor::new(bytes)).map_err(AppError::into_import_format)
    }

    fn serialize(&self, workbook: &Workbook) -> Result<Vec<u8>, AppError> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

        for sheet in &workbook.sheets {
            let options =
                SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
            zip.start_file(format!("{}{}", sheet.name, SHEET_EXTENSION), options)?;

            let mut writer = Writer::from_writer(&mut zip);
            writer.write_record(&sheet.columns)?;
            for row in &sheet.rows {
                writer.write_record(sheet.ordered_cells(row))?;
            }
            writer.flush()?;
        }

        Ok(zip.finish()?.into_inner())
    }

    fn extension(&self) -> &str {
        "zip"
    }
}

fn read_bundle<R: Read + Seek>(source: R) -> Result<Workbook, AppError> {
    let mut archive = ZipArchive::new(source)?;
    let mut workbook = Workbook::new();

    for index in 0..archive.len() {
        let entry = archive.by_index(index)?;
        if entry.is_dir() || !entry.name().ends_with(SHEET_EXTENSION) {
            continue;
        }

        let name = Path::new(entry.name())
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or_default()
            .to_string();

        let mut reader = ReaderBuilder::new().flexible(true).from_reader(entry);
        let columns: Vec<String> = reader
            .headers()?
            .iter()
            .map(|header| header.trim_start_matches('\u{feff}').trim().to_string())
            .collect();

        let mut sheet = Sheet {
            name,
            columns,
            rows: Vec::new(),
        };

        for record in reader.records() {
            let record = record?;
            if record.iter().all(|cell| cell.trim().is_empty()) {
                continue;
            }

            let row: Row = sheet
                .columns
                .iter()
                .zip(record.iter())
                .map(|(column, cell)| (column.clone(), cell.to_string()))
                .collect();
            sheet.push_row(row);
        }

        debug!(sheet = %sheet.name, rows = sheet.rows.len(), "read sheet");
        workbook.add_sheet(sheet);
    }

    Ok(workbook)
}
