use super::*;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Workbook stored as JSON:
/// `{"sheets":[{"name":..,"columns":[..],"rows":[{column: cell}]}]}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonWorkbookCodec;

#[derive(Serialize, Deserialize)]
struct JsonBook {
    sheets: Vec<JsonSheet>,
}

#[derive(Serialize, Deserialize)]
struct JsonSheet {
    name: String,
    #[serde(default)]
    columns: Vec<String>,
    #[serde(default)]
    rows: Vec<Map<String, Value>>,
}

impl SheetCodec for JsonWorkbookCodec {
    fn parse(&self, bytes: &[u8]) -> Result<Workbook, AppError> {
        let book: JsonBook =
            serde_json::from_slice(bytes).map_err(|e| AppError::from(e).into_import_format())?;

        let sheets = book
            .sheets
            .into_iter()
            .map(|sheet| {
                let rows: Vec<Row> = sheet
                    .rows
                    .into_iter()
                    .map(|cells| {
                        cells
                            .into_iter()
                            .map(|(column, value)| (column, cell_text(value)))
                            .collect()
                    })
                    .collect();

                // Hand-written books may leave out the column list
                let columns = if sheet.columns.is_empty() {
                    let mut seen: Vec<String> = Vec::new();
                    for column in rows.iter().flat_map(|row| row.keys()) {
                        if !seen.contains(column) {
                            seen.push(column.clone());
                        }
                    }
                    seen
                } else {
                    sheet.columns
                };

                Sheet {
                    name: sheet.name,
                    columns,
                    rows,
                }
            })
            .collect();

        Ok(Workbook { sheets })
    }

    fn serialize(&self, workbook: &Workbook) -> Result<Vec<u8>, AppError> {
        let book = JsonBook {
            sheets: workbook
                .sheets
                .iter()
                .map(|sheet| JsonSheet {
                    name: sheet.name.clone(),
                    columns: sheet.columns.clone(),
                    rows: sheet
                        .rows
                        .iter()
                        .map(|row| {
                            sheet
                                .columns
                                .iter()
                                .zip(sheet.ordered_cells(row))
                                .map(|(column, cell)| {
                                    (column.clone(), Value::String(cell.to_string()))
                                })
                                .collect()
                        })
                        .collect(),
                })
                .collect(),
        };

        Ok(serde_json::to_vec_pretty(&book)?)
    }

    fn extension(&self) -> &str {
        "json"
    }
}

fn cell_text(value: Value) -> String {
    match value {
        Value::String(text) => text,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_loose_cells() -> Result<(), AppError> {
        let json = br#"{"sheets":[{"name":"Organizations","rows":[
            {"ID":"1","Name":"Acme","Notes":null,"Employees":42}
        ]}]}"#;

        let workbook = JsonWorkbookCodec.parse(json)?;
        let sheet = workbook.require_sheet("Organizations")?;

        assert_eq!(sheet.columns.len(), 4);
        assert_eq!(sheet.rows[0]["Notes"], "");
        assert_eq!(sheet.rows[0]["Employees"], "42");
        Ok(())
    }

    #[test]
    fn serialized_book_reads_back() -> Result<(), AppError> {
        let mut sheet = Sheet::new("Contacts", &["ID", "Name"]);
        sheet.push_row([("ID".to_string(), "c1".to_string())].into_iter().collect());
        let workbook = Workbook { sheets: vec![sheet] };

        let parsed = JsonWorkbookCodec.parse(&JsonWorkbookCodec.serialize(&workbook)?)?;
        let contacts = parsed.require_sheet("Contacts")?;

        assert_eq!(contacts.columns, vec!["ID", "Name"]);
        assert_eq!(contacts.rows[0]["Name"], "");
        Ok(())
    }

    #[test]
    fn invalid_json_is_an_import_format_error() {
        assert!(matches!(
            JsonWorkbookCodec.parse(b"<xml/>"),
            Err(AppError::ImportFormat(_))
        ));
    }
}
