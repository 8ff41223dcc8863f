use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use super::*;
use crate::prelude::NaiveDate;
use crate::storage::create_file_parent;
use columns::*;
use tracing::info;

const EXPORT_DIR: &str = "./import_export";

/// Builds the "Organizations" and "Contacts" sheets.
pub fn export_workbook(organizations: &[Organization], contacts: &[Contact]) -> Workbook {
    let org_names: HashMap<&str, &str> = organizations
        .iter()
        .map(|org| (org.id.as_str(), org.name.as_str()))
        .collect();

    let mut org_sheet = Sheet::new(ORGANIZATIONS_SHEET, &ORGANIZATION_COLUMNS);
    for org in organizations {
        org_sheet.push_row(to_row(&[
            (ID, org.id.clone()),
            (NAME, org.name.clone()),
            (WEBSITE, org.website.clone()),
            (
                WEBSITE_STATUS,
                org.website_status
                    .map(|status| status.to_string())
                    .unwrap_or_default(),
            ),
            (LINKEDIN_URL, org.linkedin_url.clone().unwrap_or_default()),
            (COUNTRY_REGION, org.country_region.clone()),
            (EMAIL, org.email.clone()),
            (CATEGORY, org.category.to_string()),
            (STATUS, org.status.to_string()),
            (NOTES, org.notes.clone().unwrap_or_default()),
            (CUSTOM_FIELDS, encode_custom_fields(org.custom_fields.as_ref())),
            (CREATED_AT, helper::format_timestamp(&org.created_at)),
            (UPDATED_AT, helper::format_timestamp(&org.updated_at)),
        ]));
    }

    let mut contact_sheet = Sheet::new(CONTACTS_SHEET, &CONTACT_COLUMNS);
    for contact in contacts {
        let org_name = org_names
            .get(contact.organization_id.as_str())
            .copied()
            .unwrap_or_default();

        contact_sheet.push_row(to_row(&[
            (ID, contact.id.clone()),
            (ORGANIZATION_NAME, org_name.to_string()),
            (ORGANIZATION_ID, contact.organization_id.clone()),
            (NAME, contact.name.clone()),
            (ROLE_POSITION, contact.role_position.clone()),
            (EMAIL, contact.email.clone()),
            (PREFERRED_LANGUAGE, contact.preferred_language.to_string()),
            (NOTES, contact.notes.clone()),
            (CUSTOM_FIELDS, encode_custom_fields(contact.custom_fields.as_ref())),
            (CREATED_AT, helper::format_timestamp(&contact.created_at)),
            (UPDATED_AT, helper::format_timestamp(&contact.updated_at)),
        ]));
    }

    let mut workbook = Workbook::new();
    workbook.add_sheet(org_sheet);
    workbook.add_sheet(contact_sheet);
    workbook
}

/// `crm-export-YYYY-MM-DD.<extension>`
pub fn export_file_name(date: NaiveDate, extension: &str) -> String {
    format!("crm-export-{}.{}", date.format("%Y-%m-%d"), extension)
}

/// Writes an exported document and returns where it went.
///
/// With no destination, or a directory, the dated file name is used. An
/// explicit file must carry the codec's extension.
pub fn write_export(
    bytes: &[u8],
    des: Option<&str>,
    date: NaiveDate,
    extension: &str,
) -> Result<PathBuf, AppError> {
    let file_name = export_file_name(date, extension);
    let mut file_path = PathBuf::from(EXPORT_DIR).join(&file_name);

    if let Some(path) = des {
        file_path = PathBuf::from(path);

        if file_path.is_dir() {
            file_path = file_path.join(&file_name);
        } else if file_path
            .extension()
            .is_none_or(|ext| !ext.eq_ignore_ascii_case(extension))
        {
            return Err(AppError::Validation(format!(
                "Export file must be a .{} file",
                extension
            )));
        }
    }

    create_file_parent(&file_path.to_string_lossy())?;
    fs::write(&file_path, bytes)?;

    info!(path = %file_path.display(), bytes = bytes.len(), "export written");
    Ok(file_path)
}

fn to_row(cells: &[(&str, String)]) -> Row {
    cells
        .iter()
        .map(|(column, value)| (column.to_string(), value.clone()))
        .collect()
}
