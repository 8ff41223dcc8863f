use super::*;
use columns::{decode_contact, decode_organization};
use tracing::debug;

/// Records decoded from a workbook, in sheet row order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportedData {
    pub organizations: Vec<Organization>,
    pub contacts: Vec<Contact>,
}

/// Decodes both sheets. Fails with `ImportFormat` unless the workbook holds
/// an "Organizations" and a "Contacts" sheet.
pub fn import_workbook(workbook: &Workbook) -> Result<ImportedData, AppError> {
    let organization_sheet = workbook.require_sheet(ORGANIZATIONS_SHEET)?;
    let contact_sheet = workbook.require_sheet(CONTACTS_SHEET)?;

    let data = ImportedData {
        organizations: organization_sheet.rows.iter().map(decode_organization).collect(),
        contacts: contact_sheet.rows.iter().map(decode_contact).collect(),
    };

    debug!(
        organizations = data.organizations.len(),
        contacts = data.contacts.len(),
        "decoded workbook"
    );
    Ok(data)
}

pub fn extract_contact_emails(contacts: &[Contact]) -> Vec<String> {
    contacts
        .iter()
        .map(|contact| contact.email.trim())
        .filter(|email| !email.is_empty())
        .map(str::to_string)
        .collect()
}
