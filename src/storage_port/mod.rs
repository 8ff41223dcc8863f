pub mod columns;
pub mod emails;
pub mod export_sheet;
pub mod import_sheet;

use crate::errors::AppError;
use crate::helper;
use crate::prelude::{Contact, Organization};
use crate::sheet::{Row, Sheet, Workbook};

pub use emails::{Delimiter, count_emails, extract_emails, format_emails, reformat_emails};
pub use export_sheet::{export_file_name, export_workbook, write_export};
pub use import_sheet::{ImportedData, extract_contact_emails, import_workbook};

pub const ORGANIZATIONS_SHEET: &str = "Organizations";
pub const CONTACTS_SHEET: &str = "Contacts";
