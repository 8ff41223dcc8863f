pub use crate::cli::{command, run_app};
pub use crate::config::Config;
pub use crate::domain::{
    Category, Contact, ContactDraft, ContactPatch, DateTime, Directory, ImportSummary, Language,
    Organization, OrganizationDraft, OrganizationFilter, OrganizationPatch, Status, User,
    UserRegistry, Utc, WebsiteStatus, contact, filter_organizations, organization,
    organization::CustomFields,
    version::{self, Version},
};
pub use crate::errors::AppError;
pub use crate::helper;
pub use crate::sheet::{
    self, CsvBundleCodec, JsonWorkbookCodec, Sheet, SheetCodec, Workbook, XlsxCodec, codec_for,
    codec_for_path,
};
pub use crate::storage::{
    self, OrganizationBackend, RecordStore, StorageMediums,
    local::LocalBackend,
    remote::RemoteBackend,
    stores::{JsonStorage, MemStorage},
};
pub use crate::storage_port::{
    self, Delimiter, ImportedData, count_emails, export_file_name, export_workbook,
    extract_emails, format_emails, import_workbook, reformat_emails, write_export,
};
pub use chrono::NaiveDate;
