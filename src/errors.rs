use core::fmt;
use std::sync::PoisonError;

#[derive(Debug)]
pub enum AppError {
    Csv(csv::Error),
    FailedRequest(reqwest::Error),
    Forbidden(String),
    ImportFormat(String),
    Io(std::io::Error),
    NotFound(String),
    Poisoned,
    Serialization(serde_json::Error),
    Unauthorized,
    Validation(String),
    VersionConflict(String),
    Xlsx(rust_xlsxwriter::XlsxError),
    Zip(zip::result::ZipError),
}

impl AppError {
    /// Transport and storage failures, as opposed to business rule rejections.
    pub fn is_io_failure(&self) -> bool {
        matches!(
            self,
            AppError::Io(_) | AppError::FailedRequest(_) | AppError::Serialization(_)
        )
    }

    pub fn is_version_conflict(&self) -> bool {
        matches!(self, AppError::VersionConflict(_))
    }

    /// Re-labels decoding failures so that anything going wrong while reading
    /// an import document surfaces as `ImportFormat`.
    pub fn into_import_format(self) -> Self {
        match self {
            AppError::Csv(e) => AppError::ImportFormat(format!("unreadable sheet: {}", e)),
            AppError::Zip(e) => AppError::ImportFormat(format!("unreadable archive: {}", e)),
            AppError::Xlsx(e) => AppError::ImportFormat(format!("unreadable workbook: {}", e)),
            AppError::Serialization(e) => {
                AppError::ImportFormat(format!("unreadable workbook: {}", e))
            }
            AppError::Io(e) => AppError::ImportFormat(format!("unreadable document: {}", e)),
            other => other,
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err)
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::FailedRequest(err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err)
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::Csv(err)
    }
}

impl From<zip::result::ZipError> for AppError {
    fn from(err: zip::result::ZipError) -> Self {
        AppError::Zip(err)
    }
}

impl From<rust_xlsxwriter::XlsxError> for AppError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        AppError::Xlsx(err)
    }
}

impl From<regex::Error> for AppError {
    fn from(err: regex::Error) -> Self {
        AppError::Validation(format!("invalid pattern: {}", err))
    }
}

impl From<url::ParseError> for AppError {
    fn from(err: url::ParseError) -> Self {
        AppError::Validation(format!("invalid url: {}", err))
    }
}

impl<T> From<PoisonError<T>> for AppError {
    fn from(_: PoisonError<T>) -> Self {
        AppError::Poisoned
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::Csv(e) => write!(f, "CSV error: {}", e),
            AppError::FailedRequest(e) => write!(f, "Request to the CRM backend failed: {}", e),
            AppError::Forbidden(msg) => write!(f, "Permission denied: {}", msg),
            AppError::ImportFormat(msg) => {
                write!(f, "Error importing file. Please check the format: {}", msg)
            }
            AppError::Io(e) => {
                write!(f, "I/O error while accessing a file or resource: {}", e)
            }
            AppError::NotFound(item) => write!(f, "{} Not found", item),
            AppError::Poisoned => write!(f, "Storage lock poisoned by a panicked thread"),
            AppError::Serialization(e) => write!(f, "Invalid JSON data: {}", e),
            AppError::Unauthorized => write!(f, "Session expired. Please log in again."),
            AppError::Validation(msg) => write!(f, "Validation failed: {}", msg),
            AppError::VersionConflict(item) => write!(
                f,
                "Conflict: {} was changed by someone else. Refresh and try again.",
                item
            ),
            AppError::Xlsx(e) => write!(f, "Spreadsheet error: {}", e),
            AppError::Zip(e) => write!(f, "Archive error: {}", e),
        }
    }
}

impl std::error::Error for AppError {}
