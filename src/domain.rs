pub mod contact;
pub mod directory;
pub mod organization;
pub mod search;
pub mod user;
pub mod version;

pub use chrono::{DateTime, Utc};

use crate::errors::AppError;
use crate::helper::new_id;
use contact::{
    ValidationReq, default_timestamp, deserialize_custom_fields, deserialize_optional_text,
    deserialize_timestamp, non_empty_fields,
};
use organization::{CustomFields, validate_email};
use version::Version;

pub use contact::{Contact, ContactDraft, ContactPatch, Language};
pub use directory::{Directory, ImportSummary};
pub use organization::{
    Category, Organization, OrganizationDraft, OrganizationPatch, Status, WebsiteStatus,
};
pub use search::{OrganizationFilter, filter_organizations};
pub use user::{User, UserRegistry};
