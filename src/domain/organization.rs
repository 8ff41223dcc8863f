use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub type CustomFields = BTreeMap<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: String,
    pub name: String,

    #[serde(default)]
    pub website: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website_status: Option<WebsiteStatus>,

    #[serde(
        default,
        deserialize_with = "deserialize_optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub linkedin_url: Option<String>,

    #[serde(default)]
    pub country_region: String,

    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub category: Category,

    #[serde(default)]
    pub status: Status,

    #[serde(
        default,
        deserialize_with = "deserialize_optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub notes: Option<String>,

    #[serde(
        default,
        deserialize_with = "deserialize_custom_fields",
        skip_serializing_if = "Option::is_none"
    )]
    pub custom_fields: Option<CustomFields>,

    #[serde(
        default = "default_timestamp",
        deserialize_with = "deserialize_timestamp"
    )]
    pub created_at: DateTime<Utc>,

    #[serde(
        default = "default_timestamp",
        deserialize_with = "deserialize_timestamp"
    )]
    pub updated_at: DateTime<Utc>,

    /// Absent until the backend has stored the record.
    #[serde(default, rename = "etag", skip_serializing_if = "Option::is_none")]
    pub version: Option<Version>,
}

/// An organization without the fields the backend assigns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationDraft {
    pub name: String,
    pub website: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub website_status: Option<WebsiteStatus>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkedin_url: Option<String>,

    pub country_region: String,
    pub email: String,
    pub category: Category,
    pub status: Status,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_fields: Option<CustomFields>,
}

/// Partial update. Fields left as `None` keep their stored value; an empty
/// string clears an optional text field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub website_status: Option<WebsiteStatus>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkedin_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_region: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_fields: Option<CustomFields>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    #[default]
    AdditiveManufacturing,
    MobilityFleetManagement,
    ProductOriginAuthentication,
    WarehousingIntralogisticsRobotics,
    PackagingBinsContainers,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    #[default]
    Active,
    Inactive,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WebsiteStatus {
    Working,
    NotWorking,
}

impl Organization {
    /// Builds a stored record from a draft. The caller (a backend) supplies
    /// the identifier and is responsible for issuing the version.
    pub fn from_draft(draft: OrganizationDraft, id: String, now: DateTime<Utc>) -> Self {
        Organization {
            id,
            name: draft.name,
            website: draft.website,
            website_status: draft.website_status,
            linkedin_url: non_empty(draft.linkedin_url),
            country_region: draft.country_region,
            email: draft.email,
            category: draft.category,
            status: draft.status,
            notes: non_empty(draft.notes),
            custom_fields: non_empty_fields(draft.custom_fields),
            created_at: now,
            updated_at: now,
            version: None,
        }
    }

    pub fn apply(&mut self, patch: OrganizationPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(website) = patch.website {
            self.website = website;
        }
        if let Some(website_status) = patch.website_status {
            self.website_status = Some(website_status);
        }
        if let Some(linkedin_url) = patch.linkedin_url {
            self.linkedin_url = non_empty(Some(linkedin_url));
        }
        if let Some(country_region) = patch.country_region {
            self.country_region = country_region;
        }
        if let Some(email) = patch.email {
            self.email = email;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(notes) = patch.notes {
            self.notes = non_empty(Some(notes));
        }
        if let Some(custom_fields) = patch.custom_fields {
            self.custom_fields = non_empty_fields(Some(custom_fields));
        }
    }

    /// Bytes the local backend hashes into a version marker. The marker
    /// itself is left out.
    pub fn content_bytes(&self) -> Result<Vec<u8>, AppError> {
        let mut unversioned = self.clone();
        unversioned.version = None;
        Ok(serde_json::to_vec(&unversioned)?)
    }

    pub fn has_broken_website(&self) -> bool {
        self.website_status == Some(WebsiteStatus::NotWorking)
    }
}

impl OrganizationDraft {
    pub fn new(name: impl Into<String>) -> Self {
        OrganizationDraft {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation(
                "Organization name is required".to_string(),
            ));
        }
        if !validate_email(&self.email)? {
            return Err(AppError::Validation(ValidationReq::email_req()));
        }
        Ok(())
    }
}

impl OrganizationPatch {
    pub fn is_empty(&self) -> bool {
        *self == OrganizationPatch::default()
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(name) = &self.name
            && name.trim().is_empty()
        {
            return Err(AppError::Validation(
                "Organization name must not be blank".to_string(),
            ));
        }
        if let Some(email) = &self.email
            && !validate_email(email)?
        {
            return Err(AppError::Validation(ValidationReq::email_req()));
        }
        Ok(())
    }
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::AdditiveManufacturing,
        Category::MobilityFleetManagement,
        Category::ProductOriginAuthentication,
        Category::WarehousingIntralogisticsRobotics,
        Category::PackagingBinsContainers,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::AdditiveManufacturing => "additive-manufacturing",
            Category::MobilityFleetManagement => "mobility-fleet-management",
            Category::ProductOriginAuthentication => "product-origin-authentication",
            Category::WarehousingIntralogisticsRobotics => "warehousing-intralogistics-robotics",
            Category::PackagingBinsContainers => "packaging-bins-containers",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::AdditiveManufacturing => "Additive Manufacturing",
            Category::MobilityFleetManagement => "Mobility & Fleet Management",
            Category::ProductOriginAuthentication => "Product Origin & Authentication",
            Category::WarehousingIntralogisticsRobotics => {
                "Warehousing, Intralogistics & Robotics"
            }
            Category::PackagingBinsContainers => "Packaging, Bins & Containers",
        }
    }
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Active => "active",
            Status::Inactive => "inactive",
            Status::Closed => "closed",
        }
    }
}

impl WebsiteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WebsiteStatus::Working => "working",
            WebsiteStatus::NotWorking => "not-working",
        }
    }
}

impl FromStr for Category {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == wanted)
            .ok_or_else(|| AppError::Validation(format!("Unknown category '{}'", s)))
    }
}

impl FromStr for Status {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(Status::Active),
            "inactive" => Ok(Status::Inactive),
            "closed" => Ok(Status::Closed),
            _ => Err(AppError::Validation(format!("Unknown status '{}'", s))),
        }
    }
}

impl FromStr for WebsiteStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "working" => Ok(WebsiteStatus::Working),
            "not-working" => Ok(WebsiteStatus::NotWorking),
            _ => Err(AppError::Validation(format!("Unknown website status '{}'", s))),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for WebsiteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn validate_email(email: &str) -> Result<bool, AppError> {
    // Email can be empty
    // Or must contain '@' with a '.' somewhere after it
    // Not more than 254 characters
    let re = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$")?;
    Ok(email.is_empty() || (re.is_match(email) && email.len() <= 254))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(name: &str) -> Organization {
        let mut draft = OrganizationDraft::new(name);
        draft.notes = Some("first notes".to_string());
        Organization::from_draft(draft, "org-1".to_string(), Utc::now())
    }

    #[test]
    fn patch_keeps_unspecified_fields() {
        let mut org = stored("Acme");
        org.website = "https://acme.test".to_string();

        org.apply(OrganizationPatch {
            status: Some(Status::Closed),
            ..Default::default()
        });

        assert_eq!(org.status, Status::Closed);
        assert_eq!(org.name, "Acme");
        assert_eq!(org.website, "https://acme.test");
        assert_eq!(org.notes.as_deref(), Some("first notes"));
    }

    #[test]
    fn empty_string_clears_optional_text() {
        let mut org = stored("Acme");

        org.apply(OrganizationPatch {
            notes: Some(String::new()),
            ..Default::default()
        });

        assert_eq!(org.notes, None);
    }

    #[test]
    fn parses_categories_case_insensitively() -> Result<(), AppError> {
        assert_eq!(
            "Packaging-Bins-Containers".parse::<Category>()?,
            Category::PackagingBinsContainers
        );
        assert!("start-up".parse::<Category>().is_err());
        assert_eq!(Category::default(), Category::AdditiveManufacturing);
        Ok(())
    }

    #[test]
    fn serializes_with_backend_field_names() -> Result<(), AppError> {
        let mut org = stored("Acme");
        org.website_status = Some(WebsiteStatus::NotWorking);
        org.version = Some(Version::new("\"abc\""));

        let json: Value = serde_json::to_value(&org)?;

        assert_eq!(json["websiteStatus"], "not-working");
        assert_eq!(json["category"], "additive-manufacturing");
        assert_eq!(json["etag"], "\"abc\"");
        assert!(json.get("linkedinUrl").is_none());
        Ok(())
    }

    #[test]
    fn deserializes_rows_without_timestamps() -> Result<(), AppError> {
        let org: Organization = serde_json::from_str(r#"{"id":"1","name":"Acme"}"#)?;

        assert_eq!(org.status, Status::Active);
        assert_eq!(org.version, None);
        Ok(())
    }

    #[test]
    fn draft_requires_a_name_and_valid_email() {
        assert!(OrganizationDraft::new("  ").validate().is_err());

        let mut draft = OrganizationDraft::new("Acme");
        draft.email = "foo@bar".to_string();
        assert!(draft.validate().is_err());

        draft.email = "info@acme.test".to_string();
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn content_bytes_ignore_version() -> Result<(), AppError> {
        let mut org = stored("Acme");
        let before = org.content_bytes()?;
        org.version = Some(Version::new("\"x\""));

        assert_eq!(before, org.content_bytes()?);
        Ok(())
    }
}
