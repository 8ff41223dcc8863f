use std::fmt;
use std::str::FromStr;

use super::*;
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: String,
    pub organization_id: String,
    pub name: String,

    #[serde(default)]
    pub role_position: String,

    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub preferred_language: Language,

    #[serde(default)]
    pub notes: String,

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
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactDraft {
    pub organization_id: String,
    pub name: String,
    pub role_position: String,
    pub email: String,
    pub preferred_language: Language,
    pub notes: String,
    pub custom_fields: Option<CustomFields>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactPatch {
    pub organization_id: Option<String>,
    pub name: Option<String>,
    pub role_position: Option<String>,
    pub email: Option<String>,
    pub preferred_language: Option<Language>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "DE")]
    De,
    #[default]
    #[serde(rename = "EN")]
    En,
    #[serde(rename = "FR")]
    Fr,
}

pub enum ValidationReq {
    __,
}

impl ValidationReq {
    pub fn name_req() -> String {
        "Name must not be empty and must not exceed 100 characters".to_string()
    }

    pub fn email_req() -> String {
        "Email can be empty, or must be a valid email. Must not exceed 254 characters".to_string()
    }
}

impl Contact {
    pub fn new(draft: ContactDraft) -> Self {
        let now = Utc::now();
        Contact {
            id: new_id(),
            organization_id: draft.organization_id,
            name: draft.name,
            role_position: draft.role_position,
            email: draft.email,
            preferred_language: draft.preferred_language,
            notes: draft.notes,
            custom_fields: non_empty_fields(draft.custom_fields),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, patch: ContactPatch) {
        if let Some(organization_id) = patch.organization_id {
            self.organization_id = organization_id;
        }
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(role_position) = patch.role_position {
            self.role_position = role_position;
        }
        if let Some(email) = patch.email {
            self.email = email;
        }
        if let Some(language) = patch.preferred_language {
            self.preferred_language = language;
        }
        if let Some(notes) = patch.notes {
            self.notes = notes;
        }
        self.updated_at = Utc::now();
    }
}

impl ContactDraft {
    pub fn new(organization_id: impl Into<String>, name: impl Into<String>) -> Self {
        ContactDraft {
            organization_id: organization_id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() || self.name.chars().count() > 100 {
            return Err(AppError::Validation(ValidationReq::name_req()));
        }
        if !validate_email(&self.email)? {
            return Err(AppError::Validation(ValidationReq::email_req()));
        }
        Ok(())
    }
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::De => "DE",
            Language::En => "EN",
            Language::Fr => "FR",
        }
    }
}

impl FromStr for Language {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DE" => Ok(Language::De),
            "EN" => Ok(Language::En),
            "FR" => Ok(Language::Fr),
            _ => Err(AppError::Validation(format!("Unknown language '{}'", s))),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub(crate) fn default_timestamp() -> DateTime<Utc> {
    Utc::now()
}

pub(crate) fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    match opt {
        Some(s) => DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom),
        None => Ok(Utc::now()), // null from older records
    }
}

/// Blank text reads as absent, so a record has one form for "no value".
pub(crate) fn deserialize_optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.filter(|s| !s.trim().is_empty()))
}

pub(crate) fn deserialize_custom_fields<'de, D>(
    deserializer: D,
) -> Result<Option<CustomFields>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(non_empty_fields(Option::<CustomFields>::deserialize(deserializer)?))
}

pub(crate) fn non_empty_fields(fields: Option<CustomFields>) -> Option<CustomFields> {
    fields.filter(|fields| !fields.is_empty())
}
