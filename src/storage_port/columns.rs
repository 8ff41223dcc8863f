use std::str::FromStr;

use super::*;
use crate::prelude::{
    Category, CustomFields, DateTime, Language, Status, Utc, WebsiteStatus,
};
use serde_json::Value;

pub const ID: &str = "ID";
pub const NAME: &str = "Name";
pub const WEBSITE: &str = "Website";
pub const WEBSITE_STATUS: &str = "Website Status";
pub const LINKEDIN_URL: &str = "LinkedIn URL";
pub const COUNTRY_REGION: &str = "Country/Region";
pub const EMAIL: &str = "Email";
pub const CATEGORY: &str = "Category";
pub const STATUS: &str = "Status";
pub const NOTES: &str = "Notes";
pub const CUSTOM_FIELDS: &str = "Custom Fields";
pub const CREATED_AT: &str = "Created At";
pub const UPDATED_AT: &str = "Updated At";
pub const ORGANIZATION_NAME: &str = "Organization Name";
pub const ORGANIZATION_ID: &str = "Organization ID";
pub const ROLE_POSITION: &str = "Role/Position";
pub const PREFERRED_LANGUAGE: &str = "Preferred Language";

pub const ORGANIZATION_COLUMNS: [&str; 13] = [
    ID,
    NAME,
    WEBSITE,
    WEBSITE_STATUS,
    LINKEDIN_URL,
    COUNTRY_REGION,
    EMAIL,
    CATEGORY,
    STATUS,
    NOTES,
    CUSTOM_FIELDS,
    CREATED_AT,
    UPDATED_AT,
];

pub const CONTACT_COLUMNS: [&str; 11] = [
    ID,
    ORGANIZATION_NAME,
    ORGANIZATION_ID,
    NAME,
    ROLE_POSITION,
    EMAIL,
    PREFERRED_LANGUAGE,
    NOTES,
    CUSTOM_FIELDS,
    CREATED_AT,
    UPDATED_AT,
];

// Cell decoders. None of them fail: a missing or unusable cell yields the
// column's default.

pub fn text(row: &Row, column: &str) -> String {
    row.get(column).cloned().unwrap_or_default()
}

pub fn optional_text(row: &Row, column: &str) -> Option<String> {
    row.get(column)
        .filter(|cell| !cell.trim().is_empty())
        .cloned()
}

/// Blank ids get a fresh one.
pub fn id(row: &Row, column: &str) -> String {
    optional_text(row, column)
        .map(|cell| cell.trim().to_string())
        .unwrap_or_else(helper::new_id)
}

pub fn optional_choice<T: FromStr>(row: &Row, column: &str) -> Option<T> {
    optional_text(row, column).and_then(|cell| cell.trim().parse().ok())
}

pub fn choice<T: FromStr + Default>(row: &Row, column: &str) -> T {
    optional_choice(row, column).unwrap_or_default()
}

pub fn timestamp(row: &Row, column: &str) -> DateTime<Utc> {
    optional_text(row, column)
        .and_then(|cell| helper::parse_timestamp(&cell))
        .unwrap_or_else(Utc::now)
}

/// A JSON object, anything else is dropped.
pub fn custom_fields(row: &Row, column: &str) -> Option<CustomFields> {
    match serde_json::from_str::<Value>(&optional_text(row, column)?) {
        Ok(Value::Object(map)) if !map.is_empty() => Some(map.into_iter().collect()),
        _ => None,
    }
}

pub fn decode_organization(row: &Row) -> Organization {
    Organization {
        id: id(row, ID),
        name: text(row, NAME),
        website: text(row, WEBSITE),
        website_status: optional_choice::<WebsiteStatus>(row, WEBSITE_STATUS),
        linkedin_url: optional_text(row, LINKEDIN_URL),
        country_region: text(row, COUNTRY_REGION),
        email: text(row, EMAIL),
        category: choice::<Category>(row, CATEGORY),
        status: choice::<Status>(row, STATUS),
        notes: optional_text(row, NOTES),
        custom_fields: custom_fields(row, CUSTOM_FIELDS),
        created_at: timestamp(row, CREATED_AT),
        updated_at: timestamp(row, UPDATED_AT),
        version: None,
    }
}

pub fn decode_contact(row: &Row) -> Contact {
    Contact {
        id: id(row, ID),
        organization_id: text(row, ORGANIZATION_ID),
        name: text(row, NAME),
        role_position: text(row, ROLE_POSITION),
        email: text(row, EMAIL),
        preferred_language: choice::<Language>(row, PREFERRED_LANGUAGE),
        notes: text(row, NOTES),
        custom_fields: custom_fields(row, CUSTOM_FIELDS),
        created_at: timestamp(row, CREATED_AT),
        updated_at: timestamp(row, UPDATED_AT),
    }
}

pub fn encode_custom_fields(fields: Option<&CustomFields>) -> String {
    match fields {
        Some(fields) if !fields.is_empty() => serde_json::to_string(fields).unwrap_or_default(),
        _ => String::new(),
    }
}
