pub mod command;
pub mod run;

pub use run::run_app;

use crate::prelude::{Contact, Organization, User};
use serde_json::Value;

pub fn display_organization(index: usize, org: &Organization) -> String {
    let website = match org.website_status {
        Some(status) if !org.website.is_empty() => format!("{} ({})", org.website, status),
        _ => org.website.clone(),
    };

    let mut line = format!(
        "{index:>3}. {:<30} {:<30} {:<35} {:<8} {}\n     id: {}  version: {}",
        org.name,
        org.category.label(),
        org.email,
        org.status.as_str(),
        website,
        org.id,
        org.version.as_ref().map(|v| v.as_str()).unwrap_or("-"),
    );

    if let Some(fields) = &org.custom_fields {
        let shown: Vec<String> = fields
            .iter()
            .map(|(key, value)| match value {
                Value::String(text) => format!("{key}={text}"),
                other => format!("{key}={other}"),
            })
            .collect();
        line.push_str(&format!("\n     fields: {}", shown.join(", ")));
    }
    line
}

pub fn display_contact(index: usize, contact: &Contact) -> String {
    format!(
        "{index:>3}. {:<25} {:<20} {:<35} {}\n     id: {}",
        contact.name, contact.role_position, contact.email, contact.preferred_language, contact.id
    )
}

pub fn display_user(user: &User) -> String {
    let access = if user.can_access_directory() {
        "granted"
    } else {
        "pending approval"
    };

    format!(
        "Name: {}\n\
        Email: {}\n\
        Roles: {}\n\
        Access: {}",
        user.name,
        user.email,
        user.describe_roles(),
        access
    )
}

pub fn display_user_row(index: usize, user: &User) -> String {
    let access = if user.has_access { "active" } else { "blocked" };
    format!(
        "{index:>3}. {:<25} {:<35} {:<8} {}",
        user.name,
        user.email,
        access,
        user.describe_roles()
    )
}
