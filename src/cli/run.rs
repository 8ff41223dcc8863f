use std::fs;
use std::path::Path;

use crate::cli::{display_contact, display_organization, display_user, display_user_row};
use crate::prelude::{
    AppError, Category, Config, ContactDraft, CustomFields, Delimiter, Directory, Language,
    OrganizationDraft, OrganizationFilter, OrganizationPatch, RemoteBackend, Status,
    UserRegistry, Version, WebsiteStatus, codec_for, codec_for_path,
    command::{Cli, Commands, OrganizationFields},
    filter_organizations, format_emails, reformat_emails, storage, write_export,
};
use chrono::Local;
use clap::Parser;
use serde_json::Value;
use tracing::debug;

pub fn run_app() -> Result<(), AppError> {
    let cli = Cli::parse();
    let config = Config::from_env()?.with_storage(&cli.storage)?;
    debug!(storage = config.storage.is_which(), "configuration loaded");

    match cli.command {
        Commands::List {
            search,
            category,
            broken_first,
        } => {
            let directory = open_directory(&config)?;
            let filter = OrganizationFilter {
                search,
                category: category.map(|c| c.parse::<Category>()).transpose()?,
                broken_first,
            };

            let found = filter_organizations(directory.list(), &filter)?;
            if found.is_empty() {
                println!("No organization found");
                return Ok(());
            }

            for (i, org) in found.iter().enumerate() {
                println!("{}", display_organization(i + 1, org));
            }
            Ok(())
        }

        Commands::Add { name, fields } => {
            let mut directory = open_directory(&config)?;
            let draft = draft_from_fields(name, fields)?;

            let org = directory.create(draft)?;

            println!("Organization added successfully");
            println!("id: {}", org.id);
            println!("version: {}", version_text(org.version.as_ref()));
            Ok(())
        }

        Commands::Edit {
            id,
            if_match,
            name,
            fields,
        } => {
            let mut directory = open_directory(&config)?;
            let current = directory.get(&id).and_then(|org| org.custom_fields.as_ref());
            let mut patch = patch_from_fields(fields, current)?;
            patch.name = name;

            if patch.is_empty() {
                return Err(AppError::Validation(
                    "Nothing to update, provide at least one field. See help".to_string(),
                ));
            }

            let org = match if_match {
                Some(version) => directory.update(&id, patch, &Version::new(version))?,
                None => directory.update_current(&id, patch)?,
            };

            println!("Organization updated successfully");
            println!("version: {}", version_text(org.version.as_ref()));
            Ok(())
        }

        Commands::Delete { id, if_match } => {
            let mut directory = open_directory(&config)?;
            let contacts = directory.org_contacts(&id).len();

            match if_match {
                Some(version) => directory.delete(&id, &Version::new(version))?,
                None => directory.delete_current(&id)?,
            }

            println!(
                "Organization deleted successfully ({} contacts removed)",
                contacts
            );
            Ok(())
        }

        Commands::Contacts { org } => {
            let directory = open_directory(&config)?;
            let organization = directory
                .get(&org)
                .ok_or_else(|| AppError::NotFound(format!("Organization {}", org)))?;

            let contacts = directory.org_contacts(&org);
            if contacts.is_empty() {
                println!("{} has no contacts yet", organization.name);
                return Ok(());
            }

            println!("Contacts of {}:", organization.name);
            for (i, contact) in contacts.iter().enumerate() {
                println!("{}", display_contact(i + 1, contact));
            }
            Ok(())
        }

        Commands::AddContact {
            org,
            name,
            role,
            email,
            language,
            notes,
        } => {
            let mut directory = open_directory(&config)?;

            let draft = ContactDraft {
                organization_id: org,
                name,
                role_position: role.unwrap_or_default(),
                email: email.unwrap_or_default(),
                preferred_language: language
                    .map(|l| l.parse::<Language>())
                    .transpose()?
                    .unwrap_or_default(),
                notes: notes.unwrap_or_default(),
                custom_fields: None,
            };

            let contact = directory.add_contact(draft)?;

            println!("Contact added successfully");
            println!("id: {}", contact.id);
            Ok(())
        }

        Commands::DeleteContact { id } => {
            let mut directory = open_directory(&config)?;
            directory.delete_contact(&id)?;

            println!("Contact deleted successfully");
            Ok(())
        }

        Commands::Import { src, delimiter } => {
            let delimiter: Delimiter = delimiter.parse()?;
            let path = Path::new(&src);
            if !path.exists() {
                return Err(AppError::NotFound("Import file".to_string()));
            }

            let mut directory = open_directory(&config)?;
            let bytes = fs::read(path)?;
            let summary = directory.import(&bytes, codec_for_path(path).as_ref())?;

            println!(
                "Imported {} organizations and {} contacts from {}",
                summary.organizations,
                summary.contacts,
                path.display()
            );
            if !summary.emails.is_empty() {
                println!("\nContact emails ({}):", summary.emails.len());
                println!("{}", summary.email_list(delimiter));
            }
            Ok(())
        }

        Commands::Export { des, format } => {
            let directory = open_directory(&config)?;
            let codec = codec_for(&format)?;

            let bytes = directory.export(codec.as_ref())?;
            let path = write_export(
                &bytes,
                des.as_deref(),
                Local::now().date_naive(),
                codec.extension(),
            )?;

            println!(
                "Exported {} organizations to {}",
                directory.list().len(),
                path.display()
            );
            Ok(())
        }

        Commands::Emails { text, delimiter } => {
            let delimiter: Delimiter = delimiter.parse()?;
            println!("{}", reformat_emails(&text, delimiter));
            Ok(())
        }

        Commands::Recipients { org, delimiter } => {
            let delimiter: Delimiter = delimiter.parse()?;
            let directory = open_directory(&config)?;

            if let Some(missing) = org.iter().find(|id| directory.get(id).is_none()) {
                return Err(AppError::NotFound(format!("Organization {}", missing)));
            }

            let emails = directory.recipients(&org);
            if emails.is_empty() {
                println!("No contact emails found");
                return Ok(());
            }
            println!("{}", format_emails(&emails, delimiter));
            Ok(())
        }

        Commands::Whoami => {
            let user = remote_backend(&config)?.current_user()?;
            println!("{}", display_user(&user));
            Ok(())
        }

        Commands::Users => {
            let registry = open_registry(&config)?;
            registry
                .acting(config.acting_user.as_deref())?
                .require_admin()?;

            for (i, user) in registry.list().iter().enumerate() {
                println!("{}", display_user_row(i + 1, user));
            }
            Ok(())
        }

        Commands::AddUser { email, name } => {
            let mut registry = open_registry(&config)?;
            // Nobody to ask yet when the first user signs up
            let acting = if registry.list().is_empty() {
                None
            } else {
                Some(registry.acting(config.acting_user.as_deref())?)
            };

            let user = registry.register(acting.as_ref(), &email, &name)?;

            println!("User added successfully");
            println!("{}", display_user(&user));
            Ok(())
        }

        Commands::Grant { email } => {
            let mut registry = open_registry(&config)?;
            let acting = registry.acting(config.acting_user.as_deref())?;

            let user = registry.toggle_access(&acting, &email)?;

            let state = if user.has_access { "granted" } else { "revoked" };
            println!("Access {} for {}", state, user.email);
            Ok(())
        }

        Commands::Admin { email } => {
            let mut registry = open_registry(&config)?;
            let acting = registry.acting(config.acting_user.as_deref())?;

            let user = registry.toggle_admin(&acting, &email)?;

            let role = if user.is_admin() { "administrator" } else { "user" };
            println!("{} is now {}", user.email, role);
            Ok(())
        }
    }
}

fn open_registry(config: &Config) -> Result<UserRegistry, AppError> {
    UserRegistry::open(storage::parse_user_store(config))
}

fn open_directory(config: &Config) -> Result<Directory, AppError> {
    if config.storage.is_remote() {
        // The server refuses users that have not been approved yet
        remote_backend(config)?.current_user()?.require_access()?;
    }

    let backend = storage::parse_backend(config)?;
    let contact_store = storage::parse_contact_store(config);
    let directory = Directory::new(backend, contact_store)?;

    debug!(medium = directory.get_medium(), "directory opened");
    Ok(directory)
}

fn remote_backend(config: &Config) -> Result<RemoteBackend, AppError> {
    if !config.storage.is_remote() {
        return Err(AppError::Validation(
            "This command needs the remote backend (--storage remote)".to_string(),
        ));
    }
    RemoteBackend::new(&config.api_url, config.access_token.clone())
}

fn patch_from_fields(
    fields: OrganizationFields,
    current: Option<&CustomFields>,
) -> Result<OrganizationPatch, AppError> {
    let custom_fields = merge_custom_fields(current, &fields.custom)?;

    Ok(OrganizationPatch {
        name: None,
        website: fields.website,
        website_status: fields
            .website_status
            .map(|s| s.parse::<WebsiteStatus>())
            .transpose()?,
        linkedin_url: fields.linkedin,
        country_region: fields.country,
        email: fields.email,
        category: fields.category.map(|c| c.parse::<Category>()).transpose()?,
        status: fields.status.map(|s| s.parse::<Status>()).transpose()?,
        notes: fields.notes,
        custom_fields,
    })
}

/// Applies `key=value` arguments on top of the current fields. `None` when
/// no argument was given.
fn merge_custom_fields(
    current: Option<&CustomFields>,
    args: &[String],
) -> Result<Option<CustomFields>, AppError> {
    if args.is_empty() {
        return Ok(None);
    }

    let mut merged = current.cloned().unwrap_or_default();
    for arg in args {
        let (key, value) = arg
            .split_once('=')
            .map(|(key, value)| (key.trim(), value.trim()))
            .filter(|(key, _)| !key.is_empty())
            .ok_or_else(|| {
                AppError::Validation(format!("Custom field must look like key=value, got '{}'", arg))
            })?;

        if value.is_empty() {
            merged.remove(key);
        } else {
            merged.insert(key.to_string(), field_value(value));
        }
    }
    Ok(Some(merged))
}

// Numbers and booleans keep their type, everything else is text
fn field_value(text: &str) -> Value {
    match serde_json::from_str::<Value>(text) {
        Ok(value @ (Value::Number(_) | Value::Bool(_))) => value,
        _ => Value::String(text.to_string()),
    }
}

fn draft_from_fields(name: String, fields: OrganizationFields) -> Result<OrganizationDraft, AppError> {
    let patch = patch_from_fields(fields, None)?;

    Ok(OrganizationDraft {
        name,
        website: patch.website.unwrap_or_default(),
        website_status: patch.website_status,
        linkedin_url: patch.linkedin_url,
        country_region: patch.country_region.unwrap_or_default(),
        email: patch.email.unwrap_or_default(),
        category: patch.category.unwrap_or_default(),
        status: patch.status.unwrap_or_default(),
        notes: patch.notes,
        custom_fields: patch.custom_fields,
    })
}

fn version_text(version: Option<&Version>) -> &str {
    version.map(Version::as_str).unwrap_or("-")
}
