pub mod backend;
pub mod local;
pub mod remote;
pub mod stores;

use crate::config::Config;
use crate::prelude::{AppError, Contact, Organization, User};
use std::fs;
use std::path::Path;

pub use backend::OrganizationBackend;

/// Load/save persistence for one kind of record.
pub trait RecordStore<T>: Send + Sync {
    fn load(&self) -> Result<Vec<T>, AppError>;

    fn save(&self, records: &[T]) -> Result<(), AppError>;

    fn get_medium(&self) -> &str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageMediums {
    Local,
    Remote,
}

impl StorageMediums {
    pub fn is_local(&self) -> bool {
        matches!(self, StorageMediums::Local)
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, StorageMediums::Remote)
    }

    pub fn is_which(&self) -> &str {
        if self.is_remote() { "remote" } else { "local" }
    }

    pub fn from(str: &str) -> Result<Self, AppError> {
        match str.trim().to_ascii_lowercase().as_str() {
            "local" | "json" => Ok(StorageMediums::Local),
            "remote" => Ok(StorageMediums::Remote),
            _ => Err(AppError::Validation(
                "Not a recognized storage medium".to_string(),
            )),
        }
    }
}

/// Organization backend selected by the configuration.
pub fn parse_backend(config: &Config) -> Result<Box<dyn OrganizationBackend>, AppError> {
    match config.storage {
        StorageMediums::Local => {
            let store: stores::JsonStorage<Organization> =
                stores::JsonStorage::new(&config.organizations_path);
            Ok(Box::new(local::LocalBackend::open(Box::new(store))?))
        }
        StorageMediums::Remote => Ok(Box::new(remote::RemoteBackend::new(
            &config.api_url,
            config.access_token.clone(),
        )?)),
    }
}

pub fn parse_contact_store(config: &Config) -> Box<dyn RecordStore<Contact>> {
    Box::new(stores::JsonStorage::new(&config.contacts_path))
}

pub fn parse_user_store(config: &Config) -> Box<dyn RecordStore<User>> {
    Box::new(stores::JsonStorage::new(&config.users_path))
}

pub fn create_file_parent(path: &str) -> Result<(), AppError> {
    let path = Path::new(path);

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_storage_mediums() -> Result<(), AppError> {
        assert_eq!(StorageMediums::from("Remote")?, StorageMediums::Remote);
        assert_eq!(StorageMediums::from("json")?.is_which(), "local");
        assert!(StorageMediums::from("txt").is_err());
        Ok(())
    }

    #[test]
    fn creates_missing_parent_directories() -> Result<(), AppError> {
        let dir = tempfile::tempdir()?;
        let nested = dir.path().join("a/b/records.json");

        create_file_parent(&nested.to_string_lossy())?;

        assert!(dir.path().join("a/b").is_dir());
        Ok(())
    }
}
