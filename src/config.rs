use crate::errors::AppError;
use crate::helper::{self, env_value_or};
use crate::storage::StorageMediums;
use url::Url;

pub const DEFAULT_ORGANIZATIONS_PATH: &str = "./.instance/organizations.json";
pub const DEFAULT_CONTACTS_PATH: &str = "./.instance/contacts.json";
pub const DEFAULT_USERS_PATH: &str = "./.instance/users.json";
pub const DEFAULT_API_URL: &str = "http://localhost:8080";

/// Runtime settings, read from the environment (and `.env`).
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub storage: StorageMediums,
    pub organizations_path: String,
    pub contacts_path: String,
    pub users_path: String,
    pub api_url: String,
    pub access_token: Option<String>,
    /// Email of the local user running administration commands.
    pub acting_user: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let config = Config {
            storage: StorageMediums::from(&env_value_or("STORAGE_CHOICE", "local"))?,
            organizations_path: env_value_or("ORGANIZATIONS_PATH", DEFAULT_ORGANIZATIONS_PATH),
            contacts_path: env_value_or("CONTACTS_PATH", DEFAULT_CONTACTS_PATH),
            users_path: env_value_or("USERS_PATH", DEFAULT_USERS_PATH),
            api_url: env_value_or("CRM_API_URL", DEFAULT_API_URL),
            access_token: optional_env("ACCESS_TOKEN"),
            acting_user: optional_env("CRM_USER"),
        };
        config.validate()?;
        Ok(config)
    }

    /// Same settings with another backend choice.
    pub fn with_storage(mut self, storage: &str) -> Result<Self, AppError> {
        self.storage = StorageMediums::from(storage)?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        let url = Url::parse(&self.api_url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(AppError::Validation(format!(
                "CRM_API_URL must be an http(s) URL, got {}",
                self.api_url
            )));
        }
        if [&self.organizations_path, &self.contacts_path, &self.users_path]
            .iter()
            .any(|path| path.trim().is_empty())
        {
            return Err(AppError::Validation(
                "Record file paths must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            storage: StorageMediums::Local,
            organizations_path: DEFAULT_ORGANIZATIONS_PATH.to_string(),
            contacts_path: DEFAULT_CONTACTS_PATH.to_string(),
            users_path: DEFAULT_USERS_PATH.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            access_token: None,
            acting_user: None,
        }
    }
}

fn optional_env(key: &str) -> Option<String> {
    helper::get_env_value_by_key(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() -> Result<(), AppError> {
        let config = Config::default();

        config.validate()?;
        assert!(config.storage.is_local());
        Ok(())
    }

    #[test]
    fn storage_override() -> Result<(), AppError> {
        let config = Config::default().with_storage("remote")?;

        assert!(config.storage.is_remote());
        assert!(Config::default().with_storage("carrier-pigeon").is_err());
        Ok(())
    }

    #[test]
    fn rejects_non_http_api_url() {
        let config = Config {
            api_url: "ftp://files.example".to_string(),
            ..Default::default()
        };
        let garbage = Config {
            api_url: "::not a url".to_string(),
            ..Default::default()
        };

        assert!(matches!(config.validate(), Err(AppError::Validation(_))));
        assert!(matches!(garbage.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn rejects_blank_users_path() {
        let config = Config {
            users_path: " ".to_string(),
            ..Default::default()
        };

        assert!(matches!(config.validate(), Err(AppError::Validation(_))));
    }
}
