use std::collections::BTreeSet;

use super::*;
use crate::storage::RecordStore;
use serde::{Deserialize, Serialize};
use tracing::info;

pub const ADMIN_ROLE: &str = "admin";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,

    #[serde(default)]
    pub has_access: bool,

    #[serde(default)]
    pub roles: BTreeSet<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.roles.contains(ADMIN_ROLE)
    }

    pub fn can_access_directory(&self) -> bool {
        self.has_access
    }

    pub fn require_access(&self) -> Result<(), AppError> {
        if self.can_access_directory() {
            Ok(())
        } else {
            Err(AppError::Unauthorized)
        }
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() && self.has_access {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "{} is not an administrator",
                self.email
            )))
        }
    }

    pub fn toggle_access(&mut self) {
        self.has_access = !self.has_access;
        self.updated_at = Some(Utc::now());
    }

    pub fn toggle_admin(&mut self) {
        if !self.roles.remove(ADMIN_ROLE) {
            self.roles.insert(ADMIN_ROLE.to_string());
        }
        self.updated_at = Some(Utc::now());
    }

    pub fn describe_roles(&self) -> String {
        if self.roles.is_empty() {
            "user".to_string()
        } else {
            self.roles.iter().cloned().collect::<Vec<_>>().join(", ")
        }
    }
}

/// Collaborators of this installation, as managed from the admin commands.
///
/// The first user registered becomes an administrator with access; everyone
/// after that starts without access until an administrator grants it.
pub struct UserRegistry {
    users: Vec<User>,
    store: Box<dyn RecordStore<User>>,
}

impl UserRegistry {
    pub fn open(store: Box<dyn RecordStore<User>>) -> Result<Self, AppError> {
        Ok(Self {
            users: store.load()?,
            store,
        })
    }

    pub fn list(&self) -> &[User] {
        &self.users
    }

    pub fn find(&self, email: &str) -> Option<&User> {
        let email = email.trim();
        self.users
            .iter()
            .find(|user| user.email.eq_ignore_ascii_case(email))
    }

    /// The user an administration command runs as.
    pub fn acting(&self, email: Option<&str>) -> Result<User, AppError> {
        let email = email.ok_or_else(|| {
            AppError::Forbidden("set CRM_USER to an administrator's email".to_string())
        })?;
        self.find(email)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("User {}", email)))
    }

    /// Adds a user. Only administrators may add users once one exists.
    pub fn register(
        &mut self,
        acting: Option<&User>,
        email: &str,
        name: &str,
    ) -> Result<User, AppError> {
        let email = email.trim();
        if email.is_empty() || !validate_email(email)? {
            return Err(AppError::Validation(ValidationReq::email_req()));
        }
        if name.trim().is_empty() {
            return Err(AppError::Validation(ValidationReq::name_req()));
        }
        if self.find(email).is_some() {
            return Err(AppError::Validation(format!("User {} already exists", email)));
        }

        let first = self.users.is_empty();
        if !first {
            acting
                .ok_or_else(|| {
                    AppError::Forbidden("only administrators can add users".to_string())
                })?
                .require_admin()?;
        }

        let now = Utc::now();
        let user = User {
            id: new_id(),
            email: email.to_string(),
            name: name.trim().to_string(),
            has_access: first,
            roles: if first {
                BTreeSet::from([ADMIN_ROLE.to_string()])
            } else {
                BTreeSet::new()
            },
            created_at: Some(now),
            updated_at: Some(now),
        };

        self.users.push(user.clone());
        if let Err(e) = self.store.save(&self.users) {
            self.users.pop();
            return Err(e);
        }

        info!(email = %user.email, admin = user.is_admin(), "user registered");
        Ok(user)
    }

    pub fn toggle_access(&mut self, acting: &User, email: &str) -> Result<User, AppError> {
        self.administer(acting, email, User::toggle_access)
    }

    pub fn toggle_admin(&mut self, acting: &User, email: &str) -> Result<User, AppError> {
        self.administer(acting, email, User::toggle_admin)
    }

    fn administer(
        &mut self,
        acting: &User,
        email: &str,
        change: fn(&mut User),
    ) -> Result<User, AppError> {
        acting.require_admin()?;
        if acting.email.eq_ignore_ascii_case(email.trim()) {
            return Err(AppError::Validation(
                "Administrators cannot change their own access or role".to_string(),
            ));
        }

        let index = self
            .users
            .iter()
            .position(|user| user.email.eq_ignore_ascii_case(email.trim()))
            .ok_or_else(|| AppError::NotFound(format!("User {}", email)))?;

        let mut updated = self.users[index].clone();
        change(&mut updated);

        let previous = std::mem::replace(&mut self.users[index], updated.clone());
        if let Err(e) = self.store.save(&self.users) {
            self.users[index] = previous;
            return Err(e);
        }

        info!(email = %updated.email, by = %acting.email, "user updated");
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(json: &str) -> User {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn access_flag_gates_directory() {
        let pending = user(r#"{"id":"1","email":"a@x.com","name":"A","hasAccess":false,"roles":[]}"#);
        let granted = user(r#"{"id":"2","email":"b@x.com","name":"B","hasAccess":true,"roles":["user"]}"#);

        assert!(matches!(pending.require_access(), Err(AppError::Unauthorized)));
        assert!(granted.require_access().is_ok());
        assert!(!granted.is_admin());
    }

    #[test]
    fn admin_toggles_flip_state() {
        let mut u = user(r#"{"id":"1","email":"a@x.com","name":"A"}"#);

        u.toggle_admin();
        u.toggle_access();
        assert!(u.is_admin());
        assert!(u.has_access);
        assert_eq!(u.describe_roles(), "admin");

        u.toggle_admin();
        assert!(!u.is_admin());
        assert_eq!(u.describe_roles(), "user");
    }

    fn registry() -> Result<(UserRegistry, User), AppError> {
        let mut registry = UserRegistry::open(Box::new(crate::storage::stores::MemStorage::new()))?;
        let admin = registry.register(None, "root@crm.test", "Root")?;
        Ok((registry, admin))
    }

    #[test]
    fn first_user_administers() -> Result<(), AppError> {
        let (mut registry, admin) = registry()?;
        let member = registry.register(Some(&admin), "ann@crm.test", "Ann")?;

        assert!(admin.is_admin() && admin.has_access);
        assert!(!member.has_access);
        assert!(!member.is_admin());

        let granted = registry.toggle_access(&admin, "ANN@crm.test")?;
        assert!(granted.has_access);
        assert!(registry.find("ann@crm.test").is_some_and(|u| u.has_access));

        let promoted = registry.toggle_admin(&admin, "ann@crm.test")?;
        assert!(promoted.require_admin().is_ok());
        Ok(())
    }

    #[test]
    fn non_admins_are_refused() -> Result<(), AppError> {
        let (mut registry, admin) = registry()?;
        let member = registry.register(Some(&admin), "ann@crm.test", "Ann")?;

        assert!(matches!(
            registry.register(Some(&member), "bob@crm.test", "Bob"),
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            registry.register(None, "bob@crm.test", "Bob"),
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            registry.toggle_admin(&member, "root@crm.test"),
            Err(AppError::Forbidden(_))
        ));
        assert!(registry.find("root@crm.test").is_some_and(User::is_admin));
        Ok(())
    }

    #[test]
    fn registration_checks_input() -> Result<(), AppError> {
        let (mut registry, admin) = registry()?;

        assert!(registry.register(Some(&admin), "root@crm.test", "Again").is_err());
        assert!(registry.register(Some(&admin), "not-an-email", "X").is_err());
        assert!(registry.register(Some(&admin), "", "X").is_err());
        assert!(matches!(
            registry.toggle_access(&admin, "root@crm.test"),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            registry.toggle_access(&admin, "ghost@crm.test"),
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(registry.acting(None), Err(AppError::Forbidden(_))));
        Ok(())
    }
}
