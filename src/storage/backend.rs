use std::sync::Arc;

use crate::prelude::{AppError, Organization, OrganizationDraft, OrganizationPatch, Version};

/// Persistence/transport collaborator for organizations.
///
/// `update` and `delete` carry the caller's last observed version. An
/// implementation must compare it with the stored version and write in one
/// step, and must report a mismatch as `AppError::VersionConflict` and a
/// missing record as `AppError::NotFound`.
pub trait OrganizationBackend: Send + Sync {
    fn list(&self) -> Result<Vec<Organization>, AppError>;

    fn create(&self, draft: OrganizationDraft) -> Result<Organization, AppError>;

    fn update(
        &self,
        id: &str,
        patch: OrganizationPatch,
        expected: &Version,
    ) -> Result<Organization, AppError>;

    fn delete(&self, id: &str, expected: &Version) -> Result<(), AppError>;

    /// Unconditional overwrite. Returns the records as stored, with versions.
    fn replace_all(&self, organizations: Vec<Organization>)
    -> Result<Vec<Organization>, AppError>;

    fn get_medium(&self) -> &str;
}

// Lets several sessions share one backend.
impl<B: OrganizationBackend + ?Sized> OrganizationBackend for Arc<B> {
    fn list(&self) -> Result<Vec<Organization>, AppError> {
        (**self).list()
    }

    fn create(&self, draft: OrganizationDraft) -> Result<Organization, AppError> {
        (**self).create(draft)
    }

    fn update(
        &self,
        id: &str,
        patch: OrganizationPatch,
        expected: &Version,
    ) -> Result<Organization, AppError> {
        (**self).update(id, patch, expected)
    }

    fn delete(&self, id: &str, expected: &Version) -> Result<(), AppError> {
        (**self).delete(id, expected)
    }

    fn replace_all(
        &self,
        organizations: Vec<Organization>,
    ) -> Result<Vec<Organization>, AppError> {
        (**self).replace_all(organizations)
    }

    fn get_medium(&self) -> &str {
        (**self).get_medium()
    }
}
