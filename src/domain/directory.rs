use super::*;

use crate::sheet::SheetCodec;
use crate::storage::{OrganizationBackend, RecordStore};
use crate::storage_port::{self, Delimiter};
use contact::{ContactDraft, ContactPatch};
use organization::{Organization, OrganizationDraft, OrganizationPatch};
use tracing::{info, warn};

/// One session's view of the organization and contact directory.
///
/// Organizations live behind an `OrganizationBackend` and are cached here
/// together with the version each one was last seen at. Contacts are kept in
/// a plain record store.
pub struct Directory {
    organizations: Vec<Organization>,
    contacts: Vec<Contact>,
    backend: Box<dyn OrganizationBackend>,
    contact_store: Box<dyn RecordStore<Contact>>,
}

/// Outcome of a successful import.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImportSummary {
    pub organizations: usize,
    pub contacts: usize,
    /// Non-empty contact emails, in import order.
    pub emails: Vec<String>,
}

impl ImportSummary {
    pub fn email_list(&self, delimiter: Delimiter) -> String {
        storage_port::format_emails(&self.emails, delimiter)
    }
}

impl Directory {
    pub fn new(
        backend: Box<dyn OrganizationBackend>,
        contact_store: Box<dyn RecordStore<Contact>>,
    ) -> Result<Self, AppError> {
        let mut directory = Self {
            organizations: Vec::new(),
            contacts: contact_store.load()?,
            backend,
            contact_store,
        };
        directory.refresh()?;
        Ok(directory)
    }

    pub fn get_medium(&self) -> &str {
        self.backend.get_medium()
    }

    pub fn list(&self) -> &[Organization] {
        &self.organizations
    }

    pub fn get(&self, id: &str) -> Option<&Organization> {
        self.organizations.iter().find(|org| org.id == id)
    }

    /// Re-reads organizations from the backend, dropping what was cached.
    pub fn refresh(&mut self) -> Result<(), AppError> {
        self.organizations = self.backend.list()?;
        Ok(())
    }

    pub fn create(&mut self, draft: OrganizationDraft) -> Result<Organization, AppError> {
        draft.validate()?;

        let org = self.backend.create(draft)?;
        self.organizations.push(org.clone());
        Ok(org)
    }

    pub fn update(
        &mut self,
        id: &str,
        patch: OrganizationPatch,
        expected: &Version,
    ) -> Result<Organization, AppError> {
        patch.validate()?;

        match self.backend.update(id, patch, expected) {
            Ok(org) => {
                match self.organizations.iter_mut().find(|cached| cached.id == org.id) {
                    Some(cached) => *cached = org.clone(),
                    None => self.organizations.push(org.clone()),
                }
                Ok(org)
            }
            Err(AppError::NotFound(what)) => {
                self.organizations.retain(|cached| cached.id != id);
                Err(AppError::NotFound(what))
            }
            Err(e) => Err(e),
        }
    }

    /// Deletes an organization and then every contact that belongs to it.
    pub fn delete(&mut self, id: &str, expected: &Version) -> Result<(), AppError> {
        match self.backend.delete(id, expected) {
            Ok(()) => {}
            Err(AppError::NotFound(what)) => {
                self.organizations.retain(|cached| cached.id != id);
                return Err(AppError::NotFound(what));
            }
            Err(e) => return Err(e),
        }
        self.organizations.retain(|cached| cached.id != id);

        let before = self.contacts.len();
        self.contacts.retain(|contact| contact.organization_id != id);
        let removed = before - self.contacts.len();

        if removed > 0 {
            if let Err(e) = self.contact_store.save(&self.contacts) {
                warn!(id, error = %e, "organization deleted but its contacts were not");
                return Err(e);
            }
            info!(id, removed, "contacts removed with their organization");
        }
        Ok(())
    }

    /// Update against the version this directory last saw.
    pub fn update_current(
        &mut self,
        id: &str,
        patch: OrganizationPatch,
    ) -> Result<Organization, AppError> {
        let expected = self.cached_version(id)?;
        self.update(id, patch, &expected)
    }

    /// Delete against the version this directory last saw.
    pub fn delete_current(&mut self, id: &str) -> Result<(), AppError> {
        let expected = self.cached_version(id)?;
        self.delete(id, &expected)
    }

    /// Overwrites both collections. No version checks.
    ///
    /// Contacts are written first; if the backend then fails they are put
    /// back so the two collections stay in step.
    pub fn replace_all(
        &mut self,
        organizations: Vec<Organization>,
        contacts: Vec<Contact>,
    ) -> Result<(), AppError> {
        self.contact_store.save(&contacts)?;

        match self.backend.replace_all(organizations) {
            Ok(stored) => {
                self.organizations = stored;
                self.contacts = contacts;
                Ok(())
            }
            Err(e) => {
                if let Err(restore) = self.contact_store.save(&self.contacts) {
                    warn!(error = %restore, "could not restore contacts after failed replace");
                }
                Err(e)
            }
        }
    }

    pub fn contacts(&self) -> Vec<&Contact> {
        self.contacts
            .iter()
            .filter(|contact| self.get(&contact.organization_id).is_some())
            .collect()
    }

    pub fn org_contacts(&self, org_id: &str) -> Vec<&Contact> {
        if self.get(org_id).is_none() {
            return Vec::new();
        }
        self.contacts
            .iter()
            .filter(|contact| contact.organization_id == org_id)
            .collect()
    }

    pub fn add_contact(&mut self, draft: ContactDraft) -> Result<Contact, AppError> {
        draft.validate()?;
        if self.get(&draft.organization_id).is_none() {
            return Err(AppError::NotFound(format!(
                "Organization {}",
                draft.organization_id
            )));
        }

        let contact = Contact::new(draft);
        self.contacts.push(contact.clone());
        if let Err(e) = self.contact_store.save(&self.contacts) {
            self.contacts.pop();
            return Err(e);
        }
        Ok(contact)
    }

    pub fn update_contact(&mut self, id: &str, patch: ContactPatch) -> Result<Contact, AppError> {
        if let Some(org_id) = &patch.organization_id
            && self.get(org_id).is_none()
        {
            return Err(AppError::NotFound(format!("Organization {}", org_id)));
        }

        let index = self
            .contacts
            .iter()
            .position(|contact| contact.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Contact {}", id)))?;

        let mut updated = self.contacts[index].clone();
        updated.apply(patch);
        ContactDraft {
            organization_id: updated.organization_id.clone(),
            name: updated.name.clone(),
            email: updated.email.clone(),
            ..Default::default()
        }
        .validate()?;

        let previous = std::mem::replace(&mut self.contacts[index], updated.clone());
        if let Err(e) = self.contact_store.save(&self.contacts) {
            self.contacts[index] = previous;
            return Err(e);
        }
        Ok(updated)
    }

    pub fn delete_contact(&mut self, id: &str) -> Result<(), AppError> {
        let index = self
            .contacts
            .iter()
            .position(|contact| contact.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Contact {}", id)))?;

        let removed = self.contacts.remove(index);
        if let Err(e) = self.contact_store.save(&self.contacts) {
            self.contacts.insert(index, removed);
            return Err(e);
        }
        Ok(())
    }

    /// Contact emails of the selected organizations, or of all of them when
    /// the selection is empty.
    pub fn recipients(&self, org_ids: &[String]) -> Vec<String> {
        self.organizations
            .iter()
            .filter(|org| org_ids.is_empty() || org_ids.contains(&org.id))
            .flat_map(|org| self.org_contacts(&org.id))
            .map(|contact| contact.email.trim())
            .filter(|email| !email.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Parses a workbook and replaces the whole directory with its content.
    /// Nothing is written when the document cannot be decoded.
    pub fn import(
        &mut self,
        bytes: &[u8],
        codec: &dyn SheetCodec,
    ) -> Result<ImportSummary, AppError> {
        let data = codec
            .parse(bytes)
            .and_then(|workbook| storage_port::import_workbook(&workbook))
            .map_err(|e| {
                let e = e.into_import_format();
                warn!(error = %e, "import rejected");
                e
            })?;

        let summary = ImportSummary {
            organizations: data.organizations.len(),
            contacts: data.contacts.len(),
            emails: storage_port::extract_contact_emails(&data.contacts),
        };

        self.replace_all(data.organizations, data.contacts)?;

        info!(
            organizations = summary.organizations,
            contacts = summary.contacts,
            "directory imported"
        );
        Ok(summary)
    }

    pub fn export(&self, codec: &dyn SheetCodec) -> Result<Vec<u8>, AppError> {
        let workbook = storage_port::export_workbook(&self.organizations, &self.contacts);
        codec.serialize(&workbook)
    }

    fn cached_version(&self, id: &str) -> Result<Version, AppError> {
        let org = self
            .get(id)
            .ok_or_else(|| AppError::NotFound(format!("Organization {}", id)))?;

        org.version
            .clone()
            .ok_or_else(|| AppError::Validation("Missing version for organization".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::CsvBundleCodec;
    use crate::storage::local::LocalBackend;
    use crate::storage::stores::MemStorage;

    fn directory() -> Directory {
        Directory::new(
            Box::new(LocalBackend::in_memory().unwrap()),
            Box::new(MemStorage::new()),
        )
        .unwrap()
    }

    fn contact(dir: &mut Directory, org_id: &str, name: &str, email: &str) -> Contact {
        let mut draft = ContactDraft::new(org_id, name);
        draft.email = email.to_string();
        dir.add_contact(draft).unwrap()
    }

    #[test]
    fn delete_cascades_to_contacts() -> Result<(), AppError> {
        let mut dir = directory();
        let a = dir.create(OrganizationDraft::new("A"))?;
        let b = dir.create(OrganizationDraft::new("B"))?;
        contact(&mut dir, &a.id, "Ann", "ann@a.test");
        contact(&mut dir, &a.id, "Al", "");
        let kept = contact(&mut dir, &b.id, "Bob", "bob@b.test");

        dir.delete(&a.id, a.version.as_ref().unwrap())?;

        assert!(dir.get(&a.id).is_none());
        assert!(dir.org_contacts(&a.id).is_empty());
        assert_eq!(dir.contacts(), vec![&kept]);
        Ok(())
    }

    #[test]
    fn conflict_leaves_cache_untouched() -> Result<(), AppError> {
        let mut dir = directory();
        let org = dir.create(OrganizationDraft::new("Acme"))?;
        let stale = org.version.clone().unwrap();

        dir.update_current(
            &org.id,
            OrganizationPatch {
                notes: Some("first".to_string()),
                ..Default::default()
            },
        )?;
        let result = dir.update(&org.id, OrganizationPatch::default(), &stale);

        assert!(matches!(result, Err(AppError::VersionConflict(_))));
        assert_eq!(dir.get(&org.id).unwrap().notes.as_deref(), Some("first"));
        Ok(())
    }

    #[test]
    fn cached_record_without_version_is_rejected() -> Result<(), AppError> {
        let mut dir = directory();
        let org = dir.create(OrganizationDraft::new("Acme"))?;
        dir.organizations[0].version = None;

        let result = dir.delete_current(&org.id);

        assert!(matches!(result, Err(AppError::Validation(m)) if m.contains("Missing version")));
        Ok(())
    }

    #[test]
    fn contacts_need_an_existing_organization() {
        let mut dir = directory();

        let result = dir.add_contact(ContactDraft::new("nowhere", "Ghost"));

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[test]
    fn contact_updates_and_deletes_persist() -> Result<(), AppError> {
        let mut dir = directory();
        let org = dir.create(OrganizationDraft::new("Acme"))?;
        let ann = contact(&mut dir, &org.id, "Ann", "ann@acme.test");

        let updated = dir.update_contact(
            &ann.id,
            ContactPatch {
                role_position: Some("CTO".to_string()),
                ..Default::default()
            },
        )?;
        assert_eq!(updated.role_position, "CTO");

        let bad = dir.update_contact(
            &ann.id,
            ContactPatch {
                email: Some("not-an-email".to_string()),
                ..Default::default()
            },
        );
        assert!(matches!(bad, Err(AppError::Validation(_))));

        dir.delete_contact(&ann.id)?;
        assert!(dir.org_contacts(&org.id).is_empty());
        assert!(matches!(
            dir.delete_contact(&ann.id),
            Err(AppError::NotFound(_))
        ));
        Ok(())
    }

    #[test]
    fn recipients_follow_selection_order() -> Result<(), AppError> {
        let mut dir = directory();
        let a = dir.create(OrganizationDraft::new("A"))?;
        let b = dir.create(OrganizationDraft::new("B"))?;
        contact(&mut dir, &b.id, "Bea", "bea@b.test");
        contact(&mut dir, &a.id, "Ann", "ann@a.test");
        contact(&mut dir, &a.id, "Anon", "");

        assert_eq!(dir.recipients(&[]), vec!["ann@a.test", "bea@b.test"]);
        assert_eq!(dir.recipients(std::slice::from_ref(&b.id)), vec!["bea@b.test"]);
        Ok(())
    }

    #[test]
    fn import_replaces_everything() -> Result<(), AppError> {
        let mut source = directory();
        let org = source.create(OrganizationDraft::new("Imported"))?;
        contact(&mut source, &org.id, "Ivy", "ivy@imported.test");
        let bytes = source.export(&CsvBundleCodec)?;

        let mut dir = directory();
        dir.create(OrganizationDraft::new("Old"))?;

        let summary = dir.import(&bytes, &CsvBundleCodec)?;

        assert_eq!(summary.organizations, 1);
        assert_eq!(summary.contacts, 1);
        assert_eq!(summary.email_list(Delimiter::Semicolon), "ivy@imported.test");
        assert_eq!(dir.list().len(), 1);
        assert_eq!(dir.list()[0].name, "Imported");
        assert!(dir.list()[0].version.is_some());
        Ok(())
    }

    #[test]
    fn undecodable_import_writes_nothing() -> Result<(), AppError> {
        let mut dir = directory();
        dir.create(OrganizationDraft::new("Keep"))?;

        let result = dir.import(b"definitely not a zip", &CsvBundleCodec);

        assert!(matches!(result, Err(AppError::ImportFormat(_))));
        assert_eq!(dir.list()[0].name, "Keep");
        Ok(())
    }
}
