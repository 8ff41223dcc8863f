use std::sync::Mutex;

use super::*;
use crate::helper;
use crate::prelude::{OrganizationDraft, OrganizationPatch, Utc, Version};
use tracing::{debug, info, warn};

/// In-process organization backend.
///
/// All reads and writes go through one mutex, so the version comparison and
/// the write it guards happen as a single step even when several sessions
/// share the backend.
pub struct LocalBackend {
    pub medium: String,
    records: Mutex<Vec<Organization>>,
    store: Box<dyn RecordStore<Organization>>,
}

impl LocalBackend {
    pub fn open(store: Box<dyn RecordStore<Organization>>) -> Result<Self, AppError> {
        let mut records = store.load()?;

        // Records written by hand or by an older version carry no marker yet
        let mut stamped = 0usize;
        for org in records.iter_mut().filter(|org| org.version.is_none()) {
            stamp(org, None)?;
            stamped += 1;
        }
        if stamped > 0 {
            debug!(stamped, "issued versions for unversioned organizations");
            store.save(&records)?;
        }

        Ok(Self {
            medium: format!("local/{}", store.get_medium()),
            records: Mutex::new(records),
            store,
        })
    }

    pub fn in_memory() -> Result<Self, AppError> {
        Self::open(Box::new(stores::MemStorage::new()))
    }
}

impl OrganizationBackend for LocalBackend {
    fn list(&self) -> Result<Vec<Organization>, AppError> {
        Ok(self.records.lock()?.clone())
    }

    fn create(&self, draft: OrganizationDraft) -> Result<Organization, AppError> {
        let mut org = Organization::from_draft(draft, helper::new_id(), Utc::now());
        stamp(&mut org, None)?;

        let mut records = self.records.lock()?;
        records.push(org.clone());

        if let Err(e) = self.store.save(&records) {
            records.pop();
            return Err(e);
        }

        info!(id = %org.id, name = %org.name, "organization created");
        Ok(org)
    }

    fn update(
        &self,
        id: &str,
        patch: OrganizationPatch,
        expected: &Version,
    ) -> Result<Organization, AppError> {
        let mut records = self.records.lock()?;

        let index = position(&records, id)?;
        check_version(&records[index], expected)?;

        let mut updated = records[index].clone();
        updated.apply(patch);
        updated.updated_at = Utc::now();
        let previous_version = updated.version.take();
        stamp(&mut updated, previous_version.as_ref())?;

        let previous = std::mem::replace(&mut records[index], updated.clone());
        if let Err(e) = self.store.save(&records) {
            records[index] = previous;
            return Err(e);
        }

        info!(id, version = %version_of(&updated), "organization updated");
        Ok(updated)
    }

    fn delete(&self, id: &str, expected: &Version) -> Result<(), AppError> {
        let mut records = self.records.lock()?;

        let index = position(&records, id)?;
        check_version(&records[index], expected)?;

        let removed = records.remove(index);
        if let Err(e) = self.store.save(&records) {
            records.insert(index, removed);
            return Err(e);
        }

        info!(id, "organization deleted");
        Ok(())
    }

    fn replace_all(
        &self,
        organizations: Vec<Organization>,
    ) -> Result<Vec<Organization>, AppError> {
        let mut records = self.records.lock()?;

        // Markers chain on the stored one, or on a fresh seed for unknown ids.
        // An import never re-issues a marker seen before.
        let mut replacement = organizations;
        for org in replacement.iter_mut() {
            org.version = None;
            let previous = records
                .iter()
                .find(|current| current.id == org.id)
                .and_then(|current| current.version.clone())
                .unwrap_or_else(|| Version::new(helper::new_id()));
            stamp(org, Some(&previous))?;
        }

        self.store.save(&replacement)?;
        *records = replacement.clone();

        info!(count = replacement.len(), "organizations replaced");
        Ok(replacement)
    }

    fn get_medium(&self) -> &str {
        &self.medium
    }
}

fn stamp(org: &mut Organization, previous: Option<&Version>) -> Result<(), AppError> {
    org.version = Some(Version::chained(previous, &org.content_bytes()?));
    Ok(())
}

fn position(records: &[Organization], id: &str) -> Result<usize, AppError> {
    records
        .iter()
        .position(|org| org.id == id)
        .ok_or_else(|| AppError::NotFound(format!("Organization {}", id)))
}

fn check_version(current: &Organization, expected: &Version) -> Result<(), AppError> {
    if current.version.as_ref() == Some(expected) {
        return Ok(());
    }
    warn!(
        id = %current.id,
        expected = %expected,
        current = %version_of(current),
        "rejected stale organization write"
    );
    Err(AppError::VersionConflict(format!("Organization {}", current.id)))
}

fn version_of(org: &Organization) -> &str {
    org.version.as_ref().map(Version::as_str).unwrap_or("-")
}
