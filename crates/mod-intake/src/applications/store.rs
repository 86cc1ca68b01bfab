//! Bundled repository implementations.
//!
//! [`InMemoryApplicationRepository`] backs tests and demos. [`JsonFileApplicationRepository`]
//! keeps the whole record list as one JSON array on disk, which is enough for a single
//! moderation team running the service on one host.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use super::domain::{Application, ApplicationId};
use super::repository::{remove, upsert, ApplicationRepository, RepositoryError};

fn lock_records(
    records: &Mutex<Vec<Application>>,
) -> Result<MutexGuard<'_, Vec<Application>>, RepositoryError> {
    records
        .lock()
        .map_err(|_| RepositoryError::Unavailable("repository mutex poisoned".to_string()))
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryApplicationRepository {
    records: Arc<Mutex<Vec<Application>>>,
}

impl InMemoryApplicationRepository {
    pub fn len(&self) -> Result<usize, RepositoryError> {
        Ok(lock_records(&self.records)?.len())
    }

    pub fn is_empty(&self) -> Result<bool, RepositoryError> {
        Ok(self.len()? == 0)
    }
}

impl ApplicationRepository for InMemoryApplicationRepository {
    fn get_by_key(&self, applicant_key: &str) -> Result<Option<Application>, RepositoryError> {
        let guard = lock_records(&self.records)?;
        Ok(guard
            .iter()
            .find(|record| record.applicant_key == applicant_key)
            .cloned())
    }

    fn get_by_id(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError> {
        let guard = lock_records(&self.records)?;
        Ok(guard.iter().find(|record| &record.id == id).cloned())
    }

    fn put(&self, application: Application) -> Result<(), RepositoryError> {
        let mut guard = lock_records(&self.records)?;
        upsert(&mut guard, application)
    }

    fn delete(&self, id: &ApplicationId) -> Result<(), RepositoryError> {
        let mut guard = lock_records(&self.records)?;
        remove(&mut guard, id)
    }

    fn list_all(&self) -> Result<Vec<Application>, RepositoryError> {
        Ok(lock_records(&self.records)?.clone())
    }
}

/// File-backed store. Every mutation rewrites the file before the in-memory copy changes,
/// so a failed write leaves both untouched.
#[derive(Debug)]
pub struct JsonFileApplicationRepository {
    path: PathBuf,
    records: Mutex<Vec<Application>>,
}

impl JsonFileApplicationRepository {
    /// Open the store at `path`, starting empty when the file does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, RepositoryError> {
        let path = path.into();
        let records = match fs::read(&path) {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Vec::new(),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|err| {
                RepositoryError::Unavailable(format!(
                    "failed to parse application store {}: {err}",
                    path.display()
                ))
            })?,
            Err(err) if err.kind() == ErrorKind::NotFound => Vec::new(),
            Err(err) => {
                return Err(RepositoryError::Unavailable(format!(
                    "failed to read application store {}: {err}",
                    path.display()
                )))
            }
        };

        Ok(Self {
            path,
            records: Mutex::new(records),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn mutate<F>(&self, change: F) -> Result<(), RepositoryError>
    where
        F: FnOnce(&mut Vec<Application>) -> Result<(), RepositoryError>,
    {
        let mut guard = lock_records(&self.records)?;
        let mut next = guard.clone();
        change(&mut next)?;
        self.persist(&next)?;
        *guard = next;
        Ok(())
    }

    fn persist(&self, records: &[Application]) -> Result<(), RepositoryError> {
        let encoded = serde_json::to_vec_pretty(records).map_err(|err| {
            RepositoryError::Unavailable(format!("failed to encode applications: {err}"))
        })?;

        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, encoded)
            .and_then(|_| fs::rename(&staging, &self.path))
            .map_err(|err| {
                RepositoryError::Unavailable(format!(
                    "failed to write application store {}: {err}",
                    self.path.display()
                ))
            })
    }
}

impl ApplicationRepository for JsonFileApplicationRepository {
    fn get_by_key(&self, applicant_key: &str) -> Result<Option<Application>, RepositoryError> {
        let guard = lock_records(&self.records)?;
        Ok(guard
            .iter()
            .find(|record| record.applicant_key == applicant_key)
            .cloned())
    }

    fn get_by_id(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError> {
        let guard = lock_records(&self.records)?;
        Ok(guard.iter().find(|record| &record.id == id).cloned())
    }

    fn put(&self, application: Application) -> Result<(), RepositoryError> {
        self.mutate(|records| upsert(records, application))
    }

    fn delete(&self, id: &ApplicationId) -> Result<(), RepositoryError> {
        self.mutate(|records| remove(records, id))
    }

    fn list_all(&self) -> Result<Vec<Application>, RepositoryError> {
        Ok(lock_records(&self.records)?.clone())
    }
}
