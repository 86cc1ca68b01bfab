use super::domain::{Application, ApplicationId};

/// Storage abstraction so the lifecycle engine can run against any backing store.
///
/// `list_all` returns records in insertion order; replacing a record through `put` keeps
/// its original position. `put` must refuse a record whose applicant key already belongs
/// to a different id, so per-applicant uniqueness holds even when several engines share
/// one store.
pub trait ApplicationRepository: Send + Sync {
    fn get_by_key(&self, applicant_key: &str) -> Result<Option<Application>, RepositoryError>;
    fn get_by_id(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError>;
    fn put(&self, application: Application) -> Result<(), RepositoryError>;
    fn delete(&self, id: &ApplicationId) -> Result<(), RepositoryError>;
    fn list_all(&self) -> Result<Vec<Application>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("applicant {0} already has an application")]
    Conflict(String),
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Insert-or-replace by id, shared by the bundled stores.
pub(crate) fn upsert(
    records: &mut Vec<Application>,
    application: Application,
) -> Result<(), RepositoryError> {
    let taken = records.iter().any(|stored| {
        stored.applicant_key == application.applicant_key && stored.id != application.id
    });
    if taken {
        return Err(RepositoryError::Conflict(application.applicant_key));
    }

    match records.iter_mut().find(|stored| stored.id == application.id) {
        Some(stored) => *stored = application,
        None => records.push(application),
    }
    Ok(())
}

pub(crate) fn remove(
    records: &mut Vec<Application>,
    id: &ApplicationId,
) -> Result<(), RepositoryError> {
    let position = records
        .iter()
        .position(|stored| &stored.id == id)
        .ok_or(RepositoryError::NotFound)?;
    records.remove(position);
    Ok(())
}
