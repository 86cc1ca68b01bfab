use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use mockable::{Clock, DefaultClock};
use tracing::info;

use super::domain::{
    Application, ApplicationCounts, ApplicationFields, ApplicationId, ApplicationStatus,
    ReviewDecision,
};
use super::notifier::{NotificationDispatcher, Notifier, SubmissionEvent};
use super::repository::{ApplicationRepository, RepositoryError};
use super::review::{review_queue, tally, ReviewQuery};
use super::validation::{IntakeGuard, ValidationError};

/// Lifecycle engine: intake validation, per-applicant upsert, reviewer transitions, and
/// the derived review queue.
///
/// Mutating calls run one at a time against the repository, each as a single
/// read-modify-write. Reads go straight to the repository.
pub struct ModApplicationService<R> {
    guard: IntakeGuard,
    repository: Arc<R>,
    notifications: NotificationDispatcher,
    clock: Arc<dyn Clock + Send + Sync>,
    writes: Mutex<()>,
}

impl<R> ModApplicationService<R>
where
    R: ApplicationRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            guard: IntakeGuard::default(),
            repository,
            notifications: NotificationDispatcher::disabled(),
            clock: Arc::new(DefaultClock),
            writes: Mutex::new(()),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifications = NotificationDispatcher::new(notifier);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_guard(mut self, guard: IntakeGuard) -> Self {
        self.guard = guard;
        self
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    fn exclusive(&self) -> MutexGuard<'_, ()> {
        // The guarded value is `()`, so a poisoned lock carries no broken state.
        self.writes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create or overwrite the applicant's application. The result is always pending.
    pub fn submit(
        &self,
        applicant_key: &str,
        fields: ApplicationFields,
    ) -> Result<Application, ApplicationServiceError> {
        let submission = self.guard.validate(applicant_key, fields)?;

        let (application, previous) = {
            let _write = self.exclusive();
            let now = self.clock.utc();

            let (application, previous) =
                match self.repository.get_by_key(&submission.applicant_key)? {
                    Some(mut existing) => {
                        let previous = existing.status;
                        existing.resubmit(submission, now);
                        (existing, Some(previous))
                    }
                    None => (
                        Application::create(ApplicationId::generate(), submission, now),
                        None,
                    ),
                };

            self.repository.put(application.clone())?;
            (application, previous)
        };
        let resubmission = previous.is_some();

        info!(
            application_id = %application.id,
            applicant_key = %application.applicant_key,
            resubmission,
            reopened = previous.is_some_and(ApplicationStatus::is_terminal),
            "application submitted for review"
        );

        self.notifications
            .dispatch(SubmissionEvent::from_application(&application, resubmission));

        Ok(application)
    }

    /// Record a reviewer decision. Re-applying the current status is a no-op.
    pub fn set_status(
        &self,
        id: &ApplicationId,
        decision: ReviewDecision,
    ) -> Result<Application, ApplicationServiceError> {
        let status = ApplicationStatus::from(decision);
        let _write = self.exclusive();

        let mut application = self
            .repository
            .get_by_id(id)?
            .ok_or_else(|| ApplicationServiceError::NotFound(id.clone()))?;

        if application.status == status {
            return Ok(application);
        }

        let previous = application.status;
        application.status = status;
        application.updated_at = self.clock.utc();
        self.repository.put(application.clone())?;

        info!(
            application_id = %application.id,
            applicant_key = %application.applicant_key,
            from = %previous,
            to = %status,
            "application status changed"
        );

        Ok(application)
    }

    /// Permanently remove an application. Deleting twice reports `NotFound`.
    pub fn delete(&self, id: &ApplicationId) -> Result<(), ApplicationServiceError> {
        let _write = self.exclusive();

        let application = self
            .repository
            .get_by_id(id)?
            .ok_or_else(|| ApplicationServiceError::NotFound(id.clone()))?;

        self.repository.delete(id).map_err(|err| match err {
            RepositoryError::NotFound => ApplicationServiceError::NotFound(id.clone()),
            other => ApplicationServiceError::Repository(other),
        })?;

        info!(
            application_id = %id,
            applicant_key = %application.applicant_key,
            "application deleted"
        );
        Ok(())
    }

    pub fn list_for_review(
        &self,
        query: &ReviewQuery,
    ) -> Result<Vec<Application>, ApplicationServiceError> {
        let records = self.repository.list_all()?;
        Ok(review_queue(records, query))
    }

    pub fn counts(&self) -> Result<ApplicationCounts, ApplicationServiceError> {
        let records = self.repository.list_all()?;
        Ok(tally(&records))
    }

    /// Fetch an application for the reviewer detail view.
    pub fn get(&self, id: &ApplicationId) -> Result<Application, ApplicationServiceError> {
        self.repository
            .get_by_id(id)?
            .ok_or_else(|| ApplicationServiceError::NotFound(id.clone()))
    }

    /// The applicant's own application, if they have submitted one.
    pub fn find_for_applicant(
        &self,
        applicant_key: &str,
    ) -> Result<Option<Application>, ApplicationServiceError> {
        let applicant_key = applicant_key.trim();
        if applicant_key.is_empty() {
            return Err(ValidationError::EmptyApplicantKey.into());
        }
        Ok(self.repository.get_by_key(applicant_key)?)
    }
}

/// Error raised by the application service.
#[derive(Debug, thiserror::Error)]
pub enum ApplicationServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("application {0} not found")]
    NotFound(ApplicationId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
