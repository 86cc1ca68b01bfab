use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::http::{header, Method, Request};
use axum::response::Response;
use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;
use serde_json::Value;

use crate::applications::domain::{AgeInput, Application, ApplicationFields, ApplicationId};
use crate::applications::notifier::{Notifier, NotifierError, SubmissionEvent};
use crate::applications::repository::{ApplicationRepository, RepositoryError};
use crate::applications::router::{application_router, APPLICANT_KEY_HEADER};
use crate::applications::service::ModApplicationService;
use crate::applications::store::InMemoryApplicationRepository;
use crate::applications::{ReviewerAllowlist, ReviewerPolicy};

/// Owner of the reviewer list in routing fixtures.
pub(super) const REVIEWER: &str = "beegboss1919#0";
pub(super) const MODERATOR: &str = "lead#4";

pub(super) fn fixture_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 7, 12, 18, 0, 0)
        .single()
        .expect("valid fixture timestamp")
}

pub(super) fn fields() -> ApplicationFields {
    ApplicationFields {
        age: AgeInput::Number(25),
        experience: "Ran the support channel of a 4k member server for a year".to_string(),
        motivation: "I am online most evenings and want to keep chat friendly".to_string(),
        scenario: "Warn privately first, then time out, then escalate to an admin".to_string(),
        timezone: Some("CET".to_string()),
        contact: Some("applicant@example.com".to_string()),
    }
}

pub(super) fn fields_with_age(age: impl Into<AgeInput>) -> ApplicationFields {
    ApplicationFields {
        age: age.into(),
        ..fields()
    }
}

/// Clock that moves one minute forward on every reading.
pub(super) struct StepClock(Mutex<DateTime<Utc>>);

impl StepClock {
    pub(super) fn starting_at(start: DateTime<Utc>) -> Self {
        Self(Mutex::new(start))
    }
}

impl Clock for StepClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        let mut now = self.0.lock().expect("clock mutex poisoned");
        let current = *now;
        *now += TimeDelta::minutes(1);
        current
    }
}

/// Clock stuck at one instant, for tie-breaking checks.
pub(super) struct FrozenClock(pub(super) DateTime<Utc>);

impl Clock for FrozenClock {
    fn local(&self) -> DateTime<Local> {
        self.0.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.0
    }
}

pub(super) fn build_service() -> (
    ModApplicationService<InMemoryApplicationRepository>,
    Arc<InMemoryApplicationRepository>,
) {
    let repository = Arc::new(InMemoryApplicationRepository::default());
    let service = ModApplicationService::new(repository.clone())
        .with_clock(Arc::new(StepClock::starting_at(fixture_time())));
    (service, repository)
}

pub(super) fn records_for(
    repository: &InMemoryApplicationRepository,
    applicant_key: &str,
) -> Vec<Application> {
    repository
        .list_all()
        .expect("list succeeds")
        .into_iter()
        .filter(|record| record.applicant_key == applicant_key)
        .collect()
}

#[derive(Default)]
pub(super) struct RecordingNotifier {
    events: Mutex<Vec<SubmissionEvent>>,
}

impl RecordingNotifier {
    pub(super) fn events(&self) -> Vec<SubmissionEvent> {
        self.events.lock().expect("notifier mutex poisoned").clone()
    }

    /// Poll until `count` events arrived or a second passed.
    pub(super) async fn wait_for(&self, count: usize) -> Vec<SubmissionEvent> {
        for _ in 0..200 {
            let events = self.events();
            if events.len() >= count {
                return events;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        self.events()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, event: SubmissionEvent) -> Result<(), NotifierError> {
        self.events
            .lock()
            .expect("notifier mutex poisoned")
            .push(event);
        Ok(())
    }
}

#[derive(Default)]
pub(super) struct FailingNotifier {
    attempts: Mutex<usize>,
}

impl FailingNotifier {
    pub(super) fn attempts(&self) -> usize {
        *self.attempts.lock().expect("notifier mutex poisoned")
    }
}

#[async_trait]
impl Notifier for FailingNotifier {
    async fn notify(&self, _event: SubmissionEvent) -> Result<(), NotifierError> {
        *self.attempts.lock().expect("notifier mutex poisoned") += 1;
        Err(NotifierError::Transport("webhook offline".to_string()))
    }
}

pub(super) struct UnavailableRepository;

impl ApplicationRepository for UnavailableRepository {
    fn get_by_key(&self, _applicant_key: &str) -> Result<Option<Application>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn get_by_id(&self, _id: &ApplicationId) -> Result<Option<Application>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn put(&self, _application: Application) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn delete(&self, _id: &ApplicationId) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list_all(&self) -> Result<Vec<Application>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

/// Simulates another writer claiming the applicant key between our read and write.
pub(super) struct RacingRepository;

impl ApplicationRepository for RacingRepository {
    fn get_by_key(&self, _applicant_key: &str) -> Result<Option<Application>, RepositoryError> {
        Ok(None)
    }

    fn get_by_id(&self, _id: &ApplicationId) -> Result<Option<Application>, RepositoryError> {
        Ok(None)
    }

    fn put(&self, application: Application) -> Result<(), RepositoryError> {
        Err(RepositoryError::Conflict(application.applicant_key))
    }

    fn delete(&self, _id: &ApplicationId) -> Result<(), RepositoryError> {
        Err(RepositoryError::NotFound)
    }

    fn list_all(&self) -> Result<Vec<Application>, RepositoryError> {
        Ok(Vec::new())
    }
}

pub(super) fn router_with_service(
    service: ModApplicationService<InMemoryApplicationRepository>,
) -> axum::Router {
    let reviewers: Arc<dyn ReviewerPolicy> =
        Arc::new(ReviewerAllowlist::new([MODERATOR]).with_owners([REVIEWER]));
    application_router(Arc::new(service), reviewers)
}

pub(super) fn json_request(
    method: Method,
    uri: &str,
    applicant_key: Option<&str>,
    body: &Value,
) -> Request<axum::body::Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(key) = applicant_key {
        builder = builder.header(APPLICANT_KEY_HEADER, key);
    }
    builder
        .body(axum::body::Body::from(
            serde_json::to_vec(body).expect("encode body"),
        ))
        .expect("request builds")
}

pub(super) fn empty_request(
    method: Method,
    uri: &str,
    applicant_key: Option<&str>,
) -> Request<axum::body::Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(key) = applicant_key {
        builder = builder.header(APPLICANT_KEY_HEADER, key);
    }
    builder
        .body(axum::body::Body::empty())
        .expect("request builds")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
