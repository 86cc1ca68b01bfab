use metrics_exporter_prometheus::PrometheusHandle;
use mod_intake::applications::{
    Application, ApplicationId, ApplicationRepository, InMemoryApplicationRepository,
    JsonFileApplicationRepository, ModApplicationService, Notifier, NotifierError,
    RepositoryError, SubmissionEvent, WebhookNotifier,
};
use mod_intake::config::{NotifierConfig, StorageConfig};
use mod_intake::error::AppError;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Store selected by `APP_STORE_PATH`.
pub(crate) enum ConfiguredRepository {
    Memory(InMemoryApplicationRepository),
    File(JsonFileApplicationRepository),
}

impl ConfiguredRepository {
    pub(crate) fn from_config(config: &StorageConfig) -> Result<Self, RepositoryError> {
        match &config.store_path {
            Some(path) => {
                let store = JsonFileApplicationRepository::open(path)?;
                info!(path = %store.path().display(), "using json application store");
                Ok(Self::File(store))
            }
            None => {
                info!("using in-memory application store");
                Ok(Self::Memory(InMemoryApplicationRepository::default()))
            }
        }
    }

    fn inner(&self) -> &dyn ApplicationRepository {
        match self {
            Self::Memory(store) => store,
            Self::File(store) => store,
        }
    }
}

impl ApplicationRepository for ConfiguredRepository {
    fn get_by_key(&self, applicant_key: &str) -> Result<Option<Application>, RepositoryError> {
        self.inner().get_by_key(applicant_key)
    }

    fn get_by_id(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError> {
        self.inner().get_by_id(id)
    }

    fn put(&self, application: Application) -> Result<(), RepositoryError> {
        self.inner().put(application)
    }

    fn delete(&self, id: &ApplicationId) -> Result<(), RepositoryError> {
        self.inner().delete(id)
    }

    fn list_all(&self) -> Result<Vec<Application>, RepositoryError> {
        self.inner().list_all()
    }
}

/// Keeps every submission event in memory; used by the demo to show what a webhook would get.
#[derive(Default, Clone)]
pub(crate) struct InMemoryNotifier {
    events: Arc<Mutex<Vec<SubmissionEvent>>>,
}

#[async_trait::async_trait]
impl Notifier for InMemoryNotifier {
    async fn notify(&self, event: SubmissionEvent) -> Result<(), NotifierError> {
        let mut guard = self
            .events
            .lock()
            .map_err(|_| NotifierError::Transport("notifier mutex poisoned".to_string()))?;
        guard.push(event);
        Ok(())
    }
}

impl InMemoryNotifier {
    pub(crate) fn events(&self) -> Vec<SubmissionEvent> {
        self.events
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

pub(crate) fn webhook_from_config(
    config: &NotifierConfig,
) -> Result<Option<Arc<dyn Notifier>>, NotifierError> {
    let Some(url) = &config.webhook_url else {
        return Ok(None);
    };
    let notifier = WebhookNotifier::new(url.clone(), config.timeout)?;
    info!(timeout_secs = config.timeout.as_secs(), "submission webhook enabled");
    Ok(Some(Arc::new(notifier)))
}

pub(crate) fn build_application_service(
    storage: &StorageConfig,
    notifier: &NotifierConfig,
) -> Result<ModApplicationService<ConfiguredRepository>, AppError> {
    let repository = Arc::new(ConfiguredRepository::from_config(storage)?);
    let service = ModApplicationService::new(repository);
    Ok(match webhook_from_config(notifier)? {
        Some(webhook) => service.with_notifier(webhook),
        None => service,
    })
}
