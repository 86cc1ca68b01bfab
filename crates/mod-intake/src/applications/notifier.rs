use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::domain::Application;

/// Payload handed to the notifier after a submission is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionEvent {
    pub applicant_key: String,
    pub age: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    pub experience: String,
    pub motivation: String,
    pub scenario: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    pub resubmission: bool,
    pub submitted_at: DateTime<Utc>,
}

impl SubmissionEvent {
    pub fn from_application(application: &Application, resubmission: bool) -> Self {
        Self {
            applicant_key: application.applicant_key.clone(),
            age: application.age,
            timezone: application.timezone.clone(),
            experience: application.experience.clone(),
            motivation: application.motivation.clone(),
            scenario: application.scenario.clone(),
            contact: application.contact.clone(),
            resubmission,
            submitted_at: application.updated_at,
        }
    }
}

/// Notifier failure. The lifecycle engine logs these and carries on.
#[derive(Debug, thiserror::Error)]
pub enum NotifierError {
    #[error("notifier transport unavailable: {0}")]
    Transport(String),
    #[error("notifier endpoint answered with HTTP {0}")]
    Rejected(u16),
}

/// Outbound side channel (webhook, chat bot, mail relay) told about new submissions.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, event: SubmissionEvent) -> Result<(), NotifierError>;
}

/// Fires notifications on the ambient tokio runtime without waiting for them.
#[derive(Clone, Default)]
pub struct NotificationDispatcher {
    notifier: Option<Arc<dyn Notifier>>,
}

impl NotificationDispatcher {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self {
            notifier: Some(notifier),
        }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.notifier.is_some()
    }

    /// At most one attempt per event; failures are logged and dropped.
    pub fn dispatch(&self, event: SubmissionEvent) {
        let Some(notifier) = self.notifier.clone() else {
            return;
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    let applicant_key = event.applicant_key.clone();
                    match notifier.notify(event).await {
                        Ok(()) => debug!(%applicant_key, "submission notification delivered"),
                        Err(err) => warn!(
                            %applicant_key,
                            error = %err,
                            "submission notification failed"
                        ),
                    }
                });
            }
            Err(_) => warn!(
                applicant_key = %event.applicant_key,
                "no async runtime available, submission notification skipped"
            ),
        }
    }
}

const EMBED_TITLE: &str = "New Mod Application";
const EMBED_COLOR: u32 = 0x5865F2;
const EMBED_FIELD_LIMIT: usize = 1024;

/// Posts a chat-style embed to an incoming-webhook URL.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    endpoint: String,
}

impl WebhookNotifier {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, NotifierError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| NotifierError::Transport(err.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn payload(event: &SubmissionEvent) -> Value {
        let mut fields = vec![
            embed_field("Discord Username", &event.applicant_key),
            embed_field("Age", &event.age.to_string()),
        ];
        if let Some(timezone) = &event.timezone {
            fields.push(embed_field("Timezone", timezone));
        }
        fields.push(embed_field("Moderation Experience", &event.experience));
        fields.push(embed_field("Motivation", &event.motivation));
        fields.push(embed_field("Scenario Response", &event.scenario));

        let title = if event.resubmission {
            format!("{EMBED_TITLE} (updated)")
        } else {
            EMBED_TITLE.to_string()
        };

        json!({
            "content": Value::Null,
            "embeds": [{
                "title": title,
                "color": EMBED_COLOR,
                "fields": fields,
                "timestamp": event.submitted_at.to_rfc3339(),
            }],
        })
    }
}

fn embed_field(name: &str, value: &str) -> Value {
    let value = if value.chars().count() > EMBED_FIELD_LIMIT {
        let mut clipped: String = value.chars().take(EMBED_FIELD_LIMIT - 1).collect();
        clipped.push('…');
        clipped
    } else {
        value.to_string()
    };

    json!({ "name": name, "value": value, "inline": false })
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, event: SubmissionEvent) -> Result<(), NotifierError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&Self::payload(&event))
            .send()
            .await
            .map_err(|err| NotifierError::Transport(err.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(NotifierError::Rejected(status.as_u16()))
        }
    }
}
