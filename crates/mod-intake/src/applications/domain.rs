use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::validation::ValidatedSubmission;

/// Identifier wrapper for stored applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationId(pub String);

impl ApplicationId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ApplicationId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Review state of an application. Serialized lowercase in every backing store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    /// Approved and rejected applications only re-enter review through resubmission.
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            ApplicationStatus::Approved | ApplicationStatus::Rejected
        )
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcomes a reviewer may assign. `Pending` is deliberately absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewDecision {
    Approved,
    Rejected,
}

impl From<ReviewDecision> for ApplicationStatus {
    fn from(value: ReviewDecision) -> Self {
        match value {
            ReviewDecision::Approved => ApplicationStatus::Approved,
            ReviewDecision::Rejected => ApplicationStatus::Rejected,
        }
    }
}

/// Status tab selected in the review queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Pending,
    Approved,
    Rejected,
}

impl StatusFilter {
    pub const fn matches(self, status: ApplicationStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Pending => matches!(status, ApplicationStatus::Pending),
            StatusFilter::Approved => matches!(status, ApplicationStatus::Approved),
            StatusFilter::Rejected => matches!(status, ApplicationStatus::Rejected),
        }
    }
}

impl From<ApplicationStatus> for StatusFilter {
    fn from(value: ApplicationStatus) -> Self {
        match value {
            ApplicationStatus::Pending => StatusFilter::Pending,
            ApplicationStatus::Approved => StatusFilter::Approved,
            ApplicationStatus::Rejected => StatusFilter::Rejected,
        }
    }
}

/// Age as typed by the applicant. Forms post strings, API clients post numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AgeInput {
    Number(i64),
    Text(String),
}

impl From<i64> for AgeInput {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for AgeInput {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Raw answers submitted by an applicant before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationFields {
    pub age: AgeInput,
    #[serde(default)]
    pub experience: String,
    #[serde(default)]
    pub motivation: String,
    #[serde(default)]
    pub scenario: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
}

/// Canonical application record shared by every repository implementation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub applicant_key: String,
    pub age: u8,
    pub timezone: Option<String>,
    pub experience: String,
    pub motivation: String,
    pub scenario: String,
    #[serde(default)]
    pub contact: Option<String>,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Application {
    pub(crate) fn create(
        id: ApplicationId,
        submission: ValidatedSubmission,
        now: DateTime<Utc>,
    ) -> Self {
        let ValidatedSubmission {
            applicant_key,
            age,
            timezone,
            experience,
            motivation,
            scenario,
            contact,
        } = submission;

        Self {
            id,
            applicant_key,
            age,
            timezone,
            experience,
            motivation,
            scenario,
            contact,
            status: ApplicationStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite the answers from a resubmission and send the record back to review.
    ///
    /// `id`, `applicant_key`, and `created_at` survive untouched.
    pub(crate) fn resubmit(&mut self, submission: ValidatedSubmission, now: DateTime<Utc>) {
        self.age = submission.age;
        self.timezone = submission.timezone;
        self.experience = submission.experience;
        self.motivation = submission.motivation;
        self.scenario = submission.scenario;
        self.contact = submission.contact;
        self.status = ApplicationStatus::Pending;
        self.updated_at = now;
    }

    /// Case-insensitive substring match; `needle` must already be lowercase.
    pub(crate) fn matches_search(&self, needle: &str) -> bool {
        self.applicant_key.to_lowercase().contains(needle)
            || self
                .contact
                .as_deref()
                .is_some_and(|contact| contact.to_lowercase().contains(needle))
    }
}

/// Per-status totals shown above the review queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationCounts {
    pub total: usize,
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
}

impl ApplicationCounts {
    pub fn record(&mut self, status: ApplicationStatus) {
        self.total += 1;
        match status {
            ApplicationStatus::Pending => self.pending += 1,
            ApplicationStatus::Approved => self.approved += 1,
            ApplicationStatus::Rejected => self.rejected += 1,
        }
    }

    pub fn for_status(&self, status: ApplicationStatus) -> usize {
        match status {
            ApplicationStatus::Pending => self.pending,
            ApplicationStatus::Approved => self.approved,
            ApplicationStatus::Rejected => self.rejected,
        }
    }
}
