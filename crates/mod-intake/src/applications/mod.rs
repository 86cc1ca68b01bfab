//! Moderator application intake, review, and notification.
//!
//! [`ModApplicationService`] is the only component that changes application state. Storage,
//! notifications, and reviewer authorization are supplied from outside through the
//! [`ApplicationRepository`], [`Notifier`], and [`ReviewerPolicy`] seams.

pub mod authorization;
pub mod domain;
pub mod notifier;
pub mod repository;
pub mod review;
pub mod router;
pub mod service;
pub mod store;
pub mod validation;

#[cfg(test)]
mod tests;

pub use authorization::{ReviewerAllowlist, ReviewerError, ReviewerPolicy};
pub use domain::{
    AgeInput, Application, ApplicationCounts, ApplicationFields, ApplicationId,
    ApplicationStatus, ReviewDecision, StatusFilter,
};
pub use notifier::{
    NotificationDispatcher, Notifier, NotifierError, SubmissionEvent, WebhookNotifier,
};
pub use repository::{ApplicationRepository, RepositoryError};
pub use review::{review_queue, tally, ReviewQuery};
pub use router::{application_router, ReviewerGrant, StatusUpdate, APPLICANT_KEY_HEADER};
pub use service::{ApplicationServiceError, ModApplicationService};
pub use store::{InMemoryApplicationRepository, JsonFileApplicationRepository};
pub use validation::{AgePolicy, IntakeGuard, ValidationError, MAX_AGE, MIN_AGE};
