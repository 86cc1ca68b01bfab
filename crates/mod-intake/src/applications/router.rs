use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use super::authorization::{ReviewerError, ReviewerPolicy};
use super::domain::{ApplicationFields, ApplicationId, ReviewDecision};
use super::repository::{ApplicationRepository, RepositoryError};
use super::review::ReviewQuery;
use super::service::{ApplicationServiceError, ModApplicationService};

/// Header carrying the applicant key resolved by the upstream identity proxy.
pub const APPLICANT_KEY_HEADER: &str = "x-applicant-key";

/// Shared handler state: the lifecycle service plus the reviewer capability.
pub struct ApplicationRouterState<R> {
    service: Arc<ModApplicationService<R>>,
    reviewers: Arc<dyn ReviewerPolicy>,
}

impl<R> Clone for ApplicationRouterState<R> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            reviewers: Arc::clone(&self.reviewers),
        }
    }
}

/// Body of a reviewer status change.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: ReviewDecision,
}

/// Body of an owner granting reviewer access.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewerGrant {
    pub applicant_key: String,
}

/// Router builder exposing applicant intake and reviewer endpoints.
pub fn application_router<R>(
    service: Arc<ModApplicationService<R>>,
    reviewers: Arc<dyn ReviewerPolicy>,
) -> Router
where
    R: ApplicationRepository + 'static,
{
    Router::new()
        .route("/api/v1/applications", post(submit_handler::<R>))
        .route("/api/v1/applications/me", get(own_application_handler::<R>))
        .route(
            "/api/v1/review/applications",
            get(review_queue_handler::<R>),
        )
        .route(
            "/api/v1/review/applications/:application_id",
            get(review_detail_handler::<R>).delete(delete_handler::<R>),
        )
        .route(
            "/api/v1/review/applications/:application_id/status",
            put(status_update_handler::<R>),
        )
        .route("/api/v1/review/counts", get(counts_handler::<R>))
        .route(
            "/api/v1/review/reviewers",
            get(reviewer_list_handler::<R>).post(reviewer_grant_handler::<R>),
        )
        .route(
            "/api/v1/review/reviewers/:applicant_key",
            delete(reviewer_revoke_handler::<R>),
        )
        .with_state(ApplicationRouterState { service, reviewers })
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let payload = json!({ "error": message.into() });
    (status, Json(payload)).into_response()
}

fn service_error_response(error: ApplicationServiceError) -> Response {
    match error {
        ApplicationServiceError::Validation(error) => {
            error_response(StatusCode::UNPROCESSABLE_ENTITY, error.to_string())
        }
        ApplicationServiceError::NotFound(id) => {
            error_response(StatusCode::NOT_FOUND, format!("application {id} not found"))
        }
        ApplicationServiceError::Repository(RepositoryError::Conflict(key)) => error_response(
            StatusCode::CONFLICT,
            format!("applicant {key} already has an application"),
        ),
        ApplicationServiceError::Repository(error) => {
            warn!(error = %error, "application repository failure");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, error.to_string())
        }
    }
}

fn reviewer_error_response(error: ReviewerError) -> Response {
    let status = match &error {
        ReviewerError::EmptyKey => StatusCode::UNPROCESSABLE_ENTITY,
        ReviewerError::NotAReviewer(_) => StatusCode::NOT_FOUND,
        ReviewerError::LastOwner(_) | ReviewerError::ReadOnly => StatusCode::CONFLICT,
    };
    error_response(status, error.to_string())
}

fn applicant_key(headers: &HeaderMap) -> Result<String, Response> {
    headers
        .get(APPLICANT_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            error_response(
                StatusCode::UNAUTHORIZED,
                format!("missing {APPLICANT_KEY_HEADER} header"),
            )
        })
}

fn require_reviewer<R>(
    state: &ApplicationRouterState<R>,
    headers: &HeaderMap,
) -> Result<String, Response> {
    let key = applicant_key(headers)?;
    if state.reviewers.is_reviewer(&key) {
        Ok(key)
    } else {
        Err(error_response(
            StatusCode::FORBIDDEN,
            "reviewer access required",
        ))
    }
}

fn require_owner<R>(
    state: &ApplicationRouterState<R>,
    headers: &HeaderMap,
) -> Result<String, Response> {
    let key = applicant_key(headers)?;
    if state.reviewers.is_owner(&key) {
        Ok(key)
    } else {
        Err(error_response(StatusCode::FORBIDDEN, "owner access required"))
    }
}

pub(crate) async fn submit_handler<R>(
    State(state): State<ApplicationRouterState<R>>,
    headers: HeaderMap,
    body: Result<Json<ApplicationFields>, JsonRejection>,
) -> Response
where
    R: ApplicationRepository + 'static,
{
    let key = match applicant_key(&headers) {
        Ok(key) => key,
        Err(response) => return response,
    };
    let Json(fields) = match body {
        Ok(body) => body,
        Err(rejection) => return error_response(rejection.status(), rejection.body_text()),
    };

    match state.service.submit(&key, fields) {
        Ok(application) => (StatusCode::ACCEPTED, Json(application)).into_response(),
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn own_application_handler<R>(
    State(state): State<ApplicationRouterState<R>>,
    headers: HeaderMap,
) -> Response
where
    R: ApplicationRepository + 'static,
{
    let key = match applicant_key(&headers) {
        Ok(key) => key,
        Err(response) => return response,
    };

    match state.service.find_for_applicant(&key) {
        Ok(Some(application)) => (StatusCode::OK, Json(application)).into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "no application submitted yet"),
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn review_queue_handler<R>(
    State(state): State<ApplicationRouterState<R>>,
    headers: HeaderMap,
    query: Result<Query<ReviewQuery>, QueryRejection>,
) -> Response
where
    R: ApplicationRepository + 'static,
{
    if let Err(response) = require_reviewer(&state, &headers) {
        return response;
    }
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => return error_response(rejection.status(), rejection.body_text()),
    };

    match state.service.list_for_review(&query) {
        Ok(applications) => (StatusCode::OK, Json(applications)).into_response(),
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn review_detail_handler<R>(
    State(state): State<ApplicationRouterState<R>>,
    headers: HeaderMap,
    Path(application_id): Path<String>,
) -> Response
where
    R: ApplicationRepository + 'static,
{
    if let Err(response) = require_reviewer(&state, &headers) {
        return response;
    }

    match state.service.get(&ApplicationId(application_id)) {
        Ok(application) => (StatusCode::OK, Json(application)).into_response(),
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn status_update_handler<R>(
    State(state): State<ApplicationRouterState<R>>,
    headers: HeaderMap,
    Path(application_id): Path<String>,
    body: Result<Json<StatusUpdate>, JsonRejection>,
) -> Response
where
    R: ApplicationRepository + 'static,
{
    if let Err(response) = require_reviewer(&state, &headers) {
        return response;
    }
    let Json(update) = match body {
        Ok(body) => body,
        Err(rejection) => return error_response(rejection.status(), rejection.body_text()),
    };

    match state
        .service
        .set_status(&ApplicationId(application_id), update.status)
    {
        Ok(application) => (StatusCode::OK, Json(application)).into_response(),
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn delete_handler<R>(
    State(state): State<ApplicationRouterState<R>>,
    headers: HeaderMap,
    Path(application_id): Path<String>,
) -> Response
where
    R: ApplicationRepository + 'static,
{
    if let Err(response) = require_reviewer(&state, &headers) {
        return response;
    }

    match state.service.delete(&ApplicationId(application_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn counts_handler<R>(
    State(state): State<ApplicationRouterState<R>>,
    headers: HeaderMap,
) -> Response
where
    R: ApplicationRepository + 'static,
{
    if let Err(response) = require_reviewer(&state, &headers) {
        return response;
    }

    match state.service.counts() {
        Ok(counts) => (StatusCode::OK, Json(counts)).into_response(),
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn reviewer_list_handler<R>(
    State(state): State<ApplicationRouterState<R>>,
    headers: HeaderMap,
) -> Response
where
    R: ApplicationRepository + 'static,
{
    if let Err(response) = require_owner(&state, &headers) {
        return response;
    }

    let reviewers = state.reviewers.reviewers();
    (StatusCode::OK, Json(json!({ "reviewers": reviewers }))).into_response()
}

pub(crate) async fn reviewer_grant_handler<R>(
    State(state): State<ApplicationRouterState<R>>,
    headers: HeaderMap,
    body: Result<Json<ReviewerGrant>, JsonRejection>,
) -> Response
where
    R: ApplicationRepository + 'static,
{
    let owner = match require_owner(&state, &headers) {
        Ok(owner) => owner,
        Err(response) => return response,
    };
    let Json(grant) = match body {
        Ok(body) => body,
        Err(rejection) => return error_response(rejection.status(), rejection.body_text()),
    };

    match state.reviewers.grant(&grant.applicant_key) {
        Ok(added) => {
            let status = if added {
                info!(%owner, reviewer = %grant.applicant_key.trim(), "reviewer access granted");
                StatusCode::CREATED
            } else {
                StatusCode::OK
            };
            let reviewers = state.reviewers.reviewers();
            (status, Json(json!({ "reviewers": reviewers }))).into_response()
        }
        Err(error) => reviewer_error_response(error),
    }
}

pub(crate) async fn reviewer_revoke_handler<R>(
    State(state): State<ApplicationRouterState<R>>,
    headers: HeaderMap,
    Path(reviewer): Path<String>,
) -> Response
where
    R: ApplicationRepository + 'static,
{
    let owner = match require_owner(&state, &headers) {
        Ok(owner) => owner,
        Err(response) => return response,
    };

    match state.reviewers.revoke(&reviewer) {
        Ok(()) => {
            info!(%owner, %reviewer, "reviewer access revoked");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(error) => reviewer_error_response(error),
    }
}
