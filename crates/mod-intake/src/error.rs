use crate::applications::{ApplicationServiceError, NotifierError, RepositoryError};
use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Applications(ApplicationServiceError),
    Notifier(NotifierError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Applications(err) => write!(f, "application error: {}", err),
            AppError::Notifier(err) => write!(f, "notifier error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Applications(err) => Some(err),
            AppError::Notifier(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Applications(ApplicationServiceError::Validation(_)) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::Applications(ApplicationServiceError::NotFound(_)) => StatusCode::NOT_FOUND,
            AppError::Applications(ApplicationServiceError::Repository(
                RepositoryError::Conflict(_),
            )) => StatusCode::CONFLICT,
            AppError::Applications(ApplicationServiceError::Repository(_))
            | AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Notifier(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<ApplicationServiceError> for AppError {
    fn from(value: ApplicationServiceError) -> Self {
        Self::Applications(value)
    }
}

impl From<NotifierError> for AppError {
    fn from(value: NotifierError) -> Self {
        Self::Notifier(value)
    }
}

impl From<RepositoryError> for AppError {
    fn from(value: RepositoryError) -> Self {
        Self::Applications(ApplicationServiceError::Repository(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::applications::{ApplicationId, ValidationError};

    #[test]
    fn application_errors_map_to_client_statuses() {
        let validation = AppError::from(ApplicationServiceError::from(
            ValidationError::MissingField("scenario"),
        ));
        assert_eq!(
            validation.into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );

        let missing = AppError::from(ApplicationServiceError::NotFound(ApplicationId::from(
            "gone",
        )));
        assert_eq!(missing.into_response().status(), StatusCode::NOT_FOUND);

        let conflict = AppError::from(RepositoryError::Conflict("A#1".to_string()));
        assert_eq!(conflict.into_response().status(), StatusCode::CONFLICT);

        let offline = AppError::from(RepositoryError::Unavailable("disk full".to_string()));
        assert_eq!(
            offline.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
