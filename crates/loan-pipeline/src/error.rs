use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::eligibility::BandsLoadError;
use crate::workflows::leads::domain::LeadId;
use crate::workflows::leads::transition::ValidationError;
use crate::workflows::lenders::acceptance::SelectionError;
use crate::workflows::lenders::directory::LenderDirectoryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

/// Schema or data drift the engine cannot reason about. Always fatal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("persisted status '{0}' has no registry entry")]
    UnknownStatus(String),
    #[error("eligibility bands rejected: {0}")]
    InvalidBands(String),
}

/// Structured failure returned by every engine operation.
///
/// Callers render [`EngineError::code`] rather than matching on messages.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("lead {lead_id} changed since it was read; refetch and re-validate")]
    StaleState { lead_id: LeadId },
    #[error("lead {0} not found")]
    NotFound(LeadId),
    #[error("external service unavailable: {0}")]
    ExternalService(String),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Selection(#[from] SelectionError),
    #[error("repository unavailable: {0}")]
    Repository(String),
}

impl EngineError {
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::Validation(error) => error.code(),
            EngineError::StaleState { .. } => "stale_state",
            EngineError::NotFound(_) => "not_found",
            EngineError::ExternalService(_) => "external_service_unavailable",
            EngineError::Configuration(ConfigurationError::UnknownStatus(_)) => "unknown_status",
            EngineError::Configuration(ConfigurationError::InvalidBands(_)) => "invalid_bands",
            EngineError::Selection(error) => error.code(),
            EngineError::Repository(_) => "repository_unavailable",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            EngineError::Validation(_) | EngineError::Selection(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            EngineError::StaleState { .. } => StatusCode::CONFLICT,
            EngineError::NotFound(_) => StatusCode::NOT_FOUND,
            EngineError::ExternalService(_) => StatusCode::SERVICE_UNAVAILABLE,
            EngineError::Configuration(_) | EngineError::Repository(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Offending field for user-correctable errors, if the error names one.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            EngineError::Validation(error) => error.field(),
            _ => None,
        }
    }
}

impl IntoResponse for EngineError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "code": self.code(),
            "message": self.to_string(),
            "field": self.field(),
        }));
        (self.status_code(), body).into_response()
    }
}

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Engine(EngineError),
    Bands(BandsLoadError),
    LenderDirectory(LenderDirectoryError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Engine(err) => write!(f, "engine error: {}", err),
            AppError::Bands(err) => write!(f, "eligibility bands error: {}", err),
            AppError::LenderDirectory(err) => write!(f, "lender directory error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Engine(err) => Some(err),
            AppError::Bands(err) => Some(err),
            AppError::LenderDirectory(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Engine(err) => err.into_response(),
            other => {
                let status = match other {
                    AppError::Bands(_) | AppError::LenderDirectory(_) => StatusCode::BAD_REQUEST,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                let body = Json(json!({ "error": other.to_string() }));
                (status, body).into_response()
            }
        }
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

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<EngineError> for AppError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

impl From<BandsLoadError> for AppError {
    fn from(value: BandsLoadError) -> Self {
        Self::Bands(value)
    }
}

impl From<LenderDirectoryError> for AppError {
    fn from(value: LenderDirectoryError) -> Self {
        Self::LenderDirectory(value)
    }
}
