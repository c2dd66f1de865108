use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use gamehub_tracker::{AuthError, CatalogError, DatabaseError, ModerationError, SubmissionError};
use log::error;
use serde_json::json;
use thiserror::Error;

pub type ServerResult<T> = Result<T, ServerError>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("{resource}:{identifier} not found")]
    NotFound {
        resource: &'static str,
        identifier: &'static str,
    },
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0}")]
    Unauthorized(String),
    /// A feature needs configuration the server doesn't have
    #[error("{0}")]
    NotConfigured(String),
    #[error("Service temporarily unavailable: {0}")]
    Unavailable(String),
    #[error("Unknown internal error: {0}")]
    Unknown(String),
}

impl ServerError {
    fn as_status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotConfigured(_) | Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.as_status_code();

        if status.is_server_error() {
            error!("{}", self);
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<AuthError> for ServerError {
    fn from(value: AuthError) -> Self {
        match value {
            AuthError::NotConfigured => Self::NotConfigured(value.to_string()),
            AuthError::InvalidCredentials | AuthError::Unauthorized => {
                Self::Unauthorized(value.to_string())
            }
            AuthError::MissingPassword => Self::InvalidInput(value.to_string()),
            e => Self::Unknown(e.to_string()),
        }
    }
}

impl From<DatabaseError> for ServerError {
    fn from(value: DatabaseError) -> Self {
        match value {
            DatabaseError::NotFound {
                resource,
                identifier,
            } => Self::NotFound {
                resource,
                identifier,
            },
            DatabaseError::Conflict { .. } => Self::Conflict(value.to_string()),
            DatabaseError::Unavailable(e) => Self::Unavailable(e),
            e => Self::Unknown(e.to_string()),
        }
    }
}

impl From<ModerationError> for ServerError {
    fn from(value: ModerationError) -> Self {
        match value {
            ModerationError::Db(e) => e.into(),
            e => Self::InvalidInput(e.to_string()),
        }
    }
}

impl From<SubmissionError> for ServerError {
    fn from(value: SubmissionError) -> Self {
        match value {
            SubmissionError::Db(e) => e.into(),
            SubmissionError::Duplicate { .. } => Self::Conflict(value.to_string()),
            e => Self::InvalidInput(e.to_string()),
        }
    }
}

impl From<CatalogError> for ServerError {
    fn from(value: CatalogError) -> Self {
        match value {
            CatalogError::NotConfigured => Self::NotConfigured(value.to_string()),
            CatalogError::NotFound => Self::NotFound {
                resource: "game",
                identifier: "id",
            },
            CatalogError::FetchError(_) | CatalogError::TimedOut(_) => {
                Self::Unavailable(value.to_string())
            }
            CatalogError::ParseError(_) => Self::Unknown(value.to_string()),
        }
    }
}
