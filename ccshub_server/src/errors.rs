use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use ccshub_engine::{AccountApiError, CatalogApiError, OrderFlowError};
use log::error;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("{0}")]
    InvalidRequestBody(String),
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error(transparent)]
    AuthenticationError(#[from] AuthError),
    #[error("{0}")]
    NoRecordFound(String),
    /// The identity provider did not give us what the login flow needs. The flow is aborted.
    #[error("{0}")]
    UpstreamFailure(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(e) => match e {
                AuthError::Unauthenticated => StatusCode::UNAUTHORIZED,
                AuthError::InvalidCredentials(_) => StatusCode::UNAUTHORIZED,
                AuthError::LoginStateMismatch => StatusCode::UNAUTHORIZED,
                AuthError::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
                AuthError::TokenSigningError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::UpstreamFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// Missing, malformed, expired or badly signed tokens all end up here, with the same message.
    #[error("Authentication is required to access this resource")]
    Unauthenticated,
    #[error("{0}")]
    InvalidCredentials(String),
    #[error("Insufficient permissions. {0}")]
    InsufficientPermissions(String),
    #[error("The login request could not be verified. Please log in again.")]
    LoginStateMismatch,
    #[error("Could not issue an access token. {0}")]
    TokenSigningError(String),
}

impl From<AccountApiError> for ServerError {
    fn from(e: AccountApiError) -> Self {
        match e {
            AccountApiError::EmailAlreadyRegistered => Self::InvalidRequestBody(e.to_string()),
            AccountApiError::UsernameTaken => Self::InvalidRequestBody(e.to_string()),
            AccountApiError::DatabaseError(s) => {
                error!("💻️ Account storage error. {s}");
                Self::BackendError(format!("Database error: {s}"))
            },
        }
    }
}

impl From<CatalogApiError> for ServerError {
    fn from(e: CatalogApiError) -> Self {
        match e {
            CatalogApiError::InvalidItem(s) => Self::InvalidRequestBody(s),
            CatalogApiError::DatabaseError(s) => {
                error!("💻️ Catalogue storage error. {s}");
                Self::BackendError(format!("Database error: {s}"))
            },
        }
    }
}

impl From<OrderFlowError> for ServerError {
    fn from(e: OrderFlowError) -> Self {
        match e {
            OrderFlowError::OrderNotFound(_) => Self::NoRecordFound(e.to_string()),
            OrderFlowError::InvalidReference => Self::InvalidRequestBody(e.to_string()),
            OrderFlowError::DatabaseError(s) => {
                error!("💻️ Order storage error. {s}");
                Self::BackendError(format!("Database error: {s}"))
            },
        }
    }
}
