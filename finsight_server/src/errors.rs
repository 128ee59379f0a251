use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use plaid_tools::PlaidApiError;
use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("Could not serialize access token. {0}")]
    CouldNotSerializeAccessToken(String),
    #[error("The aggregator rejected the request. {0}")]
    UpstreamRejected(String),
    #[error("An upstream service could not be reached. {0}")]
    UpstreamUnavailable(String),
}

impl ServerError {
    /// The stable, machine-readable kind for this error. Clients dispatch on this value; the `detail` string in
    /// the response body is for humans and carries no contract.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InitializeError(_) => "InitializeError",
            Self::BackendError(_) => "BackendError",
            Self::InvalidRequestBody(_) => "InvalidRequestBody",
            Self::IOError(_) => "IOError",
            Self::ConfigurationError(_) => "ConfigurationError",
            Self::Unspecified(_) => "Unspecified",
            Self::AuthenticationError(e) => e.kind(),
            Self::CouldNotSerializeAccessToken(_) => "CouldNotSerializeAccessToken",
            Self::UpstreamRejected(_) => "UpstreamRejected",
            Self::UpstreamUnavailable(_) => "UpstreamUnavailable",
        }
    }
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(e) => match e {
                AuthError::InvalidTokenFormat(_) => StatusCode::BAD_REQUEST,
                AuthError::KeyResolutionFailed(_) => StatusCode::UNAUTHORIZED,
                AuthError::VerificationFailed(_) => StatusCode::UNAUTHORIZED,
                AuthError::Unauthorized => StatusCode::UNAUTHORIZED,
            },
            Self::UpstreamRejected(_) => StatusCode::BAD_REQUEST,
            Self::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::CouldNotSerializeAccessToken(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.kind(), "detail": self.to_string() }).to_string())
    }
}

/// Failures while verifying an identity assertion or a session token. The payload strings carry the underlying
/// cause for logging; the `Display` output never includes them, so nothing about which check failed reaches the
/// client beyond the kind itself.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("The identity token is not in the correct format.")]
    InvalidTokenFormat(String),
    #[error("No signing key matches the identity token.")]
    KeyResolutionFailed(String),
    #[error("The identity token could not be verified.")]
    VerificationFailed(String),
    #[error("Invalid or missing session token.")]
    Unauthorized,
}

impl AuthError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidTokenFormat(_) => "InvalidTokenFormat",
            Self::KeyResolutionFailed(_) => "KeyResolutionFailed",
            Self::VerificationFailed(_) => "VerificationFailed",
            Self::Unauthorized => "Unauthorized",
        }
    }
}

impl From<PlaidApiError> for ServerError {
    fn from(e: PlaidApiError) -> Self {
        match e {
            PlaidApiError::QueryError { status, message } => Self::UpstreamRejected(format!("Error {status}. {message}")),
            PlaidApiError::RestRequestError(m) => Self::InvalidRequestBody(m),
            PlaidApiError::RestResponseError(m) => Self::UpstreamUnavailable(m),
            PlaidApiError::JsonError(m) => Self::UpstreamUnavailable(format!("Unexpected aggregator response. {m}")),
            PlaidApiError::Initialization(m) => Self::InitializeError(m),
            PlaidApiError::Config(m) => Self::ConfigurationError(m),
        }
    }
}

impl From<StoreError> for ServerError {
    fn from(e: StoreError) -> Self {
        Self::BackendError(e.to_string())
    }
}
