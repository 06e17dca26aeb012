//! Gateway error types.
//!
//! `UpstreamError` is what the outbound ports report, `QueryError` what the
//! domain operations report, and `ApiError` what a client gets to see.

use crate::domain::address::AddressError;
use serde::Serialize;
use std::fmt;

/// Generic message returned for every upstream or internal failure.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Message returned by database-backed endpoints when no database is set up.
pub const DATABASE_REQUIRED_MESSAGE: &str =
    "Endpoint not available. This endpoint needs a database connection";

/// Failure reported by a store, the node or another external collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UpstreamError {
    /// Unreachable, or the query itself failed.
    #[error("upstream unavailable: {0}")]
    Unavailable(String),
    /// The collaborator refused the request (e.g. an address it cannot decode).
    #[error("upstream rejected request: {0}")]
    Rejected(String),
    /// The collaborator does not offer this operation.
    #[error("upstream does not support: {0}")]
    Unsupported(String),
    /// The response did not have the expected shape.
    #[error("malformed upstream response: {0}")]
    Malformed(String),
}

/// Failure of a domain query.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// Entry `index` of a batch is not a `prefix:payload` address.
    #[error("invalid address at index {index}: {source}")]
    InvalidAddress {
        index: usize,
        #[source]
        source: AddressError,
    },
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

/// Client-visible error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    PayloadTooLarge,
    NotImplemented,
    Unavailable,
    Timeout,
    Upstream,
}

impl ErrorKind {
    pub fn status_code(self) -> u16 {
        match self {
            ErrorKind::Validation => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::PayloadTooLarge => 413,
            ErrorKind::Upstream => 500,
            ErrorKind::NotImplemented => 501,
            ErrorKind::Unavailable => 503,
            ErrorKind::Timeout => 504,
        }
    }

    /// Whether the detail may be shown to the client.
    pub fn is_client_visible(self) -> bool {
        !matches!(self, ErrorKind::Upstream)
    }
}

/// Error returned by a REST handler.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub kind: ErrorKind,
    /// Human-readable detail. Never sent for [`ErrorKind::Upstream`].
    pub message: String,
    /// `Cache-Control: public, max-age=N` for cacheable errors.
    pub max_age: Option<u32>,
}

impl ApiError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            max_age: None,
        }
    }

    pub fn validation(details: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, details)
    }

    pub fn not_found(details: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, details)
    }

    pub fn payload_too_large(details: impl Into<String>) -> Self {
        Self::new(ErrorKind::PayloadTooLarge, details)
    }

    pub fn not_implemented(details: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotImplemented, details)
    }

    pub fn database_required() -> Self {
        Self::new(ErrorKind::Unavailable, DATABASE_REQUIRED_MESSAGE)
    }

    pub fn timeout(after_secs: u64) -> Self {
        Self::new(
            ErrorKind::Timeout,
            format!("Request timed out after {}s", after_secs),
        )
    }

    /// Upstream or internal failure. `details` is for logs only.
    pub fn upstream(details: impl Into<String>) -> Self {
        Self::new(ErrorKind::Upstream, details)
    }

    /// Let downstream caches keep this error for `seconds`.
    pub fn cacheable_for(mut self, seconds: u32) -> Self {
        self.max_age = Some(seconds);
        self
    }

    pub fn status_code(&self) -> u16 {
        self.kind.status_code()
    }

    /// JSON body sent to the client.
    pub fn body(&self) -> ErrorBody {
        if self.kind.is_client_visible() {
            ErrorBody::Detail {
                detail: self.message.clone(),
            }
        } else {
            ErrorBody::Message {
                message: INTERNAL_ERROR_MESSAGE.to_string(),
            }
        }
    }
}

/// Serialized error payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ErrorBody {
    Detail { detail: String },
    Message { message: String },
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.status_code(), self.message)
    }
}

impl std::error::Error for ApiError {}

impl From<UpstreamError> for ApiError {
    fn from(e: UpstreamError) -> Self {
        match e {
            UpstreamError::Rejected(reason) => ApiError::validation(reason),
            UpstreamError::Unsupported(what) => ApiError::not_implemented(what),
            other => ApiError::upstream(other.to_string()),
        }
    }
}

impl From<QueryError> for ApiError {
    fn from(e: QueryError) -> Self {
        match e {
            QueryError::InvalidAddress { .. } => ApiError::validation(e.to_string()),
            QueryError::Upstream(upstream) => upstream.into(),
        }
    }
}

impl From<AddressError> for ApiError {
    fn from(e: AddressError) -> Self {
        ApiError::validation(e.to_string())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Startup and lifecycle errors.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("server bind error: {0}")]
    Bind(String),

    #[error("server error: {0}")]
    Serve(String),
}
