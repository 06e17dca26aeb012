//! HTTP rendering of gateway errors and extractor rejections.

use crate::domain::error::{ApiError, ErrorKind};
use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::{error, warn};

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        match self.kind {
            ErrorKind::Upstream => error!(error = %self.message, "upstream failure"),
            ErrorKind::Unavailable | ErrorKind::Timeout => warn!(error = %self.message, "request not served"),
            _ => {}
        }

        let mut response = (status, Json(self.body())).into_response();
        if let Some(max_age) = self.max_age {
            if let Ok(value) = HeaderValue::from_str(&cache_control(max_age)) {
                response.headers_mut().insert(header::CACHE_CONTROL, value);
            }
        }
        response
    }
}

/// `Cache-Control` value for a public response cacheable for `max_age` seconds.
pub fn cache_control(max_age: u32) -> String {
    format!("public, max-age={}", max_age)
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::payload_too_large(rejection.body_text())
        } else {
            ApiError::validation(rejection.body_text())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_carries_cache_control() {
        let response = ApiError::not_found("Address name not found")
            .cacheable_for(600)
            .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers()[header::CACHE_CONTROL],
            "public, max-age=600"
        );
    }

    #[test]
    fn test_upstream_is_500() {
        let response = ApiError::upstream("pool closed").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().get(header::CACHE_CONTROL).is_none());
    }

    #[test]
    fn test_database_required_is_503() {
        let response = ApiError::database_required().into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
