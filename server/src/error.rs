use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use atlas_shared::ErrorPayload;

use crate::airtable::AirtableError;

pub const TOKEN_NOT_CONFIGURED: &str = "Airtable token not configured";
pub const CREDENTIALS_NOT_CONFIGURED: &str = "Airtable credentials not configured";
pub const LAST_UPDATED_FETCH_FAILED: &str = "Failed to fetch last updated date";
pub const MAP_FETCH_FAILED: &str = "Failed to fetch map data";

/// Terminal failure of a proxy request, rendered as `{ error, details? }`.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("{0}")]
    NotConfigured(&'static str),

    #[error("Airtable API error: {}", .status.as_u16())]
    Upstream {
        status: StatusCode,
        details: Option<String>,
    },

    #[error("{0}")]
    Unavailable(&'static str),
}

impl ProxyError {
    /// Map an upstream failure. `fallback` names the endpoint's generic error.
    pub fn from_airtable(err: AirtableError, fallback: &'static str) -> Self {
        match err {
            AirtableError::Status { status, body } => Self::Upstream {
                status,
                details: Some(body),
            },
            AirtableError::Transport(_) | AirtableError::Decode(_) | AirtableError::Url(_) => {
                Self::Unavailable(fallback)
            }
        }
    }

    /// Map endpoints never echo the upstream body.
    pub fn without_details(self) -> Self {
        match self {
            Self::Upstream { status, .. } => Self::Upstream {
                status,
                details: None,
            },
            other => other,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotConfigured(_) | Self::Unavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Upstream { status, .. } => *status,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        let details = match &self {
            Self::Upstream { details, .. } => details.clone(),
            _ => None,
        };
        let payload = ErrorPayload {
            error: self.to_string(),
            details,
        };

        let mut response = (status, Json(payload)).into_response();
        response
            .headers_mut()
            .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_status_is_passed_through() {
        let err = ProxyError::from_airtable(
            AirtableError::Status {
                status: StatusCode::NOT_FOUND,
                body: r#"{"error":"NOT_FOUND"}"#.into(),
            },
            LAST_UPDATED_FETCH_FAILED,
        );
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Airtable API error: 404");
        assert!(matches!(&err, ProxyError::Upstream { details: Some(_), .. }));
        assert!(matches!(
            err.without_details(),
            ProxyError::Upstream { details: None, .. }
        ));
    }

    #[test]
    fn decode_failure_uses_endpoint_fallback() {
        let decode = serde_json::from_str::<serde_json::Value>("{").expect_err("invalid json");
        let err = ProxyError::from_airtable(AirtableError::Decode(decode), MAP_FETCH_FAILED);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), MAP_FETCH_FAILED);
    }

    #[test]
    fn error_responses_are_never_cached() {
        let response = ProxyError::NotConfigured(TOKEN_NOT_CONFIGURED).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL),
            Some(&HeaderValue::from_static("no-store"))
        );
    }
}
