/// Unified error handling module
use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Failure categories surfaced by the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayErrorKind {
    ValidationFailure,
    NetworkFailure,
    UpstreamError,
    ParseFailure,
    Cancelled,
}

impl GatewayErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            GatewayErrorKind::ValidationFailure => "VALIDATION_FAILURE",
            GatewayErrorKind::NetworkFailure => "NETWORK_FAILURE",
            GatewayErrorKind::UpstreamError => "UPSTREAM_ERROR",
            GatewayErrorKind::ParseFailure => "PARSE_FAILURE",
            GatewayErrorKind::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for GatewayErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayErrorKind::ValidationFailure => write!(f, "Validation failure"),
            GatewayErrorKind::NetworkFailure => write!(f, "Network failure"),
            GatewayErrorKind::UpstreamError => write!(f, "Upstream error"),
            GatewayErrorKind::ParseFailure => write!(f, "Parse failure"),
            GatewayErrorKind::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// Structured failure returned by every gateway operation
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind}: {message}")]
pub struct GatewayError {
    pub kind: GatewayErrorKind,
    pub message: String,
    /// HTTP status reported by the upstream, when there was one
    pub status: Option<u16>,
    /// Leading characters of an undecodable body
    pub body_snippet: Option<String>,
}

impl GatewayError {
    fn new(kind: GatewayErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
            body_snippet: None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorKind::ValidationFailure, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorKind::NetworkFailure, message)
    }

    pub fn upstream(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status,
            ..Self::new(GatewayErrorKind::UpstreamError, message)
        }
    }

    pub fn parse(message: impl Into<String>, body_snippet: Option<String>) -> Self {
        Self {
            body_snippet,
            ..Self::new(GatewayErrorKind::ParseFailure, message)
        }
    }

    pub fn cancelled() -> Self {
        Self::new(GatewayErrorKind::Cancelled, "request cancelled by caller")
    }
}

impl From<QueryRejection> for GatewayError {
    fn from(rejection: QueryRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

impl From<JsonRejection> for GatewayError {
    fn from(rejection: JsonRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

/// Error body returned by the HTTP surface
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub ok: bool,
    pub error: String,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstream_status: Option<u16>,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        // Proxy contract: bad input is 400, anything that went wrong past it is 500
        let status = match self.kind {
            GatewayErrorKind::ValidationFailure => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = ErrorResponse {
            ok: false,
            error: self.message,
            code: self.kind.code(),
            upstream_status: self.status,
        };

        (status, Json(body)).into_response()
    }
}

/// Type alias for gateway results
pub type GatewayResult<T> = Result<T, GatewayError>;
