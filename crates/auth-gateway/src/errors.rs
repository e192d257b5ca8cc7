//! Gate error taxonomy and the error responder.
//!
//! Every failure in the gate is resolved at the point of detection into one
//! [`AuthError`] kind. [`respond`] turns it into the client response, logs
//! it with request context and bumps the rejection counter.

use crate::observability::metrics;
use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Log target for rejected requests.
pub const AUTH_LOG_TARGET: &str = "auth_gateway.auth";

/// Realm advertised in `WWW-Authenticate`.
const AUTH_REALM: &str = "api-gateway";

/// Gate error type.
///
/// Maps to HTTP status codes:
/// - InvalidRequest: 400 Bad Request
/// - MissingAuthorization, InvalidToken, InvalidAuthorization: 401 Unauthorized
/// - AccessDenied: 403 Forbidden
/// - GatewayTimeout: 504 Gateway Timeout
/// - Internal: 500 Internal Server Error
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Missing authorization: {0}")]
    MissingAuthorization(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Invalid authorization: {0}")]
    InvalidAuthorization(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Gateway timeout: {0}")]
    GatewayTimeout(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Stable error code sent to clients.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MissingAuthorization(_) => "missing_authorization",
            AuthError::InvalidRequest(_) => "invalid_request",
            AuthError::InvalidToken(_) => "invalid_token",
            AuthError::InvalidAuthorization(_) => "invalid_authorization",
            AuthError::AccessDenied(_) => "access_denied",
            AuthError::GatewayTimeout(_) => "gateway_timeout",
            AuthError::Internal(_) => "internal_error",
        }
    }

    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AuthError::MissingAuthorization(_)
            | AuthError::InvalidToken(_)
            | AuthError::InvalidAuthorization(_) => StatusCode::UNAUTHORIZED,
            AuthError::AccessDenied(_) => StatusCode::FORBIDDEN,
            AuthError::GatewayTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing description.
    ///
    /// Internal errors keep their detail in the log only.
    pub fn message(&self) -> &str {
        match self {
            AuthError::MissingAuthorization(msg)
            | AuthError::InvalidRequest(msg)
            | AuthError::InvalidToken(msg)
            | AuthError::InvalidAuthorization(msg)
            | AuthError::AccessDenied(msg)
            | AuthError::GatewayTimeout(msg) => msg,
            AuthError::Internal(_) => "An internal error occurred",
        }
    }
}

/// Response extension marking a request the gate halted.
///
/// Outer layers check for it to tell a rejection apart from a normal
/// upstream response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthRejection {
    pub code: &'static str,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    error_description: &'a str,
}

/// Request context carried into rejection log lines.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: String,
    pub path: String,
    pub proxy: Option<String>,
    pub request_id: String,
}

impl RequestContext {
    /// Capture context from an inbound request. Uses `x-request-id` when the
    /// client or an outer proxy supplied one.
    pub fn from_request(req: &Request, proxy: Option<&str>) -> Self {
        let request_id = req
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        Self {
            method: req.method().to_string(),
            path: req.uri().path().to_string(),
            proxy: proxy.map(str::to_string),
            request_id,
        }
    }
}

/// Write `err` into `response`: status, JSON body, content type (only when
/// none is set yet), `WWW-Authenticate` for 401s and the rejection marker.
pub fn render_into(err: &AuthError, response: &mut Response) {
    let status = err.status_code();
    let body = ErrorBody {
        error: err.code(),
        error_description: err.message(),
    };
    let bytes = serde_json::to_vec(&body).unwrap_or_else(|_| {
        br#"{"error":"internal_error","error_description":"An internal error occurred"}"#.to_vec()
    });

    *response.status_mut() = status;
    *response.body_mut() = Body::from(bytes);

    let headers = response.headers_mut();
    headers
        .entry(header::CONTENT_TYPE)
        .or_insert(HeaderValue::from_static("application/json"));

    if status == StatusCode::UNAUTHORIZED {
        let challenge = format!("Bearer realm=\"{}\", error=\"{}\"", AUTH_REALM, err.code());
        if let Ok(value) = HeaderValue::from_str(&challenge) {
            headers.insert(header::WWW_AUTHENTICATE, value);
        }
    }

    response.extensions_mut().insert(AuthRejection {
        code: err.code(),
        message: err.message().to_string(),
    });
}

/// Error responder: log, count and render a rejection.
pub fn respond(err: &AuthError, ctx: &RequestContext) -> Response {
    let status = err.status_code();

    if status.is_server_error() {
        tracing::error!(
            target: AUTH_LOG_TARGET,
            method = %ctx.method,
            path = %ctx.path,
            proxy = ctx.proxy.as_deref().unwrap_or("-"),
            request_id = %ctx.request_id,
            status = status.as_u16(),
            code = err.code(),
            error = %err,
            "Request rejected"
        );
    } else {
        tracing::warn!(
            target: AUTH_LOG_TARGET,
            method = %ctx.method,
            path = %ctx.path,
            proxy = ctx.proxy.as_deref().unwrap_or("-"),
            request_id = %ctx.request_id,
            status = status.as_u16(),
            code = err.code(),
            error = %err,
            "Request rejected"
        );
    }

    metrics::record_auth_rejection(status.as_u16());

    err.clone().into_response()
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::empty());
        render_into(&self, &mut response);
        response
    }
}
