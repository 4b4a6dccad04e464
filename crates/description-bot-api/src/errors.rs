//! Error types for the HTTP service

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
};
use description_bot_core::OrchestrationError;
use tracing::{error, warn};

use crate::responses::MessageResponse;

/// Challenge sent with every 401 response
pub const BASIC_AUTH_CHALLENGE: &str = "Basic realm=\"Login required\"";

/// Gatekeeper rejections, raised before any business logic runs
///
/// Each variant maps to a fixed status code and message:
///
/// - `429 Too Many Requests`: global rate limit exhausted (with `Retry-After`)
/// - `401 Unauthorized`: missing or wrong Basic credentials (with `WWW-Authenticate`)
/// - `403 Forbidden`: user agent not allow-listed, or origin header missing/foreign
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GateRejection {
    #[error("Rate limit exceeded. Retry after {retry_after_seconds}s")]
    RateLimited { retry_after_seconds: u64 },

    #[error("Missing or malformed Basic credentials")]
    MissingCredentials,

    #[error("Basic credentials do not match")]
    InvalidCredentials,

    #[error("User-Agent is not allowed")]
    ForbiddenUserAgent,

    #[error("Origin header missing or not from the catalog")]
    UnofficialOrigin,
}

impl GateRejection {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::MissingCredentials | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::ForbiddenUserAgent | Self::UnofficialOrigin => StatusCode::FORBIDDEN,
        }
    }

    /// Message shown to the caller
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::RateLimited { .. } => "Too many requests.",
            Self::MissingCredentials | Self::InvalidCredentials => "Authentication required.",
            Self::ForbiddenUserAgent => "User-Agent is forbidden.",
            Self::UnofficialOrigin => "No official request.",
        }
    }
}

impl IntoResponse for GateRejection {
    fn into_response(self) -> Response {
        warn!(reason = %self, status = self.status().as_u16(), "Webhook request rejected");

        let mut response = (
            self.status(),
            Json(MessageResponse::new(self.public_message())),
        )
            .into_response();

        match self {
            Self::RateLimited {
                retry_after_seconds,
            } => {
                if let Ok(value) = HeaderValue::from_str(&retry_after_seconds.to_string()) {
                    response.headers_mut().insert(header::RETRY_AFTER, value);
                }
            }
            Self::MissingCredentials | Self::InvalidCredentials => {
                response.headers_mut().insert(
                    header::WWW_AUTHENTICATE,
                    HeaderValue::from_static(BASIC_AUTH_CHALLENGE),
                );
            }
            Self::ForbiddenUserAgent | Self::UnofficialOrigin => {}
        }

        response
    }
}

/// Webhook handler errors with HTTP status code mapping
///
/// - `400 Bad Request`: malformed payload or non-actionable event
///   (permanent, the caller should not retry)
/// - `500 Internal Server Error`: the generation service or the catalog
///   failed; details are logged, the caller sees a generic message
#[derive(Debug, thiserror::Error)]
pub enum WebhookHandlerError {
    #[error("Orchestration failed: {0}")]
    Orchestration(#[from] OrchestrationError),
}

impl IntoResponse for WebhookHandlerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Orchestration(OrchestrationError::MalformedEvent(e)) => {
                warn!(error = %e, "Malformed webhook payload");
                (StatusCode::BAD_REQUEST, "Malformed webhook payload.")
            }
            Self::Orchestration(OrchestrationError::NotActionable(reason)) => {
                warn!(reason = %reason, "Webhook not actionable");
                (StatusCode::BAD_REQUEST, "Webhook wrong.")
            }
            Self::Orchestration(e) => {
                // Log detailed error server-side but return generic message to client
                error!(error = %e, "Webhook processing failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "An error occurred.")
            }
        };

        (status, Json(MessageResponse::new(message))).into_response()
    }
}

/// Service-level errors
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Failed to bind to address {address}: {message}")]
    BindFailed { address: String, message: String },

    #[error("Server failed: {message}")]
    ServerFailed { message: String },

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {key}")]
    Missing { key: String },
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;
