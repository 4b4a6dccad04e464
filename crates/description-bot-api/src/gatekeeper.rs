//! Admission checks for inbound webhook requests.
//!
//! The [`Gatekeeper`] runs an ordered list of checks over the request
//! headers. Each check either lets the request continue or produces a
//! terminal [`GateRejection`]; the first rejection wins. The rate limit is
//! checked first, so every request that reaches the gatekeeper is counted.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderName},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::fmt;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::config::SecurityConfig;
use crate::errors::{ConfigError, GateRejection};
use crate::rate_limit::FixedWindowRateLimiter;
use crate::AppState;

/// A single admission step.
type GateCheck = fn(&Gatekeeper, &HeaderMap) -> Result<(), GateRejection>;

/// Checks in evaluation order.
const CHECKS: [(&str, GateCheck); 4] = [
    ("rate_limit", Gatekeeper::check_rate_limit),
    ("credentials", Gatekeeper::check_credentials),
    ("user_agent", Gatekeeper::check_user_agent),
    ("origin", Gatekeeper::check_origin),
];

/// Validates inbound webhook requests before any business logic runs.
pub struct Gatekeeper {
    rate_limiter: Arc<FixedWindowRateLimiter>,
    username: String,
    password: String,
    allowed_user_agents: Vec<String>,
    origin_header: HeaderName,
    origin_marker: String,
}

impl Gatekeeper {
    /// Build a gatekeeper with its own rate limiter.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the origin header name is not a
    /// valid HTTP header name.
    pub fn from_config(config: &SecurityConfig) -> Result<Self, ConfigError> {
        let rate_limiter = Arc::new(FixedWindowRateLimiter::from_config(&config.rate_limit));
        Self::with_rate_limiter(config, rate_limiter)
    }

    /// Build a gatekeeper sharing an existing rate limiter.
    pub fn with_rate_limiter(
        config: &SecurityConfig,
        rate_limiter: Arc<FixedWindowRateLimiter>,
    ) -> Result<Self, ConfigError> {
        let origin_header = HeaderName::from_bytes(config.origin_header.as_bytes()).map_err(|e| {
            ConfigError::Invalid {
                message: format!(
                    "invalid origin header name '{}': {}",
                    config.origin_header, e
                ),
            }
        })?;

        Ok(Self {
            rate_limiter,
            username: config.username.clone(),
            password: config.password.clone(),
            allowed_user_agents: config.allowed_user_agents.clone(),
            origin_header,
            origin_marker: config.origin_marker.clone(),
        })
    }

    pub fn rate_limiter(&self) -> &Arc<FixedWindowRateLimiter> {
        &self.rate_limiter
    }

    /// Run all checks in order and stop at the first rejection.
    pub fn admit(&self, headers: &HeaderMap) -> Result<(), GateRejection> {
        for (name, check) in CHECKS {
            check(self, headers).inspect_err(|rejection| {
                debug!(check = name, reason = %rejection, "Gate check failed");
            })?;
        }
        Ok(())
    }

    fn check_rate_limit(&self, _headers: &HeaderMap) -> Result<(), GateRejection> {
        self.rate_limiter
            .try_acquire()
            .map_err(|exceeded| GateRejection::RateLimited {
                retry_after_seconds: exceeded.retry_after_seconds(),
            })
    }

    fn check_credentials(&self, headers: &HeaderMap) -> Result<(), GateRejection> {
        let (username, password) =
            parse_basic_credentials(headers).ok_or(GateRejection::MissingCredentials)?;

        let username_matches = username.as_bytes().ct_eq(self.username.as_bytes());
        let password_matches = password.as_bytes().ct_eq(self.password.as_bytes());

        if bool::from(username_matches & password_matches) {
            Ok(())
        } else {
            Err(GateRejection::InvalidCredentials)
        }
    }

    fn check_user_agent(&self, headers: &HeaderMap) -> Result<(), GateRejection> {
        let user_agent = headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .ok_or(GateRejection::ForbiddenUserAgent)?;

        if self.allowed_user_agents.iter().any(|a| a == user_agent) {
            Ok(())
        } else {
            Err(GateRejection::ForbiddenUserAgent)
        }
    }

    fn check_origin(&self, headers: &HeaderMap) -> Result<(), GateRejection> {
        let origin = headers
            .get(&self.origin_header)
            .and_then(|v| v.to_str().ok())
            .ok_or(GateRejection::UnofficialOrigin)?;

        if origin.contains(&self.origin_marker) {
            Ok(())
        } else {
            Err(GateRejection::UnofficialOrigin)
        }
    }
}

impl fmt::Debug for Gatekeeper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gatekeeper")
            .field("rate_limiter", &self.rate_limiter)
            .field("username", &self.username)
            .field("password", &"<REDACTED>")
            .field("allowed_user_agents", &self.allowed_user_agents)
            .field("origin_header", &self.origin_header)
            .field("origin_marker", &self.origin_marker)
            .finish()
    }
}

/// Decode `Authorization: Basic <base64(user:pass)>`.
///
/// The scheme name is matched case-insensitively. Returns `None` for a
/// missing header, another scheme, invalid base64 or UTF-8, or a missing
/// `:` separator.
pub fn parse_basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;

    Some((username.to_string(), password.to_string()))
}

/// Middleware running the gatekeeper in front of the webhook handler.
///
/// Rejected requests never reach the handler, so their bodies are not read.
pub async fn gatekeeper_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    match state.gatekeeper.admit(request.headers()) {
        Ok(()) => next.run(request).await,
        Err(rejection) => rejection.into_response(),
    }
}

#[cfg(test)]
#[path = "gatekeeper_tests.rs"]
mod tests;
