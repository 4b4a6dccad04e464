//! # Description Bot HTTP Service
//!
//! HTTP server receiving catalog webhooks and turning newly created fact
//! sheets into a description proposal posted back as a comment.
//!
//! This service provides:
//! - The webhook endpoint, guarded by the [`gatekeeper`] (rate limit, Basic
//!   credentials, user agent and origin checks)
//! - A health check endpoint
//! - Request logging with correlation IDs

pub mod config;
pub mod errors;
pub mod gatekeeper;
pub mod rate_limit;
pub mod responses;

pub use config::{
    CatalogConfig, GenerationConfig, LoggingConfig, RateLimitConfig, SecurityConfig, ServerConfig,
    ServiceConfig, WebhookConfig,
};
pub use errors::{ConfigError, GateRejection, ServiceError, WebhookHandlerError};
pub use gatekeeper::Gatekeeper;
pub use rate_limit::{FixedWindowRateLimiter, RateLimitExceeded};
pub use responses::{HealthResponse, MessageResponse, WEBHOOK_SUCCESSFUL};

use axum::{
    extract::{DefaultBodyLimit, State},
    middleware,
    response::{Json, Response},
    routing::{get, post},
    Router,
};
use bytes::Bytes;
use description_bot_core::{
    CatalogConnector, DeliveryOutcome, DescriptionOrchestrator, TextGenerator,
};
use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{error, info, instrument, warn};

/// Header carrying the request correlation ID
pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

// ============================================================================
// Application State
// ============================================================================

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Configuration for the service
    pub config: Arc<ServiceConfig>,

    /// Admission checks for the webhook endpoint
    pub gatekeeper: Arc<Gatekeeper>,

    /// Webhook processing pipeline
    pub orchestrator: Arc<DescriptionOrchestrator>,
}

impl AppState {
    pub fn new(
        config: ServiceConfig,
        gatekeeper: Gatekeeper,
        orchestrator: DescriptionOrchestrator,
    ) -> Self {
        Self {
            config: Arc::new(config),
            gatekeeper: Arc::new(gatekeeper),
            orchestrator: Arc::new(orchestrator),
        }
    }

    /// Wire the gatekeeper and orchestrator from configuration.
    pub fn build(
        config: ServiceConfig,
        generator: Arc<dyn TextGenerator>,
        catalog: Arc<dyn CatalogConnector>,
    ) -> Result<Self, ConfigError> {
        let gatekeeper = Gatekeeper::from_config(&config.security)?;
        let orchestrator = DescriptionOrchestrator::new(
            config.webhook.orchestrator_settings(),
            generator,
            catalog,
        );

        Ok(Self::new(config, gatekeeper, orchestrator))
    }
}

// ============================================================================
// HTTP Server
// ============================================================================

/// Create HTTP router with all endpoints
///
/// Only `POST` on the webhook path sits behind the gatekeeper. Other methods
/// on that path get 405 without touching the rate limit, and the health
/// check is always reachable.
pub fn create_router(state: AppState) -> Router {
    let webhook_handler = post(handle_webhook).route_layer(middleware::from_fn_with_state(
        state.clone(),
        gatekeeper::gatekeeper_middleware,
    ));

    let webhook_routes =
        Router::new().route(&state.config.webhook.endpoint_path, webhook_handler);

    let health_routes = Router::new().route("/health", get(handle_health_check));

    Router::new()
        .merge(webhook_routes)
        .merge(health_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn(request_logging_middleware))
                .layer(DefaultBodyLimit::max(state.config.server.max_body_size))
                .into_inner(),
        )
        .with_state(state)
}

/// Start HTTP server
pub async fn start_server(
    config: ServiceConfig,
    generator: Arc<dyn TextGenerator>,
    catalog: Arc<dyn CatalogConnector>,
) -> Result<(), ServiceError> {
    let address = format!("{}:{}", config.server.host, config.server.port);
    let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout_seconds);

    let state = AppState::build(config, generator, catalog)?;
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .map_err(|e| ServiceError::BindFailed {
            address: address.clone(),
            message: e.to_string(),
        })?;

    info!(address = %address, "Starting HTTP server");

    // New connections are refused as soon as the signal arrives; in-flight
    // requests get `shutdown_timeout` to finish.
    let (signalled_tx, signalled_rx) = tokio::sync::oneshot::channel::<()>();
    let shutdown = async move {
        shutdown_signal().await;
        let _ = signalled_tx.send(());
    };

    let drain_deadline = async move {
        if signalled_rx.await.is_ok() {
            tokio::time::sleep(shutdown_timeout).await;
        } else {
            std::future::pending::<()>().await;
        }
    };

    let server = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .into_future();

    tokio::select! {
        result = server => {
            result.map_err(|e| ServiceError::ServerFailed {
                message: e.to_string(),
            })?;
        }
        _ = drain_deadline => {
            warn!(
                shutdown_timeout_seconds = shutdown_timeout.as_secs(),
                "Graceful shutdown timed out; dropping in-flight requests"
            );
        }
    }

    info!("HTTP server shutdown complete");
    Ok(())
}

/// Resolve on SIGINT or SIGTERM.
///
/// A handler that cannot be installed never resolves, leaving the other
/// signal in charge.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C signal handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), initiating graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        },
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Handle an admitted webhook delivery
///
/// The gatekeeper has already run. Qualifying events are acknowledged with
/// the same message whether a comment was created or the bot is inactive.
#[instrument(skip(state, body), fields(body_len = body.len()))]
pub async fn handle_webhook(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<MessageResponse>, WebhookHandlerError> {
    let outcome = state.orchestrator.handle_delivery(&body).await?;

    match &outcome {
        DeliveryOutcome::CommentCreated { fact_sheet_id } => {
            info!(fact_sheet_id = %fact_sheet_id, "Webhook processed; comment created");
        }
        DeliveryOutcome::Suppressed { fact_sheet_id } => {
            info!(fact_sheet_id = %fact_sheet_id, "Webhook processed; bot inactive");
        }
    }

    Ok(Json(MessageResponse::new(WEBHOOK_SUCCESSFUL)))
}

/// Liveness check
#[instrument]
pub async fn handle_health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

// ============================================================================
// Middleware
// ============================================================================

/// Request logging middleware
///
/// Reuses the caller's correlation ID or generates one, echoes it on the
/// response and logs completion at a level matching the status class.
#[instrument(skip(request, next), fields(
    method = %request.method(),
    uri = %request.uri(),
    correlation_id
))]
async fn request_logging_middleware(
    mut request: axum::extract::Request,
    next: axum::middleware::Next,
) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = std::time::Instant::now();

    let correlation_id = request
        .headers()
        .get(CORRELATION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    tracing::Span::current().record("correlation_id", correlation_id.as_str());
    request.extensions_mut().insert(correlation_id.clone());

    let mut response = next.run(request).await;
    let duration = start.elapsed();

    if let Ok(header_value) = correlation_id.parse() {
        response
            .headers_mut()
            .insert(CORRELATION_ID_HEADER, header_value);
    }

    let status = response.status();

    if status.is_server_error() {
        error!(
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms = %duration.as_millis(),
            "Request completed with server error"
        );
    } else if status.is_client_error() {
        warn!(
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms = %duration.as_millis(),
            "Request completed with client error"
        );
    } else {
        info!(
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms = %duration.as_millis(),
            "Request completed successfully"
        );
    }

    response
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
