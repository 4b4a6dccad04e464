//! # Description Bot Service
//!
//! Binary entry point for the description bot.
//!
//! This executable:
//! - Loads configuration from files and the environment
//! - Initializes logging
//! - Creates the text generation and catalog clients
//! - Starts the HTTP server from description-bot-api

mod configuration;

use anyhow::Context;
use description_bot_api::{start_server, LoggingConfig, ServiceConfig, ServiceError};
use description_bot_core::catalog::LeanIxConnector;
use description_bot_core::generation::OpenAiTextGenerator;
use description_bot_core::{CatalogConnector, TextGenerator};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const CONFIGURATION_EXIT_CODE: i32 = 3;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let explicit_path = std::env::var(configuration::CONFIG_FILE_ENV).ok();
    let loaded = configuration::load(explicit_path.as_deref(), configuration::environment());

    // Logging follows the loaded settings; a failed load still gets logged
    // with the defaults.
    let logging = loaded
        .as_ref()
        .map(|c| c.logging.clone())
        .unwrap_or_default();
    init_tracing(&logging);

    info!("Starting Description Bot Service");
    if let Some(path) = explicit_path.as_deref().filter(|p| !p.is_empty()) {
        info!(path = %path, "Loaded configuration from explicit path");
    }

    let service_config = match loaded {
        Ok(config) => config,
        Err(e) => {
            error!(
                error = %e,
                "Could not load service configuration; aborting. \
                 Fix the configuration and restart."
            );
            std::process::exit(CONFIGURATION_EXIT_CODE);
        }
    };

    if let Err(e) = service_config.validate() {
        error!(error = %e, "Service configuration is invalid; aborting");
        std::process::exit(CONFIGURATION_EXIT_CODE);
    }

    if !service_config.webhook.active {
        warn!("Bot is inactive; qualifying events will be acknowledged without action");
    }

    let (generator, catalog) = match build_clients(&service_config) {
        Ok(clients) => clients,
        Err(e) => {
            error!(error = format!("{e:#}"), "Failed to create outbound clients; aborting");
            std::process::exit(CONFIGURATION_EXIT_CODE);
        }
    };

    info!(
        host = %service_config.server.host,
        port = service_config.server.port,
        endpoint = %service_config.webhook.endpoint_path,
        active = service_config.webhook.active,
        "Starting HTTP server"
    );

    if let Err(e) = start_server(service_config, generator, catalog).await {
        error!("Failed to start server: {}", e);

        let exit_code = match e {
            ServiceError::BindFailed { .. } => 1,
            ServiceError::ServerFailed { .. } => 2,
            ServiceError::Configuration(_) => CONFIGURATION_EXIT_CODE,
        };

        std::process::exit(exit_code);
    }

    Ok(())
}

/// Install the global subscriber.
///
/// `RUST_LOG` wins over the configured level when set.
fn init_tracing(logging: &LoggingConfig) {
    let level = logging.effective_level();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "description_bot={level},description_bot_api={level},description_bot_core={level},tower_http=info"
        ))
    });

    let registry = tracing_subscriber::registry().with(filter);

    if logging.json_format {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Create the text generator and catalog connector from configuration.
fn build_clients(
    config: &ServiceConfig,
) -> anyhow::Result<(Arc<dyn TextGenerator>, Arc<dyn CatalogConnector>)> {
    let generator = OpenAiTextGenerator::new(config.generation.to_openai_config())
        .context("failed to create text generation client")?;

    let catalog = LeanIxConnector::new(config.catalog.to_leanix_config())
        .context("failed to create catalog client")?;

    Ok((Arc::new(generator), Arc::new(catalog)))
}
