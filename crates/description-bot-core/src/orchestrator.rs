//! Sequencing of a single webhook delivery.
//!
//! Parse → qualify → (if active) generate → connect → comment. Every step
//! short-circuits on failure. The catalog write is the last step, so a
//! failure never leaves a partial mutation behind, and the catalog is never
//! touched without a generated draft.

use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::catalog::{CatalogConnector, CatalogError};
use crate::events::{Disqualification, EventParseError, WebhookEvent};
use crate::generation::{GenerationError, TextGenerator};

/// Fixed lead-in placed before every generated draft.
pub const COMMENT_LEAD_IN: &str = "Hier ist ein Vorschlag für eine Beschreibung: ";

/// Immutable behaviour settings for the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorSettings {
    /// When false, qualifying events are acknowledged without any action
    pub active: bool,

    /// Text placed directly before the fact sheet name in the prompt
    pub prompt_template: String,

    /// Fact sheet types the bot acts on
    pub allowed_fact_sheet_types: HashSet<String>,
}

impl OrchestratorSettings {
    pub fn new(
        active: bool,
        prompt_template: impl Into<String>,
        allowed_fact_sheet_types: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            active,
            prompt_template: prompt_template.into(),
            allowed_fact_sheet_types: allowed_fact_sheet_types.into_iter().collect(),
        }
    }
}

/// Result of a delivery that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// A comment was attached to the fact sheet.
    CommentCreated { fact_sheet_id: String },

    /// The event qualified but the bot is switched off.
    Suppressed { fact_sheet_id: String },
}

/// Reasons a delivery did not lead to a comment.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrchestrationError {
    #[error("Malformed event: {0}")]
    MalformedEvent(#[from] EventParseError),

    #[error("Event is not actionable: {0}")]
    NotActionable(#[from] Disqualification),

    #[error("Description generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("Catalog update failed: {0}")]
    Catalog(#[from] CatalogError),
}

impl OrchestrationError {
    /// True when the delivery itself was at fault; false for upstream failures.
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::MalformedEvent(_) | Self::NotActionable(_) => true,
            Self::Generation(_) | Self::Catalog(_) => false,
        }
    }
}

/// Drives one delivery through generation and catalog update.
pub struct DescriptionOrchestrator {
    settings: OrchestratorSettings,
    generator: Arc<dyn TextGenerator>,
    catalog: Arc<dyn CatalogConnector>,
}

impl DescriptionOrchestrator {
    pub fn new(
        settings: OrchestratorSettings,
        generator: Arc<dyn TextGenerator>,
        catalog: Arc<dyn CatalogConnector>,
    ) -> Self {
        Self {
            settings,
            generator,
            catalog,
        }
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    /// Handle the raw body of an admitted webhook request.
    #[instrument(skip(self, body), fields(body_len = body.len()))]
    pub async fn handle_delivery(&self, body: &[u8]) -> Result<DeliveryOutcome, OrchestrationError> {
        let event = WebhookEvent::parse(body)?;
        self.handle_event(&event).await
    }

    /// Handle an already parsed event.
    #[instrument(skip(self, event), fields(
        event_type = %event.event_type(),
        fact_sheet_id = %event.fact_sheet_id(),
        fact_sheet_type = %event.fact_sheet_type()
    ))]
    pub async fn handle_event(
        &self,
        event: &WebhookEvent,
    ) -> Result<DeliveryOutcome, OrchestrationError> {
        if let Err(reason) = event.qualify(&self.settings.allowed_fact_sheet_types) {
            info!(reason = %reason, "Ignoring webhook event");
            return Err(reason.into());
        }

        let fact_sheet_id = event.fact_sheet_id().to_string();

        if !self.settings.active {
            info!("Bot is inactive; acknowledging event without action");
            return Ok(DeliveryOutcome::Suppressed { fact_sheet_id });
        }

        let draft = self
            .generator
            .generate_description(event.fact_sheet_name(), &self.settings.prompt_template)
            .await
            .inspect_err(|e| warn!(error = %e, "Description generation failed"))?;

        let comment = compose_comment(&draft);

        let client = self
            .catalog
            .connect()
            .await
            .inspect_err(|e| warn!(error = %e, "Catalog authentication failed"))?;

        client
            .add_comment(&fact_sheet_id, &comment)
            .await
            .inspect_err(|e| warn!(error = %e, "Adding comment failed"))?;

        info!("Description proposal added as comment");

        Ok(DeliveryOutcome::CommentCreated { fact_sheet_id })
    }
}

/// Prefix a draft with the fixed lead-in.
pub fn compose_comment(draft: &str) -> String {
    format!("{}{}", COMMENT_LEAD_IN, draft)
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
