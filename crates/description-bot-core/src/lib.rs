//! # Description Bot Core
//!
//! Domain logic for the fact sheet description bot.
//!
//! The bot reacts to catalog webhooks announcing newly created fact sheets,
//! asks a text-generation service for a draft description and attaches that
//! draft to the fact sheet as a comment.
//!
//! ## Architecture
//!
//! - [`events`] parses and qualifies inbound webhook payloads
//! - [`generation`] drafts descriptions through a [`TextGenerator`]
//! - [`catalog`] writes comments back through a [`CatalogClient`]
//! - [`orchestrator`] sequences the three steps for a single delivery
//!
//! Business logic depends only on the [`TextGenerator`] and
//! [`CatalogConnector`] traits; the HTTP implementations are injected at
//! start-up by the service binary.
//!
//! ## Usage
//!
//! ```rust
//! use description_bot_core::generation::postprocess::clean_completion;
//!
//! let draft = clean_completion("  Orders API verarbeitet Bestellungen. Und\n");
//! assert_eq!(draft, "Orders API verarbeitet Bestellungen.");
//! ```

pub mod catalog;
pub mod events;
pub mod generation;
pub mod orchestrator;

pub use catalog::{AccessToken, CatalogClient, CatalogConnector, CatalogError, CommentMutation};
pub use events::{Disqualification, EventParseError, EventType, FactSheet, WebhookEvent};
pub use generation::{GenerationError, GenerationRequest, TextGenerator};
pub use orchestrator::{
    DeliveryOutcome, DescriptionOrchestrator, OrchestrationError, OrchestratorSettings,
    COMMENT_LEAD_IN,
};
