//! Webhook payload schema and event qualification.
//!
//! Catalog webhooks carry far more data than the bot needs. Only the event
//! type and the `factSheet.{id,name,type}` triple are read; every other field
//! is ignored. A payload that lacks one of these fields, or carries it with
//! the wrong JSON type, is rejected with an [`EventParseError`] instead of
//! being defaulted.

use serde::Deserialize;
use serde_json::error::Category;
use std::collections::HashSet;
use std::fmt;

/// Wire name of the only event type the bot acts on.
pub const FACT_SHEET_CREATED_EVENT: &str = "FactSheetCreatedEvent";

/// Kind of catalog event announced by a webhook delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventType {
    /// A fact sheet was created.
    FactSheetCreated,

    /// Any other event; kept verbatim for logging.
    Other(String),
}

impl EventType {
    /// Map the `type` field of a payload onto an event type.
    pub fn from_wire(value: &str) -> Self {
        if value == FACT_SHEET_CREATED_EVENT {
            Self::FactSheetCreated
        } else {
            Self::Other(value.to_string())
        }
    }

    /// Wire representation of the event type.
    pub fn as_str(&self) -> &str {
        match self {
            Self::FactSheetCreated => FACT_SHEET_CREATED_EVENT,
            Self::Other(value) => value,
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The fact sheet a webhook event refers to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FactSheet {
    /// Opaque catalog identifier
    pub id: String,

    /// Display name, used as the subject of the generation prompt
    pub name: String,

    /// Fact sheet type, e.g. `Application`
    #[serde(rename = "type")]
    pub fact_sheet_type: String,
}

#[derive(Debug, Deserialize)]
struct RawWebhookPayload {
    #[serde(rename = "type")]
    event_type: String,

    #[serde(rename = "factSheet")]
    fact_sheet: FactSheet,
}

/// Parsed representation of one webhook delivery.
///
/// Immutable once constructed and discarded when the request completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookEvent {
    event_type: EventType,
    fact_sheet: FactSheet,
}

impl WebhookEvent {
    /// Create an event from already validated parts.
    pub fn new(event_type: EventType, fact_sheet: FactSheet) -> Self {
        Self {
            event_type,
            fact_sheet,
        }
    }

    /// Parse a raw request body.
    ///
    /// # Errors
    ///
    /// Returns [`EventParseError::InvalidJson`] when the body is not JSON and
    /// [`EventParseError::Schema`] when a required field is missing or has the
    /// wrong type.
    pub fn parse(body: &[u8]) -> Result<Self, EventParseError> {
        if body.is_empty() {
            return Err(EventParseError::EmptyBody);
        }

        let raw: RawWebhookPayload = serde_json::from_slice(body).map_err(|e| match e.classify() {
            Category::Data => EventParseError::Schema {
                message: e.to_string(),
            },
            Category::Io | Category::Syntax | Category::Eof => EventParseError::InvalidJson {
                message: e.to_string(),
            },
        })?;

        Ok(Self {
            event_type: EventType::from_wire(&raw.event_type),
            fact_sheet: raw.fact_sheet,
        })
    }

    pub fn event_type(&self) -> &EventType {
        &self.event_type
    }

    pub fn fact_sheet(&self) -> &FactSheet {
        &self.fact_sheet
    }

    pub fn fact_sheet_id(&self) -> &str {
        &self.fact_sheet.id
    }

    pub fn fact_sheet_name(&self) -> &str {
        &self.fact_sheet.name
    }

    pub fn fact_sheet_type(&self) -> &str {
        &self.fact_sheet.fact_sheet_type
    }

    /// Decide whether the bot should act on this event.
    ///
    /// Checks, in order: the event announces a creation, the fact sheet type
    /// is in `allowed_types`, and the fact sheet id is non-empty.
    pub fn qualify(&self, allowed_types: &HashSet<String>) -> Result<(), Disqualification> {
        if self.event_type != EventType::FactSheetCreated {
            return Err(Disqualification::UnsupportedEventType {
                event_type: self.event_type.to_string(),
            });
        }

        if !allowed_types.contains(self.fact_sheet_type()) {
            return Err(Disqualification::FactSheetTypeNotAllowed {
                fact_sheet_type: self.fact_sheet_type().to_string(),
            });
        }

        if self.fact_sheet_id().is_empty() {
            return Err(Disqualification::MissingFactSheetId);
        }

        Ok(())
    }
}

/// Failure to read a webhook body into a [`WebhookEvent`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EventParseError {
    #[error("Webhook body is empty")]
    EmptyBody,

    #[error("Webhook body is not valid JSON: {message}")]
    InvalidJson { message: String },

    #[error("Webhook body does not match the expected schema: {message}")]
    Schema { message: String },
}

/// Reason a well-formed event is not actionable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Disqualification {
    #[error("Event type '{event_type}' is not handled")]
    UnsupportedEventType { event_type: String },

    #[error("Fact sheet type '{fact_sheet_type}' is not in the allow-list")]
    FactSheetTypeNotAllowed { fact_sheet_type: String },

    #[error("Fact sheet id is empty")]
    MissingFactSheetId,
}

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;
