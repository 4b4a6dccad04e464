//! Response bodies for the HTTP service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Acknowledgement returned for admitted webhooks
pub const WEBHOOK_SUCCESSFUL: &str = "Webhook successful";

/// Body of every webhook response, successful or not
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
}
