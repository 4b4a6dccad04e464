//! Writing comments back to the catalog.
//!
//! A [`CatalogConnector`] performs the token exchange and hands out a
//! [`CatalogClient`] bound to the resulting [`AccessToken`]. The orchestrator
//! connects once per qualifying event, so every event works with a freshly
//! exchanged token and no token is cached between deliveries.

pub mod leanix;

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;

pub use leanix::{LeanIxConfig, LeanIxConnector, LeanIxGraphQlClient};

/// GraphQL document creating an active comment on a fact sheet.
///
/// User-controlled values travel as variables, never inside the document.
pub const CREATE_COMMENT_MUTATION: &str = "mutation CreateComment($factSheetId: ID!, $message: String!) {
  createComment(factSheetId: $factSheetId, message: $message, status: ACTIVE) {
    id
  }
}";

/// Creates authenticated catalog clients.
#[async_trait]
pub trait CatalogConnector: Send + Sync {
    /// Exchange credentials for an access token and return a bound client.
    async fn connect(&self) -> Result<Box<dyn CatalogClient>, CatalogError>;
}

/// An authenticated catalog session.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Attach `comment` to the fact sheet with the given id.
    ///
    /// Performs exactly one request; there is no retry.
    async fn add_comment(&self, fact_sheet_id: &str, comment: &str) -> Result<(), CatalogError>;
}

/// Bearer credential returned by the catalog's token endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<REDACTED>)")
    }
}

/// A single comment write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentMutation {
    pub fact_sheet_id: String,
    pub comment_body: String,
}

impl CommentMutation {
    pub fn new(fact_sheet_id: impl Into<String>, comment_body: impl Into<String>) -> Self {
        Self {
            fact_sheet_id: fact_sheet_id.into(),
            comment_body: comment_body.into(),
        }
    }

    /// Request body for the GraphQL endpoint.
    pub fn to_request(&self) -> GraphQlRequest<'_> {
        GraphQlRequest {
            query: CREATE_COMMENT_MUTATION,
            variables: CreateCommentVariables {
                fact_sheet_id: &self.fact_sheet_id,
                message: &self.comment_body,
            },
        }
    }
}

/// JSON body `{"query": ..., "variables": ...}` sent to the GraphQL endpoint.
#[derive(Debug, Serialize)]
pub struct GraphQlRequest<'a> {
    pub query: &'a str,
    pub variables: CreateCommentVariables<'a>,
}

#[derive(Debug, Serialize)]
pub struct CreateCommentVariables<'a> {
    #[serde(rename = "factSheetId")]
    pub fact_sheet_id: &'a str,
    pub message: &'a str,
}

/// Failures talking to the catalog.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("Catalog client could not be created: {message}")]
    ClientSetup { message: String },

    #[error("Catalog authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Catalog request failed: {message}")]
    Transport { message: String },

    #[error("Catalog request timed out")]
    Timeout,

    #[error("Catalog returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Catalog rejected the mutation: {message}")]
    GraphQl { message: String },

    #[error("Catalog response could not be read: {message}")]
    InvalidResponse { message: String },
}

impl CatalogError {
    pub(crate) fn from_reqwest(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport {
                message: error.to_string(),
            }
        }
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
