//! LeanIX implementation of the catalog traits.
//!
//! Authentication uses the client-credentials grant: the API token is sent
//! as the password of the fixed user `apitoken`, and the returned
//! `access_token` authorises subsequent GraphQL calls as a bearer token.

use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use super::{AccessToken, CatalogClient, CatalogConnector, CatalogError, CommentMutation};

/// User name LeanIX expects when authenticating with an API token.
const API_TOKEN_USER: &str = "apitoken";

/// Endpoints and credentials for the LeanIX workspace.
#[derive(Clone)]
pub struct LeanIxConfig {
    /// OAuth2 token endpoint
    pub auth_url: String,

    /// Technical user API token
    pub api_token: String,

    /// GraphQL endpoint
    pub request_url: String,

    /// Timeout applied to each request
    pub timeout: Duration,
}

impl fmt::Debug for LeanIxConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LeanIxConfig")
            .field("auth_url", &self.auth_url)
            .field("api_token", &"<REDACTED>")
            .field("request_url", &self.request_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    #[serde(default)]
    data: Option<serde_json::Value>,

    #[serde(default)]
    errors: Vec<GraphQlErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct GraphQlErrorEntry {
    message: String,
}

/// Hands out one freshly authenticated [`LeanIxGraphQlClient`] per call.
#[derive(Debug, Clone)]
pub struct LeanIxConnector {
    http: reqwest::Client,
    config: LeanIxConfig,
}

impl LeanIxConnector {
    /// # Errors
    ///
    /// Returns [`CatalogError::ClientSetup`] when the HTTP client cannot be
    /// built.
    pub fn new(config: LeanIxConfig) -> Result<Self, CatalogError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CatalogError::ClientSetup {
                message: e.to_string(),
            })?;

        Ok(Self { http, config })
    }
}

#[async_trait]
impl CatalogConnector for LeanIxConnector {
    async fn connect(&self) -> Result<Box<dyn CatalogClient>, CatalogError> {
        let client = LeanIxGraphQlClient::connect(self.http.clone(), &self.config).await?;
        Ok(Box::new(client))
    }
}

/// GraphQL client bound to a single access token.
pub struct LeanIxGraphQlClient {
    http: reqwest::Client,
    request_url: String,
    access_token: AccessToken,
}

impl LeanIxGraphQlClient {
    /// Exchange the API token for an access token.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::AuthenticationFailed`] when the token endpoint
    /// rejects the credentials or answers without an `access_token`, and
    /// [`CatalogError::Transport`] or [`CatalogError::Timeout`] when it cannot
    /// be reached.
    #[instrument(skip(http, config), fields(auth_url = %config.auth_url))]
    pub async fn connect(http: reqwest::Client, config: &LeanIxConfig) -> Result<Self, CatalogError> {
        let response = http
            .post(&config.auth_url)
            .basic_auth(API_TOKEN_USER, Some(&config.api_token))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(CatalogError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Token exchange rejected");
            return Err(CatalogError::AuthenticationFailed {
                message: format!("token endpoint returned HTTP {}: {}", status.as_u16(), message),
            });
        }

        let token: TokenResponse =
            response
                .json()
                .await
                .map_err(|e| CatalogError::AuthenticationFailed {
                    message: format!("token response could not be read: {}", e),
                })?;

        debug!("Obtained catalog access token");

        Ok(Self {
            http,
            request_url: config.request_url.clone(),
            access_token: AccessToken::new(token.access_token),
        })
    }

    pub fn access_token(&self) -> &AccessToken {
        &self.access_token
    }

    /// Send one mutation and check the GraphQL response for errors.
    #[instrument(skip(self, mutation), fields(fact_sheet_id = %mutation.fact_sheet_id))]
    pub async fn send_mutation(&self, mutation: &CommentMutation) -> Result<(), CatalogError> {
        let response = self
            .http
            .post(&self.request_url)
            .bearer_auth(self.access_token.as_str())
            .json(&mutation.to_request())
            .send()
            .await
            .map_err(CatalogError::from_reqwest)?;

        let status = response.status();
        let body = response.text().await.map_err(CatalogError::from_reqwest)?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "Catalog rejected mutation request");
            return Err(CatalogError::Status {
                status: status.as_u16(),
                message: body,
            });
        }

        // Only a well-formed GraphQL error list fails an otherwise successful call.
        if let Ok(parsed) = serde_json::from_str::<GraphQlResponse>(&body) {
            if !parsed.errors.is_empty() {
                let message = parsed
                    .errors
                    .into_iter()
                    .map(|e| e.message)
                    .collect::<Vec<_>>()
                    .join("; ");
                return Err(CatalogError::GraphQl { message });
            }

            let comment_id = parsed
                .data
                .as_ref()
                .and_then(|d| d.pointer("/createComment/id"))
                .and_then(|id| id.as_str());
            info!(comment_id = ?comment_id, "Comment created");
        }

        Ok(())
    }
}

#[async_trait]
impl CatalogClient for LeanIxGraphQlClient {
    async fn add_comment(&self, fact_sheet_id: &str, comment: &str) -> Result<(), CatalogError> {
        self.send_mutation(&CommentMutation::new(fact_sheet_id, comment))
            .await
    }
}

#[cfg(test)]
#[path = "leanix_tests.rs"]
mod tests;
