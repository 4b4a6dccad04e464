//! Tests for error to HTTP response mapping.

use super::*;
use description_bot_core::{
    CatalogError, Disqualification, EventParseError, GenerationError,
};

async fn body_message(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    let body: MessageResponse = serde_json::from_slice(&bytes).expect("body should be JSON");
    body.message
}

mod gate_rejections {
    use super::*;

    /// Verify that credential failures carry the Basic challenge.
    #[tokio::test]
    async fn test_credential_rejection_carries_challenge() {
        for rejection in [GateRejection::MissingCredentials, GateRejection::InvalidCredentials] {
            let response = rejection.into_response();

            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            assert_eq!(
                response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
                BASIC_AUTH_CHALLENGE
            );
            assert_eq!(body_message(response).await, "Authentication required.");
        }
    }

    /// Verify the rate limit response and its Retry-After header.
    #[tokio::test]
    async fn test_rate_limit_rejection_sets_retry_after() {
        let response = GateRejection::RateLimited {
            retry_after_seconds: 42,
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "42");
        assert!(response.headers().get(header::WWW_AUTHENTICATE).is_none());
    }

    /// Verify the user agent rejection.
    #[tokio::test]
    async fn test_user_agent_rejection() {
        let response = GateRejection::ForbiddenUserAgent.into_response();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_message(response).await, "User-Agent is forbidden.");
    }

    /// Verify the origin rejection.
    #[tokio::test]
    async fn test_origin_rejection() {
        let response = GateRejection::UnofficialOrigin.into_response();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_message(response).await, "No official request.");
    }
}

mod handler_errors {
    use super::*;

    /// Verify that malformed payloads are client errors.
    #[tokio::test]
    async fn test_malformed_event_is_bad_request() {
        let error = WebhookHandlerError::from(OrchestrationError::MalformedEvent(
            EventParseError::EmptyBody,
        ));

        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_message(response).await, "Malformed webhook payload.");
    }

    /// Verify that non-actionable events are client errors.
    #[tokio::test]
    async fn test_not_actionable_is_bad_request() {
        let error = WebhookHandlerError::from(OrchestrationError::NotActionable(
            Disqualification::MissingFactSheetId,
        ));

        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_message(response).await, "Webhook wrong.");
    }

    /// Verify that upstream failures are server errors without details.
    #[tokio::test]
    async fn test_upstream_failures_hide_details() {
        let errors = [
            OrchestrationError::Generation(GenerationError::Transport {
                message: "dns error: api.openai.com".to_string(),
            }),
            OrchestrationError::Catalog(CatalogError::AuthenticationFailed {
                message: "token endpoint returned HTTP 401".to_string(),
            }),
        ];

        for error in errors {
            let response = WebhookHandlerError::from(error).into_response();

            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(body_message(response).await, "An error occurred.");
        }
    }
}
