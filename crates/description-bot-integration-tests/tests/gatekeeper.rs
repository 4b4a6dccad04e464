//! Integration tests for webhook admission

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use common::{
    basic_auth, create_test_router, created_application_body, response_message, test_config,
    webhook_request, webhook_request_with_header, MockCatalog, MockGenerator, PASSWORD, USERNAME,
};
use tower::ServiceExt;

fn router_with_mocks() -> (axum::Router, MockGenerator, MockCatalog) {
    let generator = MockGenerator::returning("Text.");
    let catalog = MockCatalog::new();
    let app = create_test_router(test_config(), &generator, &catalog);
    (app, generator, catalog)
}

mod credentials {
    use super::*;

    /// Verify that missing credentials yield the Basic challenge regardless of body
    #[tokio::test]
    async fn test_missing_credentials_challenge() {
        for body in [created_application_body(), "not json".to_string(), String::new()] {
            // Arrange
            let (app, generator, _) = router_with_mocks();
            let request = Request::post("/webhook")
                .header(header::USER_AGENT, common::USER_AGENT)
                .header("X-Webhooks-Event", common::ORIGIN)
                .body(Body::from(body))
                .unwrap();

            // Act
            let response = app.oneshot(request).await.unwrap();

            // Assert
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            assert_eq!(
                response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
                "Basic realm=\"Login required\""
            );
            assert_eq!(response_message(response).await, "Authentication required.");
            assert_eq!(generator.call_count(), 0);
        }
    }

    /// Verify that wrong credentials are challenged
    #[tokio::test]
    async fn test_wrong_credentials_challenge() {
        // Arrange
        let (app, generator, _) = router_with_mocks();
        let request = webhook_request_with_header(
            "authorization",
            &basic_auth(USERNAME, "wrong"),
            created_application_body(),
        );

        // Act
        let response = app.oneshot(request).await.unwrap();

        // Assert
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().contains_key(header::WWW_AUTHENTICATE));
        assert_eq!(generator.call_count(), 0);
    }

    /// Verify that a swapped user name and password are rejected
    #[tokio::test]
    async fn test_swapped_credentials_rejected() {
        // Arrange
        let (app, _, _) = router_with_mocks();
        let request = webhook_request_with_header(
            "authorization",
            &basic_auth(PASSWORD, USERNAME),
            created_application_body(),
        );

        // Act
        let response = app.oneshot(request).await.unwrap();

        // Assert
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}

mod headers {
    use super::*;

    /// Verify that an unknown user agent is forbidden before processing
    #[tokio::test]
    async fn test_forbidden_user_agent() {
        // Arrange
        let (app, generator, catalog) = router_with_mocks();
        let request =
            webhook_request_with_header("user-agent", "curl/8.4.0", created_application_body());

        // Act
        let response = app.oneshot(request).await.unwrap();

        // Assert
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(response_message(response).await, "User-Agent is forbidden.");
        assert_eq!(generator.call_count(), 0);
        assert_eq!(catalog.connect_count(), 0);
    }

    /// Verify that a foreign origin is forbidden before processing
    #[tokio::test]
    async fn test_foreign_origin() {
        // Arrange
        let (app, generator, catalog) = router_with_mocks();
        let request = webhook_request_with_header(
            "x-webhooks-event",
            "https://attacker.example.com",
            created_application_body(),
        );

        // Act
        let response = app.oneshot(request).await.unwrap();

        // Assert
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(response_message(response).await, "No official request.");
        assert_eq!(generator.call_count(), 0);
        assert_eq!(catalog.connect_count(), 0);
    }

    /// Verify that a missing origin header is forbidden
    #[tokio::test]
    async fn test_missing_origin() {
        // Arrange
        let (app, _, _) = router_with_mocks();
        let request = Request::post("/webhook")
            .header(header::AUTHORIZATION, basic_auth(USERNAME, PASSWORD))
            .header(header::USER_AGENT, common::USER_AGENT)
            .body(Body::from(created_application_body()))
            .unwrap();

        // Act
        let response = app.oneshot(request).await.unwrap();

        // Assert
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(response_message(response).await, "No official request.");
    }
}

mod rate_limit {
    use super::*;

    /// Verify that the request after the quota is refused before body parsing
    #[tokio::test]
    async fn test_request_over_quota_is_refused_before_parsing() {
        // Arrange
        let mut config = test_config();
        config.security.rate_limit.max_requests = 2;
        let generator = MockGenerator::returning("Text.");
        let catalog = MockCatalog::new();
        let app = create_test_router(config, &generator, &catalog);

        for _ in 0..2 {
            let response = app
                .clone()
                .oneshot(webhook_request(created_application_body()))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        // Act
        let response = app.oneshot(webhook_request("not json")).await.unwrap();

        // Assert
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        let retry_after: u64 = response
            .headers()
            .get(header::RETRY_AFTER)
            .expect("Retry-After should be set")
            .to_str()
            .unwrap()
            .parse()
            .unwrap();
        assert!((1..=60).contains(&retry_after));
        assert_eq!(generator.call_count(), 2);
    }

    /// Verify that rejected requests use up the quota too
    #[tokio::test]
    async fn test_rejected_requests_consume_quota() {
        // Arrange
        let mut config = test_config();
        config.security.rate_limit.max_requests = 1;
        let generator = MockGenerator::returning("Text.");
        let catalog = MockCatalog::new();
        let app = create_test_router(config, &generator, &catalog);

        let unauthenticated = Request::post("/webhook").body(Body::empty()).unwrap();
        let response = app.clone().oneshot(unauthenticated).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        // Act
        let response = app
            .oneshot(webhook_request(created_application_body()))
            .await
            .unwrap();

        // Assert
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(generator.call_count(), 0);
    }

    /// Verify that the rate limit applies before the credential check
    #[tokio::test]
    async fn test_rate_limit_precedes_authentication() {
        // Arrange
        let mut config = test_config();
        config.security.rate_limit.max_requests = 1;
        let generator = MockGenerator::returning("Text.");
        let catalog = MockCatalog::new();
        let app = create_test_router(config, &generator, &catalog);

        let response = app
            .clone()
            .oneshot(webhook_request(created_application_body()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // Act
        let response = app
            .oneshot(Request::post("/webhook").body(Body::empty()).unwrap())
            .await
            .unwrap();

        // Assert
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(!response.headers().contains_key(header::WWW_AUTHENTICATE));
    }

    /// Verify that the quota is shared across concurrent callers
    #[tokio::test]
    async fn test_quota_shared_across_concurrent_requests() {
        // Arrange
        let mut config = test_config();
        config.security.rate_limit.max_requests = 5;
        let generator = MockGenerator::returning("Text.");
        let catalog = MockCatalog::new();
        let app = create_test_router(config, &generator, &catalog);

        // Act
        let handles: Vec<_> = (0..12)
            .map(|_| {
                let app = app.clone();
                tokio::spawn(async move {
                    app.oneshot(webhook_request(created_application_body()))
                        .await
                        .unwrap()
                        .status()
                })
            })
            .collect();

        let mut statuses = Vec::new();
        for handle in handles {
            statuses.push(handle.await.unwrap());
        }

        // Assert
        let admitted = statuses.iter().filter(|s| **s == StatusCode::OK).count();
        let limited = statuses
            .iter()
            .filter(|s| **s == StatusCode::TOO_MANY_REQUESTS)
            .count();
        assert_eq!(admitted, 5);
        assert_eq!(limited, 7);
        assert_eq!(catalog.comments().len(), 5);
    }
}
