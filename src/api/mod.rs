// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{AccessDecision, DecisionContext, Effect, GatewayPolicy, PolicyDocument, PolicyStatement},
    error::ErrorBody,
    state::AppState,
};

pub mod authorize;
pub mod health;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/authorize", post(authorize::authorize))
        .with_state(state.clone());

    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state);

    Router::new()
        .nest("/v1", v1_routes)
        .merge(health_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        authorize::authorize,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            authorize::AuthorizerEvent,
            GatewayPolicy,
            PolicyDocument,
            PolicyStatement,
            AccessDecision,
            DecisionContext,
            Effect,
            ErrorBody,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Authorizer", description = "Gateway request authorization"),
        (name = "Health", description = "Liveness and readiness")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::test_support::{k1_cache, sign, valid_claims, AUDIENCE, ISSUER, K1, SUBJECT};
    use crate::auth::AuthorizerService;
    use crate::config::AuthConfig;
    use axum::{
        body::{to_bytes, Body},
        http::{header::CONTENT_TYPE, Request, StatusCode},
    };
    use tower::ServiceExt;

    const ARN: &str = "arn:aws:execute-api:eu-west-1:123456789012:abcdef/prod/POST/stats";

    fn app() -> Router {
        let (cache, _) = k1_cache();
        let config = AuthConfig::for_issuer(ISSUER, AUDIENCE, "https://idp.invalid/jwks.json");
        router(AppState::new(AuthorizerService::new(&config, cache)))
    }

    async fn post_event(app: Router, event: serde_json::Value) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(
                Request::post("/v1/authorize")
                    .header(CONTENT_TYPE, "application/json")
                    .body(Body::from(event.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn router_builds_with_all_routes() {
        let _ = app().into_make_service();
    }

    #[tokio::test]
    async fn authorize_returns_allow_policy() {
        let token = sign(&K1, &valid_claims());
        let (status, body) = post_event(
            app(),
            serde_json::json!({
                "type": "REQUEST",
                "methodArn": ARN,
                "headers": { "Cookie": format!("token={token}") }
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["principalId"], SUBJECT);
        assert_eq!(body["policyDocument"]["Statement"][0]["Effect"], "Allow");
        assert_eq!(body["policyDocument"]["Statement"][0]["Resource"], ARN);
        assert_eq!(body["context"]["principal"], SUBJECT);
    }

    #[tokio::test]
    async fn authorize_returns_deny_policy_without_detail() {
        let (status, body) = post_event(
            app(),
            serde_json::json!({
                "type": "REQUEST",
                "methodArn": ARN,
                "headers": { "cookie": "token=not-a-jwt" }
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["principalId"], "anonymous");
        assert_eq!(body["policyDocument"]["Statement"][0]["Effect"], "Deny");
        assert!(body.get("context").is_none());
        assert!(!body.to_string().contains("malformed"));
    }

    #[tokio::test]
    async fn authorize_tolerates_null_headers() {
        let (status, body) = post_event(
            app(),
            serde_json::json!({ "type": "REQUEST", "methodArn": ARN, "headers": null }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["policyDocument"]["Statement"][0]["Effect"], "Deny");
    }

    #[tokio::test]
    async fn authorize_rejects_event_without_method_arn() {
        let (status, body) = post_event(app(), serde_json::json!({ "headers": {} })).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid authorizer event");
    }

    #[tokio::test]
    async fn authorize_rejects_token_authorizer_events() {
        let (status, body) = post_event(
            app(),
            serde_json::json!({ "type": "TOKEN", "methodArn": ARN, "headers": {} }),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid authorizer event");
    }

    #[tokio::test]
    async fn authorize_accepts_event_without_type() {
        let (status, body) = post_event(app(), serde_json::json!({ "methodArn": ARN })).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["policyDocument"]["Statement"][0]["Effect"], "Deny");
    }

    #[tokio::test]
    async fn health_reports_cold_cache_without_fetching() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["checks"]["jwks"], "cold");
        assert_eq!(body["checks"]["jwks_keys"], 0);
    }
}
