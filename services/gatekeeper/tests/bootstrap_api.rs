mod common;

use axum::http::StatusCode;
use common::{bootstrap_state, read_json};
use gatekeeper::app::{build_bootstrap_router, build_router};
use quorum_authz::UserId;
use tower::ServiceExt;

fn bootstrap_request(
    token: Option<&str>,
    body: serde_json::Value,
) -> axum::http::Request<axum::body::Body> {
    let mut builder = axum::http::Request::builder()
        .method("POST")
        .uri("/internal/bootstrap/grants")
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("x-quorum-bootstrap-token", token);
    }
    builder
        .body(axum::body::Body::from(body.to_string()))
        .expect("request")
}

#[tokio::test]
async fn bootstrap_disabled_reports_not_found() {
    let state = bootstrap_state(false, Some("sekrit"));
    let app = build_bootstrap_router(state).into_service();

    let request = bootstrap_request(
        Some("sekrit"),
        serde_json::json!({
            "types": ["permissions.verify"],
            "subject": UserId::random()
        }),
    );
    let response = app.clone().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let payload = read_json(response).await;
    assert_eq!(payload["code"], "not_enabled");
}

#[tokio::test]
async fn bootstrap_requires_the_exact_token() {
    let state = bootstrap_state(true, Some("sekrit"));
    let app = build_bootstrap_router(state).into_service();
    let subject = UserId::random();
    let body = serde_json::json!({
        "types": ["permissions.verify"],
        "subject": subject
    });

    let response = app
        .clone()
        .oneshot(bootstrap_request(None, body.clone()))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(bootstrap_request(Some("wrong"), body.clone()))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(bootstrap_request(Some("sekrit"), body))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json(response).await;
    assert_eq!(payload["activated"], 1);
}

#[tokio::test]
async fn bootstrap_with_no_configured_token_rejects() {
    let state = bootstrap_state(true, None);
    let app = build_bootstrap_router(state).into_service();

    let request = bootstrap_request(
        Some("anything"),
        serde_json::json!({
            "types": ["permissions.verify"],
            "subject": UserId::random()
        }),
    );
    let response = app.clone().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn bootstrapped_grant_authorizes_on_the_public_surface() {
    let state = bootstrap_state(true, Some("sekrit"));
    let bootstrap_app = build_bootstrap_router(state.clone()).into_service();
    let app = build_router(state).into_service();
    let admin = UserId::random();

    // A global grant minted on the internal listener...
    let request = bootstrap_request(
        Some("sekrit"),
        serde_json::json!({
            "types": ["permissions.create"],
            "subject": admin
        }),
    );
    let response = bootstrap_app.clone().oneshot(request).await.expect("mint");
    assert_eq!(response.status(), StatusCode::OK);

    // ...lets the subject grant at any scope on the public surface.
    let scope = uuid::Uuid::new_v4();
    let grant = http_helpers::json_request(
        "POST",
        "/v1/permissions/grant",
        admin,
        serde_json::json!({
            "types": ["profile.view"],
            "subject": UserId::random(),
            "scope": scope
        }),
    );
    let response = app.clone().oneshot(grant).await.expect("grant");
    assert_eq!(response.status(), StatusCode::OK);

    // The public router has no bootstrap route at all.
    let request = bootstrap_request(
        Some("sekrit"),
        serde_json::json!({
            "types": ["permissions.verify"],
            "subject": admin
        }),
    );
    let response = app.clone().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
