mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{memory_state, read_json, seed_global_admin};
use gatekeeper::app::build_router;
use http_helpers::{get_request, json_request};
use quorum_authz::UserId;
use tower::ServiceExt;

#[tokio::test]
async fn system_endpoints_respond() {
    let app = build_router(memory_state()).into_service();

    let health = Request::builder()
        .uri("/v1/system/health")
        .body(Body::empty())
        .expect("request");
    let response = app.clone().oneshot(health).await.expect("health");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json(response).await;
    assert_eq!(payload["status"], "ok");

    let info = Request::builder()
        .uri("/v1/system/info")
        .body(Body::empty())
        .expect("request");
    let response = app.clone().oneshot(info).await.expect("info");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json(response).await;
    assert_eq!(payload["service"], "gatekeeper");
    assert_eq!(payload["storage_backend"], "memory");
    assert_eq!(payload["durable_storage"], false);
}

#[tokio::test]
async fn requests_without_acting_user_are_unauthorized() {
    let app = build_router(memory_state()).into_service();

    let request = Request::builder()
        .uri("/v1/permissions")
        .body(Body::empty())
        .expect("request");
    let response = app.clone().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .uri("/v1/permissions")
        .header("x-quorum-user", "not-a-uuid")
        .body(Body::empty())
        .expect("request");
    let response = app.clone().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn grant_approve_validate_flow() {
    let state = memory_state();
    let admin = seed_global_admin(&state).await;
    let subject = UserId::random();
    let scope = uuid::Uuid::new_v4();
    let app = build_router(state).into_service();

    // Unprivileged users cannot grant.
    let denied = json_request(
        "POST",
        "/v1/permissions/grant",
        subject,
        serde_json::json!({
            "types": ["communications.read"],
            "subject": subject,
            "scope": scope
        }),
    );
    let response = app.clone().oneshot(denied).await.expect("denied");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let payload = read_json(response).await;
    assert_eq!(payload["message"], "forbidden");

    let grant = json_request(
        "POST",
        "/v1/permissions/grant",
        admin,
        serde_json::json!({
            "types": ["communications.read", "profile.view"],
            "subject": subject,
            "scope": scope
        }),
    );
    let response = app.clone().oneshot(grant).await.expect("grant");
    assert_eq!(response.status(), StatusCode::OK);

    // Unverified grants do not validate.
    let validate = json_request(
        "POST",
        "/v1/permissions/validate",
        subject,
        serde_json::json!({
            "types": ["communications.read"],
            "scope": scope
        }),
    );
    let response = app.clone().oneshot(validate).await.expect("validate");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json(response).await;
    assert_eq!(payload["results"]["communications.read"], false);
    assert_eq!(payload["success"], false);

    let approve = json_request(
        "POST",
        "/v1/permissions/approve",
        admin,
        serde_json::json!({
            "types": ["communications.read", "profile.view", "group.delete"],
            "subject": subject,
            "scope": scope
        }),
    );
    let response = app.clone().oneshot(approve).await.expect("approve");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json(response).await;
    // Approving a type that was never granted reports false, not an error.
    assert_eq!(payload["results"]["communications.read"], true);
    assert_eq!(payload["results"]["profile.view"], true);
    assert_eq!(payload["results"]["group.delete"], false);
    assert_eq!(payload["success"], false);

    let validate = json_request(
        "POST",
        "/v1/permissions/validate",
        subject,
        serde_json::json!({
            "types": ["communications.read", "profile.view"],
            "scope": scope
        }),
    );
    let response = app.clone().oneshot(validate).await.expect("validate");
    let payload = read_json(response).await;
    assert_eq!(payload["success"], true);

    // Listing as the admin shows the rows.
    let list = get_request(&format!("/v1/permissions?scope={scope}"), admin);
    let response = app.clone().oneshot(list).await.expect("list");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json(response).await;
    assert_eq!(payload["total"], 2);

    // Suspend then re-validate.
    let suspend = json_request(
        "POST",
        "/v1/permissions/suspend",
        admin,
        serde_json::json!({
            "types": ["communications.read"],
            "subject": subject,
            "scope": scope
        }),
    );
    let response = app.clone().oneshot(suspend).await.expect("suspend");
    assert_eq!(response.status(), StatusCode::OK);

    let validate = json_request(
        "POST",
        "/v1/permissions/validate",
        subject,
        serde_json::json!({
            "types": ["communications.read"],
            "scope": scope
        }),
    );
    let response = app.clone().oneshot(validate).await.expect("validate");
    let payload = read_json(response).await;
    assert_eq!(payload["results"]["communications.read"], false);
}

#[tokio::test]
async fn self_service_validates_without_grants() {
    let state = memory_state();
    let user = UserId::random();
    let app = build_router(state).into_service();

    let validate = json_request(
        "POST",
        "/v1/permissions/validate",
        user,
        serde_json::json!({
            "types": ["profile.update", "profile.view"],
            "scope": user
        }),
    );
    let response = app.clone().oneshot(validate).await.expect("validate");
    let payload = read_json(response).await;
    assert_eq!(payload["results"]["profile.update"], true);
    assert_eq!(payload["results"]["profile.view"], false);
}

#[tokio::test]
async fn group_lifecycle_over_http() {
    let state = memory_state();
    let creator = UserId::random();
    let member = UserId::random();
    let app = build_router(state).into_service();

    let create = json_request(
        "POST",
        "/v1/groups",
        creator,
        serde_json::json!({
            "name": "hikers",
            "visibility": "public",
            "approval": "auto",
            "metadata": { "topic": "walking" }
        }),
    );
    let response = app.clone().oneshot(create).await.expect("create");
    assert_eq!(response.status(), StatusCode::CREATED);
    let group = read_json(response).await;
    let group_id = group["group_id"].as_str().expect("group id").to_string();
    assert_eq!(group["created_by"], serde_json::json!(creator));

    // The creator is the founding admin.
    let role = get_request(
        &format!("/v1/groups/{group_id}/members/{creator}/role"),
        creator,
    );
    let response = app.clone().oneshot(role).await.expect("role");
    let payload = read_json(response).await;
    assert_eq!(payload["role"], "ADMIN");

    // Auto-approval joins immediately.
    let join = json_request(
        "POST",
        &format!("/v1/groups/{group_id}/join"),
        member,
        serde_json::json!({}),
    );
    let response = app.clone().oneshot(join).await.expect("join");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json(response).await;
    assert_eq!(payload["status"], "joined");

    let role = get_request(
        &format!("/v1/groups/{group_id}/members/{member}/role"),
        member,
    );
    let response = app.clone().oneshot(role).await.expect("role");
    let payload = read_json(response).await;
    assert_eq!(payload["role"], "USER");

    // The creator (group-scope verifier) can change member roles.
    let promote = json_request(
        "PUT",
        &format!("/v1/groups/{group_id}/members/{member}/role"),
        creator,
        serde_json::json!({ "role": "MOD" }),
    );
    let response = app.clone().oneshot(promote).await.expect("promote");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json(response).await;
    assert_eq!(payload["role"], "MOD");

    // Members cannot change roles themselves.
    let denied = json_request(
        "PUT",
        &format!("/v1/groups/{group_id}/members/{member}/role"),
        member,
        serde_json::json!({ "role": "ADMIN" }),
    );
    let response = app.clone().oneshot(denied).await.expect("denied");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Metadata patch requires group.update, which the creator holds.
    let patch = json_request(
        "PATCH",
        &format!("/v1/groups/{group_id}"),
        creator,
        serde_json::json!({ "metadata": { "topic": "hiking", "level": "easy" } }),
    );
    let response = app.clone().oneshot(patch).await.expect("patch");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json(response).await;
    assert_eq!(payload["metadata"]["topic"], "hiking");
    assert_eq!(payload["metadata"]["level"], "easy");

    let denied_patch = json_request(
        "PATCH",
        &format!("/v1/groups/{group_id}"),
        member,
        serde_json::json!({ "metadata": { "topic": "sabotage" } }),
    );
    let response = app.clone().oneshot(denied_patch).await.expect("denied");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Listing finds the group.
    let list = get_request("/v1/groups?name=hik", member);
    let response = app.clone().oneshot(list).await.expect("list");
    let payload = read_json(response).await;
    assert_eq!(payload["total"], 1);
}

#[tokio::test]
async fn manual_and_closed_join_policies() {
    let state = memory_state();
    let creator = UserId::random();
    let member = UserId::random();
    let app = build_router(state).into_service();

    let create = json_request(
        "POST",
        "/v1/groups",
        creator,
        serde_json::json!({
            "name": "book club",
            "visibility": "public",
            "approval": "manual"
        }),
    );
    let response = app.clone().oneshot(create).await.expect("create");
    let group = read_json(response).await;
    let manual_id = group["group_id"].as_str().expect("group id").to_string();

    let join = json_request(
        "POST",
        &format!("/v1/groups/{manual_id}/join"),
        member,
        serde_json::json!({}),
    );
    let response = app.clone().oneshot(join).await.expect("join");
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let payload = read_json(response).await;
    assert_eq!(payload["status"], "pending");

    // Pending member has no role until approved.
    let role = get_request(
        &format!("/v1/groups/{manual_id}/members/{member}/role"),
        member,
    );
    let response = app.clone().oneshot(role).await.expect("role");
    let payload = read_json(response).await;
    assert_eq!(payload["role"], serde_json::Value::Null);

    let create = json_request(
        "POST",
        "/v1/groups",
        creator,
        serde_json::json!({
            "name": "archive",
            "visibility": "closed",
            "approval": "auto"
        }),
    );
    let response = app.clone().oneshot(create).await.expect("create");
    let group = read_json(response).await;
    let closed_id = group["group_id"].as_str().expect("group id").to_string();

    let join = json_request(
        "POST",
        &format!("/v1/groups/{closed_id}/join"),
        member,
        serde_json::json!({}),
    );
    let response = app.clone().oneshot(join).await.expect("join");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn private_groups_require_hierarchy_trust() {
    let state = memory_state();
    let creator = UserId::random();
    let stranger = UserId::random();
    let app = build_router(state).into_service();

    let create = json_request(
        "POST",
        "/v1/groups",
        creator,
        serde_json::json!({
            "name": "inner circle",
            "visibility": "private",
            "approval": "auto"
        }),
    );
    let response = app.clone().oneshot(create).await.expect("create");
    let group = read_json(response).await;
    let group_id = group["group_id"].as_str().expect("group id").to_string();

    let join = json_request(
        "POST",
        &format!("/v1/groups/{group_id}/join"),
        stranger,
        serde_json::json!({}),
    );
    let response = app.clone().oneshot(join).await.expect("join");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // The creator holds permissions.verify at the group, so their own join
    // request passes the visibility gate.
    let join = json_request(
        "POST",
        &format!("/v1/groups/{group_id}/join"),
        creator,
        serde_json::json!({}),
    );
    let response = app.clone().oneshot(join).await.expect("join");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn subgroups_ancestors_and_authority() {
    let state = memory_state();
    let creator = UserId::random();
    let app = build_router(state).into_service();

    let create = json_request(
        "POST",
        "/v1/groups",
        creator,
        serde_json::json!({ "name": "root", "visibility": "public", "approval": "auto" }),
    );
    let response = app.clone().oneshot(create).await.expect("create root");
    let root = read_json(response).await;
    let root_id = root["group_id"].as_str().expect("root id").to_string();

    // A stranger cannot create a subgroup under someone else's group.
    let stranger = UserId::random();
    let denied = json_request(
        "POST",
        "/v1/groups",
        stranger,
        serde_json::json!({ "name": "sub", "parent_scope": root_id }),
    );
    let response = app.clone().oneshot(denied).await.expect("denied");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // The root admin can: group.create is in the ADMIN bundle.
    let create_sub = json_request(
        "POST",
        "/v1/groups",
        creator,
        serde_json::json!({ "name": "sub", "parent_scope": root_id, "visibility": "public", "approval": "auto" }),
    );
    let response = app.clone().oneshot(create_sub).await.expect("create sub");
    assert_eq!(response.status(), StatusCode::CREATED);
    let sub = read_json(response).await;
    let sub_id = sub["group_id"].as_str().expect("sub id").to_string();

    let ancestors = get_request(&format!("/v1/groups/{sub_id}/ancestors"), creator);
    let response = app.clone().oneshot(ancestors).await.expect("ancestors");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json(response).await;
    assert_eq!(payload["parent"].as_str(), Some(root_id.as_str()));
    assert_eq!(payload["grandparent"], serde_json::Value::Null);
    assert_eq!(payload["ancestors"][0].as_str(), Some(root_id.as_str()));

    // The creator's verify authority lives at the root scope, not the
    // subgroup's own scope; the per-scope map shows exactly that.
    let authority = get_request(
        &format!("/v1/groups/{sub_id}/authority?types=permissions.verify"),
        creator,
    );
    let response = app.clone().oneshot(authority).await.expect("authority");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json(response).await;
    assert_eq!(payload["scopes"][&root_id], true);
    // The creator is also the subgroup's founding admin.
    assert_eq!(payload["scopes"][&sub_id], true);

    let member = UserId::random();
    let authority = get_request(
        &format!("/v1/groups/{sub_id}/authority?types=permissions.verify&subject={member}"),
        creator,
    );
    let response = app.clone().oneshot(authority).await.expect("authority");
    let payload = read_json(response).await;
    assert_eq!(payload["scopes"][&root_id], false);
    assert_eq!(payload["scopes"][&sub_id], false);

    // An ancestor-scope verifier can moderate the subgroup.
    let join = json_request(
        "POST",
        &format!("/v1/groups/{sub_id}/join"),
        member,
        serde_json::json!({}),
    );
    let response = app.clone().oneshot(join).await.expect("join");
    assert_eq!(response.status(), StatusCode::OK);

    let demote = json_request(
        "PUT",
        &format!("/v1/groups/{sub_id}/members/{member}/role"),
        creator,
        serde_json::json!({ "role": null }),
    );
    let response = app.clone().oneshot(demote).await.expect("demote");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json(response).await;
    assert_eq!(payload["role"], serde_json::Value::Null);
}

#[tokio::test]
async fn unknown_group_returns_not_found() {
    let state = memory_state();
    let user = UserId::random();
    let app = build_router(state).into_service();

    let missing = uuid::Uuid::new_v4();
    let get = get_request(&format!("/v1/groups/{missing}"), user);
    let response = app.clone().oneshot(get).await.expect("get");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let join = json_request(
        "POST",
        &format!("/v1/groups/{missing}/join"),
        user,
        serde_json::json!({}),
    );
    let response = app.clone().oneshot(join).await.expect("join");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
