use gatekeeper::app::AppState;
use gatekeeper::store::{StoreConfig, memory::InMemoryStore};
use quorum_authz::{PermissionType, UserId};
use std::sync::Arc;

pub async fn read_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

pub fn memory_state() -> AppState {
    AppState::new(
        Arc::new(InMemoryStore::new(StoreConfig::default())),
        false,
        None,
    )
}

pub fn bootstrap_state(enabled: bool, token: Option<&str>) -> AppState {
    AppState::new(
        Arc::new(InMemoryStore::new(StoreConfig::default())),
        enabled,
        token.map(|value| value.to_string()),
    )
}

/// Seed a global super-admin through the bootstrap authority, the way an
/// operator would before the first request.
pub async fn seed_global_admin(state: &AppState) -> UserId {
    let admin = UserId::random();
    for permission in [
        PermissionType::PermissionsRead,
        PermissionType::PermissionsCreate,
        PermissionType::PermissionsVerify,
        PermissionType::PermissionsSuspend,
        PermissionType::GroupCreate,
        PermissionType::GroupUpdate,
        PermissionType::GroupDelete,
    ] {
        state
            .bootstrap
            .grant_active(admin, permission, admin, None)
            .await
            .expect("seed admin grant");
    }
    admin
}
