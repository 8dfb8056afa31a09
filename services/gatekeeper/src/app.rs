//! HTTP application wiring.
//!
//! # Purpose
//! Builds the Axum routers and defines the shared application state injected
//! into handlers. The public router and the internal bootstrap router are
//! separate so the privileged surface can bind to a different listener.
use crate::api;
use crate::api::openapi::ApiDoc;
use crate::engine::{BootstrapAuthority, HierarchyResolver, MembershipWorkflow, PermissionAuthority};
use crate::store::GrantStore;
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

#[derive(Clone)]
pub struct AppState {
    pub api_version: String,
    pub store: Arc<dyn GrantStore>,
    pub authority: PermissionAuthority,
    pub hierarchy: HierarchyResolver,
    pub membership: MembershipWorkflow,
    pub bootstrap: BootstrapAuthority,
    pub bootstrap_enabled: bool,
    pub bootstrap_token: Option<String>,
}

impl AppState {
    /// Assemble state over any store backend. The engine components share
    /// the store handle; they hold no state of their own.
    pub fn new(
        store: Arc<dyn GrantStore>,
        bootstrap_enabled: bool,
        bootstrap_token: Option<String>,
    ) -> Self {
        let authority = PermissionAuthority::new(store.clone());
        let hierarchy = HierarchyResolver::new(store.clone(), authority.clone());
        let membership = MembershipWorkflow::new(store.clone(), authority.clone());
        let bootstrap = BootstrapAuthority::new(store.clone());
        Self {
            api_version: "v1".to_string(),
            store,
            authority,
            hierarchy,
            membership,
            bootstrap,
            bootstrap_enabled,
            bootstrap_token,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let trace_layer =
        TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
            tracing::info_span!(
                "http.request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version()
            )
        });

    Router::new()
        .route(
            "/v1/system/info",
            axum::routing::get(api::system::system_info),
        )
        .route(
            "/v1/system/health",
            axum::routing::get(api::system::system_health),
        )
        .route(
            "/v1/permissions",
            axum::routing::get(api::permissions::list_permissions),
        )
        .route(
            "/v1/permissions/grant",
            axum::routing::post(api::permissions::grant_permissions),
        )
        .route(
            "/v1/permissions/approve",
            axum::routing::post(api::permissions::approve_permissions),
        )
        .route(
            "/v1/permissions/suspend",
            axum::routing::post(api::permissions::suspend_permissions),
        )
        .route(
            "/v1/permissions/validate",
            axum::routing::post(api::permissions::validate_permissions),
        )
        .route(
            "/v1/groups",
            axum::routing::get(api::groups::list_groups).post(api::groups::create_group),
        )
        .route(
            "/v1/groups/:group_id",
            axum::routing::get(api::groups::get_group).patch(api::groups::patch_group),
        )
        .route(
            "/v1/groups/:group_id/ancestors",
            axum::routing::get(api::groups::group_ancestors),
        )
        .route(
            "/v1/groups/:group_id/authority",
            axum::routing::get(api::groups::group_authority),
        )
        .route(
            "/v1/groups/:group_id/join",
            axum::routing::post(api::groups::join_group),
        )
        .route(
            "/v1/groups/:group_id/members/:user_id/role",
            axum::routing::get(api::groups::get_member_role)
                .put(api::groups::put_member_role),
        )
        .merge(
            utoipa_swagger_ui::SwaggerUi::new("/docs").url("/v1/openapi.json", ApiDoc::openapi()),
        )
        .layer(trace_layer)
        .with_state(state)
}

pub fn build_bootstrap_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/internal/bootstrap/grants",
            axum::routing::post(api::bootstrap::bootstrap_grants),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
