pub mod auth;
pub mod catalog;
pub mod permissions;
pub mod role_permissions;
pub mod roles;
pub mod users;

use axum::middleware::from_fn_with_state;
use axum::routing::{delete, get, post};
use axum::Router;

use crate::middleware::auth::require_auth;
use crate::state::SharedState;

/// Registration and login. Reachable without a token.
pub fn public_routes() -> Router<SharedState> {
    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
}

/// Everything behind [`require_auth`].
pub fn protected_routes(state: &SharedState) -> Router<SharedState> {
    Router::new()
        .route("/auth/me", get(auth::me))
        // Users
        .route("/api/users", get(users::list_users).post(users::create_user))
        .route(
            "/api/users/{id}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        // Roles
        .route("/api/roles", get(roles::list_roles).post(roles::create_role))
        .route(
            "/api/roles/{id}",
            get(roles::get_role)
                .put(roles::update_role)
                .delete(roles::delete_role),
        )
        // Permissions
        .route(
            "/api/permissions",
            get(permissions::list_permissions).post(permissions::create_permission),
        )
        .route(
            "/api/permissions/{id}",
            get(permissions::get_permission)
                .put(permissions::update_permission)
                .delete(permissions::delete_permission),
        )
        // Role permissions
        .route(
            "/api/roles-permissions",
            get(role_permissions::list_assignments).post(role_permissions::assign),
        )
        .route(
            "/api/roles-permissions/{role_id}/{permission_id}",
            delete(role_permissions::revoke),
        )
        .route_layer(from_fn_with_state(state.clone(), require_auth))
}
