use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::db::{PermissionStore, RoleStore, StoreError};
use crate::error::AppError;
use crate::extract::{ValidJson, ValidPath};
use crate::models::RolePermission;
use crate::state::SharedState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignPermission {
    pub role_id: Uuid,
    pub permission_id: Uuid,
}

pub async fn list_assignments(
    State(state): State<SharedState>,
) -> Result<Json<Vec<RolePermission>>, AppError> {
    Ok(Json(state.store.list_role_permissions().await?))
}

pub async fn assign(
    State(state): State<SharedState>,
    ValidJson(req): ValidJson<AssignPermission>,
) -> Result<(StatusCode, Json<RolePermission>), AppError> {
    if state.store.find_role_by_id(req.role_id).await?.is_none() {
        return Err(AppError::Validation(format!(
            "role {} does not exist",
            req.role_id
        )));
    }
    if state
        .store
        .find_permission_by_id(req.permission_id)
        .await?
        .is_none()
    {
        return Err(AppError::Validation(format!(
            "permission {} does not exist",
            req.permission_id
        )));
    }
    if state
        .store
        .find_role_permission(req.role_id, req.permission_id)
        .await?
        .is_some()
    {
        return Err(AppError::AlreadyExists(
            "Permission is already assigned to this role".to_string(),
        ));
    }

    let assignment = state
        .store
        .insert_role_permission(req.role_id, req.permission_id)
        .await
        .map_err(|err| match err {
            StoreError::UniqueViolation(_) => AppError::AlreadyExists(
                "Permission is already assigned to this role".to_string(),
            ),
            StoreError::ForeignKeyViolation(_) => AppError::Validation(
                "role or permission no longer exists".to_string(),
            ),
            other => AppError::Store(other),
        })?;

    tracing::info!(
        role_id = %assignment.role_id,
        permission_id = %assignment.permission_id,
        "Permission assigned"
    );

    Ok((StatusCode::CREATED, Json(assignment)))
}

pub async fn revoke(
    State(state): State<SharedState>,
    ValidPath((role_id, permission_id)): ValidPath<(Uuid, Uuid)>,
) -> Result<Json<serde_json::Value>, AppError> {
    if !state
        .store
        .delete_role_permission(role_id, permission_id)
        .await?
    {
        return Err(AppError::NotFound("Assignment not found".to_string()));
    }

    tracing::info!(%role_id, %permission_id, "Permission revoked");

    Ok(Json(serde_json::json!({ "message": "Deleted" })))
}
