use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::db::PermissionStore;
use crate::error::AppError;
use crate::extract::{ValidJson, ValidPath};
use crate::models::Permission;
use crate::routes::catalog::{name_conflict, CreateEntry, UpdateEntry};
use crate::state::SharedState;

fn duplicate() -> AppError {
    AppError::AlreadyExists("Permission with this name already exists".to_string())
}

pub async fn list_permissions(
    State(state): State<SharedState>,
) -> Result<Json<Vec<Permission>>, AppError> {
    Ok(Json(state.store.list_permissions().await?))
}

pub async fn get_permission(
    State(state): State<SharedState>,
    ValidPath(id): ValidPath<Uuid>,
) -> Result<Json<Permission>, AppError> {
    let permission = state
        .store
        .find_permission_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Permission not found".to_string()))?;
    Ok(Json(permission))
}

pub async fn create_permission(
    State(state): State<SharedState>,
    ValidJson(req): ValidJson<CreateEntry>,
) -> Result<(StatusCode, Json<Permission>), AppError> {
    let entry = req.parse()?;

    if state.store.find_permission_by_name(&entry.name).await?.is_some() {
        return Err(duplicate());
    }

    let permission = state
        .store
        .insert_permission(&entry.name, entry.description.as_deref())
        .await
        .map_err(name_conflict("Permission"))?;

    tracing::info!(permission_id = %permission.id, name = %permission.name, "Permission created");

    Ok((StatusCode::CREATED, Json(permission)))
}

pub async fn update_permission(
    State(state): State<SharedState>,
    ValidPath(id): ValidPath<Uuid>,
    ValidJson(req): ValidJson<UpdateEntry>,
) -> Result<Json<Permission>, AppError> {
    let changes = req.parse()?;

    if let Some(name) = changes.name.as_deref() {
        let clash = state.store.find_permission_by_name(name).await?;
        if clash.is_some_and(|p| p.id != id) {
            return Err(duplicate());
        }
    }

    let permission = state
        .store
        .update_permission(id, changes)
        .await
        .map_err(name_conflict("Permission"))?
        .ok_or_else(|| AppError::NotFound("Permission not found".to_string()))?;

    Ok(Json(permission))
}

pub async fn delete_permission(
    State(state): State<SharedState>,
    ValidPath(id): ValidPath<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    if !state.store.delete_permission(id).await? {
        return Err(AppError::NotFound("Permission not found".to_string()));
    }

    tracing::info!(permission_id = %id, "Permission deleted");

    Ok(Json(serde_json::json!({ "message": "Deleted" })))
}
