use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::db::RoleStore;
use crate::error::AppError;
use crate::extract::{ValidJson, ValidPath};
use crate::models::Role;
use crate::routes::catalog::{name_conflict, CreateEntry, UpdateEntry};
use crate::state::SharedState;

pub async fn list_roles(State(state): State<SharedState>) -> Result<Json<Vec<Role>>, AppError> {
    let roles = state.store.list_roles().await?;
    Ok(Json(roles))
}

pub async fn get_role(
    State(state): State<SharedState>,
    ValidPath(id): ValidPath<Uuid>,
) -> Result<Json<Role>, AppError> {
    let role = state
        .store
        .find_role_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Role not found".to_string()))?;
    Ok(Json(role))
}

pub async fn create_role(
    State(state): State<SharedState>,
    ValidJson(req): ValidJson<CreateEntry>,
) -> Result<(StatusCode, Json<Role>), AppError> {
    let entry = req.parse()?;

    if state.store.find_role_by_name(&entry.name).await?.is_some() {
        return Err(AppError::AlreadyExists(
            "Role with this name already exists".to_string(),
        ));
    }

    let role = state
        .store
        .insert_role(&entry.name, entry.description.as_deref())
        .await
        .map_err(name_conflict("Role"))?;

    tracing::info!(role_id = %role.id, name = %role.name, "Role created");

    Ok((StatusCode::CREATED, Json(role)))
}

pub async fn update_role(
    State(state): State<SharedState>,
    ValidPath(id): ValidPath<Uuid>,
    ValidJson(req): ValidJson<UpdateEntry>,
) -> Result<Json<Role>, AppError> {
    let changes = req.parse()?;

    if let Some(name) = changes.name.as_deref() {
        if let Some(existing) = state.store.find_role_by_name(name).await? {
            if existing.id != id {
                return Err(AppError::AlreadyExists(
                    "Role with this name already exists".to_string(),
                ));
            }
        }
    }

    let role = state
        .store
        .update_role(id, changes)
        .await
        .map_err(name_conflict("Role"))?
        .ok_or_else(|| AppError::NotFound("Role not found".to_string()))?;

    Ok(Json(role))
}

pub async fn delete_role(
    State(state): State<SharedState>,
    ValidPath(id): ValidPath<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    if !state.store.delete_role(id).await? {
        return Err(AppError::NotFound("Role not found".to_string()));
    }

    tracing::info!(role_id = %id, "Role deleted");

    Ok(Json(serde_json::json!({ "message": "Deleted" })))
}
