use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::db::{RoleStore, StoreError, UserStore};
use crate::error::AppError;
use crate::extract::{ValidJson, ValidPath};
use crate::models::{NewUser, User, UserChanges, UserStatus};
use crate::state::SharedState;
use crate::validation::{self, nullable};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUser {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub phone: Option<String>,
    pub role_id: Option<Uuid>,
}

/// Absent keys are left untouched; `null` clears the nullable columns.
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub role_id: Option<Option<Uuid>>,
    pub status: Option<String>,
}

/// A role reference must point at an existing role; `None` is always fine.
pub(crate) async fn ensure_role_exists(
    state: &SharedState,
    role_id: Option<Uuid>,
) -> Result<(), AppError> {
    let Some(role_id) = role_id else {
        return Ok(());
    };
    if state.store.find_role_by_id(role_id).await?.is_none() {
        return Err(AppError::Validation(format!("role {role_id} does not exist")));
    }
    Ok(())
}

/// Maps store conflicts raised by a user write. Covers the race between
/// the pre-check and the insert as well as a role deleted in between.
pub(crate) fn email_conflict(err: StoreError) -> AppError {
    match err {
        StoreError::UniqueViolation(_) => AppError::DuplicateEmail,
        StoreError::ForeignKeyViolation(_) => {
            AppError::Validation("roleId does not reference an existing role".to_string())
        }
        other => AppError::Store(other),
    }
}

pub async fn list_users(State(state): State<SharedState>) -> Result<Json<Vec<User>>, AppError> {
    let users = state.store.list_users().await?;
    Ok(Json(users))
}

pub async fn get_user(
    State(state): State<SharedState>,
    ValidPath(id): ValidPath<Uuid>,
) -> Result<Json<User>, AppError> {
    let user = state
        .store
        .find_user_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    Ok(Json(user))
}

pub async fn create_user(
    State(state): State<SharedState>,
    ValidJson(req): ValidJson<CreateUser>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let name = validation::name("name", &req.name)?;
    let email = validation::email(&req.email)?;
    validation::password(&req.password)?;
    let phone = validation::phone(req.phone.as_deref())?;

    if state.store.find_user_by_email(&email).await?.is_some() {
        return Err(AppError::DuplicateEmail);
    }
    ensure_role_exists(&state, req.role_id).await?;

    let password_hash = state.hasher.hash_async(req.password).await?;

    let user = state
        .store
        .insert_user(NewUser {
            name,
            email,
            password_hash,
            phone,
            role_id: req.role_id,
        })
        .await
        .map_err(email_conflict)?;

    tracing::info!(user_id = %user.id, "User created");

    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn update_user(
    State(state): State<SharedState>,
    ValidPath(id): ValidPath<Uuid>,
    ValidJson(req): ValidJson<UpdateUser>,
) -> Result<Json<User>, AppError> {
    let mut changes = UserChanges::default();

    if let Some(name) = req.name.as_deref() {
        changes.name = Some(validation::name("name", name)?);
    }

    if let Some(raw) = req.email.as_deref() {
        let email = validation::email(raw)?;
        if let Some(holder) = state.store.find_user_by_email(&email).await? {
            if holder.id != id {
                return Err(AppError::DuplicateEmail);
            }
        }
        changes.email = Some(email);
    }

    if let Some(phone) = req.phone {
        changes.phone = Some(validation::phone(phone.as_deref())?);
    }

    if let Some(role_id) = req.role_id {
        ensure_role_exists(&state, role_id).await?;
        changes.role_id = Some(role_id);
    }

    if let Some(status) = req.status.as_deref() {
        let status = status
            .parse::<UserStatus>()
            .map_err(|_| AppError::Validation("status must be 'active' or 'inactive'".to_string()))?;
        changes.status = Some(status);
    }

    if let Some(password) = req.password {
        validation::password(&password)?;
        changes.password_hash = Some(state.hasher.hash_async(password).await?);
    }

    let user = state
        .store
        .update_user(id, changes)
        .await
        .map_err(email_conflict)?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    tracing::info!(user_id = %user.id, "User updated");

    Ok(Json(user))
}

pub async fn delete_user(
    State(state): State<SharedState>,
    ValidPath(id): ValidPath<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    if !state.store.delete_user(id).await? {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    tracing::info!(user_id = %id, "User deleted");

    Ok(Json(serde_json::json!({ "message": "Deleted" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_body_distinguishes_null_from_absent() {
        let body: UpdateUser = serde_json::from_str(r#"{"phone":null}"#).unwrap();
        assert_eq!(body.phone, Some(None));
        assert_eq!(body.role_id, None);

        let body: UpdateUser =
            serde_json::from_str(r#"{"roleId":null,"name":"Ana"}"#).unwrap();
        assert_eq!(body.role_id, Some(None));
        assert_eq!(body.name.as_deref(), Some("Ana"));
    }

    #[test]
    fn store_conflicts_map_to_api_errors() {
        assert!(matches!(
            email_conflict(StoreError::UniqueViolation("users_email_key".into())),
            AppError::DuplicateEmail
        ));
        assert!(matches!(
            email_conflict(StoreError::ForeignKeyViolation("users_role_id_fkey".into())),
            AppError::Validation(_)
        ));
        assert!(matches!(
            email_conflict(StoreError::Backend("down".into())),
            AppError::Store(_)
        ));
    }
}
