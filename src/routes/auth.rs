use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::extractor::Identity;
use crate::db::UserStore;
use crate::error::AppError;
use crate::extract::ValidJson;
use crate::models::{NewUser, User};
use crate::routes::users::{email_conflict, ensure_role_exists};
use crate::state::SharedState;
use crate::validation;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub phone: Option<String>,
    pub role_id: Option<Uuid>,
}

pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    pub role_id: Option<Uuid>,
}

impl RegisterRequest {
    pub fn parse(self) -> Result<Registration, AppError> {
        let name = validation::name("name", &self.name)?;
        let email = validation::email(&self.email)?;
        validation::password(&self.password)?;
        let phone = validation::phone(self.phone.as_deref())?;
        Ok(Registration {
            name,
            email,
            password: self.password,
            phone,
            role_id: self.role_id,
        })
    }
}

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    /// Only presence is checked. A malformed email just fails the lookup.
    pub fn parse(self) -> Result<Credentials, AppError> {
        if self.email.trim().is_empty() || self.password.is_empty() {
            return Err(AppError::Validation(
                "email and password are required".to_string(),
            ));
        }
        Ok(Credentials {
            email: validation::normalize_email(&self.email),
            password: self.password,
        })
    }
}

/// Public projection of a user plus a fresh token.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role_id: Option<Uuid>,
    pub token: String,
}

impl AuthResponse {
    fn new(user: &User, token: String) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role_id: user.role_id,
            token,
        }
    }
}

#[derive(Serialize)]
pub struct MeResponse {
    pub identity: Identity,
    pub user: User,
}

pub async fn register(
    State(state): State<SharedState>,
    ValidJson(req): ValidJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let input = req.parse()?;

    if state.store.find_user_by_email(&input.email).await?.is_some() {
        return Err(AppError::DuplicateEmail);
    }
    ensure_role_exists(&state, input.role_id).await?;

    let password_hash = state.hasher.hash_async(input.password).await?;

    let user = state
        .store
        .insert_user(NewUser {
            name: input.name,
            email: input.email,
            password_hash,
            phone: input.phone,
            role_id: input.role_id,
        })
        .await
        .map_err(email_conflict)?;

    let token = state.tokens.issue(user.id, user.role_id)?;

    tracing::info!(user_id = %user.id, "User registered");

    Ok((StatusCode::CREATED, Json(AuthResponse::new(&user, token))))
}

pub async fn login(
    State(state): State<SharedState>,
    ValidJson(req): ValidJson<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let creds = req.parse()?;

    let user = state.store.find_user_by_email(&creds.email).await?;

    // Runs for unknown emails too, against a dummy hash.
    let stored_hash = user.as_ref().map(|u| u.password_hash.clone());
    let valid = state.hasher.verify_async(creds.password, stored_hash).await;

    let user = match user {
        Some(user) if valid && user.is_active() => user,
        Some(user) if valid => {
            tracing::debug!(user_id = %user.id, "Login rejected: account inactive");
            return Err(AppError::InvalidCredentials);
        }
        _ => {
            tracing::debug!("Login rejected: bad credentials");
            return Err(AppError::InvalidCredentials);
        }
    };

    let token = state.tokens.issue(user.id, user.role_id)?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(AuthResponse::new(&user, token)))
}

pub async fn me(
    State(state): State<SharedState>,
    identity: Identity,
) -> Result<Json<MeResponse>, AppError> {
    let user = state
        .store
        .find_user_by_id(identity.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(MeResponse { identity, user }))
}
