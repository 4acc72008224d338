use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use serde::Serialize;
use uuid::Uuid;

use crate::auth::jwt::Claims;
use crate::error::AppError;

/// The verified caller, placed in request extensions by
/// [`require_auth`](crate::middleware::auth::require_auth).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub user_id: Uuid,
    pub role_id: Option<Uuid>,
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            role_id: claims.role,
        }
    }
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Only the auth middleware inserts this; a route outside it gets 403.
        parts
            .extensions
            .get::<Identity>()
            .copied()
            .ok_or(AppError::Unauthenticated)
    }
}
