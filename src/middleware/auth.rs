use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;

use crate::auth::extractor::Identity;
use crate::auth::jwt::{self, TokenError, TokenService};
use crate::error::AppError;
use crate::state::SharedState;

/// Gate for protected routes.
///
/// No `Authorization` header is rejected with 403. A header that is not a
/// valid, unexpired bearer token is rejected with 401. On success the
/// [`Identity`] from the token is attached to the request before the handler
/// runs.
pub async fn require_auth(
    State(state): State<SharedState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let identity = authenticate(&state.tokens, req.headers()).map_err(|err| {
        tracing::debug!(path = %req.uri().path(), reason = %err, "Request rejected");
        match err {
            TokenError::MissingHeader => AppError::Unauthenticated,
            _ => AppError::InvalidToken,
        }
    })?;

    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}

fn authenticate(tokens: &TokenService, headers: &HeaderMap) -> Result<Identity, TokenError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(TokenError::MissingHeader)?
        .to_str()
        .map_err(|_| TokenError::MalformedHeader)?;

    let claims = tokens.verify(jwt::bearer_token(value)?)?;
    Ok(Identity::from(claims))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use axum::routing::get;
    use axum::{Json, Router};
    use chrono::{Duration, Utc};
    use serde_json::Value;
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::config::Config;
    use crate::db::MemoryStore;
    use crate::state::AppState;

    fn state() -> SharedState {
        Arc::new(AppState::new(Config::for_tests(), Arc::new(MemoryStore::new())).unwrap())
    }

    fn app(state: SharedState) -> Router {
        Router::new()
            .route("/whoami", get(|identity: Identity| async move { Json(identity) }))
            .route_layer(axum::middleware::from_fn_with_state(
                state.clone(),
                require_auth,
            ))
            .with_state(state)
    }

    async fn call(state: SharedState, authorization: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::builder().uri("/whoami");
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        let resp = app(state)
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn missing_header_is_forbidden() {
        let (status, body) = call(state(), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "UNAUTHENTICATED");
    }

    #[tokio::test]
    async fn non_bearer_header_is_unauthorized() {
        let (status, body) = call(state(), Some("Token abc")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "INVALID_TOKEN");
    }

    #[tokio::test]
    async fn bare_token_without_scheme_is_unauthorized() {
        let state = state();
        let token = state.tokens.issue(Uuid::now_v7(), None).unwrap();
        let (status, _) = call(state, Some(&token)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn expired_token_is_unauthorized() {
        let state = state();
        let token = state
            .tokens
            .issue_at(Uuid::now_v7(), None, Utc::now() - Duration::days(1))
            .unwrap();
        let (status, body) = call(state, Some(&format!("Bearer {token}"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "INVALID_TOKEN");
    }

    #[tokio::test]
    async fn valid_token_reaches_handler_with_identity() {
        let state = state();
        let user = Uuid::now_v7();
        let role = Uuid::now_v7();
        let token = state.tokens.issue(user, Some(role)).unwrap();

        let (status, body) = call(state, Some(&format!("Bearer {token}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["userId"], user.to_string());
        assert_eq!(body["roleId"], role.to_string());
    }
}
