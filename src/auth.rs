// Principal resolution. Authentication itself is an external collaborator;
// this module is the boundary: a bearer credential resolves to a
// `Principal { id, role }` or the request is rejected before any handler
// logic runs.

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::header::AUTHORIZATION, http::request::Parts};

use crate::app_state::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{Principal, User};
use crate::store::EntityStore;

#[async_trait]
pub trait PrincipalResolver: Send + Sync {
    async fn resolve(&self, bearer: &str) -> AppResult<Principal>;
}

/// Store-backed resolver: the bearer credential is the user's issued
/// access token.
pub struct TokenResolver {
    store: EntityStore,
}

impl TokenResolver {
    pub fn new(store: EntityStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl PrincipalResolver for TokenResolver {
    async fn resolve(&self, bearer: &str) -> AppResult<Principal> {
        let user: User = self
            .store
            .find_one_by_field("$.access_token", bearer)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Invalid access token".to_string()))?;

        Ok(Principal { id: user.id, role: user.role })
    }
}

impl FromRequestParts<AppState> for Principal {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".to_string()))?;

        let bearer = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Unauthorized("Expected a bearer token".to_string()))?;

        state.resolver.resolve(bearer).await
    }
}
