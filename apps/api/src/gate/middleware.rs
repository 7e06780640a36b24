//! Authentication + entitlement middleware.
//!
//! Resolves the bearer token to a [`Caller`], reads the caller's
//! [`Entitlement`], and attaches both to request extensions for handlers.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::errors::AppError;
use crate::state::AppState;

pub async fn require_entitlement(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&request)
        .map(str::to_string)
        .ok_or(AppError::Unauthorized)?;

    let caller = state.identity.authenticate(&token).await.map_err(|e| {
        tracing::warn!("Rejected request: {e}");
        AppError::Unauthorized
    })?;

    let entitlement = state
        .identity
        .entitlement(&caller.user_id)
        .await
        .map_err(|e| AppError::Provider(format!("Failed to load account: {e}")))?;

    tracing::debug!(
        "Caller {} tier={:?} free_usage={}",
        caller.user_id,
        entitlement.tier,
        entitlement.free_usage
    );

    request.extensions_mut().insert(caller);
    request.extensions_mut().insert(entitlement);
    Ok(next.run(request).await)
}

fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}
