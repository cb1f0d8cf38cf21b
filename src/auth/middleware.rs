use crate::auth::jwt::{Claims, TokenService};
use crate::types::AppError;
use crate::AppState;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::debug;

/// Rejects the request with 401 unless it carries a valid bearer token.
///
/// On success the verified [`Claims`] are stored in the request extensions
/// and the wrapped handler runs; on failure the handler is never invoked.
pub async fn auth_middleware(
    State(tokens): State<Arc<TokenService>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = tokens.validate(req.headers()).map_err(|e| {
        debug!(method = %req.method(), uri = %req.uri(), error = %e, "rejected request");
        e
    })?;

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

/// The authenticated user id for the current request.
///
/// Uses the claims left by [`auth_middleware`] when present and otherwise
/// validates the `Authorization` header itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub u64);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(claims) = parts.extensions.get::<Claims>() {
            return claims.subject().map(AuthUser);
        }

        state.tokens.extract_subject(&parts.headers).map(AuthUser)
    }
}
