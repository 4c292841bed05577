use crate::AppState;
use crate::api::error::AppError;
use crate::services::access::Identity;
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

fn bearer_token(req: &Request) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Resolves the caller for every request. A missing or invalid token yields an
/// anonymous identity rather than an error; routes that need a user add `require_auth`.
pub async fn identity_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let identity = match bearer_token(&req) {
        Some(token) => state.auth.resolve_identity(token).await?,
        None => Identity::anonymous(),
    };

    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}

/// Rejects anonymous callers with 401.
pub async fn require_auth(req: Request, next: Next) -> Result<Response, AppError> {
    let authenticated = req
        .extensions()
        .get::<Identity>()
        .is_some_and(Identity::is_authenticated);

    if !authenticated {
        return Err(AppError::Unauthorized("Authentication required".to_string()));
    }

    Ok(next.run(req).await)
}
