use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

use concours_auth::IdentityResolver;

use crate::app::errors;

#[derive(Clone)]
pub struct AuthState {
    pub resolver: Arc<IdentityResolver>,
}

/// Resolve the bearer credential into a [`concours_auth::Principal`] and stash
/// it in request extensions.
///
/// Every protected route goes through here, so by the time a handler runs the
/// principal is guaranteed fresh; nothing downstream re-reads the token.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, Response> {
    let token = extract_bearer(req.headers())?;

    let principal = state
        .resolver
        .resolve(token)
        .await
        .map_err(errors::resolve_error_to_response)?;

    req.extensions_mut().insert(principal);

    Ok(next.run(req).await)
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, Response> {
    let missing = || {
        errors::json_error(
            StatusCode::UNAUTHORIZED,
            "missing_credential",
            "expected 'Authorization: Bearer <token>'",
        )
    };

    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(missing)?;

    let header = header.to_str().map_err(|_| missing())?;

    let header = header.strip_prefix("Bearer ").ok_or_else(missing)?;

    let token = header.trim();
    if token.is_empty() {
        return Err(missing());
    }

    Ok(token)
}
