use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use concours_auth::ResolveError;
use concours_store::StoreError;

use crate::registry::Operation;

/// Map resolution failures onto the HTTP surface.
///
/// Every unresolved credential is a 401 with a distinct machine-readable
/// code; only a storage outage is a 503. Messages stay generic on purpose,
/// the precise cause lives in the logs.
pub fn resolve_error_to_response(err: ResolveError) -> axum::response::Response {
    match err {
        ResolveError::InvalidCredential(_) => json_error(
            StatusCode::UNAUTHORIZED,
            "invalid_credential",
            "credential is invalid or expired",
        ),
        ResolveError::MalformedCredential(_) => json_error(
            StatusCode::UNAUTHORIZED,
            "malformed_credential",
            "credential carries no usable subject",
        ),
        ResolveError::PrincipalNotFound => json_error(
            StatusCode::UNAUTHORIZED,
            "principal_not_found",
            "no account for this credential",
        ),
        ResolveError::PrincipalNotVerified => json_error(
            StatusCode::UNAUTHORIZED,
            "principal_not_verified",
            "account has not been verified",
        ),
        ResolveError::Store(e) => {
            json_error(StatusCode::SERVICE_UNAVAILABLE, "store_unavailable", e.to_string())
        }
    }
}

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    match err {
        StoreError::UnknownPermission(_) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "unknown_permission", err.to_string())
        }
        StoreError::UnknownRole(_) => {
            json_error(StatusCode::NOT_FOUND, "unknown_role", err.to_string())
        }
        StoreError::UnknownUser(_) => {
            json_error(StatusCode::NOT_FOUND, "unknown_user", err.to_string())
        }
        StoreError::RoleExists(_) => {
            json_error(StatusCode::CONFLICT, "role_exists", err.to_string())
        }
        StoreError::PermissionExists(_) => {
            json_error(StatusCode::CONFLICT, "permission_exists", err.to_string())
        }
        StoreError::Invalid(e) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string())
        }
        StoreError::Unavailable(msg) => {
            json_error(StatusCode::SERVICE_UNAVAILABLE, "store_unavailable", msg)
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn parse_operation(s: &str) -> Result<Operation, axum::response::Response> {
    Operation::from_str(s).ok_or_else(|| {
        json_error(
            StatusCode::NOT_FOUND,
            "unknown_operation",
            format!("no operation '{s}' is registered"),
        )
    })
}
