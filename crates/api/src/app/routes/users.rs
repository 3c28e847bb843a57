use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::json;

use concours_auth::Principal;
use concours_core::{RoleId, UserId};

use crate::app::{dto, errors};
use crate::app::services::AppServices;
use crate::registry::Operation;

pub fn router() -> Router {
    Router::new()
        .route("/:id/roles", post(grant_role))
        .route("/:id/roles/:role_id", delete(revoke_role))
        .route("/:id/permissions", get(list_user_permissions))
}

pub async fn grant_role(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
    Json(body): Json<dto::GrantRoleRequest>,
) -> axum::response::Response {
    if let Err(reason) =
        crate::guard::require(&services.registry, Operation::GrantUserRole, &principal)
    {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", reason);
    }

    let user_id: UserId = match id.parse() {
        Ok(v) => v,
        Err(e) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", format!("{e}"));
        }
    };
    let role_id = RoleId::from_uuid(body.role_id);

    match services.store.grant_role(user_id, role_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn revoke_role(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Path((id, role_id)): Path<(String, String)>,
) -> axum::response::Response {
    if let Err(reason) =
        crate::guard::require(&services.registry, Operation::RevokeUserRole, &principal)
    {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", reason);
    }

    let user_id: UserId = match id.parse() {
        Ok(v) => v,
        Err(e) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", format!("{e}"));
        }
    };
    let role_id: RoleId = match role_id.parse() {
        Ok(v) => v,
        Err(e) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", format!("{e}"));
        }
    };

    match services.store.revoke_role(user_id, role_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// Flattened permission set for one user, as the gate would see it.
pub async fn list_user_permissions(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(reason) =
        crate::guard::require(&services.registry, Operation::ListUserPermissions, &principal)
    {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", reason);
    }

    let user_id: UserId = match id.parse() {
        Ok(v) => v,
        Err(e) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", format!("{e}"));
        }
    };

    match services.store.list_effective_permissions(user_id).await {
        Ok(set) => {
            let mut permissions: Vec<&str> = set.iter().map(|p| p.as_str()).collect();
            permissions.sort_unstable();
            (
                StatusCode::OK,
                Json(json!({
                    "user_id": user_id.to_string(),
                    "permissions": permissions,
                })),
            )
                .into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}
