use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde_json::json;

use concours_auth::{PermissionName, Principal, RoleName};
use concours_core::RoleId;

use crate::app::{dto, errors};
use crate::app::services::AppServices;
use crate::registry::Operation;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_role).get(list_roles))
        .route("/:id", get(get_role).delete(delete_role))
        .route("/:id/permissions", put(assign_permissions))
}

pub async fn create_role(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Json(body): Json<dto::CreateRoleRequest>,
) -> axum::response::Response {
    if let Err(reason) = crate::guard::require(&services.registry, Operation::CreateRole, &principal)
    {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", reason);
    }

    let name = match RoleName::parse(&body.name) {
        Ok(name) => name,
        Err(e) => return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string()),
    };

    match services.store.create_role(name, body.description).await {
        Ok(record) => {
            (StatusCode::CREATED, Json(dto::role_record_to_json(&record))).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn list_roles(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
) -> axum::response::Response {
    if let Err(reason) = crate::guard::require(&services.registry, Operation::ListRoles, &principal)
    {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", reason);
    }

    match services.store.list_roles().await {
        Ok(details) => {
            let items = details.iter().map(dto::role_detail_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(json!({ "items": items }))).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_role(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(reason) = crate::guard::require(&services.registry, Operation::GetRole, &principal) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", reason);
    }

    let role_id: RoleId = match id.parse() {
        Ok(v) => v,
        Err(e) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", format!("{e}"));
        }
    };

    match services.store.get_role(role_id).await {
        Ok(detail) => (StatusCode::OK, Json(dto::role_detail_to_json(&detail))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_role(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(reason) = crate::guard::require(&services.registry, Operation::DeleteRole, &principal)
    {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", reason);
    }

    let role_id: RoleId = match id.parse() {
        Ok(v) => v,
        Err(e) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", format!("{e}"));
        }
    };

    match services.store.delete_role(role_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// Full replace of a role's permission set.
pub async fn assign_permissions(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
    Json(body): Json<dto::AssignPermissionsRequest>,
) -> axum::response::Response {
    if let Err(reason) = crate::guard::require(
        &services.registry,
        Operation::AssignRolePermissions,
        &principal,
    ) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", reason);
    }

    let role_id: RoleId = match id.parse() {
        Ok(v) => v,
        Err(e) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", format!("{e}"));
        }
    };

    let mut permissions = Vec::with_capacity(body.permissions.len());
    for raw in &body.permissions {
        match PermissionName::parse(raw) {
            Ok(name) => permissions.push(name),
            Err(e) => {
                return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string());
            }
        }
    }

    if let Err(e) = services.store.assign_permissions(role_id, &permissions).await {
        return errors::store_error_to_response(e);
    }

    // Echo the refreshed role so admin screens can render the result directly.
    match services.store.get_role(role_id).await {
        Ok(detail) => (StatusCode::OK, Json(dto::role_detail_to_json(&detail))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
