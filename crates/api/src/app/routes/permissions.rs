use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde_json::json;

use concours_auth::{PermissionName, Principal};

use crate::app::{dto, errors};
use crate::app::services::AppServices;
use crate::registry::Operation;

pub fn router() -> Router {
    Router::new().route("/", post(create_permission).get(list_permissions))
}

pub async fn create_permission(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Json(body): Json<dto::CreatePermissionRequest>,
) -> axum::response::Response {
    if let Err(reason) =
        crate::guard::require(&services.registry, Operation::CreatePermission, &principal)
    {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", reason);
    }

    let name = match PermissionName::parse(&body.name) {
        Ok(name) => name,
        Err(e) => return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string()),
    };

    match services.store.create_permission(name, body.description).await {
        Ok(record) => {
            (StatusCode::CREATED, Json(dto::permission_to_json(&record))).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn list_permissions(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
) -> axum::response::Response {
    if let Err(reason) =
        crate::guard::require(&services.registry, Operation::ListPermissions, &principal)
    {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", reason);
    }

    match services.store.list_permissions().await {
        Ok(records) => {
            let items = records.iter().map(dto::permission_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(json!({ "items": items }))).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}
