use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};

use concours_auth::Principal;

use crate::app::{dto, errors};
use crate::app::services::AppServices;
use crate::registry::Operation;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
) -> axum::response::Response {
    // Whoami requires no permission, but it still goes through the guard so
    // the pipeline is uniform across handlers.
    if let Err(reason) = crate::guard::require(&services.registry, Operation::Whoami, &principal) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", reason);
    }

    Json(dto::principal_to_json(&principal)).into_response()
}
