//! Access preflight: answer "may I run this operation?" without running it.
//!
//! Back-office screens use this to grey out buttons for modules served by
//! other processes (departments, payments, results). The check runs the very
//! same guard the real handlers use, so the preflight can never drift from
//! the enforced policy.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;

use concours_auth::{Decision, Principal};

use crate::app::{dto, errors};
use crate::app::services::AppServices;
use crate::registry::Operation;

pub fn router() -> Router {
    Router::new()
        .route("/operations", get(list_operations))
        .route("/operations/:operation/access", get(check_access))
}

pub async fn list_operations(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
) -> axum::response::Response {
    if let Err(reason) =
        crate::guard::require(&services.registry, Operation::ListOperations, &principal)
    {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", reason);
    }

    let items = services
        .registry
        .entries()
        .into_iter()
        .map(|(op, required)| dto::operation_to_json(op, required))
        .collect::<Vec<_>>();

    (StatusCode::OK, Json(json!({ "items": items }))).into_response()
}

pub async fn check_access(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Path(operation): Path<String>,
) -> axum::response::Response {
    let operation = match errors::parse_operation(&operation) {
        Ok(op) => op,
        Err(resp) => return resp,
    };

    match crate::guard::decide(&services.registry, operation, &principal) {
        Decision::Allow => (
            StatusCode::OK,
            Json(json!({
                "operation": operation.as_str(),
                "decision": "allow",
            })),
        )
            .into_response(),
        Decision::Deny { reason } => {
            errors::json_error(StatusCode::FORBIDDEN, "forbidden", reason)
        }
    }
}
