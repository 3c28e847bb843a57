//! Request/response DTOs and JSON mapping helpers.

use serde::Deserialize;
use serde_json::json;

use concours_auth::{PermissionName, Principal};
use concours_store::{PermissionRecord, RoleDetail, RoleRecord};

use crate::registry::Operation;

// ─────────────────────────────────────────────────────────────────────────────
// Requests
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateRoleRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePermissionRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Full-replace payload: the role ends up with exactly these permissions.
#[derive(Debug, Deserialize)]
pub struct AssignPermissionsRequest {
    pub permissions: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct GrantRoleRequest {
    pub role_id: uuid::Uuid,
}

// ─────────────────────────────────────────────────────────────────────────────
// Responses
// ─────────────────────────────────────────────────────────────────────────────

pub fn role_record_to_json(record: &RoleRecord) -> serde_json::Value {
    json!({
        "id": record.id.to_string(),
        "name": record.name.as_str(),
        "description": record.description,
        "created_at": record.created_at,
        "permissions": [],
    })
}

pub fn role_detail_to_json(detail: &RoleDetail) -> serde_json::Value {
    json!({
        "id": detail.id.to_string(),
        "name": detail.name.as_str(),
        "description": detail.description,
        "created_at": detail.created_at,
        "permissions": detail.permissions.iter().map(|p| p.as_str()).collect::<Vec<_>>(),
    })
}

pub fn permission_to_json(record: &PermissionRecord) -> serde_json::Value {
    json!({
        "id": record.id.to_string(),
        "name": record.name.as_str(),
        "description": record.description,
    })
}

pub fn principal_to_json(principal: &Principal) -> serde_json::Value {
    json!({
        "user_id": principal.user_id.to_string(),
        "account_type": principal.account_type.as_str(),
        "roles": principal
            .grants
            .iter()
            .map(|g| json!({
                "role": g.role.as_str(),
                "permissions": g.permissions.iter().map(|p| p.as_str()).collect::<Vec<_>>(),
            }))
            .collect::<Vec<_>>(),
    })
}

pub fn operation_to_json(operation: Operation, required: &[PermissionName]) -> serde_json::Value {
    json!({
        "operation": operation.as_str(),
        "required_permissions": required.iter().map(|p| p.as_str()).collect::<Vec<_>>(),
    })
}
