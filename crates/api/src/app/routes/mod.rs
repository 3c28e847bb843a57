use axum::{routing::get, Router};

pub mod access;
pub mod permissions;
pub mod roles;
pub mod system;
pub mod users;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .merge(access::router())
        .nest("/roles", roles::router())
        .nest("/permissions", permissions::router())
        .nest("/users", users::router())
}
