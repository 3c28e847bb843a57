//! `concours-store` — persistence for roles, permissions and grants.
//!
//! Two implementations of the same two ports:
//! - [`InMemoryAuthStore`] for tests and dev wiring;
//! - [`PostgresAuthStore`] for production.
//!
//! Both also implement [`concours_auth::PrincipalDirectory`], so the identity
//! resolver can read principals through whichever store the process wires in.

pub mod error;
pub mod in_memory;
pub mod postgres;
pub mod records;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use in_memory::InMemoryAuthStore;
pub use postgres::PostgresAuthStore;
pub use records::{PermissionRecord, RoleDetail, RoleRecord, UserAccount};
pub use store::RolePermissionStore;
