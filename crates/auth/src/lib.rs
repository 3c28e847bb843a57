//! `concours-auth` — pure authentication/authorization boundary (zero-trust).
//!
//! This crate is intentionally decoupled from HTTP and storage: the resolver
//! talks to storage only through the [`directory::PrincipalDirectory`] port,
//! and nothing here knows about routes or status codes.

pub mod aggregate;
pub mod authorize;
pub mod claims;
pub mod directory;
pub mod permission;
pub mod principal;
pub mod resolver;
pub mod role;
pub mod token;

pub use aggregate::effective_permissions;
pub use authorize::{authorize, Decision};
pub use claims::{validate_claims, JwtClaims, TokenValidationError};
pub use directory::{PrincipalDirectory, StoreUnavailable};
pub use permission::PermissionName;
pub use principal::{Principal, RoleGrant};
pub use resolver::{IdentityResolver, ResolveError};
pub use role::RoleName;
pub use token::{Hs256JwtValidator, JwtValidator};
