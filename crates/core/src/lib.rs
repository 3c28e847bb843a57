//! `concours-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod account;
pub mod error;
pub mod id;

pub use account::AccountType;
pub use error::{DomainError, DomainResult};
pub use id::{PermissionId, RoleId, UserId};
