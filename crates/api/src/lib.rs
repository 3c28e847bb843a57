//! `concours-api` — HTTP surface for the authorization back office.

pub mod app;
pub mod guard;
pub mod middleware;
pub mod registry;
