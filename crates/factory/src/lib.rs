//! Client for the migration-tracking web service.
//!
//! Covers login/token authentication, wave/app/server queries, and the
//! tag-import batch operation. The service's REST API itself is an external
//! collaborator; nothing here redesigns it.

pub mod auth;
pub mod client;
pub mod tags;

pub use auth::FactoryAuth;
pub use client::FactoryClient;
