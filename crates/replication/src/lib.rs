//! Read-mostly client for the third-party replication service.
//!
//! The service performs block-level replication of source servers to cloud
//! targets. This crate logs in with an API token, keeps the session cookie
//! and XSRF header, and exposes the handful of queries the batch workflows
//! need (projects, machines, install tokens, replicas).

pub mod agents;
pub mod client;
pub mod session;

pub use client::{Machine, Project, ReplicationClient};
pub use session::ReplicationSession;
