pub mod config;
pub mod env;
pub mod error;
pub mod intake;
pub mod types;
