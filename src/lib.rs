//! devforge: AI-assisted developer tools service (library crate).
//!
//! Re-exports public modules for the binary and integration tests.

pub mod config;
pub mod constants;
pub mod env;
pub mod layout;
pub mod models;
pub mod prompts;
pub mod providers;
pub mod recovery;
pub mod sandbox;
pub mod server;
pub mod services;
pub mod sources;
pub mod state;
