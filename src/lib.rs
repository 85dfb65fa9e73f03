//! Hylla server library
//!
//! Exposes the modules to the binaries and to the end-to-end tests.

pub mod audit;
pub mod branding;
pub mod catalog;
pub mod config;
pub mod metadata;
pub mod oidc;
pub mod schema;
pub mod server;
pub mod settings;
pub mod sqlite_persistence;
pub mod user;
pub mod wishlist;

pub use schema::{SchemaGuardian, SchemaReport};
pub use server::{make_app, run_server, RequestsLoggingLevel, ServerConfig, ServerState};
pub use user::{UserManager, UserRole};
