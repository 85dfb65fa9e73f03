mod admin_routes;
mod auth_routes;
mod catalog_routes;
pub mod config;
mod http_layers;
mod metadata_routes;
mod responses;
pub mod server;
pub mod session;
mod settings_routes;
pub mod state;
mod wishlist_routes;

pub use config::ServerConfig;
pub use http_layers::*;
pub use responses::ErrorResponse;
pub use server::{make_app, run_server};
pub use session::{Session, SessionStore};
pub use state::ServerState;
