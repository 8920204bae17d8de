pub mod api;
pub mod config;

pub use api::{AppState, NetworkSize, Updater, router};
pub use config::{Cli, Config, ServerConfig};
