pub mod ai;
pub mod config;
pub mod constants;
pub mod models;
pub mod remote;
pub mod settings;
pub mod store;
pub mod tracing_setup;
pub mod tree;

pub use config::{CoreConfig, RemoteConfig};
pub use settings::Settings;
pub use store::{HybridStore, LocalStore};
