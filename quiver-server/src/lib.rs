pub mod config;
pub mod core;
pub mod lifecycle;
pub mod policy;
pub mod server;
pub mod upstream;

// Re-export commonly used types
pub use config::ServerConfig;
pub use core::{CacheStorage, CacheStore, CachedResponse, QuiverError, StoreStats};
pub use policy::Route;
pub use server::{AppState, create_router};
pub use upstream::UpstreamClient;
