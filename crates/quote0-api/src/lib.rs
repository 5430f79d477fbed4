// quote0-api: Async Rust client for the Quote/0 e-ink display cloud API (Dot. App)

pub mod client;
pub mod config;
pub mod error;
pub mod transport;
pub mod types;

pub use client::Quote0Client;
pub use config::ClientConfig;
pub use error::Error;
