//! Infrastructure layer: the in-memory store and configuration.

pub mod config;
pub mod store;

pub use config::{ConfigError, MarketConfig};
pub use store::{InMemoryStore, InMemoryUnitOfWork, Tables};
