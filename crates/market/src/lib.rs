//! `contentmart-market`: the marketplace facade.
//!
//! Composes the store, file storage and membership into the operations a
//! front end calls: register, define facets, upload, search and narrow,
//! purchase, download. Every call runs in its own unit of work.

pub mod error;
pub mod limit;
pub mod marketplace;
pub mod request;

pub use error::{MarketError, MarketResult};
pub use marketplace::Marketplace;
pub use request::{Selection, UploadRequest, UploadedPackage};

use contentmart_infra::MarketConfig;

/// Install JSON logging with the configured default filter.
pub fn init_tracing(config: &MarketConfig) {
    contentmart_observability::init_with_filter(&config.log_filter);
}
