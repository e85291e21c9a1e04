//! wmscache - multi-resolution tile cache for WMS raster sources
//!
//! This library builds and maintains an on-disk pyramid of raster tiles
//! fetched from a WMS server. The finest level is retrieved tile by tile;
//! every coarser level is synthesized from it with a sentinel-aware box
//! filter. Tiles already on disk are never fetched or rebuilt.
//!
//! # High-Level API
//!
//! [`controller::CacheController`] ties the pieces together:
//!
//! ```ignore
//! use std::sync::Arc;
//! use wmscache::config::ConfigFile;
//! use wmscache::controller::CacheController;
//! use wmscache::provider::ReqwestMapClient;
//!
//! let config = ConfigFile::load()?;
//! let controller = CacheController::from_config(&config)?;
//! let client = ReqwestMapClient::new(&config.source_endpoint(), config.source.timeout)?;
//!
//! let handle = controller.start(Arc::new(client), config.pipeline_options());
//! let report = handle.wait().await?;
//! ```

pub mod cache;
pub mod codec;
pub mod config;
pub mod controller;
pub mod fetch;
pub mod grid;
pub mod layer;
pub mod logging;
pub mod mip;
pub mod provider;
pub mod raster;

/// Version of the wmscache library and CLI.
///
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
