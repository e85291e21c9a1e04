//! Map source abstraction
//!
//! The finest pyramid level is fetched from a WMS server through the
//! [`MapClient`] trait. [`ReqwestMapClient`] is the HTTP implementation;
//! requests are built from the cache description by [`GetMapRequest`].

mod http;
mod types;
mod wms;

pub use http::{ReqwestMapClient, DEFAULT_TIMEOUT_SECS};
pub use types::{MapClient, MapResponse, ProviderError};
pub use wms::{BoundingBox, GetMapRequest};

#[cfg(test)]
pub use http::tests::MockMapClient;
