//! Provider types and traits

use super::wms::GetMapRequest;
use std::fmt;
use std::future::Future;

/// Errors that can occur while talking to the map source.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// HTTP request failed
    HttpError(String),
    /// Invalid response data from the source
    InvalidResponse(String),
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::HttpError(msg) => write!(f, "HTTP error: {}", msg),
            ProviderError::InvalidResponse(msg) => write!(f, "Invalid response: {}", msg),
        }
    }
}

impl std::error::Error for ProviderError {}

/// Raw answer to a map request.
///
/// Status handling is left to the caller; a non-200 status is not an error
/// at this layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl MapResponse {
    /// Successful response carrying `body`.
    pub fn ok(body: Vec<u8>) -> Self {
        Self { status: 200, body }
    }

    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Issues map requests against a source.
///
/// Implemented over HTTP by [`ReqwestMapClient`](super::ReqwestMapClient);
/// tests substitute an in-memory double.
pub trait MapClient: Send + Sync {
    /// Performs one GetMap request.
    ///
    /// # Returns
    ///
    /// The status code and body, or an error if no response was received.
    fn get_map(
        &self,
        request: &GetMapRequest,
    ) -> impl Future<Output = Result<MapResponse, ProviderError>> + Send;
}
