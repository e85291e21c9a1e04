//! HTTP map client

use super::types::{MapClient, MapResponse, ProviderError};
use super::wms::GetMapRequest;
use crate::cache::SourceEndpoint;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// User-Agent sent with every request.
const USER_AGENT: &str = concat!("wmscache/", env!("CARGO_PKG_VERSION"));

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// [`MapClient`] issuing WMS GetMap requests with reqwest.
#[derive(Clone)]
pub struct ReqwestMapClient {
    client: reqwest::Client,
    base_url: String,
}

impl ReqwestMapClient {
    /// Creates a client for `endpoint` with the given request timeout.
    pub fn new(endpoint: &SourceEndpoint, timeout_secs: u64) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(USER_AGENT)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_nodelay(true)
            .build()
            .map_err(|e| {
                ProviderError::HttpError(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: endpoint.base_url(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl MapClient for ReqwestMapClient {
    async fn get_map(&self, request: &GetMapRequest) -> Result<MapResponse, ProviderError> {
        trace!(
            url = %self.base_url,
            query = %request.query_string(),
            "GetMap request starting"
        );

        let response = match self
            .client
            .get(&self.base_url)
            .query(&request.query_pairs())
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                warn!(
                    url = %self.base_url,
                    error = %e,
                    is_connect = e.is_connect(),
                    is_timeout = e.is_timeout(),
                    "GetMap request failed"
                );
                return Err(ProviderError::HttpError(format!("Request failed: {}", e)));
            }
        };

        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(|e| {
            ProviderError::InvalidResponse(format!("Failed to read response body: {}", e))
        })?;

        debug!(status, bytes = body.len(), "GetMap response received");
        Ok(MapResponse {
            status,
            body: body.to_vec(),
        })
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    type Responder =
        dyn Fn(&GetMapRequest, usize) -> Result<MapResponse, ProviderError> + Send + Sync;

    /// In-memory map client.
    ///
    /// The responder receives each request and the zero-based call number.
    #[derive(Clone)]
    pub struct MockMapClient {
        responder: Arc<Responder>,
        calls: Arc<AtomicUsize>,
        requests: Arc<Mutex<Vec<GetMapRequest>>>,
    }

    impl MockMapClient {
        pub fn new(
            responder: impl Fn(&GetMapRequest, usize) -> Result<MapResponse, ProviderError>
                + Send
                + Sync
                + 'static,
        ) -> Self {
            Self {
                responder: Arc::new(responder),
                calls: Arc::new(AtomicUsize::new(0)),
                requests: Arc::new(Mutex::new(Vec::new())),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn requests(&self) -> Vec<GetMapRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl MapClient for MockMapClient {
        async fn get_map(&self, request: &GetMapRequest) -> Result<MapResponse, ProviderError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().unwrap().push(request.clone());
            (self.responder)(request, call)
        }
    }

    #[test]
    fn test_client_uses_endpoint_base_url() {
        let endpoint = SourceEndpoint::new("example.org", 9000, "Terrain");
        let client = ReqwestMapClient::new(&endpoint, 5).unwrap();
        assert_eq!(client.base_url(), "http://example.org:9000/");
    }

    #[test]
    fn test_response_status() {
        assert!(MapResponse::ok(vec![1]).is_ok());
        assert!(!MapResponse {
            status: 503,
            body: Vec::new()
        }
        .is_ok());
    }

    #[tokio::test]
    async fn test_mock_client_counts_calls() {
        let client = MockMapClient::new(|_, call| {
            if call == 0 {
                Err(ProviderError::HttpError("refused".to_string()))
            } else {
                Ok(MapResponse::ok(vec![0; 4]))
            }
        });
        let request = GetMapRequest {
            layer: "L".to_string(),
            width: 1,
            height: 2,
            format: crate::codec::ContentType::Raw(crate::raster::DataType::S16),
            bbox: crate::provider::BoundingBox {
                min_x: 0.0,
                min_y: 0.0,
                max_x: 1.0,
                max_y: 1.0,
            },
        };

        assert!(client.get_map(&request).await.is_err());
        assert_eq!(client.get_map(&request).await.unwrap().body.len(), 4);
        assert_eq!(client.calls(), 2);
        assert_eq!(client.requests()[1].layer, "L");
    }
}
