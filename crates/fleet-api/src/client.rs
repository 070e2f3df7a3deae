//! HTTP client for the fleet REST API.

use crate::error::{ApiError, ApiResult};
use fleet_core::{Statistics, Vehicle, VehicleId, VehicleStatus};
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tracing::{debug, warn};

/// Default timeout for API requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Read access to the fleet backend.
///
/// Abstracts the transport so stores can be exercised with
/// `MockFleetApi` and driven in any completion order.
pub trait FleetApi: Send + Sync {
    /// `GET /vehicles`
    fn list_vehicles(&self) -> BoxFuture<'_, ApiResult<Vec<Vehicle>>>;

    /// `GET /vehicles/{id}`
    fn get_vehicle(&self, id: VehicleId) -> BoxFuture<'_, ApiResult<Vehicle>>;

    /// `GET /vehicles/status/{status}`
    fn list_vehicles_by_status(
        &self,
        status: VehicleStatus,
    ) -> BoxFuture<'_, ApiResult<Vec<Vehicle>>>;

    /// `GET /statistics`
    fn get_statistics(&self) -> BoxFuture<'_, ApiResult<Statistics>>;
}

/// Response envelope used by every endpoint.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

/// reqwest-backed client for the fleet REST API.
pub struct VehicleApiClient {
    client: Client,
    /// API base, e.g. `https://fleet.example.com/api`.
    base_url: Url,
}

impl VehicleApiClient {
    /// Create a client with the default timeout.
    pub fn new(base_url: &str) -> ApiResult<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> ApiResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ApiError::HttpClient(format!("Invalid base URL {base_url:?}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::HttpClient(format!(
                "Base URL cannot carry a path: {base_url}"
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::HttpClient(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build `{base}/{segments...}`; segments are percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> ApiResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::HttpClient(format!("Invalid base URL: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// GET an endpoint and unwrap the `data` envelope.
    async fn get_data<T: DeserializeOwned>(&self, segments: &[&str]) -> ApiResult<T> {
        let url = self.endpoint(segments)?;
        debug!(%url, "GET");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| ApiError::Transport(format!("GET {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%url, status = status.as_u16(), "Request rejected");
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Transport(format!("Failed to read body from {url}: {e}")))?;

        let envelope: Envelope<T> = serde_json::from_str(&body)
            .map_err(|e| ApiError::Decode(format!("{url}: {e}")))?;

        debug!(%url, bytes = body.len(), "Response decoded");
        Ok(envelope.data)
    }
}

impl FleetApi for VehicleApiClient {
    fn list_vehicles(&self) -> BoxFuture<'_, ApiResult<Vec<Vehicle>>> {
        Box::pin(self.get_data(&["vehicles"]))
    }

    fn get_vehicle(&self, id: VehicleId) -> BoxFuture<'_, ApiResult<Vehicle>> {
        Box::pin(async move { self.get_data(&["vehicles", id.as_str()]).await })
    }

    fn list_vehicles_by_status(
        &self,
        status: VehicleStatus,
    ) -> BoxFuture<'_, ApiResult<Vec<Vehicle>>> {
        Box::pin(async move {
            self.get_data(&["vehicles", "status", status.as_str()])
                .await
        })
    }

    fn get_statistics(&self) -> BoxFuture<'_, ApiResult<Statistics>> {
        Box::pin(self.get_data(&["statistics"]))
    }
}

impl std::fmt::Debug for VehicleApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VehicleApiClient")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}
