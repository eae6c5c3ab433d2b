//! API client for the dashboard backend's pull endpoints.

use crate::error::{MonitorError, Result};
use crate::model::{
    DatasetKind, ExposureResponse, ExposureTimeSeries, PortfolioSnapshot, RiskSnapshot, Snapshot,
};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Source of full dataset snapshots
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Fetch the current value of `kind`
    async fn fetch(&self, kind: DatasetKind) -> Result<Snapshot>;
}

/// API client for the dashboard backend
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
}

/// Health response
#[derive(Debug, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl ApiClient {
    /// Create a new API client; `base_url` is the API root, e.g. `http://host:3000/api`
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /portfolio`
    pub async fn get_portfolio(&self) -> Result<PortfolioSnapshot> {
        self.get_json("portfolio").await
    }

    /// `GET /risk`
    pub async fn get_risk(&self) -> Result<RiskSnapshot> {
        self.get_json("risk").await
    }

    /// `GET /exposure`
    pub async fn get_exposure(&self) -> Result<ExposureTimeSeries> {
        let response: ExposureResponse = self.get_json("exposure").await?;
        ExposureTimeSeries::try_from(response)
    }

    /// Health check
    pub async fn health(&self) -> Result<HealthResponse> {
        self.get_json("health").await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}/{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| MonitorError::network(format!("GET {}: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(MonitorError::network(format!(
                "GET {}: API error: {}",
                url,
                response.status()
            )));
        }

        let body = response.text().await?;
        decode(&url, &body)
    }
}

#[async_trait]
impl SnapshotSource for ApiClient {
    async fn fetch(&self, kind: DatasetKind) -> Result<Snapshot> {
        match kind {
            DatasetKind::Portfolio => self.get_portfolio().await.map(Snapshot::Portfolio),
            DatasetKind::Risk => self.get_risk().await.map(Snapshot::Risk),
            DatasetKind::Exposure => self.get_exposure().await.map(Snapshot::Exposure),
        }
    }
}

fn decode<T: DeserializeOwned>(url: &str, body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| MonitorError::decode(format!("GET {}: {}", url, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_client_creation() {
        let client = ApiClient::new("http://localhost:3000/api".to_string());
        assert_eq!(client.base_url(), "http://localhost:3000/api");
    }

    #[test]
    fn test_decode_portfolio() {
        let body = r#"{"total_pv":1000000,"trade_count":2,"trades":[
            {"id":"T001","instrument":"AAPL Call 200","notional":1000000,"pv":125000,"delta":0.65,"gamma":0.02,"vega":0.15},
            {"id":"T002","instrument":"USD/JPY Forward","notional":5000000,"pv":-45000,"delta":0.98,"gamma":0,"vega":0}
        ]}"#;
        let portfolio: PortfolioSnapshot = decode("/api/portfolio", body).unwrap();
        assert_eq!(portfolio.trade_count, 2);
        assert_eq!(portfolio.trades[1].id, "T002");
        assert_eq!(portfolio.trades[1].pv, -45_000.0);
    }

    #[test]
    fn test_decode_failure_names_endpoint() {
        let err = decode::<RiskSnapshot>("/api/risk", r#"{"cva":"n/a"}"#).unwrap_err();
        assert!(matches!(err, MonitorError::Decode(_)));
        assert!(err.to_string().contains("/api/risk"));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_network_failure() {
        let client = ApiClient::new("http://127.0.0.1:1/api".to_string());
        let err = client.fetch(DatasetKind::Risk).await.unwrap_err();
        assert!(matches!(err, MonitorError::Network(_)));
    }
}
