use anyhow::{Context, Result};
use reqwest::Client as HttpClient;
use serde_json::Value;
use tracing::debug;

use crate::config::Config;
use crate::error::ApiError;
use crate::models::{CreateShipmentRequest, Shipment};

/// Remote shipment collection. The components only ever talk to this trait.
#[async_trait::async_trait]
pub trait ShipmentApi: Send + Sync {
    async fn list_shipments(&self) -> Result<Vec<Shipment>, ApiError>;

    async fn create_shipment(&self, request: &CreateShipmentRequest) -> Result<Shipment, ApiError>;
}

pub struct HttpShipmentApi {
    shipments_url: String,
    http_client: HttpClient,
}

impl HttpShipmentApi {
    pub fn new(config: &Config) -> Result<Self> {
        let mut builder = HttpClient::builder();
        if let Some(timeout) = config.http_timeout {
            builder = builder.timeout(timeout);
        }

        let http_client = builder
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self::with_client(config.shipments_url(), http_client))
    }

    pub fn with_client(shipments_url: String, http_client: HttpClient) -> Self {
        Self {
            shipments_url,
            http_client,
        }
    }

    pub fn shipments_url(&self) -> &str {
        &self.shipments_url
    }
}

async fn read_json(response: reqwest::Response) -> Result<Value, ApiError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ApiError::Status {
            status: status.as_u16(),
            body,
        });
    }

    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[async_trait::async_trait]
impl ShipmentApi for HttpShipmentApi {
    async fn list_shipments(&self) -> Result<Vec<Shipment>, ApiError> {
        debug!(url = %self.shipments_url, "fetching shipments");

        let response = self
            .http_client
            .get(&self.shipments_url)
            .send()
            .await?;

        let body = read_json(response).await?;
        if !body.is_array() {
            return Err(ApiError::NotAList);
        }

        Ok(serde_json::from_value(body)?)
    }

    async fn create_shipment(&self, request: &CreateShipmentRequest) -> Result<Shipment, ApiError> {
        debug!(url = %self.shipments_url, recipient = %request.recipient, "creating shipment");

        let response = self
            .http_client
            .post(&self.shipments_url)
            .json(request)
            .send()
            .await?;

        let body = read_json(response).await?;
        Ok(serde_json::from_value(body)?)
    }
}
