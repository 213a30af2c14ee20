use std::time::Duration;

use async_trait::async_trait;
use reqwest::header;
use serde_json::Value;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::config::ServiceConfig;
use crate::error::{ReceiptError, Result};

/// Port to the remote document-understanding service. The core pipeline
/// never touches this; callers fetch a prediction here and hand the JSON
/// to `ReceiptPipeline::process`.
#[async_trait]
pub trait PredictionApi: Send + Sync {
    /// Unique identifier for this prediction backend
    fn service_name(&self) -> &'static str;

    /// Submit receipt image bytes and return the raw structured prediction
    async fn submit(&self, image: &[u8]) -> Result<Value>;
}

/// HTTP client for the hosted receipt-parsing endpoint. Endpoint and API
/// key are passed in explicitly through configuration; nothing here reads
/// ambient global state.
pub struct ReceiptServiceClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl ReceiptServiceClient {
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key,
        })
    }
}

#[async_trait]
impl PredictionApi for ReceiptServiceClient {
    fn service_name(&self) -> &'static str {
        "receipt_ocr"
    }

    #[instrument(skip(self, image))]
    async fn submit(&self, image: &[u8]) -> Result<Value> {
        let request_id = Uuid::new_v4();
        debug!(%request_id, bytes = image.len(), "submitting receipt image");

        let response = self
            .client
            .post(&self.endpoint)
            .header(header::AUTHORIZATION, format!("Token {}", self.api_key))
            .header(header::CONTENT_TYPE, "application/octet-stream")
            .body(image.to_vec())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReceiptError::Api {
                message: format!("prediction service returned status {status}"),
            });
        }

        let payload: Value = response.json().await?;
        info!(%request_id, "prediction received");
        Ok(payload)
    }
}
