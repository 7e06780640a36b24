use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::Form;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{ImageGenerator, MediaError};

const CLIPDROP_TEXT_TO_IMAGE_URL: &str = "https://clipdrop-api.co/text-to-image/v1";

#[derive(Debug, Deserialize)]
struct ClipdropError {
    error: String,
}

/// ClipDrop text-to-image. Returns the raw PNG body.
#[derive(Clone)]
pub struct ClipdropClient {
    client: Client,
    api_key: String,
}

impl ClipdropClient {
    pub fn new(api_key: String) -> Result<Self, MediaError> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()?,
            api_key,
        })
    }
}

#[async_trait]
impl ImageGenerator for ClipdropClient {
    async fn generate(&self, prompt: &str) -> Result<Bytes, MediaError> {
        let form = Form::new().text("prompt", prompt.to_string());

        let response = self
            .client
            .post(CLIPDROP_TEXT_TO_IMAGE_URL)
            .header("x-api-key", &self.api_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ClipdropError>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            return Err(MediaError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let image = response.bytes().await?;
        debug!("ClipDrop returned {} bytes", image.len());
        Ok(image)
    }
}
