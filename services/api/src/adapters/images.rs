//! services/api/src/adapters/images.rs
//!
//! The Cloudinary adapter implementing the `ImageHost` port over its signed
//! upload REST API.

use async_trait::async_trait;
use chrono::Utc;
use coursehub_core::domain::ImageRef;
use coursehub_core::ports::{ImageHost, PortError, PortResult, UploadOptions};
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::config::CloudinaryConfig;

#[derive(Clone)]
pub struct CloudinaryAdapter {
    client: reqwest::Client,
    config: CloudinaryConfig,
}

#[derive(Deserialize)]
struct UploadResponse {
    public_id: String,
    secure_url: String,
}

impl CloudinaryAdapter {
    pub fn new(client: reqwest::Client, config: CloudinaryConfig) -> Self {
        Self { client, config }
    }

    fn endpoint(&self, action: &str) -> String {
        format!(
            "https://api.cloudinary.com/v1_1/{}/image/{}",
            self.config.cloud_name, action
        )
    }

    /// Appends `api_key`, `signature` and `signature_algorithm` to `params`.
    fn signed(&self, mut params: Vec<(&'static str, String)>) -> Vec<(&'static str, String)> {
        let signature = sign(&params, &self.config.api_secret);
        params.push(("api_key", self.config.api_key.clone()));
        params.push(("signature", signature));
        params.push(("signature_algorithm", "sha256".to_string()));
        params
    }

    async fn post<T: for<'de> Deserialize<'de>>(
        &self,
        action: &str,
        params: Vec<(&'static str, String)>,
    ) -> PortResult<T> {
        let response = self
            .client
            .post(self.endpoint(action))
            .form(&params)
            .send()
            .await
            .map_err(|e| PortError::Unexpected(format!("image host: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PortError::Unexpected(format!(
                "image host returned {status}: {body}"
            )));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| PortError::Unexpected(format!("image host response: {e}")))
    }
}

/// Cloudinary signature: the parameters sorted by name, joined as `k=v&k=v`,
/// followed by the API secret, hashed.
pub fn sign(params: &[(&str, String)], secret: &str) -> String {
    let mut sorted: Vec<_> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));
    let to_sign = sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    hex::encode(Sha256::digest(format!("{to_sign}{secret}").as_bytes()))
}

#[async_trait]
impl ImageHost for CloudinaryAdapter {
    async fn upload_image(&self, image: &str, options: &UploadOptions) -> PortResult<ImageRef> {
        let mut params = vec![
            ("folder", options.folder.clone()),
            ("timestamp", Utc::now().timestamp().to_string()),
        ];
        if let Some(width) = options.width {
            params.push(("transformation", format!("w_{width}")));
        }
        let mut params = self.signed(params);
        // `file` is never part of the signature.
        params.push(("file", image.to_string()));

        let uploaded: UploadResponse = self.post("upload", params).await?;
        Ok(ImageRef {
            public_id: uploaded.public_id,
            url: uploaded.secure_url,
        })
    }

    async fn destroy_image(&self, public_id: &str) -> PortResult<()> {
        let params = self.signed(vec![
            ("public_id", public_id.to_string()),
            ("timestamp", Utc::now().timestamp().to_string()),
        ]);
        let _: serde_json::Value = self.post("destroy", params).await?;
        Ok(())
    }
}
