//! Cloudinary upload API and delivery URLs.
//!
//! Uploads are signed with SHA-1, Cloudinary's default. Accounts switched to
//! SHA-256 signatures set `SignatureAlgorithm::Sha256`.

use std::str::FromStr;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Url};
use serde::Deserialize;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use tracing::debug;

use super::{object_name, HostedImage, ImageEdit, ImageHost, MediaError};

const UPLOAD_API_BASE: &str = "https://api.cloudinary.com/v1_1";
const DELIVERY_BASE: &str = "https://res.cloudinary.com";

#[derive(Debug, Deserialize)]
struct UploadResponse {
    public_id: String,
    secure_url: String,
}

#[derive(Debug, Deserialize)]
struct CloudinaryError {
    error: CloudinaryErrorBody,
}

#[derive(Debug, Deserialize)]
struct CloudinaryErrorBody {
    message: String,
}

/// Digest used for upload signatures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    #[default]
    Sha1,
    Sha256,
}

impl SignatureAlgorithm {
    pub fn as_str(self) -> &'static str {
        match self {
            SignatureAlgorithm::Sha1 => "sha1",
            SignatureAlgorithm::Sha256 => "sha256",
        }
    }
}

impl FromStr for SignatureAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sha1" => Ok(SignatureAlgorithm::Sha1),
            "sha256" => Ok(SignatureAlgorithm::Sha256),
            other => Err(format!(
                "unsupported signature algorithm '{other}' (expected sha1 or sha256)"
            )),
        }
    }
}

#[derive(Clone)]
pub struct CloudinaryClient {
    client: Client,
    cloud_name: String,
    api_key: String,
    api_secret: String,
    algorithm: SignatureAlgorithm,
}

impl CloudinaryClient {
    pub fn new(
        cloud_name: String,
        api_key: String,
        api_secret: String,
        algorithm: SignatureAlgorithm,
    ) -> Result<Self, MediaError> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()?,
            cloud_name,
            api_key,
            api_secret,
            algorithm,
        })
    }
}

#[async_trait]
impl ImageHost for CloudinaryClient {
    async fn upload(
        &self,
        image: Bytes,
        file_name: &str,
        edit: Option<&ImageEdit>,
    ) -> Result<HostedImage, MediaError> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let mut signed = vec![("timestamp", timestamp)];
        if let Some(edit) = edit {
            signed.push(("transformation", transformation(edit)?));
        }
        let signature = sign(&signed, &self.api_secret, self.algorithm);

        let part = Part::bytes(image.to_vec()).file_name(file_name.to_string());
        let mut form = Form::new()
            .part("file", part)
            .text("api_key", self.api_key.clone())
            .text("signature", signature);
        if self.algorithm == SignatureAlgorithm::Sha256 {
            form = form.text("signature_algorithm", self.algorithm.as_str());
        }
        for (key, value) in signed {
            form = form.text(key, value);
        }

        let response = self
            .client
            .post(format!("{UPLOAD_API_BASE}/{}/image/upload", self.cloud_name))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<CloudinaryError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(MediaError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let uploaded: UploadResponse = response.json().await?;
        debug!("Uploaded image {} to Cloudinary", uploaded.public_id);

        Ok(HostedImage {
            public_id: uploaded.public_id,
            secure_url: uploaded.secure_url,
        })
    }

    fn edited_url(&self, public_id: &str, edit: &ImageEdit) -> Result<String, MediaError> {
        delivery_url(&self.cloud_name, public_id, &transformation(edit)?)
    }
}

/// Cloudinary transformation string for an edit.
fn transformation(edit: &ImageEdit) -> Result<String, MediaError> {
    match edit {
        ImageEdit::RemoveBackground => Ok("e_background_removal".to_string()),
        ImageEdit::RemoveObject(object) => {
            Ok(format!("e_gen_remove:prompt_{}", object_name(object)?))
        }
    }
}

fn delivery_url(cloud_name: &str, public_id: &str, transformation: &str) -> Result<String, MediaError> {
    let mut url = Url::parse(&format!("{DELIVERY_BASE}/{cloud_name}/image/upload"))
        .map_err(|e| MediaError::InvalidTransformation(format!("bad cloud name: {e}")))?;
    url.path_segments_mut()
        .map_err(|_| MediaError::InvalidTransformation("cannot build delivery URL".to_string()))?
        .push(transformation)
        .extend(public_id.split('/'));
    Ok(url.to_string())
}

/// Signs upload parameters: `k=v` pairs sorted by key, joined with `&`,
/// followed by the API secret, hashed and hex-encoded.
fn sign(params: &[(&str, String)], api_secret: &str, algorithm: SignatureAlgorithm) -> String {
    let mut sorted: Vec<_> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let to_sign = sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let payload = format!("{to_sign}{api_secret}");
    match algorithm {
        SignatureAlgorithm::Sha1 => format!("{:x}", Sha1::digest(payload.as_bytes())),
        SignatureAlgorithm::Sha256 => format!("{:x}", Sha256::digest(payload.as_bytes())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_background_removal_transformation() {
        assert_eq!(
            transformation(&ImageEdit::RemoveBackground).unwrap(),
            "e_background_removal"
        );
    }

    #[test]
    fn test_object_removal_is_parameterized_by_object() {
        assert_eq!(
            transformation(&ImageEdit::RemoveObject(" watch ".to_string())).unwrap(),
            "e_gen_remove:prompt_watch"
        );
    }

    #[test]
    fn test_object_removal_rejects_empty_and_reserved_names() {
        assert!(transformation(&ImageEdit::RemoveObject("  ".to_string())).is_err());
        assert!(transformation(&ImageEdit::RemoveObject("cat,dog".to_string())).is_err());
        assert!(transformation(&ImageEdit::RemoveObject("a/b".to_string())).is_err());
    }

    #[test]
    fn test_delivery_url_layout() {
        let url = delivery_url("demo", "sample_id", "e_gen_remove:prompt_watch").unwrap();
        assert_eq!(
            url,
            "https://res.cloudinary.com/demo/image/upload/e_gen_remove:prompt_watch/sample_id"
        );
    }

    #[test]
    fn test_delivery_url_encodes_spaces_and_keeps_folders() {
        let url = delivery_url("demo", "folder/pic", "e_gen_remove:prompt_coffee cup").unwrap();
        assert_eq!(
            url,
            "https://res.cloudinary.com/demo/image/upload/e_gen_remove:prompt_coffee%20cup/folder/pic"
        );
    }

    #[test]
    fn test_signature_is_order_independent() {
        let a = sign(
            &[("timestamp", "1700000000".to_string()), ("transformation", "e_background_removal".to_string())],
            "secret",
            SignatureAlgorithm::Sha1,
        );
        let b = sign(
            &[("transformation", "e_background_removal".to_string()), ("timestamp", "1700000000".to_string())],
            "secret",
            SignatureAlgorithm::Sha1,
        );
        assert_eq!(a, b);
        assert_eq!(a.len(), 40);
    }

    #[test]
    fn test_sha1_signature_matches_documented_example() {
        let params = [
            ("timestamp", "1315060510".to_string()),
            ("public_id", "sample_image".to_string()),
            ("eager", "w_400,h_300,c_pad|w_260,h_200,c_crop".to_string()),
        ];
        assert_eq!(
            sign(&params, "abcd", SignatureAlgorithm::Sha1),
            "bfd09f95f331f558cbd1320e67aa8d488770583e"
        );
    }

    #[test]
    fn test_sha256_signature_matches_manual_digest() {
        let expected = format!("{:x}", Sha256::digest(b"timestamp=1315060510abcd"));
        assert_eq!(
            sign(&[("timestamp", "1315060510".to_string())], "abcd", SignatureAlgorithm::Sha256),
            expected
        );
    }

    #[test]
    fn test_signature_algorithm_parses_case_insensitively() {
        assert_eq!("SHA256".parse::<SignatureAlgorithm>(), Ok(SignatureAlgorithm::Sha256));
        assert_eq!(" sha1 ".parse::<SignatureAlgorithm>(), Ok(SignatureAlgorithm::Sha1));
        assert!("md5".parse::<SignatureAlgorithm>().is_err());
        assert_eq!(SignatureAlgorithm::default(), SignatureAlgorithm::Sha1);
    }
}
