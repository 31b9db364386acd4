use async_trait::async_trait;
use reqwest::{multipart, Client};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Allowed image extensions
pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Maximum file size (10 MB)
pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UploadedImage {
    pub url: String,
    pub original_filename: String,
}

/// Remote image storage for MICE card pictures.
#[async_trait]
pub trait MediaHost: Send + Sync {
    async fn upload_image(&self, filename: &str, data: Vec<u8>) -> Result<UploadedImage>;
}

/// Rejects files that are too large or not a supported image type.
/// Returns the lowercased extension.
pub fn validate_upload(filename: &str, size: usize) -> Result<String> {
    if size == 0 {
        return Err(AppError::field("file", "No file uploaded"));
    }

    if size > MAX_FILE_SIZE {
        return Err(AppError::field("file", "File too large (max 10 MB)"));
    }

    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .ok_or_else(|| AppError::field("file", "Invalid filename"))?;

    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(AppError::field(
            "file",
            format!("Invalid file type. Allowed: {}", ALLOWED_EXTENSIONS.join(", ")),
        ));
    }

    Ok(extension)
}

/// Unsigned uploads to a Cloudinary cloud.
pub struct CloudinaryClient {
    client: Client,
    cloud_name: String,
    upload_preset: String,
}

#[derive(Deserialize)]
struct CloudinaryUpload {
    secure_url: String,
}

impl CloudinaryClient {
    pub fn new(cloud_name: String, upload_preset: String) -> Self {
        Self {
            client: Client::new(),
            cloud_name,
            upload_preset,
        }
    }

    fn upload_url(&self) -> String {
        format!("https://api.cloudinary.com/v1_1/{}/image/upload", self.cloud_name)
    }
}

#[async_trait]
impl MediaHost for CloudinaryClient {
    async fn upload_image(&self, filename: &str, data: Vec<u8>) -> Result<UploadedImage> {
        let part = multipart::Part::bytes(data).file_name(filename.to_string());
        let form = multipart::Form::new()
            .text("upload_preset", self.upload_preset.clone())
            .part("file", part);

        let res = self
            .client
            .post(self.upload_url())
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::External(format!("Image upload failed: {}", e)))?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            tracing::error!("Cloudinary rejected upload ({}): {}", status, body);
            return Err(AppError::External(format!("Image upload failed with status {}", status)));
        }

        let uploaded: CloudinaryUpload = res
            .json()
            .await
            .map_err(|e| AppError::External(format!("Unexpected upload response: {}", e)))?;

        Ok(UploadedImage {
            url: uploaded.secure_url,
            original_filename: filename.to_string(),
        })
    }
}
