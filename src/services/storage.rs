//! Object store client for category images.
//!
//! DESIGN
//! ======
//! Images live in a single public bucket. Object names are random base-36
//! strings plus the uploaded file's extension; the public URL's last path
//! segment is the object name, which is how an existing image is located for
//! replacement or removal.

use std::time::Duration;

use rand::Rng;

use crate::config::ServiceConfig;

/// Largest accepted image upload, in bytes.
pub const MAX_IMAGE_BYTES: usize = 5_000_000;

const NAME_LEN: usize = 11;
const NAME_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage request failed: {0}")]
    Request(String),
    #[error("storage response error: status {status}")]
    Response { status: u16, body: String },
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    async fn upload(&self, name: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), StorageError>;

    /// Public URL under which `name` is served.
    fn public_url(&self, name: &str) -> String;

    async fn remove(&self, names: &[String]) -> Result<(), StorageError>;
}

// =============================================================================
// CLIENT
// =============================================================================

pub struct HostedStorage {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    role_key: String,
    bucket: String,
}

impl HostedStorage {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &ServiceConfig) -> Result<Self, StorageError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| StorageError::HttpClientBuild(e.to_string()))?;
        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            role_key: config.role_key.clone(),
            bucket: config.bucket.clone(),
        })
    }
}

async fn check_status(response: reqwest::Response) -> Result<(), StorageError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response.text().await.unwrap_or_default();
    Err(StorageError::Response { status: status.as_u16(), body })
}

#[async_trait::async_trait]
impl ObjectStore for HostedStorage {
    async fn upload(&self, name: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), StorageError> {
        let response = self
            .http
            .post(format!("{}/storage/v1/object/{}/{name}", self.base_url, self.bucket))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.role_key)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await
            .map_err(|e| StorageError::Request(e.to_string()))?;
        check_status(response).await
    }

    fn public_url(&self, name: &str) -> String {
        public_object_url(&self.base_url, &self.bucket, name)
    }

    async fn remove(&self, names: &[String]) -> Result<(), StorageError> {
        if names.is_empty() {
            return Ok(());
        }
        let response = self
            .http
            .delete(format!("{}/storage/v1/object/{}", self.base_url, self.bucket))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.role_key)
            .json(&serde_json::json!({ "prefixes": names }))
            .send()
            .await
            .map_err(|e| StorageError::Request(e.to_string()))?;
        check_status(response).await
    }
}

// =============================================================================
// NAMING
// =============================================================================

#[must_use]
pub fn public_object_url(base_url: &str, bucket: &str, name: &str) -> String {
    format!("{base_url}/storage/v1/object/public/{bucket}/{name}")
}

/// Random object name keeping the extension of `file_name`, if it has one.
#[must_use]
pub fn generate_object_name(file_name: &str) -> String {
    let mut rng = rand::rng();
    let stem: String = (0..NAME_LEN)
        .map(|_| NAME_ALPHABET[rng.random_range(0..NAME_ALPHABET.len())] as char)
        .collect();

    match file_extension(file_name) {
        Some(ext) => format!("{stem}.{ext}"),
        None => stem,
    }
}

fn file_extension(file_name: &str) -> Option<String> {
    let (_, ext) = file_name.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext)
}

/// Object name stored behind a public image URL.
#[must_use]
pub fn object_name_from_url(url: &str) -> Option<&str> {
    url.rsplit('/').next().filter(|name| !name.is_empty())
}

// =============================================================================
// VALIDATION
// =============================================================================

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ImageError {
    #[error("image is required")]
    Missing,
    #[error("image must be less than 5MB")]
    TooLarge,
    #[error("file must be an image")]
    NotAnImage,
}

/// Accept only `image/*` uploads up to [`MAX_IMAGE_BYTES`].
///
/// # Errors
///
/// Returns the first rule the upload breaks.
pub fn validate_image(content_type: Option<&str>, len: usize) -> Result<(), ImageError> {
    if len == 0 {
        return Err(ImageError::Missing);
    }
    if len > MAX_IMAGE_BYTES {
        return Err(ImageError::TooLarge);
    }
    if !content_type.is_some_and(|ct| ct.starts_with("image/")) {
        return Err(ImageError::NotAnImage);
    }
    Ok(())
}

#[cfg(test)]
#[path = "storage_test.rs"]
mod tests;
