//! Supabase Storage client for gallery images.

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use thiserror::Error;
use url::Url;

use super::SupabaseConfig;

/// Errors that can occur when talking to Supabase Storage.
#[derive(Debug, Error)]
pub enum StorageError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The object path or key could not be encoded.
    #[error("Invalid request: {0}")]
    Invalid(String),
}

/// Uploads and removes objects using the service role key.
#[derive(Clone)]
pub struct StorageClient {
    client: reqwest::Client,
    base_url: Url,
}

impl StorageClient {
    /// Create a new storage client.
    ///
    /// # Errors
    ///
    /// Returns error if the key is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &SupabaseConfig) -> Result<Self, StorageError> {
        let key = config.service_role_key.expose_secret();
        let mut headers = HeaderMap::new();

        headers.insert(
            "apikey",
            HeaderValue::from_str(key)
                .map_err(|e| StorageError::Invalid(format!("Invalid API key format: {e}")))?,
        );
        headers.insert(
            "Authorization",
            HeaderValue::from_str(&format!("Bearer {key}"))
                .map_err(|e| StorageError::Invalid(format!("Invalid API key format: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: config.url.clone(),
        })
    }

    /// Upload (or overwrite) an object and return its public URL.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or Storage rejects the upload.
    #[tracing::instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        let url = object_url(&self.base_url, &["object", bucket], path)?;

        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, content_type)
            .header("x-upsert", "true")
            .body(bytes)
            .send()
            .await?;
        check_status(response).await?;

        tracing::debug!(bucket, path, "Uploaded object");
        self.public_url(bucket, path)
    }

    /// Remove an object. Removing a missing object is not an error.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[tracing::instrument(skip(self))]
    pub async fn remove(&self, bucket: &str, path: &str) -> Result<(), StorageError> {
        let url = object_url(&self.base_url, &["object", bucket], "")?;

        let response = self
            .client
            .delete(url)
            .json(&serde_json::json!({ "prefixes": [path] }))
            .send()
            .await?;
        check_status(response).await
    }

    /// Public URL of an object in a public bucket.
    ///
    /// # Errors
    ///
    /// Returns error if the path cannot be encoded into a URL.
    pub fn public_url(&self, bucket: &str, path: &str) -> Result<String, StorageError> {
        object_url(&self.base_url, &["object", "public", bucket], path).map(String::from)
    }

    /// Recover the object path from a public URL produced by [`Self::public_url`].
    #[must_use]
    pub fn object_path(&self, bucket: &str, public_url: &str) -> Option<String> {
        let prefix = self.public_url(bucket, "").ok()?;
        let encoded = public_url.strip_prefix(prefix.trim_end_matches('/'))?;
        let path = encoded.trim_start_matches('/');
        if path.is_empty() {
            return None;
        }
        let segments = path
            .split('/')
            .map(|segment| urlencoding::decode(segment).map(std::borrow::Cow::into_owned))
            .collect::<Result<Vec<_>, _>>()
            .ok()?;
        Some(segments.join("/"))
    }
}

/// `{base}/storage/v1/{prefix...}/{path}` with every segment percent-encoded.
fn object_url(base: &Url, prefix: &[&str], path: &str) -> Result<Url, StorageError> {
    let mut url = base.clone();
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|()| StorageError::Invalid("base URL cannot have a path".to_owned()))?;
        segments.pop_if_empty().extend(["storage", "v1"]).extend(prefix);
        segments.extend(path.split('/').filter(|s| !s.is_empty()));
    }
    Ok(url)
}

async fn check_status(response: reqwest::Response) -> Result<(), StorageError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let message = response.text().await.unwrap_or_default();
    Err(StorageError::Api {
        status: status.as_u16(),
        message,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::supabase::tests::sample_config;

    #[test]
    fn test_public_url_encodes_segments() {
        let client = StorageClient::new(&sample_config()).unwrap();
        assert_eq!(
            client.public_url("gallery", "camp-2025/day one.jpg").unwrap(),
            "https://project.supabase.co/storage/v1/object/public/gallery/camp-2025/day%20one.jpg"
        );
    }

    #[test]
    fn test_object_path_roundtrip() {
        let client = StorageClient::new(&sample_config()).unwrap();
        let url = client.public_url("gallery", "camp-2025/day one.jpg").unwrap();
        assert_eq!(
            client.object_path("gallery", &url).as_deref(),
            Some("camp-2025/day one.jpg")
        );
        assert_eq!(client.object_path("gallery", "https://picsum.photos/1"), None);
    }
}
