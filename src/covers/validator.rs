//! Cover URL validation.
//!
//! Catalog placeholder images are served as tiny fixed-size stubs; anything
//! at or above the threshold is taken to be a real cover.

/// Minimum byte size for a real cover image.
pub const MIN_COVER_BYTES: usize = 1000;

/// Checks that a candidate cover URL serves a real image.
#[derive(Clone)]
pub struct CoverValidator {
    client: reqwest::Client,
}

impl CoverValidator {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// True if the URL serves at least [`MIN_COVER_BYTES`] bytes. Follows
    /// redirects. Non-2xx responses and network errors are "invalid", not
    /// retried.
    pub async fn is_valid(&self, url: &str) -> bool {
        match self.check(url).await {
            Ok(valid) => valid,
            Err(err) => {
                tracing::debug!("Cover validation failed for {}: {}", url, err);
                false
            }
        }
    }

    async fn check(&self, url: &str) -> Result<bool, reqwest::Error> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Ok(false);
        }

        // A large content-length header is enough; skip the download.
        if let Some(length) = response.content_length() {
            if length >= MIN_COVER_BYTES as u64 {
                return Ok(true);
            }
        }

        let body = response.bytes().await?;
        Ok(body.len() >= MIN_COVER_BYTES)
    }
}
