//! Google Books catalog source.
//!
//! Secondary source. Only ever yields a cover, never an ISBN.

use async_trait::async_trait;
use serde::Deserialize;

use super::{CoverHit, CoverSource, CoverValidator};

const API_BASE: &str = "https://www.googleapis.com";

pub struct GoogleBooks {
    client: reqwest::Client,
    validator: CoverValidator,
    api_base: String,
}

#[derive(Deserialize)]
struct VolumesResponse {
    #[serde(default)]
    items: Vec<Volume>,
}

#[derive(Deserialize)]
struct Volume {
    #[serde(rename = "volumeInfo")]
    volume_info: Option<VolumeInfo>,
}

#[derive(Deserialize)]
struct VolumeInfo {
    #[serde(rename = "imageLinks")]
    image_links: Option<ImageLinks>,
}

#[derive(Deserialize)]
struct ImageLinks {
    thumbnail: Option<String>,
}

impl GoogleBooks {
    pub fn new(client: reqwest::Client, validator: CoverValidator) -> Self {
        Self {
            client,
            validator,
            api_base: API_BASE.to_string(),
        }
    }

    async fn first_thumbnail(&self, query: &str) -> Option<String> {
        let response = self
            .client
            .get(format!("{}/books/v1/volumes", self.api_base))
            .query(&[("q", query), ("maxResults", "1")])
            .send()
            .await
            .ok()?;
        if !response.status().is_success() {
            return None;
        }

        let data: VolumesResponse = response.json().await.ok()?;
        data.items
            .into_iter()
            .next()?
            .volume_info?
            .image_links?
            .thumbnail
    }
}

/// Google serves http thumbnail links at the smallest zoom; upgrade both.
fn upgrade_thumbnail(url: &str) -> String {
    url.replacen("http://", "https://", 1)
        .replacen("zoom=1", "zoom=2", 1)
}

#[async_trait]
impl CoverSource for GoogleBooks {
    fn name(&self) -> &'static str {
        "google-books"
    }

    async fn attempt(&self, title: &str, author: Option<&str>, _isbn: Option<&str>) -> CoverHit {
        let query = match author {
            Some(author) => format!("intitle:{}+inauthor:{}", title, author),
            None => title.to_string(),
        };

        let Some(thumbnail) = self.first_thumbnail(&query).await else {
            return CoverHit::default();
        };

        let cover_url = upgrade_thumbnail(&thumbnail);

        if self.validator.is_valid(&cover_url).await {
            CoverHit {
                cover_url: Some(cover_url),
                isbn: None,
            }
        } else {
            CoverHit::default()
        }
    }
}
