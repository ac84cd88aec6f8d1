//! BookHub NZ catalog source.
//!
//! Tertiary source, scraped from search-result HTML with a fixed pattern.
//! Brittle by nature: this is the first integration expected to break when
//! the third-party markup changes.

use async_trait::async_trait;
use regex::Regex;

use super::{CoverHit, CoverSource, CoverValidator};

const SEARCH_BASE: &str = "https://bookhub.co.nz";
const COVER_PATTERN: &str =
    r#"data-original="(https://storage\.googleapis\.com/circlesoft[^"]+)""#;

pub struct BookHub {
    client: reqwest::Client,
    validator: CoverValidator,
    search_base: String,
    cover_pattern: Regex,
}

impl BookHub {
    pub fn new(client: reqwest::Client, validator: CoverValidator) -> Self {
        Self {
            client,
            validator,
            search_base: SEARCH_BASE.to_string(),
            cover_pattern: Regex::new(COVER_PATTERN).expect("valid cover pattern"),
        }
    }

    fn extract_cover(&self, html: &str) -> Option<String> {
        self.cover_pattern
            .captures(html)
            .map(|caps| caps[1].to_string())
    }

    async fn search_page(&self, keyword: &str) -> Option<String> {
        let response = self
            .client
            .get(format!("{}/catalog/search", self.search_base))
            .query(&[
                ("utf8", "\u{2713}"),
                ("keyword", keyword),
                ("search_type", "core^keyword"),
            ])
            .send()
            .await
            .ok()?;
        if !response.status().is_success() {
            return None;
        }
        response.text().await.ok()
    }
}

#[async_trait]
impl CoverSource for BookHub {
    fn name(&self) -> &'static str {
        "bookhub"
    }

    async fn attempt(&self, title: &str, author: Option<&str>, _isbn: Option<&str>) -> CoverHit {
        // Title+author first, then title alone.
        let searches = match author {
            Some(author) => vec![format!("{} {}", title, author), title.to_string()],
            None => vec![title.to_string()],
        };

        for keyword in &searches {
            let Some(html) = self.search_page(keyword).await else {
                continue;
            };
            if let Some(cover_url) = self.extract_cover(&html) {
                if self.validator.is_valid(&cover_url).await {
                    return CoverHit {
                        cover_url: Some(cover_url),
                        isbn: None,
                    };
                }
            }
        }

        CoverHit::default()
    }
}
