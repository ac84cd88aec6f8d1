//! Open Library catalog source.
//!
//! The primary source, and the only one that can discover an ISBN.

use async_trait::async_trait;
use serde::Deserialize;

use super::{CoverHit, CoverSource, CoverValidator};

const SEARCH_BASE: &str = "https://openlibrary.org";
const COVERS_BASE: &str = "https://covers.openlibrary.org";

pub struct OpenLibrary {
    client: reqwest::Client,
    validator: CoverValidator,
    search_base: String,
    covers_base: String,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    docs: Vec<SearchDoc>,
}

#[derive(Deserialize)]
struct SearchDoc {
    cover_i: Option<u64>,
    isbn: Option<Vec<String>>,
}

impl OpenLibrary {
    pub fn new(client: reqwest::Client, validator: CoverValidator) -> Self {
        Self {
            client,
            validator,
            search_base: SEARCH_BASE.to_string(),
            covers_base: COVERS_BASE.to_string(),
        }
    }

    fn isbn_cover_url(&self, isbn: &str) -> String {
        format!("{}/b/isbn/{}-M.jpg", self.covers_base, isbn)
    }

    async fn search(&self, title: &str, author: Option<&str>) -> Option<SearchDoc> {
        let mut query = vec![
            ("title", title.to_string()),
            ("limit", "1".to_string()),
            ("fields", "cover_i,isbn".to_string()),
        ];
        if let Some(author) = author {
            query.push(("author", author.to_string()));
        }

        let response = self
            .client
            .get(format!("{}/search.json", self.search_base))
            .query(&query)
            .send()
            .await
            .ok()?;
        if !response.status().is_success() {
            return None;
        }

        let data: SearchResponse = response.json().await.ok()?;
        data.docs.into_iter().next()
    }
}

#[async_trait]
impl CoverSource for OpenLibrary {
    fn name(&self) -> &'static str {
        "open-library"
    }

    async fn attempt(&self, title: &str, author: Option<&str>, isbn: Option<&str>) -> CoverHit {
        // With a known ISBN, try the direct cover URL first.
        if let Some(known) = isbn.filter(|s| !s.is_empty()) {
            let cleaned: String = known
                .chars()
                .filter(|c| *c != '-' && !c.is_whitespace())
                .collect();
            let url = self.isbn_cover_url(&cleaned);
            if self.validator.is_valid(&url).await {
                return CoverHit {
                    cover_url: Some(url),
                    isbn: Some(known.to_string()),
                };
            }
        }

        let Some(doc) = self.search(title, author).await else {
            return CoverHit::default();
        };

        let mut hit = CoverHit::default();

        // ISBN preference: supplied, then a 13-digit result, then the first.
        let listed = doc.isbn.unwrap_or_default();
        hit.isbn = isbn
            .filter(|s| !s.is_empty())
            .map(String::from)
            .or_else(|| listed.iter().find(|i| i.len() == 13).cloned())
            .or_else(|| listed.first().cloned());

        if let Some(cover_id) = doc.cover_i {
            // Numeric cover ids are reliable; no size validation needed.
            hit.cover_url = Some(format!("{}/b/id/{}-M.jpg", self.covers_base, cover_id));
        } else if let Some(first) = listed.first() {
            let url = self.isbn_cover_url(first);
            if self.validator.is_valid(&url).await {
                hit.cover_url = Some(url);
            }
        }

        hit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn source_for(server: &MockServer) -> OpenLibrary {
        let client = reqwest::Client::new();
        OpenLibrary {
            client: client.clone(),
            validator: CoverValidator::new(client),
            search_base: server.uri(),
            covers_base: server.uri(),
        }
    }

    async fn mount_cover(server: &MockServer, path_str: &str, bytes: usize) {
        Mock::given(method("GET"))
            .and(path(path_str.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; bytes]))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_known_isbn_direct_cover() {
        let server = MockServer::start().await;
        // Hyphens stripped from the ISBN in the cover URL
        mount_cover(&server, "/b/isbn/9780000000000-M.jpg", 5000).await;

        let source = source_for(&server);
        let hit = source
            .attempt("The Bone People", None, Some("978-0-00-000000-0"))
            .await;
        assert_eq!(
            hit.cover_url.unwrap(),
            format!("{}/b/isbn/9780000000000-M.jpg", server.uri())
        );
        assert_eq!(hit.isbn.unwrap(), "978-0-00-000000-0");
    }

    #[tokio::test]
    async fn test_search_prefers_cover_id_and_isbn13() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search.json"))
            .and(query_param("title", "The Bone People"))
            .and(query_param("author", "Keri Hulme"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "docs": [{ "cover_i": 42, "isbn": ["0140089225", "9780140089226"] }],
            })))
            .mount(&server)
            .await;

        let source = source_for(&server);
        let hit = source
            .attempt("The Bone People", Some("Keri Hulme"), None)
            .await;
        assert_eq!(
            hit.cover_url.unwrap(),
            format!("{}/b/id/42-M.jpg", server.uri())
        );
        // 13-digit ISBN preferred over the first listed
        assert_eq!(hit.isbn.unwrap(), "9780140089226");
    }

    #[tokio::test]
    async fn test_search_falls_back_to_validated_isbn_cover() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "docs": [{ "isbn": ["0140089225"] }],
            })))
            .mount(&server)
            .await;
        mount_cover(&server, "/b/isbn/0140089225-M.jpg", 5000).await;

        let source = source_for(&server);
        let hit = source.attempt("The Bone People", None, None).await;
        assert_eq!(
            hit.cover_url.unwrap(),
            format!("{}/b/isbn/0140089225-M.jpg", server.uri())
        );
        assert_eq!(hit.isbn.unwrap(), "0140089225");
    }

    #[tokio::test]
    async fn test_search_failure_declines_silently() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search.json"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let source = source_for(&server);
        let hit = source.attempt("The Bone People", None, None).await;
        assert_eq!(hit, CoverHit::default());
    }

    #[tokio::test]
    async fn test_no_results_declines_silently() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "docs": [] })))
            .mount(&server)
            .await;

        let source = source_for(&server);
        let hit = source.attempt("Unfindable", None, None).await;
        assert_eq!(hit, CoverHit::default());
    }
}
