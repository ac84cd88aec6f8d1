//! GitHub-backed collection store.
//!
//! The "database" is a pair of JSON documents committed to a GitHub repository
//! via the Contents API. Every fetch returns the file SHA as an opaque version
//! token; every commit presents the SHA it read, and GitHub rejects the write
//! if another commit landed first. That check is the only concurrency control:
//! no merge, no retry.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::config::Config;
use crate::errors::AppError;
use crate::models::{Book, Member};

const GITHUB_API_VERSION: &str = "2022-11-28";

/// Store for JSON documents in a GitHub repository.
#[derive(Clone)]
pub struct GithubStore {
    client: reqwest::Client,
    api_base: String,
    repo: String,
    branch: String,
    token: String,
    books_path: String,
    members_path: String,
}

/// Shape of a Contents API GET response.
#[derive(Deserialize)]
struct ContentsResponse {
    content: String,
    sha: String,
}

/// Shape of a Contents API PUT response.
#[derive(Deserialize)]
struct CommitResponse {
    content: CommittedContent,
}

#[derive(Deserialize)]
struct CommittedContent {
    sha: String,
}

impl GithubStore {
    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        Self {
            client,
            api_base: config.github_api_base.clone(),
            repo: config.github_repo.clone(),
            branch: config.github_branch.clone(),
            token: config.github_token.clone(),
            books_path: config.books_path.clone(),
            members_path: config.members_path.clone(),
        }
    }

    fn contents_url(&self, path: &str) -> String {
        format!("{}/repos/{}/contents/{}", self.api_base, self.repo, path)
    }

    /// Fetch a JSON document. Returns the parsed data and the file SHA.
    pub async fn fetch<T: DeserializeOwned>(&self, path: &str) -> Result<(T, String), AppError> {
        let response = self
            .client
            .get(self.contents_url(path))
            .query(&[("ref", self.branch.as_str())])
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!(
                "GitHub API error {} fetching {}: {}",
                status, path, body
            )));
        }

        let contents: ContentsResponse = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Invalid GitHub response: {}", e)))?;

        // The Contents API wraps base64 at 60 columns; strip the newlines.
        let raw = contents.content.replace(['\n', '\r'], "");
        let decoded = STANDARD
            .decode(raw)
            .map_err(|e| AppError::Upstream(format!("Invalid base64 in {}: {}", path, e)))?;
        let data = serde_json::from_slice(&decoded)
            .map_err(|e| AppError::Upstream(format!("Invalid JSON in {}: {}", path, e)))?;

        Ok((data, contents.sha))
    }

    /// Commit a JSON document. The presented SHA must match the current file;
    /// otherwise the write fails with a Conflict. Returns the new file SHA.
    pub async fn commit<T: Serialize>(
        &self,
        path: &str,
        data: &T,
        sha: &str,
        message: &str,
    ) -> Result<String, AppError> {
        let mut content = serde_json::to_string_pretty(data)
            .map_err(|e| AppError::Internal(format!("Failed to serialize {}: {}", path, e)))?;
        content.push('\n');

        let body = serde_json::json!({
            "message": message,
            "content": STANDARD.encode(content),
            "sha": sha,
            "branch": self.branch,
        });

        let response = self
            .client
            .put(self.contents_url(path))
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::CONFLICT
            || status == reqwest::StatusCode::UNPROCESSABLE_ENTITY
        {
            // Another writer committed first
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("GitHub commit conflict on {}: {}", path, body);
            return Err(AppError::Conflict {
                message: "Data has changed. Please refresh and try again.".to_string(),
                current_sha: None,
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!(
                "GitHub commit failed {} on {}: {}",
                status, path, body
            )));
        }

        let committed: CommitResponse = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Invalid GitHub response: {}", e)))?;
        Ok(committed.content.sha)
    }

    // ==================== TYPED WRAPPERS ====================

    pub async fn fetch_books(&self) -> Result<(Vec<Book>, String), AppError> {
        self.fetch(&self.books_path).await
    }

    pub async fn commit_books(
        &self,
        books: &[Book],
        sha: &str,
        message: &str,
    ) -> Result<String, AppError> {
        self.commit(&self.books_path, &books, sha, message).await
    }

    pub async fn fetch_members(&self) -> Result<(Vec<Member>, String), AppError> {
        self.fetch(&self.members_path).await
    }

    pub async fn commit_members(
        &self,
        members: &[Member],
        sha: &str,
        message: &str,
    ) -> Result<String, AppError> {
        self.commit(&self.members_path, &members, sha, message)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(api_base: String) -> Config {
        Config {
            api_psk: None,
            github_token: "ghp_test".to_string(),
            github_repo: "owner/repo".to_string(),
            github_branch: "main".to_string(),
            github_api_base: api_base,
            books_path: "data/books.json".to_string(),
            members_path: "data/members.json".to_string(),
            email_from: "bookgroup@example.org".to_string(),
            resend_api_key: "re_test".to_string(),
            resend_api_base: "http://unused.invalid".to_string(),
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            log_level: "warn".to_string(),
        }
    }

    fn store_for(server: &MockServer) -> GithubStore {
        GithubStore::new(reqwest::Client::new(), &test_config(server.uri()))
    }

    /// Base64 the way GitHub serves it: wrapped with embedded newlines.
    fn github_base64(data: &str) -> String {
        let encoded = STANDARD.encode(data);
        encoded
            .as_bytes()
            .chunks(60)
            .map(|c| std::str::from_utf8(c).unwrap())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[tokio::test]
    async fn test_fetch_decodes_content_and_returns_sha() {
        let server = MockServer::start().await;

        let books = json!([{ "id": "abc", "title": "The Luminaries", "proposer": "Mike" }]);
        Mock::given(method("GET"))
            .and(path("/repos/owner/repo/contents/data/books.json"))
            .and(query_param("ref", "main"))
            .and(header("X-GitHub-Api-Version", GITHUB_API_VERSION))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": github_base64(&books.to_string()),
                "sha": "sha-one",
            })))
            .mount(&server)
            .await;

        let store = store_for(&server);
        let (fetched, sha) = store.fetch_books().await.unwrap();
        assert_eq!(sha, "sha-one");
        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].title, "The Luminaries");
        assert!(fetched[0].meeting_date.is_none());
    }

    #[tokio::test]
    async fn test_fetch_error_is_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/owner/repo/contents/data/books.json"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let store = store_for(&server);
        let err = store.fetch_books().await.unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)));
        assert!(err.message().contains("500"));
    }

    #[tokio::test]
    async fn test_commit_returns_new_sha() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/repos/owner/repo/contents/data/members.json"))
            .and(body_partial_json(json!({
                "message": "Add member \"Ada\"",
                "sha": "sha-one",
                "branch": "main",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": { "sha": "sha-two" },
                "commit": {},
            })))
            .mount(&server)
            .await;

        let store = store_for(&server);
        let members: Vec<Member> = vec![];
        let sha = store
            .commit_members(&members, "sha-one", "Add member \"Ada\"")
            .await
            .unwrap();
        assert_eq!(sha, "sha-two");
    }

    #[tokio::test]
    async fn test_commit_with_stale_sha_is_conflict() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/repos/owner/repo/contents/data/books.json"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "message": "data/books.json does not match sha-stale",
            })))
            .mount(&server)
            .await;

        let store = store_for(&server);
        let books: Vec<Book> = vec![];
        let err = store
            .commit_books(&books, "sha-stale", "Update \"x\"")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict { .. }));
    }
}
