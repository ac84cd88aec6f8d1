//! Configuration module for the bookgroup backend.
//!
//! All configuration is loaded once from environment variables into an explicit
//! struct passed to components at construction. Missing required settings fail
//! fast at startup instead of surfacing mid-request.

use std::env;
use std::net::SocketAddr;

use crate::errors::AppError;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Pre-shared key for admin API authentication (optional in dev)
    pub api_psk: Option<String>,
    /// GitHub token used for the Contents API
    pub github_token: String,
    /// Repository holding the data files, as "owner/repo"
    pub github_repo: String,
    /// Branch the data files are committed to
    pub github_branch: String,
    /// GitHub API base URL (overridden in tests)
    pub github_api_base: String,
    /// Path of the books document within the repository
    pub books_path: String,
    /// Path of the members document within the repository
    pub members_path: String,
    /// Sender address for outbound mail
    pub email_from: String,
    /// Resend API key
    pub resend_api_key: String,
    /// Resend API base URL (overridden in tests)
    pub resend_api_base: String,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

fn required(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Configuration(format!("{} not configured", name)))
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let api_psk = env::var("FIRESIDE_API_PSK").ok();

        let github_token = required("FIRESIDE_GITHUB_TOKEN")?;
        let github_repo = required("FIRESIDE_GITHUB_REPO")?;
        let github_branch =
            env::var("FIRESIDE_GITHUB_BRANCH").unwrap_or_else(|_| "main".to_string());
        let github_api_base = env::var("FIRESIDE_GITHUB_API_BASE")
            .unwrap_or_else(|_| "https://api.github.com".to_string());

        let books_path =
            env::var("FIRESIDE_BOOKS_PATH").unwrap_or_else(|_| "data/books.json".to_string());
        let members_path =
            env::var("FIRESIDE_MEMBERS_PATH").unwrap_or_else(|_| "data/members.json".to_string());

        let email_from = required("FIRESIDE_EMAIL_FROM")?;
        let resend_api_key = required("FIRESIDE_RESEND_API_KEY")?;
        let resend_api_base = env::var("FIRESIDE_RESEND_API_BASE")
            .unwrap_or_else(|_| "https://api.resend.com".to_string());

        let bind_addr = env::var("FIRESIDE_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .map_err(|_| AppError::Configuration("Invalid FIRESIDE_BIND_ADDR format".into()))?;

        let log_level = env::var("FIRESIDE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            api_psk,
            github_token,
            github_repo,
            github_branch,
            github_api_base,
            books_path,
            members_path,
            email_from,
            resend_api_key,
            resend_api_base,
            bind_addr,
            log_level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Env-var tests mutate process state, so everything runs in one test.
    #[test]
    fn test_from_env() {
        env::remove_var("FIRESIDE_GITHUB_TOKEN");
        env::remove_var("FIRESIDE_GITHUB_REPO");
        env::remove_var("FIRESIDE_EMAIL_FROM");
        env::remove_var("FIRESIDE_RESEND_API_KEY");
        env::remove_var("FIRESIDE_GITHUB_BRANCH");
        env::remove_var("FIRESIDE_BIND_ADDR");

        // Missing credentials fail fast
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
        assert!(err.message().contains("FIRESIDE_GITHUB_TOKEN"));

        env::set_var("FIRESIDE_GITHUB_TOKEN", "ghp_test");
        env::set_var("FIRESIDE_GITHUB_REPO", "owner/repo");
        env::set_var("FIRESIDE_EMAIL_FROM", "bookgroup@example.org");
        env::set_var("FIRESIDE_RESEND_API_KEY", "re_test");

        let config = Config::from_env().unwrap();
        assert_eq!(config.github_branch, "main");
        assert_eq!(config.books_path, "data/books.json");
        assert_eq!(config.members_path, "data/members.json");
        assert_eq!(config.github_api_base, "https://api.github.com");
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert!(config.api_psk.is_none());
    }
}
