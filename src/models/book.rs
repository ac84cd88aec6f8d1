//! Book model matching the JSON document committed to the data repository.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A book on the meeting list. The scheduling triple (`meeting_date`, `month`,
/// `year`) is present together or absent together; a book without it is
/// "undated" and sorts to the end of the list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default)]
    pub proposer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meeting_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
}

impl Book {
    /// Whether the fields that drive cover resolution differ from the payload.
    pub fn content_changed(&self, title: &str, author: Option<&str>, isbn: Option<&str>) -> bool {
        self.title != title || self.author.as_deref() != author || self.isbn.as_deref() != isbn
    }
}

/// Request body shared by the create and update endpoints.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookPayload {
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub proposer: String,
    #[serde(default)]
    pub isbn: String,
    #[serde(default)]
    pub month: Option<u32>,
    #[serde(default)]
    pub year: Option<i32>,
    /// Explicit meeting datetime override, "YYYY-MM-DDTHH:MM" local time
    #[serde(default)]
    pub custom_date: Option<String>,
    /// Version token the client read
    pub sha: String,
}

/// Sort books in place: dated ascending by meeting date, undated last.
/// The sort is stable; ties keep their existing order.
pub fn sort_books(books: &mut [Book]) {
    books.sort_by_key(|b| (b.meeting_date.is_none(), b.meeting_date));
}
