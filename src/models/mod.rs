//! Data models for the bookgroup backend.
//!
//! These models match the JSON documents committed to the data repository and
//! the frontend's camelCase field names.

mod book;
mod member;

pub use book::*;
pub use member::*;

use serde::Deserialize;

/// Request body for delete endpoints: just the version token the client read.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRequest {
    pub sha: String,
}
