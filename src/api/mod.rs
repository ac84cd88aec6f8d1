//! REST API module.
//!
//! Contains all API routes and handlers. Read endpoints return the collection
//! plus its current version token; mutation endpoints take the token the
//! client read and return the finalized record plus the new token.

mod books;
mod calendar;
mod members;
mod messages;

pub use books::*;
pub use calendar::*;
pub use members::*;
pub use messages::*;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::errors::AppError;

/// Success response envelope. `sha` is the version token of the collection
/// the data came from (or was committed as), absent for endpoints that do
/// not expose one.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T, sha: Option<String>) -> Self {
        Self {
            success: true,
            data,
            sha,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Response type that can be either success or error.
pub type ApiResult<T> = Result<ApiResponse<T>, AppError>;

/// Create a successful API response.
pub fn success<T: Serialize>(data: T, sha: Option<String>) -> ApiResult<T> {
    Ok(ApiResponse::new(data, sha))
}
