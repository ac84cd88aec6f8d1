//! Book API endpoints.

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use serde::Serialize;

use super::{success, ApiResult};
use crate::auth::require_admin;
use crate::dates::{custom_date_to_utc, third_tuesday};
use crate::errors::AppError;
use crate::models::{sort_books, Book, BookPayload, DeleteRequest};
use crate::AppState;

fn clean(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Build the finalized book from a form payload: normalize fields, resolve the
/// meeting date, and look up a cover. Cover resolution is skipped when the
/// content fields are unchanged from the stored record, preserving the
/// existing cover even if a fresh lookup would fail.
async fn book_from_payload(
    state: &AppState,
    payload: &BookPayload,
    id: String,
    existing: Option<&Book>,
) -> Result<Book, AppError> {
    let title = payload.title.trim().to_string();
    let author = clean(&payload.author);
    let payload_isbn = clean(&payload.isbn);

    let (cover_url, isbn) = match existing {
        Some(current)
            if !current.content_changed(&title, author.as_deref(), payload_isbn.as_deref()) =>
        {
            (current.cover_url.clone(), current.isbn.clone())
        }
        _ => {
            let hit = state
                .covers
                .find_cover(&title, author.as_deref(), payload_isbn.as_deref())
                .await;
            (hit.cover_url, payload_isbn.or(hit.isbn))
        }
    };

    let mut book = Book {
        id,
        title,
        author,
        proposer: payload.proposer.trim().to_string(),
        isbn,
        cover_url,
        meeting_date: None,
        month: None,
        year: None,
    };

    // A month/year pair is only meaningful together; one without the other
    // leaves the book undated.
    if let (Some(month), Some(year)) = (payload.month, payload.year) {
        book.meeting_date = Some(match payload.custom_date.as_deref() {
            Some(custom) => custom_date_to_utc(custom)?,
            None => third_tuesday(year, month)?,
        });
        book.month = Some(month);
        book.year = Some(year);
    }

    Ok(book)
}

/// GET /api/books - List all books with the collection's version token.
pub async fn list_books(State(state): State<AppState>) -> ApiResult<Vec<Book>> {
    let (books, sha) = state.store.fetch_books().await?;
    success(books, Some(sha))
}

/// POST /api/books - Add a book.
pub async fn create_book(
    State(state): State<AppState>,
    Json(payload): Json<BookPayload>,
) -> ApiResult<Book> {
    if payload.title.trim().is_empty() {
        return Err(AppError::Validation("Title is required".to_string()));
    }

    let (mut books, current_sha) = state.store.fetch_books().await?;
    if payload.sha != current_sha {
        return Err(AppError::stale_token(current_sha));
    }

    let id = uuid::Uuid::new_v4().simple().to_string();
    let book = book_from_payload(&state, &payload, id, None).await?;

    books.push(book.clone());
    sort_books(&mut books);

    let new_sha = state
        .store
        .commit_books(&books, &current_sha, &format!("Add \"{}\"", book.title))
        .await?;
    success(book, Some(new_sha))
}

/// PUT /api/books/:id - Update a book.
pub async fn update_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<BookPayload>,
) -> ApiResult<Book> {
    if payload.title.trim().is_empty() {
        return Err(AppError::Validation("Title is required".to_string()));
    }

    let (mut books, current_sha) = state.store.fetch_books().await?;
    if payload.sha != current_sha {
        return Err(AppError::stale_token(current_sha));
    }

    let index = books
        .iter()
        .position(|b| b.id == id)
        .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))?;

    let updated = book_from_payload(&state, &payload, id, Some(&books[index])).await?;
    books[index] = updated.clone();
    sort_books(&mut books);

    let new_sha = state
        .store
        .commit_books(&books, &current_sha, &format!("Update \"{}\"", updated.title))
        .await?;
    success(updated, Some(new_sha))
}

/// DELETE /api/books/:id - Remove a book.
pub async fn delete_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<DeleteRequest>,
) -> ApiResult<Book> {
    let (mut books, current_sha) = state.store.fetch_books().await?;
    if request.sha != current_sha {
        return Err(AppError::stale_token(current_sha));
    }

    let index = books
        .iter()
        .position(|b| b.id == id)
        .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))?;

    let removed = books.remove(index);
    let new_sha = state
        .store
        .commit_books(&books, &current_sha, &format!("Delete \"{}\"", removed.title))
        .await?;
    success(removed, Some(new_sha))
}

/// Result of a bulk cover refresh.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshSummary {
    pub covers_found: usize,
    pub isbns_filled: usize,
}

/// POST /api/books/refresh-covers - Resolve covers for every book missing
/// one, in bounded batches, and commit once. Admin only.
pub async fn refresh_covers(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<DeleteRequest>,
) -> ApiResult<RefreshSummary> {
    require_admin(&state.store, &headers).await?;

    let (mut books, current_sha) = state.store.fetch_books().await?;
    if request.sha != current_sha {
        return Err(AppError::stale_token(current_sha));
    }

    let (covers_found, isbns_filled) = state.covers.refresh_missing(&mut books).await;

    let summary = RefreshSummary {
        covers_found,
        isbns_filled,
    };
    if covers_found == 0 && isbns_filled == 0 {
        // Nothing changed; skip the commit and hand back the same token.
        return success(summary, Some(current_sha));
    }

    let new_sha = state
        .store
        .commit_books(
            &books,
            &current_sha,
            &format!("Refresh covers ({} found)", covers_found),
        )
        .await?;
    success(summary, Some(new_sha))
}
