//! Messaging endpoints: broadcast mail to notifiable members.

use std::collections::HashSet;

use axum::{extract::State, http::HeaderMap, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::{success, ApiResult};
use crate::auth::require_member;
use crate::errors::AppError;
use crate::models::{Book, Member};
use crate::AppState;

/// Everything the compose form needs: who is sending, who can receive, and
/// the next upcoming meeting.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageData {
    pub sender: Member,
    pub recipients: Vec<Member>,
    pub next_book: Option<Book>,
}

/// GET /api/message-data - Compose-form data for the authenticated member.
pub async fn message_data(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<MessageData> {
    let sender = require_member(&state.store, &headers).await?;

    let (members, _) = state.store.fetch_members().await?;
    let (books, _) = state.store.fetch_books().await?;

    let recipients: Vec<Member> = members
        .into_iter()
        .filter(|m| m.notifiable && m.email.is_some())
        .collect();

    let now = Utc::now();
    let next_book = books
        .into_iter()
        .filter(|b| b.meeting_date.is_some_and(|d| d >= now))
        .min_by_key(|b| b.meeting_date);

    success(
        MessageData {
            sender,
            recipients,
            next_book,
        },
        None,
    )
}

/// Request body for sending a broadcast message.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub subject: String,
    pub body: String,
    pub recipient_emails: Vec<String>,
}

/// Outcome of a send: how many messages went out.
#[derive(Debug, Serialize)]
pub struct SendSummary {
    pub sent: usize,
}

/// POST /api/send-message - Send a message to notifiable members.
pub async fn send_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<SendMessageRequest>,
) -> ApiResult<SendSummary> {
    let sender = require_member(&state.store, &headers).await?;

    if request.subject.trim().is_empty() || request.body.trim().is_empty() {
        return Err(AppError::Validation(
            "Subject and body are required".to_string(),
        ));
    }
    if request.recipient_emails.is_empty() {
        return Err(AppError::Validation(
            "At least one recipient is required".to_string(),
        ));
    }

    // Every recipient must be a notifiable member.
    let (members, _) = state.store.fetch_members().await?;
    let notifiable: HashSet<String> = members
        .iter()
        .filter(|m| m.notifiable)
        .filter_map(|m| m.email.as_deref())
        .map(|e| e.to_lowercase())
        .collect();

    let invalid: Vec<&str> = request
        .recipient_emails
        .iter()
        .filter(|e| !notifiable.contains(&e.to_lowercase()))
        .map(String::as_str)
        .collect();
    if !invalid.is_empty() {
        return Err(AppError::Validation(format!(
            "Invalid recipients: {}",
            invalid.join(", ")
        )));
    }

    let sent = state
        .mailer
        .send(
            &sender,
            &request.recipient_emails,
            &request.subject,
            &request.body,
        )
        .await?;
    success(SendSummary { sent }, None)
}
