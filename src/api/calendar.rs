//! Calendar feed endpoint.

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use chrono::Utc;

use crate::calendar::build_calendar;
use crate::errors::AppError;
use crate::AppState;

/// GET /events.ics - iCalendar feed of upcoming meetings. Public, no auth.
pub async fn events_feed(State(state): State<AppState>) -> Result<Response, AppError> {
    let (books, _) = state.store.fetch_books().await?;
    let ics = build_calendar(&books, Utc::now());
    Ok((
        [(header::CONTENT_TYPE, "text/calendar; charset=utf-8")],
        ics,
    )
        .into_response())
}
