//! Member API endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::models::{
    ensure_member_ids, sort_members, CreateMemberRequest, DeleteRequest, Member,
    UpdateMemberRequest,
};
use crate::AppState;

fn clean(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// GET /api/members - List all members with the collection's version token.
pub async fn list_members(State(state): State<AppState>) -> ApiResult<Vec<Member>> {
    let (members, sha) = state.store.fetch_members().await?;
    success(members, Some(sha))
}

/// POST /api/members - Add a member.
pub async fn create_member(
    State(state): State<AppState>,
    Json(request): Json<CreateMemberRequest>,
) -> ApiResult<Member> {
    if request.given_name.trim().is_empty() {
        return Err(AppError::Validation("Given name is required".to_string()));
    }

    let (mut members, current_sha) = state.store.fetch_members().await?;
    if request.sha != current_sha {
        return Err(AppError::stale_token(current_sha));
    }

    // Legacy records picked up along the way get ids in the same commit.
    ensure_member_ids(&mut members);

    let member = Member {
        id: uuid::Uuid::new_v4().to_string(),
        given_name: request.given_name.trim().to_string(),
        family_name: request.family_name.as_deref().and_then(clean),
        email: request.email.as_deref().and_then(clean),
        notifiable: request.notifiable,
        is_admin: request.is_admin,
    };

    members.push(member.clone());
    sort_members(&mut members);

    let new_sha = state
        .store
        .commit_members(
            &members,
            &current_sha,
            &format!("Add member \"{}\"", member.given_name),
        )
        .await?;
    success(member, Some(new_sha))
}

/// PUT /api/members/:id - Update a member.
pub async fn update_member(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateMemberRequest>,
) -> ApiResult<Member> {
    let (mut members, current_sha) = state.store.fetch_members().await?;
    if request.sha != current_sha {
        return Err(AppError::stale_token(current_sha));
    }

    ensure_member_ids(&mut members);

    let index = members
        .iter()
        .position(|m| m.id == id)
        .ok_or_else(|| AppError::NotFound(format!("Member {} not found", id)))?;

    if let Some(given_name) = &request.given_name {
        let trimmed = given_name.trim();
        if trimmed.is_empty() {
            return Err(AppError::Validation("Given name is required".to_string()));
        }
        members[index].given_name = trimmed.to_string();
    }
    if let Some(family_name) = &request.family_name {
        members[index].family_name = clean(family_name);
    }
    if let Some(email) = &request.email {
        members[index].email = clean(email);
    }
    if let Some(notifiable) = request.notifiable {
        members[index].notifiable = notifiable;
    }
    if let Some(is_admin) = request.is_admin {
        members[index].is_admin = is_admin;
    }

    let updated = members[index].clone();
    sort_members(&mut members);

    let new_sha = state
        .store
        .commit_members(
            &members,
            &current_sha,
            &format!("Update member \"{}\"", updated.given_name),
        )
        .await?;
    success(updated, Some(new_sha))
}

/// DELETE /api/members/:id - Remove a member.
pub async fn delete_member(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<DeleteRequest>,
) -> ApiResult<Member> {
    let (mut members, current_sha) = state.store.fetch_members().await?;
    if request.sha != current_sha {
        return Err(AppError::stale_token(current_sha));
    }

    let index = members
        .iter()
        .position(|m| m.id == id)
        .ok_or_else(|| AppError::NotFound(format!("Member {} not found", id)))?;

    let removed = members.remove(index);
    let new_sha = state
        .store
        .commit_members(
            &members,
            &current_sha,
            &format!("Delete member \"{}\"", removed.display_name()),
        )
        .await?;
    success(removed, Some(new_sha))
}
