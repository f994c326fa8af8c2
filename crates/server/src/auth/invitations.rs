//! # Invitation Handlers
//!
//! ADMIN-only management of invitations into the caller's company.

use ::auth::{generate_refresh_token, Role};
use axum::Json;
use chrono::{Duration, Utc};
use entity::{
    invitations::{Column, Entity as InvitationsEntity},
    sea_orm_active_enums::InvitationStatus,
    users::{Column as UserColumn, Entity as UsersEntity},
};
use error::{AppError, Result};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set};
use tracing::info;
use validator::Validate;

use crate::{
    dto::{
        auth::{CreateInvitationRequest, InvitationListResponse, InvitationResponse},
        SuccessResponse,
    },
    middleware::auth::AuthenticatedUser,
    utils::normalize_email,
    AppState,
};

pub async fn create_invitation_handler(
    state: &AppState,
    user: AuthenticatedUser,
    req: CreateInvitationRequest,
) -> Result<Json<InvitationResponse>> {
    user.require_admin()?;
    req.validate()?;

    let email = normalize_email(&req.email);
    let role = match req.role.as_deref() {
        Some(role) => role.parse::<Role>()?,
        None => Role::User,
    };

    let existing_user = UsersEntity::find()
        .filter(UserColumn::CompanyId.eq(user.company_id))
        .filter(UserColumn::Email.eq(&email))
        .count(&state.db)
        .await?;
    if existing_user > 0 {
        return Err(AppError::conflict("A user with this email already exists"));
    }

    let pending = InvitationsEntity::find()
        .filter(Column::CompanyId.eq(user.company_id))
        .filter(Column::Email.eq(&email))
        .filter(Column::Status.eq(InvitationStatus::Pending))
        .count(&state.db)
        .await?;
    if pending > 0 {
        return Err(AppError::conflict("A pending invitation already exists for this email"));
    }

    let now = Utc::now();
    let invitation = entity::invitations::ActiveModel {
        company_id: Set(user.company_id),
        email: Set(email),
        role: Set(role.as_str().to_string()),
        token: Set(generate_refresh_token()),
        invited_by: Set(user.id),
        status: Set(InvitationStatus::Pending),
        expires_at: Set(now + Duration::hours(state.settings.invitation_expire_hours)),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    info!(
        invitation_id = invitation.id,
        company_id = user.company_id,
        invited_by = user.id,
        "Invitation created"
    );

    Ok(Json(invitation.into()))
}

pub async fn list_invitations_handler(
    state: &AppState,
    user: AuthenticatedUser,
) -> Result<Json<InvitationListResponse>> {
    user.require_admin()?;

    let invitations = InvitationsEntity::find()
        .filter(Column::CompanyId.eq(user.company_id))
        .order_by_desc(Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(InvitationListResponse {
        invitations: invitations.into_iter().map(Into::into).collect(),
    }))
}

/// Revokes a pending invitation. Accepted or already revoked ones give 400.
pub async fn revoke_invitation_handler(
    state: &AppState,
    user: AuthenticatedUser,
    invitation_id: i32,
) -> Result<Json<SuccessResponse>> {
    user.require_admin()?;

    let invitation = InvitationsEntity::find_by_id(invitation_id)
        .filter(Column::CompanyId.eq(user.company_id))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::not_found("Invitation not found"))?;

    if invitation.status != InvitationStatus::Pending {
        return Err(AppError::bad_request("Only pending invitations can be revoked"));
    }

    let mut active: entity::invitations::ActiveModel = invitation.into();
    active.status = Set(InvitationStatus::Revoked);
    active.update(&state.db).await?;

    info!(invitation_id, company_id = user.company_id, "Invitation revoked");
    Ok(Json(SuccessResponse::new("Invitation revoked")))
}
