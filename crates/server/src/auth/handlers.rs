//! # Authentication Handlers
//!
//! Google OAuth login, token refresh, logout and development login.

use ::auth::{create_access_token, create_state_token, validate_state_token, GoogleUserInfo, Role};
use axum::Json;
use chrono::Utc;
use entity::{
    companies::Entity as CompaniesEntity,
    invitations::{Column as InvitationColumn, Entity as InvitationsEntity},
    sea_orm_active_enums::InvitationStatus,
    users::{Column as UserColumn, Entity as UsersEntity},
};
use error::{AppError, Result};
use logging::log_auth_event;
use sea_orm::{
    ActiveModelTrait,
    ColumnTrait,
    ConnectionTrait,
    EntityTrait,
    PaginatorTrait,
    QueryFilter,
    QueryOrder,
    Set,
    TransactionTrait,
};
use tracing::{info, warn};
use validator::Validate;

use super::sessions;
use crate::{
    dto::{
        auth::{
            AuthConfigResponse,
            CallbackQuery,
            DevLoginRequest,
            LoginQuery,
            LoginUrlResponse,
            LogoutRequest,
            MeResponse,
            RefreshRequest,
            TokenResponse,
        },
        SuccessResponse,
    },
    middleware::auth::AuthenticatedUser,
    utils::normalize_email,
    AppState,
};

const DEV_EMAIL: &str = "dev@workledger.local";
const DEV_COMPANY: &str = "Development Organization";

/// Unsaved user row with the common defaults.
pub(crate) fn new_user(
    company_id: i32,
    email: &str,
    first_name: &str,
    last_name: &str,
    role: Role,
) -> entity::users::ActiveModel {
    entity::users::ActiveModel {
        company_id: Set(company_id),
        email: Set(normalize_email(email)),
        first_name: Set(first_name.to_string()),
        last_name: Set(last_name.to_string()),
        role: Set(role.as_str().to_string()),
        team_id: Set(None),
        google_id: Set(None),
        is_active: Set(true),
        created_at: Set(Utc::now()),
        last_login_at: Set(None),
        ..Default::default()
    }
}

/// Mints an access token and a fresh refresh session for `user`.
async fn issue_tokens<C: ConnectionTrait>(
    db: &C,
    state: &AppState,
    user: entity::users::Model,
) -> Result<TokenResponse> {
    let company = CompaniesEntity::find_by_id(user.company_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::internal("User has no company"))?;

    let role = Role::from_string(&user.role).unwrap_or(Role::User);
    let access_token = create_access_token(&state.jwt_config, user.id, &user.email, user.company_id, role)?;
    let refresh_token = sessions::create_session(db, &user, state.settings.refresh_ttl_days).await?;

    Ok(TokenResponse {
        access_token,
        refresh_token,
        token_type: "bearer".to_string(),
        expires_in: state.jwt_config.access_ttl_seconds,
        user: user.into(),
        company: company.into(),
    })
}

/// Builds the Google authorization URL with a signed state.
pub async fn login_handler(state: &AppState, query: LoginQuery) -> Result<Json<LoginUrlResponse>> {
    let oauth = state
        .oauth
        .as_ref()
        .ok_or_else(|| AppError::bad_request("Google OAuth is not configured"))?;

    let platform = query.platform.unwrap_or_else(|| "web".to_string());
    let state_token = create_state_token(&state.jwt_config, &platform)?;
    let authorization_url = oauth.authorization_url(&state_token)?;

    Ok(Json(LoginUrlResponse {
        authorization_url,
        state: state_token,
    }))
}

/// Finds or provisions the user behind a Google identity.
///
/// Order: existing account (by Google id, then email), pending invitation,
/// bootstrap of the very first company. Anyone else needs an invitation.
async fn resolve_oauth_user<C: ConnectionTrait>(
    db: &C,
    info: &GoogleUserInfo,
) -> Result<entity::users::Model> {
    let email = normalize_email(&info.email);

    let existing = match UsersEntity::find()
        .filter(UserColumn::GoogleId.eq(&info.sub))
        .one(db)
        .await?
    {
        Some(user) => Some(user),
        None => {
            UsersEntity::find()
                .filter(UserColumn::Email.eq(&email))
                .order_by_asc(UserColumn::Id)
                .one(db)
                .await?
        },
    };

    if let Some(user) = existing {
        if !user.is_active {
            return Err(AppError::forbidden("Account is deactivated"));
        }
        let mut active: entity::users::ActiveModel = user.into();
        active.google_id = Set(Some(info.sub.clone()));
        active.last_login_at = Set(Some(Utc::now()));
        return Ok(active.update(db).await?);
    }

    let (first_name, last_name) = info.names();

    let invitation = InvitationsEntity::find()
        .filter(InvitationColumn::Email.eq(&email))
        .filter(InvitationColumn::Status.eq(InvitationStatus::Pending))
        .order_by_desc(InvitationColumn::CreatedAt)
        .one(db)
        .await?;

    if let Some(invitation) = invitation {
        if invitation.expires_at <= Utc::now() {
            return Err(AppError::forbidden("Invitation has expired"));
        }

        let role = Role::from_string(&invitation.role).unwrap_or(Role::User);
        let mut user = new_user(invitation.company_id, &email, &first_name, &last_name, role);
        user.google_id = Set(Some(info.sub.clone()));
        user.last_login_at = Set(Some(Utc::now()));
        let user = user.insert(db).await?;

        let company_id = invitation.company_id;
        let mut accepted: entity::invitations::ActiveModel = invitation.into();
        accepted.status = Set(InvitationStatus::Accepted);
        accepted.update(db).await?;

        info!(user_id = user.id, company_id, "User joined via invitation");
        return Ok(user);
    }

    if CompaniesEntity::find().count(db).await? > 0 {
        return Err(AppError::forbidden("Invitation required to join"));
    }

    let domain = info.domain();
    let company = entity::companies::ActiveModel {
        name: Set(format!("{} Organization", domain)),
        domain: Set(Some(domain)),
        is_active: Set(true),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    let mut user = new_user(company.id, &email, &first_name, &last_name, Role::Admin);
    user.google_id = Set(Some(info.sub.clone()));
    user.last_login_at = Set(Some(Utc::now()));
    let user = user.insert(db).await?;

    info!(user_id = user.id, company_id = company.id, "First company bootstrapped");
    Ok(user)
}

/// Completes the OAuth flow and issues tokens.
pub async fn callback_handler(state: &AppState, query: CallbackQuery) -> Result<Json<TokenResponse>> {
    query.validate()?;

    let oauth = state
        .oauth
        .as_ref()
        .ok_or_else(|| AppError::bad_request("Google OAuth is not configured"))?;

    validate_state_token(&state.jwt_config, &query.state)?;
    let tokens = oauth.exchange_code(&state.http, &query.code).await?;
    let info = oauth.fetch_userinfo(&state.http, &tokens.access_token).await?;

    let txn = state.db.begin().await?;
    let user = resolve_oauth_user(&txn, &info).await?;
    let response = issue_tokens(&txn, state, user).await?;
    txn.commit().await?;

    log_auth_event!("oauth_login", response.company.id, response.user.email);
    Ok(Json(response))
}

/// Exchanges a refresh token for a new token pair, revoking the old session.
pub async fn refresh_handler(state: &AppState, req: RefreshRequest) -> Result<Json<TokenResponse>> {
    req.validate()?;

    let txn = state.db.begin().await?;
    let session = sessions::find_active_session(&txn, &req.refresh_token).await?;

    let user = UsersEntity::find_by_id(session.user_id)
        .filter(UserColumn::CompanyId.eq(session.company_id))
        .one(&txn)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| AppError::unauthorized("User not found or inactive"))?;

    let refresh_token = sessions::rotate_session(&txn, session, &user, state.settings.refresh_ttl_days).await?;

    let company = CompaniesEntity::find_by_id(user.company_id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::internal("User has no company"))?;
    let role = Role::from_string(&user.role).unwrap_or(Role::User);
    let access_token = create_access_token(&state.jwt_config, user.id, &user.email, user.company_id, role)?;
    txn.commit().await?;

    Ok(Json(TokenResponse {
        access_token,
        refresh_token,
        token_type: "bearer".to_string(),
        expires_in: state.jwt_config.access_ttl_seconds,
        user: user.into(),
        company: company.into(),
    }))
}

/// Revokes one session, or every session of the caller.
pub async fn logout_handler(
    state: &AppState,
    user: AuthenticatedUser,
    req: LogoutRequest,
) -> Result<Json<SuccessResponse>> {
    match req.refresh_token {
        Some(token) => {
            if !sessions::revoke_session(&state.db, user.id, &token).await? {
                warn!(user_id = user.id, "Logout with unknown refresh token");
            }
        },
        None => {
            let revoked = sessions::revoke_all_user_sessions(&state.db, user.id).await?;
            info!(user_id = user.id, revoked, "All sessions revoked");
        },
    }

    Ok(Json(SuccessResponse::new("Successfully logged out")))
}

/// Logs in without OAuth. Only routed when dev mode is on.
pub async fn dev_login_handler(state: &AppState, req: DevLoginRequest) -> Result<Json<TokenResponse>> {
    if !state.settings.dev_mode {
        return Err(AppError::not_found("Not found"));
    }
    req.validate()?;

    let email = normalize_email(req.email.as_deref().unwrap_or(DEV_EMAIL));
    let txn = state.db.begin().await?;

    let user = match UsersEntity::find()
        .filter(UserColumn::Email.eq(&email))
        .order_by_asc(UserColumn::Id)
        .one(&txn)
        .await?
    {
        Some(user) => user,
        None => {
            let company = match CompaniesEntity::find()
                .filter(entity::companies::Column::Name.eq(DEV_COMPANY))
                .one(&txn)
                .await?
            {
                Some(company) => company,
                None => {
                    entity::companies::ActiveModel {
                        name: Set(DEV_COMPANY.to_string()),
                        domain: Set(None),
                        is_active: Set(true),
                        created_at: Set(Utc::now()),
                        ..Default::default()
                    }
                    .insert(&txn)
                    .await?
                },
            };
            new_user(company.id, &email, "Dev", "User", Role::Admin)
                .insert(&txn)
                .await?
        },
    };

    let response = issue_tokens(&txn, state, user).await?;
    txn.commit().await?;

    warn!(user_id = response.user.id, "Development login used");
    log_auth_event!("dev_login", response.company.id, response.user.email);
    Ok(Json(response))
}

/// Current user and company.
pub async fn me_handler(state: &AppState, user: AuthenticatedUser) -> Result<Json<MeResponse>> {
    let model = UsersEntity::find_by_id(user.id)
        .filter(UserColumn::CompanyId.eq(user.company_id))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;
    let company = CompaniesEntity::find_by_id(user.company_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::not_found("Company not found"))?;

    Ok(Json(MeResponse {
        user:    model.into(),
        company: company.into(),
    }))
}

pub async fn config_handler(state: &AppState) -> Result<Json<AuthConfigResponse>> {
    Ok(Json(AuthConfigResponse {
        oauth_enabled: state.oauth.is_some(),
        dev_mode:      state.settings.dev_mode,
    }))
}
