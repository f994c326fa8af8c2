//! # User Handlers
//!
//! Company user management and JIRA account mappings.

use std::collections::HashMap;

use ::auth::Role;
use axum::Json;
use entity::{
    invoices::{Column as InvoiceColumn, Entity as InvoicesEntity},
    jira_instances::{Column as InstanceColumn, Entity as JiraInstancesEntity},
    teams::{Column as TeamColumn, Entity as TeamsEntity},
    user_jira_accounts::{Column as AccountColumn, Entity as AccountsEntity},
    users::{Column as UserColumn, Entity as UsersEntity},
};
use error::{AppError, Result};
use sea_orm::{
    sea_query::OnConflict,
    ActiveModelTrait,
    ColumnTrait,
    EntityTrait,
    PaginatorTrait,
    QueryFilter,
    QueryOrder,
    Set,
    TransactionTrait,
};
use tracing::info;
use validator::Validate;

use crate::{
    auth::handlers::new_user,
    dto::{
        settings::{
            CreateUserRequest,
            JiraAccountRequest,
            JiraAccountResponse,
            UpdateUserRequest,
            UserDetailResponse,
            UserListQuery,
            UserListResponse,
        },
        SuccessResponse,
    },
    middleware::auth::AuthenticatedUser,
    utils::normalize_email,
    AppState,
};

async fn find_user(state: &AppState, company_id: i32, user_id: i32) -> Result<entity::users::Model> {
    UsersEntity::find_by_id(user_id)
        .filter(UserColumn::CompanyId.eq(company_id))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))
}

async fn ensure_team(state: &AppState, company_id: i32, team_id: i32) -> Result<()> {
    TeamsEntity::find_by_id(team_id)
        .filter(TeamColumn::CompanyId.eq(company_id))
        .one(&state.db)
        .await?
        .map(|_| ())
        .ok_or_else(|| AppError::not_found("Team not found"))
}

async fn accounts_for(state: &AppState, company_id: i32, user_id: i32) -> Result<Vec<JiraAccountResponse>> {
    let accounts = AccountsEntity::find()
        .filter(AccountColumn::CompanyId.eq(company_id))
        .filter(AccountColumn::UserId.eq(user_id))
        .order_by_asc(AccountColumn::JiraInstance)
        .all(&state.db)
        .await?;

    Ok(accounts
        .into_iter()
        .map(|a| {
            JiraAccountResponse {
                jira_instance: a.jira_instance,
                account_id:    a.account_id,
            }
        })
        .collect())
}

async fn user_detail(state: &AppState, user: entity::users::Model) -> Result<UserDetailResponse> {
    let jira_accounts = accounts_for(state, user.company_id, user.id).await?;
    Ok(UserDetailResponse {
        user: user.into(),
        jira_accounts,
    })
}

pub async fn list_users_handler(
    state: &AppState,
    user: AuthenticatedUser,
    query: UserListQuery,
) -> Result<Json<UserListResponse>> {
    let mut select = UsersEntity::find().filter(UserColumn::CompanyId.eq(user.company_id));
    if let Some(team_id) = query.team_id {
        select = select.filter(UserColumn::TeamId.eq(team_id));
    }
    let users = select.order_by_asc(UserColumn::Email).all(&state.db).await?;

    let accounts = AccountsEntity::find()
        .filter(AccountColumn::CompanyId.eq(user.company_id))
        .order_by_asc(AccountColumn::JiraInstance)
        .all(&state.db)
        .await?;
    let mut by_user: HashMap<i32, Vec<JiraAccountResponse>> = HashMap::new();
    for account in accounts {
        by_user
            .entry(account.user_id)
            .or_default()
            .push(JiraAccountResponse {
                jira_instance: account.jira_instance,
                account_id:    account.account_id,
            });
    }

    Ok(Json(UserListResponse {
        users: users
            .into_iter()
            .map(|u| {
                let jira_accounts = by_user.remove(&u.id).unwrap_or_default();
                UserDetailResponse {
                    user: u.into(),
                    jira_accounts,
                }
            })
            .collect(),
    }))
}

pub async fn get_user_handler(
    state: &AppState,
    user: AuthenticatedUser,
    user_id: i32,
) -> Result<Json<UserDetailResponse>> {
    let model = find_user(state, user.company_id, user_id).await?;
    Ok(Json(user_detail(state, model).await?))
}

pub async fn create_user_handler(
    state: &AppState,
    user: AuthenticatedUser,
    req: CreateUserRequest,
) -> Result<Json<UserDetailResponse>> {
    user.require_admin()?;
    req.validate()?;

    let email = normalize_email(&req.email);
    let role = match req.role.as_deref() {
        Some(role) => role.parse::<Role>()?,
        None => Role::User,
    };

    let existing = UsersEntity::find()
        .filter(UserColumn::CompanyId.eq(user.company_id))
        .filter(UserColumn::Email.eq(&email))
        .count(&state.db)
        .await?;
    if existing > 0 {
        return Err(AppError::conflict("A user with this email already exists"));
    }

    if let Some(team_id) = req.team_id {
        ensure_team(state, user.company_id, team_id).await?;
    }

    let mut model = new_user(user.company_id, &email, req.first_name.trim(), req.last_name.trim(), role);
    model.team_id = Set(req.team_id);
    let created = model.insert(&state.db).await?;

    info!(user_id = created.id, company_id = user.company_id, role = %role, "User created");
    Ok(Json(user_detail(state, created).await?))
}

/// Partial update. Admins cannot demote or deactivate themselves.
pub async fn update_user_handler(
    state: &AppState,
    user: AuthenticatedUser,
    user_id: i32,
    req: UpdateUserRequest,
) -> Result<Json<UserDetailResponse>> {
    user.require_admin()?;
    if req.is_empty() {
        return Err(AppError::bad_request("No fields to update"));
    }
    req.validate()?;

    let target = find_user(state, user.company_id, user_id).await?;
    let role = req.role.as_deref().map(str::parse::<Role>).transpose()?;

    if target.id == user.id {
        if role.is_some_and(|r| r != Role::Admin) {
            return Err(AppError::bad_request("You cannot change your own role"));
        }
        if req.is_active == Some(false) {
            return Err(AppError::bad_request("You cannot deactivate your own account"));
        }
    }

    if let Some(Some(team_id)) = req.team_id {
        ensure_team(state, user.company_id, team_id).await?;
    }

    let mut active: entity::users::ActiveModel = target.into();
    if let Some(first_name) = req.first_name {
        active.first_name = Set(first_name.trim().to_string());
    }
    if let Some(last_name) = req.last_name {
        active.last_name = Set(last_name.trim().to_string());
    }
    if let Some(team_id) = req.team_id {
        active.team_id = Set(team_id);
    }
    if let Some(role) = role {
        active.role = Set(role.as_str().to_string());
    }
    if let Some(is_active) = req.is_active {
        active.is_active = Set(is_active);
    }
    let updated = active.update(&state.db).await?;

    info!(user_id, company_id = user.company_id, "User updated");
    Ok(Json(user_detail(state, updated).await?))
}

/// Deletes a user and their JIRA mappings. Users who created invoices are
/// kept; deactivate them instead.
pub async fn delete_user_handler(
    state: &AppState,
    user: AuthenticatedUser,
    user_id: i32,
) -> Result<Json<SuccessResponse>> {
    user.require_admin()?;
    if user_id == user.id {
        return Err(AppError::bad_request("You cannot delete your own account"));
    }

    let target = find_user(state, user.company_id, user_id).await?;

    let invoices = InvoicesEntity::find()
        .filter(InvoiceColumn::CompanyId.eq(user.company_id))
        .filter(InvoiceColumn::CreatedBy.eq(target.id))
        .count(&state.db)
        .await?;
    if invoices > 0 {
        return Err(AppError::conflict("User has created invoices; deactivate the account instead"));
    }

    let txn = state.db.begin().await?;
    AccountsEntity::delete_many()
        .filter(AccountColumn::UserId.eq(target.id))
        .exec(&txn)
        .await?;
    entity::sessions::Entity::delete_many()
        .filter(entity::sessions::Column::UserId.eq(target.id))
        .exec(&txn)
        .await?;
    entity::invitations::Entity::delete_many()
        .filter(entity::invitations::Column::InvitedBy.eq(target.id))
        .exec(&txn)
        .await?;
    UsersEntity::delete_by_id(target.id).exec(&txn).await?;
    txn.commit().await?;

    info!(user_id, company_id = user.company_id, "User deleted");
    Ok(Json(SuccessResponse::new("User deleted")))
}

/// Maps the user to an account id on one instance, replacing any previous
/// mapping for that instance.
pub async fn set_jira_account_handler(
    state: &AppState,
    user: AuthenticatedUser,
    user_id: i32,
    req: JiraAccountRequest,
) -> Result<Json<UserDetailResponse>> {
    user.require_admin()?;
    req.validate()?;

    let target = find_user(state, user.company_id, user_id).await?;

    let instance = JiraInstancesEntity::find()
        .filter(InstanceColumn::CompanyId.eq(user.company_id))
        .filter(InstanceColumn::Name.eq(&req.jira_instance))
        .count(&state.db)
        .await?;
    if instance == 0 {
        return Err(AppError::not_found(format!(
            "JIRA instance not found: {}",
            req.jira_instance
        )));
    }

    upsert_jira_account(
        &state.db,
        user.company_id,
        target.id,
        &req.jira_instance,
        req.account_id.trim(),
    )
    .await?;

    info!(
        user_id,
        company_id = user.company_id,
        jira_instance = %req.jira_instance,
        "JIRA account mapped"
    );
    Ok(Json(user_detail(state, target).await?))
}

/// Insert or replace the (user, instance) account mapping.
pub(crate) async fn upsert_jira_account<C: sea_orm::ConnectionTrait>(
    db: &C,
    company_id: i32,
    user_id: i32,
    jira_instance: &str,
    account_id: &str,
) -> Result<()> {
    let mapping = entity::user_jira_accounts::ActiveModel {
        company_id: Set(company_id),
        user_id: Set(user_id),
        jira_instance: Set(jira_instance.to_string()),
        account_id: Set(account_id.to_string()),
        ..Default::default()
    };

    AccountsEntity::insert(mapping)
        .on_conflict(
            OnConflict::columns([AccountColumn::UserId, AccountColumn::JiraInstance])
                .update_column(AccountColumn::AccountId)
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;
    Ok(())
}
