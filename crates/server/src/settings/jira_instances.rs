//! # JIRA Instance Handlers
//!
//! Registration of JIRA instances and their credentials. Tokens are write-only:
//! responses only say whether a Tempo token is configured.

use secrecy::SecretString;
use axum::Json;
use chrono::Utc;
use entity::{
    billing_clients::{Column as ClientColumn, Entity as ClientsEntity},
    complementary_group_members::{Column as MemberColumn, Entity as MembersEntity},
    jira_instances::{Column, Entity as JiraInstancesEntity},
    user_jira_accounts::{Column as AccountColumn, Entity as AccountsEntity},
    users::{Column as UserColumn, Entity as UsersEntity},
};
use error::{AppError, Result};
use integrations::{JiraClient, JiraCredentials};
use sea_orm::{
    ActiveModelTrait,
    ColumnTrait,
    EntityTrait,
    PaginatorTrait,
    QueryFilter,
    QueryOrder,
    Set,
    TransactionTrait,
};
use tracing::{info, warn};
use validator::Validate;

use super::users::upsert_jira_account;
use crate::{
    dto::{
        settings::{
            ConnectionTestResponse,
            CreateJiraInstanceRequest,
            FetchAccountsResponse,
            JiraInstanceListResponse,
            JiraInstanceResponse,
            UpdateJiraInstanceRequest,
        },
        SuccessResponse,
    },
    middleware::auth::AuthenticatedUser,
    AppState,
};

/// JIRA client for a stored instance, using the server's HTTP client and
/// retry policy.
pub(crate) fn jira_client(state: &AppState, instance: &entity::jira_instances::Model) -> Result<JiraClient> {
    let credentials = JiraCredentials {
        base_url:  instance.url.clone(),
        email:     instance.email.clone(),
        api_token: SecretString::from(instance.api_token.clone()),
    };
    Ok(JiraClient::new(state.http.clone(), &instance.name, &credentials)?.with_retry(state.retry.clone()))
}

fn check_url(url: &str) -> Result<String> {
    let trimmed = url.trim().trim_end_matches('/');
    if !(trimmed.starts_with("https://") || trimmed.starts_with("http://")) {
        return Err(AppError::validation("JIRA URL must start with http:// or https://"));
    }
    Ok(trimmed.to_string())
}

async fn ensure_client(state: &AppState, company_id: i32, client_id: i32) -> Result<()> {
    ClientsEntity::find_by_id(client_id)
        .filter(ClientColumn::CompanyId.eq(company_id))
        .one(&state.db)
        .await?
        .map(|_| ())
        .ok_or_else(|| AppError::not_found("Billing client not found"))
}

pub(crate) async fn find_instance(
    state: &AppState,
    company_id: i32,
    instance_id: i32,
) -> Result<entity::jira_instances::Model> {
    JiraInstancesEntity::find_by_id(instance_id)
        .filter(Column::CompanyId.eq(company_id))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::not_found("JIRA instance not found"))
}

pub async fn list_instances_handler(
    state: &AppState,
    user: AuthenticatedUser,
) -> Result<Json<JiraInstanceListResponse>> {
    let instances = JiraInstancesEntity::find()
        .filter(Column::CompanyId.eq(user.company_id))
        .order_by_asc(Column::Name)
        .all(&state.db)
        .await?;

    Ok(Json(JiraInstanceListResponse {
        instances: instances.into_iter().map(Into::into).collect(),
    }))
}

pub async fn create_instance_handler(
    state: &AppState,
    user: AuthenticatedUser,
    req: CreateJiraInstanceRequest,
) -> Result<Json<JiraInstanceResponse>> {
    user.require_admin()?;
    req.validate()?;

    let url = check_url(&req.url)?;
    let name = req.name.trim().to_string();

    let existing = JiraInstancesEntity::find()
        .filter(Column::CompanyId.eq(user.company_id))
        .filter(Column::Name.eq(&name))
        .count(&state.db)
        .await?;
    if existing > 0 {
        return Err(AppError::conflict("A JIRA instance with this name already exists"));
    }

    if let Some(client_id) = req.billing_client_id {
        ensure_client(state, user.company_id, client_id).await?;
    }

    let instance = entity::jira_instances::ActiveModel {
        company_id: Set(user.company_id),
        name: Set(name),
        url: Set(url),
        email: Set(req.email.trim().to_string()),
        api_token: Set(req.api_token),
        tempo_api_token: Set(req.tempo_api_token.filter(|t| !t.is_empty())),
        billing_client_id: Set(req.billing_client_id),
        is_active: Set(true),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    info!(
        instance_id = instance.id,
        company_id = user.company_id,
        instance = %instance.name,
        "JIRA instance created"
    );
    Ok(Json(instance.into()))
}

pub async fn update_instance_handler(
    state: &AppState,
    user: AuthenticatedUser,
    instance_id: i32,
    req: UpdateJiraInstanceRequest,
) -> Result<Json<JiraInstanceResponse>> {
    user.require_admin()?;
    if req.is_empty() {
        return Err(AppError::bad_request("No fields to update"));
    }
    req.validate()?;

    let instance = find_instance(state, user.company_id, instance_id).await?;
    if let Some(Some(client_id)) = req.billing_client_id {
        ensure_client(state, user.company_id, client_id).await?;
    }

    let mut active: entity::jira_instances::ActiveModel = instance.into();
    if let Some(url) = req.url {
        active.url = Set(check_url(&url)?);
    }
    if let Some(email) = req.email {
        active.email = Set(email.trim().to_string());
    }
    if let Some(api_token) = req.api_token {
        active.api_token = Set(api_token);
    }
    if let Some(tempo) = req.tempo_api_token {
        active.tempo_api_token = Set(tempo.filter(|t| !t.is_empty()));
    }
    if let Some(client_id) = req.billing_client_id {
        active.billing_client_id = Set(client_id);
    }
    if let Some(is_active) = req.is_active {
        active.is_active = Set(is_active);
    }
    let updated = active.update(&state.db).await?;

    info!(instance_id, company_id = user.company_id, "JIRA instance updated");
    Ok(Json(updated.into()))
}

/// Removes an instance, its group memberships and account mappings. Stored
/// worklogs stay until deleted explicitly.
pub async fn delete_instance_handler(
    state: &AppState,
    user: AuthenticatedUser,
    instance_id: i32,
) -> Result<Json<SuccessResponse>> {
    user.require_admin()?;
    let instance = find_instance(state, user.company_id, instance_id).await?;

    let txn = state.db.begin().await?;
    MembersEntity::delete_many()
        .filter(MemberColumn::InstanceId.eq(instance.id))
        .exec(&txn)
        .await?;
    AccountsEntity::delete_many()
        .filter(AccountColumn::CompanyId.eq(user.company_id))
        .filter(AccountColumn::JiraInstance.eq(&instance.name))
        .exec(&txn)
        .await?;
    entity::complementary_groups::Entity::update_many()
        .col_expr(
            entity::complementary_groups::Column::PrimaryInstanceId,
            sea_orm::prelude::Expr::value(Option::<i32>::None),
        )
        .filter(entity::complementary_groups::Column::PrimaryInstanceId.eq(instance.id))
        .exec(&txn)
        .await?;
    JiraInstancesEntity::delete_by_id(instance.id).exec(&txn).await?;
    txn.commit().await?;

    info!(instance_id, company_id = user.company_id, "JIRA instance deleted");
    Ok(Json(SuccessResponse::new("JIRA instance deleted")))
}

/// Calls `/myself` with the stored credentials.
pub async fn test_connection_handler(
    state: &AppState,
    user: AuthenticatedUser,
    instance_id: i32,
) -> Result<Json<ConnectionTestResponse>> {
    user.require_admin()?;
    let instance = find_instance(state, user.company_id, instance_id).await?;

    let myself = jira_client(state, &instance)?.get_myself().await?;
    info!(instance_id, company_id = user.company_id, "JIRA connection verified");

    Ok(Json(ConnectionTestResponse {
        success:      true,
        account_id:   myself.account_id,
        display_name: myself.display_name,
    }))
}

/// Looks up every active user on the instance by email and stores the account
/// ids that were found.
pub async fn fetch_accounts_handler(
    state: &AppState,
    user: AuthenticatedUser,
    instance_id: i32,
) -> Result<Json<FetchAccountsResponse>> {
    user.require_admin()?;
    let instance = find_instance(state, user.company_id, instance_id).await?;
    let client = jira_client(state, &instance)?;

    let users = UsersEntity::find()
        .filter(UserColumn::CompanyId.eq(user.company_id))
        .filter(UserColumn::IsActive.eq(true))
        .order_by_asc(UserColumn::Email)
        .all(&state.db)
        .await?;

    let mut matched = Vec::new();
    let mut not_found = Vec::new();
    for member in users {
        match client.search_user_by_email(&member.email).await? {
            Some(account_id) => {
                upsert_jira_account(&state.db, user.company_id, member.id, &instance.name, &account_id).await?;
                matched.push(member.email);
            },
            None => {
                warn!(instance = %instance.name, email = %member.email, "No JIRA account for user");
                not_found.push(member.email);
            },
        }
    }

    info!(
        instance_id,
        company_id = user.company_id,
        matched = matched.len(),
        not_found = not_found.len(),
        "JIRA accounts fetched"
    );
    Ok(Json(FetchAccountsResponse {
        matched,
        not_found,
    }))
}
