//! # Billing Catalog Handlers
//!
//! Clients, projects, JIRA project mappings, rate rules and worklog
//! classifications. Reads are open to every role; mutations need ADMIN.

use axum::Json;
use chrono::Utc;
use entity::{
    billing_clients::{Column as ClientColumn, Entity as ClientsEntity},
    billing_project_mappings::{Column as MappingColumn, Entity as MappingsEntity},
    billing_projects::{Column as ProjectColumn, Entity as ProjectsEntity},
    billing_rates::{Column as RateColumn, Entity as RatesEntity},
    billing_worklog_classifications::{Column as ClassificationColumn, Entity as ClassificationsEntity},
    invoices::{Column as InvoiceColumn, Entity as InvoicesEntity},
    jira_instances::{Column as InstanceColumn, Entity as InstancesEntity},
    worklogs::{Column as WorklogColumn, Entity as WorklogsEntity},
};
use error::{AppError, Result};
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
use tracing::info;
use validator::Validate;

use crate::{
    dto::{
        billing::{
            ClassificationListQuery,
            ClassificationListResponse,
            ClassificationResponse,
            BulkClassificationRequest,
            BulkClassificationResponse,
            ClientListResponse,
            ClientResponse,
            CreateClientRequest,
            CreateMappingRequest,
            CreateProjectRequest,
            CreateRateRequest,
            MappingListResponse,
            MappingResponse,
            ProjectListQuery,
            ProjectListResponse,
            ProjectResponse,
            RateListQuery,
            RateListResponse,
            RateResponse,
            UpdateClientRequest,
            UpdateProjectRequest,
            UpsertClassificationRequest,
            WorklogRef,
        },
        SuccessResponse,
    },
    middleware::auth::AuthenticatedUser,
    utils::normalize_email,
    AppState,
};

const DEFAULT_CURRENCY: &str = "EUR";

async fn find_client<C: ConnectionTrait>(
    db: &C,
    company_id: i32,
    client_id: i32,
) -> Result<entity::billing_clients::Model> {
    ClientsEntity::find_by_id(client_id)
        .filter(ClientColumn::CompanyId.eq(company_id))
        .one(db)
        .await?
        .ok_or_else(|| AppError::not_found("Billing client not found"))
}

async fn find_project<C: ConnectionTrait>(
    db: &C,
    company_id: i32,
    project_id: i32,
) -> Result<entity::billing_projects::Model> {
    ProjectsEntity::find_by_id(project_id)
        .filter(ProjectColumn::CompanyId.eq(company_id))
        .one(db)
        .await?
        .ok_or_else(|| AppError::not_found("Billing project not found"))
}

async fn ensure_unique_client_name(state: &AppState, company_id: i32, name: &str, except: Option<i32>) -> Result<()> {
    let mut query = ClientsEntity::find()
        .filter(ClientColumn::CompanyId.eq(company_id))
        .filter(ClientColumn::Name.eq(name));
    if let Some(id) = except {
        query = query.filter(ClientColumn::Id.ne(id));
    }

    if query.count(&state.db).await? > 0 {
        return Err(AppError::conflict("A client with this name already exists"));
    }
    Ok(())
}

/// Removes rates and mappings of the given projects, then the projects.
async fn delete_projects<C: ConnectionTrait>(db: &C, project_ids: Vec<i32>) -> Result<()> {
    RatesEntity::delete_many()
        .filter(RateColumn::ProjectId.is_in(project_ids.clone()))
        .exec(db)
        .await?;
    MappingsEntity::delete_many()
        .filter(MappingColumn::ProjectId.is_in(project_ids.clone()))
        .exec(db)
        .await?;
    ProjectsEntity::delete_many()
        .filter(ProjectColumn::Id.is_in(project_ids))
        .exec(db)
        .await?;
    Ok(())
}

// Clients

pub async fn list_clients_handler(state: &AppState, user: AuthenticatedUser) -> Result<Json<ClientListResponse>> {
    let clients = ClientsEntity::find()
        .filter(ClientColumn::CompanyId.eq(user.company_id))
        .order_by_asc(ClientColumn::Name)
        .all(&state.db)
        .await?;

    Ok(Json(ClientListResponse {
        clients: clients.into_iter().map(Into::into).collect(),
    }))
}

pub async fn create_client_handler(
    state: &AppState,
    user: AuthenticatedUser,
    req: CreateClientRequest,
) -> Result<Json<ClientResponse>> {
    user.require_admin()?;
    req.validate()?;

    let name = req.name.trim().to_string();
    ensure_unique_client_name(state, user.company_id, &name, None).await?;

    let client = entity::billing_clients::ActiveModel {
        company_id: Set(user.company_id),
        name: Set(name),
        billing_currency: Set(req
            .billing_currency
            .map(|c| c.to_ascii_uppercase())
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string())),
        default_hourly_rate: Set(req.default_hourly_rate),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    info!(client_id = client.id, company_id = user.company_id, "Billing client created");
    Ok(Json(client.into()))
}

pub async fn update_client_handler(
    state: &AppState,
    user: AuthenticatedUser,
    client_id: i32,
    req: UpdateClientRequest,
) -> Result<Json<ClientResponse>> {
    user.require_admin()?;
    if req.is_empty() {
        return Err(AppError::bad_request("No fields to update"));
    }
    req.validate()?;

    let client = find_client(&state.db, user.company_id, client_id).await?;
    let mut active: entity::billing_clients::ActiveModel = client.into();

    if let Some(name) = req.name {
        let name = name.trim().to_string();
        ensure_unique_client_name(state, user.company_id, &name, Some(client_id)).await?;
        active.name = Set(name);
    }
    if let Some(currency) = req.billing_currency {
        active.billing_currency = Set(currency.to_ascii_uppercase());
    }
    if let Some(rate) = req.default_hourly_rate {
        if rate.is_some_and(|r| r < 0.0) {
            return Err(AppError::validation("default_hourly_rate must not be negative"));
        }
        active.default_hourly_rate = Set(rate);
    }

    let client = active.update(&state.db).await?;
    info!(client_id, company_id = user.company_id, "Billing client updated");
    Ok(Json(client.into()))
}

pub async fn delete_client_handler(
    state: &AppState,
    user: AuthenticatedUser,
    client_id: i32,
) -> Result<Json<SuccessResponse>> {
    user.require_admin()?;
    let client = find_client(&state.db, user.company_id, client_id).await?;

    let invoices = InvoicesEntity::find()
        .filter(InvoiceColumn::ClientId.eq(client.id))
        .count(&state.db)
        .await?;
    if invoices > 0 {
        return Err(AppError::conflict("Client has invoices and cannot be deleted"));
    }

    let txn = state.db.begin().await?;
    let project_ids: Vec<i32> = ProjectsEntity::find()
        .filter(ProjectColumn::ClientId.eq(client.id))
        .all(&txn)
        .await?
        .into_iter()
        .map(|p| p.id)
        .collect();
    delete_projects(&txn, project_ids).await?;
    ClientsEntity::delete_by_id(client.id).exec(&txn).await?;
    txn.commit().await?;

    info!(client_id, company_id = user.company_id, "Billing client deleted");
    Ok(Json(SuccessResponse::new("Client deleted")))
}

// Projects

pub async fn list_projects_handler(
    state: &AppState,
    user: AuthenticatedUser,
    query: ProjectListQuery,
) -> Result<Json<ProjectListResponse>> {
    let mut select = ProjectsEntity::find().filter(ProjectColumn::CompanyId.eq(user.company_id));
    if let Some(client_id) = query.client_id {
        select = select.filter(ProjectColumn::ClientId.eq(client_id));
    }

    let projects = select
        .order_by_asc(ProjectColumn::Name)
        .all(&state.db)
        .await?;

    Ok(Json(ProjectListResponse {
        projects: projects.into_iter().map(Into::into).collect(),
    }))
}

pub async fn create_project_handler(
    state: &AppState,
    user: AuthenticatedUser,
    req: CreateProjectRequest,
) -> Result<Json<ProjectResponse>> {
    user.require_admin()?;
    req.validate()?;

    let client = find_client(&state.db, user.company_id, req.client_id).await?;

    let project = entity::billing_projects::ActiveModel {
        company_id: Set(user.company_id),
        client_id: Set(client.id),
        name: Set(req.name.trim().to_string()),
        default_hourly_rate: Set(req.default_hourly_rate),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    info!(
        project_id = project.id,
        client_id = client.id,
        company_id = user.company_id,
        "Billing project created"
    );
    Ok(Json(project.into()))
}

pub async fn update_project_handler(
    state: &AppState,
    user: AuthenticatedUser,
    project_id: i32,
    req: UpdateProjectRequest,
) -> Result<Json<ProjectResponse>> {
    user.require_admin()?;
    if req.is_empty() {
        return Err(AppError::bad_request("No fields to update"));
    }
    req.validate()?;

    let project = find_project(&state.db, user.company_id, project_id).await?;
    let mut active: entity::billing_projects::ActiveModel = project.into();

    if let Some(name) = req.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(rate) = req.default_hourly_rate {
        if rate.is_some_and(|r| r < 0.0) {
            return Err(AppError::validation("default_hourly_rate must not be negative"));
        }
        active.default_hourly_rate = Set(rate);
    }

    let project = active.update(&state.db).await?;
    info!(project_id, company_id = user.company_id, "Billing project updated");
    Ok(Json(project.into()))
}

pub async fn delete_project_handler(
    state: &AppState,
    user: AuthenticatedUser,
    project_id: i32,
) -> Result<Json<SuccessResponse>> {
    user.require_admin()?;
    let project = find_project(&state.db, user.company_id, project_id).await?;

    let invoices = InvoicesEntity::find()
        .filter(InvoiceColumn::ProjectId.eq(project.id))
        .count(&state.db)
        .await?;
    if invoices > 0 {
        return Err(AppError::conflict("Project has invoices and cannot be deleted"));
    }

    let txn = state.db.begin().await?;
    delete_projects(&txn, vec![project.id]).await?;
    txn.commit().await?;

    info!(project_id, company_id = user.company_id, "Billing project deleted");
    Ok(Json(SuccessResponse::new("Project deleted")))
}

// Mappings

pub async fn list_mappings_handler(
    state: &AppState,
    user: AuthenticatedUser,
    project_id: i32,
) -> Result<Json<MappingListResponse>> {
    let project = find_project(&state.db, user.company_id, project_id).await?;

    let mappings = MappingsEntity::find()
        .filter(MappingColumn::ProjectId.eq(project.id))
        .order_by_asc(MappingColumn::JiraInstance)
        .order_by_asc(MappingColumn::JiraProjectKey)
        .all(&state.db)
        .await?;

    Ok(Json(MappingListResponse {
        mappings: mappings.into_iter().map(Into::into).collect(),
    }))
}

pub async fn create_mapping_handler(
    state: &AppState,
    user: AuthenticatedUser,
    project_id: i32,
    req: CreateMappingRequest,
) -> Result<Json<MappingResponse>> {
    user.require_admin()?;
    req.validate()?;

    let project = find_project(&state.db, user.company_id, project_id).await?;

    let instance = InstancesEntity::find()
        .filter(InstanceColumn::CompanyId.eq(user.company_id))
        .filter(InstanceColumn::Name.eq(req.jira_instance.as_str()))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Unknown JIRA instance: {}", req.jira_instance)))?;

    let key = req.jira_project_key.trim().to_uppercase();
    let duplicate = MappingsEntity::find()
        .filter(MappingColumn::ProjectId.eq(project.id))
        .filter(MappingColumn::JiraInstance.eq(instance.name.as_str()))
        .filter(MappingColumn::JiraProjectKey.eq(key.as_str()))
        .count(&state.db)
        .await?;
    if duplicate > 0 {
        return Err(AppError::conflict("Mapping already exists"));
    }

    let mapping = entity::billing_project_mappings::ActiveModel {
        company_id: Set(user.company_id),
        project_id: Set(project.id),
        jira_instance: Set(instance.name),
        jira_project_key: Set(key),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    info!(
        mapping_id = mapping.id,
        project_id,
        company_id = user.company_id,
        "Billing project mapping created"
    );
    Ok(Json(mapping.into()))
}

pub async fn delete_mapping_handler(
    state: &AppState,
    user: AuthenticatedUser,
    mapping_id: i32,
) -> Result<Json<SuccessResponse>> {
    user.require_admin()?;

    let result = MappingsEntity::delete_many()
        .filter(MappingColumn::Id.eq(mapping_id))
        .filter(MappingColumn::CompanyId.eq(user.company_id))
        .exec(&state.db)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::not_found("Mapping not found"));
    }

    info!(mapping_id, company_id = user.company_id, "Billing project mapping deleted");
    Ok(Json(SuccessResponse::new("Mapping deleted")))
}

// Rates

pub async fn list_rates_handler(
    state: &AppState,
    user: AuthenticatedUser,
    query: RateListQuery,
) -> Result<Json<RateListResponse>> {
    let mut select = RatesEntity::find().filter(RateColumn::CompanyId.eq(user.company_id));
    if let Some(project_id) = query.project_id {
        select = select.filter(RateColumn::ProjectId.eq(project_id));
    }

    let rates = select
        .order_by_asc(RateColumn::ProjectId)
        .order_by_asc(RateColumn::Id)
        .all(&state.db)
        .await?;

    Ok(Json(RateListResponse {
        rates: rates.into_iter().map(Into::into).collect(),
    }))
}

pub async fn create_rate_handler(
    state: &AppState,
    user: AuthenticatedUser,
    req: CreateRateRequest,
) -> Result<Json<RateResponse>> {
    user.require_admin()?;
    req.validate()?;

    if let (Some(from), Some(to)) = (req.valid_from, req.valid_to) {
        if from > to {
            return Err(AppError::validation("valid_from must be on or before valid_to"));
        }
    }

    let project = find_project(&state.db, user.company_id, req.project_id).await?;

    let rate = entity::billing_rates::ActiveModel {
        company_id: Set(user.company_id),
        project_id: Set(project.id),
        user_email: Set(req.user_email.as_deref().map(normalize_email)),
        issue_type: Set(req.issue_type.map(|t| t.trim().to_string())),
        hourly_rate: Set(req.hourly_rate),
        valid_from: Set(req.valid_from),
        valid_to: Set(req.valid_to),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    info!(
        rate_id = rate.id,
        project_id = project.id,
        company_id = user.company_id,
        "Billing rate created"
    );
    Ok(Json(rate.into()))
}

pub async fn delete_rate_handler(
    state: &AppState,
    user: AuthenticatedUser,
    rate_id: i32,
) -> Result<Json<SuccessResponse>> {
    user.require_admin()?;

    let result = RatesEntity::delete_many()
        .filter(RateColumn::Id.eq(rate_id))
        .filter(RateColumn::CompanyId.eq(user.company_id))
        .exec(&state.db)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::not_found("Rate not found"));
    }

    info!(rate_id, company_id = user.company_id, "Billing rate deleted");
    Ok(Json(SuccessResponse::new("Rate deleted")))
}

// Classifications

pub async fn list_classifications_handler(
    state: &AppState,
    user: AuthenticatedUser,
    query: ClassificationListQuery,
) -> Result<Json<ClassificationListResponse>> {
    let mut select = ClassificationsEntity::find().filter(ClassificationColumn::CompanyId.eq(user.company_id));
    if let Some(instance) = query.jira_instance {
        select = select.filter(ClassificationColumn::JiraInstance.eq(instance));
    }

    let classifications = select
        .order_by_desc(ClassificationColumn::UpdatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(ClassificationListResponse {
        classifications: classifications.into_iter().map(Into::into).collect(),
    }))
}

/// Fields written by a classification save. `override_hourly_rate: None` keeps the stored override.
struct ClassificationChange {
    is_billable:          bool,
    override_hourly_rate: Option<Option<f64>>,
    note:                 Option<String>,
}

async fn ensure_worklog<C: ConnectionTrait>(db: &C, company_id: i32, worklog: &WorklogRef) -> Result<()> {
    let found = WorklogsEntity::find()
        .filter(WorklogColumn::CompanyId.eq(company_id))
        .filter(WorklogColumn::Id.eq(worklog.worklog_id.as_str()))
        .filter(WorklogColumn::JiraInstance.eq(worklog.jira_instance.as_str()))
        .count(db)
        .await?;
    if found == 0 {
        return Err(AppError::not_found(format!(
            "Worklog not found: {} on {}",
            worklog.worklog_id, worklog.jira_instance
        )));
    }
    Ok(())
}

/// Inserts or updates the classification row of one worklog.
async fn save_classification<C: ConnectionTrait>(
    db: &C,
    company_id: i32,
    worklog: &WorklogRef,
    change: ClassificationChange,
) -> Result<entity::billing_worklog_classifications::Model> {
    let existing = ClassificationsEntity::find()
        .filter(ClassificationColumn::CompanyId.eq(company_id))
        .filter(ClassificationColumn::WorklogId.eq(worklog.worklog_id.as_str()))
        .filter(ClassificationColumn::JiraInstance.eq(worklog.jira_instance.as_str()))
        .one(db)
        .await?;

    let saved = match existing {
        Some(row) => {
            let mut active: entity::billing_worklog_classifications::ActiveModel = row.into();
            active.is_billable = Set(change.is_billable);
            if let Some(rate) = change.override_hourly_rate {
                active.override_hourly_rate = Set(rate);
            }
            active.note = Set(change.note);
            active.updated_at = Set(Utc::now());
            active.update(db).await?
        },
        None => {
            entity::billing_worklog_classifications::ActiveModel {
                company_id: Set(company_id),
                worklog_id: Set(worklog.worklog_id.clone()),
                jira_instance: Set(worklog.jira_instance.clone()),
                is_billable: Set(change.is_billable),
                override_hourly_rate: Set(change.override_hourly_rate.flatten()),
                note: Set(change.note),
                updated_at: Set(Utc::now()),
                ..Default::default()
            }
            .insert(db)
            .await?
        },
    };
    Ok(saved)
}

pub async fn upsert_classification_handler(
    state: &AppState,
    user: AuthenticatedUser,
    req: UpsertClassificationRequest,
) -> Result<Json<ClassificationResponse>> {
    user.require_admin()?;
    req.validate()?;

    let worklog = WorklogRef {
        worklog_id:    req.worklog_id,
        jira_instance: req.jira_instance,
    };
    ensure_worklog(&state.db, user.company_id, &worklog).await?;

    let classification = save_classification(&state.db, user.company_id, &worklog, ClassificationChange {
        is_billable:          req.is_billable,
        override_hourly_rate: Some(req.override_hourly_rate),
        note:                 req.note,
    })
    .await?;

    info!(
        worklog_id = %classification.worklog_id,
        jira_instance = %classification.jira_instance,
        company_id = user.company_id,
        is_billable = classification.is_billable,
        "Worklog classification saved"
    );
    Ok(Json(classification.into()))
}

/// Classifies every listed worklog, or none when one of them is unknown.
pub async fn bulk_classification_handler(
    state: &AppState,
    user: AuthenticatedUser,
    req: BulkClassificationRequest,
) -> Result<Json<BulkClassificationResponse>> {
    user.require_admin()?;
    req.validate()?;

    let mut worklogs = req.worklogs;
    worklogs.sort_by(|a, b| {
        (a.jira_instance.as_str(), a.worklog_id.as_str()).cmp(&(b.jira_instance.as_str(), b.worklog_id.as_str()))
    });
    worklogs.dedup();

    let txn = state.db.begin().await?;
    for worklog in &worklogs {
        ensure_worklog(&txn, user.company_id, worklog).await?;
        save_classification(&txn, user.company_id, worklog, ClassificationChange {
            is_billable:          req.is_billable,
            override_hourly_rate: None,
            note:                 req.note.clone(),
        })
        .await?;
    }
    txn.commit().await?;

    info!(
        company_id = user.company_id,
        count = worklogs.len(),
        is_billable = req.is_billable,
        "Worklogs classified in bulk"
    );
    Ok(Json(BulkClassificationResponse {
        count: worklogs.len() as u64,
    }))
}
