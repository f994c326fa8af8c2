//! # Worklogs Module
//!
//! Listing and bulk deletion of stored worklogs. Writes from sync go through
//! [`store`].

pub mod store;

use axum::Json;
use entity::worklogs::{Column, Entity as WorklogsEntity};
use error::{AppError, PaginationMeta, Result};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect};
use tracing::info;

pub use self::store::{delete_stale_worklogs, upsert_worklogs, UpsertStats};
use crate::{
    dto::worklogs::{WorklogDeleteQuery, WorklogDeleteResponse, WorklogListQuery, WorklogListResponse},
    middleware::auth::AuthenticatedUser,
    utils::{check_date_range, day_bounds, normalize_email},
    AppState,
};

/// Paginated worklogs in a date range, newest first.
pub async fn list_worklogs_handler(
    state: &AppState,
    user: AuthenticatedUser,
    query: WorklogListQuery,
) -> Result<Json<WorklogListResponse>> {
    check_date_range(query.start_date, query.end_date)?;
    let (from, until) = day_bounds(query.start_date, query.end_date);

    let mut select = WorklogsEntity::find()
        .filter(Column::CompanyId.eq(user.company_id))
        .filter(Column::Started.gte(from))
        .filter(Column::Started.lt(until));
    if let Some(instance) = &query.jira_instance {
        select = select.filter(Column::JiraInstance.eq(instance));
    }
    if let Some(email) = &query.user_email {
        select = select.filter(Column::AuthorEmail.eq(normalize_email(email)));
    }

    let total = select.clone().count(&state.db).await?;
    let pagination = PaginationMeta::new(query.page(), query.per_page(), total);
    let offset = pagination
        .offset()
        .ok_or_else(|| AppError::validation("Page out of range"))?;

    let worklogs = select
        .order_by_desc(Column::Started)
        .order_by_asc(Column::Id)
        .offset(offset)
        .limit(pagination.per_page)
        .all(&state.db)
        .await?;

    Ok(Json(WorklogListResponse {
        worklogs: worklogs.into_iter().map(Into::into).collect(),
        pagination,
    }))
}

/// Deletes every worklog in the range, optionally for one instance.
pub async fn delete_worklogs_handler(
    state: &AppState,
    user: AuthenticatedUser,
    query: WorklogDeleteQuery,
) -> Result<Json<WorklogDeleteResponse>> {
    user.require_admin()?;
    check_date_range(query.start_date, query.end_date)?;
    let (from, until) = day_bounds(query.start_date, query.end_date);

    let mut delete = WorklogsEntity::delete_many()
        .filter(Column::CompanyId.eq(user.company_id))
        .filter(Column::Started.gte(from))
        .filter(Column::Started.lt(until));
    if let Some(instance) = &query.jira_instance {
        delete = delete.filter(Column::JiraInstance.eq(instance));
    }
    let deleted = delete.exec(&state.db).await?.rows_affected;

    info!(
        company_id = user.company_id,
        start_date = %query.start_date,
        end_date = %query.end_date,
        jira_instance = query.jira_instance.as_deref().unwrap_or("*"),
        deleted,
        "Worklogs deleted"
    );
    Ok(Json(WorklogDeleteResponse {
        deleted,
    }))
}
