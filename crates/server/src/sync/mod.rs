//! # Sync Module
//!
//! Pulls worklogs from every selected JIRA instance into the worklog store.
//!
//! Instances with a Tempo token are read through Tempo, one request stream per
//! mapped account; the others fall back to JIRA's own worklog API. Either way
//! issues are then resolved through JIRA for their key and epic/parent. Each
//! instance succeeds or fails on its own; the run is `completed`, `partial` or
//! `failed` depending on how many instances failed.

use std::collections::{HashMap, HashSet};

use axum::Json;
use chrono::{NaiveDate, Utc};
use entity::{
    jira_instances::{Column as InstanceColumn, Entity as JiraInstancesEntity},
    sea_orm_active_enums::SyncStatus,
    sync_history::{Column as HistoryColumn, Entity as SyncHistoryEntity},
    user_jira_accounts::{Column as AccountColumn, Entity as AccountsEntity},
    users::{Column as UserColumn, Entity as UsersEntity},
    worklogs::{Column as WorklogColumn, Entity as WorklogsEntity},
};
use error::{AppError, Result};
use integrations::{IssueResolver, RawWorklog, TempoClient};
use logging::log_sync_event;
use sea_orm::{
    prelude::Expr,
    ActiveEnum,
    ActiveModelTrait,
    ColumnTrait,
    EntityTrait,
    PaginatorTrait,
    QueryFilter,
    QueryOrder,
    QuerySelect,
    Set,
    TransactionTrait,
};
use secrecy::SecretString;
use tracing::{info, warn};

use crate::{
    dto::sync::{
        InstanceSyncResult,
        SyncDefaultsResponse,
        SyncHistoryEntry,
        SyncHistoryQuery,
        SyncHistoryResponse,
        SyncRequest,
        SyncResponse,
        SyncSource,
        SyncStatusResponse,
    },
    middleware::auth::AuthenticatedUser,
    settings::jira_instances::jira_client,
    utils::{check_date_range, day_bounds, first_of_month, normalize_email},
    worklogs::{delete_stale_worklogs, upsert_worklogs},
    AppState,
};

/// A user's account on one instance.
#[derive(Debug, Clone)]
struct MappedAccount {
    account_id:   String,
    email:        String,
    display_name: String,
}

/// Counts from one successfully synced instance.
#[derive(Debug, Clone, Copy)]
struct InstanceCounts {
    source:   SyncSource,
    synced:   i32,
    updated:  i32,
    deleted:  i32,
}

/// Overall run status from the per-instance outcomes.
pub fn overall_status(results: &[InstanceSyncResult]) -> SyncStatus {
    let failed = results
        .iter()
        .filter(|r| r.status == SyncStatus::Failed)
        .count();
    match failed {
        0 => SyncStatus::Completed,
        n if n == results.len() => SyncStatus::Failed,
        _ => SyncStatus::Partial,
    }
}

fn to_i32(value: u64) -> i32 { i32::try_from(value).unwrap_or(i32::MAX) }

/// Picks the instances to sync. Named instances must exist in the company;
/// inactive ones are skipped.
async fn select_instances(
    state: &AppState,
    company_id: i32,
    names: Option<&[String]>,
) -> Result<Vec<entity::jira_instances::Model>> {
    let instances = JiraInstancesEntity::find()
        .filter(InstanceColumn::CompanyId.eq(company_id))
        .order_by_asc(InstanceColumn::Name)
        .all(&state.db)
        .await?;

    let selected: Vec<_> = match names.filter(|n| !n.is_empty()) {
        Some(names) => {
            for name in names {
                if !instances.iter().any(|i| &i.name == name) {
                    return Err(AppError::bad_request(format!("Unknown JIRA instance: {}", name)));
                }
            }
            instances
                .into_iter()
                .filter(|i| i.is_active && names.contains(&i.name))
                .collect()
        },
        None => instances.into_iter().filter(|i| i.is_active).collect(),
    };

    if selected.is_empty() {
        return Err(AppError::bad_request("No active JIRA instances to sync"));
    }
    Ok(selected)
}

/// Account mappings of active users, grouped by instance name.
async fn account_map(state: &AppState, company_id: i32) -> Result<HashMap<String, Vec<MappedAccount>>> {
    let users: HashMap<i32, entity::users::Model> = UsersEntity::find()
        .filter(UserColumn::CompanyId.eq(company_id))
        .filter(UserColumn::IsActive.eq(true))
        .all(&state.db)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

    let accounts = AccountsEntity::find()
        .filter(AccountColumn::CompanyId.eq(company_id))
        .all(&state.db)
        .await?;

    let mut map: HashMap<String, Vec<MappedAccount>> = HashMap::new();
    for account in accounts {
        let Some(user) = users.get(&account.user_id)
        else {
            continue;
        };
        map.entry(account.jira_instance)
            .or_default()
            .push(MappedAccount {
                account_id:   account.account_id,
                email:        normalize_email(&user.email),
                display_name: user.full_name(),
            });
    }
    Ok(map)
}

/// Normalized emails of active users and of every mapped account.
async fn load_known_emails(
    state: &AppState,
    company_id: i32,
    accounts: &HashMap<String, Vec<MappedAccount>>,
) -> Result<HashSet<String>> {
    let users = UsersEntity::find()
        .filter(UserColumn::CompanyId.eq(company_id))
        .filter(UserColumn::IsActive.eq(true))
        .all(&state.db)
        .await?;

    Ok(accounts
        .values()
        .flatten()
        .map(|a| a.email.clone())
        .chain(users.into_iter().map(|u| normalize_email(&u.email)))
        .collect())
}

/// Closes a run that stopped before any instance was synced.
async fn fail_history(state: &AppState, history: entity::sync_history::Model, error: &AppError) {
    let sync_id = history.id;
    let mut history: entity::sync_history::ActiveModel = history.into();
    history.status = Set(SyncStatus::Failed);
    history.error_message = Set(Some(error.message()));
    history.completed_at = Set(Some(Utc::now()));
    if let Err(e) = history.update(&state.db).await {
        warn!(sync_id, error = %e, "Failed to record sync failure");
    }
    warn!(sync_id, code = error.code(), error = %error, "Sync aborted");
}

/// Fetches, enriches and stores one instance's worklogs for the range.
async fn sync_instance(
    state: &AppState,
    company_id: i32,
    instance: &entity::jira_instances::Model,
    accounts: &[MappedAccount],
    known_emails: &HashSet<String>,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<InstanceCounts> {
    let jira = jira_client(state, instance)?;

    let (source, mut worklogs): (SyncSource, Vec<RawWorklog>) =
        match instance.tempo_api_token.as_deref().filter(|t| !t.is_empty()) {
            Some(token) => {
                let tempo = TempoClient::new(
                    state.http.clone(),
                    &instance.name,
                    SecretString::from(token.to_string()),
                )
                .with_base_url(state.tempo_base_url.clone())
                .with_retry(state.retry.clone());

                let mut all = Vec::new();
                for account in accounts {
                    let mut fetched = tempo.user_worklogs(&account.account_id, start, end).await?;
                    for worklog in fetched.iter_mut() {
                        worklog.author_email = account.email.clone();
                        if worklog.author_display_name.is_empty() {
                            worklog.author_display_name = account.display_name.clone();
                        }
                    }
                    all.extend(fetched);
                }
                (SyncSource::Tempo, all)
            },
            None => (SyncSource::Jira, jira.worklogs_in_range(start, end, known_emails).await?),
        };

    let mut resolver = IssueResolver::new(&jira);
    resolver.enrich(&mut worklogs).await?;

    let keep: HashSet<String> = worklogs.iter().map(|w| w.id.clone()).collect();
    let (from, until) = day_bounds(start, end);

    let txn = state.db.begin().await?;
    let stats = upsert_worklogs(&txn, company_id, worklogs).await?;
    let deleted = if source == SyncSource::Tempo && accounts.is_empty() {
        warn!(instance = %instance.name, "No mapped JIRA accounts, stale worklogs kept");
        0
    }
    else {
        delete_stale_worklogs(&txn, company_id, &instance.name, from, until, &keep).await?
    };
    txn.commit().await?;

    info!(
        company_id,
        instance = %instance.name,
        issue_lookups = resolver.lookups(),
        inserted = stats.inserted,
        updated = stats.updated,
        deleted,
        "Instance synced"
    );

    Ok(InstanceCounts {
        source,
        synced: to_i32(stats.inserted + stats.updated),
        updated: to_i32(stats.updated),
        deleted: to_i32(deleted),
    })
}

/// Runs a sync over the selected instances and records it in
/// `sync_history`. Partial failures still return 200.
pub async fn run_sync_handler(
    state: &AppState,
    user: AuthenticatedUser,
    req: SyncRequest,
) -> Result<Json<SyncResponse>> {
    user.require_manager()?;
    check_date_range(req.start_date, req.end_date)?;

    let instances = select_instances(state, user.company_id, req.jira_instances.as_deref()).await?;

    let history = entity::sync_history::ActiveModel {
        company_id: Set(user.company_id),
        status: Set(SyncStatus::InProgress),
        start_date: Set(req.start_date),
        end_date: Set(req.end_date),
        worklogs_synced: Set(0),
        worklogs_updated: Set(0),
        worklogs_deleted: Set(0),
        error_message: Set(None),
        started_at: Set(Utc::now()),
        completed_at: Set(None),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    info!(
        sync_id = history.id,
        company_id = user.company_id,
        instances = instances.len(),
        start_date = %req.start_date,
        end_date = %req.end_date,
        "Sync started"
    );

    let prepared = async {
        let accounts = account_map(state, user.company_id).await?;
        let known_emails = load_known_emails(state, user.company_id, &accounts).await?;
        Ok::<_, AppError>((accounts, known_emails))
    }
    .await;
    let (accounts, known_emails) = match prepared {
        Ok(prepared) => prepared,
        Err(e) => {
            let e = e.context("Preparing sync");
            fail_history(state, history, &e).await;
            return Err(e);
        },
    };

    let mut results = Vec::with_capacity(instances.len());
    for instance in &instances {
        let mapped = accounts
            .get(&instance.name)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let source = if instance.tempo_api_token.as_deref().is_some_and(|t| !t.is_empty()) {
            SyncSource::Tempo
        }
        else {
            SyncSource::Jira
        };

        let result = match sync_instance(
            state,
            user.company_id,
            instance,
            mapped,
            &known_emails,
            req.start_date,
            req.end_date,
        )
        .await
        {
            Ok(counts) => {
                InstanceSyncResult {
                    instance:         instance.name.clone(),
                    status:           SyncStatus::Completed,
                    source:           counts.source,
                    worklogs_synced:  counts.synced,
                    worklogs_updated: counts.updated,
                    worklogs_deleted: counts.deleted,
                    error:            None,
                }
            },
            Err(e) => {
                warn!(
                    sync_id = history.id,
                    instance = %instance.name,
                    code = e.code(),
                    error = %e,
                    "Instance sync failed"
                );
                InstanceSyncResult {
                    instance:         instance.name.clone(),
                    status:           SyncStatus::Failed,
                    source,
                    worklogs_synced:  0,
                    worklogs_updated: 0,
                    worklogs_deleted: 0,
                    error:            Some(e.message()),
                }
            },
        };

        log_sync_event!(
            user.company_id,
            result.instance,
            result.status.to_value(),
            result.worklogs_synced
        );
        results.push(result);
    }

    let status = overall_status(&results);
    let synced: i32 = results.iter().map(|r| r.worklogs_synced).sum();
    let updated: i32 = results.iter().map(|r| r.worklogs_updated).sum();
    let deleted: i32 = results.iter().map(|r| r.worklogs_deleted).sum();
    let failures: Vec<String> = results
        .iter()
        .filter_map(|r| r.error.as_ref().map(|e| format!("{}: {}", r.instance, e)))
        .collect();

    let sync_id = history.id;
    let mut history: entity::sync_history::ActiveModel = history.into();
    history.status = Set(status);
    history.worklogs_synced = Set(synced);
    history.worklogs_updated = Set(updated);
    history.worklogs_deleted = Set(deleted);
    history.error_message = Set((!failures.is_empty()).then(|| failures.join("; ")));
    history.completed_at = Set(Some(Utc::now()));
    history.update(&state.db).await?;

    let message = match status {
        SyncStatus::Completed => format!("Synced {} worklogs from {} instance(s)", synced, results.len()),
        SyncStatus::Partial => {
            format!(
                "Synced {} worklogs; {} of {} instance(s) failed",
                synced,
                failures.len(),
                results.len()
            )
        },
        _ => "Sync failed for every instance".to_string(),
    };

    info!(
        sync_id,
        company_id = user.company_id,
        status = %status.to_value(),
        synced,
        updated,
        deleted,
        "Sync finished"
    );

    Ok(Json(SyncResponse {
        success: status != SyncStatus::Failed,
        sync_id,
        status,
        worklogs_synced: synced,
        worklogs_updated: updated,
        worklogs_deleted: deleted,
        instances: results,
        message,
    }))
}

pub async fn sync_history_handler(
    state: &AppState,
    user: AuthenticatedUser,
    query: SyncHistoryQuery,
) -> Result<Json<SyncHistoryResponse>> {
    let history = SyncHistoryEntity::find()
        .filter(HistoryColumn::CompanyId.eq(user.company_id))
        .order_by_desc(HistoryColumn::StartedAt)
        .order_by_desc(HistoryColumn::Id)
        .limit(query.limit())
        .all(&state.db)
        .await?;

    Ok(Json(SyncHistoryResponse {
        history: history.into_iter().map(SyncHistoryEntry::from).collect(),
    }))
}

/// Stored worklog count and the span they cover.
pub async fn sync_status_handler(state: &AppState, user: AuthenticatedUser) -> Result<Json<SyncStatusResponse>> {
    let total_worklogs = WorklogsEntity::find()
        .filter(WorklogColumn::CompanyId.eq(user.company_id))
        .count(&state.db)
        .await?;

    let (date_range_start, date_range_end) = if total_worklogs > 0 {
        WorklogsEntity::find()
            .select_only()
            .column_as(Expr::col(WorklogColumn::Started).min(), "first")
            .column_as(Expr::col(WorklogColumn::Started).max(), "last")
            .filter(WorklogColumn::CompanyId.eq(user.company_id))
            .into_tuple::<(Option<chrono::DateTime<Utc>>, Option<chrono::DateTime<Utc>>)>()
            .one(&state.db)
            .await?
            .unwrap_or((None, None))
    }
    else {
        (None, None)
    };

    Ok(Json(SyncStatusResponse {
        total_worklogs,
        date_range_start,
        date_range_end,
        has_data: total_worklogs > 0,
    }))
}

/// Suggested range (month to date) and the instances a sync would cover.
pub async fn sync_defaults_handler(state: &AppState, user: AuthenticatedUser) -> Result<Json<SyncDefaultsResponse>> {
    let today = Utc::now().date_naive();
    let instances = JiraInstancesEntity::find()
        .filter(InstanceColumn::CompanyId.eq(user.company_id))
        .filter(InstanceColumn::IsActive.eq(true))
        .order_by_asc(InstanceColumn::Name)
        .all(&state.db)
        .await?
        .into_iter()
        .map(|i| i.name)
        .collect();

    Ok(Json(SyncDefaultsResponse {
        start_date: first_of_month(today),
        end_date: today,
        instances,
    }))
}
