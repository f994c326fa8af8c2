//! Billing preview: worklogs of a client's projects priced through the rate
//! cascade and grouped into line items.

use std::collections::{BTreeMap, HashMap, HashSet};

use axum::Json;
use entity::{
    billing_clients::{Column as ClientColumn, Entity as ClientsEntity},
    billing_project_mappings::{Column as MappingColumn, Entity as MappingsEntity},
    billing_projects::{Column as ProjectColumn, Entity as ProjectsEntity},
    billing_rates::{Column as RateColumn, Entity as RatesEntity},
    billing_worklog_classifications::{Column as ClassificationColumn, Entity as ClassificationsEntity},
    worklogs::{Column as WorklogColumn, Entity as WorklogsEntity},
};
use error::{AppError, Result};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use serde_json::json;

use super::rates::{resolve_rate, RateContext};
use crate::{
    dto::billing::{BillingPreviewRequest, BillingPreviewResponse, GroupBy, PreviewLineItem, UnratedWorklog},
    middleware::auth::AuthenticatedUser,
    utils::{check_date_range, day_bounds, round2},
    AppState,
};

/// Running totals of one line item.
#[derive(Debug, Default)]
struct LineAcc {
    description: String,
    seconds:     i64,
    amount:      f64,
    worklogs:    u64,
}

fn group_key(
    group_by: GroupBy,
    project: &entity::billing_projects::Model,
    worklog: &entity::worklogs::Model,
) -> (String, String) {
    match group_by {
        GroupBy::Project => (project.id.to_string(), project.name.clone()),
        GroupBy::User => {
            let description = if worklog.author_display_name.is_empty() {
                worklog.author_email.clone()
            }
            else {
                worklog.author_display_name.clone()
            };
            (worklog.author_email.clone(), description)
        },
        GroupBy::Issue => {
            let description = if worklog.issue_summary.is_empty() {
                worklog.issue_key.clone()
            }
            else {
                format!("{}: {}", worklog.issue_key, worklog.issue_summary)
            };
            (worklog.issue_key.clone(), description)
        },
    }
}

/// Loads everything a preview needs and prices it.
///
/// Unknown client or project gives 404; a project of another client gives 422.
pub async fn build_preview<C: ConnectionTrait>(
    db: &C,
    company_id: i32,
    req: &BillingPreviewRequest,
) -> Result<BillingPreviewResponse> {
    check_date_range(req.start_date, req.end_date)?;

    let client = ClientsEntity::find_by_id(req.client_id)
        .filter(ClientColumn::CompanyId.eq(company_id))
        .one(db)
        .await?
        .ok_or_else(|| AppError::not_found("Billing client not found"))?;

    let projects = match req.project_id {
        Some(project_id) => {
            let project = ProjectsEntity::find_by_id(project_id)
                .filter(ProjectColumn::CompanyId.eq(company_id))
                .one(db)
                .await?
                .ok_or_else(|| AppError::not_found("Billing project not found"))?;
            if project.client_id != client.id {
                return Err(AppError::validation("Project does not belong to this client"));
            }
            vec![project]
        },
        None => {
            ProjectsEntity::find()
                .filter(ProjectColumn::CompanyId.eq(company_id))
                .filter(ProjectColumn::ClientId.eq(client.id))
                .order_by_asc(ProjectColumn::Id)
                .all(db)
                .await?
        },
    };
    let project_ids: Vec<i32> = projects.iter().map(|p| p.id).collect();
    let projects_by_id: HashMap<i32, &entity::billing_projects::Model> = projects.iter().map(|p| (p.id, p)).collect();

    let mappings = MappingsEntity::find()
        .filter(MappingColumn::CompanyId.eq(company_id))
        .filter(MappingColumn::ProjectId.is_in(project_ids.clone()))
        .order_by_asc(MappingColumn::Id)
        .all(db)
        .await?;
    let mut project_of: HashMap<(String, String), i32> = HashMap::new();
    for mapping in &mappings {
        project_of
            .entry((mapping.jira_instance.clone(), mapping.jira_project_key.to_uppercase()))
            .or_insert(mapping.project_id);
    }
    let instances: HashSet<String> = mappings.iter().map(|m| m.jira_instance.clone()).collect();

    let mut response = BillingPreviewResponse {
        client_id:          client.id,
        project_id:         req.project_id,
        start_date:         req.start_date,
        end_date:           req.end_date,
        group_by:           req.group_by,
        currency:           client.billing_currency.clone(),
        line_items:         Vec::new(),
        subtotal_amount:    0.0,
        billable_hours:     0.0,
        non_billable_hours: 0.0,
        unrated_hours:      0.0,
        unrated_worklogs:   Vec::new(),
    };
    if instances.is_empty() {
        return Ok(response);
    }

    let (from, until) = day_bounds(req.start_date, req.end_date);
    let worklogs: Vec<entity::worklogs::Model> = WorklogsEntity::find()
        .filter(WorklogColumn::CompanyId.eq(company_id))
        .filter(WorklogColumn::JiraInstance.is_in(instances.iter().cloned()))
        .filter(WorklogColumn::Started.gte(from))
        .filter(WorklogColumn::Started.lt(until))
        .order_by_asc(WorklogColumn::Started)
        .all(db)
        .await?
        .into_iter()
        .filter(|w| project_of.contains_key(&(w.jira_instance.clone(), w.project_key().to_uppercase())))
        .collect();

    let classifications: HashMap<(String, String), entity::billing_worklog_classifications::Model> =
        ClassificationsEntity::find()
            .filter(ClassificationColumn::CompanyId.eq(company_id))
            .filter(ClassificationColumn::JiraInstance.is_in(instances.iter().cloned()))
            .all(db)
            .await?
            .into_iter()
            .map(|c| ((c.worklog_id.clone(), c.jira_instance.clone()), c))
            .collect();

    let mut rules_by_project: HashMap<i32, Vec<entity::billing_rates::Model>> = HashMap::new();
    for rule in RatesEntity::find()
        .filter(RateColumn::CompanyId.eq(company_id))
        .filter(RateColumn::ProjectId.is_in(project_ids))
        .all(db)
        .await?
    {
        rules_by_project.entry(rule.project_id).or_default().push(rule);
    }

    let mut lines: BTreeMap<String, LineAcc> = BTreeMap::new();
    let mut billable_seconds = 0i64;
    let mut non_billable_seconds = 0i64;
    let mut unrated_seconds = 0i64;

    for worklog in &worklogs {
        let Some(project) = project_of
            .get(&(worklog.jira_instance.clone(), worklog.project_key().to_uppercase()))
            .and_then(|id| projects_by_id.get(id))
        else {
            continue;
        };
        let classification = classifications.get(&(worklog.id.clone(), worklog.jira_instance.clone()));

        if classification.is_some_and(|c| !c.is_billable) {
            non_billable_seconds += worklog.time_spent_seconds;
            continue;
        }

        let ctx = RateContext {
            rules: rules_by_project
                .get(&project.id)
                .map(Vec::as_slice)
                .unwrap_or_default(),
            project_default: project.default_hourly_rate,
            client_default: client.default_hourly_rate,
            classification,
        };

        let Some(rate) = resolve_rate(&ctx, worklog)
        else {
            unrated_seconds += worklog.time_spent_seconds;
            response.unrated_worklogs.push(UnratedWorklog {
                worklog_id:    worklog.id.clone(),
                jira_instance: worklog.jira_instance.clone(),
                issue_key:     worklog.issue_key.clone(),
                author_email:  worklog.author_email.clone(),
                hours:         round2(worklog.hours()),
            });
            continue;
        };

        billable_seconds += worklog.time_spent_seconds;
        let (key, description) = group_key(req.group_by, project, worklog);
        let line = lines.entry(key).or_insert_with(|| {
            LineAcc {
                description,
                ..Default::default()
            }
        });
        line.seconds += worklog.time_spent_seconds;
        line.amount += worklog.hours() * rate.rate;
        line.worklogs += 1;
    }

    let mut line_items: Vec<PreviewLineItem> = lines
        .into_iter()
        .map(|(group_key, acc)| {
            let hours = acc.seconds as f64 / 3600.0;
            let hourly_rate = if hours > 0.0 { acc.amount / hours } else { 0.0 };
            PreviewLineItem {
                group_key,
                description: acc.description,
                quantity_hours: round2(hours),
                hourly_rate: round2(hourly_rate),
                amount: round2(acc.amount),
                metadata: json!({
                    "group_by": req.group_by.as_str(),
                    "worklog_count": acc.worklogs,
                }),
            }
        })
        .collect();
    line_items.sort_by(|a, b| {
        b.amount
            .total_cmp(&a.amount)
            .then_with(|| a.group_key.cmp(&b.group_key))
    });

    response.subtotal_amount = round2(line_items.iter().map(|l| l.amount).sum());
    response.line_items = line_items;
    response.billable_hours = round2(billable_seconds as f64 / 3600.0);
    response.non_billable_hours = round2(non_billable_seconds as f64 / 3600.0);
    response.unrated_hours = round2(unrated_seconds as f64 / 3600.0);

    Ok(response)
}

pub async fn preview_handler(
    state: &AppState,
    user: AuthenticatedUser,
    req: BillingPreviewRequest,
) -> Result<Json<BillingPreviewResponse>> {
    user.require_manager()?;
    let preview = build_preview(&state.db, user.company_id, &req).await?;
    Ok(Json(preview))
}
