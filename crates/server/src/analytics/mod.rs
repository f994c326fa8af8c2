//! # Analytics Module
//!
//! Dashboard, team, user, epic and issue reports over stored worklogs.

pub mod complementary;
pub mod dashboard;
pub mod reports;

use std::collections::HashSet;

use axum::Json;
use chrono::{Days, NaiveDate, Utc};
use entity::{
    holidays::{Column as HolidayColumn, Entity as HolidaysEntity},
    teams::{Column as TeamColumn, Entity as TeamsEntity},
    users::{Column as UserColumn, Entity as UsersEntity},
    worklogs::{Column as WorklogColumn, Entity as WorklogsEntity},
};
use error::{AppError, Result};
use logging::measure_duration;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};

use self::{
    complementary::excluded_instance_names,
    dashboard::{build_dashboard, epic_hours, DashboardInput},
    reports::{Directory, ReportPeriod},
};
use crate::{
    dto::analytics::{
        AnalyticsQuery,
        DashboardResponse,
        EpicDetailResponse,
        EpicListResponse,
        IssueDetailResponse,
        IssueReportQuery,
        TeamReportResponse,
        TeamSummaryListResponse,
        UserReportListResponse,
        UserReportQuery,
        UserReportResponse,
        UserReportRow,
    },
    middleware::auth::AuthenticatedUser,
    utils::{check_report_range, day_bounds, normalize_email, working_days},
    AppState,
};

/// Days covered by an issue report when no range is given.
const ISSUE_LOOKBACK_DAYS: u64 = 90;

/// Worklogs in the range after the instance filter, before complementary folding.
///
/// The returned set holds the instances folding removes; it is empty when the
/// query names an instance.
async fn range_worklogs(
    state: &AppState,
    company_id: i32,
    query: &AnalyticsQuery,
) -> Result<(Vec<entity::worklogs::Model>, HashSet<String>)> {
    check_report_range(query.start_date, query.end_date)?;
    let (from, until) = day_bounds(query.start_date, query.end_date);

    let mut select = WorklogsEntity::find()
        .filter(WorklogColumn::CompanyId.eq(company_id))
        .filter(WorklogColumn::Started.gte(from))
        .filter(WorklogColumn::Started.lt(until));
    let excluded = match &query.jira_instance {
        Some(instance) => {
            select = select.filter(WorklogColumn::JiraInstance.eq(instance));
            HashSet::new()
        },
        None => excluded_instance_names(&state.db, company_id).await?,
    };

    let worklogs = select
        .order_by_asc(WorklogColumn::Started)
        .all(&state.db)
        .await?;
    Ok((worklogs, excluded))
}

/// Worklogs in the range after the instance filter or complementary folding.
async fn scoped_worklogs(
    state: &AppState,
    company_id: i32,
    query: &AnalyticsQuery,
) -> Result<Vec<entity::worklogs::Model>> {
    let (mut worklogs, excluded) = range_worklogs(state, company_id, query).await?;
    worklogs.retain(|w| !excluded.contains(&w.jira_instance));
    Ok(worklogs)
}

async fn active_users(state: &AppState, company_id: i32) -> Result<Vec<entity::users::Model>> {
    Ok(UsersEntity::find()
        .filter(UserColumn::CompanyId.eq(company_id))
        .filter(UserColumn::IsActive.eq(true))
        .order_by_asc(UserColumn::Email)
        .all(&state.db)
        .await?)
}

async fn company_teams(state: &AppState, company_id: i32) -> Result<Vec<entity::teams::Model>> {
    Ok(TeamsEntity::find()
        .filter(TeamColumn::CompanyId.eq(company_id))
        .order_by_asc(TeamColumn::Name)
        .all(&state.db)
        .await?)
}

/// Active holiday dates of the company within the range.
async fn holiday_dates(state: &AppState, company_id: i32, start: NaiveDate, end: NaiveDate) -> Result<HashSet<NaiveDate>> {
    Ok(HolidaysEntity::find()
        .filter(HolidayColumn::CompanyId.eq(company_id))
        .filter(HolidayColumn::IsActive.eq(true))
        .filter(HolidayColumn::HolidayDate.gte(start))
        .filter(HolidayColumn::HolidayDate.lte(end))
        .all(&state.db)
        .await?
        .into_iter()
        .map(|h| h.holiday_date)
        .collect())
}

async fn report_period(state: &AppState, company_id: i32, query: &AnalyticsQuery) -> Result<ReportPeriod> {
    let holidays = holiday_dates(state, company_id, query.start_date, query.end_date).await?;
    Ok(ReportPeriod {
        start_date:          query.start_date,
        end_date:            query.end_date,
        working_days:        working_days(query.start_date, query.end_date, &holidays),
        daily_working_hours: state.settings.daily_working_hours,
    })
}

pub async fn dashboard_handler(
    state: &AppState,
    user: AuthenticatedUser,
    query: AnalyticsQuery,
) -> Result<Json<DashboardResponse>> {
    let worklogs = scoped_worklogs(state, user.company_id, &query).await?;
    let users = active_users(state, user.company_id).await?;
    let teams = company_teams(state, user.company_id).await?;
    let holidays = holiday_dates(state, user.company_id, query.start_date, query.end_date).await?;

    let dashboard = measure_duration!("analytics", "dashboard", {
        build_dashboard(DashboardInput {
            start_date:          query.start_date,
            end_date:            query.end_date,
            worklogs:            &worklogs,
            users:               &users,
            teams:               &teams,
            holidays:            &holidays,
            daily_working_hours: state.settings.daily_working_hours,
        })
    });

    Ok(Json(dashboard))
}

pub async fn epics_handler(
    state: &AppState,
    user: AuthenticatedUser,
    query: AnalyticsQuery,
) -> Result<Json<EpicListResponse>> {
    let worklogs = scoped_worklogs(state, user.company_id, &query).await?;
    Ok(Json(EpicListResponse {
        epics: epic_hours(&worklogs),
    }))
}

pub async fn epic_detail_handler(
    state: &AppState,
    user: AuthenticatedUser,
    epic_key: String,
    query: AnalyticsQuery,
) -> Result<Json<EpicDetailResponse>> {
    let worklogs = reports::epic_worklogs(scoped_worklogs(state, user.company_id, &query).await?, &epic_key);
    let users = active_users(state, user.company_id).await?;
    let teams = company_teams(state, user.company_id).await?;
    let directory = Directory::new(&users, &teams);

    Ok(Json(reports::epic_detail(
        &epic_key,
        &worklogs,
        &directory,
        query.start_date,
        query.end_date,
    )))
}

pub async fn team_summaries_handler(
    state: &AppState,
    user: AuthenticatedUser,
) -> Result<Json<TeamSummaryListResponse>> {
    let users = active_users(state, user.company_id).await?;
    let teams = company_teams(state, user.company_id).await?;
    Ok(Json(TeamSummaryListResponse {
        teams: reports::team_summaries(&teams, &users),
    }))
}

pub async fn team_report_handler(
    state: &AppState,
    user: AuthenticatedUser,
    team_name: String,
    query: AnalyticsQuery,
) -> Result<Json<TeamReportResponse>> {
    let teams = company_teams(state, user.company_id).await?;
    let team = teams
        .iter()
        .find(|t| t.name.eq_ignore_ascii_case(team_name.trim()))
        .ok_or_else(|| AppError::not_found(format!("Team '{}' not found", team_name)))?;

    let worklogs = scoped_worklogs(state, user.company_id, &query).await?;
    let users = active_users(state, user.company_id).await?;
    let period = report_period(state, user.company_id, &query).await?;

    let report = measure_duration!("analytics", "team_report", {
        reports::team_report(team, &users, &worklogs, period)
    });
    Ok(Json(report))
}

pub async fn user_reports_handler(
    state: &AppState,
    user: AuthenticatedUser,
    query: UserReportQuery,
) -> Result<Json<UserReportListResponse>> {
    let users = active_users(state, user.company_id).await?;
    let teams = company_teams(state, user.company_id).await?;
    let directory = Directory::new(&users, &teams);

    let Some(period_query) = query.period()
    else {
        let users = users
            .iter()
            .map(|u| {
                UserReportRow {
                    id:        u.id,
                    email:     u.email.clone(),
                    full_name: u.full_name(),
                    team_name: directory.team_name(u),
                    stats:     None,
                }
            })
            .collect();
        return Ok(Json(UserReportListResponse {
            users,
        }));
    };

    let (all, excluded) = range_worklogs(state, user.company_id, &period_query).await?;
    let counted: Vec<_> = all
        .iter()
        .filter(|w| !excluded.contains(&w.jira_instance))
        .cloned()
        .collect();
    let period = report_period(state, user.company_id, &period_query).await?;
    let mut stats = reports::user_period_stats(&all, &counted, period);

    let mut rows: Vec<UserReportRow> = users
        .iter()
        .map(|u| {
            UserReportRow {
                id:        u.id,
                email:     u.email.clone(),
                full_name: u.full_name(),
                team_name: directory.team_name(u),
                stats:     Some(
                    stats
                        .remove(&normalize_email(&u.email))
                        .unwrap_or_else(|| reports::idle_stats(period)),
                ),
            }
        })
        .collect();
    rows.sort_by(|a, b| {
        let hours = |row: &UserReportRow| row.stats.as_ref().map_or(0.0, |s| s.total_hours);
        hours(b)
            .total_cmp(&hours(a))
            .then_with(|| a.email.cmp(&b.email))
    });

    Ok(Json(UserReportListResponse {
        users: rows,
    }))
}

pub async fn user_report_handler(
    state: &AppState,
    user: AuthenticatedUser,
    user_id: i32,
    query: AnalyticsQuery,
) -> Result<Json<UserReportResponse>> {
    let target = UsersEntity::find_by_id(user_id)
        .filter(UserColumn::CompanyId.eq(user.company_id))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;
    let email = normalize_email(&target.email);

    let (mut all, excluded) = range_worklogs(state, user.company_id, &query).await?;
    all.retain(|w| normalize_email(&w.author_email) == email);
    let counted: Vec<_> = all
        .iter()
        .filter(|w| !excluded.contains(&w.jira_instance))
        .cloned()
        .collect();

    let users = vec![target.clone()];
    let teams = company_teams(state, user.company_id).await?;
    let directory = Directory::new(&users, &teams);
    let period = report_period(state, user.company_id, &query).await?;

    Ok(Json(reports::user_report(&target, &directory, &all, &counted, period)))
}

pub async fn issue_detail_handler(
    state: &AppState,
    user: AuthenticatedUser,
    issue_key: String,
    query: IssueReportQuery,
) -> Result<Json<IssueDetailResponse>> {
    let end_date = query.end_date.unwrap_or_else(|| Utc::now().date_naive());
    let start_date = query.start_date.unwrap_or_else(|| {
        end_date
            .checked_sub_days(Days::new(ISSUE_LOOKBACK_DAYS))
            .unwrap_or(end_date)
    });
    check_report_range(start_date, end_date)?;
    let (from, until) = day_bounds(start_date, end_date);

    let mut select = WorklogsEntity::find()
        .filter(WorklogColumn::CompanyId.eq(user.company_id))
        .filter(WorklogColumn::IssueKey.eq(issue_key.as_str()))
        .filter(WorklogColumn::Started.gte(from))
        .filter(WorklogColumn::Started.lt(until));
    if let Some(instance) = &query.jira_instance {
        select = select.filter(WorklogColumn::JiraInstance.eq(instance));
    }
    let worklogs = select.all(&state.db).await?;

    let users = active_users(state, user.company_id).await?;
    let teams = company_teams(state, user.company_id).await?;
    let directory = Directory::new(&users, &teams);

    reports::issue_detail(&issue_key, &worklogs, &directory, start_date, end_date)
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("No worklogs found for issue {}", issue_key)))
}
