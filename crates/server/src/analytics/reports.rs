//! Team, user, epic and issue reports over already-scoped worklogs.
//!
//! Worklog authors are matched to users by normalized email. Authors with no
//! user record still appear in breakdowns, named after their JIRA display name.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;
use entity::{teams, users, worklogs};

use super::dashboard::{completion, daily_trend, epic_hours};
use crate::{
    dto::{
        analytics::{
            EpicDetailResponse,
            InstanceTrend,
            IssueDetailResponse,
            MemberHours,
            TeamMember,
            TeamReportResponse,
            TeamSummary,
            UserPeriodStats,
            UserReportResponse,
        },
        worklogs::WorklogResponse,
    },
    utils::{normalize_email, round2},
};

fn hours(seconds: i64) -> f64 { round2(seconds as f64 / 3600.0) }

/// Users and their team names, looked up by normalized email.
pub struct Directory<'a> {
    by_email: HashMap<String, &'a users::Model>,
    teams:    HashMap<i32, &'a str>,
}

impl<'a> Directory<'a> {
    pub fn new(users: &'a [users::Model], teams: &'a [teams::Model]) -> Self {
        Self {
            by_email: users.iter().map(|u| (normalize_email(&u.email), u)).collect(),
            teams:    teams.iter().map(|t| (t.id, t.name.as_str())).collect(),
        }
    }

    pub fn user(&self, email: &str) -> Option<&'a users::Model> { self.by_email.get(&normalize_email(email)).copied() }

    pub fn team_name(&self, user: &users::Model) -> Option<String> {
        user.team_id
            .and_then(|id| self.teams.get(&id))
            .map(|name| name.to_string())
    }

    /// Worklogs newest first, with the author name taken from the user record when known.
    pub fn worklog_rows<'w>(&self, worklogs: impl IntoIterator<Item = &'w worklogs::Model>) -> Vec<WorklogResponse> {
        let mut rows: Vec<WorklogResponse> = worklogs
            .into_iter()
            .map(|worklog| {
                let mut row = WorklogResponse::from(worklog.clone());
                if let Some(user) = self.user(&worklog.author_email) {
                    row.author_display_name = user.full_name();
                }
                row
            })
            .collect();
        rows.sort_by(|a, b| b.started.cmp(&a.started).then_with(|| a.id.cmp(&b.id)));
        rows
    }
}

/// Seconds logged per normalized author email.
fn seconds_by_author<'w>(worklogs: impl IntoIterator<Item = &'w worklogs::Model>) -> HashMap<String, i64> {
    let mut seconds: HashMap<String, i64> = HashMap::new();
    for worklog in worklogs {
        *seconds.entry(normalize_email(&worklog.author_email)).or_default() += worklog.time_spent_seconds;
    }
    seconds
}

fn sort_members(members: &mut [MemberHours]) {
    members.sort_by(|a, b| b.hours.total_cmp(&a.hours).then_with(|| a.email.cmp(&b.email)));
}

/// Hours per author, largest first.
pub fn contributors(worklogs: &[worklogs::Model], directory: &Directory<'_>) -> Vec<MemberHours> {
    let mut display_names: HashMap<String, &str> = HashMap::new();
    for worklog in worklogs {
        if !worklog.author_display_name.is_empty() {
            display_names
                .entry(normalize_email(&worklog.author_email))
                .or_insert(&worklog.author_display_name);
        }
    }

    let mut result: Vec<MemberHours> = seconds_by_author(worklogs)
        .into_iter()
        .map(|(email, seconds)| {
            match directory.user(&email) {
                Some(user) => {
                    MemberHours {
                        user_id:   Some(user.id),
                        email:     user.email.clone(),
                        full_name: user.full_name(),
                        team_name: directory.team_name(user),
                        hours:     hours(seconds),
                    }
                },
                None => {
                    MemberHours {
                        user_id:   None,
                        full_name: display_names
                            .get(&email)
                            .map_or_else(|| email.clone(), |name| name.to_string()),
                        email,
                        team_name: None,
                        hours: hours(seconds),
                    }
                },
            }
        })
        .collect();
    sort_members(&mut result);
    result
}

/// Teams with their active members, in the order given.
pub fn team_summaries(teams: &[teams::Model], users: &[users::Model]) -> Vec<TeamSummary> {
    teams
        .iter()
        .map(|team| {
            let members: Vec<TeamMember> = users
                .iter()
                .filter(|u| u.team_id == Some(team.id))
                .map(|u| {
                    TeamMember {
                        user_id:   u.id,
                        email:     u.email.clone(),
                        full_name: u.full_name(),
                    }
                })
                .collect();
            TeamSummary {
                team_id: team.id,
                name: team.name.clone(),
                member_count: members.len() as u64,
                members,
            }
        })
        .collect()
}

/// Everything a single report is computed from.
#[derive(Debug, Clone, Copy)]
pub struct ReportPeriod {
    pub start_date:          NaiveDate,
    pub end_date:            NaiveDate,
    /// Working days in the range after weekends and holidays
    pub working_days:        u32,
    pub daily_working_hours: f64,
}

impl ReportPeriod {
    fn expected_hours(&self, people: usize) -> f64 {
        f64::from(self.working_days) * people as f64 * self.daily_working_hours
    }
}

/// Report for one team; `worklogs` are the counted worklogs of the whole company.
pub fn team_report(
    team: &teams::Model,
    users: &[users::Model],
    worklogs: &[worklogs::Model],
    period: ReportPeriod,
) -> TeamReportResponse {
    let members: Vec<&users::Model> = users.iter().filter(|u| u.team_id == Some(team.id)).collect();
    let emails: HashSet<String> = members.iter().map(|u| normalize_email(&u.email)).collect();
    let team_worklogs: Vec<worklogs::Model> = worklogs
        .iter()
        .filter(|w| emails.contains(&normalize_email(&w.author_email)))
        .cloned()
        .collect();

    let by_author = seconds_by_author(&team_worklogs);
    let mut member_hours: Vec<MemberHours> = members
        .iter()
        .map(|u| {
            MemberHours {
                user_id:   Some(u.id),
                email:     u.email.clone(),
                full_name: u.full_name(),
                team_name: Some(team.name.clone()),
                hours:     hours(
                    by_author
                        .get(&normalize_email(&u.email))
                        .copied()
                        .unwrap_or(0),
                ),
            }
        })
        .collect();
    sort_members(&mut member_hours);

    let total_seconds: i64 = team_worklogs.iter().map(|w| w.time_spent_seconds).sum();
    let total_hours = total_seconds as f64 / 3600.0;
    let expected_hours = period.expected_hours(members.len());

    TeamReportResponse {
        team_id: team.id,
        team_name: team.name.clone(),
        start_date: period.start_date,
        end_date: period.end_date,
        total_hours: round2(total_hours),
        expected_hours: round2(expected_hours),
        completion_percentage: completion(total_hours, expected_hours),
        members: member_hours,
        epics: epic_hours(&team_worklogs),
        daily_trend: daily_trend(&team_worklogs, period.start_date, period.end_date),
    }
}

/// Per-user figures for `GET /api/users`, keyed by normalized email.
///
/// `all` includes complementary mirrors and feeds only `hours_by_instance`;
/// every other figure comes from `counted`.
pub fn user_period_stats(
    all: &[worklogs::Model],
    counted: &[worklogs::Model],
    period: ReportPeriod,
) -> HashMap<String, UserPeriodStats> {
    let expected_hours = period.expected_hours(1);
    let mut stats: HashMap<String, (i64, u64, HashSet<&str>, BTreeMap<String, i64>)> = HashMap::new();

    for worklog in counted {
        let entry = stats.entry(normalize_email(&worklog.author_email)).or_default();
        entry.0 += worklog.time_spent_seconds;
        entry.1 += 1;
        if let Some(parent) = worklog.parent_key.as_deref() {
            entry.2.insert(parent);
        }
    }
    for worklog in all {
        let entry = stats.entry(normalize_email(&worklog.author_email)).or_default();
        *entry.3.entry(worklog.jira_instance.clone()).or_default() += worklog.time_spent_seconds;
    }

    stats
        .into_iter()
        .map(|(email, (seconds, count, initiatives, by_instance))| {
            let total_hours = seconds as f64 / 3600.0;
            (email, UserPeriodStats {
                total_hours:           round2(total_hours),
                hours_by_instance:     by_instance.into_iter().map(|(k, v)| (k, hours(v))).collect(),
                expected_hours:        round2(expected_hours),
                completion_percentage: completion(total_hours, expected_hours),
                worklog_count:         count,
                initiative_count:      initiatives.len() as u64,
            })
        })
        .collect()
}

/// Stats for a user with no work in the period.
pub fn idle_stats(period: ReportPeriod) -> UserPeriodStats {
    UserPeriodStats {
        total_hours:           0.0,
        hours_by_instance:     BTreeMap::new(),
        expected_hours:        round2(period.expected_hours(1)),
        completion_percentage: 0.0,
        worklog_count:         0,
        initiative_count:      0,
    }
}

/// Report for one user; `all` and `counted` are already restricted to that user.
pub fn user_report(
    user: &users::Model,
    directory: &Directory<'_>,
    all: &[worklogs::Model],
    counted: &[worklogs::Model],
    period: ReportPeriod,
) -> UserReportResponse {
    let total_seconds: i64 = counted.iter().map(|w| w.time_spent_seconds).sum();
    let total_hours = total_seconds as f64 / 3600.0;
    let expected_hours = period.expected_hours(1);

    let mut by_instance: BTreeMap<&str, Vec<&worklogs::Model>> = BTreeMap::new();
    for worklog in all {
        by_instance
            .entry(worklog.jira_instance.as_str())
            .or_default()
            .push(worklog);
    }
    let daily_trend_by_instance = by_instance
        .into_iter()
        .map(|(instance, worklogs)| {
            InstanceTrend {
                jira_instance: instance.to_string(),
                daily_trend:   daily_trend(worklogs, period.start_date, period.end_date),
            }
        })
        .collect();

    UserReportResponse {
        user_id: user.id,
        email: user.email.clone(),
        full_name: user.full_name(),
        team_name: directory.team_name(user),
        start_date: period.start_date,
        end_date: period.end_date,
        total_hours: round2(total_hours),
        expected_hours: round2(expected_hours),
        completion_percentage: completion(total_hours, expected_hours),
        epics: epic_hours(counted),
        daily_trend: daily_trend(counted, period.start_date, period.end_date),
        daily_trend_by_instance,
        worklogs: directory.worklog_rows(all),
    }
}

/// Worklogs whose parent or epic is `epic_key`.
pub fn epic_worklogs(worklogs: Vec<worklogs::Model>, epic_key: &str) -> Vec<worklogs::Model> {
    worklogs
        .into_iter()
        .filter(|w| w.parent_key.as_deref() == Some(epic_key) || w.epic_key.as_deref() == Some(epic_key))
        .collect()
}

/// Drill-down for one epic; `worklogs` come from [`epic_worklogs`].
pub fn epic_detail(
    epic_key: &str,
    worklogs: &[worklogs::Model],
    directory: &Directory<'_>,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> EpicDetailResponse {
    let first = worklogs.iter().min_by_key(|w| w.started);
    let epic_name = first.and_then(|w| {
        if w.parent_key.as_deref() == Some(epic_key) {
            w.parent_name.clone()
        }
        else {
            w.epic_name.clone()
        }
    });
    let total_seconds: i64 = worklogs.iter().map(|w| w.time_spent_seconds).sum();

    EpicDetailResponse {
        epic_key: epic_key.to_string(),
        epic_name,
        jira_instance: first.map(|w| w.jira_instance.clone()),
        total_hours: hours(total_seconds),
        contributors: contributors(worklogs, directory),
        daily_trend: daily_trend(worklogs, start_date, end_date),
        worklogs: directory.worklog_rows(worklogs),
    }
}

/// Drill-down for one issue, or `None` when nothing was logged on it.
pub fn issue_detail(
    issue_key: &str,
    worklogs: &[worklogs::Model],
    directory: &Directory<'_>,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Option<IssueDetailResponse> {
    let latest = worklogs.iter().max_by_key(|w| w.started)?;
    let total_seconds: i64 = worklogs.iter().map(|w| w.time_spent_seconds).sum();

    Some(IssueDetailResponse {
        issue_key:     issue_key.to_string(),
        issue_summary: latest.issue_summary.clone(),
        jira_instance: latest.jira_instance.clone(),
        parent_key:    latest.parent_key.clone(),
        parent_name:   latest.parent_name.clone(),
        parent_type:   latest.parent_type.clone(),
        epic_key:      latest.epic_key.clone(),
        epic_name:     latest.epic_name.clone(),
        total_hours:   hours(total_seconds),
        contributors:  contributors(worklogs, directory),
        daily_trend:   daily_trend(worklogs, start_date, end_date),
        worklogs:      directory.worklog_rows(worklogs),
    })
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn date(s: &str) -> NaiveDate { s.parse().unwrap() }

    fn worklog(id: &str, instance: &str, email: &str, day: u32, hours: i64) -> worklogs::Model {
        let started = Utc.with_ymd_and_hms(2024, 1, day, 9, 0, 0).unwrap();
        worklogs::Model {
            company_id:          1,
            id:                  id.to_string(),
            jira_instance:       instance.to_string(),
            issue_key:           "ACME-7".to_string(),
            issue_summary:       "Login form".to_string(),
            author_email:        email.to_string(),
            author_display_name: "Jira Name".to_string(),
            author_account_id:   None,
            time_spent_seconds:  hours * 3600,
            started,
            epic_key:            None,
            epic_name:           None,
            parent_key:          None,
            parent_name:         None,
            parent_type:         None,
            created_at:          started,
            updated_at:          started,
        }
    }

    fn user(id: i32, email: &str, first_name: &str, team_id: Option<i32>) -> users::Model {
        users::Model {
            id,
            company_id: 1,
            email: email.to_string(),
            first_name: first_name.to_string(),
            last_name: "Lovelace".to_string(),
            role: "USER".to_string(),
            team_id,
            google_id: None,
            is_active: true,
            created_at: Utc::now(),
            last_login_at: None,
        }
    }

    fn team(id: i32, name: &str) -> teams::Model {
        teams::Model {
            id,
            company_id: 1,
            name: name.to_string(),
            created_at: Utc::now(),
        }
    }

    fn first_week() -> ReportPeriod {
        ReportPeriod {
            start_date:          date("2024-01-01"),
            end_date:            date("2024-01-07"),
            working_days:        5,
            daily_working_hours: 8.0,
        }
    }

    #[test]
    fn test_team_report_includes_idle_members() {
        let teams = vec![team(10, "Platform")];
        let users = vec![
            user(1, "ada@acme.io", "Ada", Some(10)),
            user(2, "bob@acme.io", "Bob", Some(10)),
            user(3, "eve@acme.io", "Eve", None),
        ];
        let worklogs = vec![
            worklog("1", "acme", "ADA@acme.io", 2, 6),
            worklog("2", "acme", "eve@acme.io", 2, 3),
        ];

        let report = team_report(&teams[0], &users, &worklogs, first_week());
        assert_eq!(report.total_hours, 6.0);
        assert_eq!(report.expected_hours, 80.0);
        assert_eq!(report.completion_percentage, 7.5);
        assert_eq!(report.members.len(), 2);
        assert_eq!(report.members[0].email, "ada@acme.io");
        assert_eq!(report.members[1].hours, 0.0);
        assert_eq!(report.daily_trend.len(), 7);
    }

    #[test]
    fn test_user_stats_split_counted_and_mirrored() {
        let mut counted = worklog("1", "primary", "ada@acme.io", 2, 4);
        counted.parent_key = Some("ACME-1".to_string());
        let mirrored = worklog("2", "mirror", "ada@acme.io", 2, 4);
        let all = vec![counted.clone(), mirrored];

        let stats = user_period_stats(&all, &[counted], first_week());
        let ada = &stats["ada@acme.io"];
        assert_eq!(ada.total_hours, 4.0);
        assert_eq!(ada.worklog_count, 1);
        assert_eq!(ada.initiative_count, 1);
        assert_eq!(ada.hours_by_instance.len(), 2);
        assert_eq!(ada.expected_hours, 40.0);
        assert_eq!(ada.completion_percentage, 10.0);
    }

    #[test]
    fn test_contributors_fall_back_to_jira_names() {
        let users = vec![user(1, "ada@acme.io", "Ada", None)];
        let directory = Directory::new(&users, &[]);
        let worklogs = vec![
            worklog("1", "acme", "ada@acme.io", 2, 1),
            worklog("2", "acme", "contractor@elsewhere.io", 3, 2),
        ];

        let result = contributors(&worklogs, &directory);
        assert_eq!(result[0].email, "contractor@elsewhere.io");
        assert_eq!(result[0].full_name, "Jira Name");
        assert_eq!(result[0].user_id, None);
        assert_eq!(result[1].full_name, "Ada Lovelace");
        assert_eq!(result[1].user_id, Some(1));
    }

    #[test]
    fn test_epic_matches_parent_or_epic_key() {
        let mut by_parent = worklog("1", "acme", "ada@acme.io", 2, 1);
        by_parent.parent_key = Some("ACME-1".to_string());
        by_parent.parent_name = Some("Onboarding".to_string());
        let mut by_epic = worklog("2", "acme", "ada@acme.io", 3, 2);
        by_epic.epic_key = Some("ACME-1".to_string());
        let unrelated = worklog("3", "acme", "ada@acme.io", 4, 5);

        let matched = epic_worklogs(vec![by_parent, by_epic, unrelated], "ACME-1");
        let detail = epic_detail("ACME-1", &matched, &Directory::new(&[], &[]), date("2024-01-01"), date("2024-01-07"));
        assert_eq!(detail.total_hours, 3.0);
        assert_eq!(detail.epic_name.as_deref(), Some("Onboarding"));
        assert_eq!(detail.worklogs[0].id, "2");
    }

    #[test]
    fn test_empty_epic_is_zero_filled() {
        let detail = epic_detail("ACME-9", &[], &Directory::new(&[], &[]), date("2024-01-01"), date("2024-01-03"));
        assert_eq!(detail.total_hours, 0.0);
        assert_eq!(detail.jira_instance, None);
        assert_eq!(detail.daily_trend.len(), 3);
    }
}
