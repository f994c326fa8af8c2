//! Dashboard aggregation over already-filtered worklogs.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;

use crate::{
    dto::analytics::{DailyHours, DashboardResponse, EpicHours, TeamHours},
    utils::{days_in_range, normalize_email, round2, working_days},
};

/// Number of epics on the dashboard.
pub const TOP_EPICS: usize = 10;

/// Everything the dashboard is computed from.
#[derive(Debug, Clone, Copy)]
pub struct DashboardInput<'a> {
    pub start_date:          NaiveDate,
    pub end_date:            NaiveDate,
    pub worklogs:            &'a [entity::worklogs::Model],
    /// Active users of the company
    pub users:               &'a [entity::users::Model],
    pub teams:               &'a [entity::teams::Model],
    /// Active holidays within the range
    pub holidays:            &'a HashSet<NaiveDate>,
    pub daily_working_hours: f64,
}

/// Hours per epic, largest first. Worklogs without an epic are skipped.
pub fn epic_hours(worklogs: &[entity::worklogs::Model]) -> Vec<EpicHours> {
    struct Acc<'w> {
        name:    Option<&'w str>,
        seconds: i64,
        authors: HashSet<&'w str>,
    }

    let mut epics: HashMap<(&str, &str), Acc<'_>> = HashMap::new();
    for worklog in worklogs {
        let Some(epic_key) = worklog.epic_key.as_deref()
        else {
            continue;
        };
        let acc = epics
            .entry((epic_key, worklog.jira_instance.as_str()))
            .or_insert_with(|| {
                Acc {
                    name:    None,
                    seconds: 0,
                    authors: HashSet::new(),
                }
            });
        acc.seconds += worklog.time_spent_seconds;
        acc.authors.insert(worklog.author_email.as_str());
        if acc.name.is_none() {
            acc.name = worklog.epic_name.as_deref();
        }
    }

    let mut result: Vec<EpicHours> = epics
        .into_iter()
        .map(|((key, instance), acc)| {
            EpicHours {
                epic_key:      key.to_string(),
                epic_name:     acc.name.map(str::to_string),
                hours:         round2(acc.seconds as f64 / 3600.0),
                contributors:  acc.authors.len() as u64,
                jira_instance: instance.to_string(),
            }
        })
        .collect();
    result.sort_by(|a, b| {
        b.hours
            .total_cmp(&a.hours)
            .then_with(|| a.epic_key.cmp(&b.epic_key))
            .then_with(|| a.jira_instance.cmp(&b.jira_instance))
    });
    result
}

/// Hours per day over every date of the range, zero-filled.
pub fn daily_trend<'w>(
    worklogs: impl IntoIterator<Item = &'w entity::worklogs::Model>,
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<DailyHours> {
    let mut per_day: BTreeMap<NaiveDate, i64> = days_in_range(start, end).map(|d| (d, 0)).collect();
    for worklog in worklogs {
        if let Some(seconds) = per_day.get_mut(&worklog.started.date_naive()) {
            *seconds += worklog.time_spent_seconds;
        }
    }
    per_day
        .into_iter()
        .map(|(date, seconds)| {
            DailyHours {
                date,
                hours: round2(seconds as f64 / 3600.0),
            }
        })
        .collect()
}

/// Logged over expected hours as a rounded percentage; 0 when nothing is expected.
pub fn completion(total_hours: f64, expected_hours: f64) -> f64 {
    if expected_hours > 0.0 {
        round2(total_hours / expected_hours * 100.0)
    }
    else {
        0.0
    }
}

/// Totals, expected hours, per-team hours, daily trend and top epics.
pub fn build_dashboard(input: DashboardInput<'_>) -> DashboardResponse {
    let total_seconds: i64 = input.worklogs.iter().map(|w| w.time_spent_seconds).sum();
    let total_hours = total_seconds as f64 / 3600.0;

    let days = working_days(input.start_date, input.end_date, input.holidays);
    let expected_hours = f64::from(days) * input.users.len() as f64 * input.daily_working_hours;

    let team_of: HashMap<String, i32> = input
        .users
        .iter()
        .filter_map(|u| u.team_id.map(|team| (normalize_email(&u.email), team)))
        .collect();

    let mut team_seconds: HashMap<i32, i64> = HashMap::new();
    for worklog in input.worklogs {
        if let Some(team_id) = team_of.get(&normalize_email(&worklog.author_email)) {
            *team_seconds.entry(*team_id).or_default() += worklog.time_spent_seconds;
        }
    }
    let mut team_members: HashMap<i32, u64> = HashMap::new();
    for team_id in input.users.iter().filter_map(|u| u.team_id) {
        *team_members.entry(team_id).or_default() += 1;
    }

    let teams = input
        .teams
        .iter()
        .map(|team| {
            TeamHours {
                team_id:      team.id,
                name:         team.name.clone(),
                hours:        round2(team_seconds.get(&team.id).copied().unwrap_or(0) as f64 / 3600.0),
                member_count: team_members.get(&team.id).copied().unwrap_or(0),
            }
        })
        .collect();

    let daily_trend = daily_trend(input.worklogs, input.start_date, input.end_date);

    let mut top_epics = epic_hours(input.worklogs);
    top_epics.truncate(TOP_EPICS);

    DashboardResponse {
        start_date: input.start_date,
        end_date: input.end_date,
        total_hours: round2(total_hours),
        expected_hours: round2(expected_hours),
        completion_percentage: completion(total_hours, expected_hours),
        teams,
        daily_trend,
        top_epics,
    }
}
