//! Rate resolution.
//!
//! A worklog's hourly rate is looked up in this order, first hit wins:
//!
//! 1. the classification's override rate
//! 2. the most specific project rate rule valid on the worklog's date
//!    (user + issue type, then user, then issue type, then generic)
//! 3. the project's default rate
//! 4. the client's default rate
//!
//! A worklog with none of these is unrated; callers exclude it from totals.

use std::cmp::Ordering;

use chrono::NaiveDate;
use entity::{billing_rates, billing_worklog_classifications, worklogs};
use serde::Serialize;

/// Where a resolved rate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum RateSource {
    Override,
    Rule { rule_id: i32 },
    ProjectDefault,
    ClientDefault,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResolvedRate {
    pub rate:   f64,
    pub source: RateSource,
}

/// Preloaded lookup tables for one worklog.
#[derive(Debug, Clone, Copy, Default)]
pub struct RateContext<'a> {
    /// Rate rules of the worklog's billing project
    pub rules:           &'a [billing_rates::Model],
    pub project_default: Option<f64>,
    pub client_default:  Option<f64>,
    pub classification:  Option<&'a billing_worklog_classifications::Model>,
}

fn eq_ignore_case(a: &str, b: &str) -> bool { a.trim().eq_ignore_ascii_case(b.trim()) }

/// Specificity of `rule` for this worklog, or `None` when the rule does not
/// apply. Higher is more specific.
pub fn rule_specificity(rule: &billing_rates::Model, worklog: &worklogs::Model, date: NaiveDate) -> Option<u8> {
    if rule.valid_from.is_some_and(|from| date < from) || rule.valid_to.is_some_and(|to| date > to) {
        return None;
    }

    let user_match = match rule.user_email.as_deref() {
        Some(email) if eq_ignore_case(email, &worklog.author_email) => true,
        Some(_) => return None,
        None => false,
    };
    let type_match = match (rule.issue_type.as_deref(), worklog.parent_type.as_deref()) {
        (Some(wanted), Some(actual)) if eq_ignore_case(wanted, actual) => true,
        (Some(_), _) => return None,
        (None, _) => false,
    };

    Some(match (user_match, type_match) {
        (true, true) => 3,
        (true, false) => 2,
        (false, true) => 1,
        (false, false) => 0,
    })
}

/// Orders candidate rules: specificity, then latest `valid_from`, then highest id.
fn compare_rules(a: (u8, &billing_rates::Model), b: (u8, &billing_rates::Model)) -> Ordering {
    a.0.cmp(&b.0)
        .then_with(|| a.1.valid_from.cmp(&b.1.valid_from))
        .then_with(|| a.1.id.cmp(&b.1.id))
}

/// Resolve the hourly rate of `worklog`.
pub fn resolve_rate(ctx: &RateContext<'_>, worklog: &worklogs::Model) -> Option<ResolvedRate> {
    if let Some(rate) = ctx.classification.and_then(|c| c.override_hourly_rate) {
        return Some(ResolvedRate {
            rate,
            source: RateSource::Override,
        });
    }

    let date = worklog.started.date_naive();
    let best = ctx
        .rules
        .iter()
        .filter_map(|rule| rule_specificity(rule, worklog, date).map(|s| (s, rule)))
        .max_by(|a, b| compare_rules(*a, *b));
    if let Some((_, rule)) = best {
        return Some(ResolvedRate {
            rate:   rule.hourly_rate,
            source: RateSource::Rule {
                rule_id: rule.id,
            },
        });
    }

    if let Some(rate) = ctx.project_default {
        return Some(ResolvedRate {
            rate,
            source: RateSource::ProjectDefault,
        });
    }

    ctx.client_default.map(|rate| {
        ResolvedRate {
            rate,
            source: RateSource::ClientDefault,
        }
    })
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn worklog(email: &str, parent_type: Option<&str>) -> worklogs::Model {
        let started = Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap();
        worklogs::Model {
            company_id:          1,
            id:                  "acme_1".to_string(),
            jira_instance:       "acme".to_string(),
            issue_key:           "ACME-5".to_string(),
            issue_summary:       "Billing export".to_string(),
            author_email:        email.to_string(),
            author_display_name: "Ana".to_string(),
            author_account_id:   None,
            time_spent_seconds:  3600,
            started,
            epic_key:            None,
            epic_name:           None,
            parent_key:          None,
            parent_name:         None,
            parent_type:         parent_type.map(str::to_string),
            created_at:          started,
            updated_at:          started,
        }
    }

    fn rule(id: i32, email: Option<&str>, issue_type: Option<&str>, rate: f64) -> billing_rates::Model {
        billing_rates::Model {
            id,
            company_id: 1,
            project_id: 1,
            user_email: email.map(str::to_string),
            issue_type: issue_type.map(str::to_string),
            hourly_rate: rate,
            valid_from: None,
            valid_to: None,
            created_at: Utc::now(),
        }
    }

    fn resolve(rules: &[billing_rates::Model], w: &worklogs::Model) -> Option<ResolvedRate> {
        resolve_rate(
            &RateContext {
                rules,
                project_default: Some(50.0),
                client_default: Some(40.0),
                classification: None,
            },
            w,
        )
    }

    #[test]
    fn test_more_specific_rule_wins() {
        let rules = vec![
            rule(1, None, None, 60.0),
            rule(2, None, Some("Epic"), 70.0),
            rule(3, Some("ana@acme.io"), None, 80.0),
            rule(4, Some("ana@acme.io"), Some("Epic"), 90.0),
        ];

        let w = worklog("Ana@Acme.io", Some("epic"));
        assert_eq!(resolve(&rules, &w).unwrap().rate, 90.0);
        assert_eq!(resolve(&rules[.. 3], &w).unwrap().rate, 80.0);
        assert_eq!(resolve(&rules[.. 2], &w).unwrap().rate, 70.0);
        assert_eq!(resolve(&rules[.. 1], &w).unwrap().rate, 60.0);
    }

    #[test]
    fn test_mismatched_constraints_disqualify() {
        let rules = vec![
            rule(1, Some("ben@acme.io"), None, 99.0),
            rule(2, None, Some("Story"), 98.0),
        ];
        let w = worklog("ana@acme.io", Some("Epic"));
        assert_eq!(
            resolve(&rules, &w).unwrap().source,
            RateSource::ProjectDefault
        );

        let untyped = worklog("ana@acme.io", None);
        assert_eq!(resolve(&rules, &untyped).unwrap().rate, 50.0);
    }

    #[test]
    fn test_validity_window() {
        let mut expired = rule(1, Some("ana@acme.io"), None, 120.0);
        expired.valid_to = NaiveDate::from_ymd_opt(2024, 2, 29);
        let mut future = rule(2, None, None, 130.0);
        future.valid_from = NaiveDate::from_ymd_opt(2024, 4, 1);
        let mut current = rule(3, None, None, 65.0);
        current.valid_from = NaiveDate::from_ymd_opt(2024, 3, 15);
        current.valid_to = NaiveDate::from_ymd_opt(2024, 3, 15);

        let w = worklog("ana@acme.io", None);
        assert_eq!(resolve(&[expired.clone(), future.clone()], &w).unwrap().rate, 50.0);
        assert_eq!(resolve(&[expired, future, current], &w).unwrap().rate, 65.0);
    }

    #[test]
    fn test_ties_prefer_latest_valid_from_then_highest_id() {
        let mut older = rule(5, None, None, 60.0);
        older.valid_from = NaiveDate::from_ymd_opt(2024, 1, 1);
        let mut newer = rule(2, None, None, 75.0);
        newer.valid_from = NaiveDate::from_ymd_opt(2024, 3, 1);
        let w = worklog("ana@acme.io", None);
        assert_eq!(resolve(&[older, newer], &w).unwrap().rate, 75.0);

        let a = rule(7, None, None, 61.0);
        let b = rule(8, None, None, 62.0);
        assert_eq!(
            resolve(&[b, a], &w).unwrap().source,
            RateSource::Rule {
                rule_id: 8
            }
        );
    }

    #[test]
    fn test_override_and_defaults() {
        let w = worklog("ana@acme.io", None);
        let classification = billing_worklog_classifications::Model {
            id:                   1,
            company_id:           1,
            worklog_id:           "acme_1".to_string(),
            jira_instance:        "acme".to_string(),
            is_billable:          true,
            override_hourly_rate: Some(150.0),
            note:                 None,
            updated_at:           Utc::now(),
        };
        let rules = vec![rule(1, Some("ana@acme.io"), None, 80.0)];

        let overridden = resolve_rate(
            &RateContext {
                rules:           &rules,
                project_default: None,
                client_default:  None,
                classification:  Some(&classification),
            },
            &w,
        )
        .unwrap();
        assert_eq!(overridden.source, RateSource::Override);
        assert_eq!(overridden.rate, 150.0);

        let client_only = resolve_rate(
            &RateContext {
                client_default: Some(40.0),
                ..Default::default()
            },
            &w,
        )
        .unwrap();
        assert_eq!(client_only.source, RateSource::ClientDefault);

        assert_eq!(resolve_rate(&RateContext::default(), &w), None);
    }
}
