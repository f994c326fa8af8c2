//! Status enum and model helper tests for the entity crate

use chrono::{TimeZone, Utc};
use entity::{
    sea_orm_active_enums::{InvitationStatus, InvoiceStatus, SyncStatus},
    worklogs,
};
use sea_orm::ActiveEnum;

/// Stored values match what the API reports
#[test]
fn test_status_values() {
    assert_eq!(InvitationStatus::Pending.to_value(), "PENDING");
    assert_eq!(SyncStatus::InProgress.to_value(), "in_progress");
    assert_eq!(InvoiceStatus::Void.to_value(), "VOID");
    assert_eq!(SyncStatus::Partial.to_value(), "partial");
}

/// Stored values parse back into the enum
#[test]
fn test_status_from_value() {
    assert_eq!(
        SyncStatus::try_from_value(&"completed".to_string()).unwrap(),
        SyncStatus::Completed
    );
    assert!(InvoiceStatus::try_from_value(&"PAID".to_string()).is_err());
}

/// Serde uses the same spelling as the database
#[test]
fn test_status_serde() {
    assert_eq!(serde_json::to_string(&InvoiceStatus::Issued).unwrap(), "\"ISSUED\"");
    assert_eq!(serde_json::to_string(&SyncStatus::InProgress).unwrap(), "\"in_progress\"");
    assert_eq!(InvoiceStatus::from_string("draft"), Some(InvoiceStatus::Draft));
    assert_eq!(InvoiceStatus::from_string("paid"), None);
}

fn worklog(issue_key: &str, seconds: i64) -> worklogs::Model {
    let at = Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap();
    worklogs::Model {
        company_id:          1,
        id:                  "acme_1".to_string(),
        jira_instance:       "acme".to_string(),
        issue_key:           issue_key.to_string(),
        issue_summary:       String::new(),
        author_email:        "ada@acme.test".to_string(),
        author_display_name: "Ada".to_string(),
        author_account_id:   None,
        time_spent_seconds:  seconds,
        started:             at,
        epic_key:            None,
        epic_name:           None,
        parent_key:          None,
        parent_name:         None,
        parent_type:         None,
        created_at:          at,
        updated_at:          at,
    }
}

#[test]
fn test_worklog_helpers() {
    let w = worklog("ACME-42", 5400);
    assert_eq!(w.hours(), 1.5);
    assert_eq!(w.project_key(), "ACME");
    assert_eq!(worklog("10010", 0).project_key(), "10010");
}
