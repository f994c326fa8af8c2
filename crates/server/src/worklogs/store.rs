//! # Worklog Store
//!
//! Bulk persistence of fetched worklogs. Rows are keyed by
//! `(company_id, id, jira_instance)`; writes go through a single
//! `INSERT ... ON CONFLICT DO UPDATE` per chunk.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use entity::worklogs::{Column, Entity as WorklogsEntity};
use error::Result;
use integrations::RawWorklog;
use logging::log_db_query;
use sea_orm::{
    sea_query::OnConflict,
    ColumnTrait,
    ConnectionTrait,
    EntityTrait,
    QueryFilter,
    QuerySelect,
    Set,
};
use tracing::debug;

/// Rows per statement; keeps SQLite under its bound-parameter limit.
const UPSERT_CHUNK: usize = 200;

/// Counts from one upsert call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertStats {
    pub inserted: u64,
    pub updated:  u64,
}

/// Drops repeated `(id, jira_instance)` pairs, keeping the last occurrence in
/// its original position.
pub fn dedupe_worklogs(batch: Vec<RawWorklog>) -> Vec<RawWorklog> {
    let mut last_index: HashMap<(String, String), usize> = HashMap::new();
    for (i, w) in batch.iter().enumerate() {
        last_index.insert((w.id.clone(), w.jira_instance.clone()), i);
    }

    batch
        .into_iter()
        .enumerate()
        .filter(|(i, w)| last_index.get(&(w.id.clone(), w.jira_instance.clone())) == Some(i))
        .map(|(_, w)| w)
        .collect()
}

fn to_active_model(company_id: i32, worklog: RawWorklog, now: DateTime<Utc>) -> entity::worklogs::ActiveModel {
    entity::worklogs::ActiveModel {
        company_id:          Set(company_id),
        id:                  Set(worklog.id),
        jira_instance:       Set(worklog.jira_instance),
        issue_key:           Set(worklog.issue_key),
        issue_summary:       Set(worklog.issue_summary),
        author_email:        Set(worklog.author_email.to_lowercase()),
        author_display_name: Set(worklog.author_display_name),
        author_account_id:   Set(worklog.author_account_id),
        time_spent_seconds:  Set(worklog.time_spent_seconds),
        started:             Set(worklog.started),
        epic_key:            Set(worklog.epic_key),
        epic_name:           Set(worklog.epic_name),
        parent_key:          Set(worklog.parent_key),
        parent_name:         Set(worklog.parent_name),
        parent_type:         Set(worklog.parent_type),
        created_at:          Set(now),
        updated_at:          Set(now),
    }
}

/// Insert or update a batch of worklogs for one company.
///
/// Re-upserting the same batch is idempotent: it only refreshes fields and
/// `updated_at`; `created_at` of existing rows is kept.
pub async fn upsert_worklogs<C: ConnectionTrait>(
    db: &C,
    company_id: i32,
    batch: Vec<RawWorklog>,
) -> Result<UpsertStats> {
    let batch = dedupe_worklogs(batch);
    if batch.is_empty() {
        return Ok(UpsertStats::default());
    }

    let mut stats = UpsertStats::default();
    let now = Utc::now();
    let started = std::time::Instant::now();
    let mut remaining = batch.into_iter().peekable();

    while remaining.peek().is_some() {
        let chunk: Vec<RawWorklog> = remaining.by_ref().take(UPSERT_CHUNK).collect();

        let ids: Vec<String> = chunk.iter().map(|w| w.id.clone()).collect();
        let existing: HashSet<(String, String)> = WorklogsEntity::find()
            .select_only()
            .column(Column::Id)
            .column(Column::JiraInstance)
            .filter(Column::CompanyId.eq(company_id))
            .filter(Column::Id.is_in(ids))
            .into_tuple::<(String, String)>()
            .all(db)
            .await?
            .into_iter()
            .collect();

        let updated = chunk
            .iter()
            .filter(|w| existing.contains(&(w.id.clone(), w.jira_instance.clone())))
            .count() as u64;
        stats.updated += updated;
        stats.inserted += chunk.len() as u64 - updated;

        WorklogsEntity::insert_many(chunk.into_iter().map(|w| to_active_model(company_id, w, now)))
            .on_conflict(
                OnConflict::columns([Column::CompanyId, Column::Id, Column::JiraInstance])
                    .update_columns([
                        Column::IssueKey,
                        Column::IssueSummary,
                        Column::AuthorEmail,
                        Column::AuthorDisplayName,
                        Column::AuthorAccountId,
                        Column::TimeSpentSeconds,
                        Column::Started,
                        Column::EpicKey,
                        Column::EpicName,
                        Column::ParentKey,
                        Column::ParentName,
                        Column::ParentType,
                        Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await?;
    }

    log_db_query!("upsert", "worklogs", started.elapsed().as_millis());
    debug!(company_id, inserted = stats.inserted, updated = stats.updated, "Worklogs upserted");
    Ok(stats)
}

/// Deletes worklogs of `instance` started in `[from, until)` whose ids are not
/// in `keep_ids`. Returns the number of rows removed.
pub async fn delete_stale_worklogs<C: ConnectionTrait>(
    db: &C,
    company_id: i32,
    instance: &str,
    from: DateTime<Utc>,
    until: DateTime<Utc>,
    keep_ids: &HashSet<String>,
) -> Result<u64> {
    let stored: Vec<String> = WorklogsEntity::find()
        .select_only()
        .column(Column::Id)
        .filter(Column::CompanyId.eq(company_id))
        .filter(Column::JiraInstance.eq(instance))
        .filter(Column::Started.gte(from))
        .filter(Column::Started.lt(until))
        .into_tuple::<String>()
        .all(db)
        .await?;

    let stale: Vec<String> = stored.into_iter().filter(|id| !keep_ids.contains(id)).collect();
    if stale.is_empty() {
        return Ok(0);
    }

    let mut deleted = 0;
    for chunk in stale.chunks(UPSERT_CHUNK * 2) {
        deleted += WorklogsEntity::delete_many()
            .filter(Column::CompanyId.eq(company_id))
            .filter(Column::JiraInstance.eq(instance))
            .filter(Column::Id.is_in(chunk.iter().cloned()))
            .exec(db)
            .await?
            .rows_affected;
    }

    debug!(company_id, instance, deleted, "Stale worklogs deleted");
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(id: &str, instance: &str, seconds: i64) -> RawWorklog {
        RawWorklog {
            id:                  id.to_string(),
            jira_instance:       instance.to_string(),
            issue_key:           "ACME-1".to_string(),
            issue_id:            None,
            issue_summary:       String::new(),
            author_email:        "ana@acme.io".to_string(),
            author_display_name: "Ana".to_string(),
            author_account_id:   None,
            time_spent_seconds:  seconds,
            started:             Utc::now(),
            epic_key:            None,
            epic_name:           None,
            parent_key:          None,
            parent_name:         None,
            parent_type:         None,
        }
    }

    #[test]
    fn test_dedupe_keeps_last_occurrence() {
        let batch = vec![
            raw("a", "acme", 60),
            raw("b", "acme", 60),
            raw("a", "acme", 120),
            raw("a", "globex", 30),
        ];

        let deduped = dedupe_worklogs(batch);
        assert_eq!(deduped.len(), 3);
        assert_eq!(deduped[0].id, "b");
        assert_eq!(deduped[1].id, "a");
        assert_eq!(deduped[1].time_spent_seconds, 120);
        assert_eq!(deduped[2].jira_instance, "globex");
    }

    #[test]
    fn test_dedupe_empty() {
        assert!(dedupe_worklogs(Vec::new()).is_empty());
    }
}
