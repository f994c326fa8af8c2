use sea_orm_migration::{prelude::*, schema::*};

use crate::m20240101_000001_create_tenancy_tables::Companies;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Source ids repeat across instances and tenants, so all three form the key
        manager
            .create_table(
                Table::create()
                    .table(Worklogs::Table)
                    .if_not_exists()
                    .col(integer(Worklogs::CompanyId))
                    .col(string(Worklogs::Id))
                    .col(string(Worklogs::JiraInstance))
                    .col(string(Worklogs::IssueKey))
                    .col(string(Worklogs::IssueSummary).default(""))
                    .col(string(Worklogs::AuthorEmail))
                    .col(string(Worklogs::AuthorDisplayName).default(""))
                    .col(string_null(Worklogs::AuthorAccountId))
                    .col(big_integer(Worklogs::TimeSpentSeconds))
                    .col(timestamp_with_time_zone(Worklogs::Started))
                    .col(string_null(Worklogs::EpicKey))
                    .col(string_null(Worklogs::EpicName))
                    .col(string_null(Worklogs::ParentKey))
                    .col(string_null(Worklogs::ParentName))
                    .col(string_null(Worklogs::ParentType))
                    .col(timestamp_with_time_zone(Worklogs::CreatedAt))
                    .col(timestamp_with_time_zone(Worklogs::UpdatedAt))
                    .primary_key(
                        Index::create()
                            .col(Worklogs::CompanyId)
                            .col(Worklogs::Id)
                            .col(Worklogs::JiraInstance),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_worklogs_company_id")
                            .from(Worklogs::Table, Worklogs::CompanyId)
                            .to(Companies::Table, Companies::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_worklogs_company_started")
                    .table(Worklogs::Table)
                    .col(Worklogs::CompanyId)
                    .col(Worklogs::Started)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_worklogs_company_author")
                    .table(Worklogs::Table)
                    .col(Worklogs::CompanyId)
                    .col(Worklogs::AuthorEmail)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_worklogs_company_epic")
                    .table(Worklogs::Table)
                    .col(Worklogs::CompanyId)
                    .col(Worklogs::EpicKey)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SyncHistory::Table)
                    .if_not_exists()
                    .col(pk_auto(SyncHistory::Id))
                    .col(integer(SyncHistory::CompanyId))
                    .col(string(SyncHistory::Status).default("in_progress"))
                    .col(date(SyncHistory::StartDate))
                    .col(date(SyncHistory::EndDate))
                    .col(integer(SyncHistory::WorklogsSynced).default(0))
                    .col(integer(SyncHistory::WorklogsUpdated).default(0))
                    .col(integer(SyncHistory::WorklogsDeleted).default(0))
                    .col(text_null(SyncHistory::ErrorMessage))
                    .col(timestamp_with_time_zone(SyncHistory::StartedAt))
                    .col(timestamp_with_time_zone_null(SyncHistory::CompletedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sync_history_company_id")
                            .from(SyncHistory::Table, SyncHistory::CompanyId)
                            .to(Companies::Table, Companies::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SyncHistory::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Worklogs::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Worklogs {
    Table,
    CompanyId,
    Id,
    JiraInstance,
    IssueKey,
    IssueSummary,
    AuthorEmail,
    AuthorDisplayName,
    AuthorAccountId,
    TimeSpentSeconds,
    Started,
    EpicKey,
    EpicName,
    ParentKey,
    ParentName,
    ParentType,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum SyncHistory {
    Table,
    Id,
    CompanyId,
    Status,
    StartDate,
    EndDate,
    WorklogsSynced,
    WorklogsUpdated,
    WorklogsDeleted,
    ErrorMessage,
    StartedAt,
    CompletedAt,
}
