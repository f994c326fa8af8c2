use sea_orm_migration::{prelude::*, schema::*};

use crate::m20240101_000001_create_tenancy_tables::{Companies, Users};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(JiraInstances::Table)
                    .if_not_exists()
                    .col(pk_auto(JiraInstances::Id))
                    .col(integer(JiraInstances::CompanyId))
                    .col(string(JiraInstances::Name))
                    .col(string(JiraInstances::Url))
                    .col(string(JiraInstances::Email))
                    .col(string(JiraInstances::ApiToken))
                    .col(string_null(JiraInstances::TempoApiToken))
                    .col(integer_null(JiraInstances::BillingClientId))
                    .col(boolean(JiraInstances::IsActive).default(true))
                    .col(timestamp_with_time_zone(JiraInstances::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_jira_instances_company_id")
                            .from(JiraInstances::Table, JiraInstances::CompanyId)
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
                    .name("idx_jira_instances_company_name_unique")
                    .table(JiraInstances::Table)
                    .col(JiraInstances::CompanyId)
                    .col(JiraInstances::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(UserJiraAccounts::Table)
                    .if_not_exists()
                    .col(pk_auto(UserJiraAccounts::Id))
                    .col(integer(UserJiraAccounts::CompanyId))
                    .col(integer(UserJiraAccounts::UserId))
                    .col(string(UserJiraAccounts::JiraInstance))
                    .col(string(UserJiraAccounts::AccountId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_jira_accounts_user_id")
                            .from(UserJiraAccounts::Table, UserJiraAccounts::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_user_jira_accounts_user_instance_unique")
                    .table(UserJiraAccounts::Table)
                    .col(UserJiraAccounts::UserId)
                    .col(UserJiraAccounts::JiraInstance)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ComplementaryGroups::Table)
                    .if_not_exists()
                    .col(pk_auto(ComplementaryGroups::Id))
                    .col(integer(ComplementaryGroups::CompanyId))
                    .col(string(ComplementaryGroups::Name))
                    .col(integer_null(ComplementaryGroups::PrimaryInstanceId))
                    .col(timestamp_with_time_zone(ComplementaryGroups::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_complementary_groups_company_id")
                            .from(ComplementaryGroups::Table, ComplementaryGroups::CompanyId)
                            .to(Companies::Table, Companies::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_complementary_groups_primary_instance_id")
                            .from(ComplementaryGroups::Table, ComplementaryGroups::PrimaryInstanceId)
                            .to(JiraInstances::Table, JiraInstances::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ComplementaryGroupMembers::Table)
                    .if_not_exists()
                    .col(integer(ComplementaryGroupMembers::GroupId))
                    .col(integer(ComplementaryGroupMembers::InstanceId))
                    .primary_key(
                        Index::create()
                            .col(ComplementaryGroupMembers::GroupId)
                            .col(ComplementaryGroupMembers::InstanceId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_complementary_group_members_group_id")
                            .from(ComplementaryGroupMembers::Table, ComplementaryGroupMembers::GroupId)
                            .to(ComplementaryGroups::Table, ComplementaryGroups::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_complementary_group_members_instance_id")
                            .from(ComplementaryGroupMembers::Table, ComplementaryGroupMembers::InstanceId)
                            .to(JiraInstances::Table, JiraInstances::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Holidays::Table)
                    .if_not_exists()
                    .col(pk_auto(Holidays::Id))
                    .col(integer(Holidays::CompanyId))
                    .col(string(Holidays::Name))
                    .col(date(Holidays::HolidayDate))
                    .col(string(Holidays::Country).default("ES"))
                    .col(boolean(Holidays::IsActive).default(true))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_holidays_company_id")
                            .from(Holidays::Table, Holidays::CompanyId)
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
                    .name("idx_holidays_company_date_unique")
                    .table(Holidays::Table)
                    .col(Holidays::CompanyId)
                    .col(Holidays::HolidayDate)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Holidays::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ComplementaryGroupMembers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ComplementaryGroups::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(UserJiraAccounts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(JiraInstances::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum JiraInstances {
    Table,
    Id,
    CompanyId,
    Name,
    Url,
    Email,
    ApiToken,
    TempoApiToken,
    BillingClientId,
    IsActive,
    CreatedAt,
}

#[derive(DeriveIden)]
enum UserJiraAccounts {
    Table,
    Id,
    CompanyId,
    UserId,
    JiraInstance,
    AccountId,
}

#[derive(DeriveIden)]
enum ComplementaryGroups {
    Table,
    Id,
    CompanyId,
    Name,
    PrimaryInstanceId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum ComplementaryGroupMembers {
    Table,
    GroupId,
    InstanceId,
}

#[derive(DeriveIden)]
enum Holidays {
    Table,
    Id,
    CompanyId,
    Name,
    HolidayDate,
    Country,
    IsActive,
}
